use std::process::Command;

/// Build metadata reported by `nld -v version`. `NLD_GIT_SHA` and
/// `NLD_BUILD_DATE` override the detected values for release packaging.
fn main() {
    let commit = stamp("NLD_GIT_SHA", "git", &["rev-parse", "--short", "HEAD"]);
    let built = stamp("NLD_BUILD_DATE", "date", &["-u", "+%Y-%m-%d"]);

    println!("cargo:rustc-env=GIT_SHA={}", commit);
    println!("cargo:rustc-env=BUILD_DATE={}", built);
    println!("cargo:rerun-if-env-changed=NLD_GIT_SHA");
    println!("cargo:rerun-if-env-changed=NLD_BUILD_DATE");
}

/// Outside a git checkout (source tarballs, vendored builds) the command
/// fails or prints nothing; both become "unknown".
fn stamp(var: &str, program: &str, args: &[&str]) -> String {
    if let Ok(value) = std::env::var(var) {
        if !value.trim().is_empty() {
            return value.trim().to_string();
        }
    }
    Command::new(program)
        .args(args)
        .output()
        .ok()
        .filter(|output| output.status.success())
        .map(|output| String::from_utf8_lossy(&output.stdout).trim().to_string())
        .filter(|value| !value.is_empty())
        .unwrap_or_else(|| "unknown".to_string())
}
