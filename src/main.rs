//! CLI entry point for nld.

mod cmd;

use anyhow::Result;
use clap::{CommandFactory, Parser, Subcommand};
use clap_complete::{generate, Shell};
use std::io;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

use cmd::ui::{Output, OutputMode};
use cmd::CliContext;
use nld::config::Config;
use nld::formatters::OutputFormat;

#[derive(Parser)]
#[command(name = "nld")]
#[command(about = "NLD - Next-Gen Layout Document Tool", long_about = None)]
#[command(
    after_help = "NLD validates and creates Next-Gen Layout Documents (contracts, receipts,\nagreements) against versioned JSON schemas.\n\nGETTING STARTED:\n    nld init -t contract -o contract.json\n    nld validate contract.json"
)]
#[command(disable_version_flag = true)]
struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Suppress all output except errors
    #[arg(short, long, global = true)]
    quiet: bool,

    /// Output format (text, json); overrides the configured format
    #[arg(long, global = true, value_name = "FORMAT")]
    output_format: Option<OutputFormat>,

    /// Display version information
    #[arg(short = 'V', long = "version")]
    version: bool,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Validate one or more NLD documents against their schema
    Validate {
        /// Documents to validate (glob patterns are expanded)
        #[arg(required = true, value_name = "FILE")]
        files: Vec<String>,
        /// Path to schema file (default: chosen by document type)
        #[arg(short, long)]
        schema: Option<PathBuf>,
        /// Continue validation even if some files fail
        #[arg(long)]
        force: bool,
        /// Worker threads with --force (default: from config, else one per core)
        #[arg(long, value_name = "N")]
        jobs: Option<usize>,
    },
    /// Initialize a new NLD document from a template
    Init {
        /// Type of document to initialize (contract, receipt, agreement, nda)
        #[arg(short = 't', long = "type", default_value = "contract")]
        doc_type: String,
        /// Output file path
        #[arg(short, long, default_value = "document.json")]
        output: PathBuf,
        /// Overwrite existing file if it exists
        #[arg(long)]
        force: bool,
        /// Prompt for title, author and jurisdiction
        #[arg(short, long)]
        interactive: bool,
        /// Document title
        #[arg(long)]
        title: Option<String>,
    },
    /// Inspect schemas and the document type mapping
    Schema {
        #[command(subcommand)]
        command: SchemaCommands,
    },
    /// Display version information
    Version,
    /// Generate shell completion script
    Completion {
        /// Shell type (bash, zsh, fish, elvish, powershell)
        #[arg(value_enum)]
        shell: Shell,
    },
}

#[derive(Subcommand)]
enum SchemaCommands {
    /// Show a schema's title and version
    Info {
        /// Path to the schema file
        path: PathBuf,
    },
    /// List document types and their schemas
    Types,
}

fn main() -> Result<()> {
    // Deeply nested documents recurse through the validator; give the
    // worker the same 8 MB stack on every platform.
    const STACK_SIZE: usize = 8 * 1024 * 1024; // 8 MB

    let thread = std::thread::Builder::new()
        .stack_size(STACK_SIZE)
        .spawn(run)
        .expect("failed to spawn main thread");

    match thread.join() {
        Ok(result) => result,
        Err(payload) => std::panic::resume_unwind(payload),
    }
}

fn run() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    if cli.version {
        return cmd_version(cli.verbose);
    }
    let Some(command) = cli.command else {
        Cli::command().print_help()?;
        return Ok(());
    };

    let config = Config::load()?;
    let format = cli.output_format.unwrap_or(config.output_format);
    let ctx = CliContext {
        output: Output::new(OutputMode::from_flags(format, cli.quiet)),
        verbose: cli.verbose && !cli.quiet,
        config,
    };

    match command {
        Commands::Validate {
            files,
            schema,
            force,
            jobs,
        } => {
            let files = cmd::validate::expand_patterns(&files);
            cmd::validate::cmd_validate(
                &ctx,
                cmd::validate::ValidateArgs {
                    files: &files,
                    schema: schema.as_deref(),
                    force,
                    jobs,
                },
            )
        }
        Commands::Init {
            doc_type,
            output,
            force,
            interactive,
            title,
        } => cmd::init::cmd_init(
            &ctx,
            cmd::init::InitArgs {
                doc_type: &doc_type,
                output: &output,
                force,
                interactive,
                title,
            },
        ),
        Commands::Schema { command } => match command {
            SchemaCommands::Info { path } => cmd::schema::cmd_schema_info(&ctx, &path),
            SchemaCommands::Types => cmd::schema::cmd_schema_types(&ctx),
        },
        Commands::Version => cmd_version(cli.verbose),
        Commands::Completion { shell } => cmd_completion(shell),
    }
}

/// `RUST_LOG` wins; otherwise `-v` turns on debug logging for the crate.
fn init_tracing(verbose: bool) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        if verbose {
            EnvFilter::new("nld=debug")
        } else {
            EnvFilter::new("nld=warn")
        }
    });

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(io::stderr)
        .init();
}

fn cmd_version(verbose: bool) -> Result<()> {
    const VERSION: &str = env!("CARGO_PKG_VERSION");
    println!("NLD - Next-Gen Layout Document Tool");
    println!("Version: {}", VERSION);

    if verbose {
        const GIT_SHA: &str = env!("GIT_SHA");
        const BUILD_DATE: &str = env!("BUILD_DATE");
        println!("commit: {}", GIT_SHA);
        println!("built: {}", BUILD_DATE);
    }

    Ok(())
}

fn cmd_completion(shell: Shell) -> Result<()> {
    let mut cmd = Cli::command();
    generate(shell, &mut cmd, "nld", &mut io::stdout());
    Ok(())
}
