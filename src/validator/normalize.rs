//! Flattening of violation trees into user-facing error records.

use super::engine::{pointer, Violation};
use super::ValidationError;

/// Pre-order flatten: each violation, then its causes in recorded order.
///
/// Nothing is merged or dropped, so the output length equals the number of
/// violation nodes visited.
pub fn normalize(violations: &[Violation]) -> Vec<ValidationError> {
    let mut errors = Vec::new();
    for violation in violations {
        visit(violation, &mut errors);
    }
    errors
}

fn visit(violation: &Violation, errors: &mut Vec<ValidationError>) {
    errors.push(ValidationError {
        field: pointer(&violation.path),
        message: violation.message.clone(),
        line: 0,
        column: 0,
    });
    for cause in &violation.causes {
        visit(cause, errors);
    }
}
