//! Output formatting functions.

pub mod json;
pub mod pretty;

use serde::Serialize;

use gatherly_core::service::ServiceResult;

use crate::cli::OutputFormat;

/// A formatted command outcome.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Rendered {
    /// Printed to stdout.
    Success(String),
    /// Printed to stderr; the process exits non-zero.
    Failure(String),
}

/// Format a service result for output.
///
/// JSON output is the result envelope itself, for successes and failures alike.
pub fn format_output<T: Serialize>(
    result: &ServiceResult<T>,
    format: OutputFormat,
    pretty: impl FnOnce(&T) -> String,
) -> Rendered {
    let text = match format {
        OutputFormat::Json => json::format_json(result),
        OutputFormat::Pretty => pretty::format_result(result, pretty),
    };
    if result.is_success() {
        Rendered::Success(text)
    } else {
        Rendered::Failure(text)
    }
}
