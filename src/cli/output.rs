//! Output formatting for CLI commands

use serde::Serialize;

/// Format output as pretty JSON or compact JSON based on --json flag
pub fn format_output<T: Serialize>(data: &T, pretty: bool) -> String {
    let result = if pretty {
        serde_json::to_string_pretty(data)
    } else {
        serde_json::to_string(data)
    };
    result.unwrap_or_else(|_| "{}".to_string())
}
