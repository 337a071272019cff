//! Plain-text rendering of decoded tokens.

use std::fmt::Write as _;

use probe_lsp::ResolvedToken;

pub const EMPTY_MESSAGE: &str = "Empty semantic tokens data.";

/// Summary line with the total count, then at most `limit` tokens, one per
/// line, in server order.
pub fn render(tokens: &[ResolvedToken], limit: usize) -> String {
    if tokens.is_empty() {
        return format!("{EMPTY_MESSAGE}\n");
    }

    let mut out = format!("Semantic tokens ({}):\n", tokens.len());
    for token in tokens.iter().take(limit) {
        let _ = writeln!(out, "{token}");
    }
    out
}
