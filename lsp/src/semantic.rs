//! Semantic token decoding.
//!
//! A `textDocument/semanticTokens/full` response carries a flat array of
//! integers, five per token:
//!
//! ```text
//! [deltaLine, deltaStartChar, length, tokenType, tokenModifiers]
//! ```
//!
//! `deltaLine` is relative to the previous token's line. `deltaStartChar` is
//! relative to the previous token's start column when both tokens share a
//! line, and absolute otherwise. `tokenType` indexes the legend's type list
//! and `tokenModifiers` is a bitset over the legend's modifier list.

use std::fmt;

use thiserror::Error;

/// Integers per encoded token.
pub const TOKEN_STRIDE: usize = 5;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum DecodeError {
    #[error("semantic token data has {len} integers, which is not a multiple of {stride}", stride = TOKEN_STRIDE)]
    MalformedTokenData { len: usize },
}

/// The server's mapping from integer indices to token type and modifier names.
///
/// Received once in the `initialize` response and never changed afterwards.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Legend {
    token_types: Vec<String>,
    token_modifiers: Vec<String>,
}

impl Legend {
    #[must_use]
    pub fn new(token_types: Vec<String>, token_modifiers: Vec<String>) -> Self {
        Self {
            token_types,
            token_modifiers,
        }
    }

    #[must_use]
    pub fn token_types(&self) -> &[String] {
        &self.token_types
    }

    #[must_use]
    pub fn token_modifiers(&self) -> &[String] {
        &self.token_modifiers
    }

    /// Name for a token type index, or `<index>` when the legend has no entry.
    fn type_name(&self, index: u32) -> String {
        usize::try_from(index)
            .ok()
            .and_then(|i| self.token_types.get(i))
            .cloned()
            .unwrap_or_else(|| format!("<{index}>"))
    }

    /// Names of the modifiers set in `bits`, in legend order.
    ///
    /// Bits past the end of the legend are ignored.
    fn modifier_names(&self, bits: u32) -> Vec<String> {
        self.token_modifiers
            .iter()
            .take(u32::BITS as usize)
            .enumerate()
            .filter(|(bit, _)| bits & (1 << bit) != 0)
            .map(|(_, name)| name.clone())
            .collect()
    }
}

/// A semantic token with absolute, 0-indexed coordinates.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedToken {
    line: u32,
    start_column: u32,
    length: u32,
    token_type: String,
    modifiers: Vec<String>,
}

impl ResolvedToken {
    /// 0-indexed line.
    #[must_use]
    pub fn line(&self) -> u32 {
        self.line
    }

    /// 0-indexed start column, in the server's position encoding.
    #[must_use]
    pub fn start_column(&self) -> u32 {
        self.start_column
    }

    #[must_use]
    pub fn length(&self) -> u32 {
        self.length
    }

    #[must_use]
    pub fn token_type(&self) -> &str {
        &self.token_type
    }

    /// Modifier names in legend order.
    #[must_use]
    pub fn modifiers(&self) -> &[String] {
        &self.modifiers
    }
}

impl fmt::Display for ResolvedToken {
    /// `line:column len=N type=<name> mods=<a,b>`, right-aligned for columns.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{:>4}:{:>3} len={:>2} type={} mods={}",
            self.line,
            self.start_column,
            self.length,
            self.token_type,
            self.modifiers.join(","),
        )
    }
}

/// Decode delta-encoded semantic token data against `legend`.
///
/// Produces exactly `data.len() / 5` tokens in input order. Fails only when
/// the length is not a multiple of five; unknown type indices decode to a
/// `<index>` placeholder.
pub fn decode(data: &[u32], legend: &Legend) -> Result<Vec<ResolvedToken>, DecodeError> {
    if !data.len().is_multiple_of(TOKEN_STRIDE) {
        return Err(DecodeError::MalformedTokenData { len: data.len() });
    }

    let mut line: u32 = 0;
    let mut column: u32 = 0;

    let tokens = data
        .chunks_exact(TOKEN_STRIDE)
        .map(|group| {
            let &[delta_line, delta_start, length, type_index, modifier_bits] = group else {
                unreachable!("chunks_exact yields groups of TOKEN_STRIDE");
            };

            line = line.saturating_add(delta_line);
            column = if delta_line == 0 {
                column.saturating_add(delta_start)
            } else {
                delta_start
            };

            ResolvedToken {
                line,
                start_column: column,
                length,
                token_type: legend.type_name(type_index),
                modifiers: legend.modifier_names(modifier_bits),
            }
        })
        .collect();

    Ok(tokens)
}
