// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Catalog error types.

use std::fmt;
use std::path::PathBuf;

use thiserror::Error;

use crate::entry::MessageKey;

/// Errors raised while loading, building or compiling a catalog.
///
/// Every parse-time error is fatal for the catalog being loaded. The parser
/// never skips a malformed entry.
#[derive(Debug, Error)]
pub enum CatalogError {
	/// Structurally invalid file or header.
	#[error("format error at line {line}: {message}")]
	Format { line: usize, message: String },

	/// Declared charset does not match the bytes, or cannot be used.
	#[error("encoding error{}: {message}", at_offset(.offset))]
	Encoding {
		offset: Option<usize>,
		message: String,
	},

	/// The same (context, msgid) appears twice.
	#[error("duplicate message {key} at line {line} (first defined at line {first_line})")]
	DuplicateKey {
		key: MessageKey,
		first_line: usize,
		line: usize,
	},

	/// A non-fuzzy translation does not preserve the declared placeholders.
	#[error("placeholder mismatch at line {line} for {key}: {message}")]
	FormatMismatch {
		key: MessageKey,
		line: usize,
		message: String,
	},

	/// The catalog cannot be written as a `.mo` file.
	#[error("cannot compile catalog: {0}")]
	Compile(String),

	/// I/O error reading a catalog file.
	#[error("I/O error reading {path}: {source}")]
	Io {
		path: PathBuf,
		#[source]
		source: std::io::Error,
	},
}

impl CatalogError {
	/// Create a format error
	pub fn format(line: usize, message: impl Into<String>) -> Self {
		Self::Format {
			line,
			message: message.into(),
		}
	}

	/// Create an encoding error
	pub fn encoding(offset: Option<usize>, message: impl Into<String>) -> Self {
		Self::Encoding {
			offset,
			message: message.into(),
		}
	}

	/// Line number the error points at, if any.
	pub fn line(&self) -> Option<usize> {
		match self {
			Self::Format { line, .. } | Self::DuplicateKey { line, .. } | Self::FormatMismatch { line, .. } => {
				Some(*line)
			}
			_ => None,
		}
	}
}

/// Why a lookup did not produce a translation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MissReason {
	NotFound,
	Untranslated,
	/// Only a fuzzy translation exists and the policy ignores it.
	Fuzzy,
}

impl fmt::Display for MissReason {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(match self {
			MissReason::NotFound => "not in catalog",
			MissReason::Untranslated => "untranslated",
			MissReason::Fuzzy => "fuzzy",
		})
	}
}

/// A lookup miss. Not fatal: callers fall back to the source text.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("no translation for {key} ({reason})")]
pub struct MissingTranslation {
	pub key: MessageKey,
	pub reason: MissReason,
}

fn at_offset(offset: &Option<usize>) -> String {
	offset
		.map(|o| format!(" at byte {o}"))
		.unwrap_or_default()
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn test_encoding_error_display_with_offset() {
		let err = CatalogError::encoding(Some(42), "invalid UTF-8");
		assert_eq!(err.to_string(), "encoding error at byte 42: invalid UTF-8");
	}

	#[test]
	fn test_encoding_error_display_without_offset() {
		let err = CatalogError::encoding(None, "unknown charset 'foo'");
		assert_eq!(err.to_string(), "encoding error: unknown charset 'foo'");
	}

	#[test]
	fn test_line_is_reported_for_grammar_errors() {
		assert_eq!(CatalogError::format(7, "boom").line(), Some(7));
		assert_eq!(CatalogError::Compile("x".into()).line(), None);
	}

	#[test]
	fn test_missing_translation_display() {
		let miss = MissingTranslation {
			key: MessageKey::new(Some("button"), "Cancel"),
			reason: MissReason::Untranslated,
		};
		assert_eq!(miss.to_string(), "no translation for \"button\" / \"Cancel\" (untranslated)");
	}
}
