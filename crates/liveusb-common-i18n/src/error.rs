// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

use std::path::PathBuf;

use liveusb_common_catalog::CatalogError;
use thiserror::Error;

/// Unparsable locale identifier.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LocaleError {
	#[error("empty locale identifier")]
	Empty,

	#[error("invalid locale identifier '{input}': {reason}")]
	Invalid { input: String, reason: &'static str },
}

/// Errors from the catalog loading path.
#[derive(Debug, Error)]
pub enum I18nError {
	#[error(transparent)]
	Locale(#[from] LocaleError),

	/// A catalog was found but rejected.
	#[error("catalog for '{locale}' ({origin}) is invalid: {source}")]
	Catalog {
		locale: String,
		origin: String,
		#[source]
		source: CatalogError,
	},

	#[error("cannot read catalog directory {path}: {source}")]
	Io {
		path: PathBuf,
		#[source]
		source: std::io::Error,
	},
}

impl I18nError {
	pub fn catalog(locale: impl Into<String>, origin: impl Into<String>, source: CatalogError) -> Self {
		Self::Catalog {
			locale: locale.into(),
			origin: origin.into(),
			source,
		}
	}
}

pub type Result<T> = std::result::Result<T, I18nError>;
