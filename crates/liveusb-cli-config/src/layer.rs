// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Partial configuration layer for merging from multiple sources.

use serde::Deserialize;
use std::path::PathBuf;

/// Partial configuration layer - all fields are Option for merging.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ConfigLayer {
	#[serde(default)]
	pub i18n: Option<I18nLayer>,
	#[serde(default)]
	pub logging: Option<LoggingLayer>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct I18nLayer {
	#[serde(default)]
	pub locale: Option<String>,
	#[serde(default)]
	pub fallback_locale: Option<String>,
	#[serde(default)]
	pub catalog_dir: Option<PathBuf>,
	#[serde(default)]
	pub fuzzy: Option<String>,
	#[serde(default)]
	pub strict_header: Option<bool>,
	#[serde(default)]
	pub check_formats: Option<bool>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LoggingLayer {
	#[serde(default)]
	pub level: Option<String>,
	#[serde(default)]
	pub format: Option<String>,
}

impl ConfigLayer {
	/// Merge another layer into this one. Other layer takes precedence.
	pub fn merge(&mut self, other: ConfigLayer) {
		merge_option(&mut self.i18n, other.i18n, I18nLayer::merge);
		merge_option(&mut self.logging, other.logging, LoggingLayer::merge);
	}

	pub fn i18n_mut(&mut self) -> &mut I18nLayer {
		self.i18n.get_or_insert_with(I18nLayer::default)
	}

	pub fn logging_mut(&mut self) -> &mut LoggingLayer {
		self.logging.get_or_insert_with(LoggingLayer::default)
	}
}

fn merge_option<T, F>(target: &mut Option<T>, source: Option<T>, merge_fn: F)
where
	F: FnOnce(&mut T, T),
{
	match (target.as_mut(), source) {
		(Some(t), Some(s)) => merge_fn(t, s),
		(None, Some(s)) => *target = Some(s),
		_ => {}
	}
}

fn overwrite<T>(target: &mut Option<T>, source: Option<T>) {
	if source.is_some() {
		*target = source;
	}
}

impl I18nLayer {
	fn merge(&mut self, other: I18nLayer) {
		overwrite(&mut self.locale, other.locale);
		overwrite(&mut self.fallback_locale, other.fallback_locale);
		overwrite(&mut self.catalog_dir, other.catalog_dir);
		overwrite(&mut self.fuzzy, other.fuzzy);
		overwrite(&mut self.strict_header, other.strict_header);
		overwrite(&mut self.check_formats, other.check_formats);
	}
}

impl LoggingLayer {
	fn merge(&mut self, other: LoggingLayer) {
		overwrite(&mut self.level, other.level);
		overwrite(&mut self.format, other.format);
	}
}
