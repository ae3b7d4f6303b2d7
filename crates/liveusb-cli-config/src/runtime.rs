// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Runtime configuration types with resolved defaults.

use std::path::PathBuf;

use liveusb_common_catalog::{FuzzyPolicy, ParseOptions};
use liveusb_common_i18n::{TranslatorOptions, SOURCE_LOCALE};
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::layer::*;
use crate::paths::PathsConfig;
use crate::ConfigError;

/// The final, validated configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LiveUsbConfig {
	pub i18n: I18nConfig,
	pub logging: LoggingConfig,

	/// Resolved XDG paths (not serialized)
	#[serde(skip)]
	pub paths: Option<PathsConfig>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct I18nConfig {
	/// Preferred locale; `None` means detect from the system.
	pub locale: Option<String>,
	/// Locale used when the preferred one has no catalog.
	pub fallback_locale: String,
	pub catalog_dir: PathBuf,
	pub fuzzy: FuzzyPolicy,
	pub strict_header: bool,
	pub check_formats: bool,
}

impl I18nConfig {
	pub fn parse_options(&self) -> ParseOptions {
		ParseOptions {
			strict_header: self.strict_header,
			check_formats: self.check_formats,
		}
	}

	pub fn translator_options(&self) -> TranslatorOptions {
		TranslatorOptions {
			fuzzy: self.fuzzy,
			parse: self.parse_options(),
		}
	}
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoggingConfig {
	pub level: LogLevel,
	pub format: LogFormat,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
	Error,
	Warn,
	#[default]
	Info,
	Debug,
	Trace,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
	#[default]
	Pretty,
	Json,
	Compact,
}

impl LiveUsbConfig {
	/// Build runtime config from a merged layer and paths.
	pub fn from_layer(layer: ConfigLayer, paths: PathsConfig) -> Result<Self, ConfigError> {
		let i18n = build_i18n_config(layer.i18n, &paths)?;
		let logging = build_logging_config(layer.logging);

		Ok(Self {
			i18n,
			logging,
			paths: Some(paths),
		})
	}
}

fn build_i18n_config(layer: Option<I18nLayer>, paths: &PathsConfig) -> Result<I18nConfig, ConfigError> {
	let layer = layer.unwrap_or_default();
	let fuzzy = match layer.fuzzy.as_deref() {
		Some(raw) => raw
			.parse::<FuzzyPolicy>()
			.map_err(|e| ConfigError::invalid_value("i18n.fuzzy", e))?,
		None => FuzzyPolicy::default(),
	};

	Ok(I18nConfig {
		locale: layer.locale,
		fallback_locale: layer
			.fallback_locale
			.unwrap_or_else(|| SOURCE_LOCALE.to_string()),
		catalog_dir: layer.catalog_dir.unwrap_or_else(|| paths.catalog_dir()),
		fuzzy,
		strict_header: layer.strict_header.unwrap_or(true),
		check_formats: layer.check_formats.unwrap_or(true),
	})
}

fn build_logging_config(layer: Option<LoggingLayer>) -> LoggingConfig {
	let layer = layer.unwrap_or_default();
	LoggingConfig {
		level: parse_log_level(layer.level.as_deref()),
		format: parse_log_format(layer.format.as_deref()),
	}
}

fn parse_log_level(s: Option<&str>) -> LogLevel {
	match s {
		Some("error") => LogLevel::Error,
		Some("warn") => LogLevel::Warn,
		Some("info") | None => LogLevel::Info,
		Some("debug") => LogLevel::Debug,
		Some("trace") => LogLevel::Trace,
		Some(other) => {
			warn!(level = other, "unknown log level, using info");
			LogLevel::Info
		}
	}
}

fn parse_log_format(s: Option<&str>) -> LogFormat {
	match s {
		Some("json") => LogFormat::Json,
		Some("compact") => LogFormat::Compact,
		Some("pretty") | None => LogFormat::Pretty,
		Some(other) => {
			warn!(format = other, "unknown log format, using pretty");
			LogFormat::Pretty
		}
	}
}
