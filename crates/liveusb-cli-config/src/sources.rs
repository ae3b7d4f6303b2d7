// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Configuration sources: files, environment, CLI, defaults.

use std::path::PathBuf;

use tracing::{debug, trace, warn};

use crate::layer::*;
use crate::paths::{PathsConfig, SYSTEM_CONFIG_FILE, WORKSPACE_CONFIG_FILE};
use crate::ConfigError;

/// Source precedence levels (higher = overrides lower).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Precedence {
	Defaults = 10,
	SystemFile = 20,
	UserFile = 30,
	WorkspaceFile = 40,
	Environment = 50,
	Cli = 60,
}

/// Trait for configuration sources.
pub trait ConfigSource: Send + Sync {
	/// Name for logging
	fn name(&self) -> &'static str;

	/// Precedence level
	fn precedence(&self) -> Precedence;

	/// Load configuration layer from this source
	fn load(&self) -> Result<ConfigLayer, ConfigError>;
}

/// Built-in defaults source.
pub struct DefaultsSource;

impl ConfigSource for DefaultsSource {
	fn name(&self) -> &'static str {
		"defaults"
	}
	fn precedence(&self) -> Precedence {
		Precedence::Defaults
	}

	fn load(&self) -> Result<ConfigLayer, ConfigError> {
		debug!("loading defaults");
		// Defaults are applied in LiveUsbConfig::from_layer
		Ok(ConfigLayer::default())
	}
}

/// File-based configuration source (TOML).
pub struct FileSource {
	path: PathBuf,
	precedence: Precedence,
	name: &'static str,
	required: bool,
}

impl FileSource {
	/// System config: /etc/liveusb/config.toml
	pub fn system() -> Self {
		Self::optional(PathBuf::from(SYSTEM_CONFIG_FILE), Precedence::SystemFile, "system-config")
	}

	/// User config: ~/.config/liveusb/config.toml
	pub fn user(paths: &PathsConfig) -> Self {
		Self::optional(paths.user_config_file.clone(), Precedence::UserFile, "user-config")
	}

	/// Workspace config: .liveusb/config.toml
	pub fn workspace() -> Result<Self, ConfigError> {
		let cwd = std::env::current_dir()?;
		Ok(Self::optional(
			cwd.join(WORKSPACE_CONFIG_FILE),
			Precedence::WorkspaceFile,
			"workspace-config",
		))
	}

	/// A file named on the command line. It must exist.
	pub fn custom(path: PathBuf, precedence: Precedence, name: &'static str) -> Self {
		Self {
			path,
			precedence,
			name,
			required: true,
		}
	}

	fn optional(path: PathBuf, precedence: Precedence, name: &'static str) -> Self {
		Self {
			path,
			precedence,
			name,
			required: false,
		}
	}
}

impl ConfigSource for FileSource {
	fn name(&self) -> &'static str {
		self.name
	}
	fn precedence(&self) -> Precedence {
		self.precedence
	}

	fn load(&self) -> Result<ConfigLayer, ConfigError> {
		if !self.path.exists() {
			if self.required {
				return Err(ConfigError::FileNotFound(self.path.clone()));
			}
			debug!(path = %self.path.display(), source = self.name, "config file not found, skipping");
			return Ok(ConfigLayer::default());
		}

		debug!(path = %self.path.display(), source = self.name, "loading config file");

		let content = std::fs::read_to_string(&self.path)?;
		let layer: ConfigLayer = toml::from_str(&content).map_err(|e| ConfigError::TomlParse {
			path: self.path.clone(),
			source: e,
		})?;

		trace!(source = self.name, "parsed config layer");
		Ok(layer)
	}
}

/// Environment variable source.
///
/// Convention: LIVEUSB_<FIELD>, e.g. `LIVEUSB_LOCALE`, `LIVEUSB_LOG_LEVEL`.
pub struct EnvSource;

impl EnvSource {
	/// Build a layer from `(name, value)` pairs. Unknown names are ignored.
	pub fn layer_from_vars<I>(vars: I) -> ConfigLayer
	where
		I: IntoIterator<Item = (String, String)>,
	{
		let mut layer = ConfigLayer::default();

		for (key, value) in vars {
			if !key.starts_with("LIVEUSB_") {
				continue;
			}

			let value = value.trim().to_string();
			if value.is_empty() {
				continue;
			}

			trace!(key = %key, "processing env var");

			match key.as_str() {
				"LIVEUSB_LOCALE" => layer.i18n_mut().locale = Some(value),
				"LIVEUSB_FALLBACK_LOCALE" => layer.i18n_mut().fallback_locale = Some(value),
				"LIVEUSB_CATALOG_DIR" => layer.i18n_mut().catalog_dir = Some(PathBuf::from(value)),
				"LIVEUSB_FUZZY" => layer.i18n_mut().fuzzy = Some(value),
				"LIVEUSB_STRICT_HEADER" => match parse_bool(&value) {
					Some(v) => layer.i18n_mut().strict_header = Some(v),
					None => warn!(key = %key, value = %value, "expected a boolean, ignoring"),
				},
				"LIVEUSB_CHECK_FORMATS" => match parse_bool(&value) {
					Some(v) => layer.i18n_mut().check_formats = Some(v),
					None => warn!(key = %key, value = %value, "expected a boolean, ignoring"),
				},
				"LIVEUSB_LOG_LEVEL" => layer.logging_mut().level = Some(value),
				"LIVEUSB_LOG_FORMAT" => layer.logging_mut().format = Some(value),
				_ => {
					// Unknown LIVEUSB_ variable, ignore
				}
			}
		}

		layer
	}
}

impl ConfigSource for EnvSource {
	fn name(&self) -> &'static str {
		"environment"
	}
	fn precedence(&self) -> Precedence {
		Precedence::Environment
	}

	fn load(&self) -> Result<ConfigLayer, ConfigError> {
		debug!("loading environment variables");
		Ok(Self::layer_from_vars(std::env::vars()))
	}
}

fn parse_bool(value: &str) -> Option<bool> {
	match value.to_ascii_lowercase().as_str() {
		"1" | "true" | "yes" | "on" => Some(true),
		"0" | "false" | "no" | "off" => Some(false),
		_ => None,
	}
}

/// CLI override source.
pub struct CliSource {
	overrides: CliOverrides,
}

/// CLI argument overrides.
#[derive(Debug, Clone, Default)]
pub struct CliOverrides {
	pub locale: Option<String>,
	pub catalog_dir: Option<PathBuf>,
	pub fuzzy: Option<String>,
	pub log_level: Option<String>,
	pub log_format: Option<String>,
	pub config_file: Option<PathBuf>,
}

impl CliSource {
	pub fn new(overrides: CliOverrides) -> Self {
		Self { overrides }
	}
}

impl ConfigSource for CliSource {
	fn name(&self) -> &'static str {
		"cli"
	}
	fn precedence(&self) -> Precedence {
		Precedence::Cli
	}

	fn load(&self) -> Result<ConfigLayer, ConfigError> {
		debug!("loading CLI overrides");
		let mut layer = ConfigLayer::default();
		let overrides = &self.overrides;

		if let Some(ref locale) = overrides.locale {
			layer.i18n_mut().locale = Some(locale.clone());
		}
		if let Some(ref dir) = overrides.catalog_dir {
			layer.i18n_mut().catalog_dir = Some(dir.clone());
		}
		if let Some(ref fuzzy) = overrides.fuzzy {
			layer.i18n_mut().fuzzy = Some(fuzzy.clone());
		}
		if let Some(ref level) = overrides.log_level {
			layer.logging_mut().level = Some(level.clone());
		}
		if let Some(ref format) = overrides.log_format {
			layer.logging_mut().format = Some(format.clone());
		}

		Ok(layer)
	}
}
