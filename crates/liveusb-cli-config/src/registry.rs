// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Configuration registry - manages sources and merges layers.

use tracing::{debug, info};

use crate::layer::ConfigLayer;
use crate::paths::PathsConfig;
use crate::runtime::LiveUsbConfig;
use crate::sources::ConfigSource;
use crate::validation::validate_config;
use crate::ConfigError;

/// Registry that manages configuration sources and merges them.
pub struct ConfigRegistry {
	sources: Vec<Box<dyn ConfigSource>>,
}

impl ConfigRegistry {
	/// Create a new empty registry.
	pub fn new() -> Self {
		Self {
			sources: Vec::new(),
		}
	}

	/// Register a configuration source.
	pub fn register(&mut self, source: Box<dyn ConfigSource>) {
		debug!(source = source.name(), precedence = ?source.precedence(), "registering config source");
		self.sources.push(source);
	}

	/// Load configuration from all sources, merge, and validate.
	///
	/// Sources are sorted by precedence (lowest first) and merged
	/// so higher precedence sources override lower ones. A missing optional
	/// file contributes an empty layer; any other source failure aborts.
	pub fn load(&self, paths: PathsConfig) -> Result<LiveUsbConfig, ConfigError> {
		let mut sorted_sources: Vec<_> = self.sources.iter().collect();
		sorted_sources.sort_by_key(|s| s.precedence());

		info!(
			source_count = sorted_sources.len(),
			"loading configuration from sources"
		);

		let mut merged = ConfigLayer::default();
		for source in &sorted_sources {
			let layer = source.load()?;
			debug!(source = source.name(), "merging config layer");
			merged.merge(layer);
		}

		let config = LiveUsbConfig::from_layer(merged, paths)?;

		validate_config(&config)?;

		info!(
			locale = config.i18n.locale.as_deref().unwrap_or("system"),
			catalog_dir = %config.i18n.catalog_dir.display(),
			fuzzy = %config.i18n.fuzzy,
			log_level = ?config.logging.level,
			"configuration loaded successfully"
		);

		Ok(config)
	}

	/// Get the number of registered sources.
	pub fn source_count(&self) -> usize {
		self.sources.len()
	}
}

impl Default for ConfigRegistry {
	fn default() -> Self {
		Self::new()
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::sources::{DefaultsSource, Precedence};
	use std::path::Path;

	fn paths() -> PathsConfig {
		PathsConfig::under_home(Path::new("/tmp/test"))
	}

	struct MockSource {
		name: &'static str,
		precedence: Precedence,
		locale: &'static str,
	}

	impl ConfigSource for MockSource {
		fn name(&self) -> &'static str {
			self.name
		}
		fn precedence(&self) -> Precedence {
			self.precedence
		}

		fn load(&self) -> Result<ConfigLayer, ConfigError> {
			let mut layer = ConfigLayer::default();
			layer.i18n_mut().locale = Some(self.locale.to_string());
			Ok(layer)
		}
	}

	struct FailingSource;

	impl ConfigSource for FailingSource {
		fn name(&self) -> &'static str {
			"failing"
		}
		fn precedence(&self) -> Precedence {
			Precedence::UserFile
		}

		fn load(&self) -> Result<ConfigLayer, ConfigError> {
			Err(ConfigError::validation("broken source"))
		}
	}

	#[test]
	fn test_registry_registers_sources() {
		let mut registry = ConfigRegistry::new();
		assert_eq!(registry.source_count(), 0);

		registry.register(Box::new(DefaultsSource));
		assert_eq!(registry.source_count(), 1);
	}

	#[test]
	fn test_registry_loads_with_defaults() {
		let mut registry = ConfigRegistry::new();
		registry.register(Box::new(DefaultsSource));

		let config = registry.load(paths()).unwrap();
		assert_eq!(config.i18n.fallback_locale, "en");
	}

	/// Sources registered out of order still merge by precedence.
	#[test]
	fn test_precedence_merge_order() {
		let mut registry = ConfigRegistry::new();
		for (name, precedence, locale) in [
			("cli", Precedence::Cli, "pt"),
			("env", Precedence::Environment, "pl"),
			("workspace", Precedence::WorkspaceFile, "de"),
			("user", Precedence::UserFile, "fr"),
			("system", Precedence::SystemFile, "es"),
		] {
			registry.register(Box::new(MockSource {
				name,
				precedence,
				locale,
			}));
		}

		let config = registry.load(paths()).unwrap();
		assert_eq!(config.i18n.locale.as_deref(), Some("pt"));
	}

	#[test]
	fn test_source_failure_aborts_load() {
		let mut registry = ConfigRegistry::new();
		registry.register(Box::new(DefaultsSource));
		registry.register(Box::new(FailingSource));
		assert!(matches!(registry.load(paths()), Err(ConfigError::Validation(_))));
	}

	#[test]
	fn test_invalid_merged_config_is_rejected() {
		let mut registry = ConfigRegistry::new();
		registry.register(Box::new(MockSource {
			name: "cli",
			precedence: Precedence::Cli,
			locale: "not a locale",
		}));
		assert!(matches!(
			registry.load(paths()),
			Err(ConfigError::InvalidValue { .. })
		));
	}
}
