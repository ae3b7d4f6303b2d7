// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Default configuration file generation.

use std::fs;
use std::path::Path;

use tracing::{debug, info};

use crate::ConfigError;

/// Default configuration file template, written by `liveusb-i18n config --init`.
pub const DEFAULT_CONFIG_TEMPLATE: &str = r#"#
# liveusb translation settings
# Location: ~/.config/liveusb/config.toml
#

[i18n]
# Preferred locale, e.g. "pt" or "pl_PL.UTF-8". Unset means use the system locale.
# locale = "pt"

# Locale used when the preferred one has no catalog.
fallback_locale = "en"

# Directory holding <locale>.po or <locale>/messages.po files.
# catalog_dir = "/usr/share/liveusb-creator/po"

# Fuzzy entries: "ignore" hides them, "surface" shows them as approximate.
fuzzy = "ignore"

# Require Language and PO-Revision-Date in catalog headers.
strict_header = true

# Reject translations whose placeholders do not match the source.
check_formats = true

[logging]
# Log level: error, warn, info, debug, trace
level = "info"

# Log format: pretty, json, compact
format = "pretty"
"#;

/// Ensure the config directory exists and create a default config file if none exists.
///
/// Returns `true` if a new config file was created, `false` if one already existed.
pub fn ensure_default_config(config_file_path: &Path) -> Result<bool, ConfigError> {
	if config_file_path.exists() {
		debug!(path = %config_file_path.display(), "config file already exists");
		return Ok(false);
	}

	if let Some(parent) = config_file_path.parent() {
		if !parent.exists() {
			debug!(path = %parent.display(), "creating config directory");
			fs::create_dir_all(parent)?;
		}
	}

	info!(path = %config_file_path.display(), "creating default config file");
	fs::write(config_file_path, DEFAULT_CONFIG_TEMPLATE)?;

	Ok(true)
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::layer::ConfigLayer;
	use crate::paths::PathsConfig;
	use crate::runtime::LiveUsbConfig;
	use tempfile::tempdir;

	#[test]
	fn test_default_config_template_is_valid() {
		let layer: ConfigLayer = toml::from_str(DEFAULT_CONFIG_TEMPLATE).unwrap();
		let config = LiveUsbConfig::from_layer(layer, PathsConfig::under_home(Path::new("/tmp/home"))).unwrap();
		crate::validation::validate_config(&config).unwrap();
	}

	#[test]
	fn test_ensure_default_config_creates_file() {
		let dir = tempdir().unwrap();
		let config_path = dir.path().join("liveusb/config.toml");

		let created = ensure_default_config(&config_path).unwrap();
		assert!(created);

		let contents = fs::read_to_string(&config_path).unwrap();
		assert!(contents.contains("[i18n]"));
	}

	#[test]
	fn test_ensure_default_config_does_not_overwrite() {
		let dir = tempdir().unwrap();
		let config_path = dir.path().join("config.toml");

		fs::write(&config_path, "# existing config\n").unwrap();

		let created = ensure_default_config(&config_path).unwrap();
		assert!(!created);

		let contents = fs::read_to_string(&config_path).unwrap();
		assert_eq!(contents, "# existing config\n");
	}
}
