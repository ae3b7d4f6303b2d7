// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Configuration validation rules.

use liveusb_common_i18n::LocaleId;
use tracing::warn;

use crate::runtime::LiveUsbConfig;
use crate::ConfigError;

/// Validate the configuration.
///
/// Returns Ok(()) if valid, or ConfigError::InvalidValue with details.
pub fn validate_config(config: &LiveUsbConfig) -> Result<(), ConfigError> {
	validate_i18n(config)?;

	Ok(())
}

fn validate_i18n(config: &LiveUsbConfig) -> Result<(), ConfigError> {
	let i18n = &config.i18n;

	if let Some(locale) = &i18n.locale {
		LocaleId::parse(locale).map_err(|e| ConfigError::invalid_value("i18n.locale", e.to_string()))?;
	}
	LocaleId::parse(&i18n.fallback_locale)
		.map_err(|e| ConfigError::invalid_value("i18n.fallback_locale", e.to_string()))?;

	if i18n.catalog_dir.as_os_str().is_empty() {
		return Err(ConfigError::invalid_value("i18n.catalog_dir", "cannot be empty"));
	}
	if i18n.catalog_dir.exists() && !i18n.catalog_dir.is_dir() {
		return Err(ConfigError::invalid_value(
			"i18n.catalog_dir",
			format!("{} is not a directory", i18n.catalog_dir.display()),
		));
	}

	if !i18n.check_formats {
		// Broken placeholders then surface only when a message is formatted
		warn!("i18n.check_formats is disabled");
	}

	Ok(())
}
