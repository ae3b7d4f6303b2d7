// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! XDG Base Directory compliant path resolution.

use std::path::{Path, PathBuf};

use crate::ConfigError;

/// System-wide config file.
pub const SYSTEM_CONFIG_FILE: &str = "/etc/liveusb/config.toml";

/// Workspace config file, relative to the current directory.
pub const WORKSPACE_CONFIG_FILE: &str = ".liveusb/config.toml";

/// Resolved XDG paths for liveusb.
#[derive(Debug, Clone)]
pub struct PathsConfig {
	/// User config file: ~/.config/liveusb/config.toml
	pub user_config_file: PathBuf,
	/// System config file: /etc/liveusb/config.toml
	pub system_config_file: PathBuf,
	/// Data directory: ~/.local/share/liveusb/
	pub data_dir: PathBuf,
}

impl PathsConfig {
	/// Paths rooted under `home`, ignoring the XDG variables.
	pub fn under_home(home: &Path) -> Self {
		Self::from_homes(home.join(".config"), home.join(".local/share"))
	}

	fn from_homes(config_home: PathBuf, data_home: PathBuf) -> Self {
		Self {
			user_config_file: config_home.join("liveusb/config.toml"),
			system_config_file: PathBuf::from(SYSTEM_CONFIG_FILE),
			data_dir: data_home.join("liveusb"),
		}
	}

	/// Get the config directory (parent of user_config_file)
	pub fn config_dir(&self) -> PathBuf {
		self
			.user_config_file
			.parent()
			.map(|p| p.to_path_buf())
			.unwrap_or_else(|| self.user_config_file.clone())
	}

	/// Default directory for user-installed catalogs.
	pub fn catalog_dir(&self) -> PathBuf {
		self.data_dir.join("locale")
	}
}

/// Resolve XDG paths according to the Base Directory Specification.
///
/// Uses environment variables if set, otherwise falls back to defaults:
/// - XDG_CONFIG_HOME or ~/.config
/// - XDG_DATA_HOME or ~/.local/share
pub fn resolve_xdg_paths() -> Result<PathsConfig, ConfigError> {
	let home = dirs::home_dir().ok_or(ConfigError::HomeDirNotFound)?;

	let config_home = std::env::var_os("XDG_CONFIG_HOME")
		.map(PathBuf::from)
		.unwrap_or_else(|| home.join(".config"));

	let data_home = std::env::var_os("XDG_DATA_HOME")
		.map(PathBuf::from)
		.unwrap_or_else(|| home.join(".local/share"));

	tracing::debug!(
		config_home = %config_home.display(),
		data_home = %data_home.display(),
		"resolved XDG paths"
	);

	Ok(PathsConfig::from_homes(config_home, data_home))
}

/// Get the workspace config file path from current directory.
pub fn workspace_config_path() -> Result<PathBuf, ConfigError> {
	let cwd = std::env::current_dir()?;
	Ok(cwd.join(WORKSPACE_CONFIG_FILE))
}
