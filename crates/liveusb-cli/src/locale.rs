// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

use std::sync::OnceLock;

use liveusb_common_i18n::LocaleId;
use tracing::debug;

static DETECTED_LOCALE: OnceLock<Option<String>> = OnceLock::new();

/// The user's locale, detected once from the operating system.
/// `None` if detection fails or the system reports something unparsable.
pub fn system_locale() -> Option<&'static str> {
	DETECTED_LOCALE.get_or_init(detect_locale).as_deref()
}

fn detect_locale() -> Option<String> {
	let raw = sys_locale::get_locale()?;
	normalize(&raw)
}

fn normalize(raw: &str) -> Option<String> {
	match LocaleId::parse(raw) {
		Ok(locale) => Some(locale.to_string()),
		Err(e) => {
			debug!(locale = raw, error = %e, "ignoring system locale");
			None
		}
	}
}
