// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Locale resolution logic.

use tracing::debug;

use crate::locale::LocaleId;
use crate::source::{has_catalog, CatalogSource};

/// Resolve the effective locale from user preference and configured default.
///
/// Resolution order (highest to lowest priority):
/// 1. User's preferred locale (if it parses and a catalog exists for it)
/// 2. Configured default locale (same conditions)
/// 3. The source language ("en"), which needs no catalog
///
/// The source language itself is always accepted.
pub fn resolve_locale(preferred: Option<&str>, default: Option<&str>, source: &dyn CatalogSource) -> LocaleId {
	for (origin, raw) in [("preferred", preferred), ("default", default)] {
		let Some(raw) = raw else {
			continue;
		};
		let locale = match LocaleId::parse(raw) {
			Ok(locale) => locale,
			Err(e) => {
				debug!(origin, locale = raw, error = %e, "ignoring unparsable locale");
				continue;
			}
		};
		if locale.is_source() {
			return locale;
		}
		match has_catalog(source, &locale) {
			Ok(true) => return locale,
			Ok(false) => debug!(origin, %locale, "no catalog for locale"),
			Err(e) => debug!(origin, %locale, error = %e, "catalog lookup failed"),
		}
	}

	LocaleId::source()
}
