// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! POSIX locale identifiers and per-language metadata.

use std::fmt;
use std::str::FromStr;

use serde::{Serialize, Serializer};

use crate::error::LocaleError;

/// Language of the msgids. It never needs a catalog.
pub const SOURCE_LOCALE: &str = "en";

/// A parsed `ll[_CC][.codeset][@modifier]` identifier.
///
/// `ll-CC` is accepted as well. The codeset is kept for display only; it
/// plays no part in catalog selection.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct LocaleId {
	language: String,
	territory: Option<String>,
	codeset: Option<String>,
	modifier: Option<String>,
}

impl LocaleId {
	pub fn parse(input: &str) -> Result<Self, LocaleError> {
		let input = input.trim();
		if input.is_empty() {
			return Err(LocaleError::Empty);
		}
		let invalid = |reason| LocaleError::Invalid {
			input: input.to_string(),
			reason,
		};

		let (rest, modifier) = match input.split_once('@') {
			Some((rest, modifier)) => (rest, Some(modifier)),
			None => (input, None),
		};
		let (rest, codeset) = match rest.split_once('.') {
			Some((rest, codeset)) => (rest, Some(codeset)),
			None => (rest, None),
		};

		if rest == "C" || rest == "POSIX" {
			return Ok(Self::source());
		}

		let (language, territory) = match rest.split_once(['_', '-']) {
			Some((language, territory)) => (language, Some(territory)),
			None => (rest, None),
		};

		if !(2..=3).contains(&language.len()) || !language.chars().all(|c| c.is_ascii_alphabetic()) {
			return Err(invalid("language must be 2 or 3 letters"));
		}
		if let Some(territory) = territory {
			let letters = territory.len() == 2 && territory.chars().all(|c| c.is_ascii_alphabetic());
			let digits = territory.len() == 3 && territory.chars().all(|c| c.is_ascii_digit());
			if !letters && !digits {
				return Err(invalid("territory must be 2 letters or 3 digits"));
			}
		}
		if let Some(modifier) = modifier {
			if modifier.is_empty() || !modifier.chars().all(|c| c.is_ascii_alphanumeric() || c == '-') {
				return Err(invalid("modifier must be alphanumeric"));
			}
		}
		if codeset.is_some_and(str::is_empty) {
			return Err(invalid("empty codeset"));
		}

		Ok(Self {
			language: language.to_ascii_lowercase(),
			territory: territory.map(str::to_ascii_uppercase),
			codeset: codeset.map(str::to_string),
			modifier: modifier.map(str::to_ascii_lowercase),
		})
	}

	/// The source language.
	pub fn source() -> Self {
		Self {
			language: SOURCE_LOCALE.to_string(),
			territory: None,
			codeset: None,
			modifier: None,
		}
	}

	pub fn language(&self) -> &str {
		&self.language
	}

	pub fn territory(&self) -> Option<&str> {
		self.territory.as_deref()
	}

	pub fn modifier(&self) -> Option<&str> {
		self.modifier.as_deref()
	}

	/// True for plain `en`, `C` and `POSIX`.
	pub fn is_source(&self) -> bool {
		self.language == SOURCE_LOCALE && self.territory.is_none() && self.modifier.is_none()
	}

	/// Catalog name: `ll[_CC][@modifier]`.
	pub fn tag(&self) -> String {
		let mut tag = self.language.clone();
		if let Some(territory) = &self.territory {
			tag.push('_');
			tag.push_str(territory);
		}
		if let Some(modifier) = &self.modifier {
			tag.push('@');
			tag.push_str(modifier);
		}
		tag
	}

	/// Catalog names to try, most specific first.
	///
	/// `pt_BR.UTF-8@mod` yields `pt_BR@mod`, `pt@mod`, `pt_BR`, `pt`.
	pub fn candidates(&self) -> Vec<String> {
		let lang = &self.language;
		let mut out = Vec::with_capacity(4);
		if let Some(modifier) = &self.modifier {
			if let Some(territory) = &self.territory {
				out.push(format!("{lang}_{territory}@{modifier}"));
			}
			out.push(format!("{lang}@{modifier}"));
		}
		if let Some(territory) = &self.territory {
			out.push(format!("{lang}_{territory}"));
		}
		out.push(lang.clone());
		out
	}
}

impl fmt::Display for LocaleId {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(&self.language)?;
		if let Some(territory) = &self.territory {
			write!(f, "_{territory}")?;
		}
		if let Some(codeset) = &self.codeset {
			write!(f, ".{codeset}")?;
		}
		if let Some(modifier) = &self.modifier {
			write!(f, "@{modifier}")?;
		}
		Ok(())
	}
}

impl FromStr for LocaleId {
	type Err = LocaleError;

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		Self::parse(s)
	}
}

impl Serialize for LocaleId {
	fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
		serializer.serialize_str(&self.to_string())
	}
}

/// Text direction for a locale.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
	/// Left-to-right (e.g., English, Portuguese)
	Ltr,
	/// Right-to-left (e.g., Arabic, Hebrew)
	Rtl,
}

impl Direction {
	pub fn as_str(&self) -> &'static str {
		match self {
			Direction::Ltr => "ltr",
			Direction::Rtl => "rtl",
		}
	}
}

/// Metadata about a language the creator ships translations for.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LocaleInfo {
	/// Catalog tag (e.g., "pt", "pt_BR")
	pub code: &'static str,
	/// English name of the language
	pub name: &'static str,
	/// Native name of the language
	pub native_name: &'static str,
	pub direction: Direction,
}

macro_rules! locale {
	($code:literal, $name:literal, $native:literal, $dir:ident) => {
		LocaleInfo {
			code: $code,
			name: $name,
			native_name: $native,
			direction: Direction::$dir,
		}
	};
}

/// Known languages.
pub const LOCALES: &[LocaleInfo] = &[
	locale!("en", "English", "English", Ltr),
	locale!("ar", "Arabic", "العربية", Rtl),
	locale!("cs", "Czech", "Čeština", Ltr),
	locale!("de", "German", "Deutsch", Ltr),
	locale!("el", "Greek", "Ελληνικά", Ltr),
	locale!("es", "Spanish", "Español", Ltr),
	locale!("fa", "Persian", "فارسی", Rtl),
	locale!("fr", "French", "Français", Ltr),
	locale!("he", "Hebrew", "עברית", Rtl),
	locale!("it", "Italian", "Italiano", Ltr),
	locale!("ja", "Japanese", "日本語", Ltr),
	locale!("nl", "Dutch", "Nederlands", Ltr),
	locale!("pl", "Polish", "Polski", Ltr),
	locale!("pt", "Portuguese", "Português", Ltr),
	locale!("pt_BR", "Portuguese (Brazil)", "Português (Brasil)", Ltr),
	locale!("ru", "Russian", "Русский", Ltr),
	locale!("sr@latin", "Serbian (Latin)", "Srpski", Ltr),
	locale!("sv", "Swedish", "Svenska", Ltr),
	locale!("zh_CN", "Chinese (Simplified)", "简体中文", Ltr),
];

/// Metadata for the most specific known candidate of `locale`.
pub fn locale_info(locale: &LocaleId) -> Option<&'static LocaleInfo> {
	locale
		.candidates()
		.iter()
		.find_map(|tag| LOCALES.iter().find(|l| l.code == tag.as_str()))
}

#[cfg(test)]
mod tests {
	use super::*;
	use proptest::prelude::*;

	fn id(s: &str) -> LocaleId {
		LocaleId::parse(s).unwrap()
	}

	#[test]
	fn test_parse_full_identifier() {
		let locale = id("pt_BR.UTF-8@mod");
		assert_eq!(locale.language(), "pt");
		assert_eq!(locale.territory(), Some("BR"));
		assert_eq!(locale.modifier(), Some("mod"));
		assert_eq!(locale.tag(), "pt_BR@mod");
		assert_eq!(locale.to_string(), "pt_BR.UTF-8@mod");
	}

	#[test]
	fn test_candidates_order() {
		assert_eq!(id("pt_BR.UTF-8").candidates(), vec!["pt_BR", "pt"]);
		assert_eq!(
			id("pt_BR.UTF-8@mod").candidates(),
			vec!["pt_BR@mod", "pt@mod", "pt_BR", "pt"]
		);
		assert_eq!(id("sr@latin").candidates(), vec!["sr@latin", "sr"]);
		assert_eq!(id("pl").candidates(), vec!["pl"]);
	}

	#[test]
	fn test_bcp47_style_and_case() {
		let locale = id("PT-br");
		assert_eq!(locale.tag(), "pt_BR");
		assert_eq!(id("es-419").territory(), Some("419"));
	}

	#[test]
	fn test_posix_locales_are_source() {
		assert!(id("C").is_source());
		assert!(id("POSIX").is_source());
		assert!(id("C.UTF-8").is_source());
		assert!(id("en").is_source());
		assert!(!id("en_GB").is_source());
	}

	#[test]
	fn test_invalid_identifiers() {
		assert_eq!(LocaleId::parse("  "), Err(LocaleError::Empty));
		for bad in ["p", "portuguese", "pt_BRA", "pt_", "pt@", "pt.", "p1", "pt@a b"] {
			assert!(LocaleId::parse(bad).is_err(), "{bad} should be rejected");
		}
	}

	#[test]
	fn test_locale_info() {
		assert_eq!(locale_info(&id("pt_BR.UTF-8")).unwrap().code, "pt_BR");
		assert_eq!(locale_info(&id("pt_PT")).unwrap().code, "pt");
		assert_eq!(locale_info(&id("sr@latin")).unwrap().native_name, "Srpski");
		assert!(locale_info(&id("xx")).is_none());
	}

	#[test]
	fn test_locale_direction() {
		let direction = |tag: &str| locale_info(&id(tag)).map(|info| info.direction);
		assert_eq!(direction("ar_EG"), Some(Direction::Rtl));
		assert_eq!(direction("he"), Some(Direction::Rtl));
		assert_eq!(direction("pt"), Some(Direction::Ltr));
		assert_eq!(direction("xx"), None);
	}

	#[test]
	fn test_direction_as_str() {
		assert_eq!(Direction::Ltr.as_str(), "ltr");
		assert_eq!(Direction::Rtl.as_str(), "rtl");
	}

	proptest! {
		/// Candidates always end with the bare language and start with the tag.
		#[test]
		fn candidates_are_ordered(
			lang in "[a-z]{2,3}",
			territory in prop::option::of("[A-Z]{2}"),
			modifier in prop::option::of("[a-z]{1,8}"),
		) {
			let mut raw = lang.clone();
			if let Some(t) = &territory {
				raw.push('_');
				raw.push_str(t);
			}
			raw.push_str(".UTF-8");
			if let Some(m) = &modifier {
				raw.push('@');
				raw.push_str(m);
			}
			let locale = LocaleId::parse(&raw).unwrap();
			let candidates = locale.candidates();
			prop_assert_eq!(candidates.first().unwrap(), &locale.tag());
			prop_assert_eq!(candidates.last().unwrap(), &lang);
		}
	}
}
