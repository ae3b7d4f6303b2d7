// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Internationalization (i18n) support for the liveusb creator.
//!
//! This crate picks a locale, loads the matching gettext catalog from a
//! [`CatalogSource`] and serves lookups through a [`Translator`]. Messages
//! without a usable translation fall back to the English source text.
//! Both left-to-right (LTR) and right-to-left (RTL) languages are described.
//!
//! # Example
//!
//! ```
//! use liveusb_common_i18n::{resolve_locale, EmbeddedSource, FormatArgs, Translator, TranslatorOptions};
//!
//! let locale = resolve_locale(Some("pt_PT.UTF-8"), None, &EmbeddedSource::bundled());
//!
//! let translator = Translator::new(EmbeddedSource::bundled(), TranslatorOptions::default());
//! translator.set_locale(&locale.to_string()).unwrap();
//!
//! // Translation with variables
//! let text = translator
//! 	.format(None, "Unsupported filesystem: %s", &FormatArgs::positional(["FAT32"]))
//! 	.unwrap();
//! assert_eq!(text, "Sistema de ficheiros não suportado: FAT32");
//!
//! // Untranslated messages come back unchanged
//! assert_eq!(translator.text(None, "Cancel"), "Cancel");
//! ```

mod error;
mod locale;
mod resolve;
mod source;
mod translator;

pub use error::{I18nError, LocaleError, Result};
pub use locale::{locale_info, Direction, LocaleId, LocaleInfo, LOCALES, SOURCE_LOCALE};
pub use resolve::resolve_locale;
pub use source::{has_catalog, load_catalog, CatalogBytes, CatalogDir, CatalogSource, EmbeddedSource};
pub use translator::{ActiveCatalog, Hit, Resolved, Translator, TranslatorOptions};

pub use liveusb_common_catalog::{FormatArg, FormatArgs, FormatKind, FuzzyPolicy, ParseOptions, PlaceholderError};
