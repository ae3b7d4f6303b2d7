// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Gettext PO catalogs for the liveusb creator.
//!
//! This crate reads `.po` files into an immutable [`Catalog`], validates them
//! (header metadata, declared charset, duplicate keys, placeholder
//! preservation), answers lookups, and writes catalogs back out as PO text or
//! compiled `.mo` files.
//!
//! # Example
//!
//! ```
//! use liveusb_common_catalog::{format, Catalog, FormatArgs, FormatKind, FuzzyPolicy};
//!
//! let po = r#"
//! msgid ""
//! msgstr ""
//! "Language: pt\n"
//! "PO-Revision-Date: 2008-09-18 22:01+0100\n"
//! "Content-Type: text/plain; charset=UTF-8\n"
//!
//! #, python-format
//! msgid "Unsupported filesystem: %s"
//! msgstr "Sistema de ficheiros não suportado: %s"
//! "#;
//!
//! let catalog = Catalog::parse(po.as_bytes()).unwrap();
//! let hit = catalog
//! 	.lookup(None, "Unsupported filesystem: %s", FuzzyPolicy::Ignore)
//! 	.unwrap();
//! let text = format::substitute(hit.text, FormatKind::Python, &FormatArgs::positional(["FAT32"])).unwrap();
//! assert_eq!(text, "Sistema de ficheiros não suportado: FAT32");
//! ```

mod catalog;
mod encoding;
mod entry;
mod error;
pub mod format;
mod header;
mod mo;
mod parser;
mod plural;
mod writer;

pub use catalog::{Catalog, CatalogStats, Diagnostic, FuzzyPolicy, ParseOptions, Translation};
pub use entry::{Entry, MessageKey, Msgstr, PreviousStrings, SourceRef, FUZZY_FLAG};
pub use error::{CatalogError, MissReason, MissingTranslation};
pub use format::{FormatArg, FormatArgs, FormatKind, PlaceholderError};
pub use header::{Header, TIMESTAMP_FORMAT};
pub use mo::compile_mo;
pub use plural::{PluralForms, DEFAULT_PLURAL_FORMS};
