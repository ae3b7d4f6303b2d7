// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! The process-wide lookup service.
//!
//! A [`Translator`] publishes the active locale and its catalog as one
//! immutable [`ActiveCatalog`] behind `RwLock<Arc<_>>`. Lookups clone the
//! `Arc` and never observe a half-switched state. A locale switch parses the
//! new catalog completely before swapping it in; if parsing fails the old
//! snapshot stays active.

use std::sync::{Arc, PoisonError, RwLock};

use liveusb_common_catalog::format::{self, FormatArgs, FormatKind, PlaceholderError};
use liveusb_common_catalog::{Catalog, Entry, FuzzyPolicy, MessageKey, MissReason, MissingTranslation, ParseOptions};
use tracing::{info, trace, warn};

use crate::error::Result;
use crate::locale::LocaleId;
use crate::source::{load_catalog, CatalogSource};

/// Lookup and loading behavior.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TranslatorOptions {
	pub fuzzy: FuzzyPolicy,
	pub parse: ParseOptions,
}

/// One published locale state.
#[derive(Debug)]
pub struct ActiveCatalog {
	locale: LocaleId,
	tag: Option<String>,
	catalog: Option<Catalog>,
}

impl ActiveCatalog {
	fn untranslated(locale: LocaleId) -> Self {
		Self {
			locale,
			tag: None,
			catalog: None,
		}
	}

	pub fn locale(&self) -> &LocaleId {
		&self.locale
	}

	/// Tag of the catalog file in use, `None` for the source language.
	pub fn tag(&self) -> Option<&str> {
		self.tag.as_deref()
	}

	pub fn catalog(&self) -> Option<&Catalog> {
		self.catalog.as_ref()
	}
}

/// A found translation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Hit {
	pub text: String,
	pub approximate: bool,
}

/// Outcome of a lookup together with the source text to fall back to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Resolved {
	source: String,
	outcome: std::result::Result<Hit, MissingTranslation>,
	format: Option<FormatKind>,
}

impl Resolved {
	pub fn outcome(&self) -> std::result::Result<&Hit, &MissingTranslation> {
		self.outcome.as_ref()
	}

	pub fn is_translated(&self) -> bool {
		self.outcome.is_ok()
	}

	pub fn approximate(&self) -> bool {
		self.outcome.as_ref().is_ok_and(|hit| hit.approximate)
	}

	/// The text the caller falls back to on a miss.
	pub fn source_text(&self) -> &str {
		&self.source
	}

	/// Placeholder syntax of the message, `None` when it is declared free of
	/// placeholders.
	pub fn format_kind(&self) -> Option<FormatKind> {
		self.format
	}

	/// The translation, or the source text on a miss.
	pub fn or_source(&self) -> &str {
		match &self.outcome {
			Ok(hit) => &hit.text,
			Err(_) => &self.source,
		}
	}

	pub fn into_text(self) -> String {
		match self.outcome {
			Ok(hit) => hit.text,
			Err(_) => self.source,
		}
	}

	/// Substitute `args` into [`Resolved::or_source`].
	///
	/// Arguments are checked against the placeholders of the source text, so
	/// a caller error is caught whether or not a translation exists.
	pub fn render(&self, args: &FormatArgs) -> std::result::Result<String, PlaceholderError> {
		let text = self.or_source();
		match self.format {
			Some(kind) => format::substitute_translated(&self.source, text, kind, args),
			None if args.is_empty() => Ok(text.to_string()),
			None => Err(PlaceholderError::Arity {
				expected: 0,
				found: args.len(),
			}),
		}
	}
}

/// Runtime translation service for one process.
pub struct Translator {
	source: Box<dyn CatalogSource>,
	options: TranslatorOptions,
	active: RwLock<Arc<ActiveCatalog>>,
}

impl Translator {
	/// A translator serving the source language until a locale is set.
	pub fn new(source: impl CatalogSource + 'static, options: TranslatorOptions) -> Self {
		Self {
			source: Box::new(source),
			options,
			active: RwLock::new(Arc::new(ActiveCatalog::untranslated(LocaleId::source()))),
		}
	}

	pub fn options(&self) -> TranslatorOptions {
		self.options
	}

	pub fn catalog_source(&self) -> &dyn CatalogSource {
		self.source.as_ref()
	}

	/// Load the catalog for `locale` and publish it.
	///
	/// A locale without any catalog publishes the source language under that
	/// locale. An unparsable identifier or a broken catalog returns the error
	/// and keeps the current state.
	pub fn set_locale(&self, locale: &str) -> Result<Arc<ActiveCatalog>> {
		let locale = LocaleId::parse(locale)?;
		let next = if locale.is_source() {
			ActiveCatalog::untranslated(locale)
		} else {
			match load_catalog(self.source.as_ref(), &locale, self.options.parse) {
				Ok(Some((tag, catalog))) => ActiveCatalog {
					locale,
					tag: Some(tag),
					catalog: Some(catalog),
				},
				Ok(None) => {
					info!(%locale, source = self.source.name(), "no catalog for locale, using source language");
					ActiveCatalog::untranslated(locale)
				}
				Err(e) => {
					warn!(%locale, error = %e, "rejected catalog, keeping current locale");
					return Err(e);
				}
			}
		};

		let next = Arc::new(next);
		let previous = std::mem::replace(
			&mut *self.active.write().unwrap_or_else(PoisonError::into_inner),
			Arc::clone(&next),
		);
		info!(
			from = %previous.locale,
			to = %next.locale,
			tag = next.tag.as_deref().unwrap_or("none"),
			entries = next.catalog.as_ref().map_or(0, Catalog::len),
			"switched locale"
		);
		Ok(next)
	}

	/// The current published state.
	pub fn snapshot(&self) -> Arc<ActiveCatalog> {
		Arc::clone(&self.active.read().unwrap_or_else(PoisonError::into_inner))
	}

	pub fn locale(&self) -> LocaleId {
		self.snapshot().locale.clone()
	}

	pub fn lookup(&self, context: Option<&str>, msgid: &str) -> Resolved {
		self.resolve(context, msgid, None)
	}

	pub fn lookup_plural(&self, context: Option<&str>, msgid: &str, msgid_plural: &str, n: u64) -> Resolved {
		self.resolve(context, msgid, Some((msgid_plural, n)))
	}

	/// Translated text, or `msgid` itself.
	pub fn text(&self, context: Option<&str>, msgid: &str) -> String {
		self.lookup(context, msgid).into_text()
	}

	/// Translated plural text, or the source form for `n`.
	pub fn plural(&self, context: Option<&str>, msgid: &str, msgid_plural: &str, n: u64) -> String {
		self.lookup_plural(context, msgid, msgid_plural, n).into_text()
	}

	/// Translate and substitute.
	pub fn format(
		&self,
		context: Option<&str>,
		msgid: &str,
		args: &FormatArgs,
	) -> std::result::Result<String, PlaceholderError> {
		self.lookup(context, msgid).render(args)
	}

	pub fn format_plural(
		&self,
		context: Option<&str>,
		msgid: &str,
		msgid_plural: &str,
		n: u64,
		args: &FormatArgs,
	) -> std::result::Result<String, PlaceholderError> {
		self.lookup_plural(context, msgid, msgid_plural, n).render(args)
	}

	fn resolve(&self, context: Option<&str>, msgid: &str, plural: Option<(&str, u64)>) -> Resolved {
		let active = self.snapshot();
		let source = match plural {
			Some((msgid_plural, n)) if n != 1 => msgid_plural,
			_ => msgid,
		};

		let Some(catalog) = active.catalog() else {
			return Resolved {
				source: source.to_string(),
				outcome: Err(MissingTranslation {
					key: MessageKey::new(context, msgid),
					reason: MissReason::NotFound,
				}),
				format: Some(FormatKind::Python),
			};
		};

		let policy = self.options.fuzzy;
		let result = match plural {
			Some((_, n)) => catalog.lookup_plural(context, msgid, n, policy),
			None => catalog.lookup(context, msgid, policy),
		};
		let entry = match &result {
			Ok(hit) => Some(hit.entry),
			Err(_) => catalog.get(context, msgid).or_else(|| catalog.get(None, msgid)),
		};
		let outcome = result.map(|t| Hit {
			text: t.text.to_string(),
			approximate: t.approximate,
		});
		if let Err(miss) = &outcome {
			trace!(locale = %active.locale, %miss, "falling back to source text");
		}

		Resolved {
			source: source.to_string(),
			outcome,
			format: entry.map_or(Some(FormatKind::Python), declared_format),
		}
	}
}

/// Placeholder syntax an entry declares; unflagged entries default to Python.
fn declared_format(entry: &Entry) -> Option<FormatKind> {
	if let Some(kind) = entry.format_kind() {
		return Some(kind);
	}
	let negated = FormatKind::ALL.iter().any(|kind| entry.has_flag(kind.negated_flag()));
	(!negated).then_some(FormatKind::Python)
}
