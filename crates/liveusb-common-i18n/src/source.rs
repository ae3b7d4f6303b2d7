// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Where catalogs come from.

use std::borrow::Cow;
use std::path::{Path, PathBuf};

use liveusb_common_catalog::{Catalog, CatalogError, ParseOptions};
use tracing::{debug, trace};

use crate::error::{I18nError, Result};
use crate::locale::LocaleId;

/// Raw catalog bytes plus a human-readable origin for error messages.
#[derive(Debug, Clone)]
pub struct CatalogBytes {
	pub tag: String,
	pub origin: String,
	pub bytes: Cow<'static, [u8]>,
}

/// A provider of PO files keyed by catalog tag (`pt`, `pt_BR`, `sr@latin`).
pub trait CatalogSource: Send + Sync {
	/// Name for logging
	fn name(&self) -> &str;

	/// Bytes of the catalog for `tag`, `None` when there is none.
	fn fetch(&self, tag: &str) -> Result<Option<CatalogBytes>>;

	/// Tags this source can serve, sorted.
	fn tags(&self) -> Result<Vec<String>>;
}

impl<S: CatalogSource + ?Sized> CatalogSource for Box<S> {
	fn name(&self) -> &str {
		(**self).name()
	}

	fn fetch(&self, tag: &str) -> Result<Option<CatalogBytes>> {
		(**self).fetch(tag)
	}

	fn tags(&self) -> Result<Vec<String>> {
		(**self).tags()
	}
}

/// A catalog directory holding `<tag>.po` or `<tag>/messages.po`.
#[derive(Debug, Clone)]
pub struct CatalogDir {
	root: PathBuf,
}

impl CatalogDir {
	pub fn new(root: impl Into<PathBuf>) -> Self {
		Self { root: root.into() }
	}

	pub fn root(&self) -> &Path {
		&self.root
	}

	fn path_for(&self, tag: &str) -> Option<PathBuf> {
		[
			self.root.join(format!("{tag}.po")),
			self.root.join(tag).join("messages.po"),
		]
		.into_iter()
		.find(|p| p.is_file())
	}
}

impl CatalogSource for CatalogDir {
	fn name(&self) -> &str {
		"catalog-dir"
	}

	fn fetch(&self, tag: &str) -> Result<Option<CatalogBytes>> {
		let Some(path) = self.path_for(tag) else {
			trace!(root = %self.root.display(), tag, "no catalog file");
			return Ok(None);
		};
		debug!(path = %path.display(), tag, "reading catalog file");
		let bytes = std::fs::read(&path).map_err(|source| {
			I18nError::catalog(
				tag,
				path.display().to_string(),
				CatalogError::Io {
					path: path.clone(),
					source,
				},
			)
		})?;
		Ok(Some(CatalogBytes {
			tag: tag.to_string(),
			origin: path.display().to_string(),
			bytes: Cow::Owned(bytes),
		}))
	}

	fn tags(&self) -> Result<Vec<String>> {
		let io_err = |source| I18nError::Io {
			path: self.root.clone(),
			source,
		};
		let mut tags = Vec::new();
		for dir_entry in std::fs::read_dir(&self.root).map_err(io_err)? {
			let path = dir_entry.map_err(io_err)?.path();
			let Some(name) = path.file_name().and_then(|n| n.to_str()) else {
				continue;
			};
			if path.is_file() {
				if let Some(tag) = name.strip_suffix(".po") {
					tags.push(tag.to_string());
				}
			} else if path.join("messages.po").is_file() {
				tags.push(name.to_string());
			}
		}
		tags.sort();
		tags.dedup();
		Ok(tags)
	}
}

/// Catalogs compiled into the binary.
#[derive(Debug, Clone, Default)]
pub struct EmbeddedSource {
	catalogs: Vec<(&'static str, &'static [u8])>,
}

impl EmbeddedSource {
	pub fn new(catalogs: Vec<(&'static str, &'static [u8])>) -> Self {
		Self { catalogs }
	}

	/// The translations shipped with this crate.
	pub fn bundled() -> Self {
		Self::new(vec![
			("pl", include_bytes!("../locales/pl.po") as &[u8]),
			("pt", include_bytes!("../locales/pt.po") as &[u8]),
		])
	}
}

impl CatalogSource for EmbeddedSource {
	fn name(&self) -> &str {
		"embedded"
	}

	fn fetch(&self, tag: &str) -> Result<Option<CatalogBytes>> {
		Ok(self
			.catalogs
			.iter()
			.find(|(t, _)| *t == tag)
			.map(|(t, bytes)| CatalogBytes {
				tag: t.to_string(),
				origin: format!("embedded:{t}"),
				bytes: Cow::Borrowed(*bytes),
			}))
	}

	fn tags(&self) -> Result<Vec<String>> {
		let mut tags: Vec<String> = self.catalogs.iter().map(|(t, _)| t.to_string()).collect();
		tags.sort();
		Ok(tags)
	}
}

/// True when some candidate of `locale` has a catalog in `source`.
pub fn has_catalog(source: &dyn CatalogSource, locale: &LocaleId) -> Result<bool> {
	for tag in locale.candidates() {
		if source.fetch(&tag)?.is_some() {
			return Ok(true);
		}
	}
	Ok(false)
}

/// Load the most specific catalog available for `locale`.
///
/// Returns the tag that matched with the parsed catalog, or `None` when no
/// candidate exists. A candidate that exists but fails to parse is an error;
/// less specific candidates are not tried in that case.
pub fn load_catalog(
	source: &dyn CatalogSource,
	locale: &LocaleId,
	options: ParseOptions,
) -> Result<Option<(String, Catalog)>> {
	for tag in locale.candidates() {
		let Some(found) = source.fetch(&tag)? else {
			continue;
		};
		let catalog = Catalog::parse_with(&found.bytes, options)
			.map_err(|e| I18nError::catalog(&found.tag, &found.origin, e))?;
		debug!(
			source = source.name(),
			origin = %found.origin,
			locale = %locale,
			tag = %found.tag,
			entries = catalog.len(),
			"loaded catalog"
		);
		return Ok(Some((found.tag, catalog)));
	}
	Ok(None)
}
