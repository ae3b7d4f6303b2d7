// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! The in-memory catalog: validated entries, their index and lookups.

use std::collections::HashMap;
use std::fmt;
use std::path::Path;
use std::str::FromStr;

use encoding_rs::{Encoding, UTF_8};
use serde::{Deserialize, Serialize};

use crate::encoding::{self, encoding_for_label};
use crate::entry::{Entry, MessageKey, Msgstr};
use crate::error::{CatalogError, MissReason, MissingTranslation};
use crate::format::check_compatible;
use crate::header::Header;
use crate::parser::parse_entries;
use crate::plural::PluralForms;
use crate::writer;

/// Project name written into headers of catalogs created from scratch.
const PROJECT: &str = "liveusb-creator";

/// What lookups do with entries flagged `fuzzy`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FuzzyPolicy {
	/// Treat fuzzy entries as absent.
	#[default]
	Ignore,
	/// Return fuzzy entries marked as approximate.
	Surface,
}

impl fmt::Display for FuzzyPolicy {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			FuzzyPolicy::Ignore => write!(f, "ignore"),
			FuzzyPolicy::Surface => write!(f, "surface"),
		}
	}
}

impl FromStr for FuzzyPolicy {
	type Err = String;

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		match s.to_lowercase().as_str() {
			"ignore" => Ok(FuzzyPolicy::Ignore),
			"surface" => Ok(FuzzyPolicy::Surface),
			_ => Err(format!("invalid fuzzy policy: {s}")),
		}
	}
}

/// Validation switches for [`Catalog::parse_with`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ParseOptions {
	/// Require `Language` and `PO-Revision-Date` in the header.
	pub strict_header: bool,
	/// Reject non-fuzzy translations that break placeholders.
	pub check_formats: bool,
}

impl ParseOptions {
	pub fn strict() -> Self {
		Self {
			strict_header: true,
			check_formats: true,
		}
	}

	/// Accepts older catalogs that predate the `Language` field.
	pub fn lenient() -> Self {
		Self {
			strict_header: false,
			check_formats: true,
		}
	}
}

impl Default for ParseOptions {
	fn default() -> Self {
		Self::strict()
	}
}

/// A successful lookup.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Translation<'a> {
	pub text: &'a str,
	/// The entry is fuzzy and was surfaced by policy.
	pub approximate: bool,
	pub entry: &'a Entry,
}

/// Counts in the style of `msgfmt --statistics`. The header is not counted.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct CatalogStats {
	pub translated: usize,
	pub fuzzy: usize,
	pub untranslated: usize,
	pub obsolete: usize,
}

impl CatalogStats {
	/// Active messages.
	pub fn total(&self) -> usize {
		self.translated + self.fuzzy + self.untranslated
	}

	pub fn percent_translated(&self) -> f64 {
		match self.total() {
			0 => 100.0,
			total => self.translated as f64 * 100.0 / total as f64,
		}
	}
}

impl fmt::Display for CatalogStats {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		fn plural(n: usize, one: &str, many: &str) -> String {
			format!("{n} {}", if n == 1 { one } else { many })
		}
		write!(
			f,
			"{}, {}, {}",
			plural(self.translated, "translated message", "translated messages"),
			plural(self.fuzzy, "fuzzy translation", "fuzzy translations"),
			plural(self.untranslated, "untranslated message", "untranslated messages"),
		)?;
		if self.obsolete > 0 {
			write!(f, ", {}", plural(self.obsolete, "obsolete entry", "obsolete entries"))?;
		}
		Ok(())
	}
}

/// A non-fatal finding from [`Catalog::check`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Diagnostic {
	pub line: Option<usize>,
	pub message: String,
}

impl fmt::Display for Diagnostic {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self.line {
			Some(line) => write!(f, "line {line}: {}", self.message),
			None => f.write_str(&self.message),
		}
	}
}

/// A parsed, validated message catalog for one language.
///
/// Immutable once built from a file; share it as `Arc<Catalog>`.
#[derive(Debug, Clone)]
pub struct Catalog {
	header: Header,
	header_entry: Entry,
	header_line: Option<usize>,
	plural_forms: PluralForms,
	encoding: &'static Encoding,
	entries: Vec<Entry>,
	lines: Vec<Option<usize>>,
	index: HashMap<MessageKey, usize>,
	obsolete_index: HashMap<MessageKey, usize>,
}

impl Catalog {
	/// An empty UTF-8 catalog for `language`.
	pub fn new(language: &str) -> Self {
		let header = Header::new(PROJECT, language);
		Self {
			header_entry: Entry::new("", header.to_msgstr()),
			header,
			header_line: None,
			plural_forms: PluralForms::default(),
			encoding: UTF_8,
			entries: Vec::new(),
			lines: Vec::new(),
			index: HashMap::new(),
			obsolete_index: HashMap::new(),
		}
	}

	/// Parse catalog bytes with strict validation.
	pub fn parse(bytes: &[u8]) -> Result<Self, CatalogError> {
		Self::parse_with(bytes, ParseOptions::default())
	}

	pub fn parse_with(bytes: &[u8], options: ParseOptions) -> Result<Self, CatalogError> {
		let decoded = encoding::decode(bytes)?;
		tracing::trace!(declared = ?decoded.declared, encoding = decoded.encoding.name(), "decoded catalog bytes");
		let mut parsed = parse_entries(&decoded.text)?.into_iter();

		let first = parsed
			.next()
			.filter(|p| p.entry.is_header() && !p.entry.obsolete)
			.ok_or_else(|| CatalogError::format(1, "missing header entry (msgid \"\")"))?;
		let header_line = first.line;
		let header = Header::parse(first.entry.msgstr.form(0).unwrap_or_default())
			.map_err(|msg| CatalogError::format(header_line, msg))?;
		let plural_forms = validate_header(&header, header_line, decoded.encoding, options)?;

		let mut catalog = Self {
			header,
			header_entry: first.entry,
			header_line: Some(header_line),
			plural_forms,
			encoding: decoded.encoding,
			entries: Vec::new(),
			lines: Vec::new(),
			index: HashMap::new(),
			obsolete_index: HashMap::new(),
		};

		for parsed in parsed {
			if parsed.entry.is_header() && !parsed.entry.obsolete {
				return Err(CatalogError::DuplicateKey {
					key: parsed.entry.key(),
					first_line: header_line,
					line: parsed.line,
				});
			}
			if options.check_formats && !parsed.entry.obsolete && !parsed.entry.is_fuzzy() {
				if let Some(message) = placeholder_problem(&parsed.entry) {
					return Err(CatalogError::FormatMismatch {
						key: parsed.entry.key(),
						line: parsed.line,
						message,
					});
				}
			}
			catalog.insert(parsed.entry, Some(parsed.line))?;
		}

		tracing::debug!(
			language = catalog.language().unwrap_or("unknown"),
			charset = catalog.encoding.name(),
			entries = catalog.entries.len(),
			"parsed catalog"
		);
		Ok(catalog)
	}

	/// Read and parse a catalog file.
	pub fn from_path(path: impl AsRef<Path>, options: ParseOptions) -> Result<Self, CatalogError> {
		let path = path.as_ref();
		tracing::debug!(path = %path.display(), "reading catalog");
		let bytes = std::fs::read(path).map_err(|source| CatalogError::Io {
			path: path.to_path_buf(),
			source,
		})?;
		Self::parse_with(&bytes, options)
	}

	/// Add an entry. Duplicate keys are rejected; programmatic entries carry
	/// no line, reported as 0.
	pub fn push(&mut self, entry: Entry) -> Result<(), CatalogError> {
		if entry.is_header() && !entry.obsolete {
			return Err(CatalogError::format(0, "the header entry cannot be pushed"));
		}
		self.insert(entry, None)
	}

	fn insert(&mut self, entry: Entry, line: Option<usize>) -> Result<(), CatalogError> {
		let key = entry.key();
		let index = if entry.obsolete {
			&mut self.obsolete_index
		} else {
			&mut self.index
		};
		if let Some(&first) = index.get(&key) {
			return Err(CatalogError::DuplicateKey {
				key,
				first_line: self.lines[first].unwrap_or(0),
				line: line.unwrap_or(0),
			});
		}
		index.insert(key, self.entries.len());
		self.entries.push(entry);
		self.lines.push(line);
		Ok(())
	}

	pub fn header(&self) -> &Header {
		&self.header
	}

	/// Replace the metadata. `Plural-Forms` must parse.
	pub fn set_header(&mut self, header: Header) -> Result<(), CatalogError> {
		let line = self.header_line.unwrap_or(0);
		self.plural_forms = match header.plural_forms() {
			Some(raw) => PluralForms::parse(raw).map_err(|e| CatalogError::format(line, e))?,
			None => PluralForms::default(),
		};
		self.header = header;
		Ok(())
	}

	/// Comments and flags of the header entry.
	pub fn header_entry(&self) -> &Entry {
		&self.header_entry
	}

	pub fn language(&self) -> Option<&str> {
		self.header.language()
	}

	pub fn plural_forms(&self) -> &PluralForms {
		&self.plural_forms
	}

	pub fn encoding(&self) -> &'static Encoding {
		self.encoding
	}

	/// All entries in file order, obsolete ones included.
	pub fn entries(&self) -> &[Entry] {
		&self.entries
	}

	/// Active entries.
	pub fn iter(&self) -> impl Iterator<Item = &Entry> {
		self.entries.iter().filter(|e| !e.obsolete)
	}

	pub fn len(&self) -> usize {
		self.entries.len()
	}

	pub fn is_empty(&self) -> bool {
		self.entries.is_empty()
	}

	/// Active entry for an exact key.
	pub fn get(&self, context: Option<&str>, msgid: &str) -> Option<&Entry> {
		self.index
			.get(&MessageKey::new(context, msgid))
			.map(|&i| &self.entries[i])
	}

	/// Line an entry started on, when it came from a file.
	pub fn line_of(&self, entry_index: usize) -> Option<usize> {
		self.lines.get(entry_index).copied().flatten()
	}

	/// Look up a singular message.
	///
	/// Tries the exact `(context, msgid)` key, then the context-less key.
	/// A plural entry answers with its first form.
	pub fn lookup(
		&self,
		context: Option<&str>,
		msgid: &str,
		policy: FuzzyPolicy,
	) -> Result<Translation<'_>, MissingTranslation> {
		self.resolve(context, msgid, policy, |msgstr| msgstr.form(0))
	}

	/// Look up a plural message, selecting the form for `n` with the
	/// catalog's `Plural-Forms`.
	pub fn lookup_plural(
		&self,
		context: Option<&str>,
		msgid: &str,
		n: u64,
		policy: FuzzyPolicy,
	) -> Result<Translation<'_>, MissingTranslation> {
		let index = self.plural_forms.index(n);
		self.resolve(context, msgid, policy, |msgstr| msgstr.form(index))
	}

	fn resolve<'a>(
		&'a self,
		context: Option<&str>,
		msgid: &str,
		policy: FuzzyPolicy,
		pick: impl Fn(&'a Msgstr) -> Option<&'a str>,
	) -> Result<Translation<'a>, MissingTranslation> {
		let exact = MessageKey::new(context, msgid);
		let fallback = context.map(|_| MessageKey::new(None, msgid));
		let mut reason = MissReason::NotFound;

		for key in std::iter::once(&exact).chain(fallback.as_ref()) {
			let Some(&i) = self.index.get(key) else {
				continue;
			};
			let entry = &self.entries[i];
			let miss = if entry.is_fuzzy() && policy == FuzzyPolicy::Ignore {
				MissReason::Fuzzy
			} else {
				match pick(&entry.msgstr) {
					Some(text) if !text.is_empty() => {
						return Ok(Translation {
							text,
							approximate: entry.is_fuzzy(),
							entry,
						});
					}
					_ => MissReason::Untranslated,
				}
			};
			if reason == MissReason::NotFound {
				reason = miss;
			}
		}

		tracing::trace!(key = %exact, %reason, "lookup miss");
		Err(MissingTranslation { key: exact, reason })
	}

	pub fn stats(&self) -> CatalogStats {
		let mut stats = CatalogStats::default();
		for entry in &self.entries {
			if entry.obsolete {
				stats.obsolete += 1;
			} else if entry.is_fuzzy() && !entry.msgstr.is_empty() {
				stats.fuzzy += 1;
			} else if entry.msgstr.is_complete() {
				stats.translated += 1;
			} else {
				stats.untranslated += 1;
			}
		}
		stats
	}

	/// Non-fatal problems worth a translator's attention.
	///
	/// `expected_language` is the locale the file name claims, if known.
	pub fn check(&self, expected_language: Option<&str>) -> Vec<Diagnostic> {
		let mut diagnostics = Vec::new();
		let header_line = self.header_line;

		if self.header_entry.is_fuzzy() {
			diagnostics.push(Diagnostic {
				line: header_line,
				message: "header entry is marked fuzzy".to_string(),
			});
		}
		if self.header.has_template_translator() {
			diagnostics.push(Diagnostic {
				line: header_line,
				message: "Last-Translator still holds the template placeholder".to_string(),
			});
		}
		if let Some(expected) = expected_language {
			match self.language() {
				Some(language) if same_language(language, expected) => {}
				Some(language) => diagnostics.push(Diagnostic {
					line: header_line,
					message: format!("Language header '{language}' does not match catalog name '{expected}'"),
				}),
				None => diagnostics.push(Diagnostic {
					line: header_line,
					message: format!("Language header is missing (catalog name '{expected}')"),
				}),
			}
		}

		let nplurals = self.plural_forms.nplurals();
		for (i, entry) in self.entries.iter().enumerate() {
			if entry.obsolete || entry.msgstr.is_empty() {
				continue;
			}
			let line = self.line_of(i);
			if let Msgstr::Plural(forms) = &entry.msgstr {
				if forms.len() != nplurals {
					diagnostics.push(Diagnostic {
						line,
						message: format!(
							"{} has {} plural forms but Plural-Forms declares {nplurals}",
							entry.key(),
							forms.len()
						),
					});
				}
			}
			if let Some(problem) = placeholder_problem(entry) {
				let status = if entry.is_fuzzy() { "fuzzy " } else { "" };
				diagnostics.push(Diagnostic {
					line,
					message: format!("{status}translation of {} breaks placeholders: {problem}", entry.key()),
				});
			}
		}

		diagnostics
	}

	/// Serialize in PO layout, header first.
	pub fn to_po_string(&self) -> String {
		let mut header_entry = self.header_entry.clone();
		header_entry.msgstr = Msgstr::Singular(self.header.to_msgstr());
		writer::write_entries(std::iter::once(&header_entry).chain(&self.entries))
	}

	/// Serialize and encode in the catalog's charset.
	pub fn to_po_bytes(&self) -> Result<Vec<u8>, CatalogError> {
		encoding::encode(&self.to_po_string(), self.encoding)
	}
}

fn validate_header(
	header: &Header,
	line: usize,
	decoded_as: &'static Encoding,
	options: ParseOptions,
) -> Result<PluralForms, CatalogError> {
	let charset = header
		.charset()
		.ok_or_else(|| CatalogError::format(line, "Content-Type does not declare a charset"))?;
	let declared = encoding_for_label(charset)?;
	if declared != decoded_as {
		return Err(CatalogError::encoding(
			None,
			format!("header declares {charset} but the file decodes as {}", decoded_as.name()),
		));
	}

	let revision = header
		.revision_date()
		.map_err(|e| CatalogError::format(line, format!("PO-Revision-Date: {e}")))?;
	if options.strict_header {
		if header.language().is_none() {
			return Err(CatalogError::format(line, "header has no Language field"));
		}
		if revision.is_none() {
			return Err(CatalogError::format(line, "header has no PO-Revision-Date"));
		}
	}

	match header.plural_forms() {
		Some(raw) => PluralForms::parse(raw).map_err(|e| CatalogError::format(line, format!("Plural-Forms: {e}"))),
		None => Ok(PluralForms::default()),
	}
}

/// Describe how a translation breaks the placeholders of its source.
fn placeholder_problem(entry: &Entry) -> Option<String> {
	let kind = entry.format_kind()?;
	match &entry.msgstr {
		Msgstr::Singular(text) if text.is_empty() => None,
		Msgstr::Singular(text) => check_compatible(&entry.msgid, text, kind, false).err(),
		Msgstr::Plural(forms) => {
			let source = entry.msgid_plural.as_deref().unwrap_or(&entry.msgid);
			forms
				.iter()
				.enumerate()
				.filter(|(_, form)| !form.is_empty())
				.find_map(|(i, form)| {
					check_compatible(source, form, kind, true)
						.err()
						.map(|e| format!("msgstr[{i}]: {e}"))
				})
		}
	}
}

fn same_language(a: &str, b: &str) -> bool {
	let normalize = |s: &str| s.replace('-', "_").to_lowercase();
	normalize(a) == normalize(b)
}

#[cfg(test)]
mod tests {
	use super::*;
	use proptest::prelude::*;
	use std::io::Write;

	const PT: &str = r#"# Portuguese translation of liveusb-creator.
msgid ""
msgstr ""
"Project-Id-Version: liveusb-creator\n"
"POT-Creation-Date: 2008-08-02 12:34+0000\n"
"PO-Revision-Date: 2008-09-18 22:01+0100\n"
"Last-Translator: Rui Gouveia <rui.gouveia@globaltek.pt>\n"
"Language-Team: Portuguese <fedora-trans-pt@redhat.com>\n"
"Language: pt\n"
"MIME-Version: 1.0\n"
"Content-Type: text/plain; charset=UTF-8\n"
"Content-Transfer-Encoding: 8bit\n"

#: liveusb/creator.py:737
#, python-format
msgid "Unsupported filesystem: %s"
msgstr "Sistema de ficheiros não suportado: %s"

#: liveusb/gui.py:120
msgid "Cancel"
msgstr ""

#: liveusb/gui.py:311
#, fuzzy
msgid "Complete! (%s)"
msgstr "Terminado!"

msgctxt "button"
msgid "Refresh"
msgstr "Actualizar"

msgid "Partitioning device"
msgstr "A particionar o dispositivo"

#~ msgid "Old string"
#~ msgstr "Texto antigo"
"#;

	fn pt() -> Catalog {
		Catalog::parse(PT.as_bytes()).unwrap()
	}

	fn with_header(body: &str) -> String {
		format!(
			"msgid \"\"\nmsgstr \"\"\n\"Language: pl\\n\"\n\"PO-Revision-Date: 2024-01-01 10:00+0000\\n\"\n\"Content-Type: text/plain; charset=UTF-8\\n\"\n\"Plural-Forms: nplurals=3; plural=(n==1 ? 0 : n%10>=2 && n%10<=4 && (n%100<10 || n%100>=20) ? 1 : 2);\\n\"\n\n{body}"
		)
	}

	#[test]
	fn test_parse_pt_catalog() {
		let catalog = pt();
		assert_eq!(catalog.language(), Some("pt"));
		assert_eq!(catalog.len(), 6);
		assert_eq!(catalog.iter().count(), 5);
		assert_eq!(catalog.header_entry().translator_comments.len(), 1);
		assert_eq!(catalog.plural_forms(), &PluralForms::default());
		assert_eq!(catalog.line_of(0), Some(16));
	}

	#[test]
	fn test_lookup_translated() {
		let catalog = pt();
		let t = catalog.lookup(None, "Unsupported filesystem: %s", FuzzyPolicy::Ignore).unwrap();
		assert_eq!(t.text, "Sistema de ficheiros não suportado: %s");
		assert!(!t.approximate);
		assert_eq!(t.entry.references[0].line, Some(737));
	}

	#[test]
	fn test_empty_msgstr_is_a_miss() {
		let miss = pt().lookup(None, "Cancel", FuzzyPolicy::Surface).unwrap_err();
		assert_eq!(miss.reason, MissReason::Untranslated);
		assert_eq!(miss.key, MessageKey::new(None, "Cancel"));
	}

	#[test]
	fn test_unknown_message_is_a_miss() {
		let miss = pt().lookup(None, "Format drive", FuzzyPolicy::Ignore).unwrap_err();
		assert_eq!(miss.reason, MissReason::NotFound);
	}

	#[test]
	fn test_fuzzy_policy() {
		let catalog = pt();
		let miss = catalog.lookup(None, "Complete! (%s)", FuzzyPolicy::Ignore).unwrap_err();
		assert_eq!(miss.reason, MissReason::Fuzzy);

		let t = catalog.lookup(None, "Complete! (%s)", FuzzyPolicy::Surface).unwrap();
		assert_eq!(t.text, "Terminado!");
		assert!(t.approximate);
	}

	#[test]
	fn test_context_resolution() {
		let catalog = pt();
		assert_eq!(
			catalog.lookup(Some("button"), "Refresh", FuzzyPolicy::Ignore).unwrap().text,
			"Actualizar"
		);
		assert!(catalog.lookup(None, "Refresh", FuzzyPolicy::Ignore).is_err());
		assert_eq!(
			catalog
				.lookup(Some("status"), "Partitioning device", FuzzyPolicy::Ignore)
				.unwrap()
				.text,
			"A particionar o dispositivo"
		);
	}

	#[test]
	fn test_obsolete_entries_are_not_looked_up() {
		let miss = pt().lookup(None, "Old string", FuzzyPolicy::Surface).unwrap_err();
		assert_eq!(miss.reason, MissReason::NotFound);
	}

	#[test]
	fn test_plural_lookup_uses_plural_forms() {
		let text = with_header(
			"#, python-format\nmsgid \"%d drive\"\nmsgid_plural \"%d drives\"\nmsgstr[0] \"%d dysk\"\nmsgstr[1] \"%d dyski\"\nmsgstr[2] \"%d dysków\"\n",
		);
		let catalog = Catalog::parse(text.as_bytes()).unwrap();
		let form = |n| {
			catalog
				.lookup_plural(None, "%d drive", n, FuzzyPolicy::Ignore)
				.unwrap()
				.text
		};
		assert_eq!(form(1), "%d dysk");
		assert_eq!(form(3), "%d dyski");
		assert_eq!(form(5), "%d dysków");
		assert_eq!(catalog.lookup(None, "%d drive", FuzzyPolicy::Ignore).unwrap().text, "%d dysk");
	}

	#[test]
	fn test_empty_plural_form_is_a_miss() {
		let text = with_header("msgid \"file\"\nmsgid_plural \"files\"\nmsgstr[0] \"plik\"\nmsgstr[1] \"\"\nmsgstr[2] \"plików\"\n");
		let catalog = Catalog::parse(text.as_bytes()).unwrap();
		let miss = catalog.lookup_plural(None, "file", 2, FuzzyPolicy::Ignore).unwrap_err();
		assert_eq!(miss.reason, MissReason::Untranslated);
		assert!(catalog.lookup_plural(None, "file", 5, FuzzyPolicy::Ignore).is_ok());
	}

	#[test]
	fn test_duplicate_key_reports_both_lines() {
		let text = with_header("msgid \"a\"\nmsgstr \"x\"\n\nmsgid \"a\"\nmsgstr \"y\"\n");
		match Catalog::parse(text.as_bytes()) {
			Err(CatalogError::DuplicateKey { key, first_line, line }) => {
				assert_eq!(key, MessageKey::new(None, "a"));
				assert_eq!(first_line, 8);
				assert_eq!(line, 11);
			}
			other => panic!("expected duplicate key, got {other:?}"),
		}
	}

	#[test]
	fn test_same_msgid_in_other_context_is_not_a_duplicate() {
		let text = with_header("msgid \"a\"\nmsgstr \"x\"\n\nmsgctxt \"\"\nmsgid \"a\"\nmsgstr \"y\"\n\n#~ msgid \"a\"\n#~ msgstr \"z\"\n");
		let catalog = Catalog::parse(text.as_bytes()).unwrap();
		assert_eq!(catalog.lookup(Some(""), "a", FuzzyPolicy::Ignore).unwrap().text, "y");
		assert_eq!(catalog.stats().obsolete, 1);
	}

	#[test]
	fn test_duplicate_obsolete_entries_are_rejected() {
		let text = with_header("#~ msgid \"a\"\n#~ msgstr \"x\"\n\n#~ msgid \"a\"\n#~ msgstr \"y\"\n");
		assert!(matches!(
			Catalog::parse(text.as_bytes()),
			Err(CatalogError::DuplicateKey { .. })
		));
	}

	#[test]
	fn test_missing_header_is_a_format_error() {
		match Catalog::parse(b"msgid \"Cancel\"\nmsgstr \"Cancelar\"\n") {
			Err(CatalogError::Format { line, .. }) => assert_eq!(line, 1),
			other => panic!("expected format error, got {other:?}"),
		}
	}

	#[test]
	fn test_missing_charset_is_a_format_error() {
		let text = PT.replace("\"Content-Type: text/plain; charset=UTF-8\\n\"\n", "");
		assert!(matches!(
			Catalog::parse(text.as_bytes()),
			Err(CatalogError::Format { line: 2, .. })
		));
	}

	#[test]
	fn test_strict_header_requires_language() {
		let text = PT.replace("\"Language: pt\\n\"\n", "");
		assert!(matches!(
			Catalog::parse(text.as_bytes()),
			Err(CatalogError::Format { .. })
		));
		let catalog = Catalog::parse_with(text.as_bytes(), ParseOptions::lenient()).unwrap();
		assert_eq!(catalog.language(), None);
	}

	#[test]
	fn test_malformed_plural_forms_header() {
		let text = PT.replace(
			"\"Content-Transfer-Encoding: 8bit\\n\"\n",
			"\"Plural-Forms: nplurals=2; plural=(n !=;\\n\"\n",
		);
		assert!(matches!(
			Catalog::parse(text.as_bytes()),
			Err(CatalogError::Format { line: 2, .. })
		));
	}

	#[test]
	fn test_invalid_utf8_bytes_are_an_encoding_error() {
		let mut bytes = with_header("msgid \"Cancel\"\nmsgstr \"").into_bytes();
		bytes.extend_from_slice(b"Cancelar a\xE7\xE3o\"\n");
		assert!(matches!(
			Catalog::parse(&bytes),
			Err(CatalogError::Encoding { offset: Some(_), .. })
		));
	}

	#[test]
	fn test_latin1_catalog_round_trips_its_encoding() {
		let text = PT.replace("charset=UTF-8", "charset=ISO-8859-1");
		let (bytes, _, _) = encoding_rs::WINDOWS_1252.encode(&text);
		let catalog = Catalog::parse(&bytes).unwrap();
		assert_eq!(
			catalog.lookup(None, "Unsupported filesystem: %s", FuzzyPolicy::Ignore).unwrap().text,
			"Sistema de ficheiros não suportado: %s"
		);
		let written = catalog.to_po_bytes().unwrap();
		assert!(written.windows(3).any(|w| w == b"n\xE3o"));
	}

	#[test]
	fn test_placeholder_mismatch_is_rejected() {
		let text = with_header("#, python-format\nmsgid \"Unsupported filesystem: %s\"\nmsgstr \"Sistema de ficheiros não suportado\"\n");
		match Catalog::parse(text.as_bytes()) {
			Err(CatalogError::FormatMismatch { key, line, .. }) => {
				assert_eq!(key.msgid, "Unsupported filesystem: %s");
				assert_eq!(line, 9);
			}
			other => panic!("expected format mismatch, got {other:?}"),
		}
		let options = ParseOptions {
			check_formats: false,
			..ParseOptions::strict()
		};
		assert!(Catalog::parse_with(text.as_bytes(), options).is_ok());
	}

	#[test]
	fn test_plural_forms_may_omit_the_count() {
		let text = with_header(
			"#, python-format\nmsgid \"%d file\"\nmsgid_plural \"%d files\"\nmsgstr[0] \"jeden plik\"\nmsgstr[1] \"%d pliki\"\nmsgstr[2] \"%d plików\"\n",
		);
		assert!(Catalog::parse(text.as_bytes()).is_ok());
	}

	#[test]
	fn test_stats() {
		let stats = pt().stats();
		assert_eq!(
			stats,
			CatalogStats {
				translated: 3,
				fuzzy: 1,
				untranslated: 1,
				obsolete: 1,
			}
		);
		assert_eq!(stats.total(), 5);
		assert_eq!(
			stats.to_string(),
			"3 translated messages, 1 fuzzy translation, 1 untranslated message, 1 obsolete entry"
		);
	}

	#[test]
	fn test_check_reports_stale_language_and_plural_count() {
		let text = with_header(
			"#, fuzzy, python-format\nmsgid \"Complete! (%s)\"\nmsgstr \"Terminado!\"\n\nmsgid \"file\"\nmsgid_plural \"files\"\nmsgstr[0] \"plik\"\nmsgstr[1] \"pliki\"\n",
		);
		let catalog = Catalog::parse(text.as_bytes()).unwrap();
		let diagnostics = catalog.check(Some("pt"));
		assert_eq!(diagnostics.len(), 3, "{diagnostics:?}");
		assert!(diagnostics[0].message.contains("does not match"));
		assert!(diagnostics[1].message.starts_with("fuzzy translation"));
		assert!(diagnostics[2].message.contains("2 plural forms"));
		assert_eq!(diagnostics[2].line, Some(12));

		assert!(pt().check(Some("pt")).is_empty());
		assert!(pt().check(Some("PT")).is_empty());
	}

	#[test]
	fn test_from_path() {
		let mut file = tempfile::NamedTempFile::new().unwrap();
		file.write_all(PT.as_bytes()).unwrap();
		let catalog = Catalog::from_path(file.path(), ParseOptions::default()).unwrap();
		assert_eq!(catalog.language(), Some("pt"));

		let missing = Catalog::from_path("/nonexistent/pt.po", ParseOptions::default());
		assert!(matches!(missing, Err(CatalogError::Io { .. })));
	}

	#[test]
	fn test_normalized_output_parses_back() {
		let catalog = pt();
		let reparsed = Catalog::parse(catalog.to_po_string().as_bytes()).unwrap();
		assert_eq!(reparsed.entries(), catalog.entries());
		assert_eq!(reparsed.header(), catalog.header());
		assert_eq!(reparsed.header_entry().translator_comments, catalog.header_entry().translator_comments);
	}

	#[test]
	fn test_push_rejects_duplicates_and_header() {
		let mut catalog = Catalog::new("pt");
		catalog.push(Entry::new("Cancel", "Cancelar")).unwrap();
		assert!(matches!(
			catalog.push(Entry::new("Cancel", "Anular")),
			Err(CatalogError::DuplicateKey { line: 0, .. })
		));
		assert!(catalog.push(Entry::new("", "x")).is_err());
	}

	#[test]
	fn test_set_header_updates_plural_forms() {
		let mut catalog = Catalog::new("ja");
		let mut header = catalog.header().clone();
		header.set("Plural-Forms", "nplurals=1; plural=0;");
		catalog.set_header(header).unwrap();
		assert_eq!(catalog.plural_forms().nplurals(), 1);

		let mut header = catalog.header().clone();
		header.set("Plural-Forms", "nplurals=1;");
		assert!(catalog.set_header(header).is_err());
	}

	#[test]
	fn test_fuzzy_policy_from_str() {
		assert_eq!("Surface".parse::<FuzzyPolicy>().unwrap(), FuzzyPolicy::Surface);
		assert_eq!("ignore".parse::<FuzzyPolicy>().unwrap(), FuzzyPolicy::Ignore);
		assert!("maybe".parse::<FuzzyPolicy>().is_err());
		assert_eq!(FuzzyPolicy::Surface.to_string(), "surface");
	}

	fn text_strategy(chars: Vec<char>, max: usize) -> impl Strategy<Value = String> {
		prop::collection::vec(prop::sample::select(chars), 1..max).prop_map(String::from_iter)
	}

	fn entry_strategy() -> impl Strategy<Value = Entry> {
		let msg_chars = vec!['a', 'b', 'Z', ' ', '%', 'ç', 'ł', '"', '\\', '\n', '\t', '\u{1}'];
		let comment_chars = vec!['a', 'b', ' ', ',', '#', 'ã'];
		(
			prop::option::of(text_strategy(msg_chars.clone(), 6)),
			text_strategy(msg_chars.clone(), 20),
			prop::option::of(text_strategy(msg_chars.clone(), 20)),
			prop::collection::vec(text_strategy(msg_chars, 20), 2..4),
			prop::collection::vec(text_strategy(comment_chars, 12), 0..3),
			prop::option::of((text_strategy(vec!['a', '/', '.', '_'], 10), prop::option::of(1u32..5000))),
			(any::<bool>(), any::<bool>(), any::<bool>()),
		)
			.prop_map(|(context, msgid, plural, forms, comments, reference, (fuzzy, wrap, obsolete))| {
				let mut entry = match plural {
					Some(plural) => Entry::plural(msgid, plural, forms),
					None => Entry::new(msgid, forms[0].clone()),
				};
				entry.context = context;
				entry.translator_comments = comments;
				if let Some((path, line)) = reference {
					entry = entry.with_reference(path, line);
				}
				entry.set_fuzzy(fuzzy);
				if wrap {
					entry = entry.with_flag("no-wrap");
				}
				entry.obsolete = obsolete;
				entry
			})
	}

	proptest! {
		/// Serializing and re-parsing keeps every entry.
		#[test]
		fn po_round_trip(entries in prop::collection::vec(entry_strategy(), 0..12)) {
			let mut catalog = Catalog::new("pt");
			for entry in entries {
				let _ = catalog.push(entry);
			}
			let text = catalog.to_po_string();
			let reparsed = Catalog::parse(text.as_bytes()).unwrap();
			prop_assert_eq!(reparsed.entries(), catalog.entries());
		}
	}
}
