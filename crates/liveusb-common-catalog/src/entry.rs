// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Message entries and their keys.

use std::fmt;

use crate::format::FormatKind;

/// Flag marking an approximate, unverified translation.
pub const FUZZY_FLAG: &str = "fuzzy";

/// Lookup key of an entry: optional context plus source text.
///
/// An absent context and an empty context are different keys.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct MessageKey {
	pub context: Option<String>,
	pub msgid: String,
}

impl MessageKey {
	pub fn new(context: Option<&str>, msgid: &str) -> Self {
		Self {
			context: context.map(str::to_string),
			msgid: msgid.to_string(),
		}
	}
}

impl fmt::Display for MessageKey {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match &self.context {
			Some(context) => write!(f, "{context:?} / {:?}", self.msgid),
			None => write!(f, "{:?}", self.msgid),
		}
	}
}

/// Translated text of an entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Msgstr {
	/// `msgstr "..."`
	Singular(String),
	/// `msgstr[0] "..."`, `msgstr[1] "..."`, ...
	Plural(Vec<String>),
}

impl Msgstr {
	/// True when nothing has been translated yet.
	pub fn is_empty(&self) -> bool {
		match self {
			Msgstr::Singular(text) => text.is_empty(),
			Msgstr::Plural(forms) => forms.iter().all(String::is_empty),
		}
	}

	/// True when every form carries text.
	pub fn is_complete(&self) -> bool {
		match self {
			Msgstr::Singular(text) => !text.is_empty(),
			Msgstr::Plural(forms) => !forms.is_empty() && forms.iter().all(|f| !f.is_empty()),
		}
	}

	/// Form at `index`. A singular msgstr answers for every index.
	pub fn form(&self, index: usize) -> Option<&str> {
		match self {
			Msgstr::Singular(text) => Some(text),
			Msgstr::Plural(forms) => forms.get(index).map(String::as_str),
		}
	}

	/// All forms in order.
	pub fn forms(&self) -> Vec<&str> {
		match self {
			Msgstr::Singular(text) => vec![text.as_str()],
			Msgstr::Plural(forms) => forms.iter().map(String::as_str).collect(),
		}
	}
}

impl Default for Msgstr {
	fn default() -> Self {
		Msgstr::Singular(String::new())
	}
}

/// A `#:` source reference such as `liveusb/creator.py:737`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceRef {
	pub path: String,
	pub line: Option<u32>,
}

impl SourceRef {
	/// Parse one whitespace-free reference token.
	pub fn parse(token: &str) -> Self {
		if let Some((path, line)) = token.rsplit_once(':') {
			if let Ok(line) = line.parse() {
				return Self {
					path: path.to_string(),
					line: Some(line),
				};
			}
		}
		Self {
			path: token.to_string(),
			line: None,
		}
	}
}

impl fmt::Display for SourceRef {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self.line {
			Some(line) => write!(f, "{}:{line}", self.path),
			None => f.write_str(&self.path),
		}
	}
}

/// `#|` strings recorded by msgmerge for fuzzy matches.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PreviousStrings {
	pub context: Option<String>,
	pub msgid: Option<String>,
	pub msgid_plural: Option<String>,
}

impl PreviousStrings {
	pub fn is_empty(&self) -> bool {
		self.context.is_none() && self.msgid.is_none() && self.msgid_plural.is_none()
	}
}

/// One source-text/translated-text pair plus metadata.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Entry {
	pub context: Option<String>,
	pub msgid: String,
	pub msgid_plural: Option<String>,
	pub msgstr: Msgstr,
	pub translator_comments: Vec<String>,
	pub extracted_comments: Vec<String>,
	pub references: Vec<SourceRef>,
	pub flags: Vec<String>,
	pub previous: PreviousStrings,
	pub obsolete: bool,
}

impl Entry {
	/// A singular entry.
	pub fn new(msgid: impl Into<String>, msgstr: impl Into<String>) -> Self {
		Self {
			msgid: msgid.into(),
			msgstr: Msgstr::Singular(msgstr.into()),
			..Default::default()
		}
	}

	/// A plural entry with the given translated forms.
	pub fn plural(msgid: impl Into<String>, msgid_plural: impl Into<String>, forms: Vec<String>) -> Self {
		Self {
			msgid: msgid.into(),
			msgid_plural: Some(msgid_plural.into()),
			msgstr: Msgstr::Plural(forms),
			..Default::default()
		}
	}

	pub fn with_context(mut self, context: impl Into<String>) -> Self {
		self.context = Some(context.into());
		self
	}

	pub fn with_flag(mut self, flag: impl Into<String>) -> Self {
		let flag = flag.into();
		if !self.has_flag(&flag) {
			self.flags.push(flag);
		}
		self
	}

	pub fn with_reference(mut self, path: impl Into<String>, line: Option<u32>) -> Self {
		self.references.push(SourceRef {
			path: path.into(),
			line,
		});
		self
	}

	pub fn key(&self) -> MessageKey {
		MessageKey {
			context: self.context.clone(),
			msgid: self.msgid.clone(),
		}
	}

	pub fn has_flag(&self, flag: &str) -> bool {
		self.flags.iter().any(|f| f == flag)
	}

	pub fn is_fuzzy(&self) -> bool {
		self.has_flag(FUZZY_FLAG)
	}

	pub fn set_fuzzy(&mut self, fuzzy: bool) {
		if fuzzy && !self.is_fuzzy() {
			self.flags.insert(0, FUZZY_FLAG.to_string());
		} else if !fuzzy {
			self.flags.retain(|f| f != FUZZY_FLAG);
		}
	}

	/// True for the metadata entry (empty msgid, no context).
	pub fn is_header(&self) -> bool {
		self.msgid.is_empty() && self.context.is_none()
	}

	pub fn is_translated(&self) -> bool {
		!self.msgstr.is_empty()
	}

	/// Placeholder syntax declared by the entry's flags.
	///
	/// A `no-*-format` flag wins over an inferred kind and yields `None`.
	pub fn format_kind(&self) -> Option<FormatKind> {
		FormatKind::ALL
			.iter()
			.copied()
			.find(|kind| self.has_flag(kind.flag()) && !self.has_flag(kind.negated_flag()))
	}
}
