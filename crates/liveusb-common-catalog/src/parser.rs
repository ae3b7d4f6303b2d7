// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Line-oriented PO grammar.
//!
//! Works on already-decoded text and yields entries in file order together
//! with the line their first keyword appears on. Header interpretation,
//! duplicate detection and placeholder checks happen in [`crate::catalog`].

use crate::entry::{Entry, Msgstr, SourceRef};
use crate::error::CatalogError;

/// An entry plus the 1-based line of its first keyword.
#[derive(Debug, Clone, PartialEq)]
pub struct ParsedEntry {
	pub entry: Entry,
	pub line: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Target {
	Context,
	Msgid,
	MsgidPlural,
	Msgstr,
	MsgstrForm(usize),
	PreviousContext,
	PreviousMsgid,
	PreviousMsgidPlural,
}

#[derive(Default)]
struct Builder {
	entry: Entry,
	line: Option<usize>,
	has_msgid: bool,
	msgstr: Option<Msgstr>,
	target: Option<Target>,
	obsolete: Option<bool>,
}

impl Builder {
	fn has_keywords(&self) -> bool {
		self.line.is_some()
	}

	fn has_comments(&self) -> bool {
		let e = &self.entry;
		!e.translator_comments.is_empty()
			|| !e.extracted_comments.is_empty()
			|| !e.references.is_empty()
			|| !e.flags.is_empty()
			|| !e.previous.is_empty()
	}

	fn mark_obsolete(&mut self, obsolete: bool, line: usize) -> Result<(), CatalogError> {
		match self.obsolete {
			Some(current) if current != obsolete => Err(CatalogError::format(
				line,
				"entry mixes obsolete (#~) and active lines",
			)),
			_ => {
				self.obsolete = Some(obsolete);
				Ok(())
			}
		}
	}

	fn append(&mut self, target: Target, text: &str) {
		let e = &mut self.entry;
		let slot = match target {
			Target::Context => e.context.get_or_insert_with(String::new),
			Target::Msgid => &mut e.msgid,
			Target::MsgidPlural => e.msgid_plural.get_or_insert_with(String::new),
			Target::PreviousContext => e.previous.context.get_or_insert_with(String::new),
			Target::PreviousMsgid => e.previous.msgid.get_or_insert_with(String::new),
			Target::PreviousMsgidPlural => e.previous.msgid_plural.get_or_insert_with(String::new),
			Target::Msgstr | Target::MsgstrForm(_) => match (&mut self.msgstr, target) {
				(Some(Msgstr::Singular(s)), Target::Msgstr) => s,
				(Some(Msgstr::Plural(forms)), Target::MsgstrForm(i)) => &mut forms[i],
				_ => return,
			},
		};
		slot.push_str(text);
	}
}

struct Parser {
	entries: Vec<ParsedEntry>,
	current: Builder,
}

impl Parser {
	/// Close the current entry. Comment-only blocks stay pending so they
	/// attach to the next entry.
	fn finish(&mut self, line: usize) -> Result<(), CatalogError> {
		if !self.current.has_keywords() {
			return Ok(());
		}
		let mut builder = std::mem::take(&mut self.current);
		let start = builder.line.unwrap_or(line);
		if !builder.has_msgid {
			return Err(CatalogError::format(start, "entry has no msgid"));
		}
		let msgstr = builder
			.msgstr
			.take()
			.ok_or_else(|| CatalogError::format(start, "entry has no msgstr"))?;
		if builder.entry.msgid_plural.is_some() && matches!(msgstr, Msgstr::Singular(_)) {
			return Err(CatalogError::format(start, "plural entry needs msgstr[N] forms"));
		}
		builder.entry.msgstr = msgstr;
		builder.entry.obsolete = builder.obsolete.unwrap_or(false);
		self.entries.push(ParsedEntry {
			entry: builder.entry,
			line: start,
		});
		Ok(())
	}

	/// Start a new entry if the current one is already complete.
	fn comment_boundary(&mut self, line: usize) -> Result<(), CatalogError> {
		if self.current.msgstr.is_some() {
			self.finish(line)?;
		} else if self.current.has_keywords() {
			return Err(CatalogError::format(line, "comment inside an entry before its msgstr"));
		}
		Ok(())
	}

	fn line(&mut self, raw: &str, line: usize) -> Result<(), CatalogError> {
		let text = raw.strip_suffix('\r').unwrap_or(raw);
		if text.trim().is_empty() {
			return self.finish(line);
		}

		if let Some(rest) = text.strip_prefix("#~") {
			let rest = rest.strip_prefix(' ').unwrap_or(rest);
			if let Some(prev) = rest.strip_prefix('|') {
				self.comment_boundary(line)?;
				return self.previous(prev, line);
			}
			return self.keyword(rest.trim(), line, true);
		}

		if let Some(rest) = text.strip_prefix('#') {
			self.comment_boundary(line)?;
			return self.comment(rest, line);
		}

		self.keyword(text.trim(), line, false)
	}

	fn comment(&mut self, rest: &str, line: usize) -> Result<(), CatalogError> {
		let entry = &mut self.current.entry;
		match rest.chars().next() {
			Some(',') => {
				for flag in rest[1..].split(',').map(str::trim).filter(|f| !f.is_empty()) {
					if !entry.has_flag(flag) {
						entry.flags.push(flag.to_string());
					}
				}
			}
			Some(':') => entry
				.references
				.extend(rest[1..].split_whitespace().map(SourceRef::parse)),
			Some('.') => entry.extracted_comments.push(strip_one_space(&rest[1..]).to_string()),
			Some('|') => return self.previous(&rest[1..], line),
			_ => entry.translator_comments.push(strip_one_space(rest).to_string()),
		}
		Ok(())
	}

	fn previous(&mut self, rest: &str, line: usize) -> Result<(), CatalogError> {
		let rest = rest.trim();
		let (target, value) = if rest.starts_with('"') {
			let target = match self.current.target {
				Some(t @ (Target::PreviousContext | Target::PreviousMsgid | Target::PreviousMsgidPlural)) => t,
				_ => return Err(CatalogError::format(line, "continuation of a missing #| string")),
			};
			(target, rest)
		} else {
			let (keyword, value) = split_keyword(rest);
			let target = match keyword {
				"msgctxt" => Target::PreviousContext,
				"msgid" => Target::PreviousMsgid,
				"msgid_plural" => Target::PreviousMsgidPlural,
				other => return Err(CatalogError::format(line, format!("unknown #| keyword '{other}'"))),
			};
			(target, value)
		};
		let text = parse_string(value, line)?;
		self.current.append(target, &text);
		self.current.target = Some(target);
		Ok(())
	}

	fn keyword(&mut self, text: &str, line: usize, obsolete: bool) -> Result<(), CatalogError> {
		if text.starts_with('"') {
			let target = match self.current.target {
				Some(t) if self.current.has_keywords() => t,
				_ => return Err(CatalogError::format(line, "string continuation without a keyword")),
			};
			if matches!(
				target,
				Target::PreviousContext | Target::PreviousMsgid | Target::PreviousMsgidPlural
			) {
				return Err(CatalogError::format(line, "string continuation without a keyword"));
			}
			self.current.mark_obsolete(obsolete, line)?;
			let value = parse_string(text, line)?;
			self.current.append(target, &value);
			return Ok(());
		}

		let (keyword, value) = split_keyword(text);
		let target = match keyword {
			"msgctxt" | "msgid" => {
				if self.current.msgstr.is_some() {
					self.finish(line)?;
				}
				let b = &self.current;
				if b.has_msgid {
					return Err(CatalogError::format(line, format!("{keyword} before msgstr of previous entry")));
				}
				if keyword == "msgctxt" && b.entry.context.is_some() {
					return Err(CatalogError::format(line, "duplicate msgctxt"));
				}
				if keyword == "msgctxt" {
					Target::Context
				} else {
					Target::Msgid
				}
			}
			"msgid_plural" => {
				let b = &self.current;
				if !b.has_msgid || b.msgstr.is_some() || b.entry.msgid_plural.is_some() {
					return Err(CatalogError::format(line, "msgid_plural must follow msgid"));
				}
				Target::MsgidPlural
			}
			"msgstr" => {
				let b = &self.current;
				if !b.has_msgid {
					return Err(CatalogError::format(line, "msgstr without msgid"));
				}
				if b.msgstr.is_some() {
					return Err(CatalogError::format(line, "duplicate msgstr"));
				}
				if b.entry.msgid_plural.is_some() {
					return Err(CatalogError::format(line, "plural entry needs msgstr[N] forms"));
				}
				Target::Msgstr
			}
			k if k.starts_with("msgstr[") => {
				let index = k
					.strip_prefix("msgstr[")
					.and_then(|s| s.strip_suffix(']'))
					.and_then(|s| s.parse::<usize>().ok())
					.ok_or_else(|| CatalogError::format(line, format!("malformed keyword '{k}'")))?;
				let b = &self.current;
				if b.entry.msgid_plural.is_none() {
					return Err(CatalogError::format(line, "msgstr[N] without msgid_plural"));
				}
				let expected = match &b.msgstr {
					None => 0,
					Some(Msgstr::Plural(forms)) => forms.len(),
					Some(Msgstr::Singular(_)) => {
						return Err(CatalogError::format(line, "msgstr[N] after msgstr"));
					}
				};
				if index != expected {
					return Err(CatalogError::format(
						line,
						format!("expected msgstr[{expected}], found msgstr[{index}]"),
					));
				}
				Target::MsgstrForm(index)
			}
			other => return Err(CatalogError::format(line, format!("unknown keyword '{other}'"))),
		};

		self.current.mark_obsolete(obsolete, line)?;
		let value = parse_string(value, line)?;
		let b = &mut self.current;
		b.line.get_or_insert(line);
		match target {
			Target::Msgid => b.has_msgid = true,
			Target::Msgstr => b.msgstr = Some(Msgstr::Singular(String::new())),
			Target::MsgstrForm(_) => match &mut b.msgstr {
				Some(Msgstr::Plural(forms)) => forms.push(String::new()),
				_ => b.msgstr = Some(Msgstr::Plural(vec![String::new()])),
			},
			Target::Context => b.entry.context = Some(String::new()),
			Target::MsgidPlural => b.entry.msgid_plural = Some(String::new()),
			_ => {}
		}
		b.append(target, &value);
		b.target = Some(target);
		Ok(())
	}
}

fn strip_one_space(text: &str) -> &str {
	text.strip_prefix(' ').unwrap_or(text)
}

fn split_keyword(text: &str) -> (&str, &str) {
	match text.find(|c: char| c.is_whitespace() || c == '"') {
		Some(pos) => (&text[..pos], text[pos..].trim_start()),
		None => (text, ""),
	}
}

/// Parse one quoted string. Nothing but whitespace may follow it.
fn parse_string(text: &str, line: usize) -> Result<String, CatalogError> {
	let mut chars = text
		.strip_prefix('"')
		.ok_or_else(|| CatalogError::format(line, "expected a quoted string"))?
		.chars()
		.peekable();

	let mut out = String::new();
	loop {
		let c = chars
			.next()
			.ok_or_else(|| CatalogError::format(line, "unterminated string"))?;
		match c {
			'"' => break,
			'\\' => {
				let escape = chars
					.next()
					.ok_or_else(|| CatalogError::format(line, "unterminated string"))?;
				let decoded = match escape {
					'\\' => '\\',
					'"' => '"',
					'n' => '\n',
					't' => '\t',
					'r' => '\r',
					'a' => '\u{07}',
					'b' => '\u{08}',
					'f' => '\u{0C}',
					'v' => '\u{0B}',
					'?' => '?',
					'0'..='7' => {
						let mut value = escape.to_digit(8).unwrap_or(0);
						for _ in 0..2 {
							match chars.peek().and_then(|c| c.to_digit(8)) {
								Some(d) => {
									value = value * 8 + d;
									chars.next();
								}
								None => break,
							}
						}
						byte_escape(value, line)?
					}
					'x' => {
						let mut value = 0;
						let mut digits = 0;
						while digits < 2 {
							match chars.peek().and_then(|c| c.to_digit(16)) {
								Some(d) => {
									value = value * 16 + d;
									digits += 1;
									chars.next();
								}
								None => break,
							}
						}
						if digits == 0 {
							return Err(CatalogError::format(line, "\\x escape without hex digits"));
						}
						byte_escape(value, line)?
					}
					other => return Err(CatalogError::format(line, format!("invalid escape '\\{other}'"))),
				};
				out.push(decoded);
			}
			c => out.push(c),
		}
	}

	let trailing: String = chars.collect();
	if !trailing.trim().is_empty() {
		return Err(CatalogError::format(
			line,
			format!("unexpected text after string: '{}'", trailing.trim()),
		));
	}
	Ok(out)
}

/// Numeric escapes denote bytes in the declared charset; only ASCII is
/// meaningful after decoding.
fn byte_escape(value: u32, line: usize) -> Result<char, CatalogError> {
	if value >= 0x80 {
		return Err(CatalogError::format(
			line,
			format!("numeric escape \\{value:o} is outside ASCII"),
		));
	}
	char::from_u32(value).ok_or_else(|| CatalogError::format(line, "invalid numeric escape"))
}

/// Split decoded text into entries.
pub fn parse_entries(text: &str) -> Result<Vec<ParsedEntry>, CatalogError> {
	let mut parser = Parser {
		entries: Vec::new(),
		current: Builder::default(),
	};
	let mut last = 0;
	for (idx, raw) in text.split('\n').enumerate() {
		last = idx + 1;
		parser.line(raw, last)?;
	}
	parser.finish(last)?;
	if parser.current.has_comments() {
		tracing::trace!(line = last, "dropping trailing comments without an entry");
	}
	Ok(parser.entries)
}

#[cfg(test)]
mod tests {
	use super::*;

	fn parse(text: &str) -> Vec<ParsedEntry> {
		parse_entries(text).unwrap()
	}

	fn format_error_line(text: &str) -> usize {
		match parse_entries(text) {
			Err(CatalogError::Format { line, .. }) => line,
			other => panic!("expected format error, got {other:?}"),
		}
	}

	#[test]
	fn test_entry_with_comments_and_flags() {
		let entries = parse(
			"# Translator note\n\
			#. Shown on the main window\n\
			#: liveusb/creator.py:737 liveusb/gui.py:91\n\
			#, fuzzy, python-format\n\
			#| msgid \"Unknown filesystem: %s\"\n\
			msgid \"Unsupported filesystem: %s\"\n\
			msgstr \"Sistema de ficheiros não suportado: %s\"\n",
		);
		assert_eq!(entries.len(), 1);
		let e = &entries[0].entry;
		assert_eq!(entries[0].line, 6);
		assert_eq!(e.translator_comments, vec!["Translator note"]);
		assert_eq!(e.extracted_comments, vec!["Shown on the main window"]);
		assert_eq!(e.references.len(), 2);
		assert_eq!(e.references[1].line, Some(91));
		assert_eq!(e.flags, vec!["fuzzy", "python-format"]);
		assert_eq!(e.previous.msgid.as_deref(), Some("Unknown filesystem: %s"));
		assert_eq!(e.msgstr, Msgstr::Singular("Sistema de ficheiros não suportado: %s".into()));
	}

	#[test]
	fn test_continuation_lines_are_concatenated() {
		let entries = parse("msgid \"\"\n\"Unable to find any \"\n\"USB drives\"\nmsgstr \"\"\n\"Line one\\n\"\n\"Line two\"\n");
		let e = &entries[0].entry;
		assert_eq!(e.msgid, "Unable to find any USB drives");
		assert_eq!(e.msgstr, Msgstr::Singular("Line one\nLine two".into()));
	}

	#[test]
	fn test_context_and_plural() {
		let entries = parse(
			"msgctxt \"button\"\n\
			msgid \"%d file\"\n\
			msgid_plural \"%d files\"\n\
			msgstr[0] \"%d plik\"\n\
			msgstr[1] \"%d pliki\"\n\
			msgstr[2] \"%d plików\"\n",
		);
		let e = &entries[0].entry;
		assert_eq!(e.context.as_deref(), Some("button"));
		assert_eq!(e.msgid_plural.as_deref(), Some("%d files"));
		assert_eq!(e.msgstr.forms(), vec!["%d plik", "%d pliki", "%d plików"]);
	}

	#[test]
	fn test_entries_without_blank_separator() {
		let entries = parse("msgid \"a\"\nmsgstr \"A\"\nmsgid \"b\"\nmsgstr \"B\"\n#, fuzzy\nmsgid \"c\"\nmsgstr \"C\"\n");
		assert_eq!(entries.len(), 3);
		assert_eq!(entries[1].line, 3);
		assert!(entries[2].entry.is_fuzzy());
	}

	#[test]
	fn test_obsolete_entries() {
		let entries = parse(
			"msgid \"a\"\nmsgstr \"A\"\n\n\
			# old\n\
			#~| msgid \"Old\"\n\
			#~ msgid \"Gone\"\n\
			#~ msgstr \"\"\n\
			#~ \"Ido\"\n",
		);
		assert_eq!(entries.len(), 2);
		let e = &entries[1].entry;
		assert!(e.obsolete);
		assert_eq!(e.translator_comments, vec!["old"]);
		assert_eq!(e.previous.msgid.as_deref(), Some("Old"));
		assert_eq!(e.msgstr, Msgstr::Singular("Ido".into()));
	}

	#[test]
	fn test_escapes() {
		let entries = parse(r#"msgid "tab\there \"q\" back\\slash \101\x42 bell\a"
msgstr "x"
"#);
		assert_eq!(entries[0].entry.msgid, "tab\there \"q\" back\\slash AB bell\u{07}");
	}

	#[test]
	fn test_crlf_lines() {
		let entries = parse("msgid \"a\"\r\nmsgstr \"b\"\r\n");
		assert_eq!(entries[0].entry.msgstr, Msgstr::Singular("b".into()));
	}

	#[test]
	fn test_grammar_errors_carry_line_numbers() {
		assert_eq!(format_error_line("msgid \"a\"\nmsgstr \"b\nmsgid \"c\"\n"), 2);
		assert_eq!(format_error_line("msgid \"a\"\nmsgstr \"b\" junk\n"), 2);
		assert_eq!(format_error_line("msgid \"a\"\n\nmsgid \"b\"\nmsgstr \"\"\n"), 1);
		assert_eq!(format_error_line("msgid \"a\"\nmsgid \"b\"\nmsgstr \"\"\n"), 2);
		assert_eq!(format_error_line("msgstr \"b\"\n"), 1);
		assert_eq!(format_error_line("msgid \"a\"\nmsgtxt \"b\"\n"), 2);
		assert_eq!(format_error_line("msgid \"a\"\nmsgstr \"\\q\"\n"), 2);
		assert_eq!(format_error_line("\"orphan\"\n"), 1);
		assert_eq!(format_error_line("msgid \"a\"\n# note\nmsgstr \"b\"\n"), 2);
	}

	#[test]
	fn test_plural_forms_must_be_contiguous() {
		let text = "msgid \"f\"\nmsgid_plural \"fs\"\nmsgstr[0] \"a\"\nmsgstr[2] \"c\"\n";
		assert_eq!(format_error_line(text), 4);
		let text = "msgid \"f\"\nmsgid_plural \"fs\"\nmsgstr \"a\"\n";
		assert_eq!(format_error_line(text), 3);
		let text = "msgid \"f\"\nmsgstr[0] \"a\"\n";
		assert_eq!(format_error_line(text), 2);
	}

	#[test]
	fn test_high_numeric_escape_is_rejected() {
		assert_eq!(format_error_line("msgid \"a\"\nmsgstr \"\\351\"\n"), 2);
		assert_eq!(format_error_line("msgid \"a\"\nmsgstr \"\\xe9\"\n"), 2);
	}

	#[test]
	fn test_mixed_obsolete_lines_are_rejected() {
		assert_eq!(format_error_line("#~ msgid \"a\"\nmsgstr \"b\"\n"), 2);
	}
}
