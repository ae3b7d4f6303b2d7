// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Serialization back to the PO layout.

use std::fmt::Write as _;

use crate::entry::{Entry, Msgstr};

/// Escape `text` for use inside a quoted PO string.
pub fn escape(text: &str) -> String {
	let mut out = String::with_capacity(text.len());
	for c in text.chars() {
		match c {
			'\\' => out.push_str("\\\\"),
			'"' => out.push_str("\\\""),
			'\n' => out.push_str("\\n"),
			'\t' => out.push_str("\\t"),
			'\r' => out.push_str("\\r"),
			'\u{07}' => out.push_str("\\a"),
			'\u{08}' => out.push_str("\\b"),
			'\u{0B}' => out.push_str("\\v"),
			'\u{0C}' => out.push_str("\\f"),
			c if c.is_ascii_control() => {
				let _ = write!(out, "\\{:03o}", c as u32);
			}
			c => out.push(c),
		}
	}
	out
}

/// Write `keyword "value"`, splitting after each embedded newline.
fn write_string(out: &mut String, prefix: &str, keyword: &str, value: &str) {
	let pieces: Vec<&str> = value.split_inclusive('\n').collect();
	if pieces.len() > 1 {
		let _ = writeln!(out, "{prefix}{keyword} \"\"");
		for piece in pieces {
			let _ = writeln!(out, "{prefix}\"{}\"", escape(piece));
		}
	} else {
		let _ = writeln!(out, "{prefix}{keyword} \"{}\"", escape(value));
	}
}

/// Append one entry, including its comment block.
pub fn write_entry(out: &mut String, entry: &Entry) {
	for comment in &entry.translator_comments {
		if comment.is_empty() {
			out.push_str("#\n");
		} else {
			let _ = writeln!(out, "# {comment}");
		}
	}
	for comment in &entry.extracted_comments {
		let _ = writeln!(out, "#. {comment}");
	}
	if !entry.references.is_empty() {
		let refs: Vec<String> = entry.references.iter().map(ToString::to_string).collect();
		let _ = writeln!(out, "#: {}", refs.join(" "));
	}
	if !entry.flags.is_empty() {
		let _ = writeln!(out, "#, {}", entry.flags.join(", "));
	}

	let (prefix, previous_prefix) = if entry.obsolete { ("#~ ", "#~| ") } else { ("", "#| ") };
	if let Some(context) = &entry.previous.context {
		write_string(out, previous_prefix, "msgctxt", context);
	}
	if let Some(msgid) = &entry.previous.msgid {
		write_string(out, previous_prefix, "msgid", msgid);
	}
	if let Some(plural) = &entry.previous.msgid_plural {
		write_string(out, previous_prefix, "msgid_plural", plural);
	}

	if let Some(context) = &entry.context {
		write_string(out, prefix, "msgctxt", context);
	}
	write_string(out, prefix, "msgid", &entry.msgid);
	if let Some(plural) = &entry.msgid_plural {
		write_string(out, prefix, "msgid_plural", plural);
	}
	match &entry.msgstr {
		Msgstr::Singular(text) => write_string(out, prefix, "msgstr", text),
		Msgstr::Plural(forms) => {
			for (i, form) in forms.iter().enumerate() {
				write_string(out, prefix, &format!("msgstr[{i}]"), form);
			}
		}
	}
}

/// Write a sequence of entries separated by blank lines.
pub fn write_entries<'a>(entries: impl IntoIterator<Item = &'a Entry>) -> String {
	let mut out = String::new();
	for (i, entry) in entries.into_iter().enumerate() {
		if i > 0 {
			out.push('\n');
		}
		write_entry(&mut out, entry);
	}
	out
}
