// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Byte decoding driven by the header's declared charset.

use encoding_rs::{DecoderResult, Encoding, UTF_8, WINDOWS_1252};

use crate::error::CatalogError;
use crate::header::charset_param;

const UTF8_BOM: &[u8] = b"\xEF\xBB\xBF";

/// Decoded catalog text.
#[derive(Debug)]
pub struct Decoded {
	pub text: String,
	pub encoding: &'static Encoding,
	/// Charset label found in the raw bytes, if any.
	pub declared: Option<String>,
}

/// Find the `charset=` label in the header entry's `Content-Type` field
/// without knowing the encoding yet. Every byte maps to some character in
/// windows-1252, and all supported charsets are ASCII-compatible.
///
/// Only the msgstr of a leading `msgid ""` entry is read, so comments and
/// later messages never decide the charset.
fn sniff_charset(bytes: &[u8]) -> Option<String> {
	let (text, _) = WINDOWS_1252.decode_without_bom_handling(bytes);
	let mut lines = text
		.lines()
		.map(str::trim)
		.filter(|line| !line.is_empty() && !line.starts_with('#'))
		.peekable();

	if !quoted_value(lines.next()?, "msgid")?.is_empty() {
		return None;
	}
	while lines.next_if(|line| *line == "\"\"").is_some() {}

	let mut header = quoted_value(lines.next()?, "msgstr")?.to_string();
	while let Some(line) = lines.next_if(|line| line.starts_with('"')) {
		header.push_str(unquote(line)?);
	}

	header
		.split("\\n")
		.find_map(|field| {
			let (name, value) = field.split_once(':')?;
			if name.trim().eq_ignore_ascii_case("Content-Type") {
				charset_param(value)
			} else {
				None
			}
		})
		.filter(|c| !c.is_empty() && !c.eq_ignore_ascii_case("CHARSET"))
		.map(str::to_string)
}

/// The string literal following `keyword` on a line such as `msgstr "..."`.
fn quoted_value<'a>(line: &'a str, keyword: &str) -> Option<&'a str> {
	let rest = line.strip_prefix(keyword)?;
	if !rest.starts_with(char::is_whitespace) {
		return None;
	}
	unquote(rest.trim_start())
}

fn unquote(literal: &str) -> Option<&str> {
	literal.strip_prefix('"')?.strip_suffix('"')
}

/// Resolve a charset label to an encoding usable for PO files.
pub fn encoding_for_label(label: &str) -> Result<&'static Encoding, CatalogError> {
	let encoding = Encoding::for_label(label.trim().as_bytes())
		.ok_or_else(|| CatalogError::encoding(None, format!("unknown charset '{label}'")))?;
	if !encoding.is_ascii_compatible() {
		return Err(CatalogError::encoding(
			None,
			format!("charset '{label}' is not ASCII-compatible"),
		));
	}
	Ok(encoding)
}

/// Decode raw catalog bytes.
///
/// An undeclared charset decodes as UTF-8 so that the missing declaration
/// can be reported against the header afterwards.
pub fn decode(bytes: &[u8]) -> Result<Decoded, CatalogError> {
	let (body, skipped) = match bytes.strip_prefix(UTF8_BOM) {
		Some(rest) => (rest, UTF8_BOM.len()),
		None => (bytes, 0),
	};

	let declared = sniff_charset(body);
	let encoding = match &declared {
		Some(label) => encoding_for_label(label)?,
		None => UTF_8,
	};
	if skipped > 0 && encoding != UTF_8 {
		return Err(CatalogError::encoding(
			Some(0),
			format!("UTF-8 byte order mark in a {} catalog", encoding.name()),
		));
	}

	let text = decode_strict(body, encoding).map_err(|offset| {
		CatalogError::encoding(
			Some(offset + skipped),
			format!("bytes are not valid {}", encoding.name()),
		)
	})?;

	Ok(Decoded {
		text,
		encoding,
		declared,
	})
}

/// Decode without replacement, returning the offset of the first bad byte.
fn decode_strict(bytes: &[u8], encoding: &'static Encoding) -> Result<String, usize> {
	if encoding == UTF_8 {
		return std::str::from_utf8(bytes)
			.map(str::to_string)
			.map_err(|e| e.valid_up_to());
	}

	let mut decoder = encoding.new_decoder_without_bom_handling();
	let capacity = decoder
		.max_utf8_buffer_length_without_replacement(bytes.len())
		.unwrap_or(bytes.len());
	let mut text = String::with_capacity(capacity);
	let mut read = 0;
	loop {
		let (result, consumed) = decoder.decode_to_string_without_replacement(&bytes[read..], &mut text, true);
		read += consumed;
		match result {
			DecoderResult::InputEmpty => return Ok(text),
			DecoderResult::OutputFull => text.reserve(bytes.len() - read + 16),
			DecoderResult::Malformed(bad, after) => return Err(read - bad as usize - after as usize),
		}
	}
}

/// Encode `text` for writing in the given charset.
pub fn encode(text: &str, encoding: &'static Encoding) -> Result<Vec<u8>, CatalogError> {
	let (bytes, _, unmappable) = encoding.encode(text);
	if unmappable {
		return Err(CatalogError::encoding(
			None,
			format!("text cannot be represented in {}", encoding.name()),
		));
	}
	Ok(bytes.into_owned())
}

#[cfg(test)]
mod tests {
	use super::*;
	use encoding_rs::ISO_8859_2;

	fn po(charset: &str, msgstr: &[u8]) -> Vec<u8> {
		let mut bytes = format!(
			"msgid \"\"\nmsgstr \"\"\n\"Content-Type: text/plain; charset={charset}\\n\"\n\nmsgid \"Cancel\"\nmsgstr \""
		)
		.into_bytes();
		bytes.extend_from_slice(msgstr);
		bytes.extend_from_slice(b"\"\n");
		bytes
	}

	#[test]
	fn test_utf8_is_decoded() {
		let decoded = decode(&po("UTF-8", "Cancelar ação".as_bytes())).unwrap();
		assert_eq!(decoded.encoding, UTF_8);
		assert_eq!(decoded.declared.as_deref(), Some("UTF-8"));
		assert!(decoded.text.contains("ação"));
	}

	#[test]
	fn test_invalid_utf8_reports_offset() {
		let bytes = po("UTF-8", b"Cancelar a\xE7\xE3o");
		let expected = bytes.iter().position(|b| *b == 0xE7).unwrap();
		match decode(&bytes) {
			Err(CatalogError::Encoding { offset, .. }) => assert_eq!(offset, Some(expected)),
			other => panic!("expected encoding error, got {other:?}"),
		}
	}

	#[test]
	fn test_latin1_is_transcoded() {
		let decoded = decode(&po("ISO-8859-1", b"Cancelar a\xE7\xE3o")).unwrap();
		assert!(decoded.text.contains("Cancelar ação"));
	}

	#[test]
	fn test_latin2_is_transcoded() {
		let decoded = decode(&po("ISO-8859-2", b"Anuluj \xB3")).unwrap();
		assert_eq!(decoded.encoding, ISO_8859_2);
		assert!(decoded.text.contains("Anuluj ł"));
	}

	#[test]
	fn test_bom_is_stripped() {
		let mut bytes = UTF8_BOM.to_vec();
		bytes.extend(po("UTF-8", b"ok"));
		let decoded = decode(&bytes).unwrap();
		assert!(decoded.text.starts_with("msgid"));
	}

	#[test]
	fn test_unknown_and_unusable_charsets() {
		assert!(matches!(
			decode(&po("KLINGON", b"x")),
			Err(CatalogError::Encoding { .. })
		));
		assert!(matches!(
			decode(&po("UTF-16LE", b"x")),
			Err(CatalogError::Encoding { .. })
		));
	}

	#[test]
	fn test_undeclared_charset_falls_back_to_utf8() {
		let decoded = decode(&po("CHARSET", b"ok")).unwrap();
		assert_eq!(decoded.declared, None);
		assert_eq!(decoded.encoding, UTF_8);
	}

	#[test]
	fn test_lowercase_content_type_is_honoured() {
		let mut bytes = b"# Portuguese translation\nmsgid \"\"\nmsgstr \"\"\n\"content-type: text/plain; charset=ISO-8859-1\\n\"\n\nmsgid \"Cancel\"\nmsgstr \"Cancelar a".to_vec();
		bytes.extend_from_slice(b"\xE7\xE3o\"\n");
		let decoded = decode(&bytes).unwrap();
		assert_eq!(decoded.declared.as_deref(), Some("ISO-8859-1"));
		assert!(decoded.text.contains("Cancelar ação"));
	}

	#[test]
	fn test_charset_outside_header_entry_is_ignored() {
		let commented = b"# Content-Type: text/plain; charset=ISO-8859-2\\n\nmsgid \"\"\nmsgstr \"\"\n\"Content-Type: text/plain; charset=UTF-8\\n\"\n";
		assert_eq!(sniff_charset(commented).as_deref(), Some("UTF-8"));

		let in_message = b"msgid \"Content-Type: text/plain; charset=ISO-8859-2\\n\"\nmsgstr \"\"\n";
		assert_eq!(sniff_charset(in_message), None);
	}

	#[test]
	fn test_header_split_across_continuation_lines() {
		let bytes = b"msgid \"\"\nmsgstr \"Language: pl\\n\"\n\"Content-Type: text/plain; \"\n\"charset=ISO-8859-2\\n\"\n";
		assert_eq!(sniff_charset(bytes).as_deref(), Some("ISO-8859-2"));
	}

	#[test]
	fn test_encode_rejects_unmappable_text() {
		assert_eq!(encode("ação", WINDOWS_1252).unwrap(), b"a\xE7\xE3o");
		assert!(encode("łódź", WINDOWS_1252).is_err());
	}
}
