// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! GNU `.mo` output, the binary form consumed by gettext runtimes.

use crate::catalog::Catalog;
use crate::entry::Msgstr;
use crate::error::CatalogError;

const MAGIC: u32 = 0x9504_12de;
const HEADER_SIZE: usize = 28;
const CONTEXT_SEPARATOR: char = '\u{04}';

/// Compile `catalog` to a little-endian `.mo` file.
///
/// Only complete, non-fuzzy, active translations are written, plus the
/// header. Output is always UTF-8, whatever the source charset was.
pub fn compile_mo(catalog: &Catalog) -> Result<Vec<u8>, CatalogError> {
	let mut header = catalog.header().clone();
	header.set_charset("UTF-8");

	let mut pairs: Vec<(String, String)> = vec![(String::new(), header.to_msgstr())];
	for entry in catalog.iter() {
		if entry.is_fuzzy() || !entry.msgstr.is_complete() {
			continue;
		}
		let mut original = match &entry.context {
			Some(context) => format!("{context}{CONTEXT_SEPARATOR}{}", entry.msgid),
			None => entry.msgid.clone(),
		};
		let translation = match &entry.msgstr {
			Msgstr::Singular(text) => text.clone(),
			Msgstr::Plural(forms) => {
				if let Some(plural) = &entry.msgid_plural {
					original.push('\0');
					original.push_str(plural);
				}
				forms.join("\0")
			}
		};
		pairs.push((original, translation));
	}

	pairs.sort_by(|a, b| a.0.as_bytes().cmp(b.0.as_bytes()));
	let count = pairs.len();
	tracing::debug!(messages = count, "compiling catalog");

	let originals_at = HEADER_SIZE;
	let translations_at = originals_at + count * 8;
	let strings_at = translations_at + count * 8;

	let mut table = Vec::with_capacity(count * 16);
	let mut strings: Vec<u8> = Vec::new();
	let mut descriptors = Vec::with_capacity(count * 2);
	for text in pairs.iter().map(|(o, _)| o).chain(pairs.iter().map(|(_, t)| t)) {
		let offset = strings_at + strings.len();
		descriptors.push((u32_field(text.len())?, u32_field(offset)?));
		strings.extend_from_slice(text.as_bytes());
		strings.push(0);
	}
	for (len, offset) in descriptors {
		table.extend_from_slice(&len.to_le_bytes());
		table.extend_from_slice(&offset.to_le_bytes());
	}

	let mut out = Vec::with_capacity(strings_at + strings.len());
	for field in [
		MAGIC,
		0,
		u32_field(count)?,
		u32_field(originals_at)?,
		u32_field(translations_at)?,
		0,
		u32_field(strings_at)?,
	] {
		out.extend_from_slice(&field.to_le_bytes());
	}
	out.extend_from_slice(&table);
	out.extend_from_slice(&strings);
	u32_field(out.len())?;
	Ok(out)
}

fn u32_field(value: usize) -> Result<u32, CatalogError> {
	u32::try_from(value).map_err(|_| CatalogError::Compile(format!("{value} does not fit a 32-bit .mo field")))
}
