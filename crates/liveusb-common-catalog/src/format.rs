// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Placeholder markers and argument substitution.
//!
//! Three placeholder syntaxes are understood, matching the gettext format
//! flags found in the liveusb catalogs:
//!
//! - `python-format`: `%s`, `%d`, `%r`, `%(name)s`, `%%`
//! - `c-format`: `%s`, `%d`, numbered `%1$s`, `%%`
//! - `python-brace-format`: `{}`, `{0}`, `{name}`, `{name!r}`, `{:>8.2f}`
//!
//! Sequential placeholders are compared in order. Numbered and named
//! placeholders may be reordered by a translation.

use std::borrow::Cow;
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::ops::Range;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Largest width or precision a placeholder may request.
pub const MAX_FIELD_SIZE: usize = 1024;

/// Placeholder syntax of a message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum FormatKind {
	Python,
	C,
	PythonBrace,
}

impl FormatKind {
	pub const ALL: &'static [FormatKind] = &[FormatKind::Python, FormatKind::C, FormatKind::PythonBrace];

	/// The `#,` flag declaring this syntax.
	pub fn flag(&self) -> &'static str {
		match self {
			FormatKind::Python => "python-format",
			FormatKind::C => "c-format",
			FormatKind::PythonBrace => "python-brace-format",
		}
	}

	/// The `#,` flag explicitly denying this syntax.
	pub fn negated_flag(&self) -> &'static str {
		match self {
			FormatKind::Python => "no-python-format",
			FormatKind::C => "no-c-format",
			FormatKind::PythonBrace => "no-python-brace-format",
		}
	}

	pub fn from_flag(flag: &str) -> Option<Self> {
		Self::ALL.iter().copied().find(|k| k.flag() == flag)
	}
}

impl fmt::Display for FormatKind {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(self.flag())
	}
}

impl FromStr for FormatKind {
	type Err = String;

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		match s.trim().to_ascii_lowercase().as_str() {
			"python" | "python-format" => Ok(FormatKind::Python),
			"c" | "c-format" => Ok(FormatKind::C),
			"brace" | "python-brace" | "python-brace-format" => Ok(FormatKind::PythonBrace),
			other => Err(format!(
				"unknown format kind '{other}' (expected python, c or python-brace)"
			)),
		}
	}
}

/// Which argument a placeholder consumes.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Slot {
	/// Zero-based positional argument.
	Index(usize),
	Name(String),
}

impl fmt::Display for Slot {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			Slot::Index(i) => write!(f, "argument {}", i + 1),
			Slot::Name(name) => write!(f, "argument '{name}'"),
		}
	}
}

/// Value class a placeholder expects.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Conversion {
	Str,
	Repr,
	Int,
	Float,
	Char,
	Any,
}

impl Conversion {
	fn accepts(&self, arg: &FormatArg) -> bool {
		match (self, &*arg.coerce(*self)) {
			(Conversion::Str | Conversion::Repr | Conversion::Any, _) => true,
			(Conversion::Int, arg) => matches!(arg, FormatArg::Int(_)),
			(Conversion::Float, arg) => matches!(arg, FormatArg::Int(_) | FormatArg::Float(_)),
			(Conversion::Char, FormatArg::Int(i)) => u32::try_from(*i).ok().and_then(char::from_u32).is_some(),
			(Conversion::Char, FormatArg::Str(s) | FormatArg::Raw(s)) => s.chars().count() == 1,
			(Conversion::Char, FormatArg::Float(_)) => false,
		}
	}

	/// Whether two conversions are interchangeable in a translation.
	fn compatible(&self, other: &Conversion) -> bool {
		*self == Conversion::Any || *other == Conversion::Any || self == other
	}
}

impl fmt::Display for Conversion {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(match self {
			Conversion::Str => "string",
			Conversion::Repr => "repr",
			Conversion::Int => "integer",
			Conversion::Float => "float",
			Conversion::Char => "character",
			Conversion::Any => "any value",
		})
	}
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Align {
	Left,
	Right,
	Center,
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct Spec {
	fill: char,
	align: Option<Align>,
	plus: bool,
	space: bool,
	alternate: bool,
	zero: bool,
	width: Option<usize>,
	precision: Option<usize>,
	ty: Option<char>,
}

impl Default for Spec {
	fn default() -> Self {
		Self {
			fill: ' ',
			align: None,
			plus: false,
			space: false,
			alternate: false,
			zero: false,
			width: None,
			precision: None,
			ty: None,
		}
	}
}

/// One placeholder occurrence.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Placeholder {
	pub slot: Slot,
	pub conversion: Conversion,
	/// Byte range in the message text.
	pub range: Range<usize>,
	explicit: bool,
	spec: Spec,
}

#[derive(Debug, Clone, PartialEq)]
enum Piece {
	Literal(String),
	Marker(Placeholder),
}

/// Substitution failure. Never produces partially rendered output.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PlaceholderError {
	#[error("malformed placeholder at byte {position}: {message}")]
	Malformed { position: usize, message: String },

	#[error("expected {expected} positional argument(s), got {found}")]
	Arity { expected: usize, found: usize },

	#[error("missing argument '{0}'")]
	MissingName(String),

	#[error("argument '{0}' is not used by the message")]
	UnusedArgument(String),

	#[error("{slot} expects {expected}, got {found}")]
	Type {
		slot: Slot,
		expected: Conversion,
		found: &'static str,
	},

	#[error("message mixes numbered, named and sequential placeholders")]
	Mixed,
}

impl PlaceholderError {
	fn malformed(position: usize, message: impl Into<String>) -> Self {
		Self::Malformed {
			position,
			message: message.into(),
		}
	}
}

/// A substitution value.
#[derive(Debug, Clone, PartialEq)]
pub enum FormatArg {
	Str(String),
	Int(i64),
	Float(f64),
	/// Untyped text, such as a command-line value. Numeric conversions
	/// parse it; every other conversion renders it unchanged.
	Raw(String),
}

impl FormatArg {
	pub fn raw(text: impl Into<String>) -> Self {
		FormatArg::Raw(text.into())
	}

	fn type_name(&self) -> &'static str {
		match self {
			FormatArg::Str(_) => "string",
			FormatArg::Int(_) => "integer",
			FormatArg::Float(_) => "float",
			FormatArg::Raw(_) => "text",
		}
	}

	/// The value `conversion` reads from this argument. Raw text that does
	/// not parse as the number a numeric conversion needs stays text and is
	/// rejected by the type check.
	fn coerce(&self, conversion: Conversion) -> Cow<'_, FormatArg> {
		let FormatArg::Raw(text) = self else {
			return Cow::Borrowed(self);
		};
		let trimmed = text.trim();
		let number = match conversion {
			Conversion::Int => trimmed.parse().ok().map(FormatArg::Int),
			Conversion::Float => trimmed
				.parse()
				.ok()
				.map(FormatArg::Int)
				.or_else(|| trimmed.parse().ok().map(FormatArg::Float)),
			Conversion::Char if text.chars().count() != 1 => trimmed.parse().ok().map(FormatArg::Int),
			_ => None,
		};
		match number {
			Some(value) => Cow::Owned(value),
			None => Cow::Borrowed(self),
		}
	}
}

impl From<&str> for FormatArg {
	fn from(value: &str) -> Self {
		FormatArg::Str(value.to_string())
	}
}

impl From<String> for FormatArg {
	fn from(value: String) -> Self {
		FormatArg::Str(value)
	}
}

impl From<&String> for FormatArg {
	fn from(value: &String) -> Self {
		FormatArg::Str(value.clone())
	}
}

impl From<i64> for FormatArg {
	fn from(value: i64) -> Self {
		FormatArg::Int(value)
	}
}

impl From<i32> for FormatArg {
	fn from(value: i32) -> Self {
		FormatArg::Int(value.into())
	}
}

impl From<u32> for FormatArg {
	fn from(value: u32) -> Self {
		FormatArg::Int(value.into())
	}
}

impl From<u64> for FormatArg {
	fn from(value: u64) -> Self {
		i64::try_from(value)
			.map(FormatArg::Int)
			.unwrap_or(FormatArg::Float(value as f64))
	}
}

impl From<usize> for FormatArg {
	fn from(value: usize) -> Self {
		FormatArg::from(value as u64)
	}
}

impl From<f64> for FormatArg {
	fn from(value: f64) -> Self {
		FormatArg::Float(value)
	}
}

/// Positional and named substitution arguments.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FormatArgs {
	positional: Vec<FormatArg>,
	named: BTreeMap<String, FormatArg>,
}

impl FormatArgs {
	pub fn new() -> Self {
		Self::default()
	}

	/// Build from an ordered list of values.
	pub fn positional<I, T>(values: I) -> Self
	where
		I: IntoIterator<Item = T>,
		T: Into<FormatArg>,
	{
		Self {
			positional: values.into_iter().map(Into::into).collect(),
			named: BTreeMap::new(),
		}
	}

	/// Append a positional value.
	pub fn arg(mut self, value: impl Into<FormatArg>) -> Self {
		self.positional.push(value.into());
		self
	}

	/// Set a named value.
	pub fn named(mut self, name: impl Into<String>, value: impl Into<FormatArg>) -> Self {
		self.named.insert(name.into(), value.into());
		self
	}

	pub fn is_empty(&self) -> bool {
		self.positional.is_empty() && self.named.is_empty()
	}

	/// Total number of supplied values.
	pub fn len(&self) -> usize {
		self.positional.len() + self.named.len()
	}

	fn get(&self, slot: &Slot) -> Option<&FormatArg> {
		match slot {
			Slot::Index(i) => self.positional.get(*i),
			Slot::Name(name) => self.named.get(name),
		}
	}
}

/// Extract the placeholders of `text`.
pub fn placeholders(text: &str, kind: FormatKind) -> Result<Vec<Placeholder>, PlaceholderError> {
	Ok(parse(text, kind)?
		.into_iter()
		.filter_map(|piece| match piece {
			Piece::Marker(p) => Some(p),
			Piece::Literal(_) => None,
		})
		.collect())
}

/// Check that a translation preserves the placeholder set of its source.
///
/// With `allow_omitted`, the translation may drop placeholders (used for
/// plural forms such as "one file" for "%d files"), but may never add or
/// retype one.
pub fn check_compatible(
	source: &str,
	translation: &str,
	kind: FormatKind,
	allow_omitted: bool,
) -> Result<(), String> {
	let source_markers = placeholders(source, kind).map_err(|e| format!("source: {e}"))?;
	let translated_markers = placeholders(translation, kind).map_err(|e| format!("translation: {e}"))?;

	let expected = signature(&source_markers);
	let found = signature(&translated_markers);

	for (slot, conversion) in &found {
		match expected.get(slot) {
			None => return Err(format!("translation uses {slot} which the source does not have")),
			Some(source_conversion) if !source_conversion.compatible(conversion) => {
				return Err(format!(
					"{slot} is {source_conversion} in the source but {conversion} in the translation"
				));
			}
			Some(_) => {}
		}
	}

	if !allow_omitted {
		if let Some(slot) = expected.keys().find(|slot| !found.contains_key(*slot)) {
			return Err(format!("{slot} is missing from the translation"));
		}
	}

	Ok(())
}

/// Check `args` against the placeholders of a message.
pub fn validate_args(markers: &[Placeholder], args: &FormatArgs) -> Result<(), PlaceholderError> {
	let expected_positional = markers
		.iter()
		.filter_map(|p| match p.slot {
			Slot::Index(i) => Some(i + 1),
			Slot::Name(_) => None,
		})
		.max()
		.unwrap_or(0);

	if args.positional.len() != expected_positional {
		return Err(PlaceholderError::Arity {
			expected: expected_positional,
			found: args.positional.len(),
		});
	}

	let names: BTreeSet<&str> = markers
		.iter()
		.filter_map(|p| match &p.slot {
			Slot::Name(name) => Some(name.as_str()),
			Slot::Index(_) => None,
		})
		.collect();

	if let Some(missing) = names.iter().find(|name| !args.named.contains_key(**name)) {
		return Err(PlaceholderError::MissingName(missing.to_string()));
	}
	if let Some(unused) = args.named.keys().find(|name| !names.contains(name.as_str())) {
		return Err(PlaceholderError::UnusedArgument(unused.clone()));
	}

	for marker in markers {
		if let Some(arg) = args.get(&marker.slot) {
			if !marker.conversion.accepts(arg) {
				return Err(PlaceholderError::Type {
					slot: marker.slot.clone(),
					expected: marker.conversion,
					found: arg.type_name(),
				});
			}
		}
	}

	Ok(())
}

/// Substitute `args` into `template`.
pub fn substitute(template: &str, kind: FormatKind, args: &FormatArgs) -> Result<String, PlaceholderError> {
	substitute_translated(template, template, kind, args)
}

/// Validate `args` against the declared placeholders of `source`, then render
/// `translation` with them.
pub fn substitute_translated(
	source: &str,
	translation: &str,
	kind: FormatKind,
	args: &FormatArgs,
) -> Result<String, PlaceholderError> {
	let source_markers = placeholders(source, kind)?;
	validate_args(&source_markers, args)?;
	render(&parse(translation, kind)?, args)
}

fn signature(markers: &[Placeholder]) -> BTreeMap<Slot, Conversion> {
	let mut map = BTreeMap::new();
	for marker in markers {
		map.entry(marker.slot.clone()).or_insert(marker.conversion);
	}
	map
}

fn parse(text: &str, kind: FormatKind) -> Result<Vec<Piece>, PlaceholderError> {
	let pieces = match kind {
		FormatKind::Python | FormatKind::C => parse_printf(text, kind)?,
		FormatKind::PythonBrace => parse_brace(text)?,
	};
	check_style(&pieces, kind)?;
	Ok(pieces)
}

fn check_style(pieces: &[Piece], kind: FormatKind) -> Result<(), PlaceholderError> {
	let mut named = false;
	let mut sequential = false;
	let mut explicit = false;
	for piece in pieces {
		if let Piece::Marker(p) = piece {
			match p.slot {
				Slot::Name(_) => named = true,
				Slot::Index(_) if p.explicit => explicit = true,
				Slot::Index(_) => sequential = true,
			}
		}
	}
	let mixes_indices = sequential && explicit;
	let mixes_names = named && (sequential || explicit) && kind != FormatKind::PythonBrace;
	if mixes_indices || mixes_names {
		return Err(PlaceholderError::Mixed);
	}
	Ok(())
}

fn leading_digits(bytes: &[u8], from: usize) -> usize {
	bytes[from.min(bytes.len())..]
		.iter()
		.take_while(|b| b.is_ascii_digit())
		.count()
}

fn parse_number(text: &str, start: usize, len: usize) -> Result<usize, PlaceholderError> {
	text[start..start + len]
		.parse()
		.map_err(|_| PlaceholderError::malformed(start, "number too large"))
}

/// Width or precision, bounded by `MAX_FIELD_SIZE`.
fn parse_field_size(digits: &str, position: usize, what: &str) -> Result<usize, PlaceholderError> {
	digits
		.parse()
		.ok()
		.filter(|size| *size <= MAX_FIELD_SIZE)
		.ok_or_else(|| PlaceholderError::malformed(position, format!("{what} exceeds {MAX_FIELD_SIZE}")))
}

fn flush(pieces: &mut Vec<Piece>, literal: &mut String) {
	if !literal.is_empty() {
		pieces.push(Piece::Literal(std::mem::take(literal)));
	}
}

fn parse_printf(text: &str, kind: FormatKind) -> Result<Vec<Piece>, PlaceholderError> {
	let bytes = text.as_bytes();
	let mut pieces = Vec::new();
	let mut literal = String::new();
	let mut sequence = 0;
	let mut i = 0;

	while let Some(offset) = text[i..].find('%') {
		let start = i + offset;
		literal.push_str(&text[i..start]);
		let mut pos = start + 1;

		if bytes.get(pos) == Some(&b'%') {
			literal.push('%');
			i = pos + 1;
			continue;
		}

		let mut slot = None;
		let mut explicit = false;
		if kind == FormatKind::Python && bytes.get(pos) == Some(&b'(') {
			let close = text[pos..]
				.find(')')
				.ok_or_else(|| PlaceholderError::malformed(start, "unterminated mapping key"))?;
			slot = Some(Slot::Name(text[pos + 1..pos + close].to_string()));
			pos += close + 1;
		} else if kind == FormatKind::C {
			let digits = leading_digits(bytes, pos);
			if digits > 0 && bytes.get(pos + digits) == Some(&b'$') {
				let number = parse_number(text, pos, digits)?;
				if number == 0 {
					return Err(PlaceholderError::malformed(start, "argument numbers start at 1"));
				}
				slot = Some(Slot::Index(number - 1));
				explicit = true;
				pos += digits + 1;
			}
		}

		let mut spec = Spec::default();
		while let Some(&b) = bytes.get(pos) {
			match b {
				b'-' => spec.align = Some(Align::Left),
				b'+' => spec.plus = true,
				b' ' => spec.space = true,
				b'#' => spec.alternate = true,
				b'0' => spec.zero = true,
				b'\'' | b'I' if kind == FormatKind::C => {}
				_ => break,
			}
			pos += 1;
		}
		if spec.align.is_none() {
			spec.align = Some(Align::Right);
		}
		if spec.align == Some(Align::Left) {
			spec.zero = false;
		}

		if bytes.get(pos) == Some(&b'*') {
			return Err(PlaceholderError::malformed(start, "variable width is not supported"));
		}
		let digits = leading_digits(bytes, pos);
		if digits > 0 {
			spec.width = Some(parse_field_size(&text[pos..pos + digits], start, "width")?);
			pos += digits;
		}

		if bytes.get(pos) == Some(&b'.') {
			pos += 1;
			if bytes.get(pos) == Some(&b'*') {
				return Err(PlaceholderError::malformed(start, "variable precision is not supported"));
			}
			let digits = leading_digits(bytes, pos);
			spec.precision = Some(if digits > 0 {
				parse_field_size(&text[pos..pos + digits], start, "precision")?
			} else {
				0
			});
			pos += digits;
		}

		while matches!(bytes.get(pos), Some(b'h' | b'l' | b'L' | b'q' | b'j' | b'z' | b't')) {
			pos += 1;
		}

		let ty = text[pos..]
			.chars()
			.next()
			.ok_or_else(|| PlaceholderError::malformed(start, "incomplete placeholder"))?;
		let conversion = match ty {
			's' => Conversion::Str,
			'r' | 'a' if kind == FormatKind::Python => Conversion::Repr,
			'd' | 'i' | 'u' | 'x' | 'X' | 'o' => Conversion::Int,
			'e' | 'E' | 'f' | 'F' | 'g' | 'G' => Conversion::Float,
			'c' => Conversion::Char,
			other => {
				return Err(PlaceholderError::malformed(
					start,
					format!("unknown conversion '%{other}'"),
				))
			}
		};
		spec.ty = Some(ty);
		pos += ty.len_utf8();

		let slot = slot.unwrap_or_else(|| {
			let slot = Slot::Index(sequence);
			sequence += 1;
			slot
		});

		flush(&mut pieces, &mut literal);
		pieces.push(Piece::Marker(Placeholder {
			slot,
			conversion,
			range: start..pos,
			explicit,
			spec,
		}));
		i = pos;
	}

	literal.push_str(&text[i..]);
	flush(&mut pieces, &mut literal);
	Ok(pieces)
}

fn parse_brace(text: &str) -> Result<Vec<Piece>, PlaceholderError> {
	let mut pieces = Vec::new();
	let mut literal = String::new();
	let mut sequence = 0;
	let mut chars = text.char_indices().peekable();

	while let Some((start, c)) = chars.next() {
		match c {
			'{' if chars.peek().map(|(_, c)| *c) == Some('{') => {
				chars.next();
				literal.push('{');
			}
			'}' if chars.peek().map(|(_, c)| *c) == Some('}') => {
				chars.next();
				literal.push('}');
			}
			'}' => return Err(PlaceholderError::malformed(start, "single '}' in message")),
			'{' => {
				let close = text[start + 1..]
					.find('}')
					.map(|i| start + 1 + i)
					.ok_or_else(|| PlaceholderError::malformed(start, "unterminated '{'"))?;
				let field = &text[start + 1..close];
				if field.contains('{') {
					return Err(PlaceholderError::malformed(
						start,
						"nested replacement fields are not supported",
					));
				}
				while chars.peek().is_some_and(|(i, _)| *i <= close) {
					chars.next();
				}

				let (head, format_spec) = match field.find(':') {
					Some(i) => (&field[..i], Some(&field[i + 1..])),
					None => (field, None),
				};
				let (name, bang) = match head.find('!') {
					Some(i) => (&head[..i], Some(&head[i + 1..])),
					None => (head, None),
				};

				let mut explicit = false;
				let slot = if name.is_empty() {
					let slot = Slot::Index(sequence);
					sequence += 1;
					slot
				} else if name.bytes().all(|b| b.is_ascii_digit()) {
					explicit = true;
					Slot::Index(parse_number(text, start + 1, name.len())?)
				} else if name.chars().all(|c| c.is_alphanumeric() || c == '_') {
					Slot::Name(name.to_string())
				} else {
					return Err(PlaceholderError::malformed(
						start,
						format!("unsupported field name '{name}'"),
					));
				};

				let spec = match format_spec {
					Some(s) => parse_brace_spec(s, start)?,
					None => Spec::default(),
				};
				let conversion = match bang {
					Some("r") | Some("a") => Conversion::Repr,
					Some("s") => Conversion::Str,
					Some(other) => {
						return Err(PlaceholderError::malformed(
							start,
							format!("unknown conversion '!{other}'"),
						))
					}
					None => match spec.ty {
						None => Conversion::Any,
						Some('s') => Conversion::Str,
						Some('d' | 'x' | 'X' | 'o' | 'b') => Conversion::Int,
						Some('c') => Conversion::Char,
						Some('e' | 'E' | 'f' | 'F' | 'g' | 'G' | '%') => Conversion::Float,
						Some(other) => {
							return Err(PlaceholderError::malformed(
								start,
								format!("unknown format type '{other}'"),
							))
						}
					},
				};

				flush(&mut pieces, &mut literal);
				pieces.push(Piece::Marker(Placeholder {
					slot,
					conversion,
					range: start..close + 1,
					explicit,
					spec,
				}));
			}
			other => literal.push(other),
		}
	}

	flush(&mut pieces, &mut literal);
	Ok(pieces)
}

fn align_from(c: char) -> Option<Align> {
	match c {
		'<' => Some(Align::Left),
		'>' => Some(Align::Right),
		'^' => Some(Align::Center),
		_ => None,
	}
}

fn parse_brace_spec(spec_text: &str, position: usize) -> Result<Spec, PlaceholderError> {
	let mut spec = Spec::default();
	let chars: Vec<char> = spec_text.chars().collect();
	let mut i = 0;

	if chars.len() >= 2 && align_from(chars[1]).is_some() {
		spec.fill = chars[0];
		spec.align = align_from(chars[1]);
		i = 2;
	} else if let Some(align) = chars.first().and_then(|c| align_from(*c)) {
		spec.align = Some(align);
		i = 1;
	}

	match chars.get(i) {
		Some('+') => {
			spec.plus = true;
			i += 1;
		}
		Some(' ') => {
			spec.space = true;
			i += 1;
		}
		Some('-') => i += 1,
		_ => {}
	}
	if chars.get(i) == Some(&'#') {
		spec.alternate = true;
		i += 1;
	}
	if chars.get(i) == Some(&'0') {
		spec.zero = true;
		i += 1;
	}

	let digits: String = chars[i..].iter().take_while(|c| c.is_ascii_digit()).collect();
	if !digits.is_empty() {
		i += digits.len();
		spec.width = Some(parse_field_size(&digits, position, "width")?);
	}

	if chars.get(i) == Some(&'.') {
		i += 1;
		let digits: String = chars[i..].iter().take_while(|c| c.is_ascii_digit()).collect();
		if digits.is_empty() {
			return Err(PlaceholderError::malformed(position, "missing precision"));
		}
		i += digits.len();
		spec.precision = Some(parse_field_size(&digits, position, "precision")?);
	}

	match &chars[i..] {
		[] => {}
		[ty] => spec.ty = Some(*ty),
		_ => {
			return Err(PlaceholderError::malformed(
				position,
				format!("unsupported format spec '{spec_text}'"),
			))
		}
	}

	Ok(spec)
}

fn render(pieces: &[Piece], args: &FormatArgs) -> Result<String, PlaceholderError> {
	let mut out = String::new();
	for piece in pieces {
		match piece {
			Piece::Literal(text) => out.push_str(text),
			Piece::Marker(marker) => {
				let arg = args.get(&marker.slot).ok_or_else(|| match &marker.slot {
					Slot::Index(i) => PlaceholderError::Arity {
						expected: i + 1,
						found: args.positional.len(),
					},
					Slot::Name(name) => PlaceholderError::MissingName(name.clone()),
				})?;
				if !marker.conversion.accepts(arg) {
					return Err(PlaceholderError::Type {
						slot: marker.slot.clone(),
						expected: marker.conversion,
						found: arg.type_name(),
					});
				}
				out.push_str(&format_value(arg, marker.conversion, &marker.spec));
			}
		}
	}
	Ok(out)
}

fn format_value(arg: &FormatArg, conversion: Conversion, spec: &Spec) -> String {
	let arg = &*arg.coerce(conversion);
	let numeric = match (conversion, arg) {
		(Conversion::Int, FormatArg::Int(i)) => Some(format_int(*i, spec)),
		(Conversion::Float, FormatArg::Int(i)) => Some(format_float(*i as f64, spec)),
		(Conversion::Float, FormatArg::Float(f)) => Some(format_float(*f, spec)),
		(Conversion::Any, FormatArg::Int(i)) => Some(format_int(*i, spec)),
		(Conversion::Any, FormatArg::Float(f)) if spec.precision.is_some() => Some(format_float(*f, spec)),
		(Conversion::Any, FormatArg::Float(f)) => Some(split_sign(*f < 0.0, python_float(f.abs()), spec)),
		_ => None,
	};
	if let Some((sign, digits)) = numeric {
		return pad_number(&sign, &digits, spec);
	}

	let text = match (conversion, arg) {
		(Conversion::Repr, FormatArg::Str(s) | FormatArg::Raw(s)) => python_repr(s),
		(Conversion::Char, FormatArg::Int(i)) => u32::try_from(*i)
			.ok()
			.and_then(char::from_u32)
			.map(String::from)
			.unwrap_or_default(),
		(_, FormatArg::Str(s) | FormatArg::Raw(s)) => s.clone(),
		(_, FormatArg::Int(i)) => i.to_string(),
		(_, FormatArg::Float(f)) => python_float(*f),
	};
	let text = match spec.precision {
		Some(p) if matches!(conversion, Conversion::Str | Conversion::Repr | Conversion::Any) => {
			text.chars().take(p).collect()
		}
		_ => text,
	};
	pad(&text, spec, Align::Left)
}

fn split_sign(negative: bool, digits: String, spec: &Spec) -> (String, String) {
	let sign = if negative {
		"-"
	} else if spec.plus {
		"+"
	} else if spec.space {
		" "
	} else {
		""
	};
	(sign.to_string(), digits)
}

fn format_int(value: i64, spec: &Spec) -> (String, String) {
	let magnitude = value.unsigned_abs();
	let digits = match spec.ty {
		Some('x') => with_prefix(format!("{magnitude:x}"), spec.alternate, "0x"),
		Some('X') => with_prefix(format!("{magnitude:X}"), spec.alternate, "0X"),
		Some('o') => with_prefix(format!("{magnitude:o}"), spec.alternate, "0o"),
		Some('b') => with_prefix(format!("{magnitude:b}"), spec.alternate, "0b"),
		_ => {
			let digits = magnitude.to_string();
			match spec.precision {
				Some(p) if spec.ty.is_some() && digits.len() < p => format!("{digits:0>p$}"),
				_ => digits,
			}
		}
	};
	split_sign(value < 0, digits, spec)
}

fn with_prefix(digits: String, alternate: bool, prefix: &str) -> String {
	if alternate {
		format!("{prefix}{digits}")
	} else {
		digits
	}
}

fn format_float(value: f64, spec: &Spec) -> (String, String) {
	let negative = value.is_sign_negative() && value != 0.0;
	let magnitude = value.abs();
	if magnitude.is_nan() {
		return split_sign(false, "nan".to_string(), spec);
	}
	if magnitude.is_infinite() {
		return split_sign(negative, "inf".to_string(), spec);
	}

	let precision = spec.precision.unwrap_or(6);
	let digits = match spec.ty {
		Some('e') => format_exp(magnitude, precision, false),
		Some('E') => format_exp(magnitude, precision, true),
		Some('g') => format_general(magnitude, precision, false, spec.alternate),
		Some('G') => format_general(magnitude, precision, true, spec.alternate),
		Some('%') => format!("{:.*}%", precision, magnitude * 100.0),
		None => format_general(magnitude, spec.precision.unwrap_or(12), false, false),
		_ => format!("{magnitude:.precision$}"),
	};
	split_sign(negative, digits, spec)
}

fn exp_parts(value: f64, precision: usize) -> (String, i32) {
	let text = format!("{value:.precision$e}");
	match text.split_once('e') {
		Some((mantissa, exp)) => (mantissa.to_string(), exp.parse().unwrap_or(0)),
		None => (text, 0),
	}
}

fn format_exp(value: f64, precision: usize, upper: bool) -> String {
	let (mantissa, exp) = exp_parts(value, precision);
	let e = if upper { 'E' } else { 'e' };
	let sign = if exp < 0 { '-' } else { '+' };
	format!("{mantissa}{e}{sign}{:02}", exp.unsigned_abs())
}

fn format_general(value: f64, precision: usize, upper: bool, alternate: bool) -> String {
	let precision = precision.max(1);
	if value == 0.0 {
		return "0".to_string();
	}
	let (_, exp) = exp_parts(value, precision - 1);
	let precision_i32 = i32::try_from(precision).unwrap_or(i32::MAX);
	if (-4..precision_i32).contains(&exp) {
		let decimals = usize::try_from(precision_i32 - 1 - exp).unwrap_or(0);
		let fixed = format!("{value:.decimals$}");
		if alternate {
			fixed
		} else {
			strip_fraction_zeros(&fixed)
		}
	} else {
		let text = format_exp(value, precision - 1, upper);
		if alternate {
			return text;
		}
		let split = text.find(['e', 'E']).unwrap_or(text.len());
		format!("{}{}", strip_fraction_zeros(&text[..split]), &text[split..])
	}
}

fn strip_fraction_zeros(text: &str) -> String {
	if text.contains('.') {
		text.trim_end_matches('0').trim_end_matches('.').to_string()
	} else {
		text.to_string()
	}
}

/// Render a float the way Python's `str()` does for ordinary values.
fn python_float(value: f64) -> String {
	if value.is_nan() {
		"nan".to_string()
	} else if value.is_infinite() {
		(if value < 0.0 { "-inf" } else { "inf" }).to_string()
	} else if value == value.trunc() && value.abs() < 1e16 {
		format!("{value:.1}")
	} else {
		value.to_string()
	}
}

fn python_repr(s: &str) -> String {
	let quote = if s.contains('\'') && !s.contains('"') { '"' } else { '\'' };
	let mut out = String::with_capacity(s.len() + 2);
	out.push(quote);
	for c in s.chars() {
		match c {
			'\\' => out.push_str("\\\\"),
			'\n' => out.push_str("\\n"),
			'\r' => out.push_str("\\r"),
			'\t' => out.push_str("\\t"),
			c if c == quote => {
				out.push('\\');
				out.push(c);
			}
			c if (c as u32) < 0x20 || c as u32 == 0x7f => out.push_str(&format!("\\x{:02x}", c as u32)),
			c => out.push(c),
		}
	}
	out.push(quote);
	out
}

fn pad_number(sign: &str, digits: &str, spec: &Spec) -> String {
	let len = sign.chars().count() + digits.chars().count();
	match spec.width {
		Some(width) if spec.zero && len < width && spec.align != Some(Align::Left) => {
			format!("{sign}{}{digits}", "0".repeat(width - len))
		}
		_ => pad(&format!("{sign}{digits}"), spec, Align::Right),
	}
}

fn pad(text: &str, spec: &Spec, default_align: Align) -> String {
	let len = text.chars().count();
	let width = match spec.width {
		Some(width) if width > len => width,
		_ => return text.to_string(),
	};
	let fill = spec.fill.to_string();
	let gap = width - len;
	match spec.align.unwrap_or(default_align) {
		Align::Left => format!("{text}{}", fill.repeat(gap)),
		Align::Right => format!("{}{text}", fill.repeat(gap)),
		Align::Center => format!("{}{text}{}", fill.repeat(gap / 2), fill.repeat(gap - gap / 2)),
	}
}
