// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Catalog metadata carried in the msgstr of the header entry.

use chrono::{DateTime, FixedOffset, Utc};

use crate::plural::DEFAULT_PLURAL_FORMS;

/// Timestamp layout used by `POT-Creation-Date` and `PO-Revision-Date`.
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M%z";

/// Value xgettext writes before a translator fills in the date.
const TEMPLATE_TIMESTAMP: &str = "YEAR-MO-DA HO:MI+ZONE";
const TEMPLATE_TRANSLATOR: &str = "FULL NAME <EMAIL@ADDRESS>";
const TEMPLATE_CHARSET: &str = "CHARSET";

/// Ordered `Name: value` fields of the header entry.
///
/// Lookups are case-insensitive. Unknown fields are preserved in order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Header {
	fields: Vec<(String, String)>,
}

impl Header {
	/// Header for a fresh catalog in `language`.
	pub fn new(project: &str, language: &str) -> Self {
		let now = Utc::now().format(TIMESTAMP_FORMAT).to_string();
		let mut header = Self::default();
		header.set("Project-Id-Version", project);
		header.set("POT-Creation-Date", &now);
		header.set("PO-Revision-Date", &now);
		header.set("Language", language);
		header.set("MIME-Version", "1.0");
		header.set("Content-Type", "text/plain; charset=UTF-8");
		header.set("Content-Transfer-Encoding", "8bit");
		header.set("Plural-Forms", DEFAULT_PLURAL_FORMS);
		header
	}

	/// Parse the header msgstr. Returns the offending line on error.
	pub fn parse(msgstr: &str) -> Result<Self, String> {
		let mut fields = Vec::new();
		for line in msgstr.lines().filter(|l| !l.trim().is_empty()) {
			let (name, value) = line
				.split_once(':')
				.ok_or_else(|| format!("malformed header line '{line}'"))?;
			let name = name.trim();
			if name.is_empty() || name.contains(char::is_whitespace) {
				return Err(format!("malformed header field name in '{line}'"));
			}
			fields.push((name.to_string(), value.trim().to_string()));
		}
		Ok(Self { fields })
	}

	pub fn get(&self, name: &str) -> Option<&str> {
		self.fields
			.iter()
			.find(|(n, _)| n.eq_ignore_ascii_case(name))
			.map(|(_, v)| v.as_str())
	}

	/// Replace a field in place, or append it.
	pub fn set(&mut self, name: &str, value: &str) {
		match self.fields.iter_mut().find(|(n, _)| n.eq_ignore_ascii_case(name)) {
			Some((_, v)) => *v = value.to_string(),
			None => self.fields.push((name.to_string(), value.to_string())),
		}
	}

	pub fn fields(&self) -> impl Iterator<Item = (&str, &str)> {
		self.fields.iter().map(|(n, v)| (n.as_str(), v.as_str()))
	}

	fn non_empty(&self, name: &str) -> Option<&str> {
		self.get(name).filter(|v| !v.is_empty())
	}

	pub fn language(&self) -> Option<&str> {
		self.non_empty("Language")
	}

	pub fn plural_forms(&self) -> Option<&str> {
		self.non_empty("Plural-Forms")
	}

	/// The `charset` parameter of `Content-Type`.
	///
	/// The xgettext placeholder `CHARSET` counts as undeclared.
	pub fn charset(&self) -> Option<&str> {
		self.get("Content-Type")
			.and_then(charset_param)
			.filter(|c| !c.is_empty() && !c.eq_ignore_ascii_case(TEMPLATE_CHARSET))
	}

	/// Rewrite the `charset` parameter of `Content-Type`.
	pub fn set_charset(&mut self, charset: &str) {
		let content_type = match self.get("Content-Type") {
			Some(value) => {
				let params: Vec<&str> = value
					.split(';')
					.map(str::trim)
					.filter(|p| !p.to_ascii_lowercase().starts_with("charset="))
					.collect();
				format!("{}; charset={charset}", params.join("; "))
			}
			None => format!("text/plain; charset={charset}"),
		};
		self.set("Content-Type", &content_type);
	}

	/// `PO-Revision-Date`, `Ok(None)` when absent or still the template value.
	pub fn revision_date(&self) -> Result<Option<DateTime<FixedOffset>>, String> {
		parse_timestamp(self.get("PO-Revision-Date"))
	}

	pub fn creation_date(&self) -> Result<Option<DateTime<FixedOffset>>, String> {
		parse_timestamp(self.get("POT-Creation-Date"))
	}

	/// True when `Last-Translator` was never filled in.
	pub fn has_template_translator(&self) -> bool {
		self.get("Last-Translator") == Some(TEMPLATE_TRANSLATOR)
	}

	/// Serialize back to the msgstr layout.
	pub fn to_msgstr(&self) -> String {
		self.fields
			.iter()
			.map(|(name, value)| format!("{name}: {value}\n"))
			.collect()
	}
}

pub(crate) fn charset_param(content_type: &str) -> Option<&str> {
	content_type.split(';').map(str::trim).find_map(|param| {
		let (key, value) = param.split_once('=')?;
		key.trim()
			.eq_ignore_ascii_case("charset")
			.then(|| value.trim().trim_matches('"'))
	})
}

fn parse_timestamp(value: Option<&str>) -> Result<Option<DateTime<FixedOffset>>, String> {
	match value.map(str::trim) {
		None | Some("") | Some(TEMPLATE_TIMESTAMP) => Ok(None),
		Some(raw) => DateTime::parse_from_str(raw, TIMESTAMP_FORMAT)
			.map(Some)
			.map_err(|e| format!("invalid timestamp '{raw}': {e}")),
	}
}
