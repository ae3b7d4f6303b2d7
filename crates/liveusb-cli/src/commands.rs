// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Subcommand implementations. Output goes to the writer passed in.

use std::io::Write;
use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use liveusb_cli_config::{ensure_default_config, LiveUsbConfig};
use liveusb_common_catalog::{compile_mo, Catalog, CatalogError, CatalogStats, ParseOptions};
use liveusb_common_i18n::{
	locale_info, resolve_locale, CatalogDir, CatalogSource, EmbeddedSource, FormatArg, FormatArgs,
	LocaleId, Translator,
};
use serde::Serialize;
use tracing::{debug, info, warn};

/// Parse every file strictly and report problems.
///
/// Returns `false` when any file failed to parse.
pub fn check(files: &[PathBuf], out: &mut impl Write) -> Result<bool> {
	let mut ok = true;
	for path in files {
		match Catalog::from_path(path, ParseOptions::strict()) {
			Ok(catalog) => {
				let diagnostics = catalog.check(expected_language(path).as_deref());
				for diagnostic in &diagnostics {
					writeln!(out, "{}: warning: {diagnostic}", path.display())?;
				}
				writeln!(out, "{}: {}", path.display(), catalog.stats())?;
			}
			Err(e) => {
				ok = false;
				writeln!(out, "{}: error: {e}", path.display())?;
			}
		}
	}
	Ok(ok)
}

/// Locale a catalog file claims by its name: `pt.po` or `pt/messages.po`.
fn expected_language(path: &Path) -> Option<String> {
	let stem = path.file_stem()?.to_str()?;
	let name = if stem == "messages" {
		path.parent()?.file_name()?.to_str()?
	} else {
		stem
	};
	LocaleId::parse(name).ok().map(|locale| locale.tag())
}

#[derive(Debug, Serialize)]
struct FileStats<'a> {
	path: &'a Path,
	#[serde(flatten)]
	stats: CatalogStats,
	percent_translated: f64,
}

pub fn stats(files: &[PathBuf], options: ParseOptions, json: bool, out: &mut impl Write) -> Result<()> {
	let mut report = Vec::with_capacity(files.len());
	for path in files {
		let catalog = load(path, options)?;
		let stats = catalog.stats();
		report.push(FileStats {
			path,
			stats,
			percent_translated: stats.percent_translated(),
		});
	}

	if json {
		serde_json::to_writer_pretty(&mut *out, &report)?;
		writeln!(out)?;
	} else {
		for file in &report {
			writeln!(
				out,
				"{}: {} ({:.1}% translated)",
				file.path.display(),
				file.stats,
				file.percent_translated
			)?;
		}
	}
	Ok(())
}

/// Re-serialize a catalog in canonical layout and its own charset.
pub fn normalize(file: &Path, output: Option<&Path>, options: ParseOptions, out: &mut impl Write) -> Result<()> {
	let catalog = load(file, options)?;
	let bytes = catalog
		.to_po_bytes()
		.with_context(|| format!("failed to encode {}", file.display()))?;
	match output {
		Some(path) => {
			std::fs::write(path, &bytes).with_context(|| format!("failed to write {}", path.display()))?;
			info!(input = %file.display(), output = %path.display(), "normalized catalog");
		}
		None => out.write_all(&bytes)?,
	}
	Ok(())
}

pub fn compile(file: &Path, output: &Path, options: ParseOptions) -> Result<()> {
	let catalog = load(file, options)?;
	let mo = compile_mo(&catalog).with_context(|| format!("failed to compile {}", file.display()))?;
	std::fs::write(output, &mo).with_context(|| format!("failed to write {}", output.display()))?;
	info!(
		input = %file.display(),
		output = %output.display(),
		bytes = mo.len(),
		"compiled catalog"
	);
	Ok(())
}

fn load(path: &Path, options: ParseOptions) -> Result<Catalog> {
	Catalog::from_path(path, options).map_err(|e| match e {
		CatalogError::Io { .. } => anyhow::Error::new(e),
		other => anyhow::Error::new(other).context(format!("invalid catalog {}", path.display())),
	})
}

/// Catalogs from the configured directory, or the bundled ones when it is absent.
pub fn catalog_source(config: &LiveUsbConfig) -> Box<dyn CatalogSource> {
	let dir = &config.i18n.catalog_dir;
	if dir.is_dir() {
		debug!(dir = %dir.display(), "using catalog directory");
		Box::new(CatalogDir::new(dir.clone()))
	} else {
		debug!(dir = %dir.display(), "catalog directory missing, using bundled catalogs");
		Box::new(EmbeddedSource::bundled())
	}
}

/// A `lookup` invocation.
#[derive(Debug, Clone, Default)]
pub struct LookupRequest {
	pub msgid: String,
	pub context: Option<String>,
	pub plural: Option<(String, u64)>,
	pub args: Vec<String>,
	pub named: Vec<String>,
	pub json: bool,
}

#[derive(Debug, Serialize)]
struct LookupReport<'a> {
	locale: String,
	catalog: Option<&'a str>,
	translated: bool,
	approximate: bool,
	text: &'a str,
}

pub fn lookup(
	source: Box<dyn CatalogSource>,
	config: &LiveUsbConfig,
	preferred: Option<&str>,
	request: &LookupRequest,
	out: &mut impl Write,
) -> Result<()> {
	let locale = resolve_locale(preferred, Some(&config.i18n.fallback_locale), &source);
	let translator = Translator::new(source, config.i18n.translator_options());
	let active = translator
		.set_locale(&locale.to_string())
		.with_context(|| format!("failed to load catalog for {locale}"))?;

	let context = request.context.as_deref();
	let resolved = match &request.plural {
		Some((msgid_plural, n)) => translator.lookup_plural(context, &request.msgid, msgid_plural, *n),
		None => translator.lookup(context, &request.msgid),
	};
	match resolved.outcome() {
		Err(miss) if !locale.is_source() => warn!(%locale, %miss, "using source text"),
		_ => {}
	}

	let args = format_args(&request.args, &request.named)?;
	let text = resolved
		.render(&args)
		.with_context(|| format!("cannot format {:?}", resolved.source_text()))?;

	if request.json {
		let report = LookupReport {
			locale: active.locale().to_string(),
			catalog: active.tag(),
			translated: resolved.is_translated(),
			approximate: resolved.approximate(),
			text: &text,
		};
		serde_json::to_writer_pretty(&mut *out, &report)?;
		writeln!(out)?;
	} else {
		writeln!(out, "{text}")?;
	}
	Ok(())
}

fn format_args(positional: &[String], named: &[String]) -> Result<FormatArgs> {
	let mut args = FormatArgs::positional(positional.iter().map(FormatArg::raw));
	for pair in named {
		let Some((name, value)) = pair.split_once('=') else {
			bail!("named argument {pair:?} is not NAME=VALUE");
		};
		if name.is_empty() {
			bail!("named argument {pair:?} has an empty name");
		}
		args = args.named(name, FormatArg::raw(value));
	}
	Ok(args)
}

#[derive(Debug, Serialize)]
struct LocaleRow {
	tag: String,
	name: Option<&'static str>,
	native_name: Option<&'static str>,
	direction: Option<&'static str>,
}

/// List the catalogs a source can serve.
pub fn locales(source: &dyn CatalogSource, json: bool, out: &mut impl Write) -> Result<()> {
	let tags = source
		.tags()
		.with_context(|| format!("cannot list catalogs from {}", source.name()))?;
	let rows: Vec<LocaleRow> = tags
		.into_iter()
		.map(|tag| {
			let info = LocaleId::parse(&tag).ok().and_then(|id| locale_info(&id));
			LocaleRow {
				name: info.map(|i| i.name),
				native_name: info.map(|i| i.native_name),
				direction: info.map(|i| i.direction.as_str()),
				tag,
			}
		})
		.collect();

	if json {
		serde_json::to_writer_pretty(&mut *out, &rows)?;
		writeln!(out)?;
	} else {
		for row in &rows {
			match (row.name, row.native_name, row.direction) {
				(Some(name), Some(native), Some(direction)) => {
					writeln!(out, "{}\t{name}\t{native}\t{direction}", row.tag)?
				}
				_ => writeln!(out, "{}", row.tag)?,
			}
		}
	}
	Ok(())
}

/// Print the effective configuration, optionally creating the user file first.
pub fn show_config(config: &LiveUsbConfig, init: bool, out: &mut impl Write) -> Result<()> {
	if init {
		let paths = config
			.paths
			.as_ref()
			.context("configuration has no resolved paths")?;
		if ensure_default_config(&paths.user_config_file)? {
			writeln!(out, "created {}", paths.user_config_file.display())?;
		} else {
			writeln!(out, "{} already exists", paths.user_config_file.display())?;
		}
	}
	serde_json::to_writer_pretty(&mut *out, config)?;
	writeln!(out)?;
	Ok(())
}

#[cfg(test)]
mod tests {
	use super::*;
	use liveusb_cli_config::{ConfigLayer, PathsConfig};
	use liveusb_common_catalog::FuzzyPolicy;

	const PT: &[u8] = include_bytes!("../../liveusb-common-i18n/locales/pt.po");
	const PL: &[u8] = include_bytes!("../../liveusb-common-i18n/locales/pl.po");

	fn config(catalog_dir: &Path) -> LiveUsbConfig {
		let mut layer = ConfigLayer::default();
		layer.i18n_mut().catalog_dir = Some(catalog_dir.to_path_buf());
		LiveUsbConfig::from_layer(layer, PathsConfig::under_home(catalog_dir)).unwrap()
	}

	fn catalog_dir() -> tempfile::TempDir {
		let dir = tempfile::tempdir().unwrap();
		std::fs::write(dir.path().join("pt.po"), PT).unwrap();
		std::fs::write(dir.path().join("pl.po"), PL).unwrap();
		dir
	}

	fn run_lookup(dir: &Path, locale: &str, request: LookupRequest) -> String {
		let config = config(dir);
		let mut out = Vec::new();
		lookup(catalog_source(&config), &config, Some(locale), &request, &mut out).unwrap();
		String::from_utf8(out).unwrap()
	}

	#[test]
	fn test_check_reports_errors_and_warnings() {
		let dir = catalog_dir();
		let broken = dir.path().join("fr.po");
		std::fs::write(&broken, "msgid \"Cancel\"\nmsgstr \"Annuler\"\n").unwrap();
		let mislabeled = dir.path().join("de.po");
		std::fs::write(&mislabeled, PT).unwrap();

		let mut out = Vec::new();
		let ok = check(
			&[dir.path().join("pt.po"), mislabeled, broken],
			&mut out,
		)
		.unwrap();
		let out = String::from_utf8(out).unwrap();

		assert!(!ok);
		assert!(out.contains("pt.po: 10 translated messages"), "{out}");
		assert!(out.contains("de.po: warning: line 5: Language header 'pt'"), "{out}");
		assert!(out.contains("fr.po: error: format error at line 1"), "{out}");
	}

	#[test]
	fn test_check_clean_files() {
		let dir = catalog_dir();
		let mut out = Vec::new();
		assert!(check(&[dir.path().join("pt.po"), dir.path().join("pl.po")], &mut out).unwrap());
		assert!(!String::from_utf8(out).unwrap().contains("warning"));
	}

	#[test]
	fn test_expected_language() {
		assert_eq!(expected_language(Path::new("po/pt_BR.po")).as_deref(), Some("pt_BR"));
		assert_eq!(expected_language(Path::new("locale/pl/messages.po")).as_deref(), Some("pl"));
		assert_eq!(expected_language(Path::new("liveusb-creator.pot")), None);
	}

	#[test]
	fn test_stats_json() {
		let dir = catalog_dir();
		let mut out = Vec::new();
		stats(&[dir.path().join("pt.po")], ParseOptions::strict(), true, &mut out).unwrap();
		let value: serde_json::Value = serde_json::from_slice(&out).unwrap();
		assert_eq!(value[0]["translated"], 10);
		assert_eq!(value[0]["fuzzy"], 1);
		assert_eq!(value[0]["untranslated"], 1);
		assert_eq!(value[0]["obsolete"], 1);
	}

	#[test]
	fn test_normalize_is_stable() {
		let dir = catalog_dir();
		let once = dir.path().join("once.po");
		let mut sink = Vec::new();
		normalize(&dir.path().join("pt.po"), Some(&once), ParseOptions::strict(), &mut sink).unwrap();
		assert!(sink.is_empty());

		let mut twice = Vec::new();
		normalize(&once, None, ParseOptions::strict(), &mut twice).unwrap();
		assert_eq!(std::fs::read(&once).unwrap(), twice);
	}

	#[test]
	fn test_compile_writes_mo() {
		let dir = catalog_dir();
		let output = dir.path().join("pt.mo");
		compile(&dir.path().join("pt.po"), &output, ParseOptions::strict()).unwrap();
		let bytes = std::fs::read(&output).unwrap();
		assert_eq!(&bytes[..4], &0x950412de_u32.to_le_bytes());
	}

	#[test]
	fn test_load_error_names_file() {
		let err = load(Path::new("/nonexistent/pt.po"), ParseOptions::strict()).unwrap_err();
		assert!(format!("{err:#}").contains("/nonexistent/pt.po"));
	}

	#[test]
	fn test_lookup_with_arguments() {
		let dir = catalog_dir();
		let out = run_lookup(
			dir.path(),
			"pt_PT.UTF-8",
			LookupRequest {
				msgid: "Unsupported filesystem: %s".to_string(),
				args: vec!["FAT32".to_string()],
				..Default::default()
			},
		);
		assert_eq!(out, "Sistema de ficheiros não suportado: FAT32\n");
	}

	#[test]
	fn test_lookup_plural_json() {
		let dir = catalog_dir();
		let out = run_lookup(
			dir.path(),
			"pl",
			LookupRequest {
				msgid: "%d drive found".to_string(),
				plural: Some(("%d drives found".to_string(), 5)),
				args: vec!["5".to_string()],
				json: true,
				..Default::default()
			},
		);
		let value: serde_json::Value = serde_json::from_str(&out).unwrap();
		assert_eq!(value["text"], "Znaleziono 5 napędów");
		assert_eq!(value["catalog"], "pl");
		assert_eq!(value["translated"], true);
	}

	#[test]
	fn test_lookup_falls_back() {
		let dir = catalog_dir();
		let out = run_lookup(
			dir.path(),
			"de",
			LookupRequest {
				msgid: "Cancel".to_string(),
				..Default::default()
			},
		);
		assert_eq!(out, "Cancel\n");
	}

	#[test]
	fn test_lookup_rejects_bad_arguments() {
		let dir = catalog_dir();
		let config = config(dir.path());
		let request = LookupRequest {
			msgid: "Setting %s label to %s".to_string(),
			args: vec!["/dev/sdb1".to_string()],
			..Default::default()
		};
		let mut out = Vec::new();
		assert!(lookup(catalog_source(&config), &config, Some("pt"), &request, &mut out).is_err());

		assert!(format_args(&[], &["novalue".to_string()]).is_err());
		assert!(format_args(&[], &["=x".to_string()]).is_err());
	}

	#[test]
	fn test_arguments_keep_their_spelling() {
		let dir = catalog_dir();
		let out = run_lookup(
			dir.path(),
			"pt",
			LookupRequest {
				msgid: "Label %s, version %s, delta %s, %d MB".to_string(),
				args: ["007", "2.10", "+5", "0042"].map(String::from).to_vec(),
				..Default::default()
			},
		);
		assert_eq!(out, "Label 007, version 2.10, delta +5, 42 MB\n");

		let args = format_args(&[], &["label=007".to_string()]).unwrap();
		assert_eq!(args, FormatArgs::new().named("label", FormatArg::raw("007")));
	}

	#[test]
	fn test_lookup_without_arguments_checks_placeholders() {
		let dir = catalog_dir();
		let config = config(dir.path());
		let request = LookupRequest {
			msgid: "Unsupported filesystem: %s".to_string(),
			..Default::default()
		};
		let mut out = Vec::new();
		let err = lookup(catalog_source(&config), &config, Some("pt"), &request, &mut out).unwrap_err();
		assert!(format!("{err:#}").contains("expected 1 positional argument(s), got 0"), "{err:#}");
		assert!(out.is_empty());
	}

	#[test]
	fn test_locales_listing() {
		let dir = catalog_dir();
		let mut out = Vec::new();
		locales(&CatalogDir::new(dir.path()), false, &mut out).unwrap();
		assert_eq!(
			String::from_utf8(out).unwrap(),
			"pl\tPolish\tPolski\tltr\npt\tPortuguese\tPortuguês\tltr\n"
		);
	}

	#[test]
	fn test_bundled_source_when_dir_missing() {
		let config = config(Path::new("/nonexistent/liveusb/locale"));
		assert_eq!(catalog_source(&config).name(), "embedded");
		assert_eq!(config.i18n.fuzzy, FuzzyPolicy::Ignore);
	}

	#[test]
	fn test_show_config_init() {
		let home = tempfile::tempdir().unwrap();
		let config = config(home.path());
		let mut out = Vec::new();
		show_config(&config, true, &mut out).unwrap();
		let out = String::from_utf8(out).unwrap();
		assert!(out.starts_with("created "));
		assert!(home.path().join(".config/liveusb/config.toml").is_file());
		assert!(out.contains("\"fallback_locale\": \"en\""));
	}

	mod proptests {
		use super::*;
		use liveusb_common_catalog::{format::substitute, FormatKind};
		use proptest::prelude::*;

		proptest! {
			#[test]
			fn string_slots_render_arguments_verbatim(value in "[+-]?[0-9]{1,6}(\\.[0-9]{1,3})?") {
				let args = format_args(&[value.clone()], &[]).unwrap();
				let rendered = substitute("[%s]", FormatKind::Python, &args).unwrap();
				prop_assert_eq!(rendered, format!("[{value}]"));
			}

			#[test]
			fn integer_slots_parse_arguments(n in any::<i64>()) {
				let args = format_args(&[format!("{n:+}")], &[]).unwrap();
				let rendered = substitute("%d", FormatKind::Python, &args).unwrap();
				prop_assert_eq!(rendered, n.to_string());
			}
		}
	}
}
