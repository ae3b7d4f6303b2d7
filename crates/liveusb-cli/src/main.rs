// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! liveusb-i18n - translation catalog tools for the liveusb creator
//!
//! Validates, inspects, normalizes and compiles gettext PO catalogs, and
//! resolves messages the way the creator does at runtime.

use std::io;
use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing::{debug, info};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use liveusb_cli_config::{
	load_config_with_cli,
	runtime::{LogFormat, LogLevel, LoggingConfig},
	sources::CliOverrides,
};

mod commands;
mod locale;

use commands::LookupRequest;
use locale::system_locale;

/// liveusb-i18n - translation catalog tools
#[derive(Parser, Debug)]
#[command(name = "liveusb-i18n", version, about, long_about = None)]
struct Args {
	/// Path to custom configuration file
	#[arg(short, long, global = true)]
	config: Option<PathBuf>,

	/// Directory holding <locale>.po catalogs (overrides config)
	#[arg(long, global = true)]
	catalog_dir: Option<PathBuf>,

	/// Fuzzy entry policy: ignore or surface (overrides config)
	#[arg(long, global = true)]
	fuzzy: Option<String>,

	/// Log level (overrides config)
	#[arg(short, long, global = true)]
	log_level: Option<String>,

	/// Output logs as JSON (overrides config)
	#[arg(long, global = true)]
	json_logs: bool,

	#[command(subcommand)]
	command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
	/// Parse catalogs strictly and report errors and warnings
	Check {
		#[arg(required = true)]
		files: Vec<PathBuf>,
	},
	/// Print translation statistics
	Stats {
		#[arg(required = true)]
		files: Vec<PathBuf>,
		/// Output as JSON
		#[arg(long)]
		json: bool,
	},
	/// Rewrite a catalog in canonical layout
	Normalize {
		file: PathBuf,
		/// Write here instead of stdout
		#[arg(short, long)]
		output: Option<PathBuf>,
	},
	/// Compile a catalog to a binary .mo file
	Compile {
		file: PathBuf,
		#[arg(short, long)]
		output: PathBuf,
	},
	/// Translate one message
	Lookup {
		msgid: String,
		/// Message context (msgctxt)
		#[arg(long)]
		context: Option<String>,
		/// Locale to translate into (default: config, then system locale)
		#[arg(long)]
		locale: Option<String>,
		/// Plural source form (msgid_plural)
		#[arg(long, requires = "count")]
		plural: Option<String>,
		/// Quantity selecting the plural form
		#[arg(long, requires = "plural")]
		count: Option<u64>,
		/// Positional placeholder value (repeatable)
		#[arg(long = "arg", value_name = "VALUE")]
		args: Vec<String>,
		/// Named placeholder value (repeatable: --named KEY=VALUE)
		#[arg(long, value_name = "KEY=VALUE")]
		named: Vec<String>,
		/// Output as JSON
		#[arg(long)]
		json: bool,
	},
	/// List available catalogs
	Locales {
		/// Output as JSON
		#[arg(long)]
		json: bool,
	},
	/// Print the effective configuration
	Config {
		/// Create ~/.config/liveusb/config.toml if missing
		#[arg(long)]
		init: bool,
	},
}

impl From<&Args> for CliOverrides {
	fn from(args: &Args) -> Self {
		Self {
			locale: None,
			catalog_dir: args.catalog_dir.clone(),
			fuzzy: args.fuzzy.clone(),
			log_level: args.log_level.clone(),
			log_format: if args.json_logs {
				Some("json".to_string())
			} else {
				None
			},
			config_file: args.config.clone(),
		}
	}
}

fn log_level_to_tracing(level: LogLevel) -> tracing::Level {
	match level {
		LogLevel::Trace => tracing::Level::TRACE,
		LogLevel::Debug => tracing::Level::DEBUG,
		LogLevel::Info => tracing::Level::INFO,
		LogLevel::Warn => tracing::Level::WARN,
		LogLevel::Error => tracing::Level::ERROR,
	}
}

/// Logs go to stderr; stdout carries command output.
fn init_tracing(logging: &LoggingConfig) {
	let filter = EnvFilter::try_from_default_env()
		.unwrap_or_else(|_| EnvFilter::new(log_level_to_tracing(logging.level).to_string()));

	match logging.format {
		LogFormat::Json => {
			tracing_subscriber::registry()
				.with(filter)
				.with(fmt::layer().json().with_writer(io::stderr))
				.init();
		}
		LogFormat::Compact => {
			tracing_subscriber::registry()
				.with(filter)
				.with(fmt::layer().compact().with_writer(io::stderr))
				.init();
		}
		LogFormat::Pretty => {
			tracing_subscriber::registry()
				.with(filter)
				.with(fmt::layer().with_writer(io::stderr))
				.init();
		}
	}
}

fn main() -> Result<ExitCode> {
	let args = Args::parse();

	let cli_overrides = CliOverrides::from(&args);
	let config = load_config_with_cli(cli_overrides).context("failed to load configuration")?;

	init_tracing(&config.logging);
	debug!(command = ?args.command, "starting liveusb-i18n");

	let parse_options = config.i18n.parse_options();
	let mut stdout = io::stdout().lock();

	match &args.command {
		Command::Check { files } => {
			if !commands::check(files, &mut stdout)? {
				return Ok(ExitCode::FAILURE);
			}
		}
		Command::Stats { files, json } => commands::stats(files, parse_options, *json, &mut stdout)?,
		Command::Normalize { file, output } => {
			commands::normalize(file, output.as_deref(), parse_options, &mut stdout)?
		}
		Command::Compile { file, output } => commands::compile(file, output, parse_options)?,
		Command::Lookup {
			msgid,
			context,
			locale,
			plural,
			count,
			args: values,
			named,
			json,
		} => {
			let preferred = locale
				.as_deref()
				.or(config.i18n.locale.as_deref())
				.or_else(|| system_locale());
			info!(preferred = preferred.unwrap_or("none"), "resolving locale");
			let request = LookupRequest {
				msgid: msgid.clone(),
				context: context.clone(),
				plural: plural.clone().zip(*count),
				args: values.clone(),
				named: named.clone(),
				json: *json,
			};
			commands::lookup(
				commands::catalog_source(&config),
				&config,
				preferred,
				&request,
				&mut stdout,
			)?
		}
		Command::Locales { json } => {
			let source = commands::catalog_source(&config);
			commands::locales(source.as_ref(), *json, &mut stdout)?
		}
		Command::Config { init } => commands::show_config(&config, *init, &mut stdout)?,
	}

	Ok(ExitCode::SUCCESS)
}
