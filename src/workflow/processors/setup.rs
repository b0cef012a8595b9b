//! Setup/initialization module - handles application startup tasks
//!
//! Includes:
//! - Logger initialization
//! - Folder structure initialization
//! - Watermark asset check

use crate::config::AppConfig;
use crate::workflow::processors::assets::LogoAssets;
use anstyle::{AnsiColor, Style};
use anyhow::{Context, Result};
use env_logger::{Builder, Env, WriteStyle};
use log::kv::Key;
use std::io::Write;

// ────────────────────────────────────────────────────────────────
// Logger Initialization
// ────────────────────────────────────────────────────────────────

const DIM: Style = AnsiColor::BrightBlack.on_default();
const CYAN: Style = AnsiColor::Cyan.on_default();

/// Initialize the logger. `RUST_LOG` overrides the INFO default.
pub fn initialize_logger() {
    Builder::from_env(Env::default().default_filter_or("info"))
        .write_style(WriteStyle::Auto)
        .format(|buf, record| {
            let level_style = buf.default_level_style(record.level());

            // Format the optional `duration` key to 2 decimal places
            let dur_raw = record
                .key_values()
                .get(Key::from("duration"))
                .map(|v| {
                    let s = format!("{}", v);
                    if let Some(idx) = s.find(|c: char| c.is_alphabetic()) {
                        let (num, unit) = (&s[..idx], &s[idx..]);
                        if let Ok(val) = num.parse::<f32>() {
                            return format!("{:.2} {}", val, unit);
                        }
                    }
                    s
                })
                .unwrap_or_default();

            let dur = if dur_raw.is_empty() {
                " ".repeat(10)
            } else {
                format!("{CYAN}{:>10}{CYAN:#}", dur_raw)
            };

            writeln!(
                buf,
                "{DIM}{}{DIM:#} {level_style}{:<5}{level_style:#} {DIM}{}{DIM:#}",
                buf.timestamp(),
                record.level(),
                record.target()
            )?;

            let message = format!("{}", record.args());
            let subsequent_indent = " ".repeat(11);
            let mut lines = message.lines();
            if let Some(first_line) = lines.next() {
                writeln!(buf, "{} {}", dur, first_line)?;
            }
            for line in lines {
                writeln!(buf, "{}{}", subsequent_indent, line)?;
            }
            Ok(())
        })
        .filter(Some("reqwest"), log::LevelFilter::Warn)
        .filter(Some("hyper"), log::LevelFilter::Warn)
        .init();
}

// ────────────────────────────────────────────────────────────────
// Folder Initialization
// ────────────────────────────────────────────────────────────────

/// Create the scratch and output roots.
pub fn initialize_folder(config: &AppConfig) -> Result<()> {
    std::fs::create_dir_all(&config.scratch_dir)
        .with_context(|| format!("failed to create scratch dir {:?}", config.scratch_dir))?;
    std::fs::create_dir_all(&config.output_dir)
        .with_context(|| format!("failed to create output dir {:?}", config.output_dir))?;
    Ok(())
}

// ────────────────────────────────────────────────────────────────
// Asset Check
// ────────────────────────────────────────────────────────────────

/// Every named watermark must exist; the service must not start otherwise.
pub fn check_logo_assets(config: &AppConfig) -> Result<LogoAssets> {
    let assets = LogoAssets::verify(&config.logo_dir)
        .with_context(|| format!("watermark assets incomplete in {:?}", config.logo_dir))?;
    info!("Watermark assets found in {:?}", assets.dir());
    Ok(assets)
}

pub fn initialize(config: &AppConfig) -> Result<LogoAssets> {
    initialize_logger();
    if !cfg!(feature = "heic") {
        warn!("Built without the `heic` feature, HEIC/HEIF uploads will fail to decode");
    }
    initialize_folder(config)?;
    check_logo_assets(config)
}
