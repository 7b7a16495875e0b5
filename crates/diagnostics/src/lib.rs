// SPDX-FileCopyrightText: 2025 Caspar Water Company
//
// SPDX-License-Identifier: Apache-2.0

//! Logging setup shared by the volume upload crates.
//!
//! Usage:
//! - Set VOLUPLOAD_LOG=off (default) - no logs
//! - Set VOLUPLOAD_LOG=info - workflow outcomes (checks, uploads, tables)
//! - Set VOLUPLOAD_LOG=debug - every remote call and statement text

use std::sync::Once;

// Re-export emit so macros can use it
pub use emit;

/// Environment variable selecting the log level
pub const LOG_ENV: &str = "VOLUPLOAD_LOG";

static INIT: Once = Once::new();

/// Resolved logging configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogSetting {
    Off,
    Min(emit::Level),
    /// Unrecognized value; logging falls back to info
    Unknown,
}

/// Parse a `VOLUPLOAD_LOG` value. Matching is case-insensitive.
pub fn parse_setting(value: &str) -> LogSetting {
    match value.trim().to_ascii_lowercase().as_str() {
        "" | "off" => LogSetting::Off,
        "debug" => LogSetting::Min(emit::Level::Debug),
        "info" => LogSetting::Min(emit::Level::Info),
        "warn" => LogSetting::Min(emit::Level::Warn),
        "error" => LogSetting::Min(emit::Level::Error),
        _ => LogSetting::Unknown,
    }
}

/// Lowest level emitted for `setting`, or `None` when logging is off
pub fn min_level(setting: LogSetting) -> Option<emit::Level> {
    match setting {
        LogSetting::Off => None,
        LogSetting::Min(level) => Some(level),
        LogSetting::Unknown => Some(emit::Level::Info),
    }
}

/// Initialize logging from the `VOLUPLOAD_LOG` environment variable.
///
/// Call once at startup; later calls are ignored.
pub fn init_diagnostics() {
    INIT.call_once(|| {
        let raw = std::env::var(LOG_ENV).unwrap_or_else(|_| "off".to_string());

        let setting = parse_setting(&raw);
        let Some(level) = min_level(setting) else {
            return;
        };

        let rt = emit::setup()
            .emit_to(emit_term::stderr())
            .emit_when(emit::level::min_filter(level))
            .init();

        if setting == LogSetting::Unknown {
            emit::warn!(
                "Unknown {env} value '{value}', using 'info'",
                env: LOG_ENV,
                value: raw.as_str()
            );
        }

        // The runtime must live for the whole process
        std::mem::forget(rt);
    });
}

/// Log workflow outcomes users care about.
/// Examples: "Validated volume main.raw.files", "Uploaded 1024 bytes"
#[macro_export]
macro_rules! info {
    ($($arg:tt)*) => {
        $crate::emit::info!($($arg)*)
    };
}

/// Log remote calls and internal steps.
#[macro_export]
macro_rules! debug {
    ($($arg:tt)*) => {
        $crate::emit::debug!($($arg)*)
    };
}

/// Log recoverable problems: denials, failed steps, expired sessions.
#[macro_export]
macro_rules! warn {
    ($($arg:tt)*) => {
        $crate::emit::warn!($($arg)*)
    };
}

#[macro_export]
macro_rules! error {
    ($($arg:tt)*) => {
        $crate::emit::error!($($arg)*)
    };
}

pub use init_diagnostics as init;
