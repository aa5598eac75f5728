// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Ledgerlens-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of Ledgerlens and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

//! Client tunables with environment overrides.

use std::env;
use std::time::Duration;

use thiserror::Error;

use crate::model::Rect;

pub const DEFAULT_FOCUS_MARGIN: f64 = 5.0;
pub const DEFAULT_FOCUS_DURATION: Duration = Duration::from_secs(3);
pub const DEFAULT_THINKING_TEXT: &str = "Analyzing your documents...";

/// Geometry used for citations that arrive without usable rects: a 300x20 box at (100, 100).
pub const FALLBACK_RECT: Rect = Rect {
    x1: 100.0,
    y1: 100.0,
    x2: 400.0,
    y2: 120.0,
    width: 300.0,
    height: 20.0,
};

pub const DEFAULT_PALETTE: [&str; 8] = [
    "#2563eb", "#16a34a", "#f59e0b", "#dc2626", "#7c3aed", "#0891b2", "#db2777", "#65a30d",
];

#[derive(Debug, Clone, PartialEq)]
pub struct ClientConfig {
    pub focus_margin: f64,
    pub focus_duration: Duration,
    pub fallback_rect: Rect,
    pub palette: Vec<String>,
    /// Fall back to the local simulation provider when the analysis service is unreachable.
    pub simulation_fallback: bool,
    pub thinking_text: String,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            focus_margin: DEFAULT_FOCUS_MARGIN,
            focus_duration: DEFAULT_FOCUS_DURATION,
            fallback_rect: FALLBACK_RECT,
            palette: DEFAULT_PALETTE.iter().map(|c| (*c).to_owned()).collect(),
            simulation_fallback: true,
            thinking_text: DEFAULT_THINKING_TEXT.to_owned(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    #[error("{var} must be {expected} (got '{value}')")]
    InvalidValue {
        var: &'static str,
        expected: &'static str,
        value: String,
    },
}

impl ClientConfig {
    /// Defaults overridden by `LEDGERLENS_*` environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let mut config = Self::default();

        if let Some(raw) = lookup("LEDGERLENS_FOCUS_MARGIN") {
            config.focus_margin = raw
                .trim()
                .parse::<f64>()
                .ok()
                .filter(|m| m.is_finite() && *m >= 0.0)
                .ok_or(ConfigError::InvalidValue {
                    var: "LEDGERLENS_FOCUS_MARGIN",
                    expected: "a non-negative number",
                    value: raw.clone(),
                })?;
        }

        if let Some(raw) = lookup("LEDGERLENS_FOCUS_MS") {
            let millis = raw.trim().parse::<u64>().map_err(|_| ConfigError::InvalidValue {
                var: "LEDGERLENS_FOCUS_MS",
                expected: "an integer number of milliseconds",
                value: raw.clone(),
            })?;
            config.focus_duration = Duration::from_millis(millis);
        }

        if let Some(raw) = lookup("LEDGERLENS_SIMULATION_FALLBACK") {
            config.simulation_fallback = parse_bool(&raw).ok_or(ConfigError::InvalidValue {
                var: "LEDGERLENS_SIMULATION_FALLBACK",
                expected: "a boolean",
                value: raw.clone(),
            })?;
        }

        if let Some(raw) = lookup("LEDGERLENS_THINKING_TEXT") {
            if !raw.trim().is_empty() {
                config.thinking_text = raw;
            }
        }

        Ok(config)
    }

    /// Palette color for the metric at `index`, cycling.
    pub fn palette_color(&self, index: usize) -> Option<&str> {
        if self.palette.is_empty() {
            return None;
        }
        Some(self.palette[index % self.palette.len()].as_str())
    }
}

fn parse_bool(raw: &str) -> Option<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}
