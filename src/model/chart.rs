// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Ledgerlens-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of Ledgerlens and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

//! Canonical chart model consumed by every chart renderer.

use std::fmt;
use std::str::FromStr;

use serde::ser::SerializeMap;
use serde::{Deserialize, Serialize, Serializer};
use serde_json::{Map, Value};

/// One flat data row: a category key plus one key per metric.
pub type Record = Map<String, Value>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ChartType {
    Bar,
    Line,
    Area,
    StackedArea,
    Pie,
    Scatter,
    MultiBar,
    None,
}

impl ChartType {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Bar => "bar",
            Self::Line => "line",
            Self::Area => "area",
            Self::StackedArea => "stackedArea",
            Self::Pie => "pie",
            Self::Scatter => "scatter",
            Self::MultiBar => "multiBar",
            Self::None => "none",
        }
    }

    /// Category key used when the payload names none.
    pub fn default_category_key(self) -> &'static str {
        match self {
            Self::Line | Self::Area | Self::StackedArea => "date",
            _ => "category",
        }
    }
}

impl fmt::Display for ChartType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown chart type '{0}'")]
pub struct ParseChartTypeError(pub String);

impl FromStr for ChartType {
    type Err = ParseChartTypeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let folded = s
            .trim()
            .chars()
            .filter(|c| !matches!(c, '_' | '-' | ' '))
            .collect::<String>()
            .to_ascii_lowercase();
        match folded.as_str() {
            "bar" | "column" | "barchart" => Ok(Self::Bar),
            "line" | "linechart" => Ok(Self::Line),
            "area" | "areachart" => Ok(Self::Area),
            "stackedarea" => Ok(Self::StackedArea),
            "pie" | "donut" | "piechart" => Ok(Self::Pie),
            "scatter" | "scatterplot" => Ok(Self::Scatter),
            "multibar" | "groupedbar" | "stackedbar" => Ok(Self::MultiBar),
            "none" => Ok(Self::None),
            _ => Err(ParseChartTypeError(s.to_owned())),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChartConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub x_axis_key: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub x_axis_label: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub y_axis_label: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub colors: Vec<String>,
    #[serde(default)]
    pub stacked: bool,
    #[serde(default = "default_show_legend")]
    pub show_legend: bool,
}

fn default_show_legend() -> bool {
    true
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Formatter {
    #[default]
    Number,
    Currency,
    Percent,
    Compact,
}

impl Formatter {
    pub fn parse_lenient(s: &str) -> Self {
        match s.trim().to_ascii_lowercase().as_str() {
            "currency" | "usd" | "money" => Self::Currency,
            "percent" | "percentage" | "%" => Self::Percent,
            "compact" | "abbreviated" => Self::Compact,
            _ => Self::Number,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct MetricSpec {
    pub label: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub unit: Option<String>,
    #[serde(default)]
    pub formatter: Formatter,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub precision: Option<u8>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
}

impl MetricSpec {
    pub fn labelled(label: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            ..Self::default()
        }
    }
}

/// Ordered `metric key -> spec` table; declaration order drives render order.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct MetricConfig {
    entries: Vec<(String, MetricSpec)>,
}

impl MetricConfig {
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(key, _)| key.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &MetricSpec)> {
        self.entries.iter().map(|(key, spec)| (key.as_str(), spec))
    }

    pub fn get(&self, key: &str) -> Option<&MetricSpec> {
        self.entries
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, spec)| spec)
    }

    /// Resolves a series name to a declared key, by exact key or by label.
    pub fn match_series(&self, name: &str) -> Option<&str> {
        if let Some((key, _)) = self.entries.iter().find(|(key, _)| key == name) {
            return Some(key);
        }
        self.entries
            .iter()
            .find(|(_, spec)| spec.label == name)
            .map(|(key, _)| key.as_str())
    }

    /// Inserts or replaces `key`, keeping its original position on replace.
    pub fn insert(&mut self, key: impl Into<String>, spec: MetricSpec) {
        let key = key.into();
        match self.entries.iter_mut().find(|(k, _)| *k == key) {
            Some((_, existing)) => *existing = spec,
            None => self.entries.push((key, spec)),
        }
    }
}

impl Serialize for MetricConfig {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.entries.len()))?;
        for (key, spec) in &self.entries {
            map.serialize_entry(key, spec)?;
        }
        map.end()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct YDomain {
    pub min: f64,
    pub max: f64,
    /// Ask the renderer to draw a reference line at zero.
    pub zero_line: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChartModel {
    pub chart_type: ChartType,
    pub config: ChartConfig,
    pub data: Vec<Record>,
    pub metric_keys: Vec<String>,
    pub metric_config: MetricConfig,
    pub y_domain: YDomain,
}

impl ChartModel {
    /// The resolved category key (always present after normalization).
    pub fn category_key(&self) -> &str {
        self.config
            .x_axis_key
            .as_deref()
            .unwrap_or_else(|| self.chart_type.default_category_key())
    }

    pub fn title(&self) -> Option<&str> {
        self.config.title.as_deref()
    }
}

/// Result of normalizing one payload: either a renderable model or an explicit
/// "no valid data" state that the view shows instead of an empty chart/table.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum Normalized<T> {
    Ready(T),
    NoValidData {
        #[serde(skip_serializing_if = "Option::is_none")]
        title: Option<String>,
        diagnosis: String,
    },
}

impl<T> Normalized<T> {
    pub fn is_ready(&self) -> bool {
        matches!(self, Self::Ready(_))
    }

    pub fn ready(&self) -> Option<&T> {
        match self {
            Self::Ready(model) => Some(model),
            Self::NoValidData { .. } => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{ChartType, Formatter, MetricConfig, MetricSpec};

    #[test]
    fn chart_type_parses_aliases() {
        assert_eq!("stacked_area".parse::<ChartType>(), Ok(ChartType::StackedArea));
        assert_eq!("Multi-Bar".parse::<ChartType>(), Ok(ChartType::MultiBar));
        assert_eq!("column".parse::<ChartType>(), Ok(ChartType::Bar));
        assert!("radar".parse::<ChartType>().is_err());
    }

    #[test]
    fn default_category_key_depends_on_type() {
        assert_eq!(ChartType::Bar.default_category_key(), "category");
        assert_eq!(ChartType::Pie.default_category_key(), "category");
        assert_eq!(ChartType::Line.default_category_key(), "date");
    }

    #[test]
    fn metric_config_matches_series_by_key_or_label() {
        let mut config = MetricConfig::default();
        config.insert("revenue", MetricSpec::labelled("Revenue"));
        config.insert("net_income", MetricSpec::labelled("Net Income"));

        assert_eq!(config.match_series("revenue"), Some("revenue"));
        assert_eq!(config.match_series("Net Income"), Some("net_income"));
        assert_eq!(config.match_series("EBITDA"), None);
    }

    #[test]
    fn metric_config_serializes_in_declaration_order() {
        let mut config = MetricConfig::default();
        config.insert("b", MetricSpec::labelled("B"));
        config.insert("a", MetricSpec::labelled("A"));
        let json = serde_json::to_string(&config).expect("serialize");
        assert!(json.find("\"b\"").expect("b") < json.find("\"a\"").expect("a"));
    }

    #[test]
    fn formatter_is_lenient() {
        assert_eq!(Formatter::parse_lenient("USD"), Formatter::Currency);
        assert_eq!(Formatter::parse_lenient("%"), Formatter::Percent);
        assert_eq!(Formatter::parse_lenient("whatever"), Formatter::Number);
    }
}
