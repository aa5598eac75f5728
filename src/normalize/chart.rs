// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Ledgerlens-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of Ledgerlens and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

//! Chart payloads to [`ChartModel`].
//!
//! Three data shapes are accepted:
//! - multi-series: `[{name, data: [{x, y}]}]`, pivoted to one record per distinct `x`;
//! - paired: `[{x, y}]` with a single metric;
//! - flat: records that already carry the category key.

use serde_json::{Map, Value};
use tracing::warn;

use super::numeric::{coerce_number, number_value, slugify};
use super::payload::{field, str_field, value_label};
use super::{Normalizer, ShapeError};
use crate::model::{
    ChartConfig, ChartModel, ChartType, Formatter, MetricConfig, MetricSpec, Record, YDomain,
};

/// Key in a record that carries a citation rather than a metric.
const CITATION_KEY: &str = "citation";
const PAIRED_DEFAULT_METRIC: &str = "value";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum DataShape {
    MultiSeries,
    Paired,
    Flat,
}

impl Normalizer {
    pub fn chart(&self, raw: &Value) -> Result<ChartModel, ShapeError> {
        let obj = raw.as_object().ok_or(ShapeError::NotAnObject)?;

        let chart_type = match str_field(obj, &["chartType", "chart_type", "type"]) {
            Some(name) if name.eq_ignore_ascii_case("chart") => ChartType::Bar,
            Some(name) => name
                .parse::<ChartType>()
                .map_err(|err| ShapeError::UnknownChartType(err.0))?,
            None => ChartType::Bar,
        };
        let mut config = parse_config(obj, chart_type);
        let declared = parse_metric_config(obj);
        let data = field(obj, &["data", "series"])
            .and_then(Value::as_array)
            .ok_or(ShapeError::MissingData)?;

        let mut category_key = preferred_category_key(&config, chart_type);
        let shape = detect_shape(data, &category_key).ok_or(ShapeError::UnrecognizedShape)?;
        if shape == DataShape::Flat {
            if let Some(found) = infer_category_key(data, &category_key) {
                category_key = found;
            }
        }

        let (records, metric_keys) = match shape {
            DataShape::MultiSeries => pivot_series(data, &category_key, &declared),
            DataShape::Paired => map_pairs(data, &category_key, &declared)?,
            DataShape::Flat => flatten_records(data, &category_key, &declared),
        };
        let records = records
            .into_iter()
            .map(|record| self.cite_record(record))
            .collect::<Vec<_>>();

        let values = records
            .iter()
            .flat_map(|record| {
                metric_keys
                    .iter()
                    .filter_map(move |key| record.get(key).and_then(Value::as_f64))
            })
            .collect::<Vec<_>>();
        if values.is_empty() {
            return Err(ShapeError::NoNumericData);
        }

        let metric_config = resolve_metric_config(&metric_keys, &declared, &config, self.palette());
        config.x_axis_key = Some(category_key);

        Ok(ChartModel {
            chart_type,
            config,
            data: records,
            metric_keys,
            metric_config,
            y_domain: y_domain(&values),
        })
    }

    /// Resolves an embedded citation so the record carries a highlight id the viewer knows.
    fn cite_record(&self, mut record: Record) -> Record {
        let Some(raw) = record.get(CITATION_KEY) else {
            return record;
        };
        let resolved = self
            .registry()
            .resolve(raw, self.default_document())
            .and_then(|citation| serde_json::to_value(citation).ok());
        match resolved {
            Some(value) => {
                record.insert(CITATION_KEY.to_owned(), value);
            }
            None => {
                record.remove(CITATION_KEY);
            }
        }
        record
    }
}

fn parse_config(obj: &Map<String, Value>, chart_type: ChartType) -> ChartConfig {
    let nested = field(obj, &["config"]).and_then(Value::as_object);
    let text = |keys: &[&str]| -> Option<String> {
        nested
            .and_then(|c| str_field(c, keys))
            .or_else(|| str_field(obj, keys))
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_owned)
    };
    let flag = |key: &str| -> Option<bool> {
        nested
            .and_then(|c| c.get(key))
            .or_else(|| obj.get(key))
            .and_then(Value::as_bool)
    };

    let colors = nested
        .and_then(|c| c.get("colors"))
        .or_else(|| obj.get("colors"))
        .and_then(Value::as_array)
        .map(|items| {
            items
                .iter()
                .filter_map(Value::as_str)
                .map(str::to_owned)
                .collect()
        })
        .unwrap_or_default();

    ChartConfig {
        title: text(&["title", "name"]),
        x_axis_key: text(&["xAxisKey", "x_axis_key", "xKey", "categoryKey"]),
        x_axis_label: text(&["xAxisLabel", "x_axis_label", "xLabel"]),
        y_axis_label: text(&["yAxisLabel", "y_axis_label", "yLabel"]),
        colors,
        stacked: flag("stacked").unwrap_or(chart_type == ChartType::StackedArea),
        show_legend: flag("showLegend").unwrap_or(true),
    }
}

fn parse_metric_config(obj: &Map<String, Value>) -> MetricConfig {
    let mut config = MetricConfig::default();
    match field(obj, &["metricConfig", "metric_config", "metrics"]) {
        Some(Value::Object(map)) => {
            for (key, spec) in map {
                config.insert(key.clone(), parse_metric_spec(key, spec));
            }
        }
        Some(Value::Array(items)) => {
            for item in items {
                let key = match item {
                    Value::String(key) => Some(key.clone()),
                    Value::Object(entry) => {
                        str_field(entry, &["key", "dataKey", "name"]).map(str::to_owned)
                    }
                    _ => None,
                };
                if let Some(key) = key.filter(|k| !k.trim().is_empty()) {
                    let spec = parse_metric_spec(&key, item);
                    config.insert(key, spec);
                }
            }
        }
        _ => {}
    }
    config
}

fn parse_metric_spec(key: &str, raw: &Value) -> MetricSpec {
    let Some(obj) = raw.as_object() else {
        return match raw.as_str() {
            Some(label) if label != key => MetricSpec::labelled(label),
            _ => MetricSpec::labelled(key),
        };
    };
    MetricSpec {
        label: str_field(obj, &["label", "name", "displayName"])
            .unwrap_or(key)
            .to_owned(),
        unit: str_field(obj, &["unit"]).map(str::to_owned),
        formatter: str_field(obj, &["formatter", "format"])
            .map(Formatter::parse_lenient)
            .unwrap_or_default(),
        precision: field(obj, &["precision", "decimals"])
            .and_then(coerce_number)
            .map(|p| p.clamp(0.0, 10.0) as u8),
        color: str_field(obj, &["color", "colour"]).map(str::to_owned),
    }
}

/// `config.xAxisKey`, then a slug of `config.xAxisLabel`, then the type default.
fn preferred_category_key(config: &ChartConfig, chart_type: ChartType) -> String {
    if let Some(key) = &config.x_axis_key {
        return key.clone();
    }
    if let Some(slug) = config
        .x_axis_label
        .as_deref()
        .map(slugify)
        .filter(|s| !s.is_empty())
    {
        return slug;
    }
    chart_type.default_category_key().to_owned()
}

/// Flat records that do not carry the preferred key: use their first text field instead.
fn infer_category_key(data: &[Value], preferred: &str) -> Option<String> {
    let first = data.first()?.as_object()?;
    if first.contains_key(preferred) {
        return None;
    }
    first
        .iter()
        .find(|(key, value)| {
            key.as_str() != CITATION_KEY && value.is_string() && coerce_number(value).is_none()
        })
        .map(|(key, _)| key.clone())
}

fn detect_shape(data: &[Value], category_key: &str) -> Option<DataShape> {
    let objects = data
        .iter()
        .map(Value::as_object)
        .collect::<Option<Vec<_>>>()?;
    if objects.is_empty() {
        return Some(DataShape::Flat);
    }
    if objects
        .iter()
        .all(|o| o.get("data").is_some_and(Value::is_array))
    {
        return Some(DataShape::MultiSeries);
    }
    if objects.iter().all(|o| {
        o.contains_key("x")
            && o.contains_key("y")
            && (category_key == "x" || !o.contains_key(category_key))
    }) {
        return Some(DataShape::Paired);
    }
    Some(DataShape::Flat)
}

fn pivot_series(
    data: &[Value],
    category_key: &str,
    declared: &MetricConfig,
) -> (Vec<Record>, Vec<String>) {
    let mut rows: Vec<Record> = Vec::new();
    let mut keys: Vec<String> = Vec::new();

    for series in data.iter().filter_map(Value::as_object) {
        let Some(name) = field(series, &["name", "label", "key"]).and_then(value_label) else {
            warn!("dropping chart series without a name");
            continue;
        };
        let key = if declared.is_empty() {
            name
        } else {
            match declared.match_series(&name) {
                Some(key) => key.to_owned(),
                None => {
                    warn!(series = %name, "dropping chart series with no matching metric");
                    continue;
                }
            }
        };

        let points = series
            .get("data")
            .and_then(Value::as_array)
            .map(Vec::as_slice)
            .unwrap_or_default();
        for point in points.iter().filter_map(Value::as_object) {
            let Some(x) = point
                .get("x")
                .or_else(|| point.get(category_key))
                .filter(|x| !x.is_null())
            else {
                continue;
            };
            let Some(y) = field(point, &["y", "value"]).and_then(coerce_number) else {
                continue;
            };
            let index = match rows.iter().position(|r| r.get(category_key) == Some(x)) {
                Some(index) => index,
                None => {
                    let mut row = Record::new();
                    row.insert(category_key.to_owned(), x.clone());
                    rows.push(row);
                    rows.len() - 1
                }
            };
            rows[index].insert(key.clone(), number_value(y));
        }

        if !keys.contains(&key) {
            keys.push(key);
        }
    }

    (rows, keys)
}

fn map_pairs(
    data: &[Value],
    category_key: &str,
    declared: &MetricConfig,
) -> Result<(Vec<Record>, Vec<String>), ShapeError> {
    let metric_key = match declared.len() {
        0 => PAIRED_DEFAULT_METRIC.to_owned(),
        1 => declared
            .keys()
            .next()
            .unwrap_or(PAIRED_DEFAULT_METRIC)
            .to_owned(),
        declared => return Err(ShapeError::AmbiguousPairedMetric { declared }),
    };

    let records = data
        .iter()
        .filter_map(Value::as_object)
        .map(|pair| {
            let mut record = Record::new();
            record.insert(
                category_key.to_owned(),
                pair.get("x").cloned().unwrap_or(Value::Null),
            );
            if let Some(y) = pair.get("y").and_then(coerce_number) {
                record.insert(metric_key.clone(), number_value(y));
            }
            for (key, value) in pair {
                if key != "x" && key != "y" && !record.contains_key(key) {
                    record.insert(key.clone(), value.clone());
                }
            }
            record
        })
        .collect();

    Ok((records, vec![metric_key]))
}

fn flatten_records(
    data: &[Value],
    category_key: &str,
    declared: &MetricConfig,
) -> (Vec<Record>, Vec<String>) {
    let metric_keys: Vec<String> = if declared.is_empty() {
        data.first()
            .and_then(Value::as_object)
            .map(|first| {
                first
                    .iter()
                    .filter(|(key, value)| {
                        key.as_str() != category_key
                            && key.as_str() != CITATION_KEY
                            && coerce_number(value).is_some()
                    })
                    .map(|(key, _)| key.clone())
                    .collect()
            })
            .unwrap_or_default()
    } else {
        declared.keys().map(str::to_owned).collect()
    };

    let records = data
        .iter()
        .filter_map(Value::as_object)
        .map(|obj| {
            let mut record = obj.clone();
            for key in &metric_keys {
                match obj.get(key).and_then(coerce_number) {
                    Some(value) => {
                        record.insert(key.clone(), number_value(value));
                    }
                    None => {
                        record.remove(key);
                    }
                }
            }
            record
        })
        .collect();

    (records, metric_keys)
}

/// Colors: explicit metric color, then `config.colors[index]`, then the cyclic palette.
fn resolve_metric_config(
    metric_keys: &[String],
    declared: &MetricConfig,
    config: &ChartConfig,
    palette: &[String],
) -> MetricConfig {
    let mut resolved = MetricConfig::default();
    for (index, key) in metric_keys.iter().enumerate() {
        let mut spec = declared
            .get(key)
            .cloned()
            .unwrap_or_else(|| MetricSpec::labelled(key.clone()));
        if spec.label.trim().is_empty() {
            spec.label = key.clone();
        }
        if spec.color.is_none() {
            spec.color = config.colors.get(index).cloned().or_else(|| {
                (!palette.is_empty()).then(|| palette[index % palette.len()].clone())
            });
        }
        resolved.insert(key.clone(), spec);
    }
    resolved
}

/// Negative data: lower bound pushed 10% further down and a zero line drawn. Otherwise the
/// axis starts at zero and the upper bound gets 10% headroom.
fn y_domain(values: &[f64]) -> YDomain {
    let min = values.iter().copied().fold(f64::INFINITY, f64::min);
    let max = values.iter().copied().fold(f64::NEG_INFINITY, f64::max);

    if min < 0.0 {
        YDomain {
            min: min - min.abs() * 0.1,
            max: (max * 1.1).max(0.0),
            zero_line: true,
        }
    } else {
        let upper = max * 1.1;
        YDomain {
            min: 0.0,
            max: if upper > 0.0 { upper } else { 1.0 },
            zero_line: false,
        }
    }
}

#[cfg(test)]
mod tests;
