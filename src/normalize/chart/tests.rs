// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Ledgerlens-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of Ledgerlens and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

use rstest::{fixture, rstest};
use serde_json::{json, Value};

use crate::config::DEFAULT_PALETTE;
use crate::model::{ChartType, Normalized};
use crate::normalize::{Normalizer, ShapeError};

#[fixture]
fn normalizer() -> Normalizer {
    Normalizer::default()
}

fn records(model: &crate::model::ChartModel) -> Value {
    Value::Array(model.data.iter().cloned().map(Value::Object).collect())
}

#[rstest]
fn multi_series_is_pivoted_by_category(normalizer: Normalizer) {
    let model = normalizer
        .chart(&json!({
            "chartType": "bar",
            "data": [
                { "name": "2024", "data": [{ "x": "Q1", "y": 10 }, { "x": "Q2", "y": 12 }] },
                { "name": "2025", "data": [{ "x": "Q1", "y": 14 }, { "x": "Q2", "y": 16 }] }
            ],
            "metricConfig": { "2024": { "label": "2024" }, "2025": { "label": "2025" } }
        }))
        .expect("chart");

    assert_eq!(
        records(&model),
        json!([
            { "category": "Q1", "2024": 10.0, "2025": 14.0 },
            { "category": "Q2", "2024": 12.0, "2025": 16.0 }
        ])
    );
    assert_eq!(model.metric_keys, vec!["2024".to_owned(), "2025".to_owned()]);
    assert_eq!(model.category_key(), "category");
    assert_eq!(model.y_domain.min, 0.0);
    assert_eq!(model.y_domain.max, 16.0 * 1.1);
    assert!(!model.y_domain.zero_line);
}

#[rstest]
fn multi_series_matches_metrics_by_label_and_drops_unknown_series(normalizer: Normalizer) {
    let model = normalizer
        .chart(&json!({
            "chartType": "line",
            "data": [
                { "name": "Revenue", "data": [{ "x": "2023", "y": "1,200" }] },
                { "name": "Headcount", "data": [{ "x": "2023", "y": 40 }] }
            ],
            "metricConfig": { "revenue": { "label": "Revenue", "formatter": "currency" } }
        }))
        .expect("chart");

    assert_eq!(model.metric_keys, vec!["revenue".to_owned()]);
    assert_eq!(records(&model), json!([{ "date": "2023", "revenue": 1200.0 }]));
}

#[rstest]
fn multi_series_without_metric_config_keeps_every_series(normalizer: Normalizer) {
    let model = normalizer
        .chart(&json!({
            "data": [
                { "name": "A", "data": [{ "x": "Jan", "y": 1 }] },
                { "name": "B", "data": [{ "x": "Feb", "y": 2 }] }
            ]
        }))
        .expect("chart");

    assert_eq!(model.metric_keys, vec!["A".to_owned(), "B".to_owned()]);
    assert_eq!(
        records(&model),
        json!([{ "category": "Jan", "A": 1.0 }, { "category": "Feb", "B": 2.0 }])
    );
}

#[rstest]
fn paired_and_flat_shapes_normalize_identically(normalizer: Normalizer) {
    let paired = normalizer
        .chart(&json!({
            "chartType": "bar",
            "data": [{ "x": "Q1", "y": 10 }, { "x": "Q2", "y": "12" }],
            "metricConfig": { "revenue": { "label": "Revenue" } }
        }))
        .expect("paired");
    let flat = normalizer
        .chart(&json!({
            "chartType": "bar",
            "data": [{ "category": "Q1", "revenue": 10 }, { "category": "Q2", "revenue": 12 }],
            "metricConfig": { "revenue": { "label": "Revenue" } }
        }))
        .expect("flat");

    assert_eq!(paired, flat);
}

#[rstest]
fn paired_shape_without_metrics_uses_value_key(normalizer: Normalizer) {
    let model = normalizer
        .chart(&json!({ "data": [{ "x": "Q1", "y": 3 }] }))
        .expect("chart");
    assert_eq!(model.metric_keys, vec!["value".to_owned()]);
}

#[rstest]
fn paired_shape_with_several_metrics_is_ambiguous(normalizer: Normalizer) {
    let err = normalizer
        .chart(&json!({
            "data": [{ "x": "Q1", "y": 3 }],
            "metricConfig": { "a": {}, "b": {} }
        }))
        .expect_err("ambiguous");
    assert_eq!(err, ShapeError::AmbiguousPairedMetric { declared: 2 });
}

#[rstest]
fn flat_records_infer_metrics_and_drop_non_numeric_values(normalizer: Normalizer) {
    let model = normalizer
        .chart(&json!({
            "type": "area",
            "data": [
                { "date": "2024-01", "cash": "$1.5M", "note": "opening" },
                { "date": "2024-02", "cash": "n/a", "note": "gap" }
            ]
        }))
        .expect("chart");

    assert_eq!(model.chart_type, ChartType::Area);
    assert_eq!(model.metric_keys, vec!["cash".to_owned()]);
    assert_eq!(model.data[0]["cash"], json!(1_500_000.0));
    assert!(model.data[1].get("cash").is_none());
    assert_eq!(model.data[1]["note"], json!("gap"));
}

#[rstest]
fn category_key_comes_from_axis_label_when_no_key_is_given(normalizer: Normalizer) {
    let model = normalizer
        .chart(&json!({
            "config": { "xAxisLabel": "Fiscal Quarter" },
            "data": [{ "name": "Sales", "data": [{ "x": "Q1", "y": 5 }] }]
        }))
        .expect("chart");
    assert_eq!(model.category_key(), "fiscal_quarter");
    assert_eq!(model.data[0]["fiscal_quarter"], json!("Q1"));
}

#[rstest]
fn flat_records_fall_back_to_first_text_field(normalizer: Normalizer) {
    let model = normalizer
        .chart(&json!({
            "data": [{ "segment": "Retail", "share": 40 }, { "segment": "Cloud", "share": 60 }]
        }))
        .expect("chart");
    assert_eq!(model.category_key(), "segment");
    assert_eq!(model.metric_keys, vec!["share".to_owned()]);
}

#[rstest]
fn all_non_numeric_payload_has_no_valid_data(normalizer: Normalizer) {
    let raw = json!({
        "title": "Revenue",
        "data": [{ "category": "Q1", "revenue": "n/a" }, { "category": "Q2", "revenue": "-" }],
        "metricConfig": { "revenue": { "label": "Revenue" } }
    });

    assert_eq!(normalizer.chart(&raw), Err(ShapeError::NoNumericData));
    match normalizer.chart_slot(&raw) {
        Normalized::NoValidData { title, diagnosis } => {
            assert_eq!(title.as_deref(), Some("Revenue"));
            assert_eq!(diagnosis, "no valid numeric data");
        }
        Normalized::Ready(_) => panic!("expected no valid data"),
    }
}

#[rstest]
#[case::not_an_object(json!([1, 2]), ShapeError::NotAnObject)]
#[case::missing_data(json!({ "chartType": "bar" }), ShapeError::MissingData)]
#[case::empty_data(json!({ "data": [] }), ShapeError::NoNumericData)]
#[case::scalar_entries(json!({ "data": [1, 2, 3] }), ShapeError::UnrecognizedShape)]
#[case::unknown_type(json!({ "chartType": "radar", "data": [] }), ShapeError::UnknownChartType("radar".to_owned()))]
fn malformed_payloads_are_rejected(
    normalizer: Normalizer,
    #[case] raw: Value,
    #[case] expected: ShapeError,
) {
    assert_eq!(normalizer.chart(&raw), Err(expected));
}

#[rstest]
fn negative_values_extend_domain_below_zero(normalizer: Normalizer) {
    let model = normalizer
        .chart(&json!({
            "data": [{ "category": "FY23", "net": "(200)" }, { "category": "FY24", "net": 100 }]
        }))
        .expect("chart");

    assert_eq!(model.y_domain.min, -200.0 - 20.0);
    assert_eq!(model.y_domain.max, 100.0 * 1.1);
    assert!(model.y_domain.zero_line);
}

#[rstest]
fn all_negative_values_cap_domain_at_zero(normalizer: Normalizer) {
    let model = normalizer
        .chart(&json!({ "data": [{ "category": "FY23", "net": -50 }] }))
        .expect("chart");
    assert_eq!(model.y_domain.max, 0.0);
    assert_eq!(model.y_domain.min, -55.0);
}

#[rstest]
fn colors_prefer_metric_then_config_then_palette(normalizer: Normalizer) {
    let model = normalizer
        .chart(&json!({
            "config": { "colors": ["#111111", "#222222"] },
            "data": [{ "category": "Q1", "a": 1, "b": 2, "c": 3 }],
            "metricConfig": {
                "a": { "color": "#abcdef" },
                "b": {},
                "c": {}
            }
        }))
        .expect("chart");

    let colors = model
        .metric_config
        .iter()
        .map(|(_, spec)| spec.color.clone().unwrap_or_default())
        .collect::<Vec<_>>();
    assert_eq!(colors, vec!["#abcdef", "#222222", DEFAULT_PALETTE[2]]);
}

#[rstest]
fn metric_config_accepts_array_form(normalizer: Normalizer) {
    let model = normalizer
        .chart(&json!({
            "data": [{ "category": "Q1", "gross": 1, "net": 2 }],
            "metrics": [{ "key": "net", "label": "Net margin", "unit": "%" }, "gross"]
        }))
        .expect("chart");

    assert_eq!(model.metric_keys, vec!["net".to_owned(), "gross".to_owned()]);
    let net = model.metric_config.get("net").expect("net");
    assert_eq!(net.label, "Net margin");
    assert_eq!(net.unit.as_deref(), Some("%"));
}

#[rstest]
fn record_citations_are_resolved(normalizer: Normalizer) {
    let normalizer = normalizer.with_default_document(Some(
        crate::model::DocumentId::new("doc1").expect("doc"),
    ));
    let model = normalizer
        .chart(&json!({
            "data": [
                { "category": "Q1", "revenue": 10, "citation": { "text": "Q1 revenue $10M", "highlightId": "h-1" } },
                { "category": "Q2", "revenue": 12, "citation": { "note": "no text" } }
            ]
        }))
        .expect("chart");

    assert_eq!(model.data[0]["citation"]["highlightId"], json!("h-1"));
    assert_eq!(model.data[0]["citation"]["documentId"], json!("doc1"));
    assert!(model.data[1].get("citation").is_none());
    assert_eq!(model.metric_keys, vec!["revenue".to_owned()]);
}
