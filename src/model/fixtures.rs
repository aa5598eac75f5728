// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Ledgerlens-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of Ledgerlens and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

use chrono::{DateTime, Duration, TimeZone, Utc};
use serde_json::{json, Value};

use super::analysis::Metric;
use super::block::{AnalysisBlock, BlockContent};
use super::chart::Normalized;
use super::ids::{BlockId, DocumentId, SessionId};
use super::message::{Message, Role};
use crate::normalize::Normalizer;

pub(crate) fn doc(value: &str) -> DocumentId {
    DocumentId::new(value).expect("document id")
}

pub(crate) fn session() -> SessionId {
    SessionId::new("session-1").expect("session id")
}

/// 2026-01-01T00:00:00Z plus `secs`.
pub(crate) fn at(secs: i64) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 1, 1, 0, 0, 0)
        .single()
        .expect("timestamp")
        + Duration::seconds(secs)
}

pub(crate) fn revenue_chart_payload(q1: f64, q2: f64) -> Value {
    json!({
        "chartType": "bar",
        "config": { "title": "Revenue" },
        "data": [{ "category": "Q1", "revenue": q1 }, { "category": "Q2", "revenue": q2 }],
        "metricConfig": { "revenue": { "label": "Revenue", "formatter": "currency" } }
    })
}

pub(crate) fn chart_block(id: &str, secs: i64, q1: f64, q2: f64) -> AnalysisBlock {
    let slot = Normalizer::default().chart_slot(&revenue_chart_payload(q1, q2));
    assert!(matches!(slot, Normalized::Ready(_)), "fixture chart must normalize");
    AnalysisBlock::new(block_id(id), BlockContent::Chart(slot), at(secs))
}

pub(crate) fn metric_block(id: &str, secs: i64, name: &str, value: f64) -> AnalysisBlock {
    AnalysisBlock::new(
        block_id(id),
        BlockContent::Metric(vec![Metric::numeric(name, value)]),
        at(secs),
    )
}

pub(crate) fn text_block(id: &str, secs: i64, text: &str) -> AnalysisBlock {
    AnalysisBlock::new(
        block_id(id),
        BlockContent::TextSummary(text.to_owned()),
        at(secs),
    )
}

pub(crate) fn assistant(content: &str, secs: i64, blocks: Vec<AnalysisBlock>) -> Message {
    Message::new(session(), Role::Assistant, content, at(secs)).with_blocks(blocks)
}

pub(crate) fn user(content: &str, secs: i64) -> Message {
    Message::new(session(), Role::User, content, at(secs))
}

pub(crate) fn raw_result(id: &str, docs: &[&str], analysis_type: &str, revenue: f64) -> Value {
    json!({
        "id": id,
        "documentIds": docs,
        "analysisType": analysis_type,
        "metrics": [{ "name": "Revenue", "value": revenue }],
        "visualizationData": { "charts": [revenue_chart_payload(revenue, revenue)] },
        "analysisText": format!("{analysis_type} via {id}")
    })
}

fn block_id(value: &str) -> BlockId {
    BlockId::new(value).expect("block id")
}
