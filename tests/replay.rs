// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Ledgerlens-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of Ledgerlens and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

use std::fs;
use std::path::{Path, PathBuf};

use chrono::Utc;
use serde_json::Value;

use ledgerlens::aggregate::{
    aggregate, fold_results, AggregationIssue, AnalysisLedger, StateSource, VisualizationState,
};
use ledgerlens::model::SessionId;
use ledgerlens::normalize::Normalizer;
use ledgerlens::store::{InsertOutcome, MessageStore};

fn fixtures_dir() -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR"))
        .join("tests")
        .join("fixtures")
        .join("transcripts")
}

fn read_fixture(name: &str) -> Value {
    let path = fixtures_dir().join(name);
    let text = fs::read_to_string(&path).unwrap_or_else(|err| panic!("failed to read {path:?}: {err}"));
    serde_json::from_str(&text).unwrap_or_else(|err| panic!("invalid json in {path:?}: {err}"))
}

struct Replay {
    store: MessageStore,
    duplicates: usize,
    ledger: AnalysisLedger,
    issues: Vec<AggregationIssue>,
    state: VisualizationState,
}

fn replay(transcript: &Value) -> Replay {
    let normalizer = Normalizer::default();
    let session = SessionId::new("session-replay").expect("session id");
    let now = Utc::now();
    let list = |key: &str| {
        transcript
            .get(key)
            .and_then(Value::as_array)
            .cloned()
            .unwrap_or_default()
    };

    let mut store = MessageStore::new();
    let mut duplicates = 0;
    for raw in list("messages") {
        let ingested = normalizer
            .message_from_wire(&session, &raw, now)
            .expect("readable message");
        if store.insert(ingested.message) == InsertOutcome::Duplicate {
            duplicates += 1;
        }
    }
    let (ledger, issues) = fold_results(&normalizer, &list("analyses"), now);
    let state = aggregate(&store.sorted(), &ledger);
    Replay {
        store,
        duplicates,
        ledger,
        issues,
        state,
    }
}

#[test]
fn mixed_reply_shapes_reduce_to_one_block_state() {
    let replay = replay(&read_fixture("mixed_shapes.json"));

    assert_eq!(replay.store.len(), 3);
    assert_eq!(replay.duplicates, 1);

    let state = &replay.state;
    assert_eq!(state.source, StateSource::Blocks);
    assert_eq!(state.ready_charts().count(), 1);
    assert_eq!(state.ready_tables().count(), 1);
    assert_eq!(state.analysis_text.as_deref(), Some("Margins held steady."));

    let chart = state.ready_charts().next().expect("chart");
    assert_eq!(chart.data.len(), 2);
    assert_eq!(chart.metric_keys, vec!["revenue", "costs"]);
}

#[test]
fn invalid_analyses_are_reported_with_their_documents() {
    let replay = replay(&read_fixture("mixed_shapes.json"));

    assert_eq!(replay.ledger.len(), 1);
    assert_eq!(replay.issues.len(), 1);
    let issue = &replay.issues[0];
    assert_eq!(issue.index, 1);
    assert!(
        issue.system_text().contains("document doc-annual"),
        "unexpected text: {}",
        issue.system_text()
    );
}

#[test]
fn results_for_the_same_documents_and_type_replace_each_other() {
    let replay = replay(&read_fixture("analyses_only.json"));

    assert_eq!(replay.ledger.len(), 1);
    let state = &replay.state;
    assert_eq!(state.source, StateSource::Results);
    assert_eq!(state.analysis_text.as_deref(), Some("Growth second pass."));
    assert_eq!(state.insights.len(), 1);
    assert_eq!(state.metrics.len(), 1);
    assert!(state.charts.is_empty());
}

#[test]
fn replay_is_deterministic() {
    let transcript = read_fixture("analyses_only.json");
    let first = serde_json::to_value(&replay(&transcript).state).expect("serialize");
    let second = serde_json::to_value(&replay(&transcript).state).expect("serialize");
    assert_eq!(first, second);
}
