// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Ledgerlens-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of Ledgerlens and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

//! Analysis aggregation.
//!
//! The visualization state is always recomputed from scratch: every assistant message in the
//! session plus every analysis result in the ledger. Nothing is patched incrementally, so
//! replaying the same inputs yields the same state.

pub mod ledger;
pub mod state;

use std::collections::HashSet;

use chrono::{DateTime, Utc};
use serde_json::Value;
use tracing::warn;

use crate::model::{BlockContent, BlockId, Message, Role};
use crate::normalize::{Normalizer, ValidationError};

pub use ledger::{AnalysisLedger, LedgerUpdate};
pub use state::{StateSource, VisualizationState};

/// An analysis result excluded from aggregation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AggregationIssue {
    /// Position of the rejected entry in its input batch.
    pub index: usize,
    pub error: ValidationError,
}

impl AggregationIssue {
    /// Text for the system message that surfaces the issue in the chat.
    pub fn system_text(&self) -> String {
        format!("Analysis could not be used: {}.", self.error)
    }
}

/// Builds the cumulative state.
///
/// Blocks from assistant messages are the richer source and win outright when any message
/// carries them; ledger results are used only otherwise. Blocks are de-duplicated by id.
/// The most recent `text_summary` becomes `analysis_text`.
pub fn aggregate(messages: &[Message], ledger: &AnalysisLedger) -> VisualizationState {
    let from_blocks = from_blocks(messages);
    if from_blocks.source == StateSource::Blocks {
        return from_blocks;
    }
    from_results(ledger)
}

fn from_blocks(messages: &[Message]) -> VisualizationState {
    let mut state = VisualizationState::default();
    let mut seen: HashSet<&BlockId> = HashSet::new();
    let mut latest_summary: Option<(DateTime<Utc>, &str)> = None;

    let blocks = messages
        .iter()
        .filter(|m| m.role() == Role::Assistant)
        .flat_map(|m| m.analysis_blocks());

    for block in blocks {
        if !seen.insert(block.id()) {
            continue;
        }
        state.source = StateSource::Blocks;
        match block.content() {
            BlockContent::Chart(chart) => state.charts.push(chart.clone()),
            BlockContent::Table(table) => state.tables.push(table.clone()),
            BlockContent::Metric(metrics) => state.metrics.extend(metrics.iter().cloned()),
            BlockContent::TextSummary(text) => {
                let newer = latest_summary.map_or(true, |(at, _)| block.timestamp() >= at);
                if newer {
                    latest_summary = Some((block.timestamp(), text.as_str()));
                }
            }
        }
    }

    state.analysis_text = latest_summary.map(|(_, text)| text.to_owned());
    state
}

fn from_results(ledger: &AnalysisLedger) -> VisualizationState {
    let mut state = VisualizationState::default();
    for result in ledger.iter() {
        state.source = StateSource::Results;
        state
            .charts
            .extend(result.visualization_data.charts.iter().cloned());
        state
            .tables
            .extend(result.visualization_data.tables.iter().cloned());
        state.metrics.extend(result.metrics.iter().cloned());
        state.metrics.extend(result.ratios.iter().cloned());
        state.insights.extend(result.insights.iter().cloned());
        if let Some(text) = &result.analysis_text {
            state.analysis_text = Some(text.clone());
        }
    }
    state
}

/// Validates a batch of raw results into a ledger. Invalid entries are skipped and reported;
/// they never stop the rest of the batch.
pub fn fold_results(
    normalizer: &Normalizer,
    raw: &[Value],
    now: DateTime<Utc>,
) -> (AnalysisLedger, Vec<AggregationIssue>) {
    let mut ledger = AnalysisLedger::new();
    let mut issues = Vec::new();
    for (index, item) in raw.iter().enumerate() {
        if let Err(error) = ledger.apply_raw(normalizer, item, now) {
            warn!(index, error = %error, "excluding invalid analysis result");
            issues.push(AggregationIssue { index, error });
        }
    }
    (ledger, issues)
}
