// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Ledgerlens-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of Ledgerlens and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

//! Local stand-in for the analysis service.
//!
//! Works from whatever financial figures are known per document. Output uses the same wire
//! shapes as the service, so it goes through the normal normalizer path.

use std::collections::BTreeMap;

use serde::Deserialize;
use serde_json::{json, Value};
use tracing::warn;

use super::{AnalysisRequest, BackendError};
use crate::model::DocumentId;

#[derive(Debug, Clone, PartialEq, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PeriodFigures {
    pub period: String,
    pub revenue: f64,
    pub net_income: f64,
    #[serde(default)]
    pub total_assets: Option<f64>,
    #[serde(default)]
    pub total_liabilities: Option<f64>,
}

/// Extracted figures for one document, oldest period first.
#[derive(Debug, Clone, PartialEq, Default, Deserialize)]
pub struct FinancialFigures {
    pub periods: Vec<PeriodFigures>,
}

impl FinancialFigures {
    pub fn has_data(&self) -> bool {
        !self.periods.is_empty()
    }
}

#[derive(Debug, Clone, Default)]
pub struct SimulationProvider {
    figures: BTreeMap<DocumentId, FinancialFigures>,
}

/// Documents split by whether any figures are known for them.
struct Coverage<'a> {
    with_data: Vec<(&'a DocumentId, &'a FinancialFigures)>,
    without_data: Vec<&'a DocumentId>,
}

impl SimulationProvider {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_document(mut self, document_id: DocumentId, figures: FinancialFigures) -> Self {
        self.figures.insert(document_id, figures);
        self
    }

    pub fn insert(&mut self, document_id: DocumentId, figures: FinancialFigures) {
        self.figures.insert(document_id, figures);
    }

    pub fn figures(&self, document_id: &DocumentId) -> Option<&FinancialFigures> {
        self.figures.get(document_id)
    }

    fn coverage<'a>(&'a self, document_ids: &'a [DocumentId]) -> Coverage<'a> {
        let mut coverage = Coverage {
            with_data: Vec::new(),
            without_data: Vec::new(),
        };
        for id in document_ids {
            match self.figures.get(id).filter(|f| f.has_data()) {
                Some(figures) => coverage.with_data.push((id, figures)),
                None => coverage.without_data.push(id),
            }
        }
        coverage
    }

    fn covered<'a>(&'a self, document_ids: &'a [DocumentId]) -> Result<Coverage<'a>, BackendError> {
        let coverage = self.coverage(document_ids);
        if coverage.with_data.is_empty() {
            return Err(BackendError::Unavailable(format!(
                "no financial data for {}",
                join_ids(document_ids.iter())
            )));
        }
        if !coverage.without_data.is_empty() {
            warn!(
                skipped = %join_ids(coverage.without_data.iter().copied()),
                "simulating analysis on a subset of documents"
            );
        }
        Ok(coverage)
    }

    /// An analysis result for `request`, in the legacy flat wire shape.
    pub fn simulate_analysis(&self, request: &AnalysisRequest) -> Result<Value, BackendError> {
        let coverage = self.covered(&request.document_ids)?;
        let periods = combined_periods(&coverage);
        let latest = periods.last().cloned().unwrap_or_default();

        let mut insights = Vec::new();
        if let Some(warning) = partial_warning(&coverage) {
            insights.push(warning);
        }
        if let Some(growth) = growth(&periods, |p| p.revenue) {
            insights.push(json!(format!(
                "Revenue changed {growth:+.1}% between {} and {}.",
                periods[0].period, latest.period
            )));
        }

        let mut ratios = Vec::new();
        if latest.revenue != 0.0 {
            ratios.push(json!({
                "name": "Net margin",
                "value": latest.net_income / latest.revenue * 100.0,
                "unit": "%",
                "period": latest.period,
            }));
        }
        if let (Some(assets), Some(liabilities)) = (latest.total_assets, latest.total_liabilities) {
            if assets != 0.0 {
                ratios.push(json!({
                    "name": "Debt to assets",
                    "value": liabilities / assets,
                    "period": latest.period,
                }));
            }
        }

        let ids = request
            .document_ids
            .iter()
            .map(|d| d.as_str())
            .collect::<Vec<_>>();
        Ok(json!({
            "id": format!("sim-{}-{}", request.analysis_type, ids.join("+")),
            "documentIds": ids,
            "analysisType": request.analysis_type,
            "metrics": [
                { "name": "Revenue", "value": latest.revenue, "period": latest.period },
                { "name": "Net income", "value": latest.net_income, "period": latest.period }
            ],
            "ratios": ratios,
            "insights": insights,
            "visualizationData": {
                "charts": [chart_payload(&periods)],
                "tables": [table_payload(&periods)]
            },
            "analysisText": format!(
                "Simulated {} analysis over {} period(s) from {}.",
                request.analysis_type,
                periods.len(),
                join_ids(coverage.with_data.iter().map(|(id, _)| *id))
            ),
        }))
    }

    /// `{trends[], insights[]}` for the given documents.
    pub fn simulate_enhanced(&self, document_ids: &[DocumentId]) -> Result<Value, BackendError> {
        let coverage = self.covered(document_ids)?;
        let periods = combined_periods(&coverage);
        let period = match (periods.first(), periods.last()) {
            (Some(first), Some(last)) => format!("{}..{}", first.period, last.period),
            _ => String::new(),
        };

        let trends = [
            ("Revenue", growth(&periods, |p| p.revenue)),
            ("Net income", growth(&periods, |p| p.net_income)),
        ]
        .into_iter()
        .filter_map(|(metric, change)| {
            change.map(|change| json!({ "metric": metric, "change": change, "period": period }))
        })
        .collect::<Vec<_>>();

        let mut insights = Vec::new();
        if let Some(warning) = partial_warning(&coverage) {
            insights.push(warning);
        }
        if periods.iter().any(|p| p.net_income < 0.0) {
            insights.push(json!({
                "text": "At least one period closed with a net loss.",
                "importance": "medium"
            }));
        }

        Ok(json!({ "trends": trends, "insights": insights }))
    }

    /// Revenue and net income per period as a line chart payload.
    pub fn simulate_chart_data(&self, document_ids: &[DocumentId]) -> Result<Value, BackendError> {
        let coverage = self.covered(document_ids)?;
        Ok(chart_payload(&combined_periods(&coverage)))
    }
}

/// Per-period sums across documents, in first-seen period order.
fn combined_periods(coverage: &Coverage<'_>) -> Vec<PeriodFigures> {
    let mut combined: Vec<PeriodFigures> = Vec::new();
    for (_, figures) in &coverage.with_data {
        for period in &figures.periods {
            match combined.iter_mut().find(|p| p.period == period.period) {
                Some(total) => {
                    total.revenue += period.revenue;
                    total.net_income += period.net_income;
                    total.total_assets = sum_optional(total.total_assets, period.total_assets);
                    total.total_liabilities =
                        sum_optional(total.total_liabilities, period.total_liabilities);
                }
                None => combined.push(period.clone()),
            }
        }
    }
    combined
}

fn sum_optional(a: Option<f64>, b: Option<f64>) -> Option<f64> {
    match (a, b) {
        (Some(a), Some(b)) => Some(a + b),
        (a, b) => a.or(b),
    }
}

/// Percent change from the first to the last period.
fn growth(periods: &[PeriodFigures], metric: impl Fn(&PeriodFigures) -> f64) -> Option<f64> {
    let (first, last) = (periods.first()?, periods.last()?);
    if periods.len() < 2 || metric(first) == 0.0 {
        return None;
    }
    Some((metric(last) - metric(first)) / metric(first).abs() * 100.0)
}

fn partial_warning(coverage: &Coverage<'_>) -> Option<Value> {
    if coverage.without_data.is_empty() {
        return None;
    }
    Some(json!({
        "text": format!(
            "No financial data could be extracted from {}; results cover {} only.",
            join_ids(coverage.without_data.iter().copied()),
            join_ids(coverage.with_data.iter().map(|(id, _)| *id))
        ),
        "importance": "high",
        "category": "warning"
    }))
}

fn chart_payload(periods: &[PeriodFigures]) -> Value {
    let data = periods
        .iter()
        .map(|p| json!({ "period": p.period, "revenue": p.revenue, "netIncome": p.net_income }))
        .collect::<Vec<_>>();
    json!({
        "chartType": "line",
        "config": {
            "title": "Revenue and net income",
            "xAxisKey": "period",
            "xAxisLabel": "Period"
        },
        "data": data,
        "metricConfig": {
            "revenue": { "label": "Revenue", "formatter": "currency" },
            "netIncome": { "label": "Net income", "formatter": "currency" }
        }
    })
}

fn table_payload(periods: &[PeriodFigures]) -> Value {
    let rows = periods
        .iter()
        .map(|p| {
            json!({
                "period": p.period,
                "revenue": p.revenue,
                "netIncome": p.net_income,
                "totalAssets": p.total_assets,
                "totalLiabilities": p.total_liabilities
            })
        })
        .collect::<Vec<_>>();
    json!({
        "title": "Financial summary",
        "columns": [
            { "key": "period", "header": "Period" },
            { "key": "revenue", "header": "Revenue", "format": "currency", "align": "right" },
            { "key": "netIncome", "header": "Net income", "format": "currency", "align": "right" },
            { "key": "totalAssets", "header": "Total assets", "format": "currency", "align": "right" },
            { "key": "totalLiabilities", "header": "Total liabilities", "format": "currency", "align": "right" }
        ],
        "rows": rows
    })
}

fn join_ids<'a>(ids: impl Iterator<Item = &'a DocumentId>) -> String {
    ids.map(|id| id.as_str()).collect::<Vec<_>>().join(", ")
}
