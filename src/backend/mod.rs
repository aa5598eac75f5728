// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Ledgerlens-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of Ledgerlens and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

//! Collaborator interface to the analysis service.
//!
//! Implementations return raw JSON; every payload goes through [`crate::normalize`] before it
//! reaches any state.

pub mod simulation;

use async_trait::async_trait;
use serde::Serialize;
use serde_json::{Map, Value};
use thiserror::Error;

use crate::model::{AnalysisId, DocumentId, Insight, SessionId};
use crate::normalize::numeric::coerce_number;
use crate::normalize::Normalizer;

pub use simulation::{FinancialFigures, PeriodFigures, SimulationProvider};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BackendError {
    #[error("transport failure: {0}")]
    Transport(String),
    #[error("analysis service returned {status}: {message}")]
    Status { status: u16, message: String },
    #[error("could not decode response: {0}")]
    Decode(String),
    #[error("analysis service unavailable: {0}")]
    Unavailable(String),
}

impl BackendError {
    /// Failures a local fallback may paper over. Client errors (4xx) and undecodable
    /// responses are not among them.
    pub fn is_transport(&self) -> bool {
        match self {
            Self::Transport(_) | Self::Unavailable(_) => true,
            Self::Status { status, .. } => *status >= 500,
            Self::Decode(_) => false,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisRequest {
    pub document_ids: Vec<DocumentId>,
    pub analysis_type: String,
    pub params: Value,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub knowledge_base: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_query: Option<String>,
}

impl AnalysisRequest {
    pub fn new(document_ids: Vec<DocumentId>, analysis_type: impl Into<String>) -> Self {
        Self {
            document_ids,
            analysis_type: analysis_type.into(),
            params: Value::Object(Map::new()),
            knowledge_base: None,
            user_query: None,
        }
    }

    pub fn with_params(mut self, params: Value) -> Self {
        self.params = params;
        self
    }

    pub fn with_user_query(mut self, query: impl Into<String>) -> Self {
        self.user_query = Some(query.into());
        self
    }

    pub fn with_knowledge_base(mut self, knowledge_base: impl Into<String>) -> Self {
        self.knowledge_base = Some(knowledge_base.into());
        self
    }
}

#[async_trait]
pub trait AnalysisBackend: Send + Sync {
    /// The assistant's reply, in any supported reply shape.
    async fn send_message(
        &self,
        session_id: &SessionId,
        text: &str,
        document_ids: &[DocumentId],
    ) -> Result<Value, BackendError>;

    async fn run_analysis(&self, request: &AnalysisRequest) -> Result<Value, BackendError>;

    /// `{trends[], insights[]}` for a stored analysis.
    async fn get_enhanced_analysis(&self, analysis_id: &AnalysisId) -> Result<Value, BackendError>;

    /// A chart payload of headline figures across `document_ids`.
    async fn get_chart_data(&self, document_ids: &[DocumentId]) -> Result<Value, BackendError>;

    async fn get_document_citations(
        &self,
        document_id: &DocumentId,
    ) -> Result<Vec<Value>, BackendError>;

    async fn create_conversation(
        &self,
        title: &str,
        document_ids: &[DocumentId],
    ) -> Result<SessionId, BackendError>;

    async fn add_document_to_conversation(
        &self,
        session_id: &SessionId,
        document_id: &DocumentId,
    ) -> Result<(), BackendError>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TrendDirection {
    Up,
    Down,
    Flat,
}

impl TrendDirection {
    fn parse_lenient(raw: &str) -> Self {
        match raw.trim().to_ascii_lowercase().as_str() {
            "up" | "increasing" | "positive" | "growth" => Self::Up,
            "down" | "decreasing" | "negative" | "decline" => Self::Down,
            _ => Self::Flat,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Trend {
    pub metric: String,
    pub direction: TrendDirection,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub change: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub period: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct EnhancedAnalysis {
    pub trends: Vec<Trend>,
    pub insights: Vec<Insight>,
}

impl EnhancedAnalysis {
    /// Decodes `{trends[], insights[]}`; malformed entries are skipped.
    pub fn from_wire(normalizer: &Normalizer, raw: &Value) -> Result<Self, BackendError> {
        let obj = raw
            .as_object()
            .ok_or_else(|| BackendError::Decode("enhanced analysis is not an object".to_owned()))?;
        let list = |key: &str| obj.get(key).and_then(Value::as_array).map(Vec::as_slice).unwrap_or_default();

        let trends = list("trends")
            .iter()
            .filter_map(Value::as_object)
            .filter_map(|trend| {
                let metric = trend.get("metric").or_else(|| trend.get("name"))?.as_str()?;
                let change = trend.get("change").and_then(coerce_number);
                let direction = match trend.get("direction").and_then(Value::as_str) {
                    Some(direction) => TrendDirection::parse_lenient(direction),
                    None => match change {
                        Some(c) if c > 0.0 => TrendDirection::Up,
                        Some(c) if c < 0.0 => TrendDirection::Down,
                        _ => TrendDirection::Flat,
                    },
                };
                Some(Trend {
                    metric: metric.to_owned(),
                    direction,
                    change,
                    period: trend
                        .get("period")
                        .and_then(Value::as_str)
                        .map(str::to_owned),
                })
            })
            .collect();
        let insights = list("insights")
            .iter()
            .filter_map(|insight| normalizer.insight(insight))
            .collect();

        Ok(Self { trends, insights })
    }
}
