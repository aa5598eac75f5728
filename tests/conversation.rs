// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Ledgerlens-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of Ledgerlens and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use serde_json::{json, Value};

use ledgerlens::aggregate::StateSource;
use ledgerlens::backend::{
    AnalysisBackend, AnalysisRequest, BackendError, FinancialFigures, PeriodFigures,
    SimulationProvider,
};
use ledgerlens::config::ClientConfig;
use ledgerlens::model::{AnalysisId, DocumentId, HighlightId, Role, SessionId};
use ledgerlens::orchestrator::Conversation;
use ledgerlens::view::DataPoint;

/// In-memory backend replaying canned replies in order.
#[derive(Default)]
struct CannedBackend {
    replies: Mutex<VecDeque<Value>>,
    analyses: Mutex<VecDeque<Result<Value, BackendError>>>,
    citations: Vec<Value>,
}

#[async_trait]
impl AnalysisBackend for CannedBackend {
    async fn send_message(
        &self,
        _session_id: &SessionId,
        _text: &str,
        _document_ids: &[DocumentId],
    ) -> Result<Value, BackendError> {
        let next = self.replies.lock().expect("lock").pop_front();
        next.ok_or_else(|| BackendError::Transport("no canned reply".to_owned()))
    }

    async fn run_analysis(&self, _request: &AnalysisRequest) -> Result<Value, BackendError> {
        let next = self.analyses.lock().expect("lock").pop_front();
        next.unwrap_or_else(|| Err(BackendError::Unavailable("offline".to_owned())))
    }

    async fn get_enhanced_analysis(&self, _analysis_id: &AnalysisId) -> Result<Value, BackendError> {
        Err(BackendError::Unavailable("offline".to_owned()))
    }

    async fn get_chart_data(&self, _document_ids: &[DocumentId]) -> Result<Value, BackendError> {
        Err(BackendError::Unavailable("offline".to_owned()))
    }

    async fn get_document_citations(
        &self,
        _document_id: &DocumentId,
    ) -> Result<Vec<Value>, BackendError> {
        Ok(self.citations.clone())
    }

    async fn create_conversation(
        &self,
        _title: &str,
        _document_ids: &[DocumentId],
    ) -> Result<SessionId, BackendError> {
        Ok(SessionId::new("conv-1").expect("session id"))
    }

    async fn add_document_to_conversation(
        &self,
        _session_id: &SessionId,
        _document_id: &DocumentId,
    ) -> Result<(), BackendError> {
        Ok(())
    }
}

fn doc(value: &str) -> DocumentId {
    DocumentId::new(value).expect("document id")
}

fn figures() -> FinancialFigures {
    FinancialFigures {
        periods: vec![
            PeriodFigures {
                period: "2024".to_owned(),
                revenue: 80.0,
                net_income: -5.0,
                total_assets: Some(200.0),
                total_liabilities: Some(150.0),
            },
            PeriodFigures {
                period: "2025".to_owned(),
                revenue: 95.0,
                net_income: 4.0,
                total_assets: Some(210.0),
                total_liabilities: Some(140.0),
            },
        ],
    }
}

async fn conversation(backend: CannedBackend) -> Conversation {
    let simulation = SimulationProvider::new().with_document(doc("annual"), figures());
    let conversation = Conversation::new(Arc::new(backend), simulation, ClientConfig::default());
    conversation
        .initialize("FY25 review", vec![doc("annual"), doc("interim")])
        .await
        .expect("initialize");
    conversation
}

#[tokio::test]
async fn retried_reply_is_stored_once() {
    let reply = json!({
        "id": "reply-1",
        "content": "Cash position is stable.",
        "timestamp": "2026-05-01T10:00:00Z"
    });
    let backend = CannedBackend {
        replies: Mutex::new(VecDeque::from([reply.clone(), reply])),
        ..CannedBackend::default()
    };
    let conversation = conversation(backend).await;

    conversation.on_send_message("Cash?").await.expect("first send");
    conversation.on_send_message("Cash, again?").await.expect("retry");

    let snapshot = conversation.snapshot();
    let assistants = snapshot
        .messages()
        .iter()
        .filter(|m| m.role() == Role::Assistant)
        .count();
    assert_eq!(assistants, 1);
    assert_eq!(snapshot.messages().len(), 3);
    assert!(snapshot.messages().iter().all(|m| !m.is_transient()));
}

#[tokio::test]
async fn legacy_reply_feeds_the_visualization_state() {
    let reply = json!({
        "content": "Margins by year.",
        "analysis": {
            "visualizationData": {
                "charts": [{
                    "type": "line",
                    "title": "Net margin",
                    "data": [{ "date": "2024", "margin": "-6.25%" }, { "date": "2025", "margin": "4.2%" }]
                }]
            },
            "metrics": [{ "name": "Net margin", "value": "4.2%" }],
            "analysisText": "Back to profit in 2025."
        }
    });
    let backend = CannedBackend {
        replies: Mutex::new(VecDeque::from([reply])),
        ..CannedBackend::default()
    };
    let conversation = conversation(backend).await;
    let mut view = conversation.subscribe();
    let before = view.borrow_and_update().rev();

    conversation.on_send_message("Margins?").await.expect("send");

    assert!(view.has_changed().expect("sender alive"));
    let snapshot = view.borrow_and_update().clone();
    assert!(snapshot.rev() > before);

    let state = snapshot.visualization();
    assert_eq!(state.source, StateSource::Blocks);
    assert_eq!(state.analysis_text.as_deref(), Some("Back to profit in 2025."));
    let chart = state.ready_charts().next().expect("chart");
    assert!(chart.y_domain.zero_line);
    assert!(chart.y_domain.min < 0.0);
}

#[tokio::test]
async fn offline_analysis_uses_simulation_with_partial_warning() {
    let conversation = conversation(CannedBackend::default()).await;

    let result = conversation
        .run_analysis(AnalysisRequest::new(vec![doc("annual"), doc("interim")], "overview"))
        .await
        .expect("simulated analysis");

    let first = result.insights.first().expect("warning insight");
    assert!(first.is_warning());
    assert!(first.text.contains("interim"));

    let state = conversation.snapshot().visualization().clone();
    assert_eq!(state.source, StateSource::Results);
    assert!(state.ready_charts().count() >= 1);
}

#[tokio::test]
async fn enhanced_analysis_without_any_figures_fails() {
    let conversation = conversation(CannedBackend::default()).await;
    let enhanced = conversation
        .fetch_enhanced_analysis(&AnalysisId::new("a-missing").expect("id"))
        .await;
    assert!(enhanced.is_ok(), "session documents include one with figures");

    let bare = Conversation::new(
        Arc::new(CannedBackend::default()),
        SimulationProvider::new(),
        ClientConfig::default(),
    );
    bare.initialize("empty", vec![doc("interim")])
        .await
        .expect("initialize");
    assert!(bare
        .fetch_enhanced_analysis(&AnalysisId::new("a-missing").expect("id"))
        .await
        .is_err());
}

#[tokio::test(start_paused = true)]
async fn table_cell_click_focuses_its_citation_for_a_while() {
    let reply = json!({
        "content": "Balance sheet extract.",
        "toolResults": [{
            "tool": "balance_table",
            "result": {
                "columns": ["line", "amount"],
                "rows": [{
                    "line": "Total assets",
                    "amount": {
                        "value": "210M",
                        "citation": { "text": "Total assets 210M", "page": 12, "highlightId": "h-assets" }
                    }
                }]
            }
        }]
    });
    let backend = CannedBackend {
        replies: Mutex::new(VecDeque::from([reply])),
        ..CannedBackend::default()
    };
    let conversation = conversation(backend).await;
    conversation.on_send_message("Assets?").await.expect("send");

    let cell = DataPoint::Table {
        table: 0,
        row: 0,
        column: "amount".to_owned(),
    };
    assert_eq!(
        conversation.snapshot().citation_at(&cell),
        Some(HighlightId::new("h-assets").expect("id"))
    );
    assert!(conversation.on_data_point_click(&cell).await);
    let focused = |c: &Conversation| c.snapshot().highlights().iter().any(|h| h.is_focus_overlay());
    assert!(focused(&conversation));

    tokio::time::sleep(Duration::from_secs(4)).await;
    assert!(!focused(&conversation));

    let label = DataPoint::Table {
        table: 0,
        row: 0,
        column: "line".to_owned(),
    };
    assert!(!conversation.on_data_point_click(&label).await);
}

#[tokio::test]
async fn document_citations_load_on_start() {
    let backend = CannedBackend {
        citations: vec![json!({ "text": "Going concern", "page": 30, "highlightId": "h-gc" })],
        ..CannedBackend::default()
    };
    let conversation = conversation(backend).await;
    let ids = conversation
        .snapshot()
        .highlights()
        .iter()
        .map(|h| h.id().as_str().to_owned())
        .collect::<Vec<_>>();
    assert_eq!(ids, vec!["h-gc"]);
}
