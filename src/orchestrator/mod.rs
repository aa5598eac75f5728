// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Ledgerlens-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of Ledgerlens and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

//! Conversation orchestration.
//!
//! Wires user input through backend calls into the message store, the analysis ledger and the
//! highlight synchronizer, and publishes a fresh [`ViewSnapshot`] after every change.
//!
//! Every asynchronous operation runs under a child of the conversation's root
//! [`CancellationToken`] and checks it before applying its result. [`Conversation::shutdown`]
//! cancels the root, which stops in-flight calls and pending focus timers alike.

use std::future::Future;
use std::sync::Arc;

use chrono::{Duration as ChronoDuration, Utc};
use futures::future::try_join_all;
use serde_json::Value;
use thiserror::Error;
use tokio::sync::{watch, Mutex};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::aggregate::{aggregate, AggregationIssue, AnalysisLedger};
use crate::backend::{
    AnalysisBackend, AnalysisRequest, BackendError, EnhancedAnalysis, SimulationProvider,
};
use crate::config::ClientConfig;
use crate::highlight::{HighlightError, HighlightSynchronizer};
use crate::model::{
    AnalysisBlock, AnalysisId, AnalysisResult, BlockContent, ChartModel, Citation, DocumentId,
    HighlightId, Message, MessageId, Normalized, Position, Role, SessionContext, TableModel,
};
use crate::normalize::payload::MessageError;
use crate::normalize::{Normalizer, ValidationError};
use crate::store::{MessageStore, StoreError};
use crate::view::{DataPoint, ViewSnapshot};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum OrchestratorError {
    #[error("no conversation has been started")]
    NoSession,
    #[error("message is empty")]
    EmptyMessage,
    #[error("selection has no text to highlight")]
    EmptySelection,
    #[error("operation cancelled")]
    Cancelled,
    #[error(transparent)]
    Backend(#[from] BackendError),
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error(transparent)]
    Message(#[from] MessageError),
    #[error(transparent)]
    Store(#[from] StoreError),
    #[error(transparent)]
    Highlight(#[from] HighlightError),
}

#[derive(Debug, Default)]
struct ConversationState {
    session: Option<SessionContext>,
    store: MessageStore,
    ledger: AnalysisLedger,
    highlights: HighlightSynchronizer,
    rev: u64,
}

/// Handle to one conversation. Cheap to clone; clones share state.
#[derive(Clone)]
pub struct Conversation {
    backend: Arc<dyn AnalysisBackend>,
    simulation: Arc<SimulationProvider>,
    config: Arc<ClientConfig>,
    normalizer: Normalizer,
    state: Arc<Mutex<ConversationState>>,
    view: Arc<watch::Sender<Arc<ViewSnapshot>>>,
    cancel: CancellationToken,
}

impl Conversation {
    pub fn new(
        backend: Arc<dyn AnalysisBackend>,
        simulation: SimulationProvider,
        config: ClientConfig,
    ) -> Self {
        let (view, _rx) = watch::channel(Arc::new(ViewSnapshot::default()));
        let state = ConversationState {
            highlights: HighlightSynchronizer::new(config.focus_margin),
            ..ConversationState::default()
        };
        Self {
            backend,
            simulation: Arc::new(simulation),
            normalizer: Normalizer::from_config(&config),
            config: Arc::new(config),
            state: Arc::new(Mutex::new(state)),
            view: Arc::new(view),
            cancel: CancellationToken::new(),
        }
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    pub fn subscribe(&self) -> watch::Receiver<Arc<ViewSnapshot>> {
        self.view.subscribe()
    }

    pub fn snapshot(&self) -> Arc<ViewSnapshot> {
        self.view.borrow().clone()
    }

    pub async fn session(&self) -> Option<SessionContext> {
        self.state.lock().await.session.clone()
    }

    /// Cancels every in-flight operation and pending focus timer. Results that arrive
    /// afterwards are dropped.
    pub fn shutdown(&self) {
        info!("shutting down conversation");
        self.cancel.cancel();
    }

    pub fn is_shut_down(&self) -> bool {
        self.cancel.is_cancelled()
    }

    /// Creates the backend conversation and loads citations for its documents. A citation
    /// fetch failure is logged and leaves the session usable.
    pub async fn initialize(
        &self,
        title: &str,
        document_ids: Vec<DocumentId>,
    ) -> Result<SessionContext, OrchestratorError> {
        let token = self.cancel.child_token();
        let session_id = guarded(
            &token,
            self.backend.create_conversation(title, &document_ids),
        )
        .await?;
        let context = SessionContext::new(session_id, title, document_ids);

        {
            let mut state = self.lock_live(&token).await?;
            state.session = Some(context.clone());
            self.publish(&mut state);
        }
        info!(session = %context.session_id(), documents = context.document_ids().len(), "conversation started");

        if !context.document_ids().is_empty() {
            if let Err(err) = self.load_citations(context.document_ids()).await {
                warn!(error = %err, "initial citation load failed");
            }
        }
        Ok(context)
    }

    pub async fn add_document(
        &self,
        document_id: DocumentId,
    ) -> Result<SessionContext, OrchestratorError> {
        let token = self.cancel.child_token();
        let session_id = self.require_session().await?.session_id().clone();
        guarded(
            &token,
            self.backend
                .add_document_to_conversation(&session_id, &document_id),
        )
        .await?;

        let context = {
            let mut state = self.lock_live(&token).await?;
            let context = state
                .session
                .as_ref()
                .ok_or(OrchestratorError::NoSession)?
                .with_document(document_id.clone());
            state.session = Some(context.clone());
            self.publish(&mut state);
            context
        };

        if let Err(err) = self.load_citations(&[document_id]).await {
            warn!(error = %err, "citation load for new document failed");
        }
        Ok(context)
    }

    /// Makes `document_id` the target for citations that do not name a document.
    pub async fn set_active_document(
        &self,
        document_id: DocumentId,
    ) -> Result<SessionContext, OrchestratorError> {
        let mut state = self.state.lock().await;
        let context = state
            .session
            .as_ref()
            .ok_or(OrchestratorError::NoSession)?
            .with_active_document(document_id);
        state.session = Some(context.clone());
        self.publish(&mut state);
        Ok(context)
    }

    /// Stores the user turn plus a "thinking" placeholder, then swaps the placeholder for the
    /// assistant reply. A failed call replaces the placeholder with a system message.
    pub async fn on_send_message(&self, text: &str) -> Result<MessageId, OrchestratorError> {
        let text = text.trim();
        if text.is_empty() {
            return Err(OrchestratorError::EmptyMessage);
        }
        let context = self.require_session().await?;
        let token = self.cancel.child_token();
        let now = Utc::now();

        let user = Message::new(context.session_id().clone(), Role::User, text, now)
            .with_documents(context.document_ids().to_vec());
        // Anything answering this turn sorts after the user message.
        let reply_floor = now + ChronoDuration::milliseconds(1);
        let placeholder = Message::placeholder(
            context.session_id().clone(),
            self.config.thinking_text.clone(),
            reply_floor,
        );
        let placeholder_id = placeholder.id().clone();
        {
            let mut state = self.lock_live(&token).await?;
            state.store.insert(user);
            state.store.insert(placeholder);
            self.publish(&mut state);
        }

        let reply = guarded(
            &token,
            self.backend
                .send_message(context.session_id(), text, context.document_ids()),
        )
        .await;

        let mut state = self.state.lock().await;
        if token.is_cancelled() {
            if let Err(err) = state.store.remove_transient(&placeholder_id) {
                warn!(error = %err, "placeholder of cancelled send was already gone");
            }
            self.publish(&mut state);
            return Err(OrchestratorError::Cancelled);
        }

        let raw = match reply {
            Ok(raw) => raw,
            Err(err) => {
                warn!(error = %err, "send message failed");
                let notice = Message::system(
                    context.session_id().clone(),
                    format!("The assistant could not respond: {err}"),
                    Utc::now().max(reply_floor),
                );
                state.store.replace_transient(&placeholder_id, notice)?;
                self.publish(&mut state);
                return Err(err);
            }
        };

        let normalizer = self.scoped_normalizer(&context);
        let received = Utc::now().max(reply_floor);
        let ingested = match normalizer.message_from_wire(context.session_id(), &raw, received) {
            Ok(ingested) => ingested,
            Err(err) => {
                let notice = Message::system(
                    context.session_id().clone(),
                    format!("The assistant reply could not be read: {err}"),
                    received,
                );
                state.store.replace_transient(&placeholder_id, notice)?;
                self.publish(&mut state);
                return Err(err.into());
            }
        };
        if !ingested.rejected.is_empty() {
            warn!(rejected = ingested.rejected.len(), "reply carried unusable analysis blocks");
        }

        let message = ingested.message;
        let id = message.id().clone();
        for citation in message_citations(&message) {
            state
                .highlights
                .upsert_ai(self.normalizer.registry().highlight_for(&citation));
        }
        state.store.replace_transient(&placeholder_id, message)?;
        self.publish(&mut state);
        Ok(id)
    }

    /// Runs an analysis, falling back to the simulation provider on transport failure when
    /// enabled. Invalid results are reported as a system message and left out of the ledger.
    pub async fn run_analysis(
        &self,
        request: AnalysisRequest,
    ) -> Result<AnalysisResult, OrchestratorError> {
        let context = self.require_session().await?;
        let token = self.cancel.child_token();

        let raw = match guarded(&token, self.backend.run_analysis(&request)).await {
            Ok(raw) => raw,
            Err(OrchestratorError::Backend(err))
                if err.is_transport() && self.config.simulation_fallback =>
            {
                warn!(error = %err, analysis_type = %request.analysis_type, "falling back to simulated analysis");
                match self.simulation.simulate_analysis(&request) {
                    Ok(raw) => raw,
                    Err(sim_err) => {
                        self.post_system(
                            &token,
                            &context,
                            format!("Analysis failed: {err}; {sim_err}"),
                        )
                        .await?;
                        return Err(sim_err.into());
                    }
                }
            }
            Err(OrchestratorError::Backend(err)) => {
                self.post_system(&token, &context, format!("Analysis failed: {err}"))
                    .await?;
                return Err(err.into());
            }
            Err(err) => return Err(err),
        };

        let result = match self.scoped_normalizer(&context).analysis_result(&raw, Utc::now()) {
            Ok(result) => result,
            Err(err) => {
                let issue = AggregationIssue { index: 0, error: err.clone() };
                warn!(error = %err, "excluding invalid analysis result");
                self.post_system(&token, &context, issue.system_text()).await?;
                return Err(err.into());
            }
        };

        let mut state = self.lock_live(&token).await?;
        for citation in result_citations(&result) {
            state
                .highlights
                .upsert_ai(self.normalizer.registry().highlight_for(&citation));
        }
        let update = state.ledger.apply(result.clone());
        debug!(key = %result.key(), ?update, "analysis applied");
        self.publish(&mut state);
        Ok(result)
    }

    pub async fn fetch_enhanced_analysis(
        &self,
        analysis_id: &AnalysisId,
    ) -> Result<EnhancedAnalysis, OrchestratorError> {
        let token = self.cancel.child_token();
        let raw = match guarded(&token, self.backend.get_enhanced_analysis(analysis_id)).await {
            Ok(raw) => raw,
            Err(OrchestratorError::Backend(err))
                if err.is_transport() && self.config.simulation_fallback =>
            {
                warn!(error = %err, analysis = %analysis_id, "falling back to simulated enhanced analysis");
                let documents = {
                    let state = self.state.lock().await;
                    let documents = state
                        .ledger
                        .iter()
                        .find(|result| &result.id == analysis_id)
                        .map(|result| result.document_ids.clone())
                        .or_else(|| state.session.as_ref().map(|s| s.document_ids().to_vec()))
                        .unwrap_or_default();
                    documents
                };
                self.simulation.simulate_enhanced(&documents)?
            }
            Err(err) => return Err(err),
        };
        if token.is_cancelled() {
            return Err(OrchestratorError::Cancelled);
        }
        Ok(EnhancedAnalysis::from_wire(&self.normalizer, &raw)?)
    }

    /// Headline chart for `document_ids`, simulated when the service is unreachable.
    pub async fn fetch_chart_data(
        &self,
        document_ids: &[DocumentId],
    ) -> Result<Normalized<ChartModel>, OrchestratorError> {
        let context = self.require_session().await?;
        let token = self.cancel.child_token();
        let raw = match guarded(&token, self.backend.get_chart_data(document_ids)).await {
            Ok(raw) => raw,
            Err(OrchestratorError::Backend(err))
                if err.is_transport() && self.config.simulation_fallback =>
            {
                warn!(error = %err, "falling back to simulated chart data");
                self.simulation.simulate_chart_data(document_ids)?
            }
            Err(err) => return Err(err),
        };
        if token.is_cancelled() {
            return Err(OrchestratorError::Cancelled);
        }
        Ok(self.scoped_normalizer(&context).chart_slot(&raw))
    }

    /// Fetches citations for every document concurrently; any failure fails the whole load
    /// and nothing is applied.
    pub async fn load_citations(
        &self,
        document_ids: &[DocumentId],
    ) -> Result<usize, OrchestratorError> {
        let token = self.cancel.child_token();
        let fetches = document_ids
            .iter()
            .map(|id| self.backend.get_document_citations(id));
        let batches = guarded(&token, try_join_all(fetches)).await?;

        let citations = document_ids
            .iter()
            .zip(batches.iter())
            .flat_map(|(id, raw)| self.normalizer.registry().resolve_all(raw, Some(id)))
            .collect::<Vec<_>>();

        let mut state = self.lock_live(&token).await?;
        let changed = citations
            .iter()
            .filter(|citation| {
                state
                    .highlights
                    .upsert_ai(self.normalizer.registry().highlight_for(citation))
            })
            .count();
        if changed > 0 {
            self.publish(&mut state);
        }
        debug!(documents = document_ids.len(), citations = citations.len(), "citations loaded");
        Ok(citations.len())
    }

    /// Viewer callback for a new user selection.
    pub async fn on_citation_create(&self, raw: &Value) -> Result<HighlightId, OrchestratorError> {
        let mut state = self.state.lock().await;
        let active = state.session.as_ref().and_then(|s| s.active_document().cloned());
        let highlight = self
            .normalizer
            .registry()
            .user_highlight(raw, active.as_ref())
            .ok_or(OrchestratorError::EmptySelection)?;
        let id = highlight.id().clone();
        state.highlights.add_user(highlight)?;
        self.publish(&mut state);
        Ok(id)
    }

    pub async fn update_user_highlight(
        &self,
        id: &HighlightId,
        position: Position,
    ) -> Result<(), OrchestratorError> {
        let mut state = self.state.lock().await;
        state.highlights.update_user(id, position)?;
        self.publish(&mut state);
        Ok(())
    }

    pub async fn remove_user_highlight(&self, id: &HighlightId) -> Result<(), OrchestratorError> {
        let mut state = self.state.lock().await;
        state.highlights.remove_user(id)?;
        self.publish(&mut state);
        Ok(())
    }

    /// Focuses `id` and schedules the release after the configured duration. Unknown ids, and
    /// any click after shutdown, return false and change nothing.
    pub async fn on_citation_click(&self, id: &HighlightId) -> bool {
        let token = self.cancel.child_token();
        let ticket = {
            let Ok(mut state) = self.lock_live(&token).await else {
                return false;
            };
            let Some(ticket) = state.highlights.focus(id) else {
                debug!(id = %id, "click on unknown highlight ignored");
                return false;
            };
            self.publish(&mut state);
            ticket
        };

        let this = self.clone();
        let delay = self.config.focus_duration;
        tokio::spawn(async move {
            tokio::select! {
                _ = token.cancelled() => {}
                _ = tokio::time::sleep(delay) => {
                    let mut state = this.state.lock().await;
                    if state.highlights.release(&ticket) {
                        this.publish(&mut state);
                    }
                }
            }
        });
        true
    }

    /// Chart/table click: focuses the citation behind the point, if there is one.
    pub async fn on_data_point_click(&self, point: &DataPoint) -> bool {
        let Some(id) = self.snapshot().citation_at(point) else {
            return false;
        };
        self.on_citation_click(&id).await
    }

    async fn require_session(&self) -> Result<SessionContext, OrchestratorError> {
        self.state
            .lock()
            .await
            .session
            .clone()
            .ok_or(OrchestratorError::NoSession)
    }

    /// Locks state unless `token` was cancelled while the caller was suspended.
    async fn lock_live(
        &self,
        token: &CancellationToken,
    ) -> Result<tokio::sync::MutexGuard<'_, ConversationState>, OrchestratorError> {
        let state = self.state.lock().await;
        if token.is_cancelled() {
            debug!("dropping result of cancelled operation");
            return Err(OrchestratorError::Cancelled);
        }
        Ok(state)
    }

    async fn post_system(
        &self,
        token: &CancellationToken,
        context: &SessionContext,
        text: String,
    ) -> Result<(), OrchestratorError> {
        let mut state = self.lock_live(token).await?;
        let notice = Message::system(context.session_id().clone(), text, Utc::now())
            .with_documents(context.document_ids().to_vec());
        state.store.insert(notice);
        self.publish(&mut state);
        Ok(())
    }

    fn scoped_normalizer(&self, context: &SessionContext) -> Normalizer {
        self.normalizer
            .clone()
            .with_default_document(context.active_document().cloned())
    }

    fn publish(&self, state: &mut ConversationState) {
        state.rev = state.rev.wrapping_add(1);
        let messages = state.store.sorted();
        let visualization = aggregate(&messages, &state.ledger);
        let snapshot = ViewSnapshot::new(
            state.rev,
            state.session.clone(),
            messages,
            state.highlights.highlights(),
            visualization,
        );
        self.view.send_replace(Arc::new(snapshot));
    }
}

async fn guarded<T>(
    token: &CancellationToken,
    call: impl Future<Output = Result<T, BackendError>>,
) -> Result<T, OrchestratorError> {
    tokio::select! {
        _ = token.cancelled() => Err(OrchestratorError::Cancelled),
        result = call => result.map_err(OrchestratorError::from),
    }
}

/// Citations on the message itself plus those inside its blocks.
fn message_citations(message: &Message) -> Vec<Citation> {
    let mut citations = message.citations().to_vec();
    for block in message.analysis_blocks() {
        citations.extend(block_citations(block));
    }
    citations
}

fn block_citations(block: &AnalysisBlock) -> Vec<Citation> {
    match block.content() {
        BlockContent::Chart(slot) => chart_citations(slot),
        BlockContent::Table(slot) => table_citations(slot),
        BlockContent::Metric(metrics) => metrics
            .iter()
            .filter_map(|metric| metric.citation.clone())
            .collect(),
        BlockContent::TextSummary(_) => Vec::new(),
    }
}

/// Record-level citations, stored serialized under each record's `citation` key.
fn chart_citations(slot: &Normalized<ChartModel>) -> Vec<Citation> {
    slot.ready()
        .map(|chart| {
            chart
                .data
                .iter()
                .filter_map(|record| record.get("citation"))
                .filter_map(|raw| serde_json::from_value::<Citation>(raw.clone()).ok())
                .collect()
        })
        .unwrap_or_default()
}

fn table_citations(slot: &Normalized<TableModel>) -> Vec<Citation> {
    slot.ready()
        .map(|table| {
            table
                .rows
                .iter()
                .flatten()
                .filter_map(|cell| cell.citation().cloned())
                .collect()
        })
        .unwrap_or_default()
}

/// Citations on metrics, insights and the result's charts and tables.
fn result_citations(result: &AnalysisResult) -> Vec<Citation> {
    let mut citations = result
        .metrics
        .iter()
        .chain(result.ratios.iter())
        .filter_map(|metric| metric.citation.clone())
        .chain(
            result
                .insights
                .iter()
                .flat_map(|insight| insight.citations.iter().cloned()),
        )
        .collect::<Vec<_>>();
    let visualization = &result.visualization_data;
    citations.extend(visualization.charts.iter().flat_map(chart_citations));
    citations.extend(visualization.tables.iter().flat_map(table_citations));
    citations
}
