// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Ledgerlens-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of Ledgerlens and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use super::block::AnalysisBlock;
use super::citation::Citation;
use super::ids::{AnalysisId, DocumentId, MessageId, SessionId};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    User,
    Assistant,
    System,
}

impl Role {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::User => "user",
            Self::Assistant => "assistant",
            Self::System => "system",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid message role '{0}'")]
pub struct ParseRoleError(pub String);

impl FromStr for Role {
    type Err = ParseRoleError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "user" | "human" => Ok(Self::User),
            "assistant" | "ai" | "bot" => Ok(Self::Assistant),
            "system" => Ok(Self::System),
            _ => Err(ParseRoleError(s.to_owned())),
        }
    }
}

impl MessageId {
    /// `<role>-<content hash>-<unix millis>`.
    ///
    /// The timestamp component is part of the id, so identical content sent at two
    /// different instants yields two ids and is not collapsed by the store.
    pub fn derive(role: Role, content: &str, timestamp: DateTime<Utc>) -> MessageId {
        let digest = Sha256::digest(content.as_bytes());
        let hash = digest
            .iter()
            .take(6)
            .map(|b| format!("{b:02x}"))
            .collect::<String>();
        let value = format!("{}-{hash}-{}", role.as_str(), timestamp.timestamp_millis());
        MessageId::new(value).unwrap_or_else(|_| MessageId::generate(role.as_str()))
    }
}

/// One chat turn. Never mutated once stored.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Message {
    id: MessageId,
    session_id: SessionId,
    role: Role,
    content: String,
    timestamp: DateTime<Utc>,
    referenced_documents: Vec<DocumentId>,
    referenced_analyses: Vec<AnalysisId>,
    citations: Vec<Citation>,
    analysis_blocks: Vec<AnalysisBlock>,
    /// Placeholder (e.g. "thinking") that is swapped out once the real reply lands.
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    transient: bool,
}

impl Message {
    pub fn new(
        session_id: SessionId,
        role: Role,
        content: impl Into<String>,
        timestamp: DateTime<Utc>,
    ) -> Self {
        let content = content.into();
        Self {
            id: MessageId::derive(role, &content, timestamp),
            session_id,
            role,
            content,
            timestamp,
            referenced_documents: Vec::new(),
            referenced_analyses: Vec::new(),
            citations: Vec::new(),
            analysis_blocks: Vec::new(),
            transient: false,
        }
    }

    pub fn system(session_id: SessionId, content: impl Into<String>, timestamp: DateTime<Utc>) -> Self {
        Self::new(session_id, Role::System, content, timestamp)
    }

    pub fn placeholder(session_id: SessionId, content: impl Into<String>, timestamp: DateTime<Utc>) -> Self {
        let mut message = Self::new(session_id, Role::Assistant, content, timestamp);
        message.id = MessageId::generate("placeholder");
        message.transient = true;
        message
    }

    pub fn with_id(mut self, id: MessageId) -> Self {
        self.id = id;
        self
    }

    pub fn with_documents(mut self, documents: Vec<DocumentId>) -> Self {
        self.referenced_documents = documents;
        self
    }

    pub fn with_analyses(mut self, analyses: Vec<AnalysisId>) -> Self {
        self.referenced_analyses = analyses;
        self
    }

    pub fn with_citations(mut self, citations: Vec<Citation>) -> Self {
        self.citations = citations;
        self
    }

    pub fn with_blocks(mut self, blocks: Vec<AnalysisBlock>) -> Self {
        self.analysis_blocks = blocks;
        self
    }

    pub fn id(&self) -> &MessageId {
        &self.id
    }

    pub fn session_id(&self) -> &SessionId {
        &self.session_id
    }

    pub fn role(&self) -> Role {
        self.role
    }

    pub fn content(&self) -> &str {
        &self.content
    }

    pub fn timestamp(&self) -> DateTime<Utc> {
        self.timestamp
    }

    pub fn referenced_documents(&self) -> &[DocumentId] {
        &self.referenced_documents
    }

    pub fn referenced_analyses(&self) -> &[AnalysisId] {
        &self.referenced_analyses
    }

    pub fn citations(&self) -> &[Citation] {
        &self.citations
    }

    pub fn analysis_blocks(&self) -> &[AnalysisBlock] {
        &self.analysis_blocks
    }

    pub fn is_transient(&self) -> bool {
        self.transient
    }
}
