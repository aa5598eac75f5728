// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Ledgerlens-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of Ledgerlens and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

use super::ids::{DocumentId, SessionId};

/// Immutable per-conversation context handed to every operation that needs it.
///
/// Adding a document produces a new context instead of mutating the shared one.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionContext {
    session_id: SessionId,
    title: String,
    document_ids: Vec<DocumentId>,
    active_document: Option<DocumentId>,
}

impl SessionContext {
    pub fn new(session_id: SessionId, title: impl Into<String>, document_ids: Vec<DocumentId>) -> Self {
        let mut unique = Vec::with_capacity(document_ids.len());
        for id in document_ids {
            if !unique.contains(&id) {
                unique.push(id);
            }
        }
        let active_document = unique.first().cloned();
        Self {
            session_id,
            title: title.into(),
            document_ids: unique,
            active_document,
        }
    }

    pub fn session_id(&self) -> &SessionId {
        &self.session_id
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn document_ids(&self) -> &[DocumentId] {
        &self.document_ids
    }

    /// The document citations without an explicit `documentId` are attributed to.
    pub fn active_document(&self) -> Option<&DocumentId> {
        self.active_document.as_ref()
    }

    pub fn contains_document(&self, document_id: &DocumentId) -> bool {
        self.document_ids.contains(document_id)
    }

    pub fn with_document(&self, document_id: DocumentId) -> Self {
        let mut next = self.clone();
        if !next.document_ids.contains(&document_id) {
            next.document_ids.push(document_id.clone());
        }
        if next.active_document.is_none() {
            next.active_document = Some(document_id);
        }
        next
    }

    pub fn with_active_document(&self, document_id: DocumentId) -> Self {
        self.with_document(document_id.clone()).activate(document_id)
    }

    fn activate(mut self, document_id: DocumentId) -> Self {
        self.active_document = Some(document_id);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::SessionContext;
    use crate::model::{DocumentId, SessionId};

    fn doc(id: &str) -> DocumentId {
        DocumentId::new(id).expect("document id")
    }

    #[test]
    fn new_context_dedups_documents_and_activates_first() {
        let ctx = SessionContext::new(
            SessionId::new("s1").unwrap(),
            "Q3 review",
            vec![doc("a"), doc("b"), doc("a")],
        );
        assert_eq!(ctx.document_ids(), &[doc("a"), doc("b")]);
        assert_eq!(ctx.active_document(), Some(&doc("a")));
    }

    #[test]
    fn with_document_returns_new_context() {
        let ctx = SessionContext::new(SessionId::new("s1").unwrap(), "t", Vec::new());
        let next = ctx.with_document(doc("a"));
        assert!(ctx.document_ids().is_empty());
        assert_eq!(next.document_ids(), &[doc("a")]);
        assert_eq!(next.active_document(), Some(&doc("a")));

        let switched = next.with_active_document(doc("b"));
        assert_eq!(switched.active_document(), Some(&doc("b")));
        assert!(switched.contains_document(&doc("a")));
    }
}
