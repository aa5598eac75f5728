// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Ledgerlens-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of Ledgerlens and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

use std::collections::BTreeMap;
use std::sync::Arc;

use thiserror::Error;
use tokio::sync::watch;
use tracing::debug;

use crate::model::{Message, MessageId};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StoreError {
    #[error("message {0} not found")]
    NotFound(MessageId),
    #[error("message {0} is not a transient placeholder")]
    NotTransient(MessageId),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InsertOutcome {
    Inserted,
    /// A message with the same id was already stored; nothing changed.
    Duplicate,
}

/// Chronological projection handed to readers. Replaced whole on every change.
pub type MessageList = Arc<Vec<Message>>;

/// Id-keyed message collection.
///
/// Insertion is idempotent by id. Messages are never edited; the only removal is a transient
/// placeholder being swapped for its resolved reply. Every change publishes a fresh sorted
/// list (by timestamp, then id) to subscribers.
#[derive(Debug)]
pub struct MessageStore {
    messages: BTreeMap<MessageId, Message>,
    rev: u64,
    tx: watch::Sender<MessageList>,
}

impl MessageStore {
    pub fn new() -> Self {
        let (tx, _rx) = watch::channel(Arc::new(Vec::new()));
        Self {
            messages: BTreeMap::new(),
            rev: 0,
            tx,
        }
    }

    pub fn insert(&mut self, message: Message) -> InsertOutcome {
        if self.messages.contains_key(message.id()) {
            debug!(id = %message.id(), "skipping duplicate message");
            return InsertOutcome::Duplicate;
        }
        self.messages.insert(message.id().clone(), message);
        self.publish();
        InsertOutcome::Inserted
    }

    /// Swaps placeholder `id` for `message` in one published change.
    pub fn replace_transient(
        &mut self,
        id: &MessageId,
        message: Message,
    ) -> Result<InsertOutcome, StoreError> {
        self.check_transient(id)?;
        self.messages.remove(id);
        let outcome = if self.messages.contains_key(message.id()) {
            debug!(id = %message.id(), "reply already stored, dropping placeholder only");
            InsertOutcome::Duplicate
        } else {
            self.messages.insert(message.id().clone(), message);
            InsertOutcome::Inserted
        };
        self.publish();
        Ok(outcome)
    }

    pub fn remove_transient(&mut self, id: &MessageId) -> Result<Message, StoreError> {
        self.check_transient(id)?;
        let removed = self
            .messages
            .remove(id)
            .ok_or_else(|| StoreError::NotFound(id.clone()))?;
        self.publish();
        Ok(removed)
    }

    fn check_transient(&self, id: &MessageId) -> Result<(), StoreError> {
        match self.messages.get(id) {
            None => Err(StoreError::NotFound(id.clone())),
            Some(message) if !message.is_transient() => Err(StoreError::NotTransient(id.clone())),
            Some(_) => Ok(()),
        }
    }

    pub fn get(&self, id: &MessageId) -> Option<&Message> {
        self.messages.get(id)
    }

    pub fn contains(&self, id: &MessageId) -> bool {
        self.messages.contains_key(id)
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    /// Bumped on every published change.
    pub fn rev(&self) -> u64 {
        self.rev
    }

    /// Current chronological view.
    pub fn sorted(&self) -> MessageList {
        self.tx.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<MessageList> {
        self.tx.subscribe()
    }

    fn publish(&mut self) {
        let mut sorted = self.messages.values().cloned().collect::<Vec<_>>();
        sorted.sort_by(|a, b| {
            a.timestamp()
                .cmp(&b.timestamp())
                .then_with(|| a.id().cmp(b.id()))
        });
        self.rev = self.rev.wrapping_add(1);
        self.tx.send_replace(Arc::new(sorted));
    }
}

impl Default for MessageStore {
    fn default() -> Self {
        Self::new()
    }
}
