// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Ledgerlens-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of Ledgerlens and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

//! Message storage.
//!
//! The store keeps chat messages keyed by id and publishes a chronological projection used by
//! both the aggregator and the chat view.

pub mod messages;

pub use messages::{InsertOutcome, MessageList, MessageStore, StoreError};
