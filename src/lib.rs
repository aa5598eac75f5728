// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Ledgerlens-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of Ledgerlens and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

//! Ledgerlens: analysis normalization and citation synchronization for chat-driven financial
//! document review.
//!
//! Raw analysis payloads go through [`normalize`] into canonical chart/table/block models,
//! [`aggregate`] folds them into one running [`aggregate::VisualizationState`], and
//! [`highlight`] keeps citations and viewer highlights addressable from both sides.
//! [`orchestrator::Conversation`] ties these to a [`backend::AnalysisBackend`].

pub mod aggregate;
pub mod backend;
pub mod citation;
pub mod config;
pub mod highlight;
pub mod model;
pub mod normalize;
pub mod orchestrator;
pub mod store;
pub mod view;
