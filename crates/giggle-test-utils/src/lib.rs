// SPDX-FileCopyrightText: 2026 Giggle Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Test utilities for Giggle integration tests.
//!
//! Provides mock adapters and test harness infrastructure for fast,
//! deterministic, CI-runnable tests without external services.
//!
//! # Components
//!
//! - [`MockChannel`] - Mock chat channel with message injection and capture
//! - [`MockCompletion`] - Mock completion service with scripted rounds
//! - [`MockStorage`] - In-memory audit trail
//! - [`TestHarness`] - Full relay over a temp SQLite database

pub mod harness;
pub mod mock_channel;
pub mod mock_completion;
pub mod mock_storage;

pub use harness::TestHarness;
pub use mock_channel::{MockChannel, RecordedReaction};
pub use mock_completion::MockCompletion;
pub use mock_storage::MockStorage;
