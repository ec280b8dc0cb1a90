// SPDX-FileCopyrightText: 2026 Giggle Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Adapter trait definitions.
//!
//! All adapters extend the [`PluginAdapter`] base trait and use
//! `#[async_trait]` so they can be held as trait objects.

pub mod adapter;
pub mod channel;
pub mod completion;
pub mod storage;

pub use adapter::PluginAdapter;
pub use channel::ChannelAdapter;
pub use completion::CompletionAdapter;
pub use storage::StorageAdapter;
