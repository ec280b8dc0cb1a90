// SPDX-FileCopyrightText: 2026 Giggle Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Completion adapter trait for the two-round tool-augmented exchange.

use async_trait::async_trait;

use crate::error::GiggleError;
use crate::traits::adapter::PluginAdapter;
use crate::types::{Completion, FinalizeRequest, NegotiateRequest, Negotiation};

/// Adapter for an external text-completion service.
///
/// One logical exchange is two calls: [`negotiate`](Self::negotiate) lets the
/// service decide whether to call the humor classifier tool, and
/// [`finalize`](Self::finalize) produces the reply text. Implementations
/// report every service fault as an error and never decide user-facing
/// behavior themselves.
#[async_trait]
pub trait CompletionAdapter: PluginAdapter {
    /// Round one: sends the user text with the declared tool.
    async fn negotiate(&self, request: NegotiateRequest) -> Result<Negotiation, GiggleError>;

    /// Round two: sends the tool outcome and previous continuity token, and
    /// returns the reply with a fresh continuity token.
    async fn finalize(&self, request: FinalizeRequest) -> Result<Completion, GiggleError>;
}
