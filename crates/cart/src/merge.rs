//! Sequential replay of the anonymous cart into the server cart.
//!
//! On login the guest cart's lines are drained through an explicit ordered
//! [`ReplayQueue`], one Cart API add per line, each awaited before the next
//! so no two adds interleave server-side. A failed add is recorded and
//! skipped; the queue always drains to the end, and the bookkeeping comes
//! back as a [`MergeReport`] rather than an error - a partial merge must
//! not block login.

use std::collections::VecDeque;

use tracing::warn;
use zella_core::{Cart, CartItem};

use crate::api::CartApi;
use crate::error::CartError;

/// Ordered queue of guest lines pending replay.
#[derive(Debug)]
pub struct ReplayQueue {
    pending: VecDeque<CartItem>,
}

impl ReplayQueue {
    /// Build a queue from the guest cart, preserving line order.
    #[must_use]
    pub fn from_cart(cart: &Cart) -> Self {
        Self {
            pending: cart.items.iter().cloned().collect(),
        }
    }

    /// Number of lines still pending.
    #[must_use]
    pub fn len(&self) -> usize {
        self.pending.len()
    }

    /// Whether nothing is pending.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }

    /// Drain the queue against the Cart API, one add at a time.
    ///
    /// Each replay uses the guest line's quantity and size; the server
    /// recomputes the price (server prices win once merge begins). The
    /// returned carts are discarded - the caller re-fetches the server cart
    /// once, after the whole queue has drained.
    pub async fn drain<A: CartApi>(mut self, api: &A) -> MergeReport {
        let attempted = self.pending.len();
        let mut failures = Vec::new();

        while let Some(line) = self.pending.pop_front() {
            match api.add_line(&line.product, line.quantity, &line.size).await {
                Ok(_) => {}
                Err(error) => {
                    warn!(
                        product = %line.product,
                        size = %line.size,
                        quantity = line.quantity,
                        %error,
                        "Replay add failed; skipping line"
                    );
                    failures.push(ReplayFailure { line, error });
                }
            }
        }

        MergeReport {
            attempted,
            failures,
        }
    }
}

/// One guest line that failed to replay.
#[derive(Debug)]
pub struct ReplayFailure {
    pub line: CartItem,
    pub error: CartError,
}

/// Outcome of a merge: how many lines were attempted and which failed.
#[derive(Debug, Default)]
pub struct MergeReport {
    pub attempted: usize,
    pub failures: Vec<ReplayFailure>,
}

impl MergeReport {
    /// Number of lines that landed on the server.
    #[must_use]
    pub fn succeeded(&self) -> usize {
        self.attempted - self.failures.len()
    }

    /// Whether every attempted line landed.
    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.failures.is_empty()
    }
}
