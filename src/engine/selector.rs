//! Live strategy selection.
//!
//! A thread-safe single-value cell with last-write-wins semantics. The
//! operator surface writes it at any time; the trading loop reads it once
//! per iteration, so a switch takes effect at the next iteration boundary.

use std::sync::{Arc, RwLock};

use crate::types::StrategyKind;

#[derive(Debug, Clone)]
pub struct StrategySelector {
    inner: Arc<RwLock<StrategyKind>>,
}

impl StrategySelector {
    pub fn new(initial: StrategyKind) -> Self {
        Self {
            inner: Arc::new(RwLock::new(initial)),
        }
    }

    /// The currently selected strategy.
    pub fn current(&self) -> StrategyKind {
        *self.inner.read().expect("strategy selector lock poisoned")
    }

    /// Replace the selection. Takes effect at the loop's next iteration.
    pub fn select(&self, kind: StrategyKind) {
        *self.inner.write().expect("strategy selector lock poisoned") = kind;
    }
}
