//! The metadata-change notification stream.
//!
//! The host platform's hooks become an explicit observer seam: whoever
//! performs a metadata write builds a [`MetaChange`] and awaits
//! [`HookBus::dispatch`] inline, so every subscribed observer runs to
//! completion within the same request, before the response is produced.
//! Observers subscribe once at startup.

use std::sync::Arc;

use async_trait::async_trait;

use saleflash_core::MetaKey;

use crate::EngineError;

/// What happened to the metadata row.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MetaChangeKind {
    Added,
    Updated,
    Deleted,
}

/// One metadata-change event for a product or variation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MetaChange {
    pub product_id: i64,
    pub meta_key: MetaKey,
    pub kind: MetaChangeKind,
}

/// A subscriber to metadata-change events.
#[async_trait]
pub trait MetaObserver: Send + Sync {
    /// Stable name used in dispatch logs.
    fn name(&self) -> &'static str;

    async fn on_meta_change(&self, change: &MetaChange) -> Result<(), EngineError>;
}

/// Holds the registered observers and dispatches events to them in
/// subscription order.
///
/// Dispatch is sequential and awaited; an observer failure is logged and does
/// not stop the remaining observers.
#[derive(Default)]
pub struct HookBus {
    observers: Vec<Arc<dyn MetaObserver>>,
}

impl HookBus {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn subscribe(&mut self, observer: Arc<dyn MetaObserver>) {
        tracing::debug!(observer = observer.name(), "observer subscribed");
        self.observers.push(observer);
    }

    #[must_use]
    pub fn observer_count(&self) -> usize {
        self.observers.len()
    }

    pub async fn dispatch(&self, change: &MetaChange) {
        for observer in &self.observers {
            if let Err(e) = observer.on_meta_change(change).await {
                tracing::error!(
                    observer = observer.name(),
                    product_id = change.product_id,
                    meta_key = %change.meta_key,
                    error = %e,
                    "observer failed handling metadata change"
                );
            }
        }
    }
}
