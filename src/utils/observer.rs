//! Observability hook invoked by the pipeline components.
//!
//! Components report what happened through [`PipelineObserver`]; nothing in
//! the control flow depends on what an observer does with the events.

use crate::domain::model::CanonicalKey;
use std::sync::Mutex;

/// Why a single key dropped out of the fetch phase.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureKind {
    NotFound,
    Lookup,
    Fetch,
}

#[derive(Debug, Clone, PartialEq)]
pub enum PipelineEvent {
    LookupAttempted {
        key: CanonicalKey,
    },
    FetchSucceeded {
        key: CanonicalKey,
        width: u32,
        height: u32,
    },
    FetchFailed {
        key: CanonicalKey,
        kind: FailureKind,
        reason: String,
    },
    PageEmitted {
        index: usize,
        placements: usize,
    },
    CacheReleased {
        entries: usize,
    },
}

pub trait PipelineObserver: Send + Sync {
    fn on_event(&self, event: &PipelineEvent);
}

/// Default observer: forwards every event to `tracing`.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingObserver;

impl PipelineObserver for TracingObserver {
    fn on_event(&self, event: &PipelineEvent) {
        match event {
            PipelineEvent::LookupAttempted { key } => {
                tracing::debug!("🔎 Looking up '{}' in catalog", key);
            }
            PipelineEvent::FetchSucceeded { key, width, height } => {
                tracing::debug!("✅ Fetched artwork for '{}' ({}x{})", key, width, height);
            }
            PipelineEvent::FetchFailed { key, kind, reason } => match kind {
                FailureKind::NotFound => {
                    tracing::warn!("⚠️ No artwork for '{}': {}", key, reason)
                }
                FailureKind::Lookup => {
                    tracing::warn!("❌ Catalog lookup failed for '{}': {}", key, reason)
                }
                FailureKind::Fetch => {
                    tracing::warn!("❌ Artwork download failed for '{}': {}", key, reason)
                }
            },
            PipelineEvent::PageEmitted { index, placements } => {
                tracing::debug!("📄 Page {} emitted with {} cards", index + 1, placements);
            }
            PipelineEvent::CacheReleased { entries } => {
                tracing::debug!("🧹 Released {} cached artworks", entries);
            }
        }
    }
}

/// Keeps every event in memory, in arrival order.
#[derive(Debug, Default)]
pub struct RecordingObserver {
    events: Mutex<Vec<PipelineEvent>>,
}

impl RecordingObserver {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> Vec<PipelineEvent> {
        self.events
            .lock()
            .map(|events| events.clone())
            .unwrap_or_default()
    }
}

impl PipelineObserver for RecordingObserver {
    fn on_event(&self, event: &PipelineEvent) {
        if let Ok(mut events) = self.events.lock() {
            events.push(event.clone());
        }
    }
}
