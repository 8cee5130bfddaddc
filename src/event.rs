//! Checkpoint events emitted while a statement is parsed.
//!
//! The engine never prints. Callers that want to observe header selection,
//! skipped pages or dual-table splits pass an [`EventSink`].

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    NoHeader,
    NoDateColumns,
}

impl SkipReason {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::NoHeader => "no header row",
            Self::NoDateColumns => "no date column in header",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum LayoutEvent {
    PageStarted {
        page: u32,
        token_count: usize,
    },
    ChunkWithoutHeader {
        page: u32,
        chunk: usize,
        chunk_count: usize,
    },
    HeaderSelected {
        page: u32,
        y: f64,
        labels: Vec<String>,
    },
    PageSkipped {
        page: u32,
        reason: SkipReason,
    },
    DualTableDetected {
        page: u32,
        mismatch_ratio: f64,
    },
    ParseComplete {
        page_count: usize,
        transaction_count: usize,
    },
}

pub trait EventSink {
    fn emit(&mut self, event: LayoutEvent);
}

/// Forwards events to `tracing`.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingSink;

impl EventSink for TracingSink {
    fn emit(&mut self, event: LayoutEvent) {
        match event {
            LayoutEvent::PageStarted { page, token_count } => {
                tracing::debug!(page, token_count, "parsing page");
            }
            LayoutEvent::ChunkWithoutHeader {
                page,
                chunk,
                chunk_count,
            } => {
                tracing::trace!(page, chunk, chunk_count, "no header candidate in chunk");
            }
            LayoutEvent::HeaderSelected { page, y, labels } => {
                tracing::info!(page, y, labels = ?labels, "selected header row");
            }
            LayoutEvent::PageSkipped { page, reason } => {
                tracing::warn!(page, reason = reason.as_str(), "skipping page");
            }
            LayoutEvent::DualTableDetected {
                page,
                mismatch_ratio,
            } => {
                tracing::info!(page, mismatch_ratio, "splitting side-by-side tables");
            }
            LayoutEvent::ParseComplete {
                page_count,
                transaction_count,
            } => {
                tracing::info!(page_count, transaction_count, "parsing complete");
            }
        }
    }
}

/// Keeps every event in order.
#[derive(Debug, Clone, Default)]
pub struct RecordingSink {
    pub events: Vec<LayoutEvent>,
}

impl RecordingSink {
    #[must_use]
    pub fn skipped_pages(&self) -> Vec<(u32, SkipReason)> {
        self.events
            .iter()
            .filter_map(|event| match event {
                LayoutEvent::PageSkipped { page, reason } => Some((*page, *reason)),
                _ => None,
            })
            .collect()
    }

    #[must_use]
    pub fn dual_table_pages(&self) -> Vec<u32> {
        self.events
            .iter()
            .filter_map(|event| match event {
                LayoutEvent::DualTableDetected { page, .. } => Some(*page),
                _ => None,
            })
            .collect()
    }
}

impl EventSink for RecordingSink {
    fn emit(&mut self, event: LayoutEvent) {
        self.events.push(event);
    }
}
