//! Sequential batch driver with streamed progress

use crate::models::{MatchResult, MatchSource, MatchingMode, TrackDescriptor};
use crate::services::MatchResolver;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::time::Instant;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

/// Progress event streamed to the caller
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum ConversionEvent {
    /// One track resolved; `index` is 1-based
    Processing {
        index: usize,
        total: usize,
        result: MatchResult,
    },
    /// Every track resolved, in input order
    Complete {
        request_id: Uuid,
        summary: ConversionSummary,
        results: Vec<MatchResult>,
    },
}

/// Batch totals
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConversionSummary {
    pub mode: MatchingMode,
    pub total: usize,
    pub found: usize,
    pub not_found: usize,
    pub from_cache: usize,
    pub elapsed_ms: u64,
    pub completed_at: DateTime<Utc>,
}

impl ConversionSummary {
    fn from_results(mode: MatchingMode, results: &[MatchResult], started: Instant) -> Self {
        let found = results.iter().filter(|r| r.is_found()).count();
        Self {
            mode,
            total: results.len(),
            found,
            not_found: results.len() - found,
            from_cache: results.iter().filter(|r| r.source == MatchSource::Cache).count(),
            elapsed_ms: started.elapsed().as_millis() as u64,
            completed_at: Utc::now(),
        }
    }
}

/// What a conversion produced, complete or not
#[derive(Debug, Clone)]
pub struct ConversionOutcome {
    pub request_id: Uuid,
    /// Results for the tracks processed before any cancellation
    pub results: Vec<MatchResult>,
    pub cancelled: bool,
    /// Totals over `results`
    pub summary: ConversionSummary,
}

/// Resolve `tracks` in order, streaming one event per track
///
/// Cancellation is checked before and after each track; a result finished
/// after cancellation is dropped. A closed event channel counts as
/// cancellation. No `Complete` event is sent for a cancelled run.
pub async fn run_conversion(
    resolver: &MatchResolver,
    tracks: &[TrackDescriptor],
    mode: MatchingMode,
    cancel: &CancellationToken,
    events: &mpsc::Sender<ConversionEvent>,
) -> ConversionOutcome {
    let request_id = Uuid::new_v4();
    let started = Instant::now();
    let total = tracks.len();
    let mut results = Vec::with_capacity(total);
    let mut cancelled = false;

    tracing::info!(request_id = %request_id, total, mode = %mode, "Conversion started");

    for (idx, track) in tracks.iter().enumerate() {
        if cancel.is_cancelled() {
            cancelled = true;
            break;
        }

        let result = resolver.resolve(track, mode, cancel).await;

        if cancel.is_cancelled() {
            cancelled = true;
            break;
        }

        let event = ConversionEvent::Processing {
            index: idx + 1,
            total,
            result: result.clone(),
        };
        results.push(result);

        if events.send(event).await.is_err() {
            tracing::info!(request_id = %request_id, "Event receiver dropped, stopping conversion");
            cancelled = true;
            break;
        }
    }

    let summary = ConversionSummary::from_results(mode, &results, started);

    if cancelled {
        tracing::info!(
            request_id = %request_id,
            processed = results.len(),
            total,
            "Conversion cancelled"
        );
    } else {
        tracing::info!(
            request_id = %request_id,
            total,
            found = summary.found,
            from_cache = summary.from_cache,
            elapsed_ms = summary.elapsed_ms,
            "Conversion complete"
        );

        let complete = ConversionEvent::Complete {
            request_id,
            summary: summary.clone(),
            results: results.clone(),
        };
        if events.send(complete).await.is_err() {
            tracing::debug!(request_id = %request_id, "Event receiver dropped before completion");
        }
    }

    ConversionOutcome {
        request_id,
        results,
        cancelled,
        summary,
    }
}
