use std::collections::HashSet;
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::Serialize;
use shared::transfer::{Incomplete, PreviewResult, TransferRequest};
use tokio::time::Instant;
use tracing::debug;

use crate::error::{ErrorReport, TransferError};
use crate::fingerprint::Fingerprint;

pub const DEFAULT_DEBOUNCE: Duration = Duration::from_millis(400);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ReviewStatus {
    /// Not enough input to build a request. No call is made.
    Idle,
    /// Waiting out the debounce window, or a preview call is in flight.
    Pending,
    /// The held preview matches the current request. Execution is allowed.
    Ready,
    /// The preview call for the current request failed.
    Error,
}

/// Snapshot of the review, as handed to the UI.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReviewState {
    pub last_request_fingerprint: Fingerprint,
    pub last_preview: Option<PreviewResult>,
    pub status: ReviewStatus,
    pub error: Option<ErrorReport>,
    pub idle_reason: Option<Incomplete>,
    /// False while a held preview belongs to an older request.
    pub is_fresh: bool,
    pub updated_at: Option<DateTime<Utc>>,
}

/// A preview call to issue. The fingerprint goes back with the response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PreviewTicket {
    pub fingerprint: Fingerprint,
    pub request: TransferRequest,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Completion {
    Applied,
    Discarded,
}

/// Debounced, fingerprint-checked preview state machine.
///
/// Pure and synchronous: callers feed it input changes and timestamps, it hands back tickets for
/// the preview calls to issue and decides which responses may land. Responses are matched by the
/// fingerprint they were requested for, never by arrival order.
#[derive(Debug, Clone)]
pub struct ReviewPipeline {
    debounce: Duration,
    current: Option<(TransferRequest, Fingerprint)>,
    idle_reason: Option<Incomplete>,
    deadline: Option<Instant>,
    in_flight: HashSet<Fingerprint>,
    last_fingerprint: Fingerprint,
    last_request: Option<TransferRequest>,
    last_preview: Option<PreviewResult>,
    error: Option<(Fingerprint, ErrorReport)>,
    updated_at: Option<DateTime<Utc>>,
}

impl Default for ReviewPipeline {
    fn default() -> Self {
        Self::new(DEFAULT_DEBOUNCE)
    }
}

impl ReviewPipeline {
    pub fn new(debounce: Duration) -> Self {
        Self {
            debounce,
            current: None,
            idle_reason: Some(Incomplete::NoCounterparty),
            deadline: None,
            in_flight: HashSet::new(),
            last_fingerprint: Fingerprint::empty(),
            last_request: None,
            last_preview: None,
            error: None,
            updated_at: None,
        }
    }

    pub fn debounce(&self) -> Duration {
        self.debounce
    }

    pub fn current_fingerprint(&self) -> Option<&Fingerprint> {
        self.current.as_ref().map(|(_, fp)| fp)
    }

    pub fn current_request(&self) -> Option<&TransferRequest> {
        self.current.as_ref().map(|(request, _)| request)
    }

    pub fn next_deadline(&self) -> Option<Instant> {
        self.deadline
    }

    pub fn in_flight(&self) -> usize {
        self.in_flight.len()
    }

    fn is_cached(&self, fingerprint: &Fingerprint) -> bool {
        self.last_preview.is_some() && &self.last_fingerprint == fingerprint
    }

    /// Feeds the latest input. Returns true when the current request changed.
    pub fn update(&mut self, input: Result<TransferRequest, Incomplete>, now: Instant) -> bool {
        let request = match input {
            Ok(request) => request,
            Err(reason) => {
                let changed = self.current.is_some() || self.idle_reason != Some(reason);
                if self.current.take().is_some() {
                    debug!("Review idle: {}", reason);
                }
                self.idle_reason = Some(reason);
                self.deadline = None;
                self.error = None;
                self.last_fingerprint = Fingerprint::empty();
                self.last_request = None;
                self.last_preview = None;
                return changed;
            }
        };

        let fingerprint = Fingerprint::of(&request);
        if self.current_fingerprint() == Some(&fingerprint) {
            return false;
        }

        self.idle_reason = None;
        self.error = None;
        if self.is_cached(&fingerprint) {
            debug!("Preview cache hit for {}", fingerprint.short());
            self.deadline = None;
        } else if self.in_flight.contains(&fingerprint) {
            debug!("Preview for {} already in flight", fingerprint.short());
            self.deadline = None;
        } else {
            debug!(
                "Scheduling preview for {} in {}ms",
                fingerprint.short(),
                self.debounce.as_millis()
            );
            self.deadline = Some(now + self.debounce);
        }
        self.current = Some((request, fingerprint));
        true
    }

    /// Fires the debounced preview once its quiet period has elapsed.
    pub fn poll_due(&mut self, now: Instant) -> Option<PreviewTicket> {
        match self.deadline {
            Some(deadline) if now >= deadline => {
                self.deadline = None;
                self.fire()
            }
            _ => None,
        }
    }

    /// Re-issues the preview for the current request after a failure.
    pub fn retry(&mut self) -> Option<PreviewTicket> {
        if self.status() != ReviewStatus::Error {
            return None;
        }
        self.error = None;
        self.deadline = None;
        self.fire()
    }

    fn fire(&mut self) -> Option<PreviewTicket> {
        let (request, fingerprint) = self.current.as_ref()?;
        if self.is_cached(fingerprint) || self.in_flight.contains(fingerprint) {
            return None;
        }
        debug!("Requesting preview for {}", fingerprint.short());
        self.in_flight.insert(fingerprint.clone());
        Some(PreviewTicket {
            fingerprint: fingerprint.clone(),
            request: request.clone(),
        })
    }

    /// Lands a preview response. Anything not requested for the current fingerprint is dropped.
    pub fn complete(
        &mut self,
        ticket: PreviewTicket,
        result: Result<PreviewResult, TransferError>,
    ) -> Completion {
        self.in_flight.remove(&ticket.fingerprint);
        if self.current_fingerprint() != Some(&ticket.fingerprint) {
            debug!("Discarding stale preview for {}", ticket.fingerprint.short());
            return Completion::Discarded;
        }

        match result {
            Ok(preview) => {
                debug!(
                    "Preview ready for {}: {} matched, {} to add",
                    ticket.fingerprint.short(),
                    preview.matched_count,
                    preview.to_add_count
                );
                self.last_fingerprint = ticket.fingerprint;
                self.last_request = Some(ticket.request);
                self.last_preview = Some(preview);
                self.error = None;
            }
            Err(e) => {
                debug!("Preview failed for {}: {}", ticket.fingerprint.short(), e);
                self.last_fingerprint = Fingerprint::empty();
                self.last_request = None;
                self.last_preview = None;
                self.error = Some((ticket.fingerprint, ErrorReport::from(&e)));
            }
        }
        self.updated_at = Some(Utc::now());
        Completion::Applied
    }

    pub fn status(&self) -> ReviewStatus {
        let Some((_, fingerprint)) = &self.current else {
            return ReviewStatus::Idle;
        };
        if self.is_cached(fingerprint) {
            return ReviewStatus::Ready;
        }
        if self.deadline.is_some() || self.in_flight.contains(fingerprint) {
            return ReviewStatus::Pending;
        }
        match &self.error {
            Some((failed, _)) if failed == fingerprint => ReviewStatus::Error,
            _ => ReviewStatus::Pending,
        }
    }

    /// The preview and the exact request that produced it, only while they are fresh.
    pub fn ready(&self) -> Option<(&TransferRequest, &PreviewResult, &Fingerprint)> {
        if self.status() != ReviewStatus::Ready {
            return None;
        }
        Some((
            self.last_request.as_ref()?,
            self.last_preview.as_ref()?,
            &self.last_fingerprint,
        ))
    }

    pub fn last_preview(&self) -> Option<&PreviewResult> {
        self.last_preview.as_ref()
    }

    pub fn state(&self) -> ReviewState {
        let status = self.status();
        let error = match (&self.error, self.current_fingerprint()) {
            (Some((failed, report)), Some(current)) if failed == current => Some(report.clone()),
            _ => None,
        };
        ReviewState {
            last_request_fingerprint: self.last_fingerprint.clone(),
            last_preview: self.last_preview.clone(),
            status,
            error,
            idle_reason: self.idle_reason,
            is_fresh: status == ReviewStatus::Ready,
            updated_at: self.updated_at,
        }
    }
}
