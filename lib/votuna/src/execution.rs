use serde::Serialize;
use shared::collection::CurrentCollection;
use shared::transfer::{ExecutionResult, TransferRequest};
use tracing::{debug, info, warn};

use crate::error::{ErrorReport, TransferError};
use crate::fingerprint::Fingerprint;
use crate::review::ReviewPipeline;
use crate::traits::CacheKey;

/// An execute call to issue: the exact request behind the current `Ready` preview.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExecutionTicket {
    pub fingerprint: Fingerprint,
    pub request: TransferRequest,
    pub matched_count: u32,
    pub max_items_per_action: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ExecutionState {
    pub can_execute: bool,
    pub pending: bool,
    pub result: Option<ExecutionResult>,
    pub error: Option<ErrorReport>,
}

/// Single-flight execution gated on a fresh preview.
#[derive(Debug, Clone, Default)]
pub struct ExecutionController {
    in_flight: Option<Fingerprint>,
    result: Option<ExecutionResult>,
    error: Option<ErrorReport>,
    attached_to: Fingerprint,
}

impl ExecutionController {
    pub fn is_pending(&self) -> bool {
        self.in_flight.is_some()
    }

    pub fn can_execute(&self, review: &ReviewPipeline) -> bool {
        !self.is_pending() && review.ready().is_some()
    }

    /// Hands out the request to execute.
    ///
    /// `Ok(None)` means there is nothing to do: another execution is running or the preview is
    /// not fresh. A preview whose match count exceeds its per-action ceiling fails right here,
    /// without a network call.
    pub fn begin(
        &mut self,
        review: &ReviewPipeline,
    ) -> Result<Option<ExecutionTicket>, TransferError> {
        if let Some(running) = &self.in_flight {
            debug!("Execution for {} already running", running.short());
            return Ok(None);
        }
        let Some((request, preview, fingerprint)) = review.ready() else {
            debug!("Execute ignored: preview is not ready");
            return Ok(None);
        };

        self.attached_to = fingerprint.clone();
        self.result = None;
        if preview.exceeds_limit() {
            let err = TransferError::TooManyItems {
                requested: Some(preview.matched_count),
                limit: Some(preview.max_items_per_action),
            };
            warn!("Refusing execution for {}: {}", fingerprint.short(), err);
            self.error = Some(ErrorReport::from(&err));
            return Err(err);
        }

        info!("Executing transfer {}", fingerprint.short());
        self.error = None;
        self.in_flight = Some(fingerprint.clone());
        Ok(Some(ExecutionTicket {
            fingerprint: fingerprint.clone(),
            request: request.clone(),
            matched_count: preview.matched_count,
            max_items_per_action: preview.max_items_per_action,
        }))
    }

    /// Records the outcome. On failure only the top-level message is kept.
    pub fn finish(
        &mut self,
        ticket: &ExecutionTicket,
        result: Result<ExecutionResult, TransferError>,
    ) -> bool {
        if self.in_flight.as_ref() == Some(&ticket.fingerprint) {
            self.in_flight = None;
        }
        self.attached_to = ticket.fingerprint.clone();
        match result {
            Ok(outcome) => {
                info!(
                    "Transfer {} finished: {} added, {} duplicates skipped, {} failed",
                    ticket.fingerprint.short(),
                    outcome.added_count,
                    outcome.skipped_duplicate_count,
                    outcome.failed_count
                );
                self.result = Some(outcome);
                self.error = None;
                true
            }
            Err(e) => {
                let e = match e {
                    TransferError::TooManyItems { requested, limit } => {
                        TransferError::TooManyItems {
                            requested: requested.or(Some(ticket.matched_count)),
                            limit: limit.or(Some(ticket.max_items_per_action)),
                        }
                    }
                    other => other,
                };
                warn!("Transfer {} failed: {}", ticket.fingerprint.short(), e);
                self.result = None;
                self.error = Some(ErrorReport::from(&e));
                false
            }
        }
    }

    /// Drops any result or error that belongs to a different request.
    pub fn on_request_changed(&mut self, current: Option<&Fingerprint>) {
        if current != Some(&self.attached_to) {
            self.result = None;
            self.error = None;
        }
    }

    pub fn result(&self) -> Option<&ExecutionResult> {
        self.result.as_ref()
    }

    pub fn error(&self) -> Option<&ErrorReport> {
        self.error.as_ref()
    }

    pub fn state(&self, review: &ReviewPipeline) -> ExecutionState {
        ExecutionState {
            can_execute: self.can_execute(review),
            pending: self.is_pending(),
            result: self.result.clone(),
            error: self.error.clone(),
        }
    }
}

/// Caches to refresh after a transfer: both collections' items and the provider listing,
/// which may now hold a newly created destination.
pub fn invalidation_keys(current: &CurrentCollection, request: &TransferRequest) -> Vec<CacheKey> {
    let (source, destination) = request.endpoints(&current.collection_ref());
    let mut keys = vec![CacheKey::CollectionItems { collection: source }];
    if let Some(destination) = destination {
        let key = CacheKey::CollectionItems {
            collection: destination,
        };
        if !keys.contains(&key) {
            keys.push(key);
        }
    }
    keys.push(CacheKey::ProviderCollections {
        provider: current.provider.clone(),
    });
    keys
}
