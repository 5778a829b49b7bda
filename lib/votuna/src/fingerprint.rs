use std::fmt;

use serde::{Serialize, Serializer};
use sha2::{Digest, Sha256};
use shared::transfer::TransferRequest;

/// Stable identity of a [`TransferRequest`], used to match previews to inputs.
///
/// Two requests that differ only in the order of their selection values share a fingerprint.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct Fingerprint(String);

impl Fingerprint {
    pub fn of(request: &TransferRequest) -> Self {
        let mut values: Vec<&str> = request
            .selection_values()
            .iter()
            .map(String::as_str)
            .collect();
        values.sort_unstable();
        values.dedup();

        let canonical = serde_json::json!({
            "direction": request.direction(),
            "counterparty": request.counterparty(),
            "destination_create": request.destination_create(),
            "selection_mode": request.selection_mode(),
            "selection_values": values,
        });

        let digest = Sha256::digest(canonical.to_string().as_bytes());
        Fingerprint(format!("{digest:x}"))
    }

    pub fn empty() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Short prefix for log lines.
    pub fn short(&self) -> &str {
        &self.0[..self.0.len().min(12)]
    }
}

impl fmt::Display for Fingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl Serialize for Fingerprint {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.0)
    }
}
