use serde::{Deserialize, Serialize};
use serde_json::Value;
use shared::collection::CollectionRef;

// Request bodies for the management endpoints
#[derive(Debug, Serialize)]
pub(crate) struct FacetsRequest<'a> {
    pub source: &'a CollectionRef,
}

#[derive(Debug, Serialize)]
pub(crate) struct SourceTracksRequest<'a> {
    pub source: &'a CollectionRef,
    pub search: Option<&'a str>,
    pub limit: u32,
    pub offset: u32,
}

/// Error body. `detail` is a plain message, or a list of field errors on validation failures.
#[derive(Debug, Deserialize)]
pub(crate) struct ErrorBody {
    #[serde(default)]
    pub detail: Option<Value>,
}

impl ErrorBody {
    pub fn message(&self) -> Option<String> {
        match self.detail.as_ref()? {
            Value::String(s) if !s.trim().is_empty() => Some(s.clone()),
            Value::Array(items) => {
                let messages: Vec<&str> = items
                    .iter()
                    .filter_map(|item| item.get("msg").and_then(Value::as_str))
                    .collect();
                (!messages.is_empty()).then(|| messages.join("; "))
            }
            _ => None,
        }
    }
}
