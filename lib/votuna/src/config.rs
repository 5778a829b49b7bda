//! Centralized configuration.
//!
//! Environment variables are read once through this module instead of through scattered
//! `env::var()` calls. Bad values are reported as errors at startup.

use std::time::Duration;

use crate::browser::DEFAULT_PAGE_SIZE;
use crate::error::{Result, TransferError};
use crate::review::DEFAULT_DEBOUNCE;

/// Tuning for one transfer panel.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PanelConfig {
    /// Quiet period before a preview call fires (default: 400ms)
    pub debounce: Duration,
    /// Source songs per page in the item browser (default: 10)
    pub source_page_size: u32,
    /// Maximum results for a provider playlist search (default: 10)
    pub search_limit: u32,
    /// Capacity of the panel command queue (default: 64)
    pub command_buffer: usize,
}

impl Default for PanelConfig {
    fn default() -> Self {
        Self {
            debounce: DEFAULT_DEBOUNCE,
            source_page_size: DEFAULT_PAGE_SIZE,
            search_limit: 10,
            command_buffer: 64,
        }
    }
}

impl PanelConfig {
    /// Load from `VOTUNA_PREVIEW_DEBOUNCE_MS`, `VOTUNA_SOURCE_PAGE_SIZE` and
    /// `VOTUNA_SEARCH_LIMIT`, falling back to defaults when unset.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let defaults = Self::default();
        let debounce_ms = parse(
            &lookup,
            "VOTUNA_PREVIEW_DEBOUNCE_MS",
            defaults.debounce.as_millis() as u64,
        )?;
        let source_page_size = parse(&lookup, "VOTUNA_SOURCE_PAGE_SIZE", defaults.source_page_size)?;
        if source_page_size == 0 {
            return Err(TransferError::Config(
                "VOTUNA_SOURCE_PAGE_SIZE must be at least 1".to_string(),
            ));
        }
        let search_limit = parse(&lookup, "VOTUNA_SEARCH_LIMIT", defaults.search_limit)?;

        Ok(Self {
            debounce: Duration::from_millis(debounce_ms),
            source_page_size,
            search_limit,
            ..defaults
        })
    }
}

/// Connection settings for the management API.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientConfig {
    /// API base URL (default: "http://localhost:8000")
    pub base_url: String,
    /// Bearer token sent with every request, if any
    pub api_token: Option<String>,
    /// Per-request timeout (default: 15s)
    pub request_timeout: Duration,
}

impl ClientConfig {
    /// Load from `VOTUNA_API_URL`, `VOTUNA_API_TOKEN` and `VOTUNA_REQUEST_TIMEOUT_SECS`.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let base_url = lookup("VOTUNA_API_URL")
            .filter(|url| !url.trim().is_empty())
            .unwrap_or_else(|| "http://localhost:8000".to_string());
        let api_token = lookup("VOTUNA_API_TOKEN").filter(|token| !token.trim().is_empty());
        let timeout_secs = parse(&lookup, "VOTUNA_REQUEST_TIMEOUT_SECS", 15u64)?;

        Ok(Self {
            base_url,
            api_token,
            request_timeout: Duration::from_secs(timeout_secs),
        })
    }
}

fn parse<T: std::str::FromStr>(
    lookup: &impl Fn(&str) -> Option<String>,
    key: &str,
    default: T,
) -> Result<T> {
    match lookup(key) {
        None => Ok(default),
        Some(raw) => raw
            .trim()
            .parse()
            .map_err(|_| TransferError::Config(format!("{key} has an invalid value: {raw:?}"))),
    }
}
