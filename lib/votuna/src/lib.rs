pub mod browser;
pub mod cache;
pub mod config;
pub mod counterparty;
pub mod error;
pub mod execution;
pub mod facets;
pub mod fingerprint;
pub mod management;
pub mod panel;
pub mod request;
pub mod review;
pub mod selection;
pub mod services;
pub mod traits;

pub use config::{ClientConfig, PanelConfig};
pub use error::{Result, TransferError};
pub use management::{VotunaClient, VotunaClientBuilder};
pub use panel::{PanelCommand, PanelHandle, PanelSnapshot, TransferPanel};
pub use services::{Services, ServicesBuilder};
pub use traits::{CacheKey, CollectionCache, TransferBackend};
