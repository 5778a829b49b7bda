mod client;
mod models;

pub use client::{VotunaClient, VotunaClientBuilder};
