mod client;

pub use client::{BaserideClient, DEFAULT_BASE_URL};
