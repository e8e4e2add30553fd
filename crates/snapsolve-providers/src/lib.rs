//! Vision LLM provider layer for SnapSolve.
//!
//! # Architecture
//!
//! - [`traits::ProviderAdapter`] — per-vendor request builder + response extractor
//! - [`traits::VisionProvider`] — a credentialed client that turns (instruction, images) into text
//! - [`registry`] — static specs for the three supported providers + API-key checks
//! - [`openai`], [`gemini`], [`anthropic`] — one adapter per vendor wire protocol
//! - [`extract`] — envelope-independent text cleanup (wrapper fences, emptiness)
//! - [`http_provider::HttpVisionProvider`] — the reqwest-backed client
//! - [`clients::ClientRegistry`] — owns the single live client for the active provider

pub mod anthropic;
pub mod clients;
pub mod extract;
pub mod gemini;
pub mod http_provider;
pub mod openai;
pub mod registry;
pub mod traits;

// Re-export main types for convenience
pub use clients::{ClientFactory, ClientRegistry, HttpClientFactory};
pub use http_provider::HttpVisionProvider;
pub use registry::{adapter_for, spec_for, ProviderSpec, PROVIDERS};
pub use traits::{Endpoint, ProviderAdapter, ProviderRequest, VisionProvider};
