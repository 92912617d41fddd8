//! Discovery crate for the image-scout pipeline.
//!
//! This crate contains the configuration and the orchestrator that wires
//! aggregation, gating, signal assessment, content matching and ranking
//! into one call.

pub mod config;
pub mod orchestrator;

pub use config::{DiscoveryConfig, PipelineSettings};
pub use orchestrator::{DiscoveryOrchestrator, PipelineResult, placeholder_url};
