//! Datadog-specific Protocol Buffers definitions.
//!
//! This crate contains generated code based on the Protocol Buffers definitions used by Datadog tracers and the Datadog
//! Agent to ship DDSketch-encoded latency distributions, such as the `okSummary` and `errorSummary` fields of APM
//! statistics payloads.
#![deny(warnings)]
#![allow(clippy::enum_variant_names)]
mod include {
    include!(concat!(env!("OUT_DIR"), "/protos/mod.rs"));
}

/// Sketch-related definitions.
pub mod sketches {
    pub use super::include::ddsketch::*;
}
