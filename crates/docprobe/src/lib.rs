//! `docprobe` crate (library surface).
//!
//! The primary entrypoint for end users is the `docprobe` binary. This module re-exports the
//! core types and the local implementations so embedders don't depend on internal crate layout.

pub use docprobe_core as core;
pub use docprobe_local as local;

pub use docprobe_core::{
    DocumentProbeResult, IdStructureReport, ProbeConfig, Strategy, SweepReport, UniquenessReport,
};
pub use docprobe_local::{ContentNormalizer, IdMutationEngine, ProbeRunner};
