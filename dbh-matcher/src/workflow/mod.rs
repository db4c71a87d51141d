//! Batch conversion workflow
//!
//! A conversion request resolves its tracks one at a time, in input order,
//! streaming a progress event per track. Concurrent requests share the
//! resolver (and with it the rate limiters and registry).

pub mod conversion;

pub use conversion::{run_conversion, ConversionEvent, ConversionOutcome, ConversionSummary};
