//! ccmeter - CLI around the ccmeter-core capture pipeline.
//!
//! The binary wires the pipeline together (session driver -> normalizer ->
//! parser -> reset calculator), renders the result, and optionally repeats
//! on an interval.

pub mod cli;
pub mod output;
pub mod pipeline;
pub mod watch;
