//! # LAZY Sample App Library
//!
//! The application around the [`lazy_arbiter`] engine: it parses the textual
//! workload from standard input, feeds it to the engine and prints every event as a
//! colored line. This library exposes those pieces for integration testing.

pub mod console;
pub mod input;
pub mod lifecycle;
pub mod model;
