//! Change-capture adapters.

pub mod pump;

pub use pump::{CapturePump, CapturePumpConfig};
