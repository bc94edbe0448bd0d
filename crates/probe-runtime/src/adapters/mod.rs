//! Adapters connecting the probe's outbound ports to the runtime.

pub mod observer;

pub use observer::TelemetryObserver;
