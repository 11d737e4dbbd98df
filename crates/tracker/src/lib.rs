//! The tracker HTTP client: the one external collaborator the engine
//! writes to. Modeled as a trait so the engine depends on an interface,
//! not a concrete HTTP stack, with a `reqwest`-backed implementation and
//! an in-memory recording double for engine tests.

pub mod client;
pub mod recording;

pub use client::{ReqwestTrackerClient, TrackerClient};
pub use recording::{RecordedCall, RecordingTrackerClient};
