//! The tailing and projection engine: everything in §2-5 of the
//! specification that isn't a pure data shape (those live in
//! `ab_domain`) or the tracker wire client (`ab_tracker`).

pub mod cursor_store;
pub mod locator;
pub mod plan_reducer;
pub mod projector;
pub mod rate_limiter;
pub mod session_lock;
pub mod tailer;
pub mod tool_map;
pub mod watcher;
