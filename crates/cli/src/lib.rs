//! `agent-bridge`'s command-line surface: subcommands, config loading,
//! and the diagnostic `doctor` check. The watch loop itself lives in
//! `ab_engine`; this crate is the thin process entry point around it.

pub mod cli;
