//! CLI command implementations.
//!
//! Each subcommand has its own module with argument definitions and handlers.
//!
//! # Command Modules
//!
//! - [`config`] - Configuration management (get, set, list, path)
//! - [`listen`] - Receive fixes from the UDP GPS source
//! - [`recording`] - Toggle the persisted recording request
//! - [`simulate`] - Drive a trail path with the simulator and navigate it

pub mod config;
pub mod listen;
pub mod recording;
pub mod simulate;
