//! umon: a live CPU, memory, disk and network monitor for the terminal with
//! optional CSV logging.
//!
//! This library exposes the core modules for use by the binary and by tests.

pub mod app;
pub mod collectors;
pub mod config;
pub mod controller;
pub mod csvlog;
pub mod engine;
pub mod layout;
pub mod model;
pub mod view;
