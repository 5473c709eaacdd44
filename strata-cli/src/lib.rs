//! Strata CLI - Command-line interface for Strata schema migrations.
//!
//! This crate provides the `strata` tool: it snapshots a live schema kept in
//! a JSON file, diffs it against target snapshots, and applies hash-guarded
//! diffs or additive patches.

pub mod cli;
pub mod commands;
pub mod config;
pub mod error;
pub mod logging;
pub mod output;
pub mod store;
