//! Single-user to-do list library
//!
//! This module exports the core components for testing and integration.

pub mod api;
pub mod cli;
pub mod client;
pub mod config;
pub mod db;
pub mod error;
pub mod logging;
pub mod types;
pub mod ui;
pub mod web;
