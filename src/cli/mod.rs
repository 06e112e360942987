//! Command line interface

pub mod commands;
pub mod config;
pub mod observability;
pub mod render;
