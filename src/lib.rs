//! # Burn NER
#![forbid(unsafe_code)]

/// Training configuration
pub mod config;

/// Models
pub mod models;

/// Pipelines
pub mod pipelines;

/// Datasets
pub mod datasets;

/// Utilities
pub mod utils;

/// Error macros
#[macro_use]
extern crate anyhow;

#[macro_use]
extern crate log;
