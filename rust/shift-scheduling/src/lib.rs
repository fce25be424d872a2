//! Shift Scheduling
//!
//! Builds a mixed-integer model assigning employees to day, evening and night
//! shifts over a planning period, solves it through a pluggable backend and
//! relaxes the experience requirement step by step when the model is
//! infeasible. The extracted schedule comes with coverage, fairness and
//! per-employee statistics.

pub mod backend;
pub mod capacity;
pub mod config;
#[cfg(feature = "console")]
pub mod console;
pub mod constraints;
pub mod construction;
pub mod demo_data;
pub mod domain;
pub mod dto;
pub mod error;
pub mod model;
pub mod objective;
pub mod period;
pub mod preferences;
pub mod service;
pub mod solution;
pub mod solver;
pub mod store;
pub mod variables;
