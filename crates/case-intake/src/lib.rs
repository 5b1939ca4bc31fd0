//! Scoring and attorney routing for legal case intake conversations.

pub mod config;
pub mod error;
pub mod intake;
pub mod telemetry;
