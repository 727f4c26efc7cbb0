//! Core domain types and logic.

pub mod bar;
pub mod config_validation;
pub mod engine;
pub mod error;
pub mod hunt;
pub mod indicator;
pub mod position;
pub mod rule;
pub mod rule_eval;
pub mod sizing;
pub mod strategy;
