#![allow(dead_code)]
//! Shared test utilities for integration tests.
//!
//! - `fixtures`: hand-built units with known behavior
//! - `assertions`: helpers over execution logs

pub mod assertions;
pub mod fixtures;

pub use assertions::{outcome_of, records_named, text_lines};
pub use fixtures::{
    adder_unit, greet_counter_unit, hanging_unit, lazy_unit, raising_unit, two_paths_unit,
    zero_param_unit, CallCounter,
};
