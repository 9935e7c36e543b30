//! The built-in animation variants from the Mastermind-in-assembly writeup.
//!
//! Each module exposes its default option table and a constructor taking a
//! resolved [`crate::config::Config`]; the registry wires both up.

pub mod benchmark_chart;
pub mod elimination_loop;
pub mod entropy_reduction;
pub mod exact_match;
pub mod register_packing;
pub mod register_packing_detailed;
pub mod stack_overwrite;
