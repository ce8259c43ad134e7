//! Core types for Parley.

pub mod turn;

pub use turn::*;
