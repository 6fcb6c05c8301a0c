//! Command implementations

pub mod constraints;
pub mod inspect;
