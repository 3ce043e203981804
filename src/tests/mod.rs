// Crate-level test modules

pub mod common;
