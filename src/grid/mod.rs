// src/grid/mod.rs
pub mod models;
pub mod reader;

pub use models::{Cell, RawGrid};
