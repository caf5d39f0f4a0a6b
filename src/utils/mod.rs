// Utility functions

pub mod logger;

pub use logger::*;
