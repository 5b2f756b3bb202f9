//! Channel simulation helpers

pub mod noise;
