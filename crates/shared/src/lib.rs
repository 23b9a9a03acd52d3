//! Domain and wire types shared by the conversion client crates.

pub mod domain;
pub mod error;
pub mod protocol;
