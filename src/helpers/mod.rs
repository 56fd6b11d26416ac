//! Low-level helpers for reading `.xlsx` packages.

pub(crate) mod reader;
pub mod xml;
pub(crate) mod zip;
