//! Integration test crate for Viewfinder.
//!
//! This crate exists solely to hold cross-crate integration tests.
//! It depends on multiple viewfinder crates to verify they work together.

#[cfg(test)]
mod grading;

#[cfg(test)]
mod framing;

#[cfg(test)]
mod render;
