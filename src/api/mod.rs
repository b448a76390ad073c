//! Matching API access.
//!
//! The matching service parses, scores and ranks resumes; this crate only
//! consumes its response.

pub mod client;

pub use client::{ClientOptions, MatchClient};
