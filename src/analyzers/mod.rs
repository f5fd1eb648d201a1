//! Cleaning, aggregation and reporting of quiz-response statistics.
//!
//! This module derives the combined wrong-answer metrics, drops
//! under-attempted and bogus rows, projects the reporting columns, and
//! batch-cleans whole directories of course exports.

pub mod aggregate;
pub mod analyzer;
pub mod distribution;
pub mod filter;
pub mod summary;
pub mod types;
pub mod utility;
