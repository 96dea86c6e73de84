//! Retriage - duplicate detection for crowdsourced vulnerability reports
//!
//! Given a newly submitted report, retriage ranks previously indexed
//! reports by multi-signal similarity (title, description, proof-of-concept
//! code, URLs) and decides whether the new report is a re-submission of an
//! existing one. The corpus lives in memory for the lifetime of the
//! [`engine::Engine`] and is rebuilt from the system of record on restart.

pub mod cli;
pub mod cluster;
pub mod config;
pub mod detect;
pub mod engine;
pub mod error;
pub mod index;
pub mod preprocess;
pub mod similarity;

pub use error::{Result, RetriageError};
