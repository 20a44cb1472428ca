//! # InkCalc Client
//!
//! Async client for the external analysis service that recognises and
//! evaluates hand-drawn expressions.
//!
//! ## State machine
//!
//! ```text
//! Idle ──begin()──► Loading ──send()──► Idle (result | error)
//!                      │
//!                      └── begin() again ─► Busy (no request sent)
//! ```

#![forbid(unsafe_code)]
#![deny(missing_docs)]
#![deny(clippy::all)]
#![deny(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod client;

pub use client::{
    AnalysisClient, AnalysisError, InFlight, ServiceResult, ANALYZE_PATH,
    GENERIC_FAILURE_MESSAGE, GENERIC_SERVICE_MESSAGE, NO_RESULTS_MESSAGE,
};
