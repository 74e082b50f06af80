//! Domain core for the CSP report event store.
//!
//! Holds the report types, wire decoding, the versioned validation rule
//! sets, and the [`store::ReportStore`] seam that persistence backends
//! implement. Nothing in this crate performs network I/O.

pub mod error;
pub mod report;
pub mod store;
pub mod types;
pub mod validation;
