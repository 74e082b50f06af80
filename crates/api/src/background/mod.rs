//! Background tasks.
//!
//! Each submodule provides a long-running async function intended to be
//! spawned via `tokio::spawn` and awaited during shutdown.

pub mod report_writer;
