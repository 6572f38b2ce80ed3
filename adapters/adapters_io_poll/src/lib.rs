//! Adapters Layer: I/O Readiness Polling
//!
//! Lets a non-blocking descriptor be driven with blocking-style calls.
//! An operation is attempted first; when the kernel answers `EWOULDBLOCK`
//! the caller parks in `poll(2)` until the descriptor becomes ready (or a
//! configured timeout expires) and the operation is retried.
//!
//! ## Overview
//!
//! - **[`PollDesc`]**: per-descriptor registration holding timeouts
//! - **[`Interest`]**: which readiness a caller is waiting for
//! - **[`PollConfig`]**: initial read/write timeouts
//!
//! Polling is level-triggered and stateless between waits, so concurrent
//! readers and writers on the same descriptor never steal each other's
//! wakeups.
//!
//! ## See Also
//!
//! - [`adapters_socket`](../adapters_socket/index.html): adopted network endpoints

pub mod poll_desc;

pub use poll_desc::{Interest, IoPollError, PollConfig, PollDesc};
