//! Helper types used by the settlement executor and claim sender:
//!
//! - [`sig_down`] - Graceful shutdown signal handling

pub mod sig_down;

pub use sig_down::SigDown;
