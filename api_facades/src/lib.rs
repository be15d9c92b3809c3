//! API Facades Layer
//!
//! Provides the C-callable surface for TCP client sockets. These facades keep
//! flat C signatures: integer identifiers, raw byte buffers and three `int`
//! out-parameters per call.
//!
//! All facades call underlying Rust modules from inner layers.

pub mod common_facades;
pub mod context_facades;
pub mod socket_facades;

// Re-export main facade functions
pub use context_facades::*;
pub use socket_facades::*;
