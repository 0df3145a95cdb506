//! Request handler module
//!
//! Routes requests to the transcode endpoint or the health probes.

pub mod router;
pub mod transcode;

// Re-export main entry point
pub use router::handle_request;
