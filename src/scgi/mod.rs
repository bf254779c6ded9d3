//! SCGI front end for the contact form.
//!
//! The capsule server forwards each visitor request over a Unix socket as an
//! SCGI request. [`framing`] reads it, [`handler`] stores the visitor's
//! message and answers with a Gemini response, and [`server`] runs the accept
//! loop with bounded concurrency and graceful shutdown.

pub mod framing;
pub mod handler;
pub mod request;
pub mod server;

pub use framing::{encode_request, read_request, FrameLimits};
pub use handler::ContactService;
pub use request::ScgiRequest;
