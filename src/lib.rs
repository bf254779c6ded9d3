//! Companion tools for a [Molly Brown](https://tildegit.org/solderpunk/molly-brown)
//! Gemini capsule.
//!
//! Two engines share one SQLite message store:
//!
//! - **Contact service**: an SCGI application on a Unix socket. The capsule
//!   server forwards visitor requests to it; visitor input is stored as a
//!   message and acknowledged with a Gemini response.
//! - **Report engine**: a one-shot job that parses the server's access and
//!   error logs and combines them with message counts into a plain-text
//!   activity summary for a date window.
//!
//! # Modules
//!
//! - [`config`]: Configuration loading from TOML files and environment variables
//! - [`db`]: SQLite store creation, schema versioning and migrations
//! - [`contact`]: Message store operations and message listings
//! - [`scgi`]: SCGI framing, request dispatch and the socket service
//! - [`gemini`]: Gemini status codes and responses
//! - [`logstats`]: Lazy parsers for access and error logs
//! - [`report`]: Aggregation and rendering of the activity report
//! - [`window`]: Inclusive calendar-day date windows
//! - [`error`]: Error types

pub mod config;
pub mod contact;
pub mod db;
pub mod error;
pub mod gemini;
pub mod logstats;
pub mod report;
pub mod scgi;
pub mod window;
