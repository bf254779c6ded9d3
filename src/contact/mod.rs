//! The message store behind the contact form.
//!
//! Messages are appended by the SCGI service ([`store::insert_message`]),
//! listed and counted by the command-line tools ([`print`]) and counted per
//! date window by the report engine ([`query::count_in_window`]). Every
//! operation works on an explicit [`rusqlite::Connection`] obtained from
//! [`crate::db`]; nothing is cached between calls.

pub mod print;
pub mod query;
pub mod store;
pub mod types;

pub use query::{count_in_window, count_messages, list_messages, MessageFilter};
pub use store::{insert_message, mark_read};
pub use types::{Message, NewMessage};
