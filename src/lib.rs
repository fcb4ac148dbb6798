//! Pagepulse — a sales-triage backend for Facebook Page conversations.
//!
//! Fetches a Page's chat threads from the Graph API, normalizes them into
//! a typed conversation model (customer identity + subscription signal),
//! and asks a Gemini model for a per-conversation sales analysis.
//!
//! See `DESIGN.md` for architecture notes.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod analyzer;
pub mod config;
pub mod conversation;
pub mod fb;
pub mod logging;
pub mod server;
