//! slack-bridge composition root.
//!
//! The binary in `main.rs` is a thin clap front-end over [`app`].

pub mod app;
pub mod output;
