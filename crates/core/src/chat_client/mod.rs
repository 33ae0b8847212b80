//! Messaging client abstraction.
//!
//! This module provides a `ChatClient` trait covering what the uploader needs
//! from a remote messaging service: session authorization, chat lookup, video
//! submission and a stream of file-update notifications.

mod bot_api;
mod types;
mod updates;

pub use bot_api::BotApiClient;
pub use types::*;
pub use updates::{FileUpdateHub, FileUpdateReceiver};
