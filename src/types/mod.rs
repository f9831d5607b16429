//! # Types Module
//!
//! Core data types shared by the drivers, the streaming pipeline and the response
//! service.
//!
//! ## Key Types
//!
//! | Type | Description |
//! |------|-------------|
//! | [`Message`] | One turn of a chat session (role + text) |
//! | [`MessageRole`] | Who produced the turn (`user` or `model`) |
//! | [`StreamingEvent`] | One decoded chunk of a streamed provider reply |
//! | [`Response`] | Generated text plus request timing |
//!
//! ## Example
//!
//! ```rust
//! use promptme::types::{Message, MessageRole};
//!
//! let turn = Message::user("What skills should a data analyst learn?");
//! assert!(matches!(turn.role, MessageRole::User));
//! ```

pub mod events;
pub mod message;
pub mod response;

pub use events::StreamingEvent;
pub use message::{Message, MessageRole};
pub use response::Response;
