// Public modules
pub mod chat;
pub mod client;
pub mod error;
pub mod generator;
pub mod observability;
pub mod persona;
pub mod types;

// Re-exports
pub use chat::{PlainTextRenderer, Renderer};
pub use client::Gemini;
pub use error::{Error, Result};
pub use generator::{GenerateRequest, Generation, ReplyText, TextGenerator};
pub use observability::register_biometrics;
pub use types::*;
