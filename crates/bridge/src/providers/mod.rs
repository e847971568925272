//! Model provider backends.

mod openai;

pub use openai::{ResponsesBackend, ResponsesBackendBuilder};
