//! Message transports

pub mod stdio;

pub use stdio::{LineTransport, StdioTransport};
