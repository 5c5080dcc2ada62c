//! Model Context Protocol wire types

pub mod jsonrpc;
pub mod lifecycle;
pub mod messages;

pub use jsonrpc::*;
pub use lifecycle::*;
pub use messages::*;
