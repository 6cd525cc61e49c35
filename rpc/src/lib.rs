//! JSON HTTP API for the agora governance node.
//!
//! Every mutating route reads the caller from the `x-agora-caller` header;
//! the host in front of this server is responsible for authenticating it.

pub mod error;
pub mod handlers;
pub mod pagination;
pub mod server;

pub use error::{RpcError, CALLER_HEADER};
pub use server::{router, AppState, RpcServer};
