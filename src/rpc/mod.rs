//! RPC export surface.
//!
//! Bridges other execution contexts to the capture store through a small
//! JSON message protocol.
//!
//! # Exported Operations
//!
//! | Operation | Signature |
//! |-----------|-----------|
//! | `listCaptures` | `(tabId) -> [{id, meta}]` |
//! | `downloadCapture` | `(tabId, recordId) -> null` (side-effecting) |
//!
//! # Modules
//!
//! | Module | Description |
//! |--------|-------------|
//! | `message` | Request and response wire types |
//! | `dispatcher` | Closed operation set and execution |
//! | `server` | WebSocket endpoint |

// ============================================================================
// Submodules
// ============================================================================

mod dispatcher;
mod message;
mod server;

// ============================================================================
// Re-exports
// ============================================================================

pub use dispatcher::{Dispatcher, OperationCall};
pub use message::{RpcRequest, RpcResponse, ResponseType};
pub use server::RpcServer;
