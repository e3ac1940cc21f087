//! # Trellis Sync
//!
//! Keeps a local diagram model in step with a remote model authority.
//!
//! - [`ActionMessage`]: `{ clientId, action }` envelope
//! - [`TransportSink`]: fire-and-forget outgoing channel
//! - [`DiagramServer`]: dispatcher wired to the authority, with echo suppression,
//!   per-client filtering and the computed-bounds round trip
//!
//! ```rust,ignore
//! let (transport, mut outgoing) = ChannelTransport::channel(100);
//! let mut server = DiagramServer::new(DiagramServerConfig::load(".")?, Box::new(transport))?;
//!
//! server.request_model();
//! while let Ok(text) = outgoing.try_recv() {
//!     socket.send(text);
//! }
//! server.message_received(reply_text);
//! ```

mod config;
mod errors;
mod message;
mod server;
mod storage;
mod transport;

pub use config::{DiagramServerConfig, DEFAULT_CONFIG_NAME};
pub use errors::{SyncError, TransportError};
pub use message::{ActionMessage, InboundMessage};
pub use server::{DiagramServer, ModelSourceHandler};
pub use storage::{
    DirectoryExportSink, ExportSink, MemoryExportSink, MemoryStorage, ModelStorage,
    EXPORT_FILE_NAME,
};
pub use transport::{ChannelTransport, MemoryTransport, TransportSink};
