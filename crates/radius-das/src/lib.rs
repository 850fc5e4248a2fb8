//! RADIUS Dynamic Authorization Server
//!
//! Listens for RFC 5176 Disconnect-Request and CoA-Request packets from a
//! single trusted Dynamic Authorization Client, authenticates them with the
//! shared secret and answers with a signed ACK or NAK. Built on top of the
//! `radius-proto` codec.
//!
//! What a request does to a user session is up to the [`SessionRegistry`].
//! The default [`UnsupportedRegistry`] refuses everything with Error-Cause
//! Unsupported Service (405).
//!
//! # Example
//!
//! ```rust,no_run
//! use radius_das::{DasServer, ServerConfig};
//!
//! #[tokio::main(flavor = "current_thread")]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = ServerConfig::new(3799, "testing123", Some("192.168.1.10".parse()?));
//!     let server = DasServer::init(config)?;
//!
//!     tokio::signal::ctrl_c().await?;
//!     server.deinit().await;
//!
//!     Ok(())
//! }
//! ```

pub mod audit;
pub mod config;
pub mod handler;
pub mod registry;
pub mod secret;
pub mod server;

pub use audit::{AuditEntry, AuditEventType, AuditLogger};
pub use config::{Config, ConfigError};
pub use handler::{DasHandler, MAX_DATAGRAM_SIZE};
pub use registry::{
    DasOutcome, DasSession, SessionRegistry, SessionSelector, SimpleSessionRegistry,
    UnsupportedRegistry,
};
pub use secret::SharedSecret;
pub use server::{DasError, DasServer, ServerConfig};
