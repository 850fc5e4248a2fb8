use crate::audit::{AuditEntry, AuditEventType, AuditLogger};
use crate::config::{Config, ConfigError};
use crate::handler::{DasHandler, MAX_DATAGRAM_SIZE};
use crate::registry::{SessionRegistry, UnsupportedRegistry};
use crate::secret::SharedSecret;
use radius_proto::{DasAuthError, PacketError};
use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::sync::Arc;
use thiserror::Error;
use tokio::net::UdpSocket;
use tokio::runtime::Handle;
use tokio::task::JoinHandle;
use tracing::{error, info};

#[derive(Error, Debug)]
pub enum DasError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Packet error: {0}")]
    Packet(#[from] PacketError),
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),
    #[error("Invalid port: {0}")]
    InvalidPort(u16),
    #[error("Shared secret cannot be empty")]
    EmptySecret,
    #[error("Client address is required")]
    MissingClientAddress,
    #[error("No async runtime available")]
    NoReactor,
    #[error("Request from unknown client {0}")]
    UnknownClient(SocketAddr),
    #[error("Datagram of {0} bytes exceeds the receive limit")]
    OversizeDatagram(usize),
    #[error("Authentication failed: {0}")]
    Authentication(#[from] DasAuthError),
    #[error("Unsupported code {0}")]
    UnsupportedCode(u8),
}

/// Parameters for starting a [`DasServer`]
pub struct ServerConfig {
    /// Local address to bind
    pub bind_addr: IpAddr,
    /// UDP port (3799 per RFC 5176)
    pub port: u16,
    /// Shared secret with the Dynamic Authorization Client
    pub secret: SharedSecret,
    /// The only address requests are accepted from
    pub client_addr: Option<IpAddr>,
    /// What Disconnect and CoA requests act on
    pub registry: Arc<dyn SessionRegistry>,
    pub audit_logger: Arc<AuditLogger>,
}

impl ServerConfig {
    pub fn new(port: u16, secret: impl Into<Vec<u8>>, client_addr: Option<IpAddr>) -> Self {
        ServerConfig {
            bind_addr: IpAddr::V4(Ipv4Addr::UNSPECIFIED),
            port,
            secret: SharedSecret::new(secret),
            client_addr,
            registry: Arc::new(UnsupportedRegistry),
            audit_logger: Arc::new(AuditLogger::disabled()),
        }
    }

    pub fn with_registry(mut self, registry: Arc<dyn SessionRegistry>) -> Self {
        self.registry = registry;
        self
    }

    pub fn with_bind_address(mut self, bind_addr: IpAddr) -> Self {
        self.bind_addr = bind_addr;
        self
    }

    pub fn with_audit_logger(mut self, audit_logger: Arc<AuditLogger>) -> Self {
        self.audit_logger = audit_logger;
        self
    }

    /// Build server parameters from a configuration file
    pub fn from_config(config: &Config) -> Result<Self, DasError> {
        config.validate()?;
        let bind_addr = config.socket_addr()?.ip();
        let audit_logger = Arc::new(AuditLogger::new(config.audit_log_path.clone())?);

        Ok(ServerConfig::new(
            config.listen_port,
            config.secret.as_bytes(),
            config.client_ip()?,
        )
        .with_bind_address(bind_addr)
        .with_audit_logger(audit_logger))
    }
}

/// A running Dynamic Authorization Server
///
/// Created by [`DasServer::init`] and stopped by [`DasServer::deinit`].
/// Only `deinit` releases the port before returning. Dropping the server
/// aborts the receive task, and the socket is closed once the runtime next
/// polls that task.
pub struct DasServer {
    local_addr: SocketAddr,
    task: Option<JoinHandle<()>>,
    audit_logger: Arc<AuditLogger>,
}

impl DasServer {
    /// Validate the parameters, bind the UDP socket and register it with the
    /// current Tokio runtime
    ///
    /// Must be called from within a runtime context. Nothing is bound if the
    /// parameters are rejected.
    pub fn init(config: ServerConfig) -> Result<Self, DasError> {
        if config.port == 0 {
            return Err(DasError::InvalidPort(config.port));
        }
        if config.secret.is_empty() {
            return Err(DasError::EmptySecret);
        }
        let client_addr = config.client_addr.ok_or(DasError::MissingClientAddress)?;
        let runtime = Handle::try_current().map_err(|_| DasError::NoReactor)?;

        let std_socket = std::net::UdpSocket::bind(SocketAddr::new(config.bind_addr, config.port))?;
        std_socket.set_nonblocking(true)?;
        let socket = {
            let _guard = runtime.enter();
            UdpSocket::from_std(std_socket)?
        };
        let local_addr = socket.local_addr()?;

        let handler = DasHandler::new(
            config.secret,
            client_addr,
            config.registry,
            Arc::clone(&config.audit_logger),
        );

        info!(
            listen_addr = %local_addr,
            client_addr = %client_addr,
            "Dynamic Authorization Server listening"
        );

        let task = runtime.spawn(receive_loop(
            socket,
            handler,
            Arc::clone(&config.audit_logger),
        ));

        Ok(DasServer {
            local_addr,
            task: Some(task),
            audit_logger: config.audit_logger,
        })
    }

    /// Address the server is bound to
    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    /// Stop receiving, close the socket and release the secret
    pub async fn deinit(mut self) {
        if let Some(task) = self.task.take() {
            task.abort();
            // Cancellation is the expected outcome
            let _ = task.await;
        }

        self.audit_logger
            .log(
                AuditEntry::new(AuditEventType::ServerStop)
                    .with_details(self.local_addr.to_string()),
            )
            .await;
        info!(listen_addr = %self.local_addr, "Dynamic Authorization Server stopped");
    }
}

impl Drop for DasServer {
    fn drop(&mut self) {
        if let Some(task) = self.task.take() {
            task.abort();
        }
    }
}

async fn receive_loop(socket: UdpSocket, handler: DasHandler, audit_logger: Arc<AuditLogger>) {
    audit_logger
        .log(
            AuditEntry::new(AuditEventType::ServerStart)
                .with_details(format!("client {}", handler.client_addr())),
        )
        .await;

    // One spare byte so an oversize datagram is seen as such instead of truncated
    let mut buf = vec![0u8; MAX_DATAGRAM_SIZE + 1];

    loop {
        let (len, addr) = match socket.recv_from(&mut buf).await {
            Ok(received) => received,
            Err(e) => {
                error!(error = %e, "recvfrom[das] failed");
                continue;
            }
        };

        // Rejected datagrams are logged by the handler
        if let Ok(reply) = handler.handle_datagram(&buf[..len], addr).await {
            if let Err(e) = socket.send_to(&reply, addr).await {
                error!(client_addr = %addr, error = %e, "sendto[das] failed");
            }
        }
    }
}
