//! Audit logging for Dynamic Authorization events
//!
//! Writes one JSON object per line for every security-relevant decision the
//! server makes: dropped datagrams and the ACK/NAK sent for each request.

use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::fs::OpenOptions;
use std::io::Write;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::error;

/// Audit event type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AuditEventType {
    /// Datagram from an address other than the configured client
    UnknownClient,
    /// Datagram that could not be decoded
    MalformedPacket,
    /// Request Authenticator or Message-Authenticator mismatch
    InvalidAuthenticator,
    /// Authenticated request with a code the server does not handle
    UnsupportedCode,
    DisconnectAck,
    DisconnectNak,
    CoaAck,
    CoaNak,
    ServerStart,
    ServerStop,
}

/// Audit log entry
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuditEntry {
    /// Timestamp (Unix epoch seconds)
    pub timestamp: i64,
    /// ISO 8601 formatted timestamp
    pub timestamp_iso: String,
    pub event_type: AuditEventType,
    /// Sender address and port
    #[serde(skip_serializing_if = "Option::is_none")]
    pub client_addr: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub request_id: Option<u8>,
    /// RADIUS code of the request
    #[serde(skip_serializing_if = "Option::is_none")]
    pub code: Option<u8>,
    /// Error-Cause sent with a NAK
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_cause: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
    pub server_version: String,
}

impl AuditEntry {
    pub fn new(event_type: AuditEventType) -> Self {
        let now = Utc::now();

        AuditEntry {
            timestamp: now.timestamp(),
            timestamp_iso: now.format("%Y-%m-%dT%H:%M:%SZ").to_string(),
            event_type,
            client_addr: None,
            request_id: None,
            code: None,
            error_cause: None,
            details: None,
            server_version: env!("CARGO_PKG_VERSION").to_string(),
        }
    }

    pub fn with_client_addr(mut self, addr: SocketAddr) -> Self {
        self.client_addr = Some(addr.to_string());
        self
    }

    pub fn with_request_id(mut self, id: u8) -> Self {
        self.request_id = Some(id);
        self
    }

    pub fn with_code(mut self, code: u8) -> Self {
        self.code = Some(code);
        self
    }

    pub fn with_error_cause(mut self, cause: u32) -> Self {
        self.error_cause = Some(cause);
        self
    }

    pub fn with_details(mut self, details: impl Into<String>) -> Self {
        self.details = Some(details.into());
        self
    }
}

/// Audit logger
pub struct AuditLogger {
    file_path: Option<String>,
    file: Option<Arc<Mutex<std::fs::File>>>,
}

impl AuditLogger {
    /// Create a new audit logger appending to `file_path`, if given
    pub fn new(file_path: Option<String>) -> std::io::Result<Self> {
        let file = match file_path {
            Some(ref path) => {
                let f = OpenOptions::new().create(true).append(true).open(path)?;
                Some(Arc::new(Mutex::new(f)))
            }
            None => None,
        };

        Ok(AuditLogger { file_path, file })
    }

    /// Logger that drops every entry
    pub fn disabled() -> Self {
        AuditLogger {
            file_path: None,
            file: None,
        }
    }

    /// Log an audit entry
    pub async fn log(&self, entry: AuditEntry) {
        let Some(ref file) = self.file else {
            return;
        };

        match serde_json::to_string(&entry) {
            Ok(json) => {
                let mut f = file.lock().await;
                if let Err(e) = writeln!(f, "{}", json) {
                    error!("Failed to write audit log: {}", e);
                }
            }
            Err(e) => {
                error!("Failed to serialize audit entry: {}", e);
            }
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.file.is_some()
    }

    pub fn file_path(&self) -> Option<&str> {
        self.file_path.as_deref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::NamedTempFile;

    #[test]
    fn test_audit_entry_creation() {
        let entry = AuditEntry::new(AuditEventType::DisconnectNak)
            .with_client_addr("192.168.1.1:3799".parse().unwrap())
            .with_request_id(7)
            .with_code(40)
            .with_error_cause(405);

        assert_eq!(entry.client_addr.as_deref(), Some("192.168.1.1:3799"));
        assert_eq!(entry.request_id, Some(7));
        assert_eq!(entry.error_cause, Some(405));
    }

    #[test]
    fn test_audit_entry_serialization() {
        let entry = AuditEntry::new(AuditEventType::InvalidAuthenticator)
            .with_client_addr("10.0.0.1:1700".parse().unwrap())
            .with_details("Invalid Request Authenticator");

        let json = serde_json::to_string(&entry).unwrap();
        assert!(json.contains("invalid_authenticator"));
        assert!(json.contains("10.0.0.1:1700"));
        assert!(!json.contains("error_cause"));
    }

    #[tokio::test]
    async fn test_audit_logger() {
        let temp_file = NamedTempFile::new().unwrap();
        let path = temp_file.path().to_str().unwrap().to_string();

        let logger = AuditLogger::new(Some(path.clone())).unwrap();
        assert!(logger.is_enabled());
        assert_eq!(logger.file_path(), Some(path.as_str()));

        logger
            .log(AuditEntry::new(AuditEventType::CoaAck).with_request_id(3))
            .await;
        logger
            .log(AuditEntry::new(AuditEventType::UnknownClient))
            .await;

        let contents = fs::read_to_string(&path).unwrap();
        let lines: Vec<&str> = contents.lines().collect();
        assert_eq!(lines.len(), 2);
        assert!(lines[0].contains("coa_ack"));
        assert!(lines[1].contains("unknown_client"));
    }

    #[tokio::test]
    async fn test_audit_logger_disabled() {
        let logger = AuditLogger::disabled();
        assert!(!logger.is_enabled());
        // No-op, must not panic
        logger.log(AuditEntry::new(AuditEventType::ServerStart)).await;
    }
}
