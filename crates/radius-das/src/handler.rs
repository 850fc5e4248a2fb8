//! Per-datagram processing
//!
//! One datagram goes through, in order: origin check, size check, decode,
//! authenticator check, dispatch by code, reply signing. Any gate that fails
//! returns a [`DasError`] and no reply is produced.

use crate::audit::{AuditEntry, AuditEventType, AuditLogger};
use crate::registry::{authorization_changes, DasOutcome, SessionRegistry, SessionSelector};
use crate::secret::SharedSecret;
use crate::server::DasError;
use radius_proto::das::{finish_das_response, verify_das_request};
use radius_proto::{AttributeType, Code, Packet};
use std::net::{IpAddr, SocketAddr};
use std::sync::Arc;
use tracing::{debug, error, info, warn};

/// Largest datagram the listener accepts
pub const MAX_DATAGRAM_SIZE: usize = 1500;

/// Validates, dispatches and answers Disconnect/CoA requests
pub struct DasHandler {
    secret: SharedSecret,
    client_addr: IpAddr,
    registry: Arc<dyn SessionRegistry>,
    audit_logger: Arc<AuditLogger>,
}

impl DasHandler {
    pub fn new(
        secret: SharedSecret,
        client_addr: IpAddr,
        registry: Arc<dyn SessionRegistry>,
        audit_logger: Arc<AuditLogger>,
    ) -> Self {
        DasHandler {
            secret,
            client_addr,
            registry,
            audit_logger,
        }
    }

    /// The only address requests are accepted from
    pub fn client_addr(&self) -> IpAddr {
        self.client_addr
    }

    /// Exact address match; the source port is not checked
    pub fn is_authorized_origin(&self, source_ip: IpAddr) -> bool {
        source_ip.to_canonical() == self.client_addr.to_canonical()
    }

    /// Process one datagram and return the signed reply bytes to send back
    ///
    /// Every rejection is logged here; callers only need to skip the reply.
    pub async fn handle_datagram(&self, data: &[u8], from: SocketAddr) -> Result<Vec<u8>, DasError> {
        if !self.is_authorized_origin(from.ip()) {
            debug!(client_addr = %from, "Drop message from unknown client");
            self.audit_logger
                .log(AuditEntry::new(AuditEventType::UnknownClient).with_client_addr(from))
                .await;
            return Err(DasError::UnknownClient(from));
        }

        if data.len() > MAX_DATAGRAM_SIZE {
            warn!(
                client_addr = %from,
                len = data.len(),
                "Dropped oversize datagram"
            );
            self.audit_logger
                .log(
                    AuditEntry::new(AuditEventType::MalformedPacket)
                        .with_client_addr(from)
                        .with_details(format!("oversize datagram ({} bytes)", data.len())),
                )
                .await;
            return Err(DasError::OversizeDatagram(data.len()));
        }

        let request = match Packet::decode(data) {
            Ok(packet) => packet,
            Err(e) => {
                debug!(client_addr = %from, error = %e, "Parsing incoming RADIUS packet failed");
                self.audit_logger
                    .log(
                        AuditEntry::new(AuditEventType::MalformedPacket)
                            .with_client_addr(from)
                            .with_details(e.to_string()),
                    )
                    .await;
                return Err(e.into());
            }
        };

        if let Err(e) = verify_das_request(&request, self.secret.as_bytes()) {
            warn!(
                client_addr = %from,
                request_id = request.identifier,
                error = %e,
                "Invalid authenticator in DAS request - drop"
            );
            self.audit_logger
                .log(
                    AuditEntry::new(AuditEventType::InvalidAuthenticator)
                        .with_client_addr(from)
                        .with_request_id(request.identifier)
                        .with_code(request.code.as_u8())
                        .with_details(e.to_string()),
                )
                .await;
            return Err(e.into());
        }

        debug!(
            packet_type = ?request.code,
            client_addr = %from,
            request_id = request.identifier,
            attributes = request.attributes.len(),
            "Received DAS request"
        );

        let mut reply = self.dispatch(&request, from).await?;

        if let Err(e) =
            finish_das_response(&mut reply.packet, self.secret.as_bytes(), &request.authenticator)
        {
            // The reply still goes out; a conforming client will discard it
            warn!(
                client_addr = %from,
                request_id = request.identifier,
                error = %e,
                "Failed to add Message-Authenticator attribute"
            );
        }

        let bytes = match reply.packet.encode() {
            Ok(bytes) => bytes,
            Err(e) => {
                error!(
                    client_addr = %from,
                    request_id = request.identifier,
                    error = %e,
                    "Failed to encode DAS reply"
                );
                return Err(e.into());
            }
        };

        self.audit_reply(&request, from, &reply).await;
        Ok(bytes)
    }

    /// Route an authenticated request to the registry and build the unsigned reply
    async fn dispatch(&self, request: &Packet, from: SocketAddr) -> Result<DasReply, DasError> {
        let selector = SessionSelector::from_packet(request);

        let (outcome, (ack, ack_event), (nak, nak_event)) = match request.code {
            Code::DisconnectRequest => {
                let outcome = match selector {
                    Ok(ref selector) => self.registry.disconnect(selector),
                    Err(cause) => self.registry.reject_malformed(cause),
                };
                (
                    outcome,
                    (Code::DisconnectAck, AuditEventType::DisconnectAck),
                    (Code::DisconnectNak, AuditEventType::DisconnectNak),
                )
            }
            Code::CoaRequest => {
                let outcome = match selector {
                    Ok(ref selector) => self
                        .registry
                        .change_authorization(selector, &authorization_changes(request)),
                    Err(cause) => self.registry.reject_malformed(cause),
                };
                (
                    outcome,
                    (Code::CoaAck, AuditEventType::CoaAck),
                    (Code::CoaNak, AuditEventType::CoaNak),
                )
            }
            Code::DisconnectAck
            | Code::DisconnectNak
            | Code::CoaAck
            | Code::CoaNak
            | Code::Unknown(_) => {
                debug!(
                    code = request.code.as_u8(),
                    client_addr = %from,
                    request_id = request.identifier,
                    "Unexpected RADIUS code in DAS packet"
                );
                self.audit_logger
                    .log(
                        AuditEntry::new(AuditEventType::UnsupportedCode)
                            .with_client_addr(from)
                            .with_request_id(request.identifier)
                            .with_code(request.code.as_u8()),
                    )
                    .await;
                return Err(DasError::UnsupportedCode(request.code.as_u8()));
            }
        };

        let (mut packet, event_type) = match outcome {
            DasOutcome::Ack => (Packet::new(ack, request.identifier, [0u8; 16]), ack_event),
            DasOutcome::Nak(cause) => {
                let mut packet = Packet::new(nak, request.identifier, [0u8; 16]);
                packet.add_attribute(cause.to_attribute()?);
                (packet, nak_event)
            }
        };

        // RFC 5176 Section 3: Proxy-State is echoed unmodified and in order
        for attr in request.find_all_attributes(AttributeType::ProxyState as u8) {
            packet.add_attribute(attr.clone());
        }

        Ok(DasReply {
            packet,
            outcome,
            event_type,
        })
    }

    async fn audit_reply(&self, request: &Packet, from: SocketAddr, reply: &DasReply) {
        let mut entry = AuditEntry::new(reply.event_type)
            .with_client_addr(from)
            .with_request_id(request.identifier)
            .with_code(request.code.as_u8());

        match reply.outcome {
            DasOutcome::Ack => {
                info!(
                    client_addr = %from,
                    request_id = request.identifier,
                    response_type = ?reply.packet.code,
                    "DAS request acknowledged"
                );
            }
            DasOutcome::Nak(cause) => {
                info!(
                    client_addr = %from,
                    request_id = request.identifier,
                    response_type = ?reply.packet.code,
                    error_cause = cause.as_u32(),
                    "DAS request rejected"
                );
                entry = entry.with_error_cause(cause.as_u32());
            }
        }

        self.audit_logger.log(entry).await;
    }
}

/// An ACK or NAK ready for signing, with the audit event it produces once sent
struct DasReply {
    packet: Packet,
    outcome: DasOutcome,
    event_type: AuditEventType,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::{DasSession, SimpleSessionRegistry, UnsupportedRegistry};
    use radius_proto::das::{error_cause, sign_das_request, verify_das_response};
    use radius_proto::Attribute;
    use std::fs;
    use tempfile::NamedTempFile;

    const SECRET: &[u8] = b"testing123";

    fn handler_with(registry: Arc<dyn SessionRegistry>) -> DasHandler {
        DasHandler::new(
            SharedSecret::new(SECRET),
            "192.168.1.10".parse().unwrap(),
            registry,
            Arc::new(AuditLogger::disabled()),
        )
    }

    fn handler() -> DasHandler {
        handler_with(Arc::new(UnsupportedRegistry))
    }

    fn client() -> SocketAddr {
        "192.168.1.10:50000".parse().unwrap()
    }

    fn signed_request(code: Code, identifier: u8, secret: &[u8]) -> Packet {
        let mut packet = Packet::new(code, identifier, [0u8; 16]);
        packet.add_attribute(Attribute::string(AttributeType::UserName as u8, "alice").unwrap());
        sign_das_request(&mut packet, secret).unwrap();
        packet
    }

    async fn reply_for(handler: &DasHandler, request: &Packet) -> Packet {
        let bytes = handler
            .handle_datagram(&request.encode().unwrap(), client())
            .await
            .expect("expected a reply");
        let reply = Packet::decode(&bytes).unwrap();
        assert!(verify_das_response(&reply, &request.authenticator, SECRET).is_ok());
        reply
    }

    #[test]
    fn test_origin_check() {
        let handler = handler();
        assert!(handler.is_authorized_origin("192.168.1.10".parse().unwrap()));
        assert!(handler.is_authorized_origin("::ffff:192.168.1.10".parse().unwrap()));
        assert!(!handler.is_authorized_origin("192.168.1.11".parse().unwrap()));
    }

    #[tokio::test]
    async fn test_disconnect_request_gets_nak_405() {
        let handler = handler();
        let request = signed_request(Code::DisconnectRequest, 7, SECRET);

        let reply = reply_for(&handler, &request).await;
        assert_eq!(reply.code, Code::DisconnectNak);
        assert_eq!(reply.identifier, 7);
        assert_eq!(error_cause(&reply), Some(405));
    }

    #[tokio::test]
    async fn test_coa_request_gets_nak_405() {
        let handler = handler();
        let request = signed_request(Code::CoaRequest, 201, SECRET);

        let reply = reply_for(&handler, &request).await;
        assert_eq!(reply.code, Code::CoaNak);
        assert_eq!(reply.identifier, 201);
        assert_eq!(error_cause(&reply), Some(405));
    }

    #[tokio::test]
    async fn test_wrong_secret_dropped() {
        let handler = handler();
        let request = signed_request(Code::DisconnectRequest, 7, b"wrong-secret");

        let result = handler
            .handle_datagram(&request.encode().unwrap(), client())
            .await;
        assert!(matches!(result, Err(DasError::Authentication(_))));
    }

    #[tokio::test]
    async fn test_unknown_origin_dropped() {
        let handler = handler();
        let request = signed_request(Code::DisconnectRequest, 7, SECRET);
        let stranger: SocketAddr = "192.168.1.99:50000".parse().unwrap();

        let result = handler
            .handle_datagram(&request.encode().unwrap(), stranger)
            .await;
        assert!(matches!(result, Err(DasError::UnknownClient(_))));
    }

    #[tokio::test]
    async fn test_unknown_code_dropped() {
        let handler = handler();
        let request = signed_request(Code::Unknown(99), 5, SECRET);

        let result = handler
            .handle_datagram(&request.encode().unwrap(), client())
            .await;
        assert!(matches!(result, Err(DasError::UnsupportedCode(99))));
    }

    #[tokio::test]
    async fn test_malformed_and_oversize_dropped() {
        let handler = handler();

        let result = handler.handle_datagram(&[40, 1, 0], client()).await;
        assert!(matches!(result, Err(DasError::Packet(_))));

        let big = vec![0u8; MAX_DATAGRAM_SIZE + 1];
        let result = handler.handle_datagram(&big, client()).await;
        assert!(matches!(result, Err(DasError::OversizeDatagram(_))));
    }

    #[tokio::test]
    async fn test_oversize_from_unknown_origin_is_unknown_client() {
        let handler = handler();
        let stranger: SocketAddr = "192.168.1.99:50000".parse().unwrap();
        let big = vec![0u8; MAX_DATAGRAM_SIZE + 1];

        let result = handler.handle_datagram(&big, stranger).await;
        assert!(matches!(result, Err(DasError::UnknownClient(_))));
    }

    #[tokio::test]
    async fn test_audit_records_sent_reply_only() {
        let temp_file = NamedTempFile::new().unwrap();
        let path = temp_file.path().to_str().unwrap().to_string();
        let handler = DasHandler::new(
            SharedSecret::new(SECRET),
            "192.168.1.10".parse().unwrap(),
            Arc::new(UnsupportedRegistry),
            Arc::new(AuditLogger::new(Some(path.clone())).unwrap()),
        );

        let request = signed_request(Code::CoaRequest, 3, SECRET);
        reply_for(&handler, &request).await;

        let dropped = signed_request(Code::Unknown(99), 4, SECRET);
        assert!(handler
            .handle_datagram(&dropped.encode().unwrap(), client())
            .await
            .is_err());

        let contents = fs::read_to_string(&path).unwrap();
        let entries: Vec<AuditEntry> = contents
            .lines()
            .map(|line| serde_json::from_str(line).unwrap())
            .collect();
        assert_eq!(entries.len(), 2);

        assert_eq!(entries[0].event_type, AuditEventType::CoaNak);
        assert_eq!(entries[0].request_id, Some(3));
        assert_eq!(entries[0].error_cause, Some(405));

        assert_eq!(entries[1].event_type, AuditEventType::UnsupportedCode);
        assert_eq!(entries[1].code, Some(99));
    }

    #[tokio::test]
    async fn test_proxy_state_echoed() {
        let handler = handler();
        let mut request = Packet::new(Code::DisconnectRequest, 9, [0u8; 16]);
        request.add_attribute(Attribute::new(AttributeType::ProxyState as u8, vec![1, 2]).unwrap());
        request.add_attribute(Attribute::new(AttributeType::ProxyState as u8, vec![3]).unwrap());
        sign_das_request(&mut request, SECRET).unwrap();

        let reply = reply_for(&handler, &request).await;
        let states: Vec<Vec<u8>> = reply
            .find_all_attributes(AttributeType::ProxyState as u8)
            .into_iter()
            .map(|a| a.value.clone())
            .collect();
        assert_eq!(states, vec![vec![1, 2], vec![3]]);
    }

    #[tokio::test]
    async fn test_registry_ack() {
        let registry = Arc::new(SimpleSessionRegistry::new());
        registry.add_session(DasSession::new("00000001").with_user_name("alice"));
        let handler = handler_with(registry.clone());

        let request = signed_request(Code::DisconnectRequest, 17, SECRET);
        let reply = reply_for(&handler, &request).await;

        assert_eq!(reply.code, Code::DisconnectAck);
        assert_eq!(reply.identifier, 17);
        assert_eq!(error_cause(&reply), None);
        assert_eq!(registry.session_count(), 0);

        // Session is gone now
        let request = signed_request(Code::DisconnectRequest, 18, SECRET);
        let reply = reply_for(&handler, &request).await;
        assert_eq!(reply.code, Code::DisconnectNak);
        assert_eq!(error_cause(&reply), Some(503));
    }

    #[tokio::test]
    async fn test_registry_coa_applies_changes() {
        let registry = Arc::new(SimpleSessionRegistry::new());
        registry.add_session(DasSession::new("00000001").with_user_name("alice"));
        let handler = handler_with(registry.clone());

        let mut request = Packet::new(Code::CoaRequest, 4, [0u8; 16]);
        request.add_attribute(Attribute::string(AttributeType::UserName as u8, "alice").unwrap());
        request.add_attribute(Attribute::integer(AttributeType::SessionTimeout as u8, 300).unwrap());
        sign_das_request(&mut request, SECRET).unwrap();

        let reply = reply_for(&handler, &request).await;
        assert_eq!(reply.code, Code::CoaAck);

        let session = registry.get_session("00000001").unwrap();
        assert_eq!(session.authorization.len(), 1);
        assert_eq!(session.authorization[0].as_integer().unwrap(), 300);
    }
}
