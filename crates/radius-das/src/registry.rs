//! Session registry seam
//!
//! The protocol envelope (origin check, authentication, signing) lives in the
//! handler. What a Disconnect-Request or CoA-Request actually *does* to a user
//! session is delegated to a [`SessionRegistry`], which answers with an ACK or
//! a NAK carrying an Error-Cause.
//!
//! - [`UnsupportedRegistry`] rejects everything with Unsupported Service (405).
//!   It is the default, for deployments where the NAS has no session control.
//! - [`SimpleSessionRegistry`] keeps sessions in memory and is used for tests
//!   and small deployments.

use dashmap::DashMap;
use radius_proto::{Attribute, AttributeType, ErrorCause, Packet};
use std::net::Ipv4Addr;

/// Result of applying a Disconnect or CoA request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DasOutcome {
    /// Reply with Disconnect-ACK / CoA-ACK
    Ack,
    /// Reply with Disconnect-NAK / CoA-NAK carrying this Error-Cause
    Nak(ErrorCause),
}

/// Session identification attributes of a request (RFC 5176 Section 3)
///
/// Every present field must match for a session to be selected.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SessionSelector {
    pub user_name: Option<String>,
    pub nas_port: Option<u32>,
    pub framed_ip: Option<Ipv4Addr>,
    pub calling_station_id: Option<String>,
    pub acct_session_id: Option<String>,
    pub acct_multi_session_id: Option<String>,
    pub chargeable_user_identity: Option<Vec<u8>>,
}

impl SessionSelector {
    /// Extract the selector from a request
    ///
    /// A session identification attribute with an undecodable value yields
    /// Invalid Attribute Value (407).
    pub fn from_packet(packet: &Packet) -> Result<Self, ErrorCause> {
        let text = |attr_type: AttributeType| {
            packet
                .find_attribute(attr_type as u8)
                .map(|attr| {
                    attr.as_string()
                        .map_err(|_| ErrorCause::InvalidAttributeValue)
                })
                .transpose()
        };

        Ok(SessionSelector {
            user_name: text(AttributeType::UserName)?,
            nas_port: packet
                .find_attribute(AttributeType::NasPort as u8)
                .map(|attr| {
                    attr.as_integer()
                        .map_err(|_| ErrorCause::InvalidAttributeValue)
                })
                .transpose()?,
            framed_ip: packet
                .find_attribute(AttributeType::FramedIpAddress as u8)
                .map(|attr| {
                    attr.as_ipv4()
                        .map_err(|_| ErrorCause::InvalidAttributeValue)
                })
                .transpose()?,
            calling_station_id: text(AttributeType::CallingStationId)?,
            acct_session_id: text(AttributeType::AcctSessionId)?,
            acct_multi_session_id: text(AttributeType::AcctMultiSessionId)?,
            chargeable_user_identity: packet
                .find_attribute(AttributeType::ChargeableUserIdentity as u8)
                .map(|attr| attr.value.clone()),
        })
    }

    /// No session identification attribute was present
    pub fn is_empty(&self) -> bool {
        *self == SessionSelector::default()
    }

    pub fn matches(&self, session: &DasSession) -> bool {
        fn field<T: PartialEq>(wanted: &Option<T>, actual: &Option<T>) -> bool {
            wanted.as_ref().map_or(true, |w| actual.as_ref() == Some(w))
        }

        self.acct_session_id
            .as_ref()
            .map_or(true, |id| *id == session.acct_session_id)
            && field(&self.user_name, &session.user_name)
            && field(&self.nas_port, &session.nas_port)
            && field(&self.framed_ip, &session.framed_ip)
            && field(&self.calling_station_id, &session.calling_station_id)
            && field(&self.acct_multi_session_id, &session.acct_multi_session_id)
            && field(
                &self.chargeable_user_identity,
                &session.chargeable_user_identity,
            )
    }
}

/// Authorization attributes a CoA-Request asks to change
///
/// Everything that is not session identification, NAS identification or
/// message envelope.
pub fn authorization_changes(packet: &Packet) -> Vec<Attribute> {
    packet
        .attributes
        .iter()
        .filter(|attr| match AttributeType::from_u8(attr.attr_type) {
            Some(t) => {
                !(t.is_session_identification() || t.is_nas_identification() || t.is_protocol())
            }
            None => true,
        })
        .cloned()
        .collect()
}

/// Session registry trait
///
/// Implement this trait to give Disconnect and CoA requests a real effect on
/// user sessions.
pub trait SessionRegistry: Send + Sync {
    /// Terminate the session selected by `selector`
    fn disconnect(&self, selector: &SessionSelector) -> DasOutcome;

    /// Apply `changes` to the session selected by `selector`
    fn change_authorization(&self, selector: &SessionSelector, changes: &[Attribute])
        -> DasOutcome;

    /// Outcome for a request whose session identification could not be parsed
    fn reject_malformed(&self, cause: ErrorCause) -> DasOutcome {
        DasOutcome::Nak(cause)
    }
}

/// Registry for a NAS without session control; every request is refused
#[derive(Debug, Default, Clone, Copy)]
pub struct UnsupportedRegistry;

impl SessionRegistry for UnsupportedRegistry {
    fn disconnect(&self, _selector: &SessionSelector) -> DasOutcome {
        DasOutcome::Nak(ErrorCause::UnsupportedService)
    }

    fn change_authorization(
        &self,
        _selector: &SessionSelector,
        _changes: &[Attribute],
    ) -> DasOutcome {
        DasOutcome::Nak(ErrorCause::UnsupportedService)
    }

    fn reject_malformed(&self, _cause: ErrorCause) -> DasOutcome {
        DasOutcome::Nak(ErrorCause::UnsupportedService)
    }
}

/// A user session known to the NAS
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DasSession {
    /// Unique session identifier (Acct-Session-Id)
    pub acct_session_id: String,
    pub user_name: Option<String>,
    pub nas_port: Option<u32>,
    pub framed_ip: Option<Ipv4Addr>,
    pub calling_station_id: Option<String>,
    pub acct_multi_session_id: Option<String>,
    pub chargeable_user_identity: Option<Vec<u8>>,
    /// Authorization attributes currently in force
    pub authorization: Vec<Attribute>,
}

impl DasSession {
    pub fn new(acct_session_id: impl Into<String>) -> Self {
        DasSession {
            acct_session_id: acct_session_id.into(),
            ..Default::default()
        }
    }

    pub fn with_user_name(mut self, user_name: impl Into<String>) -> Self {
        self.user_name = Some(user_name.into());
        self
    }

    pub fn with_framed_ip(mut self, framed_ip: Ipv4Addr) -> Self {
        self.framed_ip = Some(framed_ip);
        self
    }

    pub fn with_nas_port(mut self, nas_port: u32) -> Self {
        self.nas_port = Some(nas_port);
        self
    }

    pub fn with_calling_station_id(mut self, calling_station_id: impl Into<String>) -> Self {
        self.calling_station_id = Some(calling_station_id.into());
        self
    }

    /// Replace attributes of the same type, append new ones
    fn apply(&mut self, changes: &[Attribute]) {
        for change in changes {
            self.authorization
                .retain(|attr| attr.attr_type != change.attr_type);
        }
        self.authorization.extend_from_slice(changes);
    }
}

/// In-memory session registry keyed by Acct-Session-Id
#[derive(Default)]
pub struct SimpleSessionRegistry {
    sessions: DashMap<String, DasSession>,
}

impl SimpleSessionRegistry {
    pub fn new() -> Self {
        SimpleSessionRegistry {
            sessions: DashMap::new(),
        }
    }

    pub fn add_session(&self, session: DasSession) {
        self.sessions
            .insert(session.acct_session_id.clone(), session);
    }

    pub fn get_session(&self, acct_session_id: &str) -> Option<DasSession> {
        self.sessions
            .get(acct_session_id)
            .map(|entry| entry.value().clone())
    }

    pub fn session_count(&self) -> usize {
        self.sessions.len()
    }

    /// Resolve the selector to exactly one session key
    fn select(&self, selector: &SessionSelector) -> Result<String, ErrorCause> {
        if selector.is_empty() {
            return Err(ErrorCause::MissingAttribute);
        }

        let mut matching = self
            .sessions
            .iter()
            .filter(|entry| selector.matches(entry.value()))
            .map(|entry| entry.key().clone());

        let key = matching.next().ok_or(ErrorCause::SessionContextNotFound)?;
        if matching.next().is_some() {
            return Err(ErrorCause::MultipleSessionSelectionUnsupported);
        }
        Ok(key)
    }
}

impl SessionRegistry for SimpleSessionRegistry {
    fn disconnect(&self, selector: &SessionSelector) -> DasOutcome {
        let key = match self.select(selector) {
            Ok(key) => key,
            Err(cause) => return DasOutcome::Nak(cause),
        };

        match self.sessions.remove(&key) {
            Some(_) => DasOutcome::Ack,
            None => DasOutcome::Nak(ErrorCause::SessionContextNotFound),
        }
    }

    fn change_authorization(
        &self,
        selector: &SessionSelector,
        changes: &[Attribute],
    ) -> DasOutcome {
        let key = match self.select(selector) {
            Ok(key) => key,
            Err(cause) => return DasOutcome::Nak(cause),
        };

        match self.sessions.get_mut(&key) {
            Some(mut session) => {
                session.apply(changes);
                DasOutcome::Ack
            }
            None => DasOutcome::Nak(ErrorCause::SessionContextNotFound),
        }
    }
}
