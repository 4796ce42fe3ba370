// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # Event Dispatch
//!
//! Turns a named event plus its JSON payload into a typed [`Request`], runs
//! it and produces a [`Reply`].
//!
//! ## Ordering
//!
//! For every event other than `login`, the connection's session token is
//! verified before the payload is parsed. An unauthenticated client learns
//! nothing about payload validation.
//!
//! | Event | Session | Reply |
//! |-------|---------|-------|
//! | `login` | no | wrapped token (base64) |
//! | `logout` | yes | `logged out` |
//! | `createFile` | yes | `file created` |
//! | `editFile` | yes | `file edited` |
//! | `deleteFile` | yes | `file deleted` |
//! | `getFile` | yes | file contents |

use base64ct::{Base64, Encoding};
use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::{debug, info, warn};

use crate::auth::Authenticator;
use crate::error::ServiceError;
use crate::gateway::{AuthorizedSession, FileGateway, FileOperation, FileOutcome};
use crate::models::{EventEnvelope, FileRequest, FileWriteRequest, LoginRequest};

/// Recognized event names.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventKind {
    Login,
    Logout,
    CreateFile,
    EditFile,
    DeleteFile,
    GetFile,
}

impl EventKind {
    pub fn from_name(name: &str) -> Option<EventKind> {
        match name {
            "login" => Some(EventKind::Login),
            "logout" => Some(EventKind::Logout),
            "createFile" => Some(EventKind::CreateFile),
            "editFile" => Some(EventKind::EditFile),
            "deleteFile" => Some(EventKind::DeleteFile),
            "getFile" => Some(EventKind::GetFile),
            _ => None,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            EventKind::Login => "login",
            EventKind::Logout => "logout",
            EventKind::CreateFile => "createFile",
            EventKind::EditFile => "editFile",
            EventKind::DeleteFile => "deleteFile",
            EventKind::GetFile => "getFile",
        }
    }

    /// Whether the event needs a live session.
    pub fn requires_session(self) -> bool {
        !matches!(self, EventKind::Login)
    }
}

/// A decoded request.
#[derive(Debug, Clone)]
pub enum Request {
    Login(LoginRequest),
    Logout,
    CreateFile(FileWriteRequest),
    UpdateFile(FileWriteRequest),
    DeleteFile(FileRequest),
    GetFile(FileRequest),
}

impl Request {
    /// Decode `payload` as the request type for `kind`.
    ///
    /// # Errors
    /// `ServiceError::InputFormat` if the payload does not match.
    pub fn decode(kind: EventKind, payload: Value) -> Result<Request, ServiceError> {
        Ok(match kind {
            EventKind::Login => Request::Login(parse(payload)?),
            EventKind::Logout => Request::Logout,
            EventKind::CreateFile => Request::CreateFile(parse(payload)?),
            EventKind::EditFile => Request::UpdateFile(parse(payload)?),
            EventKind::DeleteFile => Request::DeleteFile(parse(payload)?),
            EventKind::GetFile => Request::GetFile(parse(payload)?),
        })
    }
}

fn parse<T: DeserializeOwned>(payload: Value) -> Result<T, ServiceError> {
    serde_json::from_value(payload).map_err(|e| ServiceError::input(e.to_string()))
}

/// Result of a successful request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Reply {
    Message(&'static str),
    WrappedKey(Vec<u8>),
    File(Vec<u8>),
}

/// A reply ready to be written to the transport.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReplyFrame {
    Text(String),
    Binary(Vec<u8>),
}

impl Reply {
    /// Render for the wire: wrapped keys as base64 text, file bodies as text
    /// when they are UTF-8 and as binary otherwise.
    pub fn into_frame(self) -> ReplyFrame {
        match self {
            Reply::Message(message) => ReplyFrame::Text(message.to_owned()),
            Reply::WrappedKey(wrapped) => ReplyFrame::Text(Base64::encode_string(&wrapped)),
            Reply::File(contents) => match String::from_utf8(contents) {
                Ok(text) => ReplyFrame::Text(text),
                Err(e) => ReplyFrame::Binary(e.into_bytes()),
            },
        }
    }
}

impl From<FileOutcome> for Reply {
    fn from(outcome: FileOutcome) -> Self {
        match outcome {
            FileOutcome::Created => Reply::Message("file created"),
            FileOutcome::Updated => Reply::Message("file edited"),
            FileOutcome::Deleted => Reply::Message("file deleted"),
            FileOutcome::Contents(contents) => Reply::File(contents),
        }
    }
}

/// Routes events to login or the file gateway.
pub struct Dispatcher {
    authenticator: Authenticator,
    gateway: FileGateway,
}

impl Dispatcher {
    pub fn new(authenticator: Authenticator, gateway: FileGateway) -> Self {
        Self {
            authenticator,
            gateway,
        }
    }

    pub fn gateway(&self) -> &FileGateway {
        &self.gateway
    }

    /// Handle one raw text frame: `{"event": ..., "data": ...}`.
    pub fn handle_frame(&self, token: Option<&str>, frame: &str) -> Result<Reply, ServiceError> {
        let envelope: EventEnvelope =
            serde_json::from_str(frame).map_err(|e| ServiceError::input(e.to_string()))?;
        let payload = envelope
            .payload()
            .map_err(|e| ServiceError::input(e.to_string()))?;
        self.handle_event(token, &envelope.event, payload)
    }

    /// Handle a named event.
    ///
    /// # Errors
    /// - `ServiceError::InputFormat` for an unknown event or malformed payload
    /// - `ServiceError::Unauthorized` if a session-bound event has no live session
    /// - whatever login or the gateway report
    pub fn handle_event(
        &self,
        token: Option<&str>,
        event: &str,
        payload: Value,
    ) -> Result<Reply, ServiceError> {
        let kind = EventKind::from_name(event)
            .ok_or_else(|| ServiceError::input(format!("unknown event {event:?}")))?;

        let session = if kind.requires_session() {
            Some(self.gateway.authorize(token)?)
        } else {
            None
        };

        let request = Request::decode(kind, payload)?;
        debug!(event = kind.name(), "Dispatching request");
        self.dispatch(session.as_ref(), request)
    }

    /// Run a decoded request.
    ///
    /// # Errors
    /// `ServiceError::Unauthorized` if a session-bound request arrives
    /// without a session.
    pub fn dispatch(
        &self,
        session: Option<&AuthorizedSession>,
        request: Request,
    ) -> Result<Reply, ServiceError> {
        let operation = match request {
            Request::Login(login) => {
                let wrapped = self.authenticator.login(
                    &login.username,
                    &login.password,
                    &login.public_key(),
                )?;
                return Ok(Reply::WrappedKey(wrapped));
            }
            Request::Logout => {
                let session = session.ok_or(ServiceError::Unauthorized)?;
                self.authenticator.logout(session.token());
                info!(principal = %session.principal(), "Session ended");
                return Ok(Reply::Message("logged out"));
            }
            Request::CreateFile(req) => FileOperation::Create {
                name: req.file_name,
                payload: req.encrypted_text,
            },
            Request::UpdateFile(req) => FileOperation::Update {
                name: req.file_name,
                payload: req.encrypted_text,
            },
            Request::DeleteFile(req) => FileOperation::Delete {
                name: req.file_name,
            },
            Request::GetFile(req) => FileOperation::Read {
                name: req.file_name,
            },
        };

        let session = session.ok_or(ServiceError::Unauthorized)?;
        self.gateway
            .execute(session, operation)
            .map(Reply::from)
            .inspect_err(|e| {
                warn!(
                    principal = %session.principal(),
                    error_code = e.error_code(),
                    error = %e,
                    "File operation failed"
                )
            })
    }
}
