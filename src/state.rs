// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

use std::sync::Arc;

use crate::auth::{Authenticator, PrincipalRegistry, SessionStore};
use crate::crypto::SymmetricCodec;
use crate::dispatch::Dispatcher;
use crate::gateway::FileGateway;
use crate::storage::SandboxStorage;

/// Shared handles for request handlers.
#[derive(Clone)]
pub struct AppState {
    pub dispatcher: Arc<Dispatcher>,
    pub sessions: Arc<SessionStore>,
}

impl AppState {
    pub fn new(
        principals: PrincipalRegistry,
        sessions: Arc<SessionStore>,
        storage: SandboxStorage,
        codec: SymmetricCodec,
    ) -> Self {
        let authenticator = Authenticator::new(Arc::new(principals), Arc::clone(&sessions));
        let gateway = FileGateway::new(Arc::clone(&sessions), storage, codec);
        Self {
            dispatcher: Arc::new(Dispatcher::new(authenticator, gateway)),
            sessions,
        }
    }

    pub fn storage(&self) -> &SandboxStorage {
        self.dispatcher.gateway().storage()
    }
}
