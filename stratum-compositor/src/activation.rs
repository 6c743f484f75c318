// stratum-compositor/src/activation.rs

//! Token-based cross-client activation.
//!
//! A client obtains a token object, optionally binds a seat serial, app id and
//! surface to it, and commits. Commit yields a fresh random string the client
//! hands to another process, which presents it to activate one of its own
//! surfaces. Each string activates at most once.

use crate::client::ClientId;
use crate::error::{ProtocolError, ProtocolErrorKind};
use crate::window::WindowId;
use rand::distributions::Alphanumeric;
use rand::Rng;
use std::collections::HashMap;
use std::fmt;
use std::time::Duration;
use tracing::{debug, info, warn};

const TOKEN_LENGTH: usize = 32;

/// Identifies a token protocol object (before and after commit).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TokenHandle(u64);

impl fmt::Display for TokenHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "token-{}", self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenState {
    Unbound,
    Bound,
    Committed,
    Consumed,
}

#[derive(Debug, Clone)]
pub struct ActivationToken {
    pub handle: TokenHandle,
    pub client: ClientId,
    pub token: Option<String>,
    pub surface: Option<WindowId>,
    pub app_id: Option<String>,
    pub serial: Option<u32>,
    pub state: TokenState,
    committed_at: Option<Duration>,
}

impl ActivationToken {
    pub fn is_valid(&self) -> bool {
        self.state == TokenState::Committed
    }

    pub fn is_used(&self) -> bool {
        self.state == TokenState::Consumed
    }
}

/// Result of presenting a token string.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ActivationOutcome {
    Granted {
        requester: ClientId,
        /// Surface the token was minted for, if any.
        origin: Option<WindowId>,
        app_id: Option<String>,
    },
    AlreadyUsed,
    /// Never committed, expired, or never issued.
    Unknown,
}

#[derive(Debug)]
pub struct ActivationArbiter {
    tokens: HashMap<TokenHandle, ActivationToken>,
    /// Committed and consumed strings. Consumed entries stay until the
    /// requesting client disconnects so a replay is always recognised.
    by_string: HashMap<String, TokenHandle>,
    next_handle: u64,
    lifetime: Duration,
    now: Duration,
}

impl ActivationArbiter {
    pub fn new(lifetime: Duration) -> Self {
        ActivationArbiter {
            tokens: HashMap::new(),
            by_string: HashMap::new(),
            next_handle: 0,
            lifetime,
            now: Duration::ZERO,
        }
    }

    pub fn set_lifetime(&mut self, lifetime: Duration) {
        self.lifetime = lifetime;
    }

    pub fn get(&self, handle: TokenHandle) -> Option<&ActivationToken> {
        self.tokens.get(&handle)
    }

    pub fn create_token(&mut self, client: ClientId) -> TokenHandle {
        self.next_handle += 1;
        let handle = TokenHandle(self.next_handle);
        self.tokens.insert(
            handle,
            ActivationToken {
                handle,
                client,
                token: None,
                surface: None,
                app_id: None,
                serial: None,
                state: TokenState::Unbound,
                committed_at: None,
            },
        );
        debug!(%client, %handle, "Activation token object created");
        handle
    }

    fn bindable(&mut self, handle: TokenHandle, client: ClientId) -> Result<&mut ActivationToken, ProtocolError> {
        let token = self.tokens.get_mut(&handle).filter(|t| t.client == client).ok_or_else(|| {
            ProtocolError::new(ProtocolErrorKind::InvalidObject, format!("{} is not owned by {}", handle, client))
        })?;
        match token.state {
            TokenState::Unbound | TokenState::Bound => {
                token.state = TokenState::Bound;
                Ok(token)
            }
            TokenState::Committed | TokenState::Consumed => Err(ProtocolError::new(
                ProtocolErrorKind::AlreadyUsed,
                format!("{} was already committed", handle),
            )),
        }
    }

    pub fn set_serial(&mut self, handle: TokenHandle, client: ClientId, serial: u32) -> Result<(), ProtocolError> {
        self.bindable(handle, client)?.serial = Some(serial);
        Ok(())
    }

    pub fn set_app_id(&mut self, handle: TokenHandle, client: ClientId, app_id: String) -> Result<(), ProtocolError> {
        self.bindable(handle, client)?.app_id = Some(app_id);
        Ok(())
    }

    pub fn set_surface(&mut self, handle: TokenHandle, client: ClientId, surface: WindowId) -> Result<(), ProtocolError> {
        self.bindable(handle, client)?.surface = Some(surface);
        Ok(())
    }

    /// Assigns the token string. Committing twice is `already_used`.
    pub fn commit(&mut self, handle: TokenHandle, client: ClientId) -> Result<String, ProtocolError> {
        self.expire();
        let string = self.generate_token_string();
        let now = self.now;
        let token = self.bindable(handle, client)?;
        token.state = TokenState::Committed;
        token.token = Some(string.clone());
        token.committed_at = Some(now);
        self.by_string.insert(string.clone(), handle);
        info!(%client, %handle, "Activation token committed");
        Ok(string)
    }

    fn generate_token_string(&self) -> String {
        let mut rng = rand::thread_rng();
        loop {
            let candidate: String = (&mut rng)
                .sample_iter(&Alphanumeric)
                .take(TOKEN_LENGTH)
                .map(char::from)
                .collect();
            if !self.by_string.contains_key(&candidate) {
                return candidate;
            }
        }
    }

    /// Consumes `token`. Only the first presentation of a committed string is granted.
    pub fn activate(&mut self, token: &str) -> ActivationOutcome {
        self.expire();
        let Some(entry) = self.by_string.get(token).and_then(|handle| self.tokens.get_mut(handle)) else {
            debug!(token, "Unknown or expired activation token ignored");
            return ActivationOutcome::Unknown;
        };
        match entry.state {
            TokenState::Consumed => {
                warn!(token, "Activation token presented again after use");
                ActivationOutcome::AlreadyUsed
            }
            TokenState::Committed => {
                entry.state = TokenState::Consumed;
                ActivationOutcome::Granted {
                    requester: entry.client,
                    origin: entry.surface,
                    app_id: entry.app_id.clone(),
                }
            }
            TokenState::Unbound | TokenState::Bound => ActivationOutcome::Unknown,
        }
    }

    /// The client destroyed the token object. A committed string stays
    /// usable and a consumed one stays recognised as used.
    pub fn destroy_token(&mut self, handle: TokenHandle) {
        if let Some(token) = self.tokens.get(&handle) {
            if matches!(token.state, TokenState::Unbound | TokenState::Bound) {
                self.tokens.remove(&handle);
            }
        }
    }

    /// Drops surface references to a destroyed window.
    pub fn forget_surface(&mut self, window: WindowId) {
        for token in self.tokens.values_mut() {
            if token.surface == Some(window) {
                token.surface = None;
            }
        }
    }

    pub fn forget_client(&mut self, client: ClientId) {
        let by_string = &mut self.by_string;
        self.tokens.retain(|_, token| {
            if token.client != client {
                return true;
            }
            if let Some(string) = &token.token {
                by_string.remove(string);
            }
            false
        });
    }

    pub fn advance(&mut self, dt: Duration) {
        self.now += dt;
        self.expire();
    }

    fn expire(&mut self) {
        let now = self.now;
        let lifetime = self.lifetime;
        let by_string = &mut self.by_string;
        self.tokens.retain(|handle, token| {
            let expired = token.state == TokenState::Committed
                && token.committed_at.is_some_and(|at| now.saturating_sub(at) >= lifetime);
            if expired {
                debug!(%handle, "Activation token expired");
                if let Some(string) = &token.token {
                    by_string.remove(string);
                }
            }
            !expired
        });
    }
}
