//! Who is signed in, as seen by one screen or task

use log::{debug, warn};
use rentify_auth::AuthStateChange;
use tokio::sync::broadcast::{self, error::TryRecvError};

use crate::error::{Error, Result};
use crate::services::{Identity, IdentityProvider};

/// An owned view of the current identity.
///
/// Created from an [`IdentityProvider`], it takes a snapshot and then
/// follows the provider's auth-state notifications whenever [`sync`] is
/// called. Operations that need an owner take a `&SessionContext` instead of
/// asking the provider themselves.
///
/// [`sync`]: SessionContext::sync
#[derive(Debug)]
pub struct SessionContext {
    identity: Option<Identity>,
    updates: Option<broadcast::Receiver<AuthStateChange>>,
}

impl SessionContext {
    pub fn new(provider: &dyn IdentityProvider) -> Self {
        // subscribe first so nothing between the snapshot and the subscription is lost
        let updates = provider.subscribe();
        Self::following(provider.current_identity(), updates)
    }

    pub(crate) fn following(identity: Option<Identity>, updates: broadcast::Receiver<AuthStateChange>) -> Self {
        Self {
            identity,
            updates: Some(updates),
        }
    }

    /// A context that is never signed in
    pub fn anonymous() -> Self {
        Self {
            identity: None,
            updates: None,
        }
    }

    /// A fixed identity, detached from any provider
    pub fn signed_in(identity: Identity) -> Self {
        Self {
            identity: Some(identity),
            updates: None,
        }
    }

    /// Apply every notification received since the last call
    pub fn sync(&mut self) -> Option<&Identity> {
        if let Some(updates) = self.updates.as_mut() {
            loop {
                match updates.try_recv() {
                    Ok(change) => {
                        debug!("session change: {:?}", change);
                        self.identity = match change {
                            AuthStateChange::SignedIn(user) | AuthStateChange::UserUpdated(user) => Some(user.into()),
                            AuthStateChange::SignedOut => None,
                        };
                    }
                    Err(TryRecvError::Empty) => break,
                    Err(TryRecvError::Lagged(skipped)) => {
                        warn!("session missed {} auth notifications", skipped);
                    }
                    Err(TryRecvError::Closed) => {
                        self.updates = None;
                        break;
                    }
                }
            }
        }
        self.identity.as_ref()
    }

    pub fn identity(&self) -> Option<&Identity> {
        self.identity.as_ref()
    }

    pub fn is_signed_in(&self) -> bool {
        self.identity.is_some()
    }

    /// The identity, or `Error::Unauthenticated`
    pub fn require(&self) -> Result<&Identity> {
        self.identity.as_ref().ok_or(Error::Unauthenticated)
    }
}
