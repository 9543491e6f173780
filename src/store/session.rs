//! Login state for the client: an optimistic cached user restored at
//! startup, then the authoritative identity stream from the auth provider.

use std::cell::RefCell;
use std::rc::Rc;

use crate::error::AuthError;

use super::{AuthProvider, AuthUser, Subscription, UserCache};

#[derive(Default)]
struct SessionState {
    current: Option<AuthUser>,
    /// False until the provider has reported its first identity-or-none.
    auth_ready: bool,
}

/// Owns the current-user view of the application.
pub struct Session {
    auth: Rc<dyn AuthProvider>,
    cache: Option<UserCache>,
    state: Rc<RefCell<SessionState>>,
    auth_sub: RefCell<Option<Subscription>>,
}

impl Session {
    /// Build a session, restoring the cached user as an optimistic hint.
    pub fn new(auth: Rc<dyn AuthProvider>, cache: Option<UserCache>) -> Self {
        let state = SessionState {
            current: cache.as_ref().and_then(UserCache::load),
            auth_ready: false,
        };
        Self {
            auth,
            cache,
            state: Rc::new(RefCell::new(state)),
            auth_sub: RefCell::new(None),
        }
    }

    /// Subscribe once to the provider's identity stream. From here on the
    /// provider is authoritative; the cached hint is overwritten.
    pub fn start(&self) {
        let state = self.state.clone();
        let sub = self.auth.on_auth_state_changed(Rc::new(move |user: Option<&AuthUser>| {
            let mut state = state.borrow_mut();
            state.current = user.cloned();
            state.auth_ready = true;
        }));
        *self.auth_sub.borrow_mut() = Some(sub);
    }

    /// Detach from the provider's identity stream.
    pub fn stop(&self) {
        self.auth_sub.borrow_mut().take();
    }

    pub fn current_user(&self) -> Option<AuthUser> {
        self.state.borrow().current.clone()
    }

    pub fn is_auth_ready(&self) -> bool {
        self.state.borrow().auth_ready
    }

    pub fn sign_in(&self, email: &str, password: &str) -> Result<AuthUser, AuthError> {
        let user = self.auth.sign_in(email, password)?;
        if let Some(cache) = &self.cache {
            let _ = cache.save(&user);
        }
        Ok(user)
    }

    pub fn sign_up(&self, email: &str, password: &str) -> Result<AuthUser, AuthError> {
        let user = self.auth.sign_up(email, password)?;
        if let Some(cache) = &self.cache {
            let _ = cache.save(&user);
        }
        Ok(user)
    }

    pub fn sign_out(&self) -> Result<(), AuthError> {
        self.auth.sign_out()?;
        if let Some(cache) = &self.cache {
            cache.clear();
        }
        Ok(())
    }
}
