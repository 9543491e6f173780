//! Auth provider surface plus an in-memory implementation that mirrors the
//! backend contract: successful sign-in/sign-up upserts a `users/{uid}`
//! document so the mention list knows every account.

use std::cell::{Cell, RefCell};
use std::collections::BTreeMap;
use std::rc::{Rc, Weak};

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::AuthError;

use super::{CollectionRef, MemoryStore, Subscription};
use serde_json::json;

/// The signed-in identity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthUser {
    pub uid: String,
    pub email: String,
}

/// Callback fed the identity-or-none stream: once immediately on subscribe,
/// then on every sign-in/sign-out.
pub type AuthStateHandler = Rc<dyn Fn(Option<&AuthUser>)>;

/// Authentication backend surface the client consumes.
pub trait AuthProvider {
    fn sign_in(&self, email: &str, password: &str) -> Result<AuthUser, AuthError>;
    fn sign_up(&self, email: &str, password: &str) -> Result<AuthUser, AuthError>;
    fn sign_out(&self) -> Result<(), AuthError>;
    fn current_user(&self) -> Option<AuthUser>;
    fn on_auth_state_changed(&self, handler: AuthStateHandler) -> Subscription;
}

struct Account {
    uid: String,
    password: String,
}

struct Listener {
    id: u64,
    handler: AuthStateHandler,
    active: Rc<Cell<bool>>,
}

#[derive(Default)]
struct Inner {
    accounts: BTreeMap<String, Account>,
    current: Option<AuthUser>,
    listeners: Vec<Listener>,
    next_listener: u64,
}

/// In-memory `AuthProvider` backed by a `MemoryStore` users collection.
#[derive(Clone)]
pub struct MemoryAuth {
    store: MemoryStore,
    inner: Rc<RefCell<Inner>>,
}

impl MemoryAuth {
    pub fn new(store: MemoryStore) -> Self {
        Self {
            store,
            inner: Rc::default(),
        }
    }

    /// Seed an account without signing it in.
    pub fn with_account(self, email: &str, password: &str) -> Self {
        self.inner.borrow_mut().accounts.insert(
            email.to_string(),
            Account {
                uid: Uuid::new_v4().simple().to_string(),
                password: password.to_string(),
            },
        );
        self
    }

    fn set_current(&self, user: Option<AuthUser>) {
        let pending: Vec<(AuthStateHandler, Rc<Cell<bool>>)> = {
            let mut inner = self.inner.borrow_mut();
            inner.current = user.clone();
            inner
                .listeners
                .iter()
                .filter(|l| l.active.get())
                .map(|l| (l.handler.clone(), l.active.clone()))
                .collect()
        };
        for (handler, active) in pending {
            if active.get() {
                handler(user.as_ref());
            }
        }
    }

    /// Mirror the account into the users collection, `users/{uid}`.
    fn upsert_user_doc(&self, user: &AuthUser) {
        self.store.upsert(
            &CollectionRef::users(),
            &user.uid,
            json!({"uid": user.uid, "email": user.email}),
        );
    }
}

impl AuthProvider for MemoryAuth {
    fn sign_in(&self, email: &str, password: &str) -> Result<AuthUser, AuthError> {
        if email.trim().is_empty() || password.is_empty() {
            return Err(AuthError::MissingCredentials);
        }
        let user = {
            let inner = self.inner.borrow();
            let account = inner
                .accounts
                .get(email)
                .filter(|a| a.password == password)
                .ok_or(AuthError::InvalidCredentials)?;
            AuthUser {
                uid: account.uid.clone(),
                email: email.to_string(),
            }
        };
        self.upsert_user_doc(&user);
        self.set_current(Some(user.clone()));
        Ok(user)
    }

    fn sign_up(&self, email: &str, password: &str) -> Result<AuthUser, AuthError> {
        if email.trim().is_empty() || password.is_empty() {
            return Err(AuthError::MissingCredentials);
        }
        let user = {
            let mut inner = self.inner.borrow_mut();
            if inner.accounts.contains_key(email) {
                return Err(AuthError::EmailInUse(email.to_string()));
            }
            let uid = Uuid::new_v4().simple().to_string();
            inner.accounts.insert(
                email.to_string(),
                Account {
                    uid: uid.clone(),
                    password: password.to_string(),
                },
            );
            AuthUser {
                uid,
                email: email.to_string(),
            }
        };
        self.upsert_user_doc(&user);
        self.set_current(Some(user.clone()));
        Ok(user)
    }

    fn sign_out(&self) -> Result<(), AuthError> {
        self.set_current(None);
        Ok(())
    }

    fn current_user(&self) -> Option<AuthUser> {
        self.inner.borrow().current.clone()
    }

    fn on_auth_state_changed(&self, handler: AuthStateHandler) -> Subscription {
        let active = Rc::new(Cell::new(true));
        let (id, current) = {
            let mut inner = self.inner.borrow_mut();
            let id = inner.next_listener;
            inner.next_listener += 1;
            inner.listeners.push(Listener {
                id,
                handler: handler.clone(),
                active: active.clone(),
            });
            (id, inner.current.clone())
        };
        // Fire immediately with the current identity.
        handler(current.as_ref());

        let weak: Weak<RefCell<Inner>> = Rc::downgrade(&self.inner);
        Subscription::new(move || {
            active.set(false);
            if let Some(inner) = weak.upgrade() {
                inner.borrow_mut().listeners.retain(|l| l.id != id);
            }
        })
    }
}
