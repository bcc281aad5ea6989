//! Session context
//!
//! Holds the admin and restaurant token pairs and is passed explicitly to
//! every [`ApiClient`](crate::http::ApiClient). Each scope is independent:
//! refreshing or clearing one never touches the other.

mod store;

pub use store::{FileTokenStore, MemoryTokenStore, TokenStore};

use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tokio::sync::{broadcast, Mutex};

use crate::error::StoreError;

/// Tenant namespace of a session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Scope {
    Admin,
    Restaurant,
}

impl Scope {
    pub const ALL: [Scope; 2] = [Scope::Admin, Scope::Restaurant];

    /// Storage key of the access token
    pub fn access_key(self) -> &'static str {
        match self {
            Scope::Admin => "token",
            Scope::Restaurant => "res_token",
        }
    }

    /// Storage key of the refresh token
    pub fn refresh_key(self) -> &'static str {
        match self {
            Scope::Admin => "refresh_token",
            Scope::Restaurant => "res_refresh_token",
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Scope::Admin => "admin",
            Scope::Restaurant => "restaurant",
        }
    }
}

impl fmt::Display for Scope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Scope {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "admin" => Ok(Scope::Admin),
            "restaurant" | "res" => Ok(Scope::Restaurant),
            other => Err(format!("unknown scope '{}', expected admin or restaurant", other)),
        }
    }
}

/// Token pair of an authenticated actor
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    pub access_token: String,
    pub refresh_token: Option<String>,
}

impl Session {
    pub fn new(access_token: impl Into<String>, refresh_token: Option<String>) -> Self {
        Self {
            access_token: access_token.into(),
            refresh_token,
        }
    }

    /// Session from a login response that may carry a distinct refresh token.
    /// The login token doubles as the refresh credential when it does not.
    pub fn from_login(token: impl Into<String>, refresh_token: Option<String>) -> Self {
        let access_token = token.into();
        let refresh_token = refresh_token.or_else(|| Some(access_token.clone()));
        Self {
            access_token,
            refresh_token,
        }
    }
}

/// Lifecycle notifications, mainly for whoever owns navigation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionEvent {
    SignedIn { scope: Scope },
    TokenRefreshed { scope: Scope },
    /// Refresh failed and tokens were cleared; show the login view
    LoginRequired { scope: Scope },
    SignedOut { scope: Scope },
}

impl SessionEvent {
    pub fn scope(&self) -> Scope {
        match self {
            SessionEvent::SignedIn { scope }
            | SessionEvent::TokenRefreshed { scope }
            | SessionEvent::LoginRequired { scope }
            | SessionEvent::SignedOut { scope } => *scope,
        }
    }
}

struct SessionInner {
    store: Arc<dyn TokenStore>,
    events: broadcast::Sender<SessionEvent>,
    admin_gate: Mutex<()>,
    restaurant_gate: Mutex<()>,
}

/// Shared handle to the stored sessions of both scopes
#[derive(Clone)]
pub struct SessionContext {
    inner: Arc<SessionInner>,
}

impl fmt::Debug for SessionContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SessionContext")
            .field("subscribers", &self.inner.events.receiver_count())
            .finish_non_exhaustive()
    }
}

impl SessionContext {
    pub fn new(store: Arc<dyn TokenStore>) -> Self {
        let (events, _) = broadcast::channel(32);
        Self {
            inner: Arc::new(SessionInner {
                store,
                events,
                admin_gate: Mutex::new(()),
                restaurant_gate: Mutex::new(()),
            }),
        }
    }

    /// Context backed by a [`MemoryTokenStore`]
    pub fn in_memory() -> Self {
        Self::new(Arc::new(MemoryTokenStore::new()))
    }

    /// Subscribe to session lifecycle events
    pub fn subscribe(&self) -> broadcast::Receiver<SessionEvent> {
        self.inner.events.subscribe()
    }

    pub fn access_token(&self, scope: Scope) -> Result<Option<String>, StoreError> {
        self.inner.store.get(scope.access_key())
    }

    pub fn refresh_token(&self, scope: Scope) -> Result<Option<String>, StoreError> {
        self.inner.store.get(scope.refresh_key())
    }

    /// Current session, if an access token is stored
    pub fn session(&self, scope: Scope) -> Result<Option<Session>, StoreError> {
        let Some(access_token) = self.access_token(scope)? else {
            return Ok(None);
        };
        Ok(Some(Session {
            access_token,
            refresh_token: self.refresh_token(scope)?,
        }))
    }

    /// Store a freshly issued session (login)
    pub fn begin(&self, scope: Scope, session: &Session) -> Result<(), StoreError> {
        let store = &self.inner.store;
        store.set(scope.access_key(), &session.access_token)?;
        match &session.refresh_token {
            Some(token) => store.set(scope.refresh_key(), token)?,
            None => store.remove(scope.refresh_key())?,
        }
        self.emit(SessionEvent::SignedIn { scope });
        Ok(())
    }

    /// Store tokens issued by the refresh endpoint.
    /// A `None` refresh token keeps the stored one.
    pub fn replace_tokens(
        &self,
        scope: Scope,
        access_token: &str,
        refresh_token: Option<&str>,
    ) -> Result<(), StoreError> {
        self.inner.store.set(scope.access_key(), access_token)?;
        if let Some(token) = refresh_token {
            self.inner.store.set(scope.refresh_key(), token)?;
        }
        self.emit(SessionEvent::TokenRefreshed { scope });
        Ok(())
    }

    /// Drop both tokens of the scope after an unrecoverable auth failure
    pub fn expire(&self, scope: Scope) -> Result<(), StoreError> {
        self.clear(scope)?;
        self.emit(SessionEvent::LoginRequired { scope });
        Ok(())
    }

    /// Drop both tokens of the scope on logout
    pub fn end(&self, scope: Scope) -> Result<(), StoreError> {
        self.clear(scope)?;
        self.emit(SessionEvent::SignedOut { scope });
        Ok(())
    }

    fn clear(&self, scope: Scope) -> Result<(), StoreError> {
        self.inner.store.remove(scope.access_key())?;
        self.inner.store.remove(scope.refresh_key())
    }

    /// Serialises refresh calls of one scope when coalescing is enabled
    pub(crate) fn refresh_gate(&self, scope: Scope) -> &Mutex<()> {
        match scope {
            Scope::Admin => &self.inner.admin_gate,
            Scope::Restaurant => &self.inner.restaurant_gate,
        }
    }

    fn emit(&self, event: SessionEvent) {
        tracing::debug!(?event, "Session event");
        // No subscribers is fine.
        let _ = self.inner.events.send(event);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scope_keys_are_distinct() {
        assert_eq!(Scope::Admin.access_key(), "token");
        assert_eq!(Scope::Restaurant.access_key(), "res_token");
        assert_ne!(Scope::Admin.refresh_key(), Scope::Restaurant.refresh_key());
        assert_eq!("Restaurant".parse::<Scope>().unwrap(), Scope::Restaurant);
        assert!("driver".parse::<Scope>().is_err());
    }

    #[test]
    fn test_login_token_doubles_as_refresh() {
        let session = Session::from_login("abc", None);
        assert_eq!(session.refresh_token.as_deref(), Some("abc"));

        let session = Session::from_login("abc", Some("long-lived".into()));
        assert_eq!(session.refresh_token.as_deref(), Some("long-lived"));
    }

    #[tokio::test]
    async fn test_scopes_are_isolated() {
        let ctx = SessionContext::in_memory();
        let mut events = ctx.subscribe();

        ctx.begin(Scope::Admin, &Session::new("a1", Some("r1".into()))).unwrap();
        ctx.begin(Scope::Restaurant, &Session::new("b1", Some("r2".into()))).unwrap();

        ctx.replace_tokens(Scope::Admin, "a2", None).unwrap();
        ctx.expire(Scope::Restaurant).unwrap();

        let admin = ctx.session(Scope::Admin).unwrap().unwrap();
        assert_eq!(admin, Session::new("a2", Some("r1".into())));
        assert_eq!(ctx.session(Scope::Restaurant).unwrap(), None);
        assert_eq!(ctx.refresh_token(Scope::Restaurant).unwrap(), None);

        let received: Vec<SessionEvent> = std::iter::from_fn(|| events.try_recv().ok()).collect();
        assert_eq!(
            received,
            vec![
                SessionEvent::SignedIn { scope: Scope::Admin },
                SessionEvent::SignedIn { scope: Scope::Restaurant },
                SessionEvent::TokenRefreshed { scope: Scope::Admin },
                SessionEvent::LoginRequired { scope: Scope::Restaurant },
            ]
        );
    }

    #[test]
    fn test_begin_without_refresh_token_drops_stale_one() {
        let ctx = SessionContext::in_memory();
        ctx.begin(Scope::Admin, &Session::new("a1", Some("old".into()))).unwrap();
        ctx.begin(Scope::Admin, &Session::new("a2", None)).unwrap();
        assert_eq!(ctx.refresh_token(Scope::Admin).unwrap(), None);
    }
}
