//! Session middleware handler for Salvo

use salvo_core::http::cookie::{self, Cookie};
use salvo_core::prelude::*;

use crate::config::{SameSite, SessionConfig};
use crate::cookie_signature::{sign, unsign_with_secrets};
use crate::depot_ext::SESSION_KEY;
use crate::manager::{is_valid_session_id, SessionManager};
use crate::session::Session;
use crate::store::{SessionStore, SqlSessionStore};

/// Session middleware for Salvo
///
/// Loads (or creates) the session named by the signed cookie before the
/// downstream handlers run, exposes it through the `Depot`, and writes it
/// back to the store once they finish.
pub struct SessionHandler<S: SessionStore = SqlSessionStore> {
    manager: SessionManager<S>,
    config: SessionConfig,
}

impl<S: SessionStore> SessionHandler<S> {
    /// Create a new session handler
    pub fn new(store: S, config: SessionConfig) -> Self {
        Self::with_manager(SessionManager::new(store), config)
    }

    /// Create a handler around an existing manager
    pub fn with_manager(manager: SessionManager<S>, config: SessionConfig) -> Self {
        if config.secrets.is_empty() {
            tracing::warn!(
                "SessionConfig has no secrets: session cookies will be neither accepted nor issued"
            );
        }
        Self { manager, config }
    }

    pub fn manager(&self) -> &SessionManager<S> {
        &self.manager
    }

    /// Get session ID from cookie
    fn get_session_id_from_cookie(&self, req: &Request) -> Option<String> {
        let cookie_value = req.cookie(&self.config.cookie_name)?;
        let signed_value = cookie_value.value();

        // Cookie values may arrive percent-encoded
        let decoded = match urlencoding::decode(signed_value) {
            Ok(d) => d.into_owned(),
            Err(_) => signed_value.to_string(),
        };

        match unsign_with_secrets(&decoded, &self.config.secrets) {
            Some(sid) if is_valid_session_id(&sid) => Some(sid),
            Some(_) => {
                tracing::warn!("Ignoring signed session cookie with malformed session ID");
                None
            }
            None => {
                tracing::warn!("Ignoring session cookie with invalid signature");
                None
            }
        }
    }

    /// Set session cookie on response
    fn set_session_cookie(&self, res: &mut Response, session_id: &str) {
        let Some(secret) = self.config.signing_secret() else {
            tracing::error!("No signing secret configured, session cookie not set");
            return;
        };
        let signed = sign(session_id, secret);

        let mut cookie_builder = Cookie::build((self.config.cookie_name.clone(), signed))
            .path(self.config.cookie_path.clone())
            .http_only(self.config.cookie_http_only)
            .secure(self.config.cookie_secure);

        if let Some(domain) = self.config.cookie_domain.clone() {
            cookie_builder = cookie_builder.domain(domain);
        }

        if let Some(max_age) = self.config.max_age {
            cookie_builder = cookie_builder.max_age(cookie::time::Duration::seconds(max_age as i64));
        }

        cookie_builder = match self.config.cookie_same_site {
            SameSite::Strict => cookie_builder.same_site(cookie::SameSite::Strict),
            SameSite::Lax => cookie_builder.same_site(cookie::SameSite::Lax),
            SameSite::None => cookie_builder.same_site(cookie::SameSite::None),
        };

        res.add_cookie(cookie_builder.build());
    }

    /// Remove session cookie
    fn remove_session_cookie(&self, res: &mut Response) {
        let cookie = Cookie::build((self.config.cookie_name.clone(), ""))
            .path(self.config.cookie_path.clone())
            .max_age(cookie::time::Duration::ZERO)
            .build();

        res.add_cookie(cookie);
    }
}

impl<S: SessionStore> Clone for SessionHandler<S> {
    fn clone(&self) -> Self {
        Self {
            manager: self.manager.clone(),
            config: self.config.clone(),
        }
    }
}

#[async_trait]
impl<S: SessionStore> Handler for SessionHandler<S> {
    async fn handle(&self, req: &mut Request, depot: &mut Depot, res: &mut Response, ctrl: &mut FlowCtrl) {
        let cookie_sid = self.get_session_id_from_cookie(req);

        let (handle, data) = match self.manager.get_session(cookie_sid.as_deref()).await {
            Ok(loaded) => loaded,
            Err(e) => {
                tracing::error!("Failed to load session: {}", e);
                res.render(StatusError::service_unavailable());
                ctrl.skip_rest();
                return;
            }
        };

        let session = Session::new(handle, data);
        depot.insert(SESSION_KEY, session.clone());

        ctrl.call_next(req, depot, res).await;

        if session.should_destroy() {
            if let Err(e) = self.manager.destroy_session(session.handle()).await {
                tracing::error!("Failed to destroy session: {}", e);
            }
            self.remove_session_cookie(res);
            return;
        }

        if self.config.resave || session.is_modified() {
            if let Err(e) = self
                .manager
                .set_session(session.handle(), session.id(), &session.data())
                .await
            {
                tracing::error!("Failed to save session: {}", e);
            }
        }

        // A persistent cookie is re-issued on every response to extend its expiry.
        if cookie_sid.as_deref() != Some(session.id()) || self.config.max_age.is_some() {
            self.set_session_cookie(res, session.id());
        }
    }
}
