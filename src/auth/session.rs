//! The per-request session: who, if anyone, is logged in.

use std::convert::Infallible;

use axum::{
    extract::{FromRef, FromRequestParts},
    http::request::Parts,
};
use axum_extra::extract::{PrivateCookieJar, cookie::Key};

use crate::{Error, UserID, auth::cookie::get_token_from_cookies};

/// Whether the browser making a request has logged in.
///
/// Built once per request from the auth cookie. Handlers receive it as an
/// extractor, and the store functions for expenses and summaries take it as
/// their first argument so that they cannot run for an anonymous visitor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionState {
    /// No valid auth cookie was sent.
    Anonymous,
    /// A valid, unexpired auth cookie was sent.
    Authenticated {
        /// The logged in user.
        user_id: UserID,
        /// The user's name at the time the cookie was issued.
        username: String,
    },
}

impl SessionState {
    /// Read the session from the auth cookie in `jar`.
    ///
    /// A missing, malformed or expired cookie gives [SessionState::Anonymous].
    pub fn from_cookie_jar(jar: &PrivateCookieJar) -> Self {
        match get_token_from_cookies(jar) {
            Ok(token) => SessionState::Authenticated {
                user_id: token.user_id,
                username: token.username,
            },
            Err(_) => SessionState::Anonymous,
        }
    }

    /// The ID of the logged in user.
    ///
    /// # Errors
    /// Returns [Error::Unauthenticated] for an anonymous session.
    pub fn user_id(&self) -> Result<UserID, Error> {
        match self {
            SessionState::Authenticated { user_id, .. } => Ok(*user_id),
            SessionState::Anonymous => Err(Error::Unauthenticated),
        }
    }

    /// The cached name of the logged in user, if any.
    pub fn username(&self) -> Option<&str> {
        match self {
            SessionState::Authenticated { username, .. } => Some(username),
            SessionState::Anonymous => None,
        }
    }
}

/// Uses the session placed in the request extensions by the auth middleware,
/// or reads the auth cookie directly on routes without the middleware.
impl<S> FromRequestParts<S> for SessionState
where
    S: Send + Sync,
    Key: FromRef<S>,
{
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        if let Some(session) = parts.extensions.get::<SessionState>() {
            return Ok(session.clone());
        }

        let jar = PrivateCookieJar::<Key>::from_request_parts(parts, state).await?;

        Ok(SessionState::from_cookie_jar(&jar))
    }
}

#[cfg(test)]
mod tests {
    use axum::{Router, routing::get};
    use axum_extra::extract::{PrivateCookieJar, cookie::Key};
    use axum_test::TestServer;
    use sha2::{Digest, Sha512};

    use crate::{
        Error, UserID,
        auth::cookie::{COOKIE_TOKEN, DEFAULT_COOKIE_DURATION, set_auth_cookie},
    };

    use super::SessionState;

    fn get_key() -> Key {
        Key::from(&Sha512::digest(b"foobar"))
    }

    #[test]
    fn empty_jar_is_anonymous() {
        let session = SessionState::from_cookie_jar(&PrivateCookieJar::new(get_key()));

        assert_eq!(session, SessionState::Anonymous);
        assert_eq!(session.user_id(), Err(Error::Unauthenticated));
        assert_eq!(session.username(), None);
    }

    #[test]
    fn valid_cookie_is_authenticated() {
        let jar = set_auth_cookie(
            PrivateCookieJar::new(get_key()),
            UserID::new(3),
            "alice",
            DEFAULT_COOKIE_DURATION,
        )
        .unwrap();

        let session = SessionState::from_cookie_jar(&jar);

        assert_eq!(session.user_id(), Ok(UserID::new(3)));
        assert_eq!(session.username(), Some("alice"));
    }

    async fn whoami(session: SessionState) -> String {
        session.username().unwrap_or("anonymous").to_owned()
    }

    async fn stub_log_in(jar: PrivateCookieJar) -> PrivateCookieJar {
        set_auth_cookie(jar, UserID::new(1), "alice", DEFAULT_COOKIE_DURATION).unwrap()
    }

    #[tokio::test]
    async fn extractor_reads_cookie_without_middleware() {
        let app = Router::new()
            .route("/whoami", get(whoami))
            .route("/log_in", get(stub_log_in))
            .with_state(get_key());
        let server = TestServer::try_new(app).expect("Could not create test server.");

        server.get("/whoami").await.assert_text("anonymous");

        let token = server.get("/log_in").await.cookie(COOKIE_TOKEN);
        server
            .get("/whoami")
            .add_cookie(token)
            .await
            .assert_text("alice");
    }
}
