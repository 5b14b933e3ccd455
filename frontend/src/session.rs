use std::future::{Ready, ready};

use actix_session::{Session, SessionExt, SessionInsertError};
use actix_web::{FromRequest, HttpRequest, dev::Payload};
use serde::{Deserialize, Serialize};

pub const TOKEN_KEY: &str = "token";
pub const USER_ID_KEY: &str = "userId";
const DRAFT_PREFIX: &str = "draft:";

/// Identity of the signed-in administrator for one outgoing call.
///
/// Handed to every accessor explicitly instead of being looked up from
/// shared storage inside the HTTP client.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RequestContext {
    token: Option<String>,
    user_id: Option<String>,
}

impl RequestContext {
    pub fn new(token: impl Into<String>, user_id: Option<String>) -> Self {
        Self {
            token: Some(token.into()),
            user_id,
        }
    }

    pub fn anonymous() -> Self {
        Self::default()
    }

    pub fn token(&self) -> Option<&str> {
        self.token.as_deref()
    }

    pub fn user_id(&self) -> Option<&str> {
        self.user_id.as_deref()
    }

    pub fn is_authenticated(&self) -> bool {
        self.token.as_deref().is_some_and(|t| !t.is_empty())
    }
}

/// Reads both keys from the cookie session. Unreadable values count as absent.
pub fn load(session: &Session) -> RequestContext {
    RequestContext {
        token: session.get::<String>(TOKEN_KEY).ok().flatten(),
        user_id: session.get::<String>(USER_ID_KEY).ok().flatten(),
    }
}

pub fn persist(session: &Session, context: &RequestContext) -> Result<(), SessionInsertError> {
    if let Some(token) = context.token() {
        session.insert(TOKEN_KEY, token)?;
    }
    if let Some(user_id) = context.user_id() {
        session.insert(USER_ID_KEY, user_id)?;
    }
    Ok(())
}

/// Sign-out: drops the token, the user id and every pending draft.
pub fn clear(session: &Session) {
    session.purge();
}

pub fn draft_key(resource: &str) -> String {
    format!("{DRAFT_PREFIX}{resource}")
}

impl FromRequest for RequestContext {
    type Error = actix_web::Error;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _: &mut Payload) -> Self::Future {
        ready(Ok(load(&req.get_session())))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_token_is_not_authenticated() {
        assert!(!RequestContext::anonymous().is_authenticated());
        assert!(!RequestContext::new("", None).is_authenticated());
        let ctx = RequestContext::new("abc", Some("u1".to_string()));
        assert!(ctx.is_authenticated());
        assert_eq!(ctx.user_id(), Some("u1"));
    }
}
