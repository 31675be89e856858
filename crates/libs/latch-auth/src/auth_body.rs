//! Bearer token response body and header parsing.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{AUTH_HEADER_PREFIX, CONNECTION_TOKEN_TYPE, token::Token};

/// Login response carrying a freshly issued token.
///
/// # JSON Format
///
/// ```json
/// {
///   "access_token": "MZXW6YTBOI2GK3DMN5XGC3TUMU",
///   "token_type": "Bearer",
///   "expiry": "2026-10-19T12:00:00Z"
/// }
/// ```
#[derive(Debug, Deserialize, Serialize)]
pub struct AuthBody {
    pub access_token: String,
    /// Always "Bearer".
    pub token_type: String,
    pub expiry: DateTime<Utc>,
}

impl AuthBody {
    pub fn new(access_token: String, expiry: DateTime<Utc>) -> Self {
        Self {
            access_token,
            token_type: String::from(CONNECTION_TOKEN_TYPE),
            expiry,
        }
    }
}

impl From<&Token> for AuthBody {
    fn from(token: &Token) -> Self {
        Self::new(token.plain_text.clone(), token.expiry)
    }
}

/// Extracts the token from an `Authorization` header value.
///
/// Accepts `Bearer <token>`; anything else yields `None`.
///
/// ```rust
/// use latch_auth::auth_body::bearer_token;
///
/// assert_eq!(bearer_token("Bearer ABCDEF"), Some("ABCDEF"));
/// assert_eq!(bearer_token("Basic ABCDEF"), None);
/// ```
pub fn bearer_token(header_value: &str) -> Option<&str> {
    header_value
        .strip_prefix(AUTH_HEADER_PREFIX)
        .map(str::trim)
        .filter(|token| !token.is_empty())
}

#[cfg(test)]
mod tests {
    use chrono::TimeDelta;

    use super::*;
    use crate::token::TokenScope;

    #[test]
    fn body_from_token() {
        let token = Token::generate(3, TimeDelta::minutes(5), TokenScope::Authentication).unwrap();
        let body = AuthBody::from(&token);
        assert_eq!(body.token_type, "Bearer");
        assert_eq!(body.access_token, token.plain_text);
        assert_eq!(body.expiry, token.expiry);
    }

    #[test]
    fn rejects_empty_bearer() {
        assert_eq!(bearer_token("Bearer "), None);
        assert_eq!(bearer_token(""), None);
        assert_eq!(bearer_token("Bearer  XYZ "), Some("XYZ"));
    }
}
