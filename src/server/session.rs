//! Login sessions, kept as a signed token in a cookie.
use chrono::{Duration, Utc};
use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// Name of the session cookie.
pub const COOKIE: &str = "session";

const MAX_AGE_DAYS: i64 = 14;

#[derive(Clone)]
pub struct Secret(Vec<u8>);

impl FromStr for Secret {
    type Err = ShortSecret;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.len() >= 32 {
            Ok(Secret(s.as_bytes().to_vec()))
        } else {
            Err(ShortSecret(s.len()))
        }
    }
}

#[derive(Debug, thiserror::Error)]
#[error("Bad session secret, got {0} bytes, expected at least 32")]
pub struct ShortSecret(usize);

#[derive(Debug, Deserialize, Serialize)]
struct Claims {
    /// The logged in user id.
    uid: i32,
    exp: i64,
}

/// Issues and checks session tokens.
pub struct Sessions {
    encoding: EncodingKey,
    decoding: DecodingKey,
}

impl Sessions {
    pub fn new(secret: &Secret) -> Self {
        Sessions {
            encoding: EncodingKey::from_secret(&secret.0),
            decoding: DecodingKey::from_secret(&secret.0),
        }
    }

    /// Create a session token for a user who just logged in.
    pub fn issue(
        &self,
        user_id: i32,
    ) -> Result<String, jsonwebtoken::errors::Error> {
        let claims = Claims {
            uid: user_id,
            exp: (Utc::now() + Duration::days(MAX_AGE_DAYS)).timestamp(),
        };
        jsonwebtoken::encode(&Header::default(), &claims, &self.encoding)
    }

    /// The user id of a valid session token.
    ///
    /// Bad or expired tokens are simply no session.
    pub fn user_id(&self, token: &str) -> Option<i32> {
        match jsonwebtoken::decode::<Claims>(
            token,
            &self.decoding,
            &Validation::default(),
        ) {
            Ok(data) => Some(data.claims.uid),
            Err(e) => {
                tracing::debug!("Ignoring bad session token: {e}");
                None
            }
        }
    }
}

/// The `Set-Cookie` value for a new session.
pub fn set_cookie(token: &str) -> String {
    format!(
        "{COOKIE}={token}; SameSite=Lax; Path=/; Secure; HttpOnly; Max-Age={}",
        MAX_AGE_DAYS * 24 * 3600
    )
}

/// The `Set-Cookie` value for ending a session.
pub fn clear_cookie() -> String {
    format!("{COOKIE}=; SameSite=Lax; Path=/; Secure; HttpOnly; Max-Age=0")
}

#[cfg(test)]
mod test {
    use super::*;

    fn sessions(secret: &str) -> Sessions {
        Sessions::new(&secret.parse().unwrap())
    }

    #[test]
    fn short_secret() {
        assert!("short".parse::<Secret>().is_err());
    }

    #[test]
    fn issued_token_is_valid() {
        let s = sessions("a session secret that is long enough");
        let token = s.issue(17).unwrap();
        assert_eq!(s.user_id(&token), Some(17));
    }

    #[test]
    fn other_key_is_invalid() {
        let token = sessions("a session secret that is long enough")
            .issue(17)
            .unwrap();
        let other = sessions("another secret that is long enough too");
        assert_eq!(other.user_id(&token), None);
        assert_eq!(other.user_id("not.a.token"), None);
    }

    #[test]
    fn expired_token_is_invalid() {
        let s = sessions("a session secret that is long enough");
        let claims = Claims {
            uid: 17,
            exp: (Utc::now() - Duration::days(1)).timestamp(),
        };
        let token =
            jsonwebtoken::encode(&Header::default(), &claims, &s.encoding)
                .unwrap();
        assert_eq!(s.user_id(&token), None);
    }
}
