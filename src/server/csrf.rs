use super::{Result, ViewError, ViewResult};
use base64::prelude::*;
use csrf::{AesGcmCsrfProtection, CsrfProtection};
use std::str::FromStr;

/// Name of the cookie holding the csrf cookie value.
pub const COOKIE: &str = "CSRF";

/// Seconds a form may be left open before it is submitted.
const TTL: i64 = 4 * 3600;

#[derive(Clone)]
pub struct Secret {
    secret: [u8; 32],
}
impl FromStr for Secret {
    type Err = BadLengthSecret;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Secret {
            secret: s
                .as_bytes()
                .try_into()
                .map_err(|_| BadLengthSecret(s.len()))?,
        })
    }
}

#[derive(Debug, thiserror::Error)]
#[error("Bad CSRF secret, got {0} bytes, expected 32")]
pub struct BadLengthSecret(usize);

/// A token for a form and the matching cookie, base64 encoded.
pub struct Pair {
    pub token: String,
    pub cookie: String,
}

impl Pair {
    /// The `Set-Cookie` header value for the cookie part.
    pub fn set_cookie(&self) -> String {
        format!(
            "{COOKIE}={}; SameSite=Strict; Path=/; Secure; HttpOnly",
            self.cookie
        )
    }
}

/// Server data for csrf handling.
pub struct Server {
    prot: AesGcmCsrfProtection,
}
impl Server {
    pub fn from_key(key: &Secret) -> Self {
        Self {
            prot: AesGcmCsrfProtection::from_key(key.secret),
        }
    }

    /// Verify the token posted in a form against the csrf cookie.
    ///
    /// A missing cookie fails like a bad one.
    pub fn verify(&self, token: &str, cookie: Option<&str>) -> Result<()> {
        fn fail<E: std::fmt::Display>(e: E) -> ViewError {
            tracing::info!("Csrf verification error: {}", e);
            ViewError::BadRequest("CSRF Verification Failed".into())
        }
        let cookie = cookie.ok_or_else(|| fail("no cookie"))?;
        let token = BASE64_STANDARD.decode(token).map_err(fail)?;
        let cookie = BASE64_STANDARD.decode(cookie).map_err(fail)?;
        let token = self.prot.parse_token(&token).map_err(fail)?;
        let cookie = self.prot.parse_cookie(&cookie).map_err(fail)?;
        self.prot.verify_token_pair(&token, &cookie).map_err(fail)
    }

    /// Generate a token for a page, and the cookie it verifies against.
    ///
    /// A valid incoming cookie keeps its value, so that forms already
    /// open in other pages still verify.  The cookie itself is renewed.
    pub fn generate_pair(&self, cookie: Option<&str>) -> Result<Pair> {
        let previous = cookie.and_then(|c| self.cookie_value(c));
        let (token, cookie) = self
            .prot
            .generate_token_pair(previous.as_ref(), TTL)
            .or_ise()?;
        Ok(Pair {
            token: token.b64_string(),
            cookie: cookie.b64_string(),
        })
    }

    fn cookie_value(&self, cookie: &str) -> Option<[u8; 64]> {
        let cookie = BASE64_STANDARD.decode(cookie).ok()?;
        let cookie = self.prot.parse_cookie(&cookie).ok()?;
        cookie.value().try_into().ok()
    }
}
