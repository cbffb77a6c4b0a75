use std::{convert::Infallible, fmt};

use axum::{
    extract::{FromRef, FromRequestParts},
    http::{HeaderMap, header, request::Parts},
};
use jsonwebtoken::{DecodingKey, Validation, decode, errors::ErrorKind};
use serde::{Deserialize, Serialize};

use crate::config::AppConfig;

/// Cookie keys written by the marketplace sign-in flow.
pub mod cookie_names {
    pub const ACCESS_TOKEN: &str = "accessToken";
    pub const REFRESH_TOKEN: &str = "refreshToken";
    pub const USER_ROLE: &str = "userRole";
    pub const USER_PHONE_NUMBER: &str = "userPhoneNumber";
}

/// Role
///
/// The marketplace account kinds. `User` is a customer, `Vendor` a caterer and
/// `Admin` a platform operator (split into two consoles by phone number).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Vendor,
    Admin,
}

impl Role {
    /// Parses the exact cookie spelling. Anything else is unrecognized.
    pub fn parse(raw: &str) -> Option<Self> {
        match raw {
            "user" => Some(Role::User),
            "vendor" => Some(Role::Vendor),
            "admin" => Some(Role::Admin),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Role::User => "user",
            Role::Vendor => "vendor",
            Role::Admin => "admin",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// TokenMode
///
/// How far the access token cookie is trusted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenMode {
    /// Any non-empty access token authenticates. Role and phone come from
    /// their own cookies, mirrored there by the front-end after sign-in.
    Presence,
    /// The access token must be an unexpired HS256 JWT signed with the gate
    /// secret. Role and phone come only from its claims; a missing claim means
    /// absent, whatever the plain cookies say.
    Verified,
}

impl TokenMode {
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "presence" => Some(TokenMode::Presence),
            "verified" => Some(TokenMode::Verified),
            _ => None,
        }
    }
}

/// SessionClaims
///
/// Payload of a signed access token.
#[derive(Debug, Serialize, Deserialize)]
pub struct SessionClaims {
    /// Subject: the account identifier issued by the marketplace API.
    pub sub: String,
    pub exp: usize,
    pub iat: usize,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub role: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phone_number: Option<String>,
}

/// Session
///
/// Caller state rebuilt from cookies on every request. The gate only reads it;
/// the sign-in flow outside this service is the only writer of the cookies.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Session {
    pub access_token_present: bool,
    pub role: Option<Role>,
    pub phone_number: Option<String>,
}

impl Session {
    pub fn anonymous() -> Self {
        Self::default()
    }

    /// Shorthand for an authenticated session, mostly useful in tests.
    pub fn authenticated(role: Option<Role>, phone_number: Option<&str>) -> Self {
        Self {
            access_token_present: true,
            role,
            phone_number: phone_number.map(str::to_string),
        }
    }

    pub fn is_authenticated(&self) -> bool {
        self.access_token_present
    }

    /// Builds a session from `(name, value)` cookie pairs.
    ///
    /// Never fails: empty, malformed or unverifiable values count as absent.
    /// When a name repeats, the first occurrence wins.
    pub fn from_cookies<'a, I>(cookies: I, mode: TokenMode, secret: &str) -> Self
    where
        I: IntoIterator<Item = (&'a str, &'a str)>,
    {
        let mut access_token = None;
        let mut role = None;
        let mut phone = None;

        for (name, value) in cookies {
            if value.is_empty() {
                continue;
            }
            let slot = match name {
                cookie_names::ACCESS_TOKEN => &mut access_token,
                cookie_names::USER_ROLE => &mut role,
                cookie_names::USER_PHONE_NUMBER => &mut phone,
                _ => continue,
            };
            if slot.is_none() {
                *slot = Some(value);
            }
        }

        match mode {
            TokenMode::Presence => Session {
                access_token_present: access_token.is_some(),
                role: role.and_then(Role::parse),
                phone_number: phone.map(str::to_string),
            },
            // The plain role and phone cookies are unsigned and never consulted here.
            TokenMode::Verified => match access_token.and_then(|token| verify_token(token, secret)) {
                Some(claims) => Session {
                    access_token_present: true,
                    role: claims.role.as_deref().and_then(Role::parse),
                    phone_number: claims.phone_number.filter(|phone| !phone.is_empty()),
                },
                None => Session::anonymous(),
            },
        }
    }

    /// Collects every `Cookie` header (HTTP/2 may split them) and builds the session.
    pub fn from_headers(headers: &HeaderMap, mode: TokenMode, secret: &str) -> Self {
        let raw: Vec<&str> = headers
            .get_all(header::COOKIE)
            .iter()
            .filter_map(|value| value.to_str().ok())
            .collect();

        let pairs: Vec<(&str, &str)> = raw
            .iter()
            .flat_map(|line| parse_cookie_header(line))
            .collect();

        Self::from_cookies(pairs, mode, secret)
    }
}

/// Splits a `Cookie` header into `(name, value)` pairs.
///
/// Pairs without `=` or with an empty name are skipped. Values wrapped in
/// double quotes are unwrapped.
pub fn parse_cookie_header(line: &str) -> Vec<(&str, &str)> {
    line.split(';')
        .filter_map(|pair| {
            let (name, value) = pair.split_once('=')?;
            let name = name.trim();
            if name.is_empty() {
                return None;
            }
            let value = value.trim();
            let value = value
                .strip_prefix('"')
                .and_then(|v| v.strip_suffix('"'))
                .unwrap_or(value);
            Some((name, value))
        })
        .collect()
}

fn verify_token(token: &str, secret: &str) -> Option<SessionClaims> {
    let decoding_key = DecodingKey::from_secret(secret.as_bytes());
    let mut validation = Validation::default();
    validation.validate_exp = true;

    match decode::<SessionClaims>(token, &decoding_key, &validation) {
        Ok(data) => Some(data.claims),
        Err(e) => {
            match e.kind() {
                ErrorKind::ExpiredSignature => tracing::debug!("access token expired"),
                kind => tracing::debug!(?kind, "access token rejected"),
            }
            None
        }
    }
}

/// Lets handlers take the caller's `Session` as an argument.
///
/// Infallible: a request without usable cookies simply yields an anonymous session.
impl<S> FromRequestParts<S> for Session
where
    S: Send + Sync,
    AppConfig: FromRef<S>,
{
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let config = AppConfig::from_ref(state);
        Ok(Session::from_headers(
            &parts.headers,
            config.token_mode,
            &config.jwt_secret,
        ))
    }
}
