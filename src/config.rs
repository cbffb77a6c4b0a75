use std::env;

use crate::{access::UnmatchedPolicy, session::TokenMode};

/// Phone number of the restricted admin console used when running locally.
pub const LOCAL_ADMIN_PHONE: &str = "9178114124";

const LOCAL_JWT_SECRET: &str = "super-secure-gate-secret-value-local";

/// AppConfig
///
/// Holds the gate's entire configuration state. Immutable once loaded and shared
/// with every request through the application state via FromRef.
#[derive(Clone, Debug)]
pub struct AppConfig {
    // Runtime environment marker. Selects log format and strictness of secrets.
    pub env: Env,
    // Address the HTTP listener binds to.
    pub bind_addr: String,
    // Directory holding the compiled marketplace front-end.
    pub frontend_dir: String,
    // The single phone number that designates the restricted admin console.
    pub admin_phone: String,
    // How the access token cookie is trusted (presence only, or signature checked).
    pub token_mode: TokenMode,
    // Secret used to verify signed access tokens in `TokenMode::Verified`.
    pub jwt_secret: String,
    // Outcome for paths no route rule claims.
    pub unmatched_policy: UnmatchedPolicy,
    // Base URL of the marketplace REST API.
    pub api_base_url: String,
}

/// Env
///
/// Runtime context: pretty logs and fallback secrets locally, JSON logs and
/// mandatory secrets in production.
#[derive(Clone, PartialEq, Debug)]
pub enum Env {
    Local,
    Production,
}

impl Default for AppConfig {
    /// Safe, non-panicking values for test state setup.
    fn default() -> Self {
        Self {
            env: Env::Local,
            bind_addr: "127.0.0.1:3000".to_string(),
            frontend_dir: "./dist".to_string(),
            admin_phone: LOCAL_ADMIN_PHONE.to_string(),
            token_mode: TokenMode::Presence,
            jwt_secret: LOCAL_JWT_SECRET.to_string(),
            unmatched_policy: UnmatchedPolicy::Allow,
            api_base_url: "http://localhost:8000/api".to_string(),
        }
    }
}

impl AppConfig {
    /// load
    ///
    /// Reads the configuration from environment variables at startup.
    ///
    /// # Panics
    /// Panics when a variable required for the current environment is missing or
    /// malformed, so the gate never starts with an incomplete access policy.
    pub fn load() -> Self {
        let env = match env::var("APP_ENV").as_deref() {
            Ok("production") => Env::Production,
            _ => Env::Local,
        };

        let token_mode = match env::var("TOKEN_MODE") {
            Ok(raw) => TokenMode::parse(&raw)
                .unwrap_or_else(|| panic!("FATAL: TOKEN_MODE must be 'presence' or 'verified', got '{raw}'.")),
            Err(_) => TokenMode::Presence,
        };

        let unmatched_policy = match env::var("UNMATCHED_POLICY") {
            Ok(raw) => UnmatchedPolicy::parse(&raw).unwrap_or_else(|| {
                panic!("FATAL: UNMATCHED_POLICY must be 'allow' or 'require-auth', got '{raw}'.")
            }),
            Err(_) => UnmatchedPolicy::Allow,
        };

        // The privileged phone decides which admin console an admin lands on,
        // so production refuses to guess it.
        let admin_phone = match env {
            Env::Production => env::var("ADMIN_PHONE_NUMBER")
                .expect("FATAL: ADMIN_PHONE_NUMBER must be set in production."),
            Env::Local => {
                env::var("ADMIN_PHONE_NUMBER").unwrap_or_else(|_| LOCAL_ADMIN_PHONE.to_string())
            }
        };
        if !is_valid_phone(&admin_phone) {
            panic!("FATAL: ADMIN_PHONE_NUMBER must be exactly 10 digits.");
        }

        let jwt_secret = match (&env, &token_mode) {
            (Env::Production, TokenMode::Verified) => env::var("GATE_JWT_SECRET")
                .expect("FATAL: GATE_JWT_SECRET must be set in production when TOKEN_MODE=verified."),
            _ => env::var("GATE_JWT_SECRET").unwrap_or_else(|_| LOCAL_JWT_SECRET.to_string()),
        };

        Self {
            env,
            bind_addr: env::var("BIND_ADDR").unwrap_or_else(|_| "0.0.0.0:3000".to_string()),
            frontend_dir: env::var("FRONTEND_DIR").unwrap_or_else(|_| "./dist".to_string()),
            admin_phone,
            token_mode,
            jwt_secret,
            unmatched_policy,
            api_base_url: env::var("API_BASE_URL")
                .unwrap_or_else(|_| "http://localhost:8000/api".to_string()),
        }
    }
}

fn is_valid_phone(phone: &str) -> bool {
    phone.len() == 10 && phone.bytes().all(|b| b.is_ascii_digit())
}
