//! Access Router
//!
//! Decides, from nothing but the request path and the caller's `Session`,
//! whether a page request goes through or is redirected. No I/O happens here;
//! the axum middleware in `lib.rs` turns a `Decision` into a response.

pub mod path;
pub mod table;
pub mod target;

use std::sync::LazyLock;

use regex::Regex;

use crate::{
    config::AppConfig,
    session::{Role, Session},
};

pub use path::{PathError, canonical_path};
pub use table::{RouteFamily, RouteRule, RouteTable, RouteTableError};
pub use target::RedirectTarget;

/// Public vendor detail pages: `/vendors/` followed by exactly one 24-char hex id.
static VENDOR_DETAIL: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^/vendors/[0-9a-fA-F]{24}$").unwrap());

pub const RESTRICTED_ADMIN_PREFIX: &str = "/admin";
pub const GENERAL_ADMIN_PREFIX: &str = "/superadmin";

/// Whether `path` is a single vendor's public detail page.
pub fn is_vendor_detail_path(path: &str) -> bool {
    VENDOR_DETAIL.is_match(path)
}

/// UnmatchedPolicy
///
/// What happens to a path that is neither public nor claimed by a route rule.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum UnmatchedPolicy {
    /// Fail open: let it through.
    #[default]
    Allow,
    /// Any authenticated caller may pass; anonymous callers go to customer sign-in.
    RequireAuth,
}

impl UnmatchedPolicy {
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "allow" => Some(UnmatchedPolicy::Allow),
            "require-auth" | "require_auth" => Some(UnmatchedPolicy::RequireAuth),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AllowReason {
    Public,
    DetailPage,
    Permitted,
    Unlisted,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RedirectReason {
    SigninRequired,
    RoleMismatch,
    AdminConsole,
}

/// Decision
///
/// The outcome for one request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    Allow(AllowReason),
    Redirect {
        target: RedirectTarget,
        reason: RedirectReason,
    },
}

impl Decision {
    fn redirect(target: RedirectTarget, reason: RedirectReason) -> Self {
        Decision::Redirect { target, reason }
    }

    pub fn is_allow(&self) -> bool {
        matches!(self, Decision::Allow(_))
    }

    /// The redirect destination, if any.
    pub fn location(&self) -> Option<&'static str> {
        match self {
            Decision::Allow(_) => None,
            Decision::Redirect { target, .. } => Some(target.path()),
        }
    }
}

/// AccessPolicy
///
/// The full rule set the gate applies: public prefixes, the protected route
/// table, the privileged admin phone and the unmatched-path default.
#[derive(Debug, Clone)]
pub struct AccessPolicy {
    public_prefixes: Vec<String>,
    table: RouteTable,
    admin_phone: String,
    unmatched: UnmatchedPolicy,
}

impl AccessPolicy {
    pub fn new(
        public_prefixes: Vec<String>,
        table: RouteTable,
        admin_phone: impl Into<String>,
        unmatched: UnmatchedPolicy,
    ) -> Self {
        let public_prefixes = public_prefixes
            .into_iter()
            .map(|prefix| prefix.trim_end_matches('/').to_string())
            .filter(|prefix| !prefix.is_empty())
            .collect();

        Self {
            public_prefixes,
            table,
            admin_phone: admin_phone.into(),
            unmatched,
        }
    }

    /// The marketplace's route table with the given privileged admin phone.
    pub fn marketplace(admin_phone: impl Into<String>) -> Result<Self, RouteTableError> {
        let table = RouteTable::new(vec![
            RouteRule::new("/profile", &[Role::User], RouteFamily::Customer),
            RouteRule::new("/my-inquiries", &[Role::User], RouteFamily::Customer),
            RouteRule::new("/dashboard", &[Role::Vendor], RouteFamily::Vendor),
            RouteRule::new(GENERAL_ADMIN_PREFIX, &[Role::Admin], RouteFamily::GeneralAdmin),
            RouteRule::new(RESTRICTED_ADMIN_PREFIX, &[Role::Admin], RouteFamily::RestrictedAdmin),
        ])?;

        Ok(Self::new(
            vec!["/vendors".to_string(), "/auth".to_string()],
            table,
            admin_phone,
            UnmatchedPolicy::Allow,
        ))
    }

    pub fn from_config(config: &AppConfig) -> Result<Self, RouteTableError> {
        Ok(Self::marketplace(config.admin_phone.clone())?.with_unmatched(config.unmatched_policy))
    }

    pub fn with_unmatched(mut self, unmatched: UnmatchedPolicy) -> Self {
        self.unmatched = unmatched;
        self
    }

    pub fn table(&self) -> &RouteTable {
        &self.table
    }

    /// Root is matched exactly; other public prefixes on a segment boundary.
    pub fn is_public(&self, path: &str) -> bool {
        path == "/"
            || self
                .public_prefixes
                .iter()
                .any(|prefix| under_segment(path, prefix))
    }

    /// True when the session belongs to the restricted admin console.
    pub fn is_restricted_admin(&self, session: &Session) -> bool {
        session.phone_number.as_deref() == Some(self.admin_phone.as_str())
    }

    /// Where a signed-in caller belongs.
    pub fn role_home(&self, session: &Session) -> RedirectTarget {
        match session.role {
            Some(Role::User) => RedirectTarget::CustomerProfile,
            Some(Role::Vendor) => RedirectTarget::VendorDashboard,
            Some(Role::Admin) if self.is_restricted_admin(session) => {
                RedirectTarget::AdminDashboard
            }
            Some(Role::Admin) => RedirectTarget::SuperAdminDashboard,
            None => RedirectTarget::Root,
        }
    }

    /// decide
    ///
    /// 1. Root and public prefixes pass.
    /// 2. Vendor detail pages pass.
    /// 3. An admin is pinned to the console their phone number selects.
    /// 4. The first matching rule decides: sign-in when anonymous, the
    ///    caller's home when the role is not allowed, otherwise pass.
    /// 5. Unmatched paths follow the `UnmatchedPolicy`.
    pub fn decide(&self, path: &str, session: &Session) -> Decision {
        if self.is_public(path) {
            return Decision::Allow(AllowReason::Public);
        }

        if is_vendor_detail_path(path) {
            return Decision::Allow(AllowReason::DetailPage);
        }

        let authenticated = session.is_authenticated();

        if authenticated && session.role == Some(Role::Admin) {
            let restricted = self.is_restricted_admin(session);
            if path.starts_with(RESTRICTED_ADMIN_PREFIX) && !restricted {
                return Decision::redirect(
                    RedirectTarget::SuperAdminDashboard,
                    RedirectReason::AdminConsole,
                );
            }
            if path.starts_with(GENERAL_ADMIN_PREFIX) && restricted {
                return Decision::redirect(
                    RedirectTarget::AdminDashboard,
                    RedirectReason::AdminConsole,
                );
            }
        }

        match self.table.find(path) {
            Some(rule) if !authenticated => {
                Decision::redirect(rule.family.signin(), RedirectReason::SigninRequired)
            }
            Some(rule) if !rule.permits(session.role) => {
                Decision::redirect(self.role_home(session), RedirectReason::RoleMismatch)
            }
            Some(_) => Decision::Allow(AllowReason::Permitted),
            None => match self.unmatched {
                UnmatchedPolicy::RequireAuth if !authenticated => Decision::redirect(
                    RedirectTarget::CustomerSignin,
                    RedirectReason::SigninRequired,
                ),
                _ => Decision::Allow(AllowReason::Unlisted),
            },
        }
    }
}

fn under_segment(path: &str, prefix: &str) -> bool {
    match path.strip_prefix(prefix) {
        Some(rest) => rest.is_empty() || rest.starts_with('/'),
        None => false,
    }
}
