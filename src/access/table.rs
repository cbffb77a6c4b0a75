use thiserror::Error;

use super::target::RedirectTarget;
use crate::session::Role;

/// RouteFamily
///
/// Groups protected prefixes by the sign-in page an anonymous caller is sent to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RouteFamily {
    Customer,
    Vendor,
    /// The `/admin` console, reserved for the privileged phone number.
    RestrictedAdmin,
    /// The `/superadmin` console, used by every other admin account.
    GeneralAdmin,
}

impl RouteFamily {
    pub fn signin(&self) -> RedirectTarget {
        match self {
            RouteFamily::Customer => RedirectTarget::CustomerSignin,
            RouteFamily::Vendor => RedirectTarget::VendorSignin,
            RouteFamily::RestrictedAdmin => RedirectTarget::AdminSignin,
            RouteFamily::GeneralAdmin => RedirectTarget::SuperAdminSignin,
        }
    }
}

/// A protected prefix and the roles allowed through it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RouteRule {
    pub prefix: String,
    pub allowed: Vec<Role>,
    pub family: RouteFamily,
}

impl RouteRule {
    pub fn new(prefix: impl Into<String>, allowed: &[Role], family: RouteFamily) -> Self {
        Self {
            prefix: prefix.into(),
            allowed: allowed.to_vec(),
            family,
        }
    }

    /// Plain starts-with: `/profile` also covers `/profile-settings`.
    pub fn matches(&self, path: &str) -> bool {
        path.starts_with(&self.prefix)
    }

    pub fn permits(&self, role: Option<Role>) -> bool {
        role.is_some_and(|role| self.allowed.contains(&role))
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum RouteTableError {
    #[error("route prefix '{0}' must start with '/'")]
    InvalidPrefix(String),
    #[error("route prefix '{shadowed}' can never match because '{by}' is declared before it")]
    Shadowed { shadowed: String, by: String },
}

/// RouteTable
///
/// Ordered protected rules with a first-match-wins contract. Construction
/// rejects any rule an earlier rule would always claim first, so reordering
/// the declaration can never silently change who gets through.
#[derive(Debug, Clone)]
pub struct RouteTable {
    rules: Vec<RouteRule>,
}

impl RouteTable {
    pub fn new(rules: Vec<RouteRule>) -> Result<Self, RouteTableError> {
        for (index, rule) in rules.iter().enumerate() {
            if rule.prefix.is_empty() || !rule.prefix.starts_with('/') {
                return Err(RouteTableError::InvalidPrefix(rule.prefix.clone()));
            }
            if let Some(earlier) = rules[..index]
                .iter()
                .find(|earlier| rule.prefix.starts_with(&earlier.prefix))
            {
                return Err(RouteTableError::Shadowed {
                    shadowed: rule.prefix.clone(),
                    by: earlier.prefix.clone(),
                });
            }
        }
        Ok(Self { rules })
    }

    /// The first rule whose prefix matches `path`.
    pub fn find(&self, path: &str) -> Option<&RouteRule> {
        self.rules.iter().find(|rule| rule.matches(path))
    }

    pub fn rules(&self) -> &[RouteRule] {
        &self.rules
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn shadowed_rule_is_rejected() {
        let err = RouteTable::new(vec![
            RouteRule::new("/admin", &[Role::Admin], RouteFamily::RestrictedAdmin),
            RouteRule::new("/admin/reports", &[Role::Admin], RouteFamily::RestrictedAdmin),
        ])
        .unwrap_err();
        assert_eq!(
            err,
            RouteTableError::Shadowed {
                shadowed: "/admin/reports".to_string(),
                by: "/admin".to_string(),
            }
        );
    }

    #[test]
    fn more_specific_first_is_accepted() {
        let table = RouteTable::new(vec![
            RouteRule::new("/admin/reports", &[Role::Admin], RouteFamily::RestrictedAdmin),
            RouteRule::new("/admin", &[Role::Admin], RouteFamily::RestrictedAdmin),
        ])
        .unwrap();
        assert_eq!(table.find("/admin/reports/1").unwrap().prefix, "/admin/reports");
        assert_eq!(table.find("/admin/users").unwrap().prefix, "/admin");
    }

    #[test]
    fn prefix_without_slash_is_rejected() {
        let err = RouteTable::new(vec![RouteRule::new("profile", &[Role::User], RouteFamily::Customer)])
            .unwrap_err();
        assert_eq!(err, RouteTableError::InvalidPrefix("profile".to_string()));
    }

    #[test]
    fn absent_role_is_never_permitted() {
        let rule = RouteRule::new("/profile", &[Role::User], RouteFamily::Customer);
        assert!(!rule.permits(None));
        assert!(rule.permits(Some(Role::User)));
        assert!(!rule.permits(Some(Role::Vendor)));
    }
}
