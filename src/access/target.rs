/// RedirectTarget
///
/// Every page the gate may send a caller to. Each one is reachable by the
/// caller it is chosen for, so following a redirect never loops.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RedirectTarget {
    CustomerSignin,
    VendorSignin,
    SuperAdminSignin,
    AdminSignin,
    CustomerProfile,
    VendorDashboard,
    AdminDashboard,
    SuperAdminDashboard,
    Root,
}

impl RedirectTarget {
    pub fn path(&self) -> &'static str {
        match self {
            RedirectTarget::CustomerSignin => "/auth/customer/signin",
            RedirectTarget::VendorSignin => "/auth/vendor/signin",
            RedirectTarget::SuperAdminSignin => "/auth/superadmin/signin",
            RedirectTarget::AdminSignin => "/auth/admin/signin",
            RedirectTarget::CustomerProfile => "/profile",
            RedirectTarget::VendorDashboard => "/dashboard",
            RedirectTarget::AdminDashboard => "/admin/dashboard",
            RedirectTarget::SuperAdminDashboard => "/superadmin/dashboard",
            RedirectTarget::Root => "/",
        }
    }

    pub fn is_signin(&self) -> bool {
        matches!(
            self,
            RedirectTarget::CustomerSignin
                | RedirectTarget::VendorSignin
                | RedirectTarget::SuperAdminSignin
                | RedirectTarget::AdminSignin
        )
    }
}
