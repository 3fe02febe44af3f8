//! Static route access table.
//!
//! Every request path maps to one [`Access`] level. The table is checked by
//! the HTTP gate before any handler runs; services repeat the role check on
//! their own, so a misrouted request still cannot escalate.

use http::Method;
use pharmacy_core::user::Principal;

/// Who may call a route.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Access {
    /// No session needed.
    Public,
    /// Any signed-in role.
    Authenticated,
    /// `ADMIN` only.
    Admin,
}

impl Access {
    /// Returns `true` if `principal` satisfies this level.
    #[must_use]
    pub fn permits(self, principal: Option<&Principal>) -> bool {
        match self {
            Self::Public => true,
            Self::Authenticated => principal.is_some(),
            Self::Admin => principal.is_some_and(Principal::is_admin),
        }
    }
}

const PUBLIC_PATHS: &[&str] = &["/health", "/ready", "/api/auth/sign-in"];

/// Look up the access level for a request.
///
/// # Examples
///
/// ```
/// use http::Method;
/// use pharmacy_auth::access::{required_access, Access};
///
/// assert_eq!(required_access(&Method::GET, "/health"), Access::Public);
/// assert_eq!(required_access(&Method::GET, "/api/drugs"), Access::Authenticated);
/// assert_eq!(required_access(&Method::POST, "/api/drugs"), Access::Admin);
/// assert_eq!(required_access(&Method::POST, "/api/sales"), Access::Authenticated);
/// assert_eq!(required_access(&Method::GET, "/api/users"), Access::Admin);
/// ```
#[must_use]
pub fn required_access(method: &Method, path: &str) -> Access {
    let path = normalize(path);

    if PUBLIC_PATHS.contains(&path) {
        return Access::Public;
    }

    if under(path, "/api/users") || under(path, "/api/analytics") {
        return Access::Admin;
    }

    if under(path, "/api/drugs") && !is_read(method) {
        return Access::Admin;
    }

    Access::Authenticated
}

fn is_read(method: &Method) -> bool {
    *method == Method::GET || *method == Method::HEAD
}

fn under(path: &str, prefix: &str) -> bool {
    path == prefix
        || path
            .strip_prefix(prefix)
            .is_some_and(|rest| rest.starts_with('/'))
}

fn normalize(path: &str) -> &str {
    match path.trim_end_matches('/') {
        "" => "/",
        trimmed => trimmed,
    }
}
