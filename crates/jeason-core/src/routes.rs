//! # Routes
//!
//! The fixed page table of the site and the guard in front of the admin pages.
//!
//! | Page              | Path                      | Guard          |
//! |-------------------|---------------------------|----------------|
//! | home              | `/`                       | public         |
//! | products          | `/products`               | public         |
//! | product detail    | `/product/:id`            | public         |
//! | admin pages       | `/admin/dashboard`, `/admin/payments` | admin role |
//! | change password   | `/change-password`        | any session    |
//!
//! The remaining pages (`/about`, `/careers`, `/quote`, `/contact`, `/auth`
//! and the four `/services/*` pages) are public.

use crate::Role;

/// Where the login page lives.
pub const LOGIN_PATH: &str = "/auth";

/// Where a successful sign-in lands when no valid `next` was given.
pub const DEFAULT_AFTER_LOGIN: &str = "/admin/dashboard";

/// Every page the site serves.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Page {
    Home,
    Products,
    ProductDetail,
    About,
    Careers,
    Quote,
    Contact,
    Auth,
    AdminDashboard,
    AdminPayments,
    ChangePassword,
    ServicesTrading,
    ServicesConstruction,
    ServicesConsultancy,
    ServicesFabrication,
}

impl Page {
    pub const ALL: [Page; 15] = [
        Page::Home,
        Page::Products,
        Page::ProductDetail,
        Page::About,
        Page::Careers,
        Page::Quote,
        Page::Contact,
        Page::Auth,
        Page::AdminDashboard,
        Page::AdminPayments,
        Page::ChangePassword,
        Page::ServicesTrading,
        Page::ServicesConstruction,
        Page::ServicesConsultancy,
        Page::ServicesFabrication,
    ];

    /// Route pattern, `:id` marking a path parameter.
    #[must_use]
    pub fn pattern(self) -> &'static str {
        match self {
            Page::Home => "/",
            Page::Products => "/products",
            Page::ProductDetail => "/product/:id",
            Page::About => "/about",
            Page::Careers => "/careers",
            Page::Quote => "/quote",
            Page::Contact => "/contact",
            Page::Auth => "/auth",
            Page::AdminDashboard => "/admin/dashboard",
            Page::AdminPayments => "/admin/payments",
            Page::ChangePassword => "/change-password",
            Page::ServicesTrading => "/services/trading",
            Page::ServicesConstruction => "/services/construction",
            Page::ServicesConsultancy => "/services/consultancy",
            Page::ServicesFabrication => "/services/fabrication",
        }
    }

    /// The page a request path addresses, ignoring any query string and a
    /// single trailing slash.
    #[must_use]
    pub fn match_path(path: &str) -> Option<Page> {
        let path = path.split(['?', '#']).next().unwrap_or_default();
        let path = match path.strip_suffix('/') {
            Some(stripped) if !stripped.is_empty() => stripped,
            _ => path,
        };
        if let Some(id) = path.strip_prefix("/product/") {
            return (!id.is_empty() && id.chars().all(|c| c.is_ascii_digit()))
                .then_some(Page::ProductDetail);
        }
        Page::ALL
            .into_iter()
            .filter(|p| *p != Page::ProductDetail)
            .find(|p| p.pattern() == path)
    }

    /// Needs a signed-in user.
    #[must_use]
    pub fn is_protected(self) -> bool {
        self.admin_only() || self == Page::ChangePassword
    }

    /// Part of the `/admin/*` family.
    #[must_use]
    pub fn admin_only(self) -> bool {
        matches!(self, Page::AdminDashboard | Page::AdminPayments)
    }
}

/// Outcome of guarding one page request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Access {
    Allow(Page),
    /// Not signed in: send to the login page, remembering the destination.
    RedirectToLogin { location: String },
    /// Signed in without the required role.
    Forbidden,
    NotFound,
}

/// Decide what happens to a request for `path` by a user with `role`
/// (`None` when not signed in).
#[must_use]
pub fn guard(path: &str, role: Option<Role>) -> Access {
    let Some(page) = Page::match_path(path) else {
        return Access::NotFound;
    };
    if !page.is_protected() {
        return Access::Allow(page);
    }
    match role {
        None => Access::RedirectToLogin {
            location: login_url(path),
        },
        Some(Role::Admin) => Access::Allow(page),
        Some(Role::Customer) if page.admin_only() => Access::Forbidden,
        Some(Role::Customer) => Access::Allow(page),
    }
}

/// `/auth?next=<path>` with the path percent-encoded.
#[must_use]
pub fn login_url(next: &str) -> String {
    format!("{LOGIN_PATH}?next={}", encode_component(next))
}

/// Where to send the user after sign-in.
///
/// Only paths of known pages are honored; anything else (absolute URLs,
/// protocol-relative `//host`, unknown paths) falls back to the dashboard.
#[must_use]
pub fn login_redirect_target(next: Option<&str>) -> String {
    match next.map(str::trim) {
        Some(next)
            if next.starts_with('/')
                && !next.starts_with("//")
                && !next.contains('\\')
                && Page::match_path(next).is_some_and(|p| p != Page::Auth) =>
        {
            next.to_string()
        }
        _ => DEFAULT_AFTER_LOGIN.to_string(),
    }
}

fn encode_component(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    for byte in value.bytes() {
        match byte {
            b'A'..=b'Z' | b'a'..=b'z' | b'0'..=b'9' | b'-' | b'_' | b'.' | b'~' | b'/' => {
                out.push(char::from(byte));
            }
            other => out.push_str(&format!("%{other:02X}")),
        }
    }
    out
}
