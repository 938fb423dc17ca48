pub mod config;
pub mod middleware;

use std::collections::HashSet;
use std::fmt;

use log::warn;

use self::config::AuthzConfig;

/// Trait that defines the authorization interface
///
/// Implementers decide whether a single request may proceed. The trait is
/// thread-safe so one instance can be shared by every server worker.
pub trait Authorizer: Send + Sync {
    /// Name of the header carrying the caller identity.
    fn user_header(&self) -> &str;

    fn authorize_request(&self, req: &AuthzRequest) -> Decision;
}

/// The attributes of an HTTP request that take part in the decision.
#[derive(Debug, Clone, Copy)]
pub struct AuthzRequest<'a> {
    /// The URI path, as received.
    pub path: &'a str,
    /// The HTTP verb, matched case-sensitively.
    pub method: &'a str,
    /// Value of the identity header, empty when the header is absent.
    pub user: &'a str,
}

/// Possible outcomes of an authorization check.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum Decision {
    /// Hand the request to the next stage unchanged
    Pass,
    /// Terminate the request with 403
    Forbidden,
}

impl fmt::Display for Decision {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Decision::Pass => write!(f, "pass"),
            Decision::Forbidden => write!(f, "forbidden"),
        }
    }
}

/// Authorizer enforcing the base path / per-user sub-path ownership model.
///
/// Outside the base path everything passes. Inside it, reads are open to
/// anyone while writes are limited to `{base_path}/{user}` and below. Super
/// users bypass every rule, read-only users can never write.
#[derive(Debug, Clone)]
pub struct PathAuthorizer {
    base_path: String,
    user_header: String,
    super_users: HashSet<String>,
    read_only_users: HashSet<String>,
}

const WRITE_METHODS: [&str; 4] = ["PUT", "POST", "DELETE", "PATCH"];

pub fn is_write_method(method: &str) -> bool {
    WRITE_METHODS.contains(&method)
}

fn trim_path(path: &str) -> &str {
    path.trim_end_matches('/')
}

impl PathAuthorizer {
    pub fn new(cfg: &AuthzConfig) -> Self {
        let super_users: HashSet<String> = cfg.super_users.iter().cloned().collect();
        let read_only_users: HashSet<String> = cfg.read_only_users.iter().cloned().collect();

        if trim_path(&cfg.base_path).is_empty() {
            warn!("Base path is empty, every request path is in scope");
        }
        for user in super_users.intersection(&read_only_users) {
            warn!("User '{user}' is both super user and read-only user, treat as super user");
        }

        Self {
            base_path: cfg.base_path.clone(),
            user_header: cfg.user_header.clone(),
            super_users,
            read_only_users,
        }
    }

    pub fn authorize(&self, req: &AuthzRequest) -> Decision {
        let path = trim_path(req.path);
        let base_path = trim_path(&self.base_path);

        if !is_under(path, base_path) {
            return Decision::Pass;
        }

        // Checked before the read-only list, so a user in both lists keeps
        // full access.
        if self.super_users.contains(req.user) {
            return Decision::Pass;
        }

        if !is_write_method(req.method) {
            return Decision::Pass;
        }

        if self.read_only_users.contains(req.user) {
            return Decision::Forbidden;
        }

        if path == base_path {
            return Decision::Forbidden;
        }

        let restricted_path = format!("{base_path}/{}", req.user);
        if !is_under(path, &restricted_path) {
            return Decision::Forbidden;
        }

        Decision::Pass
    }
}

impl Authorizer for PathAuthorizer {
    fn user_header(&self) -> &str {
        &self.user_header
    }

    fn authorize_request(&self, req: &AuthzRequest) -> Decision {
        self.authorize(req)
    }
}

/// Reports whether `path` equals `prefix` or lies below it on a segment
/// boundary.
fn is_under(path: &str, prefix: &str) -> bool {
    match path.strip_prefix(prefix) {
        Some(rest) => rest.is_empty() || rest.starts_with('/'),
        None => false,
    }
}
