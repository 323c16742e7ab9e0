//! Access filtering for links and actions.
//!
//! Two strategies are supported and exactly one is active per filter:
//!
//! - **Scope mode** (default): rules map `METHOD:path` to the scopes that may
//!   see it. Unconfigured pairs are visible, and the [`VALID_SCOPE`] marker
//!   admits any caller.
//! - **Role mode**: rules map `(class, role)` to a comma-separated permission
//!   list checked against the token derived from the HTTP method. Enforcement
//!   stays off until [`AccessFilter::enable_security`] is called; once on, a
//!   missing permission denies.
//!
//! Denied links and actions are silently dropped from the output.

mod context;
mod policy;

use std::sync::Arc;

use parking_lot::RwLock;

pub use context::{AccessContext, Scope, VALID_SCOPE};
pub use policy::{permission_for_method, AccessMode, AccessPolicy, AccessTarget};

/// Shared, mutable access configuration.
///
/// Mutation (startup wiring) swaps in a new [`AccessPolicy`]; every
/// decoration call works from one [`snapshot`](Self::snapshot).
///
/// # Examples
///
/// ```
/// use hypermedia_decorator::access::{AccessContext, AccessFilter, AccessMode, AccessTarget};
///
/// let filter = AccessFilter::new(AccessMode::Scopes);
/// filter.add_access_rule("GET", "/widgets", ["read"]);
///
/// let target = AccessTarget { class: "Widget", method: "GET", path: "/widgets" };
/// assert!(filter.is_visible(&target, &AccessContext::from_scopes(["read"])));
/// assert!(!filter.is_visible(&target, &AccessContext::from_scopes(["write"])));
/// ```
#[derive(Debug, Default)]
pub struct AccessFilter {
    policy: RwLock<Arc<AccessPolicy>>,
}

impl AccessFilter {
    /// Creates a filter with no rules.
    pub fn new(mode: AccessMode) -> Self {
        Self {
            policy: RwLock::new(Arc::new(AccessPolicy::new(mode))),
        }
    }

    /// The active mode.
    pub fn mode(&self) -> AccessMode {
        self.policy.read().mode()
    }

    /// Registers the scopes allowed to see `method` on `path`.
    ///
    /// Replaces any earlier rule for the same pair.
    pub fn add_access_rule<I, S>(&self, method: &str, path: &str, scopes: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let scopes: Vec<String> = scopes.into_iter().map(Into::into).collect();
        self.update(|policy| {
            if policy.mode() != AccessMode::Scopes {
                tracing::warn!(method, path, "scope rule added while role mode is active");
            }
            policy.add_scope_rule(method, path, scopes);
        });
    }

    /// Registers the comma-separated permissions a role has on a class.
    pub fn add_role_permission(&self, resource: &str, role: &str, permissions: &str) {
        self.update(|policy| {
            if policy.mode() != AccessMode::Roles {
                tracing::warn!(resource, role, "role permission added while scope mode is active");
            }
            policy.add_role_permission(resource, role, permissions);
        });
    }

    /// Turns role-mode enforcement on.
    pub fn enable_security(&self) {
        self.update(|policy| policy.set_security_enabled(true));
    }

    /// Returns the policy as it is right now.
    pub fn snapshot(&self) -> Arc<AccessPolicy> {
        Arc::clone(&*self.policy.read())
    }

    /// Convenience for `snapshot().is_visible(..)`.
    pub fn is_visible(&self, target: &AccessTarget<'_>, ctx: &AccessContext) -> bool {
        self.snapshot().is_visible(target, ctx)
    }

    fn update(&self, change: impl FnOnce(&mut AccessPolicy)) {
        let mut guard = self.policy.write();
        let mut next = (**guard).clone();
        change(&mut next);
        *guard = Arc::new(next);
    }
}
