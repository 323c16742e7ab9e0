use std::collections::HashMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use super::context::{AccessContext, VALID_SCOPE};

/// Which access decision strategy a deployment uses.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AccessMode {
    /// Scope sets registered per `METHOD:path`
    #[default]
    Scopes,
    /// Permission strings registered per class and role
    Roles,
}

impl fmt::Display for AccessMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AccessMode::Scopes => write!(f, "scopes"),
            AccessMode::Roles => write!(f, "roles"),
        }
    }
}

/// The link or action being checked.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AccessTarget<'a> {
    /// Class the link/action points at
    pub class: &'a str,
    /// HTTP method; links are checked as `GET`
    pub method: &'a str,
    /// The unresolved href template
    pub path: &'a str,
}

/// Maps an HTTP method to the permission token checked in role mode.
///
/// ```
/// use hypermedia_decorator::access::permission_for_method;
///
/// assert_eq!(permission_for_method("GET"), "read");
/// assert_eq!(permission_for_method("patch"), "other");
/// ```
pub fn permission_for_method(method: &str) -> &'static str {
    match method.to_ascii_uppercase().as_str() {
        "GET" => "read",
        "POST" => "create",
        "PUT" => "update",
        "DELETE" => "delete",
        _ => "other",
    }
}

/// An immutable set of access rules with one active mode.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AccessPolicy {
    mode: AccessMode,
    security_enabled: bool,
    scope_rules: HashMap<String, Vec<String>>,
    role_permissions: HashMap<(String, String), String>,
}

impl AccessPolicy {
    /// Creates an empty policy in the given mode.
    pub fn new(mode: AccessMode) -> Self {
        Self {
            mode,
            ..Self::default()
        }
    }

    /// The active mode.
    pub fn mode(&self) -> AccessMode {
        self.mode
    }

    /// Whether role-mode enforcement is on.
    pub fn security_enabled(&self) -> bool {
        self.security_enabled
    }

    pub(crate) fn set_security_enabled(&mut self, enabled: bool) {
        self.security_enabled = enabled;
    }

    pub(crate) fn add_scope_rule(&mut self, method: &str, path: &str, scopes: Vec<String>) {
        self.scope_rules.insert(scope_key(method, path), scopes);
    }

    pub(crate) fn add_role_permission(&mut self, resource: &str, role: &str, permissions: &str) {
        self.role_permissions.insert(
            (resource.to_owned(), role.to_owned()),
            permissions.to_owned(),
        );
    }

    /// Decides whether a link/action is visible to the caller.
    ///
    /// Only the active mode's rules are consulted.
    pub fn is_visible(&self, target: &AccessTarget<'_>, ctx: &AccessContext) -> bool {
        let visible = match self.mode {
            AccessMode::Scopes => self.scope_allows(target, ctx),
            AccessMode::Roles => self.role_allows(target, ctx),
        };
        tracing::debug!(
            request_id = ctx.request_id().unwrap_or_default(),
            mode = %self.mode,
            method = target.method,
            path = target.path,
            class = target.class,
            visible,
            "access decision"
        );
        visible
    }

    fn scope_allows(&self, target: &AccessTarget<'_>, ctx: &AccessContext) -> bool {
        match self.scope_rules.get(&scope_key(target.method, target.path)) {
            None => true,
            Some(scopes) => scopes
                .iter()
                .any(|scope| scope == VALID_SCOPE || ctx.has_scope(scope)),
        }
    }

    fn role_allows(&self, target: &AccessTarget<'_>, ctx: &AccessContext) -> bool {
        if !self.security_enabled {
            return true;
        }
        let Some(role) = ctx.role() else {
            return false;
        };
        let wanted = permission_for_method(target.method);
        self.role_permissions
            .get(&(target.class.to_owned(), role.to_owned()))
            .is_some_and(|granted| granted.split(',').any(|p| p.trim() == wanted))
    }
}

fn scope_key(method: &str, path: &str) -> String {
    format!("{}:{}", method.to_ascii_uppercase(), path)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn link(path: &str) -> AccessTarget<'_> {
        AccessTarget {
            class: "widget",
            method: "GET",
            path,
        }
    }

    fn scoped() -> AccessPolicy {
        let mut policy = AccessPolicy::new(AccessMode::Scopes);
        policy.add_scope_rule("GET", "/widgets", vec!["read".into()]);
        policy.add_scope_rule("GET", "/status", vec![VALID_SCOPE.into()]);
        policy.add_scope_rule("GET", "/locked", vec![]);
        policy
    }

    #[test]
    fn scope_mode_requires_a_matching_scope() {
        let policy = scoped();
        assert!(policy.is_visible(&link("/widgets"), &AccessContext::from_scopes(["read"])));
        assert!(!policy.is_visible(&link("/widgets"), &AccessContext::from_scopes(["write"])));
    }

    #[test]
    fn scope_mode_matches_scope_names_without_qualifier() {
        let policy = scoped();
        assert!(policy.is_visible(&link("/widgets"), &AccessContext::from_scopes(["read[9]"])));
    }

    #[test]
    fn scope_mode_allows_unconfigured_paths() {
        let policy = scoped();
        assert!(policy.is_visible(&link("/elsewhere"), &AccessContext::anonymous()));
    }

    #[test]
    fn scope_mode_keys_on_method_and_path() {
        let policy = scoped();
        let delete = AccessTarget {
            class: "widget",
            method: "DELETE",
            path: "/widgets",
        };
        assert!(policy.is_visible(&delete, &AccessContext::anonymous()));
    }

    #[test]
    fn valid_marker_admits_any_caller() {
        let policy = scoped();
        assert!(policy.is_visible(&link("/status"), &AccessContext::anonymous()));
    }

    #[test]
    fn empty_scope_list_denies() {
        let policy = scoped();
        assert!(!policy.is_visible(&link("/locked"), &AccessContext::from_scopes(["read"])));
    }

    fn roles() -> AccessPolicy {
        let mut policy = AccessPolicy::new(AccessMode::Roles);
        policy.add_role_permission("widget", "admin", "read,update");
        policy.set_security_enabled(true);
        policy
    }

    #[test]
    fn role_mode_checks_permission_tokens() {
        let policy = roles();
        let admin = AccessContext::for_role("admin");
        let get = AccessTarget {
            class: "widget",
            method: "GET",
            path: "/w",
        };
        let delete = AccessTarget {
            method: "DELETE",
            ..get
        };
        let put = AccessTarget { method: "PUT", ..get };
        assert!(policy.is_visible(&get, &admin));
        assert!(policy.is_visible(&put, &admin));
        assert!(!policy.is_visible(&delete, &admin));
    }

    #[test]
    fn role_mode_denies_unknown_role_and_missing_role() {
        let policy = roles();
        assert!(!policy.is_visible(&link("/w"), &AccessContext::for_role("guest")));
        assert!(!policy.is_visible(&link("/w"), &AccessContext::anonymous()));
    }

    #[test]
    fn role_mode_tokens_match_exactly() {
        let mut policy = AccessPolicy::new(AccessMode::Roles);
        policy.add_role_permission("widget", "viewer", "readonly");
        policy.set_security_enabled(true);
        assert!(!policy.is_visible(&link("/w"), &AccessContext::for_role("viewer")));
    }

    #[test]
    fn role_mode_is_open_until_security_is_enabled() {
        let mut policy = AccessPolicy::new(AccessMode::Roles);
        policy.add_role_permission("widget", "admin", "read");
        assert!(policy.is_visible(&link("/w"), &AccessContext::anonymous()));
    }

    #[test]
    fn inactive_mode_rules_are_ignored() {
        let mut policy = roles();
        policy.add_scope_rule("GET", "/w", vec!["nobody".into()]);
        assert!(policy.is_visible(&link("/w"), &AccessContext::for_role("admin")));
    }

    #[test]
    fn method_tokens() {
        assert_eq!(permission_for_method("POST"), "create");
        assert_eq!(permission_for_method("put"), "update");
        assert_eq!(permission_for_method("DELETE"), "delete");
        assert_eq!(permission_for_method("OPTIONS"), "other");
    }
}
