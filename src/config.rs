//! Startup configuration for a [`DecorationService`](crate::DecorationService).

use serde::Deserialize;

use crate::access::AccessMode;
use crate::error::Error;

/// Default maximum sub-entity nesting depth.
pub const DEFAULT_MAX_DEPTH: usize = 32;

/// Decorator configuration.
///
/// # Examples
///
/// ```
/// use hypermedia_decorator::{access::AccessMode, DecoratorConfig};
///
/// let cfg = DecoratorConfig::from_json(r#"{
///     "access_mode": "roles",
///     "security_enabled": true,
///     "role_permissions": [{ "resource": "Widget", "role": "admin", "permissions": "read,update" }]
/// }"#).unwrap();
///
/// assert_eq!(cfg.access_mode, AccessMode::Roles);
/// assert_eq!(cfg.max_depth, 32);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields, default)]
pub struct DecoratorConfig {
    /// Which access strategy is active
    pub access_mode: AccessMode,
    /// Role-mode enforcement switch
    pub security_enabled: bool,
    /// Maximum sub-entity nesting depth
    pub max_depth: usize,
    /// Scope-mode rules
    pub access_rules: Vec<AccessRuleConfig>,
    /// Role-mode permissions
    pub role_permissions: Vec<RolePermissionConfig>,
}

impl Default for DecoratorConfig {
    fn default() -> Self {
        Self {
            access_mode: AccessMode::Scopes,
            security_enabled: false,
            max_depth: DEFAULT_MAX_DEPTH,
            access_rules: Vec::new(),
            role_permissions: Vec::new(),
        }
    }
}

impl DecoratorConfig {
    /// Parses a JSON configuration document.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] if the document is malformed or has unknown keys.
    pub fn from_json(json: &str) -> Result<Self, Error> {
        serde_json::from_str(json).map_err(Error::Config)
    }
}

/// `addAccessRule(method, path, scopes...)` as data.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AccessRuleConfig {
    /// HTTP method
    pub method: String,
    /// Unresolved href template
    pub path: String,
    /// Scopes allowed to see it
    pub scopes: Vec<String>,
}

/// `addRolePermission(resource, role, permissions)` as data.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RolePermissionConfig {
    /// Class name
    pub resource: String,
    /// Role name
    pub role: String,
    /// Comma-separated permission tokens
    pub permissions: String,
}
