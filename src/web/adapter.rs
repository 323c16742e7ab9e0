//! Request adapter for mapping HTTP requests to decoration inputs.

use std::collections::HashMap;

use crate::access::AccessContext;

use super::ExtractAccess;

/// Framework-agnostic view of one HTTP request.
///
/// Holds simple owned data so no framework's request type leaks into the
/// engine. Framework integrations build one per request, typically through a
/// `From<FrameworkRequest>` impl.
///
/// # Examples
///
/// ```
/// use hypermedia_decorator::web::{ExtractAccess, RequestAdapter};
///
/// let mut adapter = RequestAdapter::new("req-12345");
/// adapter.add_scope("widgets.read");
/// adapter.add_header("Accept", "application/hal+json");
///
/// let access = adapter.extract_access();
/// assert_eq!(access.request_id(), Some("req-12345"));
/// assert!(access.has_scope("widgets.read"));
/// assert_eq!(adapter.accept(), Some("application/hal+json"));
/// ```
#[derive(Debug, Clone, Default)]
pub struct RequestAdapter {
    request_id: String,
    /// Header names are stored lowercased
    headers: HashMap<String, String>,
    path_prefix: String,
    scopes: Vec<String>,
    role: Option<String>,
}

impl RequestAdapter {
    /// Creates an adapter with the given request id and nothing else.
    pub fn new(request_id: impl Into<String>) -> Self {
        Self {
            request_id: request_id.into(),
            ..Self::default()
        }
    }

    /// Adds a header. Names are case-insensitive; a repeated name replaces the value.
    pub fn add_header(&mut self, name: impl AsRef<str>, value: impl Into<String>) {
        self.headers
            .insert(name.as_ref().to_ascii_lowercase(), value.into());
    }

    /// Sets the path the API is mounted under, prepended to every href.
    pub fn set_path_prefix(&mut self, prefix: impl Into<String>) {
        self.path_prefix = prefix.into();
    }

    /// Adds a granted scope, as resolved by upstream authentication.
    pub fn add_scope(&mut self, scope: impl Into<String>) {
        self.scopes.push(scope.into());
    }

    /// Sets the caller's role, as resolved by upstream authentication.
    pub fn set_role(&mut self, role: Option<String>) {
        self.role = role;
    }

    /// Returns the request id.
    pub fn request_id(&self) -> &str {
        &self.request_id
    }

    /// Looks up a header by case-insensitive name.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .get(&name.to_ascii_lowercase())
            .map(String::as_str)
    }

    /// The granted scopes, unparsed.
    pub fn scopes(&self) -> &[String] {
        &self.scopes
    }

    /// The caller's role, if any.
    pub fn role(&self) -> Option<&str> {
        self.role.as_deref()
    }
}

impl ExtractAccess for RequestAdapter {
    fn extract_access(&self) -> AccessContext {
        let mut ctx = AccessContext::from_scopes(&self.scopes).with_request_id(&self.request_id);
        if let Some(role) = &self.role {
            ctx = ctx.with_role(role);
        }
        ctx
    }

    fn accept(&self) -> Option<&str> {
        self.header("accept")
    }

    fn path_prefix(&self) -> &str {
        &self.path_prefix
    }
}
