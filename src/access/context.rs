use indexmap::IndexMap;

/// Scope value meaning "any valid caller, no further restriction".
pub const VALID_SCOPE: &str = "<valid>";

/// One granted scope.
///
/// A scope is either a bare identifier (`widgets.read`) or an identifier
/// with a bracketed qualifier (`widgets.read[42]`). Only the identifier takes
/// part in access decisions; the qualifier is kept for callers that scope
/// individual records.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Scope {
    name: String,
    qualifier: Option<String>,
}

impl Scope {
    /// Parses `name` or `name[qualifier]`.
    ///
    /// # Examples
    ///
    /// ```
    /// use hypermedia_decorator::access::Scope;
    ///
    /// let scope = Scope::parse("orders[42]");
    /// assert_eq!(scope.name(), "orders");
    /// assert_eq!(scope.qualifier(), Some("42"));
    /// assert!(scope.has_qualifier());
    /// ```
    pub fn parse(raw: &str) -> Self {
        match raw.find('[') {
            Some(pos) => {
                let tail = &raw[pos + 1..];
                let qualifier = tail.strip_suffix(']').unwrap_or(tail);
                Self {
                    name: raw[..pos].to_owned(),
                    qualifier: Some(qualifier.to_owned()),
                }
            }
            None => Self {
                name: raw.to_owned(),
                qualifier: None,
            },
        }
    }

    /// The scope identifier.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The bracketed qualifier, if one was present.
    pub fn qualifier(&self) -> Option<&str> {
        self.qualifier.as_deref()
    }

    /// Returns true if the raw scope carried a qualifier.
    pub fn has_qualifier(&self) -> bool {
        self.qualifier.is_some()
    }
}

/// The caller's already-resolved authorization for one decoration call.
///
/// Holds granted scopes (scope mode) and/or a single role (role mode).
/// Created per call and never shared between calls.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AccessContext {
    request_id: Option<String>,
    scopes: IndexMap<String, Scope>,
    role: Option<String>,
}

impl AccessContext {
    /// A context with no scopes and no role.
    pub fn anonymous() -> Self {
        Self::default()
    }

    /// Builds a context from raw scope strings.
    ///
    /// A later scope with the same identifier replaces an earlier one.
    pub fn from_scopes<I, S>(scopes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let scopes = scopes
            .into_iter()
            .map(|raw| {
                let scope = Scope::parse(raw.as_ref());
                (scope.name.clone(), scope)
            })
            .collect();
        Self {
            request_id: None,
            scopes,
            role: None,
        }
    }

    /// Builds a context for a single role.
    pub fn for_role(role: impl Into<String>) -> Self {
        Self {
            request_id: None,
            scopes: IndexMap::new(),
            role: Some(role.into()),
        }
    }

    /// Attaches a request id, included in access-decision log events.
    pub fn with_request_id(mut self, request_id: impl Into<String>) -> Self {
        self.request_id = Some(request_id.into());
        self
    }

    /// Sets the role.
    pub fn with_role(mut self, role: impl Into<String>) -> Self {
        self.role = Some(role.into());
        self
    }

    /// The request id, if any.
    pub fn request_id(&self) -> Option<&str> {
        self.request_id.as_deref()
    }

    /// Returns true if a scope with this identifier was granted.
    pub fn has_scope(&self, name: &str) -> bool {
        self.scopes.contains_key(name)
    }

    /// Looks up a granted scope by identifier.
    pub fn scope(&self, name: &str) -> Option<&Scope> {
        self.scopes.get(name)
    }

    /// Granted scopes in the order they were given.
    pub fn scopes(&self) -> impl Iterator<Item = &Scope> {
        self.scopes.values()
    }

    /// The caller's role, if any.
    pub fn role(&self) -> Option<&str> {
        self.role.as_deref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bare_scope_has_no_qualifier() {
        let scope = Scope::parse("read");
        assert_eq!(scope.name(), "read");
        assert!(!scope.has_qualifier());
    }

    #[test]
    fn unterminated_qualifier_keeps_tail() {
        let scope = Scope::parse("read[7");
        assert_eq!(scope.name(), "read");
        assert_eq!(scope.qualifier(), Some("7"));
    }

    #[test]
    fn context_indexes_scopes_by_name() {
        let ctx = AccessContext::from_scopes(["read", "orders[42]"]);
        assert!(ctx.has_scope("read"));
        assert!(ctx.has_scope("orders"));
        assert!(!ctx.has_scope("orders[42]"));
        assert!(ctx.scope("orders").unwrap().has_qualifier());
        assert_eq!(ctx.scopes().count(), 2);
    }

    #[test]
    fn later_duplicate_scope_wins() {
        let ctx = AccessContext::from_scopes(vec!["a[1]".to_string(), "a".to_string()]);
        assert!(!ctx.scope("a").unwrap().has_qualifier());
    }

    #[test]
    fn role_context() {
        let ctx = AccessContext::for_role("admin").with_request_id("req-1");
        assert_eq!(ctx.role(), Some("admin"));
        assert_eq!(ctx.request_id(), Some("req-1"));
        assert_eq!(ctx.scopes().count(), 0);
    }
}
