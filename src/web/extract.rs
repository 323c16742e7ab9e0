//! Extraction boundary trait for web integration.

use crate::access::AccessContext;

/// Extracts decoration inputs from a framework-specific request.
///
/// Implementations only map framework types to engine types. They do not
/// authenticate the caller and do not decide visibility; the access policy
/// does that during decoration.
///
/// # Examples
///
/// ```
/// use hypermedia_decorator::access::AccessContext;
/// use hypermedia_decorator::web::ExtractAccess;
///
/// struct MyFrameworkRequest {
///     request_id: String,
///     granted: Vec<String>,
/// }
///
/// impl ExtractAccess for MyFrameworkRequest {
///     fn extract_access(&self) -> AccessContext {
///         AccessContext::from_scopes(&self.granted).with_request_id(&self.request_id)
///     }
/// }
///
/// let req = MyFrameworkRequest { request_id: "r-1".into(), granted: vec!["read".into()] };
/// assert!(req.extract_access().has_scope("read"));
/// assert_eq!(req.accept(), None);
/// ```
pub trait ExtractAccess {
    /// The caller's already-resolved scopes and role.
    fn extract_access(&self) -> AccessContext;

    /// The raw `Accept` header, if the request carried one.
    fn accept(&self) -> Option<&str> {
        None
    }

    /// Prefix prepended to every resolved href.
    fn path_prefix(&self) -> &str {
        ""
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct TestRequest {
        role: Option<String>,
    }

    impl ExtractAccess for TestRequest {
        fn extract_access(&self) -> AccessContext {
            match &self.role {
                Some(role) => AccessContext::for_role(role),
                None => AccessContext::anonymous(),
            }
        }
    }

    #[test]
    fn extract_access_trait_works() {
        let req = TestRequest {
            role: Some("admin".to_string()),
        };
        assert_eq!(req.extract_access().role(), Some("admin"));
    }

    #[test]
    fn defaults_are_empty() {
        let req = TestRequest { role: None };
        assert_eq!(req.accept(), None);
        assert_eq!(req.path_prefix(), "");
        assert_eq!(req.extract_access(), AccessContext::anonymous());
    }
}
