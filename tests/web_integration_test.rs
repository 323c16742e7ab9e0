//! Integration tests for the web boundary.
//!
//! These tests walk the complete flow from request extraction through
//! content negotiation to a decorated response body.

use hypermedia_decorator::access::AccessContext;
use hypermedia_decorator::web::{negotiate, ExtractAccess, RequestAdapter};
use hypermedia_decorator::{
    ActionDescriptor, DecorationService, Document, EntityMetadata, LinkDescriptor, Payload,
    Placement, Record, HAL_JSON, SIREN_JSON,
};
use serde_json::json;

fn service() -> DecorationService {
    let service = DecorationService::builder().build();
    service.register(
        EntityMetadata::new("Invoice", "/invoices")
            .with_link(LinkDescriptor::new("self", "/invoices/{number}"))
            .with_action(
                ActionDescriptor::new("void", "POST", "/invoices/{number}/void").placed(Placement::Class),
            ),
    );
    service.add_access_rule("POST", "/invoices/{number}/void", ["invoices.admin"]);
    service
}

fn invoice() -> Payload {
    Payload::Record(
        Record::new("Invoice")
            .with_field("number", 1042u64)
            .with_field("paid", false),
    )
}

#[test]
fn siren_request_full_flow() {
    // Upstream authentication resolved the caller's scopes
    let mut request = RequestAdapter::new("req-siren-001");
    request.add_header("Accept", "application/vnd.siren+json");
    request.set_path_prefix("/billing");
    request.add_scope("invoices.admin");

    let decorated = service().decorate_request(&request, invoice());

    assert_eq!(decorated.media_type.as_deref(), Some(SIREN_JSON));
    let json = serde_json::to_value(&decorated.document).unwrap();
    assert_eq!(json["properties"], json!({ "number": 1042, "paid": false }));
    assert_eq!(json["links"][0]["href"], "/billing/invoices/1042");
    assert_eq!(json["actions"][0]["href"], "/billing/invoices/1042/void");
}

#[test]
fn missing_scope_hides_action_only() {
    let mut request = RequestAdapter::new("req-siren-002");
    request.add_header("accept", SIREN_JSON);
    request.add_scope("invoices.read");

    let decorated = service().decorate_request(&request, invoice());
    let json = serde_json::to_value(&decorated.document).unwrap();

    assert!(json.get("actions").is_none());
    assert_eq!(json["links"].as_array().unwrap().len(), 1);
}

#[test]
fn wildcard_accept_picks_a_renderer() {
    let mut request = RequestAdapter::new("req-any");
    request.add_header("Accept", "*/*");

    let decorated = service().decorate_request(&request, invoice());
    assert_eq!(decorated.media_type.as_deref(), Some(HAL_JSON));
    assert!(matches!(decorated.document, Document::Hal(_)));
}

#[test]
fn unacceptable_request_is_passed_through() {
    let mut request = RequestAdapter::new("req-html");
    request.add_header("Accept", "text/html");

    let decorated = service().decorate_request(&request, invoice());
    assert_eq!(decorated.media_type, None);
    assert_eq!(decorated.document, Document::Payload(invoice()));
}

#[test]
fn custom_extractor_drives_decoration() {
    // A framework integration that keeps its own request type
    struct GatewayRequest {
        id: String,
        role: String,
    }

    impl ExtractAccess for GatewayRequest {
        fn extract_access(&self) -> AccessContext {
            AccessContext::for_role(&self.role).with_request_id(&self.id)
        }

        fn accept(&self) -> Option<&str> {
            Some("application/hal+json;q=0.5, application/vnd.collection+json;q=0.1")
        }

        fn path_prefix(&self) -> &str {
            "/gw"
        }
    }

    let request = GatewayRequest {
        id: "req-gw-1".to_string(),
        role: "clerk".to_string(),
    };
    let decorated = service().decorate_request(&request, invoice());

    assert_eq!(decorated.media_type.as_deref(), Some(HAL_JSON));
    let json = serde_json::to_value(&decorated.document).unwrap();
    assert_eq!(json["_links"]["self"]["href"], "/gw/invoices/1042");
}

#[test]
fn negotiation_uses_registered_media_types() {
    let service = service();
    assert_eq!(
        negotiate("application/vnd.collection+json", &service.media_types()),
        Some("application/vnd.collection+json")
    );
    assert_eq!(negotiate("application/json", &service.media_types()), None);
}
