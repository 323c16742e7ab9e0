//! Property tests for href resolution, registration and access rules.
//!
//! These validate invariants that must hold for any input rather than for
//! hand-picked examples.

use hypermedia_decorator::access::{AccessContext, AccessFilter, AccessMode, AccessTarget};
use hypermedia_decorator::{
    resolve, substitute, EntityMetadata, LinkDescriptor, MetadataRegistry, Payload, PropertyBag,
};
use proptest::prelude::*;

// Strategy: field names as they appear in templates
fn arb_field() -> impl Strategy<Value = String> {
    prop::string::string_regex("[a-z][a-z_]{0,8}").unwrap()
}

// Strategy: template text without any braces
fn arb_literal() -> impl Strategy<Value = String> {
    prop::string::string_regex("[a-zA-Z0-9/._?=&-]{0,24}").unwrap()
}

fn bag_with(field: &str, value: i64) -> PropertyBag {
    let mut bag = PropertyBag::new();
    bag.insert(field, Payload::from(value));
    bag
}

proptest! {
    /// Property: resolution never panics, whatever the template looks like
    #[test]
    fn proptest_resolve_never_panics(
        template in ".{0,64}",
        prefix in ".{0,16}",
        value in any::<i64>()
    ) {
        let bag = bag_with("id", value);
        let out = resolve(&template, &prefix, &bag);
        prop_assert!(out.starts_with(&prefix));
    }

    /// Property: a template without placeholders is only prefixed
    #[test]
    fn proptest_literal_templates_are_only_prefixed(
        template in arb_literal(),
        prefix in arb_literal()
    ) {
        let bag = bag_with("id", 1);
        prop_assert_eq!(resolve(&template, &prefix, &bag), format!("{}{}", prefix, template));
    }

    /// Property: `{f+N}` and `{f-N}` are integer arithmetic on the field
    #[test]
    fn proptest_offsets_are_arithmetic(
        field in arb_field(),
        value in -1_000_000i64..1_000_000,
        offset in 0i64..1_000_000
    ) {
        let bag = bag_with(&field, value);
        let plus = substitute(&format!("/x/{{{}+{}}}", field, offset), &bag);
        let minus = substitute(&format!("/x/{{{}-{}}}", field, offset), &bag);
        prop_assert_eq!(plus, format!("/x/{}", value + offset));
        prop_assert_eq!(minus, format!("/x/{}", value - offset));
    }

    /// Property: placeholders for absent fields are left untouched
    #[test]
    fn proptest_missing_fields_stay_literal(
        field in arb_field(),
        offset in prop::option::of(0u32..100)
    ) {
        let body = match offset {
            Some(n) => format!("{}+{}", field, n),
            None => field.clone(),
        };
        let template = format!("/items/{{{}}}", body);
        prop_assert_eq!(substitute(&template, &PropertyBag::new()), template);
    }

    /// Property: substituted values are never rescanned for placeholders
    #[test]
    fn proptest_substitution_is_single_pass(field in arb_field()) {
        prop_assume!(field != "a");
        let mut bag = PropertyBag::new();
        bag.insert("a", Payload::from(format!("{{{}}}", field)));
        bag.insert(field.as_str(), Payload::from("boom"));

        prop_assert_eq!(substitute("{a}", &bag), format!("{{{}}}", field));
    }

    /// Property: registering the same metadata twice equals registering once
    #[test]
    fn proptest_registration_is_idempotent(
        class in "[A-Z][a-z]{1,8}",
        relations in prop::collection::vec(arb_field(), 0..5)
    ) {
        let meta = relations.iter().fold(
            EntityMetadata::new(class.clone(), format!("/{}", class.to_lowercase())),
            |meta, rel| meta.with_link(LinkDescriptor::new(rel.clone(), format!("/{}/{{id}}", rel))),
        );

        let once = MetadataRegistry::new();
        once.register(meta.clone());
        let twice = MetadataRegistry::new();
        twice.register(meta.clone());
        twice.register(meta);

        prop_assert_eq!(once.len(), twice.len());
        prop_assert_eq!(once.lookup(&class), twice.lookup(&class));
    }

    /// Property: in scope mode, an unconfigured path is visible to everyone
    #[test]
    fn proptest_unconfigured_paths_are_visible(
        path in "/[a-z]{1,10}",
        method in prop_oneof![Just("GET"), Just("POST"), Just("PUT"), Just("DELETE")],
        scopes in prop::collection::vec("[a-z]{1,6}", 0..4)
    ) {
        let filter = AccessFilter::new(AccessMode::Scopes);
        filter.add_access_rule("GET", "/configured", ["read"]);

        let target = AccessTarget { class: "Any", method, path: &path };
        prop_assume!(path != "/configured");
        prop_assert!(filter.is_visible(&target, &AccessContext::from_scopes(&scopes)));
    }

    /// Property: a configured path is visible exactly when a granted scope matches
    #[test]
    fn proptest_configured_paths_need_a_matching_scope(
        allowed in prop::collection::vec("[a-z]{1,4}", 1..4),
        granted in prop::collection::vec("[a-z]{1,4}", 0..4)
    ) {
        let filter = AccessFilter::new(AccessMode::Scopes);
        filter.add_access_rule("GET", "/widgets", allowed.iter().cloned());

        let target = AccessTarget { class: "Widget", method: "GET", path: "/widgets" };
        let expected = granted.iter().any(|g| allowed.contains(g));
        prop_assert_eq!(filter.is_visible(&target, &AccessContext::from_scopes(&granted)), expected);
    }
}
