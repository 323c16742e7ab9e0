use indexmap::IndexMap;
use serde::Serialize;

use super::{Document, FormatRenderer, RenderContext, ResolvedLink};
use crate::metadata::{EntityMetadata, Membership};
use crate::payload::{Payload, PropertyBag, Record};
use crate::walker::{SubEntityValue, Traversal};

/// HAL media type.
pub const HAL_JSON: &str = "application/hal+json";

const RESERVED_KEYS: [&str; 2] = ["_links", "_embedded"];

/// A HAL resource: `_links`, `_embedded` and the plain properties.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct HalResource {
    /// Relation name to link (or, under `curies`, the curie list)
    #[serde(rename = "_links", skip_serializing_if = "IndexMap::is_empty")]
    pub links: IndexMap<String, HalLinkEntry>,
    /// Embedded resources
    #[serde(rename = "_embedded", skip_serializing_if = "HalEmbedded::is_empty")]
    pub embedded: HalEmbedded,
    /// Plain properties
    #[serde(flatten)]
    pub properties: PropertyBag,
}

/// A value under `_links`.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum HalLinkEntry {
    /// An ordinary link
    Link(HalLink),
    /// The `curies` array
    Curies(Vec<HalCurie>),
}

/// A HAL link object. Empty attributes are omitted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HalLink {
    /// Resolved href
    pub href: String,
    /// Whether the href is a URI template
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub templated: bool,
    /// Media type hint
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub media_type: Option<String>,
    /// Secondary key
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// Human-readable label
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
}

impl From<ResolvedLink<'_>> for HalLink {
    fn from(link: ResolvedLink<'_>) -> Self {
        let d = link.descriptor;
        Self {
            href: link.href,
            templated: d.templated,
            media_type: d.media_type.clone(),
            name: d.name.clone(),
            title: d.title.clone(),
        }
    }
}

/// A documentation curie.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HalCurie {
    /// Prefix
    pub name: String,
    /// Documentation href, usually templated with `{rel}`
    pub href: String,
    /// Whether the href is a URI template
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub templated: bool,
}

/// Contents of `_embedded`.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum HalEmbedded {
    /// Sub-entities keyed by field name
    Named(IndexMap<String, HalMember>),
    /// Members of a bare list payload
    List(Vec<HalMember>),
}

impl Default for HalEmbedded {
    fn default() -> Self {
        HalEmbedded::Named(IndexMap::new())
    }
}

impl HalEmbedded {
    /// Returns true if nothing is embedded.
    pub fn is_empty(&self) -> bool {
        match self {
            HalEmbedded::Named(map) => map.is_empty(),
            HalEmbedded::List(list) => list.is_empty(),
        }
    }
}

/// One embedded value.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum HalMember {
    /// A decorated resource
    Resource(Box<HalResource>),
    /// Several decorated resources
    Resources(Vec<HalMember>),
    /// A collection member that is not a record, kept as data
    Value(Payload),
}

/// Renders `application/hal+json`.
///
/// Bare scalar payloads are passed through unchanged.
#[derive(Debug, Clone, Copy, Default)]
pub struct HalRenderer;

impl FormatRenderer for HalRenderer {
    fn media_type(&self) -> &str {
        HAL_JSON
    }

    fn render(&self, payload: &Payload, ctx: &RenderContext<'_>) -> Document {
        match ctx.walker().classify(payload) {
            Traversal::Entity(view) => {
                let class = view.class();
                let mut resource = self.resource(view.record, Membership::Single, 0, ctx);
                if let Some(meta) = ctx.metadata(class) {
                    insert_curies(&mut resource.links, meta);
                }
                Document::Hal(resource)
            }
            Traversal::Collection(view) => {
                let mut links = IndexMap::new();
                if let Some(meta) = ctx.collection_metadata(view.element_class) {
                    insert_links(&mut links, ctx.visible_links(meta, Membership::Single, &PropertyBag::new()));
                    insert_curies(&mut links, meta);
                }
                let members = view
                    .members
                    .into_iter()
                    .map(|member| self.member(member, 1, ctx))
                    .collect();
                Document::Hal(HalResource {
                    links,
                    embedded: HalEmbedded::List(members),
                    properties: PropertyBag::new(),
                })
            }
            Traversal::Scalar(value) => Document::Payload(value.clone()),
        }
    }
}

impl HalRenderer {
    fn resource(
        &self,
        record: &Record,
        membership: Membership,
        depth: usize,
        ctx: &RenderContext<'_>,
    ) -> HalResource {
        let view = ctx.view(record, depth);

        let mut links = IndexMap::new();
        if let Some(meta) = ctx.metadata(&record.class) {
            insert_links(&mut links, ctx.visible_links(meta, membership, &view.properties));
        }

        let mut embedded = IndexMap::new();
        for sub in view.sub_entities {
            let member = match sub.value {
                SubEntityValue::Single(inner) => HalMember::Resource(Box::new(self.resource(
                    inner,
                    Membership::Single,
                    depth + 1,
                    ctx,
                ))),
                SubEntityValue::List(members) => HalMember::Resources(
                    members
                        .into_iter()
                        .map(|m| self.member(m, depth + 1, ctx))
                        .collect(),
                ),
            };
            embedded.insert(sub.field.to_owned(), member);
        }

        HalResource {
            links,
            embedded: HalEmbedded::Named(embedded),
            properties: without_reserved(view.properties, &record.class),
        }
    }

    fn member(&self, member: &Payload, depth: usize, ctx: &RenderContext<'_>) -> HalMember {
        match member {
            Payload::Record(record) => HalMember::Resource(Box::new(self.resource(
                record,
                Membership::ListItem,
                depth,
                ctx,
            ))),
            other => HalMember::Value(other.clone()),
        }
    }
}

/// Drops plain properties that would collide with `_links` or `_embedded`.
///
/// Links are resolved from the full bag before this runs.
fn without_reserved(properties: PropertyBag, class: &str) -> PropertyBag {
    if !RESERVED_KEYS.iter().any(|key| properties.contains(key)) {
        return properties;
    }
    properties
        .into_inner()
        .into_iter()
        .filter(|(name, _)| {
            let reserved = RESERVED_KEYS.contains(&name.as_str());
            if reserved {
                tracing::warn!(class, property = %name, "property shadows a reserved HAL key, dropped");
            }
            !reserved
        })
        .collect()
}

fn insert_links(links: &mut IndexMap<String, HalLinkEntry>, resolved: Vec<ResolvedLink<'_>>) {
    for link in resolved {
        links.insert(
            link.descriptor.relation.clone(),
            HalLinkEntry::Link(HalLink::from(link)),
        );
    }
}

fn insert_curies(links: &mut IndexMap<String, HalLinkEntry>, meta: &EntityMetadata) {
    if meta.curies.is_empty() {
        return;
    }
    let curies = meta
        .curies
        .iter()
        .map(|c| HalCurie {
            name: c.name.clone(),
            href: c.href_template.clone(),
            templated: c.templated,
        })
        .collect();
    links.insert("curies".to_owned(), HalLinkEntry::Curies(curies));
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::metadata::{CurieDescriptor, LinkDescriptor, Placement};
    use crate::registry::MetadataRegistry;
    use crate::render::test_support::Fixture;

    fn registry() -> MetadataRegistry {
        let registry = MetadataRegistry::new();
        registry.register(
            EntityMetadata::new("Widget", "/widgets")
                .with_link(LinkDescriptor::new("self", "/widgets/{id}").titled("Widget"))
                .with_link(LinkDescriptor::new("edit", "/widgets/{id}/edit").placed(Placement::Class))
                .with_curie(CurieDescriptor::new("doc", "/docs/{rel}", true)),
        );
        registry.register(
            EntityMetadata::new("Part", "/parts")
                .with_link(LinkDescriptor::new("self", "/parts/{sku}")),
        );
        registry
    }

    fn render(registry: &MetadataRegistry, payload: &Payload) -> serde_json::Value {
        let fixture = Fixture::new(registry);
        serde_json::to_value(HalRenderer.render(payload, &fixture.ctx())).unwrap()
    }

    fn part(sku: &str) -> Payload {
        Payload::Record(Record::new("Part").with_field("sku", sku))
    }

    #[test]
    fn renders_links_curies_and_properties() {
        let widget = Payload::Record(Record::new("Widget").with_field("id", 7u64).with_field("name", "gear"));
        let doc = render(&registry(), &widget);

        assert_eq!(
            doc,
            json!({
                "_links": {
                    "self": { "href": "/api/widgets/7", "title": "Widget" },
                    "edit": { "href": "/api/widgets/7/edit" },
                    "curies": [{ "name": "doc", "href": "/docs/{rel}", "templated": true }]
                },
                "id": 7,
                "name": "gear"
            })
        );
    }

    #[test]
    fn reserved_property_names_do_not_replace_links() {
        let widget = Payload::Record(
            Record::new("Widget")
                .with_field("id", 7u64)
                .with_field("_links", "x")
                .with_field("_embedded", 1u64),
        );
        let doc = render(&registry(), &widget);

        assert_eq!(doc["_links"]["self"]["href"], "/api/widgets/7");
        assert_eq!(doc["id"], 7);
        assert!(doc.get("_embedded").is_none());

        let Document::Hal(resource) = HalRenderer.render(&widget, &Fixture::new(&registry()).ctx()) else {
            panic!("expected a hal resource");
        };
        assert_eq!(resource.properties.len(), 1);
        let text = serde_json::to_string(&resource).unwrap();
        assert_eq!(text.matches("\"_links\"").count(), 1);
    }

    #[test]
    fn embeds_sub_entities_with_their_own_links() {
        let widget = Payload::Record(
            Record::new("Widget")
                .with_field("id", 1u64)
                .with_field("main", part("m-1"))
                .with_field("spares", Payload::List(vec![part("s-1"), part("s-2")])),
        );
        let doc = render(&registry(), &widget);

        assert_eq!(doc["_embedded"]["main"]["_links"]["self"]["href"], "/api/parts/m-1");
        assert_eq!(doc["_embedded"]["main"]["sku"], "m-1");
        assert_eq!(doc["_embedded"]["spares"][1]["_links"]["self"]["href"], "/api/parts/s-2");
        assert!(doc.get("main").is_none());
        // curies only at the root
        assert!(doc["_embedded"]["main"]["_links"].get("curies").is_none());
    }

    #[test]
    fn list_members_use_list_placement() {
        let list = Payload::List(vec![
            Payload::Record(Record::new("Widget").with_field("id", 1u64)),
            Payload::Record(Record::new("Widget").with_field("id", 2u64)),
        ]);
        let doc = render(&registry(), &list);

        let members = doc["_embedded"].as_array().unwrap();
        assert_eq!(members.len(), 2);
        assert_eq!(members[1]["_links"]["self"]["href"], "/api/widgets/2");
        assert!(members[1]["_links"].get("edit").is_none());
        // collection links resolve against an empty bag
        assert_eq!(doc["_links"]["self"]["href"], "/api/widgets/{id}");
    }

    #[test]
    fn unregistered_records_carry_no_links() {
        let payload = Payload::Record(Record::new("Gadget").with_field("id", 1u64));
        assert_eq!(render(&registry(), &payload), json!({ "id": 1 }));
    }

    #[test]
    fn scalars_pass_through() {
        let fixture = Fixture::new(&registry());
        let scalar = Payload::from("plain");
        assert_eq!(
            HalRenderer.render(&scalar, &fixture.ctx()),
            Document::Payload(scalar.clone())
        );
    }
}
