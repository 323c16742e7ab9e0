use serde::Serialize;

use super::{Document, FormatRenderer, RenderContext, ResolvedAction, ResolvedLink};
use crate::metadata::{EntityMetadata, Membership};
use crate::payload::{Payload, PropertyBag, Record};
use crate::walker::{RecordView, SubEntity, SubEntityValue, Traversal};

/// Siren media type.
pub const SIREN_JSON: &str = "application/vnd.siren+json";

const LIST_ITEM: &str = "list-item";

/// A top-level Siren entity.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SirenDocument {
    /// Class of the payload (`[]Elem` for collections)
    #[serde(skip_serializing_if = "String::is_empty")]
    pub class: String,
    /// Entity title
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    /// Plain properties
    pub properties: Payload,
    /// Sub-entities and list members
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub entities: Vec<SirenEntity>,
    /// Visible actions
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub actions: Vec<SirenAction>,
    /// Visible links
    pub links: Vec<SirenLink>,
}

/// An embedded Siren entity.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SirenEntity {
    /// Class; list members carry a ` list-item` suffix
    #[serde(skip_serializing_if = "String::is_empty")]
    pub class: String,
    /// Relation to the parent
    pub rel: String,
    /// Plain properties
    pub properties: Payload,
    /// Nested sub-entities
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub entities: Vec<SirenEntity>,
    /// Visible actions
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub actions: Vec<SirenAction>,
    /// Visible links
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub links: Vec<SirenLink>,
}

/// A Siren action.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SirenAction {
    /// Action name
    pub name: String,
    /// Target class
    #[serde(skip_serializing_if = "String::is_empty")]
    pub class: String,
    /// HTTP method
    pub method: String,
    /// Resolved href
    pub href: String,
    /// Title
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    /// Request media type
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub media_type: Option<String>,
}

impl From<ResolvedAction<'_>> for SirenAction {
    fn from(action: ResolvedAction<'_>) -> Self {
        let d = action.descriptor;
        Self {
            name: d.name.clone(),
            class: d.target_class.clone(),
            method: d.method.clone(),
            href: action.href,
            title: d.title.clone(),
            media_type: d.media_type.clone(),
        }
    }
}

/// A Siren link.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SirenLink {
    /// Relation
    pub rel: String,
    /// Resolved href
    pub href: String,
    /// Target class
    #[serde(skip_serializing_if = "String::is_empty")]
    pub class: String,
    /// Title
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    /// Media type hint
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub media_type: Option<String>,
}

impl From<ResolvedLink<'_>> for SirenLink {
    fn from(link: ResolvedLink<'_>) -> Self {
        let d = link.descriptor;
        Self {
            rel: d.relation.clone(),
            href: link.href,
            class: d.target_class.clone(),
            title: d.title.clone(),
            media_type: d.media_type.clone(),
        }
    }
}

/// Renders `application/vnd.siren+json`.
#[derive(Debug, Clone, Copy, Default)]
pub struct SirenRenderer;

impl FormatRenderer for SirenRenderer {
    fn media_type(&self) -> &str {
        SIREN_JSON
    }

    fn render(&self, payload: &Payload, ctx: &RenderContext<'_>) -> Document {
        let doc = match ctx.walker().classify(payload) {
            Traversal::Entity(view) => {
                let RecordView {
                    record,
                    properties,
                    sub_entities,
                } = ctx.view(view.record, 0);
                let meta = ctx.metadata(&record.class);
                let (actions, links) = affordances(ctx, meta, Membership::Single, &properties);
                SirenDocument {
                    class: record.class.clone(),
                    title: meta.and_then(|m| m.title.clone()),
                    properties: Payload::Map(properties.into_inner()),
                    entities: self.sub_entities(sub_entities, 1, ctx),
                    actions,
                    links,
                }
            }
            Traversal::Collection(view) => {
                let meta = ctx.collection_metadata(view.element_class);
                let (actions, links) =
                    affordances(ctx, meta, Membership::Single, &PropertyBag::new());
                let class = view.class().unwrap_or_default();
                let entities = view
                    .members
                    .into_iter()
                    .map(|member| {
                        let rel = member.class_name().unwrap_or_default().to_owned();
                        self.member(member, rel, 1, ctx)
                    })
                    .collect();
                SirenDocument {
                    class,
                    title: meta.and_then(|m| m.title.clone()),
                    properties: Payload::Map(Default::default()),
                    entities,
                    actions,
                    links,
                }
            }
            Traversal::Scalar(value) => SirenDocument {
                class: String::new(),
                title: None,
                properties: value.clone(),
                entities: Vec::new(),
                actions: Vec::new(),
                links: Vec::new(),
            },
        };
        Document::Siren(doc)
    }
}

impl SirenRenderer {
    fn sub_entities(
        &self,
        subs: Vec<SubEntity<'_>>,
        depth: usize,
        ctx: &RenderContext<'_>,
    ) -> Vec<SirenEntity> {
        let mut entities = Vec::new();
        for sub in subs {
            match sub.value {
                SubEntityValue::Single(record) => {
                    entities.push(self.entity(record, sub.field.to_owned(), Membership::Single, depth, ctx));
                }
                SubEntityValue::List(members) => {
                    entities.extend(
                        members
                            .into_iter()
                            .map(|m| self.member(m, sub.field.to_owned(), depth, ctx)),
                    );
                }
            }
        }
        entities
    }

    fn member(&self, member: &Payload, rel: String, depth: usize, ctx: &RenderContext<'_>) -> SirenEntity {
        match member {
            Payload::Record(record) => self.entity(record, rel, Membership::ListItem, depth, ctx),
            other => SirenEntity {
                class: String::new(),
                rel,
                properties: other.clone(),
                entities: Vec::new(),
                actions: Vec::new(),
                links: Vec::new(),
            },
        }
    }

    fn entity(
        &self,
        record: &Record,
        rel: String,
        membership: Membership,
        depth: usize,
        ctx: &RenderContext<'_>,
    ) -> SirenEntity {
        let RecordView {
            properties,
            sub_entities,
            ..
        } = ctx.view(record, depth);
        let meta = ctx.metadata(&record.class);
        let (actions, links) = affordances(ctx, meta, membership, &properties);
        let class = match membership {
            Membership::Single => record.class.clone(),
            Membership::ListItem => format!("{} {}", record.class, LIST_ITEM),
        };
        SirenEntity {
            class,
            rel,
            entities: self.sub_entities(sub_entities, depth + 1, ctx),
            properties: Payload::Map(properties.into_inner()),
            actions,
            links,
        }
    }
}

fn affordances(
    ctx: &RenderContext<'_>,
    meta: Option<&EntityMetadata>,
    membership: Membership,
    bag: &PropertyBag,
) -> (Vec<SirenAction>, Vec<SirenLink>) {
    let Some(meta) = meta else {
        return (Vec::new(), Vec::new());
    };
    let actions = ctx
        .visible_actions(meta, membership, bag)
        .into_iter()
        .map(SirenAction::from)
        .collect();
    let links = ctx
        .visible_links(meta, membership, bag)
        .into_iter()
        .map(SirenLink::from)
        .collect();
    (actions, links)
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::access::{AccessContext, AccessFilter, AccessMode};
    use crate::metadata::{ActionDescriptor, LinkDescriptor, Placement};
    use crate::registry::MetadataRegistry;
    use crate::render::test_support::Fixture;

    fn registry() -> MetadataRegistry {
        let registry = MetadataRegistry::new();
        registry.register(
            EntityMetadata::new("Order", "/orders")
                .with_link(LinkDescriptor::new("self", "/orders/{id}"))
                .with_action(
                    ActionDescriptor::new("cancel", "delete", "/orders/{id}").placed(Placement::Class),
                ),
        );
        registry.register(
            EntityMetadata::new("Line", "/lines")
                .with_link(LinkDescriptor::new("self", "/lines/{no}").placed(Placement::List))
                .with_link(LinkDescriptor::new("order", "/orders/{order_id}").targeting("Order")),
        );
        registry
    }

    fn line(no: u64) -> Payload {
        Payload::Record(Record::new("Line").with_field("no", no).with_field("order_id", 9u64))
    }

    fn order() -> Payload {
        Payload::Record(
            Record::new("Order")
                .with_field("id", 9u64)
                .with_field("lines", Payload::List(vec![line(1), line(2)])),
        )
    }

    #[test]
    fn renders_entity_with_actions_and_members() {
        let fixture = Fixture::new(&registry());
        let doc = serde_json::to_value(SirenRenderer.render(&order(), &fixture.ctx())).unwrap();

        assert_eq!(doc["class"], "Order");
        assert_eq!(doc["properties"], json!({ "id": 9 }));
        assert_eq!(
            doc["actions"],
            json!([{ "name": "cancel", "method": "DELETE", "href": "/api/orders/9" }])
        );
        assert_eq!(doc["links"], json!([{ "rel": "self", "href": "/api/orders/9" }]));

        let entities = doc["entities"].as_array().unwrap();
        assert_eq!(entities.len(), 2);
        assert_eq!(entities[0]["class"], "Line list-item");
        assert_eq!(entities[0]["rel"], "lines");
        // each member resolves against its own bag
        assert_eq!(entities[1]["links"][0]["href"], "/api/lines/2");
        assert_eq!(entities[1]["links"][1]["class"], "Order");
    }

    #[test]
    fn denied_actions_are_omitted() {
        let filter = AccessFilter::new(AccessMode::Scopes);
        filter.add_access_rule("DELETE", "/orders/{id}", ["orders.admin"]);
        let mut fixture = Fixture::with_access(&registry(), &filter);
        fixture.caller = AccessContext::from_scopes(["orders.read"]);

        let Document::Siren(doc) = SirenRenderer.render(&order(), &fixture.ctx()) else {
            panic!("expected a siren document");
        };
        assert!(doc.actions.is_empty());
        assert_eq!(doc.links.len(), 1);
    }

    #[test]
    fn top_level_list_uses_element_class() {
        let fixture = Fixture::new(&registry());
        let list = Payload::List(vec![line(1), line(2)]);
        let Document::Siren(doc) = SirenRenderer.render(&list, &fixture.ctx()) else {
            panic!("expected a siren document");
        };

        assert_eq!(doc.class, "[]Line");
        assert_eq!(doc.entities.len(), 2);
        assert_eq!(doc.entities[0].rel, "Line");
        assert_eq!(doc.entities[0].class, "Line list-item");
        // `self` is list-placed; only `order` applies to the collection
        assert_eq!(doc.links.len(), 1);
        assert_eq!(doc.links[0].href, "/api/orders/{order_id}");
    }

    #[test]
    fn scalars_become_properties() {
        let fixture = Fixture::new(&registry());
        let doc = serde_json::to_value(SirenRenderer.render(&Payload::from(5i64), &fixture.ctx())).unwrap();
        assert_eq!(doc, json!({ "properties": 5, "links": [] }));
    }
}
