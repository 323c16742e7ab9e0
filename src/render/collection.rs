use serde::Serialize;

use super::{Document, FormatRenderer, RenderContext, ResolvedLink};
use crate::metadata::{EntityMetadata, Membership};
use crate::payload::{Payload, PropertyBag, Record};
use crate::walker::{SubEntity, SubEntityValue, Traversal};

/// Collection+JSON media type.
pub const COLLECTION_JSON: &str = "application/vnd.collection+json";

const VERSION: &str = "1.0";

/// The `{ "collection": ... }` envelope.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CollectionDocument {
    /// The collection
    pub collection: CollectionBody,
}

/// Body of a Collection+JSON document.
///
/// Only `version`, `href`, `links` and `items` are produced; `queries`,
/// `template` and `error` are not.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CollectionBody {
    /// Always `1.0`
    pub version: String,
    /// Resolved href of the collection
    pub href: String,
    /// Collection-level links
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub links: Vec<CollectionLink>,
    /// Items in traversal order
    pub items: Vec<CollectionItem>,
}

/// One item.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CollectionItem {
    /// Resolved base href of the item's class
    pub href: String,
    /// Plain properties as name/value pairs
    pub data: Vec<DataField>,
    /// Item links
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub links: Vec<CollectionLink>,
}

/// A `{name, value}` pair.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DataField {
    /// Property name
    pub name: String,
    /// Raw property value
    pub value: Payload,
}

/// A Collection+JSON link.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CollectionLink {
    /// Relation
    pub rel: String,
    /// Resolved href
    pub href: String,
    /// Optional name
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// Optional prompt, taken from the link title
    #[serde(skip_serializing_if = "Option::is_none")]
    pub prompt: Option<String>,
}

impl From<ResolvedLink<'_>> for CollectionLink {
    fn from(link: ResolvedLink<'_>) -> Self {
        let d = link.descriptor;
        Self {
            rel: d.relation.clone(),
            href: link.href,
            name: d.name.clone(),
            prompt: d.title.clone(),
        }
    }
}

/// Renders `application/vnd.collection+json`.
///
/// A single record becomes the first item, followed by its sub-entities in
/// traversal order. A bare list yields one item per member. Actions have no
/// counterpart in this format and are not rendered.
#[derive(Debug, Clone, Copy, Default)]
pub struct CollectionRenderer;

impl FormatRenderer for CollectionRenderer {
    fn media_type(&self) -> &str {
        COLLECTION_JSON
    }

    fn render(&self, payload: &Payload, ctx: &RenderContext<'_>) -> Document {
        let mut items = Vec::new();
        let (href, links) = match ctx.walker().classify(payload) {
            Traversal::Entity(view) => {
                self.items(view.record, Membership::Single, 0, ctx, &mut items);
                let href = items.first().map(|i| i.href.clone()).unwrap_or_default();
                (href, Vec::new())
            }
            Traversal::Collection(view) => {
                for member in view.members {
                    self.member(member, 1, ctx, &mut items);
                }
                let empty = PropertyBag::new();
                match ctx.collection_metadata(view.element_class) {
                    Some(meta) => (
                        ctx.resolve(&meta.base_href, &empty),
                        links(ctx, Some(meta), Membership::Single, &empty),
                    ),
                    None => (ctx.resolve("", &empty), Vec::new()),
                }
            }
            Traversal::Scalar(value) => {
                items.push(CollectionItem {
                    href: String::new(),
                    data: vec![DataField {
                        name: "value".to_owned(),
                        value: value.clone(),
                    }],
                    links: Vec::new(),
                });
                (ctx.resolve("", &PropertyBag::new()), Vec::new())
            }
        };

        Document::Collection(CollectionDocument {
            collection: CollectionBody {
                version: VERSION.to_owned(),
                href,
                links,
                items,
            },
        })
    }
}

impl CollectionRenderer {
    /// Appends the record's item, then the items of its sub-entities.
    fn items(
        &self,
        record: &Record,
        membership: Membership,
        depth: usize,
        ctx: &RenderContext<'_>,
        out: &mut Vec<CollectionItem>,
    ) {
        let view = ctx.view(record, depth);
        let meta = ctx.metadata(&record.class);
        out.push(CollectionItem {
            href: meta
                .map(|m| ctx.resolve(&m.base_href, &view.properties))
                .unwrap_or_default(),
            links: links(ctx, meta, membership, &view.properties),
            data: view
                .properties
                .iter()
                .map(|(name, value)| DataField {
                    name: name.to_owned(),
                    value: value.clone(),
                })
                .collect(),
        });

        for SubEntity { value, .. } in view.sub_entities {
            match value {
                SubEntityValue::Single(inner) => {
                    self.items(inner, Membership::Single, depth + 1, ctx, out)
                }
                SubEntityValue::List(members) => {
                    for member in members {
                        self.member(member, depth + 1, ctx, out);
                    }
                }
            }
        }
    }

    fn member(&self, member: &Payload, depth: usize, ctx: &RenderContext<'_>, out: &mut Vec<CollectionItem>) {
        if let Payload::Record(record) = member {
            self.items(record, Membership::ListItem, depth, ctx, out);
        }
    }
}

fn links(
    ctx: &RenderContext<'_>,
    meta: Option<&EntityMetadata>,
    membership: Membership,
    bag: &PropertyBag,
) -> Vec<CollectionLink> {
    meta.map(|meta| {
        ctx.visible_links(meta, membership, bag)
            .into_iter()
            .map(CollectionLink::from)
            .collect()
    })
    .unwrap_or_default()
}
