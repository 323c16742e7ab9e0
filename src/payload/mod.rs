//! Schema-less view of a response payload.
//!
//! The decorator never sees the caller's concrete types. Instead every
//! payload is captured once into a [`Payload`] tree, which keeps the piece of
//! runtime type information the decoration engine needs: the class name of
//! each structured record.

mod ser;

use indexmap::IndexMap;
use serde::ser::{SerializeMap, SerializeSeq};
use serde::{Serialize, Serializer};

pub(crate) use ser::type_class;
pub use ser::{to_payload, to_payload_with_limit, to_record, PayloadError, DEFAULT_CAPTURE_DEPTH};

/// A captured response payload.
///
/// # Examples
///
/// ```
/// use hypermedia_decorator::{to_payload, Payload};
/// use serde::Serialize;
///
/// #[derive(Serialize)]
/// struct Widget {
///     id: u32,
///     name: String,
/// }
///
/// let payload = to_payload(&Widget { id: 7, name: "gear".into() }).unwrap();
/// assert_eq!(payload.class_name(), Some("Widget"));
/// ```
#[derive(Debug, Clone, PartialEq)]
pub enum Payload {
    /// A leaf value
    Scalar(Scalar),
    /// A named structured record
    Record(Record),
    /// An ordered sequence
    List(Vec<Payload>),
    /// A keyed collection without a class name
    Map(IndexMap<String, Payload>),
}

impl Payload {
    /// Returns the record's class name, or `None` for anything that is not a record.
    pub fn class_name(&self) -> Option<&str> {
        match self {
            Payload::Record(record) => Some(&record.class),
            _ => None,
        }
    }

    /// Returns the record if this payload is one.
    pub fn as_record(&self) -> Option<&Record> {
        match self {
            Payload::Record(record) => Some(record),
            _ => None,
        }
    }

    /// Returns the scalar if this payload is one.
    pub fn as_scalar(&self) -> Option<&Scalar> {
        match self {
            Payload::Scalar(scalar) => Some(scalar),
            _ => None,
        }
    }

    /// Returns the first member of a list or map.
    ///
    /// Collections are classified by their first member, so this is the
    /// only element the walker inspects.
    pub fn first_member(&self) -> Option<&Payload> {
        match self {
            Payload::List(items) => items.first(),
            Payload::Map(entries) => entries.values().next(),
            _ => None,
        }
    }

    /// Returns the members of a list or map in order.
    pub fn members(&self) -> Vec<&Payload> {
        match self {
            Payload::List(items) => items.iter().collect(),
            Payload::Map(entries) => entries.values().collect(),
            _ => Vec::new(),
        }
    }

    /// Returns true for lists and maps.
    pub fn is_collection(&self) -> bool {
        matches!(self, Payload::List(_) | Payload::Map(_))
    }

    /// Names a class-less map as a record of `class`.
    ///
    /// Every other payload is returned unchanged.
    pub fn into_record(self, class: impl Into<String>) -> Payload {
        match self {
            Payload::Map(fields) => Payload::Record(Record {
                class: class.into(),
                fields,
            }),
            other => other,
        }
    }
}

impl From<Scalar> for Payload {
    fn from(scalar: Scalar) -> Self {
        Payload::Scalar(scalar)
    }
}

impl From<Record> for Payload {
    fn from(record: Record) -> Self {
        Payload::Record(record)
    }
}

impl From<i64> for Payload {
    fn from(v: i64) -> Self {
        Payload::Scalar(Scalar::Int(v))
    }
}

impl From<u64> for Payload {
    fn from(v: u64) -> Self {
        Payload::Scalar(Scalar::UInt(v))
    }
}

impl From<f64> for Payload {
    fn from(v: f64) -> Self {
        Payload::Scalar(Scalar::Float(v))
    }
}

impl From<bool> for Payload {
    fn from(v: bool) -> Self {
        Payload::Scalar(Scalar::Bool(v))
    }
}

impl From<&str> for Payload {
    fn from(v: &str) -> Self {
        Payload::Scalar(Scalar::Str(v.to_owned()))
    }
}

impl From<String> for Payload {
    fn from(v: String) -> Self {
        Payload::Scalar(Scalar::Str(v))
    }
}

/// A structured record: a class name plus its fields in declaration order.
#[derive(Debug, Clone, PartialEq)]
pub struct Record {
    /// Runtime type name of the record
    pub class: String,
    /// Fields in declaration order
    pub fields: IndexMap<String, Payload>,
}

impl Record {
    /// Creates an empty record of the given class.
    pub fn new(class: impl Into<String>) -> Self {
        Self {
            class: class.into(),
            fields: IndexMap::new(),
        }
    }

    /// Appends a field and returns the record for chaining.
    pub fn with_field(mut self, name: impl Into<String>, value: impl Into<Payload>) -> Self {
        self.fields.insert(name.into(), value.into());
        self
    }
}

/// A leaf value inside a payload.
#[derive(Debug, Clone, PartialEq)]
pub enum Scalar {
    /// Unit, `None`, or an explicit null
    Null,
    /// Boolean
    Bool(bool),
    /// Signed integer
    Int(i64),
    /// Unsigned integer
    UInt(u64),
    /// Floating point number
    Float(f64),
    /// String or character
    Str(String),
    /// Raw bytes
    Bytes(Vec<u8>),
}

impl Scalar {
    /// Returns the value as a wide integer if it is integral.
    pub fn as_integer(&self) -> Option<i128> {
        match self {
            Scalar::Int(v) => Some(i128::from(*v)),
            Scalar::UInt(v) => Some(i128::from(*v)),
            _ => None,
        }
    }

    /// Returns the canonical string form used in href substitution.
    ///
    /// Integers are base 10, booleans `true`/`false`, floats scientific
    /// (`1.5e0`), strings verbatim. Null and bytes have no canonical form.
    pub fn canonical_string(&self) -> Option<String> {
        match self {
            Scalar::Int(v) => Some(v.to_string()),
            Scalar::UInt(v) => Some(v.to_string()),
            Scalar::Bool(v) => Some(v.to_string()),
            Scalar::Float(v) => Some(format!("{:e}", v)),
            Scalar::Str(v) => Some(v.clone()),
            Scalar::Null | Scalar::Bytes(_) => None,
        }
    }
}

impl Serialize for Payload {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Payload::Scalar(scalar) => scalar.serialize(serializer),
            Payload::Record(record) => {
                let mut map = serializer.serialize_map(Some(record.fields.len()))?;
                for (name, value) in &record.fields {
                    map.serialize_entry(name, value)?;
                }
                map.end()
            }
            Payload::List(items) => {
                let mut seq = serializer.serialize_seq(Some(items.len()))?;
                for item in items {
                    seq.serialize_element(item)?;
                }
                seq.end()
            }
            Payload::Map(entries) => {
                let mut map = serializer.serialize_map(Some(entries.len()))?;
                for (key, value) in entries {
                    map.serialize_entry(key, value)?;
                }
                map.end()
            }
        }
    }
}

impl Serialize for Scalar {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Scalar::Null => serializer.serialize_unit(),
            Scalar::Bool(v) => serializer.serialize_bool(*v),
            Scalar::Int(v) => serializer.serialize_i64(*v),
            Scalar::UInt(v) => serializer.serialize_u64(*v),
            Scalar::Float(v) => serializer.serialize_f64(*v),
            Scalar::Str(v) => serializer.serialize_str(v),
            Scalar::Bytes(v) => serializer.serialize_bytes(v),
        }
    }
}

/// The flat name-to-value mapping of an entity instance's plain fields.
///
/// Built fresh for every traversed record and used as the substitution
/// input for href templates. Field order is preserved.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PropertyBag {
    entries: IndexMap<String, Payload>,
}

impl PropertyBag {
    /// Creates an empty bag.
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts a property, replacing any previous value under the same name.
    pub fn insert(&mut self, name: impl Into<String>, value: Payload) {
        self.entries.insert(name.into(), value);
    }

    /// Looks up a property by name.
    pub fn get(&self, name: &str) -> Option<&Payload> {
        self.entries.get(name)
    }

    /// Returns true if the bag holds a property with this name.
    pub fn contains(&self, name: &str) -> bool {
        self.entries.contains_key(name)
    }

    /// Number of properties.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns true if there are no properties.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Iterates over properties in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Payload)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Consumes the bag, returning the ordered map.
    pub fn into_inner(self) -> IndexMap<String, Payload> {
        self.entries
    }
}

impl<K: Into<String>> FromIterator<(K, Payload)> for PropertyBag {
    fn from_iter<I: IntoIterator<Item = (K, Payload)>>(iter: I) -> Self {
        Self {
            entries: iter.into_iter().map(|(k, v)| (k.into(), v)).collect(),
        }
    }
}

impl Serialize for PropertyBag {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.entries.serialize(serializer)
    }
}
