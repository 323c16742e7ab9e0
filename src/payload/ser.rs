//! Captures any `Serialize` value as a [`Payload`].
//!
//! serde hands us the struct name in `serialize_struct`, which is exactly the
//! runtime class name the registry is keyed by.

use std::fmt;

use indexmap::IndexMap;
use serde::ser::{self, Impossible, Serialize};

use super::{Payload, Record, Scalar};

/// Default nesting limit for [`to_payload`].
pub const DEFAULT_CAPTURE_DEPTH: usize = 128;

/// Error returned when a value cannot be captured as a payload.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PayloadError {
    /// A map key was not a string, integer, char or bool
    #[error("map keys must be strings, integers, chars or bools")]
    KeyMustBeString,
    /// The value nests deeper than the capture limit
    #[error("value nests deeper than {limit} levels")]
    TooDeep {
        /// The limit that was exceeded
        limit: usize,
    },
    /// An integer does not fit in 64 bits
    #[error("integer {0} does not fit in 64 bits")]
    IntegerOutOfRange(String),
    /// The value's own `Serialize` impl reported an error
    #[error("{0}")]
    Custom(String),
}

impl ser::Error for PayloadError {
    fn custom<T: fmt::Display>(msg: T) -> Self {
        PayloadError::Custom(msg.to_string())
    }
}

/// Captures a value as a [`Payload`] with the default nesting limit.
///
/// serde serializes a struct that has a `#[serde(flatten)]` field as a map,
/// and does not pass on the struct name. Such a value is captured as a
/// [`Payload::Map`], not a [`Payload::Record`]. Use [`to_record`] to
/// capture it under a known class name.
///
/// # Errors
///
/// Returns a [`PayloadError`] if the value has non-string map keys, nests
/// deeper than [`DEFAULT_CAPTURE_DEPTH`], or its `Serialize` impl fails.
pub fn to_payload<T: ?Sized + Serialize>(value: &T) -> Result<Payload, PayloadError> {
    to_payload_with_limit(value, DEFAULT_CAPTURE_DEPTH)
}

/// Captures a value as a record of class `class`.
///
/// A value that serde reported as a map (a struct with flattened fields, or
/// an actual map) becomes a record with the map's entries as its fields.
/// Anything else is captured as [`to_payload`] would capture it.
///
/// # Errors
///
/// Same as [`to_payload`].
pub fn to_record<T: ?Sized + Serialize>(value: &T, class: &str) -> Result<Payload, PayloadError> {
    Ok(to_payload(value)?.into_record(class))
}

/// The unqualified Rust name of `T`, without generic arguments.
///
/// Matches the name serde reports for a struct without a `rename`.
pub(crate) fn type_class<T: ?Sized>() -> &'static str {
    let full = std::any::type_name::<T>();
    let base = full.split('<').next().unwrap_or(full);
    base.rsplit("::").next().unwrap_or(base)
}

/// Captures a value as a [`Payload`], rejecting anything nested deeper than `limit`.
pub fn to_payload_with_limit<T: ?Sized + Serialize>(
    value: &T,
    limit: usize,
) -> Result<Payload, PayloadError> {
    value.serialize(PayloadSerializer { depth: 0, limit })
}

#[derive(Debug, Clone, Copy)]
struct PayloadSerializer {
    depth: usize,
    limit: usize,
}

impl PayloadSerializer {
    fn descend(self) -> Result<Self, PayloadError> {
        if self.depth >= self.limit {
            return Err(PayloadError::TooDeep { limit: self.limit });
        }
        Ok(Self {
            depth: self.depth + 1,
            limit: self.limit,
        })
    }
}

fn scalar(value: Scalar) -> Result<Payload, PayloadError> {
    Ok(Payload::Scalar(value))
}

fn tagged(variant: &'static str, inner: Payload) -> Payload {
    let mut entries = IndexMap::with_capacity(1);
    entries.insert(variant.to_owned(), inner);
    Payload::Map(entries)
}

impl ser::Serializer for PayloadSerializer {
    type Ok = Payload;
    type Error = PayloadError;

    type SerializeSeq = SeqCollector;
    type SerializeTuple = SeqCollector;
    type SerializeTupleStruct = SeqCollector;
    type SerializeTupleVariant = VariantSeqCollector;
    type SerializeMap = MapCollector;
    type SerializeStruct = RecordCollector;
    type SerializeStructVariant = VariantRecordCollector;

    fn serialize_bool(self, v: bool) -> Result<Payload, PayloadError> {
        scalar(Scalar::Bool(v))
    }

    fn serialize_i8(self, v: i8) -> Result<Payload, PayloadError> {
        scalar(Scalar::Int(i64::from(v)))
    }

    fn serialize_i16(self, v: i16) -> Result<Payload, PayloadError> {
        scalar(Scalar::Int(i64::from(v)))
    }

    fn serialize_i32(self, v: i32) -> Result<Payload, PayloadError> {
        scalar(Scalar::Int(i64::from(v)))
    }

    fn serialize_i64(self, v: i64) -> Result<Payload, PayloadError> {
        scalar(Scalar::Int(v))
    }

    fn serialize_i128(self, v: i128) -> Result<Payload, PayloadError> {
        if let Ok(v) = i64::try_from(v) {
            scalar(Scalar::Int(v))
        } else if let Ok(v) = u64::try_from(v) {
            scalar(Scalar::UInt(v))
        } else {
            Err(PayloadError::IntegerOutOfRange(v.to_string()))
        }
    }

    fn serialize_u8(self, v: u8) -> Result<Payload, PayloadError> {
        scalar(Scalar::UInt(u64::from(v)))
    }

    fn serialize_u16(self, v: u16) -> Result<Payload, PayloadError> {
        scalar(Scalar::UInt(u64::from(v)))
    }

    fn serialize_u32(self, v: u32) -> Result<Payload, PayloadError> {
        scalar(Scalar::UInt(u64::from(v)))
    }

    fn serialize_u64(self, v: u64) -> Result<Payload, PayloadError> {
        scalar(Scalar::UInt(v))
    }

    fn serialize_u128(self, v: u128) -> Result<Payload, PayloadError> {
        u64::try_from(v)
            .map(|v| Payload::Scalar(Scalar::UInt(v)))
            .map_err(|_| PayloadError::IntegerOutOfRange(v.to_string()))
    }

    fn serialize_f32(self, v: f32) -> Result<Payload, PayloadError> {
        scalar(Scalar::Float(f64::from(v)))
    }

    fn serialize_f64(self, v: f64) -> Result<Payload, PayloadError> {
        scalar(Scalar::Float(v))
    }

    fn serialize_char(self, v: char) -> Result<Payload, PayloadError> {
        scalar(Scalar::Str(v.to_string()))
    }

    fn serialize_str(self, v: &str) -> Result<Payload, PayloadError> {
        scalar(Scalar::Str(v.to_owned()))
    }

    fn serialize_bytes(self, v: &[u8]) -> Result<Payload, PayloadError> {
        scalar(Scalar::Bytes(v.to_vec()))
    }

    fn serialize_none(self) -> Result<Payload, PayloadError> {
        scalar(Scalar::Null)
    }

    fn serialize_some<T: ?Sized + Serialize>(self, value: &T) -> Result<Payload, PayloadError> {
        value.serialize(self)
    }

    fn serialize_unit(self) -> Result<Payload, PayloadError> {
        scalar(Scalar::Null)
    }

    fn serialize_unit_struct(self, _name: &'static str) -> Result<Payload, PayloadError> {
        scalar(Scalar::Null)
    }

    fn serialize_unit_variant(
        self,
        _name: &'static str,
        _index: u32,
        variant: &'static str,
    ) -> Result<Payload, PayloadError> {
        scalar(Scalar::Str(variant.to_owned()))
    }

    fn serialize_newtype_struct<T: ?Sized + Serialize>(
        self,
        _name: &'static str,
        value: &T,
    ) -> Result<Payload, PayloadError> {
        value.serialize(self)
    }

    fn serialize_newtype_variant<T: ?Sized + Serialize>(
        self,
        _name: &'static str,
        _index: u32,
        variant: &'static str,
        value: &T,
    ) -> Result<Payload, PayloadError> {
        let inner = value.serialize(self.descend()?)?;
        Ok(tagged(variant, inner))
    }

    fn serialize_seq(self, len: Option<usize>) -> Result<SeqCollector, PayloadError> {
        Ok(SeqCollector {
            ser: self.descend()?,
            items: Vec::with_capacity(len.unwrap_or(0)),
        })
    }

    fn serialize_tuple(self, len: usize) -> Result<SeqCollector, PayloadError> {
        self.serialize_seq(Some(len))
    }

    fn serialize_tuple_struct(
        self,
        _name: &'static str,
        len: usize,
    ) -> Result<SeqCollector, PayloadError> {
        self.serialize_seq(Some(len))
    }

    fn serialize_tuple_variant(
        self,
        _name: &'static str,
        _index: u32,
        variant: &'static str,
        len: usize,
    ) -> Result<VariantSeqCollector, PayloadError> {
        Ok(VariantSeqCollector {
            variant,
            inner: self.serialize_seq(Some(len))?,
        })
    }

    fn serialize_map(self, len: Option<usize>) -> Result<MapCollector, PayloadError> {
        Ok(MapCollector {
            ser: self.descend()?,
            entries: IndexMap::with_capacity(len.unwrap_or(0)),
            pending_key: None,
        })
    }

    fn serialize_struct(self, name: &'static str, len: usize) -> Result<RecordCollector, PayloadError> {
        Ok(RecordCollector {
            ser: self.descend()?,
            record: Record {
                class: name.to_owned(),
                fields: IndexMap::with_capacity(len),
            },
        })
    }

    fn serialize_struct_variant(
        self,
        _name: &'static str,
        _index: u32,
        variant: &'static str,
        len: usize,
    ) -> Result<VariantRecordCollector, PayloadError> {
        Ok(VariantRecordCollector {
            variant,
            inner: self.serialize_struct(variant, len)?,
        })
    }
}

#[doc(hidden)]
pub struct SeqCollector {
    ser: PayloadSerializer,
    items: Vec<Payload>,
}

impl ser::SerializeSeq for SeqCollector {
    type Ok = Payload;
    type Error = PayloadError;

    fn serialize_element<T: ?Sized + Serialize>(&mut self, value: &T) -> Result<(), PayloadError> {
        self.items.push(value.serialize(self.ser)?);
        Ok(())
    }

    fn end(self) -> Result<Payload, PayloadError> {
        Ok(Payload::List(self.items))
    }
}

impl ser::SerializeTuple for SeqCollector {
    type Ok = Payload;
    type Error = PayloadError;

    fn serialize_element<T: ?Sized + Serialize>(&mut self, value: &T) -> Result<(), PayloadError> {
        ser::SerializeSeq::serialize_element(self, value)
    }

    fn end(self) -> Result<Payload, PayloadError> {
        ser::SerializeSeq::end(self)
    }
}

impl ser::SerializeTupleStruct for SeqCollector {
    type Ok = Payload;
    type Error = PayloadError;

    fn serialize_field<T: ?Sized + Serialize>(&mut self, value: &T) -> Result<(), PayloadError> {
        ser::SerializeSeq::serialize_element(self, value)
    }

    fn end(self) -> Result<Payload, PayloadError> {
        ser::SerializeSeq::end(self)
    }
}

#[doc(hidden)]
pub struct VariantSeqCollector {
    variant: &'static str,
    inner: SeqCollector,
}

impl ser::SerializeTupleVariant for VariantSeqCollector {
    type Ok = Payload;
    type Error = PayloadError;

    fn serialize_field<T: ?Sized + Serialize>(&mut self, value: &T) -> Result<(), PayloadError> {
        ser::SerializeSeq::serialize_element(&mut self.inner, value)
    }

    fn end(self) -> Result<Payload, PayloadError> {
        let inner = ser::SerializeSeq::end(self.inner)?;
        Ok(tagged(self.variant, inner))
    }
}

#[doc(hidden)]
pub struct MapCollector {
    ser: PayloadSerializer,
    entries: IndexMap<String, Payload>,
    pending_key: Option<String>,
}

impl ser::SerializeMap for MapCollector {
    type Ok = Payload;
    type Error = PayloadError;

    fn serialize_key<T: ?Sized + Serialize>(&mut self, key: &T) -> Result<(), PayloadError> {
        self.pending_key = Some(key.serialize(KeySerializer)?);
        Ok(())
    }

    fn serialize_value<T: ?Sized + Serialize>(&mut self, value: &T) -> Result<(), PayloadError> {
        let key = self
            .pending_key
            .take()
            .ok_or_else(|| PayloadError::Custom("map value serialized before its key".into()))?;
        self.entries.insert(key, value.serialize(self.ser)?);
        Ok(())
    }

    fn end(self) -> Result<Payload, PayloadError> {
        Ok(Payload::Map(self.entries))
    }
}

#[doc(hidden)]
pub struct RecordCollector {
    ser: PayloadSerializer,
    record: Record,
}

impl ser::SerializeStruct for RecordCollector {
    type Ok = Payload;
    type Error = PayloadError;

    fn serialize_field<T: ?Sized + Serialize>(
        &mut self,
        key: &'static str,
        value: &T,
    ) -> Result<(), PayloadError> {
        let value = value.serialize(self.ser)?;
        self.record.fields.insert(key.to_owned(), value);
        Ok(())
    }

    fn end(self) -> Result<Payload, PayloadError> {
        Ok(Payload::Record(self.record))
    }
}

#[doc(hidden)]
pub struct VariantRecordCollector {
    variant: &'static str,
    inner: RecordCollector,
}

impl ser::SerializeStructVariant for VariantRecordCollector {
    type Ok = Payload;
    type Error = PayloadError;

    fn serialize_field<T: ?Sized + Serialize>(
        &mut self,
        key: &'static str,
        value: &T,
    ) -> Result<(), PayloadError> {
        ser::SerializeStruct::serialize_field(&mut self.inner, key, value)
    }

    fn end(self) -> Result<Payload, PayloadError> {
        let inner = ser::SerializeStruct::end(self.inner)?;
        Ok(tagged(self.variant, inner))
    }
}

/// Turns map keys into strings, the way JSON encoders do.
struct KeySerializer;

impl ser::Serializer for KeySerializer {
    type Ok = String;
    type Error = PayloadError;

    type SerializeSeq = Impossible<String, PayloadError>;
    type SerializeTuple = Impossible<String, PayloadError>;
    type SerializeTupleStruct = Impossible<String, PayloadError>;
    type SerializeTupleVariant = Impossible<String, PayloadError>;
    type SerializeMap = Impossible<String, PayloadError>;
    type SerializeStruct = Impossible<String, PayloadError>;
    type SerializeStructVariant = Impossible<String, PayloadError>;

    fn serialize_bool(self, v: bool) -> Result<String, PayloadError> {
        Ok(v.to_string())
    }

    fn serialize_i8(self, v: i8) -> Result<String, PayloadError> {
        Ok(v.to_string())
    }

    fn serialize_i16(self, v: i16) -> Result<String, PayloadError> {
        Ok(v.to_string())
    }

    fn serialize_i32(self, v: i32) -> Result<String, PayloadError> {
        Ok(v.to_string())
    }

    fn serialize_i64(self, v: i64) -> Result<String, PayloadError> {
        Ok(v.to_string())
    }

    fn serialize_u8(self, v: u8) -> Result<String, PayloadError> {
        Ok(v.to_string())
    }

    fn serialize_u16(self, v: u16) -> Result<String, PayloadError> {
        Ok(v.to_string())
    }

    fn serialize_u32(self, v: u32) -> Result<String, PayloadError> {
        Ok(v.to_string())
    }

    fn serialize_u64(self, v: u64) -> Result<String, PayloadError> {
        Ok(v.to_string())
    }

    fn serialize_f32(self, _v: f32) -> Result<String, PayloadError> {
        Err(PayloadError::KeyMustBeString)
    }

    fn serialize_f64(self, _v: f64) -> Result<String, PayloadError> {
        Err(PayloadError::KeyMustBeString)
    }

    fn serialize_char(self, v: char) -> Result<String, PayloadError> {
        Ok(v.to_string())
    }

    fn serialize_str(self, v: &str) -> Result<String, PayloadError> {
        Ok(v.to_owned())
    }

    fn serialize_bytes(self, _v: &[u8]) -> Result<String, PayloadError> {
        Err(PayloadError::KeyMustBeString)
    }

    fn serialize_none(self) -> Result<String, PayloadError> {
        Err(PayloadError::KeyMustBeString)
    }

    fn serialize_some<T: ?Sized + Serialize>(self, value: &T) -> Result<String, PayloadError> {
        value.serialize(self)
    }

    fn serialize_unit(self) -> Result<String, PayloadError> {
        Err(PayloadError::KeyMustBeString)
    }

    fn serialize_unit_struct(self, _name: &'static str) -> Result<String, PayloadError> {
        Err(PayloadError::KeyMustBeString)
    }

    fn serialize_unit_variant(
        self,
        _name: &'static str,
        _index: u32,
        variant: &'static str,
    ) -> Result<String, PayloadError> {
        Ok(variant.to_owned())
    }

    fn serialize_newtype_struct<T: ?Sized + Serialize>(
        self,
        _name: &'static str,
        value: &T,
    ) -> Result<String, PayloadError> {
        value.serialize(self)
    }

    fn serialize_newtype_variant<T: ?Sized + Serialize>(
        self,
        _name: &'static str,
        _index: u32,
        _variant: &'static str,
        _value: &T,
    ) -> Result<String, PayloadError> {
        Err(PayloadError::KeyMustBeString)
    }

    fn serialize_seq(self, _len: Option<usize>) -> Result<Self::SerializeSeq, PayloadError> {
        Err(PayloadError::KeyMustBeString)
    }

    fn serialize_tuple(self, _len: usize) -> Result<Self::SerializeTuple, PayloadError> {
        Err(PayloadError::KeyMustBeString)
    }

    fn serialize_tuple_struct(
        self,
        _name: &'static str,
        _len: usize,
    ) -> Result<Self::SerializeTupleStruct, PayloadError> {
        Err(PayloadError::KeyMustBeString)
    }

    fn serialize_tuple_variant(
        self,
        _name: &'static str,
        _index: u32,
        _variant: &'static str,
        _len: usize,
    ) -> Result<Self::SerializeTupleVariant, PayloadError> {
        Err(PayloadError::KeyMustBeString)
    }

    fn serialize_map(self, _len: Option<usize>) -> Result<Self::SerializeMap, PayloadError> {
        Err(PayloadError::KeyMustBeString)
    }

    fn serialize_struct(
        self,
        _name: &'static str,
        _len: usize,
    ) -> Result<Self::SerializeStruct, PayloadError> {
        Err(PayloadError::KeyMustBeString)
    }

    fn serialize_struct_variant(
        self,
        _name: &'static str,
        _index: u32,
        _variant: &'static str,
        _len: usize,
    ) -> Result<Self::SerializeStructVariant, PayloadError> {
        Err(PayloadError::KeyMustBeString)
    }
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use serde::Serialize;

    use super::*;

    #[derive(Serialize)]
    struct Part {
        sku: String,
    }

    #[derive(Serialize)]
    struct Widget {
        id: u32,
        label: Option<String>,
        parts: Vec<Part>,
    }

    #[derive(Serialize)]
    struct Audit {
        created_by: String,
    }

    #[derive(Serialize)]
    struct Gadget {
        id: u32,
        #[serde(flatten)]
        audit: Audit,
    }

    #[derive(Serialize)]
    struct Page<T> {
        items: Vec<T>,
    }

    #[derive(Serialize)]
    enum Shape {
        Dot,
        Circle(f64),
        Rect { w: u8, h: u8 },
    }

    #[test]
    fn struct_name_becomes_class() {
        let payload = to_payload(&Widget {
            id: 7,
            label: None,
            parts: vec![Part { sku: "a".into() }],
        })
        .unwrap();

        let record = payload.as_record().expect("record");
        assert_eq!(record.class, "Widget");
        assert_eq!(record.fields["id"], Payload::Scalar(Scalar::UInt(7)));
        assert_eq!(record.fields["label"], Payload::Scalar(Scalar::Null));
        assert_eq!(
            record.fields["parts"].first_member().and_then(Payload::class_name),
            Some("Part")
        );
    }

    #[test]
    fn flattened_struct_loses_its_class() {
        let gadget = Gadget {
            id: 3,
            audit: Audit { created_by: "ada".into() },
        };
        let payload = to_payload(&gadget).unwrap();
        assert_eq!(payload.class_name(), None);
        assert!(matches!(payload, Payload::Map(_)));
    }

    #[test]
    fn to_record_names_a_flattened_struct() {
        let gadget = Gadget {
            id: 3,
            audit: Audit { created_by: "ada".into() },
        };
        let payload = to_record(&gadget, "Gadget").unwrap();

        let record = payload.as_record().expect("record");
        assert_eq!(record.class, "Gadget");
        let names: Vec<&str> = record.fields.keys().map(String::as_str).collect();
        assert_eq!(names, ["id", "created_by"]);
    }

    #[test]
    fn to_record_keeps_existing_records_and_scalars() {
        let part = to_record(&Part { sku: "a".into() }, "Other").unwrap();
        assert_eq!(part.class_name(), Some("Part"));
        assert_eq!(to_record(&5u8, "Other").unwrap(), Payload::Scalar(Scalar::UInt(5)));
    }

    #[test]
    fn type_class_strips_path_and_generics() {
        assert_eq!(type_class::<Gadget>(), "Gadget");
        assert_eq!(type_class::<Page<Part>>(), "Page");
        assert_eq!(type_class::<&Gadget>(), "Gadget");
    }

    #[test]
    fn option_is_transparent() {
        let payload = to_payload(&Some(5i32)).unwrap();
        assert_eq!(payload, Payload::Scalar(Scalar::Int(5)));
    }

    #[test]
    fn enums_are_externally_tagged() {
        assert_eq!(
            to_payload(&Shape::Dot).unwrap(),
            Payload::Scalar(Scalar::Str("Dot".into()))
        );

        let circle = to_payload(&Shape::Circle(1.0)).unwrap();
        assert!(matches!(&circle, Payload::Map(m) if m["Circle"] == Payload::Scalar(Scalar::Float(1.0))));

        let rect = to_payload(&Shape::Rect { w: 1, h: 2 }).unwrap();
        match rect {
            Payload::Map(m) => assert_eq!(m["Rect"].class_name(), Some("Rect")),
            other => panic!("unexpected payload {:?}", other),
        }
    }

    #[test]
    fn integer_map_keys_are_stringified() {
        let mut map = BTreeMap::new();
        map.insert(3u8, "c");
        let payload = to_payload(&map).unwrap();
        assert!(matches!(payload, Payload::Map(m) if m.contains_key("3")));
    }

    #[test]
    fn composite_map_keys_are_rejected() {
        let mut map = BTreeMap::new();
        map.insert(vec![1u8], "c");
        assert_eq!(to_payload(&map), Err(PayloadError::KeyMustBeString));
    }

    #[test]
    fn nesting_beyond_limit_is_rejected() {
        let nested = vec![vec![vec![1u8]]];
        assert_eq!(
            to_payload_with_limit(&nested, 2),
            Err(PayloadError::TooDeep { limit: 2 })
        );
        assert!(to_payload_with_limit(&nested, 3).is_ok());
    }

    #[test]
    fn wide_integers_narrow_when_possible() {
        assert_eq!(to_payload(&5i128).unwrap(), Payload::Scalar(Scalar::Int(5)));
        assert!(matches!(
            to_payload(&u128::MAX),
            Err(PayloadError::IntegerOutOfRange(_))
        ));
    }
}
