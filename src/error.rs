use crate::payload::PayloadError;

/// Errors that can occur while configuring or feeding the decorator.
///
/// Decoration itself never fails: unknown media types, unknown classes,
/// unresolved placeholders and denied links are all handled in-band.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// An introspection target could not be turned into entity metadata.
    ///
    /// Nothing is registered when this is returned.
    #[error("invalid shape for `{type_name}`: {reason}")]
    InvalidShape {
        /// Name of the offending type
        type_name: String,
        /// What was wrong with it
        reason: ShapeViolation,
    },

    /// A value could not be captured as a [`Payload`](crate::Payload).
    #[error("payload capture failed: {0}")]
    Payload(#[from] PayloadError),

    /// A hypermedia definition document failed to parse.
    #[error("invalid hypermedia definition: {0}")]
    Definition(#[source] serde_json::Error),

    /// A decorator configuration document failed to parse.
    #[error("invalid decorator configuration: {0}")]
    Config(#[source] serde_json::Error),
}

impl Error {
    pub(crate) fn invalid_shape(type_name: impl Into<String>, reason: ShapeViolation) -> Self {
        Error::InvalidShape {
            type_name: type_name.into(),
            reason,
        }
    }
}

/// Why an introspected type was rejected.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShapeViolation {
    /// The type is not a structured record
    NotARecord,
    /// The record has no field carrying entity-level marker tags
    MissingMarker,
    /// The record declares more than one marker field
    DuplicateMarker,
}

impl std::fmt::Display for ShapeViolation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ShapeViolation::NotARecord => write!(f, "not a structured record type"),
            ShapeViolation::MissingMarker => write!(f, "entity marker field is absent"),
            ShapeViolation::DuplicateMarker => write!(f, "more than one entity marker field"),
        }
    }
}
