//! The error family shared by every operation in the framework.
//!
//! Formats are expected to translate their own lower-level parse errors
//! into [`SerialError`] (usually through [`SerialError::custom`]) so that
//! callers can match on a single error kind regardless of the wire format
//! in use.

use thiserror::Error;

/// Result alias used throughout the crate.
pub type SerialResult<T> = Result<T, SerialError>;

// -----------------------------------------------------------------------------
// SerialError

/// Every failure surfaced by descriptors, codecs, modules and formats.
///
/// Lookup failures carry enough context (type name, base scope,
/// discriminator value) to be diagnosed without re-running. They are always
/// recoverable by the caller: the caller chose to attempt resolution and
/// may fall back or propagate.
///
/// After any error returned from an `encode_*`/`decode_*` call, the
/// encoder/decoder instance is left in an unspecified state and must be
/// discarded.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SerialError {
    /// No codec could be resolved for a runtime type.
    #[error("serializer for type `{type_name}` is not found")]
    SerializerNotFound {
        /// The type that failed to resolve.
        type_name: String,
    },

    /// A contextual codec was requested but the module has no registration
    /// and no static fallback exists.
    #[error(
        "contextual serializer for type `{type_name}` is not registered in the serializers module"
    )]
    ContextualNotRegistered {
        /// The type that failed to resolve.
        type_name: String,
    },

    /// Attempted to encode a value whose concrete type is not registered
    /// in the polymorphic scope of its base.
    ///
    /// Only explicitly registered subtypes may be polymorphically encoded.
    #[error("subtype `{subtype}` is not registered for polymorphic serialization in the scope of `{base}`")]
    SubtypeNotRegistered {
        /// Concrete type of the rejected value.
        subtype: String,
        /// The base scope the lookup ran in.
        base: String,
    },

    /// The input carried no discriminator and no default deserializer is
    /// registered for the base scope.
    #[error("polymorphic value for `{base}` is missing a type discriminator and no default deserializer is registered")]
    DiscriminatorMissing {
        /// The base scope the lookup ran in.
        base: String,
    },

    /// The input carried a discriminator, but no subtype is registered
    /// under it in the base scope.
    #[error("type discriminator `{name}` does not match any subtype registered in the scope of `{base}`")]
    DiscriminatorUnknown {
        /// The base scope the lookup ran in.
        base: String,
        /// The discriminator read from the input.
        name: String,
    },

    /// One or more non-optional elements were never decoded.
    ///
    /// Deliberately structured (not just a formatted string) so that
    /// tooling can branch on the missing field names.
    #[error("fields {fields:?} are required for type `{serial_name}` but were missing from the input")]
    MissingFields {
        /// Serial name of the enclosing type.
        serial_name: String,
        /// Names of the elements that were absent.
        fields: Vec<String>,
    },

    /// A value crossed an erased boundary with the wrong runtime type.
    #[error("type mismatch: expected `{expected}`, found `{found}`")]
    TypeMismatch {
        /// What the typed side required.
        expected: String,
        /// What actually arrived.
        found: String,
    },

    /// A null was found where a non-null payload was required.
    #[error("unexpected null while decoding `{type_name}`")]
    UnexpectedNull {
        /// The type being decoded.
        type_name: String,
    },

    /// A format-defined failure, usually a translated parse error.
    #[error("{0}")]
    Message(String),
}

impl SerialError {
    /// Creates a format-defined error from any displayable message.
    ///
    /// # Examples
    ///
    /// ```
    /// use serial_core::SerialError;
    ///
    /// let err = SerialError::custom("unexpected token `}` at offset 14");
    /// assert!(err.to_string().contains("offset 14"));
    /// ```
    pub fn custom(message: impl core::fmt::Display) -> Self {
        Self::Message(message.to_string())
    }

    /// Names of the fields reported missing, if this is a
    /// [`MissingFields`](Self::MissingFields) error.
    pub fn missing_fields(&self) -> Option<&[String]> {
        match self {
            Self::MissingFields { fields, .. } => Some(fields),
            _ => None,
        }
    }
}

// -----------------------------------------------------------------------------
// Tests

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_fields_is_structured() {
        let err = SerialError::MissingFields {
            serial_name: "Data".into(),
            fields: vec!["s".into(), "i".into()],
        };
        assert_eq!(err.missing_fields(), Some(&["s".to_string(), "i".to_string()][..]));
        let rendered = err.to_string();
        assert!(rendered.contains("Data"));
        assert!(rendered.contains('s'));
    }

    #[test]
    fn lookup_errors_name_their_scope() {
        let err = SerialError::SubtypeNotRegistered {
            subtype: "Circle".into(),
            base: "Shape".into(),
        };
        let rendered = err.to_string();
        assert!(rendered.contains("Circle"));
        assert!(rendered.contains("Shape"));
    }
}
