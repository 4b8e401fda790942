use core::fmt;

// -----------------------------------------------------------------------------
// PrimitiveKind

/// The nine primitive shapes a serial value can take.
///
/// Formats are free to widen or narrow these on the wire (a text format
/// may write every integer kind the same way); the kind only describes the
/// logical shape the codec will drive through the
/// [`Encoder`](crate::encoding::Encoder) protocol.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PrimitiveKind {
    Bool,
    I8,
    I16,
    I32,
    I64,
    F32,
    F64,
    Char,
    String,
}

impl fmt::Display for PrimitiveKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Bool => f.pad("Bool"),
            Self::I8 => f.pad("I8"),
            Self::I16 => f.pad("I16"),
            Self::I32 => f.pad("I32"),
            Self::I64 => f.pad("I64"),
            Self::F32 => f.pad("F32"),
            Self::F64 => f.pad("F64"),
            Self::Char => f.pad("Char"),
            Self::String => f.pad("String"),
        }
    }
}

// -----------------------------------------------------------------------------
// StructureKind

/// The shapes built from other shapes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StructureKind {
    /// A named product type with a fixed element list.
    Class,
    /// A singleton with no elements of its own.
    Object,
    /// A homogeneous sequence.
    List,
    /// A homogeneous key-value collection.
    Map,
}

impl fmt::Display for StructureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Class => f.pad("Class"),
            Self::Object => f.pad("Object"),
            Self::List => f.pad("List"),
            Self::Map => f.pad("Map"),
        }
    }
}

// -----------------------------------------------------------------------------
// PolymorphicKind

/// How a polymorphic family is closed over its subtypes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PolymorphicKind {
    /// Subtypes are registered at runtime in a
    /// [`SerializersModule`](crate::modules::SerializersModule).
    Open,
    /// Subtypes are known exhaustively at codec construction time.
    Sealed,
}

impl fmt::Display for PolymorphicKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Open => f.pad("Open"),
            Self::Sealed => f.pad("Sealed"),
        }
    }
}

// -----------------------------------------------------------------------------
// SerialKind

/// The "kind" of a [`SerialDescriptor`](crate::descriptor::SerialDescriptor).
///
/// Every format dispatches on this to decide how a value is laid out on
/// the wire. The kind says nothing about the wire representation itself.
///
/// # Examples
///
/// ```
/// use serial_core::descriptor::{PrimitiveKind, SerialKind};
///
/// let kind = SerialKind::Primitive(PrimitiveKind::I32);
/// assert!(kind.is_primitive());
/// assert_eq!(kind.to_string(), "I32");
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SerialKind {
    /// One of the nine primitive shapes.
    Primitive(PrimitiveKind),
    /// A closed set of named entries, encoded by ordinal or name.
    Enum,
    /// Shape is unknown until a module lookup resolves the real codec.
    Contextual,
    /// A composite shape.
    Structure(StructureKind),
    /// A discriminated union of other shapes.
    Polymorphic(PolymorphicKind),
}

impl SerialKind {
    /// Returns `true` for any [`Primitive`](Self::Primitive) kind.
    #[inline]
    pub const fn is_primitive(&self) -> bool {
        matches!(self, Self::Primitive(_))
    }

    /// Returns `true` for [`List`](StructureKind::List) and
    /// [`Map`](StructureKind::Map) kinds, the ones that admit
    /// [`decode_collection_size`](crate::encoding::CompositeDecoder::decode_collection_size).
    #[inline]
    pub const fn is_collection(&self) -> bool {
        matches!(
            self,
            Self::Structure(StructureKind::List) | Self::Structure(StructureKind::Map)
        )
    }
}

impl fmt::Display for SerialKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Primitive(kind) => fmt::Display::fmt(kind, f),
            Self::Enum => f.pad("Enum"),
            Self::Contextual => f.pad("Contextual"),
            Self::Structure(kind) => fmt::Display::fmt(kind, f),
            Self::Polymorphic(kind) => fmt::Display::fmt(kind, f),
        }
    }
}

impl From<PrimitiveKind> for SerialKind {
    #[inline]
    fn from(kind: PrimitiveKind) -> Self {
        Self::Primitive(kind)
    }
}

impl From<StructureKind> for SerialKind {
    #[inline]
    fn from(kind: StructureKind) -> Self {
        Self::Structure(kind)
    }
}

impl From<PolymorphicKind> for SerialKind {
    #[inline]
    fn from(kind: PolymorphicKind) -> Self {
        Self::Polymorphic(kind)
    }
}

// -----------------------------------------------------------------------------
// Tests

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn collection_kinds() {
        assert!(SerialKind::Structure(StructureKind::List).is_collection());
        assert!(SerialKind::Structure(StructureKind::Map).is_collection());
        assert!(!SerialKind::Structure(StructureKind::Class).is_collection());
        assert!(!SerialKind::Enum.is_collection());
    }

    #[test]
    fn display_is_padded() {
        assert_eq!(format!("{:>6}", SerialKind::Enum), "  Enum");
        assert_eq!(SerialKind::Polymorphic(PolymorphicKind::Sealed).to_string(), "Sealed");
    }
}
