use crate::codec::DeserializeStrategy;
use crate::descriptor::SerialDescriptor;
use crate::error::{SerialError, SerialResult};
use crate::modules::SerializersModule;

// -----------------------------------------------------------------------------
// ElementIndex

/// The outcome of one [`decode_element_index`] negotiation step.
///
/// [`decode_element_index`]: CompositeDecoder::decode_element_index
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ElementIndex {
    /// The input holds the element at this schema index next.
    Index(usize),
    /// The structure holds no more data; the caller must stop and call
    /// [`end_structure`](CompositeDecoder::end_structure).
    Done,
    /// The input holds an element absent from the schema. Policy belongs
    /// to the caller: most codecs skip it, strict ones fail.
    Unknown,
}

impl ElementIndex {
    /// Returns the index, or `None` for `Done`/`Unknown`.
    #[inline]
    pub const fn index(self) -> Option<usize> {
        match self {
            Self::Index(index) => Some(index),
            _ => None,
        }
    }
}

// -----------------------------------------------------------------------------
// Decoder

/// The primitive half of the decoding protocol, symmetric to
/// [`Encoder`](crate::encoding::Encoder).
///
/// As on the encode side: after any call returns an error, the decoder is
/// in an unspecified state and must be discarded.
pub trait Decoder {
    /// The module consulted by contextual and open polymorphic codecs
    /// during this decoding.
    fn serializers_module(&self) -> &SerializersModule;

    fn decode_bool(&mut self) -> SerialResult<bool>;
    fn decode_i8(&mut self) -> SerialResult<i8>;
    fn decode_i16(&mut self) -> SerialResult<i16>;
    fn decode_i32(&mut self) -> SerialResult<i32>;
    fn decode_i64(&mut self) -> SerialResult<i64>;
    fn decode_f32(&mut self) -> SerialResult<f32>;
    fn decode_f64(&mut self) -> SerialResult<f64>;
    fn decode_char(&mut self) -> SerialResult<char>;
    fn decode_string(&mut self) -> SerialResult<String>;

    /// Decodes an enum ordinal within `descriptor`.
    fn decode_enum(&mut self, descriptor: &SerialDescriptor) -> SerialResult<usize>;

    /// Checks whether a non-null payload follows.
    ///
    /// Codecs for nullable shapes must call this before attempting the
    /// payload, mirroring the encode-side mark protocol.
    fn decode_not_null_mark(&mut self) -> SerialResult<bool>;

    /// Consumes the null that [`decode_not_null_mark`] announced.
    ///
    /// [`decode_not_null_mark`]: Self::decode_not_null_mark
    fn decode_null(&mut self) -> SerialResult<()>;

    /// Begins a structure, returning the composite cursor for its
    /// elements.
    fn begin_structure(
        &mut self,
        descriptor: &SerialDescriptor,
    ) -> SerialResult<&mut dyn CompositeDecoder>;
}

// -----------------------------------------------------------------------------
// CompositeDecoder

/// The per-structure decoding cursor.
///
/// Two disciplines are defined, and every codec must support both:
///
/// 1. **Indexed loop** — repeatedly call
///    [`decode_element_index`](Self::decode_element_index) and dispatch on
///    the returned [`ElementIndex`] until `Done`.
/// 2. **Sequential** — when [`decode_sequentially`](Self::decode_sequentially)
///    returns `true`, elements may be decoded in strict schema order
///    `0..elements_count` without per-element negotiation. Only formats
///    with a fixed, ordered layout may opt in; formats with unordered
///    keys must return `false`. Sequential decoding of collections
///    additionally requires a known
///    [`decode_collection_size`](Self::decode_collection_size).
pub trait CompositeDecoder {
    /// The module consulted by codecs running inside this structure.
    fn serializers_module(&self) -> &SerializersModule;

    /// Negotiates which element the input holds next.
    fn decode_element_index(
        &mut self,
        descriptor: &SerialDescriptor,
    ) -> SerialResult<ElementIndex>;

    /// Whether this structure may be decoded sequentially.
    fn decode_sequentially(&self) -> bool {
        false
    }

    /// Pre-declared element count for list/map kinds, `None` if unknown.
    fn decode_collection_size(
        &mut self,
        descriptor: &SerialDescriptor,
    ) -> SerialResult<Option<usize>> {
        let _ = descriptor;
        Ok(None)
    }

    fn decode_bool_element(
        &mut self,
        descriptor: &SerialDescriptor,
        index: usize,
    ) -> SerialResult<bool>;
    fn decode_i8_element(
        &mut self,
        descriptor: &SerialDescriptor,
        index: usize,
    ) -> SerialResult<i8>;
    fn decode_i16_element(
        &mut self,
        descriptor: &SerialDescriptor,
        index: usize,
    ) -> SerialResult<i16>;
    fn decode_i32_element(
        &mut self,
        descriptor: &SerialDescriptor,
        index: usize,
    ) -> SerialResult<i32>;
    fn decode_i64_element(
        &mut self,
        descriptor: &SerialDescriptor,
        index: usize,
    ) -> SerialResult<i64>;
    fn decode_f32_element(
        &mut self,
        descriptor: &SerialDescriptor,
        index: usize,
    ) -> SerialResult<f32>;
    fn decode_f64_element(
        &mut self,
        descriptor: &SerialDescriptor,
        index: usize,
    ) -> SerialResult<f64>;
    fn decode_char_element(
        &mut self,
        descriptor: &SerialDescriptor,
        index: usize,
    ) -> SerialResult<char>;
    fn decode_str_element(
        &mut self,
        descriptor: &SerialDescriptor,
        index: usize,
    ) -> SerialResult<String>;

    /// Decodes a structural element into `slot`.
    ///
    /// The slot retains any previously decoded value for this element.
    /// Formats that scatter repeated fields may use that to accumulate;
    /// the default contract is last-one-wins.
    fn decode_serializable_element(
        &mut self,
        descriptor: &SerialDescriptor,
        index: usize,
        slot: &mut dyn DecodeSlot,
    ) -> SerialResult<()>;

    /// Decodes a nullable element into `slot`, honoring the null mark.
    fn decode_nullable_serializable_element(
        &mut self,
        descriptor: &SerialDescriptor,
        index: usize,
        slot: &mut dyn DecodeSlot,
    ) -> SerialResult<()>;

    /// Ends the structure begun by the matching `begin_structure`.
    fn end_structure(&mut self, descriptor: &SerialDescriptor) -> SerialResult<()>;
}

// -----------------------------------------------------------------------------
// DecodeSlot

/// An erased (strategy, storage) pair for one structural element.
///
/// The object-safe mirror of [`Encodable`](crate::encoding::Encodable):
/// the typed strategy and its output slot are captured together so the
/// format can drive them without knowing the element type.
pub trait DecodeSlot {
    /// The descriptor of the element's codec.
    fn descriptor(&self) -> SerialDescriptor;

    /// Decodes one value into the slot, replacing any previous value.
    fn decode_value(&mut self, decoder: &mut dyn Decoder) -> SerialResult<()>;

    /// Records a null for a nullable slot.
    ///
    /// Fails with [`SerialError::UnexpectedNull`] when the slot was not
    /// created nullable.
    fn set_null(&mut self) -> SerialResult<()>;

    /// Whether the slot already holds a value from an earlier decode of
    /// the same logical element.
    fn has_previous(&self) -> bool;
}

/// The standard [`DecodeSlot`] implementation.
///
/// # Examples
///
/// ```
/// use serial_core::builtins::I32Codec;
/// use serial_core::encoding::Slot;
///
/// let mut slot = Slot::new(&I32Codec);
/// assert!(!slot.is_filled());
/// assert_eq!(slot.take(), None);
/// ```
pub struct Slot<'a, T> {
    strategy: &'a dyn DeserializeStrategy<T>,
    value: Option<T>,
    null_value: Option<fn() -> T>,
}

impl<'a, T> Slot<'a, T> {
    /// Creates an empty slot for a required element.
    pub fn new(strategy: &'a dyn DeserializeStrategy<T>) -> Self {
        Self {
            strategy,
            value: None,
            null_value: None,
        }
    }

    /// Creates a slot for a nullable element.
    ///
    /// `null` produces the value recorded when the input holds a null —
    /// for `Option`-shaped elements this is `|| None`.
    pub fn nullable(strategy: &'a dyn DeserializeStrategy<T>, null: fn() -> T) -> Self {
        Self {
            strategy,
            value: None,
            null_value: Some(null),
        }
    }

    /// Creates a slot seeded with a previously decoded value.
    pub fn with_previous(strategy: &'a dyn DeserializeStrategy<T>, previous: T) -> Self {
        Self {
            strategy,
            value: Some(previous),
            null_value: None,
        }
    }

    /// Whether the slot holds a value.
    #[inline]
    pub fn is_filled(&self) -> bool {
        self.value.is_some()
    }

    /// Consumes the slot, returning the decoded value if any.
    #[inline]
    pub fn take(self) -> Option<T> {
        self.value
    }

    /// Consumes the slot, failing if the format completed without
    /// decoding anything into it.
    pub fn into_decoded(self) -> crate::error::SerialResult<T> {
        self.value.ok_or_else(|| {
            SerialError::custom("the format completed without decoding the element")
        })
    }
}

impl<T> DecodeSlot for Slot<'_, T> {
    fn descriptor(&self) -> SerialDescriptor {
        self.strategy.descriptor()
    }

    fn decode_value(&mut self, decoder: &mut dyn Decoder) -> SerialResult<()> {
        self.value = Some(self.strategy.deserialize(decoder)?);
        Ok(())
    }

    fn set_null(&mut self) -> SerialResult<()> {
        match self.null_value {
            Some(null) => {
                self.value = Some(null());
                Ok(())
            }
            None => Err(SerialError::UnexpectedNull {
                type_name: self.strategy.descriptor().serial_name().to_owned(),
            }),
        }
    }

    fn has_previous(&self) -> bool {
        self.value.is_some()
    }
}

// -----------------------------------------------------------------------------
// Tests

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn element_index_accessors() {
        assert_eq!(ElementIndex::Index(3).index(), Some(3));
        assert_eq!(ElementIndex::Done.index(), None);
        assert_eq!(ElementIndex::Unknown.index(), None);
    }

    #[test]
    fn required_slot_rejects_null() {
        let codec = crate::builtins::I32Codec;
        let mut slot = Slot::new(&codec);
        let err = slot.set_null().unwrap_err();
        assert!(matches!(err, SerialError::UnexpectedNull { .. }));
    }

    #[test]
    fn nullable_slot_records_null() {
        let codec = crate::builtins::OptionCodec::new(std::sync::Arc::new(crate::builtins::I32Codec));
        let mut slot = Slot::nullable(&codec, || None);
        slot.set_null().unwrap();
        assert_eq!(slot.take(), Some(None));
    }
}
