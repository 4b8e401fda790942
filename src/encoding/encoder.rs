use crate::codec::SerializeStrategy;
use crate::descriptor::SerialDescriptor;
use crate::error::SerialResult;
use crate::modules::SerializersModule;

// -----------------------------------------------------------------------------
// Encoder

/// The primitive half of the encoding protocol, implemented by formats.
///
/// An encoder starts *free*. Encoding a structural value moves it *inside
/// a composite* through [`begin_structure`]; the returned
/// [`CompositeEncoder`] addresses elements by `(descriptor, index)` until
/// the matching [`end_structure`] returns the encoder to the free state.
/// Composites nest: encoding a structural element begins a child
/// structure.
///
/// Each primitive `encode_*` call has no effect beyond advancing the
/// format's write cursor. After any call returns an error the encoder is
/// in an unspecified state and must be discarded — the protocol has no
/// rollback.
///
/// # Nullability
///
/// For a nullable value the *codec* (not the format) is responsible for
/// calling [`encode_not_null_mark`] before a non-null payload and
/// [`encode_null`] as the sole content of a null payload. Binary formats
/// use the mark to avoid a wrapper allocation; text formats typically
/// ignore it.
///
/// [`begin_structure`]: Self::begin_structure
/// [`end_structure`]: CompositeEncoder::end_structure
/// [`encode_not_null_mark`]: Self::encode_not_null_mark
/// [`encode_null`]: Self::encode_null
pub trait Encoder {
    /// The module consulted by contextual and open polymorphic codecs
    /// during this encoding.
    fn serializers_module(&self) -> &SerializersModule;

    fn encode_bool(&mut self, value: bool) -> SerialResult<()>;
    fn encode_i8(&mut self, value: i8) -> SerialResult<()>;
    fn encode_i16(&mut self, value: i16) -> SerialResult<()>;
    fn encode_i32(&mut self, value: i32) -> SerialResult<()>;
    fn encode_i64(&mut self, value: i64) -> SerialResult<()>;
    fn encode_f32(&mut self, value: f32) -> SerialResult<()>;
    fn encode_f64(&mut self, value: f64) -> SerialResult<()>;
    fn encode_char(&mut self, value: char) -> SerialResult<()>;
    fn encode_str(&mut self, value: &str) -> SerialResult<()>;

    /// Encodes the enum entry at `ordinal` within `descriptor`.
    fn encode_enum(&mut self, descriptor: &SerialDescriptor, ordinal: usize) -> SerialResult<()>;

    /// Encodes a null as the sole content of the current value.
    fn encode_null(&mut self) -> SerialResult<()>;

    /// Announces that a non-null payload for a nullable shape follows.
    ///
    /// Defaults to a no-op; formats that need no mark simply ignore it.
    fn encode_not_null_mark(&mut self) -> SerialResult<()> {
        Ok(())
    }

    /// Begins a structure, returning the composite cursor for its
    /// elements.
    ///
    /// The returned composite may be `self` for simple formats or a
    /// distinct nested value; no aliasing is guaranteed across calls, and
    /// a composite must not be used after its matching `end_structure`.
    fn begin_structure(
        &mut self,
        descriptor: &SerialDescriptor,
    ) -> SerialResult<&mut dyn CompositeEncoder>;

    /// Begins a collection of known size.
    ///
    /// Defaults to [`begin_structure`](Self::begin_structure); formats
    /// with length-prefixed layouts override this to write the size.
    fn begin_collection(
        &mut self,
        descriptor: &SerialDescriptor,
        size: usize,
    ) -> SerialResult<&mut dyn CompositeEncoder> {
        let _ = size;
        self.begin_structure(descriptor)
    }
}

// -----------------------------------------------------------------------------
// CompositeEncoder

/// The per-structure cursor bound to one `begin_structure`/`end_structure`
/// pair.
pub trait CompositeEncoder {
    /// The module consulted by codecs running inside this structure.
    fn serializers_module(&self) -> &SerializersModule;

    fn encode_bool_element(
        &mut self,
        descriptor: &SerialDescriptor,
        index: usize,
        value: bool,
    ) -> SerialResult<()>;
    fn encode_i8_element(
        &mut self,
        descriptor: &SerialDescriptor,
        index: usize,
        value: i8,
    ) -> SerialResult<()>;
    fn encode_i16_element(
        &mut self,
        descriptor: &SerialDescriptor,
        index: usize,
        value: i16,
    ) -> SerialResult<()>;
    fn encode_i32_element(
        &mut self,
        descriptor: &SerialDescriptor,
        index: usize,
        value: i32,
    ) -> SerialResult<()>;
    fn encode_i64_element(
        &mut self,
        descriptor: &SerialDescriptor,
        index: usize,
        value: i64,
    ) -> SerialResult<()>;
    fn encode_f32_element(
        &mut self,
        descriptor: &SerialDescriptor,
        index: usize,
        value: f32,
    ) -> SerialResult<()>;
    fn encode_f64_element(
        &mut self,
        descriptor: &SerialDescriptor,
        index: usize,
        value: f64,
    ) -> SerialResult<()>;
    fn encode_char_element(
        &mut self,
        descriptor: &SerialDescriptor,
        index: usize,
        value: char,
    ) -> SerialResult<()>;
    fn encode_str_element(
        &mut self,
        descriptor: &SerialDescriptor,
        index: usize,
        value: &str,
    ) -> SerialResult<()>;

    /// Encodes a structural element through its erased codec/value pair.
    fn encode_serializable_element(
        &mut self,
        descriptor: &SerialDescriptor,
        index: usize,
        value: &dyn Encodable,
    ) -> SerialResult<()>;

    /// Encodes a nullable element: `None` encodes a null, `Some` encodes
    /// the not-null mark followed by the payload.
    fn encode_nullable_serializable_element(
        &mut self,
        descriptor: &SerialDescriptor,
        index: usize,
        value: Option<&dyn Encodable>,
    ) -> SerialResult<()>;

    /// Whether an element holding its declared default should be encoded
    /// at all.
    ///
    /// Queried by per-class codecs for defaulted, un-annotated elements;
    /// returning `false` lets the format omit them entirely. Must not be
    /// consulted for elements carrying an
    /// [`EncodeDefault`](crate::descriptor::EncodeDefault) annotation —
    /// that annotation short-circuits the decision.
    fn should_encode_element_default(
        &self,
        descriptor: &SerialDescriptor,
        index: usize,
    ) -> bool {
        let _ = (descriptor, index);
        true
    }

    /// Ends the structure begun by the matching `begin_structure`.
    fn end_structure(&mut self, descriptor: &SerialDescriptor) -> SerialResult<()>;
}

// -----------------------------------------------------------------------------
// Encodable

/// An erased (strategy, value) pair, the form in which structural
/// elements cross the object-safe [`CompositeEncoder`] boundary.
pub trait Encodable {
    /// The descriptor of the value's codec.
    fn descriptor(&self) -> SerialDescriptor;

    /// Serializes the captured value through `encoder`.
    fn encode(&self, encoder: &mut dyn Encoder) -> SerialResult<()>;
}

struct WithStrategy<'a, T: ?Sized> {
    strategy: &'a dyn SerializeStrategy<T>,
    value: &'a T,
}

impl<T: ?Sized> Encodable for WithStrategy<'_, T> {
    fn descriptor(&self) -> SerialDescriptor {
        self.strategy.descriptor()
    }

    fn encode(&self, encoder: &mut dyn Encoder) -> SerialResult<()> {
        self.strategy.serialize(encoder, self.value)
    }
}

/// Pairs a strategy with a value for
/// [`encode_serializable_element`](CompositeEncoder::encode_serializable_element).
///
/// # Examples
///
/// ```
/// use serial_core::builtins::I32Codec;
/// use serial_core::encoding::{Encodable, encodable};
///
/// let value = 7;
/// let element = encodable(&I32Codec, &value);
/// assert_eq!(element.descriptor().serial_name(), "i32");
/// ```
pub fn encodable<'a, T: ?Sized>(
    strategy: &'a dyn SerializeStrategy<T>,
    value: &'a T,
) -> impl Encodable + 'a {
    WithStrategy { strategy, value }
}
