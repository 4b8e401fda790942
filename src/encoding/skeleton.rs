//! Skeleton implementations collapsing the typed primitive surface onto a
//! single untyped channel.
//!
//! Simple formats — test fixtures, demo token streams, flat key-value
//! stores — rarely care whether a value was an `i16` or an `i64`. The
//! [`ScalarEncoder`]/[`ScalarDecoder`] traits let such a format implement
//! one `encode_scalar`/`decode_scalar` pair; blanket impls lift it into
//! the full [`Encoder`]/[`Decoder`] protocol, coercing each typed call
//! through the untyped channel.
//!
//! A format must override either the typed methods or the untyped
//! fallback; relying on neither fails at the first decode with a
//! descriptive error.

use crate::descriptor::SerialDescriptor;
use crate::encoding::{
    CompositeDecoder, CompositeEncoder, DecodeSlot, Decoder, ElementIndex, Encodable, Encoder,
};
use crate::error::{SerialError, SerialResult};
use crate::modules::SerializersModule;

// -----------------------------------------------------------------------------
// Scalar

/// One untyped primitive value.
#[derive(Debug, Clone, PartialEq)]
pub enum Scalar {
    Bool(bool),
    I8(i8),
    I16(i16),
    I32(i32),
    I64(i64),
    F32(f32),
    F64(f64),
    Char(char),
    String(String),
}

impl Scalar {
    /// The name of the variant, for coercion diagnostics.
    pub const fn kind_name(&self) -> &'static str {
        match self {
            Self::Bool(_) => "Bool",
            Self::I8(_) => "I8",
            Self::I16(_) => "I16",
            Self::I32(_) => "I32",
            Self::I64(_) => "I64",
            Self::F32(_) => "F32",
            Self::F64(_) => "F64",
            Self::Char(_) => "Char",
            Self::String(_) => "String",
        }
    }
}

macro_rules! scalar_as {
    ($scalar:expr, $variant:ident, $expected:literal) => {
        match $scalar {
            Scalar::$variant(value) => Ok(value),
            other => Err(SerialError::TypeMismatch {
                expected: $expected.into(),
                found: other.kind_name().into(),
            }),
        }
    };
}

// -----------------------------------------------------------------------------
// ScalarEncoder

/// The encode half of the skeleton.
///
/// Only [`encode_scalar`](Self::encode_scalar) is required; everything
/// else defaults to a flat, null-free format.
pub trait ScalarEncoder {
    /// Consumes one untyped primitive.
    fn encode_scalar(&mut self, value: Scalar) -> SerialResult<()>;

    /// The module exposed through [`Encoder::serializers_module`].
    fn serializers_module(&self) -> &SerializersModule {
        SerializersModule::empty()
    }

    /// Consumes a null. Defaults to failing: flat formats have no null
    /// representation unless they opt in.
    fn encode_none(&mut self) -> SerialResult<()> {
        Err(SerialError::custom(
            "this format does not support null values",
        ))
    }

    /// Called before each element is encoded; returning `false` skips it.
    fn encode_element(&mut self, descriptor: &SerialDescriptor, index: usize) -> SerialResult<bool> {
        let _ = (descriptor, index);
        Ok(true)
    }

    /// Called when a structure begins. Defaults to nothing.
    fn begin(&mut self, descriptor: &SerialDescriptor) -> SerialResult<()> {
        let _ = descriptor;
        Ok(())
    }

    /// Called when a structure ends. Defaults to nothing.
    fn end(&mut self, descriptor: &SerialDescriptor) -> SerialResult<()> {
        let _ = descriptor;
        Ok(())
    }
}

impl<E: ScalarEncoder> Encoder for E {
    fn serializers_module(&self) -> &SerializersModule {
        ScalarEncoder::serializers_module(self)
    }

    fn encode_bool(&mut self, value: bool) -> SerialResult<()> {
        self.encode_scalar(Scalar::Bool(value))
    }

    fn encode_i8(&mut self, value: i8) -> SerialResult<()> {
        self.encode_scalar(Scalar::I8(value))
    }

    fn encode_i16(&mut self, value: i16) -> SerialResult<()> {
        self.encode_scalar(Scalar::I16(value))
    }

    fn encode_i32(&mut self, value: i32) -> SerialResult<()> {
        self.encode_scalar(Scalar::I32(value))
    }

    fn encode_i64(&mut self, value: i64) -> SerialResult<()> {
        self.encode_scalar(Scalar::I64(value))
    }

    fn encode_f32(&mut self, value: f32) -> SerialResult<()> {
        self.encode_scalar(Scalar::F32(value))
    }

    fn encode_f64(&mut self, value: f64) -> SerialResult<()> {
        self.encode_scalar(Scalar::F64(value))
    }

    fn encode_char(&mut self, value: char) -> SerialResult<()> {
        self.encode_scalar(Scalar::Char(value))
    }

    fn encode_str(&mut self, value: &str) -> SerialResult<()> {
        self.encode_scalar(Scalar::String(value.to_owned()))
    }

    fn encode_enum(&mut self, descriptor: &SerialDescriptor, ordinal: usize) -> SerialResult<()> {
        let _ = descriptor;
        self.encode_scalar(Scalar::I32(ordinal as i32))
    }

    fn encode_null(&mut self) -> SerialResult<()> {
        self.encode_none()
    }

    fn begin_structure(
        &mut self,
        descriptor: &SerialDescriptor,
    ) -> SerialResult<&mut dyn CompositeEncoder> {
        self.begin(descriptor)?;
        Ok(self)
    }
}

macro_rules! scalar_encode_element {
    ($($method:ident => $typed:ident: $ty:ty,)*) => {
        $(
            fn $method(
                &mut self,
                descriptor: &SerialDescriptor,
                index: usize,
                value: $ty,
            ) -> SerialResult<()> {
                if self.encode_element(descriptor, index)? {
                    self.$typed(value)?;
                }
                Ok(())
            }
        )*
    };
}

impl<E: ScalarEncoder> CompositeEncoder for E {
    fn serializers_module(&self) -> &SerializersModule {
        ScalarEncoder::serializers_module(self)
    }

    scalar_encode_element! {
        encode_bool_element => encode_bool: bool,
        encode_i8_element => encode_i8: i8,
        encode_i16_element => encode_i16: i16,
        encode_i32_element => encode_i32: i32,
        encode_i64_element => encode_i64: i64,
        encode_f32_element => encode_f32: f32,
        encode_f64_element => encode_f64: f64,
        encode_char_element => encode_char: char,
        encode_str_element => encode_str: &str,
    }

    fn encode_serializable_element(
        &mut self,
        descriptor: &SerialDescriptor,
        index: usize,
        value: &dyn Encodable,
    ) -> SerialResult<()> {
        if self.encode_element(descriptor, index)? {
            value.encode(self)?;
        }
        Ok(())
    }

    fn encode_nullable_serializable_element(
        &mut self,
        descriptor: &SerialDescriptor,
        index: usize,
        value: Option<&dyn Encodable>,
    ) -> SerialResult<()> {
        if self.encode_element(descriptor, index)? {
            match value {
                Some(value) => {
                    self.encode_not_null_mark()?;
                    value.encode(self)?;
                }
                None => self.encode_null()?,
            }
        }
        Ok(())
    }

    fn end_structure(&mut self, descriptor: &SerialDescriptor) -> SerialResult<()> {
        self.end(descriptor)
    }
}

// -----------------------------------------------------------------------------
// ScalarDecoder

/// The decode half of the skeleton.
///
/// A format overrides [`decode_scalar`](Self::decode_scalar) (or the
/// typed methods on [`Decoder`] directly, but then this skeleton buys it
/// nothing); the default implementation fails, because an untyped value
/// cannot be conjured out of nowhere.
pub trait ScalarDecoder {
    /// Produces the next untyped primitive.
    fn decode_scalar(&mut self) -> SerialResult<Scalar> {
        Err(SerialError::custom(
            "this format cannot retrieve untyped values; override either `decode_scalar` or the typed decode methods",
        ))
    }

    /// The module exposed through [`Decoder::serializers_module`].
    fn serializers_module(&self) -> &SerializersModule {
        SerializersModule::empty()
    }

    /// Negotiates the next element of the current structure.
    fn element_index(&mut self, descriptor: &SerialDescriptor) -> SerialResult<ElementIndex>;

    /// Whether a non-null payload follows. Defaults to `true`: formats
    /// without a null representation never see nulls.
    fn decode_none_mark(&mut self) -> SerialResult<bool> {
        Ok(true)
    }

    /// Whether structures may be decoded in strict schema order.
    ///
    /// Only formats with a fixed, ordered layout may return `true`.
    fn sequential(&self) -> bool {
        false
    }

    /// Pre-declared element count for collections, `None` if unknown.
    fn collection_size(&mut self, descriptor: &SerialDescriptor) -> SerialResult<Option<usize>> {
        let _ = descriptor;
        Ok(None)
    }

    /// Consumes a null. Defaults to nothing.
    fn decode_none(&mut self) -> SerialResult<()> {
        Ok(())
    }

    /// Called when a structure begins. Defaults to nothing.
    fn begin(&mut self, descriptor: &SerialDescriptor) -> SerialResult<()> {
        let _ = descriptor;
        Ok(())
    }

    /// Called when a structure ends. Defaults to nothing.
    fn end(&mut self, descriptor: &SerialDescriptor) -> SerialResult<()> {
        let _ = descriptor;
        Ok(())
    }
}

impl<D: ScalarDecoder> Decoder for D {
    fn serializers_module(&self) -> &SerializersModule {
        ScalarDecoder::serializers_module(self)
    }

    fn decode_bool(&mut self) -> SerialResult<bool> {
        scalar_as!(self.decode_scalar()?, Bool, "Bool")
    }

    fn decode_i8(&mut self) -> SerialResult<i8> {
        scalar_as!(self.decode_scalar()?, I8, "I8")
    }

    fn decode_i16(&mut self) -> SerialResult<i16> {
        scalar_as!(self.decode_scalar()?, I16, "I16")
    }

    fn decode_i32(&mut self) -> SerialResult<i32> {
        scalar_as!(self.decode_scalar()?, I32, "I32")
    }

    fn decode_i64(&mut self) -> SerialResult<i64> {
        scalar_as!(self.decode_scalar()?, I64, "I64")
    }

    fn decode_f32(&mut self) -> SerialResult<f32> {
        scalar_as!(self.decode_scalar()?, F32, "F32")
    }

    fn decode_f64(&mut self) -> SerialResult<f64> {
        scalar_as!(self.decode_scalar()?, F64, "F64")
    }

    fn decode_char(&mut self) -> SerialResult<char> {
        scalar_as!(self.decode_scalar()?, Char, "Char")
    }

    fn decode_string(&mut self) -> SerialResult<String> {
        scalar_as!(self.decode_scalar()?, String, "String")
    }

    fn decode_enum(&mut self, descriptor: &SerialDescriptor) -> SerialResult<usize> {
        let _ = descriptor;
        Ok(scalar_as!(self.decode_scalar()?, I32, "I32")? as usize)
    }

    fn decode_not_null_mark(&mut self) -> SerialResult<bool> {
        self.decode_none_mark()
    }

    fn decode_null(&mut self) -> SerialResult<()> {
        self.decode_none()
    }

    fn begin_structure(
        &mut self,
        descriptor: &SerialDescriptor,
    ) -> SerialResult<&mut dyn CompositeDecoder> {
        self.begin(descriptor)?;
        Ok(self)
    }
}

macro_rules! scalar_decode_element {
    ($($method:ident => $typed:ident: $ty:ty,)*) => {
        $(
            fn $method(
                &mut self,
                descriptor: &SerialDescriptor,
                index: usize,
            ) -> SerialResult<$ty> {
                let _ = (descriptor, index);
                self.$typed()
            }
        )*
    };
}

impl<D: ScalarDecoder> CompositeDecoder for D {
    fn serializers_module(&self) -> &SerializersModule {
        ScalarDecoder::serializers_module(self)
    }

    fn decode_element_index(
        &mut self,
        descriptor: &SerialDescriptor,
    ) -> SerialResult<ElementIndex> {
        self.element_index(descriptor)
    }

    fn decode_sequentially(&self) -> bool {
        self.sequential()
    }

    fn decode_collection_size(
        &mut self,
        descriptor: &SerialDescriptor,
    ) -> SerialResult<Option<usize>> {
        self.collection_size(descriptor)
    }

    scalar_decode_element! {
        decode_bool_element => decode_bool: bool,
        decode_i8_element => decode_i8: i8,
        decode_i16_element => decode_i16: i16,
        decode_i32_element => decode_i32: i32,
        decode_i64_element => decode_i64: i64,
        decode_f32_element => decode_f32: f32,
        decode_f64_element => decode_f64: f64,
        decode_char_element => decode_char: char,
        decode_str_element => decode_string: String,
    }

    fn decode_serializable_element(
        &mut self,
        descriptor: &SerialDescriptor,
        index: usize,
        slot: &mut dyn DecodeSlot,
    ) -> SerialResult<()> {
        let _ = (descriptor, index);
        slot.decode_value(self)
    }

    fn decode_nullable_serializable_element(
        &mut self,
        descriptor: &SerialDescriptor,
        index: usize,
        slot: &mut dyn DecodeSlot,
    ) -> SerialResult<()> {
        let _ = (descriptor, index);
        if self.decode_not_null_mark()? {
            slot.decode_value(self)
        } else {
            self.decode_null()?;
            slot.set_null()
        }
    }

    fn end_structure(&mut self, descriptor: &SerialDescriptor) -> SerialResult<()> {
        self.end(descriptor)
    }
}

// -----------------------------------------------------------------------------
// Tests

#[cfg(test)]
mod tests {
    use super::*;

    // A flat format that records scalars into a vector and replays them.
    struct FlatSink {
        out: Vec<Scalar>,
    }

    impl ScalarEncoder for FlatSink {
        fn encode_scalar(&mut self, value: Scalar) -> SerialResult<()> {
            self.out.push(value);
            Ok(())
        }
    }

    struct FlatSource {
        input: std::vec::IntoIter<Scalar>,
    }

    impl ScalarDecoder for FlatSource {
        fn decode_scalar(&mut self) -> SerialResult<Scalar> {
            self.input
                .next()
                .ok_or_else(|| SerialError::custom("input exhausted"))
        }

        fn element_index(&mut self, descriptor: &SerialDescriptor) -> SerialResult<ElementIndex> {
            let _ = descriptor;
            // Flat replay never negotiates; callers decode sequentially.
            Ok(ElementIndex::Done)
        }
    }

    #[test]
    fn typed_calls_collapse_to_scalars() {
        let mut sink = FlatSink { out: Vec::new() };
        sink.encode_i32(7).unwrap();
        sink.encode_str("x").unwrap();
        sink.encode_bool(true).unwrap();
        assert_eq!(
            sink.out,
            vec![
                Scalar::I32(7),
                Scalar::String("x".into()),
                Scalar::Bool(true),
            ],
        );
    }

    #[test]
    fn decode_coerces_and_reports_mismatch() {
        let mut source = FlatSource {
            input: vec![Scalar::I32(7), Scalar::Bool(false)].into_iter(),
        };
        assert_eq!(source.decode_i32().unwrap(), 7);
        let err = source.decode_string().unwrap_err();
        assert!(matches!(err, SerialError::TypeMismatch { .. }));
    }

    #[test]
    fn unimplemented_untyped_decode_fails_descriptively() {
        struct Bare;
        impl ScalarDecoder for Bare {
            fn element_index(
                &mut self,
                _: &SerialDescriptor,
            ) -> SerialResult<ElementIndex> {
                Ok(ElementIndex::Done)
            }
        }

        let err = Bare.decode_i32().unwrap_err();
        assert!(err.to_string().contains("untyped values"));
    }
}
