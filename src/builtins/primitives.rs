use std::sync::{Arc, LazyLock};

use crate::codec::{Codec, Described, DeserializeStrategy, Serial, SerializeStrategy};
use crate::descriptor::{
    PrimitiveKind, SerialDescriptor, SerialKind, StructureKind, build_serial_descriptor,
    primitive_descriptor,
};
use crate::encoding::{
    CompositeDecoder as _, CompositeEncoder as _, Decoder, ElementIndex, Encoder,
};
use crate::error::{SerialError, SerialResult};

// -----------------------------------------------------------------------------
// Primitive codecs

macro_rules! primitive_codec {
    ($(#[$doc:meta])* $codec:ident, $ty:ty, $name:literal, $kind:ident, $encode:ident, $decode:ident) => {
        $(#[$doc])*
        #[derive(Debug, Clone, Copy, Default)]
        pub struct $codec;

        impl Described for $codec {
            fn descriptor(&self) -> SerialDescriptor {
                static DESCRIPTOR: LazyLock<SerialDescriptor> =
                    LazyLock::new(|| primitive_descriptor($name, PrimitiveKind::$kind));
                DESCRIPTOR.clone()
            }
        }

        impl SerializeStrategy<$ty> for $codec {
            fn serialize(&self, encoder: &mut dyn Encoder, value: &$ty) -> SerialResult<()> {
                encoder.$encode(*value)
            }
        }

        impl DeserializeStrategy<$ty> for $codec {
            fn deserialize(&self, decoder: &mut dyn Decoder) -> SerialResult<$ty> {
                decoder.$decode()
            }
        }

        impl Serial for $ty {
            fn codec() -> Arc<dyn Codec<$ty>> {
                Arc::new($codec)
            }
        }
    };
}

primitive_codec!(
    /// Codec for `bool`.
    BoolCodec, bool, "bool", Bool, encode_bool, decode_bool
);
primitive_codec!(
    /// Codec for `i8`.
    I8Codec, i8, "i8", I8, encode_i8, decode_i8
);
primitive_codec!(
    /// Codec for `i16`.
    I16Codec, i16, "i16", I16, encode_i16, decode_i16
);
primitive_codec!(
    /// Codec for `i32`.
    I32Codec, i32, "i32", I32, encode_i32, decode_i32
);
primitive_codec!(
    /// Codec for `i64`.
    I64Codec, i64, "i64", I64, encode_i64, decode_i64
);
primitive_codec!(
    /// Codec for `f32`.
    F32Codec, f32, "f32", F32, encode_f32, decode_f32
);
primitive_codec!(
    /// Codec for `f64`.
    F64Codec, f64, "f64", F64, encode_f64, decode_f64
);
primitive_codec!(
    /// Codec for `char`.
    CharCodec, char, "char", Char, encode_char, decode_char
);

// -----------------------------------------------------------------------------
// StringCodec

/// Codec for `String`.
#[derive(Debug, Clone, Copy, Default)]
pub struct StringCodec;

impl Described for StringCodec {
    fn descriptor(&self) -> SerialDescriptor {
        static DESCRIPTOR: LazyLock<SerialDescriptor> =
            LazyLock::new(|| primitive_descriptor("String", PrimitiveKind::String));
        DESCRIPTOR.clone()
    }
}

impl SerializeStrategy<String> for StringCodec {
    fn serialize(&self, encoder: &mut dyn Encoder, value: &String) -> SerialResult<()> {
        encoder.encode_str(value)
    }
}

impl DeserializeStrategy<String> for StringCodec {
    fn deserialize(&self, decoder: &mut dyn Decoder) -> SerialResult<String> {
        decoder.decode_string()
    }
}

impl Serial for String {
    fn codec() -> Arc<dyn Codec<String>> {
        Arc::new(StringCodec)
    }
}

// Strings can also be serialized straight from borrowed data.
impl SerializeStrategy<str> for StringCodec {
    fn serialize(&self, encoder: &mut dyn Encoder, value: &str) -> SerialResult<()> {
        encoder.encode_str(value)
    }
}

// -----------------------------------------------------------------------------
// UnitCodec

/// Codec for `()`, encoded as an empty object.
#[derive(Debug, Clone, Copy, Default)]
pub struct UnitCodec;

impl Described for UnitCodec {
    fn descriptor(&self) -> SerialDescriptor {
        static DESCRIPTOR: LazyLock<SerialDescriptor> = LazyLock::new(|| {
            build_serial_descriptor("Unit", SerialKind::Structure(StructureKind::Object), |_| {})
        });
        DESCRIPTOR.clone()
    }
}

impl SerializeStrategy<()> for UnitCodec {
    fn serialize(&self, encoder: &mut dyn Encoder, _value: &()) -> SerialResult<()> {
        let descriptor = self.descriptor();
        let composite = encoder.begin_structure(&descriptor)?;
        composite.end_structure(&descriptor)
    }
}

impl DeserializeStrategy<()> for UnitCodec {
    fn deserialize(&self, decoder: &mut dyn Decoder) -> SerialResult<()> {
        let descriptor = self.descriptor();
        let composite = decoder.begin_structure(&descriptor)?;
        if !composite.decode_sequentially() {
            loop {
                match composite.decode_element_index(&descriptor)? {
                    ElementIndex::Done => break,
                    ElementIndex::Unknown => continue,
                    ElementIndex::Index(index) => {
                        return Err(SerialError::custom(format!(
                            "unexpected element {index} while decoding `Unit`",
                        )));
                    }
                }
            }
        }
        composite.end_structure(&descriptor)
    }
}

impl Serial for () {
    fn codec() -> Arc<dyn Codec<()>> {
        Arc::new(UnitCodec)
    }
}

// -----------------------------------------------------------------------------
// Tests

#[cfg(test)]
mod tests {
    use super::*;
    use crate::descriptor::SerialKind;

    #[test]
    fn primitive_descriptors() {
        assert_eq!(
            I32Codec.descriptor().kind(),
            SerialKind::Primitive(PrimitiveKind::I32),
        );
        assert_eq!(StringCodec.descriptor().serial_name(), "String");
        assert_eq!(
            UnitCodec.descriptor().kind(),
            SerialKind::Structure(StructureKind::Object),
        );
    }

    #[test]
    fn descriptors_are_shared() {
        // The static is cloned, so repeated queries are pointer-equal and
        // compare in O(1).
        assert_eq!(BoolCodec.descriptor(), BoolCodec.descriptor());
    }
}
