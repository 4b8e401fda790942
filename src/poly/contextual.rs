use core::any::type_name;
use std::sync::Arc;

use crate::codec::{Codec, Described, DeserializeStrategy, ErasedCodec, SerializeStrategy};
use crate::descriptor::{SerialDescriptor, SerialKind, build_serial_descriptor};
use crate::encoding::{Decoder, Encoder};
use crate::error::{SerialError, SerialResult};

// -----------------------------------------------------------------------------
// ContextualCodec

/// A codec resolved from the [`SerializersModule`] at encode/decode time.
///
/// The lookup key is the statically known type `T` plus, for generic
/// types, the type arguments' codecs. When the module has no
/// registration, a statically supplied fallback codec (typically the
/// type's own compiled codec) is used; with neither, the operation fails
/// naming `T`.
///
/// [`SerializersModule`]: crate::modules::SerializersModule
pub struct ContextualCodec<T: 'static> {
    descriptor: SerialDescriptor,
    fallback: Option<Arc<dyn Codec<T>>>,
    type_args: Box<[ErasedCodec]>,
}

impl<T: 'static> ContextualCodec<T> {
    /// Creates a codec with no fallback: the module must have a
    /// registration for `T`.
    pub fn new() -> Self {
        Self {
            descriptor: build_serial_descriptor(type_name::<T>(), SerialKind::Contextual, |_| {}),
            fallback: None,
            type_args: Box::new([]),
        }
    }

    /// Adds a fallback codec, used when the module has no registration.
    #[must_use]
    pub fn with_fallback(mut self, fallback: Arc<dyn Codec<T>>) -> Self {
        self.fallback = Some(fallback);
        self
    }

    /// Supplies the type arguments' codecs for a generic `T`.
    #[must_use]
    pub fn with_type_args(mut self, args: impl Into<Box<[ErasedCodec]>>) -> Self {
        self.type_args = args.into();
        self
    }

    fn resolve(
        &self,
        module: &crate::modules::SerializersModule,
    ) -> SerialResult<Arc<dyn Codec<T>>> {
        if let Some(codec) = module.get_contextual_with_args::<T>(&self.type_args) {
            return Ok(codec);
        }
        match &self.fallback {
            Some(fallback) => Ok(fallback.clone()),
            None => Err(SerialError::ContextualNotRegistered {
                type_name: type_name::<T>().to_owned(),
            }),
        }
    }
}

impl<T: 'static> Default for ContextualCodec<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: 'static> Described for ContextualCodec<T> {
    fn descriptor(&self) -> SerialDescriptor {
        self.descriptor.clone()
    }
}

impl<T: 'static> SerializeStrategy<T> for ContextualCodec<T> {
    fn serialize(&self, encoder: &mut dyn Encoder, value: &T) -> SerialResult<()> {
        let codec = self.resolve(encoder.serializers_module())?;
        codec.serialize(encoder, value)
    }
}

impl<T: 'static> DeserializeStrategy<T> for ContextualCodec<T> {
    fn deserialize(&self, decoder: &mut dyn Decoder) -> SerialResult<T> {
        let codec = self.resolve(decoder.serializers_module())?;
        codec.deserialize(decoder)
    }
}

// -----------------------------------------------------------------------------
// Tests

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builtins::I32Codec;
    use crate::descriptor::primitive_descriptor;
    use crate::encoding::Scalar;
    use crate::modules::SerializersModule;
    use crate::testfmt::{Token, TokenDecoder, TokenEncoder};

    /// A module-registered codec observably different from the fallback:
    /// it doubles on encode and halves on decode.
    struct DoublingCodec;

    impl Described for DoublingCodec {
        fn descriptor(&self) -> SerialDescriptor {
            primitive_descriptor("i32", crate::descriptor::PrimitiveKind::I32)
        }
    }

    impl SerializeStrategy<i32> for DoublingCodec {
        fn serialize(&self, encoder: &mut dyn Encoder, value: &i32) -> SerialResult<()> {
            encoder.encode_i32(value * 2)
        }
    }

    impl DeserializeStrategy<i32> for DoublingCodec {
        fn deserialize(&self, decoder: &mut dyn Decoder) -> SerialResult<i32> {
            Ok(decoder.decode_i32()? / 2)
        }
    }

    #[test]
    fn module_registration_wins_over_the_fallback() {
        let module = SerializersModule::builder()
            .contextual::<i32>(Arc::new(DoublingCodec))
            .build();
        let codec = ContextualCodec::<i32>::new().with_fallback(Arc::new(I32Codec));

        let mut encoder = TokenEncoder::with_module(module.clone());
        codec.serialize(&mut encoder, &21).unwrap();
        assert_eq!(encoder.tokens, vec![Token::Value(Scalar::I32(42))]);

        let mut decoder = TokenDecoder::with_module(encoder.tokens, module);
        assert_eq!(codec.deserialize(&mut decoder).unwrap(), 21);
    }

    #[test]
    fn fallback_serves_when_the_module_is_silent() {
        let codec = ContextualCodec::<i32>::new().with_fallback(Arc::new(I32Codec));
        let mut encoder = TokenEncoder::new();
        codec.serialize(&mut encoder, &7).unwrap();
        assert_eq!(encoder.tokens, vec![Token::Value(Scalar::I32(7))]);
    }

    #[test]
    fn unregistered_without_fallback_names_the_type() {
        let codec = ContextualCodec::<i32>::new();
        let mut encoder = TokenEncoder::new();
        let err = codec.serialize(&mut encoder, &7).unwrap_err();
        assert!(matches!(
            err,
            SerialError::ContextualNotRegistered { type_name } if type_name == "i32"
        ));
    }
}
