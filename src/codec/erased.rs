use core::any::{Any, TypeId, type_name};
use std::sync::Arc;

use crate::codec::{Codec, Described, DeserializeStrategy, SerializeStrategy};
use crate::descriptor::SerialDescriptor;
use crate::encoding::{Decoder, Encoder};
use crate::error::{SerialError, SerialResult};

// -----------------------------------------------------------------------------
// ErasedCodec

/// A type-erased codec, storable in registries and caches.
///
/// Internally an `Arc<dyn Codec<T>>` boxed behind [`Any`]; the typed view
/// is recovered with [`downcast`](Self::downcast). The descriptor and the
/// type identity stay available without downcasting, which is all the
/// registry layers need for their bookkeeping.
#[derive(Clone)]
pub struct ErasedCodec {
    type_id: TypeId,
    type_name: &'static str,
    descriptor: SerialDescriptor,
    // Address of the erased allocation; identity survives re-erasure of
    // the same codec instance.
    instance: usize,
    codec: Arc<dyn Any + Send + Sync>,
}

impl ErasedCodec {
    /// Erases a typed codec.
    pub fn new<T: 'static>(codec: Arc<dyn Codec<T>>) -> Self {
        Self {
            type_id: TypeId::of::<T>(),
            type_name: type_name::<T>(),
            descriptor: codec.descriptor(),
            instance: Arc::as_ptr(&codec) as *const () as usize,
            codec: Arc::new(codec),
        }
    }

    /// The [`TypeId`] of the value type this codec handles.
    #[inline]
    pub fn type_id(&self) -> TypeId {
        self.type_id
    }

    /// The name of the value type, for diagnostics.
    #[inline]
    pub fn type_name(&self) -> &'static str {
        self.type_name
    }

    /// The erased codec's descriptor.
    #[inline]
    pub fn descriptor(&self) -> &SerialDescriptor {
        &self.descriptor
    }

    /// Recovers the typed codec.
    ///
    /// Fails with [`SerialError::TypeMismatch`] when `T` is not the type
    /// the codec was erased from.
    pub fn downcast<T: 'static>(&self) -> SerialResult<Arc<dyn Codec<T>>> {
        match self.codec.downcast_ref::<Arc<dyn Codec<T>>>() {
            Some(codec) => Ok(codec.clone()),
            None => Err(SerialError::TypeMismatch {
                expected: type_name::<T>().into(),
                found: self.type_name.into(),
            }),
        }
    }

    /// Whether two erased codecs refer to the same codec instance.
    ///
    /// Used by module composition to tell a re-registration of the same
    /// codec apart from a genuine conflict.
    pub(crate) fn same_instance(&self, other: &ErasedCodec) -> bool {
        self.instance == other.instance
    }
}

impl core::fmt::Debug for ErasedCodec {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("ErasedCodec")
            .field("type_name", &self.type_name)
            .field("descriptor", &self.descriptor)
            .finish()
    }
}

// -----------------------------------------------------------------------------
// ErasedSerializer

/// A serialize strategy erased down to `&dyn Any` input.
///
/// The typed strategy is captured in a closure that downcasts and
/// delegates; a value of the wrong runtime type is reported as a
/// [`SerialError::TypeMismatch`] instead of reaching the format.
#[derive(Clone)]
pub struct ErasedSerializer {
    descriptor: SerialDescriptor,
    serialize: Arc<dyn Fn(&dyn Any, &mut dyn Encoder) -> SerialResult<()> + Send + Sync>,
}

impl ErasedSerializer {
    /// Erases a typed serialize strategy.
    pub fn new<T: 'static>(strategy: Arc<dyn SerializeStrategy<T>>) -> Self {
        let descriptor = strategy.descriptor();
        Self {
            descriptor,
            serialize: Arc::new(move |value, encoder| match value.downcast_ref::<T>() {
                Some(value) => strategy.serialize(encoder, value),
                None => Err(SerialError::TypeMismatch {
                    expected: type_name::<T>().into(),
                    found: "<erased value>".into(),
                }),
            }),
        }
    }

    /// The descriptor of the underlying strategy; its serial name is the
    /// wire discriminator for polymorphic encoding.
    #[inline]
    pub fn descriptor(&self) -> &SerialDescriptor {
        &self.descriptor
    }

    /// Serializes an erased value.
    #[inline]
    pub fn serialize_any(&self, value: &dyn Any, encoder: &mut dyn Encoder) -> SerialResult<()> {
        (self.serialize)(value, encoder)
    }

    /// Pairs this serializer with a value, producing an element for
    /// [`encode_serializable_element`].
    ///
    /// [`encode_serializable_element`]: crate::encoding::CompositeEncoder::encode_serializable_element
    pub fn bind<'a>(&'a self, value: &'a dyn Any) -> impl crate::encoding::Encodable + 'a {
        struct Bound<'a> {
            serializer: &'a ErasedSerializer,
            value: &'a dyn Any,
        }

        impl crate::encoding::Encodable for Bound<'_> {
            fn descriptor(&self) -> SerialDescriptor {
                self.serializer.descriptor.clone()
            }

            fn encode(&self, encoder: &mut dyn Encoder) -> SerialResult<()> {
                self.serializer.serialize_any(self.value, encoder)
            }
        }

        Bound {
            serializer: self,
            value,
        }
    }
}

// -----------------------------------------------------------------------------
// ErasedDeserializer

/// A deserialize strategy erased to produce `Box<dyn Any>`.
///
/// Built with a wrap function that lifts the decoded value into the base
/// representation of its polymorphic scope (`Box<dyn Trait>`, an enum,
/// ...); the `Box<dyn Any>` then holds that base value.
#[derive(Clone)]
pub struct ErasedDeserializer {
    descriptor: SerialDescriptor,
    deserialize: Arc<dyn Fn(&mut dyn Decoder) -> SerialResult<Box<dyn Any>> + Send + Sync>,
}

impl ErasedDeserializer {
    /// Erases a typed deserialize strategy, lifting every decoded value
    /// through `wrap`.
    ///
    /// At a monomorphic call site `wrap` is usually just `|v| Box::new(v)`
    /// with the unsized coercion into `Box<B>` happening implicitly.
    pub fn wrapping<T: 'static, B: ?Sized + 'static>(
        strategy: Arc<dyn DeserializeStrategy<T>>,
        wrap: fn(T) -> Box<B>,
    ) -> Self {
        let descriptor = strategy.descriptor();
        Self {
            descriptor,
            deserialize: Arc::new(move |decoder| {
                let value = strategy.deserialize(decoder)?;
                Ok(Box::new(wrap(value)) as Box<dyn Any>)
            }),
        }
    }

    /// The descriptor of the underlying strategy.
    #[inline]
    pub fn descriptor(&self) -> &SerialDescriptor {
        &self.descriptor
    }

    /// Decodes one value, returning it behind [`Any`].
    ///
    /// The boxed value has the type the wrap function produced, e.g.
    /// `Box<B>` for a scope with base `B`.
    #[inline]
    pub fn deserialize_any(&self, decoder: &mut dyn Decoder) -> SerialResult<Box<dyn Any>> {
        (self.deserialize)(decoder)
    }
}

// -----------------------------------------------------------------------------
// Tests

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builtins::I32Codec;

    #[test]
    fn downcast_roundtrip() {
        let erased = ErasedCodec::new::<i32>(Arc::new(I32Codec));
        assert_eq!(erased.type_id(), TypeId::of::<i32>());
        assert!(erased.downcast::<i32>().is_ok());

        let err = erased.downcast::<String>().err().unwrap();
        assert!(matches!(err, SerialError::TypeMismatch { .. }));
    }

    #[test]
    fn erased_serializer_rejects_foreign_values() {
        let mut encoder = crate::testfmt::TokenEncoder::new();
        let erased = ErasedSerializer::new::<i32>(Arc::new(I32Codec));

        let err = erased.serialize_any(&"hello", &mut encoder).unwrap_err();
        assert!(matches!(err, SerialError::TypeMismatch { .. }));
    }
}
