use core::any::{Any, TypeId, type_name};
use std::sync::Arc;

use crate::codec::{Codec, Described, DeserializeStrategy, SerializeStrategy};
use crate::descriptor::{
    PolymorphicKind, PrimitiveKind, SerialDescriptor, SerialKind, build_serial_descriptor,
    primitive_descriptor,
};
use crate::encoding::{
    CompositeDecoder, CompositeEncoder as _, DecodeSlot, Decoder, ElementIndex, Encodable, Encoder,
};
use crate::error::{SerialError, SerialResult};
use crate::poly::ErasedSlot;
use crate::util::FastMap;

// -----------------------------------------------------------------------------
// SealedVariant

/// One variant of a closed hierarchy: a payload codec plus the
/// projection/embedding pair tying it to the enclosing enum.
pub struct SealedVariant<T> {
    pub(crate) variant_name: &'static str,
    descriptor: SerialDescriptor,
    matches: Box<dyn Fn(&T) -> bool + Send + Sync>,
    serialize: Box<dyn Fn(&T, &mut dyn Encoder) -> SerialResult<()> + Send + Sync>,
    deserialize: Box<dyn Fn(&mut dyn Decoder) -> SerialResult<T> + Send + Sync>,
}

impl<T: 'static> SealedVariant<T> {
    /// Creates a variant from its payload codec.
    ///
    /// `project` extracts the payload from a value holding this variant
    /// (`None` for any other variant); `embed` rebuilds the value from a
    /// decoded payload.
    pub fn new<P: 'static>(
        codec: Arc<dyn Codec<P>>,
        project: for<'a> fn(&'a T) -> Option<&'a P>,
        embed: fn(P) -> T,
    ) -> Self {
        let descriptor = codec.descriptor();
        let ser = codec.clone();
        Self {
            variant_name: "",
            descriptor,
            matches: Box::new(move |value| project(value).is_some()),
            serialize: Box::new(move |value, encoder| match project(value) {
                Some(payload) => ser.serialize(encoder, payload),
                None => Err(SerialError::custom(
                    "sealed variant was selected for a value it does not hold",
                )),
            }),
            deserialize: Box::new(move |decoder| Ok(embed(codec.deserialize(decoder)?))),
        }
    }

    /// The discriminator this variant is written under.
    #[inline]
    pub fn serial_name(&self) -> &str {
        self.descriptor.serial_name()
    }
}

struct VariantEncodable<'a, T> {
    variant: &'a SealedVariant<T>,
    value: &'a T,
}

impl<T> Encodable for VariantEncodable<'_, T> {
    fn descriptor(&self) -> SerialDescriptor {
        self.variant.descriptor.clone()
    }

    fn encode(&self, encoder: &mut dyn Encoder) -> SerialResult<()> {
        (self.variant.serialize)(self.value, encoder)
    }
}

struct VariantSlot<'a, T> {
    variant: &'a SealedVariant<T>,
    out: &'a mut Option<T>,
}

impl<T> DecodeSlot for VariantSlot<'_, T> {
    fn descriptor(&self) -> SerialDescriptor {
        self.variant.descriptor.clone()
    }

    fn decode_value(&mut self, decoder: &mut dyn Decoder) -> SerialResult<()> {
        *self.out = Some((self.variant.deserialize)(decoder)?);
        Ok(())
    }

    fn set_null(&mut self) -> SerialResult<()> {
        Err(SerialError::UnexpectedNull {
            type_name: self.variant.descriptor.serial_name().to_owned(),
        })
    }

    fn has_previous(&self) -> bool {
        self.out.is_some()
    }
}

// -----------------------------------------------------------------------------
// SealedCodec

/// The codec for closed hierarchies, where every variant is known at
/// construction time.
///
/// Unlike [`PolymorphicCodec`](crate::poly::PolymorphicCodec), the
/// discriminator and type tables are built eagerly from the supplied
/// variants, and validated eagerly too: a name/codec arity mismatch or
/// two variants sharing a serial name fail construction immediately,
/// naming the offenders.
///
/// The [`SerializersModule`] is still consulted as a fallback — only when
/// no direct variant matches — so variants that are themselves open can
/// be served by runtime registrations. A direct match always wins.
///
/// [`SerializersModule`]: crate::modules::SerializersModule
pub struct SealedCodec<T> {
    serial_name: String,
    descriptor: SerialDescriptor,
    variants: Vec<SealedVariant<T>>,
    by_name: FastMap<String, usize>,
}

impl<T: 'static> SealedCodec<T> {
    /// Creates the codec from parallel variant-name / variant arrays.
    ///
    /// # Panics
    ///
    /// Panics if the arrays differ in length, or if two variants share a
    /// serial name (an ambiguous discriminator); the message names both
    /// offending variants.
    pub fn new(
        serial_name: impl Into<String>,
        variant_names: &[&'static str],
        mut variants: Vec<SealedVariant<T>>,
    ) -> Self {
        let serial_name = serial_name.into();
        if variant_names.len() != variants.len() {
            panic!(
                "`{serial_name}`: {} variant names were supplied for {} variant codecs",
                variant_names.len(),
                variants.len(),
            );
        }
        for (variant, &name) in variants.iter_mut().zip(variant_names) {
            variant.variant_name = name;
        }

        let mut by_name = FastMap::default();
        for (index, variant) in variants.iter().enumerate() {
            if let Some(&previous) = by_name.get(variant.serial_name()) {
                let previous: &SealedVariant<T> = &variants[previous];
                panic!(
                    "variants `{}` and `{}` of sealed `{serial_name}` have the same serial name `{}`",
                    previous.variant_name,
                    variant.variant_name,
                    variant.serial_name(),
                );
            }
            by_name.insert(variant.serial_name().to_owned(), index);
        }

        let value_name = format!("{serial_name}.value");
        let descriptor = build_serial_descriptor(
            serial_name.clone(),
            SerialKind::Polymorphic(PolymorphicKind::Sealed),
            |b| {
                b.element("type", primitive_descriptor("String", PrimitiveKind::String));
                let variant_list =
                    build_serial_descriptor(value_name.clone(), SerialKind::Contextual, |vb| {
                        for variant in &variants {
                            vb.element(variant.serial_name().to_owned(), variant.descriptor.clone());
                        }
                    });
                b.element("value", variant_list);
            },
        );

        Self {
            serial_name,
            descriptor,
            variants,
            by_name,
        }
    }

    /// The registered variants, in declaration order.
    pub fn variants(&self) -> impl ExactSizeIterator<Item = &SealedVariant<T>> {
        self.variants.iter()
    }

    fn encode_pair(
        &self,
        encoder: &mut dyn Encoder,
        discriminator: &str,
        value: &dyn Encodable,
    ) -> SerialResult<()> {
        let composite = encoder.begin_structure(&self.descriptor)?;
        composite.encode_str_element(&self.descriptor, 0, discriminator)?;
        composite.encode_serializable_element(&self.descriptor, 1, value)?;
        composite.end_structure(&self.descriptor)
    }
}

enum Decoded<T> {
    Direct(T),
    Fallback(Box<dyn Any>),
}

impl<T: 'static> Described for SealedCodec<T> {
    fn descriptor(&self) -> SerialDescriptor {
        self.descriptor.clone()
    }
}

impl<T: 'static> SerializeStrategy<T> for SealedCodec<T> {
    fn serialize(&self, encoder: &mut dyn Encoder, value: &T) -> SerialResult<()> {
        // Compile-time-known variants always win over runtime defaults.
        for variant in &self.variants {
            if (variant.matches)(value) {
                let discriminator = variant.serial_name().to_owned();
                return self.encode_pair(
                    encoder,
                    &discriminator,
                    &VariantEncodable { variant, value },
                );
            }
        }

        let fallback = encoder
            .serializers_module()
            .polymorphic_serializer(TypeId::of::<T>(), value as &dyn Any)
            .ok_or_else(|| SerialError::SubtypeNotRegistered {
                subtype: type_name::<T>().to_owned(),
                base: self.serial_name.clone(),
            })?;
        let discriminator = fallback.descriptor().serial_name().to_owned();
        self.encode_pair(encoder, &discriminator, &fallback.bind(value as &dyn Any))
    }
}

impl<T: 'static> DeserializeStrategy<T> for SealedCodec<T> {
    fn deserialize(&self, decoder: &mut dyn Decoder) -> SerialResult<T> {
        let composite = decoder.begin_structure(&self.descriptor)?;
        let mut discriminator: Option<String> = None;
        let mut decoded: Option<Decoded<T>> = None;

        if composite.decode_sequentially() {
            discriminator = Some(composite.decode_str_element(&self.descriptor, 0)?);
            self.decode_payload(composite, discriminator.as_deref(), &mut decoded)?;
        } else {
            loop {
                match composite.decode_element_index(&self.descriptor)? {
                    ElementIndex::Index(0) => {
                        discriminator =
                            Some(composite.decode_str_element(&self.descriptor, 0)?);
                    }
                    ElementIndex::Index(1) => {
                        self.decode_payload(composite, discriminator.as_deref(), &mut decoded)?;
                    }
                    ElementIndex::Index(other) => {
                        return Err(SerialError::custom(format!(
                            "invalid element index {other} while decoding the sealed value `{}`",
                            self.serial_name,
                        )));
                    }
                    ElementIndex::Unknown => {
                        return Err(SerialError::custom(format!(
                            "unknown element while decoding the sealed value `{}`",
                            self.serial_name,
                        )));
                    }
                    ElementIndex::Done => break,
                }
            }
        }
        composite.end_structure(&self.descriptor)?;

        match decoded {
            Some(Decoded::Direct(value)) => Ok(value),
            Some(Decoded::Fallback(value)) => match value.downcast::<Box<T>>() {
                Ok(value) => Ok(*(*value)),
                Err(_) => Err(SerialError::TypeMismatch {
                    expected: type_name::<T>().into(),
                    found: "<sealed fallback payload>".into(),
                }),
            },
            None => {
                let mut fields = Vec::new();
                if discriminator.is_none() {
                    fields.push("type".to_owned());
                }
                fields.push("value".to_owned());
                Err(SerialError::MissingFields {
                    serial_name: self.serial_name.clone(),
                    fields,
                })
            }
        }
    }
}

impl<T: 'static> SealedCodec<T> {
    fn decode_payload(
        &self,
        composite: &mut dyn CompositeDecoder,
        discriminator: Option<&str>,
        out: &mut Option<Decoded<T>>,
    ) -> SerialResult<()> {
        if let Some(name) = discriminator
            && let Some(&index) = self.by_name.get(name)
        {
            let variant = &self.variants[index];
            let mut value = None;
            let mut slot = VariantSlot {
                variant,
                out: &mut value,
            };
            composite.decode_serializable_element(&self.descriptor, 1, &mut slot)?;
            if let Some(value) = value {
                *out = Some(Decoded::Direct(value));
            }
            return Ok(());
        }

        // No direct variant: the module may still know the name.
        let fallback = composite
            .serializers_module()
            .polymorphic_deserializer(TypeId::of::<T>(), discriminator)
            .ok_or_else(|| match discriminator {
                Some(name) => SerialError::DiscriminatorUnknown {
                    base: self.serial_name.clone(),
                    name: name.to_owned(),
                },
                None => SerialError::DiscriminatorMissing {
                    base: self.serial_name.clone(),
                },
            })?;
        let mut value = None;
        let mut slot = ErasedSlot {
            deserializer: &fallback,
            out: &mut value,
        };
        composite.decode_serializable_element(&self.descriptor, 1, &mut slot)?;
        if let Some(value) = value {
            *out = Some(Decoded::Fallback(value));
        }
        Ok(())
    }
}

// -----------------------------------------------------------------------------
// Tests
