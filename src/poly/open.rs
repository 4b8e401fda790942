use core::any::{Any, TypeId, type_name};
use core::marker::PhantomData;

use crate::codec::{Described, DeserializeStrategy, SerializeStrategy};
use crate::descriptor::{
    PolymorphicKind, PrimitiveKind, SerialDescriptor, SerialKind, build_serial_descriptor,
    primitive_descriptor,
};
use crate::encoding::{CompositeDecoder, CompositeEncoder as _, Decoder, ElementIndex, Encoder};
use crate::error::{SerialError, SerialResult};
use crate::poly::{ErasedSlot, PolymorphicValue};

// -----------------------------------------------------------------------------
// PolymorphicCodec

/// The codec for open hierarchies: the concrete codec is resolved from
/// the [`SerializersModule`] at the moment of encode/decode.
///
/// On the wire a polymorphic value is a two-element structure: the
/// discriminator string (`type`) and the nested payload (`value`).
///
/// Resolution is deliberately closed-world. Encoding a value whose
/// concrete type is not registered in the base scope fails — only
/// explicitly allow-listed subtypes may cross the boundary — unless the
/// scope provides a default-serializer selector, which is consulted
/// before failing.
///
/// # Examples
///
/// ```
/// use serial_core::codec::Described;
/// use serial_core::poly::{PolymorphicCodec, PolymorphicValue};
///
/// trait Event: PolymorphicValue {}
///
/// let codec = PolymorphicCodec::<dyn Event>::new();
/// assert_eq!(codec.descriptor().element_name(0), "type");
/// assert_eq!(codec.descriptor().element_name(1), "value");
/// ```
///
/// [`SerializersModule`]: crate::modules::SerializersModule
pub struct PolymorphicCodec<B: ?Sized + 'static> {
    descriptor: SerialDescriptor,
    base_name: &'static str,
    _marker: PhantomData<fn() -> Box<B>>,
}

impl<B: ?Sized + PolymorphicValue> PolymorphicCodec<B> {
    /// Creates the codec for base `B` with the default serial name
    /// `Polymorphic<B>`.
    pub fn new() -> Self {
        Self::with_serial_name(format!("Polymorphic<{}>", type_name::<B>()))
    }

    /// Creates the codec with an explicit serial name.
    pub fn with_serial_name(serial_name: impl Into<String>) -> Self {
        let serial_name = serial_name.into();
        let value_name = format!("{serial_name}.value");
        let descriptor = build_serial_descriptor(
            serial_name,
            SerialKind::Polymorphic(PolymorphicKind::Open),
            |b| {
                b.element("type", primitive_descriptor("String", PrimitiveKind::String));
                b.element(
                    "value",
                    build_serial_descriptor(value_name.clone(), SerialKind::Contextual, |_| {}),
                );
            },
        );
        Self {
            descriptor,
            base_name: type_name::<B>(),
            _marker: PhantomData,
        }
    }

    fn decode_payload(
        &self,
        composite: &mut dyn CompositeDecoder,
        discriminator: Option<&str>,
        out: &mut Option<Box<dyn Any>>,
    ) -> SerialResult<()> {
        let deserializer = composite
            .serializers_module()
            .polymorphic_deserializer(TypeId::of::<B>(), discriminator)
            .ok_or_else(|| match discriminator {
                Some(name) => SerialError::DiscriminatorUnknown {
                    base: self.base_name.to_owned(),
                    name: name.to_owned(),
                },
                None => SerialError::DiscriminatorMissing {
                    base: self.base_name.to_owned(),
                },
            })?;
        let mut slot = ErasedSlot {
            deserializer: &deserializer,
            out,
        };
        composite.decode_serializable_element(&self.descriptor, 1, &mut slot)
    }
}

impl<B: ?Sized + PolymorphicValue> Default for PolymorphicCodec<B> {
    fn default() -> Self {
        Self::new()
    }
}

impl<B: ?Sized> Described for PolymorphicCodec<B> {
    fn descriptor(&self) -> SerialDescriptor {
        self.descriptor.clone()
    }
}

impl<B: ?Sized + PolymorphicValue> SerializeStrategy<Box<B>> for PolymorphicCodec<B> {
    fn serialize(&self, encoder: &mut dyn Encoder, value: &Box<B>) -> SerialResult<()> {
        let concrete = value.as_ref();
        let serializer = encoder
            .serializers_module()
            .polymorphic_serializer(TypeId::of::<B>(), concrete.as_any())
            .ok_or_else(|| SerialError::SubtypeNotRegistered {
                subtype: concrete.type_name().to_owned(),
                base: self.base_name.to_owned(),
            })?;

        let discriminator = serializer.descriptor().serial_name().to_owned();
        let composite = encoder.begin_structure(&self.descriptor)?;
        composite.encode_str_element(&self.descriptor, 0, &discriminator)?;
        composite.encode_serializable_element(
            &self.descriptor,
            1,
            &serializer.bind(concrete.as_any()),
        )?;
        composite.end_structure(&self.descriptor)
    }
}

impl<B: ?Sized + PolymorphicValue> DeserializeStrategy<Box<B>> for PolymorphicCodec<B> {
    fn deserialize(&self, decoder: &mut dyn Decoder) -> SerialResult<Box<B>> {
        let composite = decoder.begin_structure(&self.descriptor)?;
        let mut discriminator: Option<String> = None;
        let mut decoded: Option<Box<dyn Any>> = None;

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
                            "invalid element index {other} while decoding the polymorphic value `{}`",
                            self.descriptor.serial_name(),
                        )));
                    }
                    ElementIndex::Unknown => {
                        return Err(SerialError::custom(format!(
                            "unknown element while decoding the polymorphic value `{}`",
                            self.descriptor.serial_name(),
                        )));
                    }
                    ElementIndex::Done => break,
                }
            }
        }
        composite.end_structure(&self.descriptor)?;

        let decoded = match decoded {
            Some(decoded) => decoded,
            None => {
                let mut fields = Vec::new();
                if discriminator.is_none() {
                    fields.push("type".to_owned());
                }
                fields.push("value".to_owned());
                return Err(SerialError::MissingFields {
                    serial_name: self.descriptor.serial_name().to_owned(),
                    fields,
                });
            }
        };
        match decoded.downcast::<Box<B>>() {
            Ok(value) => Ok(*value),
            Err(_) => Err(SerialError::TypeMismatch {
                expected: type_name::<Box<B>>().into(),
                found: "<polymorphic payload>".into(),
            }),
        }
    }
}

// -----------------------------------------------------------------------------
// Tests
