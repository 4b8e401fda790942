//! The dispatch engines resolving a concrete codec for an open type at
//! encode/decode time.
//!
//! [`PolymorphicCodec`] serves open hierarchies (trait objects) whose
//! subtypes are registered in a [`SerializersModule`]; [`SealedCodec`]
//! serves closed hierarchies (enums) whose variants are known
//! exhaustively at construction; [`ContextualCodec`] defers entirely to
//! the module.
//!
//! [`SerializersModule`]: crate::modules::SerializersModule

mod contextual;
mod open;
mod sealed;

pub use contextual::ContextualCodec;
pub use open::PolymorphicCodec;
pub use sealed::{SealedCodec, SealedVariant};

use core::any::Any;

use crate::codec::ErasedDeserializer;
use crate::encoding::{DecodeSlot, Decoder};
use crate::error::{SerialError, SerialResult};

// -----------------------------------------------------------------------------
// PolymorphicValue

/// The capability a polymorphic base must offer: access to the concrete
/// value behind it.
///
/// Blanket-implemented for every `'static` type, so declaring an open
/// hierarchy is just a supertrait bound:
///
/// ```
/// use serial_core::poly::PolymorphicValue;
///
/// trait Shape: PolymorphicValue {
///     fn area(&self) -> f64;
/// }
///
/// struct Circle { radius: f64 }
/// impl Shape for Circle {
///     fn area(&self) -> f64 { core::f64::consts::PI * self.radius * self.radius }
/// }
///
/// let shape: Box<dyn Shape> = Box::new(Circle { radius: 1.0 });
/// assert!(shape.as_ref().type_name().ends_with("Circle"));
/// ```
pub trait PolymorphicValue: Any {
    /// The concrete value, for registry lookup and downcasting.
    fn as_any(&self) -> &dyn Any;

    /// The concrete type's name, for diagnostics.
    fn type_name(&self) -> &'static str;
}

impl<T: Any> PolymorphicValue for T {
    #[inline]
    fn as_any(&self) -> &dyn Any {
        self
    }

    #[inline]
    fn type_name(&self) -> &'static str {
        core::any::type_name::<T>()
    }
}

// -----------------------------------------------------------------------------
// ErasedSlot

/// A [`DecodeSlot`] over an erased deserializer, used by both dispatch
/// engines for module-resolved subtypes.
pub(crate) struct ErasedSlot<'a> {
    pub(crate) deserializer: &'a ErasedDeserializer,
    pub(crate) out: &'a mut Option<Box<dyn Any>>,
}

impl DecodeSlot for ErasedSlot<'_> {
    fn descriptor(&self) -> crate::descriptor::SerialDescriptor {
        self.deserializer.descriptor().clone()
    }

    fn decode_value(&mut self, decoder: &mut dyn Decoder) -> SerialResult<()> {
        *self.out = Some(self.deserializer.deserialize_any(decoder)?);
        Ok(())
    }

    fn set_null(&mut self) -> SerialResult<()> {
        Err(SerialError::UnexpectedNull {
            type_name: self.deserializer.descriptor().serial_name().to_owned(),
        })
    }

    fn has_previous(&self) -> bool {
        self.out.is_some()
    }
}
