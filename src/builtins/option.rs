use std::sync::Arc;

use crate::codec::{Codec, Described, DeserializeStrategy, Serial, SerializeStrategy};
use crate::descriptor::SerialDescriptor;
use crate::encoding::{Decoder, Encoder};
use crate::error::SerialResult;
use crate::lookup::codec_of;

// -----------------------------------------------------------------------------
// OptionCodec

/// Codec for `Option<T>`: the nullability wrapper.
///
/// Nullability wrapping is always the outermost layer — whatever tier
/// resolved the inner codec, `Option<T>` wraps it uniformly. The encode
/// side drives the mark protocol: a not-null mark before a present
/// payload, a bare null otherwise.
///
/// # Examples
///
/// ```
/// use std::sync::Arc;
/// use serial_core::builtins::{I32Codec, OptionCodec};
/// use serial_core::codec::Described;
///
/// let codec = OptionCodec::new(Arc::new(I32Codec));
/// assert!(codec.descriptor().is_nullable());
/// assert_eq!(codec.descriptor().serial_name(), "i32?");
/// ```
pub struct OptionCodec<T> {
    inner: Arc<dyn Codec<T>>,
    descriptor: SerialDescriptor,
}

impl<T> OptionCodec<T> {
    /// Wraps the codec for `T`.
    pub fn new(inner: Arc<dyn Codec<T>>) -> Self {
        let descriptor = inner.descriptor().nullable();
        Self { inner, descriptor }
    }
}

impl<T> Described for OptionCodec<T> {
    fn descriptor(&self) -> SerialDescriptor {
        self.descriptor.clone()
    }
}

impl<T: 'static> SerializeStrategy<Option<T>> for OptionCodec<T> {
    fn serialize(&self, encoder: &mut dyn Encoder, value: &Option<T>) -> SerialResult<()> {
        match value {
            Some(value) => {
                encoder.encode_not_null_mark()?;
                self.inner.serialize(encoder, value)
            }
            None => encoder.encode_null(),
        }
    }
}

impl<T: 'static> DeserializeStrategy<Option<T>> for OptionCodec<T> {
    fn deserialize(&self, decoder: &mut dyn Decoder) -> SerialResult<Option<T>> {
        if decoder.decode_not_null_mark()? {
            Ok(Some(self.inner.deserialize(decoder)?))
        } else {
            decoder.decode_null()?;
            Ok(None)
        }
    }
}

impl<T: Serial> Serial for Option<T> {
    fn codec() -> Arc<dyn Codec<Option<T>>> {
        Arc::new(OptionCodec::new(codec_of::<T>()))
    }
}

// -----------------------------------------------------------------------------
// BoxCodec

/// Codec for `Box<T>`, transparent over the payload codec.
pub struct BoxCodec<T> {
    inner: Arc<dyn Codec<T>>,
}

impl<T> BoxCodec<T> {
    /// Wraps the codec for `T`.
    pub fn new(inner: Arc<dyn Codec<T>>) -> Self {
        Self { inner }
    }
}

impl<T> Described for BoxCodec<T> {
    fn descriptor(&self) -> SerialDescriptor {
        self.inner.descriptor()
    }
}

impl<T: 'static> SerializeStrategy<Box<T>> for BoxCodec<T> {
    fn serialize(&self, encoder: &mut dyn Encoder, value: &Box<T>) -> SerialResult<()> {
        self.inner.serialize(encoder, value)
    }
}

impl<T: 'static> DeserializeStrategy<Box<T>> for BoxCodec<T> {
    fn deserialize(&self, decoder: &mut dyn Decoder) -> SerialResult<Box<T>> {
        Ok(Box::new(self.inner.deserialize(decoder)?))
    }
}

impl<T: Serial> Serial for Box<T> {
    fn codec() -> Arc<dyn Codec<Box<T>>> {
        Arc::new(BoxCodec::new(codec_of::<T>()))
    }
}
