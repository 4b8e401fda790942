use std::sync::Arc;

use crate::codec::{Codec, Described, DeserializeStrategy, Serial, SerializeStrategy};
use crate::descriptor::{SerialDescriptor, build_class_serial_descriptor};
use crate::encoding::{
    CompositeDecoder as _, CompositeEncoder as _, Decoder, ElementIndex, Encoder, Slot, encodable,
};
use crate::error::{SerialError, SerialResult};
use crate::lookup::codec_of;

fn missing_fields(serial_name: &str, names: &[(&str, bool)]) -> SerialError {
    SerialError::MissingFields {
        serial_name: serial_name.to_owned(),
        fields: names
            .iter()
            .filter(|(_, present)| !present)
            .map(|(name, _)| (*name).to_owned())
            .collect(),
    }
}

// -----------------------------------------------------------------------------
// PairCodec

/// Codec for two-element tuples, shaped as a class with `first` and
/// `second` elements.
pub struct PairCodec<A, B> {
    first: Arc<dyn Codec<A>>,
    second: Arc<dyn Codec<B>>,
    descriptor: SerialDescriptor,
}

impl<A, B> PairCodec<A, B> {
    /// Creates the codec from the component codecs.
    pub fn new(first: Arc<dyn Codec<A>>, second: Arc<dyn Codec<B>>) -> Self {
        let descriptor = build_class_serial_descriptor("Pair", |b| {
            b.type_param(first.descriptor());
            b.type_param(second.descriptor());
            b.element("first", first.descriptor());
            b.element("second", second.descriptor());
        });
        Self {
            first,
            second,
            descriptor,
        }
    }
}

impl<A, B> Described for PairCodec<A, B> {
    fn descriptor(&self) -> SerialDescriptor {
        self.descriptor.clone()
    }
}

impl<A: 'static, B: 'static> SerializeStrategy<(A, B)> for PairCodec<A, B> {
    fn serialize(&self, encoder: &mut dyn Encoder, value: &(A, B)) -> SerialResult<()> {
        let composite = encoder.begin_structure(&self.descriptor)?;
        composite.encode_serializable_element(
            &self.descriptor,
            0,
            &encodable(self.first.as_ref(), &value.0),
        )?;
        composite.encode_serializable_element(
            &self.descriptor,
            1,
            &encodable(self.second.as_ref(), &value.1),
        )?;
        composite.end_structure(&self.descriptor)
    }
}

impl<A: 'static, B: 'static> DeserializeStrategy<(A, B)> for PairCodec<A, B> {
    fn deserialize(&self, decoder: &mut dyn Decoder) -> SerialResult<(A, B)> {
        let composite = decoder.begin_structure(&self.descriptor)?;
        let mut first: Option<A> = None;
        let mut second: Option<B> = None;

        if composite.decode_sequentially() {
            let mut slot = Slot::new(self.first.as_ref());
            composite.decode_serializable_element(&self.descriptor, 0, &mut slot)?;
            first = slot.take();
            let mut slot = Slot::new(self.second.as_ref());
            composite.decode_serializable_element(&self.descriptor, 1, &mut slot)?;
            second = slot.take();
        } else {
            loop {
                match composite.decode_element_index(&self.descriptor)? {
                    ElementIndex::Index(0) => {
                        let mut slot = Slot::new(self.first.as_ref());
                        composite.decode_serializable_element(&self.descriptor, 0, &mut slot)?;
                        first = slot.take();
                    }
                    ElementIndex::Index(1) => {
                        let mut slot = Slot::new(self.second.as_ref());
                        composite.decode_serializable_element(&self.descriptor, 1, &mut slot)?;
                        second = slot.take();
                    }
                    ElementIndex::Index(other) => {
                        return Err(SerialError::custom(format!(
                            "invalid element index {other} while decoding `Pair`",
                        )));
                    }
                    ElementIndex::Unknown => continue,
                    ElementIndex::Done => break,
                }
            }
        }
        composite.end_structure(&self.descriptor)?;

        match (first, second) {
            (Some(first), Some(second)) => Ok((first, second)),
            (first, second) => Err(missing_fields(
                "Pair",
                &[("first", first.is_some()), ("second", second.is_some())],
            )),
        }
    }
}

impl<A: Serial, B: Serial> Serial for (A, B) {
    fn codec() -> Arc<dyn Codec<(A, B)>> {
        Arc::new(PairCodec::new(codec_of::<A>(), codec_of::<B>()))
    }
}

// -----------------------------------------------------------------------------
// TripleCodec

/// Codec for three-element tuples, shaped as a class with `first`,
/// `second` and `third` elements.
pub struct TripleCodec<A, B, C> {
    first: Arc<dyn Codec<A>>,
    second: Arc<dyn Codec<B>>,
    third: Arc<dyn Codec<C>>,
    descriptor: SerialDescriptor,
}

impl<A, B, C> TripleCodec<A, B, C> {
    /// Creates the codec from the component codecs.
    pub fn new(
        first: Arc<dyn Codec<A>>,
        second: Arc<dyn Codec<B>>,
        third: Arc<dyn Codec<C>>,
    ) -> Self {
        let descriptor = build_class_serial_descriptor("Triple", |b| {
            b.type_param(first.descriptor());
            b.type_param(second.descriptor());
            b.type_param(third.descriptor());
            b.element("first", first.descriptor());
            b.element("second", second.descriptor());
            b.element("third", third.descriptor());
        });
        Self {
            first,
            second,
            third,
            descriptor,
        }
    }
}

impl<A, B, C> Described for TripleCodec<A, B, C> {
    fn descriptor(&self) -> SerialDescriptor {
        self.descriptor.clone()
    }
}

impl<A: 'static, B: 'static, C: 'static> SerializeStrategy<(A, B, C)> for TripleCodec<A, B, C> {
    fn serialize(&self, encoder: &mut dyn Encoder, value: &(A, B, C)) -> SerialResult<()> {
        let composite = encoder.begin_structure(&self.descriptor)?;
        composite.encode_serializable_element(
            &self.descriptor,
            0,
            &encodable(self.first.as_ref(), &value.0),
        )?;
        composite.encode_serializable_element(
            &self.descriptor,
            1,
            &encodable(self.second.as_ref(), &value.1),
        )?;
        composite.encode_serializable_element(
            &self.descriptor,
            2,
            &encodable(self.third.as_ref(), &value.2),
        )?;
        composite.end_structure(&self.descriptor)
    }
}

impl<A: 'static, B: 'static, C: 'static> DeserializeStrategy<(A, B, C)> for TripleCodec<A, B, C> {
    fn deserialize(&self, decoder: &mut dyn Decoder) -> SerialResult<(A, B, C)> {
        let composite = decoder.begin_structure(&self.descriptor)?;
        let mut first: Option<A> = None;
        let mut second: Option<B> = None;
        let mut third: Option<C> = None;

        if composite.decode_sequentially() {
            let mut slot = Slot::new(self.first.as_ref());
            composite.decode_serializable_element(&self.descriptor, 0, &mut slot)?;
            first = slot.take();
            let mut slot = Slot::new(self.second.as_ref());
            composite.decode_serializable_element(&self.descriptor, 1, &mut slot)?;
            second = slot.take();
            let mut slot = Slot::new(self.third.as_ref());
            composite.decode_serializable_element(&self.descriptor, 2, &mut slot)?;
            third = slot.take();
        } else {
            loop {
                match composite.decode_element_index(&self.descriptor)? {
                    ElementIndex::Index(0) => {
                        let mut slot = Slot::new(self.first.as_ref());
                        composite.decode_serializable_element(&self.descriptor, 0, &mut slot)?;
                        first = slot.take();
                    }
                    ElementIndex::Index(1) => {
                        let mut slot = Slot::new(self.second.as_ref());
                        composite.decode_serializable_element(&self.descriptor, 1, &mut slot)?;
                        second = slot.take();
                    }
                    ElementIndex::Index(2) => {
                        let mut slot = Slot::new(self.third.as_ref());
                        composite.decode_serializable_element(&self.descriptor, 2, &mut slot)?;
                        third = slot.take();
                    }
                    ElementIndex::Index(other) => {
                        return Err(SerialError::custom(format!(
                            "invalid element index {other} while decoding `Triple`",
                        )));
                    }
                    ElementIndex::Unknown => continue,
                    ElementIndex::Done => break,
                }
            }
        }
        composite.end_structure(&self.descriptor)?;

        match (first, second, third) {
            (Some(first), Some(second), Some(third)) => Ok((first, second, third)),
            (first, second, third) => Err(missing_fields(
                "Triple",
                &[
                    ("first", first.is_some()),
                    ("second", second.is_some()),
                    ("third", third.is_some()),
                ],
            )),
        }
    }
}

impl<A: Serial, B: Serial, C: Serial> Serial for (A, B, C) {
    fn codec() -> Arc<dyn Codec<(A, B, C)>> {
        Arc::new(TripleCodec::new(
            codec_of::<A>(),
            codec_of::<B>(),
            codec_of::<C>(),
        ))
    }
}
