use core::hash::Hash;
use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::Arc;

use crate::codec::{Codec, Described, DeserializeStrategy, Serial, SerializeStrategy};
use crate::descriptor::{SerialDescriptor, list_descriptor, map_descriptor};
use crate::encoding::{
    CompositeDecoder as _, CompositeEncoder as _, Decoder, ElementIndex, Encoder, Slot, encodable,
};
use crate::error::{SerialError, SerialResult};
use crate::lookup::codec_of;

fn unknown_collection_size() -> SerialError {
    SerialError::custom("sequential decoding of a collection requires a known size")
}

// -----------------------------------------------------------------------------
// VecCodec

/// Codec for `Vec<T>`.
///
/// Elements are addressed by their running index; the descriptor is a
/// [`List`](crate::descriptor::StructureKind::List) carrying the element
/// shape as its single type argument.
pub struct VecCodec<T> {
    element: Arc<dyn Codec<T>>,
    descriptor: SerialDescriptor,
}

impl<T> VecCodec<T> {
    /// Creates the codec from the element codec.
    pub fn new(element: Arc<dyn Codec<T>>) -> Self {
        let descriptor = list_descriptor("Vec", element.descriptor());
        Self {
            element,
            descriptor,
        }
    }
}

impl<T> Described for VecCodec<T> {
    fn descriptor(&self) -> SerialDescriptor {
        self.descriptor.clone()
    }
}

impl<T: 'static> SerializeStrategy<Vec<T>> for VecCodec<T> {
    fn serialize(&self, encoder: &mut dyn Encoder, value: &Vec<T>) -> SerialResult<()> {
        let composite = encoder.begin_collection(&self.descriptor, value.len())?;
        for (index, item) in value.iter().enumerate() {
            composite.encode_serializable_element(
                &self.descriptor,
                index,
                &encodable(self.element.as_ref(), item),
            )?;
        }
        composite.end_structure(&self.descriptor)
    }
}

impl<T: 'static> DeserializeStrategy<Vec<T>> for VecCodec<T> {
    fn deserialize(&self, decoder: &mut dyn Decoder) -> SerialResult<Vec<T>> {
        let composite = decoder.begin_structure(&self.descriptor)?;
        let mut out = Vec::new();

        if composite.decode_sequentially() {
            let size = composite
                .decode_collection_size(&self.descriptor)?
                .ok_or_else(unknown_collection_size)?;
            out.reserve(size);
            for index in 0..size {
                let mut slot = Slot::new(self.element.as_ref());
                composite.decode_serializable_element(&self.descriptor, index, &mut slot)?;
                out.push(slot.into_decoded()?);
            }
        } else {
            loop {
                match composite.decode_element_index(&self.descriptor)? {
                    ElementIndex::Index(index) => {
                        let mut slot = Slot::new(self.element.as_ref());
                        composite.decode_serializable_element(&self.descriptor, index, &mut slot)?;
                        out.push(slot.into_decoded()?);
                    }
                    ElementIndex::Unknown => continue,
                    ElementIndex::Done => break,
                }
            }
        }
        composite.end_structure(&self.descriptor)?;
        Ok(out)
    }
}

impl<T: Serial> Serial for Vec<T> {
    fn codec() -> Arc<dyn Codec<Vec<T>>> {
        Arc::new(VecCodec::new(codec_of::<T>()))
    }
}

// -----------------------------------------------------------------------------
// HashSetCodec

/// Codec for `HashSet<T>`, sharing the list wire shape.
pub struct HashSetCodec<T> {
    element: Arc<dyn Codec<T>>,
    descriptor: SerialDescriptor,
}

impl<T> HashSetCodec<T> {
    /// Creates the codec from the element codec.
    pub fn new(element: Arc<dyn Codec<T>>) -> Self {
        let descriptor = list_descriptor("HashSet", element.descriptor());
        Self {
            element,
            descriptor,
        }
    }
}

impl<T> Described for HashSetCodec<T> {
    fn descriptor(&self) -> SerialDescriptor {
        self.descriptor.clone()
    }
}

impl<T: Eq + Hash + 'static> SerializeStrategy<HashSet<T>> for HashSetCodec<T> {
    fn serialize(&self, encoder: &mut dyn Encoder, value: &HashSet<T>) -> SerialResult<()> {
        let composite = encoder.begin_collection(&self.descriptor, value.len())?;
        for (index, item) in value.iter().enumerate() {
            composite.encode_serializable_element(
                &self.descriptor,
                index,
                &encodable(self.element.as_ref(), item),
            )?;
        }
        composite.end_structure(&self.descriptor)
    }
}

impl<T: Eq + Hash + 'static> DeserializeStrategy<HashSet<T>> for HashSetCodec<T> {
    fn deserialize(&self, decoder: &mut dyn Decoder) -> SerialResult<HashSet<T>> {
        let composite = decoder.begin_structure(&self.descriptor)?;
        let mut out = HashSet::new();

        if composite.decode_sequentially() {
            let size = composite
                .decode_collection_size(&self.descriptor)?
                .ok_or_else(unknown_collection_size)?;
            out.reserve(size);
            for index in 0..size {
                let mut slot = Slot::new(self.element.as_ref());
                composite.decode_serializable_element(&self.descriptor, index, &mut slot)?;
                out.insert(slot.into_decoded()?);
            }
        } else {
            loop {
                match composite.decode_element_index(&self.descriptor)? {
                    ElementIndex::Index(index) => {
                        let mut slot = Slot::new(self.element.as_ref());
                        composite.decode_serializable_element(&self.descriptor, index, &mut slot)?;
                        out.insert(slot.into_decoded()?);
                    }
                    ElementIndex::Unknown => continue,
                    ElementIndex::Done => break,
                }
            }
        }
        composite.end_structure(&self.descriptor)?;
        Ok(out)
    }
}

impl<T: Serial + Eq + Hash> Serial for HashSet<T> {
    fn codec() -> Arc<dyn Codec<HashSet<T>>> {
        Arc::new(HashSetCodec::new(codec_of::<T>()))
    }
}

// -----------------------------------------------------------------------------
// Map codecs

/// Maps are encoded as alternating key/value elements: the entry at
/// position `i` occupies element indices `2i` (key) and `2i + 1` (value).
macro_rules! map_codec {
    (
        $(#[$doc:meta])*
        $codec:ident, $container:ident, $serial:literal, ($($bounds:tt)*)
    ) => {
        $(#[$doc])*
        pub struct $codec<K, V> {
            key: Arc<dyn Codec<K>>,
            value: Arc<dyn Codec<V>>,
            descriptor: SerialDescriptor,
        }

        impl<K, V> $codec<K, V> {
            /// Creates the codec from the key and value codecs.
            pub fn new(key: Arc<dyn Codec<K>>, value: Arc<dyn Codec<V>>) -> Self {
                let descriptor = map_descriptor($serial, key.descriptor(), value.descriptor());
                Self {
                    key,
                    value,
                    descriptor,
                }
            }
        }

        impl<K, V> Described for $codec<K, V> {
            fn descriptor(&self) -> SerialDescriptor {
                self.descriptor.clone()
            }
        }

        impl<K: $($bounds)* + 'static, V: 'static> SerializeStrategy<$container<K, V>>
            for $codec<K, V>
        {
            fn serialize(
                &self,
                encoder: &mut dyn Encoder,
                value: &$container<K, V>,
            ) -> SerialResult<()> {
                let composite = encoder.begin_collection(&self.descriptor, value.len())?;
                for (position, (key, item)) in value.iter().enumerate() {
                    composite.encode_serializable_element(
                        &self.descriptor,
                        2 * position,
                        &encodable(self.key.as_ref(), key),
                    )?;
                    composite.encode_serializable_element(
                        &self.descriptor,
                        2 * position + 1,
                        &encodable(self.value.as_ref(), item),
                    )?;
                }
                composite.end_structure(&self.descriptor)
            }
        }

        impl<K: $($bounds)* + 'static, V: 'static> DeserializeStrategy<$container<K, V>>
            for $codec<K, V>
        {
            fn deserialize(&self, decoder: &mut dyn Decoder) -> SerialResult<$container<K, V>> {
                let composite = decoder.begin_structure(&self.descriptor)?;
                let mut out = $container::new();

                if composite.decode_sequentially() {
                    let size = composite
                        .decode_collection_size(&self.descriptor)?
                        .ok_or_else(unknown_collection_size)?;
                    for position in 0..size {
                        let mut key_slot = Slot::new(self.key.as_ref());
                        composite.decode_serializable_element(
                            &self.descriptor,
                            2 * position,
                            &mut key_slot,
                        )?;
                        let mut value_slot = Slot::new(self.value.as_ref());
                        composite.decode_serializable_element(
                            &self.descriptor,
                            2 * position + 1,
                            &mut value_slot,
                        )?;
                        out.insert(key_slot.into_decoded()?, value_slot.into_decoded()?);
                    }
                } else {
                    let mut pending_key: Option<K> = None;
                    loop {
                        match composite.decode_element_index(&self.descriptor)? {
                            ElementIndex::Index(index) if index % 2 == 0 => {
                                let mut slot = Slot::new(self.key.as_ref());
                                composite.decode_serializable_element(
                                    &self.descriptor,
                                    index,
                                    &mut slot,
                                )?;
                                pending_key = Some(slot.into_decoded()?);
                            }
                            ElementIndex::Index(index) => {
                                let key = pending_key.take().ok_or_else(|| {
                                    SerialError::custom(
                                        "map value arrived before its key",
                                    )
                                })?;
                                let mut slot = Slot::new(self.value.as_ref());
                                composite.decode_serializable_element(
                                    &self.descriptor,
                                    index,
                                    &mut slot,
                                )?;
                                out.insert(key, slot.into_decoded()?);
                            }
                            ElementIndex::Unknown => continue,
                            ElementIndex::Done => break,
                        }
                    }
                }
                composite.end_structure(&self.descriptor)?;
                Ok(out)
            }
        }
    };
}

map_codec!(
    /// Codec for `HashMap<K, V>`.
    HashMapCodec, HashMap, "HashMap", (Eq + Hash)
);
map_codec!(
    /// Codec for `BTreeMap<K, V>`.
    BTreeMapCodec, BTreeMap, "BTreeMap", (Ord)
);

impl<K: Serial + Eq + Hash, V: Serial> Serial for HashMap<K, V> {
    fn codec() -> Arc<dyn Codec<HashMap<K, V>>> {
        Arc::new(HashMapCodec::new(codec_of::<K>(), codec_of::<V>()))
    }
}

impl<K: Serial + Ord, V: Serial> Serial for BTreeMap<K, V> {
    fn codec() -> Arc<dyn Codec<BTreeMap<K, V>>> {
        Arc::new(BTreeMapCodec::new(codec_of::<K>(), codec_of::<V>()))
    }
}

// -----------------------------------------------------------------------------
// ArrayCodec

/// Codec for fixed-size arrays `[T; N]`.
///
/// The length is part of the serial name, so arrays of different lengths
/// have distinct descriptors.
pub struct ArrayCodec<T, const N: usize> {
    element: Arc<dyn Codec<T>>,
    descriptor: SerialDescriptor,
}

impl<T, const N: usize> ArrayCodec<T, N> {
    /// Creates the codec from the element codec.
    pub fn new(element: Arc<dyn Codec<T>>) -> Self {
        let descriptor = list_descriptor(format!("Array<{N}>"), element.descriptor());
        Self {
            element,
            descriptor,
        }
    }
}

impl<T, const N: usize> Described for ArrayCodec<T, N> {
    fn descriptor(&self) -> SerialDescriptor {
        self.descriptor.clone()
    }
}

impl<T: 'static, const N: usize> SerializeStrategy<[T; N]> for ArrayCodec<T, N> {
    fn serialize(&self, encoder: &mut dyn Encoder, value: &[T; N]) -> SerialResult<()> {
        let composite = encoder.begin_collection(&self.descriptor, N)?;
        for (index, item) in value.iter().enumerate() {
            composite.encode_serializable_element(
                &self.descriptor,
                index,
                &encodable(self.element.as_ref(), item),
            )?;
        }
        composite.end_structure(&self.descriptor)
    }
}

impl<T: 'static, const N: usize> DeserializeStrategy<[T; N]> for ArrayCodec<T, N> {
    fn deserialize(&self, decoder: &mut dyn Decoder) -> SerialResult<[T; N]> {
        let composite = decoder.begin_structure(&self.descriptor)?;
        let mut out = Vec::with_capacity(N);

        if composite.decode_sequentially() {
            for index in 0..N {
                let mut slot = Slot::new(self.element.as_ref());
                composite.decode_serializable_element(&self.descriptor, index, &mut slot)?;
                out.push(slot.into_decoded()?);
            }
        } else {
            loop {
                match composite.decode_element_index(&self.descriptor)? {
                    ElementIndex::Index(index) => {
                        let mut slot = Slot::new(self.element.as_ref());
                        composite.decode_serializable_element(&self.descriptor, index, &mut slot)?;
                        out.push(slot.into_decoded()?);
                    }
                    ElementIndex::Unknown => continue,
                    ElementIndex::Done => break,
                }
            }
        }
        composite.end_structure(&self.descriptor)?;

        let decoded = out.len();
        out.try_into().map_err(|_| {
            SerialError::custom(format!(
                "expected {N} array elements, the input held {decoded}",
            ))
        })
    }
}

impl<T: Serial, const N: usize> Serial for [T; N] {
    fn codec() -> Arc<dyn Codec<[T; N]>> {
        Arc::new(ArrayCodec::new(codec_of::<T>()))
    }
}
