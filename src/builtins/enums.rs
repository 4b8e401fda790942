use crate::codec::{Described, DeserializeStrategy, SerializeStrategy};
use crate::descriptor::{SerialDescriptor, SerialKind, StructureKind, build_serial_descriptor};
use crate::encoding::{Decoder, Encoder};
use crate::error::{SerialError, SerialResult};

// -----------------------------------------------------------------------------
// EnumCodec

/// Codec for unit-only enums, driven by a name/value table.
///
/// Entries are encoded by ordinal through
/// [`encode_enum`](crate::encoding::Encoder::encode_enum); the descriptor
/// lists every entry by name so formats can choose a by-name wire
/// representation instead.
///
/// # Examples
///
/// ```
/// use serial_core::builtins::EnumCodec;
/// use serial_core::codec::Described;
///
/// #[derive(Clone, PartialEq)]
/// enum Level { Low, High }
///
/// let codec = EnumCodec::new("Level", vec![("Low", Level::Low), ("High", Level::High)]);
/// assert_eq!(codec.descriptor().elements_count(), 2);
/// assert_eq!(codec.descriptor().element_name(1), "High");
/// ```
pub struct EnumCodec<T> {
    descriptor: SerialDescriptor,
    values: Vec<T>,
}

impl<T> EnumCodec<T> {
    /// Creates the codec from `(entry name, value)` pairs in ordinal
    /// order.
    ///
    /// # Panics
    ///
    /// Panics if two entries share a name or the serial name is blank,
    /// like any other descriptor construction.
    pub fn new(serial_name: impl Into<String>, entries: Vec<(&'static str, T)>) -> Self {
        let serial_name = serial_name.into();
        let descriptor = build_serial_descriptor(serial_name.clone(), SerialKind::Enum, |b| {
            for (name, _) in &entries {
                // Entry descriptors are empty objects named after the entry.
                b.element(
                    *name,
                    build_serial_descriptor(
                        format!("{serial_name}.{name}"),
                        SerialKind::Structure(StructureKind::Object),
                        |_| {},
                    ),
                );
            }
        });
        Self {
            descriptor,
            values: entries.into_iter().map(|(_, value)| value).collect(),
        }
    }
}

impl<T> Described for EnumCodec<T> {
    fn descriptor(&self) -> SerialDescriptor {
        self.descriptor.clone()
    }
}

impl<T: PartialEq + Send + Sync + 'static> SerializeStrategy<T> for EnumCodec<T> {
    fn serialize(&self, encoder: &mut dyn Encoder, value: &T) -> SerialResult<()> {
        match self.values.iter().position(|entry| entry == value) {
            Some(ordinal) => encoder.encode_enum(&self.descriptor, ordinal),
            None => Err(SerialError::custom(format!(
                "value is not an entry of enum `{}`",
                self.descriptor.serial_name(),
            ))),
        }
    }
}

impl<T: Clone + PartialEq + Send + Sync + 'static> DeserializeStrategy<T> for EnumCodec<T> {
    fn deserialize(&self, decoder: &mut dyn Decoder) -> SerialResult<T> {
        let ordinal = decoder.decode_enum(&self.descriptor)?;
        self.values.get(ordinal).cloned().ok_or_else(|| {
            SerialError::custom(format!(
                "ordinal {ordinal} is out of range for enum `{}` ({} entries)",
                self.descriptor.serial_name(),
                self.values.len(),
            ))
        })
    }
}
