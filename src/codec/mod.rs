//! The per-type codec capability: a descriptor paired with symmetric
//! serialize/deserialize operations.
//!
//! Strategies are stateless and freely shared across threads; every piece
//! of mutable state lives in the [`Encoder`]/[`Decoder`] instance driving
//! one operation. This is what lets a single codec value serve any number
//! of concurrent encode/decode calls.

mod erased;

pub use erased::{ErasedCodec, ErasedDeserializer, ErasedSerializer};

use crate::descriptor::SerialDescriptor;
use crate::encoding::{Decoder, Encoder};
use crate::error::SerialResult;

// -----------------------------------------------------------------------------
// Strategies

/// Anything that publishes a [`SerialDescriptor`].
///
/// Split out of the strategy traits so that a type implementing both
/// halves exposes a single, unambiguous `descriptor` method.
pub trait Described {
    /// The shape this codec reads and writes.
    ///
    /// Descriptors are `Arc` handles, so returning one by value is cheap.
    fn descriptor(&self) -> SerialDescriptor;
}

/// The encode half of a codec.
///
/// `T` may be unsized so strategies can serialize through references to
/// trait objects and slices.
pub trait SerializeStrategy<T: ?Sized>: Described + Send + Sync {
    /// Writes `value` through the encoder, following the shape promised
    /// by [`descriptor`](Described::descriptor).
    fn serialize(&self, encoder: &mut dyn Encoder, value: &T) -> SerialResult<()>;
}

/// The decode half of a codec.
pub trait DeserializeStrategy<T>: Described + Send + Sync {
    /// Reads one value from the decoder, following the shape promised by
    /// [`descriptor`](Described::descriptor).
    fn deserialize(&self, decoder: &mut dyn Decoder) -> SerialResult<T>;
}

/// Both halves together.
///
/// Blanket-implemented for every type providing both strategies, so a
/// codec author only writes the two halves.
pub trait Codec<T>: SerializeStrategy<T> + DeserializeStrategy<T> {}

impl<T, C> Codec<T> for C where C: SerializeStrategy<T> + DeserializeStrategy<T> {}

// -----------------------------------------------------------------------------
// Serial

/// The compiled per-type codec capability.
///
/// This is the "does this runtime type have an associated codec" oracle:
/// builtin types implement it in [`builtins`](crate::builtins), derived or
/// hand-written types implement it themselves. The
/// [`lookup`](crate::lookup) layer consults it (through
/// [`codec_of`](crate::lookup::codec_of)) before falling back to
/// providers and contextual registrations.
///
/// # Examples
///
/// ```
/// use serial_core::codec::Described;
/// use serial_core::lookup::codec_of;
///
/// let codec = codec_of::<Vec<i32>>();
/// assert_eq!(codec.descriptor().serial_name(), "Vec");
/// ```
pub trait Serial: Sized + 'static {
    /// Returns the codec associated with this type.
    ///
    /// Called at most once per process per type: results are memoized by
    /// the [`lookup`](crate::lookup) cache.
    fn codec() -> std::sync::Arc<dyn Codec<Self>>;
}
