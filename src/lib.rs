#![doc = include_str!("../README.md")]

// -----------------------------------------------------------------------------
// Modules

pub mod builtins;
pub mod codec;
pub mod descriptor;
pub mod encoding;
pub mod error;
pub mod lookup;
pub mod modules;
pub mod poly;
pub mod util;

#[cfg(test)]
pub(crate) mod testfmt;

// -----------------------------------------------------------------------------
// Top-Level exports

pub use codec::{Codec, Described, DeserializeStrategy, Serial, SerializeStrategy};
pub use descriptor::SerialDescriptor;
pub use encoding::{CompositeDecoder, CompositeEncoder, Decoder, Encoder};
pub use error::{SerialError, SerialResult};
