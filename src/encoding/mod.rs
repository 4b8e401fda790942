//! The structural protocols every wire format implements.
//!
//! [`Encoder`]/[`CompositeEncoder`] and [`Decoder`]/[`CompositeDecoder`]
//! are the state machines through which codecs drive a format: begin a
//! structure, visit elements addressed by `(descriptor, index)`, end the
//! structure. The [`skeleton`](self) types ([`ScalarEncoder`],
//! [`ScalarDecoder`]) collapse the typed surface onto one untyped channel
//! for simple formats.

mod decoder;
mod encoder;
mod skeleton;

pub use decoder::{CompositeDecoder, DecodeSlot, Decoder, ElementIndex, Slot};
pub use encoder::{CompositeEncoder, Encodable, Encoder, encodable};
pub use skeleton::{Scalar, ScalarDecoder, ScalarEncoder};
