//! The runtime registry mapping type identity to codecs.
//!
//! A [`SerializersModule`] holds polymorphic families (base → subtypes,
//! keyed both by concrete type and by discriminator), default-selector
//! hooks for unregistered subtypes, and contextual registrations. Codecs
//! receive the module from the encoder/decoder at the moment of
//! encode/decode, which is what makes open polymorphism and contextual
//! resolution late-bound.

mod builder;
mod module;

pub use builder::SerializersModuleBuilder;
pub use module::{PolymorphicEntry, SerializersModule};
