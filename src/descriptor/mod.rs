//! The schema layer: descriptors describing the serial shape of types.
//!
//! A [`SerialDescriptor`] is the contract between a codec and a format:
//! the codec publishes the shape it will drive, the format reads names,
//! kinds and optionality from it. Descriptors are built once — usually
//! alongside the codec — and never change afterwards.

mod annotations;
mod builder;
pub(crate) mod descriptor;
mod kind;

pub use annotations::{Annotation, Annotations, EncodeDefault};
pub use builder::{
    ClassDescriptorBuilder, build_class_serial_descriptor, build_serial_descriptor,
    list_descriptor, map_descriptor, primitive_descriptor,
};
pub use descriptor::{DescriptorRef, SerialDescriptor};
pub use kind::{PolymorphicKind, PrimitiveKind, SerialKind, StructureKind};
