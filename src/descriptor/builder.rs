use crate::descriptor::descriptor::Element;
use crate::descriptor::{
    Annotations, DescriptorRef, PrimitiveKind, SerialDescriptor, SerialKind, StructureKind,
};

// -----------------------------------------------------------------------------
// Construction functions

fn require_non_blank(serial_name: &str) {
    if serial_name.trim().is_empty() {
        panic!("serial name must not be blank");
    }
}

/// Builds a descriptor of kind [`Class`](StructureKind::Class).
///
/// Schema mistakes — a blank name, two elements sharing a name — panic
/// immediately: they are development-time errors, meant to surface in
/// tests, never on untrusted input.
///
/// # Examples
///
/// ```
/// use serial_core::builtins::{I32Codec, StringCodec};
/// use serial_core::codec::Described;
/// use serial_core::descriptor::{
///     SerialKind, StructureKind, build_class_serial_descriptor, list_descriptor,
/// };
///
/// let descriptor = build_class_serial_descriptor("Data1", |b| {
///     b.optional_element("l", list_descriptor("Vec", I32Codec.descriptor()));
///     b.element("s", StringCodec.descriptor());
/// });
///
/// assert_eq!(descriptor.kind(), SerialKind::Structure(StructureKind::Class));
/// assert_eq!(descriptor.elements_count(), 2);
/// assert!(descriptor.is_element_optional(0));
/// ```
pub fn build_class_serial_descriptor(
    serial_name: impl Into<String>,
    build: impl FnOnce(&mut ClassDescriptorBuilder),
) -> SerialDescriptor {
    build_serial_descriptor(serial_name, SerialKind::Structure(StructureKind::Class), build)
}

/// Builds a descriptor of an arbitrary [`SerialKind`].
///
/// Prefer [`build_class_serial_descriptor`] for plain product types; this
/// entry point exists for object, enum and polymorphic shapes.
pub fn build_serial_descriptor(
    serial_name: impl Into<String>,
    kind: SerialKind,
    build: impl FnOnce(&mut ClassDescriptorBuilder),
) -> SerialDescriptor {
    let serial_name = serial_name.into();
    require_non_blank(&serial_name);

    let mut builder = ClassDescriptorBuilder {
        serial_name,
        nullable: false,
        type_params: Vec::new(),
        elements: Vec::new(),
    };
    build(&mut builder);

    SerialDescriptor::from_parts(
        builder.serial_name,
        kind,
        builder.nullable,
        builder.type_params.into_boxed_slice(),
        builder.elements.into_boxed_slice(),
    )
}

/// Builds a descriptor for a primitive shape.
///
/// # Panics
///
/// Panics if `serial_name` is blank.
pub fn primitive_descriptor(
    serial_name: impl Into<String>,
    kind: PrimitiveKind,
) -> SerialDescriptor {
    let serial_name = serial_name.into();
    require_non_blank(&serial_name);
    SerialDescriptor::from_parts(
        serial_name,
        SerialKind::Primitive(kind),
        false,
        Box::new([]),
        Box::new([]),
    )
}

/// Builds a descriptor of kind [`List`](StructureKind::List) over one
/// element shape.
///
/// The element descriptor doubles as the single type argument, so lists
/// of different element types compare unequal.
pub fn list_descriptor(serial_name: impl Into<String>, element: SerialDescriptor) -> SerialDescriptor {
    build_serial_descriptor(serial_name, SerialKind::Structure(StructureKind::List), |b| {
        b.type_param(element.clone());
        b.element("0", element);
    })
}

/// Builds a descriptor of kind [`Map`](StructureKind::Map) over key and
/// value shapes.
pub fn map_descriptor(
    serial_name: impl Into<String>,
    key: SerialDescriptor,
    value: SerialDescriptor,
) -> SerialDescriptor {
    build_serial_descriptor(serial_name, SerialKind::Structure(StructureKind::Map), |b| {
        b.type_param(key.clone());
        b.type_param(value.clone());
        b.element("0", key);
        b.element("1", value);
    })
}

// -----------------------------------------------------------------------------
// ClassDescriptorBuilder

/// Collects the elements of a structural descriptor.
///
/// Obtained through [`build_class_serial_descriptor`] or
/// [`build_serial_descriptor`]; elements keep their declaration order.
pub struct ClassDescriptorBuilder {
    serial_name: String,
    nullable: bool,
    type_params: Vec<DescriptorRef>,
    elements: Vec<Element>,
}

impl ClassDescriptorBuilder {
    fn push(&mut self, name: String, descriptor: DescriptorRef, annotations: Option<Annotations>, optional: bool) {
        if self.elements.iter().any(|e| e.name == name) {
            panic!(
                "element `{name}` is declared twice in descriptor `{}`",
                self.serial_name,
            );
        }
        self.elements.push(Element {
            name,
            descriptor,
            annotations,
            optional,
        });
    }

    /// Declares a required element.
    ///
    /// # Panics
    ///
    /// Panics if an element with the same name was already declared.
    pub fn element(&mut self, name: impl Into<String>, descriptor: SerialDescriptor) {
        self.push(name.into(), DescriptorRef::Ready(descriptor), None, false);
    }

    /// Declares an optional element: decoding may complete without it.
    pub fn optional_element(&mut self, name: impl Into<String>, descriptor: SerialDescriptor) {
        self.push(name.into(), DescriptorRef::Ready(descriptor), None, true);
    }

    /// Declares an element whose descriptor is resolved on demand.
    ///
    /// Needed by self-referential types, which cannot produce their own
    /// descriptor while it is being built.
    pub fn deferred_element(&mut self, name: impl Into<String>, thunk: fn() -> SerialDescriptor) {
        self.push(name.into(), DescriptorRef::Deferred(thunk), None, false);
    }

    /// Declares an element with the full set of options.
    pub fn element_with(
        &mut self,
        name: impl Into<String>,
        descriptor: impl Into<DescriptorRef>,
        annotations: Annotations,
        optional: bool,
    ) {
        let annotations = (!annotations.is_empty()).then_some(annotations);
        self.push(name.into(), descriptor.into(), annotations, optional);
    }

    /// Records a type argument, making it part of the descriptor's
    /// generic identity.
    pub fn type_param(&mut self, descriptor: SerialDescriptor) {
        self.type_params.push(DescriptorRef::Ready(descriptor));
    }

    /// Records a lazily resolved type argument.
    pub fn deferred_type_param(&mut self, thunk: fn() -> SerialDescriptor) {
        self.type_params.push(DescriptorRef::Deferred(thunk));
    }

    /// Marks the shape itself as nullable, without the standard nullable
    /// view.
    ///
    /// Descriptors built this way report `is_nullable` but are their own
    /// [`non_null_original`](SerialDescriptor::non_null_original).
    pub fn nullable(&mut self) {
        self.nullable = true;
    }
}

// -----------------------------------------------------------------------------
// Tests
