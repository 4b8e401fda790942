use core::fmt;
use core::hash::{Hash, Hasher};
use std::sync::{Arc, OnceLock};

use crate::descriptor::{Annotations, SerialKind};

// -----------------------------------------------------------------------------
// DescriptorRef

/// A reference to a descriptor that may not be constructible yet.
///
/// Self-referential types (a tree node holding children of its own type)
/// cannot build their element descriptors eagerly without recursing
/// forever. A `Deferred` thunk delays construction until the element is
/// actually queried; codecs typically back the thunk with a
/// `LazyLock`-held descriptor so repeated resolution is cheap.
#[derive(Clone)]
pub enum DescriptorRef {
    /// An already-built descriptor.
    Ready(SerialDescriptor),
    /// A thunk producing the descriptor on demand.
    Deferred(fn() -> SerialDescriptor),
}

impl DescriptorRef {
    /// Resolves the reference.
    #[inline]
    pub fn get(&self) -> SerialDescriptor {
        match self {
            Self::Ready(descriptor) => descriptor.clone(),
            Self::Deferred(thunk) => thunk(),
        }
    }
}

impl From<SerialDescriptor> for DescriptorRef {
    #[inline]
    fn from(descriptor: SerialDescriptor) -> Self {
        Self::Ready(descriptor)
    }
}

impl fmt::Debug for DescriptorRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Ready(descriptor) => write!(f, "Ready({})", descriptor.serial_name()),
            Self::Deferred(_) => f.pad("Deferred(..)"),
        }
    }
}

// -----------------------------------------------------------------------------
// Element

/// One element of a structural descriptor.
#[derive(Clone, Debug)]
pub(crate) struct Element {
    pub(crate) name: String,
    pub(crate) descriptor: DescriptorRef,
    // `Option` to avoid a table allocation for the common unannotated case.
    pub(crate) annotations: Option<Annotations>,
    pub(crate) optional: bool,
}

// -----------------------------------------------------------------------------
// SerialDescriptor

/// The recursion depth after which generic equality falls back to
/// comparing serial names alone.
///
/// Keeps self-referential generic descriptors comparable without
/// overflowing the stack; any two descriptors that agree on every level
/// above this depth are considered interchangeable.
const EQUALITY_DEPTH_LIMIT: usize = 8;

enum Node {
    Plain(Plain),
    /// The standard nullable view over a non-null original.
    Nullable {
        serial_name: String,
        original: SerialDescriptor,
    },
    /// A renamed view: everything delegates except the serial name.
    Renamed {
        serial_name: String,
        original: SerialDescriptor,
    },
}

struct Plain {
    serial_name: String,
    kind: SerialKind,
    nullable: bool,
    type_params: Box<[DescriptorRef]>,
    elements: Box<[Element]>,
    // Class-level annotations may be attached once, post-construction.
    annotations: OnceLock<Annotations>,
}

/// Describes the logical shape of one serializable type.
///
/// A descriptor carries a globally meaningful [`serial_name`], a
/// [`kind`], nullability, and — for structural kinds — a fixed list of
/// named elements. Formats consume this read-only surface to drive field
/// naming, ordering and type dispatch; the polymorphic engines use the
/// serial name as the wire discriminator.
///
/// Descriptors are cheap to clone (an `Arc` handle) and immutable after
/// construction, with a single carve-out: class-level annotations may be
/// attached once through [`attach_annotations`] before first use.
///
/// # Equality
///
/// Two descriptors are equal when they were instantiated for the same
/// named type with pairwise-equal type-argument descriptors; structural
/// coincidence is not enough. The comparison recurses through type
/// arguments and is cycle-safe: past a bounded depth it degrades to
/// serial-name comparison so self-referential generics terminate.
///
/// # Examples
///
/// ```
/// use serial_core::builtins::I32Codec;
/// use serial_core::codec::Described;
/// use serial_core::descriptor::build_class_serial_descriptor;
///
/// let descriptor = build_class_serial_descriptor("Point", |b| {
///     b.element("x", I32Codec.descriptor());
///     b.element("y", I32Codec.descriptor());
/// });
///
/// assert_eq!(descriptor.elements_count(), 2);
/// assert_eq!(descriptor.element_name(1), "y");
/// assert_eq!(descriptor.element_index("x"), Some(0));
/// assert_eq!(descriptor.element_index("z"), None);
/// ```
///
/// [`serial_name`]: Self::serial_name
/// [`kind`]: Self::kind
/// [`attach_annotations`]: Self::attach_annotations
#[derive(Clone)]
pub struct SerialDescriptor {
    node: Arc<Node>,
}

impl SerialDescriptor {
    pub(crate) fn from_parts(
        serial_name: String,
        kind: SerialKind,
        nullable: bool,
        type_params: Box<[DescriptorRef]>,
        elements: Box<[Element]>,
    ) -> Self {
        Self {
            node: Arc::new(Node::Plain(Plain {
                serial_name,
                kind,
                nullable,
                type_params,
                elements,
                annotations: OnceLock::new(),
            })),
        }
    }

    fn plain(&self) -> &Plain {
        match self.node.as_ref() {
            Node::Plain(plain) => plain,
            Node::Nullable { original, .. } | Node::Renamed { original, .. } => original.plain(),
        }
    }

    /// The globally meaningful name identifying this type on the wire.
    pub fn serial_name(&self) -> &str {
        match self.node.as_ref() {
            Node::Plain(plain) => &plain.serial_name,
            Node::Nullable { serial_name, .. } | Node::Renamed { serial_name, .. } => serial_name,
        }
    }

    /// The kind every format dispatches on.
    #[inline]
    pub fn kind(&self) -> SerialKind {
        self.plain().kind
    }

    /// Whether this descriptor describes a nullable shape.
    pub fn is_nullable(&self) -> bool {
        match self.node.as_ref() {
            Node::Plain(plain) => plain.nullable,
            Node::Nullable { .. } => true,
            Node::Renamed { original, .. } => original.is_nullable(),
        }
    }

    /// The number of elements of a structural kind (zero for primitives).
    #[inline]
    pub fn elements_count(&self) -> usize {
        self.plain().elements.len()
    }

    fn element(&self, index: usize) -> &Element {
        let plain = self.plain();
        match plain.elements.get(index) {
            Some(element) => element,
            None => panic!(
                "element index {index} is out of bounds for `{}` ({} elements)",
                plain.serial_name,
                plain.elements.len(),
            ),
        }
    }

    /// Returns the name of the element at `index`.
    ///
    /// # Panics
    ///
    /// Panics if `index` is out of bounds.
    pub fn element_name(&self, index: usize) -> &str {
        &self.element(index).name
    }

    /// Returns the index of the element named `name`, or `None` if the
    /// schema has no such element.
    ///
    /// A `None` is not necessarily an error: formats use it to implement
    /// their unknown-field policy (skip or fail).
    pub fn element_index(&self, name: &str) -> Option<usize> {
        self.plain().elements.iter().position(|e| e.name == name)
    }

    /// Returns the descriptor of the element at `index`, resolving any
    /// deferred reference.
    ///
    /// # Panics
    ///
    /// Panics if `index` is out of bounds.
    pub fn element_descriptor(&self, index: usize) -> SerialDescriptor {
        self.element(index).descriptor.get()
    }

    /// Whether the element at `index` was declared optional.
    ///
    /// # Panics
    ///
    /// Panics if `index` is out of bounds.
    pub fn is_element_optional(&self, index: usize) -> bool {
        self.element(index).optional
    }

    /// The annotations attached to the element at `index`.
    ///
    /// # Panics
    ///
    /// Panics if `index` is out of bounds.
    pub fn element_annotations(&self, index: usize) -> &Annotations {
        self.element(index)
            .annotations
            .as_ref()
            .unwrap_or_else(|| Annotations::empty())
    }

    /// The class-level annotations, empty unless
    /// [`attach_annotations`](Self::attach_annotations) was called.
    pub fn annotations(&self) -> &Annotations {
        self.plain()
            .annotations
            .get()
            .unwrap_or_else(|| Annotations::empty())
    }

    /// Attaches class-level annotations.
    ///
    /// Descriptors are otherwise immutable; this single carve-out exists
    /// for codec generators that only learn the type-level annotations
    /// after the element list is complete. It must happen before the
    /// descriptor is first used.
    ///
    /// # Panics
    ///
    /// Panics if annotations were already attached.
    pub fn attach_annotations(&self, annotations: Annotations) {
        let plain = self.plain();
        if plain.annotations.set(annotations).is_err() {
            panic!(
                "annotations for `{}` have already been attached",
                plain.serial_name,
            );
        }
    }

    /// The number of type arguments this descriptor was instantiated with.
    #[inline]
    pub fn type_params_count(&self) -> usize {
        self.plain().type_params.len()
    }

    /// Returns the type-argument descriptor at `index`.
    ///
    /// # Panics
    ///
    /// Panics if `index` is out of bounds.
    pub fn type_param(&self, index: usize) -> SerialDescriptor {
        self.plain().type_params[index].get()
    }

    /// Returns a nullable view over this descriptor.
    ///
    /// The view keeps every structural property and suffixes the serial
    /// name with `?`. Calling this on an already-nullable descriptor is
    /// idempotent.
    ///
    /// # Examples
    ///
    /// ```
    /// use serial_core::descriptor::{primitive_descriptor, PrimitiveKind};
    ///
    /// let plain = primitive_descriptor("i32", PrimitiveKind::I32);
    /// let nullable = plain.nullable();
    ///
    /// assert!(nullable.is_nullable());
    /// assert_eq!(nullable.serial_name(), "i32?");
    /// assert_eq!(nullable.nullable(), nullable);
    /// assert_eq!(nullable.non_null_original(), plain);
    /// ```
    pub fn nullable(&self) -> SerialDescriptor {
        if self.is_nullable() {
            return self.clone();
        }
        Self {
            node: Arc::new(Node::Nullable {
                serial_name: format!("{}?", self.serial_name()),
                original: self.clone(),
            }),
        }
    }

    /// Unwraps the standard nullable view, returning the non-null
    /// original.
    ///
    /// Idempotent. Descriptors that report `is_nullable` without being
    /// produced by [`nullable`](Self::nullable) — shapes that are natively
    /// nullable — return themselves.
    pub fn non_null_original(&self) -> SerialDescriptor {
        match self.node.as_ref() {
            Node::Nullable { original, .. } => original.clone(),
            _ => self.clone(),
        }
    }

    /// Returns a view over this descriptor with a different serial name.
    ///
    /// Every structural query delegates to the original.
    pub fn renamed(&self, serial_name: impl Into<String>) -> SerialDescriptor {
        Self {
            node: Arc::new(Node::Renamed {
                serial_name: serial_name.into(),
                original: self.clone(),
            }),
        }
    }

    fn bounded_eq(&self, other: &SerialDescriptor, depth: usize) -> bool {
        if Arc::ptr_eq(&self.node, &other.node) {
            return true;
        }
        if self.serial_name() != other.serial_name() || self.kind() != other.kind() {
            return false;
        }
        if depth == 0 {
            // Bounded fallback: names agreed all the way down here.
            return true;
        }
        let count = self.type_params_count();
        if count != other.type_params_count() {
            return false;
        }
        (0..count).all(|i| self.type_param(i).bounded_eq(&other.type_param(i), depth - 1))
    }
}

impl PartialEq for SerialDescriptor {
    fn eq(&self, other: &Self) -> bool {
        self.bounded_eq(other, EQUALITY_DEPTH_LIMIT)
    }
}

impl Eq for SerialDescriptor {}

impl Hash for SerialDescriptor {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.serial_name().hash(state);
        self.kind().hash(state);
        // One level of type arguments keeps hashing consistent with the
        // depth-bounded equality without recursing.
        state.write_usize(self.type_params_count());
        for i in 0..self.type_params_count() {
            self.type_param(i).serial_name().hash(state);
        }
    }
}

impl fmt::Debug for SerialDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut s = f.debug_struct("SerialDescriptor");
        s.field("serial_name", &self.serial_name())
            .field("kind", &self.kind())
            .field("nullable", &self.is_nullable());
        if self.elements_count() > 0 {
            // Element names only: element descriptors may be cyclic.
            let names: Vec<&str> = (0..self.elements_count())
                .map(|i| self.element_name(i))
                .collect();
            s.field("elements", &names);
        }
        s.finish()
    }
}

impl fmt::Display for SerialDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.serial_name())
    }
}

// -----------------------------------------------------------------------------
// Tests
