use core::any::{Any, TypeId};
use std::sync::Arc;

use crate::util::TypeIdMap;

// -----------------------------------------------------------------------------
// Annotation

/// A structured value attached to a descriptor or one of its elements.
///
/// Annotations are stored by their [`TypeId`], so there can only be one
/// annotation per type per element. They are populated once at
/// construction and immutable afterwards; "inheritable" semantics, if a
/// codec generator wants them, are a merge performed before the table is
/// built, not a property of the table.
pub trait Annotation: Any + Send + Sync + core::fmt::Debug {
    /// Upcast for typed retrieval.
    fn as_any(&self) -> &dyn Any;
}

impl<T: Any + Send + Sync + core::fmt::Debug> Annotation for T {
    #[inline]
    fn as_any(&self) -> &dyn Any {
        self
    }
}

// -----------------------------------------------------------------------------
// Annotations

/// A collection of [`Annotation`] values for a type or element.
///
/// # Examples
///
/// ```
/// use serial_core::descriptor::{Annotations, EncodeDefault};
///
/// let annotations = Annotations::new().with(EncodeDefault::Always);
///
/// assert!(annotations.contains::<EncodeDefault>());
/// assert_eq!(annotations.get::<EncodeDefault>(), Some(&EncodeDefault::Always));
/// ```
#[derive(Default, Clone, Debug)]
pub struct Annotations {
    entries: TypeIdMap<Arc<dyn Annotation>>,
}

impl Annotations {
    /// A shared empty table.
    ///
    /// Elements store annotations behind an `Option` to avoid allocating
    /// for the common no-annotation case; this instance is what their
    /// accessors hand out instead of `None`.
    pub(crate) fn empty() -> &'static Self {
        use std::sync::OnceLock;
        static EMPTY: OnceLock<Annotations> = OnceLock::new();
        EMPTY.get_or_init(Self::new)
    }

    /// Creates an empty table.
    #[inline]
    pub fn new() -> Self {
        Self {
            entries: TypeIdMap::new(),
        }
    }

    /// Adds an annotation, replacing any previous one of the same type.
    #[must_use]
    pub fn with<A: Annotation>(mut self, annotation: A) -> Self {
        self.entries.insert_type::<A>(Arc::new(annotation));
        self
    }

    /// Returns the annotation of type `A`, if present.
    pub fn get<A: Annotation>(&self) -> Option<&A> {
        self.entries
            .get_type::<A>()
            .and_then(|a| a.as_any().downcast_ref())
    }

    /// Returns the annotation with the given [`TypeId`], if present.
    pub fn get_by_id(&self, type_id: TypeId) -> Option<&dyn Annotation> {
        self.entries.get(&type_id).map(Arc::as_ref)
    }

    /// Returns `true` if an annotation of type `A` is present.
    #[inline]
    pub fn contains<A: Annotation>(&self) -> bool {
        self.entries.get_type::<A>().is_some()
    }

    /// Returns the number of annotations.
    #[inline]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns `true` if the table holds no annotations.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

// -----------------------------------------------------------------------------
// EncodeDefault

/// Forces a fixed policy for elements whose value equals their declared
/// default.
///
/// Without this annotation, per-class codecs ask the format through
/// [`should_encode_element_default`] whether defaulted elements should be
/// written. With it, the decision is made here and the format is never
/// consulted.
///
/// [`should_encode_element_default`]: crate::encoding::CompositeEncoder::should_encode_element_default
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EncodeDefault {
    /// Encode the element even when it equals its default.
    Always,
    /// Omit the element whenever it equals its default.
    Never,
}

// -----------------------------------------------------------------------------
// Tests
