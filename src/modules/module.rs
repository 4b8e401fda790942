use core::any::{Any, TypeId};
use std::sync::{Arc, OnceLock};

use crate::codec::{Codec, ErasedCodec, ErasedDeserializer, ErasedSerializer};
use crate::util::{FastMap, TypeIdMap};

// -----------------------------------------------------------------------------
// Entries

/// A contextual registration: fixed, or parameterized by the type
/// arguments' codecs.
#[derive(Clone)]
pub(crate) enum ContextualProvider {
    Fixed(ErasedCodec),
    WithTypeArgs(Arc<dyn Fn(&[ErasedCodec]) -> ErasedCodec + Send + Sync>),
}

impl ContextualProvider {
    pub(crate) fn resolve(&self, args: &[ErasedCodec]) -> ErasedCodec {
        match self {
            Self::Fixed(codec) => codec.clone(),
            Self::WithTypeArgs(provider) => provider(args),
        }
    }

    pub(crate) fn same_registration(&self, other: &ContextualProvider) -> bool {
        match (self, other) {
            (Self::Fixed(a), Self::Fixed(b)) => a.same_instance(b),
            (Self::WithTypeArgs(a), Self::WithTypeArgs(b)) => Arc::ptr_eq(a, b),
            _ => false,
        }
    }
}

/// A contextual provider together with the name it was registered under.
#[derive(Clone)]
pub(crate) struct ContextualRegistration {
    pub(crate) type_name: &'static str,
    pub(crate) provider: ContextualProvider,
}

/// One registered subtype of a polymorphic base.
#[derive(Clone)]
pub struct PolymorphicEntry {
    pub(crate) codec: ErasedCodec,
    pub(crate) serializer: ErasedSerializer,
    pub(crate) deserializer: ErasedDeserializer,
}

impl PolymorphicEntry {
    /// The discriminator this subtype is written under.
    #[inline]
    pub fn serial_name(&self) -> &str {
        self.codec.descriptor().serial_name()
    }

    /// The name of the registered subtype, for diagnostics.
    #[inline]
    pub fn type_name(&self) -> &'static str {
        self.codec.type_name()
    }
}

pub(crate) type DefaultSerializerProvider =
    Arc<dyn Fn(&dyn Any) -> Option<ErasedSerializer> + Send + Sync>;

pub(crate) type DefaultDeserializerProvider =
    Arc<dyn Fn(Option<&str>) -> Option<ErasedDeserializer> + Send + Sync>;

/// Everything registered under one polymorphic base.
#[derive(Clone, Default)]
pub(crate) struct PolymorphicScope {
    pub(crate) base_name: &'static str,
    pub(crate) by_type: TypeIdMap<PolymorphicEntry>,
    pub(crate) by_name: FastMap<String, PolymorphicEntry>,
    pub(crate) default_serializer: Option<DefaultSerializerProvider>,
    pub(crate) default_deserializer: Option<DefaultDeserializerProvider>,
}

// -----------------------------------------------------------------------------
// SerializersModule

/// A runtime registry mapping type identity to codecs.
///
/// Modules are immutable after construction and safe to share across
/// threads; every lookup is a pure function of its inputs. They are built
/// through [`builder`](Self::builder) and consumed by encoders/decoders,
/// which hand them to contextual and open polymorphic codecs at the
/// moment of encode/decode — not at codec construction time.
///
/// # Examples
///
/// ```
/// use std::sync::Arc;
/// use serial_core::builtins::I32Codec;
/// use serial_core::modules::SerializersModule;
///
/// let module = SerializersModule::builder()
///     .contextual::<i32>(Arc::new(I32Codec))
///     .build();
///
/// assert!(module.get_contextual::<i32>().is_some());
/// assert!(module.get_contextual::<bool>().is_none());
/// ```
#[derive(Clone, Default)]
pub struct SerializersModule {
    pub(crate) contextual: TypeIdMap<ContextualRegistration>,
    pub(crate) polymorphic: TypeIdMap<PolymorphicScope>,
}

impl SerializersModule {
    /// Starts building a module.
    #[inline]
    pub fn builder() -> super::SerializersModuleBuilder {
        super::SerializersModuleBuilder::new()
    }

    /// A shared empty module: every lookup misses.
    ///
    /// This is what formats without registrations return from their
    /// `serializers_module` accessors.
    pub fn empty() -> &'static SerializersModule {
        static EMPTY: OnceLock<SerializersModule> = OnceLock::new();
        EMPTY.get_or_init(SerializersModule::default)
    }

    /// Returns the contextual codec registered for `T`, if any.
    ///
    /// Equivalent to [`get_contextual_with_args`] with no arguments.
    ///
    /// [`get_contextual_with_args`]: Self::get_contextual_with_args
    pub fn get_contextual<T: 'static>(&self) -> Option<Arc<dyn Codec<T>>> {
        self.get_contextual_with_args::<T>(&[])
    }

    /// Returns the contextual codec registered for the generic type `T`,
    /// resolved against the type arguments' codecs.
    pub fn get_contextual_with_args<T: 'static>(
        &self,
        args: &[ErasedCodec],
    ) -> Option<Arc<dyn Codec<T>>> {
        let registration = self.contextual.get_type::<T>()?;
        registration.provider.resolve(args).downcast::<T>().ok()
    }

    /// Erased contextual lookup, used by the resolution pipeline.
    pub(crate) fn contextual_erased(
        &self,
        type_id: TypeId,
        args: &[ErasedCodec],
    ) -> Option<ErasedCodec> {
        self.contextual
            .get(&type_id)
            .map(|registration| registration.provider.resolve(args))
    }

    /// Resolves the serializer for a runtime value within the scope of
    /// `base`.
    ///
    /// A subtype registered directly for the value's type always wins;
    /// the scope's default-serializer selector is consulted only when no
    /// direct registration exists. Returns `None` when neither applies —
    /// the caller turns that into an error naming value and scope.
    pub fn polymorphic_serializer(
        &self,
        base: TypeId,
        value: &dyn Any,
    ) -> Option<ErasedSerializer> {
        let scope = self.polymorphic.get(&base)?;
        if let Some(entry) = scope.by_type.get(&value.type_id()) {
            return Some(entry.serializer.clone());
        }
        let fallback = scope.default_serializer.as_ref()?;
        let resolved = fallback(value);
        if resolved.is_some() {
            log::debug!(
                "polymorphic scope `{}` served a value from its default serializer",
                scope.base_name,
            );
        }
        resolved
    }

    /// Resolves the deserializer for a discriminator within the scope of
    /// `base`.
    ///
    /// `name` is the discriminator read from the input, or `None` if the
    /// format found none. Direct registrations win; the scope's
    /// default-deserializer selector is consulted otherwise, receiving
    /// the discriminator as-is.
    pub fn polymorphic_deserializer(
        &self,
        base: TypeId,
        name: Option<&str>,
    ) -> Option<ErasedDeserializer> {
        let scope = self.polymorphic.get(&base)?;
        if let Some(name) = name
            && let Some(entry) = scope.by_name.get(name)
        {
            return Some(entry.deserializer.clone());
        }
        let fallback = scope.default_deserializer.as_ref()?;
        fallback(name)
    }

    /// Returns the subtype entry registered for `name` within the scope
    /// of `base`, without consulting default selectors.
    pub fn polymorphic_entry_by_name(
        &self,
        base: TypeId,
        name: &str,
    ) -> Option<&PolymorphicEntry> {
        self.polymorphic.get(&base)?.by_name.get(name)
    }

    /// Merges two modules into a new one.
    ///
    /// Registrations from disjoint scopes are combined additively.
    ///
    /// # Panics
    ///
    /// Panics on a conflicting registration: a contextual codec for the
    /// exact same type, a polymorphic subtype registered twice in one
    /// base scope with different codecs, or two subtypes of one scope
    /// sharing a discriminator. Re-registering the *same* codec instance
    /// is not a conflict.
    #[must_use]
    pub fn combine(&self, other: &SerializersModule) -> SerializersModule {
        let mut builder = Self::builder();
        builder.include(self);
        builder.include(other);
        builder.build()
    }
}

impl core::fmt::Debug for SerializersModule {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("SerializersModule")
            .field("contextual", &self.contextual.len())
            .field("polymorphic", &self.polymorphic.len())
            .finish()
    }
}
