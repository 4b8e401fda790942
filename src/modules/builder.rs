use core::any::{Any, TypeId, type_name};
use std::sync::Arc;

use crate::codec::{
    Codec, DeserializeStrategy, ErasedCodec, ErasedDeserializer, ErasedSerializer,
    SerializeStrategy,
};
use crate::modules::module::{
    ContextualProvider, ContextualRegistration, PolymorphicEntry, PolymorphicScope,
};
use crate::modules::SerializersModule;

// -----------------------------------------------------------------------------
// SerializersModuleBuilder

/// Collects registrations for a [`SerializersModule`].
///
/// All conflict checking happens here, at module-build time: conflicting
/// registrations are development-time errors and panic with messages
/// naming the offenders. Re-registering the same codec instance — which
/// happens naturally when overlapping modules are combined — is never a
/// conflict.
///
/// # Examples
///
/// ```
/// use std::sync::Arc;
/// use serial_core::builtins::F64Codec;
/// use serial_core::modules::SerializersModule;
///
/// let module = SerializersModule::builder()
///     .contextual::<f64>(Arc::new(F64Codec))
///     .build();
/// assert!(module.get_contextual::<f64>().is_some());
/// ```
#[derive(Default)]
pub struct SerializersModuleBuilder {
    module: SerializersModule,
}

impl SerializersModuleBuilder {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    fn register_contextual(
        &mut self,
        type_id: TypeId,
        type_name: &'static str,
        provider: ContextualProvider,
    ) {
        if let Some(existing) = self.module.contextual.get(&type_id) {
            if !existing.provider.same_registration(&provider) {
                panic!(
                    "contextual serializer for `{type_name}` is already registered in this module",
                );
            }
            return;
        }
        self.module.contextual.insert(
            type_id,
            ContextualRegistration {
                type_name,
                provider,
            },
        );
    }

    fn register_entry(
        &mut self,
        base: TypeId,
        base_name: &'static str,
        entry: PolymorphicEntry,
    ) {
        let scope = ensure_scope(&mut self.module, base, base_name);

        if let Some(existing) = scope.by_type.get(&entry.codec.type_id()) {
            if !existing.codec.same_instance(&entry.codec) {
                panic!(
                    "subtype `{}` is already registered in the polymorphic scope of `{base_name}`",
                    entry.type_name(),
                );
            }
            return;
        }
        if let Some(existing) = scope.by_name.get(entry.serial_name()) {
            panic!(
                "subtypes `{}` and `{}` of the polymorphic scope `{base_name}` share the serial name `{}`",
                existing.type_name(),
                entry.type_name(),
                entry.serial_name(),
            );
        }

        scope.by_name.insert(entry.serial_name().to_owned(), entry.clone());
        scope.by_type.insert(entry.codec.type_id(), entry);
    }

    /// Registers a contextual codec for `T`.
    ///
    /// # Panics
    ///
    /// Panics if a different contextual codec is already registered for
    /// `T` in this module.
    pub fn contextual<T: 'static>(&mut self, codec: Arc<dyn Codec<T>>) -> &mut Self {
        self.register_contextual(
            TypeId::of::<T>(),
            type_name::<T>(),
            ContextualProvider::Fixed(ErasedCodec::new(codec)),
        );
        self
    }

    /// Registers a contextual codec provider for the generic type `T`,
    /// parameterized by the type arguments' codecs.
    pub fn contextual_provider<T: 'static>(
        &mut self,
        provider: impl Fn(&[ErasedCodec]) -> Arc<dyn Codec<T>> + Send + Sync + 'static,
    ) -> &mut Self {
        let erased = Arc::new(move |args: &[ErasedCodec]| ErasedCodec::new(provider(args)));
        self.register_contextual(
            TypeId::of::<T>(),
            type_name::<T>(),
            ContextualProvider::WithTypeArgs(erased),
        );
        self
    }

    /// Registers `T` as a subtype of the polymorphic base `B`.
    ///
    /// `wrap` lifts a decoded `T` into the base representation; at the
    /// call site it is usually just `|value| Box::new(value)`, with the
    /// unsized coercion into `Box<B>` implied.
    ///
    /// The codec's descriptor serial name becomes the wire discriminator
    /// for `T` within this scope.
    ///
    /// # Panics
    ///
    /// Panics if `T` is already registered under `B` with a different
    /// codec, or if another subtype of `B` uses the same serial name.
    pub fn polymorphic<B: ?Sized + 'static, T: 'static>(
        &mut self,
        codec: Arc<dyn Codec<T>>,
        wrap: fn(T) -> Box<B>,
    ) -> &mut Self {
        let serializer: Arc<dyn SerializeStrategy<T>> = codec.clone();
        let deserializer: Arc<dyn DeserializeStrategy<T>> = codec.clone();
        let entry = PolymorphicEntry {
            codec: ErasedCodec::new(codec),
            serializer: ErasedSerializer::new(serializer),
            deserializer: ErasedDeserializer::wrapping(deserializer, wrap),
        };
        self.register_entry(TypeId::of::<B>(), type_name::<B>(), entry);
        self
    }

    /// Sets the default-serializer selector for the scope of `B`,
    /// consulted when a value's concrete type has no direct registration.
    ///
    /// # Panics
    ///
    /// Panics if the scope already has a default serializer.
    pub fn polymorphic_default_serializer<B: ?Sized + 'static>(
        &mut self,
        provider: impl Fn(&dyn Any) -> Option<ErasedSerializer> + Send + Sync + 'static,
    ) -> &mut Self {
        let scope = ensure_scope(&mut self.module, TypeId::of::<B>(), type_name::<B>());
        if scope.default_serializer.is_some() {
            panic!(
                "polymorphic scope `{}` already has a default serializer",
                type_name::<B>(),
            );
        }
        scope.default_serializer = Some(Arc::new(provider));
        self
    }

    /// Sets the default-deserializer selector for the scope of `B`,
    /// consulted with the discriminator (or `None` if the format found
    /// none) when no direct registration matches.
    ///
    /// # Panics
    ///
    /// Panics if the scope already has a default deserializer.
    pub fn polymorphic_default_deserializer<B: ?Sized + 'static>(
        &mut self,
        provider: impl Fn(Option<&str>) -> Option<ErasedDeserializer> + Send + Sync + 'static,
    ) -> &mut Self {
        let scope = ensure_scope(&mut self.module, TypeId::of::<B>(), type_name::<B>());
        if scope.default_deserializer.is_some() {
            panic!(
                "polymorphic scope `{}` already has a default deserializer",
                type_name::<B>(),
            );
        }
        scope.default_deserializer = Some(Arc::new(provider));
        self
    }

    /// Merges every registration of `other` into this builder.
    ///
    /// # Panics
    ///
    /// Panics under the same conflict rules as the individual
    /// registration methods.
    pub fn include(&mut self, other: &SerializersModule) -> &mut Self {
        for (type_id, registration) in other.contextual.iter() {
            self.register_contextual(
                *type_id,
                registration.type_name,
                registration.provider.clone(),
            );
        }
        for (base, scope) in other.polymorphic.iter() {
            for entry in scope.by_type.values() {
                self.register_entry(*base, scope.base_name, entry.clone());
            }
            if let Some(default) = &scope.default_serializer {
                let target = ensure_scope(&mut self.module, *base, scope.base_name);
                match &target.default_serializer {
                    Some(existing) if !Arc::ptr_eq(existing, default) => panic!(
                        "polymorphic scope `{}` already has a default serializer",
                        scope.base_name,
                    ),
                    Some(_) => {}
                    None => target.default_serializer = Some(default.clone()),
                }
            }
            if let Some(default) = &scope.default_deserializer {
                let target = ensure_scope(&mut self.module, *base, scope.base_name);
                match &target.default_deserializer {
                    Some(existing) if !Arc::ptr_eq(existing, default) => panic!(
                        "polymorphic scope `{}` already has a default deserializer",
                        scope.base_name,
                    ),
                    Some(_) => {}
                    None => target.default_deserializer = Some(default.clone()),
                }
            }
        }
        self
    }

    /// Finishes the module.
    pub fn build(&mut self) -> SerializersModule {
        core::mem::take(&mut self.module)
    }
}

fn ensure_scope<'a>(
    module: &'a mut SerializersModule,
    base: TypeId,
    base_name: &'static str,
) -> &'a mut PolymorphicScope {
    if !module.polymorphic.contains(&base) {
        module.polymorphic.insert(
            base,
            PolymorphicScope {
                base_name,
                ..PolymorphicScope::default()
            },
        );
    }
    module
        .polymorphic
        .get_mut(&base)
        .expect("scope was just inserted")
}

// -----------------------------------------------------------------------------
// Tests
