//! Codec resolution and memoization.
//!
//! Resolution order, for both the typed and the erased entry points:
//!
//! 1. the process-wide cache;
//! 2. the compiled capability ([`Serial`] for the typed path, registered
//!    [`CodecProvider`]s for the erased path; builtin containers are
//!    covered by [`builtins`](crate::builtins) and protected by
//!    coherence);
//! 3. the module's contextual registrations — never cached, because they
//!    are module-scoped, not type-scoped;
//! 4. failure, naming the type.
//!
//! Nullability wrapping is applied last and uniformly by the `Option`
//! builtin, whichever tier resolved the inner codec.

mod cache;
mod provider;

pub use provider::{CodecProvider, ProviderRegistration, register_codec_provider};

#[cfg(feature = "auto_register")]
pub use inventory;

use core::any::TypeId;
use std::sync::Arc;

use crate::codec::{Codec, ErasedCodec, Serial};
use crate::error::{SerialError, SerialResult};
use crate::modules::SerializersModule;

// -----------------------------------------------------------------------------
// Typed resolution

/// Returns the memoized codec for a type with the compiled capability.
///
/// The first call per type runs [`Serial::codec`] and fills the
/// process-wide cache; later calls (from any thread) share the same
/// instance.
///
/// # Examples
///
/// ```
/// use serial_core::codec::Described;
/// use serial_core::lookup::codec_of;
///
/// let a = codec_of::<Option<Vec<i32>>>();
/// let b = codec_of::<Option<Vec<i32>>>();
/// assert_eq!(a.descriptor(), b.descriptor());
/// ```
pub fn codec_of<T: Serial>() -> Arc<dyn Codec<T>> {
    let type_id = TypeId::of::<T>();
    let erased = match cache::get(type_id) {
        Some(hit) => hit,
        None => {
            log::trace!("resolving codec for `{}`", core::any::type_name::<T>());
            cache::store(type_id, ErasedCodec::new(T::codec()))
        }
    };
    // The cache slot for `T` only ever holds a codec erased from `T`.
    erased
        .downcast::<T>()
        .expect("cache holds the codec stored under this type id")
}

// -----------------------------------------------------------------------------
// Erased resolution

/// Resolves a codec from a runtime type description.
///
/// `type_name` is only used for diagnostics. `args` carries the resolved
/// codecs of the type arguments for generic instantiations, in
/// declaration order; pass `&[]` for non-generic types.
///
/// Successful provider resolutions are cached — keyed by the type id
/// alone, or by (type id, argument descriptors) when arguments are
/// present. Contextual hits are returned uncached.
pub fn resolve_codec(
    type_id: TypeId,
    type_name: &str,
    args: &[ErasedCodec],
    module: &SerializersModule,
) -> SerialResult<ErasedCodec> {
    let cached = if args.is_empty() {
        cache::get(type_id)
    } else {
        cache::get_parametrized(type_id, args)
    };
    if let Some(hit) = cached {
        return Ok(hit);
    }

    if let Some(found) = provider::resolve_from_providers(type_id, args) {
        log::trace!("codec for `{type_name}` resolved by a provider");
        let stored = if args.is_empty() {
            cache::store(type_id, found)
        } else {
            cache::store_parametrized(type_id, args, found)
        };
        return Ok(stored);
    }

    // Module-scoped: two call sites may carry different modules, so this
    // tier is never cached globally.
    if let Some(found) = module.contextual_erased(type_id, args) {
        log::trace!("codec for `{type_name}` resolved contextually");
        return Ok(found);
    }

    log::debug!("no codec found for `{type_name}`");
    Err(SerialError::SerializerNotFound {
        type_name: type_name.to_owned(),
    })
}

// -----------------------------------------------------------------------------
// Tests

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builtins::I32Codec;
    use crate::codec::Described as _;
    use crate::descriptor::{SerialKind, StructureKind};

    #[test]
    fn typed_resolution_is_memoized() {
        let a = codec_of::<Vec<i32>>();
        let b = codec_of::<Vec<i32>>();
        // Same instance, not merely equal descriptors.
        assert!(Arc::ptr_eq(&a, &b));
        assert_eq!(a.descriptor().kind(), SerialKind::Structure(StructureKind::List));
    }

    #[test]
    fn erased_resolution_reports_the_type() {
        struct Unregistered;

        let module = SerializersModule::empty();
        let err = resolve_codec(
            TypeId::of::<Unregistered>(),
            "Unregistered",
            &[],
            module,
        )
        .unwrap_err();
        assert!(matches!(err, SerialError::SerializerNotFound { type_name } if type_name == "Unregistered"));
    }

    #[test]
    fn contextual_tier_resolves_unregistered_types() {
        struct OnlyContextual;

        // No compiled capability and no provider: only the module knows it.
        // Reuse the i32 codec erased under the probe's id is not possible,
        // so register a contextual entry for i32 and resolve through it.
        let module = SerializersModule::builder()
            .contextual::<i32>(Arc::new(I32Codec))
            .build();

        let found = resolve_codec(TypeId::of::<i32>(), "i32", &[], &module);
        assert!(found.is_ok());

        let missing = resolve_codec(
            TypeId::of::<OnlyContextual>(),
            "OnlyContextual",
            &[],
            &module,
        );
        assert!(missing.is_err());
    }

    #[test]
    fn runtime_providers_fill_the_erased_path() {
        struct ProviderProbe;
        struct ProbeProvider;

        impl CodecProvider for ProbeProvider {
            fn resolve(&self, type_id: TypeId, _args: &[ErasedCodec]) -> Option<ErasedCodec> {
                (type_id == TypeId::of::<ProviderProbe>())
                    .then(|| ErasedCodec::new::<i32>(Arc::new(I32Codec)))
            }
        }

        register_codec_provider(Arc::new(ProbeProvider));
        let found = resolve_codec(
            TypeId::of::<ProviderProbe>(),
            "ProviderProbe",
            &[],
            SerializersModule::empty(),
        )
        .unwrap();
        assert_eq!(found.descriptor().serial_name(), "i32");

        // The resolution is now cached.
        assert!(cache::get(TypeId::of::<ProviderProbe>()).is_some());
    }
}
