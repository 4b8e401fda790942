use core::any::TypeId;
use std::sync::{Arc, LazyLock, PoisonError, RwLock};

use crate::codec::ErasedCodec;

// -----------------------------------------------------------------------------
// CodecProvider

/// The pluggable "type identity → codec" capability.
///
/// This is how compiled codecs reach the erased resolution path: a derive
/// macro, a build script or plain hand-written registration code supplies
/// providers, and [`resolve_codec`](crate::lookup::resolve_codec)
/// consults them after the cache and before the contextual module.
///
/// For generic instantiations the already-resolved type-argument codecs
/// are passed in; non-generic providers ignore them.
pub trait CodecProvider: Send + Sync {
    /// Produces the codec for `type_id`, or `None` if this provider does
    /// not know the type.
    fn resolve(&self, type_id: TypeId, args: &[ErasedCodec]) -> Option<ErasedCodec>;
}

/// A provider registration collected at link time.
///
/// Submitted through [`submit_codec_provider!`](crate::submit_codec_provider)
/// when the `auto_register` feature is enabled.
pub struct ProviderRegistration {
    /// The provider instance.
    pub provider: &'static (dyn CodecProvider),
}

#[cfg(feature = "auto_register")]
inventory::collect!(ProviderRegistration);

/// Registers a [`CodecProvider`] at link time.
///
/// Requires the `auto_register` feature; the provider must be a
/// `'static` value (typically a unit struct).
///
/// ```ignore
/// struct MyProviders;
/// impl serial_core::lookup::CodecProvider for MyProviders {
///     # fn resolve(&self, _: core::any::TypeId, _: &[serial_core::codec::ErasedCodec])
///     #     -> Option<serial_core::codec::ErasedCodec> { None }
///     // ...
/// }
/// serial_core::submit_codec_provider!(MyProviders);
/// ```
#[cfg(feature = "auto_register")]
#[macro_export]
macro_rules! submit_codec_provider {
    ($provider:expr) => {
        $crate::lookup::inventory::submit! {
            $crate::lookup::ProviderRegistration {
                provider: &$provider,
            }
        }
    };
}

static RUNTIME_PROVIDERS: LazyLock<RwLock<Vec<Arc<dyn CodecProvider>>>> =
    LazyLock::new(|| RwLock::new(Vec::new()));

/// Registers a provider at runtime.
///
/// Runtime providers are consulted before link-time ones, in registration
/// order. Registration is append-only and process-wide.
pub fn register_codec_provider(provider: Arc<dyn CodecProvider>) {
    RUNTIME_PROVIDERS
        .write()
        .unwrap_or_else(PoisonError::into_inner)
        .push(provider);
}

pub(crate) fn resolve_from_providers(
    type_id: TypeId,
    args: &[ErasedCodec],
) -> Option<ErasedCodec> {
    {
        let providers = RUNTIME_PROVIDERS
            .read()
            .unwrap_or_else(PoisonError::into_inner);
        for provider in providers.iter() {
            if let Some(codec) = provider.resolve(type_id, args) {
                return Some(codec);
            }
        }
    }

    #[cfg(feature = "auto_register")]
    for registration in inventory::iter::<ProviderRegistration> {
        if let Some(codec) = registration.provider.resolve(type_id, args) {
            return Some(codec);
        }
    }

    None
}
