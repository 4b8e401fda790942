//! The process-wide codec caches.
//!
//! Explicitly initialized, concurrent, grow-only: the key space is
//! bounded by the set of types compiled into the program, so nothing is
//! ever evicted. Fills are first-writer-wins — losing a race is harmless
//! because resolution is deterministic per key, and every racer converges
//! on the instance that won.

use core::any::TypeId;
use std::sync::{LazyLock, PoisonError, RwLock};

use crate::codec::ErasedCodec;
use crate::descriptor::SerialDescriptor;
use crate::util::{FastMap, TypeIdMap};

static CODEC_CACHE: LazyLock<RwLock<TypeIdMap<ErasedCodec>>> =
    LazyLock::new(|| RwLock::new(TypeIdMap::new()));

/// Key for generic instantiations resolved through the erased path: the
/// base type plus the ordered type-argument descriptors.
#[derive(PartialEq, Eq, Hash)]
struct ParametrizedKey {
    base: TypeId,
    args: Box<[SerialDescriptor]>,
}

static PARAMETRIZED_CACHE: LazyLock<RwLock<FastMap<ParametrizedKey, ErasedCodec>>> =
    LazyLock::new(|| RwLock::new(FastMap::default()));

pub(crate) fn get(type_id: TypeId) -> Option<ErasedCodec> {
    CODEC_CACHE
        .read()
        .unwrap_or_else(PoisonError::into_inner)
        .get(&type_id)
        .cloned()
}

/// Stores a resolution, returning the entry that ended up cached — the
/// existing one if another thread won the race.
pub(crate) fn store(type_id: TypeId, codec: ErasedCodec) -> ErasedCodec {
    let mut cache = CODEC_CACHE.write().unwrap_or_else(PoisonError::into_inner);
    cache.try_insert(type_id, || codec);
    cache.get(&type_id).cloned().expect("entry was just filled")
}

fn parametrized_key(base: TypeId, args: &[ErasedCodec]) -> ParametrizedKey {
    ParametrizedKey {
        base,
        args: args.iter().map(|arg| arg.descriptor().clone()).collect(),
    }
}

pub(crate) fn get_parametrized(base: TypeId, args: &[ErasedCodec]) -> Option<ErasedCodec> {
    PARAMETRIZED_CACHE
        .read()
        .unwrap_or_else(PoisonError::into_inner)
        .get(&parametrized_key(base, args))
        .cloned()
}

pub(crate) fn store_parametrized(
    base: TypeId,
    args: &[ErasedCodec],
    codec: ErasedCodec,
) -> ErasedCodec {
    let key = parametrized_key(base, args);
    let mut cache = PARAMETRIZED_CACHE
        .write()
        .unwrap_or_else(PoisonError::into_inner);
    cache.entry(key).or_insert(codec).clone()
}

// -----------------------------------------------------------------------------
// Tests
