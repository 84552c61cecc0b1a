//! Pluggable pooling strategies for model-building hosts.
//!
//! A host that wants interning behind an abstraction registers one or more
//! [`PoolingProvider`]s; the registry enumerates them once on first use,
//! keeps the highest-priority one for the process lifetime, and degrades to
//! a transparent passthrough whenever anything is missing or mismatched.
//! Registry failure is never an error: the worst outcome is that values are
//! not deduplicated, which is logged at debug level and otherwise invisible.
//!
//! Providers registered after the first selection do not retroactively
//! change it; registration belongs in process startup.

use std::any::{Any, TypeId};
use std::sync::Arc;

use once_cell::sync::OnceCell;
use parking_lot::Mutex;
use tracing::debug;

use crate::stats::PoolStatistics;

/// Type-erased pooled value.
pub type AnyValue = Arc<dyn Any + Send + Sync>;

/// A pooling strategy an extension can supply.
pub trait PoolingProvider: Send + Sync {
    /// Return the canonical representative for `value`, registering it if
    /// its class is new. Implementations must return the input unchanged
    /// for values they cannot pool.
    fn intern(&self, value: AnyValue) -> AnyValue;

    /// Whether this provider can pool values of the given type.
    fn supports(&self, type_id: TypeId) -> bool;

    /// Selection rank; the highest-priority registered provider wins.
    fn priority(&self) -> i32 {
        0
    }

    /// Statistics, for providers that keep them.
    fn statistics(&self) -> Option<PoolStatistics> {
        None
    }
}

/// Passthrough provider used when nothing is registered.
pub struct NoopProvider;

impl PoolingProvider for NoopProvider {
    fn intern(&self, value: AnyValue) -> AnyValue {
        value
    }

    fn supports(&self, _type_id: TypeId) -> bool {
        true
    }
}

static REGISTERED: Mutex<Vec<Arc<dyn PoolingProvider>>> = Mutex::new(Vec::new());
static CHOSEN: OnceCell<Arc<dyn PoolingProvider>> = OnceCell::new();
static FIRST: OnceCell<Arc<dyn PoolingProvider>> = OnceCell::new();

/// Register a provider for later selection.
pub fn register(provider: Arc<dyn PoolingProvider>) {
    if CHOSEN.get().is_some() || FIRST.get().is_some() {
        debug!("pooling provider registered after selection; it will not be used");
    }
    REGISTERED.lock().push(provider);
}

fn highest_priority(providers: &[Arc<dyn PoolingProvider>]) -> Option<Arc<dyn PoolingProvider>> {
    providers.iter().max_by_key(|p| p.priority()).cloned()
}

/// The selected provider: highest priority among those registered at first
/// call, cached for the process lifetime. Passthrough when none exist.
pub fn provider() -> Arc<dyn PoolingProvider> {
    Arc::clone(CHOSEN.get_or_init(|| {
        highest_priority(&REGISTERED.lock()).unwrap_or_else(|| {
            debug!("no pooling provider registered; interning is a passthrough");
            Arc::new(NoopProvider)
        })
    }))
}

/// Like [`provider`], but takes whichever provider was registered first,
/// ignoring priorities. Same passthrough fallback, cached independently.
pub fn any_provider() -> Arc<dyn PoolingProvider> {
    Arc::clone(FIRST.get_or_init(|| {
        REGISTERED.lock().first().cloned().unwrap_or_else(|| {
            debug!("no pooling provider registered; interning is a passthrough");
            Arc::new(NoopProvider)
        })
    }))
}

/// Typed interning through the selected provider. Unsupported types and
/// providers that return a foreign type degrade to returning the input.
pub fn intern_with_provider<T: Send + Sync + 'static>(value: Arc<T>) -> Arc<T> {
    let provider = provider();
    if !provider.supports(TypeId::of::<T>()) {
        debug!("pooling provider does not support this type; passing value through");
        return value;
    }
    let pooled = provider.intern(Arc::clone(&value) as AnyValue);
    match pooled.downcast::<T>() {
        Ok(typed) => typed,
        Err(_) => {
            debug!("pooling provider returned a foreign type; passing value through");
            value
        }
    }
}
