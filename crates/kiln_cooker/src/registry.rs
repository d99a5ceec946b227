//! Backend registration and the set of live cookers in a build.

use std::collections::HashMap;
use std::sync::Arc;

use kiln_common::{Asset, AssetId, AssetKind, CookError, CookResult};

use crate::backend::CookerBackend;
use crate::cooker::{BuildEnv, Cooker};
use crate::raw::RawCopyCooker;

/// A factory producing a fresh backend instance for one asset.
pub type BackendFactory = Box<dyn Fn() -> Box<dyn CookerBackend> + Send + Sync>;

/// Maps asset kinds to backend factories.
///
/// Kinds without a registered factory fall back to [`RawCopyCooker`], so a
/// tree can always be cooked even before dedicated compilers exist.
#[derive(Default)]
pub struct CookerRegistry {
    factories: HashMap<AssetKind, BackendFactory>,
}

impl CookerRegistry {
    /// Creates an empty registry.
    pub fn new() -> CookerRegistry {
        CookerRegistry::default()
    }

    /// Registers a factory for a kind, replacing any previous one.
    pub fn register<F>(&mut self, kind: AssetKind, factory: F)
    where
        F: Fn() -> Box<dyn CookerBackend> + Send + Sync + 'static,
    {
        self.factories.insert(kind, Box::new(factory));
    }

    /// Creates a backend for the given kind.
    pub fn create(&self, kind: AssetKind) -> Box<dyn CookerBackend> {
        match self.factories.get(&kind) {
            Some(factory) => factory(),
            None => Box::new(RawCopyCooker::new()),
        }
    }
}

/// The cookers alive in one build, keyed by asset id.
///
/// The set owns every cooker that is not currently executing on a worker.
/// The driver removes a cooker to hand it to the pool inside a cook command
/// and reinserts it when the command completes, so a cooker is never touched
/// by two threads at once.
#[derive(Default)]
pub struct CookerSet {
    cookers: HashMap<AssetId, Cooker>,
}

impl CookerSet {
    /// Creates an empty set.
    pub fn new() -> CookerSet {
        CookerSet::default()
    }

    /// Returns the cooker for an asset, creating it from the registry on
    /// first sight.
    pub fn resolve_or_create(
        &mut self,
        asset: &Asset,
        registry: &CookerRegistry,
        env: &Arc<BuildEnv>,
    ) -> &mut Cooker {
        self.cookers
            .entry(asset.id)
            .or_insert_with(|| Cooker::new(asset.clone(), registry.create(asset.kind), env.clone()))
    }

    /// Looks up a cooker without creating one.
    pub fn get_mut(&mut self, id: AssetId) -> Option<&mut Cooker> {
        self.cookers.get_mut(&id)
    }

    /// Removes a cooker from the set, transferring ownership to the caller.
    ///
    /// Used by the driver to hand a cooker to a pool worker; an id that is
    /// not present means the driver's bookkeeping is broken.
    pub fn take(&mut self, id: AssetId) -> CookResult<Cooker> {
        self.cookers
            .remove(&id)
            .ok_or_else(|| CookError::Generic(format!("no cooker for asset id {id:?}")))
    }

    /// Returns a cooker to the set after pooled execution.
    pub fn put_back(&mut self, cooker: Cooker) {
        self.cookers.insert(cooker.asset().id, cooker);
    }

    /// The number of live cookers.
    pub fn len(&self) -> usize {
        self.cookers.len()
    }

    /// Returns `true` if no cookers are alive.
    pub fn is_empty(&self) -> bool {
        self.cookers.is_empty()
    }

    /// Iterates over all live cookers.
    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut Cooker> {
        self.cookers.values_mut()
    }
}
