//! The resource-pool interface the engine consumes.
//!
//! A pool owns every live API object of one playback session: it maps
//! (logical resource, version) pairs to concrete handles and can materialize
//! a specific historical version on demand. Its storage and versioning
//! internals are a collaborator's concern; the engine only depends on this
//! trait. The live context is owned by the pool and reached through
//! [`ResourcePool::gl`].

use std::future::Future;
use std::pin::Pin;

use glint_gl::{ContextLimits, GlBackend, GlError, TargetHandle};

use crate::frame::{Resource, ResourceId, ResourceRef, ResourceVersion};

/// One asset-preload task. All of a frame's preloads must resolve before the
/// frame may be adopted.
pub type AssetPreload = Pin<Box<dyn Future<Output = Result<(), AssetError>>>>;

/// Failure to ready a resource's dependent assets.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("assets for resource {resource:?} failed to load: {reason}")]
pub struct AssetError {
    pub resource: ResourceId,
    pub reason: String,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PoolError {
    #[error("resource {id:?} is not registered in this pool")]
    UnknownResource { id: ResourceId },

    #[error("resource {id:?} has no recorded version {version:?}")]
    MissingVersion {
        id: ResourceId,
        version: ResourceVersion,
    },

    #[error(transparent)]
    Gl(#[from] GlError),
}

/// Session-scoped owner of live resource handles and version materialization.
pub trait ResourcePool {
    type Gl: GlBackend;

    /// The live context backing this pool.
    fn gl(&mut self) -> &mut Self::Gl;

    /// Implementation limits, resolved once for the pool's context.
    fn limits(&self) -> ContextLimits;

    /// Make `resource`'s live object hold exactly `version`'s contents.
    /// Idempotent: materializing the already-current version is a no-op.
    fn ensure_resource_version(
        &mut self,
        resource: &Resource,
        version: ResourceVersion,
    ) -> Result<(), PoolError>;

    /// Resolve a logical resource to its currently live handle.
    fn target_handle(&self, id: ResourceId) -> Option<TargetHandle>;

    /// Start readying the dependent assets of `resources`; completion of
    /// every returned task gates frame adoption.
    fn preload_assets(&mut self, resources: &[ResourceRef]) -> Vec<AssetPreload>;
}
