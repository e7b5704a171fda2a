//! Reference test doubles for playback harnesses.
//!
//! [`MemoryPool`] is a complete in-memory [`ResourcePool`] over
//! [`HeadlessGl`]: it stores versioned resource contents, materializes them
//! idempotently, and lets tests stage controllable preload futures.
//! [`RecordingSurface`] records presentation operations. Both are used by
//! this crate's own tests and are public so downstream harnesses can drive a
//! session without a real context.

use std::collections::HashMap;
use std::sync::Arc;

use glint_gl::call::{BufferTarget, BufferUsage, GlCall, PixelType, TexImageTarget, TextureFormat, TextureTarget};
use glint_gl::state::StateSnapshot;
use glint_gl::{ContextLimits, GlBackend, HeadlessGl, ObjectKind, TargetHandle};

use crate::frame::{CanvasInfo, Frame, Resource, ResourceId, ResourceRef, ResourceVersion, SurfaceAttributes};
use crate::pool::{AssetPreload, PoolError, ResourcePool};
use crate::present::PresentSurface;

/// One version's contents for a pooled resource.
#[derive(Clone, Debug)]
pub enum ResourceContent {
    Buffer {
        data: Arc<[u8]>,
    },
    Texture2d {
        format: TextureFormat,
        width: u32,
        height: u32,
        data: Option<Arc<[u8]>>,
    },
    /// Kinds whose contents playback never inspects (renderbuffers,
    /// framebuffers, shaders, programs).
    Opaque,
}

struct PoolEntry {
    kind: ObjectKind,
    versions: HashMap<ResourceVersion, ResourceContent>,
    live: Option<(ResourceVersion, TargetHandle)>,
}

/// In-memory reference pool; see the module docs.
pub struct MemoryPool {
    gl: HeadlessGl,
    limits: ContextLimits,
    entries: HashMap<ResourceId, PoolEntry>,
    staged_preloads: HashMap<ResourceId, AssetPreload>,
    ensure_log: Vec<(ResourceId, ResourceVersion)>,
    materialize_log: Vec<(ResourceId, ResourceVersion)>,
}

impl Default for MemoryPool {
    fn default() -> Self {
        Self::with_limits(ContextLimits::default())
    }
}

impl MemoryPool {
    pub fn with_limits(limits: ContextLimits) -> Self {
        Self {
            gl: HeadlessGl::new(limits),
            limits,
            entries: HashMap::new(),
            staged_preloads: HashMap::new(),
            ensure_log: Vec::new(),
            materialize_log: Vec::new(),
        }
    }

    /// Register `content` as `resource`'s contents at `version`.
    pub fn define_resource(
        &mut self,
        resource: Resource,
        version: ResourceVersion,
        content: ResourceContent,
    ) {
        self.entries
            .entry(resource.id)
            .or_insert_with(|| PoolEntry {
                kind: resource.kind,
                versions: HashMap::new(),
                live: None,
            })
            .versions
            .insert(version, content);
    }

    /// Replace the ready-immediately preload for `id` with a custom future.
    /// Consumed by the next `preload_assets` call that includes `id`.
    pub fn stage_preload(&mut self, id: ResourceId, preload: AssetPreload) {
        self.staged_preloads.insert(id, preload);
    }

    /// Shared view of the backing context, for assertions.
    pub fn headless(&self) -> &HeadlessGl {
        &self.gl
    }

    /// Every `ensure_resource_version` call, in order.
    pub fn ensure_log(&self) -> &[(ResourceId, ResourceVersion)] {
        &self.ensure_log
    }

    /// Every materialization that actually ran (no-op ensures excluded).
    pub fn materialize_log(&self) -> &[(ResourceId, ResourceVersion)] {
        &self.materialize_log
    }

    fn upload(&mut self, handle: TargetHandle, content: &ResourceContent) -> Result<(), PoolError> {
        match content {
            ResourceContent::Buffer { data } => {
                let previous = self.gl.state().array_buffer;
                self.gl.apply(&GlCall::BindBuffer {
                    target: BufferTarget::Array,
                    buffer: Some(handle),
                })?;
                self.gl.apply(&GlCall::BufferData {
                    target: BufferTarget::Array,
                    data: Arc::clone(data),
                    usage: BufferUsage::StaticDraw,
                })?;
                self.gl.apply(&GlCall::BindBuffer {
                    target: BufferTarget::Array,
                    buffer: previous,
                })?;
            }
            ResourceContent::Texture2d {
                format,
                width,
                height,
                data,
            } => {
                let unit = self.gl.state().active_texture as usize;
                let previous = self.gl.state().texture_units[unit].binding_2d;
                self.gl.apply(&GlCall::BindTexture {
                    target: TextureTarget::Texture2d,
                    texture: Some(handle),
                })?;
                self.gl.apply(&GlCall::TexImage2d {
                    target: TexImageTarget::Texture2d,
                    level: 0,
                    format: *format,
                    width: *width,
                    height: *height,
                    pixel_type: PixelType::UnsignedByte,
                    data: data.as_ref().map(Arc::clone),
                })?;
                self.gl.apply(&GlCall::BindTexture {
                    target: TextureTarget::Texture2d,
                    texture: previous,
                })?;
            }
            ResourceContent::Opaque => {}
        }
        Ok(())
    }
}

impl ResourcePool for MemoryPool {
    type Gl = HeadlessGl;

    fn gl(&mut self) -> &mut HeadlessGl {
        &mut self.gl
    }

    fn limits(&self) -> ContextLimits {
        self.limits
    }

    fn ensure_resource_version(
        &mut self,
        resource: &Resource,
        version: ResourceVersion,
    ) -> Result<(), PoolError> {
        self.ensure_log.push((resource.id, version));
        let entry = self
            .entries
            .get_mut(&resource.id)
            .ok_or(PoolError::UnknownResource { id: resource.id })?;
        if let Some((live_version, _)) = entry.live {
            if live_version == version {
                return Ok(());
            }
        }
        if !entry.versions.contains_key(&version) {
            return Err(PoolError::MissingVersion {
                id: resource.id,
                version,
            });
        }
        let handle = match entry.live {
            Some((_, handle)) => handle,
            None => self.gl.create_object(entry.kind),
        };
        entry.live = Some((version, handle));
        let content = entry.versions[&version].clone();
        self.materialize_log.push((resource.id, version));
        self.upload(handle, &content)
    }

    fn target_handle(&self, id: ResourceId) -> Option<TargetHandle> {
        self.entries.get(&id)?.live.map(|(_, handle)| handle)
    }

    fn preload_assets(&mut self, resources: &[ResourceRef]) -> Vec<AssetPreload> {
        resources
            .iter()
            .map(|entry| {
                self.staged_preloads
                    .remove(&entry.resource.id)
                    .unwrap_or_else(|| {
                        Box::pin(std::future::ready(Ok(()))) as AssetPreload
                    })
            })
            .collect()
    }
}

/// Presentation operations observed by a [`RecordingSurface`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SurfaceOp {
    Clear,
    DrawScaled {
        color_texture: TargetHandle,
        source_size: (u32, u32),
    },
}

/// A present destination that records what was drawn onto it.
#[derive(Default)]
pub struct RecordingSurface {
    pub ops: Vec<SurfaceOp>,
}

impl PresentSurface for RecordingSurface {
    fn clear(&mut self) {
        self.ops.push(SurfaceOp::Clear);
    }

    fn draw_scaled(&mut self, color_texture: TargetHandle, source_size: (u32, u32)) {
        self.ops.push(SurfaceOp::DrawScaled {
            color_texture,
            source_size,
        });
    }
}

/// A frame with no calls, no resources, and initial-default state, over a
/// non-antialiased RGBA+depth surface. Tests extend the returned value.
pub fn empty_frame(limits: &ContextLimits, width: u32, height: u32) -> Frame {
    Frame {
        calls: Vec::new(),
        initial_resources: Vec::new(),
        initial_uniforms: Vec::new(),
        initial_state: StateSnapshot::initial(limits),
        canvas_info: CanvasInfo {
            width,
            height,
            attributes: SurfaceAttributes {
                alpha: true,
                depth: true,
                stencil: false,
                antialias: false,
                premultiplied_alpha: false,
            },
        },
    }
}

/// Shorthand [`Resource`] constructor.
pub fn resource(id: u32, kind: ObjectKind, creation_order: u64) -> Resource {
    Resource {
        id: ResourceId(id),
        kind,
        creation_order,
    }
}
