//! In-memory [`GlBackend`] with full state tracking.
//!
//! `HeadlessGl` executes resolved calls against object tables and an explicit
//! [`StateSnapshot`], and keeps an append-only log of every call it ran.
//! Replay harnesses use it to assert on both the issued-call sequence and the
//! settled state without a real context; it is also the substrate for the
//! reference resource pool in the playback crate's `testing` module.
//!
//! It is **not** a renderer: draw and clear calls are validated and logged
//! but produce no pixels.

use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use crate::backend::{
    ContextLimits, FramebufferStatus, GlBackend, GlError, ObjectKind, TargetHandle,
};
use crate::call::{
    BufferTarget, Capability, FramebufferAttachment, GlCall, PixelStoreParam, PixelType,
    RenderbufferFormat, TexImageTarget, TextureFilter, TextureFormat, TextureParameter,
    TextureTarget, TextureWrap,
};
use crate::state::StateSnapshot;
use crate::uniform::UniformCall;

/// One defined image level of a texture.
#[derive(Clone, Debug, PartialEq)]
pub struct TextureLevel {
    pub format: TextureFormat,
    pub width: u32,
    pub height: u32,
    pub pixel_type: PixelType,
    pub data: Option<Arc<[u8]>>,
}

/// Filtering/wrapping parameters of a texture object.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TextureParams {
    pub min_filter: TextureFilter,
    pub mag_filter: TextureFilter,
    pub wrap_s: TextureWrap,
    pub wrap_t: TextureWrap,
}

impl Default for TextureParams {
    fn default() -> Self {
        Self {
            min_filter: TextureFilter::NearestMipmapLinear,
            mag_filter: TextureFilter::Linear,
            wrap_s: TextureWrap::Repeat,
            wrap_t: TextureWrap::Repeat,
        }
    }
}

#[derive(Clone, Debug, Default)]
struct TextureStore {
    levels: HashMap<(TexImageTarget, i32), TextureLevel>,
    params: TextureParams,
    mipmapped: bool,
}

/// A framebuffer attachment point's contents.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Attachment {
    Texture { texture: TargetHandle, level: i32 },
    Renderbuffer { renderbuffer: TargetHandle },
}

#[derive(Clone, Copy, Debug, Default)]
struct FramebufferStore {
    color: Option<Attachment>,
    depth: Option<Attachment>,
    stencil: Option<Attachment>,
}

#[derive(Clone, Debug, Default)]
struct ProgramStore {
    uniforms: BTreeMap<String, UniformCall>,
}

/// In-memory backend; see the module docs.
pub struct HeadlessGl {
    limits: ContextLimits,
    next_handle: u32,
    objects: HashMap<TargetHandle, ObjectKind>,
    buffers: HashMap<TargetHandle, Vec<u8>>,
    textures: HashMap<TargetHandle, TextureStore>,
    renderbuffers: HashMap<TargetHandle, Option<(RenderbufferFormat, u32, u32)>>,
    framebuffers: HashMap<TargetHandle, FramebufferStore>,
    programs: HashMap<TargetHandle, ProgramStore>,
    state: StateSnapshot<TargetHandle>,
    log: Vec<GlCall<TargetHandle>>,
}

impl Default for HeadlessGl {
    fn default() -> Self {
        Self::new(ContextLimits::default())
    }
}

impl HeadlessGl {
    pub fn new(limits: ContextLimits) -> Self {
        Self {
            limits,
            next_handle: 0,
            objects: HashMap::new(),
            buffers: HashMap::new(),
            textures: HashMap::new(),
            renderbuffers: HashMap::new(),
            framebuffers: HashMap::new(),
            programs: HashMap::new(),
            state: StateSnapshot::initial(&limits),
            log: Vec::new(),
        }
    }

    /// The live global state.
    pub fn state(&self) -> &StateSnapshot<TargetHandle> {
        &self.state
    }

    /// Every call executed so far, in order.
    pub fn call_log(&self) -> &[GlCall<TargetHandle>] {
        &self.log
    }

    pub fn clear_call_log(&mut self) {
        self.log.clear();
    }

    pub fn is_live(&self, handle: TargetHandle) -> bool {
        self.objects.contains_key(&handle)
    }

    pub fn buffer_contents(&self, handle: TargetHandle) -> Option<&[u8]> {
        self.buffers.get(&handle).map(Vec::as_slice)
    }

    pub fn texture_level(
        &self,
        handle: TargetHandle,
        target: TexImageTarget,
        level: i32,
    ) -> Option<&TextureLevel> {
        self.textures.get(&handle)?.levels.get(&(target, level))
    }

    pub fn texture_params(&self, handle: TargetHandle) -> Option<TextureParams> {
        self.textures.get(&handle).map(|t| t.params)
    }

    pub fn program_uniform(&self, handle: TargetHandle, name: &str) -> Option<&UniformCall> {
        self.programs.get(&handle)?.uniforms.get(name)
    }

    pub fn framebuffer_attachment(
        &self,
        handle: TargetHandle,
        attachment: FramebufferAttachment,
    ) -> Option<Attachment> {
        let store = self.framebuffers.get(&handle)?;
        match attachment {
            FramebufferAttachment::Color0 => store.color,
            FramebufferAttachment::Depth => store.depth,
            FramebufferAttachment::Stencil => store.stencil,
        }
    }

    fn expect_kind(&self, handle: TargetHandle, expected: ObjectKind) -> Result<(), GlError> {
        match self.objects.get(&handle) {
            None => Err(GlError::UnknownObject {
                kind: expected,
                handle,
            }),
            Some(actual) if *actual != expected => Err(GlError::KindMismatch {
                handle,
                expected,
                actual: *actual,
            }),
            Some(_) => Ok(()),
        }
    }

    fn expect_kind_opt(
        &self,
        handle: &Option<TargetHandle>,
        expected: ObjectKind,
    ) -> Result<(), GlError> {
        match handle {
            Some(h) => self.expect_kind(*h, expected),
            None => Ok(()),
        }
    }

    fn bound_buffer(&self, target: BufferTarget) -> Result<TargetHandle, GlError> {
        let bound = match target {
            BufferTarget::Array => self.state.array_buffer,
            BufferTarget::ElementArray => self.state.element_array_buffer,
        };
        bound.ok_or(GlError::NoBufferBound { target })
    }

    fn bound_texture(&self, target: TextureTarget) -> Result<TargetHandle, GlError> {
        let unit = &self.state.texture_units[self.state.active_texture as usize];
        let bound = match target {
            TextureTarget::Texture2d => unit.binding_2d,
            TextureTarget::CubeMap => unit.binding_cube,
        };
        bound.ok_or(GlError::NoTextureBound {
            target,
            unit: self.state.active_texture,
        })
    }

    /// Drop every live-state reference to a deleted object. Attachments held
    /// by unbound framebuffers keep dangling, matching the API.
    fn scrub_state(&mut self, handle: TargetHandle) {
        let state = &mut self.state;
        for slot in [
            &mut state.framebuffer,
            &mut state.renderbuffer,
            &mut state.array_buffer,
            &mut state.element_array_buffer,
            &mut state.current_program,
        ] {
            if *slot == Some(handle) {
                *slot = None;
            }
        }
        for unit in &mut state.texture_units {
            if unit.binding_2d == Some(handle) {
                unit.binding_2d = None;
            }
            if unit.binding_cube == Some(handle) {
                unit.binding_cube = None;
            }
        }
        for attrib in &mut state.vertex_attribs {
            if attrib.array_buffer == Some(handle) {
                attrib.array_buffer = None;
            }
        }
    }

    fn attachment_size(&self, attachment: Attachment) -> Option<(u32, u32)> {
        match attachment {
            Attachment::Texture { texture, level } => {
                if !self.objects.contains_key(&texture) {
                    return None;
                }
                let level = self
                    .textures
                    .get(&texture)?
                    .levels
                    .get(&(TexImageTarget::Texture2d, level))?;
                Some((level.width, level.height))
            }
            Attachment::Renderbuffer { renderbuffer } => {
                if !self.objects.contains_key(&renderbuffer) {
                    return None;
                }
                let (_, width, height) = (*self.renderbuffers.get(&renderbuffer)?)?;
                Some((width, height))
            }
        }
    }

    fn execute(&mut self, call: &GlCall<TargetHandle>) -> Result<(), GlError> {
        match call {
            GlCall::BindFramebuffer { framebuffer } => {
                self.expect_kind_opt(framebuffer, ObjectKind::Framebuffer)?;
                self.state.framebuffer = *framebuffer;
            }
            GlCall::BindRenderbuffer { renderbuffer } => {
                self.expect_kind_opt(renderbuffer, ObjectKind::Renderbuffer)?;
                self.state.renderbuffer = *renderbuffer;
            }
            GlCall::FramebufferTexture2d {
                attachment,
                texture,
                level,
            } => {
                let fb = self.state.framebuffer.ok_or(GlError::NoFramebufferBound)?;
                self.expect_kind_opt(texture, ObjectKind::Texture)?;
                let store = self
                    .framebuffers
                    .get_mut(&fb)
                    .expect("bound framebuffer has a store");
                let value = texture.map(|texture| Attachment::Texture {
                    texture,
                    level: *level,
                });
                match attachment {
                    FramebufferAttachment::Color0 => store.color = value,
                    FramebufferAttachment::Depth => store.depth = value,
                    FramebufferAttachment::Stencil => store.stencil = value,
                }
            }
            GlCall::FramebufferRenderbuffer {
                attachment,
                renderbuffer,
            } => {
                let fb = self.state.framebuffer.ok_or(GlError::NoFramebufferBound)?;
                self.expect_kind_opt(renderbuffer, ObjectKind::Renderbuffer)?;
                let store = self
                    .framebuffers
                    .get_mut(&fb)
                    .expect("bound framebuffer has a store");
                let value =
                    renderbuffer.map(|renderbuffer| Attachment::Renderbuffer { renderbuffer });
                match attachment {
                    FramebufferAttachment::Color0 => store.color = value,
                    FramebufferAttachment::Depth => store.depth = value,
                    FramebufferAttachment::Stencil => store.stencil = value,
                }
            }
            GlCall::RenderbufferStorage {
                format,
                width,
                height,
            } => {
                let rb = self
                    .state
                    .renderbuffer
                    .ok_or(GlError::NoRenderbufferBound)?;
                self.renderbuffers
                    .insert(rb, Some((*format, *width, *height)));
            }
            GlCall::BindBuffer { target, buffer } => {
                self.expect_kind_opt(buffer, ObjectKind::Buffer)?;
                match target {
                    BufferTarget::Array => self.state.array_buffer = *buffer,
                    BufferTarget::ElementArray => self.state.element_array_buffer = *buffer,
                }
            }
            GlCall::BufferData { target, data, .. } => {
                let buffer = self.bound_buffer(*target)?;
                self.buffers.insert(buffer, data.to_vec());
            }
            GlCall::BufferSubData {
                target,
                offset,
                data,
            } => {
                let buffer = self.bound_buffer(*target)?;
                let store = self.buffers.get_mut(&buffer).expect("buffer has a store");
                let end = offset + data.len();
                if end > store.len() {
                    return Err(GlError::BufferRangeOutOfBounds {
                        offset: *offset,
                        end,
                        size: store.len(),
                    });
                }
                store[*offset..end].copy_from_slice(data);
            }
            GlCall::ActiveTexture { unit } => {
                if *unit >= self.limits.max_texture_units {
                    return Err(GlError::InvalidTextureUnit {
                        unit: *unit,
                        max: self.limits.max_texture_units,
                    });
                }
                self.state.active_texture = *unit;
            }
            GlCall::BindTexture { target, texture } => {
                self.expect_kind_opt(texture, ObjectKind::Texture)?;
                let unit = &mut self.state.texture_units[self.state.active_texture as usize];
                match target {
                    TextureTarget::Texture2d => unit.binding_2d = *texture,
                    TextureTarget::CubeMap => unit.binding_cube = *texture,
                }
            }
            GlCall::TexImage2d {
                target,
                level,
                format,
                width,
                height,
                pixel_type,
                data,
            } => {
                let texture = self.bound_texture(target.binding_target())?;
                let store = self
                    .textures
                    .get_mut(&texture)
                    .expect("bound texture has a store");
                store.levels.insert(
                    (*target, *level),
                    TextureLevel {
                        format: *format,
                        width: *width,
                        height: *height,
                        pixel_type: *pixel_type,
                        data: data.as_ref().map(Arc::clone),
                    },
                );
            }
            GlCall::TexSubImage2d {
                target,
                level,
                x,
                y,
                width,
                height,
                data,
                ..
            } => {
                let texture = self.bound_texture(target.binding_target())?;
                let store = self
                    .textures
                    .get_mut(&texture)
                    .expect("bound texture has a store");
                let image = store
                    .levels
                    .get_mut(&(*target, *level))
                    .ok_or(GlError::UndefinedTextureLevel { level: *level })?;
                if x + width > image.width || y + height > image.height {
                    return Err(GlError::TextureRegionOutOfBounds {
                        width: image.width,
                        height: image.height,
                    });
                }
                // Only a full-image update rewrites the stored bytes; partial
                // updates keep the descriptor-level tracking.
                if *x == 0 && *y == 0 && *width == image.width && *height == image.height {
                    image.data = Some(Arc::clone(data));
                }
            }
            GlCall::TexParameter { target, param } => {
                let texture = self.bound_texture(*target)?;
                let store = self
                    .textures
                    .get_mut(&texture)
                    .expect("bound texture has a store");
                match param {
                    TextureParameter::MinFilter(v) => store.params.min_filter = *v,
                    TextureParameter::MagFilter(v) => store.params.mag_filter = *v,
                    TextureParameter::WrapS(v) => store.params.wrap_s = *v,
                    TextureParameter::WrapT(v) => store.params.wrap_t = *v,
                }
            }
            GlCall::GenerateMipmap { target } => {
                let texture = self.bound_texture(*target)?;
                self.textures
                    .get_mut(&texture)
                    .expect("bound texture has a store")
                    .mipmapped = true;
            }
            GlCall::UseProgram { program } => {
                self.expect_kind_opt(program, ObjectKind::Program)?;
                self.state.current_program = *program;
            }
            GlCall::Uniform { name, value } => {
                let program = self.state.current_program.ok_or(GlError::NoProgramActive)?;
                self.programs
                    .get_mut(&program)
                    .expect("active program has a store")
                    .uniforms
                    .insert(name.clone(), value.clone());
            }
            GlCall::EnableVertexAttribArray { index }
            | GlCall::DisableVertexAttribArray { index } => {
                if *index >= self.limits.max_vertex_attribs {
                    return Err(GlError::InvalidAttribIndex {
                        index: *index,
                        max: self.limits.max_vertex_attribs,
                    });
                }
                self.state.vertex_attribs[*index as usize].enabled =
                    matches!(call, GlCall::EnableVertexAttribArray { .. });
            }
            GlCall::VertexAttribPointer {
                index,
                size,
                ty,
                normalized,
                stride,
                offset,
            } => {
                if *index >= self.limits.max_vertex_attribs {
                    return Err(GlError::InvalidAttribIndex {
                        index: *index,
                        max: self.limits.max_vertex_attribs,
                    });
                }
                let array_buffer = self.state.array_buffer;
                let attrib = &mut self.state.vertex_attribs[*index as usize];
                attrib.array_buffer = array_buffer;
                attrib.size = *size;
                attrib.ty = *ty;
                attrib.normalized = *normalized;
                attrib.stride = *stride;
                attrib.offset = *offset;
            }
            GlCall::VertexAttrib4f { index, value } => {
                if *index >= self.limits.max_vertex_attribs {
                    return Err(GlError::InvalidAttribIndex {
                        index: *index,
                        max: self.limits.max_vertex_attribs,
                    });
                }
                self.state.vertex_attribs[*index as usize].current_value = *value;
            }
            GlCall::Enable { cap } | GlCall::Disable { cap } => {
                let enabled = matches!(call, GlCall::Enable { .. });
                match cap {
                    Capability::Blend => self.state.blend = enabled,
                    Capability::CullFace => self.state.cull_face = enabled,
                    Capability::DepthTest => self.state.depth_test = enabled,
                    Capability::PolygonOffsetFill => self.state.polygon_offset_fill = enabled,
                    Capability::SampleAlphaToCoverage => {
                        self.state.sample_alpha_to_coverage = enabled
                    }
                    Capability::SampleCoverage => self.state.sample_coverage_enabled = enabled,
                    Capability::ScissorTest => self.state.scissor_test = enabled,
                    Capability::StencilTest => self.state.stencil_test = enabled,
                }
            }
            GlCall::Viewport {
                x,
                y,
                width,
                height,
            } => self.state.viewport = [*x, *y, *width, *height],
            GlCall::DepthRange { near, far } => self.state.depth_range = [*near, *far],
            GlCall::ClearColor { value } => self.state.color_clear_value = *value,
            GlCall::ClearDepth { value } => self.state.depth_clear_value = *value,
            GlCall::ClearStencil { value } => self.state.stencil_clear_value = *value,
            GlCall::ColorMask { mask } => self.state.color_writemask = *mask,
            GlCall::DepthMask { flag } => self.state.depth_writemask = *flag,
            GlCall::DepthFunc { func } => self.state.depth_func = *func,
            GlCall::BlendColor { value } => self.state.blend_color = *value,
            GlCall::BlendEquationSeparate { rgb, alpha } => {
                self.state.blend_equation_rgb = *rgb;
                self.state.blend_equation_alpha = *alpha;
            }
            GlCall::BlendFuncSeparate {
                src_rgb,
                dst_rgb,
                src_alpha,
                dst_alpha,
            } => {
                self.state.blend_src_rgb = *src_rgb;
                self.state.blend_dst_rgb = *dst_rgb;
                self.state.blend_src_alpha = *src_alpha;
                self.state.blend_dst_alpha = *dst_alpha;
            }
            GlCall::CullFace { mode } => self.state.cull_face_mode = *mode,
            GlCall::FrontFace { mode } => self.state.front_face = *mode,
            GlCall::LineWidth { width } => self.state.line_width = *width,
            GlCall::PolygonOffset { factor, units } => {
                self.state.polygon_offset_factor = *factor;
                self.state.polygon_offset_units = *units;
            }
            GlCall::SampleCoverage { value, invert } => {
                self.state.sample_coverage_value = *value;
                self.state.sample_coverage_invert = *invert;
            }
            GlCall::Scissor {
                x,
                y,
                width,
                height,
            } => self.state.scissor_box = [*x, *y, *width, *height],
            GlCall::StencilFuncSeparate {
                face,
                func,
                reference,
                mask,
            } => {
                let face_state = match face {
                    crate::call::StencilFace::Front => &mut self.state.stencil_front,
                    crate::call::StencilFace::Back => &mut self.state.stencil_back,
                };
                face_state.func = *func;
                face_state.reference = *reference;
                face_state.value_mask = *mask;
            }
            GlCall::StencilOpSeparate {
                face,
                fail,
                depth_fail,
                depth_pass,
            } => {
                let face_state = match face {
                    crate::call::StencilFace::Front => &mut self.state.stencil_front,
                    crate::call::StencilFace::Back => &mut self.state.stencil_back,
                };
                face_state.fail = *fail;
                face_state.depth_fail = *depth_fail;
                face_state.depth_pass = *depth_pass;
            }
            GlCall::StencilMaskSeparate { face, mask } => {
                let face_state = match face {
                    crate::call::StencilFace::Front => &mut self.state.stencil_front,
                    crate::call::StencilFace::Back => &mut self.state.stencil_back,
                };
                face_state.writemask = *mask;
            }
            GlCall::GenerateMipmapHint { mode } => self.state.generate_mipmap_hint = *mode,
            GlCall::PixelStore { param } => match param {
                PixelStoreParam::PackAlignment(v) => self.state.pack_alignment = *v,
                PixelStoreParam::UnpackAlignment(v) => self.state.unpack_alignment = *v,
                PixelStoreParam::UnpackFlipY(v) => self.state.unpack_flip_y = *v,
                PixelStoreParam::UnpackPremultiplyAlpha(v) => {
                    self.state.unpack_premultiply_alpha = *v
                }
                PixelStoreParam::UnpackColorspaceConversion(v) => {
                    self.state.unpack_colorspace_conversion = *v
                }
            },
            // Not a renderer: clears and draws only land in the log.
            GlCall::Clear { .. } | GlCall::DrawArrays { .. } | GlCall::DrawElements { .. } => {}
        }
        Ok(())
    }
}

impl GlBackend for HeadlessGl {
    fn create_object(&mut self, kind: ObjectKind) -> TargetHandle {
        self.next_handle += 1;
        let handle = TargetHandle(self.next_handle);
        self.objects.insert(handle, kind);
        match kind {
            ObjectKind::Buffer => {
                self.buffers.insert(handle, Vec::new());
            }
            ObjectKind::Texture => {
                self.textures.insert(handle, TextureStore::default());
            }
            ObjectKind::Renderbuffer => {
                self.renderbuffers.insert(handle, None);
            }
            ObjectKind::Framebuffer => {
                self.framebuffers.insert(handle, FramebufferStore::default());
            }
            ObjectKind::Program => {
                self.programs.insert(handle, ProgramStore::default());
            }
            ObjectKind::Shader => {}
        }
        handle
    }

    fn delete_object(&mut self, _kind: ObjectKind, handle: TargetHandle) {
        let Some(kind) = self.objects.remove(&handle) else {
            return;
        };
        match kind {
            ObjectKind::Buffer => {
                self.buffers.remove(&handle);
            }
            ObjectKind::Texture => {
                self.textures.remove(&handle);
            }
            ObjectKind::Renderbuffer => {
                self.renderbuffers.remove(&handle);
            }
            ObjectKind::Framebuffer => {
                self.framebuffers.remove(&handle);
            }
            ObjectKind::Program => {
                self.programs.remove(&handle);
            }
            ObjectKind::Shader => {}
        }
        self.scrub_state(handle);
    }

    fn apply(&mut self, call: &GlCall<TargetHandle>) -> Result<(), GlError> {
        self.execute(call)?;
        self.log.push(call.clone());
        Ok(())
    }

    fn framebuffer_binding(&self) -> Option<TargetHandle> {
        self.state.framebuffer
    }

    fn check_framebuffer_status(&self) -> FramebufferStatus {
        let Some(fb) = self.state.framebuffer else {
            // The default surface is always complete.
            return FramebufferStatus::Complete;
        };
        let Some(store) = self.framebuffers.get(&fb) else {
            return FramebufferStatus::Unsupported;
        };
        let attachments: Vec<Attachment> = [store.color, store.depth, store.stencil]
            .into_iter()
            .flatten()
            .collect();
        if attachments.is_empty() {
            return FramebufferStatus::IncompleteMissingAttachment;
        }
        let mut dims: Option<(u32, u32)> = None;
        for attachment in attachments {
            let Some(size) = self.attachment_size(attachment) else {
                return FramebufferStatus::IncompleteAttachment;
            };
            match dims {
                None => dims = Some(size),
                Some(d) if d != size => return FramebufferStatus::IncompleteDimensions,
                Some(_) => {}
            }
        }
        FramebufferStatus::Complete
    }

    fn limits(&self) -> ContextLimits {
        self.limits
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::call::DrawMode;

    fn gl() -> HeadlessGl {
        HeadlessGl::default()
    }

    #[test]
    fn buffer_upload_requires_a_binding() {
        let mut gl = gl();
        let data: Arc<[u8]> = Arc::from(&[1u8, 2, 3][..]);
        let err = gl
            .apply(&GlCall::BufferData {
                target: BufferTarget::Array,
                data: Arc::clone(&data),
                usage: crate::call::BufferUsage::StaticDraw,
            })
            .unwrap_err();
        assert_eq!(
            err,
            GlError::NoBufferBound {
                target: BufferTarget::Array
            }
        );

        let buffer = gl.create_object(ObjectKind::Buffer);
        gl.apply(&GlCall::BindBuffer {
            target: BufferTarget::Array,
            buffer: Some(buffer),
        })
        .unwrap();
        gl.apply(&GlCall::BufferData {
            target: BufferTarget::Array,
            data,
            usage: crate::call::BufferUsage::StaticDraw,
        })
        .unwrap();
        assert_eq!(gl.buffer_contents(buffer), Some(&[1u8, 2, 3][..]));
    }

    #[test]
    fn buffer_sub_data_is_bounds_checked() {
        let mut gl = gl();
        let buffer = gl.create_object(ObjectKind::Buffer);
        gl.apply(&GlCall::BindBuffer {
            target: BufferTarget::Array,
            buffer: Some(buffer),
        })
        .unwrap();
        gl.apply(&GlCall::BufferData {
            target: BufferTarget::Array,
            data: Arc::from(&[0u8; 4][..]),
            usage: crate::call::BufferUsage::StaticDraw,
        })
        .unwrap();

        let err = gl
            .apply(&GlCall::BufferSubData {
                target: BufferTarget::Array,
                offset: 2,
                data: Arc::from(&[9u8; 4][..]),
            })
            .unwrap_err();
        assert!(matches!(err, GlError::BufferRangeOutOfBounds { .. }));

        gl.apply(&GlCall::BufferSubData {
            target: BufferTarget::Array,
            offset: 1,
            data: Arc::from(&[7u8, 8][..]),
        })
        .unwrap();
        assert_eq!(gl.buffer_contents(buffer), Some(&[0u8, 7, 8, 0][..]));
    }

    #[test]
    fn kind_mismatch_on_bind_is_rejected() {
        let mut gl = gl();
        let texture = gl.create_object(ObjectKind::Texture);
        let err = gl
            .apply(&GlCall::BindBuffer {
                target: BufferTarget::Array,
                buffer: Some(texture),
            })
            .unwrap_err();
        assert_eq!(
            err,
            GlError::KindMismatch {
                handle: texture,
                expected: ObjectKind::Buffer,
                actual: ObjectKind::Texture,
            }
        );
    }

    #[test]
    fn uniform_upload_requires_an_active_program() {
        let mut gl = gl();
        let call = GlCall::Uniform {
            name: "u_color".into(),
            value: UniformCall::Float {
                components: 4,
                data: vec![1.0, 0.0, 0.0, 1.0],
            },
        };
        assert_eq!(gl.apply(&call).unwrap_err(), GlError::NoProgramActive);

        let program = gl.create_object(ObjectKind::Program);
        gl.apply(&GlCall::UseProgram {
            program: Some(program),
        })
        .unwrap();
        gl.apply(&call).unwrap();
        assert_eq!(
            gl.program_uniform(program, "u_color"),
            Some(&UniformCall::Float {
                components: 4,
                data: vec![1.0, 0.0, 0.0, 1.0],
            })
        );
    }

    #[test]
    fn framebuffer_completeness_tracks_attachments() {
        let mut gl = gl();
        let fb = gl.create_object(ObjectKind::Framebuffer);
        gl.apply(&GlCall::BindFramebuffer {
            framebuffer: Some(fb),
        })
        .unwrap();
        assert_eq!(
            gl.check_framebuffer_status(),
            FramebufferStatus::IncompleteMissingAttachment
        );

        let texture = gl.create_object(ObjectKind::Texture);
        gl.apply(&GlCall::BindTexture {
            target: TextureTarget::Texture2d,
            texture: Some(texture),
        })
        .unwrap();
        gl.apply(&GlCall::TexImage2d {
            target: TexImageTarget::Texture2d,
            level: 0,
            format: TextureFormat::Rgba,
            width: 8,
            height: 8,
            pixel_type: PixelType::UnsignedByte,
            data: None,
        })
        .unwrap();
        gl.apply(&GlCall::FramebufferTexture2d {
            attachment: FramebufferAttachment::Color0,
            texture: Some(texture),
            level: 0,
        })
        .unwrap();
        assert_eq!(gl.check_framebuffer_status(), FramebufferStatus::Complete);

        // A mismatched depth renderbuffer breaks completeness.
        let rb = gl.create_object(ObjectKind::Renderbuffer);
        gl.apply(&GlCall::BindRenderbuffer {
            renderbuffer: Some(rb),
        })
        .unwrap();
        gl.apply(&GlCall::RenderbufferStorage {
            format: RenderbufferFormat::DepthComponent16,
            width: 4,
            height: 4,
        })
        .unwrap();
        gl.apply(&GlCall::FramebufferRenderbuffer {
            attachment: FramebufferAttachment::Depth,
            renderbuffer: Some(rb),
        })
        .unwrap();
        assert_eq!(
            gl.check_framebuffer_status(),
            FramebufferStatus::IncompleteDimensions
        );
    }

    #[test]
    fn deleting_an_object_scrubs_live_bindings() {
        let mut gl = gl();
        let buffer = gl.create_object(ObjectKind::Buffer);
        gl.apply(&GlCall::BindBuffer {
            target: BufferTarget::Array,
            buffer: Some(buffer),
        })
        .unwrap();
        gl.delete_object(ObjectKind::Buffer, buffer);
        assert!(!gl.is_live(buffer));
        assert_eq!(gl.state().array_buffer, None);
    }

    #[test]
    fn draws_are_logged_but_mutate_nothing() {
        let mut gl = gl();
        let before = gl.state().clone();
        gl.apply(&GlCall::DrawArrays {
            mode: DrawMode::Triangles,
            first: 0,
            count: 3,
        })
        .unwrap();
        assert_eq!(gl.state(), &before);
        assert_eq!(gl.call_log().len(), 1);
    }

    #[test]
    fn vertex_attrib_pointer_captures_current_array_buffer() {
        let mut gl = gl();
        let buffer = gl.create_object(ObjectKind::Buffer);
        gl.apply(&GlCall::BindBuffer {
            target: BufferTarget::Array,
            buffer: Some(buffer),
        })
        .unwrap();
        gl.apply(&GlCall::VertexAttribPointer {
            index: 1,
            size: 3,
            ty: crate::call::VertexAttribType::Float,
            normalized: false,
            stride: 12,
            offset: 0,
        })
        .unwrap();
        let attrib = &gl.state().vertex_attribs[1];
        assert_eq!(attrib.array_buffer, Some(buffer));
        assert_eq!(attrib.size, 3);
    }
}
