//! Fully enumerated global-state snapshot and the pure state applier.
//!
//! The target API is one big ambient state machine; this module pins it down
//! as an explicit structure instead. [`state_commands`] is the applier: a pure
//! function from a snapshot to the ordered call sequence that reproduces it
//! exactly on a live context. Applying the same snapshot twice yields the
//! same observable state.

use crate::backend::ContextLimits;
use crate::call::{
    BlendEquation, BlendFactor, BufferTarget, Capability, CompareFunc, CullFaceMode, GlCall,
    HintMode, PixelStoreParam, StencilFace, StencilOp, TextureTarget, VertexAttribType,
    WindingOrder,
};

/// One texture unit's 2D and cube-map bindings.
#[derive(Clone, Debug, PartialEq)]
pub struct TextureUnit<R> {
    pub binding_2d: Option<R>,
    pub binding_cube: Option<R>,
}

impl<R> Default for TextureUnit<R> {
    fn default() -> Self {
        Self {
            binding_2d: None,
            binding_cube: None,
        }
    }
}

/// One vertex attribute's complete state.
#[derive(Clone, Debug, PartialEq)]
pub struct VertexAttrib<R> {
    pub enabled: bool,
    pub current_value: [f32; 4],
    /// The array buffer captured by the attribute's pointer.
    pub array_buffer: Option<R>,
    pub size: i32,
    pub ty: VertexAttribType,
    pub normalized: bool,
    pub stride: i32,
    pub offset: usize,
}

impl<R> Default for VertexAttrib<R> {
    fn default() -> Self {
        Self {
            enabled: false,
            current_value: [0.0, 0.0, 0.0, 1.0],
            array_buffer: None,
            size: 4,
            ty: VertexAttribType::Float,
            normalized: false,
            stride: 0,
            offset: 0,
        }
    }
}

/// Stencil parameters for one face.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct StencilFaceState {
    pub func: CompareFunc,
    pub reference: i32,
    pub value_mask: u32,
    pub fail: StencilOp,
    pub depth_fail: StencilOp,
    pub depth_pass: StencilOp,
    pub writemask: u32,
}

impl Default for StencilFaceState {
    fn default() -> Self {
        Self {
            func: CompareFunc::Always,
            reference: 0,
            value_mask: u32::MAX,
            fail: StencilOp::Keep,
            depth_fail: StencilOp::Keep,
            depth_pass: StencilOp::Keep,
            writemask: u32::MAX,
        }
    }
}

/// Complete snapshot of the context's global state.
///
/// `R` is the resource-reference type, as for [`GlCall`]: captured frames
/// hold logical identities, a live backend holds target handles.
#[derive(Clone, Debug, PartialEq)]
pub struct StateSnapshot<R> {
    pub framebuffer: Option<R>,
    pub renderbuffer: Option<R>,
    pub array_buffer: Option<R>,
    pub element_array_buffer: Option<R>,
    pub current_program: Option<R>,

    pub viewport: [i32; 4],

    pub color_clear_value: [f32; 4],
    pub color_writemask: [bool; 4],

    pub depth_test: bool,
    pub depth_clear_value: f32,
    pub depth_func: CompareFunc,
    pub depth_range: [f32; 2],
    pub depth_writemask: bool,

    pub blend: bool,
    pub blend_color: [f32; 4],
    pub blend_equation_rgb: BlendEquation,
    pub blend_equation_alpha: BlendEquation,
    pub blend_src_rgb: BlendFactor,
    pub blend_dst_rgb: BlendFactor,
    pub blend_src_alpha: BlendFactor,
    pub blend_dst_alpha: BlendFactor,

    pub cull_face: bool,
    pub cull_face_mode: CullFaceMode,
    pub front_face: WindingOrder,

    pub line_width: f32,

    pub polygon_offset_fill: bool,
    pub polygon_offset_factor: f32,
    pub polygon_offset_units: f32,

    pub sample_coverage_enabled: bool,
    pub sample_alpha_to_coverage: bool,
    pub sample_coverage_value: f32,
    pub sample_coverage_invert: bool,

    pub scissor_test: bool,
    pub scissor_box: [i32; 4],

    pub stencil_test: bool,
    pub stencil_clear_value: i32,
    pub stencil_front: StencilFaceState,
    pub stencil_back: StencilFaceState,

    pub generate_mipmap_hint: HintMode,

    pub pack_alignment: i32,
    pub unpack_alignment: i32,
    pub unpack_colorspace_conversion: bool,
    pub unpack_flip_y: bool,
    pub unpack_premultiply_alpha: bool,

    pub active_texture: u32,
    pub texture_units: Vec<TextureUnit<R>>,
    pub vertex_attribs: Vec<VertexAttrib<R>>,
}

impl<R> StateSnapshot<R> {
    /// The API's documented initial state, sized to `limits`.
    pub fn initial(limits: &ContextLimits) -> Self {
        Self {
            framebuffer: None,
            renderbuffer: None,
            array_buffer: None,
            element_array_buffer: None,
            current_program: None,
            viewport: [0, 0, 0, 0],
            color_clear_value: [0.0; 4],
            color_writemask: [true; 4],
            depth_test: false,
            depth_clear_value: 1.0,
            depth_func: CompareFunc::Less,
            depth_range: [0.0, 1.0],
            depth_writemask: true,
            blend: false,
            blend_color: [0.0; 4],
            blend_equation_rgb: BlendEquation::Add,
            blend_equation_alpha: BlendEquation::Add,
            blend_src_rgb: BlendFactor::One,
            blend_dst_rgb: BlendFactor::Zero,
            blend_src_alpha: BlendFactor::One,
            blend_dst_alpha: BlendFactor::Zero,
            cull_face: false,
            cull_face_mode: CullFaceMode::Back,
            front_face: WindingOrder::Ccw,
            line_width: 1.0,
            polygon_offset_fill: false,
            polygon_offset_factor: 0.0,
            polygon_offset_units: 0.0,
            sample_coverage_enabled: false,
            sample_alpha_to_coverage: false,
            sample_coverage_value: 1.0,
            sample_coverage_invert: false,
            scissor_test: false,
            scissor_box: [0, 0, 0, 0],
            stencil_test: false,
            stencil_clear_value: 0,
            stencil_front: StencilFaceState::default(),
            stencil_back: StencilFaceState::default(),
            generate_mipmap_hint: HintMode::DontCare,
            pack_alignment: 4,
            unpack_alignment: 4,
            unpack_colorspace_conversion: true,
            unpack_flip_y: false,
            unpack_premultiply_alpha: false,
            active_texture: 0,
            texture_units: (0..limits.max_texture_units)
                .map(|_| TextureUnit::default())
                .collect(),
            vertex_attribs: (0..limits.max_vertex_attribs)
                .map(|_| VertexAttrib::default())
                .collect(),
        }
    }

    /// Rewrite every resource reference through `f`, as
    /// [`GlCall::map_resources`] does for calls.
    pub fn map_resources<T, E>(
        &self,
        mut f: impl FnMut(crate::backend::ObjectKind, &R) -> Result<T, E>,
    ) -> Result<StateSnapshot<T>, E> {
        use crate::backend::ObjectKind;

        fn map_opt<R, T, E>(
            kind: crate::backend::ObjectKind,
            reference: &Option<R>,
            f: &mut impl FnMut(crate::backend::ObjectKind, &R) -> Result<T, E>,
        ) -> Result<Option<T>, E> {
            reference.as_ref().map(|r| f(kind, r)).transpose()
        }

        let texture_units = self
            .texture_units
            .iter()
            .map(|unit| {
                Ok(TextureUnit {
                    binding_2d: map_opt(ObjectKind::Texture, &unit.binding_2d, &mut f)?,
                    binding_cube: map_opt(ObjectKind::Texture, &unit.binding_cube, &mut f)?,
                })
            })
            .collect::<Result<Vec<_>, E>>()?;
        let vertex_attribs = self
            .vertex_attribs
            .iter()
            .map(|attrib| {
                Ok(VertexAttrib {
                    enabled: attrib.enabled,
                    current_value: attrib.current_value,
                    array_buffer: map_opt(ObjectKind::Buffer, &attrib.array_buffer, &mut f)?,
                    size: attrib.size,
                    ty: attrib.ty,
                    normalized: attrib.normalized,
                    stride: attrib.stride,
                    offset: attrib.offset,
                })
            })
            .collect::<Result<Vec<_>, E>>()?;

        Ok(StateSnapshot {
            framebuffer: map_opt(ObjectKind::Framebuffer, &self.framebuffer, &mut f)?,
            renderbuffer: map_opt(ObjectKind::Renderbuffer, &self.renderbuffer, &mut f)?,
            array_buffer: map_opt(ObjectKind::Buffer, &self.array_buffer, &mut f)?,
            element_array_buffer: map_opt(ObjectKind::Buffer, &self.element_array_buffer, &mut f)?,
            current_program: map_opt(ObjectKind::Program, &self.current_program, &mut f)?,
            viewport: self.viewport,
            color_clear_value: self.color_clear_value,
            color_writemask: self.color_writemask,
            depth_test: self.depth_test,
            depth_clear_value: self.depth_clear_value,
            depth_func: self.depth_func,
            depth_range: self.depth_range,
            depth_writemask: self.depth_writemask,
            blend: self.blend,
            blend_color: self.blend_color,
            blend_equation_rgb: self.blend_equation_rgb,
            blend_equation_alpha: self.blend_equation_alpha,
            blend_src_rgb: self.blend_src_rgb,
            blend_dst_rgb: self.blend_dst_rgb,
            blend_src_alpha: self.blend_src_alpha,
            blend_dst_alpha: self.blend_dst_alpha,
            cull_face: self.cull_face,
            cull_face_mode: self.cull_face_mode,
            front_face: self.front_face,
            line_width: self.line_width,
            polygon_offset_fill: self.polygon_offset_fill,
            polygon_offset_factor: self.polygon_offset_factor,
            polygon_offset_units: self.polygon_offset_units,
            sample_coverage_enabled: self.sample_coverage_enabled,
            sample_alpha_to_coverage: self.sample_alpha_to_coverage,
            sample_coverage_value: self.sample_coverage_value,
            sample_coverage_invert: self.sample_coverage_invert,
            scissor_test: self.scissor_test,
            scissor_box: self.scissor_box,
            stencil_test: self.stencil_test,
            stencil_clear_value: self.stencil_clear_value,
            stencil_front: self.stencil_front,
            stencil_back: self.stencil_back,
            generate_mipmap_hint: self.generate_mipmap_hint,
            pack_alignment: self.pack_alignment,
            unpack_alignment: self.unpack_alignment,
            unpack_colorspace_conversion: self.unpack_colorspace_conversion,
            unpack_flip_y: self.unpack_flip_y,
            unpack_premultiply_alpha: self.unpack_premultiply_alpha,
            active_texture: self.active_texture,
            texture_units,
            vertex_attribs,
        })
    }
}

fn toggle<R>(out: &mut Vec<GlCall<R>>, cap: Capability, enabled: bool) {
    if enabled {
        out.push(GlCall::Enable { cap });
    } else {
        out.push(GlCall::Disable { cap });
    }
}

/// The ordered call sequence that makes a live context match `state` exactly.
///
/// Texture units and vertex attributes are applied up to `limits`; both
/// binding arms of every unit are re-issued so a stale binding from an
/// earlier replay cannot survive the reset.
pub fn state_commands<R: Clone>(
    state: &StateSnapshot<R>,
    limits: &ContextLimits,
) -> Vec<GlCall<R>> {
    let mut out = Vec::new();

    out.push(GlCall::BindFramebuffer {
        framebuffer: state.framebuffer.clone(),
    });
    out.push(GlCall::BindRenderbuffer {
        renderbuffer: state.renderbuffer.clone(),
    });

    out.push(GlCall::Viewport {
        x: state.viewport[0],
        y: state.viewport[1],
        width: state.viewport[2],
        height: state.viewport[3],
    });

    out.push(GlCall::ClearColor {
        value: state.color_clear_value,
    });
    out.push(GlCall::ColorMask {
        mask: state.color_writemask,
    });

    toggle(&mut out, Capability::DepthTest, state.depth_test);
    out.push(GlCall::ClearDepth {
        value: state.depth_clear_value,
    });
    out.push(GlCall::DepthFunc {
        func: state.depth_func,
    });
    out.push(GlCall::DepthRange {
        near: state.depth_range[0],
        far: state.depth_range[1],
    });
    out.push(GlCall::DepthMask {
        flag: state.depth_writemask,
    });

    toggle(&mut out, Capability::Blend, state.blend);
    out.push(GlCall::BlendColor {
        value: state.blend_color,
    });
    out.push(GlCall::BlendEquationSeparate {
        rgb: state.blend_equation_rgb,
        alpha: state.blend_equation_alpha,
    });
    out.push(GlCall::BlendFuncSeparate {
        src_rgb: state.blend_src_rgb,
        dst_rgb: state.blend_dst_rgb,
        src_alpha: state.blend_src_alpha,
        dst_alpha: state.blend_dst_alpha,
    });

    toggle(&mut out, Capability::CullFace, state.cull_face);
    out.push(GlCall::CullFace {
        mode: state.cull_face_mode,
    });
    out.push(GlCall::FrontFace {
        mode: state.front_face,
    });

    out.push(GlCall::LineWidth {
        width: state.line_width,
    });

    toggle(
        &mut out,
        Capability::PolygonOffsetFill,
        state.polygon_offset_fill,
    );
    out.push(GlCall::PolygonOffset {
        factor: state.polygon_offset_factor,
        units: state.polygon_offset_units,
    });

    toggle(
        &mut out,
        Capability::SampleCoverage,
        state.sample_coverage_enabled,
    );
    toggle(
        &mut out,
        Capability::SampleAlphaToCoverage,
        state.sample_alpha_to_coverage,
    );
    out.push(GlCall::SampleCoverage {
        value: state.sample_coverage_value,
        invert: state.sample_coverage_invert,
    });

    toggle(&mut out, Capability::ScissorTest, state.scissor_test);
    out.push(GlCall::Scissor {
        x: state.scissor_box[0],
        y: state.scissor_box[1],
        width: state.scissor_box[2],
        height: state.scissor_box[3],
    });

    toggle(&mut out, Capability::StencilTest, state.stencil_test);
    out.push(GlCall::ClearStencil {
        value: state.stencil_clear_value,
    });
    for (face, face_state) in [
        (StencilFace::Front, &state.stencil_front),
        (StencilFace::Back, &state.stencil_back),
    ] {
        out.push(GlCall::StencilFuncSeparate {
            face,
            func: face_state.func,
            reference: face_state.reference,
            mask: face_state.value_mask,
        });
        out.push(GlCall::StencilOpSeparate {
            face,
            fail: face_state.fail,
            depth_fail: face_state.depth_fail,
            depth_pass: face_state.depth_pass,
        });
        out.push(GlCall::StencilMaskSeparate {
            face,
            mask: face_state.writemask,
        });
    }

    out.push(GlCall::GenerateMipmapHint {
        mode: state.generate_mipmap_hint,
    });

    out.push(GlCall::PixelStore {
        param: PixelStoreParam::PackAlignment(state.pack_alignment),
    });
    out.push(GlCall::PixelStore {
        param: PixelStoreParam::UnpackAlignment(state.unpack_alignment),
    });
    out.push(GlCall::PixelStore {
        param: PixelStoreParam::UnpackColorspaceConversion(state.unpack_colorspace_conversion),
    });
    out.push(GlCall::PixelStore {
        param: PixelStoreParam::UnpackFlipY(state.unpack_flip_y),
    });
    out.push(GlCall::PixelStore {
        param: PixelStoreParam::UnpackPremultiplyAlpha(state.unpack_premultiply_alpha),
    });

    out.push(GlCall::UseProgram {
        program: state.current_program.clone(),
    });

    for (n, unit) in state
        .texture_units
        .iter()
        .take(limits.max_texture_units as usize)
        .enumerate()
    {
        out.push(GlCall::ActiveTexture { unit: n as u32 });
        out.push(GlCall::BindTexture {
            target: TextureTarget::Texture2d,
            texture: unit.binding_2d.clone(),
        });
        out.push(GlCall::BindTexture {
            target: TextureTarget::CubeMap,
            texture: unit.binding_cube.clone(),
        });
    }
    out.push(GlCall::ActiveTexture {
        unit: state.active_texture,
    });

    for (n, attrib) in state
        .vertex_attribs
        .iter()
        .take(limits.max_vertex_attribs as usize)
        .enumerate()
    {
        let index = n as u32;
        out.push(GlCall::VertexAttrib4f {
            index,
            value: attrib.current_value,
        });
        if attrib.enabled {
            out.push(GlCall::EnableVertexAttribArray { index });
        } else {
            out.push(GlCall::DisableVertexAttribArray { index });
        }
        out.push(GlCall::BindBuffer {
            target: BufferTarget::Array,
            buffer: attrib.array_buffer.clone(),
        });
        out.push(GlCall::VertexAttribPointer {
            index,
            size: attrib.size,
            ty: attrib.ty,
            normalized: attrib.normalized,
            stride: attrib.stride,
            offset: attrib.offset,
        });
    }

    out.push(GlCall::BindBuffer {
        target: BufferTarget::Array,
        buffer: state.array_buffer.clone(),
    });
    out.push(GlCall::BindBuffer {
        target: BufferTarget::ElementArray,
        buffer: state.element_array_buffer.clone(),
    });

    out
}
