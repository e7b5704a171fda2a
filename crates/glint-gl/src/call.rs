//! Backend-agnostic representation of a single WebGL-class API call.
//!
//! [`GlCall`] is a closed enum with one variant per supported operation. It is
//! generic over the resource-reference type `R`: a capture stores calls with
//! logical resource identities, and replay rewrites them to live object
//! handles via [`GlCall::map_resources`] before handing them to a backend.
//! Unsupported operations therefore fail at compile time rather than at
//! dispatch time.

use std::sync::Arc;

use bitflags::bitflags;

use crate::backend::ObjectKind;
use crate::uniform::UniformCall;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum BufferTarget {
    Array,
    ElementArray,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum BufferUsage {
    StaticDraw,
    DynamicDraw,
    StreamDraw,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum TextureTarget {
    Texture2d,
    CubeMap,
}

/// Upload target for a 2D image: either the 2D texture target or one cube
/// map face of the cube target.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum TexImageTarget {
    Texture2d,
    CubeMapPositiveX,
    CubeMapNegativeX,
    CubeMapPositiveY,
    CubeMapNegativeY,
    CubeMapPositiveZ,
    CubeMapNegativeZ,
}

impl TexImageTarget {
    /// The texture binding target this upload goes through.
    pub fn binding_target(self) -> TextureTarget {
        match self {
            TexImageTarget::Texture2d => TextureTarget::Texture2d,
            _ => TextureTarget::CubeMap,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum TextureFormat {
    Rgba,
    Rgb,
    Alpha,
    Luminance,
    LuminanceAlpha,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum PixelType {
    UnsignedByte,
    UnsignedShort565,
    UnsignedShort4444,
    UnsignedShort5551,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum TextureFilter {
    Nearest,
    Linear,
    NearestMipmapNearest,
    LinearMipmapNearest,
    NearestMipmapLinear,
    LinearMipmapLinear,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum TextureWrap {
    ClampToEdge,
    Repeat,
    MirroredRepeat,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum TextureParameter {
    MinFilter(TextureFilter),
    MagFilter(TextureFilter),
    WrapS(TextureWrap),
    WrapT(TextureWrap),
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum RenderbufferFormat {
    DepthComponent16,
    StencilIndex8,
    Rgba4,
    Rgb565,
    Rgb5A1,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum FramebufferAttachment {
    Color0,
    Depth,
    Stencil,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum DrawMode {
    Points,
    Lines,
    LineLoop,
    LineStrip,
    Triangles,
    TriangleStrip,
    TriangleFan,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum IndexType {
    UnsignedByte,
    UnsignedShort,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum CompareFunc {
    Never,
    Less,
    Equal,
    Lequal,
    Greater,
    Notequal,
    Gequal,
    Always,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum BlendEquation {
    Add,
    Subtract,
    ReverseSubtract,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum BlendFactor {
    Zero,
    One,
    SrcColor,
    OneMinusSrcColor,
    DstColor,
    OneMinusDstColor,
    SrcAlpha,
    OneMinusSrcAlpha,
    DstAlpha,
    OneMinusDstAlpha,
    ConstantColor,
    OneMinusConstantColor,
    ConstantAlpha,
    OneMinusConstantAlpha,
    SrcAlphaSaturate,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum CullFaceMode {
    Front,
    Back,
    FrontAndBack,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum WindingOrder {
    Cw,
    Ccw,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum StencilOp {
    Keep,
    Zero,
    Replace,
    Incr,
    IncrWrap,
    Decr,
    DecrWrap,
    Invert,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum StencilFace {
    Front,
    Back,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum HintMode {
    Fastest,
    Nicest,
    DontCare,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum VertexAttribType {
    Byte,
    UnsignedByte,
    Short,
    UnsignedShort,
    Float,
}

/// Capabilities toggled by `Enable`/`Disable`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Capability {
    Blend,
    CullFace,
    DepthTest,
    PolygonOffsetFill,
    SampleAlphaToCoverage,
    SampleCoverage,
    ScissorTest,
    StencilTest,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum PixelStoreParam {
    PackAlignment(i32),
    UnpackAlignment(i32),
    UnpackFlipY(bool),
    UnpackPremultiplyAlpha(bool),
    UnpackColorspaceConversion(bool),
}

bitflags! {
    /// Buffer-clear mask for the `Clear` call.
    #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
    pub struct ClearMask: u32 {
        const COLOR = 1 << 0;
        const DEPTH = 1 << 1;
        const STENCIL = 1 << 2;
    }
}

/// One recorded (or resolved) API call.
///
/// `R` is the resource-reference type: a logical resource identity in a
/// captured frame, a live [`TargetHandle`](crate::backend::TargetHandle) once
/// resolved for a backend.
#[derive(Clone, Debug, PartialEq)]
pub enum GlCall<R> {
    // Framebuffers and renderbuffers.
    BindFramebuffer {
        framebuffer: Option<R>,
    },
    BindRenderbuffer {
        renderbuffer: Option<R>,
    },
    FramebufferTexture2d {
        attachment: FramebufferAttachment,
        texture: Option<R>,
        level: i32,
    },
    FramebufferRenderbuffer {
        attachment: FramebufferAttachment,
        renderbuffer: Option<R>,
    },
    RenderbufferStorage {
        format: RenderbufferFormat,
        width: u32,
        height: u32,
    },

    // Buffers.
    BindBuffer {
        target: BufferTarget,
        buffer: Option<R>,
    },
    BufferData {
        target: BufferTarget,
        data: Arc<[u8]>,
        usage: BufferUsage,
    },
    BufferSubData {
        target: BufferTarget,
        offset: usize,
        data: Arc<[u8]>,
    },

    // Textures.
    ActiveTexture {
        unit: u32,
    },
    BindTexture {
        target: TextureTarget,
        texture: Option<R>,
    },
    TexImage2d {
        target: TexImageTarget,
        level: i32,
        format: TextureFormat,
        width: u32,
        height: u32,
        pixel_type: PixelType,
        /// `None` allocates storage without defining contents.
        data: Option<Arc<[u8]>>,
    },
    TexSubImage2d {
        target: TexImageTarget,
        level: i32,
        x: u32,
        y: u32,
        width: u32,
        height: u32,
        format: TextureFormat,
        pixel_type: PixelType,
        data: Arc<[u8]>,
    },
    TexParameter {
        target: TextureTarget,
        param: TextureParameter,
    },
    GenerateMipmap {
        target: TextureTarget,
    },

    // Programs and uniforms.
    UseProgram {
        program: Option<R>,
    },
    /// A type-resolved uniform upload against the active program.
    Uniform {
        name: String,
        value: UniformCall,
    },

    // Vertex attributes.
    EnableVertexAttribArray {
        index: u32,
    },
    DisableVertexAttribArray {
        index: u32,
    },
    VertexAttribPointer {
        index: u32,
        size: i32,
        ty: VertexAttribType,
        normalized: bool,
        stride: i32,
        offset: usize,
    },
    VertexAttrib4f {
        index: u32,
        value: [f32; 4],
    },

    // Fixed-function state.
    Enable {
        cap: Capability,
    },
    Disable {
        cap: Capability,
    },
    Viewport {
        x: i32,
        y: i32,
        width: i32,
        height: i32,
    },
    DepthRange {
        near: f32,
        far: f32,
    },
    ClearColor {
        value: [f32; 4],
    },
    ClearDepth {
        value: f32,
    },
    ClearStencil {
        value: i32,
    },
    ColorMask {
        mask: [bool; 4],
    },
    DepthMask {
        flag: bool,
    },
    DepthFunc {
        func: CompareFunc,
    },
    BlendColor {
        value: [f32; 4],
    },
    BlendEquationSeparate {
        rgb: BlendEquation,
        alpha: BlendEquation,
    },
    BlendFuncSeparate {
        src_rgb: BlendFactor,
        dst_rgb: BlendFactor,
        src_alpha: BlendFactor,
        dst_alpha: BlendFactor,
    },
    CullFace {
        mode: CullFaceMode,
    },
    FrontFace {
        mode: WindingOrder,
    },
    LineWidth {
        width: f32,
    },
    PolygonOffset {
        factor: f32,
        units: f32,
    },
    SampleCoverage {
        value: f32,
        invert: bool,
    },
    Scissor {
        x: i32,
        y: i32,
        width: i32,
        height: i32,
    },
    StencilFuncSeparate {
        face: StencilFace,
        func: CompareFunc,
        reference: i32,
        mask: u32,
    },
    StencilOpSeparate {
        face: StencilFace,
        fail: StencilOp,
        depth_fail: StencilOp,
        depth_pass: StencilOp,
    },
    StencilMaskSeparate {
        face: StencilFace,
        mask: u32,
    },
    GenerateMipmapHint {
        mode: HintMode,
    },
    PixelStore {
        param: PixelStoreParam,
    },

    // Clears and draws.
    Clear {
        mask: ClearMask,
    },
    DrawArrays {
        mode: DrawMode,
        first: i32,
        count: i32,
    },
    DrawElements {
        mode: DrawMode,
        count: i32,
        index_type: IndexType,
        offset: usize,
    },
}

impl<R> GlCall<R> {
    /// True exactly for the two draw-class calls.
    pub fn is_draw(&self) -> bool {
        matches!(self, GlCall::DrawArrays { .. } | GlCall::DrawElements { .. })
    }

    /// Rewrite every resource reference through `f`, producing the same call
    /// shape over a different reference type.
    ///
    /// `f` receives the object kind expected at each reference position. An
    /// absent reference (the unbound sentinel) is preserved without calling
    /// `f`.
    pub fn map_resources<T, E>(
        &self,
        mut f: impl FnMut(ObjectKind, &R) -> Result<T, E>,
    ) -> Result<GlCall<T>, E> {
        fn map_opt<R, T, E>(
            kind: ObjectKind,
            reference: &Option<R>,
            f: &mut impl FnMut(ObjectKind, &R) -> Result<T, E>,
        ) -> Result<Option<T>, E> {
            reference.as_ref().map(|r| f(kind, r)).transpose()
        }

        Ok(match self {
            GlCall::BindFramebuffer { framebuffer } => GlCall::BindFramebuffer {
                framebuffer: map_opt(ObjectKind::Framebuffer, framebuffer, &mut f)?,
            },
            GlCall::BindRenderbuffer { renderbuffer } => GlCall::BindRenderbuffer {
                renderbuffer: map_opt(ObjectKind::Renderbuffer, renderbuffer, &mut f)?,
            },
            GlCall::FramebufferTexture2d {
                attachment,
                texture,
                level,
            } => GlCall::FramebufferTexture2d {
                attachment: *attachment,
                texture: map_opt(ObjectKind::Texture, texture, &mut f)?,
                level: *level,
            },
            GlCall::FramebufferRenderbuffer {
                attachment,
                renderbuffer,
            } => GlCall::FramebufferRenderbuffer {
                attachment: *attachment,
                renderbuffer: map_opt(ObjectKind::Renderbuffer, renderbuffer, &mut f)?,
            },
            GlCall::RenderbufferStorage {
                format,
                width,
                height,
            } => GlCall::RenderbufferStorage {
                format: *format,
                width: *width,
                height: *height,
            },
            GlCall::BindBuffer { target, buffer } => GlCall::BindBuffer {
                target: *target,
                buffer: map_opt(ObjectKind::Buffer, buffer, &mut f)?,
            },
            GlCall::BufferData {
                target,
                data,
                usage,
            } => GlCall::BufferData {
                target: *target,
                data: Arc::clone(data),
                usage: *usage,
            },
            GlCall::BufferSubData {
                target,
                offset,
                data,
            } => GlCall::BufferSubData {
                target: *target,
                offset: *offset,
                data: Arc::clone(data),
            },
            GlCall::ActiveTexture { unit } => GlCall::ActiveTexture { unit: *unit },
            GlCall::BindTexture { target, texture } => GlCall::BindTexture {
                target: *target,
                texture: map_opt(ObjectKind::Texture, texture, &mut f)?,
            },
            GlCall::TexImage2d {
                target,
                level,
                format,
                width,
                height,
                pixel_type,
                data,
            } => GlCall::TexImage2d {
                target: *target,
                level: *level,
                format: *format,
                width: *width,
                height: *height,
                pixel_type: *pixel_type,
                data: data.as_ref().map(Arc::clone),
            },
            GlCall::TexSubImage2d {
                target,
                level,
                x,
                y,
                width,
                height,
                format,
                pixel_type,
                data,
            } => GlCall::TexSubImage2d {
                target: *target,
                level: *level,
                x: *x,
                y: *y,
                width: *width,
                height: *height,
                format: *format,
                pixel_type: *pixel_type,
                data: Arc::clone(data),
            },
            GlCall::TexParameter { target, param } => GlCall::TexParameter {
                target: *target,
                param: *param,
            },
            GlCall::GenerateMipmap { target } => GlCall::GenerateMipmap { target: *target },
            GlCall::UseProgram { program } => GlCall::UseProgram {
                program: map_opt(ObjectKind::Program, program, &mut f)?,
            },
            GlCall::Uniform { name, value } => GlCall::Uniform {
                name: name.clone(),
                value: value.clone(),
            },
            GlCall::EnableVertexAttribArray { index } => {
                GlCall::EnableVertexAttribArray { index: *index }
            }
            GlCall::DisableVertexAttribArray { index } => {
                GlCall::DisableVertexAttribArray { index: *index }
            }
            GlCall::VertexAttribPointer {
                index,
                size,
                ty,
                normalized,
                stride,
                offset,
            } => GlCall::VertexAttribPointer {
                index: *index,
                size: *size,
                ty: *ty,
                normalized: *normalized,
                stride: *stride,
                offset: *offset,
            },
            GlCall::VertexAttrib4f { index, value } => GlCall::VertexAttrib4f {
                index: *index,
                value: *value,
            },
            GlCall::Enable { cap } => GlCall::Enable { cap: *cap },
            GlCall::Disable { cap } => GlCall::Disable { cap: *cap },
            GlCall::Viewport {
                x,
                y,
                width,
                height,
            } => GlCall::Viewport {
                x: *x,
                y: *y,
                width: *width,
                height: *height,
            },
            GlCall::DepthRange { near, far } => GlCall::DepthRange {
                near: *near,
                far: *far,
            },
            GlCall::ClearColor { value } => GlCall::ClearColor { value: *value },
            GlCall::ClearDepth { value } => GlCall::ClearDepth { value: *value },
            GlCall::ClearStencil { value } => GlCall::ClearStencil { value: *value },
            GlCall::ColorMask { mask } => GlCall::ColorMask { mask: *mask },
            GlCall::DepthMask { flag } => GlCall::DepthMask { flag: *flag },
            GlCall::DepthFunc { func } => GlCall::DepthFunc { func: *func },
            GlCall::BlendColor { value } => GlCall::BlendColor { value: *value },
            GlCall::BlendEquationSeparate { rgb, alpha } => GlCall::BlendEquationSeparate {
                rgb: *rgb,
                alpha: *alpha,
            },
            GlCall::BlendFuncSeparate {
                src_rgb,
                dst_rgb,
                src_alpha,
                dst_alpha,
            } => GlCall::BlendFuncSeparate {
                src_rgb: *src_rgb,
                dst_rgb: *dst_rgb,
                src_alpha: *src_alpha,
                dst_alpha: *dst_alpha,
            },
            GlCall::CullFace { mode } => GlCall::CullFace { mode: *mode },
            GlCall::FrontFace { mode } => GlCall::FrontFace { mode: *mode },
            GlCall::LineWidth { width } => GlCall::LineWidth { width: *width },
            GlCall::PolygonOffset { factor, units } => GlCall::PolygonOffset {
                factor: *factor,
                units: *units,
            },
            GlCall::SampleCoverage { value, invert } => GlCall::SampleCoverage {
                value: *value,
                invert: *invert,
            },
            GlCall::Scissor {
                x,
                y,
                width,
                height,
            } => GlCall::Scissor {
                x: *x,
                y: *y,
                width: *width,
                height: *height,
            },
            GlCall::StencilFuncSeparate {
                face,
                func,
                reference,
                mask,
            } => GlCall::StencilFuncSeparate {
                face: *face,
                func: *func,
                reference: *reference,
                mask: *mask,
            },
            GlCall::StencilOpSeparate {
                face,
                fail,
                depth_fail,
                depth_pass,
            } => GlCall::StencilOpSeparate {
                face: *face,
                fail: *fail,
                depth_fail: *depth_fail,
                depth_pass: *depth_pass,
            },
            GlCall::StencilMaskSeparate { face, mask } => GlCall::StencilMaskSeparate {
                face: *face,
                mask: *mask,
            },
            GlCall::GenerateMipmapHint { mode } => GlCall::GenerateMipmapHint { mode: *mode },
            GlCall::PixelStore { param } => GlCall::PixelStore { param: *param },
            GlCall::Clear { mask } => GlCall::Clear { mask: *mask },
            GlCall::DrawArrays { mode, first, count } => GlCall::DrawArrays {
                mode: *mode,
                first: *first,
                count: *count,
            },
            GlCall::DrawElements {
                mode,
                count,
                index_type,
                offset,
            } => GlCall::DrawElements {
                mode: *mode,
                count: *count,
                index_type: *index_type,
                offset: *offset,
            },
        })
    }
}
