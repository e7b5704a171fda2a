//! Offscreen render-target lifecycle.
//!
//! Each playback session owns at most one offscreen color (+ optional
//! depth/stencil) target matching the captured surface's attributes. Resets
//! reuse the existing target when the dimensions and all three formats match
//! (clearing the color contents in place); any mismatch fully releases the
//! old objects before allocating new ones.

use glint_gl::call::{
    FramebufferAttachment, GlCall, PixelType, RenderbufferFormat, TexImageTarget, TextureFormat,
    TextureTarget,
};
use glint_gl::{FramebufferStatus, GlBackend, GlError, ObjectKind, TargetHandle};
use tracing::{debug, warn};

use crate::frame::CanvasInfo;

/// An owned offscreen surface.
#[derive(Clone, Copy, Debug)]
pub struct RenderTarget {
    pub width: u32,
    pub height: u32,
    pub color_format: TextureFormat,
    pub depth_format: Option<RenderbufferFormat>,
    pub stencil_format: Option<RenderbufferFormat>,
    pub framebuffer: TargetHandle,
    pub color_texture: TargetHandle,
    depth_buffer: Option<TargetHandle>,
    stencil_buffer: Option<TargetHandle>,
}

impl RenderTarget {
    fn matches(
        &self,
        width: u32,
        height: u32,
        color_format: TextureFormat,
        depth_format: Option<RenderbufferFormat>,
        stencil_format: Option<RenderbufferFormat>,
    ) -> bool {
        self.width == width
            && self.height == height
            && self.color_format == color_format
            && self.depth_format == depth_format
            && self.stencil_format == stencil_format
    }
}

#[derive(Default)]
pub struct RenderTargetManager {
    target: Option<RenderTarget>,
}

impl RenderTargetManager {
    pub fn target(&self) -> Option<&RenderTarget> {
        self.target.as_ref()
    }

    /// Ensure a target matching `canvas` exists and is bound as the active
    /// framebuffer.
    ///
    /// Antialiasing and premultiplied alpha on the captured surface are not
    /// reproduced on the synthetic target; both are surfaced as diagnostics.
    /// Incompleteness after construction is likewise a diagnostic, not an
    /// error: playback continues best-effort.
    pub fn setup<G: GlBackend>(&mut self, gl: &mut G, canvas: &CanvasInfo) -> Result<(), GlError> {
        let attrs = &canvas.attributes;
        let width = canvas.width;
        let height = canvas.height;
        let color_format = if attrs.alpha {
            TextureFormat::Rgba
        } else {
            TextureFormat::Rgb
        };
        let depth_format = attrs.depth.then_some(RenderbufferFormat::DepthComponent16);
        let stencil_format = attrs.stencil.then_some(RenderbufferFormat::StencilIndex8);

        if attrs.antialias {
            warn!("captured surface requests antialiasing; the playback target is single-sampled");
        }
        if attrs.premultiplied_alpha {
            warn!("captured surface uses premultiplied alpha; the playback target stores straight alpha");
        }

        if let Some(existing) = &self.target {
            if existing.matches(width, height, color_format, depth_format, stencil_format) {
                debug!(width, height, "reusing playback render target");
                let framebuffer = existing.framebuffer;
                let color_texture = existing.color_texture;
                gl.apply(&GlCall::BindTexture {
                    target: TextureTarget::Texture2d,
                    texture: Some(color_texture),
                })?;
                gl.apply(&GlCall::TexImage2d {
                    target: TexImageTarget::Texture2d,
                    level: 0,
                    format: color_format,
                    width,
                    height,
                    pixel_type: PixelType::UnsignedByte,
                    data: None,
                })?;
                gl.apply(&GlCall::BindTexture {
                    target: TextureTarget::Texture2d,
                    texture: None,
                })?;
                gl.apply(&GlCall::BindFramebuffer {
                    framebuffer: Some(framebuffer),
                })?;
                return Ok(());
            }
            debug!(
                width,
                height, "render target no longer matches the frame surface; reallocating"
            );
            self.discard(gl);
        }

        let color_texture = gl.create_object(ObjectKind::Texture);
        gl.apply(&GlCall::BindTexture {
            target: TextureTarget::Texture2d,
            texture: Some(color_texture),
        })?;
        gl.apply(&GlCall::TexImage2d {
            target: TexImageTarget::Texture2d,
            level: 0,
            format: color_format,
            width,
            height,
            pixel_type: PixelType::UnsignedByte,
            data: None,
        })?;
        gl.apply(&GlCall::BindTexture {
            target: TextureTarget::Texture2d,
            texture: None,
        })?;

        let mut allocate_renderbuffer =
            |gl: &mut G, format: RenderbufferFormat| -> Result<TargetHandle, GlError> {
                let buffer = gl.create_object(ObjectKind::Renderbuffer);
                gl.apply(&GlCall::BindRenderbuffer {
                    renderbuffer: Some(buffer),
                })?;
                gl.apply(&GlCall::RenderbufferStorage {
                    format,
                    width,
                    height,
                })?;
                gl.apply(&GlCall::BindRenderbuffer { renderbuffer: None })?;
                Ok(buffer)
            };
        let depth_buffer = depth_format
            .map(|format| allocate_renderbuffer(gl, format))
            .transpose()?;
        let stencil_buffer = stencil_format
            .map(|format| allocate_renderbuffer(gl, format))
            .transpose()?;

        let framebuffer = gl.create_object(ObjectKind::Framebuffer);
        gl.apply(&GlCall::BindFramebuffer {
            framebuffer: Some(framebuffer),
        })?;
        gl.apply(&GlCall::FramebufferTexture2d {
            attachment: FramebufferAttachment::Color0,
            texture: Some(color_texture),
            level: 0,
        })?;
        if let Some(buffer) = depth_buffer {
            gl.apply(&GlCall::FramebufferRenderbuffer {
                attachment: FramebufferAttachment::Depth,
                renderbuffer: Some(buffer),
            })?;
        }
        if let Some(buffer) = stencil_buffer {
            gl.apply(&GlCall::FramebufferRenderbuffer {
                attachment: FramebufferAttachment::Stencil,
                renderbuffer: Some(buffer),
            })?;
        }

        match gl.check_framebuffer_status() {
            FramebufferStatus::Complete => {}
            status => {
                warn!(?status, "playback render target is incomplete; continuing best-effort");
            }
        }

        self.target = Some(RenderTarget {
            width,
            height,
            color_format,
            depth_format,
            stencil_format,
            framebuffer,
            color_texture,
            depth_buffer,
            stencil_buffer,
        });
        Ok(())
    }

    /// Release the owned target. Safe to call when none exists.
    pub fn discard<G: GlBackend>(&mut self, gl: &mut G) {
        if let Some(target) = self.target.take() {
            gl.delete_object(ObjectKind::Framebuffer, target.framebuffer);
            gl.delete_object(ObjectKind::Texture, target.color_texture);
            if let Some(buffer) = target.depth_buffer {
                gl.delete_object(ObjectKind::Renderbuffer, buffer);
            }
            if let Some(buffer) = target.stencil_buffer {
                gl.delete_object(ObjectKind::Renderbuffer, buffer);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::frame::SurfaceAttributes;
    use glint_gl::HeadlessGl;

    fn canvas(width: u32, height: u32, stencil: bool) -> CanvasInfo {
        CanvasInfo {
            width,
            height,
            attributes: SurfaceAttributes {
                alpha: true,
                depth: true,
                stencil,
                antialias: false,
                premultiplied_alpha: false,
            },
        }
    }

    #[test]
    fn setup_binds_a_complete_target() {
        let mut gl = HeadlessGl::default();
        let mut manager = RenderTargetManager::default();
        manager.setup(&mut gl, &canvas(16, 8, true)).unwrap();

        let target = manager.target().unwrap();
        assert_eq!(gl.framebuffer_binding(), Some(target.framebuffer));
        assert_eq!(gl.check_framebuffer_status(), FramebufferStatus::Complete);
        assert_eq!(target.color_format, TextureFormat::Rgba);
        assert_eq!(
            target.stencil_format,
            Some(RenderbufferFormat::StencilIndex8)
        );
    }

    #[test]
    fn matching_surface_reuses_the_target() {
        let mut gl = HeadlessGl::default();
        let mut manager = RenderTargetManager::default();
        manager.setup(&mut gl, &canvas(16, 8, false)).unwrap();
        let first = manager.target().unwrap().framebuffer;

        manager.setup(&mut gl, &canvas(16, 8, false)).unwrap();
        assert_eq!(manager.target().unwrap().framebuffer, first);
    }

    #[test]
    fn size_change_releases_and_reallocates() {
        let mut gl = HeadlessGl::default();
        let mut manager = RenderTargetManager::default();
        manager.setup(&mut gl, &canvas(16, 8, false)).unwrap();
        let first = *manager.target().unwrap();

        manager.setup(&mut gl, &canvas(32, 8, false)).unwrap();
        let second = manager.target().unwrap();
        assert_ne!(second.framebuffer, first.framebuffer);
        assert!(!gl.is_live(first.framebuffer));
        assert!(!gl.is_live(first.color_texture));
    }

    #[test]
    fn discard_without_target_is_a_no_op() {
        let mut gl = HeadlessGl::default();
        let mut manager = RenderTargetManager::default();
        manager.discard(&mut gl);
        assert!(manager.target().is_none());
    }
}
