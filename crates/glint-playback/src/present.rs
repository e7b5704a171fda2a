//! Presentation seam.
//!
//! Presenting blits the session's offscreen color buffer onto an arbitrary
//! destination, scaled to the destination's dimensions. The destination only
//! needs "clear" and "draw scaled image" capabilities; anything 2D-drawable
//! qualifies.

use glint_gl::TargetHandle;

/// A destination surface for [`PlaybackSession::present`].
///
/// [`PlaybackSession::present`]: crate::PlaybackSession::present
pub trait PresentSurface {
    /// Clear the full destination region.
    fn clear(&mut self);

    /// Draw the replayed color buffer, scaled to fill the destination.
    /// `source_size` is the color buffer's own width/height.
    fn draw_scaled(&mut self, color_texture: TargetHandle, source_size: (u32, u32));
}
