use std::sync::Arc;

use pixels::{Error, Pixels, SurfaceTexture, TextureError};
use winit::window::Window;

use crate::app::AppHandler;

use super::canvas::Canvas;

/// Framebuffer size in pixels. The editor draws at window resolution, so
/// this always matches the window's inner size.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Viewport {
    pub width: u32,
    pub height: u32,
}

impl Viewport {
    /// Minimised windows report a zero size; nothing is presented then.
    pub fn is_empty(self) -> bool {
        self.width == 0 || self.height == 0
    }
}

/// Owns the window surface and hands an [`AppHandler`] a [`Canvas`] over the
/// framebuffer each redraw.
pub struct Renderer {
    pixels: Pixels<'static>,
    viewport: Viewport,
}

impl Renderer {
    pub fn new(window: Arc<Window>) -> Result<Self, Error> {
        let size = window.inner_size();
        let viewport = Viewport {
            width: size.width.max(1),
            height: size.height.max(1),
        };
        let surface = SurfaceTexture::new(viewport.width, viewport.height, window);
        let pixels = Pixels::new(viewport.width, viewport.height, surface)?;
        Ok(Self { pixels, viewport })
    }

    pub fn viewport(&self) -> Viewport {
        self.viewport
    }

    /// Resizes the surface and the framebuffer in place. A zero size is
    /// remembered but leaves the old buffers alone.
    pub fn resize(&mut self, width: u32, height: u32) -> Result<(), TextureError> {
        let next = Viewport { width, height };
        if next.is_empty() || next == self.viewport {
            self.viewport = next;
            return Ok(());
        }
        self.pixels.resize_surface(width, height)?;
        self.pixels.resize_buffer(width, height)?;
        self.viewport = next;
        Ok(())
    }

    pub(crate) fn render_app(&mut self, app: &mut dyn AppHandler) -> Result<(), Error> {
        if self.viewport.is_empty() {
            return Ok(());
        }
        let Viewport { width, height } = self.viewport;
        app.render(&mut Canvas::new(self.pixels.frame_mut(), width, height));
        self.pixels.render()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn minimised_viewports_are_empty() {
        assert!(Viewport { width: 0, height: 720 }.is_empty());
        assert!(Viewport { width: 1280, height: 0 }.is_empty());
        assert!(!Viewport { width: 1, height: 1 }.is_empty());
    }
}
