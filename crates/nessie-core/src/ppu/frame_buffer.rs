use super::palette::Color;

pub const SCREEN_WIDTH: usize = 256;
pub const SCREEN_HEIGHT: usize = 240;
/// Packed RGB, three bytes per pixel.
pub const BYTES_PER_PIXEL: usize = 3;

const PLANE_LEN: usize = SCREEN_WIDTH * SCREEN_HEIGHT * BYTES_PER_PIXEL;

/// Double-buffered RGB framebuffer.
///
/// The PPU draws into the back plane; [`swap`](Self::swap) at the end of the
/// visible area publishes it as the front plane, which is what frontends read.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FrameBuffer {
    planes: [Box<[u8]>; 2],
    /// Index of the back/write plane.
    back: usize,
}

impl Default for FrameBuffer {
    fn default() -> Self {
        Self::new()
    }
}

impl FrameBuffer {
    pub fn new() -> Self {
        Self {
            planes: [
                vec![0; PLANE_LEN].into_boxed_slice(),
                vec![0; PLANE_LEN].into_boxed_slice(),
            ],
            back: 0,
        }
    }

    #[inline]
    pub fn write_pixel(&mut self, x: usize, y: usize, color: Color) {
        debug_assert!(x < SCREEN_WIDTH && y < SCREEN_HEIGHT);
        let offset = (y * SCREEN_WIDTH + x) * BYTES_PER_PIXEL;
        if let Some(pixel) = self.planes[self.back].get_mut(offset..offset + BYTES_PER_PIXEL) {
            pixel.copy_from_slice(&[color.r, color.g, color.b]);
        }
    }

    pub fn swap(&mut self) {
        self.back ^= 1;
    }

    /// Latest completed frame.
    pub fn front(&self) -> &[u8] {
        &self.planes[self.back ^ 1]
    }

    /// Frame in progress.
    pub fn back(&self) -> &[u8] {
        &self.planes[self.back]
    }

    pub fn pixel(&self, x: usize, y: usize) -> Option<Color> {
        if x >= SCREEN_WIDTH || y >= SCREEN_HEIGHT {
            return None;
        }
        let offset = (y * SCREEN_WIDTH + x) * BYTES_PER_PIXEL;
        let rgb = self.front().get(offset..offset + BYTES_PER_PIXEL)?;
        Some(Color::new(rgb[0], rgb[1], rgb[2]))
    }

    pub fn clear(&mut self) {
        for plane in &mut self.planes {
            plane.fill(0);
        }
    }
}
