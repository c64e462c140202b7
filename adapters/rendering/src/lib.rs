#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Pixel-level drawing contracts shared by Snail Maze adapters.
//!
//! Pages are rendered into caller-owned RGBA byte buffers. [`Canvas`] wraps
//! such a buffer, validates its size once and then offers clipped primitive
//! drawing so callers never index raw bytes themselves.

use snail_maze_core::Direction;
use thiserror::Error;

/// Bytes stored per pixel.
pub const BYTES_PER_PIXEL: usize = 4;

/// Errors raised while preparing a render target.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Error)]
pub enum RenderError {
    /// The supplied buffer does not hold exactly one page of pixels.
    #[error("render buffer holds {actual} bytes but the page needs {expected}")]
    BufferSizeMismatch {
        /// Bytes required by the page.
        expected: usize,
        /// Bytes supplied by the caller.
        actual: usize,
    },
    /// The requested slot range does not fit the population or the page.
    #[error("slots {start}..{start}+{count} fall outside the {len} available")]
    SlotRangeOutOfBounds {
        /// First slot requested.
        start: usize,
        /// Number of slots requested.
        count: usize,
        /// Upper bound the range had to respect.
        len: usize,
    },
}

/// RGBA colour written verbatim into page buffers.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Color {
    /// Red channel.
    pub red: u8,
    /// Green channel.
    pub green: u8,
    /// Blue channel.
    pub blue: u8,
    /// Alpha channel.
    pub alpha: u8,
}

impl Color {
    /// Creates a colour from its four channels.
    #[must_use]
    pub const fn new(red: u8, green: u8, blue: u8, alpha: u8) -> Self {
        Self {
            red,
            green,
            blue,
            alpha,
        }
    }

    /// Creates an opaque colour from byte RGB values.
    #[must_use]
    pub const fn from_rgb(red: u8, green: u8, blue: u8) -> Self {
        Self::new(red, green, blue, 0xFF)
    }

    /// Returns a new colour lightened towards white by the provided amount.
    #[must_use]
    pub fn lighten(self, amount: f32) -> Self {
        let amount = amount.clamp(0.0, 1.0);
        Self {
            red: lighten_channel(self.red, amount),
            green: lighten_channel(self.green, amount),
            blue: lighten_channel(self.blue, amount),
            alpha: self.alpha,
        }
    }

    /// Returns the colour with every RGB channel inverted.
    #[must_use]
    pub const fn inverted(self) -> Self {
        Self::new(!self.red, !self.green, !self.blue, self.alpha)
    }

    const fn bytes(self) -> [u8; 4] {
        [self.red, self.green, self.blue, self.alpha]
    }
}

fn lighten_channel(channel: u8, amount: f32) -> u8 {
    let channel = f32::from(channel);
    (channel + (255.0 - channel) * amount).round() as u8
}

/// Fixed palette of the game.
pub mod palette {
    use super::Color;

    /// Maze floor.
    pub const BACKGROUND: Color = Color::from_rgb(0x11, 0x0A, 0xEF);
    /// Maze walls.
    pub const WALL: Color = Color::from_rgb(0x68, 0x8F, 0xEF);
    /// Goal marker on its bright animation frame.
    pub const GOAL: Color = Color::from_rgb(0xFF, 0xD7, 0x00);
    /// Goal marker on its dim animation frame.
    pub const GOAL_DIM: Color = Color::from_rgb(0xB8, 0x86, 0x0B);
    /// Shell of a moving snail.
    pub const SNAIL: Color = Color::from_rgb(0xF4, 0xA2, 0x61);
    /// Waiting or stopped snails.
    pub const IDLE: Color = Color::from_rgb(0x80, 0x80, 0x80);
    /// Lost snails awaiting rescue.
    pub const LOST: Color = Color::from_rgb(0xE7, 0x6F, 0x51);
    /// Members of a flying swarm.
    pub const SWARM: Color = Color::from_rgb(0xF1, 0xFA, 0xEE);
    /// Junction marks.
    pub const MARK: Color = Color::from_rgb(0xD6, 0x28, 0x28);
    /// Highlighted route cells.
    pub const PATH: Color = Color::from_rgb(0x2A, 0x9D, 0x8F);
    /// Lit bombs.
    pub const BOMB: Color = Color::from_rgb(0x1D, 0x1D, 0x1D);
    /// Exploding bombs.
    pub const BLAST: Color = Color::from_rgb(0xFF, 0x45, 0x00);
    /// Teleport charge bar.
    pub const CHARGE: Color = Color::from_rgb(0x8E, 0xCA, 0xE6);
}

/// Mutable RGBA view over a caller-owned page buffer.
#[derive(Debug)]
pub struct Canvas<'a> {
    pixels: &'a mut [u8],
    width: u32,
    height: u32,
}

impl<'a> Canvas<'a> {
    /// Wraps `pixels` as a `width` x `height` canvas.
    ///
    /// Fails without touching the buffer when its length does not match.
    pub fn new(pixels: &'a mut [u8], width: u32, height: u32) -> Result<Self, RenderError> {
        let expected = byte_len(width, height);
        if pixels.len() != expected {
            return Err(RenderError::BufferSizeMismatch {
                expected,
                actual: pixels.len(),
            });
        }
        Ok(Self {
            pixels,
            width,
            height,
        })
    }

    /// Canvas width in pixels.
    #[must_use]
    pub const fn width(&self) -> u32 {
        self.width
    }

    /// Canvas height in pixels.
    #[must_use]
    pub const fn height(&self) -> u32 {
        self.height
    }

    /// Paints every pixel with `color`.
    pub fn fill(&mut self, color: Color) {
        let bytes = color.bytes();
        for pixel in self.pixels.chunks_exact_mut(BYTES_PER_PIXEL) {
            pixel.copy_from_slice(&bytes);
        }
    }

    /// Copies an RGBA image `source_width` pixels wide to `(x, y)`, clipped
    /// to the canvas.
    pub fn blit(&mut self, x: i64, y: i64, source: &[u8], source_width: u32) {
        let source_stride = source_width as usize * BYTES_PER_PIXEL;
        if source_stride == 0 {
            return;
        }
        let source_height = (source.len() / source_stride) as i64;
        let left = x.max(0);
        let top = y.max(0);
        let right = (x + i64::from(source_width)).min(i64::from(self.width()));
        let bottom = (y + source_height).min(i64::from(self.height()));
        if left >= right || top >= bottom {
            return;
        }
        let stride = self.width as usize * BYTES_PER_PIXEL;
        let span = (right - left) as usize * BYTES_PER_PIXEL;
        for row in top..bottom {
            let from = (row - y) as usize * source_stride + (left - x) as usize * BYTES_PER_PIXEL;
            let to = row as usize * stride + left as usize * BYTES_PER_PIXEL;
            self.pixels[to..to + span].copy_from_slice(&source[from..from + span]);
        }
    }

    /// Paints the rectangle clipped to the canvas.
    pub fn fill_rect(&mut self, x: i64, y: i64, width: u32, height: u32, color: Color) {
        let left = x.max(0);
        let top = y.max(0);
        let right = (x + i64::from(width)).min(i64::from(self.width));
        let bottom = (y + i64::from(height)).min(i64::from(self.height));
        if left >= right || top >= bottom {
            return;
        }
        let bytes = color.bytes();
        let stride = self.width as usize * BYTES_PER_PIXEL;
        for row in top as usize..bottom as usize {
            let start = row * stride + left as usize * BYTES_PER_PIXEL;
            let end = row * stride + right as usize * BYTES_PER_PIXEL;
            for pixel in self.pixels[start..end].chunks_exact_mut(BYTES_PER_PIXEL) {
                pixel.copy_from_slice(&bytes);
            }
        }
    }

    /// Draws a snail glyph inside the `size` x `size` square at `(x, y)`.
    ///
    /// The shell sits in the middle of the square and the head points along
    /// `heading`.
    pub fn draw_snail(&mut self, x: i64, y: i64, size: u32, heading: Direction, shell: Color) {
        let body = shell.lighten(0.4);
        let unit = i64::from((size / 5).max(1));
        let centre_x = x + i64::from(size) / 2;
        let centre_y = y + i64::from(size) / 2;

        let (body_dx, body_dy) = match heading {
            Direction::Up => (0, -1),
            Direction::Down => (0, 1),
            Direction::Left => (-1, 0),
            Direction::Right => (1, 0),
        };
        self.fill_rect(
            centre_x - unit + body_dx * unit,
            centre_y - unit + body_dy * unit,
            (2 * unit) as u32,
            (2 * unit) as u32,
            body,
        );
        self.fill_rect(
            centre_x - unit - body_dx * unit / 2,
            centre_y - unit - body_dy * unit / 2,
            (2 * unit) as u32,
            (2 * unit) as u32,
            shell,
        );
    }
}

/// Bytes needed for a `width` x `height` RGBA buffer.
#[must_use]
pub const fn byte_len(width: u32, height: u32) -> usize {
    width as usize * height as usize * BYTES_PER_PIXEL
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pixel(buffer: &[u8], width: u32, x: usize, y: usize) -> [u8; 4] {
        let offset = (y * width as usize + x) * BYTES_PER_PIXEL;
        [
            buffer[offset],
            buffer[offset + 1],
            buffer[offset + 2],
            buffer[offset + 3],
        ]
    }

    #[test]
    fn canvas_rejects_mismatched_buffers() {
        let mut buffer = vec![7; 15];
        let error = Canvas::new(&mut buffer, 2, 2).expect_err("buffer too short");
        assert_eq!(
            error,
            RenderError::BufferSizeMismatch {
                expected: 16,
                actual: 15
            }
        );
        assert!(buffer.iter().all(|byte| *byte == 7));
    }

    #[test]
    fn fill_rect_clips_to_canvas() {
        let mut buffer = vec![0; byte_len(4, 4)];
        let mut canvas = Canvas::new(&mut buffer, 4, 4).expect("sized buffer");
        canvas.fill(palette::BACKGROUND);
        canvas.fill_rect(-2, 2, 4, 10, palette::WALL);

        assert_eq!(pixel(&buffer, 4, 0, 3), palette::WALL.bytes());
        assert_eq!(pixel(&buffer, 4, 1, 2), palette::WALL.bytes());
        assert_eq!(pixel(&buffer, 4, 2, 2), palette::BACKGROUND.bytes());
        assert_eq!(pixel(&buffer, 4, 0, 1), palette::BACKGROUND.bytes());
    }

    #[test]
    fn blit_copies_only_the_overlap() {
        let mut source = vec![0; byte_len(2, 2)];
        let mut tile = Canvas::new(&mut source, 2, 2).expect("sized buffer");
        tile.fill(palette::WALL);
        tile.fill_rect(0, 1, 1, 1, palette::GOAL);

        let mut buffer = vec![0; byte_len(3, 3)];
        let mut canvas = Canvas::new(&mut buffer, 3, 3).expect("sized buffer");
        canvas.fill(palette::BACKGROUND);
        canvas.blit(2, -1, &source, 2);
        canvas.blit(5, 5, &source, 2);
        canvas.blit(0, 0, &source, 0);

        assert_eq!(pixel(&buffer, 3, 2, 0), palette::GOAL.bytes());
        let painted = buffer
            .chunks_exact(BYTES_PER_PIXEL)
            .filter(|chunk| *chunk != palette::BACKGROUND.bytes())
            .count();
        assert_eq!(painted, 1);
    }

    #[test]
    fn inverted_palette_flips_channels() {
        let color = Color::from_rgb(0x10, 0x80, 0xFF).inverted();
        assert_eq!(color, Color::from_rgb(0xEF, 0x7F, 0x00));
        assert_eq!(palette::WALL.lighten(0.0), palette::WALL);
        assert_eq!(palette::WALL.lighten(1.0), Color::from_rgb(0xFF, 0xFF, 0xFF));
    }

    #[test]
    fn snail_stays_inside_its_tile() {
        let mut buffer = vec![0; byte_len(30, 30)];
        let mut canvas = Canvas::new(&mut buffer, 30, 30).expect("sized buffer");
        for heading in Direction::ALL {
            canvas.draw_snail(10, 10, 11, heading, palette::SNAIL);
        }
        for y in 0..30 {
            for x in 0..30 {
                let inside = (10..21).contains(&x) && (10..21).contains(&y);
                if !inside {
                    assert_eq!(pixel(&buffer, 30, x, y), [0; 4], "pixel {x},{y} painted");
                }
            }
        }
    }
}
