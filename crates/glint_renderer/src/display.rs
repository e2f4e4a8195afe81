//! The surface the renderer presents to.
//!
//! [`Display`] is implemented by the windowed viewport and by
//! [`HeadlessDisplay`], which runs a fixed number of ticks and is what the
//! tests and batch renders use.

use crate::input::InputState;
use crate::material::Color;

/// One BGRA8 display pixel, laid out the way window surfaces expect.
#[repr(C)]
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct Pixel {
    pub b: u8,
    pub g: u8,
    pub r: u8,
    pub a: u8,
}

impl Pixel {
    pub const BLACK: Pixel = Pixel { b: 0, g: 0, r: 0, a: 255 };

    /// Opaque pixel from a display color. Channels are clamped to [0, 1]
    /// and truncated.
    #[inline]
    pub fn from_color(color: Color) -> Self {
        let c = color.clamp(Color::ZERO, Color::ONE) * 255.0;
        Self {
            b: c.z as u8,
            g: c.y as u8,
            r: c.x as u8,
            a: 255,
        }
    }

    /// Channels in RGBA order, for encoders.
    #[inline]
    pub fn to_rgba(self) -> [u8; 4] {
        [self.r, self.g, self.b, self.a]
    }
}

/// A window or off-screen target the control thread presents to.
pub trait Display {
    /// Current surface size (width, height) in pixels.
    fn size(&self) -> (usize, usize);

    /// True if the size changed during the last [`Display::update`].
    fn resized(&self) -> bool;

    fn input(&self) -> &InputState;

    /// Row-major `width * height` write surface.
    fn pixels_mut(&mut self) -> &mut [Pixel];

    /// Present the surface and poll events. Returns false to stop.
    fn update(&mut self) -> bool;
}

/// Off-screen display that stops after a fixed number of updates.
#[derive(Debug, Clone)]
pub struct HeadlessDisplay {
    width: usize,
    height: usize,
    pixels: Vec<Pixel>,
    input: InputState,
    ticks: u64,
    max_ticks: u64,
    pending_resize: Option<(usize, usize)>,
    resized: bool,
}

impl HeadlessDisplay {
    pub fn new(width: usize, height: usize, max_ticks: u64) -> Self {
        Self {
            width,
            height,
            pixels: vec![Pixel::BLACK; width * height],
            input: InputState::new(),
            ticks: 0,
            max_ticks,
            pending_resize: None,
            resized: false,
        }
    }

    /// Number of completed updates.
    pub fn ticks(&self) -> u64 {
        self.ticks
    }

    pub fn pixels(&self) -> &[Pixel] {
        &self.pixels
    }

    pub fn pixel(&self, x: usize, y: usize) -> Pixel {
        self.pixels[y * self.width + x]
    }

    /// Scripted input for the next ticks.
    pub fn input_mut(&mut self) -> &mut InputState {
        &mut self.input
    }

    /// Apply a new size at the next update, as a window resize would.
    pub fn request_resize(&mut self, width: usize, height: usize) {
        self.pending_resize = Some((width, height));
    }
}

impl Display for HeadlessDisplay {
    fn size(&self) -> (usize, usize) {
        (self.width, self.height)
    }

    fn resized(&self) -> bool {
        self.resized
    }

    fn input(&self) -> &InputState {
        &self.input
    }

    fn pixels_mut(&mut self) -> &mut [Pixel] {
        &mut self.pixels
    }

    fn update(&mut self) -> bool {
        self.input.end_frame();
        self.resized = false;
        if let Some((width, height)) = self.pending_resize.take() {
            if (width, height) != (self.width, self.height) {
                self.width = width;
                self.height = height;
                self.pixels = vec![Pixel::BLACK; width * height];
                self.resized = true;
            }
        }

        self.ticks += 1;
        self.ticks < self.max_ticks
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pixel_layout_is_bgra() {
        let p = Pixel::from_color(Color::new(1.0, 0.5, 0.0));
        let bytes: &[u8] = bytemuck::bytes_of(&p);
        assert_eq!(bytes, &[0, 127, 255, 255]);
        assert_eq!(p.to_rgba(), [255, 127, 0, 255]);
    }

    #[test]
    fn test_pixel_clamps() {
        let p = Pixel::from_color(Color::new(-3.0, 2.0, f32::INFINITY));
        assert_eq!((p.r, p.g, p.b), (0, 255, 255));
    }

    #[test]
    fn test_headless_stops_after_max_ticks() {
        let mut display = HeadlessDisplay::new(4, 2, 3);
        assert!(display.update());
        assert!(display.update());
        assert!(!display.update());
        assert_eq!(display.ticks(), 3);
        assert_eq!(display.pixels_mut().len(), 8);
    }

    #[test]
    fn test_headless_resize() {
        let mut display = HeadlessDisplay::new(4, 2, 10);
        display.request_resize(3, 3);
        assert!(!display.resized());
        display.update();
        assert!(display.resized());
        assert_eq!(display.size(), (3, 3));
        assert_eq!(display.pixels().len(), 9);
        display.update();
        assert!(!display.resized());
    }
}
