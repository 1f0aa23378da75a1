//! In-process driver backed by a virtual framebuffer.

use std::collections::HashMap;
use std::io::Cursor;

use font8x8::{BASIC_FONTS, UnicodeFonts};
use image::{DynamicImage, ImageFormat, Rgb, RgbImage};
use tracing::{debug, info};

use super::backend::Backend;
use super::{AutomationDriver, DriverError, DriverResult};
use crate::geometry::Bounds;
use crate::project::WalletConfig;
use crate::workflow::{Action, Step, Target};

/// Logical screen size of the mock display
pub const MOCK_SCREEN: (u32, u32) = (1440, 900);

const BACKGROUND: [u8; 3] = [236, 236, 236];
const TITLE_BAR: [u8; 3] = [52, 58, 64];

/// A virtual framebuffer for tests and dry runs
///
/// Provides a small drawing API for building fake screens:
/// - `fill()` - Fill entire buffer with a color
/// - `draw_rect()` - Draw a filled rectangle
/// - `draw_text()` - Draw text using font8x8 glyphs
/// - `get_pixel()` / `set_pixel()` - Direct pixel access
#[derive(Debug, Clone, PartialEq)]
pub struct MockFramebuffer {
    buffer: RgbImage,
}

impl MockFramebuffer {
    /// Create a new framebuffer with the given dimensions, initialized to black
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            buffer: RgbImage::new(width, height),
        }
    }

    /// Create a framebuffer initialized to a specific color
    pub fn with_color(width: u32, height: u32, color: [u8; 3]) -> Self {
        Self {
            buffer: RgbImage::from_pixel(width, height, Rgb(color)),
        }
    }

    /// Load a framebuffer from encoded image bytes
    pub fn from_png_bytes(data: &[u8]) -> DriverResult<Self> {
        let img = image::load_from_memory(data)?;
        Ok(Self {
            buffer: img.to_rgb8(),
        })
    }

    pub fn width(&self) -> u32 {
        self.buffer.width()
    }

    pub fn height(&self) -> u32 {
        self.buffer.height()
    }

    /// Fill the entire framebuffer with a color
    pub fn fill(&mut self, color: [u8; 3]) {
        for px in self.buffer.pixels_mut() {
            *px = Rgb(color);
        }
    }

    /// Draw a filled rectangle, clipped to the buffer
    pub fn draw_rect(&mut self, x: u32, y: u32, w: u32, h: u32, color: [u8; 3]) {
        let right = x.saturating_add(w).min(self.width());
        let bottom = y.saturating_add(h).min(self.height());
        for py in y..bottom {
            for px in x..right {
                self.buffer.put_pixel(px, py, Rgb(color));
            }
        }
    }

    /// Draw text using font8x8 glyphs
    ///
    /// Each character is 8x8 pixels. Text does not wrap.
    pub fn draw_text(&mut self, x: u32, y: u32, text: &str, fg: [u8; 3], bg: [u8; 3]) {
        let mut cursor_x = x;
        for ch in text.chars() {
            if cursor_x >= self.width() {
                break;
            }
            let glyph = BASIC_FONTS.get(ch).unwrap_or([0u8; 8]);
            for (row_idx, row) in glyph.iter().enumerate() {
                for bit in 0..8 {
                    // font8x8 stores LSB as leftmost pixel
                    let color = if (row >> bit) & 1 == 1 { fg } else { bg };
                    self.set_pixel(cursor_x + bit, y + row_idx as u32, color);
                }
            }
            cursor_x += 8;
        }
    }

    /// Color of a pixel; black outside the buffer
    pub fn get_pixel(&self, x: u32, y: u32) -> [u8; 3] {
        self.buffer
            .get_pixel_checked(x, y)
            .map(|p| p.0)
            .unwrap_or([0, 0, 0])
    }

    /// Set the color of a pixel; ignored outside the buffer
    pub fn set_pixel(&mut self, x: u32, y: u32, color: [u8; 3]) {
        if let Some(px) = self.buffer.get_pixel_mut_checked(x, y) {
            *px = Rgb(color);
        }
    }

    pub fn to_image(&self) -> RgbImage {
        self.buffer.clone()
    }

    /// Encode the framebuffer as PNG bytes
    pub fn to_png(&self) -> DriverResult<Vec<u8>> {
        let mut bytes = Vec::new();
        self.buffer
            .write_to(&mut Cursor::new(&mut bytes), ImageFormat::Png)?;
        Ok(bytes)
    }
}

/// Driver that records actions and captures a [`MockFramebuffer`]
#[derive(Debug, Clone)]
pub struct MockDriver {
    framebuffer: MockFramebuffer,
    elements: HashMap<String, Bounds>,
    window: Option<Bounds>,
    connected: bool,
    actions: Vec<String>,
}

impl MockDriver {
    pub fn new(framebuffer: MockFramebuffer) -> Self {
        Self {
            framebuffer,
            elements: HashMap::new(),
            window: None,
            connected: false,
            actions: Vec::new(),
        }
    }

    /// A fake wallet window sized for the project's display scale
    pub fn from_config(config: &WalletConfig) -> Self {
        let scale = config.display_scale();
        let width = scale.length(MOCK_SCREEN.0 as i32).max(1) as u32;
        let height = scale.length(MOCK_SCREEN.1 as i32).max(1) as u32;

        let mut fb = MockFramebuffer::with_color(width, height, BACKGROUND);
        fb.draw_rect(0, 0, width, 32, TITLE_BAR);
        fb.draw_text(12, 12, config.name(), [255, 255, 255], TITLE_BAR);

        Self::new(fb).with_window(Bounds::new(0, 0, width as i32, height as i32))
    }

    /// Make `selector` resolvable at `bounds` (physical pixels)
    pub fn with_element(mut self, selector: impl Into<String>, bounds: Bounds) -> Self {
        self.elements.insert(selector.into(), bounds);
        self
    }

    pub fn with_window(mut self, bounds: Bounds) -> Self {
        self.window = Some(bounds);
        self
    }

    pub fn framebuffer(&self) -> &MockFramebuffer {
        &self.framebuffer
    }

    pub fn framebuffer_mut(&mut self) -> &mut MockFramebuffer {
        &mut self.framebuffer
    }

    pub fn is_connected(&self) -> bool {
        self.connected
    }

    /// Actions performed so far, one line each
    pub fn actions(&self) -> &[String] {
        &self.actions
    }

    fn ensure_connected(&self) -> DriverResult<()> {
        if self.connected {
            Ok(())
        } else {
            Err(DriverError::NotConnected)
        }
    }

    fn locate(&self, selector: &str) -> DriverResult<Bounds> {
        self.elements
            .get(selector)
            .copied()
            .ok_or_else(|| DriverError::ElementNotFound(selector.to_string()))
    }
}

impl AutomationDriver for MockDriver {
    fn backend(&self) -> Backend {
        Backend::Mock
    }

    fn connect(&mut self) -> DriverResult<()> {
        self.connected = true;
        info!(
            width = self.framebuffer.width(),
            height = self.framebuffer.height(),
            "mock display connected"
        );
        Ok(())
    }

    fn disconnect(&mut self) -> DriverResult<()> {
        self.connected = false;
        Ok(())
    }

    fn execute_step(&mut self, step: &Step) -> DriverResult<()> {
        self.ensure_connected()?;
        match step.action {
            Action::Click => {
                let point = match &step.target {
                    Some(Target::Coordinates(p)) => *p,
                    Some(Target::Selector(s)) => self.locate(s)?.center(),
                    None => {
                        return Err(DriverError::InvalidStep(format!(
                            "click step '{}' has no target",
                            step.name
                        )));
                    }
                };
                self.actions
                    .push(format!("click ({}, {}) x{}", point.x, point.y, step.clicks));
            }
            Action::Type => {
                if let Some(Target::Selector(s)) = &step.target {
                    self.locate(s)?;
                }
                let text = step.value.as_deref().unwrap_or_default();
                self.actions.push(format!("type '{text}'"));
            }
            other => return Err(DriverError::Unsupported(other.to_string())),
        }
        debug!(step = %step.name, action = %step.action, "mock action");
        Ok(())
    }

    fn capture_screenshot(&mut self, _step: &Step) -> DriverResult<DynamicImage> {
        self.ensure_connected()?;
        Ok(DynamicImage::ImageRgb8(self.framebuffer.to_image()))
    }

    fn element_bounds(&mut self, selector: &str) -> DriverResult<Option<Bounds>> {
        self.ensure_connected()?;
        Ok(self.elements.get(selector).copied())
    }

    fn window_bounds(&mut self) -> Option<Bounds> {
        self.window
    }
}
