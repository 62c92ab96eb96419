//! Thumbnail generation.
//!
//! `ffmpeg` grabs one frame (from the montage, a single asset, or a plain
//! branded card), scales and crops it, and draws the title and brand. The
//! frame lines are painted with `image`, which also checks the size and
//! encodes the JPEG.

use std::io::Cursor;
use std::path::{Path, PathBuf};
use std::sync::LazyLock;

use image::codecs::jpeg::JpegEncoder;
use image::{Rgb, RgbImage};
use reelsmith_av::actions::text::{stage_font, write_text_file};
use reelsmith_av::actions::{extract_frame, FrameSpec, TextOverlay};
use reelsmith_av::{Tools, Workspace};
use reelsmith_common::{Error, Result};
use regex::Regex;
use tracing::{debug, info};

use crate::tools::encoding;

/// Card background.
pub const INK: Rgb<u8> = Rgb([13, 27, 42]);
/// Outer frame line.
pub const TEAL: Rgb<u8> = Rgb([15, 181, 186]);
/// Inner frame line and brand text.
pub const SAND: Rgb<u8> = Rgb([228, 210, 184]);

const BRAND_COLOR: &str = "0xE4D2B8";
/// Distance of the brand mark from the edges, inside the frame lines.
const BRAND_MARGIN: u32 = 64;

const TITLE_FILE: &str = "title.txt";
const BRAND_FILE: &str = "brand.txt";
const FONT_FILE: &str = "font.ttf";
const CARD_FILE: &str = "card.png";
const FRAME_FILE: &str = "frame.png";
const OUTPUT_FILE: &str = "thumbnail.jpg";

/// Where the thumbnail picture comes from.
#[derive(Debug, Clone, PartialEq)]
pub enum ThumbnailSource {
    /// A frame of a video at `at_secs`.
    Video { path: PathBuf, at_secs: f64 },
    /// A still image.
    Image { path: PathBuf },
    /// A solid ink card.
    Card,
}

/// Everything needed to draw a thumbnail.
#[derive(Debug, Clone, PartialEq)]
pub struct ThumbnailOptions {
    pub source: ThumbnailSource,
    pub title: String,
    pub brand: String,
    pub width: u32,
    pub height: u32,
    pub title_font_size: u32,
    pub brand_font_size: u32,
    /// JPEG quality (1-100).
    pub quality: u8,
    pub font: Option<PathBuf>,
}

static SIZE_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(\d+)[xX](\d+)$").unwrap());

/// Parse `WIDTHxHEIGHT`.
///
/// ```
/// use reelsmith::thumbnail::parse_size;
///
/// assert_eq!(parse_size("1280x720").unwrap(), (1280, 720));
/// assert!(parse_size("1280*720").is_err());
/// ```
pub fn parse_size(s: &str) -> Result<(u32, u32)> {
    let invalid = || Error::configuration(format!("size must look like 1280x720, got {s:?}"));
    let caps = SIZE_PATTERN.captures(s.trim()).ok_or_else(invalid)?;
    let width: u32 = caps[1].parse().map_err(|_| invalid())?;
    let height: u32 = caps[2].parse().map_err(|_| invalid())?;
    if width == 0 || height == 0 {
        return Err(invalid());
    }
    Ok((width, height))
}

#[derive(Debug, Clone, Copy)]
struct RoundedRect {
    x0: f64,
    y0: f64,
    x1: f64,
    y1: f64,
    radius: f64,
}

impl RoundedRect {
    fn contains(&self, x: f64, y: f64) -> bool {
        if x < self.x0 || x > self.x1 || y < self.y0 || y > self.y1 {
            return false;
        }
        let r = self.radius.min((self.x1 - self.x0) / 2.0).min((self.y1 - self.y0) / 2.0);
        let cx = x.clamp(self.x0 + r, self.x1 - r);
        let cy = y.clamp(self.y0 + r, self.y1 - r);
        (x - cx).powi(2) + (y - cy).powi(2) <= r * r
    }

    fn inset(&self, d: f64) -> Self {
        Self {
            x0: self.x0 + d,
            y0: self.y0 + d,
            x1: self.x1 - d,
            y1: self.y1 - d,
            radius: (self.radius - d).max(0.0),
        }
    }
}

/// Paint a rounded outline `width` pixels wide, `inset` pixels from the edges.
pub fn draw_frame_line(img: &mut RgbImage, inset: u32, width: u32, radius: u32, color: Rgb<u8>) {
    let (w, h) = img.dimensions();
    if 2 * inset >= w || 2 * inset >= h {
        return;
    }
    let outer = RoundedRect {
        x0: inset as f64,
        y0: inset as f64,
        x1: (w - inset) as f64,
        y1: (h - inset) as f64,
        radius: radius as f64,
    };
    let inner = outer.inset(width as f64);
    for (x, y, pixel) in img.enumerate_pixels_mut() {
        let (px, py) = (x as f64 + 0.5, y as f64 + 0.5);
        if outer.contains(px, py) && !inner.contains(px, py) {
            *pixel = color;
        }
    }
}

/// The two frame lines: outer teal, inner sand.
pub fn draw_frame_lines(img: &mut RgbImage) {
    draw_frame_line(img, 20, 14, 28, TEAL);
    draw_frame_line(img, 40, 10, 24, SAND);
}

/// Encode as JPEG at `quality`.
pub fn encode_jpeg(img: &RgbImage, quality: u8) -> Result<Vec<u8>> {
    let mut buf = Cursor::new(Vec::new());
    let encoder = JpegEncoder::new_with_quality(&mut buf, quality.clamp(1, 100));
    img.write_with_encoder(encoder)
        .map_err(|e| Error::encoding("thumbnail", format!("JPEG encoding failed: {e}")))?;
    Ok(buf.into_inner())
}

/// Draw the thumbnail described by `options` into `output`.
///
/// # Errors
///
/// - [`Error::Configuration`] when `ffmpeg` has no `drawtext` filter or the
///   source does not exist
/// - [`Error::Encoding`] when frame extraction or image checks fail
pub fn generate_thumbnail(tools: &Tools, options: &ThumbnailOptions, output: &Path) -> Result<PathBuf> {
    if !tools.supports_text() {
        return Err(Error::configuration(
            "ffmpeg has no drawtext filter (needs libfreetype); thumbnails need it for the title",
        ));
    }

    let parent = match output.parent() {
        Some(p) if !p.as_os_str().is_empty() => p.to_path_buf(),
        _ => PathBuf::from("."),
    };
    std::fs::create_dir_all(&parent)?;
    // ffmpeg runs inside the workspace, so every path it sees is absolute.
    let parent = std::fs::canonicalize(&parent)?;
    let workspace = Workspace::new_in(&parent).map_err(encoding("workspace"))?;
    let work_dir = workspace.path();

    write_text_file(work_dir, TITLE_FILE, &options.title).map_err(encoding("thumbnail text"))?;
    write_text_file(work_dir, BRAND_FILE, &options.brand).map_err(encoding("thumbnail text"))?;
    let font = stage_font(work_dir, options.font.as_deref(), FONT_FILE)
        .map_err(encoding("thumbnail text"))?;

    let (input, at_secs) = match &options.source {
        ThumbnailSource::Video { path, at_secs } => (resolve(path)?, Some(*at_secs)),
        ThumbnailSource::Image { path } => (resolve(path)?, None),
        ThumbnailSource::Card => {
            let card = RgbImage::from_pixel(options.width, options.height, INK);
            let card_path = workspace.file(CARD_FILE);
            card.save(&card_path)
                .map_err(|e| Error::encoding("thumbnail card", e.to_string()))?;
            (card_path, None)
        }
    };
    debug!(input = %input.display(), at = ?at_secs, "Thumbnail source");

    let title = TextOverlay::title(TITLE_FILE, options.title_font_size).with_font(font.clone());
    let mut brand = TextOverlay::brand(BRAND_FILE, options.brand_font_size)
        .with_font(font)
        .with_color(BRAND_COLOR);
    brand.margin = BRAND_MARGIN.max(options.brand_font_size);

    let mut overlays = Vec::new();
    if !options.title.trim().is_empty() {
        overlays.push(title);
    }
    if !options.brand.trim().is_empty() {
        overlays.push(brand);
    }

    let spec = FrameSpec {
        input,
        at_secs,
        width: options.width,
        height: options.height,
        overlays,
    };
    let frame_path = workspace.file(FRAME_FILE);
    extract_frame(&tools.ffmpeg, work_dir, &spec, &frame_path).map_err(encoding("thumbnail frame"))?;

    let mut img = image::open(&frame_path)
        .map_err(|e| Error::encoding("thumbnail", format!("cannot read extracted frame: {e}")))?
        .to_rgb8();
    if img.dimensions() != (options.width, options.height) {
        return Err(Error::encoding(
            "thumbnail",
            format!(
                "frame is {:?}, expected {}x{}",
                img.dimensions(),
                options.width,
                options.height
            ),
        ));
    }
    draw_frame_lines(&mut img);

    std::fs::write(workspace.file(OUTPUT_FILE), encode_jpeg(&img, options.quality)?)?;
    let dims = image::image_dimensions(workspace.file(OUTPUT_FILE))
        .map_err(|e| Error::encoding("thumbnail", e.to_string()))?;
    if dims != (options.width, options.height) {
        return Err(Error::encoding("thumbnail", format!("encoded size {dims:?} is wrong")));
    }

    let written = workspace.finalize(OUTPUT_FILE, output).map_err(encoding("finalize"))?;
    info!(output = %written.display(), width = options.width, height = options.height, "Thumbnail written");
    Ok(written)
}

fn resolve(path: &Path) -> Result<PathBuf> {
    std::fs::canonicalize(path)
        .map_err(|e| Error::configuration(format!("thumbnail source {}: {e}", path.display())))
}
