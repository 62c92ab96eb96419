//! `drawtext` filter construction.
//!
//! Text is never inlined into the filter graph. It is written to a file in the
//! working directory and referenced with `textfile=` plus `expansion=none`, so
//! captions may contain quotes, colons, percent signs or commas without any
//! escaping. Font files are referenced the same way.

use std::path::Path;

use crate::Result;

/// Where a text block is anchored on the frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextPosition {
    /// Horizontally centred, near the bottom edge (captions).
    BottomCenter,
    /// Centred both ways (thumbnail titles).
    Center,
    /// Bottom right corner (brand marks).
    BottomRight,
}

impl TextPosition {
    fn xy(&self, margin: u32) -> (String, String) {
        match self {
            Self::BottomCenter => ("(w-text_w)/2".to_string(), format!("h-text_h-{margin}")),
            Self::Center => ("(w-text_w)/2".to_string(), "(h-text_h)/2".to_string()),
            Self::BottomRight => (format!("w-text_w-{margin}"), format!("h-text_h-{margin}")),
        }
    }
}

/// One `drawtext` overlay.
#[derive(Debug, Clone, PartialEq)]
pub struct TextOverlay {
    /// File name (relative to the working directory) holding the text.
    pub text_file: String,
    /// Font file name relative to the working directory; fontconfig default
    /// when `None`.
    pub font_file: Option<String>,
    pub font_size: u32,
    pub color: String,
    pub position: TextPosition,
    pub margin: u32,
    /// Semi-transparent box behind the text.
    pub boxed: bool,
    /// Outline width in pixels; 0 disables.
    pub border: u32,
    /// Show the text only between these times (seconds).
    pub enable_between: Option<(f64, f64)>,
}

impl TextOverlay {
    /// A bottom-centred boxed caption.
    pub fn caption(text_file: impl Into<String>, font_size: u32) -> Self {
        Self {
            text_file: text_file.into(),
            font_file: None,
            font_size,
            color: "white".to_string(),
            position: TextPosition::BottomCenter,
            margin: font_size * 2,
            boxed: true,
            border: 0,
            enable_between: None,
        }
    }

    /// A centred outlined title.
    pub fn title(text_file: impl Into<String>, font_size: u32) -> Self {
        Self {
            text_file: text_file.into(),
            font_file: None,
            font_size,
            color: "white".to_string(),
            position: TextPosition::Center,
            margin: 0,
            boxed: false,
            border: (font_size / 16).max(2),
            enable_between: None,
        }
    }

    /// A small bottom-right brand mark.
    pub fn brand(text_file: impl Into<String>, font_size: u32) -> Self {
        Self {
            text_file: text_file.into(),
            font_file: None,
            font_size,
            color: "white@0.9".to_string(),
            position: TextPosition::BottomRight,
            margin: font_size,
            boxed: false,
            border: 2,
            enable_between: None,
        }
    }

    pub fn with_font(mut self, font_file: Option<String>) -> Self {
        self.font_file = font_file;
        self
    }

    pub fn with_color(mut self, color: impl Into<String>) -> Self {
        self.color = color.into();
        self
    }

    pub fn between(mut self, start: f64, end: f64) -> Self {
        self.enable_between = Some((start, end));
        self
    }

    /// Render as a `drawtext=...` filter.
    pub fn to_filter(&self) -> String {
        let (x, y) = self.position.xy(self.margin);
        let mut opts = vec![format!("textfile={}", self.text_file), "expansion=none".to_string()];
        if let Some(ref font) = self.font_file {
            opts.push(format!("fontfile={font}"));
        }
        opts.push(format!("fontsize={}", self.font_size));
        opts.push(format!("fontcolor={}", self.color));
        opts.push(format!("x={x}"));
        opts.push(format!("y={y}"));
        if self.boxed {
            opts.push("box=1".to_string());
            opts.push("boxcolor=black@0.45".to_string());
            opts.push(format!("boxborderw={}", (self.font_size / 3).max(4)));
        }
        if self.border > 0 {
            opts.push(format!("borderw={}", self.border));
            opts.push("bordercolor=black@0.8".to_string());
        }
        if let Some((start, end)) = self.enable_between {
            opts.push(format!("enable='between(t,{start:.3},{end:.3})'"));
        }
        format!("drawtext={}", opts.join(":"))
    }
}

/// Write overlay text into `dir/name`.
///
/// Trailing newlines are stripped since drawtext renders them as an empty line.
pub fn write_text_file(dir: &Path, name: &str, text: &str) -> Result<()> {
    std::fs::write(dir.join(name), text.trim_end_matches(['\n', '\r']))?;
    Ok(())
}

/// Copy a font into `dir` as `name` so filters can refer to it relatively.
pub fn stage_font(dir: &Path, font: Option<&Path>, name: &str) -> Result<Option<String>> {
    match font {
        Some(font) => {
            if !font.exists() {
                return Err(crate::Error::missing_input(font));
            }
            std::fs::copy(font, dir.join(name))?;
            Ok(Some(name.to_string()))
        }
        None => Ok(None),
    }
}
