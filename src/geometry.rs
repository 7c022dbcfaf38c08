//! Container geometry and the fit spec derived from it
//!
//! All lengths are points. [`resolve_fit`] never fails: missing or invalid
//! declarations fall back to documented defaults.

use crate::font::FontRequest;
use serde::{Deserialize, Serialize};

/// EMU per point, as presentation templates declare boxes
pub const EMU_PER_PT: f32 = 12_700.0;

/// Font size used when the container declares none
pub const DEFAULT_FONT_SIZE_PT: f32 = 60.0;

/// Line spacing multiplier used when the container declares none
pub const DEFAULT_LINE_SPACING: f32 = 1.10;

/// Family used when the container declares none
pub const DEFAULT_FONT_FAMILY: &str = "DejaVu Sans";

/// Box used when the container declares no usable size
pub const DEFAULT_BOX_PT: (f32, f32) = (600.0, 300.0);

/// Smallest usable dimension after margins
pub const MIN_USABLE_PT: f32 = 10.0;

/// Lines never get tighter than this multiple of the font size
const MIN_LINE_FACTOR: f32 = 1.05;

/// Internal margins of a text box
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Margins {
    pub left: f32,
    pub right: f32,
    pub top: f32,
    pub bottom: f32,
}

/// Declared line spacing of the container's first paragraph
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LineSpacing {
    /// Multiple of the font size
    Multiple(f32),
    /// Exact distance between baselines
    Points(f32),
}

impl LineSpacing {
    /// Interpret a bare number: values above 3 are points, the rest multipliers
    pub fn from_raw(value: f32) -> Self {
        if value > 3.0 {
            LineSpacing::Points(value)
        } else {
            LineSpacing::Multiple(value)
        }
    }

    /// Multiplier relative to `font_size_pt`
    pub fn factor(&self, font_size_pt: f32) -> f32 {
        let factor = match *self {
            LineSpacing::Multiple(m) => m,
            LineSpacing::Points(pt) => pt / font_size_pt.max(1.0),
        };
        if factor.is_finite() && factor > 0.0 {
            factor
        } else {
            DEFAULT_LINE_SPACING
        }
    }
}

/// A container's declared box and text properties
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ContainerGeometry {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
    pub margins: Margins,
    pub font_family: Option<String>,
    pub font_size_pt: Option<f32>,
    pub line_spacing: Option<LineSpacing>,
}

impl ContainerGeometry {
    pub fn new(width: f32, height: f32) -> Self {
        Self {
            width,
            height,
            ..Self::default()
        }
    }

    /// Build from EMU box and margins
    pub fn from_emu(x: i64, y: i64, width: i64, height: i64, margins_emu: [i64; 4]) -> Self {
        let pt = |emu: i64| emu as f32 / EMU_PER_PT;
        Self {
            x: pt(x),
            y: pt(y),
            width: pt(width),
            height: pt(height),
            margins: Margins {
                left: pt(margins_emu[0]),
                right: pt(margins_emu[1]),
                top: pt(margins_emu[2]),
                bottom: pt(margins_emu[3]),
            },
            ..Self::default()
        }
    }

    pub fn with_margins(mut self, margins: Margins) -> Self {
        self.margins = margins;
        self
    }

    pub fn with_font(mut self, family: impl Into<String>, size_pt: f32) -> Self {
        self.font_family = Some(family.into());
        self.font_size_pt = Some(size_pt);
        self
    }

    pub fn with_line_spacing(mut self, spacing: LineSpacing) -> Self {
        self.line_spacing = Some(spacing);
        self
    }

    fn has_box(&self) -> bool {
        self.width.is_finite() && self.height.is_finite() && self.width > 0.0 && self.height > 0.0
    }

    /// Usable content width
    pub fn content_width(&self) -> f32 {
        let (width, _) = self.box_size();
        (width - self.margins.left - self.margins.right).max(MIN_USABLE_PT)
    }

    /// Usable content height
    pub fn content_height(&self) -> f32 {
        let (_, height) = self.box_size();
        (height - self.margins.top - self.margins.bottom).max(MIN_USABLE_PT)
    }

    fn box_size(&self) -> (f32, f32) {
        if self.has_box() {
            (self.width, self.height)
        } else {
            DEFAULT_BOX_PT
        }
    }

    fn font_size(&self) -> f32 {
        match self.font_size_pt {
            Some(size) if size.is_finite() && size > 0.0 => size,
            _ => DEFAULT_FONT_SIZE_PT,
        }
    }

    fn font_family(&self) -> String {
        match self.font_family.as_deref().map(str::trim) {
            Some(family) if !family.is_empty() => family.to_string(),
            _ => DEFAULT_FONT_FAMILY.to_string(),
        }
    }
}

/// Named safety/spacing presets
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FitPreset {
    Tight,
    #[default]
    Normal,
    Loose,
}

impl FitPreset {
    /// Parse a preset name; unknown names mean normal
    pub fn parse(name: &str) -> Self {
        match name.trim().to_ascii_lowercase().as_str() {
            "tight" => FitPreset::Tight,
            "loose" => FitPreset::Loose,
            _ => FitPreset::Normal,
        }
    }

    /// Inter-unit gap as a fraction of line height
    pub fn gap_fraction(self) -> f32 {
        match self {
            FitPreset::Tight => 0.25,
            FitPreset::Normal => 0.33,
            FitPreset::Loose => 0.40,
        }
    }

    pub fn width_safety(self) -> f32 {
        match self {
            FitPreset::Tight => 0.965,
            FitPreset::Normal => 0.97,
            FitPreset::Loose => 0.98,
        }
    }

    pub fn height_safety(self) -> f32 {
        match self {
            FitPreset::Tight => 0.975,
            FitPreset::Normal => 0.98,
            FitPreset::Loose => 0.985,
        }
    }
}

/// Caller overrides applied on top of a preset
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct FitOverrides {
    pub gap_fraction: Option<f32>,
    pub width_safety: Option<f32>,
    pub height_safety: Option<f32>,
    pub line_spacing: Option<f32>,
    pub font_family: Option<String>,
    pub font_size_pt: Option<f32>,
}

/// Preset plus overrides, passed explicitly to [`resolve_fit_with`]
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct FitConfig {
    pub preset: FitPreset,
    pub overrides: FitOverrides,
}

impl FitConfig {
    pub fn preset(preset: FitPreset) -> Self {
        Self {
            preset,
            overrides: FitOverrides::default(),
        }
    }
}

/// Resolved usable geometry for one container
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FitSpec {
    pub usable_width: f32,
    pub usable_height: f32,
    pub line_height: f32,
    pub unit_gap: f32,
    pub width_safety: f32,
    pub height_safety: f32,
    pub font: FontRequest,
}

impl FitSpec {
    /// Widest a display line may measure
    pub fn max_line_width(&self) -> f32 {
        self.usable_width * self.width_safety
    }

    /// Tallest a page may be
    pub fn max_page_height(&self) -> f32 {
        self.usable_height * self.height_safety
    }

    /// Lines an empty page holds without gaps, at least one
    pub fn line_capacity(&self) -> usize {
        ((self.max_page_height() / self.line_height).floor() as usize).max(1)
    }
}

/// Resolve a container against a named preset
pub fn resolve_fit(geometry: &ContainerGeometry, preset: FitPreset) -> FitSpec {
    resolve_fit_with(geometry, &FitConfig::preset(preset))
}

/// Resolve a container against a preset plus overrides
pub fn resolve_fit_with(geometry: &ContainerGeometry, config: &FitConfig) -> FitSpec {
    if !geometry.has_box() {
        log::warn!(
            "container declares no usable box ({}x{}), using {:?}",
            geometry.width,
            geometry.height,
            DEFAULT_BOX_PT
        );
    }

    let overrides = &config.overrides;
    let preset = config.preset;

    let font_size = positive(overrides.font_size_pt).unwrap_or_else(|| geometry.font_size());
    let family = overrides
        .font_family
        .clone()
        .filter(|f| !f.trim().is_empty())
        .unwrap_or_else(|| geometry.font_family());

    let mut line_factor = positive(overrides.line_spacing).unwrap_or_else(|| {
        geometry
            .line_spacing
            .map(|spacing| spacing.factor(font_size))
            .unwrap_or(DEFAULT_LINE_SPACING)
    });
    if preset == FitPreset::Tight {
        line_factor = line_factor.max(MIN_LINE_FACTOR);
    }
    let line_height = (font_size * line_factor).max(font_size * MIN_LINE_FACTOR);

    let gap_fraction = overrides
        .gap_fraction
        .filter(|g| g.is_finite() && *g >= 0.0)
        .unwrap_or_else(|| preset.gap_fraction());

    let fit = FitSpec {
        usable_width: geometry.content_width(),
        usable_height: geometry.content_height(),
        line_height,
        unit_gap: line_height * gap_fraction,
        width_safety: safety(overrides.width_safety, preset.width_safety()),
        height_safety: safety(overrides.height_safety, preset.height_safety()),
        font: FontRequest::new(family, font_size),
    };
    log::debug!("resolved fit spec {:?} with preset {:?}", fit, preset);
    fit
}

fn positive(value: Option<f32>) -> Option<f32> {
    value.filter(|v| v.is_finite() && *v > 0.0)
}

fn safety(value: Option<f32>, default: f32) -> f32 {
    value
        .filter(|v| v.is_finite() && *v > 0.0 && *v <= 1.0)
        .unwrap_or(default)
}
