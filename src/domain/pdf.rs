//! PDF capture options.
//!
//! [`PdfOptions`] is the option bag exactly as configured: paper format or
//! explicit dimensions, margins, scale and header/footer templates. It is
//! resolved once into a [`PdfLayout`] whose lengths are all in inches, the
//! unit the browser's print API expects.

use serde::Deserialize;

use super::error::DomainError;

const CSS_PIXELS_PER_INCH: f64 = 96.0;
const DEFAULT_PAPER: PaperFormat = PaperFormat::Letter;
const MIN_SCALE: f64 = 0.1;
const MAX_SCALE: f64 = 2.0;

/// Named paper sizes, in inches (width × height, portrait).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PaperFormat {
    Letter,
    Legal,
    Tabloid,
    Ledger,
    A0,
    A1,
    A2,
    A3,
    A4,
    A5,
    A6,
}

impl PaperFormat {
    pub fn parse(name: &str) -> Option<Self> {
        let format = match name.trim().to_ascii_lowercase().as_str() {
            "letter" => Self::Letter,
            "legal" => Self::Legal,
            "tabloid" => Self::Tabloid,
            "ledger" => Self::Ledger,
            "a0" => Self::A0,
            "a1" => Self::A1,
            "a2" => Self::A2,
            "a3" => Self::A3,
            "a4" => Self::A4,
            "a5" => Self::A5,
            "a6" => Self::A6,
            _ => return None,
        };
        Some(format)
    }

    pub fn dimensions_in(self) -> (f64, f64) {
        match self {
            Self::Letter => (8.5, 11.0),
            Self::Legal => (8.5, 14.0),
            Self::Tabloid => (11.0, 17.0),
            Self::Ledger => (17.0, 11.0),
            Self::A0 => (33.1, 46.8),
            Self::A1 => (23.4, 33.1),
            Self::A2 => (16.54, 23.4),
            Self::A3 => (11.7, 16.54),
            Self::A4 => (8.27, 11.7),
            Self::A5 => (5.83, 8.27),
            Self::A6 => (4.13, 5.83),
        }
    }
}

/// A CSS length: a bare number of CSS pixels or a string with a unit.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum CssLength {
    Pixels(f64),
    Text(String),
}

impl CssLength {
    /// Convert to inches. Supported units are `px`, `in`, `cm` and `mm`;
    /// a unitless string is read as pixels.
    pub fn to_inches(&self, option: &'static str) -> Result<f64, DomainError> {
        let pixels = match self {
            Self::Pixels(value) => *value,
            Self::Text(text) => {
                let text = text.trim().to_ascii_lowercase();
                let (number, pixels_per_unit) = match text.len().checked_sub(2) {
                    Some(split) if text.is_char_boundary(split) => {
                        match text.split_at(split) {
                            (number, "px") => (number, 1.0),
                            (number, "in") => (number, CSS_PIXELS_PER_INCH),
                            (number, "cm") => (number, 37.8),
                            (number, "mm") => (number, 3.78),
                            _ => (text.as_str(), 1.0),
                        }
                    }
                    _ => (text.as_str(), 1.0),
                };
                let value: f64 = number.trim().parse().map_err(|_| {
                    DomainError::invalid_pdf_option(option, format!("unsupported length `{text}`"))
                })?;
                value * pixels_per_unit
            }
        };

        if !pixels.is_finite() || pixels < 0.0 {
            return Err(DomainError::invalid_pdf_option(
                option,
                "length must be a non-negative finite value",
            ));
        }
        Ok(pixels / CSS_PIXELS_PER_INCH)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct PdfMargin {
    pub top: Option<CssLength>,
    pub right: Option<CssLength>,
    pub bottom: Option<CssLength>,
    pub left: Option<CssLength>,
}

/// PDF options as written in configuration.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct PdfOptions {
    pub format: Option<String>,
    pub width: Option<CssLength>,
    pub height: Option<CssLength>,
    pub landscape: Option<bool>,
    #[serde(alias = "printBackground")]
    pub print_background: Option<bool>,
    pub scale: Option<f64>,
    pub margin: PdfMargin,
    #[serde(alias = "pageRanges")]
    pub page_ranges: Option<String>,
    #[serde(alias = "displayHeaderFooter")]
    pub display_header_footer: Option<bool>,
    #[serde(alias = "headerTemplate")]
    pub header_template: Option<String>,
    #[serde(alias = "footerTemplate")]
    pub footer_template: Option<String>,
    #[serde(alias = "preferCSSPageSize", alias = "preferCssPageSize")]
    pub prefer_css_page_size: Option<bool>,
}

/// Fully resolved print parameters; every length is in inches.
#[derive(Debug, Clone, PartialEq)]
pub struct PdfLayout {
    pub paper_width: f64,
    pub paper_height: f64,
    pub margin_top: f64,
    pub margin_right: f64,
    pub margin_bottom: f64,
    pub margin_left: f64,
    pub scale: f64,
    pub landscape: bool,
    pub print_background: bool,
    pub display_header_footer: bool,
    pub header_template: Option<String>,
    pub footer_template: Option<String>,
    pub page_ranges: Option<String>,
    pub prefer_css_page_size: bool,
}

impl Default for PdfLayout {
    fn default() -> Self {
        let (paper_width, paper_height) = DEFAULT_PAPER.dimensions_in();
        Self {
            paper_width,
            paper_height,
            margin_top: 0.0,
            margin_right: 0.0,
            margin_bottom: 0.0,
            margin_left: 0.0,
            scale: 1.0,
            landscape: false,
            print_background: false,
            display_header_footer: false,
            header_template: None,
            footer_template: None,
            page_ranges: None,
            prefer_css_page_size: false,
        }
    }
}

impl PdfOptions {
    /// Resolve the option bag. A named `format` wins over `width`/`height`;
    /// missing dimensions fall back to Letter.
    pub fn resolve(&self) -> Result<PdfLayout, DomainError> {
        let defaults = PdfLayout::default();

        let (paper_width, paper_height) = match self.format.as_deref() {
            Some(name) => PaperFormat::parse(name)
                .ok_or_else(|| {
                    DomainError::invalid_pdf_option("format", format!("unknown paper format `{name}`"))
                })?
                .dimensions_in(),
            None => (
                optional_inches(self.width.as_ref(), "width")?.unwrap_or(defaults.paper_width),
                optional_inches(self.height.as_ref(), "height")?.unwrap_or(defaults.paper_height),
            ),
        };
        if paper_width == 0.0 || paper_height == 0.0 {
            return Err(DomainError::invalid_pdf_option(
                "width",
                "paper dimensions must be greater than zero",
            ));
        }

        let scale = self.scale.unwrap_or(defaults.scale);
        if !(MIN_SCALE..=MAX_SCALE).contains(&scale) {
            return Err(DomainError::invalid_pdf_option(
                "scale",
                format!("must be between {MIN_SCALE} and {MAX_SCALE}, got {scale}"),
            ));
        }

        let page_ranges = self
            .page_ranges
            .as_deref()
            .map(str::trim)
            .filter(|ranges| !ranges.is_empty())
            .map(str::to_string);

        Ok(PdfLayout {
            paper_width,
            paper_height,
            margin_top: optional_inches(self.margin.top.as_ref(), "margin.top")?.unwrap_or(0.0),
            margin_right: optional_inches(self.margin.right.as_ref(), "margin.right")?
                .unwrap_or(0.0),
            margin_bottom: optional_inches(self.margin.bottom.as_ref(), "margin.bottom")?
                .unwrap_or(0.0),
            margin_left: optional_inches(self.margin.left.as_ref(), "margin.left")?.unwrap_or(0.0),
            scale,
            landscape: self.landscape.unwrap_or(false),
            print_background: self.print_background.unwrap_or(false),
            display_header_footer: self.display_header_footer.unwrap_or(false),
            header_template: self.header_template.clone(),
            footer_template: self.footer_template.clone(),
            page_ranges,
            prefer_css_page_size: self.prefer_css_page_size.unwrap_or(false),
        })
    }
}

fn optional_inches(
    length: Option<&CssLength>,
    option: &'static str,
) -> Result<Option<f64>, DomainError> {
    length.map(|length| length.to_inches(option)).transpose()
}
