//! Shared XLSX models: style descriptors, cell values, options and errors.

use std::collections::BTreeMap;
use std::str::FromStr;

use chrono::{NaiveDate, NaiveDateTime};

////////////////////////////////////////////////////////////////////////////////
// #region StyleAttributeEnums

/// Fill/font color choices accepted by a style descriptor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EnumStyleColor {
    Aqua,
    Black,
    Red,
    White,
    Yellow,
    /// 40% grey.
    Silver,
    /// Explicit `0xRRGGBB` value.
    Rgb(u32),
}

impl FromStr for EnumStyleColor {
    type Err = XlsxStyleError;

    /// Parse a color name (case-insensitive) or a `#RRGGBB` literal.
    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        let value = s.trim().to_ascii_lowercase();
        if let Some(hex) = value.strip_prefix('#') {
            if hex.len() == 6
                && let Ok(n) = u32::from_str_radix(hex, 16)
            {
                return Ok(Self::Rgb(n));
            }
            return Err(XlsxStyleError::UnsupportedAttribute(format!(
                "color literal {s:?} is not #RRGGBB"
            )));
        }
        match value.as_str() {
            "aqua" => Ok(Self::Aqua),
            "black" => Ok(Self::Black),
            "red" => Ok(Self::Red),
            "white" => Ok(Self::White),
            "yellow" => Ok(Self::Yellow),
            "silver" | "grey" | "gray" => Ok(Self::Silver),
            _ => Err(XlsxStyleError::UnsupportedAttribute(format!(
                "unsupported color: {s:?}"
            ))),
        }
    }
}

/// Cell fill pattern.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum EnumFillPattern {
    #[default]
    NoFill,
    SolidForeground,
}

impl FromStr for EnumFillPattern {
    type Err = XlsxStyleError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "none" | "no_fill" | "nofill" => Ok(Self::NoFill),
            "solid" | "solid_foreground" | "solidforeground" => Ok(Self::SolidForeground),
            _ => Err(XlsxStyleError::UnsupportedAttribute(format!(
                "unsupported fill pattern: {s:?}"
            ))),
        }
    }
}

/// Font weight.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum EnumFontWeight {
    Bold,
    #[default]
    Normal,
}

impl FromStr for EnumFontWeight {
    type Err = XlsxStyleError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "bold" | "true" => Ok(Self::Bold),
            "normal" | "false" => Ok(Self::Normal),
            _ => Err(XlsxStyleError::UnsupportedAttribute(format!(
                "unsupported font weight: {s:?}"
            ))),
        }
    }
}

/// Horizontal alignment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EnumStyleAlign {
    Left,
    Center,
    Right,
}

impl FromStr for EnumStyleAlign {
    type Err = XlsxStyleError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "left" => Ok(Self::Left),
            "center" | "centre" => Ok(Self::Center),
            "right" => Ok(Self::Right),
            _ => Err(XlsxStyleError::UnsupportedAttribute(format!(
                "unsupported alignment: {s:?}"
            ))),
        }
    }
}

/// Border line style applied to all four sides.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EnumStyleBorder {
    None,
    Thin,
    Medium,
    Dashed,
    Dotted,
    Thick,
    Double,
    Hair,
}

impl FromStr for EnumStyleBorder {
    type Err = XlsxStyleError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "none" | "0" => Ok(Self::None),
            "thin" | "1" => Ok(Self::Thin),
            "medium" | "2" => Ok(Self::Medium),
            "dashed" | "3" => Ok(Self::Dashed),
            "dotted" | "4" => Ok(Self::Dotted),
            "thick" | "5" => Ok(Self::Thick),
            "double" | "6" => Ok(Self::Double),
            "hair" | "7" => Ok(Self::Hair),
            _ => Err(XlsxStyleError::UnsupportedAttribute(format!(
                "unsupported border: {s:?}"
            ))),
        }
    }
}

// #endregion
////////////////////////////////////////////////////////////////////////////////
// #region StyleDescriptor

/// Declarative bundle of formatting attributes, keyed by the name it is declared under.
///
/// `None` fields leave the container default in place.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct SpecStyleDescriptor {
    /// Fill color.
    pub foreground_color: Option<EnumStyleColor>,
    /// Pattern background color; alone it fills the cell.
    pub background_color: Option<EnumStyleColor>,
    /// Fill pattern.
    pub foreground_pattern: Option<EnumFillPattern>,
    /// Font weight.
    pub bold: Option<EnumFontWeight>,
    /// Italic font.
    pub italic: Option<bool>,
    /// Font family name.
    pub font_name: Option<String>,
    /// Font height in points.
    pub font_height: Option<f64>,
    /// Font color.
    pub font_color: Option<EnumStyleColor>,
    /// Number/date format code; empty string means none.
    pub data_format: Option<String>,
    /// Excel built-in number format index, used when `data_format` is unset.
    pub data_format_builtin: Option<u8>,
    /// Horizontal alignment.
    pub align: Option<EnumStyleAlign>,
    /// Border style for all sides.
    pub border: Option<EnumStyleBorder>,
    /// Top border; overrides `border` on that side.
    pub border_top: Option<EnumStyleBorder>,
    /// Bottom border; overrides `border` on that side.
    pub border_bottom: Option<EnumStyleBorder>,
    /// Left border; overrides `border` on that side.
    pub border_left: Option<EnumStyleBorder>,
    /// Right border; overrides `border` on that side.
    pub border_right: Option<EnumStyleBorder>,
    /// Text wrap.
    pub text_wrap: Option<bool>,
    /// Shrink text to fit the cell.
    pub shrink_to_fit: Option<bool>,
}

impl SpecStyleDescriptor {
    /// Return a new descriptor by overlaying `patch` onto `self`.
    pub fn with_(&self, patch: SpecStyleDescriptor) -> SpecStyleDescriptor {
        self.merge(&patch)
    }

    /// Merge two descriptors with right-side non-`None` overwrite semantics.
    pub fn merge(&self, other: &SpecStyleDescriptor) -> SpecStyleDescriptor {
        SpecStyleDescriptor {
            foreground_color: other.foreground_color.or(self.foreground_color),
            background_color: other.background_color.or(self.background_color),
            foreground_pattern: other.foreground_pattern.or(self.foreground_pattern),
            bold: other.bold.or(self.bold),
            italic: other.italic.or(self.italic),
            font_name: other.font_name.clone().or_else(|| self.font_name.clone()),
            font_height: other.font_height.or(self.font_height),
            font_color: other.font_color.or(self.font_color),
            data_format: other
                .data_format
                .clone()
                .or_else(|| self.data_format.clone()),
            data_format_builtin: other.data_format_builtin.or(self.data_format_builtin),
            align: other.align.or(self.align),
            border: other.border.or(self.border),
            border_top: other.border_top.or(self.border_top),
            border_bottom: other.border_bottom.or(self.border_bottom),
            border_left: other.border_left.or(self.border_left),
            border_right: other.border_right.or(self.border_right),
            text_wrap: other.text_wrap.or(self.text_wrap),
            shrink_to_fit: other.shrink_to_fit.or(self.shrink_to_fit),
        }
    }

    /// Build a descriptor from textual key/value attributes, e.g. loaded from configuration.
    ///
    /// Unknown keys and out-of-enumeration values fail with
    /// [`XlsxStyleError::UnsupportedAttribute`].
    pub fn from_attributes(dict_attrs: &BTreeMap<String, String>) -> Result<Self> {
        let mut spec = SpecStyleDescriptor::default();
        for (key, value) in dict_attrs {
            match key.as_str() {
                "foreground_color" | "fill_color" => {
                    spec.foreground_color = Some(value.parse()?);
                }
                "background_color" | "bg_color" => {
                    spec.background_color = Some(value.parse()?);
                }
                "foreground_pattern" | "pattern" => {
                    spec.foreground_pattern = Some(value.parse()?);
                }
                "bold" => spec.bold = Some(value.parse()?),
                "italic" => spec.italic = Some(parse_flag(key, value)?),
                "font_name" => spec.font_name = Some(value.clone()),
                "font_height" | "font_size" => {
                    let n_height = value.trim().parse::<f64>().map_err(|_| {
                        XlsxStyleError::UnsupportedAttribute(format!(
                            "font_height is not a number: {value:?}"
                        ))
                    })?;
                    spec.font_height = Some(n_height);
                }
                "font_color" => spec.font_color = Some(value.parse()?),
                "data_format" | "num_format" => spec.data_format = Some(value.clone()),
                "data_format_builtin" | "num_format_index" => {
                    let n_index = value.trim().parse::<u8>().map_err(|_| {
                        XlsxStyleError::UnsupportedAttribute(format!(
                            "data_format_builtin is not an index: {value:?}"
                        ))
                    })?;
                    spec.data_format_builtin = Some(n_index);
                }
                "align" => spec.align = Some(value.parse()?),
                "border" => spec.border = Some(value.parse()?),
                "border_top" => spec.border_top = Some(value.parse()?),
                "border_bottom" => spec.border_bottom = Some(value.parse()?),
                "border_left" => spec.border_left = Some(value.parse()?),
                "border_right" => spec.border_right = Some(value.parse()?),
                "text_wrap" => spec.text_wrap = Some(parse_flag(key, value)?),
                "shrink_to_fit" => spec.shrink_to_fit = Some(parse_flag(key, value)?),
                _ => {
                    return Err(XlsxStyleError::UnsupportedAttribute(format!(
                        "unknown style attribute: {key:?}"
                    )));
                }
            }
        }
        Ok(spec)
    }

    /// Non-empty number format code, if any.
    pub fn data_format_code(&self) -> Option<&str> {
        self.data_format.as_deref().filter(|code| !code.is_empty())
    }
}

fn parse_flag(key: &str, value: &str) -> Result<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "true" | "1" | "yes" => Ok(true),
        "false" | "0" | "no" => Ok(false),
        _ => Err(XlsxStyleError::UnsupportedAttribute(format!(
            "{key} expects a boolean, got {value:?}"
        ))),
    }
}

// #endregion
////////////////////////////////////////////////////////////////////////////////
// #region CellValues

/// Raw value handed to the writer at the call boundary.
#[derive(Debug, Clone, PartialEq)]
pub enum EnumCellInput {
    /// Absent value; rejected by the normalizer.
    Missing,
    /// Date/time value.
    Date(NaiveDateTime),
    /// Floating point value, possibly NaN/Inf.
    Number(f64),
    /// Integer value.
    Integer(i64),
    /// Boolean value, stored as text.
    Boolean(bool),
    /// Text value.
    Text(String),
}

/// Normalized storage kind of one cell.
#[derive(Debug, Clone, PartialEq)]
pub enum EnumCellValue {
    /// Numeric value.
    Number(f64),
    /// Date value, stored numerically by the container.
    Date(NaiveDateTime),
    /// Text value (including the NaN/Inf sentinels).
    Text(String),
    /// Formatted cell without a value.
    Blank,
}

impl From<f64> for EnumCellInput {
    fn from(value: f64) -> Self {
        Self::Number(value)
    }
}

impl From<f32> for EnumCellInput {
    fn from(value: f32) -> Self {
        Self::Number(value as f64)
    }
}

impl From<i64> for EnumCellInput {
    fn from(value: i64) -> Self {
        Self::Integer(value)
    }
}

impl From<i32> for EnumCellInput {
    fn from(value: i32) -> Self {
        Self::Integer(value as i64)
    }
}

impl From<u32> for EnumCellInput {
    fn from(value: u32) -> Self {
        Self::Integer(value as i64)
    }
}

impl From<bool> for EnumCellInput {
    fn from(value: bool) -> Self {
        Self::Boolean(value)
    }
}

impl From<&str> for EnumCellInput {
    fn from(value: &str) -> Self {
        Self::Text(value.to_string())
    }
}

impl From<String> for EnumCellInput {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}

impl From<&String> for EnumCellInput {
    fn from(value: &String) -> Self {
        Self::Text(value.clone())
    }
}

impl From<NaiveDateTime> for EnumCellInput {
    fn from(value: NaiveDateTime) -> Self {
        Self::Date(value)
    }
}

impl From<NaiveDate> for EnumCellInput {
    fn from(value: NaiveDate) -> Self {
        Self::Date(value.and_time(chrono::NaiveTime::default()))
    }
}

impl<T: Into<EnumCellInput>> From<Option<T>> for EnumCellInput {
    fn from(value: Option<T>) -> Self {
        match value {
            Some(val) => val.into(),
            None => Self::Missing,
        }
    }
}

// #endregion
////////////////////////////////////////////////////////////////////////////////
// #region WriteOptions

/// Replacement text for non-finite numbers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpecXlsxValuePolicy {
    /// Replacement text for NaN.
    pub nan_str: String,
    /// Replacement text for positive infinity.
    pub posinf_str: String,
    /// Replacement text for negative infinity.
    pub neginf_str: String,
}

impl Default for SpecXlsxValuePolicy {
    fn default() -> Self {
        Self {
            nan_str: "NaN".to_string(),
            posinf_str: "Inf".to_string(),
            neginf_str: "-Inf".to_string(),
        }
    }
}

/// Width bounds used by `auto_size_column`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpecAutofitCellsPolicy {
    /// Minimum final width.
    pub width_cell_min: usize,
    /// Maximum final width.
    pub width_cell_max: usize,
    /// Width padding added after inference.
    pub width_cell_padding: usize,
}

impl Default for SpecAutofitCellsPolicy {
    fn default() -> Self {
        Self {
            width_cell_min: 8,
            width_cell_max: 60,
            width_cell_padding: 2,
        }
    }
}

/// Writer-wide options.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpecWriterOptions {
    /// Number format of the default date style.
    pub date_format: String,
    /// Non-finite number replacement policy.
    pub value_policy: SpecXlsxValuePolicy,
    /// Column auto-size policy.
    pub policy_autofit: SpecAutofitCellsPolicy,
}

impl Default for SpecWriterOptions {
    fn default() -> Self {
        Self {
            date_format: crate::conf::C_DATE_FORMAT_DEFAULT.to_string(),
            value_policy: SpecXlsxValuePolicy::default(),
            policy_autofit: SpecAutofitCellsPolicy::default(),
        }
    }
}

// #endregion
////////////////////////////////////////////////////////////////////////////////
// #region Errors

/// Failures surfaced by the style registry and workbook writer.
#[derive(Debug, thiserror::Error)]
pub enum XlsxStyleError {
    /// A referenced style name was never declared.
    #[error("Style not found: {0:?}")]
    UnknownStyle(String),

    /// A style name was declared twice.
    #[error("Style already declared: {0:?}")]
    DuplicateStyle(String),

    /// A descriptor attribute is outside the supported set.
    #[error("Unsupported style attribute: {0}")]
    UnsupportedAttribute(String),

    /// A write carried no value.
    #[error("Invalid cell value: {0}")]
    InvalidValue(String),

    /// Row/column outside Excel limits.
    #[error("Invalid cell address: {0}")]
    InvalidAddress(String),

    /// Worksheet name rejected by Excel naming rules.
    #[error("Invalid worksheet name {name:?}: {reason}")]
    InvalidSheetName {
        /// Offending name.
        name: String,
        /// Rule that was broken.
        reason: String,
    },

    /// Explicit worksheet creation hit an existing name.
    #[error("Worksheet already exists: {0:?}")]
    DuplicateWorksheet(String),

    /// The writer was used after `dispose()`.
    #[error("Cannot use workbook writer after dispose().")]
    Disposed,

    /// Encoding error from the container library.
    #[error("xlsx write error: {0}")]
    Xlsx(#[from] rust_xlsxwriter::XlsxError),

    /// I/O error while persisting output.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Convenience alias used throughout the crate.
pub type Result<T> = std::result::Result<T, XlsxStyleError>;

// #endregion
////////////////////////////////////////////////////////////////////////////////

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_merge_overlays_only_set_fields() {
        let base = SpecStyleDescriptor {
            font_name: Some("Arial".to_string()),
            font_height: Some(10.0),
            bold: Some(EnumFontWeight::Normal),
            ..Default::default()
        };
        let merged = base.with_(SpecStyleDescriptor {
            bold: Some(EnumFontWeight::Bold),
            data_format: Some("0.00".to_string()),
            ..Default::default()
        });

        assert_eq!(merged.font_name.as_deref(), Some("Arial"));
        assert_eq!(merged.font_height, Some(10.0));
        assert_eq!(merged.bold, Some(EnumFontWeight::Bold));
        assert_eq!(merged.data_format_code(), Some("0.00"));
    }

    #[test]
    fn test_empty_data_format_is_treated_as_absent() {
        let spec = SpecStyleDescriptor {
            data_format: Some(String::new()),
            ..Default::default()
        };
        assert_eq!(spec.data_format_code(), None);
    }

    #[test]
    fn test_from_attributes_parses_known_keys() {
        let dict_attrs: BTreeMap<String, String> = [
            ("foreground_color", "#FF8800"),
            ("foreground_pattern", "solid"),
            ("bold", "Bold"),
            ("font_height", "12"),
            ("align", "center"),
            ("border", "thin"),
            ("border_bottom", "double"),
            ("bg_color", "yellow"),
            ("data_format", "#,##0.00"),
            ("num_format_index", "14"),
        ]
        .into_iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();

        let spec = SpecStyleDescriptor::from_attributes(&dict_attrs).expect("parse");
        assert_eq!(spec.foreground_color, Some(EnumStyleColor::Rgb(0xFF8800)));
        assert_eq!(
            spec.foreground_pattern,
            Some(EnumFillPattern::SolidForeground)
        );
        assert_eq!(spec.bold, Some(EnumFontWeight::Bold));
        assert_eq!(spec.font_height, Some(12.0));
        assert_eq!(spec.align, Some(EnumStyleAlign::Center));
        assert_eq!(spec.border, Some(EnumStyleBorder::Thin));
        assert_eq!(spec.border_bottom, Some(EnumStyleBorder::Double));
        assert_eq!(spec.border_top, None);
        assert_eq!(spec.background_color, Some(EnumStyleColor::Yellow));
        assert_eq!(spec.data_format_builtin, Some(14));
        assert_eq!(spec.data_format_code(), Some("#,##0.00"));
    }

    #[test]
    fn test_from_attributes_rejects_unsupported_values() {
        for (key, value) in [
            ("foreground_color", "magenta"),
            ("foreground_pattern", "checkerboard"),
            ("bold", "heavy"),
            ("align", "justify"),
            ("font_height", "big"),
            ("border_left", "wavy"),
            ("data_format_builtin", "300"),
            ("sparkle", "true"),
        ] {
            let dict_attrs = BTreeMap::from([(key.to_string(), value.to_string())]);
            let err = SpecStyleDescriptor::from_attributes(&dict_attrs).unwrap_err();
            assert!(
                matches!(err, XlsxStyleError::UnsupportedAttribute(_)),
                "{key}={value} gave {err:?}"
            );
        }
    }

    #[test]
    fn test_optional_input_maps_none_to_missing() {
        assert_eq!(EnumCellInput::from(None::<f64>), EnumCellInput::Missing);
        assert_eq!(EnumCellInput::from(Some(2.5)), EnumCellInput::Number(2.5));
        assert_eq!(EnumCellInput::from(7i32), EnumCellInput::Integer(7));
    }
}
