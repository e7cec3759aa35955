//! Named style registry: declared descriptors plus lazily compiled, memoized formats.

use std::collections::BTreeMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use parking_lot::Mutex;
use rust_xlsxwriter::{Color, Format, FormatAlign, FormatBorder, FormatPattern};

use crate::conf::{
    C_DATE_STYLE_NAME, C_WRAP_STYLE_NAME, N_FONT_HEIGHT_MAX, N_NUM_FORMAT_BUILTIN_MAX,
};
use crate::spec::{
    EnumFillPattern, EnumFontWeight, EnumStyleAlign, EnumStyleBorder, EnumStyleColor, Result,
    SpecStyleDescriptor, XlsxStyleError,
};

////////////////////////////////////////////////////////////////////////////////
// #region CompiledStyle

/// A descriptor bound to a container-native [`Format`].
///
/// Handed out as `Arc<CompiledStyle>`; two cells share a style exactly when
/// their handles are `Arc::ptr_eq`.
#[derive(Debug)]
pub struct CompiledStyle {
    name: String,
    format: Format,
}

impl CompiledStyle {
    /// Name the style was resolved under.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Container format written with every cell bound to this style.
    pub fn format(&self) -> &Format {
        &self.format
    }

    /// Style applied to date cells that carry no explicit style.
    pub(crate) fn new_date(date_format: &str) -> Self {
        Self {
            name: C_DATE_STYLE_NAME.to_string(),
            format: Format::new().set_num_format(date_format),
        }
    }

    /// One-off style carrying only the wrap-text flag; never cached.
    pub(crate) fn new_wrap_text(if_wrap: bool) -> Self {
        let format = if if_wrap {
            Format::new().set_text_wrap()
        } else {
            Format::new()
        };
        Self {
            name: C_WRAP_STYLE_NAME.to_string(),
            format,
        }
    }
}

// #endregion
////////////////////////////////////////////////////////////////////////////////
// #region StyleRegistry

/// Mapping of style name to declared descriptor and to its compiled handle.
///
/// Declaration needs `&mut self`; resolution only `&self`. The compile-or-fetch
/// step holds one lock, so concurrent resolution of an uncompiled name yields a
/// single shared handle.
#[derive(Debug, Default)]
pub struct StyleRegistry {
    dict_descriptors: BTreeMap<String, SpecStyleDescriptor>,
    dict_compiled: Mutex<BTreeMap<String, Arc<CompiledStyle>>>,
    n_compiles: AtomicUsize,
}

impl StyleRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `descriptor` under `name`. Redeclaring a name is rejected.
    pub fn declare_style(&mut self, name: &str, descriptor: SpecStyleDescriptor) -> Result<()> {
        if name.is_empty() {
            return Err(XlsxStyleError::UnsupportedAttribute(
                "style name must not be empty".to_string(),
            ));
        }
        if self.dict_descriptors.contains_key(name) {
            return Err(XlsxStyleError::DuplicateStyle(name.to_string()));
        }
        self.dict_descriptors.insert(name.to_string(), descriptor);
        Ok(())
    }

    /// Return the compiled handle for `name`, compiling and caching it on first use.
    pub fn resolve_style(&self, name: &str) -> Result<Arc<CompiledStyle>> {
        let Some(descriptor) = self.dict_descriptors.get(name) else {
            return Err(XlsxStyleError::UnknownStyle(name.to_string()));
        };

        let mut dict_compiled = self.dict_compiled.lock();
        if let Some(style) = dict_compiled.get(name) {
            return Ok(Arc::clone(style));
        }

        let style = Arc::new(CompiledStyle {
            name: name.to_string(),
            format: derive_rust_xlsx_format(descriptor)?,
        });
        dict_compiled.insert(name.to_string(), Arc::clone(&style));
        self.n_compiles.fetch_add(1, Ordering::Relaxed);
        log::debug!("compiled style {name:?}");

        Ok(style)
    }

    /// Declared descriptor for `name`.
    pub fn descriptor(&self, name: &str) -> Option<&SpecStyleDescriptor> {
        self.dict_descriptors.get(name)
    }

    /// Whether `name` has been declared.
    pub fn is_declared(&self, name: &str) -> bool {
        self.dict_descriptors.contains_key(name)
    }

    /// Whether `name` has a cached compiled handle.
    pub fn is_compiled(&self, name: &str) -> bool {
        self.dict_compiled.lock().contains_key(name)
    }

    /// Declared names in sorted order.
    pub fn declared_names(&self) -> Vec<String> {
        self.dict_descriptors.keys().cloned().collect()
    }

    /// Number of cached compiled styles.
    pub fn compiled_count(&self) -> usize {
        self.dict_compiled.lock().len()
    }

    /// Number of compilations performed over the registry's lifetime.
    pub fn compile_count(&self) -> usize {
        self.n_compiles.load(Ordering::Relaxed)
    }

    /// Drop every descriptor and compiled handle.
    pub(crate) fn clear(&mut self) {
        self.dict_descriptors.clear();
        self.dict_compiled.get_mut().clear();
    }
}

// #endregion
////////////////////////////////////////////////////////////////////////////////
// #region FormatCompilation

fn derive_rust_xlsx_format(spec: &SpecStyleDescriptor) -> Result<Format> {
    let mut format = Format::new();

    if let Some(val) = &spec.font_name
        && !val.is_empty()
    {
        format = format.set_font_name(val.clone());
    }
    if let Some(val) = spec.font_height {
        if !val.is_finite() || val <= 0.0 || val > N_FONT_HEIGHT_MAX {
            return Err(XlsxStyleError::UnsupportedAttribute(format!(
                "font_height must be in (0, {N_FONT_HEIGHT_MAX}], got {val}"
            )));
        }
        format = format.set_font_size(val);
    }
    if spec.bold == Some(EnumFontWeight::Bold) {
        format = format.set_bold();
    }
    if spec.italic.unwrap_or(false) {
        format = format.set_italic();
    }
    if let Some(val) = spec.font_color {
        format = format.set_font_color(derive_color(val)?);
    }

    // rust_xlsxwriter names the visible solid color "background", so the two
    // fill colors are handed over swapped.
    match spec.foreground_pattern {
        Some(EnumFillPattern::NoFill) => {
            format = format.set_pattern(FormatPattern::None);
        }
        Some(EnumFillPattern::SolidForeground) | None => {
            if spec.foreground_pattern.is_some()
                || spec.foreground_color.is_some()
                || spec.background_color.is_some()
            {
                format = format.set_pattern(FormatPattern::Solid);
            }
            if let Some(color) = spec.foreground_color {
                format = format.set_background_color(derive_color(color)?);
            }
            if let Some(color) = spec.background_color {
                format = format.set_foreground_color(derive_color(color)?);
            }
        }
    }

    if let Some(val) = spec.data_format_code() {
        format = format.set_num_format(val);
    } else if let Some(val) = spec.data_format_builtin {
        if val > N_NUM_FORMAT_BUILTIN_MAX {
            return Err(XlsxStyleError::UnsupportedAttribute(format!(
                "data_format_builtin must be in [0, {N_NUM_FORMAT_BUILTIN_MAX}], got {val}"
            )));
        }
        format = format.set_num_format_index(val);
    }
    if let Some(val) = spec.align {
        format = format.set_align(derive_format_align(val));
    }
    if let Some(val) = spec.border {
        format = format.set_border(derive_format_border(val));
    }
    if let Some(val) = spec.border_top {
        format = format.set_border_top(derive_format_border(val));
    }
    if let Some(val) = spec.border_bottom {
        format = format.set_border_bottom(derive_format_border(val));
    }
    if let Some(val) = spec.border_left {
        format = format.set_border_left(derive_format_border(val));
    }
    if let Some(val) = spec.border_right {
        format = format.set_border_right(derive_format_border(val));
    }
    if spec.text_wrap.unwrap_or(false) {
        format = format.set_text_wrap();
    }
    if spec.shrink_to_fit.unwrap_or(false) {
        format = format.set_shrink();
    }

    Ok(format)
}

fn derive_color(color: EnumStyleColor) -> Result<Color> {
    match color {
        EnumStyleColor::Aqua => Ok(Color::RGB(0x33CCCC)),
        EnumStyleColor::Black => Ok(Color::Black),
        EnumStyleColor::Red => Ok(Color::Red),
        EnumStyleColor::White => Ok(Color::White),
        EnumStyleColor::Yellow => Ok(Color::Yellow),
        EnumStyleColor::Silver => Ok(Color::RGB(0x969696)),
        EnumStyleColor::Rgb(n) if n <= 0xFF_FFFF => Ok(Color::RGB(n)),
        EnumStyleColor::Rgb(n) => Err(XlsxStyleError::UnsupportedAttribute(format!(
            "RGB color out of range: {n:#X}"
        ))),
    }
}

fn derive_format_align(align: EnumStyleAlign) -> FormatAlign {
    match align {
        EnumStyleAlign::Left => FormatAlign::Left,
        EnumStyleAlign::Center => FormatAlign::Center,
        EnumStyleAlign::Right => FormatAlign::Right,
    }
}

fn derive_format_border(border: EnumStyleBorder) -> FormatBorder {
    match border {
        EnumStyleBorder::None => FormatBorder::None,
        EnumStyleBorder::Thin => FormatBorder::Thin,
        EnumStyleBorder::Medium => FormatBorder::Medium,
        EnumStyleBorder::Dashed => FormatBorder::Dashed,
        EnumStyleBorder::Dotted => FormatBorder::Dotted,
        EnumStyleBorder::Thick => FormatBorder::Thick,
        EnumStyleBorder::Double => FormatBorder::Double,
        EnumStyleBorder::Hair => FormatBorder::Hair,
    }
}

// #endregion
////////////////////////////////////////////////////////////////////////////////
