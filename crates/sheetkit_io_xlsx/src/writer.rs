//! Styled workbook writer: named styles, typed cells, atomic save.

use std::collections::BTreeMap;
use std::io::Write;
use std::path::Path;
use std::sync::Arc;

use rust_xlsxwriter::{Workbook, Worksheet};
use tempfile::NamedTempFile;

use crate::conf::{
    N_COL_WIDTH_MAX, N_ROW_HEIGHT_MAX, derive_default_styles, derive_default_write_options,
};
use crate::sheet::{CellModel, SheetModel};
use crate::spec::{
    EnumCellInput, EnumCellValue, Result, SpecStyleDescriptor, SpecWriterOptions, XlsxStyleError,
};
use crate::style::{CompiledStyle, StyleRegistry};
use crate::util::{
    cast_col_num, cast_row_num, derive_autofit_width, estimate_width_len, normalize_cell_value,
    validate_sheet_name,
};

/// Stateful workbook writer.
///
/// Cells and styles are buffered in memory and encoded through
/// `rust_xlsxwriter` only when one of the `save*` methods is called, so a
/// writer can be saved more than once.
pub struct XlsxStyleWriter {
    registry: StyleRegistry,
    l_sheets: Vec<SheetModel>,
    dict_sheet_idx: BTreeMap<String, usize>,
    style_date: Arc<CompiledStyle>,
    options: SpecWriterOptions,
    if_disposed: bool,
}

impl Default for XlsxStyleWriter {
    fn default() -> Self {
        Self::new()
    }
}

impl XlsxStyleWriter {
    /// Create a writer with default options and no declared styles.
    pub fn new() -> Self {
        Self::with_options(derive_default_write_options())
    }

    /// Create a writer; the default date style is built here from `options.date_format`.
    pub fn with_options(options: SpecWriterOptions) -> Self {
        Self {
            registry: StyleRegistry::new(),
            l_sheets: Vec::new(),
            dict_sheet_idx: BTreeMap::new(),
            style_date: Arc::new(CompiledStyle::new_date(&options.date_format)),
            options,
            if_disposed: false,
        }
    }

    /// Create a writer with the presets from [`derive_default_styles`] declared.
    pub fn with_default_styles() -> Result<Self> {
        let mut writer = Self::new();
        writer.declare_styles(derive_default_styles())?;
        Ok(writer)
    }

    /// Options the writer was built with.
    pub fn options(&self) -> &SpecWriterOptions {
        &self.options
    }

    /// Named style registry owned by this writer.
    pub fn registry(&self) -> &StyleRegistry {
        &self.registry
    }

    /// Style bound to date cells written without an explicit style.
    pub fn date_style(&self) -> &Arc<CompiledStyle> {
        &self.style_date
    }

    ////////////////////////////////////////////////////////////////////////////
    // #region Styles

    /// Declare one named style.
    pub fn declare_style(&mut self, name: &str, descriptor: SpecStyleDescriptor) -> Result<()> {
        self.ensure_open()?;
        self.registry.declare_style(name, descriptor)
    }

    /// Declare several named styles; stops at the first failure.
    pub fn declare_styles<I>(&mut self, styles: I) -> Result<()>
    where
        I: IntoIterator<Item = (String, SpecStyleDescriptor)>,
    {
        for (name, descriptor) in styles {
            self.declare_style(&name, descriptor)?;
        }
        Ok(())
    }

    /// Resolve a declared style to its shared compiled handle.
    pub fn resolve_style(&self, name: &str) -> Result<Arc<CompiledStyle>> {
        self.ensure_open()?;
        self.registry.resolve_style(name)
    }

    // #endregion
    ////////////////////////////////////////////////////////////////////////////
    // #region Cells

    /// Write `value` at zero-based `(column, row)` on `worksheet_name`.
    ///
    /// The worksheet and row are created on demand and any cell already at
    /// that address is replaced. An empty `style_name` means no explicit
    /// style; date values then get [`Self::date_style`]. The style and value
    /// are checked before anything is created, so a failed write leaves the
    /// workbook untouched.
    pub fn write_cell(
        &mut self,
        column: usize,
        row: usize,
        worksheet_name: &str,
        value: impl Into<EnumCellInput>,
        style_name: &str,
    ) -> Result<()> {
        self.ensure_open()?;
        let n_row = cast_row_num(row)?;
        let n_col = cast_col_num(column)?;

        let style_explicit = if style_name.is_empty() {
            None
        } else {
            Some(self.registry.resolve_style(style_name)?)
        };
        let value = normalize_cell_value(value.into(), &self.options.value_policy)?;

        let style = match (&value, style_explicit) {
            (EnumCellValue::Date(_), None) => Some(Arc::clone(&self.style_date)),
            (_, style) => style,
        };

        let n_idx = self.derive_sheet_index(worksheet_name)?;
        self.l_sheets[n_idx].put_cell(n_row, n_col, CellModel { value, style });
        Ok(())
    }

    /// Bind a fresh, uncached wrap-text style to one cell.
    ///
    /// The cell's previous style is replaced, and no other cell is affected even
    /// when it shares a named style. An empty address gets a blank cell, which
    /// does not count towards [`Self::max_row`].
    pub fn wrap_text(
        &mut self,
        row: usize,
        column: usize,
        if_wrap: bool,
        worksheet_name: &str,
    ) -> Result<()> {
        self.ensure_open()?;
        let n_row = cast_row_num(row)?;
        let n_col = cast_col_num(column)?;
        let style = Arc::new(CompiledStyle::new_wrap_text(if_wrap));

        let n_idx = self.derive_sheet_index(worksheet_name)?;
        // Restyling is not a write: max_row stays where cell writes left it.
        let cell = self.l_sheets[n_idx]
            .row_mut(n_row)
            .cells
            .entry(n_col)
            .or_insert_with(|| CellModel {
                value: EnumCellValue::Blank,
                style: None,
            });
        cell.style = Some(style);
        Ok(())
    }

    /// Stored cell at `(column, row)` on `worksheet_name`.
    pub fn cell(&self, column: usize, row: usize, worksheet_name: &str) -> Option<&CellModel> {
        let n_row = u32::try_from(row).ok()?;
        let n_col = u16::try_from(column).ok()?;
        self.sheet(worksheet_name)?.cell(n_row, n_col)
    }

    // #endregion
    ////////////////////////////////////////////////////////////////////////////
    // #region Worksheets

    /// Create a worksheet explicitly; fails if the name is taken in any letter case.
    pub fn create_worksheet(&mut self, worksheet_name: &str) -> Result<()> {
        self.ensure_open()?;
        if self
            .dict_sheet_idx
            .contains_key(&derive_sheet_key(worksheet_name))
        {
            return Err(XlsxStyleError::DuplicateWorksheet(
                worksheet_name.to_string(),
            ));
        }
        self.derive_sheet_index(worksheet_name)?;
        Ok(())
    }

    /// Worksheet model for `worksheet_name`, matched case-insensitively.
    pub fn sheet(&self, worksheet_name: &str) -> Option<&SheetModel> {
        self.dict_sheet_idx
            .get(&derive_sheet_key(worksheet_name))
            .map(|n_idx| &self.l_sheets[*n_idx])
    }

    /// Worksheet names in creation order.
    pub fn sheet_names(&self) -> Vec<String> {
        self.l_sheets.iter().map(|s| s.name().to_string()).collect()
    }

    /// Largest row index written on any worksheet.
    pub fn max_row(&self) -> u32 {
        self.l_sheets.iter().map(SheetModel::max_row).max().unwrap_or(0)
    }

    /// Set row height in points.
    pub fn set_row_height(&mut self, row: usize, height: f64, worksheet_name: &str) -> Result<()> {
        self.ensure_open()?;
        let n_row = cast_row_num(row)?;
        if !(0.0..=N_ROW_HEIGHT_MAX).contains(&height) {
            return Err(XlsxStyleError::InvalidValue(format!(
                "row height must be in [0, {N_ROW_HEIGHT_MAX}], got {height}"
            )));
        }
        let n_idx = self.derive_sheet_index(worksheet_name)?;
        self.l_sheets[n_idx].row_mut(n_row).height = Some(height);
        Ok(())
    }

    /// Set column width in character units.
    pub fn set_column_width(
        &mut self,
        column: usize,
        width: f64,
        worksheet_name: &str,
    ) -> Result<()> {
        self.ensure_open()?;
        let n_col = cast_col_num(column)?;
        if !(0.0..=N_COL_WIDTH_MAX).contains(&width) {
            return Err(XlsxStyleError::InvalidValue(format!(
                "column width must be in [0, {N_COL_WIDTH_MAX}], got {width}"
            )));
        }
        let n_idx = self.derive_sheet_index(worksheet_name)?;
        self.l_sheets[n_idx].set_col_width(n_col, width);
        Ok(())
    }

    /// Size a column to its current content and return the applied width.
    ///
    /// Cells written afterwards do not widen the column again.
    pub fn auto_size_column(&mut self, column: usize, worksheet_name: &str) -> Result<f64> {
        self.ensure_open()?;
        let n_col = cast_col_num(column)?;
        let n_idx = self.derive_sheet_index(worksheet_name)?;

        let sheet = &mut self.l_sheets[n_idx];
        let n_width_recorded = sheet
            .column_values(n_col)
            .map(|value| estimate_width_len(value, &self.options.date_format))
            .max()
            .unwrap_or(0);
        let n_width_final = derive_autofit_width(n_width_recorded, &self.options.policy_autofit);
        sheet.set_col_width(n_col, n_width_final);
        Ok(n_width_final)
    }

    /// Index of the worksheet, creating it on first use.
    ///
    /// Excel compares sheet names case-insensitively, so "data" resolves to an
    /// existing "Data" and keeps the first spelling.
    fn derive_sheet_index(&mut self, worksheet_name: &str) -> Result<usize> {
        let c_key = derive_sheet_key(worksheet_name);
        if let Some(n_idx) = self.dict_sheet_idx.get(&c_key) {
            return Ok(*n_idx);
        }

        validate_sheet_name(worksheet_name)?;
        let n_idx = self.l_sheets.len();
        self.l_sheets.push(SheetModel::new(worksheet_name));
        self.dict_sheet_idx.insert(c_key, n_idx);
        log::debug!("created worksheet {worksheet_name:?}");
        Ok(n_idx)
    }

    // #endregion
    ////////////////////////////////////////////////////////////////////////////
    // #region Output

    /// Encode the workbook into an in-memory XLSX buffer.
    pub fn save_to_buffer(&self) -> Result<Vec<u8>> {
        self.ensure_open()?;
        let mut workbook = self.build_workbook()?;
        Ok(workbook.save_to_buffer()?)
    }

    /// Encode into a caller-owned stream; the stream is flushed, not closed.
    pub fn save_to_writer<W: Write>(&self, writer: &mut W) -> Result<()> {
        let v_buf = self.save_to_buffer()?;
        writer.write_all(&v_buf)?;
        writer.flush()?;
        Ok(())
    }

    /// Save to `path`, creating or truncating it.
    ///
    /// Bytes go to a temp file in the destination directory first and are
    /// renamed over `path` only after a complete write, so a failure never
    /// leaves a partial workbook behind.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        let v_buf = self.save_to_buffer()?;

        let dir_parent = match path.parent() {
            Some(dir) if !dir.as_os_str().is_empty() => dir,
            _ => Path::new("."),
        };
        let mut file_tmp = NamedTempFile::new_in(dir_parent)?;
        file_tmp.write_all(&v_buf)?;
        file_tmp.as_file().sync_all()?;
        file_tmp.persist(path).map_err(|err| err.error)?;

        log::info!(
            "saved {} worksheet(s), {} cell(s), {} compiled style(s) to {}",
            self.l_sheets.len(),
            self.l_sheets.iter().map(SheetModel::cell_count).sum::<usize>(),
            self.registry.compiled_count(),
            path.display()
        );
        Ok(())
    }

    /// Release sheets and styles. Idempotent; later writes and saves fail
    /// with [`XlsxStyleError::Disposed`].
    pub fn dispose(&mut self) {
        if self.if_disposed {
            return;
        }
        self.registry.clear();
        self.l_sheets.clear();
        self.dict_sheet_idx.clear();
        self.if_disposed = true;
        log::debug!("workbook writer disposed");
    }

    /// Whether [`Self::dispose`] has run.
    pub fn is_disposed(&self) -> bool {
        self.if_disposed
    }

    fn ensure_open(&self) -> Result<()> {
        if self.if_disposed {
            return Err(XlsxStyleError::Disposed);
        }
        Ok(())
    }

    fn build_workbook(&self) -> Result<Workbook> {
        let mut workbook = Workbook::new();

        for sheet in &self.l_sheets {
            let worksheet = workbook.add_worksheet();
            worksheet.set_name(sheet.name())?;

            for (n_col, width) in sheet.col_widths() {
                worksheet.set_column_width(*n_col, *width)?;
            }
            for (n_row, row) in sheet.rows() {
                if let Some(height) = row.height {
                    worksheet.set_row_height(*n_row, height)?;
                }
                for (n_col, cell) in &row.cells {
                    write_cell_with_format(worksheet, *n_row, *n_col, cell, &self.style_date)?;
                }
            }
        }

        Ok(workbook)
    }

    // #endregion
    ////////////////////////////////////////////////////////////////////////////
}

impl Drop for XlsxStyleWriter {
    fn drop(&mut self) {
        self.dispose();
    }
}

fn derive_sheet_key(worksheet_name: &str) -> String {
    worksheet_name.to_lowercase()
}

fn write_cell_with_format(
    worksheet: &mut Worksheet,
    n_row: u32,
    n_col: u16,
    cell: &CellModel,
    style_date: &CompiledStyle,
) -> Result<()> {
    let style = cell.style.as_deref();
    match (&cell.value, style) {
        (EnumCellValue::Number(val), Some(style)) => {
            worksheet.write_number_with_format(n_row, n_col, *val, style.format())?;
        }
        (EnumCellValue::Number(val), None) => {
            worksheet.write_number(n_row, n_col, *val)?;
        }
        (EnumCellValue::Text(val), Some(style)) => {
            worksheet.write_string_with_format(n_row, n_col, val, style.format())?;
        }
        (EnumCellValue::Text(val), None) => {
            worksheet.write_string(n_row, n_col, val)?;
        }
        (EnumCellValue::Date(val), style) => {
            let style = style.unwrap_or(style_date);
            worksheet.write_datetime_with_format(n_row, n_col, val, style.format())?;
        }
        (EnumCellValue::Blank, Some(style)) => {
            worksheet.write_blank(n_row, n_col, style.format())?;
        }
        (EnumCellValue::Blank, None) => {}
    }
    Ok(())
}
