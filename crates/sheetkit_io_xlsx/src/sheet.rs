//! In-memory worksheet model: rows and cells created on demand, encoded on save.

use std::collections::BTreeMap;
use std::sync::Arc;

use crate::spec::EnumCellValue;
use crate::style::CompiledStyle;

/// One stored cell: normalized value plus the style bound to it.
#[derive(Debug, Clone)]
pub struct CellModel {
    /// Stored value kind.
    pub value: EnumCellValue,
    /// Bound style, if any.
    pub style: Option<Arc<CompiledStyle>>,
}

impl CellModel {
    /// Whether this cell carries exactly the given style handle.
    pub fn has_style(&self, style: &Arc<CompiledStyle>) -> bool {
        self.style.as_ref().is_some_and(|s| Arc::ptr_eq(s, style))
    }
}

/// One row: optional height and cells by column.
#[derive(Debug, Clone, Default)]
pub struct RowModel {
    /// Height in points, when set.
    pub height: Option<f64>,
    /// Cells keyed by zero-based column.
    pub cells: BTreeMap<u16, CellModel>,
}

/// Named worksheet with sparse rows.
#[derive(Debug, Clone)]
pub struct SheetModel {
    name: String,
    rows: BTreeMap<u32, RowModel>,
    col_widths: BTreeMap<u16, f64>,
    max_row: u32,
}

impl SheetModel {
    pub(crate) fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            rows: BTreeMap::new(),
            col_widths: BTreeMap::new(),
            max_row: 0,
        }
    }

    /// Worksheet name as first spelled.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Largest row index written so far (0 before any write).
    pub fn max_row(&self) -> u32 {
        self.max_row
    }

    /// Rows keyed by zero-based index.
    pub fn rows(&self) -> &BTreeMap<u32, RowModel> {
        &self.rows
    }

    /// Explicit column widths in character units.
    pub fn col_widths(&self) -> &BTreeMap<u16, f64> {
        &self.col_widths
    }

    /// Row at `row`, if created.
    pub fn row(&self, row: u32) -> Option<&RowModel> {
        self.rows.get(&row)
    }

    /// Stored cell at `(row, col)`.
    pub fn cell(&self, row: u32, col: u16) -> Option<&CellModel> {
        self.rows.get(&row).and_then(|r| r.cells.get(&col))
    }

    /// Mutable stored cell at `(row, col)`.
    pub fn cell_mut(&mut self, row: u32, col: u16) -> Option<&mut CellModel> {
        self.rows.get_mut(&row).and_then(|r| r.cells.get_mut(&col))
    }

    /// Total stored cells across rows.
    pub fn cell_count(&self) -> usize {
        self.rows.values().map(|r| r.cells.len()).sum()
    }

    /// Get or create the row at `row`.
    pub(crate) fn row_mut(&mut self, row: u32) -> &mut RowModel {
        self.rows.entry(row).or_default()
    }

    /// Store `cell` at `(row, col)`, replacing any previous cell there.
    pub(crate) fn put_cell(&mut self, row: u32, col: u16, cell: CellModel) {
        self.row_mut(row).cells.insert(col, cell);
        self.max_row = u32::max(self.max_row, row);
    }

    pub(crate) fn set_col_width(&mut self, col: u16, width: f64) {
        self.col_widths.insert(col, width);
    }

    /// Iterate the stored values of one column, top to bottom.
    pub(crate) fn column_values(&self, col: u16) -> impl Iterator<Item = &EnumCellValue> + '_ {
        self.rows
            .values()
            .filter_map(move |r| r.cells.get(&col))
            .map(|c| &c.value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_put_cell_replaces_and_tracks_max_row() {
        let mut sheet = SheetModel::new("Data");
        sheet.put_cell(
            4,
            1,
            CellModel {
                value: EnumCellValue::Number(1.0),
                style: None,
            },
        );
        sheet.put_cell(
            2,
            1,
            CellModel {
                value: EnumCellValue::Text("a".to_string()),
                style: None,
            },
        );
        sheet.put_cell(
            4,
            1,
            CellModel {
                value: EnumCellValue::Number(2.0),
                style: None,
            },
        );

        assert_eq!(sheet.max_row(), 4);
        assert_eq!(sheet.cell_count(), 2);
        assert_eq!(sheet.cell(4, 1).unwrap().value, EnumCellValue::Number(2.0));
        assert_eq!(
            sheet.column_values(1).cloned().collect::<Vec<_>>(),
            vec![
                EnumCellValue::Text("a".to_string()),
                EnumCellValue::Number(2.0)
            ]
        );
    }

    #[test]
    fn test_row_mut_is_get_or_create() {
        let mut sheet = SheetModel::new("Data");
        sheet.row_mut(3).height = Some(20.0);
        sheet.row_mut(3);
        assert_eq!(sheet.rows().len(), 1);
        assert_eq!(sheet.row(3).unwrap().height, Some(20.0));
        assert_eq!(sheet.max_row(), 0);
    }
}
