//! `sheetkit_io_xlsx` v1:
//! Styled XLSX workbook writer.
//!
//! Modules:
//! - `conf`   : constants and default presets
//! - `spec`   : style descriptors, cell values, options and errors
//! - `util`   : pure helper functions (value normalization, address checks)
//! - `style`  : named style registry with compile-once caching
//! - `sheet`  : in-memory worksheet/row/cell model
//! - `writer` : workbook writer and `rust_xlsxwriter` encoding
pub mod conf;
pub mod sheet;
pub mod spec;
pub mod style;
pub mod util;
pub mod writer;

pub use conf::{
    C_DATE_FORMAT_DEFAULT, N_LEN_EXCEL_SHEET_NAME_MAX, N_LEN_EXCEL_STRING_MAX, N_NCOLS_EXCEL_MAX,
    N_NROWS_EXCEL_MAX, TUP_EXCEL_ILLEGAL, derive_default_styles, derive_default_write_options,
};
pub use sheet::{CellModel, RowModel, SheetModel};
pub use spec::{
    EnumCellInput, EnumCellValue, EnumFillPattern, EnumFontWeight, EnumStyleAlign,
    EnumStyleBorder, EnumStyleColor, Result, SpecAutofitCellsPolicy, SpecStyleDescriptor,
    SpecWriterOptions, SpecXlsxValuePolicy, XlsxStyleError,
};
pub use style::{CompiledStyle, StyleRegistry};
pub use util::{convert_nan_inf_to_str, normalize_cell_value};
pub use writer::XlsxStyleWriter;
