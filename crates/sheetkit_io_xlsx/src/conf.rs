//! XLSX constants and default preset factories.

use std::collections::BTreeMap;

use crate::spec::{
    EnumFillPattern, EnumFontWeight, EnumStyleAlign, EnumStyleBorder, EnumStyleColor,
    SpecStyleDescriptor, SpecWriterOptions,
};

/// Excel worksheet maximum row count.
pub const N_NROWS_EXCEL_MAX: usize = 1_048_576;
/// Excel worksheet maximum column count.
pub const N_NCOLS_EXCEL_MAX: usize = 16_384;
/// Excel sheet name maximum length.
pub const N_LEN_EXCEL_SHEET_NAME_MAX: usize = 31;
/// Characters not allowed in sheet names.
pub const TUP_EXCEL_ILLEGAL: [&str; 7] = ["*", ":", "?", "/", "\\", "[", "]"];
/// Excel cell text maximum length, in characters.
pub const N_LEN_EXCEL_STRING_MAX: usize = 32_767;
/// Largest Excel built-in number format index.
pub const N_NUM_FORMAT_BUILTIN_MAX: u8 = 49;
/// Largest font height Excel accepts, in points.
pub const N_FONT_HEIGHT_MAX: f64 = 409.0;
/// Largest row height Excel accepts, in points.
pub const N_ROW_HEIGHT_MAX: f64 = 409.0;
/// Largest column width Excel accepts, in character units.
pub const N_COL_WIDTH_MAX: f64 = 255.0;
/// Number format bound to date cells that carry no explicit style.
pub const C_DATE_FORMAT_DEFAULT: &str = "yyyy-mm-dd";
/// Name reported by the writer-owned date style.
pub const C_DATE_STYLE_NAME: &str = "__date__";
/// Name reported by one-off wrap-text styles.
pub const C_WRAP_STYLE_NAME: &str = "__wrap__";

/// Build default named style presets used by
/// [`crate::writer::XlsxStyleWriter::with_default_styles`].
pub fn derive_default_styles() -> BTreeMap<String, SpecStyleDescriptor> {
    let cfg_base_style = SpecStyleDescriptor {
        font_name: Some("Calibri".to_string()),
        font_height: Some(11.0),
        ..Default::default()
    };

    let mut dict_style = BTreeMap::new();
    dict_style.insert("text".to_string(), cfg_base_style.clone());
    dict_style.insert(
        "header".to_string(),
        cfg_base_style.with_(SpecStyleDescriptor {
            foreground_color: Some(EnumStyleColor::Silver),
            foreground_pattern: Some(EnumFillPattern::SolidForeground),
            bold: Some(EnumFontWeight::Bold),
            align: Some(EnumStyleAlign::Center),
            border: Some(EnumStyleBorder::Thin),
            ..Default::default()
        }),
    );
    dict_style.insert(
        "integer".to_string(),
        cfg_base_style.with_(SpecStyleDescriptor {
            data_format: Some("0".to_string()),
            ..Default::default()
        }),
    );
    dict_style.insert(
        "decimal".to_string(),
        cfg_base_style.with_(SpecStyleDescriptor {
            data_format: Some("0.0000".to_string()),
            ..Default::default()
        }),
    );
    dict_style.insert(
        "currency".to_string(),
        cfg_base_style.with_(SpecStyleDescriptor {
            data_format: Some("#,##0.00".to_string()),
            align: Some(EnumStyleAlign::Right),
            ..Default::default()
        }),
    );
    dict_style.insert(
        "percent".to_string(),
        cfg_base_style.with_(SpecStyleDescriptor {
            data_format: Some("0.00%".to_string()),
            ..Default::default()
        }),
    );
    dict_style.insert(
        "date".to_string(),
        cfg_base_style.with_(SpecStyleDescriptor {
            data_format: Some(C_DATE_FORMAT_DEFAULT.to_string()),
            ..Default::default()
        }),
    );

    dict_style
}

/// Build default writer options.
pub fn derive_default_write_options() -> SpecWriterOptions {
    SpecWriterOptions::default()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_styles_share_base_font() {
        let dict_style = derive_default_styles();
        assert!(dict_style.values().all(|s| s.font_name.as_deref() == Some("Calibri")));

        let spec_currency = &dict_style["currency"];
        assert_eq!(spec_currency.data_format_code(), Some("#,##0.00"));
        assert_eq!(dict_style["header"].bold, Some(EnumFontWeight::Bold));
        assert_eq!(dict_style["text"].data_format_code(), None);
    }

    #[test]
    fn test_default_write_options_use_default_date_format() {
        let options = derive_default_write_options();
        assert_eq!(options.date_format, C_DATE_FORMAT_DEFAULT);
        assert_eq!(options.value_policy.nan_str, "NaN");
    }
}
