//! Stateless helper utilities used by the XLSX writer kernel.

use crate::conf::{
    N_LEN_EXCEL_SHEET_NAME_MAX, N_LEN_EXCEL_STRING_MAX, N_NCOLS_EXCEL_MAX, N_NROWS_EXCEL_MAX,
    TUP_EXCEL_ILLEGAL,
};

/// Largest integer magnitude an `f64` holds exactly.
const N_INT_EXACT_F64_MAX: i64 = 1 << 53;
use crate::spec::{
    EnumCellInput, EnumCellValue, Result, SpecAutofitCellsPolicy, SpecXlsxValuePolicy,
    XlsxStyleError,
};

////////////////////////////////////////////////////////////////////////////////
// #region CellValueConversion

/// Convert `NaN`/`Inf` to policy string; return error for finite values.
pub fn convert_nan_inf_to_str(
    x: f64,
    value_policy: &SpecXlsxValuePolicy,
) -> std::result::Result<String, String> {
    if x.is_nan() {
        return Ok(value_policy.nan_str.clone());
    }
    if x.is_infinite() {
        return Ok(if x.is_sign_positive() {
            value_policy.posinf_str.clone()
        } else {
            value_policy.neginf_str.clone()
        });
    }
    Err("Input is neither NaN nor Inf.".to_string())
}

/// Reduce a raw input to its storage kind.
///
/// Dispatch order is fixed: dates first, then numbers with the non-finite
/// guard, then the text fallback. A NaN never reaches the numeric branch.
/// Integers stay numeric only while `f64` holds them exactly; larger ones
/// fall back to their decimal text. Text beyond Excel's cell limit is rejected.
pub fn normalize_cell_value(
    value: EnumCellInput,
    value_policy: &SpecXlsxValuePolicy,
) -> Result<EnumCellValue> {
    let value = derive_cell_value(value, value_policy)?;
    if let EnumCellValue::Text(s) = &value {
        let n_len = s.chars().count();
        if n_len > N_LEN_EXCEL_STRING_MAX {
            return Err(XlsxStyleError::InvalidValue(format!(
                "text of {n_len} characters exceeds Excel limit {N_LEN_EXCEL_STRING_MAX}"
            )));
        }
    }
    Ok(value)
}

fn derive_cell_value(
    value: EnumCellInput,
    value_policy: &SpecXlsxValuePolicy,
) -> Result<EnumCellValue> {
    match value {
        EnumCellInput::Missing => Err(XlsxStyleError::InvalidValue(
            "cell value is missing".to_string(),
        )),
        EnumCellInput::Date(dt) => Ok(EnumCellValue::Date(dt)),
        EnumCellInput::Number(n) => match convert_nan_inf_to_str(n, value_policy) {
            Ok(c_sentinel) => {
                log::warn!("non-finite number {n} stored as text {c_sentinel:?}");
                Ok(EnumCellValue::Text(c_sentinel))
            }
            Err(_) => Ok(EnumCellValue::Number(n)),
        },
        EnumCellInput::Integer(n) if n.unsigned_abs() <= N_INT_EXACT_F64_MAX as u64 => {
            Ok(EnumCellValue::Number(n as f64))
        }
        EnumCellInput::Integer(n) => Ok(EnumCellValue::Text(n.to_string())),
        EnumCellInput::Boolean(b) => Ok(EnumCellValue::Text(
            if b { "True" } else { "False" }.to_string(),
        )),
        EnumCellInput::Text(s) => Ok(EnumCellValue::Text(s)),
    }
}

// #endregion
////////////////////////////////////////////////////////////////////////////////
// #region AddressValidation

/// Cast zero-based row index to the container's row type, enforcing Excel limits.
pub fn cast_row_num(value: usize) -> Result<u32> {
    if value >= N_NROWS_EXCEL_MAX {
        return Err(XlsxStyleError::InvalidAddress(format!(
            "row index {value} exceeds Excel limit {}",
            N_NROWS_EXCEL_MAX - 1
        )));
    }
    u32::try_from(value)
        .map_err(|_| XlsxStyleError::InvalidAddress(format!("row index overflow: {value}")))
}

/// Cast zero-based column index to the container's column type, enforcing Excel limits.
pub fn cast_col_num(value: usize) -> Result<u16> {
    if value >= N_NCOLS_EXCEL_MAX {
        return Err(XlsxStyleError::InvalidAddress(format!(
            "column index {value} exceeds Excel limit {}",
            N_NCOLS_EXCEL_MAX - 1
        )));
    }
    u16::try_from(value)
        .map_err(|_| XlsxStyleError::InvalidAddress(format!("column index overflow: {value}")))
}

/// Check a worksheet name against Excel naming rules without altering it.
pub fn validate_sheet_name(name: &str) -> Result<()> {
    let reject = |reason: String| {
        Err(XlsxStyleError::InvalidSheetName {
            name: name.to_string(),
            reason,
        })
    };

    if name.trim().is_empty() {
        return reject("name is blank".to_string());
    }
    if name.chars().count() > N_LEN_EXCEL_SHEET_NAME_MAX {
        return reject(format!(
            "name is longer than {N_LEN_EXCEL_SHEET_NAME_MAX} characters"
        ));
    }
    if let Some(c_illegal) = TUP_EXCEL_ILLEGAL.iter().find(|c| name.contains(**c)) {
        return reject(format!("name contains {c_illegal:?}"));
    }
    if name.starts_with('\'') || name.ends_with('\'') {
        return reject("name starts or ends with an apostrophe".to_string());
    }
    Ok(())
}

// #endregion
////////////////////////////////////////////////////////////////////////////////
// #region WidthEstimation

/// Estimate displayed width units for one stored cell value.
pub fn estimate_width_len(value: &EnumCellValue, date_format: &str) -> usize {
    match value {
        EnumCellValue::Blank => 0,
        EnumCellValue::Text(s) => estimate_unicode_string_width(s),
        EnumCellValue::Date(_) => date_format.chars().count(),
        EnumCellValue::Number(n) => {
            if n.fract() == 0.0 && n.abs() < 1e15 {
                (*n as i64).to_string().len()
            } else {
                format!("{n:.2}").len()
            }
        }
    }
}

fn estimate_unicode_string_width(s: &str) -> usize {
    let n_ascii = s.chars().filter(|chr| chr.is_ascii()).count();
    let n_non_ascii = s.chars().count().saturating_sub(n_ascii);
    n_ascii + (n_non_ascii as f64 * 1.6).round() as usize
}

/// Clamp a recorded content width into the policy's final column width.
pub fn derive_autofit_width(n_width_recorded: usize, policy: &SpecAutofitCellsPolicy) -> f64 {
    let n_min = usize::max(1, policy.width_cell_min);
    let n_max = usize::min(255, usize::max(n_min, policy.width_cell_max));
    usize::min(
        n_max,
        usize::max(n_min, n_width_recorded + policy.width_cell_padding),
    ) as f64
}

// #endregion
////////////////////////////////////////////////////////////////////////////////

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;

    use super::*;

    #[test]
    fn test_normalize_nan_becomes_sentinel_text() {
        let policy = SpecXlsxValuePolicy::default();
        assert_eq!(
            normalize_cell_value(EnumCellInput::Number(f64::NAN), &policy).unwrap(),
            EnumCellValue::Text("NaN".to_string())
        );
        assert_eq!(
            normalize_cell_value(EnumCellInput::Number(f64::NEG_INFINITY), &policy).unwrap(),
            EnumCellValue::Text("-Inf".to_string())
        );
    }

    #[test]
    fn test_normalize_finite_numbers_stay_numeric() {
        let policy = SpecXlsxValuePolicy::default();
        for x in [0.0, -0.0, 1234.5, -1e-300, f64::MAX, f64::MIN_POSITIVE] {
            assert_eq!(
                normalize_cell_value(EnumCellInput::Number(x), &policy).unwrap(),
                EnumCellValue::Number(x)
            );
        }
        assert_eq!(
            normalize_cell_value(EnumCellInput::Integer(42), &policy).unwrap(),
            EnumCellValue::Number(42.0)
        );
    }

    #[test]
    fn test_normalize_integers_beyond_exact_range_become_text() {
        let policy = SpecXlsxValuePolicy::default();
        let n_exact = 9_007_199_254_740_992_i64;
        assert_eq!(
            normalize_cell_value(EnumCellInput::Integer(-n_exact), &policy).unwrap(),
            EnumCellValue::Number(-9_007_199_254_740_992.0)
        );
        assert_eq!(
            normalize_cell_value(EnumCellInput::Integer(n_exact + 1), &policy).unwrap(),
            EnumCellValue::Text("9007199254740993".to_string())
        );
        assert_eq!(
            normalize_cell_value(EnumCellInput::Integer(i64::MIN), &policy).unwrap(),
            EnumCellValue::Text(i64::MIN.to_string())
        );
    }

    #[test]
    fn test_normalize_rejects_text_over_cell_limit() {
        let policy = SpecXlsxValuePolicy::default();
        let c_text_max = "x".repeat(N_LEN_EXCEL_STRING_MAX);
        assert_eq!(
            normalize_cell_value(EnumCellInput::Text(c_text_max.clone()), &policy).unwrap(),
            EnumCellValue::Text(c_text_max)
        );
        assert!(matches!(
            normalize_cell_value(EnumCellInput::Text("x".repeat(40_000)), &policy),
            Err(XlsxStyleError::InvalidValue(_))
        ));
        // Limit counts characters, not bytes.
        let c_text_wide = "数".repeat(N_LEN_EXCEL_STRING_MAX);
        assert!(normalize_cell_value(EnumCellInput::Text(c_text_wide), &policy).is_ok());
    }

    #[test]
    fn test_normalize_dates_text_and_booleans() {
        let policy = SpecXlsxValuePolicy::default();
        let dt = NaiveDate::from_ymd_opt(2024, 3, 15)
            .unwrap()
            .and_hms_opt(9, 30, 0)
            .unwrap();
        assert_eq!(
            normalize_cell_value(EnumCellInput::Date(dt), &policy).unwrap(),
            EnumCellValue::Date(dt)
        );
        assert_eq!(
            normalize_cell_value(EnumCellInput::Text("NaN".to_string()), &policy).unwrap(),
            EnumCellValue::Text("NaN".to_string())
        );
        assert_eq!(
            normalize_cell_value(EnumCellInput::Boolean(true), &policy).unwrap(),
            EnumCellValue::Text("True".to_string())
        );
    }

    #[test]
    fn test_normalize_missing_is_invalid_value() {
        let policy = SpecXlsxValuePolicy::default();
        assert!(matches!(
            normalize_cell_value(EnumCellInput::Missing, &policy),
            Err(XlsxStyleError::InvalidValue(_))
        ));
    }

    #[test]
    fn test_cast_address_enforces_excel_limits() {
        assert_eq!(cast_row_num(N_NROWS_EXCEL_MAX - 1).unwrap(), 1_048_575);
        assert!(cast_row_num(N_NROWS_EXCEL_MAX).is_err());
        assert_eq!(cast_col_num(N_NCOLS_EXCEL_MAX - 1).unwrap(), 16_383);
        assert!(cast_col_num(N_NCOLS_EXCEL_MAX).is_err());
    }

    #[test]
    fn test_validate_sheet_name() {
        assert!(validate_sheet_name("Dividends 2024").is_ok());
        let c_name_long = "n".repeat(32);
        for name in ["", "   ", "a/b", "x[1]", "'quoted'", c_name_long.as_str()] {
            assert!(
                matches!(
                    validate_sheet_name(name),
                    Err(XlsxStyleError::InvalidSheetName { .. })
                ),
                "{name:?} should be rejected"
            );
        }
    }

    #[test]
    fn test_autofit_width_is_clamped_to_policy() {
        let policy = SpecAutofitCellsPolicy::default();
        assert_eq!(derive_autofit_width(0, &policy), 8.0);
        assert_eq!(derive_autofit_width(10, &policy), 12.0);
        assert_eq!(derive_autofit_width(500, &policy), 60.0);
        assert_eq!(
            estimate_width_len(&EnumCellValue::Text("数据".to_string()), "yyyy-mm-dd"),
            3
        );
        assert_eq!(
            estimate_width_len(&EnumCellValue::Number(1234.5), "yyyy-mm-dd"),
            7
        );
    }
}
