//! Fixed settings for the generated workbook.
//!
//! Nothing here is read at runtime: the generator takes no arguments and no
//! environment, so every knob is a constant.

/// File name written next to the executable.
pub const OUTPUT_FILE_NAME: &str = "TestWorkbook_HR_Estimate.xlsx";

/// Excel worksheet maximum row count.
pub const N_ROWS_EXCEL_MAX: u32 = 1_048_576;
/// Excel worksheet maximum column count.
pub const N_COLS_EXCEL_MAX: u32 = 16_384;
/// Excel sheet name maximum length.
pub const N_LEN_SHEET_NAME_MAX: usize = 31;
/// Characters not allowed in sheet names.
pub const SHEET_NAME_ILLEGAL: [char; 7] = ['*', ':', '?', '/', '\\', '[', ']'];

// ARGB, opaque alpha.
pub const ARGB_LIGHT_BLUE: &str = "FFD9E1F2";
pub const ARGB_LIGHT_GREEN: &str = "FFE2EFDA";
pub const ARGB_ORANGE: &str = "FFFCE4D6";
pub const ARGB_GRAY: &str = "FFF2F2F2";
pub const ARGB_RED: &str = "FFFC9090";
pub const ARGB_DARK_RED: &str = "FF990000";

/// Thousands-separated integer.
pub const FMT_THOUSANDS: &str = "#,##0";
/// One decimal place.
pub const FMT_ONE_DECIMAL: &str = "0.0";

/// Author recorded in the document properties.
pub const DOC_AUTHOR: &str = "BP_User";
/// Title recorded in the document properties.
pub const DOC_TITLE: &str = "TestWorkbook_HR_Estimate";
