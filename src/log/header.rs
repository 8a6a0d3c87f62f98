//! CSV header construction

use std::fmt::Write;

use crate::config::WavelengthRange;

/// Fixed columns preceding the per-wavelength samples
pub const HEADER_COLUMNS: &[&str] = &[
    "DATE",
    "TIME",
    "MANUAL",
    "INT_TIME",
    "FRAME_AVG",
    "AE",
    "IS_SATURATED",
    "IS_DARK",
    "X",
    "Y",
    "Z",
];

/// Build the header line (without terminator) for a wavelength range
///
/// Every column, including the last wavelength, is followed by a comma.
pub fn header_line(range: &WavelengthRange) -> String {
    let mut line = String::new();

    for column in HEADER_COLUMNS {
        line.push_str(column);
        line.push(',');
    }

    for nm in range.iter() {
        // Writing into a String cannot fail
        let _ = write!(line, "{},", nm);
    }

    line
}
