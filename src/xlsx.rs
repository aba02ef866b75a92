use std::collections::HashMap;

use lazy_static::lazy_static;
use regex::Regex;
use rust_xlsxwriter::{Color, ColNum, Format, FormatAlign, RowNum, Workbook, Worksheet};
use serde::Deserialize;
use serde_json::Value;

use crate::codec::TextDecoder;
use crate::module::{ComputeModule, ModuleError, ModuleMemory};

lazy_static! {
    static ref CELL_REGEX: Regex = Regex::new(r"^([A-Za-z]+)([0-9]+)$").unwrap();
    static ref COLOR_REGEX: Regex = Regex::new(r"^#([0-9A-Fa-f]{3}|[0-9A-Fa-f]{6})$").unwrap();
}

// Excel's sheet limits.
const MAX_ROWS: u32 = 1_048_576;
const MAX_COLS: u32 = 16_384;

#[derive(Debug, Deserialize)]
struct CellEntry {
    cell: String,
    #[serde(default)]
    value: Value,
    #[serde(default)]
    css: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct CellStyle {
    background: Option<String>,
    color: Option<String>,
    #[serde(rename = "font-weight")]
    font_weight: Option<String>,
    #[serde(rename = "text-align")]
    text_align: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum Payload {
    Cells(Vec<CellEntry>),
    Styled {
        data: Vec<CellEntry>,
        #[serde(default)]
        styles: HashMap<String, CellStyle>,
    },
    /// A lone cell object, treated as a one-cell list.
    Single(CellEntry),
}

/// Native json2excel compute module
///
/// Reads the JSON cell list out of its own memory, builds a workbook with
/// rust_xlsxwriter and leaves the file bytes in memory for the caller.
pub struct Json2Excel {
    memory: ModuleMemory,
    decoder: TextDecoder,
}

impl Json2Excel {
    pub fn new() -> Self {
        Json2Excel {
            memory: ModuleMemory::new(),
            decoder: TextDecoder,
        }
    }

    pub fn boxed() -> Box<dyn ComputeModule> {
        Box::new(Self::new())
    }
}

impl Default for Json2Excel {
    fn default() -> Self {
        Self::new()
    }
}

impl ComputeModule for Json2Excel {
    fn name(&self) -> &str {
        "json2excel"
    }

    fn malloc(&mut self, len: usize) -> usize {
        self.memory.malloc(len)
    }

    fn write(&mut self, ptr: usize, bytes: &[u8]) -> Result<(), ModuleError> {
        self.memory.write(ptr, bytes)
    }

    fn read(&self, ptr: usize, len: usize) -> Result<&[u8], ModuleError> {
        self.memory.read(ptr, len)
    }

    fn import_to_xlsx(&mut self, arg_ptr: usize, arg_len: usize) -> Result<(usize, usize), ModuleError> {
        let arg = self.memory.read(arg_ptr, arg_len)?.to_vec();
        self.memory.free(arg_ptr, arg_len)?;

        let text = self.decoder.decode_to_string(&arg);
        let payload: Value = serde_json::from_str(&text)?;
        let bytes = workbook_from_json(&payload)?;

        let ptr = self.memory.malloc(bytes.len());
        self.memory.write(ptr, &bytes)?;
        Ok((ptr, bytes.len()))
    }

    fn free(&mut self, ptr: usize, len: usize) -> Result<(), ModuleError> {
        self.memory.free(ptr, len)
    }

    fn allocated(&self) -> usize {
        self.memory.allocated()
    }
}

/// Convert spreadsheet JSON to XLSX format
///
/// Accepts a bare list of `{cell, value, css}` entries, a single such
/// entry, or an object with `data` and `styles`. Strings starting with `=` are written as
/// formulas.
///
/// # Arguments
/// * `payload` - Spreadsheet data in the widget's JSON shape
///
/// # Returns
/// * `Result<Vec<u8>, ModuleError>` - XLSX file content as bytes or an error
///
/// # Examples
/// ```
/// use serde_json::json;
/// use spreadsheet_export::xlsx::workbook_from_json;
///
/// let bytes = workbook_from_json(&json!([{ "cell": "a1", "value": "x" }])).unwrap();
/// assert_eq!(&bytes[..2], b"PK");
/// ```
pub fn workbook_from_json(payload: &Value) -> Result<Vec<u8>, ModuleError> {
    let payload: Payload = serde_json::from_value(payload.clone())
        .map_err(|e| ModuleError::Conversion(format!("unrecognised spreadsheet data: {}", e)))?;

    let (cells, styles) = match payload {
        Payload::Cells(cells) => (cells, HashMap::new()),
        Payload::Styled { data, styles } => (data, styles),
        Payload::Single(cell) => (vec![cell], HashMap::new()),
    };

    let mut formats = HashMap::with_capacity(styles.len());
    for (name, style) in &styles {
        formats.insert(name.as_str(), style_format(style)?);
    }

    let mut workbook = Workbook::new();
    let mut worksheet = Worksheet::new();
    worksheet.set_name("Sheet1")?;

    for entry in &cells {
        let (row, col) = parse_cell_name(&entry.cell)?;
        let format = match entry.css.as_deref() {
            Some(class) => {
                let format = formats.get(class);
                if format.is_none() {
                    log::debug!("cell {} uses unknown style class {}", entry.cell, class);
                }
                format
            }
            None => None,
        };
        write_value(&mut worksheet, row, col, &entry.value, format)?;
    }

    workbook.push_worksheet(worksheet);
    let buffer = workbook.save_to_buffer()?;

    Ok(buffer)
}

fn write_value(
    worksheet: &mut Worksheet,
    row: RowNum,
    col: ColNum,
    value: &Value,
    format: Option<&Format>,
) -> Result<(), ModuleError> {
    match (value, format) {
        (Value::Null, Some(format)) => {
            worksheet.write_blank(row, col, format)?;
        }
        (Value::Null, None) => {}
        (Value::Bool(b), Some(format)) => {
            worksheet.write_boolean_with_format(row, col, *b, format)?;
        }
        (Value::Bool(b), None) => {
            worksheet.write_boolean(row, col, *b)?;
        }
        (Value::Number(n), format) => {
            let number = n
                .as_f64()
                .ok_or_else(|| ModuleError::Conversion(format!("number {} is not representable", n)))?;
            match format {
                Some(format) => worksheet.write_number_with_format(row, col, number, format)?,
                None => worksheet.write_number(row, col, number)?,
            };
        }
        (Value::String(s), format) if s.starts_with('=') => {
            match format {
                Some(format) => worksheet.write_formula_with_format(row, col, s.as_str(), format)?,
                None => worksheet.write_formula(row, col, s.as_str())?,
            };
        }
        (Value::String(s), format) => {
            match format {
                Some(format) => worksheet.write_string_with_format(row, col, s, format)?,
                None => worksheet.write_string(row, col, s)?,
            };
        }
        (other, _) => {
            return Err(ModuleError::Conversion(format!(
                "unsupported cell value {}",
                other
            )));
        }
    }
    Ok(())
}

fn style_format(style: &CellStyle) -> Result<Format, ModuleError> {
    let mut format = Format::new();

    if let Some(background) = &style.background {
        format = format.set_background_color(parse_color(background)?);
    }
    if let Some(color) = &style.color {
        format = format.set_font_color(parse_color(color)?);
    }
    if let Some(weight) = &style.font_weight {
        if weight == "bold" || weight.parse::<u32>().is_ok_and(|w| w >= 600) {
            format = format.set_bold();
        }
    }
    match style.text_align.as_deref() {
        Some("left") => format = format.set_align(FormatAlign::Left),
        Some("center") => format = format.set_align(FormatAlign::Center),
        Some("right") => format = format.set_align(FormatAlign::Right),
        _ => {}
    }

    Ok(format)
}

/// Parse `#RGB` or `#RRGGBB` into an Excel color.
pub fn parse_color(value: &str) -> Result<Color, ModuleError> {
    let digits = COLOR_REGEX
        .captures(value.trim())
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str())
        .ok_or_else(|| ModuleError::Conversion(format!("invalid color '{}'", value)))?;

    let hex: String = if digits.len() == 3 {
        digits.chars().flat_map(|c| [c, c]).collect()
    } else {
        digits.to_string()
    };

    let rgb = u32::from_str_radix(&hex, 16)
        .map_err(|e| ModuleError::Conversion(format!("invalid color '{}': {}", value, e)))?;
    Ok(Color::RGB(rgb))
}

/// Convert a cell name like `a1` or `AB12` into zero-based row and column.
pub fn parse_cell_name(name: &str) -> Result<(RowNum, ColNum), ModuleError> {
    let invalid = || ModuleError::Conversion(format!("invalid cell name '{}'", name));

    let caps = CELL_REGEX.captures(name.trim()).ok_or_else(invalid)?;
    let col = letter_to_col(&caps[1]).ok_or_else(invalid)?;
    let row: u32 = caps[2].parse().map_err(|_| invalid())?;

    if row == 0 || row > MAX_ROWS || col == 0 || col > MAX_COLS {
        return Err(invalid());
    }

    Ok((row - 1, (col - 1) as ColNum))
}

fn letter_to_col(letters: &str) -> Option<u32> {
    letters.chars().try_fold(0u32, |acc, c| {
        let digit = c.to_ascii_uppercase() as u32 - 'A' as u32 + 1;
        acc.checked_mul(26)?.checked_add(digit)
    })
}
