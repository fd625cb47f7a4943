//! Spreadsheet codec: CSV and XLSX encoding of report tables, import
//! templates, and decoding of uploaded files into raw string rows

use std::io::Cursor;

use calamine::{Data, Reader, Xlsx};
use chrono::{Days, NaiveDate};
use rust_decimal::prelude::ToPrimitive;
use rust_xlsxwriter::{Format, Workbook};
use shared::import::{ImportKind, RawTable};
use shared::table::{Cell, Table};

use crate::error::{AppError, AppResult};

pub const XLSX_CONTENT_TYPE: &str =
    "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet";
pub const CSV_CONTENT_TYPE: &str = "text/csv; charset=utf-8";

/// Excel limits sheet names to 31 characters
const MAX_SHEET_NAME: usize = 31;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportFormat {
    Xlsx,
    Csv,
}

impl ExportFormat {
    /// Parse a `format` query value; absent means XLSX
    pub fn parse(value: Option<&str>) -> AppResult<Self> {
        match value.map(|v| v.trim().to_ascii_lowercase()).as_deref() {
            None | Some("") | Some("xlsx") | Some("excel") => Ok(ExportFormat::Xlsx),
            Some("csv") => Ok(ExportFormat::Csv),
            Some(_) => Err(AppError::validation("format", "Format must be xlsx or csv")),
        }
    }

    pub fn extension(&self) -> &'static str {
        match self {
            ExportFormat::Xlsx => "xlsx",
            ExportFormat::Csv => "csv",
        }
    }

    pub fn content_type(&self) -> &'static str {
        match self {
            ExportFormat::Xlsx => XLSX_CONTENT_TYPE,
            ExportFormat::Csv => CSV_CONTENT_TYPE,
        }
    }

    pub fn encode(&self, table: &Table) -> AppResult<Vec<u8>> {
        match self {
            ExportFormat::Xlsx => encode_xlsx(table),
            ExportFormat::Csv => encode_csv(table),
        }
    }
}

/// Encode a table as CSV with a header row
pub fn encode_csv(table: &Table) -> AppResult<Vec<u8>> {
    let mut writer = csv::Writer::from_writer(Vec::new());
    writer
        .write_record(&table.headers)
        .map_err(|e| AppError::Internal(format!("CSV write failed: {}", e)))?;
    for row in &table.rows {
        writer
            .write_record(row.iter().map(Cell::to_text))
            .map_err(|e| AppError::Internal(format!("CSV write failed: {}", e)))?;
    }
    writer
        .into_inner()
        .map_err(|e| AppError::Internal(format!("CSV write failed: {}", e)))
}

/// Encode a table as a single-sheet workbook with a bold header row
pub fn encode_xlsx(table: &Table) -> AppResult<Vec<u8>> {
    let xlsx_err = |e: rust_xlsxwriter::XlsxError| AppError::Internal(format!("XLSX write failed: {}", e));

    let mut workbook = Workbook::new();
    let bold = Format::new().set_bold();
    let worksheet = workbook.add_worksheet();
    let sheet_name: String = table
        .title
        .chars()
        .filter(|c| !matches!(c, '[' | ']' | ':' | '*' | '?' | '/' | '\\'))
        .take(MAX_SHEET_NAME)
        .collect();
    if !sheet_name.is_empty() {
        worksheet.set_name(&sheet_name).map_err(xlsx_err)?;
    }

    for (col, header) in table.headers.iter().enumerate() {
        let col = col as u16;
        worksheet
            .write_string_with_format(0, col, header, &bold)
            .map_err(xlsx_err)?;
        worksheet
            .set_column_width(col, (header.len() + 4).max(12) as f64)
            .map_err(xlsx_err)?;
    }

    for (r, row) in table.rows.iter().enumerate() {
        let r = r as u32 + 1;
        for (col, cell) in row.iter().enumerate() {
            let col = col as u16;
            match cell {
                Cell::Integer(i) => {
                    worksheet.write_number(r, col, *i as f64).map_err(xlsx_err)?;
                }
                Cell::Decimal(d) => match d.to_f64() {
                    Some(n) => {
                        worksheet.write_number(r, col, n).map_err(xlsx_err)?;
                    }
                    None => {
                        worksheet.write_string(r, col, cell.to_text()).map_err(xlsx_err)?;
                    }
                },
                Cell::Text(_) | Cell::Date(_) => {
                    worksheet.write_string(r, col, cell.to_text()).map_err(xlsx_err)?;
                }
                Cell::Empty => {}
            }
        }
    }

    workbook.save_to_buffer().map_err(xlsx_err)
}

/// Empty workbook with the header row an import of `kind` expects
pub fn import_template(kind: ImportKind) -> AppResult<Vec<u8>> {
    let headers = kind.template_headers();
    encode_xlsx(&Table::new(kind.as_str(), &headers))
}

/// Decode an uploaded `.xlsx` or `.csv` file
///
/// The format is taken from the file's content first: XLSX files are ZIP
/// archives. Anything else must be a UTF-8 CSV.
pub fn decode_upload(file_name: Option<&str>, bytes: &[u8]) -> AppResult<RawTable> {
    let lower = file_name.map(str::to_ascii_lowercase).unwrap_or_default();
    if bytes.starts_with(b"PK\x03\x04") {
        return decode_xlsx(bytes);
    }
    if lower.ends_with(".xlsx") {
        return Err(AppError::Spreadsheet("file is not a valid .xlsx workbook".to_string()));
    }
    if !lower.is_empty() && !lower.ends_with(".csv") && !lower.ends_with(".txt") {
        return Err(AppError::validation("file", "Only .xlsx and .csv files are supported"));
    }
    decode_csv(bytes)
}

/// Decode CSV, detecting `;` as the delimiter when it dominates the first line
pub fn decode_csv(bytes: &[u8]) -> AppResult<RawTable> {
    let text = std::str::from_utf8(bytes)
        .map_err(|_| AppError::Spreadsheet("CSV file must be UTF-8 encoded".to_string()))?;
    let text = text.strip_prefix('\u{feff}').unwrap_or(text);

    let first_line = text.lines().next().unwrap_or_default();
    let delimiter = if first_line.matches(';').count() > first_line.matches(',').count() {
        b';'
    } else {
        b','
    };

    let mut reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .delimiter(delimiter)
        .from_reader(text.as_bytes());

    let mut rows = Vec::new();
    for record in reader.records() {
        let record = record.map_err(|e| AppError::Spreadsheet(e.to_string()))?;
        rows.push(record.iter().map(|c| c.trim().to_string()).collect());
    }
    Ok(RawTable::new(rows))
}

/// Decode the first worksheet of an XLSX workbook
pub fn decode_xlsx(bytes: &[u8]) -> AppResult<RawTable> {
    let mut workbook: Xlsx<_> = Xlsx::new(Cursor::new(bytes.to_vec()))
        .map_err(|e| AppError::Spreadsheet(e.to_string()))?;
    let range = workbook
        .worksheet_range_at(0)
        .ok_or_else(|| AppError::Spreadsheet("workbook has no worksheets".to_string()))?
        .map_err(|e| AppError::Spreadsheet(e.to_string()))?;

    let rows = range
        .rows()
        .map(|row| row.iter().map(cell_text).collect())
        .collect();
    Ok(RawTable::new(rows))
}

fn cell_text(cell: &Data) -> String {
    match cell {
        Data::String(s) => s.trim().to_string(),
        Data::Int(i) => i.to_string(),
        Data::Float(f) => float_text(*f),
        Data::Bool(b) => b.to_string(),
        Data::DateTime(dt) => excel_serial_to_date(dt.as_f64())
            .map(|d| d.format("%Y-%m-%d").to_string())
            .unwrap_or_else(|| float_text(dt.as_f64())),
        Data::DateTimeIso(s) | Data::DurationIso(s) => s.clone(),
        Data::Error(_) | Data::Empty => String::new(),
    }
}

/// Whole floats print without a fractional part (`12`, not `12.0`)
///
/// Exactly three fractional digits get a trailing zero so a numeric cell
/// never reads like a `12.500` thousands group.
fn float_text(f: f64) -> String {
    if f.fract() == 0.0 && f.abs() < 1e15 {
        return format!("{}", f as i64);
    }
    let text = f.to_string();
    match text.split_once('.') {
        Some((_, frac)) if frac.len() == 3 => text + "0",
        _ => text,
    }
}

/// Serial of 9999-12-31, the last date Excel can display
const MAX_EXCEL_SERIAL: f64 = 2_958_465.0;

/// Convert an Excel serial day number (1900 date system) to a date
///
/// Serials outside Excel's date range yield `None`; the cell then decodes
/// as its plain number so the import reports it as an invalid date.
pub fn excel_serial_to_date(serial: f64) -> Option<NaiveDate> {
    if !serial.is_finite() || !(1.0..=MAX_EXCEL_SERIAL).contains(&serial) {
        return None;
    }
    // Day 0 is 1899-12-30 once Excel's phantom 1900-02-29 is accounted for
    let epoch = NaiveDate::from_ymd_opt(1899, 12, 30)?;
    epoch.checked_add_days(Days::new(serial.floor() as u64))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal::Decimal;

    fn sample_table() -> Table {
        let mut table = Table::new("Items", &["Code", "Name", "Min Stock", "Price"]);
        table.push_row(vec!["BRG-001".into(), "Baut, M8".into(), 10.into(), Decimal::new(12500, 2).into()]);
        table
    }

    #[test]
    fn test_export_format_parse() {
        assert_eq!(ExportFormat::parse(None).unwrap(), ExportFormat::Xlsx);
        assert_eq!(ExportFormat::parse(Some("CSV")).unwrap(), ExportFormat::Csv);
        assert!(ExportFormat::parse(Some("pdf")).is_err());
    }

    #[test]
    fn test_encode_csv_quotes_commas() {
        let bytes = encode_csv(&sample_table()).unwrap();
        let text = String::from_utf8(bytes).unwrap();
        assert_eq!(text, "Code,Name,Min Stock,Price\nBRG-001,\"Baut, M8\",10,125\n");
    }

    #[test]
    fn test_xlsx_written_and_read_back() {
        let bytes = encode_xlsx(&sample_table()).unwrap();
        assert!(bytes.starts_with(b"PK\x03\x04"));

        let raw = decode_upload(Some("items.xlsx"), &bytes).unwrap();
        assert_eq!(raw.rows[0], vec!["Code", "Name", "Min Stock", "Price"]);
        assert_eq!(raw.rows[1], vec!["BRG-001", "Baut, M8", "10", "125"]);
    }

    #[test]
    fn test_template_has_headers() {
        let bytes = import_template(ImportKind::Inbound).unwrap();
        let raw = decode_xlsx(&bytes).unwrap();
        assert_eq!(raw.rows.len(), 1);
        assert_eq!(raw.rows[0].len(), ImportKind::Inbound.template_headers().len());
    }

    #[test]
    fn test_decode_csv_semicolon_and_bom() {
        let raw = decode_csv("\u{feff}Kode;Nama\nA1;Alpha\n".as_bytes()).unwrap();
        assert_eq!(raw.rows, vec![vec!["Kode", "Nama"], vec!["A1", "Alpha"]]);
    }

    #[test]
    fn test_decode_rejects_unknown_extension() {
        assert!(decode_upload(Some("items.pdf"), b"%PDF-1.4").is_err());
    }

    #[test]
    fn test_excel_serial_dates() {
        assert_eq!(excel_serial_to_date(45809.0), NaiveDate::from_ymd_opt(2025, 6, 1));
        assert_eq!(excel_serial_to_date(0.0), None);
        assert_eq!(float_text(12.0), "12");
        assert_eq!(float_text(12.5), "12.5");
        assert_eq!(float_text(12.125), "12.1250");
        assert_eq!(
            shared::import::parse_decimal(&float_text(12.125)),
            Some(rust_decimal::Decimal::new(12125, 3))
        );
    }

    #[test]
    fn test_excel_serial_out_of_range() {
        assert_eq!(excel_serial_to_date(2_958_465.0), NaiveDate::from_ymd_opt(9999, 12, 31));
        assert_eq!(excel_serial_to_date(2_958_466.0), None);
        assert_eq!(excel_serial_to_date(1e20), None);
        assert_eq!(excel_serial_to_date(f64::INFINITY), None);
    }

    #[test]
    fn test_xlsx_huge_date_cell_decodes_as_number() {
        let mut workbook = Workbook::new();
        let date_format = Format::new().set_num_format("yyyy-mm-dd");
        let worksheet = workbook.add_worksheet();
        worksheet.write_string(0, 0, "Date").unwrap();
        worksheet.write_number_with_format(1, 0, 1e20, &date_format).unwrap();
        worksheet.write_number_with_format(2, 0, 45809.0, &date_format).unwrap();
        let bytes = workbook.save_to_buffer().unwrap();

        let raw = decode_upload(Some("inbound.xlsx"), &bytes).unwrap();
        assert_eq!(raw.rows[1][0], "100000000000000000000");
        assert_eq!(raw.rows[2][0], "2025-06-01");
    }
}
