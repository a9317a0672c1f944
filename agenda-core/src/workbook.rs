//! Minimal XLSX writer
//!
//! Produces an Office Open XML workbook (a zip of SpreadsheetML parts) with
//! inline strings, money amounts and dates. Enough for tabular reports; no shared
//! strings, formulas or charts.

use std::io::{Seek, Write};

use chrono::NaiveDate;
use zip::write::SimpleFileOptions;
use zip::ZipWriter;

use crate::domain::result::{Error, Result};

/// Spreadsheet day zero (serial 0), the 1900 date system with its leap bug
const EPOCH: (i32, u32, u32) = (1899, 12, 30);

/// Longest sheet name spreadsheet applications accept
const MAX_SHEET_NAME: usize = 31;

// Indexes into <cellXfs> in styles.xml
const STYLE_DEFAULT: u32 = 0;
const STYLE_HEADER: u32 = 1;
const STYLE_DATE: u32 = 2;
const STYLE_MONEY: u32 = 3;

/// A single cell value
#[derive(Debug, Clone, PartialEq)]
pub enum Cell {
    Empty,
    Text(String),
    /// Number shown with two decimals
    Money(f64),
    Date(NaiveDate),
}

impl Cell {
    pub fn text(value: impl Into<String>) -> Self {
        Cell::Text(value.into())
    }

    /// `Empty` for `None`, text otherwise
    pub fn optional_text(value: Option<&str>) -> Self {
        value.map(Cell::text).unwrap_or(Cell::Empty)
    }
}

/// One worksheet: a bold header row followed by data rows
#[derive(Debug, Clone)]
pub struct Sheet {
    name: String,
    headers: Vec<String>,
    rows: Vec<Vec<Cell>>,
}

impl Sheet {
    pub fn new(name: impl Into<String>, headers: &[&str]) -> Self {
        Self {
            name: name.into(),
            headers: headers.iter().map(|h| h.to_string()).collect(),
            rows: Vec::new(),
        }
    }

    pub fn push_row(&mut self, row: Vec<Cell>) {
        self.rows.push(row);
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn headers(&self) -> &[String] {
        &self.headers
    }

    pub fn rows(&self) -> &[Vec<Cell>] {
        &self.rows
    }

    fn to_xml(&self) -> String {
        let mut xml = String::from(concat!(
            r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>"#,
            "\n",
            r#"<worksheet xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main">"#,
        ));

        if !self.headers.is_empty() {
            xml.push_str(concat!(
                r#"<sheetViews><sheetView workbookViewId="0">"#,
                r#"<pane ySplit="1" topLeftCell="A2" activePane="bottomLeft" state="frozen"/>"#,
                r#"</sheetView></sheetViews>"#,
            ));
        }

        xml.push_str("<sheetData>");
        let mut row_number = 1;
        if !self.headers.is_empty() {
            let header_cells: Vec<Cell> = self.headers.iter().map(|h| Cell::text(h.as_str())).collect();
            write_row(&mut xml, row_number, &header_cells, true);
            row_number += 1;
        }
        for row in &self.rows {
            write_row(&mut xml, row_number, row, false);
            row_number += 1;
        }
        xml.push_str("</sheetData></worksheet>");
        xml
    }
}

/// A workbook under construction
#[derive(Debug, Clone, Default)]
pub struct Workbook {
    sheets: Vec<Sheet>,
}

impl Workbook {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a sheet; names must be unique, non-empty and spreadsheet-safe
    pub fn add_sheet(&mut self, sheet: Sheet) -> Result<()> {
        validate_sheet_name(&sheet.name)?;
        let lower = sheet.name.to_lowercase();
        if self.sheets.iter().any(|s| s.name.to_lowercase() == lower) {
            return Err(Error::validation(format!("duplicate sheet name '{}'", sheet.name)));
        }
        self.sheets.push(sheet);
        Ok(())
    }

    pub fn sheets(&self) -> &[Sheet] {
        &self.sheets
    }

    /// Write the workbook as an XLSX archive
    pub fn write_to<W: Write + Seek>(&self, writer: W) -> Result<()> {
        if self.sheets.is_empty() {
            return Err(Error::validation("a workbook needs at least one sheet"));
        }

        let mut zip = ZipWriter::new(writer);
        let options =
            SimpleFileOptions::default().compression_method(zip::CompressionMethod::Deflated);

        let mut parts: Vec<(String, String)> = vec![
            ("[Content_Types].xml".to_string(), self.content_types_xml()),
            ("_rels/.rels".to_string(), ROOT_RELS.to_string()),
            ("xl/workbook.xml".to_string(), self.workbook_xml()),
            ("xl/_rels/workbook.xml.rels".to_string(), self.workbook_rels_xml()),
            ("xl/styles.xml".to_string(), STYLES.to_string()),
        ];
        for (i, sheet) in self.sheets.iter().enumerate() {
            parts.push((format!("xl/worksheets/sheet{}.xml", i + 1), sheet.to_xml()));
        }

        for (name, content) in parts {
            zip.start_file(name, options).map_err(zip_error)?;
            zip.write_all(content.as_bytes())?;
        }
        zip.finish().map_err(zip_error)?;
        Ok(())
    }

    fn content_types_xml(&self) -> String {
        let mut xml = String::from(concat!(
            r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>"#,
            "\n",
            r#"<Types xmlns="http://schemas.openxmlformats.org/package/2006/content-types">"#,
            r#"<Default Extension="rels" ContentType="application/vnd.openxmlformats-package.relationships+xml"/>"#,
            r#"<Default Extension="xml" ContentType="application/xml"/>"#,
            r#"<Override PartName="/xl/workbook.xml" ContentType="application/vnd.openxmlformats-officedocument.spreadsheetml.sheet.main+xml"/>"#,
            r#"<Override PartName="/xl/styles.xml" ContentType="application/vnd.openxmlformats-officedocument.spreadsheetml.styles+xml"/>"#,
        ));
        for i in 1..=self.sheets.len() {
            xml.push_str(&format!(
                r#"<Override PartName="/xl/worksheets/sheet{}.xml" ContentType="application/vnd.openxmlformats-officedocument.spreadsheetml.worksheet+xml"/>"#,
                i
            ));
        }
        xml.push_str("</Types>");
        xml
    }

    fn workbook_xml(&self) -> String {
        let mut xml = String::from(concat!(
            r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>"#,
            "\n",
            r#"<workbook xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main" "#,
            r#"xmlns:r="http://schemas.openxmlformats.org/officeDocument/2006/relationships">"#,
            "<sheets>",
        ));
        for (i, sheet) in self.sheets.iter().enumerate() {
            xml.push_str(&format!(
                r#"<sheet name="{}" sheetId="{}" r:id="rId{}"/>"#,
                escape_xml(&sheet.name),
                i + 1,
                i + 1
            ));
        }
        xml.push_str("</sheets></workbook>");
        xml
    }

    fn workbook_rels_xml(&self) -> String {
        let mut xml = String::from(concat!(
            r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>"#,
            "\n",
            r#"<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships">"#,
        ));
        for i in 1..=self.sheets.len() {
            xml.push_str(&format!(
                r#"<Relationship Id="rId{}" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/worksheet" Target="worksheets/sheet{}.xml"/>"#,
                i, i
            ));
        }
        // styles take the id after the last sheet
        xml.push_str(&format!(
            r#"<Relationship Id="rId{}" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/styles" Target="styles.xml"/>"#,
            self.sheets.len() + 1
        ));
        xml.push_str("</Relationships>");
        xml
    }
}

const ROOT_RELS: &str = concat!(
    r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>"#,
    "\n",
    r#"<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships">"#,
    r#"<Relationship Id="rId1" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/officeDocument" Target="xl/workbook.xml"/>"#,
    "</Relationships>",
);

const STYLES: &str = concat!(
    r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>"#,
    "\n",
    r#"<styleSheet xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main">"#,
    r#"<numFmts count="1"><numFmt numFmtId="164" formatCode="yyyy\-mm\-dd"/></numFmts>"#,
    r#"<fonts count="2">"#,
    r#"<font><sz val="11"/><name val="Calibri"/></font>"#,
    r#"<font><b/><sz val="11"/><name val="Calibri"/></font>"#,
    "</fonts>",
    r#"<fills count="2"><fill><patternFill patternType="none"/></fill><fill><patternFill patternType="gray125"/></fill></fills>"#,
    r#"<borders count="1"><border><left/><right/><top/><bottom/><diagonal/></border></borders>"#,
    r#"<cellStyleXfs count="1"><xf numFmtId="0" fontId="0" fillId="0" borderId="0"/></cellStyleXfs>"#,
    r#"<cellXfs count="4">"#,
    r#"<xf numFmtId="0" fontId="0" fillId="0" borderId="0" xfId="0"/>"#,
    r#"<xf numFmtId="0" fontId="1" fillId="0" borderId="0" xfId="0" applyFont="1"/>"#,
    r#"<xf numFmtId="164" fontId="0" fillId="0" borderId="0" xfId="0" applyNumberFormat="1"/>"#,
    r#"<xf numFmtId="4" fontId="0" fillId="0" borderId="0" xfId="0" applyNumberFormat="1"/>"#,
    "</cellXfs>",
    r#"<cellStyles count="1"><cellStyle name="Normal" xfId="0" builtinId="0"/></cellStyles>"#,
    "</styleSheet>",
);

fn write_row(xml: &mut String, row_number: usize, cells: &[Cell], header: bool) {
    xml.push_str(&format!(r#"<row r="{}">"#, row_number));
    for (col, cell) in cells.iter().enumerate() {
        let reference = format!("{}{}", column_name(col), row_number);
        let text_style = if header { STYLE_HEADER } else { STYLE_DEFAULT };
        match cell {
            Cell::Empty => {}
            Cell::Text(text) => {
                let space = if text.trim() != text {
                    r#" xml:space="preserve""#
                } else {
                    ""
                };
                xml.push_str(&format!(
                    r#"<c r="{}" s="{}" t="inlineStr"><is><t{}>{}</t></is></c>"#,
                    reference,
                    text_style,
                    space,
                    escape_xml(text)
                ));
            }
            Cell::Money(n) => write_number(xml, &reference, *n, STYLE_MONEY),
            Cell::Date(date) => write_number(xml, &reference, date_serial(*date), STYLE_DATE),
        }
    }
    xml.push_str("</row>");
}

fn write_number(xml: &mut String, reference: &str, value: f64, style: u32) {
    if value.is_finite() {
        xml.push_str(&format!(r#"<c r="{}" s="{}"><v>{}</v></c>"#, reference, style, value));
    }
}

/// Column letters for a zero-based index: 0 -> A, 25 -> Z, 26 -> AA
pub fn column_name(index: usize) -> String {
    let mut n = index + 1;
    let mut name = Vec::new();
    while n > 0 {
        let rem = (n - 1) % 26;
        name.push(b'A' + rem as u8);
        n = (n - 1) / 26;
    }
    name.reverse();
    String::from_utf8_lossy(&name).into_owned()
}

/// Serial day number of a date in the 1900 date system
pub fn date_serial(date: NaiveDate) -> f64 {
    let (y, m, d) = EPOCH;
    NaiveDate::from_ymd_opt(y, m, d)
        .map(|epoch| (date - epoch).num_days() as f64)
        .unwrap_or_default()
}

/// Escape text for XML, dropping characters XML 1.0 cannot carry
pub fn escape_xml(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&apos;"),
            '\t' | '\n' | '\r' => out.push(c),
            c if (c as u32) < 0x20 => {}
            c => out.push(c),
        }
    }
    out
}

fn validate_sheet_name(name: &str) -> Result<()> {
    if name.trim().is_empty() {
        return Err(Error::validation("sheet name cannot be empty"));
    }
    if name.chars().count() > MAX_SHEET_NAME {
        return Err(Error::validation(format!(
            "sheet name '{}' is longer than {} characters",
            name, MAX_SHEET_NAME
        )));
    }
    if let Some(c) = name.chars().find(|c| "[]:*?/\\".contains(*c)) {
        return Err(Error::validation(format!(
            "sheet name '{}' contains '{}'",
            name, c
        )));
    }
    Ok(())
}

fn zip_error(error: zip::result::ZipError) -> Error {
    match error {
        zip::result::ZipError::Io(e) => Error::Io(e),
        other => Error::Io(std::io::Error::new(std::io::ErrorKind::Other, other)),
    }
}
