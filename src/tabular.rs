use crate::errors::{AppError, Result};
use crate::offer::{EXPORT_HEADER, Offer};
use crate::record::{Field, Record};
use calamine::{Data, Reader, open_workbook_auto_from_rs};
use std::io::Cursor;
use std::path::Path;
use tracing::info;

/// One decoded worksheet: ordered records under their header labels.
#[derive(Debug, Clone)]
pub struct Sheet {
    pub name: String,
    pub records: Vec<Record>,
}

/// Decode uploaded tabular bytes by file extension: delimited text goes
/// through the CSV reader, everything else is treated as a workbook.
pub fn decode_tabular(file_name: &str, bytes: &[u8]) -> Result<Vec<Sheet>> {
    if file_extension(file_name) == "csv" {
        decode_delimited(bytes)
    } else {
        decode_workbook(bytes)
    }
}

/// Lowercased extension of a file name, empty when there is none.
pub fn file_extension(file_name: &str) -> String {
    Path::new(file_name)
        .extension()
        .map(|ext| ext.to_string_lossy().to_lowercase())
        .unwrap_or_default()
}

fn cell_to_field(data: &Data) -> Field {
    match data {
        Data::Empty => Field::Empty,
        Data::String(s) => {
            if s.trim().is_empty() {
                Field::Empty
            } else {
                Field::Text(s.clone())
            }
        }
        Data::Float(f) => Field::Number(*f),
        Data::Int(i) => Field::Number(*i as f64),
        Data::Bool(b) => Field::Text(b.to_string()),
        Data::DateTime(dt) => Field::Number(dt.as_f64()),
        Data::DateTimeIso(s) | Data::DurationIso(s) => Field::Text(s.clone()),
        Data::Error(_) => Field::Empty,
    }
}

fn header_label(cell: &Data, index: usize) -> String {
    let text = cell_to_field(cell).display();
    if text.is_empty() {
        format!("Sütun {}", index + 1)
    } else {
        text
    }
}

/// Decode a binary workbook (xlsx/xls/xlsm); every sheet's first row is
/// its header row and column order is preserved.
pub fn decode_workbook(bytes: &[u8]) -> Result<Vec<Sheet>> {
    let cursor = Cursor::new(bytes.to_vec());
    let mut workbook = open_workbook_auto_from_rs(cursor)
        .map_err(|e| AppError::Parse(format!("workbook could not be opened: {e}")))?;

    let names = workbook.sheet_names().to_owned();
    let mut sheets = Vec::new();
    for name in names {
        let Ok(range) = workbook.worksheet_range(&name) else {
            continue;
        };
        let mut rows = range.rows();
        let Some(header_row) = rows.next() else {
            continue;
        };
        let mut headers: Vec<String> = Vec::with_capacity(header_row.len());
        for (index, cell) in header_row.iter().enumerate() {
            let mut label = header_label(cell, index);
            // duplicate headers would collapse columns in the record map
            if headers.contains(&label) {
                label = format!("{label} ({})", index + 1);
            }
            headers.push(label);
        }

        let mut records = Vec::new();
        for row in rows {
            let record: Record = headers
                .iter()
                .enumerate()
                .map(|(i, header)| {
                    (
                        header.clone(),
                        row.get(i).map(cell_to_field).unwrap_or(Field::Empty),
                    )
                })
                .collect();
            if record.iter().all(|(_, field)| field.is_empty()) {
                continue;
            }
            records.push(record);
        }
        info!(sheet = %name, rows = records.len(), "worksheet decoded");
        sheets.push(Sheet { name, records });
    }

    if sheets.is_empty() {
        return Err(AppError::Parse("workbook has no readable sheets".into()));
    }
    Ok(sheets)
}

/// Decode delimited text into a single sheet.
pub fn decode_delimited(bytes: &[u8]) -> Result<Vec<Sheet>> {
    let mut reader = csv::ReaderBuilder::new()
        .flexible(true)
        .has_headers(true)
        .from_reader(bytes);

    let mut headers: Vec<String> = Vec::new();
    for (index, header) in reader.headers()?.iter().enumerate() {
        let trimmed = header.trim();
        let mut label = if trimmed.is_empty() {
            format!("Sütun {}", index + 1)
        } else {
            trimmed.to_string()
        };
        if headers.contains(&label) {
            label = format!("{label} ({})", index + 1);
        }
        headers.push(label);
    }
    if headers.is_empty() {
        return Err(AppError::Parse("delimited file has no header row".into()));
    }

    let mut records = Vec::new();
    for row in reader.records() {
        let row = row?;
        let record: Record = headers
            .iter()
            .enumerate()
            .map(|(i, header)| {
                let value = row.get(i).unwrap_or("");
                let field = if value.trim().is_empty() {
                    Field::Empty
                } else {
                    Field::Text(value.to_string())
                };
                (header.clone(), field)
            })
            .collect();
        if record.iter().all(|(_, field)| field.is_empty()) {
            continue;
        }
        records.push(record);
    }

    Ok(vec![Sheet {
        name: "csv".into(),
        records,
    }])
}

fn money(value: f64) -> String {
    format!("{value:.2}")
}

/// Write the priced offer: the fixed header, one row per demand line,
/// then the Ara Toplam / KDV / Genel Toplam summary block.
pub fn write_offer<P: AsRef<Path>>(path: P, offer: &Offer) -> Result<usize> {
    let mut writer = csv::WriterBuilder::new()
        .flexible(true)
        .from_path(path.as_ref())?;

    writer.write_record(EXPORT_HEADER)?;
    for row in &offer.rows {
        writer.write_record([
            row.category.label(),
            row.product_name.as_str(),
            row.product_code.as_deref().unwrap_or(""),
            &row.quantity.to_string(),
            row.unit.as_str(),
            &money(row.unit_price),
            &money(row.discount_rate),
            &money(row.discounted_unit),
            &money(row.vat_inclusive_unit),
            &money(row.line_total),
        ])?;
    }
    writer.write_record([""; 10])?;
    writer.write_record(["Ara Toplam", &money(offer.totals.subtotal)])?;
    writer.write_record(["KDV", &money(offer.totals.vat_total)])?;
    writer.write_record(["Genel Toplam", &money(offer.totals.grand_total)])?;
    writer.flush()?;

    info!(path = %path.as_ref().display(), rows = offer.rows.len(), "offer exported");
    Ok(offer.rows.len())
}
