//! Header-plus-rows text into a [`Dataset`].
//!
//! Rows may be ragged: missing trailing cells read as empty text and extra cells
//! are ignored. When a header name repeats, the last column bearing it wins. Each
//! cell is opportunistically typed and dotted headers nest per row.

use std::collections::HashMap;

use crate::{
    data::{Dataset, Value, best_type},
    form::nest_entries,
    io_utils::{self, DEFAULT_CSV_DELIMITER, UTF8_BOM},
};

pub fn parse_table(text: &str) -> Result<Dataset, csv::Error> {
    parse_table_with_delimiter(text, DEFAULT_CSV_DELIMITER)
}

pub fn parse_table_with_delimiter(text: &str, delimiter: u8) -> Result<Dataset, csv::Error> {
    let mut reader = io_utils::open_csv_reader(text.as_bytes(), delimiter);
    let mut records = reader.records();
    let Some(header_row) = records.next().transpose()? else {
        return Ok(Dataset::new());
    };
    let headers: Vec<String> = header_row
        .iter()
        .enumerate()
        .map(|(idx, name)| {
            if idx == 0 {
                name.trim_start_matches(UTF8_BOM).to_string()
            } else {
                name.to_string()
            }
        })
        .collect();

    let mut rows = Dataset::new();
    for record in records {
        let record = record?;
        let mut cells: Vec<(&str, Value)> = Vec::with_capacity(headers.len());
        let mut positions: HashMap<&str, usize> = HashMap::with_capacity(headers.len());
        for (idx, header) in headers.iter().enumerate() {
            let value = best_type(record.get(idx).unwrap_or(""));
            match positions.get(header.as_str()) {
                Some(&pos) => cells[pos].1 = value,
                None => {
                    positions.insert(header.as_str(), cells.len());
                    cells.push((header.as_str(), value));
                }
            }
        }
        rows.push(nest_entries(cells));
    }
    Ok(rows)
}
