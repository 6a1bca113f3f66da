//! CSV encoding and decoding of tables.
//!
//! Tables travel as comma-separated text with a header row. Empty fields
//! decode to missing values and missing values encode to empty fields.

use polars::io::csv::read::CsvReadOptions;
use polars::prelude::*;
use std::io::Cursor;
use tracing::debug;

/// Number of rows used to infer column dtypes.
pub const INFER_SCHEMA_ROWS: usize = 100;

/// Decode CSV bytes into a DataFrame.
///
/// If the first attempt fails, the input is retried with blank lines removed.
pub fn decode_table(bytes: &[u8]) -> PolarsResult<DataFrame> {
    match read_csv(bytes.to_vec()) {
        Ok(df) => Ok(df),
        Err(e) => {
            debug!("Standard loading failed: {}", e);
            let content = String::from_utf8_lossy(bytes);
            read_csv(strip_blank_lines(&content).into_bytes())
        }
    }
}

/// Encode a DataFrame as CSV bytes with a header row.
pub fn encode_table(df: &mut DataFrame) -> PolarsResult<Vec<u8>> {
    let mut buf = Vec::new();
    CsvWriter::new(&mut buf)
        .include_header(true)
        .with_separator(b',')
        .with_quote_char(b'"')
        .finish(df)?;
    Ok(buf)
}

fn read_csv(bytes: Vec<u8>) -> PolarsResult<DataFrame> {
    CsvReadOptions::default()
        .with_infer_schema_length(Some(INFER_SCHEMA_ROWS))
        .with_has_header(true)
        .into_reader_with_file_handle(Cursor::new(bytes))
        .finish()
}

fn strip_blank_lines(content: &str) -> String {
    content
        .lines()
        .filter(|line| !line.trim().is_empty())
        .collect::<Vec<_>>()
        .join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_infers_kinds_and_missing() {
        let df = decode_table(b"id,score,name\n1,0.5,a\n2,,b\n3,1.5,\n").unwrap();

        assert_eq!(df.shape(), (3, 3));
        assert_eq!(df.column("id").unwrap().dtype(), &DataType::Int64);
        assert_eq!(df.column("score").unwrap().dtype(), &DataType::Float64);
        assert_eq!(df.column("score").unwrap().null_count(), 1);
        assert_eq!(df.column("name").unwrap().null_count(), 1);
    }

    #[test]
    fn test_encode_writes_header_and_empty_fields() {
        let mut df = df![
            "a" => [Some(1i64), None],
            "b" => [Some("x,y"), Some("z")],
        ]
        .unwrap();

        let text = String::from_utf8(encode_table(&mut df).unwrap()).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines[0], "a,b");
        assert_eq!(lines[1], "1,\"x,y\"");
        assert_eq!(lines[2], ",z");
    }

    #[test]
    fn test_decoded_table_survives_encoding() {
        let input = b"col1,col2\n1,x\n4,y\n";
        let mut df = decode_table(input).unwrap();
        let bytes = encode_table(&mut df).unwrap();
        let again = decode_table(&bytes).unwrap();
        assert!(df.equals_missing(&again));
    }

    #[test]
    fn test_strip_blank_lines() {
        assert_eq!(strip_blank_lines("a,b\n\n1,2\n   \n3,4\n"), "a,b\n1,2\n3,4");
    }
}
