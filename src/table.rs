use crate::error::PipelineError;
use crate::models::Table;

/// Parses uploaded CSV bytes. The first record is the header row and every
/// data row must have the same number of fields.
pub fn load_csv(data: &[u8]) -> Result<Table, PipelineError> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .from_reader(data);

    let headers: Vec<String> = reader.headers()?.iter().map(str::to_string).collect();
    if headers.is_empty() || headers.iter().all(|header| header.trim().is_empty()) {
        return Err(PipelineError::Parse("file has no header row".to_string()));
    }

    let mut rows = Vec::new();
    for record in reader.records() {
        let record = record?;
        rows.push(record.iter().map(str::to_string).collect());
    }

    Ok(Table { headers, rows })
}

pub fn write_csv(table: &Table) -> Result<Vec<u8>, PipelineError> {
    let mut writer = csv::Writer::from_writer(Vec::new());
    writer
        .write_record(&table.headers)
        .map_err(|err| PipelineError::Write(err.to_string()))?;
    for row in &table.rows {
        writer
            .write_record(row)
            .map_err(|err| PipelineError::Write(err.to_string()))?;
    }
    writer
        .into_inner()
        .map_err(|err| PipelineError::Write(err.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn loads_headers_and_rows_in_order() {
        let table = load_csv(b"Main panel,Sub-profile\nA,Outputs\nB,Impact\n").unwrap();
        assert_eq!(table.headers, vec!["Main panel", "Sub-profile"]);
        assert_eq!(table.rows.len(), 2);
        assert_eq!(table.rows[1], vec!["B", "Impact"]);
    }

    #[test]
    fn quoted_cells_survive_round_trip() {
        let source = "name,allocation\n\"Panel, A\",\"1,000\"\n";
        let table = load_csv(source.as_bytes()).unwrap();
        assert_eq!(table.rows[0], vec!["Panel, A", "1,000"]);

        let written = write_csv(&table).unwrap();
        assert_eq!(String::from_utf8(written).unwrap(), source);
    }

    #[test]
    fn ragged_rows_are_parse_errors() {
        let err = load_csv(b"a,b\n1,2,3\n").unwrap_err();
        assert!(matches!(err, PipelineError::Parse(_)));
    }

    #[test]
    fn empty_upload_is_parse_error() {
        assert!(matches!(load_csv(b""), Err(PipelineError::Parse(_))));
    }

    #[test]
    fn invalid_utf8_is_parse_error() {
        assert!(matches!(
            load_csv(b"a,b\n\xff\xfe,1\n"),
            Err(PipelineError::Parse(_))
        ));
    }

    #[test]
    fn header_only_file_has_no_rows() {
        let table = load_csv(b"a,b\n").unwrap();
        assert!(table.rows.is_empty());
        assert_eq!(write_csv(&table).unwrap(), b"a,b\n".to_vec());
    }
}
