//! Scenario file reading
//!
//! Reads a scenario CSV into [`ScenarioStep`]s. Malformed rows are fatal
//! here: a scenario that cannot be parsed is a broken input file, unlike a
//! business-rule rejection during replay, which the runner logs and skips.

use crate::io::csv_format::{convert_record, OperationRecord, ScenarioStep};
use crate::types::LedgerError;
use std::path::Path;

/// Read and convert every operation in a scenario file
///
/// # Errors
///
/// `Io` when the file cannot be opened, `Parse` (with the line number) for
/// rows that fail CSV deserialization or operation conversion.
pub fn read_operations(path: &Path) -> Result<Vec<ScenarioStep>, LedgerError> {
    let mut reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_path(path)
        .map_err(|error| match error.kind() {
            csv::ErrorKind::Io(_) => LedgerError::Io {
                message: format!("cannot open {}: {}", path.display(), error),
            },
            _ => LedgerError::from(error),
        })?;

    let mut steps = Vec::new();
    for (index, row) in reader.deserialize::<OperationRecord>().enumerate() {
        // Header occupies line 1; data rows start at line 2.
        let line = (index + 2) as u64;
        let record = row?;
        let step = convert_record(record).map_err(|message| LedgerError::Parse {
            line: Some(line),
            message,
        })?;
        steps.push(step);
    }
    Ok(steps)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::io::csv_format::ScenarioOp;
    use std::io::Write;
    use tempfile::NamedTempFile;

    const HEADER: &str = "op,owner,card,to_card,amount,number,expires,op_type,daily,monthly,description,at\n";

    fn scenario_file(rows: &str) -> NamedTempFile {
        let mut file = NamedTempFile::new().expect("temp file");
        file.write_all(HEADER.as_bytes()).unwrap();
        file.write_all(rows.as_bytes()).unwrap();
        file.flush().unwrap();
        file
    }

    #[test]
    fn test_read_mixed_operations() {
        let file = scenario_file(
            "create,alice,c1,,500.00,4111111111111111,2030-12-31,,,,,\n\
             deposit,alice,c1,,50.00,,,,,,salary,\n\
             sweep,,,,,,,,,,,\n",
        );

        let steps = read_operations(file.path()).unwrap();
        assert_eq!(steps.len(), 3);
        assert!(matches!(steps[0].op, ScenarioOp::Create { .. }));
        assert!(matches!(
            &steps[1].op,
            ScenarioOp::Deposit { description: Some(text), .. } if text == "salary"
        ));
        assert_eq!(steps[2].op, ScenarioOp::Sweep);
    }

    #[test]
    fn test_parse_error_carries_line_number() {
        let file = scenario_file(
            "sweep,,,,,,,,,,,\n\
             withdraw,alice,c1,,not-a-number,,,,,,,\n",
        );

        let error = read_operations(file.path()).unwrap_err();
        match error {
            LedgerError::Parse { line, message } => {
                assert_eq!(line, Some(3));
                assert!(message.contains("Invalid amount"));
            }
            other => panic!("expected Parse error, got {:?}", other),
        }
    }

    #[test]
    fn test_missing_file_is_an_io_error() {
        let error = read_operations(Path::new("does/not/exist.csv")).unwrap_err();
        assert!(matches!(error, LedgerError::Io { .. }));
    }
}
