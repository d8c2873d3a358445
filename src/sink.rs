use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use serde::Serialize;
use serde_json::ser::PrettyFormatter;
use tracing::info;

use crate::error::{EsgError, Result};
use crate::pipeline::ClassificationRecord;

/// Write `records` to `destination` as a JSON array, in the given order.
pub fn persist(records: &[ClassificationRecord], destination: &Path) -> Result<()> {
    let write_error = |source: std::io::Error| EsgError::DestinationWrite {
        path: destination.to_path_buf(),
        source,
    };

    let file = File::create(destination).map_err(write_error)?;
    let mut writer = BufWriter::new(file);
    write_records(records, &mut writer).map_err(write_error)?;
    writer.flush().map_err(write_error)?;

    info!(records = records.len(), path = ?destination, "Saved results");
    Ok(())
}

fn write_records<W: Write>(records: &[ClassificationRecord], writer: &mut W) -> std::io::Result<()> {
    let mut ser = serde_json::Serializer::with_formatter(&mut *writer, PrettyFormatter::with_indent(b"    "));
    records.serialize(&mut ser)?;
    writer.write_all(b"\n")
}

/// Read back a result set written by [`persist`].
#[cfg(test)]
pub fn load(path: &Path) -> Result<Vec<ClassificationRecord>> {
    use std::io::BufReader;

    let file = File::open(path).map_err(|e| EsgError::DocumentAccess {
        path: path.display().to_string(),
        reason: e.to_string(),
    })?;
    serde_json::from_reader(BufReader::new(file)).map_err(|e| EsgError::DocumentAccess {
        path: path.display().to_string(),
        reason: e.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::classifier::label::EsgCategory;

    fn sample() -> Vec<ClassificationRecord> {
        vec![
            ClassificationRecord {
                page: 1,
                content: "Scope 1 and 2 emissions\n".into(),
                esg_category: Some(EsgCategory::Environment),
            },
            ClassificationRecord {
                page: 3,
                content: "Code of conduct \"quoted\" ünïcode".into(),
                esg_category: None,
            },
            ClassificationRecord {
                page: 4,
                content: "Board oversight".into(),
                esg_category: Some(EsgCategory::Governance),
            },
        ]
    }

    #[test]
    fn round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.json");
        persist(&sample(), &path).unwrap();
        assert_eq!(load(&path).unwrap(), sample());
    }

    #[test]
    fn key_order_and_null() {
        let mut buf = Vec::new();
        write_records(&sample()[1..2], &mut buf).unwrap();
        let text = String::from_utf8(buf).unwrap();

        let page = text.find("\"page\"").unwrap();
        let content = text.find("\"content\"").unwrap();
        let category = text.find("\"esg_category\"").unwrap();
        assert!(page < content && content < category);
        assert!(text.contains("\"esg_category\": null"));
        assert!(text.contains("\n        \"page\": 3"), "expected 4-space indent: {}", text);
    }

    #[test]
    fn empty_result_set_is_empty_array() {
        let mut buf = Vec::new();
        write_records(&[], &mut buf).unwrap();
        let parsed: serde_json::Value = serde_json::from_slice(&buf).unwrap();
        assert_eq!(parsed, serde_json::json!([]));
    }

    #[test]
    fn unwritable_destination() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("missing").join("out.json");
        let err = persist(&sample(), &path).unwrap_err();
        assert!(matches!(err, EsgError::DestinationWrite { path: p, .. } if p == path));
    }
}
