//! Tabular source reading with fail-fast schema validation.

use std::path::Path;

use tracing::info;

use crate::error::{RetrievalError, RetrievalResult};

/// Required source column: artifact name.
pub const COL_ARTIFACT_NAME: &str = "文物名称";
/// Required source column: image address.
pub const COL_IMAGE_URL: &str = "图片地址";
/// Required source column: number/period.
pub const COL_NUMBER_PERIOD: &str = "编号-年代";
/// Required source column: history.
pub const COL_HISTORY: &str = "历史";
/// Required source column: craft.
pub const COL_CRAFT: &str = "工艺";

/// All required columns, in no particular order.
pub const REQUIRED_COLUMNS: [&str; 5] = [
    COL_ARTIFACT_NAME,
    COL_IMAGE_URL,
    COL_NUMBER_PERIOD,
    COL_HISTORY,
    COL_CRAFT,
];

/// One source row with every required field coerced to a string.
///
/// Missing or null cells become empty strings; nulls never propagate into
/// document text.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SourceRow {
    pub artifact_name: String,
    pub image_url: String,
    pub number_period: String,
    pub history: String,
    pub craft: String,
}

impl SourceRow {
    /// True when every required field is empty after coercion; such rows
    /// are excluded from the corpus entirely.
    #[must_use]
    pub fn is_blank(&self) -> bool {
        self.artifact_name.is_empty()
            && self.image_url.is_empty()
            && self.number_period.is_empty()
            && self.history.is_empty()
            && self.craft.is_empty()
    }
}

/// Read the catalog source CSV.
///
/// Validates the header first: any missing required column fails the whole
/// read with a schema error listing every missing label, and nothing is
/// partially ingested. Row order is preserved; the returned position of a
/// row is its stable `source_row_index`.
pub fn read_source(path: impl AsRef<Path>) -> RetrievalResult<Vec<SourceRow>> {
    let path = path.as_ref();
    let mut reader = csv::ReaderBuilder::new()
        .flexible(true)
        .from_path(path)
        .map_err(|e| RetrievalError::FileRead {
            path: path.to_path_buf(),
            source: std::io::Error::other(e),
        })?;

    let headers = reader
        .headers()
        .map_err(|e| RetrievalError::FileRead {
            path: path.to_path_buf(),
            source: std::io::Error::other(e),
        })?
        .clone();

    let missing: Vec<String> = REQUIRED_COLUMNS
        .iter()
        .filter(|col| !headers.iter().any(|h| h.trim() == **col))
        .map(|col| col.to_string())
        .collect();
    if !missing.is_empty() {
        return Err(RetrievalError::SchemaError { missing });
    }

    let column_index = |label: &str| {
        headers
            .iter()
            .position(|h| h.trim() == label)
            .expect("required column present after validation")
    };
    let idx_name = column_index(COL_ARTIFACT_NAME);
    let idx_image = column_index(COL_IMAGE_URL);
    let idx_period = column_index(COL_NUMBER_PERIOD);
    let idx_history = column_index(COL_HISTORY);
    let idx_craft = column_index(COL_CRAFT);

    let cell = |record: &csv::StringRecord, idx: usize| {
        record.get(idx).unwrap_or("").trim().to_string()
    };

    let mut rows = Vec::new();
    for record in reader.records() {
        let record = record.map_err(|e| RetrievalError::FileRead {
            path: path.to_path_buf(),
            source: std::io::Error::other(e),
        })?;
        rows.push(SourceRow {
            artifact_name: cell(&record, idx_name),
            image_url: cell(&record, idx_image),
            number_period: cell(&record, idx_period),
            history: cell(&record, idx_history),
            craft: cell(&record, idx_craft),
        });
    }

    info!(rows = rows.len(), path = %path.display(), "read catalog source");
    Ok(rows)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn write_csv(contents: &str) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(contents.as_bytes()).unwrap();
        file.flush().unwrap();
        file
    }

    #[test]
    fn test_read_valid_source() {
        let file = write_csv(
            "文物名称,图片地址,编号-年代,历史,工艺\n\
             青铜鼎,http://example.com/1.jpg,商代,王室礼器,铸造\n\
             玉璧,,汉代,礼器,雕刻\n",
        );
        let rows = read_source(file.path()).unwrap();

        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].artifact_name, "青铜鼎");
        assert_eq!(rows[0].number_period, "商代");
        assert_eq!(rows[1].image_url, "");
        assert_eq!(rows[1].craft, "雕刻");
    }

    #[test]
    fn test_missing_columns_fail_fast() {
        let file = write_csv("文物名称,历史\n青铜鼎,王室礼器\n");
        let err = read_source(file.path()).unwrap_err();

        match err {
            RetrievalError::SchemaError { missing } => {
                assert_eq!(missing.len(), 3);
                assert!(missing.contains(&COL_IMAGE_URL.to_string()));
                assert!(missing.contains(&COL_NUMBER_PERIOD.to_string()));
                assert!(missing.contains(&COL_CRAFT.to_string()));
            }
            other => panic!("expected SchemaError, got {other:?}"),
        }
    }

    #[test]
    fn test_short_records_coerce_to_empty() {
        let file = write_csv(
            "文物名称,图片地址,编号-年代,历史,工艺\n\
             青铜鼎\n",
        );
        let rows = read_source(file.path()).unwrap();

        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].artifact_name, "青铜鼎");
        assert_eq!(rows[0].history, "");
    }

    #[test]
    fn test_blank_row_detection() {
        let blank = SourceRow::default();
        assert!(blank.is_blank());

        let not_blank = SourceRow {
            history: "礼器".to_string(),
            ..SourceRow::default()
        };
        assert!(!not_blank.is_blank());
    }

    #[test]
    fn test_missing_file() {
        assert!(matches!(
            read_source("/nonexistent/catalog.csv").unwrap_err(),
            RetrievalError::FileRead { .. }
        ));
    }
}
