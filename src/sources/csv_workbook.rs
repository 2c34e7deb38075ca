use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tracing::debug;

use super::{Credential, Worksheet, WorksheetReader};
use crate::errors::{SourceError, SourceResult};

/// Reads worksheets exported as CSV files laid out as
/// `<root>/<spreadsheet_id>/<worksheet title>.csv`.
#[derive(Debug, Clone)]
pub struct CsvWorkbookReader {
    root: PathBuf,
}

impl CsvWorkbookReader {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    fn worksheet_path(&self, spreadsheet_id: &str, title: &str) -> SourceResult<PathBuf> {
        validate_segment(spreadsheet_id)?;
        validate_segment(title)?;
        Ok(self.root.join(spreadsheet_id).join(format!("{title}.csv")))
    }
}

fn validate_segment(segment: &str) -> SourceResult<()> {
    let invalid = segment.is_empty()
        || segment.contains(['/', '\\'])
        || segment == "."
        || segment.contains("..");
    if invalid {
        return Err(SourceError::InvalidSpreadsheetId(segment.to_string()));
    }
    Ok(())
}

pub fn parse_worksheet(bytes: &[u8]) -> SourceResult<Worksheet> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_reader(bytes);

    let mut rows = Vec::new();
    for record in reader.records() {
        let record = record?;
        rows.push(record.iter().map(|cell| Some(cell.to_string())).collect());
    }
    Ok(Worksheet::new(rows))
}

async fn read_if_exists(path: &Path) -> SourceResult<Option<Vec<u8>>> {
    match tokio::fs::read(path).await {
        Ok(bytes) => Ok(Some(bytes)),
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(None),
        Err(err) => Err(err.into()),
    }
}

#[async_trait]
impl WorksheetReader for CsvWorkbookReader {
    async fn read_worksheet(
        &self,
        _credential: &Credential,
        spreadsheet_id: &str,
        title: &str,
    ) -> SourceResult<Option<Worksheet>> {
        let path = self.worksheet_path(spreadsheet_id, title)?;
        match read_if_exists(&path).await? {
            Some(bytes) => {
                debug!("Reading worksheet {} from {}", title, path.display());
                parse_worksheet(&bytes).map(Some)
            }
            None => {
                debug!("Worksheet {} not found at {}", title, path.display());
                Ok(None)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::IngestionConfig;
    use crate::sources::{GridSpreadsheetSource, SpreadsheetSource};

    fn credential() -> Credential {
        Credential::new("local", None)
    }

    #[test]
    fn test_parse_worksheet_keeps_ragged_rows() {
        let sheet = parse_worksheet(b"Name,Categories\nBruce,Metal,extra\nSolo\n").unwrap();
        assert_eq!(sheet.row_count(), 3);
        assert_eq!(sheet.cell(2, 3), Some("extra".to_string()));
        assert_eq!(sheet.cell(3, 2), None);
    }

    #[tokio::test]
    async fn test_rejects_path_traversal() {
        let reader = CsvWorkbookReader::new("/tmp");
        let result = reader
            .read_worksheet(&credential(), "../etc", "NODES")
            .await;
        assert!(matches!(result, Err(SourceError::InvalidSpreadsheetId(_))));
    }

    #[tokio::test]
    async fn test_missing_worksheet_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir_all(dir.path().join("sheet-1")).unwrap();
        std::fs::write(
            dir.path().join("sheet-1").join("CATEGORIES.csv"),
            "Name,Node style,Label style\nMetal,,\n",
        )
        .unwrap();

        let source = GridSpreadsheetSource::new(
            CsvWorkbookReader::new(dir.path()),
            &IngestionConfig::default(),
        );
        let categories = source.get_categories(&credential(), "sheet-1").await.unwrap();
        assert_eq!(categories.len(), 1);
        assert_eq!(categories[0].name.as_deref(), Some("Metal"));

        let nodes = source.get_nodes(&credential(), "sheet-1").await.unwrap();
        assert!(nodes.is_empty());
        let css = source.get_generic_css(&credential(), "sheet-1").await.unwrap();
        assert_eq!(css, "");
    }
}
