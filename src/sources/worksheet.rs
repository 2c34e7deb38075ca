use async_trait::async_trait;

use super::{CategoryRow, Credential, NodeRow, SimpleCss, SpreadsheetSource};
use crate::config::IngestionConfig;
use crate::errors::SourceResult;

// Column positions are 1-based, as in the sheet
const CATEGORY_NAME_COL: usize = 1;
const CATEGORY_NODE_STYLE_COL: usize = 2;
const CATEGORY_LABEL_STYLE_COL: usize = 3;

const NODE_NAME_COL: usize = 1;
const NODE_CATEGORIES_COL: usize = 2;
const NODE_IMPORTANCE_COL: usize = 3;
const NODE_SHORT_DESCRIPTION_COL: usize = 4;
const NODE_LONG_DESCRIPTION_COL: usize = 5;
const NODE_CONTEXT_URL_COL: usize = 6;
const NODE_CREDIT_COL: usize = 7;
const NODE_NODE_STYLE_COL: usize = 8;
const NODE_LABEL_STYLE_COL: usize = 9;

const STYLE_CLASS_COL: usize = 1;
const STYLE_DECLARATION_COL: usize = 2;
/// Free-form CSS lives in a single cell, D2
const GENERIC_CSS_CELL: (usize, usize) = (2, 4);

/// Raw cell grid of one worksheet, row-major. Row 1 is the header row.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Worksheet {
    rows: Vec<Vec<Option<String>>>,
}

impl Worksheet {
    pub fn new(rows: Vec<Vec<Option<String>>>) -> Self {
        Self { rows }
    }

    pub fn from_strings<R, C>(rows: R) -> Self
    where
        R: IntoIterator<Item = C>,
        C: IntoIterator,
        C::Item: Into<String>,
    {
        Self::new(
            rows.into_iter()
                .map(|row| row.into_iter().map(|cell| Some(cell.into())).collect())
                .collect(),
        )
    }

    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    /// Trimmed content of a cell addressed 1-based; blank cells read as `None`.
    pub fn cell(&self, row: usize, column: usize) -> Option<String> {
        if row == 0 || column == 0 {
            return None;
        }
        self.rows
            .get(row - 1)
            .and_then(|cells| cells.get(column - 1))
            .and_then(|cell| cell.as_deref())
            .map(str::trim)
            .filter(|content| !content.is_empty())
            .map(str::to_string)
    }

    /// Row numbers of the data rows, header excluded
    fn data_rows(&self) -> std::ops::RangeInclusive<usize> {
        2..=self.rows.len()
    }
}

/// Fetches raw worksheets by title. `Ok(None)` means the worksheet does not exist.
#[async_trait]
pub trait WorksheetReader: Send + Sync {
    async fn read_worksheet(
        &self,
        credential: &Credential,
        spreadsheet_id: &str,
        title: &str,
    ) -> SourceResult<Option<Worksheet>>;
}

/// Maps raw worksheets onto typed rows.
pub struct GridSpreadsheetSource<R> {
    reader: R,
    categories_title: String,
    nodes_title: String,
    styles_title: String,
}

impl<R: WorksheetReader> GridSpreadsheetSource<R> {
    pub fn new(reader: R, config: &IngestionConfig) -> Self {
        Self {
            reader,
            categories_title: config.categories_worksheet.clone(),
            nodes_title: config.nodes_worksheet.clone(),
            styles_title: config.styles_worksheet.clone(),
        }
    }
}

pub fn category_rows(sheet: &Worksheet) -> Vec<CategoryRow> {
    sheet
        .data_rows()
        .map(|row| CategoryRow {
            name: sheet.cell(row, CATEGORY_NAME_COL),
            node_style: sheet.cell(row, CATEGORY_NODE_STYLE_COL),
            label_style: sheet.cell(row, CATEGORY_LABEL_STYLE_COL),
        })
        .filter(|row| *row != CategoryRow::default())
        .collect()
}

pub fn node_rows(sheet: &Worksheet) -> Vec<NodeRow> {
    sheet
        .data_rows()
        .map(|row| NodeRow {
            name: sheet.cell(row, NODE_NAME_COL),
            categories: sheet.cell(row, NODE_CATEGORIES_COL),
            importance: sheet.cell(row, NODE_IMPORTANCE_COL),
            short_description: sheet.cell(row, NODE_SHORT_DESCRIPTION_COL),
            long_description: sheet.cell(row, NODE_LONG_DESCRIPTION_COL),
            context_url: sheet.cell(row, NODE_CONTEXT_URL_COL),
            credit: sheet.cell(row, NODE_CREDIT_COL),
            node_style: sheet.cell(row, NODE_NODE_STYLE_COL),
            label_style: sheet.cell(row, NODE_LABEL_STYLE_COL),
        })
        .filter(|row| *row != NodeRow::default())
        .collect()
}

/// Class rows of the styles worksheet. A row with an empty class cell adds its
/// declaration to the class opened above it.
pub fn simple_css(sheet: &Worksheet) -> SimpleCss {
    let mut styles = SimpleCss::new();
    let mut current: Option<String> = None;

    for row in sheet.data_rows() {
        if let Some(class) = sheet.cell(row, STYLE_CLASS_COL) {
            let class = class.trim_start_matches('.').to_string();
            styles.entry(class.clone()).or_default();
            current = Some(class);
        }
        if let (Some(class), Some(declaration)) =
            (current.as_ref(), sheet.cell(row, STYLE_DECLARATION_COL))
        {
            styles.entry(class.clone()).or_default().push(declaration);
        }
    }

    styles
}

pub fn generic_css(sheet: &Worksheet) -> String {
    let (row, column) = GENERIC_CSS_CELL;
    sheet.cell(row, column).unwrap_or_default()
}

#[async_trait]
impl<R: WorksheetReader> SpreadsheetSource for GridSpreadsheetSource<R> {
    async fn get_categories(
        &self,
        credential: &Credential,
        spreadsheet_id: &str,
    ) -> SourceResult<Vec<CategoryRow>> {
        let sheet = self
            .reader
            .read_worksheet(credential, spreadsheet_id, &self.categories_title)
            .await?;
        Ok(sheet.as_ref().map(category_rows).unwrap_or_default())
    }

    async fn get_nodes(
        &self,
        credential: &Credential,
        spreadsheet_id: &str,
    ) -> SourceResult<Vec<NodeRow>> {
        let sheet = self
            .reader
            .read_worksheet(credential, spreadsheet_id, &self.nodes_title)
            .await?;
        Ok(sheet.as_ref().map(node_rows).unwrap_or_default())
    }

    async fn get_simple_css(
        &self,
        credential: &Credential,
        spreadsheet_id: &str,
    ) -> SourceResult<SimpleCss> {
        let sheet = self
            .reader
            .read_worksheet(credential, spreadsheet_id, &self.styles_title)
            .await?;
        Ok(sheet.as_ref().map(simple_css).unwrap_or_default())
    }

    async fn get_generic_css(
        &self,
        credential: &Credential,
        spreadsheet_id: &str,
    ) -> SourceResult<String> {
        let sheet = self
            .reader
            .read_worksheet(credential, spreadsheet_id, &self.styles_title)
            .await?;
        Ok(sheet.as_ref().map(generic_css).unwrap_or_default())
    }
}
