use async_trait::async_trait;
use spreadsheet_ods::xmltree::{XmlContent, XmlTag};
use spreadsheet_ods::{read_ods, write_ods, Sheet, Value, WorkBook};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

use crate::config::StoreConfig;
use crate::error::StoreError;
use crate::models::{MovieRecord, Ownership};

const TITLE_COLUMN: &str = "Title";
const YEAR_COLUMN: &str = "Year";
const OWN_COLUMN: &str = "Own";

/// Whole-file access to the movie list. There is no per-row update.
#[async_trait]
pub trait RecordStore: Send + Sync {
    async fn load_all(&self) -> Result<Vec<MovieRecord>, StoreError>;
    async fn save_all(&self, records: &[MovieRecord]) -> Result<(), StoreError>;
}

/// Movie list kept in one sheet of an OpenDocument spreadsheet.
#[derive(Debug, Clone)]
pub struct OdsRecordStore {
    path: PathBuf,
    sheet: String,
}

impl OdsRecordStore {
    pub fn new(path: impl Into<PathBuf>, sheet: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            sheet: sheet.into(),
        }
    }

    pub fn from_config(config: &StoreConfig) -> Self {
        Self::new(config.path.clone(), config.sheet.clone())
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn load_blocking(&self) -> Result<Vec<MovieRecord>, StoreError> {
        if !self.path.exists() {
            return Err(StoreError::Missing(self.path.clone()));
        }
        let book = read_ods(&self.path).map_err(|e| StoreError::Read(e.to_string()))?;
        let idx = sheet_index(&book, &self.sheet)
            .ok_or_else(|| StoreError::Schema(format!("no sheet named '{}'", self.sheet)))?;
        let records = parse_sheet(book.sheet(idx))?;
        debug!("Loaded {} movies from {}", records.len(), self.path.display());
        Ok(records)
    }

    fn save_blocking(&self, records: &[MovieRecord]) -> Result<(), StoreError> {
        // Other sheets, extra columns and cell styles are carried over untouched.
        let mut book = if self.path.exists() {
            read_ods(&self.path).map_err(|e| StoreError::Read(e.to_string()))?
        } else {
            WorkBook::new_empty()
        };
        match sheet_index(&book, &self.sheet) {
            Some(idx) => {
                let sheet = book.sheet_mut(idx);
                match SheetLayout::locate(sheet) {
                    Ok(layout) => layout.apply(sheet, records),
                    Err(e) => {
                        debug!("Rebuilding sheet '{}': {}", self.sheet, e);
                        *sheet = build_sheet(&self.sheet, records);
                    }
                }
            }
            None => {
                book.push_sheet(build_sheet(&self.sheet, records));
            }
        }

        let tmp = temp_path(&self.path);
        write_ods(&mut book, &tmp).map_err(|e| StoreError::Write(e.to_string()))?;
        fs::rename(&tmp, &self.path).map_err(|e| {
            let _ = fs::remove_file(&tmp);
            StoreError::Write(format!("replacing {}: {}", self.path.display(), e))
        })?;
        info!("Saved {} movies to {}", records.len(), self.path.display());
        Ok(())
    }
}

/// Where the movie list lives inside a sheet: the three key columns and the
/// sheet row of every data record, in list order.
struct SheetLayout {
    title_col: u32,
    year_col: u32,
    own_col: u32,
    rows: Vec<u32>,
}

impl SheetLayout {
    fn locate(sheet: &Sheet) -> Result<Self, StoreError> {
        let (rows, cols) = sheet.used_grid_size();
        let header: Vec<String> = (0..cols)
            .map(|c| cell_text(sheet.value(0, c)).trim().to_string())
            .collect();
        let column = |name: &str| {
            header
                .iter()
                .position(|h| h == name)
                .map(|c| c as u32)
                .ok_or_else(|| StoreError::Schema(format!("missing column '{name}'")))
        };
        let title_col = column(TITLE_COLUMN)?;
        let year_col = column(YEAR_COLUMN)?;
        let own_col = column(OWN_COLUMN)?;

        let rows = (1..rows)
            .filter(|&row| {
                !cell_text(sheet.value(row, title_col)).trim().is_empty()
                    || !cell_text(sheet.value(row, year_col)).trim().is_empty()
            })
            .collect();
        Ok(Self {
            title_col,
            year_col,
            own_col,
            rows,
        })
    }

    /// Writes `records` over the located rows, touching only cells whose
    /// value actually differs. Surplus records go below the last used row;
    /// surplus rows have their key cells cleared.
    fn apply(&self, sheet: &mut Sheet, records: &[MovieRecord]) {
        let mut next_free = sheet.used_grid_size().0.max(1);
        for (i, record) in records.iter().enumerate() {
            let row = match self.rows.get(i) {
                Some(&row) => row,
                None => {
                    next_free += 1;
                    next_free - 1
                }
            };
            if cell_text(sheet.value(row, self.title_col)) != record.title {
                sheet.set_value(row, self.title_col, Value::Text(record.title.clone()));
            }
            if cell_year(sheet.value(row, self.year_col)) != Some(record.year) {
                sheet.set_value(row, self.year_col, Value::Number(f64::from(record.year)));
            }
            if Ownership::from_cell(&cell_text(sheet.value(row, self.own_col))) != record.owned {
                sheet.set_value(row, self.own_col, Value::Text(record.owned.as_cell().to_string()));
            }
        }
        for &row in self.rows.iter().skip(records.len()) {
            for col in [self.title_col, self.year_col, self.own_col] {
                sheet.set_value(row, col, Value::Empty);
            }
        }
    }
}

#[async_trait]
impl RecordStore for OdsRecordStore {
    async fn load_all(&self) -> Result<Vec<MovieRecord>, StoreError> {
        let store = self.clone();
        tokio::task::spawn_blocking(move || store.load_blocking())
            .await
            .map_err(|e| StoreError::Read(format!("load task failed: {e}")))?
    }

    async fn save_all(&self, records: &[MovieRecord]) -> Result<(), StoreError> {
        let store = self.clone();
        let records = records.to_vec();
        tokio::task::spawn_blocking(move || store.save_blocking(&records))
            .await
            .map_err(|e| StoreError::Write(format!("save task failed: {e}")))?
    }
}

fn temp_path(path: &Path) -> PathBuf {
    let mut name = path
        .file_name()
        .map(|n| n.to_os_string())
        .unwrap_or_else(|| "movies.ods".into());
    name.push(".tmp");
    path.with_file_name(name)
}

fn sheet_index(book: &WorkBook, name: &str) -> Option<usize> {
    (0..book.num_sheets()).find(|&i| book.sheet(i).name() == name)
}

/// Reads data rows below the header. Rows with neither title nor year are skipped.
pub fn parse_sheet(sheet: &Sheet) -> Result<Vec<MovieRecord>, StoreError> {
    let layout = SheetLayout::locate(sheet)?;
    layout
        .rows
        .iter()
        .map(|&row| {
            let year_cell = sheet.value(row, layout.year_col);
            let year = cell_year(year_cell).ok_or_else(|| {
                StoreError::Schema(format!(
                    "row {} has a non-numeric Year '{}'",
                    row + 1,
                    cell_text(year_cell)
                ))
            })?;
            let title = cell_text(sheet.value(row, layout.title_col));
            let owned = Ownership::from_cell(&cell_text(sheet.value(row, layout.own_col)));
            Ok(MovieRecord::new(title, year, owned))
        })
        .collect()
}

pub fn build_sheet(name: &str, records: &[MovieRecord]) -> Sheet {
    let mut sheet = Sheet::new(name);
    sheet.set_value(0, 0, Value::Text(TITLE_COLUMN.to_string()));
    sheet.set_value(0, 1, Value::Text(YEAR_COLUMN.to_string()));
    sheet.set_value(0, 2, Value::Text(OWN_COLUMN.to_string()));
    for (i, record) in records.iter().enumerate() {
        let row = i as u32 + 1;
        sheet.set_value(row, 0, Value::Text(record.title.clone()));
        sheet.set_value(row, 1, Value::Number(f64::from(record.year)));
        sheet.set_value(row, 2, Value::Text(record.owned.as_cell().to_string()));
    }
    sheet
}

fn cell_text(value: &Value) -> String {
    match value {
        Value::Text(s) => s.clone(),
        Value::TextXml(tags) => tags.iter().map(tag_text).collect::<Vec<_>>().join("\n"),
        Value::Number(n) if n.fract() == 0.0 => format!("{}", *n as i64),
        Value::Number(n) => n.to_string(),
        _ => String::new(),
    }
}

/// Plain text of a rich-text cell paragraph, spans flattened.
fn tag_text(tag: &XmlTag) -> String {
    match tag.name() {
        "text:s" => return " ".to_string(),
        "text:tab" => return "\t".to_string(),
        "text:line-break" => return "\n".to_string(),
        _ => {}
    }
    tag.content()
        .iter()
        .map(|c| match c {
            XmlContent::Text(t) => t.clone(),
            XmlContent::Tag(inner) => tag_text(inner),
        })
        .collect()
}

fn cell_year(value: &Value) -> Option<i32> {
    match value {
        Value::Number(n) if n.fract() == 0.0 => Some(*n as i32),
        Value::Text(s) => {
            let s = s.trim();
            s.parse::<i32>().ok().or_else(|| {
                s.parse::<f64>()
                    .ok()
                    .filter(|f| f.fract() == 0.0)
                    .map(|f| f as i32)
            })
        }
        _ => None,
    }
}
