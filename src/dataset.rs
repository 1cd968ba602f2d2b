//! Dataset loading.
//!
//! Reads the census count table into memory. The file must carry a header
//! row naming the required columns; extra columns are ignored.

use crate::error::AnalysisError;
use crate::models::Record;
use csv::{ReaderBuilder, StringRecord, Trim};
use std::collections::HashSet;
use std::io::Read;
use std::path::Path;
use tracing::{debug, info};

pub const COL_AREA: &str = "Local Areas";
pub const COL_WIDER_GROUP: &str = "Wider Ethnic Group";
pub const COL_ETHNIC_GROUP: &str = "Ethnic Group";
pub const COL_ETHNIC_GROUP_ID: &str = "Ethnic Group ID";
pub const COL_COUNT: &str = "Count";

/// In-memory table of input records.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Dataset {
    records: Vec<Record>,
}

impl Dataset {
    /// Build a dataset from records already in memory.
    pub fn from_records(records: Vec<Record>) -> Self {
        Self { records }
    }

    pub fn records(&self) -> &[Record] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Distinct area names in first-seen order.
    pub fn areas(&self) -> Vec<&str> {
        let mut seen = HashSet::new();
        self.records
            .iter()
            .map(|r| r.area.as_str())
            .filter(|area| seen.insert(*area))
            .collect()
    }

    pub fn contains_area(&self, area: &str) -> bool {
        self.records.iter().any(|r| r.area == area)
    }

    /// Records belonging to one area.
    pub fn area_records<'a>(&'a self, area: &'a str) -> impl Iterator<Item = &'a Record> + 'a {
        self.records.iter().filter(move |r| r.area == area)
    }

    /// Fail with `UnknownArea` if no record names `area`.
    pub fn require_area(&self, area: &str) -> Result<(), AnalysisError> {
        if self.contains_area(area) {
            Ok(())
        } else {
            Err(AnalysisError::UnknownArea(area.to_string()))
        }
    }
}

/// Column positions resolved from the header row.
struct ColumnIndex {
    area: usize,
    wider_group: usize,
    ethnic_group: usize,
    ethnic_group_id: usize,
    count: usize,
}

impl ColumnIndex {
    fn from_headers(headers: &StringRecord) -> Result<Self, AnalysisError> {
        let find = |name: &str| {
            headers
                .iter()
                .position(|h| h == name)
                .ok_or_else(|| AnalysisError::MissingColumn(name.to_string()))
        };

        Ok(Self {
            area: find(COL_AREA)?,
            wider_group: find(COL_WIDER_GROUP)?,
            ethnic_group: find(COL_ETHNIC_GROUP)?,
            ethnic_group_id: find(COL_ETHNIC_GROUP_ID)?,
            count: find(COL_COUNT)?,
        })
    }
}

/// Load the dataset from a CSV file.
pub fn load_dataset(path: &Path) -> Result<Dataset, AnalysisError> {
    info!("Loading dataset: {}", path.display());

    let reader = ReaderBuilder::new()
        .trim(Trim::All)
        .from_path(path)
        .map_err(|source| AnalysisError::Load {
            path: path.to_path_buf(),
            source,
        })?;

    let dataset = read_records(reader)?;

    info!(
        "Loaded {} records across {} areas",
        dataset.len(),
        dataset.areas().len()
    );
    Ok(dataset)
}

/// Parse a dataset from any reader (used for in-memory input).
pub fn parse_dataset<R: Read>(input: R) -> Result<Dataset, AnalysisError> {
    let reader = ReaderBuilder::new().trim(Trim::All).from_reader(input);
    read_records(reader)
}

fn read_records<R: Read>(mut reader: csv::Reader<R>) -> Result<Dataset, AnalysisError> {
    let headers = reader.headers()?.clone();
    let columns = ColumnIndex::from_headers(&headers)?;
    debug!("Header columns: {:?}", headers);

    // Every per-area or per-group sum is bounded by this total.
    let mut total: i64 = 0;
    let mut records = Vec::new();
    for row in reader.records() {
        let row = row?;
        let record = parse_row(&row, &columns)?;

        total = i64::try_from(record.count)
            .ok()
            .and_then(|count| total.checked_add(count))
            .ok_or_else(|| AnalysisError::InvalidRow {
                line: row.position().map(|p| p.line()).unwrap_or(0),
                column: COL_COUNT.to_string(),
                message: format!("dataset total overflows at count {}", record.count),
            })?;

        records.push(record);
    }

    Ok(Dataset::from_records(records))
}

fn parse_row(row: &StringRecord, columns: &ColumnIndex) -> Result<Record, AnalysisError> {
    let line = row.position().map(|p| p.line()).unwrap_or(0);
    let field = |index: usize| row.get(index).unwrap_or("");

    let invalid = |column: &str, message: String| AnalysisError::InvalidRow {
        line,
        column: column.to_string(),
        message,
    };

    let id_text = field(columns.ethnic_group_id);
    let ethnic_group_id = id_text
        .parse::<i64>()
        .map_err(|e| invalid(COL_ETHNIC_GROUP_ID, format!("'{}': {}", id_text, e)))?;

    let count_text = field(columns.count);
    let count = match count_text.parse::<i64>() {
        Ok(n) if n < 0 => return Err(invalid(COL_COUNT, format!("negative count {}", n))),
        Ok(n) => n as u64,
        Err(e) => return Err(invalid(COL_COUNT, format!("'{}': {}", count_text, e))),
    };

    Ok(Record {
        area: field(columns.area).to_string(),
        wider_group: field(columns.wider_group).to_string(),
        ethnic_group: field(columns.ethnic_group).to_string(),
        ethnic_group_id,
        count,
    })
}
