use std::collections::BTreeMap;
use std::fs::File;
use std::io::{self, Read};
use std::path::Path;

use super::{StoreError, TimeSeriesStore};

/// Series held in memory as dense vectors indexed by point.
///
/// # Examples
///
/// ```
/// use ts_mapper::timeseries::{InMemoryStore, TimeSeriesStore};
///
/// let mut store = InMemoryStore::new();
/// store.insert("ts1", vec![10.0, 11.0]).unwrap();
/// assert_eq!(store.value_at("ts1", 1).unwrap(), 11.0);
/// ```
#[derive(Debug, Clone, Default)]
pub struct InMemoryStore {
    series: BTreeMap<String, Vec<f64>>,
}

impl InMemoryStore {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a series.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::DuplicateSeries`] if the name is already taken.
    pub fn insert(&mut self, name: impl Into<String>, values: Vec<f64>) -> Result<(), StoreError> {
        let name = name.into();
        if self.series.contains_key(&name) {
            return Err(StoreError::DuplicateSeries(name));
        }
        self.series.insert(name, values);
        Ok(())
    }

    /// Loads series from CSV: one column per series, one row per point.
    ///
    /// The header row holds series names. Empty cells are read as NaN, which
    /// the mapping engine forwards unchanged.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Csv`] on malformed CSV, [`StoreError::Parse`] on
    /// non-numeric cells and [`StoreError::DuplicateSeries`] on repeated headers.
    pub fn from_csv_reader<R: Read>(reader: R) -> Result<Self, StoreError> {
        let mut rdr = csv::ReaderBuilder::new().trim(csv::Trim::All).from_reader(reader);
        let names: Vec<String> = rdr.headers()?.iter().map(str::to_string).collect();
        let mut columns: Vec<Vec<f64>> = vec![Vec::new(); names.len()];

        for (point, record) in rdr.records().enumerate() {
            let record = record?;
            for (col, raw) in record.iter().enumerate() {
                let value = if raw.is_empty() {
                    f64::NAN
                } else {
                    raw.parse::<f64>().map_err(|_| StoreError::Parse {
                        name: names[col].clone(),
                        point,
                        raw: raw.to_string(),
                    })?
                };
                columns[col].push(value);
            }
        }

        let mut store = Self::new();
        for (name, values) in names.into_iter().zip(columns) {
            store.insert(name, values)?;
        }
        Ok(store)
    }

    /// Loads series from a CSV file.
    ///
    /// # Errors
    ///
    /// See [`InMemoryStore::from_csv_reader`]; I/O failures surface as
    /// [`StoreError::Csv`].
    pub fn from_csv_path(path: &Path) -> Result<Self, StoreError> {
        let file = File::open(path).map_err(csv::Error::from)?;
        Self::from_csv_reader(io::BufReader::new(file))
    }

    /// Number of points of series `name`, if present.
    pub fn len_of(&self, name: &str) -> Option<usize> {
        self.series.get(name).map(Vec::len)
    }

    /// Iterates series names in lexical order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.series.keys().map(String::as_str)
    }

    /// Number of series.
    pub fn len(&self) -> usize {
        self.series.len()
    }

    pub fn is_empty(&self) -> bool {
        self.series.is_empty()
    }
}

impl TimeSeriesStore for InMemoryStore {
    fn value_at(&self, name: &str, point: usize) -> Result<f64, StoreError> {
        let values = self
            .series
            .get(name)
            .ok_or_else(|| StoreError::UnknownSeries(name.to_string()))?;
        values
            .get(point)
            .copied()
            .ok_or_else(|| StoreError::PointOutOfRange {
                name: name.to_string(),
                point,
                len: values.len(),
            })
    }

    fn contains(&self, name: &str) -> bool {
        self.series.contains_key(name)
    }
}
