//! An in-memory table of records, keyed by a caller-supplied function
//!
//! Rows go through their column specs on the way in: values are looked up by position or
//! name, required columns are enforced, defaults fill gaps and each column's processor gets
//! the final say. Records are kept in key order.

use crate::errors::{CsvError, Result};
use crate::loader::{Loader, Row};
use itertools::Itertools;
use std::collections::btree_map::Entry;
use std::collections::{BTreeMap, HashMap};
use std::fmt;

/// A checked row, by column name
pub type Record = BTreeMap<String, String>;

type Process = Box<dyn Fn(Option<String>) -> Result<Option<String>>>;
type KeyFn = Box<dyn Fn(&Record) -> String>;

#[derive(Default)]
pub struct ColumnSpec {
    position: usize,
    required: bool,
    default: Option<String>,
    process: Option<Process>,
}

impl ColumnSpec {
    /// A column read from `position` in positional rows
    pub fn at(position: usize) -> Self {
        Self {
            position,
            ..Self::default()
        }
    }

    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }

    pub fn default_value(mut self, value: impl Into<String>) -> Self {
        self.default = Some(value.into());
        self
    }

    /// Validate or coerce the value. Runs after defaulting, also on missing values.
    pub fn process(
        mut self,
        process: impl Fn(Option<String>) -> Result<Option<String>> + 'static,
    ) -> Self {
        self.process = Some(Box::new(process));
        self
    }
}

impl fmt::Debug for ColumnSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ColumnSpec")
            .field("position", &self.position)
            .field("required", &self.required)
            .field("default", &self.default)
            .field("process", &self.process.is_some())
            .finish()
    }
}

pub struct TableBuilder {
    key: KeyFn,
    columns: Vec<(String, ColumnSpec)>,
}

impl TableBuilder {
    pub fn column(mut self, name: impl Into<String>, spec: ColumnSpec) -> Self {
        self.columns.push((name.into(), spec));
        self
    }

    pub fn build(self) -> Result<Table> {
        let duplicates = self.columns.iter().map(|(name, _)| name).duplicates().join(", ");
        if !duplicates.is_empty() {
            return Err(CsvError::InvalidConfig(format!(
                "columns defined more than once: {duplicates}"
            )));
        }
        Ok(Table {
            key: self.key,
            columns: self.columns,
            data: BTreeMap::new(),
        })
    }
}

pub struct Table {
    key: KeyFn,
    columns: Vec<(String, ColumnSpec)>,
    data: BTreeMap<String, Record>,
}

impl Table {
    pub fn builder(key: impl Fn(&Record) -> String + 'static) -> TableBuilder {
        TableBuilder {
            key: Box::new(key),
            columns: Vec::new(),
        }
    }

    fn check_row(&self, row: &Row) -> Result<Record> {
        let mut record = Record::new();
        for (name, spec) in &self.columns {
            let mut value = row.get(name, spec.position).map(str::to_string);
            if value.is_none() {
                if spec.required {
                    return Err(CsvError::MalformedRow(format!(
                        "Missing required column \"{name}\""
                    )));
                }
                value = spec.default.clone();
            }
            if let Some(process) = &spec.process {
                value = process(value)?;
            }
            if let Some(value) = value {
                record.insert(name.clone(), value);
            }
        }
        Ok(record)
    }

    fn insert(&mut self, key: String, record: Record) -> Result<&Record> {
        match self.data.entry(key) {
            Entry::Occupied(entry) => Err(CsvError::DuplicateKey(entry.key().clone())),
            Entry::Vacant(entry) => Ok(&*entry.insert(record)),
        }
    }

    /// Check `row` and insert it, failing if its key is already taken
    pub fn create(&mut self, row: impl Into<Row>) -> Result<&Record> {
        let record = self.check_row(&row.into())?;
        let key = (self.key)(&record);
        self.insert(key, record)
    }

    /// Returns the keys of the created records
    pub fn create_many(&mut self, rows: impl IntoIterator<Item = Row>) -> Result<Vec<String>> {
        let mut keys = Vec::new();
        for row in rows {
            let record = self.check_row(&row)?;
            let key = (self.key)(&record);
            self.insert(key.clone(), record)?;
            keys.push(key);
        }
        Ok(keys)
    }

    pub fn read(&self, key: &str) -> Option<&Record> {
        self.data.get(key)
    }

    pub fn read_where(&self, predicate: impl Fn(&Record) -> bool) -> Vec<&Record> {
        self.data.values().filter(|record| predicate(record)).collect()
    }

    /// Column values exactly as they appear in `row`, before defaults or processing
    fn raw_record(&self, row: &Row) -> Record {
        self.columns
            .iter()
            .filter_map(|(name, spec)| {
                row.get(name, spec.position)
                    .map(|value| (name.clone(), value.to_string()))
            })
            .collect()
    }

    /// Overlay unchecked `patch` values on the record stored under `key`, then check the
    /// merged row once
    fn merge_and_check(&mut self, key: String, patch: Record) -> Result<&Record> {
        let Some(existing) = self.data.get(&key) else {
            return Err(CsvError::MissingRow(key));
        };
        let merged: HashMap<String, String> = existing.clone().into_iter().chain(patch).collect();
        let record = self.check_row(&Row::Named(merged))?;
        self.data.insert(key.clone(), record);
        Ok(&self.data[&key])
    }

    /// Merge `patch` into the record with the same key, then check the result again
    pub fn update(&mut self, patch: Record) -> Result<&Record> {
        let key = (self.key)(&patch);
        self.merge_and_check(key, patch)
    }

    pub fn update_many(&mut self, patches: impl IntoIterator<Item = Record>) -> Result<()> {
        for patch in patches {
            self.update(patch)?;
        }
        Ok(())
    }

    /// Removing a key that isn't there is not an error
    pub fn delete(&mut self, key: &str) -> Option<Record> {
        self.data.remove(key)
    }

    pub fn delete_many<K: AsRef<str>>(&mut self, keys: impl IntoIterator<Item = K>) {
        for key in keys {
            self.delete(key.as_ref());
        }
    }

    /// Update the record if its key exists, create it otherwise.
    ///
    /// The key is computed from the row's raw column values, and each column processor runs
    /// once on either path.
    pub fn upsert(&mut self, row: impl Into<Row>) -> Result<&Record> {
        let row = row.into();
        let raw = self.raw_record(&row);
        let key = (self.key)(&raw);
        if self.data.contains_key(&key) {
            self.merge_and_check(key, raw)
        } else {
            self.create(row)
        }
    }

    pub fn upsert_many(&mut self, rows: impl IntoIterator<Item = Row>) -> Result<()> {
        for row in rows {
            self.upsert(row)?;
        }
        Ok(())
    }

    /// Create (or upsert) every row the loader produces, stopping at the first failure.
    ///
    /// Rows loaded before the failure stay in the table. Returns the number of rows loaded.
    pub fn load(&mut self, loader: &dyn Loader, upsert: bool) -> Result<usize> {
        let mut count = 0;
        for (index, row) in loader.load()?.enumerate() {
            let failure = if upsert {
                self.upsert(row).err()
            } else {
                self.create(row).err()
            };
            if let Some(error) = failure {
                tracing::warn!(row = index + 1, error = %error, "failed to load row");
                return Err(CsvError::Load {
                    row: index + 1,
                    source: Box::new(error),
                });
            }
            count += 1;
        }
        tracing::info!(rows = count, total = self.data.len(), "loaded table");
        Ok(count)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Record> + '_ {
        self.data.values()
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }
}

impl fmt::Debug for Table {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Table")
            .field("columns", &self.columns.iter().map(|(name, _)| name).join(", "))
            .field("rows", &self.data.len())
            .finish()
    }
}
