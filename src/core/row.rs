// Copyright 2025 Rowsift Contributors
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Row representations
//!
//! Two row shapes share the same compiled-predicate contract:
//!
//! - [`MapRow`]: an ordered column-name → value mapping. Column access is a
//!   keyed lookup resolved per evaluation; an absent column is missing, not
//!   NULL, and fails the lookup.
//! - Any type implementing [`Record`]: columns are named fields declared up
//!   front, resolved once at compile time to a field index.
//!
//! The VM sees both through a [`RowHandle`].

use std::sync::Arc;

use rustc_hash::FxHashMap;

use super::error::{Error, Result};
use super::types::DataType;
use super::value::Value;

/// An ordered mapping from column name to value
///
/// Insertion order is preserved. Column names are unique; inserting an
/// existing name replaces its value in place.
#[derive(Debug, Clone, Default)]
pub struct MapRow {
    entries: Vec<(String, Value)>,
    index: FxHashMap<String, usize>,
}

impl MapRow {
    /// Create an empty row
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a column, replacing any existing value for the same name
    pub fn insert(&mut self, name: impl Into<String>, value: Value) {
        let name = name.into();
        match self.index.get(&name) {
            Some(&idx) => self.entries[idx].1 = value,
            None => {
                self.index.insert(name.clone(), self.entries.len());
                self.entries.push((name, value));
            }
        }
    }

    /// Get the value for a column, or None if the column is absent
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.index.get(name).map(|&idx| &self.entries[idx].1)
    }

    /// Check whether a column exists
    pub fn contains(&self, name: &str) -> bool {
        self.index.contains_key(name)
    }

    /// Iterate over (name, value) pairs in insertion order
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.entries.iter().map(|(n, v)| (n.as_str(), v))
    }

    /// Number of columns
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Check if the row has no columns
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl<S: Into<String>> FromIterator<(S, Value)> for MapRow {
    fn from_iter<I: IntoIterator<Item = (S, Value)>>(iter: I) -> Self {
        let mut row = MapRow::new();
        for (name, value) in iter {
            row.insert(name, value);
        }
        row
    }
}

/// A statically declared record type usable as a row
///
/// Implementors declare their fields once; the compiler resolves column
/// references against `FIELDS` at build time, so an unknown column is a
/// build-time error and per-row access is an index read with no name lookup.
pub trait Record: 'static {
    /// Field names and their value kinds, in field order
    const FIELDS: &'static [(&'static str, DataType)];

    /// Read the field at the given index (indices come from `FIELDS`)
    fn field(&self, index: usize) -> Value;
}

/// Object-safe field access, implemented for every [`Record`] automatically
pub trait FieldAccess {
    /// Read the field at the given index
    fn field_value(&self, index: usize) -> Value;
}

impl<T: Record> FieldAccess for T {
    fn field_value(&self, index: usize) -> Value {
        self.field(index)
    }
}

/// How a compiled program materializes a column
///
/// The map backend stores the column name and resolves it against the row at
/// evaluation time; the typed backend stores the field index resolved at
/// compile time.
#[derive(Debug, Clone)]
pub enum ColumnSlot {
    /// Keyed lookup into a map row
    Name(Arc<str>),
    /// Field index on a declared record type
    Field(u16),
}

/// A borrowed view of a row, polymorphic over the two row shapes
#[derive(Clone, Copy)]
pub enum RowHandle<'a> {
    /// An ordered name → value mapping
    Map(&'a MapRow),
    /// A declared record type
    Typed(&'a dyn FieldAccess),
}

impl RowHandle<'_> {
    /// Read the column identified by the slot
    pub fn read(&self, slot: &ColumnSlot) -> Result<Value> {
        match (self, slot) {
            (RowHandle::Map(row), ColumnSlot::Name(name)) => row
                .get(name)
                .cloned()
                .ok_or_else(|| Error::ColumnNotFound(name.to_string())),
            (RowHandle::Typed(row), ColumnSlot::Field(index)) => {
                Ok(row.field_value(*index as usize))
            }
            (RowHandle::Map(_), ColumnSlot::Field(_)) => Err(Error::internal(
                "field slot used against a map row",
            )),
            (RowHandle::Typed(_), ColumnSlot::Name(name)) => Err(Error::internal(format!(
                "name slot '{}' used against a typed row",
                name
            ))),
        }
    }
}
