//! Row-level transforms on [`Dataset`].
//!
//! Every method here clones the rows it keeps and returns a new dataset with a
//! freshly inferred schema. The receiver is never modified.

use std::cmp::Ordering;

use indexmap::{IndexMap, IndexSet};

use crate::dataset::{Dataset, Row, Value, get_or_null, non_null};

impl Dataset {
    /// Keep rows for which `predicate` returns true, preserving order.
    pub fn filter_rows<F>(&self, mut predicate: F) -> Dataset
    where
        F: FnMut(&Row) -> bool,
    {
        let rows = self.rows.iter().filter(|row| predicate(row)).cloned().collect();
        self.derive(rows)
    }

    /// Sort rows by `column`.
    ///
    /// Rows where the column is absent or null always go last, whatever the
    /// direction. Values are compared with [`Value::sort_cmp`]; the sort is
    /// stable for equal keys.
    pub fn sort_by(&self, column: &str, ascending: bool) -> Dataset {
        let mut rows = self.rows.clone();
        rows.sort_by(|a, b| match (non_null(a, column), non_null(b, column)) {
            (None, None) => Ordering::Equal,
            (None, Some(_)) => Ordering::Greater,
            (Some(_), None) => Ordering::Less,
            (Some(x), Some(y)) => {
                let ord = x.sort_cmp(y);
                if ascending { ord } else { ord.reverse() }
            }
        });
        self.derive(rows)
    }

    /// Group rows by the raw value of `column`.
    ///
    /// Groups appear in first-seen order and keep row order within each group.
    /// Rows lacking the column are grouped under [`Value::Null`].
    pub fn group_by(&self, column: &str) -> IndexMap<Value, Vec<Row>> {
        let mut groups: IndexMap<Value, Vec<Row>> = IndexMap::new();
        for row in &self.rows {
            groups
                .entry(get_or_null(row, column).clone())
                .or_default()
                .push(row.clone());
        }
        groups
    }

    /// Distinct raw values of `column` in first-seen order.
    pub fn unique_values(&self, column: &str) -> Vec<Value> {
        let set: IndexSet<&Value> = self.values(column).collect();
        set.into_iter().cloned().collect()
    }

    /// Add (or overwrite) a column computed once per row.
    pub fn add_column<F>(&self, name: &str, mut compute: F) -> Dataset
    where
        F: FnMut(&Row) -> Value,
    {
        let rows = self
            .rows
            .iter()
            .map(|row| {
                let value = compute(row);
                let mut out = row.clone();
                out.insert(name.to_string(), value);
                out
            })
            .collect();
        self.derive(rows)
    }

    /// Rename a column in every row.
    ///
    /// If `new` already exists it is overwritten by the old column's value. A
    /// row without `old` loses `new` too, since the value carried over is absent.
    pub fn rename_column(&self, old: &str, new: &str) -> Dataset {
        let rows = self
            .rows
            .iter()
            .map(|row| {
                let mut out = row.clone();
                match out.shift_remove(old) {
                    Some(value) => {
                        out.insert(new.to_string(), value);
                    }
                    None => {
                        out.shift_remove(new);
                    }
                }
                out
            })
            .collect();
        self.derive(rows)
    }

    /// Drop rows that are null in any schema column.
    pub fn drop_nulls(&self) -> Dataset {
        let columns: Vec<&str> = self.column_names();
        self.drop_nulls_in(&columns)
    }

    /// Drop rows that are absent or null in any of `columns`.
    pub fn drop_nulls_in(&self, columns: &[&str]) -> Dataset {
        self.filter_rows(|row| columns.iter().all(|c| non_null(row, c).is_some()))
    }

    /// Replace absent or null cells of `column` with `value`.
    ///
    /// Falsy values such as `0`, `false` or `""` are left alone.
    pub fn fill_nulls(&self, column: &str, value: &Value) -> Dataset {
        let rows = self
            .rows
            .iter()
            .map(|row| {
                let mut out = row.clone();
                if non_null(row, column).is_none() {
                    out.insert(column.to_string(), value.clone());
                }
                out
            })
            .collect();
        self.derive(rows)
    }

    /// Random sample of up to `n` rows. Not reproducible.
    pub fn sample_rows(&self, n: usize) -> Dataset {
        let mut rows = self.rows.clone();
        fastrand::shuffle(&mut rows);
        rows.truncate(n);
        self.derive(rows)
    }

    /// Random sample of up to `n` rows, reproducible for a given `seed`.
    pub fn sample_rows_seeded(&self, n: usize, seed: u64) -> Dataset {
        let mut rows = self.rows.clone();
        fastrand::Rng::with_seed(seed).shuffle(&mut rows);
        rows.truncate(n);
        self.derive(rows)
    }

    /// The first `n` rows.
    pub fn head(&self, n: usize) -> Dataset {
        self.derive(self.rows.iter().take(n).cloned().collect())
    }

    /// Keep only `columns`, in the order given.
    pub fn select_columns(&self, columns: &[&str]) -> Dataset {
        let rows = self
            .rows
            .iter()
            .map(|row| {
                columns
                    .iter()
                    .filter_map(|&c| row.get(c).map(|v| (c.to_string(), v.clone())))
                    .collect()
            })
            .collect();
        self.derive(rows)
    }

    /// Remove `columns` from every row.
    pub fn drop_columns(&self, columns: &[&str]) -> Dataset {
        let rows = self
            .rows
            .iter()
            .map(|row| {
                row.iter()
                    .filter(|(k, _)| !columns.contains(&k.as_str()))
                    .map(|(k, v)| (k.clone(), v.clone()))
                    .collect()
            })
            .collect();
        self.derive(rows)
    }
}
