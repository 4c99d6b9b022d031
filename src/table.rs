//! `Table`: a case-insensitive, order-preserving multimap.
//!
//! Mirrors alloc.c's `table` type: header names are compared
//! case-insensitively (ASCII, matching `strcasecmp`), insertion order is
//! preserved, and duplicate keys are allowed unless an operation
//! specifically replaces or merges them.
//!
//! Unlike [`crate::array::Array`], `Table` owns its `String` key/value
//! pairs directly rather than sharing a pool's raw bump buffer — string
//! payloads aren't `Copy`, so they don't fit `Array<T>`'s backing-storage
//! model, and growth is whatever `Vec` already does. But a table is still
//! a pool-scoped object, exactly like `Array`: it's created from a pool
//! (`make_table(p, nelts)`), and `copy`/`overlay` take a destination pool
//! (`copy_table(p, t)`/`overlay_tables(p, top, bottom)`), the same way
//! `Array::copy_to` does.

use std::cell::RefCell;

use crate::pool::Pool;

fn keys_eq(a: &str, b: &str) -> bool {
    a.eq_ignore_ascii_case(b)
}

/// A case-insensitive, order-preserving multimap of string key/value
/// pairs, scoped to a [`Pool`].
pub struct Table {
    pool: Pool,
    entries: RefCell<Vec<(String, String)>>,
}

impl Table {
    /// Creates an empty table owned by `pool`.
    ///
    /// Mirrors alloc.c's `make_table(p, 0)`.
    pub fn new(pool: &Pool) -> Table {
        Table::with_capacity(pool, 0)
    }

    /// Creates an empty table owned by `pool`, pre-sizing its backing
    /// storage for `nelts` entries.
    ///
    /// Mirrors alloc.c's `make_table(p, nelts)`.
    pub fn with_capacity(pool: &Pool, nelts: usize) -> Table {
        Table {
            pool: pool.clone(),
            entries: RefCell::new(Vec::with_capacity(nelts)),
        }
    }

    /// The pool this table is scoped to.
    pub fn pool(&self) -> &Pool {
        &self.pool
    }

    /// Returns the first value associated with `name`, if any.
    ///
    /// Mirrors alloc.c's `table_get`.
    pub fn get(&self, name: &str) -> Option<String> {
        self.entries
            .borrow()
            .iter()
            .find(|(key, _)| keys_eq(key, name))
            .map(|(_, value)| value.clone())
    }

    /// Every value associated with `name`, in insertion order.
    pub fn get_all(&self, name: &str) -> Vec<String> {
        self.entries
            .borrow()
            .iter()
            .filter(|(key, _)| keys_eq(key, name))
            .map(|(_, value)| value.clone())
            .collect()
    }

    /// Removes every existing entry for `name`, then inserts a single new
    /// entry.
    ///
    /// Mirrors alloc.c's `table_set`.
    pub fn set(&self, name: &str, value: &str) {
        self.setn(name.to_string(), value.to_string());
    }

    /// Like [`Table::set`], taking ownership of already-allocated strings
    /// instead of copying borrowed ones.
    ///
    /// Mirrors alloc.c's `table_setn`.
    pub fn setn(&self, name: impl Into<String>, value: impl Into<String>) {
        let name = name.into();
        let mut entries = self.entries.borrow_mut();
        entries.retain(|(key, _)| !keys_eq(key, &name));
        entries.push((name, value.into()));
    }

    /// Removes every entry for `name`.
    ///
    /// Mirrors alloc.c's `table_unset`.
    pub fn unset(&self, name: &str) {
        self.entries.borrow_mut().retain(|(key, _)| !keys_eq(key, name));
    }

    /// If an entry for `name` already exists, appends `", " + value` to
    /// its first occurrence; otherwise behaves like [`Table::add`].
    ///
    /// Mirrors alloc.c's `table_merge`.
    pub fn merge(&self, name: &str, value: &str) {
        self.mergen(name, value.to_string());
    }

    /// Like [`Table::merge`], taking ownership of `value`.
    ///
    /// Mirrors alloc.c's `table_mergen`.
    pub fn mergen(&self, name: &str, value: impl Into<String>) {
        let mut entries = self.entries.borrow_mut();
        match entries.iter_mut().find(|(key, _)| keys_eq(key, name)) {
            Some((_, existing)) => {
                existing.push_str(", ");
                existing.push_str(&value.into());
            }
            None => entries.push((name.to_string(), value.into())),
        }
    }

    /// Appends a new entry for `name`, even if one already exists.
    ///
    /// Mirrors alloc.c's `table_add`.
    pub fn add(&self, name: &str, value: &str) {
        self.addn(name.to_string(), value.to_string());
    }

    /// Like [`Table::add`], taking ownership of already-allocated strings.
    ///
    /// Mirrors alloc.c's `table_addn`.
    pub fn addn(&self, name: impl Into<String>, value: impl Into<String>) {
        self.entries.borrow_mut().push((name.into(), value.into()));
    }

    /// Number of entries, counting duplicate keys separately.
    pub fn len(&self) -> usize {
        self.entries.borrow().len()
    }

    /// Whether the table holds no entries.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Removes every entry.
    pub fn clear(&self) {
        self.entries.borrow_mut().clear();
    }

    /// Returns an independent copy of this table, owned by `pool` (which
    /// may be the same pool, an ancestor/descendant, or an entirely
    /// unrelated one — moving a table's contents across pool subtrees is
    /// the whole point).
    ///
    /// Mirrors alloc.c's `copy_table(p, t)`.
    pub fn copy(&self, pool: &Pool) -> Table {
        Table {
            pool: pool.clone(),
            entries: RefCell::new(self.entries.borrow().clone()),
        }
    }

    /// Returns a new table, owned by `pool`, holding this table's entries
    /// followed by `bottom`'s, with no deduplication — a key present in
    /// both appears twice, in `self`-then-`bottom` order.
    ///
    /// Mirrors alloc.c's `overlay_tables(p, top, bottom)` (`self` plays
    /// `top`).
    pub fn overlay(&self, pool: &Pool, bottom: &Table) -> Table {
        let merged = self.copy(pool);
        merged
            .entries
            .borrow_mut()
            .extend(bottom.entries.borrow().iter().cloned());
        merged
    }

    /// Like [`Table::set`], but records that `value` is borrowed from
    /// `value_pool`'s memory rather than copied fresh for this table
    /// (matching alloc.c's `table_setn` when the caller already holds a
    /// pool-allocated string). When `track_pool_ownership` debug mode is
    /// enabled, aborts unless `value_pool` is this table's own pool or one
    /// of its ancestors — i.e. unless `value` is guaranteed to outlive the
    /// table.
    ///
    /// Mirrors alloc.c's `table_setn`.
    pub fn set_borrowed(&self, name: &str, value_pool: &Pool, value: &str) {
        self.pool.debug_assert_borrowed_from(value_pool);
        self.setn(name.to_string(), value.to_string());
    }

    /// Like [`Table::add`], with the same borrowed-value ancestry check as
    /// [`Table::set_borrowed`].
    ///
    /// Mirrors alloc.c's `table_addn`.
    pub fn add_borrowed(&self, name: &str, value_pool: &Pool, value: &str) {
        self.pool.debug_assert_borrowed_from(value_pool);
        self.addn(name.to_string(), value.to_string());
    }

    /// Visits every entry in insertion order, stopping early if `visitor`
    /// returns `false`.
    ///
    /// Mirrors alloc.c's `table_do`.
    pub fn do_visit(&self, mut visitor: impl FnMut(&str, &str) -> bool) {
        for (key, value) in self.entries.borrow().iter() {
            if !visitor(key, value) {
                break;
            }
        }
    }
}
