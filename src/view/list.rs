use std::collections::HashMap;

use super::pipeline::{
    is_all_sentinel,
    matches_search,
    SortDirection,
    SortState,
    SortValue,
};

/// What a record type must expose to take part in a list view: a stable id,
/// its searchable text, its exact-match filter fields, and a sort value per
/// sortable column.
pub trait ListRow {
    type SortKey: Copy + PartialEq;

    fn id(&self) -> i64;
    fn search_fields(&self) -> Vec<&str>;
    fn filter_value(&self, field: &str) -> Option<&str>;
    fn sort_value(&self, key: Self::SortKey) -> SortValue;
}

/// Per-entity snapshot plus the list controls. The snapshot is a cache with
/// no lifecycle of its own: `set_rows` rebuilds it wholesale after a reload,
/// and the insert/replace/remove methods patch it after a successful
/// mutation. `visible` re-derives from the full snapshot every call.
pub struct ListState<T: ListRow> {
    rows: Vec<T>,
    pub search: String,
    filters: HashMap<&'static str, String>,
    pub sort: SortState<T::SortKey>,
}

impl<T: ListRow> ListState<T> {
    pub fn new() -> Self {
        Self {
            rows: Vec::new(),
            search: String::new(),
            filters: HashMap::new(),
            sort: SortState::default(),
        }
    }

    pub fn set_rows(&mut self, rows: Vec<T>) {
        self.rows = rows;
    }

    pub fn rows(&self) -> &[T] {
        &self.rows
    }

    pub fn set_search(&mut self, term: impl Into<String>) {
        self.search = term.into();
    }

    pub fn set_filter(&mut self, field: &'static str, value: impl Into<String>) {
        self.filters.insert(field, value.into());
    }

    pub fn filter(&self, field: &str) -> Option<&str> {
        self.filters.get(field).map(String::as_str)
    }

    /// The filtered, sorted view of the snapshot.
    pub fn visible(&self) -> Vec<&T> {
        let mut picked: Vec<&T> = self
            .rows
            .iter()
            .filter(|row| matches_search(&self.search, &row.search_fields()))
            .filter(|row| {
                self.filters.iter().all(|(field, value)| {
                    is_all_sentinel(value)
                        || row.filter_value(field).map_or(false, |held| held == value)
                })
            })
            .collect();

        if let Some(key) = self.sort.key {
            picked.sort_by(|left, right| {
                let ordering = left.sort_value(key).compare(&right.sort_value(key));
                match self.sort.direction {
                    SortDirection::Ascending => ordering,
                    SortDirection::Descending => ordering.reverse(),
                }
            });
        }

        picked
    }

    pub fn insert(&mut self, row: T) {
        self.rows.push(row);
    }

    /// Swap in the updated row returned by the store. Returns false when the
    /// id is no longer in the snapshot.
    pub fn replace(&mut self, row: T) -> bool {
        match self.rows.iter().position(|held| held.id() == row.id()) {
            Some(index) => {
                self.rows[index] = row;
                true
            }
            None => false,
        }
    }

    pub fn remove(&mut self, id: i64) -> bool {
        let before = self.rows.len();
        self.rows.retain(|row| row.id() != id);
        self.rows.len() != before
    }
}

impl<T: ListRow> Default for ListState<T> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::view::pipeline::SortDirection;

    #[derive(Debug, Clone, PartialEq)]
    struct Row {
        id: i64,
        name: String,
        status: String,
        amount: Option<f64>,
    }

    impl Row {
        fn new(id: i64, name: &str, status: &str, amount: Option<f64>) -> Self {
            Self { id, name: name.to_string(), status: status.to_string(), amount }
        }
    }

    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    enum RowKey {
        Name,
        Amount,
    }

    impl ListRow for Row {
        type SortKey = RowKey;

        fn id(&self) -> i64 {
            self.id
        }

        fn search_fields(&self) -> Vec<&str> {
            vec![&self.name]
        }

        fn filter_value(&self, field: &str) -> Option<&str> {
            match field {
                "status" => Some(&self.status),
                _ => None,
            }
        }

        fn sort_value(&self, key: RowKey) -> SortValue {
            match key {
                RowKey::Name => SortValue::text(&self.name),
                RowKey::Amount => SortValue::number(self.amount),
            }
        }
    }

    fn sample() -> ListState<Row> {
        let mut state = ListState::new();
        state.set_rows(vec![
            Row::new(1, "Acme Corp", "Open", Some(1500.0)),
            Row::new(2, "Globex", "Completed", Some(20.0)),
            Row::new(3, "Initech", "Open", None),
        ]);
        state
    }

    #[test]
    fn all_sentinel_is_the_identity_filter() {
        let mut state = sample();
        state.set_filter("status", "all");
        assert_eq!(state.visible().len(), 3);

        state.set_filter("status", "All");
        assert_eq!(state.visible().len(), 3);
    }

    #[test]
    fn exact_filter_keeps_matching_rows_only() {
        let mut state = sample();
        state.set_filter("status", "Open");
        let visible = state.visible();
        assert_eq!(visible.len(), 2);
        assert!(visible.iter().all(|row| row.status == "Open"));
    }

    #[test]
    fn search_and_filter_compose() {
        let mut state = sample();
        state.set_search("acme");
        state.set_filter("status", "Open");
        let visible = state.visible();
        assert_eq!(visible.len(), 1);
        assert_eq!(visible[0].id, 1);

        state.set_filter("status", "Completed");
        assert!(state.visible().is_empty());
    }

    #[test]
    fn search_casing_yields_identical_result_sets() {
        let mut state = sample();
        state.set_search("ACME");
        let upper: Vec<i64> = state.visible().iter().map(|row| row.id).collect();
        state.set_search("acme");
        let lower: Vec<i64> = state.visible().iter().map(|row| row.id).collect();
        assert_eq!(upper, lower);
        assert_eq!(upper, vec![1]);
    }

    #[test]
    fn numeric_sort_reverses_with_direction() {
        let mut state = sample();
        state.sort = SortState::new(Some(RowKey::Amount), SortDirection::Descending);
        let descending: Vec<i64> = state.visible().iter().map(|row| row.id).collect();
        assert_eq!(descending, vec![1, 2, 3]); // absent amount sorts as 0

        state.sort.direction = state.sort.direction.reversed();
        let ascending: Vec<i64> = state.visible().iter().map(|row| row.id).collect();
        let mut reversed = descending.clone();
        reversed.reverse();
        assert_eq!(ascending, reversed);
    }

    #[test]
    fn reconciliation_patches_the_snapshot() {
        let mut state = sample();

        state.insert(Row::new(4, "Umbrella", "Open", Some(75.0)));
        assert_eq!(state.rows().len(), 4);

        let mut updated = Row::new(2, "Globex", "Open", Some(20.0));
        assert!(state.replace(updated.clone()));
        assert_eq!(state.rows()[1].status, "Open");

        updated.id = 99;
        assert!(!state.replace(updated));

        assert!(state.remove(1));
        assert!(!state.remove(1));
        assert_eq!(state.rows().len(), 3);
    }
}
