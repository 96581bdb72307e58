//! Per-instance persistence state carried by every model

use crate::value::Value;

/// Pending writes and fetch bookkeeping for one model instance
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RecordState {
    pending: Vec<(String, Value)>,
    loaded: bool,
    count_rows: bool,
    row_count: Option<u64>,
}

impl RecordState {
    /// Buffer a write for the next `save`; a repeated column keeps the last value
    pub fn stage(&mut self, column: &str, value: Value) {
        match self.pending.iter_mut().find(|(existing, _)| existing == column) {
            Some(slot) => slot.1 = value,
            None => self.pending.push((column.to_string(), value)),
        }
    }

    pub fn pending(&self) -> &[(String, Value)] {
        &self.pending
    }

    pub fn has_pending(&self) -> bool {
        !self.pending.is_empty()
    }

    pub fn clear_pending(&mut self) {
        self.pending.clear();
    }

    /// Whether the instance came from a single-row fetch (or was saved)
    pub fn is_loaded(&self) -> bool {
        self.loaded
    }

    pub fn mark_loaded(&mut self) {
        self.loaded = true;
    }

    pub fn set_count_rows(&mut self, enabled: bool) {
        self.count_rows = enabled;
        if !enabled {
            self.row_count = None;
        }
    }

    pub fn counts_rows(&self) -> bool {
        self.count_rows
    }

    /// Remember an affected-row count, if counting is enabled
    pub fn record_row_count(&mut self, count: u64) {
        if self.count_rows {
            self.row_count = Some(count);
        }
    }

    pub fn row_count(&self) -> Option<u64> {
        self.row_count
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stage_replaces_column() {
        let mut state = RecordState::default();
        state.stage("email", Value::from("a@b.c"));
        state.stage("name", Value::from("Ada"));
        state.stage("email", Value::from("x@y.z"));

        assert_eq!(
            state.pending(),
            &[
                ("email".to_string(), Value::from("x@y.z")),
                ("name".to_string(), Value::from("Ada")),
            ]
        );
    }

    #[test]
    fn test_row_count_is_opt_in() {
        let mut state = RecordState::default();
        state.record_row_count(3);
        assert_eq!(state.row_count(), None);

        state.set_count_rows(true);
        state.record_row_count(3);
        assert_eq!(state.row_count(), Some(3));

        state.set_count_rows(false);
        assert_eq!(state.row_count(), None);
    }
}
