//! Ordered sequence of hydrated models

use std::ops::Index;

use crate::error::OrmResult;
use crate::model::Model;
use crate::row::Row;
use crate::value::Value;

/// Models built from a multi-row result, in row order
#[derive(Debug, Clone, PartialEq)]
pub struct Collection<M> {
    items: Vec<M>,
}

impl<M> Default for Collection<M> {
    fn default() -> Self {
        Self { items: Vec::new() }
    }
}

impl<M: Model> Collection<M> {
    /// Hydrate one fresh instance per row
    pub fn from_rows(rows: &[Row]) -> OrmResult<Self> {
        let items = rows.iter().map(M::hydrate).collect::<OrmResult<Vec<_>>>()?;
        tracing::debug!(model = M::NAME, count = items.len(), "hydrated collection");
        Ok(Self { items })
    }

    /// One column's value from every item
    pub fn pluck(&self, column: &str) -> Vec<Value> {
        self.items
            .iter()
            .filter_map(|item| item.get_attribute(column))
            .collect()
    }

    /// Primary keys of every item that has one
    pub fn keys(&self) -> Vec<Value> {
        self.items.iter().filter_map(M::primary_key).collect()
    }
}

impl<M> Collection<M> {
    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, M> {
        self.items.iter()
    }

    pub fn get(&self, index: usize) -> Option<&M> {
        self.items.get(index)
    }

    pub fn first(&self) -> Option<&M> {
        self.items.first()
    }

    pub fn last(&self) -> Option<&M> {
        self.items.last()
    }

    pub fn into_vec(self) -> Vec<M> {
        self.items
    }
}

impl<M> From<Vec<M>> for Collection<M> {
    fn from(items: Vec<M>) -> Self {
        Self { items }
    }
}

impl<M> FromIterator<M> for Collection<M> {
    fn from_iter<I: IntoIterator<Item = M>>(iter: I) -> Self {
        Self {
            items: iter.into_iter().collect(),
        }
    }
}

impl<M> IntoIterator for Collection<M> {
    type Item = M;
    type IntoIter = std::vec::IntoIter<M>;

    fn into_iter(self) -> Self::IntoIter {
        self.items.into_iter()
    }
}

impl<'a, M> IntoIterator for &'a Collection<M> {
    type Item = &'a M;
    type IntoIter = std::slice::Iter<'a, M>;

    fn into_iter(self) -> Self::IntoIter {
        self.items.iter()
    }
}

impl<M> Index<usize> for Collection<M> {
    type Output = M;

    fn index(&self, index: usize) -> &M {
        &self.items[index]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    crate::model! {
        struct Tag {
            id: i64,
            name: String,
        }
    }

    #[test]
    fn test_extra_columns_are_ignored() {
        let rows = vec![
            Row::new().with("id", 1).with("name", "rust").with("post_id", 9),
            Row::new().with("id", 2).with("name", "sql"),
        ];

        let tags: Collection<Tag> = Collection::from_rows(&rows).unwrap();

        assert_eq!(tags.len(), 2);
        assert_eq!(tags[0].name, "rust");
        assert_eq!(tags.pluck("name"), vec![Value::from("rust"), Value::from("sql")]);
        assert_eq!(tags.keys(), vec![Value::Int(1), Value::Int(2)]);
        assert!(!tags[1].record().is_loaded());
    }

    #[test]
    fn test_bad_value_fails_hydration() {
        let rows = vec![Row::new().with("id", "not a number")];
        assert!(Collection::<Tag>::from_rows(&rows).is_err());
    }
}
