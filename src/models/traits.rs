use serde::{de::DeserializeOwned, Serialize};

/// A sortable property exposed through `sort=property,dir`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SortableField {
    /// JSON property name as clients send it.
    pub property: &'static str,
    /// Backing column in the relational store.
    pub column: &'static str,
    /// Free-text field; the search index sorts on its keyword sub-field.
    pub text: bool,
}

impl SortableField {
    pub const fn plain(property: &'static str, column: &'static str) -> Self {
        Self {
            property,
            column,
            text: false,
        }
    }

    pub const fn text(property: &'static str, column: &'static str) -> Self {
        Self {
            property,
            column,
            text: true,
        }
    }
}

/// Persisted record keyed by a store-assigned identifier
pub trait Entity: Serialize + DeserializeOwned + Clone + Send + Sync + 'static {
    const ENTITY_NAME: &'static str;
    const TABLE_NAME: &'static str;
    const INDEX_NAME: &'static str;
    const SORTABLE: &'static [SortableField];

    fn id(&self) -> Option<i64>;
    fn set_id(&mut self, id: i64);

    fn sortable(property: &str) -> Option<&'static SortableField> {
        Self::SORTABLE.iter().find(|f| f.property == property)
    }
}

/// Identity-based equality: both records must be saved and carry the same id.
///
/// An unsaved record is never equal to anything, itself included.
pub fn same_identity<E: Entity>(a: &E, b: &E) -> bool {
    match (a.id(), b.id()) {
        (Some(left), Some(right)) => left == right,
        _ => false,
    }
}
