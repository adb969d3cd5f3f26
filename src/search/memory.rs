//! In-process search index used when no Elasticsearch node is configured.

use async_trait::async_trait;
use parking_lot::RwLock;
use serde_json::Value;
use std::collections::BTreeMap;

use super::SearchIndex;
use crate::error::{ApiError, Result};
use crate::models::Entity;
use crate::pagination::{page_in_memory, Page, Pageable};

#[derive(Debug)]
pub struct InMemoryIndex<E> {
    documents: RwLock<BTreeMap<i64, E>>,
}

impl<E> Default for InMemoryIndex<E> {
    fn default() -> Self {
        Self {
            documents: RwLock::new(BTreeMap::new()),
        }
    }
}

impl<E: Entity> InMemoryIndex<E> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.documents.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.documents.read().is_empty()
    }
}

/// Lowercased alphanumeric runs; queries and stored values share it so
/// punctuation never decides whether a term can match.
fn tokens(text: &str) -> impl Iterator<Item = String> + '_ {
    text.split(|c: char| !c.is_alphanumeric())
        .filter(|token| !token.is_empty())
        .map(str::to_lowercase)
}

/// Every query term must equal a token of some scalar field; `*` or a
/// blank query matches all.
fn matches(document: &Value, terms: &[String]) -> bool {
    if terms.is_empty() {
        return true;
    }

    let values: Vec<String> = match document {
        Value::Object(map) => map
            .iter()
            .filter(|(key, _)| key.as_str() != "image")
            .filter_map(|(_, value)| match value {
                Value::String(s) => Some(s.clone()),
                Value::Number(n) => Some(n.to_string()),
                Value::Bool(b) => Some(b.to_string()),
                _ => None,
            })
            .collect(),
        _ => return false,
    };

    terms
        .iter()
        .all(|term| values.iter().any(|value| tokens(value).any(|token| token == *term)))
}

fn terms(query: &str) -> Vec<String> {
    tokens(query).collect()
}

#[async_trait]
impl<E: Entity> SearchIndex<E> for InMemoryIndex<E> {
    async fn index(&self, entity: &E) -> Result<()> {
        let id = entity
            .id()
            .ok_or_else(|| ApiError::SearchIndex(format!("Cannot index unsaved {}", E::ENTITY_NAME)))?;
        self.documents.write().insert(id, entity.clone());
        Ok(())
    }

    async fn remove(&self, id: i64) -> Result<()> {
        self.documents.write().remove(&id);
        Ok(())
    }

    async fn search(&self, query: &str, pageable: &Pageable) -> Result<Page<E>> {
        let terms = terms(query);

        let hits: Vec<E> = self
            .documents
            .read()
            .values()
            .filter(|document| {
                serde_json::to_value(document)
                    .map(|value| matches(&value, &terms))
                    .unwrap_or(false)
            })
            .cloned()
            .collect();

        page_in_memory(hits, pageable)
    }

    async fn ping(&self) -> Result<()> {
        Ok(())
    }
}
