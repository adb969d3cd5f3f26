//! Elasticsearch-backed search index, one index per entity type.

use async_trait::async_trait;
use elasticsearch::auth::Credentials;
use elasticsearch::cluster::ClusterHealthParts;
use elasticsearch::http::transport::{SingleNodeConnectionPool, TransportBuilder};
use elasticsearch::{DeleteParts, Elasticsearch, IndexParts, SearchParts};
use serde_json::{json, Map, Value};
use std::marker::PhantomData;
use std::time::Duration;

use super::SearchIndex;
use crate::error::{ApiError, Result};
use crate::models::Entity;
use crate::pagination::{Page, Pageable};

#[derive(Debug, Clone)]
pub struct ElasticsearchConfig {
    pub url: String,
    /// Prepended to each entity's index name.
    pub index_prefix: String,
    pub username: Option<String>,
    pub password: Option<String>,
    pub request_timeout_secs: u64,
}

impl Default for ElasticsearchConfig {
    fn default() -> Self {
        Self {
            url: "http://localhost:9200".to_string(),
            index_prefix: String::new(),
            username: None,
            password: None,
            request_timeout_secs: 30,
        }
    }
}

impl ElasticsearchConfig {
    /// Build the shared client; the transport pools its own connections.
    pub fn connect(&self) -> Result<Elasticsearch> {
        let url: elasticsearch::http::Url = self
            .url
            .parse()
            .map_err(|e| ApiError::SearchIndex(format!("Invalid Elasticsearch URL: {}", e)))?;

        let mut builder = TransportBuilder::new(SingleNodeConnectionPool::new(url))
            .timeout(Duration::from_secs(self.request_timeout_secs));

        if let (Some(username), Some(password)) = (&self.username, &self.password) {
            builder = builder.auth(Credentials::Basic(username.clone(), password.clone()));
        }

        let transport = builder
            .build()
            .map_err(|e| ApiError::SearchIndex(format!("Failed to build transport: {}", e)))?;

        Ok(Elasticsearch::new(transport))
    }
}

pub struct ElasticsearchIndex<E> {
    client: Elasticsearch,
    index: String,
    _entity: PhantomData<fn() -> E>,
}

impl<E: Entity> ElasticsearchIndex<E> {
    pub fn new(client: Elasticsearch, index_prefix: &str) -> Self {
        Self {
            client,
            index: format!("{}{}", index_prefix, E::INDEX_NAME),
            _entity: PhantomData,
        }
    }

    pub fn index_name(&self) -> &str {
        &self.index
    }
}

/// `query_string` search with `from`/`size` paging and keyword sorts on text fields.
pub(crate) fn build_search_body<E: Entity>(query: &str, pageable: &Pageable) -> Result<Value> {
    let sort: Vec<Value> = pageable
        .resolve_sort::<E>()?
        .into_iter()
        .map(|(field, direction)| {
            let name = if field.text {
                format!("{}.keyword", field.property)
            } else {
                field.property.to_string()
            };
            let mut clause = Map::new();
            clause.insert(name, json!({ "order": direction.as_es() }));
            Value::Object(clause)
        })
        .collect();

    Ok(json!({
        "query": {
            "query_string": {
                "query": query
            }
        },
        "from": pageable.offset(),
        "size": pageable.size,
        "track_total_hits": true,
        "sort": sort
    }))
}

fn internal_error(message: String) -> ApiError {
    ApiError::SearchIndex(message)
}

#[async_trait]
impl<E: Entity> SearchIndex<E> for ElasticsearchIndex<E> {
    async fn index(&self, entity: &E) -> Result<()> {
        let id = entity
            .id()
            .ok_or_else(|| internal_error(format!("Cannot index unsaved {}", E::ENTITY_NAME)))?
            .to_string();

        let response = self
            .client
            .index(IndexParts::IndexId(&self.index, &id))
            .body(entity)
            .send()
            .await
            .map_err(|e| internal_error(format!("Failed to index document: {}", e)))?;

        let status = response.status_code();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(internal_error(format!(
                "Failed to index document (status {}): {}",
                status, body
            )));
        }

        tracing::debug!(index = %self.index, id = %id, "Indexed document");
        Ok(())
    }

    async fn remove(&self, id: i64) -> Result<()> {
        let doc_id = id.to_string();
        let response = self
            .client
            .delete(DeleteParts::IndexId(&self.index, &doc_id))
            .send()
            .await
            .map_err(|e| internal_error(format!("Failed to delete document: {}", e)))?;

        let status = response.status_code();
        if status.as_u16() == 404 {
            tracing::debug!(index = %self.index, id, "Document already absent from index");
            return Ok(());
        }
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(internal_error(format!(
                "Failed to delete document (status {}): {}",
                status, body
            )));
        }

        Ok(())
    }

    async fn search(&self, query: &str, pageable: &Pageable) -> Result<Page<E>> {
        let body = build_search_body::<E>(query, pageable)?;

        let response = self
            .client
            .search(SearchParts::Index(&[&self.index]))
            .body(body)
            .send()
            .await
            .map_err(|e| internal_error(format!("Search failed: {}", e)))?;

        if !response.status_code().is_success() {
            let body = response.text().await.unwrap_or_default();
            if body.contains("index_not_found_exception") {
                return Ok(Page::empty(pageable));
            }
            return Err(internal_error(format!("Search failed: {}", body)));
        }

        let body: Value = response
            .json()
            .await
            .map_err(|e| internal_error(format!("Failed to parse search response: {}", e)))?;

        let total = body["hits"]["total"]["value"].as_u64().unwrap_or(0);

        let content = body["hits"]["hits"]
            .as_array()
            .map(|hits| {
                hits.iter()
                    .filter_map(|hit| hit.get("_source"))
                    .map(|source| serde_json::from_value::<E>(source.clone()))
                    .collect::<std::result::Result<Vec<E>, _>>()
            })
            .transpose()
            .map_err(|e| internal_error(format!("Malformed document in {}: {}", self.index, e)))?
            .unwrap_or_default();

        Ok(Page::new(content, pageable, total))
    }

    async fn ping(&self) -> Result<()> {
        let response = self
            .client
            .cluster()
            .health(ClusterHealthParts::None)
            .send()
            .await
            .map_err(|e| internal_error(format!("Health check failed: {}", e)))?;

        if !response.status_code().is_success() {
            return Err(internal_error(format!(
                "Cluster health returned status {}",
                response.status_code()
            )));
        }

        let body: Value = response
            .json()
            .await
            .map_err(|e| internal_error(format!("Failed to parse health response: {}", e)))?;

        match body["status"].as_str() {
            Some("red") => Err(internal_error("Cluster status is red".to_string())),
            _ => Ok(()),
        }
    }
}
