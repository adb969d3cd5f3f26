use reqwest::{Method, RequestBuilder, Url};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use std::time::Duration;

use super::DmsError;

pub type Result<T> = std::result::Result<T, DmsError>;

#[derive(Debug, Clone)]
pub struct SitesClientConfig {
    /// Logical client name, used in logs and errors.
    pub name: String,
    /// API root, e.g. `http://host/alfresco/api/-default-/public/alfresco/versions/1`.
    pub url: String,
    pub username: Option<String>,
    pub password: Option<String>,
    pub timeout_secs: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum SiteVisibility {
    Private,
    Moderated,
    Public,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Site {
    pub id: String,
    #[serde(default)]
    pub guid: Option<String>,
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    pub visibility: SiteVisibility,
    #[serde(default)]
    pub preset: Option<String>,
    #[serde(default)]
    pub role: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SiteBodyCreate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub title: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub visibility: SiteVisibility,
}

#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SiteBodyUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub visibility: Option<SiteVisibility>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SiteContainer {
    pub id: String,
    pub folder_id: String,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SiteMember {
    pub id: String,
    pub role: String,
    #[serde(default)]
    pub is_member_of_group: Option<bool>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Pagination {
    pub count: u64,
    pub has_more_items: bool,
    #[serde(default)]
    pub total_items: Option<u64>,
    pub skip_count: u64,
    pub max_items: u64,
}

/// A page of entries with the entry wrappers stripped.
#[derive(Debug, Clone)]
pub struct Paging<T> {
    pub entries: Vec<T>,
    pub pagination: Pagination,
}

#[derive(Deserialize)]
struct EntryWire<T> {
    entry: T,
}

#[derive(Deserialize)]
struct ListWire<T> {
    list: ListBodyWire<T>,
}

#[derive(Deserialize)]
struct ListBodyWire<T> {
    #[serde(default)]
    pagination: Pagination,
    entries: Vec<EntryWire<T>>,
}

impl<T> From<ListWire<T>> for Paging<T> {
    fn from(wire: ListWire<T>) -> Self {
        Paging {
            entries: wire.list.entries.into_iter().map(|e| e.entry).collect(),
            pagination: wire.list.pagination,
        }
    }
}

/// Typed client for the Alfresco `/sites` endpoints, built once at startup.
#[derive(Debug, Clone)]
pub struct SitesApiClient {
    name: String,
    base_url: Url,
    credentials: Option<(String, String)>,
    http: reqwest::Client,
}

impl SitesApiClient {
    pub fn new(config: &SitesClientConfig) -> Result<Self> {
        let base_url = Url::parse(&config.url).map_err(|e| DmsError::InvalidUrl {
            client: config.name.clone(),
            message: e.to_string(),
        })?;

        if base_url.cannot_be_a_base() {
            return Err(DmsError::InvalidUrl {
                client: config.name.clone(),
                message: format!("{} cannot be used as an API root", config.url),
            });
        }

        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|source| DmsError::Transport {
                client: config.name.clone(),
                source,
            })?;

        let credentials = match (&config.username, &config.password) {
            (Some(user), Some(password)) => Some((user.clone(), password.clone())),
            _ => None,
        };

        Ok(Self {
            name: config.name.clone(),
            base_url,
            credentials,
            http,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    fn endpoint(&self, segments: &[&str]) -> Url {
        let mut url = self.base_url.clone();
        if let Ok(mut path) = url.path_segments_mut() {
            path.pop_if_empty().extend(segments);
        }
        url
    }

    fn request(&self, method: Method, url: Url) -> RequestBuilder {
        let builder = self.http.request(method, url);
        match &self.credentials {
            Some((user, password)) => builder.basic_auth(user, Some(password)),
            None => builder,
        }
    }

    async fn execute(&self, builder: RequestBuilder) -> Result<reqwest::Response> {
        let response = builder.send().await.map_err(|source| DmsError::Transport {
            client: self.name.clone(),
            source,
        })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            tracing::warn!(client = %self.name, status = %status, "Document service request failed");
            return Err(DmsError::Status {
                client: self.name.clone(),
                status: status.as_u16(),
                body,
            });
        }

        Ok(response)
    }

    async fn json<T: DeserializeOwned>(&self, builder: RequestBuilder) -> Result<T> {
        self.execute(builder)
            .await?
            .json::<T>()
            .await
            .map_err(|source| DmsError::Transport {
                client: self.name.clone(),
                source,
            })
    }

    pub async fn list_sites(&self, skip_count: u32, max_items: u32) -> Result<Paging<Site>> {
        tracing::debug!(client = %self.name, skip_count, max_items, "Listing sites");
        let url = self.endpoint(&["sites"]);
        let request = self
            .request(Method::GET, url)
            .query(&[("skipCount", skip_count), ("maxItems", max_items)]);
        let wire: ListWire<Site> = self.json(request).await?;
        Ok(wire.into())
    }

    pub async fn get_site(&self, site_id: &str) -> Result<Site> {
        tracing::debug!(client = %self.name, site_id, "Fetching site");
        let url = self.endpoint(&["sites", site_id]);
        let wire: EntryWire<Site> = self.json(self.request(Method::GET, url)).await?;
        Ok(wire.entry)
    }

    pub async fn create_site(&self, body: &SiteBodyCreate) -> Result<Site> {
        tracing::info!(client = %self.name, title = %body.title, "Creating site");
        let url = self.endpoint(&["sites"]);
        let wire: EntryWire<Site> = self.json(self.request(Method::POST, url).json(body)).await?;
        Ok(wire.entry)
    }

    pub async fn update_site(&self, site_id: &str, body: &SiteBodyUpdate) -> Result<Site> {
        tracing::info!(client = %self.name, site_id, "Updating site");
        let url = self.endpoint(&["sites", site_id]);
        let wire: EntryWire<Site> = self.json(self.request(Method::PUT, url).json(body)).await?;
        Ok(wire.entry)
    }

    pub async fn delete_site(&self, site_id: &str, permanent: bool) -> Result<()> {
        tracing::info!(client = %self.name, site_id, permanent, "Deleting site");
        let url = self.endpoint(&["sites", site_id]);
        let request = self
            .request(Method::DELETE, url)
            .query(&[("permanent", permanent)]);
        self.execute(request).await?;
        Ok(())
    }

    pub async fn list_site_containers(&self, site_id: &str) -> Result<Paging<SiteContainer>> {
        let url = self.endpoint(&["sites", site_id, "containers"]);
        let wire: ListWire<SiteContainer> = self.json(self.request(Method::GET, url)).await?;
        Ok(wire.into())
    }

    pub async fn list_site_members(&self, site_id: &str) -> Result<Paging<SiteMember>> {
        let url = self.endpoint(&["sites", site_id, "members"]);
        let wire: ListWire<SiteMember> = self.json(self.request(Method::GET, url)).await?;
        Ok(wire.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(url: &str) -> SitesClientConfig {
        SitesClientConfig {
            name: "dmsCore".to_string(),
            url: url.to_string(),
            username: None,
            password: None,
            timeout_secs: 5,
        }
    }

    #[test]
    fn test_endpoint_appends_segments() {
        let client =
            SitesApiClient::new(&config("http://dms/alfresco/api/-default-/public/alfresco/versions/1/"))
                .unwrap();
        let url = client.endpoint(&["sites", "patient 1", "members"]);
        assert_eq!(
            url.as_str(),
            "http://dms/alfresco/api/-default-/public/alfresco/versions/1/sites/patient%201/members"
        );
    }

    #[test]
    fn test_rejects_non_base_url() {
        assert!(matches!(
            SitesApiClient::new(&config("mailto:dms@example.com")),
            Err(DmsError::InvalidUrl { .. })
        ));
        assert!(SitesApiClient::new(&config("not a url")).is_err());
    }

    #[test]
    fn test_list_wire_strips_entries() {
        let raw = serde_json::json!({
            "list": {
                "pagination": {
                    "count": 1, "hasMoreItems": false, "totalItems": 1,
                    "skipCount": 0, "maxItems": 100
                },
                "entries": [
                    { "entry": { "id": "documentLibrary", "folderId": "f-1" } }
                ]
            }
        });

        let wire: ListWire<SiteContainer> = serde_json::from_value(raw).unwrap();
        let paging: Paging<SiteContainer> = wire.into();
        assert_eq!(paging.entries[0].folder_id, "f-1");
        assert_eq!(paging.pagination.total_items, Some(1));
    }
}
