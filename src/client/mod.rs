//! Client for the external document-management system (Alfresco public REST API).

pub mod sites;

pub use sites::{
    Pagination, Paging, Site, SiteBodyCreate, SiteBodyUpdate, SiteContainer, SiteMember,
    SiteVisibility, SitesApiClient, SitesClientConfig,
};

#[derive(Debug, thiserror::Error)]
pub enum DmsError {
    #[error("{client} request failed: {source}")]
    Transport {
        client: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("{client} returned status {status}: {body}")]
    Status {
        client: String,
        status: u16,
        body: String,
    },

    #[error("Invalid {client} URL: {message}")]
    InvalidUrl { client: String, message: String },
}
