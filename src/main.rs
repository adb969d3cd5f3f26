use sqlx::postgres::PgPoolOptions;
use std::sync::Arc;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use patient_service::api::{app, AppServices};
use patient_service::client::SitesApiClient;
use patient_service::config::Config;
use patient_service::models::{MedicalCase, Patient};
use patient_service::repository::{MedicalCaseRepository, PatientRepository};
use patient_service::search::{ElasticsearchIndex, InMemoryIndex, SearchIndex};
use patient_service::services::{MedicalCaseService, PatientService};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // A missing .env file is fine
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "patient_service=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Config::from_env()?;
    tracing::info!("Starting patient service on {}", config.server_addr());

    let pool = PgPoolOptions::new()
        .max_connections(config.database_max_connections)
        .connect(&config.database_url)
        .await?;
    tracing::info!("Connected to database");

    tracing::info!("Running database migrations...");
    sqlx::migrate!("./migrations").run(&pool).await?;
    tracing::info!("Migrations completed");

    let patient_store = Arc::new(PatientRepository::new(pool.clone()));
    let medical_case_store = Arc::new(MedicalCaseRepository::new(pool));

    let patient_index: Arc<dyn SearchIndex<Patient>>;
    let medical_case_index: Arc<dyn SearchIndex<MedicalCase>>;
    match config.elasticsearch() {
        Some(es_config) => {
            let client = es_config.connect()?;
            tracing::info!(url = %es_config.url, "Using Elasticsearch search index");
            patient_index = Arc::new(ElasticsearchIndex::<Patient>::new(
                client.clone(),
                &es_config.index_prefix,
            ));
            medical_case_index = Arc::new(ElasticsearchIndex::<MedicalCase>::new(
                client,
                &es_config.index_prefix,
            ));
        }
        None => {
            tracing::warn!("ELASTICSEARCH_URL not set, using the in-process search index");
            patient_index = Arc::new(InMemoryIndex::<Patient>::new());
            medical_case_index = Arc::new(InMemoryIndex::<MedicalCase>::new());
        }
    }

    let sites = Arc::new(SitesApiClient::new(&config.sites_client())?);
    tracing::info!(client = sites.name(), url = %config.dms_url, "Configured document service client");

    let mut patient_service = PatientService::new(
        patient_store.clone(),
        patient_index.clone(),
        medical_case_store.clone(),
        medical_case_index.clone(),
    );
    if config.dms_provision_sites {
        tracing::info!("Site provisioning enabled for new patients");
        patient_service = patient_service.with_site_provisioning(sites);
    }

    let services = AppServices {
        medical_cases: Arc::new(MedicalCaseService::new(medical_case_store, medical_case_index)),
        patients: Arc::new(patient_service),
        patient_store,
        patient_index,
    };

    let app = app(services, &config.application_name)
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http());

    let listener = tokio::net::TcpListener::bind(&config.server_addr()).await?;
    tracing::info!("Listening on {}", config.server_addr());

    axum::serve(listener, app).await?;

    Ok(())
}
