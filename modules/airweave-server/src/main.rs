//! Process entry point: wires the Restate workflow endpoint and the SSE
//! progress server side by side, the same dual-port pattern as the
//! teacher's `rootsignal-server` binary (one `tokio::select!` over both).

use std::sync::Arc;

use anyhow::{Context, Result};
use axum::extract::{Path, State};
use axum::routing::get;
use axum::Router;

use airweave_credentials::{CredentialCipher, CredentialStore, OAuthCatalog};
use airweave_destination::{DestinationAdapterRegistry, MockDestination};
use airweave_ledger::{EntityLedgerStore, SyncCursorStore};
use airweave_orchestrator::MockEmbedder;
use airweave_progress::ProgressPublisher;
use airweave_source::adapters::http_page::{HttpPageAdapter, HttpPageAdapterConfig};
use airweave_source::SourceAdapterRegistry;
use airweave_transform::{FileChunkerTransformer, TransformerRegistry};
use airweave_workflow::{RunSourceConnectionWorkflow, RunSourceConnectionWorkflowImpl, SyncRepository, WorkflowDeps};

/// Every source-config JSON payload carries these alongside its
/// adapter-specific fields, so a freshly constructed adapter knows whose
/// job it's running for (spec §3's `Provenance`).
#[derive(serde::Deserialize)]
struct HttpPageFactoryConfig {
    sync_id: uuid::Uuid,
    sync_job_id: uuid::Uuid,
    source_connection_id: uuid::Uuid,
    start_url: String,
    #[serde(default = "default_max_depth")]
    max_depth: usize,
    #[serde(default = "default_limit")]
    limit: usize,
    #[serde(default)]
    include_patterns: Vec<String>,
    #[serde(default)]
    exclude_patterns: Vec<String>,
}

fn default_max_depth() -> usize {
    3
}

fn default_limit() -> usize {
    500
}

#[tokio::main]
async fn main() -> Result<()> {
    airweave_common::init_tracing();
    tracing::info!("starting airweave-server");

    let config = airweave_common::Config::from_env();
    config.log_redacted();

    let pool = sqlx::postgres::PgPoolOptions::new()
        .max_connections(20)
        .connect(&config.database_url)
        .await
        .context("connecting to postgres")?;

    sqlx::migrate!("../airweave-ledger/migrations")
        .run(&pool)
        .await
        .context("running airweave-ledger migrations")?;
    sqlx::migrate!("../airweave-workflow/migrations")
        .run(&pool)
        .await
        .context("running airweave-workflow migrations")?;
    tracing::info!("migrations complete");

    let http_client = reqwest::Client::builder()
        .timeout(std::time::Duration::from_secs(30))
        .build()?;

    let mut source_registry = SourceAdapterRegistry::new();
    {
        let client = http_client.clone();
        source_registry.register(
            "http_page",
            Arc::new(move |_credentials, config: serde_json::Value| {
                let parsed: HttpPageFactoryConfig = serde_json::from_value(config).map_err(|e| {
                    airweave_common::AirweaveError::Config(format!("invalid http_page config: {e}"))
                })?;
                let provenance = airweave_entity::Provenance {
                    source_name: "http_page".to_string(),
                    sync_id: parsed.sync_id,
                    sync_job_id: parsed.sync_job_id,
                    source_connection_id: parsed.source_connection_id,
                };
                let adapter_config = HttpPageAdapterConfig {
                    start_url: parsed.start_url,
                    max_depth: parsed.max_depth,
                    limit: parsed.limit,
                    include_patterns: parsed.include_patterns,
                    exclude_patterns: parsed.exclude_patterns,
                };
                Ok(Arc::new(HttpPageAdapter::new(client.clone(), adapter_config, provenance))
                    as Arc<dyn airweave_source::SourceAdapter>)
            }),
        );
    }
    let source_registry = Arc::new(source_registry);

    let mut destination_registry = DestinationAdapterRegistry::new();
    destination_registry.register(
        "mock",
        Arc::new(|_connection_id, _config| {
            Ok(Arc::new(MockDestination::new()) as Arc<dyn airweave_destination::DestinationAdapter>)
        }),
    );
    let destination_registry = Arc::new(destination_registry);

    // The entity field chunker is invoked directly by the finalizer, never
    // routed as a DAG node (see DESIGN.md's open-question resolution on
    // type-preserving transformers), so only type-changing transformers are
    // registered here.
    let mut transformers = TransformerRegistry::new();
    transformers.register(Arc::new(FileChunkerTransformer::default()));
    let transformers = Arc::new(transformers);

    let cipher = CredentialCipher::new(&config.credential_encryption_key)
        .context("constructing credential cipher")?;
    let catalog = OAuthCatalog::load(&config.oauth_catalog_path).unwrap_or_else(|e| {
        tracing::warn!(error = %e, path = %config.oauth_catalog_path, "no oauth catalog loaded, starting with an empty one");
        OAuthCatalog::default()
    });
    let credentials = Arc::new(CredentialStore::new(pool.clone(), cipher, catalog));

    let ledger = Arc::new(EntityLedgerStore::new(pool.clone()));
    let cursor_store = Arc::new(SyncCursorStore::new(pool.clone()));
    let progress = Arc::new(ProgressPublisher::new(&config.redis_url).context("constructing progress publisher")?);
    let embedder: Arc<dyn airweave_orchestrator::Embedder> = Arc::new(MockEmbedder::default());
    let repository = Arc::new(SyncRepository::new(pool.clone()));
    let config = Arc::new(config);

    let deps = Arc::new(WorkflowDeps {
        repository,
        source_registry,
        destination_registry,
        transformers,
        credentials,
        ledger,
        cursor_store,
        progress: progress.clone(),
        embedder,
        config: config.clone(),
        cancellations: Default::default(),
    });

    let restate_endpoint = restate_sdk::endpoint::Endpoint::builder()
        .bind(RunSourceConnectionWorkflowImpl::with_deps(deps.clone()).serve())
        .build();

    let axum_app = Router::new()
        .route("/sync-jobs/{id}/events", get(sync_job_events))
        .with_state(progress);

    let restate_addr = format!("0.0.0.0:{}", config.port);
    let axum_addr = format!("0.0.0.0:{}", config.port + 1);

    tracing::info!(restate = %restate_addr, axum = %axum_addr, "starting servers");

    if let Some(admin_url) = &config.restate_admin_url {
        let self_url = config
            .restate_self_url
            .clone()
            .unwrap_or_else(|| format!("http://localhost:{}", config.port));

        let client = reqwest::Client::new();
        let mut request = client
            .post(format!("{admin_url}/deployments"))
            .json(&serde_json::json!({ "uri": self_url, "force": true }));

        if let Some(token) = &config.restate_auth_token {
            request = request.bearer_auth(token);
        }

        match request.send().await {
            Ok(resp) => tracing::info!(status = %resp.status(), "registered with restate admin"),
            Err(e) => tracing::warn!(error = %e, "failed to register with restate admin"),
        }
    }

    let restate_handle = tokio::spawn(async move {
        restate_sdk::http_server::HttpServer::new(restate_endpoint)
            .listen_and_serve(restate_addr.parse().unwrap())
            .await;
    });

    let axum_handle = tokio::spawn(async move {
        let listener = tokio::net::TcpListener::bind(&axum_addr).await.unwrap();
        tracing::info!("progress SSE server at http://{}", axum_addr);
        axum::serve(listener, axum_app).await.unwrap();
    });

    tokio::select! {
        _ = restate_handle => {},
        _ = axum_handle => {},
    }

    Ok(())
}

async fn sync_job_events(
    State(publisher): State<Arc<ProgressPublisher>>,
    Path(id): Path<String>,
) -> impl axum::response::IntoResponse {
    airweave_progress::sync_job_events(publisher, id).await
}
