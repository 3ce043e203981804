use axum::Router;
use std::sync::Arc;
use std::time::Duration;
use tower_http::services::ServeDir;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use faultbase::config::Config;
use faultbase::db;
use faultbase::models;
use faultbase::services::{
    AnswerSettings, BatchedCompletionClient, GeneratorSettings, JobRepository, JsonlFileSink,
    OpenAITransport, QuestionGenerationService, QuestionGenerator, RetryPolicy, VehicleRepository,
};
use faultbase::{AppState, handlers};

#[derive(OpenApi)]
#[openapi(
    paths(
        handlers::generation::generate_questions,
        handlers::generation::list_jobs,
        handlers::generation::get_job,
    ),
    components(
        schemas(
            models::GenerateQuestionsRequest,
            models::GenerateQuestionsResponse,
            models::ContentType,
            models::Language,
            models::GenerationJob,
            models::JobStatus,
        )
    ),
    tags(
        (name = "Question Generation", description = "Bulk question generation and job ledger"),
    )
)]
struct ApiDoc;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let _ = dotenvy::dotenv();

    // Load configuration first
    let config = Config::load()?;

    // Initialize logging
    let log_filter = tracing_subscriber::EnvFilter::new(&config.logging.level);

    let registry = tracing_subscriber::registry().with(log_filter);

    // Keep the non-blocking writer alive for the whole process
    let mut _log_guard = None;
    if let Some(log_file) = &config.logging.file {
        let log_path = std::path::Path::new(log_file);
        if let Some(parent) = log_path.parent() {
            let _ = std::fs::create_dir_all(parent);
        }

        let log_dir = log_path.parent().and_then(|p| p.to_str()).unwrap_or("logs");
        let file_name = log_path
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or("faultbase.log");
        // Remove .log extension if present (rolling appender adds date suffix)
        let file_prefix = file_name.strip_suffix(".log").unwrap_or(file_name);

        let file_appender = tracing_appender::rolling::daily(log_dir, file_prefix);
        let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);
        _log_guard = Some(guard);
        registry
            .with(tracing_subscriber::fmt::layer().with_writer(non_blocking).with_ansi(false))
            .with(tracing_subscriber::fmt::layer())
            .init();
    } else {
        registry.with(tracing_subscriber::fmt::layer()).init();
    }
    tracing::info!("Faultbase starting up");
    tracing::info!("Configuration loaded successfully");

    let pool = db::create_pool(&config.database.url).await?;
    tracing::info!("Database pool created successfully");

    // LLM plumbing
    let transport = Arc::new(OpenAITransport::from_config(&config.llm)?);
    let completion_client = Arc::new(BatchedCompletionClient::new(
        transport,
        RetryPolicy::from_config(&config.generation),
        Duration::from_secs(config.llm.timeout_secs),
    ));
    tracing::info!(
        "LLM client initialized (base: {}, question model: {}, answer model: {})",
        config.llm.api_base,
        config.llm.question_model,
        config.llm.answer_model
    );

    let vehicle_repository = Arc::new(VehicleRepository::new(pool.clone()));
    let job_repository = Arc::new(JobRepository::new(pool.clone()));
    let sink = Arc::new(JsonlFileSink::from_config(&config.storage));

    let question_generation_service = Arc::new(QuestionGenerationService::new(
        Arc::clone(&vehicle_repository),
        Arc::clone(&job_repository),
        QuestionGenerator::new(
            completion_client,
            GeneratorSettings::from_config(&config.llm, &config.generation),
        ),
        AnswerSettings::from_config(&config.llm, &config.generation),
        sink,
        config.generation.recent_window,
    ));

    let app_state = Arc::new(AppState {
        db: pool.clone(),
        question_generation_service,
        job_repository,
    });

    std::fs::create_dir_all(&config.storage.output_dir)?;
    tracing::info!("Serving batch files from {} at /files", config.storage.output_dir);

    // Build the main app router
    let app = Router::new()
        .merge(SwaggerUi::new("/api-docs").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .merge(handlers::api_routes(app_state))
        .merge(handlers::health_routes())
        .nest_service("/files", ServeDir::new(&config.storage.output_dir));

    let app = app
        .layer(tower_http::trace::TraceLayer::new_for_http())
        .layer(tower_http::cors::CorsLayer::permissive());

    let addr = format!("{}:{}", config.server.host, config.server.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;

    tracing::info!("Server listening on http://{}", addr);
    tracing::info!("API documentation available at http://{}/api-docs", addr);
    tracing::info!("Faultbase is ready to serve requests");

    axum::serve(listener, app).await?;

    Ok(())
}
