// storefront/src/main.rs

use storefront::config::{AppConfig, LogFormat};
use storefront::errors::AppError;
use storefront::state::AppState;
use storefront::{pipelines, seed, web};

use actix_web::{web as actix_data, App, HttpServer};
use anyhow::Context;
use shopflow::Flows;
use sqlx::postgres::PgPoolOptions;
use std::sync::Arc;
use tracing_subscriber::fmt::format::FmtSpan;
use tracing_subscriber::EnvFilter;

fn init_tracing(format: LogFormat) {
  let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
  let builder = tracing_subscriber::fmt()
    .with_env_filter(filter)
    .with_span_events(FmtSpan::CLOSE);
  match format {
    LogFormat::Json => builder.json().init(),
    LogFormat::Pretty => builder.init(),
  }
}

#[actix_web::main]
async fn main() -> anyhow::Result<()> {
  let app_config = Arc::new(AppConfig::from_env().context("Failed to load application configuration")?);
  init_tracing(app_config.log_format);

  tracing::info!("Starting storefront server...");

  let db_pool = PgPoolOptions::new()
    .max_connections(app_config.db_max_connections)
    .connect(&app_config.database_url)
    .await
    .context("Failed to connect to the database")?;
  tracing::info!("Successfully connected to the database.");

  sqlx::migrate!("./migrations")
    .run(&db_pool)
    .await
    .context("Failed to run database migrations")?;
  tracing::info!("Database migrations applied.");

  if app_config.seed_db {
    seed::seed_database(&db_pool, &app_config)
      .await
      .context("Failed to seed database")?;
  }

  tokio::fs::create_dir_all(&app_config.upload_dir)
    .await
    .with_context(|| format!("Failed to create upload directory {}", app_config.upload_dir.display()))?;

  let flows = Arc::new(Flows::<AppError>::new());
  pipelines::register_all_pipelines(&flows)?;

  let app_state = AppState {
    db_pool,
    flows,
    config: app_config.clone(),
  };

  let server_address = format!("{}:{}", app_config.server_host, app_config.server_port);
  tracing::info!("Binding server to {}...", server_address);

  HttpServer::new(move || {
    App::new()
      .app_data(actix_data::Data::new(app_state.clone()))
      .wrap(web::cors(&app_state.config))
      .wrap(tracing_actix_web::TracingLogger::default())
      .configure(web::configure_app)
  })
  .bind(&server_address)?
  .run()
  .await?;

  Ok(())
}
