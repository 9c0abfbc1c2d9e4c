mod api;
mod config;
mod database;
mod middleware;
mod models;
mod services;
mod utils;

use actix_cors::Cors;
use actix_web::{middleware::Logger, web, App, HttpServer};
use dotenv::dotenv;
use std::sync::Arc;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use crate::config::Config;
use crate::database::Database;
use crate::services::ai_service::{CompletionClient, OpenAiClient};

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    // Load environment variables
    dotenv().ok();

    // Initialize logger
    env_logger::init_from_env(env_logger::Env::new().default_filter_or("info"));
    api::health::mark_started();

    let config = match Config::from_env() {
        Ok(config) => config,
        Err(e) => {
            log::error!("❌ Invalid configuration: {}", e);
            std::process::exit(1);
        }
    };

    log::info!("🚀 Starting Career Canvas API...");
    log::info!(
        "🌍 Environment: {}{}",
        config.environment,
        if config.is_azure { " (Azure App Service)" } else { "" }
    );

    let db = match Database::connect(&config).await {
        Ok(db) => db,
        Err(e) => {
            log::error!("❌ Failed to initialize the document store: {}", e);
            std::process::exit(1);
        }
    };
    log::info!("✅ Document store ready ({})", db.backend());

    let db_data = web::Data::new(db);
    let completion_client: Arc<dyn CompletionClient> = Arc::new(OpenAiClient::from_config(&config));
    let ai_data: web::Data<dyn CompletionClient> = web::Data::from(completion_client);

    let bind_address = config.bind_address();
    log::info!("🌐 Server starting on {}", bind_address);
    log::info!("📚 Swagger UI available at: http://{}/swagger-ui/", bind_address);
    log::info!("📄 OpenAPI spec at: http://{}/api-docs/openapi.json", bind_address);

    let production = config.is_production();
    let frontend_origin = config.frontend_origin.clone();

    // Start HTTP server
    HttpServer::new(move || {
        let cors = if production {
            Cors::default().allowed_origin(&frontend_origin)
        } else {
            Cors::default()
                .allowed_origin("http://localhost:3000") // Frontend (Teams tab dev server)
                .allowed_origin("http://127.0.0.1:3000")
                .allowed_origin("https://localhost:53000") // Teams Toolkit local debug
        };
        let cors = cors
            .allowed_methods(vec!["GET", "POST", "PUT", "DELETE", "OPTIONS"])
            .allowed_headers(vec![
                actix_web::http::header::AUTHORIZATION,
                actix_web::http::header::CONTENT_TYPE,
                actix_web::http::header::ACCEPT,
            ])
            .expose_headers(vec![actix_web::http::header::CONTENT_TYPE])
            .max_age(3600);

        // Generate OpenAPI specification
        let openapi = api::swagger::ApiDoc::openapi();

        App::new()
            .app_data(db_data.clone())
            .app_data(ai_data.clone())
            .wrap(cors)
            .wrap(middleware::SecurityHeaders)
            .wrap(Logger::default())
            .service(SwaggerUi::new("/swagger-ui/{_:.*}").url("/api-docs/openapi.json", openapi))
            .configure(api::configure)
    })
    .bind(bind_address)?
    .run()
    .await
}
