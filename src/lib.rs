use actix_cors::Cors;
use actix_web::error::JsonPayloadError;
use actix_web::middleware::{Compress, Logger};
use actix_web::{http::header, web, App, HttpRequest, HttpServer};
use actix_web_prometheus::PrometheusMetricsBuilder;
use serde::{Deserialize, Serialize};
use utoipa::{OpenApi, ToSchema};
use utoipa_swagger_ui::SwaggerUi;

pub mod config;
pub mod db;
pub mod documents;
pub mod error;
pub mod notify;
pub mod numbering;
pub mod records;
pub mod render;

pub use crate::config::AppConfig;
pub use crate::db::AppState;
pub use crate::error::{AppError, StorageError};

use crate::records::validation::{ValidationError, ValidationErrors};

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ErrorResponse {
    pub error: String,
    pub message: String,
    pub timestamp: String,
    /// Offending fields of a validation failure.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub fields: Vec<String>,
}

impl ErrorResponse {
    pub fn new(error_type: &str, message: &str) -> Self {
        Self {
            error: error_type.to_string(),
            message: message.to_string(),
            timestamp: chrono::Utc::now().to_rfc3339(),
            fields: Vec::new(),
        }
    }

    pub fn not_found(message: &str) -> Self {
        Self::new("NotFound", message)
    }

    pub fn bad_request(message: &str) -> Self {
        Self::new("BadRequest", message)
    }

    pub fn internal_error(message: &str) -> Self {
        Self::new("InternalServerError", message)
    }
}

/// Malformed JSON bodies are reported like any other validation failure.
fn json_error_handler(err: JsonPayloadError, _req: &HttpRequest) -> actix_web::Error {
    let errors = ValidationErrors::single(ValidationError::new(
        "body",
        format!("Invalid JSON body: {}", err),
    ));
    AppError::from(errors).into()
}

/// Everything under `/api`.
pub fn configure_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/api")
            .app_data(web::JsonConfig::default().error_handler(json_error_handler))
            .configure(numbering::handlers::config)
            .configure(documents::handlers::config)
            .configure(records::handlers::config),
    );
}

#[derive(OpenApi)]
#[openapi(
    paths(
        crate::numbering::handlers::certificate_number,
        crate::numbering::handlers::service_report_number,
        crate::documents::handlers::certificate_draft_number,
        crate::documents::handlers::service_draft_number,
        crate::documents::handlers::create_certificate,
        crate::documents::handlers::create_service,
        crate::documents::handlers::certificate_pdf,
        crate::documents::handlers::service_pdf,
        crate::documents::handlers::send_certificate,
        crate::documents::handlers::send_service,
        crate::documents::handlers::certificates::list,
        crate::documents::handlers::certificates::get,
        crate::documents::handlers::certificates::update,
        crate::documents::handlers::certificates::delete,
        crate::documents::handlers::services::list,
        crate::documents::handlers::services::get,
        crate::documents::handlers::services::update,
        crate::documents::handlers::services::delete,
        crate::records::handlers::companies::list,
        crate::records::handlers::companies::create,
        crate::records::handlers::companies::get,
        crate::records::handlers::companies::update,
        crate::records::handlers::companies::delete,
        crate::records::handlers::contacts::list,
        crate::records::handlers::contacts::create,
        crate::records::handlers::contacts::get,
        crate::records::handlers::contacts::update,
        crate::records::handlers::contacts::delete,
        crate::records::handlers::models::list,
        crate::records::handlers::models::create,
        crate::records::handlers::models::get,
        crate::records::handlers::models::update,
        crate::records::handlers::models::delete,
        crate::records::handlers::engineers::list,
        crate::records::handlers::engineers::create,
        crate::records::handlers::engineers::get,
        crate::records::handlers::engineers::update,
        crate::records::handlers::engineers::delete,
        crate::records::handlers::service_engineers::list,
        crate::records::handlers::service_engineers::create,
        crate::records::handlers::service_engineers::get,
        crate::records::handlers::service_engineers::update,
        crate::records::handlers::service_engineers::delete
    ),
    components(
        schemas(
            ErrorResponse,
            numbering::DocumentType,
            numbering::handlers::AllocationRequestBody,
            numbering::handlers::CertificateNumberResponse,
            numbering::handlers::ServiceReportNumberResponse,
            documents::DraftNumber,
            records::handlers::CreatedResponse,
            records::model::Company,
            records::model::CompanyFlag,
            records::model::ContactPerson,
            records::model::InstrumentModel,
            records::model::Engineer,
            records::model::ServiceEngineer,
            records::model::Certificate,
            records::model::CertificateStatus,
            records::model::Observation,
            records::model::ServiceReport,
            records::model::ServiceStatus,
            records::model::EngineerRemark,
        )
    ),
    tags(
        (name = "Numbering", description = "Certificate and service report number allocation."),
        (name = "Documents", description = "Certificate and service report submission, PDFs and dispatch."),
        (name = "Companies", description = "Customer companies."),
        (name = "Contacts", description = "Contact people; emails are unique ignoring case."),
        (name = "Instrument Models", description = "Instrument makes and models."),
        (name = "Engineers", description = "Calibration engineers."),
        (name = "Service Engineers", description = "Field service engineers.")
    ),
    servers(
        (url = "http://127.0.0.1:8080", description = "Local server")
    )
)]
pub struct ApiDoc;

pub async fn run() -> std::io::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let config = AppConfig::from_env()
        .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidInput, e.to_string()))?;
    let bind = (config.bind_address.clone(), config.port);
    let allowed_origins = config.allowed_origins.clone();

    let app_state = match AppState::new_with_config(config).await {
        Ok(state) => web::Data::new(state),
        Err(e) => {
            log::error!(
                "Failed to initialise storage. Check DATABASE_URL in .env and that the database is running. Error: {}",
                e
            );
            std::process::exit(1);
        }
    };

    let prometheus = PrometheusMetricsBuilder::new("rps_calibration_server")
        .endpoint("/metrics")
        .build()
        .map_err(|e| std::io::Error::other(e.to_string()))?;

    log::info!("Starting server at http://{}:{}", bind.0, bind.1);

    HttpServer::new(move || {
        let app_state = app_state.clone();
        let prometheus = prometheus.clone();
        let cors = allowed_origins
            .iter()
            .fold(Cors::default(), |cors, origin| cors.allowed_origin(origin))
            .allowed_methods(vec!["GET", "POST", "PUT", "DELETE", "OPTIONS"])
            .allowed_headers(vec![header::ACCEPT, header::CONTENT_TYPE])
            .expose_headers(vec![
                header::CONTENT_DISPOSITION,
                header::HeaderName::from_static("x-dispatch-status"),
            ])
            .max_age(3600);

        App::new()
            .wrap(Logger::default())
            .wrap(Compress::default())
            .wrap(prometheus)
            .wrap(cors)
            .app_data(app_state)
            .configure(configure_routes)
            .service(
                SwaggerUi::new("/swagger-ui/{_:.*}")
                    .url("/api-doc/openapi.json", ApiDoc::openapi()),
            )
    })
    .keep_alive(actix_web::http::KeepAlive::Os)
    .bind(bind)?
    .run()
    .await
}
