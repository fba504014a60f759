use actix_web::{web, HttpResponse, Responder};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use super::DocumentType;
use crate::{AppState, ErrorResponse};

#[derive(Debug, Deserialize, ToSchema)]
pub struct AllocationRequestBody {
    /// `false` previews the number without consuming it.
    #[serde(default = "default_increment")]
    pub increment: bool,
}

fn default_increment() -> bool {
    true
}

impl Default for AllocationRequestBody {
    fn default() -> Self {
        Self { increment: true }
    }
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CertificateNumberResponse {
    pub certificate_number: String,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ServiceReportNumberResponse {
    #[serde(rename = "serviceReportNo")]
    pub service_report_no: String,
}

/// An empty body means `{"increment": true}`.
fn parse_body(body: &[u8]) -> Result<AllocationRequestBody, String> {
    if body.iter().all(u8::is_ascii_whitespace) {
        return Ok(AllocationRequestBody::default());
    }
    serde_json::from_slice(body).map_err(|e| format!("Invalid allocation request: {}", e))
}

async fn allocate(
    state: &AppState,
    document_type: DocumentType,
    body: &[u8],
) -> Result<String, HttpResponse> {
    let request =
        parse_body(body).map_err(|e| HttpResponse::BadRequest().json(ErrorResponse::bad_request(&e)))?;

    match state.allocator.allocate(document_type, request.increment).await {
        Ok(result) => Ok(result.code),
        Err(e) => {
            log::error!("Failed to allocate {} number: {}", document_type, e);
            Err(HttpResponse::InternalServerError()
                .json(ErrorResponse::internal_error(&e.to_string())))
        }
    }
}

#[utoipa::path(
    post,
    path = "/api/certificate_report",
    tag = "Numbering",
    request_body(content = AllocationRequestBody, description = "Optional; defaults to {\"increment\": true}"),
    responses(
        (status = 200, description = "Certificate number", body = CertificateNumberResponse),
        (status = 400, description = "Malformed body", body = ErrorResponse),
        (status = 500, description = "Sequence store unavailable", body = ErrorResponse)
    )
)]
pub async fn certificate_number(state: web::Data<AppState>, body: web::Bytes) -> impl Responder {
    match allocate(&state, DocumentType::Certificate, &body).await {
        Ok(code) => HttpResponse::Ok().json(CertificateNumberResponse {
            certificate_number: code,
        }),
        Err(response) => response,
    }
}

#[utoipa::path(
    post,
    path = "/api/service_report",
    tag = "Numbering",
    request_body(content = AllocationRequestBody, description = "Optional; defaults to {\"increment\": true}"),
    responses(
        (status = 200, description = "Service report number", body = ServiceReportNumberResponse),
        (status = 400, description = "Malformed body", body = ErrorResponse),
        (status = 500, description = "Sequence store unavailable", body = ErrorResponse)
    )
)]
pub async fn service_report_number(state: web::Data<AppState>, body: web::Bytes) -> impl Responder {
    match allocate(&state, DocumentType::Service, &body).await {
        Ok(code) => HttpResponse::Ok().json(ServiceReportNumberResponse {
            service_report_no: code,
        }),
        Err(response) => response,
    }
}

pub fn config(cfg: &mut web::ServiceConfig) {
    cfg.service(web::resource("/certificate_report").route(web::post().to(certificate_number)))
        .service(web::resource("/service_report").route(web::post().to(service_report_number)));
}
