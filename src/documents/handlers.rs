use actix_web::http::header::{ContentDisposition, DispositionParam, DispositionType};
use actix_web::{web, HttpResponse};
use uuid::Uuid;

use super::{draft_number, render_and_send, render_stored, submit, Document, DraftNumber};
use crate::error::AppError;
use crate::notify::{DispatchStatus, DISPATCH_STATUS_HEADER};
use crate::numbering::DocumentType;
use crate::records::handlers::{
    delete_record, documented_record_routes, get_record, list_records, update_record,
    CreatedResponse,
};
use crate::records::model::{Certificate, ServiceReport};
use crate::render::RenderedDocument;
use crate::{AppState, ErrorResponse};

fn pdf_response(rendered: RenderedDocument, dispatch: Option<DispatchStatus>) -> HttpResponse {
    let mut response = HttpResponse::Ok();
    response
        .content_type("application/pdf")
        .insert_header(ContentDisposition {
            disposition: DispositionType::Attachment,
            parameters: vec![DispositionParam::Filename(rendered.filename)],
        });
    if let Some(status) = dispatch {
        response.insert_header((DISPATCH_STATUS_HEADER, status.as_str()));
    }
    response.body(rendered.pdf)
}

async fn create_document<T: Document>(
    state: web::Data<AppState>,
    item: web::Json<T>,
) -> Result<HttpResponse, AppError> {
    let document = submit(&state, item.into_inner()).await?;
    Ok(HttpResponse::Created().json(CreatedResponse { id: document.id() }))
}

async fn download_pdf<T: Document>(
    state: web::Data<AppState>,
    path: web::Path<Uuid>,
) -> Result<HttpResponse, AppError> {
    let (rendered, _) = render_stored::<T>(&state, path.into_inner()).await?;
    Ok(pdf_response(rendered, None))
}

async fn send_pdf<T: Document>(
    state: web::Data<AppState>,
    path: web::Path<Uuid>,
) -> Result<HttpResponse, AppError> {
    let (rendered, status) = render_and_send::<T>(&state, path.into_inner()).await?;
    Ok(pdf_response(rendered, Some(status)))
}

#[utoipa::path(
    get,
    path = "/api/certificates/draft-number",
    tag = "Documents",
    responses(
        (status = 200, description = "Next certificate number, not yet consumed", body = DraftNumber)
    )
)]
pub async fn certificate_draft_number(state: web::Data<AppState>) -> HttpResponse {
    HttpResponse::Ok().json(draft_number(&state.allocator, DocumentType::Certificate).await)
}

#[utoipa::path(
    get,
    path = "/api/services/draft-number",
    tag = "Documents",
    responses(
        (status = 200, description = "Next service report number, not yet consumed", body = DraftNumber)
    )
)]
pub async fn service_draft_number(state: web::Data<AppState>) -> HttpResponse {
    HttpResponse::Ok().json(draft_number(&state.allocator, DocumentType::Service).await)
}

#[utoipa::path(
    post,
    path = "/api/certificates",
    tag = "Documents",
    request_body = Certificate,
    responses(
        (status = 201, description = "Certificate saved; a blank number is assigned", body = CreatedResponse),
        (status = 400, description = "Validation failed", body = ErrorResponse),
        (status = 500, description = "Storage failure", body = ErrorResponse)
    )
)]
pub async fn create_certificate(
    state: web::Data<AppState>,
    item: web::Json<Certificate>,
) -> Result<HttpResponse, AppError> {
    create_document(state, item).await
}

#[utoipa::path(
    post,
    path = "/api/services",
    tag = "Documents",
    request_body = ServiceReport,
    responses(
        (status = 201, description = "Service report saved; a blank number is assigned", body = CreatedResponse),
        (status = 400, description = "Validation failed", body = ErrorResponse),
        (status = 500, description = "Storage failure", body = ErrorResponse)
    )
)]
pub async fn create_service(
    state: web::Data<AppState>,
    item: web::Json<ServiceReport>,
) -> Result<HttpResponse, AppError> {
    create_document(state, item).await
}

#[utoipa::path(
    get,
    path = "/api/certificates/{id}/pdf",
    tag = "Documents",
    params(("id" = Uuid, Path, description = "Certificate ID")),
    responses(
        (status = 200, description = "Certificate PDF", content_type = "application/pdf"),
        (status = 404, description = "Certificate not found", body = ErrorResponse),
        (status = 500, description = "Asset or render failure", body = ErrorResponse)
    )
)]
pub async fn certificate_pdf(
    state: web::Data<AppState>,
    path: web::Path<Uuid>,
) -> Result<HttpResponse, AppError> {
    download_pdf::<Certificate>(state, path).await
}

#[utoipa::path(
    get,
    path = "/api/services/{id}/pdf",
    tag = "Documents",
    params(("id" = Uuid, Path, description = "Service report ID")),
    responses(
        (status = 200, description = "Service report PDF", content_type = "application/pdf"),
        (status = 404, description = "Service report not found", body = ErrorResponse),
        (status = 500, description = "Asset or render failure", body = ErrorResponse)
    )
)]
pub async fn service_pdf(
    state: web::Data<AppState>,
    path: web::Path<Uuid>,
) -> Result<HttpResponse, AppError> {
    download_pdf::<ServiceReport>(state, path).await
}

#[utoipa::path(
    post,
    path = "/api/certificates/{id}/send",
    tag = "Documents",
    params(("id" = Uuid, Path, description = "Certificate ID")),
    responses(
        (status = 200, description = "Certificate PDF; X-Dispatch-Status is sent, failed or disabled", content_type = "application/pdf"),
        (status = 404, description = "Certificate not found", body = ErrorResponse)
    )
)]
pub async fn send_certificate(
    state: web::Data<AppState>,
    path: web::Path<Uuid>,
) -> Result<HttpResponse, AppError> {
    send_pdf::<Certificate>(state, path).await
}

#[utoipa::path(
    post,
    path = "/api/services/{id}/send",
    tag = "Documents",
    params(("id" = Uuid, Path, description = "Service report ID")),
    responses(
        (status = 200, description = "Service report PDF; X-Dispatch-Status is sent, failed or disabled", content_type = "application/pdf"),
        (status = 404, description = "Service report not found", body = ErrorResponse)
    )
)]
pub async fn send_service(
    state: web::Data<AppState>,
    path: web::Path<Uuid>,
) -> Result<HttpResponse, AppError> {
    send_pdf::<ServiceReport>(state, path).await
}

pub mod certificates {
    use super::*;

    documented_record_routes!(
        Certificate,
        tag = "Documents",
        collection = "/api/certificates",
        item = "/api/certificates/{id}"
    );
}

pub mod services {
    use super::*;

    documented_record_routes!(
        ServiceReport,
        tag = "Documents",
        collection = "/api/services",
        item = "/api/services/{id}"
    );
}

pub fn config(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::resource("/certificates")
            .route(web::get().to(certificates::list))
            .route(web::post().to(create_certificate)),
    )
    .service(
        web::resource("/certificates/draft-number")
            .route(web::get().to(certificate_draft_number)),
    )
    .service(
        web::resource("/certificates/{id}")
            .route(web::get().to(certificates::get))
            .route(web::put().to(certificates::update))
            .route(web::delete().to(certificates::delete)),
    )
    .service(web::resource("/certificates/{id}/pdf").route(web::get().to(certificate_pdf)))
    .service(web::resource("/certificates/{id}/send").route(web::post().to(send_certificate)))
    .service(
        web::resource("/services")
            .route(web::get().to(services::list))
            .route(web::post().to(create_service)),
    )
    .service(web::resource("/services/draft-number").route(web::get().to(service_draft_number)))
    .service(
        web::resource("/services/{id}")
            .route(web::get().to(services::get))
            .route(web::put().to(services::update))
            .route(web::delete().to(services::delete)),
    )
    .service(web::resource("/services/{id}/pdf").route(web::get().to(service_pdf)))
    .service(web::resource("/services/{id}/send").route(web::post().to(send_service)));
}
