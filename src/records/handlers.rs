//! CRUD endpoints shared by every record kind.

use actix_web::{web, HttpResponse};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use utoipa::ToSchema;
use uuid::Uuid;

use super::model::{Company, ContactPerson, Engineer, InstrumentModel, ServiceEngineer};
use super::Record;
use crate::error::AppError;
use crate::{AppState, ErrorResponse};

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct CreatedResponse {
    pub id: Uuid,
}

pub async fn list_records<T: Record>(state: web::Data<AppState>) -> Result<HttpResponse, AppError> {
    let records = state.records.list::<T>().await?;
    Ok(HttpResponse::Ok().json(records))
}

pub async fn get_record<T: Record>(
    state: web::Data<AppState>,
    path: web::Path<Uuid>,
) -> Result<HttpResponse, AppError> {
    let record = state.records.get::<T>(path.into_inner()).await?;
    Ok(HttpResponse::Ok().json(record))
}

pub async fn create_record<T: Record>(
    state: web::Data<AppState>,
    item: web::Json<T>,
) -> Result<HttpResponse, AppError> {
    let record = state.records.create(item.into_inner()).await?;
    Ok(HttpResponse::Created().json(CreatedResponse { id: record.id() }))
}

/// Fields present in the body replace the stored ones.
pub async fn update_record<T: Record>(
    state: web::Data<AppState>,
    path: web::Path<Uuid>,
    patch: web::Json<Map<String, Value>>,
) -> Result<HttpResponse, AppError> {
    let record = state
        .records
        .update::<T>(path.into_inner(), patch.into_inner())
        .await?;
    Ok(HttpResponse::Ok().json(record))
}

pub async fn delete_record<T: Record>(
    state: web::Data<AppState>,
    path: web::Path<Uuid>,
) -> Result<HttpResponse, AppError> {
    state.records.delete::<T>(path.into_inner()).await?;
    Ok(HttpResponse::NoContent().finish())
}

/// Documented `list`, `get`, `update` and `delete` handlers for one record
/// type. The `directory` form also adds `create` and a `config` that mounts
/// all five under a path. Expects the caller's scope to import the generic
/// handlers, `CreatedResponse` and `ErrorResponse`.
macro_rules! documented_record_routes {
    (directory $ty:ident, tag = $tag:tt, collection = $collection:tt, item = $item:tt) => {
        $crate::records::handlers::documented_record_routes!(
            $ty,
            tag = $tag,
            collection = $collection,
            item = $item
        );

        #[utoipa::path(
            post,
            path = $collection,
            tag = $tag,
            request_body = $ty,
            responses(
                (status = 201, description = "Record created", body = CreatedResponse),
                (status = 400, description = "Validation failed", body = ErrorResponse)
            )
        )]
        pub async fn create(
            state: web::Data<AppState>,
            body: web::Json<$ty>,
        ) -> Result<HttpResponse, AppError> {
            create_record::<$ty>(state, body).await
        }

        /// `GET`/`POST {path}` and `GET`/`PUT`/`DELETE {path}/{id}`.
        pub fn config(cfg: &mut web::ServiceConfig, path: &str) {
            cfg.service(
                web::resource(path)
                    .route(web::get().to(list))
                    .route(web::post().to(create)),
            )
            .service(
                web::resource(format!("{}/{{id}}", path))
                    .route(web::get().to(get))
                    .route(web::put().to(update))
                    .route(web::delete().to(delete)),
            );
        }
    };
    ($ty:ident, tag = $tag:tt, collection = $collection:tt, item = $item:tt) => {
        #[utoipa::path(
            get,
            path = $collection,
            tag = $tag,
            responses(
                (status = 200, description = "All stored records", body = [$ty]),
                (status = 500, description = "Storage failure", body = ErrorResponse)
            )
        )]
        pub async fn list(state: web::Data<AppState>) -> Result<HttpResponse, AppError> {
            list_records::<$ty>(state).await
        }

        #[utoipa::path(
            get,
            path = $item,
            tag = $tag,
            params(("id" = Uuid, Path, description = "Record ID")),
            responses(
                (status = 200, description = "The stored record", body = $ty),
                (status = 404, description = "No record with this id", body = ErrorResponse)
            )
        )]
        pub async fn get(
            state: web::Data<AppState>,
            path: web::Path<Uuid>,
        ) -> Result<HttpResponse, AppError> {
            get_record::<$ty>(state, path).await
        }

        #[utoipa::path(
            put,
            path = $item,
            tag = $tag,
            params(("id" = Uuid, Path, description = "Record ID")),
            request_body(content = $ty, description = "Fields to replace; omitted fields keep their stored values"),
            responses(
                (status = 200, description = "The updated record", body = $ty),
                (status = 400, description = "Validation failed", body = ErrorResponse),
                (status = 404, description = "No record with this id", body = ErrorResponse)
            )
        )]
        pub async fn update(
            state: web::Data<AppState>,
            path: web::Path<Uuid>,
            patch: web::Json<serde_json::Map<String, serde_json::Value>>,
        ) -> Result<HttpResponse, AppError> {
            update_record::<$ty>(state, path, patch).await
        }

        #[utoipa::path(
            delete,
            path = $item,
            tag = $tag,
            params(("id" = Uuid, Path, description = "Record ID")),
            responses(
                (status = 204, description = "Record deleted"),
                (status = 404, description = "No record with this id", body = ErrorResponse)
            )
        )]
        pub async fn delete(
            state: web::Data<AppState>,
            path: web::Path<Uuid>,
        ) -> Result<HttpResponse, AppError> {
            delete_record::<$ty>(state, path).await
        }
    };
}

pub(crate) use documented_record_routes;

pub mod companies {
    use super::*;

    documented_record_routes!(
        directory Company,
        tag = "Companies",
        collection = "/api/companies",
        item = "/api/companies/{id}"
    );
}

pub mod contacts {
    use super::*;

    documented_record_routes!(
        directory ContactPerson,
        tag = "Contacts",
        collection = "/api/contacts",
        item = "/api/contacts/{id}"
    );
}

pub mod models {
    use super::*;

    documented_record_routes!(
        directory InstrumentModel,
        tag = "Instrument Models",
        collection = "/api/models",
        item = "/api/models/{id}"
    );
}

pub mod engineers {
    use super::*;

    documented_record_routes!(
        directory Engineer,
        tag = "Engineers",
        collection = "/api/engineers",
        item = "/api/engineers/{id}"
    );
}

pub mod service_engineers {
    use super::*;

    documented_record_routes!(
        directory ServiceEngineer,
        tag = "Service Engineers",
        collection = "/api/service-engineers",
        item = "/api/service-engineers/{id}"
    );
}

pub fn config(cfg: &mut web::ServiceConfig) {
    companies::config(cfg, "/companies");
    contacts::config(cfg, "/contacts");
    models::config(cfg, "/models");
    engineers::config(cfg, "/engineers");
    service_engineers::config(cfg, "/service-engineers");
}
