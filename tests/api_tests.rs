mod common;

#[cfg(test)]
mod api_tests {
    use actix_web::http::{header, StatusCode};
    use actix_web::{test, web, App};
    use serde_json::{json, Value};
    use std::sync::Arc;

    use base64::engine::general_purpose::STANDARD as BASE64;
    use base64::Engine;

    use super::common::{
        config_with_assets, sample_certificate, sample_service, start_mail_relay, unreachable_relay,
        FailingSequenceStore,
    };
    use rps_calibration_server::config::{AppConfig, MailRelayConfig};
    use rps_calibration_server::db::records::MemoryRecordBackend;
    use rps_calibration_server::db::sequence::MemorySequenceStore;
    use rps_calibration_server::notify::{self, DisabledNotifier};
    use rps_calibration_server::{configure_routes, ApiDoc, AppState, ErrorResponse};
    use utoipa::OpenApi;

    fn memory_state(config: AppConfig) -> web::Data<AppState> {
        web::Data::new(AppState::in_memory(config))
    }

    fn relay_state(dir: &std::path::Path, relay: MailRelayConfig) -> web::Data<AppState> {
        let config = AppConfig {
            mail_relay: Some(relay),
            ..config_with_assets(dir)
        };
        let notifier = notify::from_config(&config, reqwest::Client::new());
        web::Data::new(AppState::from_parts(
            config,
            Arc::new(MemorySequenceStore::new()),
            Arc::new(MemoryRecordBackend::new()),
            notifier,
        ))
    }

    fn failing_state() -> web::Data<AppState> {
        web::Data::new(AppState::from_parts(
            AppConfig::default(),
            Arc::new(FailingSequenceStore),
            Arc::new(MemoryRecordBackend::new()),
            Arc::new(DisabledNotifier),
        ))
    }

    #[actix_web::test]
    async fn test_certificate_number_commit_then_peek() {
        let app = test::init_service(
            App::new()
                .app_data(memory_state(AppConfig::default()))
                .configure(configure_routes),
        )
        .await;

        let req = test::TestRequest::post().uri("/api/certificate_report").to_request();
        let body: Value = test::call_and_read_body_json(&app, req).await;
        let committed = body["certificateNumber"].as_str().unwrap().to_string();
        assert!(committed.starts_with("RPS/CER/"));
        assert!(committed.ends_with("/0001"));

        let req = test::TestRequest::post()
            .uri("/api/certificate_report")
            .set_json(json!({ "increment": false }))
            .to_request();
        let body: Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(body["certificateNumber"], committed.as_str());

        let req = test::TestRequest::post()
            .uri("/api/certificate_report")
            .set_json(json!({ "increment": true }))
            .to_request();
        let body: Value = test::call_and_read_body_json(&app, req).await;
        assert!(body["certificateNumber"].as_str().unwrap().ends_with("/0002"));
    }

    #[actix_web::test]
    async fn test_service_number_uses_its_own_counter() {
        let app = test::init_service(
            App::new()
                .app_data(memory_state(AppConfig::default()))
                .configure(configure_routes),
        )
        .await;

        let req = test::TestRequest::post().uri("/api/certificate_report").to_request();
        let _: Value = test::call_and_read_body_json(&app, req).await;

        let req = test::TestRequest::post()
            .uri("/api/service_report")
            .set_json(json!({}))
            .to_request();
        let body: Value = test::call_and_read_body_json(&app, req).await;
        let code = body["serviceReportNo"].as_str().unwrap();
        assert!(code.starts_with("RPS/SER/"));
        assert!(code.ends_with("/0001"));
    }

    #[actix_web::test]
    async fn test_malformed_allocation_body_is_rejected() {
        let app = test::init_service(
            App::new()
                .app_data(memory_state(AppConfig::default()))
                .configure(configure_routes),
        )
        .await;

        let req = test::TestRequest::post()
            .uri("/api/service_report")
            .insert_header((header::CONTENT_TYPE, "application/json"))
            .set_payload("{\"increment\": \"maybe\"}")
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    }

    #[actix_web::test]
    async fn test_storage_failure_returns_500() {
        let app = test::init_service(App::new().app_data(failing_state()).configure(configure_routes)).await;

        let req = test::TestRequest::post().uri("/api/certificate_report").to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let body: ErrorResponse = test::read_body_json(resp).await;
        assert_eq!(body.error, "InternalServerError");
        assert!(!body.timestamp.is_empty());

        let req = test::TestRequest::get()
            .uri("/api/services/draft-number")
            .to_request();
        let body: Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(body["provisional"], true);
    }

    #[actix_web::test]
    async fn test_certificate_submit_render_and_send() {
        let dir = tempfile::tempdir().unwrap();
        let app = test::init_service(
            App::new()
                .app_data(memory_state(config_with_assets(dir.path())))
                .configure(configure_routes),
        )
        .await;

        let req = test::TestRequest::get()
            .uri("/api/certificates/draft-number")
            .to_request();
        let draft: Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(draft["provisional"], false);
        assert!(draft["code"].as_str().unwrap().ends_with("/0001"));

        let req = test::TestRequest::post()
            .uri("/api/certificates")
            .set_json(sample_certificate(3))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::CREATED);
        let created: Value = test::read_body_json(resp).await;
        let id = created["id"].as_str().unwrap().to_string();

        let req = test::TestRequest::get()
            .uri(&format!("/api/certificates/{id}"))
            .to_request();
        let stored: Value = test::call_and_read_body_json(&app, req).await;
        let number = stored["certificateNo"].as_str().unwrap();
        assert!(number.ends_with("/0001"));

        let req = test::TestRequest::get()
            .uri(&format!("/api/certificates/{id}/pdf"))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::OK);
        assert_eq!(
            resp.headers().get(header::CONTENT_TYPE).unwrap(),
            "application/pdf"
        );
        let disposition = resp
            .headers()
            .get(header::CONTENT_DISPOSITION)
            .unwrap()
            .to_str()
            .unwrap()
            .to_string();
        assert!(disposition.starts_with("attachment"));
        assert!(disposition.contains("rps_cer_"));
        let pdf = test::read_body(resp).await;
        assert!(pdf.starts_with(b"%PDF-"));

        let req = test::TestRequest::post()
            .uri(&format!("/api/certificates/{id}/send"))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::OK);
        assert_eq!(resp.headers().get("X-Dispatch-Status").unwrap(), "disabled");
    }

    #[actix_web::test]
    async fn test_missing_assets_fail_the_render() {
        let dir = tempfile::tempdir().unwrap();
        let config = AppConfig {
            assets_dir: dir.path().to_path_buf(),
            ..AppConfig::default()
        };
        let app = test::init_service(
            App::new()
                .app_data(memory_state(config))
                .configure(configure_routes),
        )
        .await;

        let req = test::TestRequest::post()
            .uri("/api/certificates")
            .set_json(sample_certificate(1))
            .to_request();
        let created: Value = test::call_and_read_body_json(&app, req).await;

        let req = test::TestRequest::get()
            .uri(&format!("/api/certificates/{}/pdf", created["id"].as_str().unwrap()))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let body: ErrorResponse = test::read_body_json(resp).await;
        assert_eq!(body.error, "AssetLoadError");
    }

    #[actix_web::test]
    async fn test_invalid_certificate_reports_fields() {
        let app = test::init_service(
            App::new()
                .app_data(memory_state(AppConfig::default()))
                .configure(configure_routes),
        )
        .await;

        let mut certificate = sample_certificate(0);
        certificate.customer_name.clear();
        let req = test::TestRequest::post()
            .uri("/api/certificates")
            .set_json(certificate)
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
        let body: ErrorResponse = test::read_body_json(resp).await;
        assert_eq!(body.error, "ValidationError");
        assert!(body.fields.contains(&"customerName".to_string()));
        assert!(body.fields.contains(&"observations".to_string()));

        // Nothing was consumed by the rejected submission.
        let req = test::TestRequest::post()
            .uri("/api/certificate_report")
            .set_json(json!({ "increment": false }))
            .to_request();
        let body: Value = test::call_and_read_body_json(&app, req).await;
        assert!(body["certificateNumber"].as_str().unwrap().ends_with("/0001"));
    }

    #[actix_web::test]
    async fn test_malformed_json_is_a_validation_error() {
        let app = test::init_service(
            App::new()
                .app_data(memory_state(AppConfig::default()))
                .configure(configure_routes),
        )
        .await;

        let req = test::TestRequest::post()
            .uri("/api/companies")
            .insert_header((header::CONTENT_TYPE, "application/json"))
            .set_payload("{\"companyName\": ")
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
        let body: ErrorResponse = test::read_body_json(resp).await;
        assert_eq!(body.fields, vec!["body".to_string()]);
    }

    #[actix_web::test]
    async fn test_directory_crud_over_http() {
        let app = test::init_service(
            App::new()
                .app_data(memory_state(AppConfig::default()))
                .configure(configure_routes),
        )
        .await;

        let req = test::TestRequest::post()
            .uri("/api/engineers")
            .set_json(json!({ "name": "R. Patil" }))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::CREATED);
        let created: Value = test::read_body_json(resp).await;
        let id = created["id"].as_str().unwrap().to_string();

        let req = test::TestRequest::put()
            .uri(&format!("/api/engineers/{id}"))
            .set_json(json!({ "name": "Rahul Patil" }))
            .to_request();
        let updated: Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(updated["name"], "Rahul Patil");

        let req = test::TestRequest::get().uri("/api/engineers").to_request();
        let list: Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(list.as_array().unwrap().len(), 1);

        let req = test::TestRequest::delete()
            .uri(&format!("/api/engineers/{id}"))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::NO_CONTENT);

        let req = test::TestRequest::get()
            .uri(&format!("/api/engineers/{id}"))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);
        let body: ErrorResponse = test::read_body_json(resp).await;
        assert_eq!(body.error, "NotFound");
    }

    #[actix_web::test]
    async fn test_send_delivers_pdf_to_mail_relay() {
        let dir = tempfile::tempdir().unwrap();
        let relay = start_mail_relay(StatusCode::ACCEPTED);
        let app = test::init_service(
            App::new()
                .app_data(relay_state(dir.path(), relay.config(Some("relay-token"))))
                .configure(configure_routes),
        )
        .await;

        let req = test::TestRequest::post()
            .uri("/api/certificates")
            .set_json(sample_certificate(2))
            .to_request();
        let created: Value = test::call_and_read_body_json(&app, req).await;
        let id = created["id"].as_str().unwrap().to_string();

        let req = test::TestRequest::post()
            .uri(&format!("/api/certificates/{id}/send"))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::OK);
        assert_eq!(resp.headers().get("X-Dispatch-Status").unwrap(), "sent");
        let disposition = resp
            .headers()
            .get(header::CONTENT_DISPOSITION)
            .unwrap()
            .to_str()
            .unwrap()
            .to_string();
        let pdf = test::read_body(resp).await;

        let received = relay.received();
        assert_eq!(received.len(), 1);
        let mail = &received[0];
        assert_eq!(mail.authorization.as_deref(), Some("Bearer relay-token"));
        assert_eq!(mail.body["from"], "reports@rps.local");
        assert_eq!(mail.body["to"], "ops@rps.example");
        let subject = mail.body["subject"].as_str().unwrap();
        assert!(subject.starts_with("Calibration Certificate: RPS/CER/"));
        assert!(subject.ends_with("/0001 - Acme Refinery Pvt. Ltd."));
        assert!(mail.body["text"].as_str().unwrap().contains(&id));

        let attachment = &mail.body["attachments"][0];
        assert_eq!(attachment["contentType"], "application/pdf");
        assert_eq!(attachment["encoding"], "base64");
        let filename = attachment["filename"].as_str().unwrap();
        assert!(disposition.contains(filename));
        let decoded = BASE64.decode(attachment["content"].as_str().unwrap()).unwrap();
        assert_eq!(decoded, pdf.to_vec());

        relay.stop().await;
    }

    #[actix_web::test]
    async fn test_send_with_unreachable_relay_still_returns_pdf() {
        let dir = tempfile::tempdir().unwrap();
        let app = test::init_service(
            App::new()
                .app_data(relay_state(dir.path(), unreachable_relay()))
                .configure(configure_routes),
        )
        .await;

        let req = test::TestRequest::post()
            .uri("/api/services")
            .set_json(sample_service(2))
            .to_request();
        let created: Value = test::call_and_read_body_json(&app, req).await;

        let req = test::TestRequest::post()
            .uri(&format!("/api/services/{}/send", created["id"].as_str().unwrap()))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::OK);
        assert_eq!(
            resp.headers().get(header::CONTENT_TYPE).unwrap(),
            "application/pdf"
        );
        assert_eq!(resp.headers().get("X-Dispatch-Status").unwrap(), "failed");
        let pdf = test::read_body(resp).await;
        assert!(pdf.starts_with(b"%PDF-"));
    }

    #[actix_web::test]
    async fn test_send_rejected_by_relay_reports_failed() {
        let dir = tempfile::tempdir().unwrap();
        let relay = start_mail_relay(StatusCode::SERVICE_UNAVAILABLE);
        let app = test::init_service(
            App::new()
                .app_data(relay_state(dir.path(), relay.config(None)))
                .configure(configure_routes),
        )
        .await;

        let req = test::TestRequest::post()
            .uri("/api/services")
            .set_json(sample_service(1))
            .to_request();
        let created: Value = test::call_and_read_body_json(&app, req).await;

        let req = test::TestRequest::post()
            .uri(&format!("/api/services/{}/send", created["id"].as_str().unwrap()))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::OK);
        assert_eq!(resp.headers().get("X-Dispatch-Status").unwrap(), "failed");

        let received = relay.received();
        assert_eq!(received.len(), 1);
        assert!(received[0].authorization.is_none());
        assert!(received[0].body["subject"]
            .as_str()
            .unwrap()
            .starts_with("Service Report: RPS/SER/"));

        relay.stop().await;
    }

    #[::core::prelude::v1::test]
    fn test_openapi_documents_every_record_route() {
        let doc = serde_json::to_value(ApiDoc::openapi()).unwrap();
        let paths = &doc["paths"];

        for collection in [
            "companies",
            "contacts",
            "models",
            "engineers",
            "service-engineers",
            "certificates",
            "services",
        ] {
            let list = &paths[format!("/api/{collection}")];
            assert!(list.get("get").is_some(), "GET /api/{collection} undocumented");
            assert!(list.get("post").is_some(), "POST /api/{collection} undocumented");

            let item = &paths[format!("/api/{collection}/{{id}}")];
            for method in ["get", "put", "delete"] {
                assert!(
                    item.get(method).is_some(),
                    "{method} /api/{collection}/{{id}} undocumented"
                );
            }
        }
        assert!(paths["/api/contacts/{id}"]["delete"]["responses"]
            .get("204")
            .is_some());
    }
}
