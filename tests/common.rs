#![allow(dead_code)]

use actix_web::dev::ServerHandle;
use actix_web::http::{header, StatusCode};
use actix_web::{web, App, HttpRequest, HttpResponse, HttpServer};
use async_trait::async_trait;
use chrono::NaiveDate;
use image::{Rgba, RgbaImage};
use parking_lot::Mutex;
use serde_json::Value;
use std::path::Path;
use std::sync::Arc;
use uuid::Uuid;

use rps_calibration_server::config::{AppConfig, MailRelayConfig};
use rps_calibration_server::error::StorageError;
use rps_calibration_server::numbering::{DocumentType, SequenceCounter, SequenceStore};
use rps_calibration_server::records::model::{
    Certificate, CertificateStatus, EngineerRemark, Observation, ServiceReport, ServiceStatus,
};

/// Write a small logo and footer into `dir` and point a config at them.
pub fn config_with_assets(dir: &Path) -> AppConfig {
    RgbaImage::from_pixel(12, 4, Rgba([0, 51, 102, 255]))
        .save(dir.join("rps.png"))
        .expect("write logo fixture");
    RgbaImage::from_pixel(24, 2, Rgba([200, 30, 30, 128]))
        .save(dir.join("handf.png"))
        .expect("write footer fixture");
    AppConfig {
        assets_dir: dir.to_path_buf(),
        ..AppConfig::default()
    }
}

pub fn sample_certificate(observations: usize) -> Certificate {
    Certificate {
        id: Uuid::nil(),
        certificate_no: String::new(),
        customer_name: "Acme Refinery Pvt. Ltd.".into(),
        site_location: "Plant 2, Hazira".into(),
        make_model: "BW GasAlert Max XT II".into(),
        range: "0-100 %LEL".into(),
        serial_no: "MA218-0042".into(),
        calibration_gas: "Methane 2.5% vol".into(),
        gas_canister_details: "Cylinder 4421, exp. 2026".into(),
        date_of_calibration: NaiveDate::from_ymd_opt(2025, 6, 1).unwrap(),
        calibration_due_date: NaiveDate::from_ymd_opt(2026, 6, 1).unwrap(),
        observations: (0..observations)
            .map(|i| Observation {
                gas: format!("{} ppm", (i + 1) * 25),
                before: "48".into(),
                after: "50".into(),
            })
            .collect(),
        engineer_name: "R. Patil".into(),
        status: CertificateStatus::Checked,
        company_id: None,
        created_at: None,
    }
}

pub fn sample_service(remarks: usize) -> ServiceReport {
    ServiceReport {
        id: Uuid::nil(),
        report_no: String::new(),
        customer_name: "Acme Refinery Pvt. Ltd.".into(),
        customer_location: "Hazira".into(),
        contact_person: "A. Shah".into(),
        contact_number: "9876543210".into(),
        service_engineer: "K. Iyer".into(),
        service_engineer_id: None,
        date: NaiveDate::from_ymd_opt(2025, 6, 2).unwrap(),
        place: "Hazira".into(),
        place_options: "At Site".into(),
        nature_of_job: "Calibration".into(),
        instrument_make_model_quantity: "Dräger X-am 2500, 2 nos".into(),
        calibrated_ok_serials: "ARHK-0001".into(),
        faulty_serials: "ARHK-0002".into(),
        engineer_report: "Sensors replaced and bump tested. ".repeat(4),
        customer_report: "Satisfied with the service.".into(),
        engineer_remarks: (0..remarks)
            .map(|i| EngineerRemark {
                service_spares: format!("Spare {}", i + 1),
                part_no: format!("P-{:03}", i + 1),
                rate: "1500".into(),
                quantity: "1".into(),
                total: "1500".into(),
                po_no: "PO-2025-77".into(),
            })
            .collect(),
        engineer_name: "K. Iyer".into(),
        engineer_id: None,
        status: ServiceStatus::Checked,
    }
}

/// A sequence store whose backend is always down.
pub struct FailingSequenceStore;

#[async_trait]
impl SequenceStore for FailingSequenceStore {
    async fn read(&self, _: DocumentType) -> Result<Option<SequenceCounter>, StorageError> {
        Err(StorageError::Unavailable("connection refused".into()))
    }

    async fn increment(
        &self,
        _: DocumentType,
        _: &(dyn Fn(u64) -> String + Send + Sync),
    ) -> Result<SequenceCounter, StorageError> {
        Err(StorageError::Unavailable("connection refused".into()))
    }
}

/// One request received by [`MailRelay`].
#[derive(Debug, Clone)]
pub struct CapturedMail {
    pub authorization: Option<String>,
    pub body: Value,
}

/// A local HTTP mail relay that records what it receives and answers with a
/// fixed status.
pub struct MailRelay {
    pub endpoint: String,
    received: Arc<Mutex<Vec<CapturedMail>>>,
    handle: ServerHandle,
}

async fn capture_mail(
    req: HttpRequest,
    body: web::Json<Value>,
    received: web::Data<Mutex<Vec<CapturedMail>>>,
    status: web::Data<StatusCode>,
) -> HttpResponse {
    let authorization = req
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .map(str::to_string);
    received.lock().push(CapturedMail {
        authorization,
        body: body.into_inner(),
    });
    HttpResponse::build(**status).finish()
}

/// Must be called from within an actix runtime (`#[actix_web::test]`).
pub fn start_mail_relay(status: StatusCode) -> MailRelay {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").expect("bind mail relay");
    let port = listener.local_addr().expect("mail relay address").port();
    let received = Arc::new(Mutex::new(Vec::new()));

    let data = web::Data::from(received.clone());
    let server = HttpServer::new(move || {
        App::new()
            .app_data(data.clone())
            .app_data(web::Data::new(status))
            .app_data(web::JsonConfig::default().limit(16 * 1024 * 1024))
            .route("/send", web::post().to(capture_mail))
    })
    .workers(1)
    .listen(listener)
    .expect("listen mail relay")
    .run();
    let handle = server.handle();
    actix_web::rt::spawn(server);

    MailRelay {
        endpoint: format!("http://127.0.0.1:{port}/send"),
        received,
        handle,
    }
}

impl MailRelay {
    pub fn config(&self, token: Option<&str>) -> MailRelayConfig {
        MailRelayConfig {
            endpoint: self.endpoint.clone(),
            token: token.map(str::to_string),
            from: "reports@rps.local".into(),
            recipient: "ops@rps.example".into(),
        }
    }

    pub fn received(&self) -> Vec<CapturedMail> {
        self.received.lock().clone()
    }

    pub async fn stop(self) {
        self.handle.stop(false).await;
    }
}

/// A relay endpoint nothing listens on.
pub fn unreachable_relay() -> MailRelayConfig {
    MailRelayConfig {
        endpoint: "http://127.0.0.1:9/send".into(),
        token: None,
        from: "reports@rps.local".into(),
        recipient: "ops@rps.example".into(),
    }
}
