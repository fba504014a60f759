use anyhow::Context;

#[actix_web::main]
async fn main() -> anyhow::Result<()> {
    rps_calibration_server::run()
        .await
        .context("HTTP server terminated with an error")
}
