mod cli;
mod demo;
mod infra;
mod routes;
mod server;

#[derive(Debug, thiserror::Error)]
pub enum ServiceError {
    #[error("configuration error: {0}")]
    Config(#[from] careerpath::config::ConfigError),
    #[error("telemetry error: {0}")]
    Telemetry(#[from] careerpath::telemetry::TelemetryError),
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

pub async fn run() -> Result<(), ServiceError> {
    cli::run().await
}
