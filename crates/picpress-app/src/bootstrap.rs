use std::net::SocketAddr;
use std::sync::Arc;

use picpress_api::{ApiServer, ApiState};
use picpress_config::ServerConfig;
use picpress_convert::{ConversionPipeline, TransientStorage, WebpTranscoder};
use picpress_telemetry::{GlobalContextGuard, LogFormat, LoggingConfig, Metrics};
use tracing::info;

use crate::error::{AppError, AppResult};

/// Dependencies required to bootstrap the application.
pub(crate) struct BootstrapDependencies {
    config: ServerConfig,
    telemetry: Metrics,
}

impl BootstrapDependencies {
    /// Construct production dependencies from the environment for the binary entrypoint.
    pub(crate) fn from_env() -> AppResult<Self> {
        let config =
            ServerConfig::from_env().map_err(|err| AppError::config("config.from_env", err))?;
        let telemetry =
            Metrics::new().map_err(|err| AppError::telemetry("telemetry.metrics", err))?;
        Ok(Self { config, telemetry })
    }
}

/// Entry point for the boot sequence.
///
/// # Errors
///
/// Returns an error if configuration, logging, storage preparation, or the listener fails.
pub async fn run_app() -> AppResult<()> {
    let dependencies = BootstrapDependencies::from_env()?;
    run_app_with(dependencies).await
}

/// Boot sequence that relies entirely on injected dependencies.
pub(crate) async fn run_app_with(dependencies: BootstrapDependencies) -> AppResult<()> {
    let BootstrapDependencies { config, telemetry } = dependencies;

    let format = config
        .log_format
        .as_deref()
        .map_or_else(LogFormat::infer, LogFormat::from_name);
    picpress_telemetry::init_logging(&LoggingConfig {
        level: &config.log_level,
        format,
        build_sha: &config.build_sha,
    })
    .map_err(|err| AppError::telemetry("telemetry.init", err))?;
    let _context = GlobalContextGuard::new("bootstrap");

    info!("picpress bootstrap starting");
    let (api, addr) = assemble(&config, telemetry).await?;
    info!(addr = %addr, "launching api listener");

    api.serve(addr)
        .await
        .map_err(|err| AppError::api_server("api_server.serve", err))?;
    info!("api server shutdown complete");
    Ok(())
}

/// Prepare the transient areas and wire the pipeline into the HTTP surface.
pub(crate) async fn assemble(
    config: &ServerConfig,
    telemetry: Metrics,
) -> AppResult<(ApiServer, SocketAddr)> {
    let storage = TransientStorage::new(config.dirs.intake.clone(), config.dirs.output.clone());
    storage
        .init()
        .await
        .map_err(|err| AppError::storage("storage.init", err))?;

    let transcoder = Arc::new(WebpTranscoder::new(config.webp_quality));
    let pipeline = ConversionPipeline::new(storage, transcoder, telemetry.clone());
    info!(
        quality = config.webp_quality,
        max_files = config.limits.max_files,
        max_body_bytes = config.limits.max_body_bytes,
        "conversion pipeline ready"
    );

    let state = ApiState::new(pipeline, config.limits, telemetry);
    let api = ApiServer::new(state, config.static_dir.clone());
    Ok((api, config.socket_addr()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use picpress_config::TransientDirs;
    use tempfile::TempDir;

    #[tokio::test]
    async fn assemble_creates_transient_areas() -> anyhow::Result<()> {
        let temp = TempDir::new()?;
        let config = ServerConfig {
            dirs: TransientDirs::under(temp.path()),
            static_dir: None,
            http_port: 8123,
            ..ServerConfig::default()
        };

        let (_api, addr) = assemble(&config, Metrics::new()?).await?;
        assert_eq!(addr.port(), 8123);
        assert!(temp.path().join("uploads").is_dir());
        assert!(temp.path().join("outputs").is_dir());
        Ok(())
    }

    #[tokio::test]
    async fn assemble_reports_unusable_storage() -> anyhow::Result<()> {
        let temp = TempDir::new()?;
        let blocker = temp.path().join("blocker");
        std::fs::write(&blocker, b"not a directory")?;
        let config = ServerConfig {
            dirs: TransientDirs::under(&blocker),
            ..ServerConfig::default()
        };

        let result = assemble(&config, Metrics::new()?).await;
        assert!(matches!(
            result,
            Err(AppError::Storage {
                operation: "storage.init",
                ..
            })
        ));
        Ok(())
    }
}
