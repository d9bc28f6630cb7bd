//! Shared handler state.

use picpress_config::UploadLimits;
use picpress_convert::{ConversionPipeline, TransientStorage};
use picpress_telemetry::Metrics;

/// Dependencies shared by every handler.
#[derive(Debug, Clone)]
pub struct ApiState {
    pub(crate) pipeline: ConversionPipeline,
    pub(crate) limits: UploadLimits,
    pub(crate) telemetry: Metrics,
}

impl ApiState {
    /// Bundle the pipeline, request limits, and metrics handle.
    #[must_use]
    pub const fn new(pipeline: ConversionPipeline, limits: UploadLimits, telemetry: Metrics) -> Self {
        Self {
            pipeline,
            limits,
            telemetry,
        }
    }

    pub(crate) const fn storage(&self) -> &TransientStorage {
        self.pipeline.storage()
    }
}
