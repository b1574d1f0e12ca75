use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;
use tracing::{debug, info};
use uuid::Uuid;

use crate::error::FormError;
use crate::form::FormState;

/// Delay used by [`SimulatedSubmitter`] unless configured otherwise.
pub const DEFAULT_SUBMIT_DELAY: Duration = Duration::from_millis(2000);

/// What the form hands off when it leaves Idle.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClipRequest {
    pub video_url: String,
    pub clip_count: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubmissionReceipt {
    pub id: Uuid,
    pub video_url: String,
    pub clip_count: u64,
    pub completed_at: DateTime<Utc>,
    pub message: String,
}

impl SubmissionReceipt {
    pub fn for_request(request: &ClipRequest) -> Self {
        Self {
            id: Uuid::new_v4(),
            video_url: request.video_url.clone(),
            clip_count: request.clip_count,
            completed_at: Utc::now(),
            message: format!(
                "Processing {} clips from: {}",
                request.clip_count, request.video_url
            ),
        }
    }
}

/// Accepts a clip request. Submission has no failure path.
#[async_trait]
pub trait ClipSubmitter: Send + Sync {
    fn name(&self) -> &'static str;

    async fn submit(&self, request: &ClipRequest) -> SubmissionReceipt;
}

/// Waits a fixed delay and acknowledges the request. No processing happens.
#[derive(Debug, Clone)]
pub struct SimulatedSubmitter {
    delay: Duration,
}

impl SimulatedSubmitter {
    pub fn new(delay: Duration) -> Self {
        Self { delay }
    }

    pub fn delay(&self) -> Duration {
        self.delay
    }
}

impl Default for SimulatedSubmitter {
    fn default() -> Self {
        Self::new(DEFAULT_SUBMIT_DELAY)
    }
}

#[async_trait]
impl ClipSubmitter for SimulatedSubmitter {
    fn name(&self) -> &'static str {
        "simulated"
    }

    async fn submit(&self, request: &ClipRequest) -> SubmissionReceipt {
        debug!(delay_ms = self.delay.as_millis() as u64, "simulating clip processing");
        tokio::time::sleep(self.delay).await;
        let receipt = SubmissionReceipt::for_request(request);
        info!(
            receipt_id = %receipt.id,
            clip_count = receipt.clip_count,
            video_url = %receipt.video_url,
            "clip request acknowledged"
        );
        receipt
    }
}

/// Drive one submission through the form state machine.
///
/// The lock is released while the submitter runs, so other holders of the
/// form observe `Loading` for the whole delay and may keep editing inputs.
pub async fn run_submission(
    form: &Mutex<FormState>,
    submitter: &dyn ClipSubmitter,
) -> Result<SubmissionReceipt, FormError> {
    let request = form.lock().await.begin_submission()?;
    let receipt = submitter.submit(&request).await;
    form.lock().await.finish_submission()?;
    Ok(receipt)
}
