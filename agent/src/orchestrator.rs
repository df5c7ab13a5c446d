//! C6: the update orchestrator — the full single-cycle state machine
//! driving C2–C5 and the bootloader.

use http::Method;
use std::time::Duration;

use crate::assembler::{AssemblerError, FlashAssembler, JsonAssembler};
use crate::contracts::{Bootloader, DeviceIdentity, FlashStreamer, KeyValueStore, UpgradeMode};
use crate::descriptor::{self, DescriptorError};
use crate::error::OutcomeCode;
use crate::protocol::{ConfigData, ConfigMessage, ControlResponse, DeploymentResponse, Execution, FeedbackMessage, FeedbackResult, FeedbackStatus, Finished};
use crate::store::ActionIdStore;
use crate::transport::{NullSink, Session, TransportError};
use crate::AgentConfig;

/// Hardware-facing dependencies for a single cycle. Borrowed for the
/// duration of the call rather than stashed in a process-wide global, so
/// concurrent cycles (in tests, or a future multi-device host) don't
/// share state.
pub struct Deps<'a> {
    pub kv: &'a dyn KeyValueStore,
    pub bootloader: &'a dyn Bootloader,
    pub identity: &'a dyn DeviceIdentity,
    pub flash: &'a mut dyn FlashStreamer,
}

/// Internal short-circuit carrying the [`OutcomeCode`] an early return
/// should resolve to; never exposed outside this module. Lets the cycle
/// body use `?` throughout instead of a long chain of `match`.
struct CycleExit(OutcomeCode);

impl From<TransportError> for CycleExit {
    fn from(_: TransportError) -> Self {
        CycleExit(OutcomeCode::NetworkingError)
    }
}

impl From<DescriptorError> for CycleExit {
    fn from(error: DescriptorError) -> Self {
        match error {
            DescriptorError::ArtifactTooLarge { .. } => CycleExit(OutcomeCode::DownloadError),
            _ => CycleExit(OutcomeCode::MetadataError),
        }
    }
}

impl From<AssemblerError> for CycleExit {
    fn from(error: AssemblerError) -> Self {
        match error {
            AssemblerError::Flash(_) => CycleExit(OutcomeCode::DownloadError),
            AssemblerError::AllocationFailed
            | AssemblerError::LengthMismatch { .. }
            | AssemblerError::Json(_) => CycleExit(OutcomeCode::MetadataError),
        }
    }
}

fn timestamp() -> String {
    chrono::Utc::now().format("%Y%m%dT%H%M%S").to_string()
}

/// Runs one full poll cycle: constructs a fresh session, walks POLL_BASE →
/// (CANCEL_ACK | SEND_CONFIG) → POLL_DEPLOY → DOWNLOAD → ARM_BOOT →
/// PERSIST_ACTION_ID, and returns the terminal [`OutcomeCode`]. No state
/// survives the call except the persisted action id and `*poll_interval`.
pub async fn probe(config: &AgentConfig, deps: Deps<'_>, poll_interval: &mut Duration) -> OutcomeCode {
    match run_cycle(config, deps, poll_interval).await {
        Ok(code) => code,
        Err(CycleExit(code)) => code,
    }
}

async fn run_cycle(
    config: &AgentConfig,
    deps: Deps<'_>,
    poll_interval: &mut Duration,
) -> Result<OutcomeCode, CycleExit> {
    let Deps {
        kv,
        bootloader,
        identity,
        flash,
    } = deps;

    // CHECK_IMAGE_CONFIRMED
    let confirmed = bootloader.is_image_confirmed().unwrap_or(false);
    if !confirmed {
        return Ok(OutcomeCode::UnconfirmedImage);
    }

    // FETCH_IDENTITY
    let device_id = identity
        .device_id()
        .ok_or(CycleExit(OutcomeCode::MetadataError))?;

    // OPEN_SESSION
    let session = Session::open(config).await?;

    let board_device = format!("{}-{}", config.board, device_id);

    // POLL_BASE
    let mut base_json = JsonAssembler::new();
    let meta = session
        .request(Method::GET, &format!("/{board_device}"), None, &mut base_json)
        .await?;
    if !meta.status.is_success() {
        return Err(CycleExit(OutcomeCode::MetadataError));
    }
    let control: ControlResponse = base_json.into_result()?;

    if let Some(sleep) = control
        .config
        .as_ref()
        .and_then(|c| c.polling.as_ref())
        .and_then(|p| p.sleep.as_deref())
    {
        match descriptor::decode_sleep_seconds(sleep) {
            Some(seconds) => {
                let new_interval = Duration::from_secs(seconds)
                    .clamp(config.poll_interval_min, config.poll_interval_max);
                if new_interval != *poll_interval {
                    tracing::info!(old_ms = poll_interval.as_millis() as u64, new_ms = new_interval.as_millis() as u64, "poll interval updated");
                    *poll_interval = new_interval;
                }
            }
            None => tracing::warn!(sleep, "ignoring malformed poll sleep"),
        }
    }

    let links = control.links.unwrap_or_default();

    // CANCEL_ACK takes precedence over SEND_CONFIG / deployment fetch when
    // both are present in the same response.
    if let Some(cancel) = links.cancel_action.as_ref() {
        let cancel_id = descriptor::extract_cancel_action_id(&cancel.href)?;
        let path = format!("/{board_device}/cancelAction/{cancel_id}/feedback");
        let body = serde_json::to_vec(&FeedbackMessage::closed_success(
            cancel_id.to_string(),
            timestamp(),
        ))
        .expect("feedback message is always serializable");
        session
            .request(Method::POST, &path, Some(body), &mut NullSink)
            .await?;
        return Ok(OutcomeCode::CancelUpdate);
    }

    if links.config_data.is_some() {
        let path = format!("/{board_device}/configData");
        let message = ConfigMessage {
            mode: "merge".into(),
            data: ConfigData {
                vin: device_id.clone(),
                hw_revision: "3".into(),
            },
            id: device_id.clone(),
            time: timestamp(),
            status: FeedbackStatus {
                execution: Execution::Closed,
                result: FeedbackResult {
                    finished: Finished::Success,
                },
            },
        };
        let body =
            serde_json::to_vec(&message).expect("config message is always serializable");
        session
            .request(Method::PUT, &path, Some(body), &mut NullSink)
            .await?;
    }

    // PARSE_DEPLOY_LINK
    let deployment_suffix =
        descriptor::extract_deployment_base_suffix(links.deployment_base.as_ref().map(|l| l.href.as_str()))?;
    if deployment_suffix.is_empty() {
        return Ok(OutcomeCode::NoUpdate);
    }

    // POLL_DEPLOY
    let mut deploy_json = JsonAssembler::new();
    let deploy_path = format!("/{board_device}/{deployment_suffix}");
    let meta = session
        .request(Method::GET, &deploy_path, None, &mut deploy_json)
        .await?;
    if !meta.status.is_success() {
        return Err(CycleExit(OutcomeCode::MetadataError));
    }
    let deployment: DeploymentResponse = deploy_json.into_result()?;

    let action_id: i32 = deployment
        .id
        .parse()
        .map_err(|_| CycleExit(OutcomeCode::MetadataError))?;
    if action_id <= 0 {
        return Err(CycleExit(OutcomeCode::MetadataError));
    }

    let store = ActionIdStore::new(kv);
    let persisted_action_id = store
        .read()
        .map_err(|_| CycleExit(OutcomeCode::MetadataError))?;

    // CHECK_ACTION_ID
    if action_id == persisted_action_id {
        let path = format!("/{board_device}/{deployment_suffix}/feedback");
        let body = serde_json::to_vec(&FeedbackMessage::closed_success(
            action_id.to_string(),
            timestamp(),
        ))
        .expect("feedback message is always serializable");
        session
            .request(Method::POST, &path, Some(body), &mut NullSink)
            .await?;
        return Ok(OutcomeCode::Ok);
    }

    // DOWNLOAD
    let artifact = descriptor::validate_single_artifact(&deployment, bootloader.alt_slot_size())?;
    let download_path = descriptor::extract_download_path(&artifact.links.download_http.href)?;

    flash
        .init()
        .map_err(|_| CycleExit(OutcomeCode::DownloadError))?;

    let mut flash_assembler = FlashAssembler::new(flash);
    let meta = session
        .request(Method::GET, &download_path, None, &mut flash_assembler)
        .await?;
    if !meta.status.is_success() {
        return Err(CycleExit(OutcomeCode::DownloadError));
    }
    let expected_size = meta.content_length.or(Some(artifact.size));
    flash_assembler.finish(expected_size)?;

    // ARM_BOOT
    bootloader
        .request_upgrade(UpgradeMode::Test)
        .map_err(|_| CycleExit(OutcomeCode::DownloadError))?;

    // PERSIST_ACTION_ID
    if let Err(error) = store.write(action_id) {
        tracing::warn!(action_id, error = %error, "failed to persist installed action id");
    }

    session.close();
    Ok(OutcomeCode::UpdateInstalled)
}
