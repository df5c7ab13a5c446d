//! C7: autohandler — a recurring timer that invokes the orchestrator,
//! interprets its outcome, and reschedules.

use std::time::Duration;

use crate::error::OutcomeCode;
use crate::orchestrator::{self, Deps};
use crate::AgentConfig;

/// Why [`autohandler_start`] stopped looping.
///
/// The source's autohandler runs forever on-device, rebooting in place on
/// `UnconfirmedImage` rather than ever returning. A host process can't loop
/// forever under a test harness, so this crate exposes the loop exit
/// instead of diverging: a real `agentd` binary calls this with
/// `max_cycles: None` and reboots the process when it sees
/// [`AutohandlerExit::RebootRequested`] (see DESIGN.md).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AutohandlerExit {
    /// `UnconfirmedImage` was returned; the bootloader should be asked for
    /// a warm reboot, which will revert to the last confirmed image.
    RebootRequested,
    /// `max_cycles` was reached without a reboot request.
    CyclesExhausted,
}

/// Runs the recurring poll loop: one [`orchestrator::probe`] cycle, a log
/// line, then a sleep for the current poll interval before the next cycle.
/// Stops and returns as soon as a cycle reports `UnconfirmedImage`, or after
/// `max_cycles` cycles if `max_cycles` is `Some` (used by tests; a real
/// deployment passes `None`).
pub async fn autohandler_start(
    config: &AgentConfig,
    kv: &dyn crate::contracts::KeyValueStore,
    bootloader: &dyn crate::contracts::Bootloader,
    identity: &dyn crate::contracts::DeviceIdentity,
    flash: &mut dyn crate::contracts::FlashStreamer,
    max_cycles: Option<u32>,
) -> AutohandlerExit {
    let mut poll_interval = config.poll_interval_default;
    let mut cycles_run: u32 = 0;

    loop {
        cycles_run += 1;
        let span = tracing::info_span!("poll_cycle", cycle = cycles_run);
        let outcome = {
            let _entered = span.enter();
            let deps = Deps {
                kv,
                bootloader,
                identity,
                flash: &mut *flash,
            };
            orchestrator::probe(config, deps, &mut poll_interval).await
        };

        tracing::info!(
            cycle = cycles_run,
            outcome = %outcome,
            next_poll_ms = poll_interval.as_millis() as u64,
            "poll cycle finished"
        );

        if outcome == OutcomeCode::UnconfirmedImage {
            return AutohandlerExit::RebootRequested;
        }

        if let Some(max) = max_cycles {
            if cycles_run >= max {
                return AutohandlerExit::CyclesExhausted;
            }
        }

        tokio::time::sleep(poll_interval).await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::AgentConfigBuilder;
    use crate::contracts::Bootloader as _;
    use crate::reference::{FileBootloader, FileFlashStreamer, InMemoryKeyValueStore, StaticIdentity};
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[tokio::test]
    async fn stops_after_max_cycles_without_reboot() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/x-dev01"))
            .respond_with(ResponseTemplate::new(200).set_body_string(
                r#"{"config":{"polling":{"sleep":"00:00:01"}},"_links":{}}"#,
            ))
            .mount(&server)
            .await;

        let uri = server.uri();
        let url = url::Url::parse(&uri).unwrap();
        let config = AgentConfigBuilder::default()
            .server_host(url.host_str().unwrap())
            .server_port(url.port().unwrap())
            .board("x")
            .poll_interval_default(Duration::from_millis(1))
            .build()
            .unwrap();

        let dir = tempfile::tempdir().unwrap();
        let kv = InMemoryKeyValueStore::default();
        let bootloader = FileBootloader::new(dir.path().join("confirmed"), 4096, "1.0.0");
        bootloader.write_image_confirmed().unwrap();
        let identity = StaticIdentity::new("dev01", "1.0.0");
        let mut flash = FileFlashStreamer::new(dir.path().join("alt-slot.img"));

        let exit = autohandler_start(&config, &kv, &bootloader, &identity, &mut flash, Some(2)).await;
        assert_eq!(exit, AutohandlerExit::CyclesExhausted);
    }

    #[tokio::test]
    async fn requests_reboot_when_image_unconfirmed() {
        let config = AgentConfigBuilder::default()
            .server_host("example.invalid")
            .server_port(1u16)
            .board("x")
            .build()
            .unwrap();

        let dir = tempfile::tempdir().unwrap();
        let kv = InMemoryKeyValueStore::default();
        let bootloader = FileBootloader::new(dir.path().join("confirmed"), 4096, "1.0.0");
        let identity = StaticIdentity::new("dev01", "1.0.0");
        let mut flash = FileFlashStreamer::new(dir.path().join("alt-slot.img"));

        let exit = autohandler_start(&config, &kv, &bootloader, &identity, &mut flash, Some(5)).await;
        assert_eq!(exit, AutohandlerExit::RebootRequested);
    }
}
