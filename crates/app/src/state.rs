//! Application state and the background workers it starts.
//!
//! Workers run on their own thread with their own tokio runtime and report
//! back over mpsc channels. The UI drains those channels once per frame.

use crate::modals::DialogHost;
use crate::onboarding::{OnboardingFlow, OnboardingOutcome};
use crate::pages::{EnvironmentPage, EnvironmentRequest, HomePage, SettingsPage};
use crate::shell::MainShell;
use crate::theme::Palette;
use futures::future::{AbortHandle, AbortRegistration};
use services::installer::InstallJob;
use services::probe::{run_probe, validate_manual_path};
use services::user_path::platform_editor;
use services::{HttpFetcher, SystemRunner, ToolInstaller};
use shared::config::ConfigStore;
use shared::environment::{ProbeEvent, ProbeSelection, Tool, ValidationFailure};
use shared::install::{InstallEvent, InstallOutcome};
use std::path::PathBuf;
use std::sync::mpsc::{channel, Receiver, Sender, TryRecvError};
use std::sync::Arc;
use tracing::{error, info, warn};

/// Detect tools in the background (non-blocking)
pub fn run_probe_worker(selection: ProbeSelection, tx: Sender<ProbeEvent>) {
    let rt = match tokio::runtime::Runtime::new() {
        Ok(rt) => rt,
        Err(e) => {
            error!("Failed to start async runtime: {}", e);
            let _ = tx.send(ProbeEvent::Finished);
            return;
        }
    };
    rt.block_on(run_probe(&SystemRunner, selection, &tx));
}

/// Check an executable picked with the file dialog
pub fn run_validation_worker(tool: Tool, path: PathBuf, tx: Sender<ProbeEvent>) {
    let result = match tokio::runtime::Runtime::new() {
        Ok(rt) => rt.block_on(validate_manual_path(&SystemRunner, tool, &path)),
        Err(e) => Err(ValidationFailure::Other(e.to_string())),
    };
    let _ = tx.send(ProbeEvent::Validated { tool, result });
    let _ = tx.send(ProbeEvent::Finished);
}

/// Download and install a tool. Always ends with `InstallEvent::Finished`.
pub fn run_install_worker(tool: Tool, tx: Sender<InstallEvent>, abort_reg: AbortRegistration) {
    let fail = |message: String| {
        error!("Cannot install {}: {}", tool, message);
        let _ = tx.send(InstallEvent::Finished(InstallOutcome::Failure(message)));
    };

    let rt = match tokio::runtime::Runtime::new() {
        Ok(rt) => rt,
        Err(e) => return fail(format!("Failed to start async runtime: {}", e)),
    };
    let job = match InstallJob::for_tool(tool) {
        Ok(job) => job,
        Err(e) => return fail(e.to_string()),
    };
    let fetcher = match HttpFetcher::new() {
        Ok(f) => f,
        Err(e) => return fail(format!("{:#}", e)),
    };
    let editor = match platform_editor() {
        Ok(editor) => editor,
        Err(e) => return fail(e.to_string()),
    };

    let installer = ToolInstaller::new(Arc::new(fetcher), Arc::from(editor));
    rt.block_on(installer.run_abortable(&job, &tx, abort_reg));
}

pub struct AppState {
    pub config: ConfigStore,
    pub onboarding: Option<OnboardingFlow>,
    pub shell: MainShell,
    pub dialogs: DialogHost,
    pub home: HomePage,
    pub settings: SettingsPage,
    pub environment: EnvironmentPage,
    pub palette: Palette,
    /// Saved geometry has been applied to the window
    pub geometry_restored: bool,
    probe_rx: Option<Receiver<ProbeEvent>>,
    install_rx: Option<Receiver<InstallEvent>>,
    install_abort: Option<AbortHandle>,
}

impl AppState {
    pub fn new(config: ConfigStore) -> Self {
        let onboarding = config.is_first_run().then(OnboardingFlow::new);
        let settings = SettingsPage::new(config.get());
        Self {
            config,
            onboarding,
            shell: MainShell::new(),
            dialogs: DialogHost::new(),
            home: HomePage::new(),
            settings,
            environment: EnvironmentPage::new(),
            palette: Palette::new(false),
            geometry_restored: false,
            probe_rx: None,
            install_rx: None,
            install_abort: None,
        }
    }

    /// Close the first-run flow. Returns true when the app should exit.
    pub fn finish_onboarding(&mut self, outcome: OnboardingOutcome) -> bool {
        self.onboarding = None;
        match outcome {
            OnboardingOutcome::Completed => {
                info!("Onboarding completed");
                self.config.set_first_run_completed();
                false
            }
            OnboardingOutcome::Dismissed => {
                info!("Onboarding dismissed, exiting");
                true
            }
        }
    }

    /// A worker is alive and the UI should keep polling
    pub fn has_background_work(&self) -> bool {
        self.probe_rx.is_some() || self.install_rx.is_some()
    }

    pub fn handle_request(&mut self, request: EnvironmentRequest) {
        match request {
            EnvironmentRequest::Probe(selection) => self.start_probe(selection),
            EnvironmentRequest::Validate(tool, path) => self.start_validation(tool, path),
            EnvironmentRequest::Install(tool) => self.start_install(tool),
            EnvironmentRequest::CancelInstall => self.cancel_install(),
        }
    }

    pub fn start_probe(&mut self, selection: ProbeSelection) {
        if !self.environment.begin_probe(selection) {
            warn!("Probe already running, ignoring {:?}", selection);
            return;
        }
        info!("Starting probe: {:?}", selection);
        let (tx, rx) = channel();
        self.probe_rx = Some(rx);
        spawn_guarded(
            move |tx| run_probe_worker(selection, tx),
            tx,
            ProbeEvent::Finished,
        );
    }

    pub fn start_validation(&mut self, tool: Tool, path: PathBuf) {
        if !self.environment.begin_probe(ProbeSelection::only(tool)) {
            warn!("Probe already running, ignoring manual path for {}", tool);
            return;
        }
        info!("Validating {} at {}", tool, path.display());
        let (tx, rx) = channel();
        self.probe_rx = Some(rx);
        spawn_guarded(
            move |tx| run_validation_worker(tool, path, tx),
            tx,
            ProbeEvent::Finished,
        );
    }

    pub fn start_install(&mut self, tool: Tool) {
        if !self.environment.begin_install(tool, &mut self.dialogs) {
            return;
        }
        info!("Starting install of {}", tool);
        let (tx, rx) = channel();
        self.install_rx = Some(rx);

        let (abort_handle, abort_reg) = AbortHandle::new_pair();
        self.install_abort = Some(abort_handle);

        spawn_guarded(
            move |tx| run_install_worker(tool, tx, abort_reg),
            tx,
            InstallEvent::Finished(InstallOutcome::Failure(
                "The installer stopped unexpectedly".to_string(),
            )),
        );
    }

    pub fn cancel_install(&mut self) {
        if let Some(handle) = self.install_abort.take() {
            handle.abort();
        }
    }

    pub fn poll_probe(&mut self) {
        let Some(rx) = &self.probe_rx else {
            return;
        };
        let mut events = Vec::new();
        let mut done = false;
        loop {
            match rx.try_recv() {
                Ok(event) => {
                    done |= event == ProbeEvent::Finished;
                    events.push(event);
                }
                Err(TryRecvError::Empty) => break,
                Err(TryRecvError::Disconnected) => {
                    done = true;
                    break;
                }
            }
        }
        for event in events {
            self.environment
                .handle_probe_event(event, &mut self.dialogs);
        }
        if done {
            self.probe_rx = None;
            if self.environment.is_probing() {
                self.environment
                    .handle_probe_event(ProbeEvent::Finished, &mut self.dialogs);
            }
        }
    }

    pub fn poll_install(&mut self, now: f64) {
        let Some(rx) = &self.install_rx else {
            return;
        };
        let mut events = Vec::new();
        let mut done = false;
        loop {
            match rx.try_recv() {
                Ok(event) => {
                    done |= matches!(event, InstallEvent::Finished(_));
                    events.push(event);
                }
                Err(TryRecvError::Empty) => break,
                Err(TryRecvError::Disconnected) => {
                    done = true;
                    break;
                }
            }
        }
        let mut follow_ups = Vec::new();
        for event in events {
            if let Some(request) =
                self.environment
                    .handle_install_event(event, &mut self.dialogs, now)
            {
                follow_ups.push(request);
            }
        }
        if done {
            self.install_rx = None;
            self.install_abort = None;
        }
        for request in follow_ups {
            self.handle_request(request);
        }
    }

    /// Hand dialog results to the page that opened the dialog.
    pub fn dispatch_dialog_events(&mut self) {
        for (id, event) in self.dialogs.drain_events() {
            if self.home.handle_dialog_event(id, &event) {
                continue;
            }
            if let Some(request) = self.environment.handle_dialog_event(id, &event) {
                self.handle_request(request);
            }
        }
    }
}

/// Run `work` on its own thread. If it panics, `fallback` is sent so the UI
/// still sees the job end.
fn spawn_guarded<T, F>(work: F, tx: Sender<T>, fallback: T)
where
    T: Send + 'static,
    F: FnOnce(Sender<T>) + Send + 'static,
{
    std::thread::spawn(move || {
        let tx_panic = tx.clone();
        let res = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| work(tx)));
        if res.is_err() {
            error!("Background worker panicked");
            let _ = tx_panic.send(fallback);
        }
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::modals::DialogEvent;
    use tempfile::TempDir;

    fn state(dir: &TempDir) -> AppState {
        AppState::new(ConfigStore::open(dir.path().join("config.json")))
    }

    #[test]
    fn test_first_run_shows_onboarding() {
        let dir = TempDir::new().unwrap();
        assert!(state(&dir).onboarding.is_some());

        let mut store = ConfigStore::open(dir.path().join("config.json"));
        store.set_first_run_completed();
        assert!(state(&dir).onboarding.is_none());
    }

    #[test]
    fn test_skip_on_first_page_persists_first_run() {
        let dir = TempDir::new().unwrap();
        let mut app = state(&dir);
        let flow = app.onboarding.as_mut().unwrap();
        flow.skip();
        let outcome = flow.outcome().unwrap();

        assert!(!app.finish_onboarding(outcome));
        assert!(app.onboarding.is_none());
        let reopened = ConfigStore::open(dir.path().join("config.json"));
        assert!(!reopened.is_first_run());
        assert!(state(&dir).onboarding.is_none());
    }

    #[test]
    fn test_dismissed_onboarding_exits_without_saving() {
        let dir = TempDir::new().unwrap();
        let mut app = state(&dir);
        app.onboarding.as_mut().unwrap().dismiss();

        assert!(app.finish_onboarding(OnboardingOutcome::Dismissed));
        assert!(app.onboarding.is_none());
        assert!(ConfigStore::open(dir.path().join("config.json")).is_first_run());
    }

    #[test]
    fn test_poll_probe_feeds_page() {
        let dir = TempDir::new().unwrap();
        let mut app = state(&dir);
        let (tx, rx) = channel();
        app.probe_rx = Some(rx);
        app.environment.begin_probe(ProbeSelection::Both);

        tx.send(ProbeEvent::Detected(shared::environment::DetectionResult::not_found(
            Tool::MediaTool,
            "FFmpeg not found",
        )))
        .unwrap();
        tx.send(ProbeEvent::Finished).unwrap();
        app.poll_probe();

        assert!(!app.has_background_work());
        assert!(!app.environment.is_probing());
        assert!(app.dialogs.has_active());
    }

    #[test]
    fn test_dropped_probe_worker_unblocks_page() {
        let dir = TempDir::new().unwrap();
        let mut app = state(&dir);
        let (tx, rx) = channel::<ProbeEvent>();
        app.probe_rx = Some(rx);
        app.environment.begin_probe(ProbeSelection::Both);
        drop(tx);

        app.poll_probe();
        assert!(!app.environment.is_probing());
        assert!(app.probe_rx.is_none());
    }

    #[test]
    fn test_home_dialog_events_are_routed() {
        let dir = TempDir::new().unwrap();
        let mut app = state(&dir);
        app.home
            .perform(crate::pages::home::HomeAction::Delete, &mut app.dialogs);
        app.dialogs.step(0.0);
        let dialog = app.dialogs.active_mut().unwrap();
        assert!(dialog.click_label("Confirm", 0.0));
        app.dialogs.step(0.0);

        app.dispatch_dialog_events();
        assert!(app.dialogs.drain_events().is_empty());
        // Routed to Home, not mistaken for an Environment request
        assert!(!app.has_background_work());
    }

    #[test]
    fn test_spawn_guarded_reports_panic() {
        let (tx, rx) = channel();
        spawn_guarded(
            |_tx: Sender<DialogEvent>| panic!("boom"),
            tx,
            DialogEvent::Cancelled,
        );
        assert_eq!(
            rx.recv_timeout(std::time::Duration::from_secs(5)).unwrap(),
            DialogEvent::Cancelled
        );
    }
}
