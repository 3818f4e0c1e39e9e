//! Console application: turns user commands and port events into controller
//! calls and activity-log lines.

use super::activity_log::ActivityLog;
use super::console::{apply_edits, ConsoleCommand, HELP_TEXT};
use crate::config::SettingsStore;
use crate::core::RoundController;
use crossbeam::channel::{never, tick, Receiver};
use log::{debug, warn};
use round_panel_core::protocol::{decode_ascii, encode_ascii, hex_dump};
use round_panel_core::{Connector, LineSettings, PanelError, PortEvent};
use round_panel_types::{ModeSlot, TickOutcome, TICK_INTERVAL};
use std::ops::ControlFlow;
use std::time::Instant;

const ABOUT_TEXT: &str =
    "round-panel: serial control panel for game rounds (start rounds, switch modes, capture colors).";

pub struct App<C: Connector> {
    controller: RoundController<C>,
    store: SettingsStore,
    line: LineSettings,
    log: ActivityLog,
    selected_port: Option<String>,
    ticker: Option<Receiver<Instant>>,
}

impl<C: Connector> App<C> {
    pub fn new(
        controller: RoundController<C>,
        store: SettingsStore,
        line: LineSettings,
        log: ActivityLog,
    ) -> Self {
        Self {
            controller,
            store,
            line,
            log,
            selected_port: None,
            ticker: None,
        }
    }

    /// Parse and run one console line
    pub fn handle_line(&mut self, line: &str) -> ControlFlow<()> {
        match ConsoleCommand::parse(line) {
            Ok(command) => self.execute(command),
            Err(message) => {
                self.log.notice(message);
                ControlFlow::Continue(())
            }
        }
    }

    pub fn execute(&mut self, command: ConsoleCommand) -> ControlFlow<()> {
        match command {
            ConsoleCommand::Empty => {}
            ConsoleCommand::Ports => self.refresh_ports(),
            ConsoleCommand::Connect(port) => self.connect(port),
            ConsoleCommand::Disconnect => self.disconnect(),
            ConsoleCommand::Start => self.start_round(),
            ConsoleCommand::Mode(slot) => self.send_mode(slot),
            ConsoleCommand::Simulate(token) => {
                self.handle_port_event(PortEvent::Data(encode_ascii(&token)))
            }
            ConsoleCommand::ShowSettings => {
                let summary = self.controller.settings().summary();
                self.log.notice(format!("Settings: {}", summary));
                self.log.notice(format!("Stored at {}", self.store.path().display()));
            }
            ConsoleCommand::Save(edits) => self.save_settings(&edits),
            ConsoleCommand::Status => self.log.notice(self.status_text()),
            ConsoleCommand::Log => self.log.replay(),
            ConsoleCommand::Clear => self.log.clear(),
            ConsoleCommand::About => self.log.notice(ABOUT_TEXT),
            ConsoleCommand::Help => self.log.notice(HELP_TEXT),
            ConsoleCommand::Quit => return ControlFlow::Break(()),
        }
        ControlFlow::Continue(())
    }

    /// List ports and select the first one
    pub fn refresh_ports(&mut self) {
        let ports = self.controller.session().list_available_ports();
        self.selected_port = ports.first().cloned();
        if ports.is_empty() {
            self.log.notice("No serial ports found");
        } else {
            self.log.notice(format!("Ports: {}", ports.join(", ")));
        }
    }

    pub fn connect(&mut self, port: Option<String>) {
        let Some(port_name) = port.or_else(|| self.selected_port.clone()) else {
            self.log.notice("Select a serial port first (see `ports`)");
            return;
        };

        match self
            .controller
            .session_mut()
            .connect_with(&port_name, self.line)
        {
            Ok(()) => {
                self.selected_port = Some(port_name.clone());
                self.log.append(format!("-> Opened port {}", port_name));
            }
            Err(e) => self.log.append(format!("! Failed to connect: {}", e)),
        }
    }

    pub fn disconnect(&mut self) {
        self.controller.session_mut().disconnect();
        self.log.append("-> Port closed");
    }

    pub fn start_round(&mut self) {
        match self.controller.start_round() {
            Ok(()) => {
                self.log.append("-> Command: r (start round)");
                self.ticker = Some(tick(TICK_INTERVAL));
                self.log.show_timer(&self.controller.round().display_string());
            }
            Err(PanelError::PreconditionFailed(_)) => self.log.notice("Connect to a port first"),
            Err(e) => self.log.append(format!("! Failed to send command r: {}", e)),
        }
    }

    pub fn send_mode(&mut self, slot: ModeSlot) {
        let code = self.controller.settings().mode_code(slot);
        match self.controller.send_mode_slot(slot) {
            Ok(()) => self.log.append(format!(
                "-> Mode command: '{}' (Mode {})",
                code,
                slot.label()
            )),
            Err(PanelError::PreconditionFailed(_)) => self.log.notice("Connect to a port first"),
            Err(e) => self.log.append(format!(
                "! Failed to send mode {}: {}",
                slot.label(),
                e
            )),
        }
    }

    /// Edit, persist, then push settings to the device when connected
    pub fn save_settings(&mut self, edits: &[(String, String)]) {
        let settings = match apply_edits(self.controller.settings(), edits) {
            Ok(settings) => settings,
            Err(message) => {
                self.log.notice(format!("Check the entered values: {}", message));
                return;
            }
        };

        if let Err(e) = self.store.save(&settings) {
            warn!("Failed to save settings: {:#}", e);
        }

        let connected = self.controller.session().is_open();
        let result = self.controller.apply_settings(settings);
        self.log.append(format!(
            "Settings updated: {}",
            self.controller.settings().summary()
        ));
        if connected {
            match result {
                Ok(()) => self.log.append("-> Settings sent (s + index + value)"),
                Err(e) => self.log.append(format!("! Failed to send settings: {}", e)),
            }
        }
    }

    pub fn handle_port_event(&mut self, event: PortEvent) {
        match event {
            PortEvent::Data(bytes) => {
                let text = decode_ascii(&bytes);
                self.log.append(format!(
                    "<- Received: {} ({})",
                    text.trim(),
                    hex_dump(&bytes)
                ));
                if let Some(color) = self.controller.on_data_received(&bytes) {
                    self.log.append(format!("First color captured: {}", color));
                }
            }
            PortEvent::Message(text) => debug!("Message: {:?}", text),
            PortEvent::Error(message) => self.log.append(format!("! Error: {}", message)),
            PortEvent::Closed => {
                let port = self.controller.session().port_name().map(str::to_string);
                if self.controller.session_mut().on_reader_closed() {
                    self.log.append(format!(
                        "! Port {} closed after an I/O error",
                        port.unwrap_or_default()
                    ));
                }
            }
        }
    }

    pub fn on_tick(&mut self) {
        match self.controller.on_tick() {
            TickOutcome::Idle => self.ticker = None,
            TickOutcome::Running(_) => {
                self.log.show_timer(&self.controller.round().display_string())
            }
            TickOutcome::Finished => {
                self.ticker = None;
                self.log.show_timer(&self.controller.round().display_string());
                self.log.append("Round finished");
            }
        }
    }

    /// Tick source for the foreground loop; never fires while no round runs
    pub fn ticker(&self) -> Receiver<Instant> {
        self.ticker.clone().unwrap_or_else(never)
    }

    pub fn status_text(&self) -> String {
        let connection = match self.controller.session().port_name() {
            Some(port) => format!("Connected ({})", port),
            None => "Disconnected".to_string(),
        };
        let round = self.controller.round();
        format!(
            "{} | Timer {} | First color: {} | Mode: {}",
            connection,
            round.display_string(),
            round.first_color().unwrap_or("-"),
            self.controller
                .active_mode()
                .map(|m| format!("Mode {}", m))
                .unwrap_or_else(|| "-".to_string())
        )
    }

    /// Stop the round and close the port
    pub fn shutdown(&mut self) {
        self.ticker = None;
        self.controller.shutdown();
    }

    pub fn controller(&self) -> &RoundController<C> {
        &self.controller
    }

    pub fn log(&self) -> &ActivityLog {
        &self.log
    }

    pub fn selected_port(&self) -> Option<&str> {
        self.selected_port.as_deref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::serial::PortSession;
    use crossbeam::channel::unbounded;
    use round_panel_core::sim::{SimulatedConnector, SimulatedDevice};
    use round_panel_core::{ColorTable, Settings};
    use std::path::PathBuf;

    struct Fixture {
        app: App<SimulatedConnector>,
        device: SimulatedDevice,
        settings_path: PathBuf,
    }

    impl Drop for Fixture {
        fn drop(&mut self) {
            if let Some(dir) = self.settings_path.parent() {
                let _ = std::fs::remove_dir_all(dir);
            }
        }
    }

    fn fixture(name: &str) -> Fixture {
        let device = SimulatedDevice::new();
        let connector = SimulatedConnector::new(device.clone(), &["SIM0", "SIM1"]);
        let (tx, _rx) = unbounded();
        let controller = RoundController::new(
            PortSession::new(connector, tx),
            Settings::default(),
            ColorTable::default(),
        );
        let settings_path = std::env::temp_dir()
            .join(format!("round-panel-app-{}-{}", std::process::id(), name))
            .join("settings.json");
        let app = App::new(
            controller,
            SettingsStore::at(&settings_path),
            LineSettings::default(),
            ActivityLog::new(false),
        );
        Fixture {
            app,
            device,
            settings_path,
        }
    }

    fn last_line(app: &App<SimulatedConnector>) -> String {
        app.log().lines().last().unwrap_or_default().to_string()
    }

    #[test]
    fn test_ports_selects_first_and_connect_uses_it() {
        let mut f = fixture("ports");
        f.app.handle_line("connect");
        assert!(!f.app.controller().session().is_open());

        f.app.handle_line("ports");
        assert_eq!(f.app.selected_port(), Some("SIM0"));
        f.app.handle_line("connect");
        assert_eq!(f.app.controller().session().port_name(), Some("SIM0"));
        assert!(last_line(&f.app).ends_with("-> Opened port SIM0"));
        assert!(f.app.status_text().starts_with("Connected (SIM0)"));
    }

    #[test]
    fn test_failed_connect_is_logged() {
        let mut f = fixture("failed-connect");
        f.app.handle_line("connect COM42");
        assert!(last_line(&f.app).contains("! Failed to connect"));
        assert!(f.app.status_text().starts_with("Disconnected"));
    }

    #[test]
    fn test_round_flow() {
        let mut f = fixture("round");
        f.app.handle_line("start");
        assert!(f.app.log().is_empty());

        f.app.handle_line("connect SIM0");
        f.app.handle_line("start");
        assert_eq!(f.device.written(), b"r".to_vec());
        assert!(last_line(&f.app).ends_with("-> Command: r (start round)"));

        f.app.handle_line("simulate 11");
        assert!(last_line(&f.app).ends_with("First color captured: Green"));
        f.app.handle_line("simulate 21");
        assert!(last_line(&f.app).ends_with("<- Received: 21 (32-31)"));
        assert!(f.app.status_text().contains("First color: Green"));

        for _ in 0..59 {
            f.app.on_tick();
        }
        assert!(last_line(&f.app).ends_with("Round finished"));
        assert!(f.app.status_text().contains("Timer 00:00"));
    }

    #[test]
    fn test_mode_commands() {
        let mut f = fixture("modes");
        f.app.handle_line("connect SIM1");
        f.app.handle_line("b");
        assert_eq!(f.device.written(), b"p".to_vec());
        assert!(last_line(&f.app).ends_with("-> Mode command: 'p' (Mode B)"));
        assert!(f.app.status_text().ends_with("Mode: Mode B"));
    }

    #[test]
    fn test_save_persists_and_pushes_settings() {
        let mut f = fixture("save");
        f.app.handle_line("connect SIM0");
        f.app.handle_line("save round=45 lock=3 block=off a=x");

        assert_eq!(
            f.device.written(),
            vec![b's', 1, 3, b's', 2, 45, b's', 3, 0]
        );
        assert!(last_line(&f.app).ends_with("-> Settings sent (s + index + value)"));

        let stored = SettingsStore::at(&f.settings_path).load_or_default();
        assert_eq!(stored.round_time_seconds, 45);
        assert_eq!(stored.mode_a_code, 'x');
        assert_eq!(f.app.controller().settings(), &stored);
    }

    #[test]
    fn test_invalid_save_changes_nothing() {
        let mut f = fixture("invalid-save");
        f.app.handle_line("save volume=11");
        assert!(!f.settings_path.exists());
        assert_eq!(f.app.controller().settings(), &Settings::default());
    }

    #[test]
    fn test_port_errors_are_logged() {
        let mut f = fixture("errors");
        f.app.handle_port_event(PortEvent::Error("framing error".to_string()));
        assert!(last_line(&f.app).ends_with("! Error: framing error"));

        // A Closed with no failed connection behind it is ignored
        f.app.handle_line("connect SIM0");
        f.app.handle_port_event(PortEvent::Closed);
        assert!(f.app.controller().session().is_open());
    }

    #[test]
    fn test_quit_and_clear() {
        let mut f = fixture("quit");
        f.app.handle_line("connect SIM0");
        assert!(!f.app.log().is_empty());
        f.app.handle_line("clear");
        assert!(f.app.log().is_empty());
        assert!(f.app.handle_line("quit").is_break());

        f.app.shutdown();
        assert!(!f.app.controller().session().is_open());
    }
}
