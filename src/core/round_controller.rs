//! Round controller: derives device commands from settings and tracks the
//! local round countdown.

use crate::serial::PortSession;
use log::{debug, info};
use round_panel_core::protocol::{decode_ascii, settings_packets};
use round_panel_core::{ColorTable, Command, Connector, PanelError, Result, Settings};
use round_panel_types::{ModeSlot, RoundState, TickOutcome};

const NOT_CONNECTED: &str = "connect to a port first";

pub struct RoundController<C: Connector> {
    session: PortSession<C>,
    settings: Settings,
    colors: ColorTable,
    round: RoundState,
    active_mode: Option<String>,
}

impl<C: Connector> RoundController<C> {
    pub fn new(session: PortSession<C>, settings: Settings, colors: ColorTable) -> Self {
        Self {
            session,
            settings: settings.sanitized(),
            colors,
            round: RoundState::new(),
            active_mode: None,
        }
    }

    /// Send `r` and restart the local countdown.
    ///
    /// The countdown is only reset once the command has been written.
    pub fn start_round(&mut self) -> Result<()> {
        if !self.session.is_open() {
            return Err(PanelError::PreconditionFailed(NOT_CONNECTED));
        }

        self.session.send_command(Command::StartRound)?;
        self.round.start(self.settings.round_time_seconds);
        info!(
            "Round started ({}s)",
            self.settings.round_time_seconds
        );
        Ok(())
    }

    /// Advance the countdown by one tick
    pub fn on_tick(&mut self) -> TickOutcome {
        let outcome = self.round.tick();
        if outcome == TickOutcome::Finished {
            info!("Round finished");
        }
        outcome
    }

    /// Stop the countdown without waiting for it to run out
    pub fn stop_round(&mut self) {
        self.round.stop();
    }

    /// Send a mode character and remember its label
    pub fn send_mode(&mut self, code: char, label: &str) -> Result<()> {
        if !self.session.is_open() {
            return Err(PanelError::PreconditionFailed(NOT_CONNECTED));
        }

        self.session.send_command(Command::Mode(code))?;
        self.active_mode = Some(label.to_string());
        Ok(())
    }

    /// Send the configured code for `slot`
    pub fn send_mode_slot(&mut self, slot: ModeSlot) -> Result<()> {
        let code = self.settings.mode_code(slot);
        self.send_mode(code, slot.label())
    }

    /// Match an inbound chunk against the color table.
    ///
    /// Only the first match of an active round is recorded; the chunk is
    /// matched as a whole, so a token split across chunks or several tokens
    /// in one chunk do not match. Returns the captured color name.
    pub fn on_data_received(&mut self, bytes: &[u8]) -> Option<String> {
        if !self.round.accepts_color() {
            return None;
        }

        let text = decode_ascii(bytes);
        let token = text.trim();
        let name = self.colors.lookup(token)?.to_string();
        if self.round.capture_first_color(&name) {
            debug!("Captured first color {} from token {:?}", name, token);
            Some(name)
        } else {
            None
        }
    }

    /// Replace the settings and, when connected, push them to the device.
    ///
    /// Packets go out as lock time, round time, block-after-round. The first
    /// failed write is returned and the rest are skipped; packets already
    /// sent are not undone.
    pub fn apply_settings(&mut self, settings: Settings) -> Result<()> {
        self.settings = settings.sanitized();
        if !self.session.is_open() {
            return Ok(());
        }

        for packet in settings_packets(&self.settings) {
            self.session.send_bytes(&packet)?;
        }
        Ok(())
    }

    /// Stop the round and close the port
    pub fn shutdown(&mut self) {
        self.stop_round();
        self.session.disconnect();
    }

    pub fn session(&self) -> &PortSession<C> {
        &self.session
    }

    pub fn session_mut(&mut self) -> &mut PortSession<C> {
        &mut self.session
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn round(&self) -> &RoundState {
        &self.round
    }

    /// Label of the last mode sent, if any
    pub fn active_mode(&self) -> Option<&str> {
        self.active_mode.as_deref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crossbeam::channel::unbounded;
    use round_panel_core::sim::{SimulatedConnector, SimulatedDevice};
    use std::time::Duration;

    fn controller(settings: Settings) -> (RoundController<SimulatedConnector>, SimulatedDevice) {
        let device = SimulatedDevice::new();
        let connector = SimulatedConnector::new(device.clone(), &["SIM0"]);
        let (tx, _rx) = unbounded();
        let session = PortSession::new(connector, tx);
        (
            RoundController::new(session, settings, ColorTable::default()),
            device,
        )
    }

    fn connected(settings: Settings) -> (RoundController<SimulatedConnector>, SimulatedDevice) {
        let (mut controller, device) = controller(settings);
        controller.session_mut().connect("SIM0").unwrap();
        (controller, device)
    }

    fn round_of(seconds: u32) -> Settings {
        Settings {
            round_time_seconds: seconds,
            ..Settings::default()
        }
    }

    #[test]
    fn test_start_round_requires_connection() {
        let (mut controller, device) = controller(Settings::default());
        assert!(matches!(
            controller.start_round(),
            Err(PanelError::PreconditionFailed(_))
        ));
        assert!(!controller.round().is_active());
        assert!(device.written().is_empty());
    }

    #[test]
    fn test_start_round_sends_r_and_resets_timer() {
        let (mut controller, device) = connected(round_of(45));
        controller.start_round().unwrap();
        assert_eq!(device.written(), b"r".to_vec());
        assert!(controller.round().is_active());
        assert_eq!(controller.round().remaining(), Duration::from_secs(45));
    }

    #[test]
    fn test_round_ends_after_duration_minus_one_ticks() {
        for seconds in [2u32, 5, 60] {
            let (mut controller, _) = connected(round_of(seconds));
            controller.start_round().unwrap();

            for _ in 0..seconds - 2 {
                assert!(matches!(controller.on_tick(), TickOutcome::Running(_)));
            }
            assert_eq!(controller.on_tick(), TickOutcome::Finished);
            assert!(!controller.round().is_active());
            assert_eq!(controller.round().remaining(), Duration::ZERO);
            assert_eq!(controller.on_tick(), TickOutcome::Idle);
        }
    }

    #[test]
    fn test_only_first_color_is_captured() {
        let (mut controller, _) = connected(Settings::default());
        assert_eq!(controller.on_data_received(b"01"), None);

        controller.start_round().unwrap();
        assert_eq!(controller.on_data_received(b"99"), None);
        assert_eq!(controller.on_data_received(b" 21\r\n"), Some("Red".to_string()));
        assert_eq!(controller.on_data_received(b"11"), None);
        assert_eq!(controller.round().first_color(), Some("Red"));

        controller.start_round().unwrap();
        assert!(!controller.round().first_color_captured());
        assert_eq!(controller.on_data_received(b"11"), Some("Green".to_string()));
    }

    #[test]
    fn test_split_and_merged_tokens_do_not_match() {
        let (mut controller, _) = connected(Settings::default());
        controller.start_round().unwrap();
        assert_eq!(controller.on_data_received(b"0"), None);
        assert_eq!(controller.on_data_received(b"1"), None);
        assert_eq!(controller.on_data_received(b"0111"), None);
        assert!(!controller.round().first_color_captured());
    }

    #[test]
    fn test_colors_ignored_after_round_finishes() {
        let (mut controller, _) = connected(round_of(2));
        controller.start_round().unwrap();
        assert_eq!(controller.on_tick(), TickOutcome::Finished);
        assert_eq!(controller.on_data_received(b"01"), None);
    }

    #[test]
    fn test_send_mode() {
        let (mut controller, device) = controller(Settings::default());
        assert!(matches!(
            controller.send_mode_slot(ModeSlot::A),
            Err(PanelError::PreconditionFailed(_))
        ));
        assert_eq!(controller.active_mode(), None);

        controller.session_mut().connect("SIM0").unwrap();
        controller.send_mode_slot(ModeSlot::A).unwrap();
        controller.send_mode_slot(ModeSlot::B).unwrap();
        assert_eq!(device.written(), b"bp".to_vec());
        assert_eq!(controller.active_mode(), Some("B"));
    }

    #[test]
    fn test_apply_settings_pushes_three_packets() {
        let (mut controller, device) = connected(Settings::default());
        let settings = Settings {
            round_time_seconds: 45,
            lock_time_seconds: 3,
            block_after_round: true,
            ..Settings::default()
        };
        controller.apply_settings(settings.clone()).unwrap();
        assert_eq!(
            device.written(),
            vec![b's', 1, 3, b's', 2, 45, b's', 3, 1]
        );
        assert_eq!(controller.settings(), &settings);
    }

    #[test]
    fn test_apply_settings_while_disconnected_only_stores() {
        let (mut controller, device) = controller(Settings::default());
        controller.apply_settings(round_of(30)).unwrap();
        assert_eq!(controller.settings().round_time_seconds, 30);
        assert!(device.written().is_empty());
    }

    #[test]
    fn test_apply_settings_partial_failure_is_not_rolled_back() {
        let (mut controller, device) = connected(Settings::default());
        device.fail_writes_after(1);

        let result = controller.apply_settings(round_of(30));
        assert!(matches!(result, Err(PanelError::Io(_))));
        assert_eq!(device.written(), vec![b's', 1, 6]);
        assert_eq!(controller.settings().round_time_seconds, 30);
    }

    #[test]
    fn test_stop_round_ignores_ticks_and_colors() {
        let (mut controller, _device) = connected(Settings::default());
        controller.start_round().unwrap();
        controller.stop_round();
        assert_eq!(controller.on_tick(), TickOutcome::Idle);
        assert_eq!(controller.on_data_received(b"01"), None);
        assert!(controller.session().is_open());
    }

    #[test]
    fn test_shutdown_stops_round_and_port() {
        let (mut controller, device) = connected(Settings::default());
        controller.start_round().unwrap();
        controller.shutdown();
        assert!(!controller.round().is_active());
        assert!(!controller.session().is_open());
        assert_eq!(device.close_count(), 1);
    }
}
