//! RGB panel bring-up
//!
//! Two-phase bring-up driven entirely by [`PanelProfile`] data: a command
//! channel configures the controller chip, then the continuous RGB video
//! timing engine takes over pixel delivery. One code path serves every
//! panel variant; what differs between boards is the profile, not the
//! code.
//!
//! Every intermediate resource (command link, engine surface) has an
//! explicit release on every failure path, and no step is retried: the
//! first hardware failure is terminal for the bring-up attempt.

pub mod linked;

pub use linked::LinkedPanel;

use embedded_hal::delay::DelayNs;
use log::{error, info, warn};
use vivarium_core::config::panel::PanelProfile;
use vivarium_core::traits::panel::{CommandLink, PanelBackend, RgbPanel};
use vivarium_core::Error;

/// A live panel produced by [`bring_up`]
///
/// Profiles that need runtime sleep/wake commands keep their command link
/// for the panel's lifetime ([`Panel::Linked`]); the rest release it once
/// the init table has played ([`Panel::Direct`]).
pub enum Panel<B: PanelBackend> {
    Direct(B::Surface),
    Linked(LinkedPanel<B::Surface, B::Link>),
}

impl<B: PanelBackend> RgbPanel for Panel<B> {
    fn reset(&mut self) -> Result<(), Error> {
        match self {
            Panel::Direct(s) => s.reset(),
            Panel::Linked(l) => l.reset(),
        }
    }

    fn init(&mut self) -> Result<(), Error> {
        match self {
            Panel::Direct(s) => s.init(),
            Panel::Linked(l) => l.init(),
        }
    }

    fn draw_region(
        &mut self,
        x1: u16,
        y1: u16,
        x2: u16,
        y2: u16,
        pixels: &[u8],
    ) -> Result<(), Error> {
        match self {
            Panel::Direct(s) => s.draw_region(x1, y1, x2, y2, pixels),
            Panel::Linked(l) => l.draw_region(x1, y1, x2, y2, pixels),
        }
    }

    fn set_power(&mut self, on: bool) -> Result<(), Error> {
        match self {
            Panel::Direct(s) => s.set_power(on),
            Panel::Linked(l) => l.set_power(on),
        }
    }

    fn set_sleep(&mut self, sleep: bool) -> Result<(), Error> {
        match self {
            Panel::Direct(s) => s.set_sleep(sleep),
            Panel::Linked(l) => l.set_sleep(sleep),
        }
    }

    fn delete(self) -> Result<(), Error> {
        match self {
            Panel::Direct(s) => s.delete(),
            Panel::Linked(l) => l.delete(),
        }
    }
}

/// Bring a panel up according to its profile
///
/// Sequence: open the command link, verify controller identity when the
/// profile asks for it, play the init command table (D/C discipline lives
/// inside the link), create the RGB engine surface, release or retain the
/// link, then reset / init / power-on in that fixed order. A failure at
/// any step releases everything acquired so far and reports the first
/// error; the caller never has to clean up after a failed bring-up.
pub fn bring_up<B, D>(
    backend: &mut B,
    profile: &PanelProfile,
    delay: &mut D,
) -> Result<Panel<B>, Error>
where
    B: PanelBackend,
    D: DelayNs,
{
    let mut link = backend.open_link(&profile.link)?;

    if let Some(chk) = profile.id_check {
        let mut id = [0u8; 3];
        if let Err(e) = link.read_command(chk.opcode, &mut id) {
            error!("{}: ID readback failed", profile.name);
            link.release();
            return Err(e);
        }
        let absent = id.iter().all(|&b| b == 0);
        let mismatch = !chk.expected.is_empty() && !id.starts_with(chk.expected);
        if absent || mismatch {
            error!("{}: unexpected panel ID {:02x?}", profile.name, id);
            link.release();
            return Err(Error::UnexpectedPanelId);
        }
    }

    for cmd in profile.init_cmds {
        if let Err(e) = link.write_command(cmd.opcode, cmd.params) {
            error!("{}: command 0x{:02X} failed", profile.name, cmd.opcode);
            link.release();
            return Err(e);
        }
        if cmd.delay_ms > 0 {
            delay.delay_ms(u32::from(cmd.delay_ms));
        }
    }

    let surface = match backend.create_surface(&profile.video) {
        Ok(s) => s,
        Err(e) => {
            error!("{}: video engine creation failed", profile.name);
            link.release();
            return Err(e);
        }
    };

    let mut panel = if profile.retain_link {
        Panel::Linked(LinkedPanel::new(surface, link))
    } else {
        link.release();
        Panel::Direct(surface)
    };

    if let Err(e) = start_surface(&mut panel) {
        error!("{}: startup sequence failed", profile.name);
        if panel.delete().is_err() {
            warn!("{}: panel delete failed during rollback", profile.name);
        }
        return Err(e);
    }

    info!(
        "{}: panel running ({}x{} @ {} Hz)",
        profile.name, profile.video.h_res, profile.video.v_res, profile.video.pclk_hz
    );
    Ok(panel)
}

/// Reset, initialize, power on - in that fixed order
fn start_surface<P: RgbPanel>(panel: &mut P) -> Result<(), Error> {
    panel.reset()?;
    panel.init()?;
    panel.set_power(true)
}

#[cfg(test)]
mod tests {
    use super::*;
    use core::cell::RefCell;
    use heapless::Vec;
    use vivarium_core::config::panel::{ST7262_7IN, ST7701_7IN};
    use vivarium_core::config::panel::{LinkConfig, VideoConfig};

    #[derive(Default)]
    struct BackendLog {
        link_writes: Vec<u8, 64>,
        link_released: bool,
        surface_ops: Vec<&'static str, 16>,
        surface_deleted: bool,
    }

    type Shared = RefCell<BackendLog>;

    struct MockLink<'l> {
        log: &'l Shared,
        fail_write_at: Option<usize>,
        id: [u8; 3],
        writes: usize,
    }

    impl<'l> CommandLink for MockLink<'l> {
        fn write_command(&mut self, opcode: u8, _params: &[u8]) -> Result<(), Error> {
            if self.fail_write_at == Some(self.writes) {
                return Err(Error::Io);
            }
            self.writes += 1;
            self.log.borrow_mut().link_writes.push(opcode).unwrap();
            Ok(())
        }

        fn read_command(&mut self, _opcode: u8, buf: &mut [u8]) -> Result<(), Error> {
            buf.copy_from_slice(&self.id[..buf.len()]);
            Ok(())
        }

        fn release(self) {
            self.log.borrow_mut().link_released = true;
        }
    }

    struct MockSurface<'l> {
        log: &'l Shared,
        fail_op: Option<&'static str>,
    }

    impl<'l> MockSurface<'l> {
        fn op(&mut self, name: &'static str) -> Result<(), Error> {
            if self.fail_op == Some(name) {
                return Err(Error::Io);
            }
            self.log.borrow_mut().surface_ops.push(name).unwrap();
            Ok(())
        }
    }

    impl<'l> RgbPanel for MockSurface<'l> {
        fn reset(&mut self) -> Result<(), Error> {
            self.op("reset")
        }

        fn init(&mut self) -> Result<(), Error> {
            self.op("init")
        }

        fn draw_region(
            &mut self,
            _x1: u16,
            _y1: u16,
            _x2: u16,
            _y2: u16,
            _pixels: &[u8],
        ) -> Result<(), Error> {
            self.op("draw")
        }

        fn set_power(&mut self, on: bool) -> Result<(), Error> {
            self.op(if on { "power_on" } else { "power_off" })
        }

        fn set_sleep(&mut self, sleep: bool) -> Result<(), Error> {
            self.op(if sleep { "sleep_in" } else { "sleep_out" })
        }

        fn delete(self) -> Result<(), Error> {
            let mut log = self.log.borrow_mut();
            log.surface_deleted = true;
            log.surface_ops.push("delete").unwrap();
            Ok(())
        }
    }

    struct MockBackend<'l> {
        log: &'l Shared,
        fail_open_link: bool,
        fail_create_surface: bool,
        link_fail_write_at: Option<usize>,
        link_id: [u8; 3],
        surface_fail_op: Option<&'static str>,
    }

    impl<'l> MockBackend<'l> {
        fn new(log: &'l Shared) -> Self {
            Self {
                log,
                fail_open_link: false,
                fail_create_surface: false,
                link_fail_write_at: None,
                link_id: [0x54, 0x70, 0x01],
                surface_fail_op: None,
            }
        }
    }

    impl<'l> PanelBackend for MockBackend<'l> {
        type Link = MockLink<'l>;
        type Surface = MockSurface<'l>;

        fn open_link(&mut self, _cfg: &LinkConfig) -> Result<Self::Link, Error> {
            if self.fail_open_link {
                return Err(Error::Io);
            }
            Ok(MockLink {
                log: self.log,
                fail_write_at: self.link_fail_write_at,
                id: self.link_id,
                writes: 0,
            })
        }

        fn create_surface(&mut self, _video: &VideoConfig) -> Result<Self::Surface, Error> {
            if self.fail_create_surface {
                return Err(Error::Io);
            }
            Ok(MockSurface {
                log: self.log,
                fail_op: self.surface_fail_op,
            })
        }
    }

    struct MockDelay {
        total_ms: u32,
    }

    impl DelayNs for MockDelay {
        fn delay_ns(&mut self, ns: u32) {
            self.total_ms += ns / 1_000_000;
        }
    }

    fn delay() -> MockDelay {
        MockDelay { total_ms: 0 }
    }

    #[test]
    fn direct_profile_releases_the_link_before_startup() {
        let log = Shared::default();
        let mut backend = MockBackend::new(&log);
        let mut d = delay();

        let panel = bring_up(&mut backend, &ST7262_7IN, &mut d).unwrap();
        assert!(matches!(panel, Panel::Direct(_)));

        let state = log.borrow();
        assert!(state.link_released);
        assert_eq!(
            state.link_writes.as_slice(),
            &[0x11, 0x3A, 0x36, 0x29] // sleep-out, COLMOD, MADCTL, display-on
        );
        assert_eq!(
            state.surface_ops.as_slice(),
            &["reset", "init", "power_on"]
        );
        drop(state);
        // Post-command settle delays were honored (120 + 20 ms)
        assert_eq!(d.total_ms, 140);
    }

    #[test]
    fn retaining_profile_keeps_the_link_for_sleep_commands() {
        let log = Shared::default();
        let mut backend = MockBackend::new(&log);
        let mut d = delay();

        let mut panel = bring_up(&mut backend, &ST7701_7IN, &mut d).unwrap();
        assert!(matches!(panel, Panel::Linked(_)));
        assert!(!log.borrow().link_released);

        log.borrow_mut().link_writes.clear();

        // Sleep gating sends the command first, then delegates
        panel.set_sleep(true).unwrap();
        panel.set_sleep(false).unwrap();
        panel.set_power(false).unwrap();
        {
            let state = log.borrow();
            assert_eq!(state.link_writes.as_slice(), &[0x10, 0x11, 0x28]);
            assert_eq!(
                &state.surface_ops[state.surface_ops.len() - 3..],
                &["sleep_in", "sleep_out", "power_off"]
            );
        }

        // Delete releases the retained link, then the base panel
        panel.delete().unwrap();
        let state = log.borrow();
        assert!(state.link_released);
        assert!(state.surface_deleted);
    }

    #[test]
    fn open_link_failure_acquires_nothing() {
        let log = Shared::default();
        let mut backend = MockBackend::new(&log);
        backend.fail_open_link = true;

        assert!(bring_up(&mut backend, &ST7262_7IN, &mut delay()).is_err());
        let state = log.borrow();
        assert!(state.surface_ops.is_empty());
        assert!(!state.link_released);
    }

    #[test]
    fn command_failure_releases_the_link() {
        let log = Shared::default();
        let mut backend = MockBackend::new(&log);
        backend.link_fail_write_at = Some(2);

        assert_eq!(
            bring_up(&mut backend, &ST7262_7IN, &mut delay()),
            Err(Error::Io)
        );
        let state = log.borrow();
        assert!(state.link_released);
        assert!(state.surface_ops.is_empty());
        assert!(!state.surface_deleted);
    }

    #[test]
    fn engine_failure_rolls_back_the_command_channel() {
        let log = Shared::default();
        let mut backend = MockBackend::new(&log);
        backend.fail_create_surface = true;

        assert!(bring_up(&mut backend, &ST7262_7IN, &mut delay()).is_err());
        assert!(log.borrow().link_released);
    }

    #[test]
    fn startup_failure_deletes_the_panel() {
        let log = Shared::default();
        let mut backend = MockBackend::new(&log);
        backend.surface_fail_op = Some("init");

        assert_eq!(
            bring_up(&mut backend, &ST7701_7IN, &mut delay()),
            Err(Error::Io)
        );
        let state = log.borrow();
        assert!(state.surface_deleted);
        // The retained link is released through the decorator's delete
        assert!(state.link_released);
    }

    #[test]
    fn all_zero_id_is_rejected() {
        let log = Shared::default();
        let mut backend = MockBackend::new(&log);
        backend.link_id = [0, 0, 0];

        assert_eq!(
            bring_up(&mut backend, &ST7701_7IN, &mut delay()),
            Err(Error::UnexpectedPanelId)
        );
        let state = log.borrow();
        assert!(state.link_released);
        assert!(state.link_writes.is_empty());
    }
}
