//! GT911 capacitive touch controller driver
//!
//! Register-level I2C driver with interrupt-driven or polled event
//! detection. The interrupt handler only raises an [`EventFlag`]; all bus
//! traffic happens at poll time, and a poll with no pending event touches
//! the bus not at all.
//!
//! Multi-touch points read in one burst are drained one per poll through
//! the toolkit's "more data" signalling, so no point is lost between
//! polls.

use embedded_hal::delay::DelayNs;
use heapless::Vec;
use log::{debug, error, info, warn};
use vivarium_core::config::touch::{TouchConfig, MAX_TOUCH_POINTS};
use vivarium_core::traits::ui::{InputRead, InputState, Point};
use vivarium_core::{Error, EventFlag};
use vivarium_hal::gpio::FlexPin;
use vivarium_hal::i2c::{BusError, I2cBus};
use vivarium_hal::irq::{IrqError, IrqService};

/// GT911 register addresses (16-bit, big-endian on the wire)
pub mod reg {
    /// Buffer status: bit7 = data ready, bits[3:0] = point count
    pub const STATUS: u16 = 0x814E;
    /// Product ID, 4 ASCII bytes beginning with "911"
    pub const ID: u16 = 0x8140;
    /// First 8-byte point record
    pub const POINT1: u16 = 0x814F;
}

const TIMEOUT_MS: u32 = 100;
/// Reset assert and post-release settle times
const RESET_PULSE_MS: u32 = 10;
const RESET_SETTLE_MS: u32 = 100;
/// Wake settle before the INT line is released back to input
const ENABLE_SETTLE_MS: u32 = 50;

/// One decoded touch contact
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct TouchPoint {
    pub x: u16,
    pub y: u16,
    pub size: u16,
    pub track_id: u8,
}

/// Interrupt service stand-in for polled operation
pub struct NoInterrupt;

impl IrqService for NoInterrupt {
    fn install_service(&mut self) -> Result<bool, IrqError> {
        Ok(false)
    }

    fn attach_handler(&mut self) -> Result<(), IrqError> {
        Ok(())
    }

    fn detach_handler(&mut self) {}

    fn uninstall_service(&mut self) {}
}

/// GT911 driver
///
/// `RST` and `INT` are the controller's reset and interrupt lines; both
/// must be direction-switchable because the enable/disable sequencing
/// drives them and the init rollback parks them as pulled-up inputs.
pub struct Gt911<'a, RST, INT, IRQ>
where
    RST: FlexPin,
    INT: FlexPin,
    IRQ: IrqService,
{
    cfg: TouchConfig,
    rst: RST,
    int: INT,
    irq: Option<(IRQ, &'a EventFlag)>,
    service_installed_here: bool,
    handler_attached: bool,
    device_attached: bool,
    initialized: bool,
    enabled: bool,
    points: Vec<TouchPoint, MAX_TOUCH_POINTS>,
    point_index: usize,
    last_point: Point,
}

impl<RST, INT> Gt911<'static, RST, INT, NoInterrupt>
where
    RST: FlexPin,
    INT: FlexPin,
{
    /// Driver in polled mode: every poll reads the status register
    pub fn polled(cfg: TouchConfig, rst: RST, int: INT) -> Self {
        Self::with_irq(cfg, rst, int, None)
    }
}

impl<'a, RST, INT, IRQ> Gt911<'a, RST, INT, IRQ>
where
    RST: FlexPin,
    INT: FlexPin,
    IRQ: IrqService,
{
    /// Driver in interrupt mode: polls are backpressured by the flag the
    /// edge handler raises
    pub fn interrupt_driven(cfg: TouchConfig, rst: RST, int: INT, irq: IRQ, flag: &'a EventFlag) -> Self {
        Self::with_irq(cfg, rst, int, Some((irq, flag)))
    }

    fn with_irq(cfg: TouchConfig, rst: RST, int: INT, irq: Option<(IRQ, &'a EventFlag)>) -> Self {
        Self {
            cfg,
            rst,
            int,
            irq,
            service_installed_here: false,
            handler_attached: false,
            device_attached: false,
            initialized: false,
            enabled: false,
            points: Vec::new(),
            point_index: 0,
            last_point: Point::default(),
        }
    }

    /// Bring the controller up
    ///
    /// Configures the control lines, hooks up the interrupt service when
    /// present, attaches the bus device, pulses reset, and validates the
    /// product ID. Any failure after partial setup runs the fixed-order
    /// rollback, leaving the hardware quiescent.
    pub fn init<B: I2cBus, D: DelayNs>(&mut self, bus: &mut B, delay: &mut D) -> Result<(), Error> {
        if self.initialized {
            warn!("touch driver already initialized");
            return Ok(());
        }

        self.rst.set_output();
        self.rst.set_low();
        self.int.set_input_pullup();

        if self.irq.is_some() {
            if let Err(e) = self.hook_interrupt() {
                self.rollback(bus);
                return Err(e);
            }
        }

        if let Err(e) = bus.attach(self.cfg.address, self.cfg.speed_hz) {
            error!("failed to attach touch device: {:?}", e);
            self.rollback(bus);
            return Err(e.into());
        }
        self.device_attached = true;

        // Reset pulse: assert low, release, let the controller boot
        self.rst.set_low();
        delay.delay_ms(RESET_PULSE_MS);
        self.rst.set_high();
        delay.delay_ms(RESET_SETTLE_MS);

        let mut id = [0u8; 4];
        if let Err(e) = self.read_reg(bus, reg::ID, &mut id) {
            error!("ID register read failed: {:?}", e);
            self.rollback(bus);
            return Err(e.into());
        }
        if &id[..3] != b"911" {
            error!("unexpected controller ID {:02x?}", id);
            self.rollback(bus);
            return Err(Error::NotFound);
        }

        info!("GT911 online ({}x{} native)", self.cfg.native_width, self.cfg.native_height);
        self.initialized = true;
        self.enabled = true;
        Ok(())
    }

    /// Input-read callback body for the toolkit, expected every 1-10 ms
    ///
    /// With no pending event this reports released immediately and
    /// generates zero bus traffic. A burst of N points is delivered
    /// across N consecutive calls, `more_data` signalling all but the
    /// last; released reports hold the last known coordinates.
    pub fn poll<B: I2cBus>(&mut self, bus: &mut B, data: &mut InputRead) {
        if self.initialized && self.point_index >= self.points.len() {
            self.refill(bus);
        }

        if self.point_index < self.points.len() {
            let p = self.points[self.point_index];
            self.point_index += 1;
            self.last_point = Point { x: p.x, y: p.y };
            data.state = InputState::Pressed;
            data.point = self.last_point;
            data.more_data = self.point_index < self.points.len();
        } else {
            data.state = InputState::Released;
            data.point = self.last_point;
            data.more_data = false;
            self.points.clear();
            self.point_index = 0;
        }
    }

    /// Power-gate the controller through its RST and INT lines
    ///
    /// Enabling drives INT low first so no spurious edge fires while
    /// reset is released; after the settle delay INT returns to input so
    /// interrupts can resume. Disabling holds the controller in reset
    /// with INT forced low.
    pub fn set_enable<D: DelayNs>(&mut self, delay: &mut D, enable: bool) {
        if !self.initialized {
            return;
        }
        if enable {
            info!("touch enabled");
            self.int.set_output();
            self.int.set_low();
            self.rst.set_high();
            delay.delay_ms(ENABLE_SETTLE_MS);
            self.int.set_input_pullup();
        } else {
            info!("touch disabled");
            self.int.set_output();
            self.int.set_low();
            self.rst.set_low();
        }
        self.enabled = enable;
    }

    /// Whether the controller is currently enabled
    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// The controller self-calibrates; nothing to send.
    pub fn calibrate(&self) -> Result<(), Error> {
        if !self.initialized {
            return Err(Error::NotInitialized);
        }
        Ok(())
    }

    /// Tear the driver down, leaving both control lines as pulled-up
    /// inputs
    pub fn deinit<B: I2cBus>(&mut self, bus: &mut B) {
        if !self.initialized {
            return;
        }
        self.rollback(bus);
        self.points.clear();
        self.point_index = 0;
        self.initialized = false;
        self.enabled = false;
        info!("touch driver deinitialized");
    }

    fn hook_interrupt(&mut self) -> Result<(), Error> {
        let Some((irq, _)) = self.irq.as_mut() else {
            return Ok(());
        };
        match irq.install_service() {
            Ok(installed) => self.service_installed_here = installed,
            Err(e) => {
                error!("interrupt service install failed");
                return Err(e.into());
            }
        }
        if let Err(e) = irq.attach_handler() {
            error!("interrupt handler attach failed");
            return Err(e.into());
        }
        self.handler_attached = true;
        Ok(())
    }

    /// Fixed-order rollback: handler, then service (only if installed by
    /// this driver), then both pins to pulled-up inputs, then the bus
    /// device.
    fn rollback<B: I2cBus>(&mut self, bus: &mut B) {
        if let Some((irq, _)) = self.irq.as_mut() {
            if self.handler_attached {
                irq.detach_handler();
                self.handler_attached = false;
            }
            if self.service_installed_here {
                irq.uninstall_service();
                self.service_installed_here = false;
            }
        }
        self.rst.set_input_pullup();
        self.int.set_input_pullup();
        if self.device_attached {
            if let Err(e) = bus.detach(self.cfg.address) {
                warn!("touch device detach failed: {:?}", e);
            }
            self.device_attached = false;
        }
    }

    /// Read the status register and, when data is ready, burst-read and
    /// decode every active point record.
    fn refill<B: I2cBus>(&mut self, bus: &mut B) {
        if let Some((_, flag)) = self.irq.as_ref() {
            if !flag.take() {
                return;
            }
        }

        let mut status = [0u8; 1];
        if self.read_reg(bus, reg::STATUS, &mut status).is_err() {
            return;
        }
        let status = status[0];
        let count = usize::from(status & 0x0F);

        self.points.clear();
        self.point_index = 0;

        if status & 0x80 == 0 || count == 0 {
            return;
        }

        let count = count.min(MAX_TOUCH_POINTS);
        let mut raw = [0u8; 8 * MAX_TOUCH_POINTS];
        match self.read_reg(bus, reg::POINT1, &mut raw[..count * 8]) {
            Ok(()) => {
                for rec in raw[..count * 8].chunks_exact(8) {
                    let x = u16::from_le_bytes([rec[0], rec[1]]);
                    let y = u16::from_le_bytes([rec[2], rec[3]]);
                    let point = TouchPoint {
                        x: scale(x, self.cfg.width, self.cfg.native_width),
                        y: scale(y, self.cfg.height, self.cfg.native_height),
                        size: u16::from_le_bytes([rec[4], rec[5]]),
                        track_id: rec[6],
                    };
                    // Capacity equals the clamped count
                    let _ = self.points.push(point);
                }
                debug!("touch down, {} point(s)", self.points.len());
            }
            Err(e) => warn!("point burst read failed: {:?}", e),
        }

        // Arm the next event
        if let Err(e) = self.write_reg(bus, reg::STATUS, &[0]) {
            warn!("status clear failed: {:?}", e);
        }
    }

    fn read_reg<B: I2cBus>(&self, bus: &mut B, r: u16, buf: &mut [u8]) -> Result<(), BusError> {
        bus.transmit_receive(self.cfg.address, &r.to_be_bytes(), buf, TIMEOUT_MS)
    }

    fn write_reg<B: I2cBus>(&self, bus: &mut B, r: u16, data: &[u8]) -> Result<(), BusError> {
        let mut frame = [0u8; 8];
        let n = data.len().min(frame.len() - 2);
        frame[..2].copy_from_slice(&r.to_be_bytes());
        frame[2..2 + n].copy_from_slice(&data[..n]);
        bus.transmit(self.cfg.address, &frame[..2 + n], TIMEOUT_MS)
    }
}

/// Linear rescale from controller-native space to logical screen space
fn scale(raw: u16, target: u16, native: u16) -> u16 {
    ((u32::from(raw) * u32::from(target)) / u32::from(native)) as u16
}

#[cfg(test)]
mod tests {
    use super::*;
    use core::cell::RefCell;
    use vivarium_hal::gpio::{InputPin, OutputPin};

    type OpLog = RefCell<Vec<&'static str, 24>>;

    struct ScriptBus<'l> {
        status: u8,
        id: [u8; 4],
        point_data: [u8; 40],
        fail_attach: bool,
        fail_status_read: bool,
        status_reads: usize,
        status_clears: usize,
        log: Option<&'l OpLog>,
    }

    impl<'l> ScriptBus<'l> {
        fn new() -> Self {
            Self {
                status: 0,
                id: *b"911\0",
                point_data: [0; 40],
                fail_attach: false,
                fail_status_read: false,
                status_reads: 0,
                status_clears: 0,
                log: None,
            }
        }

        fn with_points(points: &[(u16, u16)]) -> Self {
            let mut bus = Self::new();
            bus.status = 0x80 | points.len() as u8;
            for (i, (x, y)) in points.iter().enumerate() {
                let rec = &mut bus.point_data[i * 8..i * 8 + 8];
                rec[..2].copy_from_slice(&x.to_le_bytes());
                rec[2..4].copy_from_slice(&y.to_le_bytes());
                rec[4..6].copy_from_slice(&64u16.to_le_bytes());
                rec[6] = i as u8;
            }
            bus
        }
    }

    impl<'l> I2cBus for ScriptBus<'l> {
        fn attach(&mut self, _address: u8, _speed_hz: u32) -> Result<(), BusError> {
            if self.fail_attach {
                return Err(BusError::Io);
            }
            Ok(())
        }

        fn detach(&mut self, _address: u8) -> Result<(), BusError> {
            if let Some(log) = self.log {
                log.borrow_mut().push("bus.detach").unwrap();
            }
            Ok(())
        }

        fn transmit(&mut self, _address: u8, bytes: &[u8], _t: u32) -> Result<(), BusError> {
            if bytes[..2] == reg::STATUS.to_be_bytes() {
                self.status_clears += 1;
                self.status = 0;
            }
            Ok(())
        }

        fn receive(&mut self, _address: u8, _buf: &mut [u8], _t: u32) -> Result<(), BusError> {
            Ok(())
        }

        fn transmit_receive(
            &mut self,
            _address: u8,
            bytes: &[u8],
            buf: &mut [u8],
            _t: u32,
        ) -> Result<(), BusError> {
            let r = u16::from_be_bytes([bytes[0], bytes[1]]);
            match r {
                reg::ID => buf.copy_from_slice(&self.id[..buf.len()]),
                reg::STATUS => {
                    self.status_reads += 1;
                    if self.fail_status_read {
                        return Err(BusError::Timeout);
                    }
                    buf[0] = self.status;
                }
                reg::POINT1 => buf.copy_from_slice(&self.point_data[..buf.len()]),
                _ => return Err(BusError::Io),
            }
            Ok(())
        }

        fn teardown(&mut self) -> Result<(), BusError> {
            Ok(())
        }
    }

    #[derive(Default)]
    struct MockPin<'l> {
        high: bool,
        is_output: bool,
        name: &'static str,
        log: Option<&'l OpLog>,
    }

    impl<'l> MockPin<'l> {
        fn named(name: &'static str, log: &'l OpLog) -> Self {
            Self {
                name,
                log: Some(log),
                ..Self::default()
            }
        }

        fn record(&self, op: &'static str) {
            if let Some(log) = self.log {
                let mut log = log.borrow_mut();
                // Only the interesting transitions are asserted on
                let _ = log.push(self.name);
                let _ = log.push(op);
            }
        }
    }

    impl<'l> OutputPin for MockPin<'l> {
        fn set_high(&mut self) {
            self.high = true;
            self.record("high");
        }

        fn set_low(&mut self) {
            self.high = false;
            self.record("low");
        }

        fn is_set_high(&self) -> bool {
            self.high
        }
    }

    impl<'l> InputPin for MockPin<'l> {
        fn is_high(&self) -> bool {
            self.high
        }
    }

    impl<'l> FlexPin for MockPin<'l> {
        fn set_output(&mut self) {
            self.is_output = true;
            self.record("output");
        }

        fn set_input_pullup(&mut self) {
            self.is_output = false;
            self.record("input_pullup");
        }
    }

    struct MockIrq<'l> {
        service_present: bool,
        fail_handler: bool,
        log: &'l OpLog,
    }

    impl<'l> IrqService for MockIrq<'l> {
        fn install_service(&mut self) -> Result<bool, IrqError> {
            self.log.borrow_mut().push("irq.install").unwrap();
            Ok(!core::mem::replace(&mut self.service_present, true))
        }

        fn attach_handler(&mut self) -> Result<(), IrqError> {
            if self.fail_handler {
                return Err(IrqError::Unavailable);
            }
            self.log.borrow_mut().push("irq.attach").unwrap();
            Ok(())
        }

        fn detach_handler(&mut self) {
            self.log.borrow_mut().push("irq.detach").unwrap();
        }

        fn uninstall_service(&mut self) {
            self.log.borrow_mut().push("irq.uninstall").unwrap();
            self.service_present = false;
        }
    }

    struct NoDelay;

    impl DelayNs for NoDelay {
        fn delay_ns(&mut self, _ns: u32) {}
    }

    fn polled_driver() -> Gt911<'static, MockPin<'static>, MockPin<'static>, NoInterrupt> {
        Gt911::polled(
            TouchConfig::gt911(800, 480),
            MockPin::default(),
            MockPin::default(),
        )
    }

    #[test]
    fn init_validates_the_product_id() {
        let mut bus = ScriptBus::new();
        let mut touch = polled_driver();
        assert!(touch.init(&mut bus, &mut NoDelay).is_ok());
        assert!(touch.calibrate().is_ok());
    }

    #[test]
    fn wrong_id_reports_not_found() {
        let mut bus = ScriptBus::new();
        bus.id = *b"615\0";
        let mut touch = polled_driver();
        assert_eq!(touch.init(&mut bus, &mut NoDelay), Err(Error::NotFound));
        assert_eq!(touch.calibrate(), Err(Error::NotInitialized));
    }

    #[test]
    fn three_points_drain_across_three_polls() {
        let mut bus = ScriptBus::with_points(&[(100, 100), (400, 240), (700, 400)]);
        let mut touch = polled_driver();
        touch.init(&mut bus, &mut NoDelay).unwrap();

        let mut data = InputRead::default();

        touch.poll(&mut bus, &mut data);
        assert_eq!(data.state, InputState::Pressed);
        assert_eq!(data.point, Point { x: 100, y: 100 });
        assert!(data.more_data);

        touch.poll(&mut bus, &mut data);
        assert_eq!(data.state, InputState::Pressed);
        assert_eq!(data.point, Point { x: 400, y: 240 });
        assert!(data.more_data);

        touch.poll(&mut bus, &mut data);
        assert_eq!(data.state, InputState::Pressed);
        assert_eq!(data.point, Point { x: 700, y: 400 });
        assert!(!data.more_data);

        // Status was cleared to arm the next event
        assert_eq!(bus.status_clears, 1);

        // No new event: released, holding the last coordinates
        touch.poll(&mut bus, &mut data);
        assert_eq!(data.state, InputState::Released);
        assert_eq!(data.point, Point { x: 700, y: 400 });
        assert!(!data.more_data);
    }

    #[test]
    fn point_count_is_clamped_to_the_maximum() {
        let mut bus = ScriptBus::with_points(&[(1, 1), (2, 2), (3, 3), (4, 4), (5, 5)]);
        bus.status = 0x80 | 0x0F;
        let mut touch = polled_driver();
        touch.init(&mut bus, &mut NoDelay).unwrap();

        let mut data = InputRead::default();
        let mut pressed = 0;
        for _ in 0..8 {
            touch.poll(&mut bus, &mut data);
            if data.state == InputState::Pressed {
                pressed += 1;
            }
        }
        assert_eq!(pressed, MAX_TOUCH_POINTS);
    }

    #[test]
    fn status_read_failure_reports_released() {
        let mut bus = ScriptBus::new();
        bus.fail_status_read = true;
        let mut touch = polled_driver();
        touch.init(&mut bus, &mut NoDelay).unwrap();

        let mut data = InputRead {
            state: InputState::Pressed,
            ..InputRead::default()
        };
        touch.poll(&mut bus, &mut data);
        assert_eq!(data.state, InputState::Released);
        assert!(!data.more_data);
    }

    #[test]
    fn pending_flag_gates_all_bus_traffic() {
        static FLAG: EventFlag = EventFlag::new();
        let log = OpLog::default();
        let mut bus = ScriptBus::with_points(&[(100, 200)]);
        let irq = MockIrq {
            service_present: false,
            fail_handler: false,
            log: &log,
        };
        let mut touch = Gt911::interrupt_driven(
            TouchConfig::gt911(800, 480),
            MockPin::default(),
            MockPin::default(),
            irq,
            &FLAG,
        );
        touch.init(&mut bus, &mut NoDelay).unwrap();

        let mut data = InputRead::default();

        // No edge seen: zero status reads
        touch.poll(&mut bus, &mut data);
        assert_eq!(data.state, InputState::Released);
        assert_eq!(bus.status_reads, 0);

        // Edge handler fired
        FLAG.raise();
        touch.poll(&mut bus, &mut data);
        assert_eq!(data.state, InputState::Pressed);
        assert_eq!(data.point, Point { x: 100, y: 200 });
        assert_eq!(bus.status_reads, 1);
    }

    #[test]
    fn failed_init_rolls_back_in_fixed_order() {
        static FLAG: EventFlag = EventFlag::new();
        let log = OpLog::default();
        let mut bus = ScriptBus::new();
        bus.id = *b"615\0"; // identity mismatch, failing after full partial setup
        bus.log = Some(&log);
        let irq = MockIrq {
            service_present: false,
            fail_handler: false,
            log: &log,
        };
        let mut touch = Gt911::interrupt_driven(
            TouchConfig::gt911(800, 480),
            MockPin::named("rst", &log),
            MockPin::named("int", &log),
            irq,
            &FLAG,
        );

        assert_eq!(touch.init(&mut bus, &mut NoDelay), Err(Error::NotFound));

        let ops = log.borrow();
        let tail: &[&str] = &ops[ops.len() - 7..];
        assert_eq!(
            tail,
            &[
                "irq.detach",
                "irq.uninstall",
                "rst",
                "input_pullup",
                "int",
                "input_pullup",
                "bus.detach",
            ]
        );
    }

    #[test]
    fn service_installed_elsewhere_is_not_uninstalled() {
        static FLAG: EventFlag = EventFlag::new();
        let log = OpLog::default();
        let mut bus = ScriptBus::new();
        bus.fail_attach = true;
        let irq = MockIrq {
            service_present: true, // someone else installed it
            fail_handler: false,
            log: &log,
        };
        let mut touch = Gt911::interrupt_driven(
            TouchConfig::gt911(800, 480),
            MockPin::default(),
            MockPin::default(),
            irq,
            &FLAG,
        );

        assert!(touch.init(&mut bus, &mut NoDelay).is_err());
        assert!(!log.borrow().contains(&"irq.uninstall"));
    }

    #[test]
    fn enable_and_disable_sequence_the_control_lines() {
        let log = OpLog::default();
        let mut bus = ScriptBus::new();
        let mut touch = Gt911::polled(
            TouchConfig::gt911(800, 480),
            MockPin::named("rst", &log),
            MockPin::named("int", &log),
        );
        touch.init(&mut bus, &mut NoDelay).unwrap();
        log.borrow_mut().clear();

        touch.set_enable(&mut NoDelay, false);
        assert!(!touch.is_enabled());
        {
            let ops = log.borrow();
            assert_eq!(
                ops.as_slice(),
                &["int", "output", "int", "low", "rst", "low"]
            );
        }

        log.borrow_mut().clear();
        touch.set_enable(&mut NoDelay, true);
        assert!(touch.is_enabled());
        let ops = log.borrow();
        assert_eq!(
            ops.as_slice(),
            &[
                "int",
                "output",
                "int",
                "low",
                "rst",
                "high",
                "int",
                "input_pullup"
            ]
        );
    }

    #[test]
    fn coordinates_rescale_exactly_at_the_boundaries() {
        // Native-space maximum maps to the logical maximum
        assert_eq!(scale(800, 1024, 800), 1024);
        assert_eq!(scale(480, 600, 480), 600);
        // Zero maps to zero
        assert_eq!(scale(0, 1024, 800), 0);
        // Identity when the spaces match
        assert_eq!(scale(800, 800, 800), 800);
    }

    #[test]
    fn rescaling_is_monotonic_and_bounded() {
        let mut previous = 0;
        for raw in 0u16..=800 {
            let scaled = scale(raw, 1024, 800);
            assert!(scaled >= previous);
            assert!(scaled <= 1024);
            previous = scaled;
        }
    }
}
