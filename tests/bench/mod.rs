#![allow(dead_code)]

//! Simulated programmer board: host terminal, SPI link and an AT89LP target.
//!
//! Interrupts are delivered from the simulated ports. A pending completion
//! fires as soon as its source is unmasked, and host input arrives one byte
//! per foreground spin while the terminal is not held off by XOFF.

use std::cell::RefCell;
use std::collections::VecDeque;
use std::rc::Rc;

use embedded_hal::digital::v2::OutputPin;
use embedded_hal_mock::delay::MockNoop;

use at89_programmer::config::{Limits, XOFF, XON};
use at89_programmer::drivers::{DeviceLink, DeviceShared, HostLink, HostShared, Target};
use at89_programmer::hal::{DevicePort, HostPort, Irq, IrqControl};
use at89_programmer::Programmer;

pub const FLASH_SIZE: usize = 0x1_0000;
pub const BUSY_READS: u32 = 2;
const IDLE_STEP_LIMIT: u32 = 10_000;

pub const OP_ENABLE: u8 = 0xAC;
pub const OP_ERASE: u8 = 0x8A;
pub const OP_STATUS: u8 = 0x60;
pub const OP_READ_PAGE: u8 = 0x30;
pub const OP_WRITE_PAGE: u8 = 0x50;
pub const OP_READ_FUSES: u8 = 0x61;
pub const OP_WRITE_FUSES: u8 = 0xF1;

/// How soon a byte handed to the shift register completes.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Latency {
    /// Completion fires as soon as the device interrupt is unmasked
    Eager,
    /// Completion fires on the next foreground spin
    Spin,
    /// Transfers never complete
    Stuck,
}

/// AT89LP as seen from its serial programming interface.
pub struct TargetModel {
    pub flash: Vec<u8>,
    pub fuses: [u8; 12],
    /// Program-enable frames to ignore before answering
    pub refuse_enables: u32,
    pub always_busy: bool,
    busy: u32,
    frame: Vec<u8>,
    /// Every closed frame, oldest first
    pub frames: Vec<Vec<u8>>,
}

impl TargetModel {
    fn new() -> Self {
        Self {
            flash: vec![0xFF; FLASH_SIZE],
            fuses: [0xA5; 12],
            refuse_enables: 0,
            always_busy: false,
            busy: 0,
            frame: Vec::new(),
            frames: Vec::new(),
        }
    }

    fn clock(&mut self, byte: u8) -> u8 {
        let index = self.frame.len();
        self.frame.push(byte);
        let f = &self.frame;
        match (f.get(2).copied(), index) {
            (Some(OP_ENABLE), 4) if self.refuse_enables == 0 => 0x53,
            (Some(OP_STATUS), i) if i >= 5 => {
                if self.always_busy {
                    0x00
                } else if self.busy > 0 {
                    self.busy -= 1;
                    0x00
                } else {
                    0x01
                }
            }
            (Some(OP_READ_PAGE), i) if i >= 5 => {
                let address = u16::from_be_bytes([f[3], f[4]]).wrapping_add((i - 5) as u16);
                self.flash[address as usize]
            }
            (Some(OP_READ_FUSES), i) if i >= 5 => self.fuses.get(i - 5).copied().unwrap_or(0xFF),
            _ => 0xFF,
        }
    }

    fn close(&mut self) {
        let frame = std::mem::take(&mut self.frame);
        if frame.len() < 3 {
            self.frames.push(frame);
            return;
        }
        assert_eq!(frame[..2], [0xAA, 0x55], "frame without preamble: {:02x?}", frame);
        match frame[2] {
            OP_ENABLE => self.refuse_enables = self.refuse_enables.saturating_sub(1),
            OP_ERASE => {
                self.flash.fill(0xFF);
                self.busy = BUSY_READS;
            }
            OP_WRITE_PAGE => {
                let address = u16::from_be_bytes([frame[3], frame[4]]);
                for (k, &byte) in frame[5..].iter().enumerate() {
                    self.flash[address.wrapping_add(k as u16) as usize] = byte;
                }
                self.busy = BUSY_READS;
            }
            OP_WRITE_FUSES => self.fuses.copy_from_slice(&frame[5..17]),
            _ => {}
        }
        self.frames.push(frame);
    }

    pub fn frames_with(&self, opcode: u8) -> Vec<&Vec<u8>> {
        self.frames
            .iter()
            .filter(|f| f.get(2) == Some(&opcode))
            .collect()
    }
}

pub struct World {
    pub input: VecDeque<u8>,
    pub output: Vec<u8>,
    /// Terminal has seen XOFF more recently than XON
    pub paused: bool,
    pub target: TargetModel,
    pub select: bool,
    pub attached: bool,
    pub latency: Latency,
    device_in_flight: Option<u8>,
    host_in_flight: Option<u8>,
    idle_steps: u32,
}

impl World {
    fn select(&mut self, asserted: bool) {
        if self.select && !asserted {
            self.target.close();
        }
        self.select = asserted;
    }

    fn complete_device(&mut self, device: &DeviceShared) -> bool {
        let mut progressed = false;
        while let Some(byte) = self.device_in_flight.take() {
            let reply = if self.select && self.attached {
                self.target.clock(byte)
            } else {
                0xFF
            };
            let done = device.on_transfer_complete(reply);
            if done.release_select {
                self.select(false);
            }
            self.device_in_flight = done.next;
            progressed = true;
        }
        progressed
    }

    fn complete_host(&mut self, host: &HostShared) {
        while let Some(byte) = self.host_in_flight.take() {
            match byte {
                XOFF => self.paused = true,
                XON => self.paused = false,
                _ => {}
            }
            self.output.push(byte);
            self.host_in_flight = host.on_tx_ready();
        }
    }

    /// One foreground spin's worth of interrupts.
    fn step(&mut self, host: &HostShared, device: &DeviceShared) {
        let mut progressed = false;
        if self.latency != Latency::Stuck {
            progressed |= self.complete_device(device);
        }
        self.complete_host(host);
        if !self.paused {
            if let Some(byte) = self.input.pop_front() {
                host.on_receive(byte, false);
                progressed = true;
            }
        }
        if progressed {
            self.idle_steps = 0;
        } else {
            self.idle_steps += 1;
            assert!(
                self.idle_steps < IDLE_STEP_LIMIT,
                "bench stalled; output so far: {:?}",
                String::from_utf8_lossy(&self.output)
            );
        }
    }
}

pub struct SimHost<'s> {
    world: Rc<RefCell<World>>,
    host: &'s HostShared,
    device: &'s DeviceShared,
    masked: bool,
}

impl IrqControl for SimHost<'_> {
    fn disable(&mut self, irq: Irq) {
        assert_ne!(irq, Irq::Device);
        self.masked = true;
    }

    fn enable(&mut self, irq: Irq) {
        self.masked = false;
        if irq == Irq::HostTx {
            self.world.borrow_mut().complete_host(self.host);
        }
    }
}

impl HostPort for SimHost<'_> {
    fn transmit(&mut self, byte: u8) {
        let previous = self.world.borrow_mut().host_in_flight.replace(byte);
        assert!(previous.is_none(), "transmit with a byte in flight");
    }

    fn relax(&mut self) {
        assert!(!self.masked, "spinning with the host interrupt masked");
        self.world.borrow_mut().step(self.host, self.device);
    }
}

pub struct SimDevice<'s> {
    world: Rc<RefCell<World>>,
    host: &'s HostShared,
    device: &'s DeviceShared,
    masked: bool,
}

impl IrqControl for SimDevice<'_> {
    fn disable(&mut self, irq: Irq) {
        assert_eq!(irq, Irq::Device);
        self.masked = true;
    }

    fn enable(&mut self, _irq: Irq) {
        self.masked = false;
        let mut world = self.world.borrow_mut();
        if world.latency == Latency::Eager {
            world.complete_device(self.device);
        }
    }
}

impl DevicePort for SimDevice<'_> {
    fn transmit(&mut self, byte: u8) {
        let previous = self.world.borrow_mut().device_in_flight.replace(byte);
        assert!(previous.is_none(), "transmit with a transfer in flight");
    }

    fn set_select(&mut self, asserted: bool) {
        self.world.borrow_mut().select(asserted);
    }

    fn set_attached(&mut self, attached: bool) {
        self.world.borrow_mut().attached = attached;
    }

    fn relax(&mut self) {
        assert!(!self.masked, "spinning with the device interrupt masked");
        self.world.borrow_mut().step(self.host, self.device);
    }
}

/// Reset line that remembers every level it was driven to.
#[derive(Clone, Default)]
pub struct ResetLine {
    pub levels: Rc<RefCell<Vec<bool>>>,
}

impl ResetLine {
    pub fn level(&self) -> Option<bool> {
        self.levels.borrow().last().copied()
    }
}

impl OutputPin for ResetLine {
    type Error = core::convert::Infallible;

    fn set_high(&mut self) -> Result<(), Self::Error> {
        self.levels.borrow_mut().push(true);
        Ok(())
    }

    fn set_low(&mut self) -> Result<(), Self::Error> {
        self.levels.borrow_mut().push(false);
        Ok(())
    }
}

pub type SimProgrammer<'s, R> = Programmer<'s, SimHost<'s>, SimDevice<'s>, MockNoop, R, MockNoop>;

pub struct Bench {
    pub world: Rc<RefCell<World>>,
    pub reset: ResetLine,
    pub limits: Limits,
    host: HostShared,
    device: DeviceShared,
}

impl Bench {
    pub fn new() -> Self {
        let _ = env_logger::builder().is_test(true).try_init();
        Self {
            world: Rc::new(RefCell::new(World {
                input: VecDeque::new(),
                output: Vec::new(),
                paused: false,
                target: TargetModel::new(),
                select: false,
                attached: false,
                latency: Latency::Eager,
                device_in_flight: None,
                host_in_flight: None,
                idle_steps: 0,
            })),
            reset: ResetLine::default(),
            limits: Limits {
                busy_poll: Some(200),
                link_spin: Some(200),
            },
            host: HostShared::new(),
            device: DeviceShared::new(),
        }
    }

    /// Queue keystrokes from the terminal.
    pub fn type_in(&self, keys: &[u8]) {
        self.world.borrow_mut().input.extend(keys.iter().copied());
    }

    /// Host link and target without the session around them.
    pub fn links(&self) -> (HostLink<'_, SimHost<'_>>, Target<'_, SimDevice<'_>, MockNoop>) {
        let host = HostLink::new(
            SimHost {
                world: self.world.clone(),
                host: &self.host,
                device: &self.device,
                masked: false,
            },
            &self.host,
        );
        let link = DeviceLink::new(
            SimDevice {
                world: self.world.clone(),
                host: &self.host,
                device: &self.device,
                masked: false,
            },
            MockNoop::new(),
            &self.device,
            self.limits,
        );
        (host, Target::new(link, self.limits))
    }

    pub fn programmer_with<R: OutputPin>(&self, reset: R) -> SimProgrammer<'_, R> {
        let (host, target) = self.links();
        Programmer::new(host, target, reset, MockNoop::new())
    }

    pub fn programmer(&self) -> SimProgrammer<'_, ResetLine> {
        self.programmer_with(self.reset.clone())
    }

    /// Run one session over `keys` and return everything printed, minus
    /// flow control.
    pub fn session(&self, keys: &[u8]) -> String {
        self.type_in(keys);
        let mut programmer = self.programmer();
        programmer.run_session();
        programmer.host().flush();
        self.text()
    }

    pub fn raw(&self) -> Vec<u8> {
        self.world.borrow().output.clone()
    }

    pub fn text(&self) -> String {
        let output: Vec<u8> = self
            .raw()
            .into_iter()
            .filter(|&b| b != XON && b != XOFF)
            .collect();
        String::from_utf8_lossy(&output).into_owned()
    }

    /// Output after the last banner prompt.
    pub fn after_banner(&self) -> String {
        let text = self.text();
        let start = text.rfind("v0.1\r\n>").map_or(0, |i| i + "v0.1\r\n>".len());
        text[start..].to_string()
    }
}

/// Ctrl-C
pub const CANCEL: u8 = 3;

/// One `:`-prefixed record line with a correct checksum.
pub fn hex_record(address: u16, kind: u8, data: &[u8]) -> String {
    let mut bytes = vec![data.len() as u8];
    bytes.extend_from_slice(&address.to_be_bytes());
    bytes.push(kind);
    bytes.extend_from_slice(data);
    let sum = bytes.iter().fold(0u8, |acc, &b| acc.wrapping_add(b));
    bytes.push(sum.wrapping_neg());

    let mut line = String::from(":");
    for b in bytes {
        line.push_str(&format!("{:02X}", b));
    }
    line.push_str("\r\n");
    line
}

pub const END_RECORD: &str = ":00000001FF\r\n";
