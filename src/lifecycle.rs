//! Device lifecycle controller
//!
//! Brings the sensor from an unknown power-on state into streaming and back.
//!
//! # Initialization sequence
//!
//! ```text
//! Uninitialized ──ping──▶ Pinged ──set_idle──▶ Idle ──status──▶ StatusChecked
//!                                                                    │
//!      ┌──────────────────── disable_all_streams ◀───────────────────┘
//!      ▼
//! StreamsDisabled ──self_test──▶ SelfTested ──AHRS/GPS/NAV formats──▶ FormatsConfigured
//!                                                                    │
//!                    Streaming ◀── init_kalman_filter ◀── resume ────┘
//!
//! Any failing step ──▶ Failed
//! ```
//!
//! Every step logs its stage name before it runs. A failing step drains the
//! device error queue, logs each message prefixed with the stage, and aborts
//! the sequence. Only a failure after `resume` can leave the device
//! streaming, so that case is followed by a best-effort `set_idle`.
//!
//! # Filter reset
//!
//! [`DeviceSession::reset_filter`] runs idle → filter init → resume and
//! always completes: sub-step failures are logged and reported in the
//! returned [`ResetOutcome`], never as an error. Admin callers are told the
//! reset succeeded regardless.

use crate::config::DeviceConfig;
use crate::core::device::NavDevice;
use crate::error::{Error, Result};
use std::time::Duration;

/// Human-readable stage names, logged before each step
pub mod stages {
    pub const PING: &str = "Pinging device";
    pub const SET_IDLE: &str = "Setting to idle";
    pub const CHECK_STATUS: &str = "Checking status";
    pub const DISABLE_STREAMS: &str = "Disabling all streams";
    pub const SELF_TEST: &str = "Device self test";
    pub const AHRS_FORMAT: &str = "Setting AHRS msg format";
    pub const GPS_FORMAT: &str = "Setting GPS msg format";
    pub const NAV_FORMAT: &str = "Setting NAV msg format";
    pub const RESUME: &str = "Resuming";
    pub const KF_INIT: &str = "KF initialization";
    pub const TO_IDLE: &str = "To idle";
    pub const NAV: &str = "NAV";
    pub const AHRS: &str = "AHRS";
    pub const GPS: &str = "GPS";
}

/// Upper bound on messages drained per failure (guards a device that never reports empty)
const MAX_DRAINED_MESSAGES: usize = 64;

/// Lifecycle state of the session
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LifecycleState {
    Uninitialized,
    Pinged,
    Idle,
    StatusChecked,
    StreamsDisabled,
    SelfTested,
    FormatsConfigured,
    Streaming,
    Failed,
}

/// Mode the device was last successfully commanded into
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeviceMode {
    Unknown,
    Idle,
    Streaming,
}

/// Categories polled by the acquisition loop
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PollKind {
    Nav,
    Ahrs,
    Gps,
}

impl PollKind {
    pub fn stage(&self) -> &'static str {
        match self {
            PollKind::Nav => stages::NAV,
            PollKind::Ahrs => stages::AHRS,
            PollKind::Gps => stages::GPS,
        }
    }
}

/// Result of a filter reset; informational only
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResetOutcome {
    /// Stages that failed, in execution order
    pub failed_stages: Vec<&'static str>,
}

impl ResetOutcome {
    pub fn is_clean(&self) -> bool {
        self.failed_stages.is_empty()
    }
}

#[derive(Clone, Copy)]
enum Failure {
    Unresponsive,
    Rejected,
}

/// Exclusive owner of a device and its lifecycle state
pub struct DeviceSession<D: NavDevice> {
    device: D,
    state: LifecycleState,
    mode: DeviceMode,
    declination: i32,
    command_timeout: Duration,
    ready: bool,
}

impl<D: NavDevice> DeviceSession<D> {
    pub fn new(device: D, declination: i32, command_timeout: Duration) -> Self {
        Self {
            device,
            state: LifecycleState::Uninitialized,
            mode: DeviceMode::Unknown,
            declination,
            command_timeout,
            ready: false,
        }
    }

    pub fn from_config(device: D, config: &DeviceConfig) -> Self {
        Self::new(device, config.declination, config.command_timeout())
    }

    pub fn state(&self) -> LifecycleState {
        self.state
    }

    pub fn mode(&self) -> DeviceMode {
        self.mode
    }

    /// True once `initialize` has completed every step
    pub fn is_ready(&self) -> bool {
        self.ready
    }

    pub fn declination(&self) -> i32 {
        self.declination
    }

    pub fn device(&self) -> &D {
        &self.device
    }

    pub fn device_mut(&mut self) -> &mut D {
        &mut self.device
    }

    /// Open the serial link
    pub fn open(&mut self, port: &str, baud_rate: u32) -> Result<()> {
        log::info!("Opening {} at {} baud", port, baud_rate);
        self.device.open(port, baud_rate).inspect_err(|e| {
            log::error!("Can't open port: {}", e);
        })
    }

    /// Run the full initialization sequence
    pub fn initialize(&mut self) -> Result<()> {
        self.ready = false;
        self.state = LifecycleState::Uninitialized;

        self.device.set_timeout(self.command_timeout);

        self.step(stages::PING, Failure::Unresponsive, |d| d.ping())?;
        self.state = LifecycleState::Pinged;

        self.step(stages::SET_IDLE, Failure::Rejected, |d| d.set_idle())?;
        self.state = LifecycleState::Idle;
        self.mode = DeviceMode::Idle;

        self.step(stages::CHECK_STATUS, Failure::Rejected, |d| {
            d.device_status()
        })?;
        self.state = LifecycleState::StatusChecked;

        self.step(stages::DISABLE_STREAMS, Failure::Rejected, |d| {
            d.disable_all_streams()
        })?;
        self.state = LifecycleState::StreamsDisabled;

        self.step(stages::SELF_TEST, Failure::Rejected, |d| d.self_test())?;
        self.state = LifecycleState::SelfTested;

        self.step(stages::AHRS_FORMAT, Failure::Rejected, |d| {
            d.set_ahrs_format()
        })?;
        self.step(stages::GPS_FORMAT, Failure::Rejected, |d| d.set_gps_format())?;
        self.step(stages::NAV_FORMAT, Failure::Rejected, |d| d.set_nav_format())?;
        self.state = LifecycleState::FormatsConfigured;

        self.start()?;

        let declination = self.declination;
        if let Err(e) = self.step(stages::KF_INIT, Failure::Rejected, |d| {
            d.init_kalman_filter(declination)
        }) {
            self.halt_streaming();
            return Err(e);
        }

        self.ready = true;
        Ok(())
    }

    /// Resume streaming
    pub fn start(&mut self) -> Result<()> {
        if matches!(
            self.state,
            LifecycleState::Uninitialized | LifecycleState::Failed
        ) {
            return Err(Error::InvalidState(format!(
                "cannot resume from {:?}",
                self.state
            )));
        }
        self.step(stages::RESUME, Failure::Rejected, |d| d.resume())?;
        self.state = LifecycleState::Streaming;
        self.mode = DeviceMode::Streaming;
        Ok(())
    }

    /// Return the device to idle; no command is sent when not streaming
    pub fn stop(&mut self) -> Result<()> {
        if self.mode != DeviceMode::Streaming {
            log::debug!("Device not streaming, stop is a no-op");
            return Ok(());
        }
        self.step(stages::TO_IDLE, Failure::Rejected, |d| d.set_idle())?;
        self.state = LifecycleState::Idle;
        self.mode = DeviceMode::Idle;
        Ok(())
    }

    /// Re-seed the device filter: idle, filter init, resume
    ///
    /// Always completes. Failures are logged and listed in the outcome.
    pub fn reset_filter(&mut self) -> ResetOutcome {
        log::info!("Resetting KF.");
        let mut outcome = ResetOutcome::default();

        if self.device.set_idle() {
            self.mode = DeviceMode::Idle;
            self.state = LifecycleState::Idle;
        } else {
            self.drain_errors(stages::SET_IDLE);
            outcome.failed_stages.push(stages::SET_IDLE);
        }

        if !self.device.init_kalman_filter(self.declination) {
            self.drain_errors(stages::KF_INIT);
            outcome.failed_stages.push(stages::KF_INIT);
        }

        if self.device.resume() {
            self.mode = DeviceMode::Streaming;
            self.state = LifecycleState::Streaming;
        } else {
            self.drain_errors(stages::RESUME);
            outcome.failed_stages.push(stages::RESUME);
        }

        if !outcome.is_clean() {
            log::warn!("KF reset completed with failures: {:?}", outcome.failed_stages);
        }
        outcome
    }

    /// Request one category of samples; failures are logged, never fatal
    pub fn poll(&mut self, kind: PollKind) -> bool {
        let ok = match kind {
            PollKind::Nav => self.device.poll_nav(),
            PollKind::Ahrs => self.device.poll_ahrs(),
            PollKind::Gps => self.device.poll_gps(),
        };
        if !ok {
            self.drain_errors(kind.stage());
        }
        ok
    }

    /// Pop and log every queued device error
    pub fn drain_errors(&mut self, stage: &str) -> Vec<String> {
        let mut messages = Vec::new();
        while messages.len() < MAX_DRAINED_MESSAGES {
            let msg = self.device.last_error();
            if msg.is_empty() {
                break;
            }
            log::error!("{}: {}", stage, msg);
            messages.push(msg);
        }
        messages
    }

    fn step<F>(&mut self, stage: &'static str, failure: Failure, op: F) -> Result<()>
    where
        F: FnOnce(&mut D) -> bool,
    {
        log::info!("{}", stage);
        if op(&mut self.device) {
            return Ok(());
        }

        let messages = self.drain_errors(stage);
        self.state = LifecycleState::Failed;
        self.ready = false;
        Err(match failure {
            Failure::Unresponsive => Error::DeviceUnresponsive { stage, messages },
            Failure::Rejected => Error::CommandRejected { stage, messages },
        })
    }

    /// Best-effort idle when the device was left streaming
    fn halt_streaming(&mut self) {
        if self.mode != DeviceMode::Streaming {
            return;
        }
        log::info!("{}", stages::TO_IDLE);
        if self.device.set_idle() {
            self.mode = DeviceMode::Idle;
        } else {
            self.drain_errors(stages::TO_IDLE);
        }
    }
}

impl<D: NavDevice> Drop for DeviceSession<D> {
    fn drop(&mut self) {
        self.halt_streaming();
        self.device.close();
    }
}
