//! Simulated AHRS/GPS device for hardware-free operation
//!
//! # Overview
//!
//! | Component | Simulation Method |
//! |-----------|-------------------|
//! | AHRS (accel/gyro/Euler) | Static attitude + Gaussian noise |
//! | GPS | Fix schedule + position jitter around a fixed antenna |
//! | Command link | Mode tracking, scripted failures, error queue |
//!
//! # Device model
//!
//! The simulated device powers up streaming, like the real sensor in
//! continuous mode. It enforces the parts of the command protocol the
//! lifecycle depends on:
//!
//! - every command fails while the port is closed
//! - polls fail while the device is idle
//! - filter init fails until all three message formats are configured
//!
//! A failed command queues a message that is popped by `last_error`.
//!
//! # Configuration
//!
//! ```toml
//! [device]
//! type = "mock"
//!
//! [device.simulation]
//! random_seed = 42      # 0 = random each run
//!
//! [device.simulation.attitude]
//! yaw = 1.2
//!
//! [[device.simulation.failures]]
//! command = "poll_gps"
//! after = 100
//! count = 5
//! ```
//!
//! # Module Structure
//!
//! - [`config`]: Simulation parameters
//! - [`attitude_sim`]: AHRS sample generation
//! - [`gps_sim`]: GPS fix schedule and position jitter
//! - [`noise`]: Seedable Gaussian noise

mod attitude_sim;
pub mod config;
mod gps_sim;
mod noise;

use crate::core::device::NavDevice;
use crate::core::types::{AttitudeSample, GpsSample};
use crate::error::{Error, Result};
use attitude_sim::AttitudeSimulator;
use config::SimulationConfig;
use gps_sim::GpsSimulator;
use noise::NoiseGenerator;

use serde::Deserialize;
use std::collections::{HashMap, VecDeque};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};

/// Device commands, as recorded in the call journal
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Call {
    /// Port open; scriptable but never journaled
    Open,
    Ping,
    SetIdle,
    Resume,
    DeviceStatus,
    DisableAllStreams,
    SelfTest,
    SetAhrsFormat,
    SetGpsFormat,
    SetNavFormat,
    InitKalmanFilter,
    PollAhrs,
    PollGps,
    PollNav,
}

/// Scripted failure of one command
#[derive(Debug, Clone, PartialEq)]
pub struct ScriptedFailure {
    /// Calls let through before failing
    after: u32,
    /// Failures left, `None` = unlimited
    remaining: Option<u32>,
    message: String,
}

impl ScriptedFailure {
    /// Fail every call
    pub fn always(message: impl Into<String>) -> Self {
        Self::after(0, message)
    }

    /// Let `calls` calls through, then fail every call
    pub fn after(calls: u32, message: impl Into<String>) -> Self {
        Self {
            after: calls,
            remaining: None,
            message: message.into(),
        }
    }

    /// Limit the number of failures
    pub fn times(mut self, count: u32) -> Self {
        self.remaining = Some(count);
        self
    }

    fn triggers(&mut self, previous_calls: u32) -> bool {
        if previous_calls < self.after || self.remaining == Some(0) {
            return false;
        }
        if let Some(n) = self.remaining.as_mut() {
            *n -= 1;
        }
        true
    }
}

/// Simulated 3DM-GX3-45 class device
pub struct MockDevice {
    config: SimulationConfig,
    attitude_sim: AttitudeSimulator,
    gps_sim: GpsSimulator,
    epoch: Instant,

    port: Option<String>,
    closed: Arc<AtomicBool>,
    timeout: Option<Duration>,
    streaming: Arc<AtomicBool>,
    formats: [bool; 3],
    declination: Option<i32>,

    ahrs: AttitudeSample,
    gps: GpsSample,

    journal: Vec<Call>,
    call_counts: HashMap<Call, u32>,
    failures: Vec<(Call, ScriptedFailure)>,
    errors: VecDeque<String>,
}

impl MockDevice {
    pub fn new(config: &SimulationConfig) -> Self {
        let seed = config.random_seed;
        let gps_seed = if seed == 0 { 0 } else { seed.wrapping_add(1) };

        let failures = config
            .failures
            .iter()
            .map(|f| {
                let mut rule = ScriptedFailure::after(f.after, f.message.clone());
                rule.remaining = f.count;
                (f.command, rule)
            })
            .collect();

        Self {
            config: config.clone(),
            attitude_sim: AttitudeSimulator::new(&config.attitude, NoiseGenerator::new(seed)),
            gps_sim: GpsSimulator::new(&config.gps, NoiseGenerator::new(gps_seed)),
            epoch: Instant::now(),
            port: None,
            closed: Arc::new(AtomicBool::new(false)),
            timeout: None,
            streaming: Arc::new(AtomicBool::new(true)),
            formats: [false; 3],
            declination: None,
            ahrs: AttitudeSample::default(),
            gps: GpsSample::default(),
            journal: Vec::new(),
            call_counts: HashMap::new(),
            failures,
            errors: VecDeque::new(),
        }
    }

    pub fn config(&self) -> &SimulationConfig {
        &self.config
    }

    /// Add a scripted failure rule; the first matching active rule wins
    pub fn fail(&mut self, call: Call, failure: ScriptedFailure) {
        self.failures.push((call, failure));
    }

    /// Queue an error message as if the device had reported it
    pub fn push_error(&mut self, message: impl Into<String>) {
        self.errors.push_back(message.into());
    }

    /// Ordered log of device commands (open/close excluded)
    pub fn journal(&self) -> &[Call] {
        &self.journal
    }

    pub fn call_count(&self, call: Call) -> u32 {
        self.call_counts.get(&call).copied().unwrap_or(0)
    }

    pub fn timeout(&self) -> Option<Duration> {
        self.timeout
    }

    /// Declination the filter was last initialized with
    pub fn declination(&self) -> Option<i32> {
        self.declination
    }

    pub fn is_open(&self) -> bool {
        self.port.is_some()
    }

    pub fn is_idle(&self) -> bool {
        !self.streaming.load(Ordering::Relaxed)
    }

    /// Flag set once the device has been closed; observable after drop
    pub fn closed_flag(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.closed)
    }

    /// Flag tracking whether the device is streaming; observable after drop
    pub fn streaming_flag(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.streaming)
    }

    fn elapsed_ns(&self) -> u64 {
        self.epoch.elapsed().as_nanos() as u64
    }

    /// Bump the call counter and evaluate scripted failures
    fn scripted(&mut self, call: Call) -> Option<String> {
        let entry = self.call_counts.entry(call).or_insert(0);
        let previous = *entry;
        *entry += 1;

        self.failures
            .iter_mut()
            .filter(|(c, _)| *c == call)
            .find_map(|(_, rule)| rule.triggers(previous).then(|| rule.message.clone()))
    }

    /// Common gate for every command; queues the reason on failure
    fn command(&mut self, call: Call) -> bool {
        self.journal.push(call);

        if let Some(message) = self.scripted(call) {
            self.errors.push_back(message);
            return false;
        }
        if self.port.is_none() {
            self.errors.push_back("port not open".to_string());
            return false;
        }
        true
    }

    fn poll(&mut self, call: Call) -> bool {
        if !self.command(call) {
            return false;
        }
        if !self.streaming.load(Ordering::Relaxed) {
            self.errors
                .push_back("poll rejected: device is idle".to_string());
            return false;
        }
        true
    }
}

impl Default for MockDevice {
    fn default() -> Self {
        Self::new(&SimulationConfig::default())
    }
}

impl NavDevice for MockDevice {
    fn open(&mut self, port: &str, baud_rate: u32) -> Result<()> {
        if let Some(reason) = self.scripted(Call::Open) {
            return Err(Error::PortOpenFailure {
                port: port.to_string(),
                reason,
            });
        }
        log::debug!("Simulated port {} opened at {} baud", port, baud_rate);
        self.port = Some(port.to_string());
        self.closed.store(false, Ordering::Relaxed);
        Ok(())
    }

    fn close(&mut self) {
        if let Some(port) = self.port.take() {
            log::debug!("Simulated port {} closed", port);
        }
        self.closed.store(true, Ordering::Relaxed);
    }

    fn set_timeout(&mut self, timeout: Duration) {
        self.timeout = Some(timeout);
    }

    fn ping(&mut self) -> bool {
        self.command(Call::Ping)
    }

    fn set_idle(&mut self) -> bool {
        if !self.command(Call::SetIdle) {
            return false;
        }
        self.streaming.store(false, Ordering::Relaxed);
        true
    }

    fn resume(&mut self) -> bool {
        if !self.command(Call::Resume) {
            return false;
        }
        self.streaming.store(true, Ordering::Relaxed);
        true
    }

    fn device_status(&mut self) -> bool {
        self.command(Call::DeviceStatus)
    }

    fn disable_all_streams(&mut self) -> bool {
        self.command(Call::DisableAllStreams)
    }

    fn self_test(&mut self) -> bool {
        self.command(Call::SelfTest)
    }

    fn set_ahrs_format(&mut self) -> bool {
        let ok = self.command(Call::SetAhrsFormat);
        self.formats[0] |= ok;
        ok
    }

    fn set_gps_format(&mut self) -> bool {
        let ok = self.command(Call::SetGpsFormat);
        self.formats[1] |= ok;
        ok
    }

    fn set_nav_format(&mut self) -> bool {
        let ok = self.command(Call::SetNavFormat);
        self.formats[2] |= ok;
        ok
    }

    fn init_kalman_filter(&mut self, declination: i32) -> bool {
        if !self.command(Call::InitKalmanFilter) {
            return false;
        }
        if !self.formats.iter().all(|f| *f) {
            self.errors
                .push_back("filter init rejected: message formats not configured".to_string());
            return false;
        }
        self.declination = Some(declination);
        true
    }

    fn poll_ahrs(&mut self) -> bool {
        if !self.poll(Call::PollAhrs) {
            return false;
        }
        let now = self.elapsed_ns();
        self.ahrs = self.attitude_sim.sample(now);
        true
    }

    fn poll_gps(&mut self) -> bool {
        if !self.poll(Call::PollGps) {
            return false;
        }
        let now = self.elapsed_ns();
        self.gps = self.gps_sim.sample(now);
        true
    }

    fn poll_nav(&mut self) -> bool {
        self.poll(Call::PollNav)
    }

    fn ahrs(&self) -> AttitudeSample {
        self.ahrs
    }

    fn gps(&self) -> GpsSample {
        self.gps
    }

    fn last_error(&mut self) -> String {
        self.errors.pop_front().unwrap_or_default()
    }
}
