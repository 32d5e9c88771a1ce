//! Fixed-rate acquisition loop
//!
//! # Tick
//!
//! ```text
//! poll NAV (keep-alive)
//! ├── imu or pose enabled ──▶ poll AHRS
//! │   ├── imu/data consumers ──▶ transform + publish
//! │   └── imu/pose consumers ──▶ transform + publish
//! ├── fix or odom enabled ──▶ poll GPS ──▶ fix edge tracking
//! │   ├── gps/fix consumers ──▶ publish fix, advance summary
//! │   └── gps/odom consumers ──▶ UTM projection + publish
//! └── admin requests (reset filter)
//! ```
//!
//! Poll failures are logged with their stage name and never end the loop;
//! outputs are built from the most recent sample the device holds.
//! Publication failures are logged the same way.
//!
//! The loop owns the [`DeviceSession`] so admin requests run between ticks
//! on the same thread as polling.

mod rate;

pub use rate::Rate;

use crate::config::{Config, OutputConfig};
use crate::core::admin::{AdminCommand, AdminReceiver, AdminRequest, AdminResponse};
use crate::core::device::NavDevice;
use crate::core::sink::{Output, ResultSink, Topic};
use crate::error::{Error, Result};
use crate::gps::{FixEdge, FixProjector, FixTracker, SummaryCounter, SummaryReport};
use crate::lifecycle::{DeviceSession, PollKind};
use crate::transform::{AttitudeTransform, CovarianceModel};
use std::sync::atomic::{AtomicBool, Ordering};

/// Counters accumulated over the life of the loop
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct LoopStats {
    pub ticks: u64,
    pub poll_failures: u64,
    pub published: u64,
    pub publish_errors: u64,
    pub admin_requests: u64,
}

/// What a single tick did
#[derive(Debug, Default)]
pub struct TickReport {
    /// Topics published this tick, in order
    pub published: Vec<Topic>,
    pub poll_failures: Vec<PollKind>,
    pub fix_edge: Option<FixEdge>,
    pub summary: Option<SummaryReport>,
}

pub struct AcquisitionLoop<D: NavDevice, S: ResultSink> {
    session: DeviceSession<D>,
    sink: S,
    outputs: OutputConfig,
    rate_hz: f64,
    transform: AttitudeTransform,
    projector: FixProjector,
    tracker: FixTracker,
    summary: SummaryCounter,
    admin: Option<AdminReceiver>,
    stats: LoopStats,
}

impl<D: NavDevice, S: ResultSink> AcquisitionLoop<D, S> {
    pub fn new(session: DeviceSession<D>, sink: S, config: &Config) -> Self {
        let rate_hz = config.acquisition.rate_hz;
        Self {
            session,
            sink,
            outputs: config.outputs.clone(),
            rate_hz,
            transform: AttitudeTransform::new(
                config.transform.orientation_convention,
                CovarianceModel::from_config(&config.noise),
                config.frames.frame_id.clone(),
            ),
            projector: FixProjector::new(
                config.frames.frame_id.clone(),
                config.frames.child_frame_id.clone(),
            ),
            tracker: FixTracker::new(),
            summary: SummaryCounter::new(rate_hz),
            admin: None,
            stats: LoopStats::default(),
        }
    }

    /// Service admin requests arriving on `requests` between ticks
    pub fn with_admin(mut self, requests: AdminReceiver) -> Self {
        self.admin = Some(requests);
        self
    }

    pub fn session(&self) -> &DeviceSession<D> {
        &self.session
    }

    pub fn session_mut(&mut self) -> &mut DeviceSession<D> {
        &mut self.session
    }

    pub fn sink(&self) -> &S {
        &self.sink
    }

    pub fn sink_mut(&mut self) -> &mut S {
        &mut self.sink
    }

    pub fn stats(&self) -> LoopStats {
        self.stats
    }

    pub fn fix_tracker(&self) -> &FixTracker {
        &self.tracker
    }

    pub fn into_parts(self) -> (DeviceSession<D>, S) {
        (self.session, self.sink)
    }

    /// Run until `running` is cleared, then return the device to idle
    pub fn run(&mut self, running: &AtomicBool) -> Result<LoopStats> {
        self.run_until(running, None)
    }

    /// Run exactly `ticks` ticks, then return the device to idle
    pub fn run_for(&mut self, ticks: u64) -> Result<LoopStats> {
        let running = AtomicBool::new(true);
        self.run_until(&running, Some(ticks))
    }

    /// Run until `running` is cleared or `limit` ticks have elapsed
    pub fn run_until(&mut self, running: &AtomicBool, limit: Option<u64>) -> Result<LoopStats> {
        if !self.session.is_ready() {
            return Err(Error::NotInitialized);
        }
        let mut rate = match Rate::new(self.rate_hz) {
            Ok(rate) => rate,
            Err(e) => {
                self.session.stop()?;
                return Err(e);
            }
        };

        log::info!("Start polling device at {} Hz", self.rate_hz);

        let mut done = 0u64;
        while running.load(Ordering::Relaxed) && limit.is_none_or(|n| done < n) {
            self.tick();
            self.service_admin();
            done += 1;
            rate.sleep();
        }

        log::info!(
            "Polling stopped after {} ticks ({} overruns)",
            done,
            rate.overruns()
        );
        self.session.stop()?;
        Ok(self.stats)
    }

    /// Execute one tick of polling, transformation and publication
    pub fn tick(&mut self) -> TickReport {
        self.stats.ticks += 1;
        let mut report = TickReport::default();

        self.poll(PollKind::Nav, &mut report);

        if self.outputs.wants_attitude() {
            self.poll(PollKind::Ahrs, &mut report);
        }

        if self.outputs.publish_imu && self.sink.subscriber_count(Topic::ImuData) > 0 {
            let sample = self.session.device().ahrs();
            let output = Output::Imu(self.transform.attitude(&sample));
            self.emit(output, &mut report);
        }

        if self.outputs.publish_pose && self.sink.subscriber_count(Topic::ImuPose) > 0 {
            let sample = self.session.device().ahrs();
            let output = Output::Pose(self.transform.pose(&sample));
            self.emit(output, &mut report);
        }

        if self.outputs.wants_gps() {
            self.poll(PollKind::Gps, &mut report);
            let gps = self.session.device().gps();
            report.fix_edge = self.tracker.observe(&gps);

            if self.outputs.publish_gps && self.sink.subscriber_count(Topic::GpsFix) > 0 {
                let output = Output::Fix(self.projector.fix(&gps));
                self.emit(output, &mut report);
                report.summary = self.summary.advance(&gps);
            }

            if self.outputs.publish_gps_as_odom && self.sink.subscriber_count(Topic::GpsOdom) > 0
            {
                let output = Output::Odometry(self.projector.odometry(&gps));
                self.emit(output, &mut report);
            }
        }

        report
    }

    /// Execute every pending admin request; returns how many ran
    pub fn service_admin(&mut self) -> usize {
        let Some(requests) = self.admin.as_ref() else {
            return 0;
        };

        let mut handled = 0;
        while let Ok(command) = requests.try_recv() {
            handled += 1;
            self.stats.admin_requests += 1;
            handle_admin(&mut self.session, command);
        }
        handled
    }

    fn poll(&mut self, kind: PollKind, report: &mut TickReport) {
        if !self.session.poll(kind) {
            self.stats.poll_failures += 1;
            report.poll_failures.push(kind);
        }
    }

    fn emit(&mut self, output: Output, report: &mut TickReport) {
        let topic = output.topic();
        match self.sink.publish(output) {
            Ok(()) => {
                self.stats.published += 1;
                report.published.push(topic);
            }
            Err(e) => {
                self.stats.publish_errors += 1;
                log::warn!("Failed to publish {}: {}", topic.name(), e);
            }
        }
    }
}

fn handle_admin<D: NavDevice>(session: &mut DeviceSession<D>, command: AdminCommand) {
    match command.request {
        AdminRequest::ResetFilter => {
            // Failures are logged by the session; the caller always sees success
            session.reset_filter();
            command.respond(AdminResponse::Ok);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::admin::admin_channel;
    use crate::core::sink::MemorySink;
    use crate::devices::mock::{Call, MockDevice, ScriptedFailure};
    use std::time::Duration;

    fn ready_loop(device: MockDevice, config: &Config) -> AcquisitionLoop<MockDevice, MemorySink> {
        let mut session = DeviceSession::from_config(device, &config.device);
        session.open(&config.device.port, config.device.baud_rate).unwrap();
        session.initialize().unwrap();
        AcquisitionLoop::new(session, MemorySink::subscribed_to_all(), config)
    }

    #[test]
    fn test_run_requires_initialized_session() {
        let config = Config::default();
        let session = DeviceSession::from_config(MockDevice::default(), &config.device);
        let mut acq = AcquisitionLoop::new(session, MemorySink::subscribed_to_all(), &config);

        assert!(matches!(acq.run_for(1), Err(Error::NotInitialized)));
        assert_eq!(acq.stats().ticks, 0);
    }

    #[test]
    fn test_tick_publishes_every_topic() {
        let config = Config::default();
        let mut acq = ready_loop(MockDevice::default(), &config);

        let report = acq.tick();
        assert_eq!(report.published, Topic::ALL.to_vec());
        assert_eq!(report.fix_edge, Some(FixEdge::Acquired));
        assert!(report.poll_failures.is_empty());
    }

    #[test]
    fn test_no_consumers_no_transform() {
        let config = Config::default();
        let mut session = DeviceSession::from_config(MockDevice::default(), &config.device);
        session.open("/dev/ttyACM0", 115200).unwrap();
        session.initialize().unwrap();
        let mut acq = AcquisitionLoop::new(session, MemorySink::new(), &config);

        let report = acq.tick();
        assert!(report.published.is_empty());
        // Polling still happens for keep-alive and fix tracking
        assert_eq!(acq.session().device().call_count(Call::PollNav), 1);
        assert_eq!(acq.session().device().call_count(Call::PollGps), 1);
        assert!(acq.fix_tracker().fix_available());
    }

    #[test]
    fn test_disabled_outputs_skip_polls() {
        let mut config = Config::default();
        config.outputs.publish_imu = false;
        config.outputs.publish_pose = false;
        let mut acq = ready_loop(MockDevice::default(), &config);

        let report = acq.tick();
        assert_eq!(report.published, vec![Topic::GpsFix, Topic::GpsOdom]);
        assert_eq!(acq.session().device().call_count(Call::PollAhrs), 0);
    }

    #[test]
    fn test_poll_failure_is_not_fatal() {
        let config = Config::default();
        let mut device = MockDevice::default();
        device.fail(Call::PollAhrs, ScriptedFailure::always("checksum mismatch"));
        let mut acq = ready_loop(device, &config);

        for _ in 0..3 {
            let report = acq.tick();
            assert_eq!(report.poll_failures, vec![PollKind::Ahrs]);
            // Stale sample is still published
            assert!(report.published.contains(&Topic::ImuData));
        }
        assert_eq!(acq.stats().poll_failures, 3);
    }

    #[test]
    fn test_admin_reset_between_ticks() {
        let config = Config::default();
        let (tx, rx) = admin_channel();
        let mut acq = ready_loop(MockDevice::default(), &config).with_admin(rx);

        let (command, reply) = AdminCommand::with_reply(AdminRequest::ResetFilter);
        tx.send(command).unwrap();
        assert_eq!(acq.service_admin(), 1);
        assert_eq!(reply.recv_timeout(Duration::from_secs(1)).unwrap(), AdminResponse::Ok);
        assert_eq!(acq.session().device().call_count(Call::InitKalmanFilter), 2);
        assert_eq!(acq.service_admin(), 0);
    }

    #[test]
    fn test_run_for_stops_device() {
        let mut config = Config::default();
        config.acquisition.rate_hz = 200.0;
        let mut acq = ready_loop(MockDevice::default(), &config);

        let stats = acq.run_for(5).unwrap();
        assert_eq!(stats.ticks, 5);
        assert!(acq.session().device().is_idle());
        assert_eq!(acq.session().device().journal().last(), Some(&Call::SetIdle));
    }

    #[test]
    fn test_run_honours_shutdown_flag() {
        let mut config = Config::default();
        config.acquisition.rate_hz = 200.0;
        let mut acq = ready_loop(MockDevice::default(), &config);

        let running = AtomicBool::new(false);
        let stats = acq.run(&running).unwrap();
        assert_eq!(stats.ticks, 0);
        assert!(acq.session().device().is_idle());
    }
}
