use core::ops::Add;
use core::time::Duration;

use alarm_core::actuator::NoopOutputs;
use alarm_core::control::{ControlRequest, RequestError, decode_request, render_status};
use alarm_core::{
    AlarmConfig, AlarmController, AlarmState, PollInputs, TelemetryInstant, TriggerSource,
};

#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord)]
struct MockInstant(u64);

impl MockInstant {
    fn millis(value: u64) -> Self {
        Self(value * 1_000)
    }
}

impl Add<Duration> for MockInstant {
    type Output = Self;

    fn add(self, rhs: Duration) -> Self::Output {
        Self(self.0 + rhs.as_micros() as u64)
    }
}

impl TelemetryInstant for MockInstant {
    fn saturating_duration_since(&self, earlier: Self) -> Duration {
        Duration::from_micros(self.0.saturating_sub(earlier.0))
    }
}

fn controller() -> AlarmController<NoopOutputs, MockInstant> {
    AlarmController::new(NoopOutputs, AlarmConfig::default()).expect("default config is valid")
}

fn serve(
    controller: &mut AlarmController<NoopOutputs, MockInstant>,
    now_ms: u64,
    raw: &[u8],
) -> Result<ControlRequest, RequestError> {
    let request = decode_request(raw)?;
    controller.poll(
        MockInstant::millis(now_ms),
        PollInputs {
            supply_volts: Some(5.0),
            command: request.command(),
            ..PollInputs::default()
        },
    );
    Ok(request)
}

#[test]
fn arm_then_disarm_over_http() {
    let mut controller = controller();

    let request = serve(&mut controller, 0, b"GET /alarm/on HTTP/1.1\r\nHost: pico\r\n\r\n");
    assert_eq!(request, Ok(ControlRequest::Arm));
    assert_eq!(controller.state(), AlarmState::Armed);
    assert_eq!(controller.armed_by(), Some(TriggerSource::Remote));

    let page = render_status(&controller.status_view()).expect("page fits");
    assert!(page.contains("<b>Armed</b>"));
    assert!(page.contains("Armed by: remote"));

    let request = serve(&mut controller, 100, b"GET /alarme/off HTTP/1.1\r\n\r\n");
    assert_eq!(request, Ok(ControlRequest::Disarm));
    assert_eq!(controller.state(), AlarmState::Disarmed);
    assert!(!controller.actuator().is_energized());
}

#[test]
fn status_requests_leave_state_untouched() {
    let mut controller = controller();
    controller.apply_remote(MockInstant::millis(0), alarm_core::RemoteCommand::Arm);

    for (index, path) in ["/", "/favicon.ico", "/alarm", "/alarm/toggle"]
        .into_iter()
        .enumerate()
    {
        let mut raw = heapless::String::<64>::new();
        raw.push_str("GET ").expect("fits");
        raw.push_str(path).expect("fits");
        raw.push_str(" HTTP/1.1\r\n\r\n").expect("fits");

        let now = 100 * (index as u64 + 1);
        assert_eq!(
            serve(&mut controller, now, raw.as_bytes()),
            Ok(ControlRequest::Status)
        );
        assert_eq!(controller.state(), AlarmState::Armed);
    }
}

#[test]
fn rejected_requests_never_reach_the_controller() {
    let mut controller = controller();

    assert_eq!(
        serve(&mut controller, 0, b"PUT /alarm/on HTTP/1.1\r\n\r\n"),
        Err(RequestError::UnsupportedMethod)
    );
    assert_eq!(
        serve(&mut controller, 0, b"\x00\x01\x02garbage"),
        Err(RequestError::Malformed)
    );
    assert_eq!(controller.state(), AlarmState::Disarmed);
    assert!(controller.telemetry().is_empty());
}

#[test]
fn remote_arm_is_idempotent() {
    let mut controller = controller();
    let first = controller.apply_remote(MockInstant::millis(0), alarm_core::RemoteCommand::Arm);
    assert!(first.is_change());

    let second = controller.apply_remote(MockInstant::millis(50), alarm_core::RemoteCommand::Arm);
    assert!(!second.is_change());
    assert_eq!(controller.armed_by(), Some(TriggerSource::Remote));
}
