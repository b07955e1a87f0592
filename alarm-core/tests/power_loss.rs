use core::ops::Add;
use core::time::Duration;

use alarm_core::actuator::{AlarmOutputs, BeepPhase, BuzzerChannel};
use alarm_core::telemetry::{AlarmEventKind, AlarmPayload};
use alarm_core::{
    AlarmConfig, AlarmController, AlarmState, PollInputs, PresenceEvent, PresenceState,
    RemoteCommand, TelemetryInstant, TriggerSource,
};

const POLL_MS: u64 = 100;

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

#[derive(Default)]
struct BoardOutputs {
    led: bool,
    buzzer_a: bool,
    buzzer_b: bool,
}

impl BoardOutputs {
    fn sounding(&self) -> bool {
        self.led && self.buzzer_a && self.buzzer_b
    }

    fn quiet(&self) -> bool {
        !self.led && !self.buzzer_a && !self.buzzer_b
    }
}

impl AlarmOutputs for BoardOutputs {
    fn set_led(&mut self, on: bool) {
        self.led = on;
    }

    fn set_buzzer_channel(&mut self, channel: BuzzerChannel, on: bool) {
        match channel {
            BuzzerChannel::A => self.buzzer_a = on,
            BuzzerChannel::B => self.buzzer_b = on,
        }
    }
}

struct Bench {
    controller: AlarmController<BoardOutputs, MockInstant>,
    now_ms: u64,
}

impl Bench {
    fn new() -> Self {
        Self {
            controller: AlarmController::new(BoardOutputs::default(), AlarmConfig::default())
                .expect("default config is valid"),
            now_ms: 0,
        }
    }

    fn feed(&mut self, volts: f32) -> alarm_core::PollReport {
        let report = self.controller.poll(
            MockInstant::millis(self.now_ms),
            PollInputs {
                supply_volts: Some(volts),
                ..PollInputs::default()
            },
        );
        self.now_ms += POLL_MS;
        report
    }

    fn outputs(&self) -> &BoardOutputs {
        self.controller.actuator().outputs()
    }
}

#[test]
fn unplugging_usb_arms_after_debounce() {
    let mut bench = Bench::new();
    for _ in 0..10 {
        bench.feed(5.0);
    }
    assert_eq!(bench.controller.presence(), PresenceState::Present);

    // Averages step 4.8, 4.6, 4.4, ... so the second sample is the first
    // below 4.7 V and the eleventh completes ten consecutive low readings.
    for sample in 1..=10 {
        let report = bench.feed(3.0);
        assert_eq!(report.state, AlarmState::Disarmed, "armed early at {sample}");
        assert!(bench.outputs().quiet());
    }

    let report = bench.feed(3.0);
    assert_eq!(report.presence, Some(PresenceEvent::PowerLost));
    assert_eq!(report.state, AlarmState::Armed);
    assert_eq!(bench.controller.armed_by(), Some(TriggerSource::PowerMonitor));
    assert!(bench.outputs().sounding());

    let lost = bench
        .controller
        .telemetry()
        .oldest_first()
        .find(|record| record.event == AlarmEventKind::PowerLost)
        .expect("power loss recorded");
    assert!(matches!(lost.details, AlarmPayload::Supply { millivolts } if millivolts < 4_700));
}

#[test]
fn nine_low_averages_do_not_arm() {
    let mut bench = Bench::new();
    for _ in 0..10 {
        bench.feed(5.0);
    }

    // Two low samples hold the average at 4.6 V until they leave the
    // window, giving nine consecutive low averages in total.
    bench.feed(3.0);
    bench.feed(3.0);
    for _ in 0..20 {
        let report = bench.feed(5.0);
        assert_eq!(report.presence, None);
        assert_eq!(report.state, AlarmState::Disarmed);
    }
    assert_eq!(bench.controller.presence(), PresenceState::Present);
}

#[test]
fn alarm_keeps_sounding_after_power_returns() {
    let mut bench = Bench::new();
    for _ in 0..10 {
        bench.feed(5.0);
    }
    while bench.controller.state() == AlarmState::Disarmed {
        bench.feed(3.0);
    }

    let mut restored = false;
    for _ in 0..20 {
        let report = bench.feed(5.0);
        restored |= report.presence == Some(PresenceEvent::PowerRestored);
        assert_eq!(report.state, AlarmState::Armed);
    }
    assert!(restored);
    assert_eq!(bench.controller.presence(), PresenceState::Present);
    assert_eq!(bench.controller.armed_by(), Some(TriggerSource::PowerMonitor));
}

#[test]
fn beep_cadence_follows_configured_pattern() {
    let mut bench = Bench::new();
    let armed_at = MockInstant::millis(0);
    bench.controller.apply_remote(armed_at, RemoteCommand::Arm);
    assert_eq!(bench.controller.actuator().phase(), Some(BeepPhase::Beep));

    let mut on_ms = 0;
    let mut off_ms = 0;
    let mut now = 0;
    while now < 7_000 {
        let wait = bench.controller.service(MockInstant::millis(now));
        assert!(wait <= Duration::from_millis(POLL_MS));
        let step = u64::try_from(wait.as_millis()).expect("short wait");
        if bench.outputs().sounding() {
            on_ms += step;
        } else {
            assert!(bench.outputs().quiet());
            off_ms += step;
        }
        now += step;
    }

    // Ten full 700 ms periods.
    assert_eq!(on_ms, 5_000);
    assert_eq!(off_ms, 2_000);
}

#[test]
fn disarm_mid_beep_silences_everything() {
    let mut bench = Bench::new();
    bench.controller.apply_remote(MockInstant::millis(0), RemoteCommand::Arm);
    bench.controller.service(MockInstant::millis(250));
    assert!(bench.outputs().sounding());

    let transition = bench
        .controller
        .apply_remote(MockInstant::millis(260), RemoteCommand::Disarm);
    assert!(transition.requires_silence());
    assert!(bench.outputs().quiet());
    assert_eq!(
        bench
            .controller
            .telemetry()
            .since_last(AlarmEventKind::OutputsSilenced, MockInstant::millis(300)),
        Some(Duration::from_millis(40))
    );
}
