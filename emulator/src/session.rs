use std::cmp;
use std::fs::{self, OpenOptions};
use std::io::{self, BufWriter, Write};
use std::ops::Add;
use std::path::Path;
use std::time::Duration;

use alarm_core::actuator::{AlarmOutputs, BuzzerChannel};
use alarm_core::alarm::Transition;
use alarm_core::control::page::render_status_owned;
use alarm_core::control::{ControlRequest, decode_request};
use alarm_core::controller::{ButtonId, ButtonInputs};
use alarm_core::sampling::SupplyRail;
use alarm_core::telemetry::{AlarmPayload, AlarmRecord, EventId};
use alarm_core::{
    AlarmConfig, AlarmController, PollInputs, PollReport, PresenceEvent, TelemetryInstant,
};

pub const HELP_TOPICS: &[(&str, &str)] = &[
    ("volts", "volts <v|none>          - set the USB rail reading"),
    ("press", "press <on|off>          - hold a button down"),
    ("release", "release <on|off>        - let a button go"),
    ("tap", "tap <on|off>            - press for one poll, then release"),
    ("http", "http <path|request-line> - send a request to the control endpoint"),
    ("tick", "tick [polls]            - advance by whole poll intervals"),
    ("wait", "wait <ms>               - advance the clock by milliseconds"),
    ("status", "status                  - show alarm, supply, and outputs"),
    ("events", "events                  - list recorded telemetry"),
    ("page", "page                    - print the rendered status page"),
    ("help", "help [topic]            - show help for a command"),
];

/// Virtual microsecond clock; the emulator never sleeps.
#[derive(Copy, Clone, Debug, Default, Eq, PartialEq, Ord, PartialOrd)]
pub struct SimInstant(u64);

impl SimInstant {
    pub fn as_millis(self) -> u64 {
        self.0 / 1_000
    }
}

impl Add<Duration> for SimInstant {
    type Output = Self;

    fn add(self, rhs: Duration) -> Self::Output {
        let micros = u64::try_from(rhs.as_micros()).unwrap_or(u64::MAX);
        Self(self.0.saturating_add(micros))
    }
}

impl TelemetryInstant for SimInstant {
    fn saturating_duration_since(&self, earlier: Self) -> Duration {
        Duration::from_micros(self.0.saturating_sub(earlier.0))
    }
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum TranscriptProfile {
    Interactive,
    PowerLoss,
    Manual,
    Remote,
}

impl TranscriptProfile {
    pub fn log_path(self) -> &'static str {
        match self {
            TranscriptProfile::Interactive => "transcripts/interactive.log",
            TranscriptProfile::PowerLoss => "transcripts/power-loss.log",
            TranscriptProfile::Manual => "transcripts/manual.log",
            TranscriptProfile::Remote => "transcripts/remote.log",
        }
    }

    pub fn header(self) -> &'static str {
        match self {
            TranscriptProfile::Interactive => "Power alarm emulator session",
            TranscriptProfile::PowerLoss => "Power alarm emulator power-loss transcript",
            TranscriptProfile::Manual => "Power alarm emulator manual button transcript",
            TranscriptProfile::Remote => "Power alarm emulator remote control transcript",
        }
    }

    pub fn from_tag(tag: &str) -> Result<Self, String> {
        if tag.eq_ignore_ascii_case("interactive") {
            Ok(Self::Interactive)
        } else if tag.eq_ignore_ascii_case("power-loss") {
            Ok(Self::PowerLoss)
        } else if tag.eq_ignore_ascii_case("manual") {
            Ok(Self::Manual)
        } else if tag.eq_ignore_ascii_case("remote") {
            Ok(Self::Remote)
        } else {
            Err(format!("Unknown transcript profile `{tag}`"))
        }
    }
}

/// LED and buzzer levels as last written by the actuator.
#[derive(Debug, Default)]
pub struct SimOutputs {
    led: bool,
    buzzers: [bool; 2],
}

impl SimOutputs {
    fn describe(&self) -> String {
        let label = |on: bool| if on { "on" } else { "off" };
        format!(
            "led={} buzzer-a={} buzzer-b={}",
            label(self.led),
            label(self.buzzers[0]),
            label(self.buzzers[1])
        )
    }
}

impl AlarmOutputs for SimOutputs {
    fn set_led(&mut self, on: bool) {
        self.led = on;
    }

    fn set_buzzer_channel(&mut self, channel: BuzzerChannel, on: bool) {
        let index = match channel {
            BuzzerChannel::A => 0,
            BuzzerChannel::B => 1,
        };
        self.buzzers[index] = on;
    }
}

/// Rail reading the next poll will see.
#[derive(Debug)]
struct SimRail {
    volts: Option<f32>,
}

impl SupplyRail for SimRail {
    fn read_supply_voltage(&mut self) -> Option<f32> {
        self.volts
    }
}

#[derive(Debug, Default)]
struct SimButtons {
    alarm_on: bool,
    alarm_off: bool,
}

impl SimButtons {
    fn set(&mut self, id: ButtonId, pressed: bool) {
        match id {
            ButtonId::AlarmOn => self.alarm_on = pressed,
            ButtonId::AlarmOff => self.alarm_off = pressed,
        }
    }
}

impl ButtonInputs for SimButtons {
    fn read_button(&mut self, id: ButtonId) -> bool {
        match id {
            ButtonId::AlarmOn => self.alarm_on,
            ButtonId::AlarmOff => self.alarm_off,
        }
    }
}

pub struct Session {
    controller: AlarmController<SimOutputs, SimInstant>,
    rail: SimRail,
    buttons: SimButtons,
    now: SimInstant,
    next_poll: SimInstant,
    energized: bool,
    last_event: Option<EventId>,
    transcript: TranscriptLogger,
}

impl Session {
    pub fn new(profile: TranscriptProfile) -> io::Result<Self> {
        let transcript = TranscriptLogger::to_file(profile)?;
        Self::with_transcript(transcript)
    }

    #[cfg(test)]
    fn in_memory() -> io::Result<Self> {
        Self::with_transcript(TranscriptLogger::discard())
    }

    fn with_transcript(transcript: TranscriptLogger) -> io::Result<Self> {
        let controller = AlarmController::new(SimOutputs::default(), AlarmConfig::default())
            .map_err(|err| io::Error::new(io::ErrorKind::InvalidInput, err.to_string()))?;

        Ok(Self {
            controller,
            rail: SimRail { volts: Some(5.0) },
            buttons: SimButtons::default(),
            now: SimInstant::default(),
            next_poll: SimInstant::default(),
            energized: false,
            last_event: None,
            transcript,
        })
    }

    pub fn handle_command(&mut self, line: &str) -> io::Result<Vec<String>> {
        let trimmed = line.trim();
        if trimmed.is_empty() {
            return Ok(Vec::new());
        }

        let elapsed = self.now.as_millis();
        self.transcript
            .append_line(elapsed, TranscriptRole::Host, trimmed)?;

        let (verb, rest) = match trimmed.split_once(char::is_whitespace) {
            Some((verb, rest)) => (verb, rest.trim()),
            None => (trimmed, ""),
        };

        let lines = match verb.to_ascii_lowercase().as_str() {
            "help" => help_lines(rest),
            "volts" => self.handle_volts(rest),
            "press" => self.handle_button(rest, true),
            "release" => self.handle_button(rest, false),
            "tap" => self.handle_tap(rest),
            "http" => self.handle_http(rest),
            "tick" => self.handle_tick(rest),
            "wait" => self.handle_wait(rest),
            "status" => self.status_lines(),
            "events" => self.event_lines(),
            "page" => render_status_owned(&self.controller.status_view())
                .lines()
                .map(str::to_owned)
                .collect(),
            other => vec![format!("ERR unknown command `{other}` (try `help`)")],
        };

        self.record_output(elapsed, &lines)?;
        Ok(lines)
    }

    fn handle_volts(&mut self, argument: &str) -> Vec<String> {
        if argument.eq_ignore_ascii_case("none") {
            self.rail.volts = None;
            return vec!["rail: reading unavailable".to_owned()];
        }

        match argument.parse::<f32>() {
            Ok(volts) if volts.is_finite() && volts >= 0.0 => {
                self.rail.volts = Some(volts);
                vec![format!("rail: {volts:.2} V")]
            }
            _ => vec![format!("ERR volts expects a non-negative number, got `{argument}`")],
        }
    }

    fn handle_button(&mut self, argument: &str, pressed: bool) -> Vec<String> {
        match parse_button(argument) {
            Ok(id) => {
                self.buttons.set(id, pressed);
                let action = if pressed { "pressed" } else { "released" };
                vec![format!("button {id} {action}")]
            }
            Err(message) => vec![message],
        }
    }

    fn handle_tap(&mut self, argument: &str) -> Vec<String> {
        let id = match parse_button(argument) {
            Ok(id) => id,
            Err(message) => return vec![message],
        };

        let mut lines = vec![format!("button {id} tapped")];
        self.buttons.set(id, true);
        let poll_interval = self.controller.config().poll_interval();
        self.advance(poll_interval, &mut lines);
        self.buttons.set(id, false);
        lines
    }

    fn handle_http(&mut self, argument: &str) -> Vec<String> {
        if argument.is_empty() {
            return vec!["ERR http expects a path or request line".to_owned()];
        }

        let raw = if argument.starts_with('/') {
            format!("GET {argument} HTTP/1.1\r\nHost: emulator\r\n\r\n")
        } else {
            format!("{argument}\r\n\r\n")
        };

        match decode_request(raw.as_bytes()) {
            Ok(request) => {
                let mut lines = Vec::new();
                if let Some(command) = request.command() {
                    let transition = self.controller.apply_remote(self.now, command);
                    lines.push(describe_transition(transition));
                    self.note_outputs(&mut lines);
                    self.note_events(&mut lines);
                }
                let label = match request {
                    ControlRequest::Arm => "arm",
                    ControlRequest::Disarm => "disarm",
                    ControlRequest::Status => "status",
                };
                let view = self.controller.status_view();
                lines.push(format!(
                    "HTTP/1.1 200 OK ({label}) alarm={} presence={}",
                    view.alarm, view.presence
                ));
                lines
            }
            Err(error) => {
                let (code, reason) = error.status();
                vec![format!("HTTP/1.1 {code} {reason} ({error})")]
            }
        }
    }

    fn handle_tick(&mut self, argument: &str) -> Vec<String> {
        let polls = if argument.is_empty() {
            Ok(1)
        } else {
            argument.parse::<u32>()
        };

        match polls {
            Ok(polls) if polls > 0 => {
                let mut lines = Vec::new();
                let span = self.controller.config().poll_interval() * polls;
                self.advance(span, &mut lines);
                lines.push(format!("t={} ms", self.now.as_millis()));
                lines
            }
            _ => vec![format!("ERR tick expects a positive poll count, got `{argument}`")],
        }
    }

    fn handle_wait(&mut self, argument: &str) -> Vec<String> {
        match argument.parse::<u64>() {
            Ok(millis) if millis > 0 => {
                let mut lines = Vec::new();
                self.advance(Duration::from_millis(millis), &mut lines);
                lines.push(format!("t={} ms", self.now.as_millis()));
                lines
            }
            _ => vec![format!("ERR wait expects milliseconds, got `{argument}`")],
        }
    }

    /// Runs the control loop on the virtual clock, stopping at each wake.
    fn advance(&mut self, span: Duration, lines: &mut Vec<String>) {
        let target = self.now + span;
        let poll_interval = self.controller.config().poll_interval();

        while self.now < target {
            let wait = if self.now >= self.next_poll {
                let inputs = PollInputs::sample(&mut self.rail, &mut self.buttons, None);
                let report = self.controller.poll(self.now, inputs);
                self.describe_report(&report, lines);
                self.next_poll = self.now + poll_interval;
                report.next_wake
            } else {
                cmp::min(
                    self.controller.service(self.now),
                    self.next_poll.saturating_duration_since(self.now),
                )
            };

            self.note_outputs(lines);
            self.note_events(lines);

            let remaining = target.saturating_duration_since(self.now);
            self.now = self.now + cmp::min(wait, remaining);
        }
    }

    fn describe_report(&self, report: &PollReport, lines: &mut Vec<String>) {
        if let Some(event) = report.presence {
            let label = match event {
                PresenceEvent::PowerLost => "power lost",
                PresenceEvent::PowerRestored => "power restored",
            };
            let average = report.average_volts.unwrap_or_default();
            lines.push(format!("supply: {label} (avg {average:.2} V)"));
        }
        for transition in &report.transitions {
            if transition.is_change() {
                lines.push(describe_transition(*transition));
            }
        }
    }

    fn note_outputs(&mut self, lines: &mut Vec<String>) {
        let energized = self.controller.actuator().is_energized();
        if energized != self.energized {
            self.energized = energized;
            let outputs = self.controller.actuator().outputs().describe();
            lines.push(format!("t={} ms outputs {outputs}", self.now.as_millis()));
        }
    }

    fn note_events(&mut self, lines: &mut Vec<String>) {
        let last = self.last_event;
        let fresh: Vec<String> = self
            .controller
            .telemetry()
            .oldest_first()
            .filter(|record| last.is_none_or(|seen| record.id > seen))
            .map(describe_record)
            .collect();
        if let Some(latest) = self.controller.telemetry().latest() {
            self.last_event = Some(latest.id);
        }
        lines.extend(fresh);
    }

    fn status_lines(&self) -> Vec<String> {
        let controller = &self.controller;
        let armed_by = controller
            .armed_by()
            .map_or_else(|| "-".to_owned(), |source| source.to_string());
        let average = controller
            .average_volts()
            .map_or_else(|| "no reading".to_owned(), |volts| format!("{volts:.2} V"));
        let rail = self
            .rail
            .volts
            .map_or_else(|| "unavailable".to_owned(), |volts| format!("{volts:.2} V"));

        vec![
            format!("t={} ms", self.now.as_millis()),
            format!("alarm: {} (armed by {armed_by})", controller.state()),
            format!("supply: {} avg {average}, rail {rail}", controller.presence()),
            format!(
                "buttons: on={} off={}",
                self.buttons.alarm_on, self.buttons.alarm_off
            ),
            format!("outputs: {}", controller.actuator().outputs().describe()),
        ]
    }

    fn event_lines(&self) -> Vec<String> {
        let telemetry = self.controller.telemetry();
        if telemetry.is_empty() {
            return vec!["no events recorded".to_owned()];
        }
        telemetry.oldest_first().map(describe_record).collect()
    }

    fn record_output(&mut self, elapsed: u64, lines: &[String]) -> io::Result<()> {
        for line in lines {
            self.transcript
                .append_line(elapsed, TranscriptRole::Emulator, line)?;
        }
        Ok(())
    }
}

fn parse_button(argument: &str) -> Result<ButtonId, String> {
    if argument.eq_ignore_ascii_case("on") {
        Ok(ButtonId::AlarmOn)
    } else if argument.eq_ignore_ascii_case("off") {
        Ok(ButtonId::AlarmOff)
    } else {
        Err(format!("ERR expected `on` or `off`, got `{argument}`"))
    }
}

fn describe_transition(transition: Transition) -> String {
    match transition {
        Transition::Armed { source } => format!("alarm: armed by {source}"),
        Transition::Disarmed { source } => format!("alarm: disarmed by {source}"),
        Transition::Unchanged(state) => format!("alarm: already {state}"),
    }
}

fn describe_record(record: &AlarmRecord<SimInstant>) -> String {
    let base = format!(
        "event #{} t={} ms {}",
        record.id,
        record.timestamp.as_millis(),
        record.event
    );
    match record.details {
        AlarmPayload::None => base,
        AlarmPayload::Supply { millivolts } => format!("{base} ({millivolts} mV)"),
    }
}

fn help_lines(topic: &str) -> Vec<String> {
    if topic.is_empty() {
        return HELP_TOPICS
            .iter()
            .map(|(_, usage)| (*usage).to_owned())
            .collect();
    }

    match HELP_TOPICS
        .iter()
        .find(|(name, _)| name.eq_ignore_ascii_case(topic))
    {
        Some((_, usage)) => vec![(*usage).to_owned()],
        None => {
            let topics: Vec<&str> = HELP_TOPICS.iter().map(|(name, _)| *name).collect();
            vec![format!(
                "ERR unknown help topic `{topic}` (topics: {})",
                topics.join(", ")
            )]
        }
    }
}

struct TranscriptLogger {
    writer: BufWriter<Box<dyn Write>>,
}

impl TranscriptLogger {
    fn to_file(profile: TranscriptProfile) -> io::Result<Self> {
        let path = Path::new(profile.log_path());
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }

        let file = OpenOptions::new()
            .create(true)
            .write(true)
            .truncate(true)
            .open(path)?;

        let mut logger = Self {
            writer: BufWriter::new(Box::new(file)),
        };
        logger.write_header(profile)?;
        Ok(logger)
    }

    #[cfg(test)]
    fn discard() -> Self {
        Self {
            writer: BufWriter::new(Box::new(io::sink())),
        }
    }

    fn write_header(&mut self, profile: TranscriptProfile) -> io::Result<()> {
        writeln!(self.writer, "# {}", profile.header())?;
        writeln!(
            self.writer,
            "# Timestamps are milliseconds on the emulated clock"
        )?;
        writeln!(self.writer)?;
        self.writer.flush()
    }

    fn append_line(&mut self, elapsed_ms: u64, role: TranscriptRole, line: &str) -> io::Result<()> {
        writeln!(self.writer, "[+{elapsed_ms:>6} ms] {} {line}", role.prefix())?;
        self.writer.flush()
    }
}

enum TranscriptRole {
    Host,
    Emulator,
}

impl TranscriptRole {
    fn prefix(&self) -> &'static str {
        match self {
            TranscriptRole::Host => "HOST>",
            TranscriptRole::Emulator => "EMU <",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alarm_core::{AlarmState, TriggerSource};

    fn session() -> Session {
        Session::in_memory().expect("session")
    }

    fn run(session: &mut Session, command: &str) -> Vec<String> {
        session.handle_command(command).expect("command")
    }

    #[test]
    fn pulling_usb_arms_the_alarm() {
        let mut session = session();
        run(&mut session, "tick 10");
        run(&mut session, "volts 0");
        let lines = run(&mut session, "tick 20");

        assert!(lines.iter().any(|line| line.starts_with("supply: power lost")));
        assert!(lines.iter().any(|line| line == "alarm: armed by power-monitor"));
        assert_eq!(session.controller.state(), AlarmState::Armed);
        assert_eq!(
            session.controller.armed_by(),
            Some(TriggerSource::PowerMonitor)
        );
    }

    #[test]
    fn http_disarm_silences_outputs() {
        let mut session = session();
        run(&mut session, "http /alarm/on");
        run(&mut session, "wait 250");
        assert!(session.controller.actuator().is_energized());

        let lines = run(&mut session, "http /alarme/off");
        assert_eq!(lines[0], "alarm: disarmed by remote");
        assert!(!session.controller.actuator().is_energized());
        assert!(lines.iter().any(|line| line.contains("outputs led=off")));
    }

    #[test]
    fn rejected_request_reports_status_code() {
        let mut session = session();
        let lines = run(&mut session, "http POST /alarm/on HTTP/1.1");
        assert_eq!(
            lines,
            vec!["HTTP/1.1 405 Method Not Allowed (unsupported method)".to_owned()]
        );
        assert_eq!(session.controller.state(), AlarmState::Disarmed);
    }

    #[test]
    fn tap_arms_once() {
        let mut session = session();
        let lines = run(&mut session, "tap on");
        assert!(lines.iter().any(|line| line == "alarm: armed by button"));
        assert!(!session.buttons.alarm_on);
    }

    #[test]
    fn beeping_toggles_outputs_on_schedule() {
        let mut session = session();
        run(&mut session, "http /alarm/on");
        let lines = run(&mut session, "wait 1400");
        let toggles: Vec<&String> = lines
            .iter()
            .filter(|line| line.contains(" outputs "))
            .collect();
        assert_eq!(toggles.len(), 3);
        assert!(toggles[0].starts_with("t=500 ms outputs led=off"));
        assert!(toggles[1].starts_with("t=700 ms outputs led=on"));
        assert!(toggles[2].starts_with("t=1200 ms outputs led=off"));
    }

    #[test]
    fn bad_arguments_are_reported() {
        let mut session = session();
        assert!(run(&mut session, "volts lots")[0].starts_with("ERR"));
        assert!(run(&mut session, "press middle")[0].starts_with("ERR"));
        assert!(run(&mut session, "tick 0")[0].starts_with("ERR"));
        assert!(run(&mut session, "frobnicate")[0].starts_with("ERR unknown command"));
    }
}
