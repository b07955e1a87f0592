//! Alarm telemetry catalog and in-memory event history.
//!
//! Every transition the control loop makes is recorded as a typed event
//! with a compact numeric code, so front-ends (the status page, the
//! emulator transcript, firmware logs) can present the same history without
//! sharing formatting code.

use core::{fmt, time::Duration};

use heapless::HistoryBuf;

use crate::alarm::TriggerSource;

/// Identifier assigned to each recorded event.
pub type EventId = u32;

/// Total number of telemetry entries retained in memory.
pub const TELEMETRY_RING_CAPACITY: usize = 64;

/// Trait implemented by monotonic instant wrappers used by the alarm engine.
pub trait TelemetryInstant: Copy {
    /// Returns the saturating duration from `earlier` to `self`.
    fn saturating_duration_since(&self, earlier: Self) -> Duration;
}

/// Discriminated alarm events.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum AlarmEventKind {
    PowerLost,
    PowerRestored,
    Armed(TriggerSource),
    Disarmed(TriggerSource),
    OutputsSilenced,
    ReadingUnavailable,
    Custom(u16),
}

impl fmt::Display for AlarmEventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AlarmEventKind::PowerLost => f.write_str("power-lost"),
            AlarmEventKind::PowerRestored => f.write_str("power-restored"),
            AlarmEventKind::Armed(source) => write!(f, "armed by {source}"),
            AlarmEventKind::Disarmed(source) => write!(f, "disarmed by {source}"),
            AlarmEventKind::OutputsSilenced => f.write_str("outputs-silenced"),
            AlarmEventKind::ReadingUnavailable => f.write_str("reading-unavailable"),
            AlarmEventKind::Custom(code) => write!(f, "custom({code})"),
        }
    }
}

impl AlarmEventKind {
    const POWER_LOST_CODE: u16 = 0x0001;
    const POWER_RESTORED_CODE: u16 = 0x0002;
    const ARMED_BASE: u16 = 0x0010;
    const DISARMED_BASE: u16 = 0x0014;
    const SILENCED_CODE: u16 = 0x0020;
    const READING_UNAVAILABLE_CODE: u16 = 0x0021;

    /// Encodes the event into a compact transport-friendly discriminant.
    #[must_use]
    pub const fn to_raw(self) -> u16 {
        match self {
            AlarmEventKind::PowerLost => Self::POWER_LOST_CODE,
            AlarmEventKind::PowerRestored => Self::POWER_RESTORED_CODE,
            AlarmEventKind::Armed(source) => Self::ARMED_BASE + source_index(source),
            AlarmEventKind::Disarmed(source) => Self::DISARMED_BASE + source_index(source),
            AlarmEventKind::OutputsSilenced => Self::SILENCED_CODE,
            AlarmEventKind::ReadingUnavailable => Self::READING_UNAVAILABLE_CODE,
            AlarmEventKind::Custom(code) => code,
        }
    }

    /// Decodes a raw discriminant, falling back to [`AlarmEventKind::Custom`].
    #[must_use]
    pub fn from_raw(code: u16) -> Self {
        match code {
            Self::POWER_LOST_CODE => AlarmEventKind::PowerLost,
            Self::POWER_RESTORED_CODE => AlarmEventKind::PowerRestored,
            Self::SILENCED_CODE => AlarmEventKind::OutputsSilenced,
            Self::READING_UNAVAILABLE_CODE => AlarmEventKind::ReadingUnavailable,
            value if (Self::ARMED_BASE..Self::DISARMED_BASE).contains(&value) => {
                source_from_index(value - Self::ARMED_BASE)
                    .map_or(AlarmEventKind::Custom(value), AlarmEventKind::Armed)
            }
            value if (Self::DISARMED_BASE..Self::DISARMED_BASE + 4).contains(&value) => {
                source_from_index(value - Self::DISARMED_BASE)
                    .map_or(AlarmEventKind::Custom(value), AlarmEventKind::Disarmed)
            }
            other => AlarmEventKind::Custom(other),
        }
    }
}

const fn source_index(source: TriggerSource) -> u16 {
    match source {
        TriggerSource::Button => 0,
        TriggerSource::Remote => 1,
        TriggerSource::PowerMonitor => 2,
    }
}

fn source_from_index(index: u16) -> Option<TriggerSource> {
    match index {
        0 => Some(TriggerSource::Button),
        1 => Some(TriggerSource::Remote),
        2 => Some(TriggerSource::PowerMonitor),
        _ => None,
    }
}

/// Extra data attached to an event.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum AlarmPayload {
    None,
    /// Smoothed supply average at the time of the event.
    Supply { millivolts: u16 },
}

/// Telemetry record stored in the ring buffer.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct AlarmRecord<TInstant>
where
    TInstant: Copy,
{
    pub id: EventId,
    pub timestamp: TInstant,
    pub event: AlarmEventKind,
    pub details: AlarmPayload,
}

/// Records alarm events into a fixed-size ring buffer.
pub struct TelemetryRecorder<TInstant, const CAPACITY: usize = TELEMETRY_RING_CAPACITY>
where
    TInstant: Copy,
{
    ring: HistoryBuf<AlarmRecord<TInstant>, CAPACITY>,
    next_event_id: EventId,
}

impl<TInstant, const CAPACITY: usize> TelemetryRecorder<TInstant, CAPACITY>
where
    TInstant: TelemetryInstant,
{
    /// Creates a new telemetry recorder with an empty history.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            ring: HistoryBuf::new(),
            next_event_id: 0,
        }
    }

    /// Records an event and returns its identifier.
    pub fn record(
        &mut self,
        event: AlarmEventKind,
        details: AlarmPayload,
        timestamp: TInstant,
    ) -> EventId {
        let id = self.next_event_id;
        self.next_event_id = self.next_event_id.wrapping_add(1);
        self.ring.write(AlarmRecord {
            id,
            timestamp,
            event,
            details,
        });
        id
    }

    /// Iterates over the retained records, oldest first.
    pub fn oldest_first(&self) -> impl Iterator<Item = &AlarmRecord<TInstant>> {
        self.ring.oldest_ordered()
    }

    /// Returns the most recent record, if any.
    #[must_use]
    pub fn latest(&self) -> Option<&AlarmRecord<TInstant>> {
        self.ring.recent()
    }

    /// Returns the number of records currently stored.
    #[must_use]
    pub fn len(&self) -> usize {
        self.ring.len()
    }

    /// Returns `true` when no records are stored.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.ring.is_empty()
    }

    /// Time elapsed since the most recent event of `kind`, if one is retained.
    #[must_use]
    pub fn since_last(&self, kind: AlarmEventKind, now: TInstant) -> Option<Duration> {
        self.oldest_first()
            .filter(|record| record.event == kind)
            .last()
            .map(|record| now.saturating_duration_since(record.timestamp))
    }
}

impl<TInstant, const CAPACITY: usize> Default for TelemetryRecorder<TInstant, CAPACITY>
where
    TInstant: TelemetryInstant,
{
    fn default() -> Self {
        Self::new()
    }
}
