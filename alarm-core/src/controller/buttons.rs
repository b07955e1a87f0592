use core::fmt;

/// Manual control buttons.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum ButtonId {
    AlarmOn,
    AlarmOff,
}

impl fmt::Display for ButtonId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ButtonId::AlarmOn => f.write_str("alarm-on"),
            ButtonId::AlarmOff => f.write_str("alarm-off"),
        }
    }
}

/// Capability provider for the manual buttons.
pub trait ButtonInputs {
    /// Returns `true` while the button is held down.
    fn read_button(&mut self, id: ButtonId) -> bool;
}

/// Pressed/released levels sampled in one poll.
#[derive(Copy, Clone, Debug, Default, Eq, PartialEq)]
pub struct ButtonLevels {
    pub alarm_on: bool,
    pub alarm_off: bool,
}

impl ButtonLevels {
    /// Samples both buttons from `buttons`.
    pub fn sample<B: ButtonInputs>(buttons: &mut B) -> Self {
        Self {
            alarm_on: buttons.read_button(ButtonId::AlarmOn),
            alarm_off: buttons.read_button(ButtonId::AlarmOff),
        }
    }
}

/// Press edges detected between two polls.
#[derive(Copy, Clone, Debug, Default, Eq, PartialEq)]
pub struct ButtonEdges {
    pub alarm_on: bool,
    pub alarm_off: bool,
}

/// Converts polled levels into press edges.
///
/// A held button produces exactly one edge; it must be released before it
/// can trigger again. Sampling at the poll cadence also rejects contact
/// bounce shorter than one poll.
#[derive(Clone, Debug, Default)]
pub struct EdgeDetector {
    previous: ButtonLevels,
}

impl EdgeDetector {
    #[must_use]
    pub const fn new() -> Self {
        Self {
            previous: ButtonLevels {
                alarm_on: false,
                alarm_off: false,
            },
        }
    }

    /// Records `levels` and returns the buttons that were just pressed.
    pub fn update(&mut self, levels: ButtonLevels) -> ButtonEdges {
        let edges = ButtonEdges {
            alarm_on: levels.alarm_on && !self.previous.alarm_on,
            alarm_off: levels.alarm_off && !self.previous.alarm_off,
        };
        self.previous = levels;
        edges
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const ON_HELD: ButtonLevels = ButtonLevels {
        alarm_on: true,
        alarm_off: false,
    };

    #[test]
    fn held_button_fires_once() {
        let mut detector = EdgeDetector::new();
        assert!(detector.update(ON_HELD).alarm_on);
        assert!(!detector.update(ON_HELD).alarm_on);
        assert!(!detector.update(ON_HELD).alarm_on);

        detector.update(ButtonLevels::default());
        assert!(detector.update(ON_HELD).alarm_on);
    }

    #[test]
    fn both_buttons_report_independently() {
        let mut detector = EdgeDetector::new();
        detector.update(ON_HELD);
        let edges = detector.update(ButtonLevels {
            alarm_on: true,
            alarm_off: true,
        });
        assert_eq!(
            edges,
            ButtonEdges {
                alarm_on: false,
                alarm_off: true
            }
        );
    }
}
