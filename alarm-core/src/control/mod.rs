//! Control endpoint contract.
//!
//! The network front-end hands each raw request to [`request`] for decoding
//! into at most one [`RemoteCommand`](crate::alarm::RemoteCommand), and
//! renders the reply with [`page`]. Only the decoded command crosses into
//! the control loop; the status page reads a [`StatusView`] snapshot.

pub mod page;
pub mod request;

pub use page::{RenderError, StatusPage, render_error, render_status};
pub use request::{ControlRequest, RequestError, decode_request, parse_request_line};

use crate::alarm::{AlarmState, TriggerSource};
use crate::presence::PresenceState;

/// Read-only snapshot rendered by the status page.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub struct StatusView {
    pub alarm: AlarmState,
    pub armed_by: Option<TriggerSource>,
    pub presence: PresenceState,
    /// Smoothed supply voltage, if a sample has been taken.
    pub supply_millivolts: Option<u16>,
}

impl StatusView {
    /// View reported before the control loop has produced anything.
    #[must_use]
    pub const fn initial() -> Self {
        Self {
            alarm: AlarmState::Disarmed,
            armed_by: None,
            presence: PresenceState::Present,
            supply_millivolts: None,
        }
    }
}

impl Default for StatusView {
    fn default() -> Self {
        Self::initial()
    }
}
