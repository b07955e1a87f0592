//! HTTP responses served by the control endpoint.

use core::fmt::{self, Write};

use heapless::String;

use super::StatusView;
use super::request::RequestError;
use crate::alarm::AlarmState;

/// Capacity of a rendered response, headers included.
pub const STATUS_PAGE_CAPACITY: usize = 1024;

/// Fixed-capacity buffer holding one rendered response.
pub type StatusPage = String<STATUS_PAGE_CAPACITY>;

/// Response did not fit in [`STATUS_PAGE_CAPACITY`] bytes.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum RenderError {
    Overflow,
}

impl fmt::Display for RenderError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RenderError::Overflow => write!(
                f,
                "response exceeds {STATUS_PAGE_CAPACITY} bytes"
            ),
        }
    }
}

impl From<fmt::Error> for RenderError {
    fn from(_: fmt::Error) -> Self {
        RenderError::Overflow
    }
}

const HEAD: &str = "<!DOCTYPE html><html><head><meta charset='UTF-8'>\
<title>Power alarm</title>\
<style>body{background-color:black;color:white;font-family:sans-serif;text-align:center}\
a{color:#8cf}</style></head><body>";

const CONTROLS: &str = "<hr><h3>Controls</h3>\
<p><a href='/alarm/on'><b>Arm alarm</b></a></p>\
<p><a href='/alarm/off'><b>Disarm alarm</b></a></p>";

const TAIL: &str = "</body></html>\r\n";

/// Renders the status page for `view` as a complete `200 OK` response.
pub fn render_status(view: &StatusView) -> Result<StatusPage, RenderError> {
    let mut page = StatusPage::new();
    write_status(&mut page, view)?;
    Ok(page)
}

/// Renders an error response for a request that could not be decoded.
pub fn render_error(error: RequestError) -> Result<StatusPage, RenderError> {
    let mut page = StatusPage::new();
    let (code, reason) = error.status();
    write!(
        page,
        "HTTP/1.1 {code} {reason}\r\n\
         Content-Type: text/plain; charset=UTF-8\r\n\
         Connection: close\r\n\r\n\
         {error}\r\n"
    )?;
    Ok(page)
}

/// Owned rendering for hosts with an allocator.
#[cfg(feature = "alloc")]
#[must_use]
pub fn render_status_owned(view: &StatusView) -> alloc::string::String {
    let mut page = alloc::string::String::new();
    // Writing into a growable string cannot fail.
    let _ = write_status(&mut page, view);
    page
}

fn write_status<W: Write>(out: &mut W, view: &StatusView) -> fmt::Result {
    out.write_str(
        "HTTP/1.1 200 OK\r\n\
         Content-Type: text/html; charset=UTF-8\r\n\
         Connection: close\r\n\r\n",
    )?;
    out.write_str(HEAD)?;
    out.write_str("<h1>Power alarm</h1>")?;

    let label = match view.alarm {
        AlarmState::Armed => "Armed",
        AlarmState::Disarmed => "Disarmed",
    };
    write!(out, "<h2>Alarm: <b>{label}</b></h2>")?;

    if let Some(source) = view.armed_by.filter(|_| view.alarm.is_armed()) {
        write!(out, "<p>Armed by: {source}</p>")?;
    }

    match view.supply_millivolts {
        Some(millivolts) => write!(
            out,
            "<p>Supply: {}.{:02} V ({})</p>",
            millivolts / 1000,
            (millivolts % 1000) / 10,
            view.presence
        )?,
        None => write!(out, "<p>Supply: no reading ({})</p>", view.presence)?,
    }

    out.write_str(CONTROLS)?;
    out.write_str(TAIL)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::alarm::TriggerSource;
    use crate::presence::PresenceState;

    fn armed_view() -> StatusView {
        StatusView {
            alarm: AlarmState::Armed,
            armed_by: Some(TriggerSource::PowerMonitor),
            presence: PresenceState::Absent,
            supply_millivolts: Some(4_512),
        }
    }

    #[test]
    fn status_page_reports_state_and_supply() {
        let page = render_status(&armed_view()).expect("page fits");
        assert!(page.starts_with("HTTP/1.1 200 OK\r\n"));
        assert!(page.contains("<b>Armed</b>"));
        assert!(page.contains("Armed by: power-monitor"));
        assert!(page.contains("Supply: 4.51 V (absent)"));
        assert!(page.contains("href='/alarm/on'"));
        assert!(page.contains("href='/alarm/off'"));
        assert!(page.ends_with("</html>\r\n"));
    }

    #[test]
    fn disarmed_page_omits_trigger_source() {
        let view = StatusView {
            alarm: AlarmState::Disarmed,
            armed_by: Some(TriggerSource::Button),
            ..StatusView::initial()
        };
        let page = render_status(&view).expect("page fits");
        assert!(page.contains("<b>Disarmed</b>"));
        assert!(!page.contains("Armed by"));
        assert!(page.contains("no reading (present)"));
    }

    #[test]
    fn error_page_carries_status_code() {
        let page = render_error(RequestError::UnsupportedMethod).expect("page fits");
        assert!(page.starts_with("HTTP/1.1 405 Method Not Allowed\r\n"));
        assert!(page.contains("unsupported method"));
    }
}
