use std::io;

#[allow(dead_code)]
#[path = "../session.rs"]
mod session;

use session::{Session, TranscriptProfile};

fn main() -> io::Result<()> {
    record_profile(TranscriptProfile::PowerLoss)?;
    record_profile(TranscriptProfile::Manual)?;
    record_profile(TranscriptProfile::Remote)?;
    Ok(())
}

fn record_profile(profile: TranscriptProfile) -> io::Result<()> {
    let mut session = Session::new(profile)?;
    let script: &[&str] = match profile {
        TranscriptProfile::PowerLoss => &[
            "status",
            "tick 10",
            "volts 4.5",
            "tick 5",
            "volts 0",
            "tick 15",
            "status",
            "volts 5.1",
            "tick 15",
            "status",
            "tap off",
            "events",
        ],
        TranscriptProfile::Manual => &[
            "tick 10",
            "press on",
            "tick 3",
            "release on",
            "wait 1400",
            "press on",
            "press off",
            "tick",
            "release on",
            "release off",
            "status",
        ],
        TranscriptProfile::Remote => &[
            "tick 10",
            "http /alarm/on",
            "wait 600",
            "http /alarme/off",
            "http /alarm/off",
            "http /",
            "http POST /alarm/on HTTP/1.1",
            "http GET /alarm/on HTTP/1.1 trailing",
            "page",
            "events",
        ],
        TranscriptProfile::Interactive => &[],
    };

    for command in script {
        session.handle_command(command)?;
    }
    Ok(())
}
