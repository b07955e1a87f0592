use core::cmp;

use alarm_core::{PollInputs, TelemetryInstant};
use embassy_futures::select::{Either, select};
use embassy_time::Timer;

use super::Controller;
use crate::clock::{FirmwareInstant, core_duration_to_embassy};
use crate::commands::{CommandAck, CommandReceiver};
use crate::hw::PicoButtons;
use crate::hw::power::UsbRailAdc;
use crate::status;
use crate::telemetry::{log_report, log_transition};

/// Single owner of the alarm controller.
///
/// Samples the rail and buttons once per poll interval and services the
/// actuator in between. Remote commands race the wait so a disarm lands as
/// soon as the HTTP task hands it over; the resulting status is sent back
/// through `ack`.
#[embassy_executor::task]
pub async fn run(
    mut controller: Controller,
    mut rail: UsbRailAdc<'static>,
    mut buttons: PicoButtons<'static>,
    commands: CommandReceiver<'static>,
    ack: &'static CommandAck,
) -> ! {
    let poll_interval = controller.config().poll_interval();
    let mut next_poll = FirmwareInstant::now();

    loop {
        let now = FirmwareInstant::now();
        let wait = if now >= next_poll {
            let inputs = PollInputs::sample(&mut rail, &mut buttons, None);
            let report = controller.poll(now, inputs);
            log_report(&report, now);
            next_poll = now + poll_interval;
            report.next_wake
        } else {
            cmp::min(
                controller.service(now),
                next_poll.saturating_duration_since(now),
            )
        };
        status::publish(&controller.status_view());

        let timer = Timer::after(core_duration_to_embassy(wait));
        if let Either::Second(command) = select(timer, commands.receive()).await {
            let now = FirmwareInstant::now();
            let transition = controller.apply_remote(now, command);
            log_transition(transition, now);
            let view = controller.status_view();
            status::publish(&view);
            ack.signal(view);
        }
    }
}
