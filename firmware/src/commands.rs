//! Queue carrying decoded remote commands from the HTTP task to the
//! control task, and the acknowledgement sent back once one is applied.

#![cfg_attr(not(target_os = "none"), allow(dead_code))]

use alarm_core::RemoteCommand;
use alarm_core::control::StatusView;
#[cfg(not(target_os = "none"))]
use embassy_sync::blocking_mutex::raw::NoopRawMutex;
#[cfg(target_os = "none")]
use embassy_sync::blocking_mutex::raw::ThreadModeRawMutex;
use embassy_sync::channel::{Channel, Receiver, Sender, TrySendError};
use embassy_sync::signal::Signal;

/// Commands buffered between the two tasks.
pub const COMMAND_QUEUE_DEPTH: usize = 4;

#[cfg(target_os = "none")]
type CommandMutex = ThreadModeRawMutex;
#[cfg(not(target_os = "none"))]
type CommandMutex = NoopRawMutex;

pub type CommandQueue = Channel<CommandMutex, RemoteCommand, COMMAND_QUEUE_DEPTH>;
pub type CommandSender<'a> = Sender<'a, CommandMutex, RemoteCommand, COMMAND_QUEUE_DEPTH>;
pub type CommandReceiver<'a> = Receiver<'a, CommandMutex, RemoteCommand, COMMAND_QUEUE_DEPTH>;

/// Status published by the control task after it applies a remote command.
pub type CommandAck = Signal<CommandMutex, StatusView>;

/// Error returned when the control task has fallen behind.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub struct QueueFull(pub RemoteCommand);

/// Hands `command` to the control task without waiting.
///
/// A full queue means several requests arrived within one control wait;
/// the caller reports it instead of blocking the HTTP connection.
pub fn submit(sender: &CommandSender<'_>, command: RemoteCommand) -> Result<(), QueueFull> {
    sender
        .try_send(command)
        .map_err(|TrySendError::Full(command)| QueueFull(command))
}

/// Like [`submit`], but first clears any acknowledgement left over from an
/// earlier command so the caller only wakes for this one.
pub fn submit_acknowledged(
    sender: &CommandSender<'_>,
    ack: &CommandAck,
    command: RemoteCommand,
) -> Result<(), QueueFull> {
    ack.reset();
    submit(sender, command)
}

#[cfg(test)]
mod tests {
    use alarm_core::{AlarmState, TriggerSource};
    use embassy_futures::block_on;

    use super::*;

    #[test]
    fn submit_reports_full_queue() {
        let queue = CommandQueue::new();
        let sender = queue.sender();
        for _ in 0..COMMAND_QUEUE_DEPTH {
            assert_eq!(submit(&sender, RemoteCommand::Arm), Ok(()));
        }
        assert_eq!(
            submit(&sender, RemoteCommand::Disarm),
            Err(QueueFull(RemoteCommand::Disarm))
        );

        let receiver = queue.receiver();
        assert_eq!(receiver.try_receive(), Ok(RemoteCommand::Arm));
    }

    #[test]
    fn acknowledgement_carries_post_command_state() {
        let queue = CommandQueue::new();
        let ack = CommandAck::new();
        let armed = StatusView {
            alarm: AlarmState::Armed,
            armed_by: Some(TriggerSource::Remote),
            ..StatusView::initial()
        };

        // Left over from a request whose wait timed out.
        ack.signal(armed);

        assert_eq!(
            submit_acknowledged(&queue.sender(), &ack, RemoteCommand::Disarm),
            Ok(())
        );
        assert!(!ack.signaled());

        let receiver = queue.receiver();
        assert_eq!(receiver.try_receive(), Ok(RemoteCommand::Disarm));
        ack.signal(StatusView::initial());

        let view = block_on(ack.wait());
        assert_eq!(view.alarm, AlarmState::Disarmed);
    }
}
