use alarm_core::control::{StatusPage, decode_request, render_error, render_status};
use embassy_net::Stack;
use embassy_net::tcp::TcpSocket;
use embassy_time::{Duration, with_timeout};
use embedded_io_async::Write;

use crate::commands::{CommandAck, CommandSender, QueueFull, submit_acknowledged};
use crate::status;
use crate::telemetry::log_request;

const HTTP_PORT: u16 = 80;
const SOCKET_TIMEOUT: Duration = Duration::from_secs(5);
const ACK_TIMEOUT: Duration = Duration::from_millis(500);
const RX_BUFFER_LEN: usize = 1024;
const TX_BUFFER_LEN: usize = 2048;
const REQUEST_BUFFER_LEN: usize = 512;

/// Serves the status page and forwards arm/disarm requests.
///
/// Connections are handled one at a time and closed after each reply.
#[embassy_executor::task]
pub async fn run(
    stack: Stack<'static>,
    commands: CommandSender<'static>,
    ack: &'static CommandAck,
) -> ! {
    let mut rx_buffer = [0u8; RX_BUFFER_LEN];
    let mut tx_buffer = [0u8; TX_BUFFER_LEN];
    let mut request = [0u8; REQUEST_BUFFER_LEN];

    loop {
        let mut socket = TcpSocket::new(stack, &mut rx_buffer, &mut tx_buffer);
        socket.set_timeout(Some(SOCKET_TIMEOUT));

        if let Err(error) = socket.accept(HTTP_PORT).await {
            defmt::warn!("http: accept failed: {:?}", error);
            continue;
        }

        let received = match socket.read(&mut request).await {
            Ok(0) => {
                socket.abort();
                continue;
            }
            Ok(received) => received,
            Err(error) => {
                defmt::warn!("http: read failed: {:?}", error);
                socket.abort();
                continue;
            }
        };

        let page = respond(&request[..received], &commands, ack).await;
        match page {
            Some(page) => {
                if let Err(error) = socket.write_all(page.as_bytes()).await {
                    defmt::warn!("http: write failed: {:?}", error);
                }
                if let Err(error) = socket.flush().await {
                    defmt::warn!("http: flush failed: {:?}", error);
                }
            }
            None => defmt::error!("http: response exceeded page buffer"),
        }
        socket.close();
    }
}

async fn respond(
    raw: &[u8],
    commands: &CommandSender<'static>,
    ack: &CommandAck,
) -> Option<StatusPage> {
    let outcome = decode_request(raw);
    log_request(outcome);

    let request = match outcome {
        Ok(request) => request,
        Err(error) => return render_error(error).ok(),
    };

    let Some(command) = request.command() else {
        return render_status(&status::snapshot()).ok();
    };

    if let Err(QueueFull(_)) = submit_acknowledged(commands, ack, command) {
        defmt::warn!("http: command queue full, request dropped");
        return render_status(&status::snapshot()).ok();
    }

    // Render the state the control task reports after applying the command.
    let view = match with_timeout(ACK_TIMEOUT, ack.wait()).await {
        Ok(view) => view,
        Err(_) => {
            defmt::warn!("http: control task did not acknowledge command");
            status::snapshot()
        }
    };
    render_status(&view).ok()
}
