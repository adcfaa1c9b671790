//! UART command line - line reader and status writer tasks.
//!
//! The reader never blocks on the queue: a full queue or a bad line is
//! reported on the status channel and the next line is read.

use crate::config::{COMMAND_QUEUE_CAPACITY, MAX_LINE_LEN};
use crate::line::LineBuffer;
use crate::queue::CommandQueue;
use crate::runtime;
use crate::status::StatusMessage;
use defmt::{debug, info, warn};
use embassy_nrf::peripherals::UARTE0;
use embassy_nrf::uarte::{UarteRx, UarteTx};
use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::channel::Channel;

/// Depth of the status channel towards the writer task.
pub const STATUS_CHANNEL_DEPTH: usize = 8;

pub type Queue = CommandQueue<CriticalSectionRawMutex, COMMAND_QUEUE_CAPACITY>;
pub type StatusChannel = Channel<CriticalSectionRawMutex, StatusMessage, STATUS_CHANNEL_DEPTH>;

/// Hand a message to the writer task, dropping it when the channel is full.
pub fn report(status: &StatusChannel, message: StatusMessage) {
    if status.try_send(message).is_err() {
        debug!("status channel full, message dropped");
    }
}

/// Read bytes, assemble lines and queue the parsed commands.
///
/// Runs forever; must be spawned as a dedicated Embassy task.
pub async fn reader_task(
    mut rx: UarteRx<'static, UARTE0>,
    queue: &'static Queue,
    status: &'static StatusChannel,
) -> ! {
    info!("serial reader started");

    let mut lines: LineBuffer<MAX_LINE_LEN> = LineBuffer::new();
    let mut byte = [0u8; 1];

    loop {
        if rx.read(&mut byte).await.is_err() {
            if lines.is_empty() {
                warn!("UART read error");
            } else {
                warn!("UART read error, {} bytes discarded", lines.len());
                lines.clear();
            }
            continue;
        }

        let Some(line) = lines.push(byte[0]) else {
            continue;
        };

        let result = line.and_then(|line| {
            if line.trim().is_empty() {
                return Ok(None);
            }
            runtime::accept_line(queue, &line).map(Some)
        });

        match result {
            Ok(Some(kind)) => debug!("queued {} ({} pending)", kind, queue.len()),
            Ok(None) => {}
            Err(e) => {
                warn!("command rejected: {}", e);
                report(status, StatusMessage::Error(e));
            }
        }
    }
}

/// Print every status message in order, each followed by its follow-up
/// text (the help banner after the `S` marker).
///
/// Runs forever; must be spawned as a dedicated Embassy task.
pub async fn writer_task(mut tx: UarteTx<'static, UARTE0>, status: &'static StatusChannel) -> ! {
    loop {
        let message = status.receive().await;
        let line = message.encode();
        if tx.write(line.as_bytes()).await.is_err() {
            warn!("UART write failed");
        }
        if let Some(text) = message.follow_up() {
            if tx.write(text.as_bytes()).await.is_err() {
                warn!("UART write failed (help)");
            }
        }
    }
}
