//! Bounded command queue between the serial reader and the dispatcher.
//!
//! A thin wrapper over `embassy_sync::channel::Channel` that only exposes
//! the non-blocking half of the API: the producer must never stall on a
//! slow host, so a full queue drops the new command and says so.

use crate::command::Command;
use crate::error::Error;
use embassy_sync::blocking_mutex::raw::RawMutex;
use embassy_sync::channel::Channel;

/// Bounded FIFO of commands, `N` slots.
///
/// Firmware uses `CriticalSectionRawMutex` so any task may enqueue;
/// host tests use `NoopRawMutex`.
pub struct CommandQueue<M: RawMutex, const N: usize> {
    channel: Channel<M, Command, N>,
}

impl<M: RawMutex, const N: usize> CommandQueue<M, N> {
    pub const fn new() -> Self {
        Self {
            channel: Channel::new(),
        }
    }

    /// Append a command without waiting.
    ///
    /// Returns `Error::QueueFull` when all slots are taken; the command is
    /// dropped and the queued ones are left untouched.
    pub fn enqueue(&self, command: Command) -> Result<(), Error> {
        self.channel
            .try_send(command)
            .map_err(|_| Error::QueueFull)
    }

    /// Take the oldest command, or `None` when empty.
    pub fn dequeue(&self) -> Option<Command> {
        self.channel.try_receive().ok()
    }

    /// Wait until at least one command is queued, without taking it.
    pub async fn wait_ready(&self) {
        self.channel.ready_to_receive().await
    }

    pub fn len(&self) -> usize {
        self.channel.len()
    }

    pub fn is_empty(&self) -> bool {
        self.channel.is_empty()
    }

    pub fn is_full(&self) -> bool {
        self.channel.is_full()
    }

    pub const fn capacity(&self) -> usize {
        N
    }
}

impl<M: RawMutex, const N: usize> Default for CommandQueue<M, N> {
    fn default() -> Self {
        Self::new()
    }
}
