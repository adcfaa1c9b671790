//! Task-step glue between the queue, the device lock, the dispatcher and
//! the monitor.
//!
//! Each function is one iteration of a firmware task loop. They take the
//! lock deadline as a future so firmware can pass
//! `Timer::after_millis(LOCK_TIMEOUT_MS)` and tests can pass
//! `core::future::ready(())`.

use crate::command::CommandKind;
use crate::device::{HidDevices, KeyboardDevice, MouseDevice};
use crate::dispatch::{DispatchOutcome, Dispatcher};
use crate::error::Error;
use crate::monitor::{ConnectionMonitor, MonitorReport};
use crate::parser::try_parse;
use crate::queue::CommandQueue;
use core::future::Future;
use embassy_futures::select::{select, Either};
use embassy_sync::blocking_mutex::raw::RawMutex;
use embassy_sync::mutex::{Mutex, MutexGuard};
use embedded_hal_async::delay::DelayNs;

/// Shared device handles, guarded by one async mutex.
pub type SharedDevices<M, K, Ms> = Mutex<M, HidDevices<K, Ms>>;

/// Result of one dispatcher iteration.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum DispatchStep {
    /// Queue was empty; the lock was not touched.
    Idle,
    Dispatched {
        kind: CommandKind,
        outcome: DispatchOutcome,
    },
}

/// Lock `mutex`, giving up when `deadline` completes first.
pub async fn lock_within<'a, M, T, F>(
    mutex: &'a Mutex<M, T>,
    deadline: F,
) -> Result<MutexGuard<'a, M, T>, Error>
where
    M: RawMutex,
    F: Future,
{
    match select(mutex.lock(), deadline).await {
        Either::First(guard) => Ok(guard),
        Either::Second(_) => Err(Error::LockTimeout),
    }
}

/// Parse one serial line and queue the command.
///
/// Returns the kind of the queued command, or why it was not queued.
pub fn accept_line<M: RawMutex, const N: usize>(
    queue: &CommandQueue<M, N>,
    line: &str,
) -> Result<CommandKind, Error> {
    let command = try_parse(line)?;
    let kind = command.kind();
    queue.enqueue(command)?;
    Ok(kind)
}

/// Dispatch the oldest queued command.
///
/// The command is only dequeued once the lock is held, so a lock timeout
/// leaves it at the head of the queue for the next iteration.
pub async fn dispatch_next<QM, DM, K, Ms, D, F, const N: usize>(
    queue: &CommandQueue<QM, N>,
    devices: &SharedDevices<DM, K, Ms>,
    dispatcher: &mut Dispatcher,
    delay: &mut D,
    now_us: u64,
    deadline: F,
) -> Result<DispatchStep, Error>
where
    QM: RawMutex,
    DM: RawMutex,
    K: KeyboardDevice,
    Ms: MouseDevice,
    D: DelayNs,
    F: Future,
{
    if queue.is_empty() {
        return Ok(DispatchStep::Idle);
    }

    let mut guard = lock_within(devices, deadline).await?;
    let Some(command) = queue.dequeue() else {
        return Ok(DispatchStep::Idle);
    };

    let outcome = dispatcher
        .dispatch(&command, &mut *guard, delay, now_us)
        .await;
    Ok(DispatchStep::Dispatched {
        kind: command.kind(),
        outcome,
    })
}

/// One connection monitor tick under the device lock.
pub async fn monitor_tick<DM, K, Ms, D, F>(
    monitor: &mut ConnectionMonitor,
    devices: &SharedDevices<DM, K, Ms>,
    delay: &mut D,
    now_ms: u64,
    deadline: F,
) -> Result<MonitorReport, Error>
where
    DM: RawMutex,
    K: KeyboardDevice,
    Ms: MouseDevice,
    D: DelayNs,
    F: Future,
{
    let mut guard = lock_within(devices, deadline).await?;
    Ok(monitor.poll(&mut *guard, delay, now_ms).await)
}
