use std::cell::RefCell;
use std::rc::Rc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use super::hardware::Hardware;

/// Anything reacting to the clock heartbeat
pub trait ClockListener {
    /// Called once per clock tick
    fn pulse(&mut self);
}

/// A clock listener, shared between the clock and its owner
pub type SharedListener = Rc<RefCell<dyn ClockListener>>;

/// Handle used to stop a clock from outside of it.
///
/// It can be cloned and sent to other threads (the halt instruction and the
/// keyboard both hold one).
#[derive(Debug, Clone)]
pub struct StopHandle {
    running: Arc<AtomicBool>,
}

impl StopHandle {
    fn new() -> Self {
        Self {
            running: Arc::new(AtomicBool::new(true)),
        }
    }

    /// Cancel every future tick
    pub fn stop(&self) {
        self.running.store(false, Ordering::SeqCst);
    }

    #[must_use]
    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }

    fn resume(&self) {
        self.running.store(true, Ordering::SeqCst);
    }
}

/// Periodic pulse source.
///
/// The clock knows nothing about what a pulse means: it broadcasts it to
/// every registered listener, synchronously and in registration order.
pub struct Clock {
    hardware: Hardware,
    listeners: Vec<SharedListener>,
    interval: Duration,
    handle: StopHandle,
    ticks: u64,
}

impl std::fmt::Debug for Clock {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Clock")
            .field("listeners", &self.listeners.len())
            .field("interval", &self.interval)
            .field("running", &self.handle.is_running())
            .field("ticks", &self.ticks)
            .finish()
    }
}

impl Clock {
    #[must_use]
    pub fn new(interval: Duration, debug: bool) -> Self {
        let hardware = Hardware::new(0, "Clock").with_debug(debug);
        hardware.log(format_args!("created - interval: {interval:?}"));
        Self {
            hardware,
            listeners: Vec::new(),
            interval,
            handle: StopHandle::new(),
            ticks: 0,
        }
    }

    #[must_use]
    pub fn hardware(&self) -> &Hardware {
        &self.hardware
    }

    pub fn hardware_mut(&mut self) -> &mut Hardware {
        &mut self.hardware
    }

    /// Add a listener at the end of the list. There is no way to remove it.
    pub fn register(&mut self, listener: SharedListener) {
        self.listeners.push(listener);
        self.hardware
            .log(format_args!("registered listener #{}", self.listeners.len()));
    }

    #[must_use]
    pub fn interval(&self) -> Duration {
        self.interval
    }

    #[must_use]
    pub fn ticks(&self) -> u64 {
        self.ticks
    }

    #[must_use]
    pub fn stop_handle(&self) -> StopHandle {
        self.handle.clone()
    }

    #[must_use]
    pub fn is_running(&self) -> bool {
        self.handle.is_running()
    }

    /// Cancel future ticks. Pulses already delivered are not revoked.
    pub fn stop(&mut self) {
        self.hardware.log("stopping pulses");
        self.handle.stop();
    }

    /// Allow a stopped clock to deliver pulses again
    pub fn start(&mut self) {
        self.hardware.log("starting pulses");
        self.handle.resume();
    }

    /// Deliver one pulse to every listener.
    ///
    /// Returns `false` without notifying anyone if the clock was stopped.
    ///
    /// # Panics
    ///
    /// Panics if a listener is already mutably borrowed, which would mean a
    /// listener tried to pulse the clock from its own pulse handler.
    pub fn pulse(&mut self) -> bool {
        if !self.handle.is_running() {
            return false;
        }

        self.ticks += 1;
        self.hardware
            .log(format_args!("Clock Pulse Initiated - tick {}", self.ticks));
        for listener in &self.listeners {
            listener.borrow_mut().pulse();
        }

        true
    }

    /// Pulse at the configured interval until stopped, or until `limit`
    /// pulses were delivered by this call.
    ///
    /// Returns the number of pulses delivered.
    pub fn run(&mut self, limit: Option<u64>) -> u64 {
        let mut delivered = 0;
        loop {
            if matches!(limit, Some(limit) if delivered >= limit) {
                break;
            }

            std::thread::sleep(self.interval);
            if !self.pulse() {
                break;
            }
            delivered += 1;
        }

        delivered
    }
}
