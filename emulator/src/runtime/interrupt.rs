//! Interrupt requests, interrupt-capable devices and the controller queueing
//! their requests.
//!
//! Devices run on their own (usually on another thread, waiting for some
//! external event) and push requests through an [`InterruptLine`]. The CPU
//! polls the [`InterruptController`] between instructions.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use super::hardware::Hardware;

/// Priority of an interrupt. Higher values are serviced first, `0` is never
/// used by a device.
pub type Priority = u8;

/// A pending request from a device
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InterruptRequest {
    /// Line number of the requesting device
    pub irq: u8,

    /// Name of the requesting device
    pub name: String,

    /// Priority of the requesting device
    pub priority: Priority,

    /// Enqueue order, assigned by the controller
    sequence: u64,
}

impl InterruptRequest {
    #[must_use]
    pub fn new(irq: u8, name: impl Into<String>, priority: Priority) -> Self {
        Self {
            irq,
            name: name.into(),
            priority,
            sequence: 0,
        }
    }

    /// Build the request a device would raise
    #[must_use]
    pub fn from_device(device: &dyn InterruptDevice) -> Self {
        Self::new(device.irq(), device.name(), device.priority())
    }
}

/// Capabilities of a device able to raise interrupts
pub trait InterruptDevice {
    /// Interrupt line number
    fn irq(&self) -> u8;

    /// Human readable name
    fn name(&self) -> &str;

    /// Fixed priority, `1` being the lowest
    fn priority(&self) -> Priority;

    /// Start producing interrupt requests on `line`
    fn listen(&mut self, line: InterruptLine);

    /// Perform the device action, once one of its interrupts was serviced
    fn execute(&mut self);
}

#[derive(Debug, Default)]
struct PendingQueue {
    requests: Vec<InterruptRequest>,
    next_sequence: u64,
}

fn lock(queue: &Mutex<PendingQueue>) -> MutexGuard<'_, PendingQueue> {
    // The queue is left consistent by every critical section, so a poisoned
    // lock is still usable
    queue.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Append-only handle on the pending interrupt queue.
///
/// It is cheap to clone and can be sent to the thread producing requests.
#[derive(Debug, Clone)]
pub struct InterruptLine {
    queue: Arc<Mutex<PendingQueue>>,
}

impl InterruptLine {
    /// Queue a request. Safe to call from any thread, at any time.
    pub fn raise(&self, mut request: InterruptRequest) {
        let mut queue = lock(&self.queue);
        request.sequence = queue.next_sequence;
        queue.next_sequence += 1;
        queue.requests.push(request);
    }
}

/// Holds the registered devices and the queue of pending requests
pub struct InterruptController {
    hardware: Hardware,
    devices: Vec<Box<dyn InterruptDevice>>,
    pending: Arc<Mutex<PendingQueue>>,
}

impl std::fmt::Debug for InterruptController {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InterruptController")
            .field(
                "devices",
                &self.devices.iter().map(|d| d.name()).collect::<Vec<_>>(),
            )
            .field("pending", &lock(&self.pending).requests)
            .finish_non_exhaustive()
    }
}

impl Default for InterruptController {
    fn default() -> Self {
        Self::new(false)
    }
}

impl InterruptController {
    #[must_use]
    pub fn new(debug: bool) -> Self {
        let hardware = Hardware::new(0, "IC").with_debug(debug);
        hardware.log("Created");
        Self {
            hardware,
            devices: Vec::new(),
            pending: Arc::default(),
        }
    }

    #[must_use]
    pub fn hardware(&self) -> &Hardware {
        &self.hardware
    }

    pub fn hardware_mut(&mut self) -> &mut Hardware {
        &mut self.hardware
    }

    /// Add a device to the registry.
    ///
    /// This is different from queueing one of its requests, and is only
    /// expected at boot time.
    pub fn register_device(&mut self, device: Box<dyn InterruptDevice>) {
        self.hardware.log(format_args!(
            "registered device {} (irq {}, priority {})",
            device.name(),
            device.irq(),
            device.priority()
        ));
        self.devices.push(device);
    }

    /// Names of the registered devices, in registration order
    #[must_use]
    pub fn devices(&self) -> Vec<&str> {
        self.devices.iter().map(|d| d.name()).collect()
    }

    /// A new handle on the pending queue
    #[must_use]
    pub fn line(&self) -> InterruptLine {
        InterruptLine {
            queue: Arc::clone(&self.pending),
        }
    }

    /// Tell every registered device to start listening
    pub fn start_listening(&mut self) {
        self.hardware.log("Starting listeners");
        for device in &mut self.devices {
            device.listen(InterruptLine {
                queue: Arc::clone(&self.pending),
            });
        }
    }

    /// Queue a request
    pub fn accept_interrupt(&self, request: InterruptRequest) {
        self.hardware.log(format_args!(
            "accepted interrupt from {} (priority {})",
            request.name, request.priority
        ));
        self.line().raise(request);
    }

    /// Number of requests waiting to be serviced
    #[must_use]
    pub fn pending_count(&self) -> usize {
        lock(&self.pending).requests.len()
    }

    /// Re-order the queue and return the highest pending priority, if any.
    ///
    /// Requests are sorted by descending priority, then by enqueue order.
    #[must_use]
    pub fn has_pending_interrupt(&self) -> Option<Priority> {
        let mut queue = lock(&self.pending);
        queue
            .requests
            .sort_by(|a, b| b.priority.cmp(&a.priority).then(a.sequence.cmp(&b.sequence)));
        queue.requests.first().map(|r| r.priority)
    }

    /// Remove the front request of the queue.
    ///
    /// Callers should use [`has_pending_interrupt`] first, so that the queue
    /// is ordered by priority.
    ///
    /// [`has_pending_interrupt`]: InterruptController::has_pending_interrupt
    pub fn dequeue_interrupt(&self) -> Option<InterruptRequest> {
        let mut queue = lock(&self.pending);
        if queue.requests.is_empty() {
            None
        } else {
            Some(queue.requests.remove(0))
        }
    }

    /// Run the action of the device which raised `request`.
    ///
    /// Returns `false` if no registered device matches the request.
    pub fn service(&mut self, request: &InterruptRequest) -> bool {
        let Some(device) = self.devices.iter_mut().find(|d| d.irq() == request.irq) else {
            self.hardware.log(format_args!(
                "no device registered for irq {}",
                request.irq
            ));
            return false;
        };

        self.hardware.log(format_args!(
            "servicing interrupt from {} (irq {})",
            request.name, request.irq
        ));
        device.execute();
        true
    }
}
