//! Producer-facing inbox: the request and fleet-state FIFOs plus the
//! shutdown flag.
//!
//! Producers (request generators, vehicle telemetry) hold cloned
//! [`InboxHandle`]s and enqueue concurrently under short mutexes; the
//! matcher drains both queues exactly once per tick from its single worker.
//! Ordering within each queue is the enqueue order, which is what gives the
//! batch its FIFO processing guarantee.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use rp_model::{Customer, Vehicle};

#[derive(Default)]
struct Shared {
    customers: Mutex<VecDeque<Customer>>,
    vehicles: Mutex<VecDeque<Vehicle>>,
    shutdown: AtomicBool,
}

/// Cloneable handle for feeding the matcher from any thread.
#[derive(Clone, Default)]
pub struct InboxHandle {
    inner: Arc<Shared>,
}

impl InboxHandle {
    pub fn new() -> Self {
        Self::default()
    }

    /// Enqueue a newly arrived customer.
    pub fn send_customer(&self, customer: Customer) {
        self.inner
            .lock_customers()
            .push_back(customer);
    }

    /// Enqueue an authoritative vehicle snapshot.
    pub fn send_vehicle(&self, vehicle: Vehicle) {
        self.inner
            .lock_vehicles()
            .push_back(vehicle);
    }

    /// Ask the matcher to stop.  Checked at every tick boundary and at
    /// every candidate iteration.
    pub fn request_shutdown(&self) {
        self.inner.shutdown.store(true, Ordering::Relaxed);
    }

    pub fn is_shutdown(&self) -> bool {
        self.inner.shutdown.load(Ordering::Relaxed)
    }

    /// Number of customers waiting in the queue (producers' view; racy by
    /// nature, useful for pacing only).
    pub fn queued_customers(&self) -> usize {
        self.inner.lock_customers().len()
    }

    pub(crate) fn drain_customers(&self) -> Vec<Customer> {
        self.inner.lock_customers().drain(..).collect()
    }

    pub(crate) fn drain_vehicles(&self) -> Vec<Vehicle> {
        self.inner.lock_vehicles().drain(..).collect()
    }
}

impl Shared {
    fn lock_customers(&self) -> std::sync::MutexGuard<'_, VecDeque<Customer>> {
        self.customers.lock().expect("customer queue poisoned")
    }

    fn lock_vehicles(&self) -> std::sync::MutexGuard<'_, VecDeque<Vehicle>> {
        self.vehicles.lock().expect("vehicle queue poisoned")
    }
}
