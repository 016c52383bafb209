//! The queue engine: join and advance over the counter store and ticket
//! collection.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use tracing::{debug, info, warn};

use crate::department::DepartmentStore;
use crate::notify::{ChangeNotifier, Trigger};
use crate::ticket::{NewTicket, Ticket, TicketStatus, TicketStore};

use super::{AdvanceOutcome, JoinOutcome, JoinRequest, QueueError, QueueStatus};

/// One lock per department id, created on first use. Join and advance hold
/// their department's lock for the whole operation; departments never
/// contend with each other.
struct DepartmentLocks {
    shards: Mutex<HashMap<String, Arc<Mutex<()>>>>,
}

impl DepartmentLocks {
    fn new() -> Self {
        Self {
            shards: Mutex::new(HashMap::new()),
        }
    }

    fn for_department(&self, department_id: &str) -> Arc<Mutex<()>> {
        let mut shards = self.shards.lock().unwrap();
        shards
            .entry(department_id.to_string())
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone()
    }
}

/// The ticket queue engine.
///
/// All mutation of the counter store and ticket collection goes through
/// `join` and `advance`; the query operations never touch the state machine.
pub struct QueueEngine {
    departments: Arc<dyn DepartmentStore>,
    tickets: Arc<dyn TicketStore>,
    notifier: ChangeNotifier,
    locks: DepartmentLocks,
    service_minutes_per_ticket: u32,
}

impl QueueEngine {
    pub fn new(
        departments: Arc<dyn DepartmentStore>,
        tickets: Arc<dyn TicketStore>,
        notifier: ChangeNotifier,
        service_minutes_per_ticket: u32,
    ) -> Self {
        Self {
            departments,
            tickets,
            notifier,
            locks: DepartmentLocks::new(),
            service_minutes_per_ticket,
        }
    }

    /// Join a department's queue.
    ///
    /// Idempotent per contact within the pending window: a contact string
    /// that already holds a `pending` ticket gets that ticket's number back
    /// instead of a new one. A contact whose ticket is already `serving` or
    /// finished may join again.
    pub fn join(&self, request: JoinRequest) -> Result<JoinOutcome, QueueError> {
        let lock = self.locks.for_department(&request.department_id);
        let _guard = lock.lock().unwrap();

        let department = self.departments.get(&request.department_id)?;

        if let Some(existing) = self
            .tickets
            .find_pending_by_phone(&department.id, &request.phone)?
        {
            debug!(
                department = %department.name,
                number = existing.ticket_number,
                "contact already queued, returning existing ticket"
            );
            return Ok(JoinOutcome {
                ticket_number: existing.ticket_number,
                already_queued: true,
            });
        }

        let number = self.departments.bump_last_ticket(&department.id)?;
        let ticket = self.tickets.create(NewTicket {
            department_id: department.id.clone(),
            holder_id: request.holder_id,
            holder_name: request.holder_name,
            phone: request.phone,
            ticket_number: number,
        })?;

        info!(
            department = %department.name,
            number = ticket.ticket_number,
            "ticket issued"
        );
        self.notifier.publish(&department.id, Trigger::Join);

        Ok(JoinOutcome {
            ticket_number: ticket.ticket_number,
            already_queued: false,
        })
    }

    /// Complete the currently served ticket and promote the next pending
    /// one, in FIFO order of ticket numbers.
    pub fn advance(&self, department_id: &str) -> Result<AdvanceOutcome, QueueError> {
        let lock = self.locks.for_department(department_id);
        let _guard = lock.lock().unwrap();

        let department = self.departments.get(department_id)?;

        // The counter is the authority for "is anyone being served"; a
        // missing or already-finished ticket is an inconsistency to log
        // and step over, not a reason to abort.
        if department.current_ticket > 0 {
            match self
                .tickets
                .find_by_number(&department.id, department.current_ticket)?
            {
                Some(current) if current.status == TicketStatus::Serving => {
                    self.tickets
                        .set_status(&current.id, TicketStatus::Completed)?;
                }
                Some(current) => {
                    warn!(
                        department = %department.name,
                        number = department.current_ticket,
                        status = current.status.as_str(),
                        "current ticket is not serving, skipping completion"
                    );
                }
                None => {
                    warn!(
                        department = %department.name,
                        number = department.current_ticket,
                        "current ticket missing from collection, skipping completion"
                    );
                }
            }
        }

        let outcome = match self.tickets.next_pending(&department.id)? {
            Some(next) => {
                self.tickets.set_status(&next.id, TicketStatus::Serving)?;
                self.departments
                    .set_current_ticket(&department.id, next.ticket_number)?;
                info!(
                    department = %department.name,
                    number = next.ticket_number,
                    "now serving"
                );
                AdvanceOutcome::Serving(next.ticket_number)
            }
            None => {
                self.departments.set_current_ticket(&department.id, 0)?;
                debug!(department = %department.name, "queue empty");
                AdvanceOutcome::Empty
            }
        };

        self.notifier.publish(&department.id, Trigger::Next);
        Ok(outcome)
    }

    /// Pending and serving tickets of a department, ascending by number.
    pub fn list_active(&self, department_id: &str) -> Result<Vec<Ticket>, QueueError> {
        let department = self.departments.get(department_id)?;
        Ok(self.tickets.list_active_by_department(&department.id)?)
    }

    /// Pending and serving tickets of a holder, newest first.
    pub fn list_for_holder(&self, holder_id: &str) -> Result<Vec<Ticket>, QueueError> {
        Ok(self.tickets.list_active_by_holder(holder_id)?)
    }

    /// Snapshot of a department's queue with a derived wait estimate.
    pub fn status(&self, department_id: &str) -> Result<QueueStatus, QueueError> {
        let department = self.departments.get(department_id)?;
        let queue_length = self.tickets.count_pending(&department.id)?;

        Ok(QueueStatus {
            department_name: department.name,
            current_ticket: department.current_ticket,
            last_ticket: department.last_ticket_assigned,
            queue_length,
            estimated_wait_minutes: queue_length * u64::from(self.service_minutes_per_ticket),
        })
    }
}
