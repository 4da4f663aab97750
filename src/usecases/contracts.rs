use anyhow::Result;
use chrono::{DateTime, Local};
use thiserror::Error;

use crate::domain::{
    conversation::{InboundMessage, Reply, SessionId},
    employee::{Employee, EmployeeId, WorkLog, WorkLogId},
};

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("work log {0} does not exist")]
    WorkLogNotFound(WorkLogId),
    #[error("store constraint violated: {0}")]
    Constraint(String),
    #[error("stored data is malformed: {0}")]
    Corrupt(String),
    #[error("store backend failure: {0}")]
    Backend(#[source] Box<dyn std::error::Error + Send + Sync + 'static>),
}

/// Persistence contract for employees and their work logs.
///
/// The store enforces referential integrity only. Keeping at most one open
/// shift per employee is the caller's job.
pub trait WorkLogStore: Send + Sync {
    fn create_employee(&self, name: &str) -> Result<EmployeeId, StoreError>;

    /// Returned employees never carry hydrated work logs.
    fn find_employee_by_id(&self, id: EmployeeId) -> Result<Option<Employee>, StoreError>;

    /// Exact name match, ordered by id. Names are not unique.
    fn find_employees_by_name(&self, name: &str) -> Result<Vec<Employee>, StoreError>;

    fn create_work_log(
        &self,
        employee_id: EmployeeId,
        check_in_time: DateTime<Local>,
    ) -> Result<WorkLogId, StoreError>;

    /// Most recent (by check-in) log that has no check-out.
    fn find_open_work_log(&self, employee_id: EmployeeId) -> Result<Option<WorkLog>, StoreError>;

    /// Most recent (by check-in) log, open or closed.
    fn find_latest_work_log(&self, employee_id: EmployeeId)
        -> Result<Option<WorkLog>, StoreError>;

    fn close_work_log(
        &self,
        id: WorkLogId,
        check_out_time: DateTime<Local>,
    ) -> Result<(), StoreError>;

    /// All logs of the employee in chronological check-in order.
    fn list_work_logs(&self, employee_id: EmployeeId) -> Result<Vec<WorkLog>, StoreError>;
}

pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Local>;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Local> {
        Local::now()
    }
}

/// Pulls inbound chat messages from a transport.
pub trait InboundSource {
    /// Blocks until the next batch is available. `Ok(None)` means the
    /// transport is exhausted and the relay should stop.
    fn next_batch(&mut self) -> Result<Option<Vec<InboundMessage>>>;
}

/// Delivers replies back to a transport. Shared across relay workers.
pub trait ReplySink: Send + Sync {
    fn send_reply(&self, session: SessionId, reply: &Reply) -> Result<()>;
}
