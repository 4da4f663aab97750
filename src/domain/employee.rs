use std::fmt;

use chrono::{DateTime, Local};

/// Store-assigned employee identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct EmployeeId(pub i64);

impl fmt::Display for EmployeeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct WorkLogId(pub i64);

impl fmt::Display for WorkLogId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Employee {
    pub id: EmployeeId,
    pub name: String,
    /// Only populated when the service hydrates the employee for reporting.
    pub work_logs: Vec<WorkLog>,
}

impl Employee {
    pub fn new(id: EmployeeId, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
            work_logs: Vec::new(),
        }
    }

    pub fn with_work_logs(mut self, work_logs: Vec<WorkLog>) -> Self {
        self.work_logs = work_logs;
        self
    }
}

/// One shift: a check-in and, once recorded, its check-out.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkLog {
    pub id: WorkLogId,
    pub employee_id: EmployeeId,
    pub check_in_time: DateTime<Local>,
    pub check_out_time: Option<DateTime<Local>>,
}

impl WorkLog {
    pub fn is_open(&self) -> bool {
        self.check_out_time.is_none()
    }
}
