//! Time-tracking workflows: employees, shifts and reports.
//!
//! The service owns the shift rules on top of a [`WorkLogStore`]. Store
//! failures are passed through unchanged as [`ServiceError::Store`].

use std::sync::Arc;

use chrono::{DateTime, Local};
use thiserror::Error;

use crate::domain::employee::{Employee, EmployeeId, WorkLog};

use super::contracts::{StoreError, WorkLogStore};

const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M";
const CHECK_OUT_MISSING: &str = "not recorded yet";
const OVERLAPPING_SHIFT: &str = "TIME_TRACKING_OVERLAPPING_SHIFT";

#[derive(Debug, Error)]
pub enum ServiceError {
    #[error("invalid input: {0}")]
    InvalidInput(String),
    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Outcome of looking an employee up by a free-text identifier.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resolution {
    Found(Employee),
    NotFound,
    /// The name matched several employees; the caller should ask for an id.
    Ambiguous(Vec<Employee>),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CheckOutOutcome {
    Closed(WorkLog),
    /// No open shift to close; nothing was written.
    NothingOpen,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkReport {
    pub employee_name: String,
    pub shift_count: usize,
    pub lines: Vec<String>,
}

impl WorkReport {
    pub fn to_text(&self) -> String {
        if self.shift_count == 0 {
            return self.lines.join("\n");
        }

        let mut text = format!("Work time report for {}:", self.employee_name);
        for line in &self.lines {
            text.push('\n');
            text.push_str(line);
        }
        text
    }
}

pub struct TimeTrackingService {
    store: Arc<dyn WorkLogStore>,
}

impl TimeTrackingService {
    pub fn new(store: Arc<dyn WorkLogStore>) -> Self {
        Self { store }
    }

    pub fn add_employee(&self, name: &str) -> Result<Employee, ServiceError> {
        let name = name.trim();
        if name.is_empty() {
            return Err(ServiceError::InvalidInput(
                "employee name must not be empty".to_owned(),
            ));
        }

        let id = self.store.create_employee(name)?;
        tracing::info!(employee_id = %id, "employee created");

        Ok(Employee::new(id, name))
    }

    /// Integer identifiers are always ids, even when an employee is named
    /// with the same digits.
    pub fn resolve_employee(&self, identifier: &str) -> Result<Resolution, ServiceError> {
        let identifier = identifier.trim();
        if identifier.is_empty() {
            return Err(ServiceError::InvalidInput(
                "employee name or id must not be empty".to_owned(),
            ));
        }

        if let Ok(id) = identifier.parse::<i64>() {
            let found = self.store.find_employee_by_id(EmployeeId(id))?;
            return Ok(found.map_or(Resolution::NotFound, Resolution::Found));
        }

        let mut matches = self.store.find_employees_by_name(identifier)?;
        Ok(match matches.len() {
            0 => Resolution::NotFound,
            1 => Resolution::Found(matches.remove(0)),
            _ => Resolution::Ambiguous(matches),
        })
    }

    /// Opens a new shift. An already open shift is logged, not rejected.
    pub fn check_in(
        &self,
        employee: &Employee,
        timestamp: DateTime<Local>,
    ) -> Result<WorkLog, ServiceError> {
        if let Some(open) = self.store.find_open_work_log(employee.id)? {
            tracing::warn!(
                code = OVERLAPPING_SHIFT,
                employee_id = %employee.id,
                open_work_log_id = %open.id,
                "check-in while a shift is still open"
            );
        }

        let id = self.store.create_work_log(employee.id, timestamp)?;
        tracing::debug!(employee_id = %employee.id, work_log_id = %id, "shift opened");

        Ok(WorkLog {
            id,
            employee_id: employee.id,
            check_in_time: timestamp,
            check_out_time: None,
        })
    }

    /// Closes the most recent shift if it is still open.
    pub fn check_out(
        &self,
        employee: &Employee,
        timestamp: DateTime<Local>,
    ) -> Result<CheckOutOutcome, ServiceError> {
        let Some(mut latest) = self.store.find_latest_work_log(employee.id)? else {
            return Ok(CheckOutOutcome::NothingOpen);
        };

        if !latest.is_open() {
            return Ok(CheckOutOutcome::NothingOpen);
        }

        if timestamp < latest.check_in_time {
            return Err(ServiceError::InvalidInput(
                "check-out time precedes the check-in time".to_owned(),
            ));
        }

        self.store.close_work_log(latest.id, timestamp)?;
        latest.check_out_time = Some(timestamp);
        tracing::debug!(employee_id = %employee.id, work_log_id = %latest.id, "shift closed");

        Ok(CheckOutOutcome::Closed(latest))
    }

    pub fn build_report(&self, employee: &Employee) -> Result<WorkReport, ServiceError> {
        let employee = self.hydrate(employee)?;

        let lines = if employee.work_logs.is_empty() {
            vec![format!("No work time records for {}.", employee.name)]
        } else {
            employee.work_logs.iter().map(render_work_log).collect()
        };

        Ok(WorkReport {
            shift_count: employee.work_logs.len(),
            employee_name: employee.name,
            lines,
        })
    }

    fn hydrate(&self, employee: &Employee) -> Result<Employee, ServiceError> {
        let logs = self.store.list_work_logs(employee.id)?;
        Ok(employee.clone().with_work_logs(logs))
    }
}

fn render_work_log(log: &WorkLog) -> String {
    let check_out = log
        .check_out_time
        .map(|at| at.format(TIMESTAMP_FORMAT).to_string())
        .unwrap_or_else(|| CHECK_OUT_MISSING.to_owned());

    format!(
        "In: {}, Out: {}",
        log.check_in_time.format(TIMESTAMP_FORMAT),
        check_out
    )
}
