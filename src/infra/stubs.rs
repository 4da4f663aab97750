use std::sync::Mutex;

use anyhow::Result;
use chrono::{DateTime, Local};

use crate::{
    domain::{
        conversation::{Reply, SessionId},
        employee::{Employee, EmployeeId, WorkLog, WorkLogId},
    },
    infra::config::{AppConfig, ConfigAdapter},
    usecases::contracts::{Clock, ReplySink, StoreError, WorkLogStore},
};

#[derive(Debug, Clone, Default)]
pub struct StubConfigAdapter;

impl ConfigAdapter for StubConfigAdapter {
    fn load(&self) -> Result<AppConfig> {
        Ok(AppConfig::default())
    }
}

#[derive(Debug, Default)]
struct MemoryTables {
    employees: Vec<Employee>,
    work_logs: Vec<WorkLog>,
    next_employee_id: i64,
    next_work_log_id: i64,
}

/// In-process store with the same contract semantics as the SQLite store.
#[derive(Debug, Default)]
pub struct InMemoryWorkLogStore {
    tables: Mutex<MemoryTables>,
    fail_with: Mutex<Option<String>>,
}

impl InMemoryWorkLogStore {
    pub fn employee_count(&self) -> usize {
        self.tables.lock().expect("tables lock").employees.len()
    }

    pub fn work_log_count(&self) -> usize {
        self.tables.lock().expect("tables lock").work_logs.len()
    }

    pub fn all_work_logs(&self) -> Vec<WorkLog> {
        self.tables.lock().expect("tables lock").work_logs.clone()
    }

    /// Makes every following call fail with a backend error.
    pub fn fail_with(&self, message: &str) {
        *self.fail_with.lock().expect("failure lock") = Some(message.to_owned());
    }

    fn check_available(&self) -> Result<(), StoreError> {
        match self.fail_with.lock().expect("failure lock").as_ref() {
            Some(message) => Err(StoreError::Backend(message.clone().into())),
            None => Ok(()),
        }
    }

    fn latest_matching(
        &self,
        employee_id: EmployeeId,
        open_only: bool,
    ) -> Result<Option<WorkLog>, StoreError> {
        self.check_available()?;
        let tables = self.tables.lock().expect("tables lock");
        Ok(tables
            .work_logs
            .iter()
            .filter(|log| log.employee_id == employee_id && (!open_only || log.is_open()))
            .max_by_key(|log| (log.check_in_time, log.id))
            .cloned())
    }
}

impl WorkLogStore for InMemoryWorkLogStore {
    fn create_employee(&self, name: &str) -> Result<EmployeeId, StoreError> {
        self.check_available()?;
        let mut tables = self.tables.lock().expect("tables lock");
        tables.next_employee_id += 1;
        let id = EmployeeId(tables.next_employee_id);
        tables.employees.push(Employee::new(id, name));
        Ok(id)
    }

    fn find_employee_by_id(&self, id: EmployeeId) -> Result<Option<Employee>, StoreError> {
        self.check_available()?;
        let tables = self.tables.lock().expect("tables lock");
        Ok(tables.employees.iter().find(|e| e.id == id).cloned())
    }

    fn find_employees_by_name(&self, name: &str) -> Result<Vec<Employee>, StoreError> {
        self.check_available()?;
        let tables = self.tables.lock().expect("tables lock");
        Ok(tables
            .employees
            .iter()
            .filter(|e| e.name == name)
            .cloned()
            .collect())
    }

    fn create_work_log(
        &self,
        employee_id: EmployeeId,
        check_in_time: DateTime<Local>,
    ) -> Result<WorkLogId, StoreError> {
        self.check_available()?;
        let mut tables = self.tables.lock().expect("tables lock");
        if !tables.employees.iter().any(|e| e.id == employee_id) {
            return Err(StoreError::Constraint(format!(
                "employee {employee_id} does not exist"
            )));
        }
        tables.next_work_log_id += 1;
        let id = WorkLogId(tables.next_work_log_id);
        tables.work_logs.push(WorkLog {
            id,
            employee_id,
            check_in_time,
            check_out_time: None,
        });
        Ok(id)
    }

    fn find_open_work_log(&self, employee_id: EmployeeId) -> Result<Option<WorkLog>, StoreError> {
        self.latest_matching(employee_id, true)
    }

    fn find_latest_work_log(
        &self,
        employee_id: EmployeeId,
    ) -> Result<Option<WorkLog>, StoreError> {
        self.latest_matching(employee_id, false)
    }

    fn close_work_log(
        &self,
        id: WorkLogId,
        check_out_time: DateTime<Local>,
    ) -> Result<(), StoreError> {
        self.check_available()?;
        let mut tables = self.tables.lock().expect("tables lock");
        let log = tables
            .work_logs
            .iter_mut()
            .find(|log| log.id == id)
            .ok_or(StoreError::WorkLogNotFound(id))?;
        log.check_out_time = Some(check_out_time);
        Ok(())
    }

    fn list_work_logs(&self, employee_id: EmployeeId) -> Result<Vec<WorkLog>, StoreError> {
        self.check_available()?;
        let tables = self.tables.lock().expect("tables lock");
        let mut logs: Vec<WorkLog> = tables
            .work_logs
            .iter()
            .filter(|log| log.employee_id == employee_id)
            .cloned()
            .collect();
        logs.sort_by_key(|log| (log.check_in_time, log.id));
        Ok(logs)
    }
}

/// Clock that returns a settable instant.
#[derive(Debug)]
pub struct FixedClock {
    now: Mutex<DateTime<Local>>,
}

impl FixedClock {
    pub fn at(now: DateTime<Local>) -> Self {
        Self {
            now: Mutex::new(now),
        }
    }

    pub fn advance(&self, by: chrono::Duration) {
        let mut now = self.now.lock().expect("clock lock");
        *now += by;
    }
}

impl Clock for FixedClock {
    fn now(&self) -> DateTime<Local> {
        *self.now.lock().expect("clock lock")
    }
}

/// Sink that records every reply it is asked to send.
#[derive(Debug, Default)]
pub struct RecordingSink {
    pub sent: Mutex<Vec<(SessionId, Reply)>>,
}

impl RecordingSink {
    pub fn replies(&self) -> Vec<(SessionId, Reply)> {
        self.sent.lock().expect("sink lock").clone()
    }
}

impl ReplySink for RecordingSink {
    fn send_reply(&self, session: SessionId, reply: &Reply) -> Result<()> {
        self.sent
            .lock()
            .expect("sink lock")
            .push((session, reply.clone()));
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::local_time;

    #[test]
    fn stub_config_returns_defaults() {
        let adapter = StubConfigAdapter;
        let config = adapter.load().expect("stub config must load");

        assert_eq!(config, AppConfig::default());
    }

    #[test]
    fn memory_store_rejects_logs_for_unknown_employees() {
        let store = InMemoryWorkLogStore::default();
        let at = local_time(2026, 1, 5, 9, 0);

        let result = store.create_work_log(EmployeeId(99), at);

        assert!(matches!(result, Err(StoreError::Constraint(_))));
    }

    #[test]
    fn memory_store_close_fails_for_missing_log() {
        let store = InMemoryWorkLogStore::default();
        let at = local_time(2026, 1, 5, 17, 0);

        let result = store.close_work_log(WorkLogId(1), at);

        assert!(matches!(result, Err(StoreError::WorkLogNotFound(WorkLogId(1)))));
    }
}
