//! Mock session with a small model of server-side XA branch state

#![allow(dead_code)]

use parking_lot::{Mutex, ReentrantMutex};
use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use xapin::error::native_codes;
use xapin::{NativeError, Row, Session, SessionGuard, SessionHandle};

/// Server error number for a duplicate XID
pub const XAER_DUPID: i32 = 1440;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum BranchState {
    Active,
    Idle,
    Prepared,
}

pub struct MockSession {
    name: String,
    lock: ReentrantMutex<()>,
    executed: Mutex<Vec<String>>,
    branches: Mutex<HashMap<String, BranchState>>,
    scripted_failures: Mutex<VecDeque<(String, NativeError)>>,
    recover_rows: Mutex<Vec<Row>>,
    delay: Mutex<Option<Duration>>,
    in_flight: AtomicUsize,
    max_in_flight: AtomicUsize,
    unlocked_executions: AtomicUsize,
}

impl MockSession {
    pub fn new(name: &str) -> Arc<Self> {
        Arc::new(Self {
            name: name.to_string(),
            lock: ReentrantMutex::new(()),
            executed: Mutex::new(Vec::new()),
            branches: Mutex::new(HashMap::new()),
            scripted_failures: Mutex::new(VecDeque::new()),
            recover_rows: Mutex::new(Vec::new()),
            delay: Mutex::new(None),
            in_flight: AtomicUsize::new(0),
            max_in_flight: AtomicUsize::new(0),
            unlocked_executions: AtomicUsize::new(0),
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Type-erased handle to this session
    pub fn handle(self: &Arc<Self>) -> SessionHandle {
        self.clone()
    }

    /// Every statement executed so far, in order
    pub fn executed(&self) -> Vec<String> {
        self.executed.lock().clone()
    }

    pub fn execution_count(&self) -> usize {
        self.executed.lock().len()
    }

    /// Fail the next statement starting with `prefix`
    pub fn fail_next(&self, prefix: &str, error: NativeError) {
        self.scripted_failures
            .lock()
            .push_back((prefix.to_string(), error));
    }

    pub fn set_recover_rows(&self, rows: Vec<Row>) {
        *self.recover_rows.lock() = rows;
    }

    /// Make every statement take at least `delay`
    pub fn set_delay(&self, delay: Duration) {
        *self.delay.lock() = Some(delay);
    }

    /// Highest number of statements observed executing at the same time
    pub fn max_in_flight(&self) -> usize {
        self.max_in_flight.load(Ordering::SeqCst)
    }

    /// Statements executed without the session lock held
    pub fn unlocked_executions(&self) -> usize {
        self.unlocked_executions.load(Ordering::SeqCst)
    }

    pub fn knows_branch(&self, encoded_xid: &str) -> bool {
        self.branches.lock().contains_key(encoded_xid)
    }

    fn take_scripted_failure(&self, command: &str) -> Option<NativeError> {
        let mut failures = self.scripted_failures.lock();
        let position = failures
            .iter()
            .position(|(prefix, _)| command.starts_with(prefix.as_str()))?;
        failures.remove(position).map(|(_, error)| error)
    }

    fn apply(&self, command: &str) -> Result<Vec<Row>, NativeError> {
        if command == "XA RECOVER" {
            return Ok(self.recover_rows.lock().clone());
        }

        let mut words = command.split(' ');
        let (Some("XA"), Some(verb), Some(id)) = (words.next(), words.next(), words.next()) else {
            return Err(NativeError::new(1064, format!("syntax error near '{}'", command)));
        };
        let modifier: Vec<&str> = words.collect();
        let unknown = || NativeError::new(native_codes::XAER_NOTA, "XAER_NOTA: Unknown XID");

        let mut branches = self.branches.lock();
        match verb {
            "START" if modifier.is_empty() => {
                if branches.contains_key(id) {
                    return Err(NativeError::new(XAER_DUPID, "XAER_DUPID: The XID already exists"));
                }
                branches.insert(id.to_string(), BranchState::Active);
            }
            "START" => match branches.get_mut(id) {
                Some(state) => *state = BranchState::Active,
                None => return Err(unknown()),
            },
            "END" => match branches.get_mut(id) {
                Some(state) => *state = BranchState::Idle,
                None => return Err(unknown()),
            },
            "PREPARE" => match branches.get_mut(id) {
                Some(state) => *state = BranchState::Prepared,
                None => return Err(unknown()),
            },
            "COMMIT" | "ROLLBACK" => {
                if branches.remove(id).is_none() {
                    return Err(unknown());
                }
            }
            _ => return Err(NativeError::new(1064, format!("unknown XA verb {}", verb))),
        }
        Ok(Vec::new())
    }
}

impl Session for MockSession {
    fn execute(&self, command: &str) -> Result<Vec<Row>, NativeError> {
        if !self.lock.is_locked() {
            self.unlocked_executions.fetch_add(1, Ordering::SeqCst);
        }

        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(now, Ordering::SeqCst);

        self.executed.lock().push(command.to_string());
        let delay = *self.delay.lock();
        if let Some(delay) = delay {
            std::thread::sleep(delay);
        }

        let result = match self.take_scripted_failure(command) {
            Some(error) => Err(error),
            None => self.apply(command),
        };

        self.in_flight.fetch_sub(1, Ordering::SeqCst);
        result
    }

    fn lock(&self) -> SessionGuard<'_> {
        self.lock.lock()
    }
}
