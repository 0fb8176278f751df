use std::collections::HashMap;
use std::sync::Arc;

use kasira_core::EmployeeId;
use tokio::sync::{Mutex, OwnedMutexGuard};

/// Keyed in-process locks serializing permission edits per principal.
///
/// The storage adapter adds its own row lock; this one keeps concurrent
/// edits inside one process from racing to the row.
#[derive(Clone, Default)]
pub struct PrincipalLocks {
    locks: Arc<Mutex<HashMap<EmployeeId, Arc<Mutex<()>>>>>,
}

impl PrincipalLocks {
    /// Waits for exclusive access to one principal.
    pub async fn acquire(&self, employee_id: EmployeeId) -> OwnedMutexGuard<()> {
        let lock = {
            let mut locks = self.locks.lock().await;
            locks.retain(|_, lock| Arc::strong_count(lock) > 1);
            Arc::clone(locks.entry(employee_id).or_default())
        };

        lock.lock_owned().await
    }
}
