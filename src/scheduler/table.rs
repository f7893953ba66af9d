/*!
 * Process Table
 * Arena of admitted processes indexed by handle and by name
 */

use crate::core::errors::{SchedulerError, SchedulerResult};
use crate::core::types::Pid;
use crate::process::Process;
use dashmap::mapref::entry::Entry as MapEntry;
use dashmap::DashMap;
use parking_lot::{Mutex, RwLock};
use std::sync::Arc;

/// Every admitted process, in admission order
///
/// Handles index `slots` directly; entries are never removed, so a handle
/// stays valid for the scheduler's lifetime.
pub(crate) struct ProcessTable {
    slots: RwLock<Vec<Arc<Mutex<Process>>>>,
    names: DashMap<String, Pid, ahash::RandomState>,
}

impl ProcessTable {
    pub fn new() -> Self {
        Self {
            slots: RwLock::new(Vec::new()),
            names: DashMap::with_hasher(ahash::RandomState::new()),
        }
    }

    /// Store `process` and issue its handle
    ///
    /// The name is reserved through the map's entry API, so two racing
    /// inserts of the same name cannot both succeed.
    pub fn insert(&self, process: Process) -> SchedulerResult<(Pid, Arc<Mutex<Process>>)> {
        match self.names.entry(process.name().to_string()) {
            MapEntry::Occupied(occupied) => Err(SchedulerError::DuplicateName(occupied.key().clone())),
            MapEntry::Vacant(vacant) => {
                let process = Arc::new(Mutex::new(process));
                let mut slots = self.slots.write();
                let pid = Pid(slots.len() as u32);
                slots.push(Arc::clone(&process));
                drop(slots);
                vacant.insert(pid);
                Ok((pid, process))
            }
        }
    }

    pub fn get(&self, pid: Pid) -> Option<Arc<Mutex<Process>>> {
        self.slots.read().get(pid.index()).cloned()
    }

    pub fn find(&self, name: &str) -> Option<Pid> {
        self.names.get(name).map(|pid| *pid)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.names.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.slots.read().len()
    }

    /// Snapshot of every slot, in handle order
    pub fn all(&self) -> Vec<(Pid, Arc<Mutex<Process>>)> {
        self.slots
            .read()
            .iter()
            .enumerate()
            .map(|(i, process)| (Pid(i as u32), Arc::clone(process)))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_insert_issues_sequential_handles() {
        let table = ProcessTable::new();
        let (a, _) = table.insert(Process::new("p01")).unwrap();
        let (b, _) = table.insert(Process::new("p02")).unwrap();

        assert_eq!(a, Pid(0));
        assert_eq!(b, Pid(1));
        assert_eq!(table.len(), 2);
        assert_eq!(table.find("p02"), Some(Pid(1)));
        assert_eq!(table.get(b).map(|p| p.lock().name().to_string()), Some("p02".to_string()));
    }

    #[test]
    fn test_duplicate_name_rejected() {
        let table = ProcessTable::new();
        table.insert(Process::new("p01")).unwrap();

        assert_eq!(
            table.insert(Process::new("p01")).map(|(pid, _)| pid),
            Err(SchedulerError::DuplicateName("p01".into()))
        );
        assert_eq!(table.len(), 1);
    }

    #[test]
    fn test_unknown_lookups() {
        let table = ProcessTable::new();
        assert!(table.get(Pid(0)).is_none());
        assert_eq!(table.find("ghost"), None);
        assert!(!table.contains("ghost"));
    }
}
