use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};

use chrono::{DateTime, Utc};
use uuid::Uuid;

/// Bookkeeping for one live WebSocket connection. The socket itself stays
/// with the adapter loop; this is only what diagnostics need.
#[derive(Debug)]
pub struct SessionInfo {
    pub id: Uuid,
    pub connected_at: DateTime<Utc>,
    alive: AtomicBool,
}

impl SessionInfo {
    pub fn is_alive(&self) -> bool {
        self.alive.load(Ordering::Acquire)
    }
}

/// Process-wide lookup of live sessions, safe to enumerate while sessions
/// connect and disconnect.
#[derive(Default, Clone)]
pub struct SessionRegistry(Arc<RwLock<HashMap<Uuid, Arc<SessionInfo>>>>);

impl SessionRegistry {
    /// Register a new session. It is removed when the returned guard drops,
    /// whichever way the owning loop exits.
    pub fn open(&self) -> SessionGuard {
        let info = Arc::new(SessionInfo {
            id: Uuid::new_v4(),
            connected_at: Utc::now(),
            alive: AtomicBool::new(true),
        });
        let live = {
            let mut m = self.write();
            m.insert(info.id, info.clone());
            m.len()
        };
        crate::infra::logging::set_ws_sessions(live);
        SessionGuard { registry: self.clone(), info }
    }

    pub fn get(&self, id: &Uuid) -> Option<Arc<SessionInfo>> {
        self.read().get(id).cloned()
    }

    pub fn ids(&self) -> Vec<Uuid> {
        self.read().keys().copied().collect()
    }

    pub fn len(&self) -> usize {
        self.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    // Every mutation is a single insert or remove, so a poisoned map is
    // still consistent.
    fn read(&self) -> RwLockReadGuard<'_, HashMap<Uuid, Arc<SessionInfo>>> {
        self.0.read().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn write(&self) -> RwLockWriteGuard<'_, HashMap<Uuid, Arc<SessionInfo>>> {
        self.0.write().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn remove(&self, id: &Uuid) {
        let live = {
            let mut m = self.write();
            m.remove(id);
            m.len()
        };
        crate::infra::logging::set_ws_sessions(live);
    }
}

pub struct SessionGuard {
    registry: SessionRegistry,
    info: Arc<SessionInfo>,
}

impl SessionGuard {
    pub fn id(&self) -> Uuid {
        self.info.id
    }
}

impl Drop for SessionGuard {
    fn drop(&mut self) {
        self.info.alive.store(false, Ordering::Release);
        self.registry.remove(&self.info.id);
    }
}
