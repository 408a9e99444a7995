pub mod desktop;
pub mod message;

pub use desktop::DesktopNotifier;
pub use message::NotificationMessage;

use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::sync::{Arc, Mutex, MutexGuard};

const ENABLE_LOGS: bool = true;

use crate::{log_error, log_info, log_warn};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub enum Permission {
    NotAsked,
    Granted,
    Denied,
}

/// Platform notification API.
pub trait NotificationBackend: Send + Sync {
    fn permission(&self) -> Permission;
    /// May block while the platform asks the user.
    fn request_permission(&self) -> Result<Permission>;
    fn show(&self, title: &str, body: &str) -> Result<()>;
}

struct GateState {
    permission: Permission,
    requested: bool,
}

/// Sends completion notifications only once permission has been granted, and
/// asks for that permission at most once.
#[derive(Clone)]
pub struct NotificationGate {
    backend: Arc<dyn NotificationBackend>,
    state: Arc<Mutex<GateState>>,
}

impl NotificationGate {
    pub fn new(backend: Arc<dyn NotificationBackend>) -> Self {
        let permission = backend.permission();
        Self {
            backend,
            state: Arc::new(Mutex::new(GateState {
                permission,
                requested: permission != Permission::NotAsked,
            })),
        }
    }

    fn lock(&self) -> MutexGuard<'_, GateState> {
        match self.state.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }

    pub fn permission(&self) -> Permission {
        self.lock().permission
    }

    pub fn is_granted(&self) -> bool {
        self.permission() == Permission::Granted
    }

    /// Fires the permission request in the background the first time it is
    /// called. Returns whether a request was issued.
    pub fn request_once(&self) -> bool {
        {
            let mut state = self.lock();
            if state.requested {
                return false;
            }
            state.requested = true;
        }

        let gate = self.clone();
        run_detached(move || gate.run_request());
        true
    }

    /// Explicit request from the user; asks again even if asked before.
    pub async fn request(&self) -> Permission {
        self.lock().requested = true;
        let gate = self.clone();
        match tokio::task::spawn_blocking(move || gate.run_request()).await {
            Ok(_) => {}
            Err(err) => log_error!("notification permission task failed: {err}"),
        }
        self.permission()
    }

    fn run_request(&self) -> bool {
        match self.backend.request_permission() {
            Ok(permission) => {
                log_info!("notification permission: {permission:?}");
                self.lock().permission = permission;
                true
            }
            Err(err) => {
                log_error!("error requesting notification permission: {err:#}");
                false
            }
        }
    }

    /// Hands the message to the platform without waiting for it. Returns
    /// false when permission is missing, or when an inline dispatch (no
    /// runtime) failed.
    pub fn send(&self, message: &NotificationMessage) -> bool {
        if !self.is_granted() {
            return false;
        }
        let backend = self.backend.clone();
        let message = message.clone();
        run_detached(move || dispatch(backend.as_ref(), &message))
    }
}

fn dispatch(backend: &dyn NotificationBackend, message: &NotificationMessage) -> bool {
    match backend.show(&message.title, &message.body) {
        Ok(()) => true,
        Err(err) => {
            log_warn!("error sending notification: {err:#}");
            false
        }
    }
}

/// Runs a blocking platform call off the async workers. Outside a runtime it
/// runs inline and its result is returned; inside one, true means queued.
fn run_detached<F>(work: F) -> bool
where
    F: FnOnce() -> bool + Send + 'static,
{
    match tokio::runtime::Handle::try_current() {
        Ok(handle) => {
            handle.spawn_blocking(work);
            true
        }
        Err(_) => work(),
    }
}
