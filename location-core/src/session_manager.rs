//! Service facade: authorizes, creates, tracks, and reaps client sessions.

use std::collections::hash_map::Entry;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use location_types::Criteria;
use tracing::debug;

use crate::credentials::{ConfinementProfileResolver, Credentials, ObjectPathGenerator};
use crate::engine::{Engine, EngineState};
use crate::error::SessionError;
use crate::permission::{PermissionDecision, PermissionManager};
use crate::session::Session;

pub struct SessionManagerConfig {
    pub object_path_prefix: String,
}

impl Default for SessionManagerConfig {
    fn default() -> Self {
        Self {
            object_path_prefix: "/org/freedesktop/location/Service".to_string(),
        }
    }
}

/// A granted session together with the object path it was registered under.
pub struct SessionHandle {
    pub object_path: String,
    pub session: Arc<Session>,
}

/// Authorizes and creates sessions, tracks them by object path, and reaps
/// them when the owning client disappears. Also exposes the global
/// observables that mirror the engine's `config`.
pub struct SessionManager {
    engine: Arc<Engine>,
    permission_manager: Arc<dyn PermissionManager>,
    profile_resolver: Arc<dyn ConfinementProfileResolver>,
    path_generator: ObjectPathGenerator,
    sessions: Mutex<HashMap<String, Arc<Session>>>,
}

impl SessionManager {
    pub fn new(
        engine: Arc<Engine>,
        permission_manager: Arc<dyn PermissionManager>,
        profile_resolver: Arc<dyn ConfinementProfileResolver>,
        config: SessionManagerConfig,
    ) -> Arc<Self> {
        Arc::new(Self {
            engine,
            permission_manager,
            profile_resolver,
            path_generator: ObjectPathGenerator::new(config.object_path_prefix),
            sessions: Mutex::new(HashMap::new()),
        })
    }

    /// Resolve credentials, check permission, mint/reuse an object path,
    /// resolve a provider selection, and register the session transactionally.
    pub async fn create_session(
        &self,
        criteria: Criteria,
        credentials: Credentials,
    ) -> Result<SessionHandle, SessionError> {
        let decision = self.permission_manager.check(&criteria, &credentials).await;
        if decision == PermissionDecision::Rejected {
            return Err(SessionError::InsufficientPermissions);
        }

        let profile = self.profile_resolver.resolve(credentials.pid);
        let object_path = self.path_generator.path_for(profile.as_deref(), &credentials);

        let selection = self.engine.determine_provider_selection_for_criteria(&criteria);
        let session = Session::new(Arc::clone(&self.engine), selection);

        {
            let mut sessions = self.sessions.lock().unwrap();
            match sessions.entry(object_path.clone()) {
                Entry::Occupied(_) => return Err(SessionError::DuplicateSession),
                Entry::Vacant(slot) => {
                    slot.insert(Arc::clone(&session));
                }
            }
        }

        debug!(object_path, "session created");
        Ok(SessionHandle { object_path, session })
    }

    /// Called by the (out of scope) transport layer when the owning client's
    /// connection drops. Removes and closes the session, if any.
    pub fn on_peer_gone(&self, object_path: &str) {
        let removed = self.sessions.lock().unwrap().remove(object_path);
        if let Some(session) = removed {
            session.close();
            debug!(object_path, "session reaped after peer-gone");
        }
    }

    pub fn has_session(&self, object_path: &str) -> bool {
        self.sessions.lock().unwrap().contains_key(object_path)
    }

    pub fn session_count(&self) -> usize {
        self.sessions.lock().unwrap().len()
    }

    pub fn state(&self) -> EngineState {
        self.engine.config.engine_state.get()
    }

    pub fn is_online(&self) -> bool {
        !matches!(self.state(), EngineState::Off)
    }

    pub fn set_is_online(&self, online: bool) {
        self.engine
            .set_engine_state(if online { EngineState::On } else { EngineState::Off });
    }

    pub fn does_satellite_based_positioning(&self) -> bool {
        self.engine.config.satellite_positioning.get()
    }

    pub fn set_does_satellite_based_positioning(&self, enabled: bool) {
        self.engine.set_satellite_positioning(enabled);
    }

    pub fn does_report_cell_and_wifi_ids(&self) -> bool {
        self.engine.config.wifi_cell_reporting.get()
    }

    pub fn set_does_report_cell_and_wifi_ids(&self, enabled: bool) {
        self.engine.set_wifi_cell_reporting(enabled);
    }
}
