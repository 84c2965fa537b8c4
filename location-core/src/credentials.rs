//! Caller identity resolution and object-path assignment.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Mutex;

/// The caller's raw OS-level identity, as handed to us by the (out of scope)
/// transport layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Credentials {
    pub pid: u32,
    pub uid: u32,
}

/// Resolves a caller's pid to its confinement-profile string (e.g. an
/// apparmor profile). `None` means unconfined.
pub trait ConfinementProfileResolver: Send + Sync {
    fn resolve(&self, pid: u32) -> Option<String>;
}

/// A resolver that treats every caller as unconfined. Useful for tests and
/// for platforms without a confinement mechanism.
#[derive(Debug, Default)]
pub struct UnconfinedResolver;

impl ConfinementProfileResolver for UnconfinedResolver {
    fn resolve(&self, _pid: u32) -> Option<String> {
        None
    }
}

/// Mints object paths for sessions. The same confinement profile always maps
/// to the same path for the lifetime of the generator; an unconfined caller
/// is keyed by its numeric uid rather than getting a fresh path per call.
///
/// This implementation picks "stable-per-process" for both cases — see
/// `DESIGN.md` for why, since the source this is modeled on is ambiguous here.
pub struct ObjectPathGenerator {
    prefix: String,
    confined: Mutex<HashMap<String, String>>,
    unconfined: Mutex<HashMap<u32, String>>,
    next_counter: AtomicU64,
}

impl ObjectPathGenerator {
    pub fn new(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
            confined: Mutex::new(HashMap::new()),
            unconfined: Mutex::new(HashMap::new()),
            next_counter: AtomicU64::new(0),
        }
    }

    fn mint(&self) -> String {
        let n = self.next_counter.fetch_add(1, Ordering::SeqCst);
        format!("{}/Session{n}", self.prefix)
    }

    pub fn path_for(&self, profile: Option<&str>, credentials: &Credentials) -> String {
        match profile {
            Some(profile) => {
                let mut table = self.confined.lock().unwrap();
                if let Some(path) = table.get(profile) {
                    return path.clone();
                }
                let path = self.mint();
                table.insert(profile.to_string(), path.clone());
                path
            }
            None => {
                let mut table = self.unconfined.lock().unwrap();
                if let Some(path) = table.get(&credentials.uid) {
                    return path.clone();
                }
                let path = self.mint();
                table.insert(credentials.uid, path.clone());
                path
            }
        }
    }
}
