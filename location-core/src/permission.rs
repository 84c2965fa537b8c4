//! The permission manager: a trust-prompt facade gating session creation.
//! Caches nothing — every `check` asks the external trust agent fresh.

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::time::Duration;

use location_types::Criteria;
use tracing::warn;

use crate::credentials::{Credentials, ConfinementProfileResolver};

/// The environment variable that forces unconditional grant, for tests and
/// headless bring-up. The only bypass of the trust-prompt flow.
pub const TESTING_ENV_VAR: &str = "LOCATION_SERVICE_IS_RUNNING_UNDER_TESTING";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PermissionDecision {
    Granted,
    Rejected,
}

#[derive(Debug, Clone)]
pub struct PromptParameters {
    pub uid: u32,
    pub pid: u32,
    pub profile: String,
    pub feature_id: u32,
    pub description: String,
}

type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// The external process that prompts the user and returns a decision.
/// A timeout or any failure to reach it collapses to `Rejected` at the
/// permission-manager boundary, never propagated as a distinct error.
pub trait TrustAgent: Send + Sync {
    fn prompt(&self, params: PromptParameters) -> BoxFuture<'_, PermissionDecision>;
}

pub trait PermissionManager: Send + Sync {
    fn check<'a>(
        &'a self,
        criteria: &'a Criteria,
        credentials: &'a Credentials,
    ) -> BoxFuture<'a, PermissionDecision>;
}

/// Default implementation: resolve credentials to a confinement profile,
/// build prompt parameters, invoke the trust agent under a timeout.
pub struct DefaultPermissionManager {
    resolver: Arc<dyn ConfinementProfileResolver>,
    agent: Arc<dyn TrustAgent>,
    agent_timeout: Duration,
    testing_mode: bool,
}

impl DefaultPermissionManager {
    pub fn new(resolver: Arc<dyn ConfinementProfileResolver>, agent: Arc<dyn TrustAgent>) -> Self {
        Self::with_timeout(resolver, agent, Duration::from_secs(1))
    }

    pub fn with_timeout(
        resolver: Arc<dyn ConfinementProfileResolver>,
        agent: Arc<dyn TrustAgent>,
        agent_timeout: Duration,
    ) -> Self {
        let testing_mode = std::env::var(TESTING_ENV_VAR)
            .map(|v| v == "1")
            .unwrap_or(false);
        Self {
            resolver,
            agent,
            agent_timeout,
            testing_mode,
        }
    }
}

impl PermissionManager for DefaultPermissionManager {
    fn check<'a>(
        &'a self,
        _criteria: &'a Criteria,
        credentials: &'a Credentials,
    ) -> BoxFuture<'a, PermissionDecision> {
        Box::pin(async move {
            if self.testing_mode {
                return PermissionDecision::Granted;
            }

            let profile = match self.resolver.resolve(credentials.pid) {
                Some(profile) => profile,
                None => {
                    warn!(pid = credentials.pid, "could not resolve confinement profile");
                    return PermissionDecision::Rejected;
                }
            };

            let params = PromptParameters {
                uid: credentials.uid,
                pid: credentials.pid,
                profile,
                feature_id: 0,
                description: "wants to use your location".to_string(),
            };

            match tokio::time::timeout(self.agent_timeout, self.agent.prompt(params)).await {
                Ok(decision) => decision,
                Err(_) => {
                    warn!("trust agent timed out; treating as rejected");
                    PermissionDecision::Rejected
                }
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::credentials::UnconfinedResolver;

    struct AlwaysGrant;
    impl TrustAgent for AlwaysGrant {
        fn prompt(&self, _params: PromptParameters) -> BoxFuture<'_, PermissionDecision> {
            Box::pin(async { PermissionDecision::Granted })
        }
    }

    struct NeverResponds;
    impl TrustAgent for NeverResponds {
        fn prompt(&self, _params: PromptParameters) -> BoxFuture<'_, PermissionDecision> {
            Box::pin(std::future::pending())
        }
    }

    #[tokio::test]
    async fn unconfined_caller_is_rejected_without_asking_agent() {
        let manager = DefaultPermissionManager::new(Arc::new(UnconfinedResolver), Arc::new(AlwaysGrant));
        let decision = manager
            .check(&Criteria::empty(), &Credentials { pid: 1, uid: 1000 })
            .await;
        assert_eq!(decision, PermissionDecision::Rejected);
    }

    struct FixedProfileResolver;
    impl ConfinementProfileResolver for FixedProfileResolver {
        fn resolve(&self, _pid: u32) -> Option<String> {
            Some("snap.myapp".to_string())
        }
    }

    #[tokio::test]
    async fn agent_grant_is_forwarded() {
        let manager = DefaultPermissionManager::new(Arc::new(FixedProfileResolver), Arc::new(AlwaysGrant));
        let decision = manager
            .check(&Criteria::empty(), &Credentials { pid: 1, uid: 1000 })
            .await;
        assert_eq!(decision, PermissionDecision::Granted);
    }

    #[tokio::test]
    async fn agent_timeout_is_treated_as_rejected() {
        let manager = DefaultPermissionManager::with_timeout(
            Arc::new(FixedProfileResolver),
            Arc::new(NeverResponds),
            Duration::from_millis(10),
        );
        let decision = manager
            .check(&Criteria::empty(), &Credentials { pid: 1, uid: 1000 })
            .await;
        assert_eq!(decision, PermissionDecision::Rejected);
    }

    #[tokio::test]
    async fn testing_mode_env_var_bypasses_agent_unconditionally() {
        unsafe { std::env::set_var(TESTING_ENV_VAR, "1") };
        let manager = DefaultPermissionManager::new(Arc::new(UnconfinedResolver), Arc::new(NeverResponds));
        let decision = manager
            .check(&Criteria::empty(), &Credentials { pid: 1, uid: 1000 })
            .await;
        unsafe { std::env::remove_var(TESTING_ENV_VAR) };
        assert_eq!(decision, PermissionDecision::Granted);
    }
}
