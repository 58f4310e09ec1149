//! Request spacing, backoff windows and user-agent rotation.
//!
//! All randomness sits behind [`DelayPolicy`] and [`AgentProvider`] so tests
//! can swap in deterministic stand-ins (see [`crate::testing`]).

use rand::seq::SliceRandom;
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;

use crate::traits::{AgentProvider, DelayPolicy};

/// Inclusive range a delay is drawn from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DelayWindow {
    pub min: Duration,
    pub max: Duration,
}

impl DelayWindow {
    pub const fn new(min: Duration, max: Duration) -> Self {
        Self { min, max }
    }

    pub const fn secs(min: u64, max: u64) -> Self {
        Self::new(Duration::from_secs(min), Duration::from_secs(max))
    }
}

/// Delay windows used by the crawl.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Pacing {
    /// Before every detail fetch
    pub politeness: DelayWindow,
    /// After every detail batch
    pub between_batches: DelayWindow,
    /// After a 429, before retrying the same request
    pub rate_limit_backoff: DelayWindow,
    /// After any other page failure, before retrying the same offset
    pub transport_backoff: DelayWindow,
    /// Between consecutive roles
    pub between_roles: DelayWindow,
}

impl Default for Pacing {
    fn default() -> Self {
        Self {
            politeness: DelayWindow::secs(1, 2),
            between_batches: DelayWindow::secs(2, 4),
            rate_limit_backoff: DelayWindow::secs(60, 90),
            transport_backoff: DelayWindow::secs(30, 45),
            between_roles: DelayWindow::secs(1, 2),
        }
    }
}

/// Uniformly random delay inside the window.
#[derive(Debug, Clone, Copy, Default)]
pub struct RandomDelay;

impl DelayPolicy for RandomDelay {
    fn pick(&self, window: DelayWindow) -> Duration {
        if window.max <= window.min {
            return window.min;
        }
        rand::thread_rng().gen_range(window.min..=window.max)
    }
}

/// Sleeps for the configured windows using an injected policy.
#[derive(Clone)]
pub struct Pacer {
    policy: Arc<dyn DelayPolicy>,
    pacing: Pacing,
}

impl Pacer {
    pub fn new(policy: Arc<dyn DelayPolicy>, pacing: Pacing) -> Self {
        Self { policy, pacing }
    }

    /// Random delays with the default windows.
    pub fn random() -> Self {
        Self::new(Arc::new(RandomDelay), Pacing::default())
    }

    pub fn pacing(&self) -> &Pacing {
        &self.pacing
    }

    pub async fn politeness(&self) {
        self.wait(self.pacing.politeness).await;
    }

    pub async fn between_batches(&self) {
        self.wait(self.pacing.between_batches).await;
    }

    pub async fn rate_limit_backoff(&self) {
        self.wait(self.pacing.rate_limit_backoff).await;
    }

    pub async fn transport_backoff(&self) {
        self.wait(self.pacing.transport_backoff).await;
    }

    pub async fn between_roles(&self) {
        self.wait(self.pacing.between_roles).await;
    }

    async fn wait(&self, window: DelayWindow) {
        let delay = self.policy.pick(window);
        tokio::time::sleep(delay).await;
    }
}

impl std::fmt::Debug for Pacer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Pacer").field("pacing", &self.pacing).finish()
    }
}

const DEFAULT_USER_AGENTS: &[&str] = &[
    "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36",
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36",
    "Mozilla/5.0 (X11; Linux x86_64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36",
    "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/605.1.15 (KHTML, like Gecko) Version/17.1 Safari/605.1.15",
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64; rv:121.0) Gecko/20100101 Firefox/121.0",
    "Mozilla/5.0 (X11; Ubuntu; Linux x86_64; rv:121.0) Gecko/20100101 Firefox/121.0",
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36 Edg/120.0.0.0",
];

/// Picks a user agent at random for every request.
#[derive(Debug, Clone)]
pub struct RotatingAgents {
    agents: Vec<String>,
}

impl RotatingAgents {
    pub fn new(agents: impl IntoIterator<Item = impl Into<String>>) -> Self {
        let agents: Vec<String> = agents.into_iter().map(Into::into).collect();
        if agents.is_empty() {
            return Self::default();
        }
        Self { agents }
    }
}

impl Default for RotatingAgents {
    fn default() -> Self {
        Self {
            agents: DEFAULT_USER_AGENTS.iter().map(|a| a.to_string()).collect(),
        }
    }
}

impl AgentProvider for RotatingAgents {
    fn user_agent(&self) -> String {
        self.agents
            .choose(&mut rand::thread_rng())
            .cloned()
            .unwrap_or_else(|| DEFAULT_USER_AGENTS[0].to_string())
    }
}

/// Always the same user agent.
#[derive(Debug, Clone)]
pub struct FixedAgent(pub String);

impl AgentProvider for FixedAgent {
    fn user_agent(&self) -> String {
        self.0.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_random_delay_stays_in_window() {
        let window = DelayWindow::secs(60, 90);
        for _ in 0..200 {
            let delay = RandomDelay.pick(window);
            assert!(delay >= window.min && delay <= window.max, "{:?}", delay);
        }
    }

    #[test]
    fn test_degenerate_window() {
        let window = DelayWindow::secs(5, 5);
        assert_eq!(RandomDelay.pick(window), Duration::from_secs(5));

        let inverted = DelayWindow::secs(9, 3);
        assert_eq!(RandomDelay.pick(inverted), Duration::from_secs(9));
    }

    #[test]
    fn test_default_windows() {
        let pacing = Pacing::default();
        assert_eq!(pacing.politeness, DelayWindow::secs(1, 2));
        assert_eq!(pacing.between_batches, DelayWindow::secs(2, 4));
        assert_eq!(pacing.rate_limit_backoff, DelayWindow::secs(60, 90));
        assert_eq!(pacing.transport_backoff, DelayWindow::secs(30, 45));
    }

    #[test]
    fn test_rotating_agents_pick_from_list() {
        let agents = RotatingAgents::new(["agent-a", "agent-b"]);
        for _ in 0..20 {
            let agent = agents.user_agent();
            assert!(agent == "agent-a" || agent == "agent-b");
        }
    }

    #[test]
    fn test_empty_rotation_falls_back_to_defaults() {
        let agents = RotatingAgents::new(Vec::<String>::new());
        assert!(agents.user_agent().starts_with("Mozilla/5.0"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_pacer_sleeps_for_picked_delay() {
        let pacer = Pacer::random();
        let start = tokio::time::Instant::now();
        pacer.politeness().await;
        let elapsed = start.elapsed();
        assert!(elapsed >= Duration::from_secs(1) && elapsed <= Duration::from_secs(2) + Duration::from_millis(5));
    }
}
