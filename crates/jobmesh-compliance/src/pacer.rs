//! Per-domain request spacing shared by every outbound HTTP caller.
//!
//! A [`RequestPacer`] hands out one start slot per domain at a time, each
//! at least [`RequestPacer::delay_for`] after the previous one. With an
//! engine attached, [`RequestPacer::acquire`] also waits for the domain's
//! rate window instead of giving up on it.

use crate::engine::ComplianceEngine;
use crate::error::{ComplianceError, Result};
use crate::policy::normalize_domain;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

/// Spaces requests to the same domain.
#[derive(Debug)]
pub struct RequestPacer {
    compliance: Option<Arc<ComplianceEngine>>,
    default_delay: Duration,
    next_slot: Mutex<HashMap<String, Instant>>,
}

impl RequestPacer {
    /// Create a pacer.
    ///
    /// Without an engine only `default_delay` applies.
    #[must_use]
    pub fn new(compliance: Option<Arc<ComplianceEngine>>, default_delay: Duration) -> Self {
        Self {
            compliance,
            default_delay,
            next_slot: Mutex::new(HashMap::new()),
        }
    }

    /// The engine consulted for delays and rate windows, if any.
    #[must_use]
    pub fn compliance(&self) -> Option<&Arc<ComplianceEngine>> {
        self.compliance.as_ref()
    }

    /// Delay to keep between two requests to `domain`.
    #[must_use]
    pub fn delay_for(&self, domain: &str) -> Duration {
        let floor = self
            .compliance
            .as_ref()
            .map_or(Duration::ZERO, |engine| {
                Duration::from_millis(engine.min_delay_ms(domain))
            });
        floor.max(self.default_delay)
    }

    /// Sleep until the next slot for `domain`, reserving the one after.
    pub async fn wait_turn(&self, domain: &str, cancel: &CancellationToken) -> Result<()> {
        let domain = normalize_domain(domain);
        let delay = self.delay_for(&domain);
        let now = Instant::now();

        let start_at = {
            let mut slots = self.next_slot.lock().expect("acquire pacer slot lock");
            let start_at = slots.get(&domain).copied().map_or(now, |slot| slot.max(now));
            slots.insert(domain, start_at + delay);
            start_at
        };

        if start_at > now {
            tokio::select! {
                biased;
                () = cancel.cancelled() => return Err(ComplianceError::Cancelled),
                () = tokio::time::sleep_until(start_at) => {}
            }
        }
        Ok(())
    }

    /// Wait for a slot, then for room in the domain's rate window.
    ///
    /// Returns `false` only when the domain's policy allows no requests.
    /// Without an engine this is [`wait_turn`](Self::wait_turn) and always
    /// returns `true`.
    pub async fn acquire(
        &self,
        domain: &str,
        url: Option<&str>,
        cancel: &CancellationToken,
    ) -> Result<bool> {
        self.wait_turn(domain, cancel).await?;
        match &self.compliance {
            Some(engine) => engine.acquire(domain, url, cancel).await,
            None => Ok(true),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::policy::DomainPolicyStore;
    use jobmesh_core::DomainPolicy;

    fn engine(domain: &str, rpm: u32, delay_ms: u64) -> Arc<ComplianceEngine> {
        let mut store = DomainPolicyStore::with_builtin();
        store.set_policy(DomainPolicy::new(domain, rpm, delay_ms, true));
        Arc::new(ComplianceEngine::new(store))
    }

    #[tokio::test(start_paused = true)]
    async fn test_wait_turn_spaces_same_domain() {
        let pacer = RequestPacer::new(None, Duration::from_secs(2));
        let cancel = CancellationToken::new();
        let started = Instant::now();

        for _ in 0..3 {
            pacer.wait_turn("www.acme.com", &cancel).await.expect("slot");
        }
        let elapsed = started.elapsed();
        assert!(elapsed >= Duration::from_secs(4) && elapsed < Duration::from_secs(5));

        // Another domain has its own slots.
        pacer.wait_turn("globex.com", &cancel).await.expect("slot");
        assert!(started.elapsed() < Duration::from_secs(5));
    }

    #[tokio::test(start_paused = true)]
    async fn test_hosts_sharing_a_domain_share_slots() {
        let pacer = RequestPacer::new(None, Duration::from_secs(1));
        let cancel = CancellationToken::new();
        let started = Instant::now();

        pacer.wait_turn("www.acme.com", &cancel).await.expect("slot");
        pacer.wait_turn("acme.com", &cancel).await.expect("slot");
        let elapsed = started.elapsed();
        assert!(elapsed >= Duration::from_secs(1) && elapsed < Duration::from_secs(2));
    }

    #[tokio::test]
    async fn test_delay_for_uses_engine_floor() {
        let engine = engine("acme.com", 10, 2500);
        let pacer = RequestPacer::new(Some(engine), Duration::from_millis(100));
        assert_eq!(pacer.delay_for("acme.com"), Duration::from_millis(2500));

        let pacer = RequestPacer::new(None, Duration::from_millis(100));
        assert_eq!(pacer.delay_for("acme.com"), Duration::from_millis(100));
    }

    #[tokio::test(start_paused = true)]
    async fn test_acquire_waits_out_full_window() {
        let engine = engine("acme.com", 3, 0);
        let pacer = RequestPacer::new(Some(Arc::clone(&engine)), Duration::ZERO);
        let cancel = CancellationToken::new();
        let started = Instant::now();

        for i in 0..5 {
            let url = format!("https://acme.com/{i}");
            assert!(pacer
                .acquire("acme.com", Some(&url), &cancel)
                .await
                .expect("acquire"));
        }

        assert!(started.elapsed() >= Duration::from_secs(60));
        let stats = engine.get_domain_statistics();
        assert_eq!(stats["acme.com"].total_requests, 5);
        assert_eq!(stats["acme.com"].blocked_requests, 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_acquire_honors_engine_delay() {
        let engine = engine("acme.com", 100, 3000);
        let pacer = RequestPacer::new(Some(engine), Duration::ZERO);
        let cancel = CancellationToken::new();
        let started = Instant::now();

        for _ in 0..3 {
            assert!(pacer.acquire("acme.com", None, &cancel).await.expect("acquire"));
        }
        let elapsed = started.elapsed();
        assert!(elapsed >= Duration::from_secs(6) && elapsed < Duration::from_secs(7));
    }

    #[tokio::test(start_paused = true)]
    async fn test_acquire_refused_for_closed_domain() {
        let pacer = RequestPacer::new(Some(engine("closed.example", 0, 0)), Duration::ZERO);
        let admitted = pacer
            .acquire("closed.example", None, &CancellationToken::new())
            .await
            .expect("acquire");
        assert!(!admitted);
    }

    #[tokio::test(start_paused = true)]
    async fn test_wait_turn_cancelled() {
        let pacer = RequestPacer::new(None, Duration::from_secs(60));
        let cancel = CancellationToken::new();
        pacer.wait_turn("slow.example", &cancel).await.expect("first slot");

        cancel.cancel();
        let result = pacer.wait_turn("slow.example", &cancel).await;
        assert!(matches!(result, Err(ComplianceError::Cancelled)));
    }
}
