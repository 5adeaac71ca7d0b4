/*
 * Responsibility
 * - The fixed validation policy (issuer, audience, algorithm, leeway)
 * - The time source used to evaluate "now" (injectable for tests)
 */
use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use jsonwebtoken::Algorithm;

pub const DEFAULT_ISSUER: &str = "OpsMx";
pub const DEFAULT_AUDIENCE: &str = "ssd.opsmx.io";
pub const DEFAULT_LEEWAY: Duration = Duration::from_secs(5 * 60);

/// The only accepted signing algorithm. No negotiation.
pub const SIGNING_ALGORITHM: Algorithm = Algorithm::PS256;

/// Source of "now" for temporal claim checks.
#[derive(Clone)]
pub struct Clock(Arc<dyn Fn() -> DateTime<Utc> + Send + Sync>);

impl Clock {
    pub fn system() -> Self {
        Self(Arc::new(Utc::now))
    }

    /// Always reports `at`.
    pub fn fixed(at: DateTime<Utc>) -> Self {
        Self(Arc::new(move || at))
    }

    pub fn from_fn<F>(f: F) -> Self
    where
        F: Fn() -> DateTime<Utc> + Send + Sync + 'static,
    {
        Self(Arc::new(f))
    }

    pub fn now(&self) -> DateTime<Utc> {
        (self.0)()
    }
}

impl Default for Clock {
    fn default() -> Self {
        Self::system()
    }
}

impl fmt::Debug for Clock {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Clock(..)")
    }
}

/// Validation policy applied to every token.
///
/// Built once and handed to the verifier; it cannot be changed afterwards.
#[derive(Debug, Clone)]
pub struct VerificationPolicy {
    issuer: String,
    audience: String,
    leeway: Duration,
    clock: Clock,
}

impl VerificationPolicy {
    pub fn new(issuer: impl Into<String>, audience: impl Into<String>) -> Self {
        Self {
            issuer: issuer.into(),
            audience: audience.into(),
            leeway: DEFAULT_LEEWAY,
            clock: Clock::system(),
        }
    }

    pub fn with_leeway(mut self, leeway: Duration) -> Self {
        self.leeway = leeway;
        self
    }

    pub fn with_clock(mut self, clock: Clock) -> Self {
        self.clock = clock;
        self
    }

    pub fn issuer(&self) -> &str {
        &self.issuer
    }

    pub fn audience(&self) -> &str {
        &self.audience
    }

    pub fn algorithm(&self) -> Algorithm {
        SIGNING_ALGORITHM
    }

    pub fn leeway(&self) -> Duration {
        self.leeway
    }

    pub fn leeway_seconds(&self) -> i64 {
        i64::try_from(self.leeway.as_secs()).unwrap_or(i64::MAX)
    }

    /// Current time as seconds since the epoch.
    pub fn now_timestamp(&self) -> i64 {
        self.clock.now().timestamp()
    }
}

impl Default for VerificationPolicy {
    fn default() -> Self {
        Self::new(DEFAULT_ISSUER, DEFAULT_AUDIENCE)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[test]
    fn defaults_match_ssd_tokens() {
        let policy = VerificationPolicy::default();
        assert_eq!(policy.issuer(), "OpsMx");
        assert_eq!(policy.audience(), "ssd.opsmx.io");
        assert_eq!(policy.algorithm(), Algorithm::PS256);
        assert_eq!(policy.leeway_seconds(), 300);
    }

    #[test]
    fn fixed_clock_drives_now() {
        let at = Utc.timestamp_opt(1_700_000_000, 0).unwrap();
        let policy = VerificationPolicy::default().with_clock(Clock::fixed(at));
        assert_eq!(policy.now_timestamp(), 1_700_000_000);
    }

    #[test]
    fn debug_output_does_not_read_the_clock() {
        let reads = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&reads);
        let clock = Clock::from_fn(move || {
            counter.fetch_add(1, Ordering::SeqCst);
            Utc::now()
        });
        let policy = VerificationPolicy::default().with_clock(clock);

        let rendered = format!("{policy:?}");

        assert!(rendered.contains("Clock(..)"));
        assert_eq!(reads.load(Ordering::SeqCst), 0);
    }
}
