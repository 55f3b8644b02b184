use std::future::Future;
use std::time::Duration;

use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

use crate::error::Interrupted;

/// Cancellation signal plus an optional expiry instant.
///
/// Every store and transport operation receives one. Cloning shares the
/// cancellation token.
#[derive(Debug, Clone, Default)]
pub struct Deadline {
    token: CancellationToken,
    expires_at: Option<Instant>,
}

impl Deadline {
    /// Never expires; cancelled only through its token
    pub fn none() -> Self {
        Self::default()
    }

    /// Bound to an external cancellation token, no expiry
    pub fn new(token: CancellationToken) -> Self {
        Self {
            token,
            expires_at: None,
        }
    }

    /// Expires `timeout` from now
    pub fn after(timeout: Duration) -> Self {
        Self::none().with_timeout(timeout)
    }

    /// Same token, expiring at the earlier of the current expiry and
    /// `timeout` from now
    pub fn with_timeout(&self, timeout: Duration) -> Self {
        let candidate = Instant::now() + timeout;
        let expires_at = match self.expires_at {
            Some(current) if current < candidate => current,
            _ => candidate,
        };
        Self {
            token: self.token.clone(),
            expires_at: Some(expires_at),
        }
    }

    pub fn token(&self) -> &CancellationToken {
        &self.token
    }

    pub fn expires_at(&self) -> Option<Instant> {
        self.expires_at
    }

    /// Fail fast if the deadline already fired
    pub fn check(&self) -> Result<(), Interrupted> {
        if self.token.is_cancelled() {
            return Err(Interrupted::Cancelled);
        }
        if self.expires_at.is_some_and(|at| Instant::now() >= at) {
            return Err(Interrupted::TimedOut);
        }
        Ok(())
    }

    /// Drive `fut` to completion unless the deadline fires first.
    ///
    /// On interruption `fut` is dropped; callers rely on drop to roll back
    /// anything it started.
    pub async fn run<F: Future>(&self, fut: F) -> Result<F::Output, Interrupted> {
        self.check()?;

        let expiry = async {
            match self.expires_at {
                Some(at) => tokio::time::sleep_until(at).await,
                None => std::future::pending::<()>().await,
            }
        };

        tokio::select! {
            biased;
            _ = self.token.cancelled() => Err(Interrupted::Cancelled),
            _ = expiry => Err(Interrupted::TimedOut),
            out = fut => Ok(out),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_run_completes() {
        let deadline = Deadline::none();
        assert_eq!(deadline.run(async { 7 }).await, Ok(7));
    }

    #[tokio::test]
    async fn test_cancelled_before_start() {
        let token = CancellationToken::new();
        token.cancel();
        let deadline = Deadline::new(token);
        assert_eq!(deadline.check(), Err(Interrupted::Cancelled));
        assert_eq!(
            deadline.run(async { 7 }).await,
            Err(Interrupted::Cancelled)
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_times_out() {
        let deadline = Deadline::after(Duration::from_millis(50));
        let slow = tokio::time::sleep(Duration::from_secs(5));
        assert_eq!(deadline.run(slow).await, Err(Interrupted::TimedOut));
    }

    #[tokio::test]
    async fn test_cancel_mid_flight() {
        let token = CancellationToken::new();
        let deadline = Deadline::new(token.clone());
        let handle = tokio::spawn(async move {
            deadline
                .run(std::future::pending::<()>())
                .await
        });
        token.cancel();
        assert_eq!(handle.await.unwrap(), Err(Interrupted::Cancelled));
    }

    #[test]
    fn test_with_timeout_keeps_earlier_expiry() {
        let rt = tokio::runtime::Builder::new_current_thread()
            .enable_time()
            .build()
            .unwrap();
        rt.block_on(async {
            let short = Deadline::after(Duration::from_millis(10));
            let longer = short.with_timeout(Duration::from_secs(10));
            assert_eq!(longer.expires_at(), short.expires_at());
        });
    }
}
