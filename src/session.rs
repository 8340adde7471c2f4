//! The authenticated session shared by every reconciliation.

use std::fmt;
use std::sync::Arc;

use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use tracing::{info, warn};

use crate::classify::ErrorClass;
use crate::client::{ApiError, CloudClient};
use crate::config::ProviderConfig;
use crate::error::ProviderError;
use crate::retry::{retry, Attempt, CancelSignal, RetryFailure, RetryPolicy};

/// Basic-auth context for the API-keys sub-API.
#[derive(Clone, PartialEq, Eq)]
pub struct ApiKeyAuth {
    api_key: String,
    api_secret: String,
}

impl ApiKeyAuth {
    /// Build the context from a cloud API key and secret.
    pub fn new(api_key: impl Into<String>, api_secret: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            api_secret: api_secret.into(),
        }
    }

    /// The basic-auth user name.
    pub fn api_key(&self) -> &str {
        &self.api_key
    }

    /// Whether both halves of the credential are present.
    pub fn is_configured(&self) -> bool {
        !self.api_key.is_empty() && !self.api_secret.is_empty()
    }

    /// Value of the `Authorization` header.
    pub fn authorization_header(&self) -> String {
        let token = STANDARD.encode(format!("{}:{}", self.api_key, self.api_secret));
        format!("Basic {}", token)
    }
}

impl fmt::Debug for ApiKeyAuth {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ApiKeyAuth")
            .field("api_key", &self.api_key)
            .field("api_secret", &"<redacted>")
            .finish()
    }
}

/// A logged-in client plus the API-keys context.
///
/// A `Session` only exists once login has succeeded and is never mutated
/// afterwards; share it with `Arc`. [`Session::establish`] is the only way to
/// get one from outside the crate:
///
/// ```compile_fail
/// use std::sync::Arc;
/// use ccloud_provider::{ApiKeyAuth, CloudClient, Session};
///
/// fn skip_login(client: Arc<dyn CloudClient>) -> Session {
///     Session::from_parts(client, ApiKeyAuth::new("", ""))
/// }
/// ```
#[derive(Clone)]
pub struct Session {
    client: Arc<dyn CloudClient>,
    api_keys: ApiKeyAuth,
}

impl Session {
    /// Log in with `client`, retrying rate-limited attempts per `policy`.
    ///
    /// The first attempt is made immediately. A rate-limited failure sleeps
    /// for the policy's backoff and tries again until the policy's timeout;
    /// any other failure ends the loop after that one attempt.
    pub async fn establish(
        client: Arc<dyn CloudClient>,
        config: &ProviderConfig,
        policy: &RetryPolicy,
        cancel: CancelSignal,
    ) -> Result<Self, ProviderError> {
        info!(username = %config.username, "Initializing Confluent Cloud session");

        let result = retry(policy, cancel, || {
            let client = Arc::clone(&client);
            async move { client.login().await.map_err(classify_login_error) }
        })
        .await;

        match result {
            Ok(()) => Ok(Self {
                client,
                api_keys: ApiKeyAuth::new(&config.cloud_api_key, &config.cloud_api_secret),
            }),
            Err(failure) => {
                warn!(error = %failure, "Login failed");
                Err(login_failure(failure))
            }
        }
    }

    /// Wrap an already authenticated client.
    pub(crate) fn from_parts(client: Arc<dyn CloudClient>, api_keys: ApiKeyAuth) -> Self {
        Self { client, api_keys }
    }

    /// The remote client.
    pub fn client(&self) -> &dyn CloudClient {
        self.client.as_ref()
    }

    /// The API-keys sub-API context.
    pub fn api_keys(&self) -> &ApiKeyAuth {
        &self.api_keys
    }

    /// Organization of the logged-in user.
    pub async fn organization_id(&self) -> Result<i64, ApiError> {
        Ok(self.client.me().await?.organization_id)
    }
}

impl fmt::Debug for Session {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Session")
            .field("api_keys", &self.api_keys)
            .finish_non_exhaustive()
    }
}

fn classify_login_error(err: ApiError) -> Attempt<ApiError> {
    match err.class() {
        ErrorClass::RateLimited => Attempt::Retry(err),
        _ => Attempt::Abort(err),
    }
}

fn login_failure(failure: RetryFailure<ApiError>) -> ProviderError {
    match failure {
        RetryFailure::Aborted(err) => ProviderError::Auth(err.to_string()),
        RetryFailure::TimedOut {
            attempts,
            elapsed,
            last,
        } => ProviderError::Auth(format!(
            "still rate limited after {} attempts over {:?}: {}",
            attempts, elapsed, last
        )),
        RetryFailure::Cancelled { attempts, last } => ProviderError::Cancelled(format!(
            "login stopped after {} attempts: {}",
            attempts, last
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ProviderOptions;
    use crate::testing::FakeCloud;
    use std::time::Duration;
    use tokio::time::Instant;

    fn config() -> ProviderConfig {
        ProviderConfig {
            username: "ops@example.com".to_string(),
            password: "pw".to_string(),
            cloud_api_key: "KEY".to_string(),
            cloud_api_secret: "SECRET".to_string(),
        }
    }

    async fn establish(fake: &Arc<FakeCloud>) -> Result<Session, ProviderError> {
        let client: Arc<dyn CloudClient> = fake.clone();
        Session::establish(
            client,
            &config(),
            &ProviderOptions::default().login,
            CancelSignal::never(),
        )
        .await
    }

    #[tokio::test(start_paused = true)]
    async fn test_first_attempt_success() {
        let fake = Arc::new(FakeCloud::new());
        let start = Instant::now();
        let session = establish(&fake).await.unwrap();
        assert_eq!(fake.login_attempts().len(), 1);
        assert_eq!(start.elapsed(), Duration::ZERO);
        assert_eq!(session.api_keys().api_key(), "KEY");
        assert!(session.api_keys().is_configured());
    }

    #[tokio::test(start_paused = true)]
    async fn test_rate_limited_login_backs_off_with_doubling_waits() {
        let fake = Arc::new(FakeCloud::new());
        fake.rate_limit_logins(4);

        let session = establish(&fake).await.unwrap();
        let attempts = fake.login_attempts();
        assert_eq!(attempts.len(), 5);

        let gaps: Vec<Duration> = attempts.windows(2).map(|w| w[1] - w[0]).collect();
        for (i, gap) in gaps.iter().enumerate() {
            let floor = Duration::from_secs(2 << i);
            assert!(*gap >= floor, "gap {} was {:?}", i, gap);
            assert!(*gap < floor + Duration::from_secs(1), "gap {} was {:?}", i, gap);
        }
        assert!(gaps.windows(2).all(|w| w[1] > w[0]));

        // structurally identical to a first-try session
        assert_eq!(session.api_keys(), &ApiKeyAuth::new("KEY", "SECRET"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_non_rate_limit_error_is_terminal_after_one_attempt() {
        let fake = Arc::new(FakeCloud::new());
        fake.fail_logins_with("invalid username or password");

        let err = establish(&fake).await.unwrap_err();
        assert!(matches!(err, ProviderError::Auth(ref msg) if msg.contains("invalid username")));
        assert_eq!(fake.login_attempts().len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_rate_limit_until_deadline() {
        let fake = Arc::new(FakeCloud::new());
        fake.rate_limit_logins(u32::MAX);
        let start = Instant::now();

        let err = establish(&fake).await.unwrap_err();
        assert!(matches!(err, ProviderError::Auth(ref msg) if msg.contains("Exceeded rate limit")));
        assert_eq!(start.elapsed(), Duration::from_secs(30 * 60));
        // 2+4+...+1024s covers 2046s, so the deadline cuts the 10th wait short
        assert_eq!(fake.login_attempts().len(), 10);
    }

    #[tokio::test(start_paused = true)]
    async fn test_stop_interrupts_login_backoff() {
        let fake = Arc::new(FakeCloud::new());
        fake.rate_limit_logins(u32::MAX);
        let (tx, rx) = tokio::sync::watch::channel(false);

        let client: Arc<dyn CloudClient> = fake.clone();
        let handle = tokio::spawn(async move {
            Session::establish(
                client,
                &config(),
                &ProviderOptions::default().login,
                CancelSignal::new(rx),
            )
            .await
        });
        tokio::time::sleep(Duration::from_secs(10)).await;
        tx.send(true).unwrap();

        let err = handle.await.unwrap().unwrap_err();
        assert!(matches!(err, ProviderError::Cancelled(_)));
        assert!(fake.login_attempts().len() <= 3);
    }

    #[test]
    fn test_authorization_header() {
        let auth = ApiKeyAuth::new("KEY", "SECRET");
        assert_eq!(auth.authorization_header(), "Basic S0VZOlNFQ1JFVA==");
        assert!(!format!("{:?}", auth).contains("SECRET"));
        assert!(!ApiKeyAuth::new("", "").is_configured());
    }
}
