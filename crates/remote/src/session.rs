use crate::auth::AuthProvider;
use crate::error::{ErrorKind, Result, into_action};
use crate::models::Credentials;
use async_trait::async_trait;
use exn::OptionExt;
use mailport_executor::{ActionResult, Reauthorize};
use std::sync::Arc;
use tokio::sync::RwLock;

/// The credentials currently in use, refreshed on demand.
///
/// Clients read the token before every request; the executor refreshes it
/// through [`Reauthorize`] when the remote starts answering "unauthorized".
pub struct Session {
    provider: Arc<dyn AuthProvider>,
    current: RwLock<Option<Credentials>>,
}

impl Session {
    pub fn new(provider: Arc<dyn AuthProvider>) -> Self {
        Self {
            provider,
            current: RwLock::new(None),
        }
    }

    /// Obtain fresh credentials from the provider and start using them.
    pub async fn authorize(&self) -> Result<()> {
        let credentials = self.provider.authorize().await?;
        *self.current.write().await = Some(credentials);
        Ok(())
    }

    /// The current bearer token; unauthorized until [`authorize`](Self::authorize) succeeds.
    pub async fn bearer(&self) -> Result<String> {
        let current = self.current.read().await;
        let credentials = current.as_ref().ok_or_raise(|| ErrorKind::Unauthorized)?;
        Ok(credentials.access_token.clone())
    }
}

#[async_trait]
impl Reauthorize for Session {
    async fn reauthorize(&self) -> ActionResult<()> {
        self.authorize().await.map_err(into_action)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::StaticToken;
    use mailport_executor::FailureCode;

    struct Rotating(std::sync::atomic::AtomicUsize);

    #[async_trait]
    impl AuthProvider for Rotating {
        async fn authorize(&self) -> Result<Credentials> {
            let n = self.0.fetch_add(1, std::sync::atomic::Ordering::SeqCst);
            Ok(Credentials::new(format!("token-{n}")))
        }
    }

    #[tokio::test]
    async fn test_unauthorized_before_authorize() {
        let session = Session::new(Arc::new(StaticToken::new("abc")));
        assert_eq!(*session.bearer().await.unwrap_err(), ErrorKind::Unauthorized);
        session.authorize().await.unwrap();
        assert_eq!(session.bearer().await.unwrap(), "abc");
    }

    #[tokio::test]
    async fn test_reauthorize_replaces_token() {
        let session = Session::new(Arc::new(Rotating(Default::default())));
        session.authorize().await.unwrap();
        assert_eq!(session.bearer().await.unwrap(), "token-0");
        session.reauthorize().await.unwrap();
        assert_eq!(session.bearer().await.unwrap(), "token-1");
    }

    #[tokio::test]
    async fn test_failed_reauthorize_is_retryable() {
        struct Broken;
        #[async_trait]
        impl AuthProvider for Broken {
            async fn authorize(&self) -> Result<Credentials> {
                exn::bail!(ErrorKind::Authorization)
            }
        }
        let err = Session::new(Arc::new(Broken)).reauthorize().await.unwrap_err();
        assert_eq!(*err, FailureCode::Unknown);
    }
}
