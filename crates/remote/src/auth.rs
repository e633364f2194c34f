use crate::error::{ErrorKind, Result};
use crate::models::Credentials;
use async_trait::async_trait;
use exn::ResultExt;
use tokio::process::Command;
use tracing::{debug, instrument, warn};

/// Source of bearer tokens.
#[async_trait]
pub trait AuthProvider: Send + Sync {
    async fn authorize(&self) -> Result<Credentials>;
}

/// A fixed token, handed out as-is every time.
pub struct StaticToken(Credentials);

impl StaticToken {
    pub fn new(token: impl Into<String>) -> Self {
        Self(Credentials::new(token))
    }
}

#[async_trait]
impl AuthProvider for StaticToken {
    async fn authorize(&self) -> Result<Credentials> {
        Ok(self.0.clone())
    }
}

/// Runs a shell command and takes its trimmed standard output as the token.
///
/// The command sees the variables added with [`with_env`](Self::with_env),
/// which is how the service account and key file reach whatever tool mints
/// the token.
pub struct CommandToken {
    command: String,
    env: Vec<(String, String)>,
}

impl CommandToken {
    pub fn new(command: impl Into<String>) -> Self {
        Self {
            command: command.into(),
            env: Vec::new(),
        }
    }

    pub fn with_env(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.env.push((key.into(), value.into()));
        self
    }
}

#[async_trait]
impl AuthProvider for CommandToken {
    #[instrument(skip(self))]
    async fn authorize(&self) -> Result<Credentials> {
        let output = Command::new("sh")
            .arg("-c")
            .arg(&self.command)
            .envs(self.env.iter().map(|(k, v)| (k, v)))
            .kill_on_drop(true)
            .output()
            .await
            .or_raise(|| ErrorKind::Authorization)?;
        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            warn!(status = %output.status, stderr = %stderr.trim(), "token command failed");
            exn::bail!(ErrorKind::Authorization);
        }
        let token = String::from_utf8(output.stdout).or_raise(|| ErrorKind::Authorization)?;
        let token = token.trim();
        if token.is_empty() {
            warn!("token command printed nothing");
            exn::bail!(ErrorKind::Authorization);
        }
        debug!("obtained access token");
        Ok(Credentials::new(token))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_static_token() {
        let creds = StaticToken::new("abc").authorize().await.unwrap();
        assert_eq!(creds.access_token, "abc");
    }

    #[tokio::test]
    async fn test_command_token_trims_output() {
        let provider = CommandToken::new("echo \"token-for-$MAILPORT_ACCOUNT\"").with_env("MAILPORT_ACCOUNT", "jane@example.com");
        let creds = provider.authorize().await.unwrap();
        assert_eq!(creds.access_token, "token-for-jane@example.com");
    }

    #[tokio::test]
    async fn test_command_token_failure() {
        let err = CommandToken::new("echo nope >&2; exit 3").authorize().await.unwrap_err();
        assert_eq!(*err, ErrorKind::Authorization);
    }

    #[tokio::test]
    async fn test_command_token_empty_output() {
        let err = CommandToken::new("true").authorize().await.unwrap_err();
        assert_eq!(*err, ErrorKind::Authorization);
    }
}
