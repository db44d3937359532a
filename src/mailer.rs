use async_trait::async_trait;
use tracing::info;

/// Outgoing email seam. Delivery is an external collaborator; the store and
/// workflows only hand over fully-composed messages.
#[async_trait]
pub trait Mailer: Send + Sync {
    async fn send(&self, to: &str, subject: &str, body: &str) -> anyhow::Result<()>;
}

/// Writes messages to the log instead of delivering them, the same role the
/// console email backend plays in development deployments.
pub struct ConsoleMailer {
    from: String,
}

impl ConsoleMailer {
    pub fn new(from: String) -> Self {
        Self { from }
    }
}

#[async_trait]
impl Mailer for ConsoleMailer {
    async fn send(&self, to: &str, subject: &str, body: &str) -> anyhow::Result<()> {
        info!(from = %self.from, to = %to, subject = %subject, body = %body, "outgoing email");
        Ok(())
    }
}

/// Swallows everything; used by `AppState::fake()`.
pub struct NullMailer;

#[async_trait]
impl Mailer for NullMailer {
    async fn send(&self, _to: &str, _subject: &str, _body: &str) -> anyhow::Result<()> {
        Ok(())
    }
}
