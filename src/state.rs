use std::sync::Arc;

use crate::config::AppConfig;
use crate::mailer::{ConsoleMailer, Mailer, NullMailer};
use crate::store::{JsonFileBackend, MemoryBackend, Store};

#[derive(Clone)]
pub struct AppState {
    pub store: Store,
    pub config: Arc<AppConfig>,
    pub mailer: Arc<dyn Mailer>,
}

impl AppState {
    pub fn init() -> anyhow::Result<Self> {
        let config = Arc::new(AppConfig::from_env()?);
        let backend = JsonFileBackend::new(config.data_path.clone(), config.seed_path.clone());
        let mailer = Arc::new(ConsoleMailer::new(config.from_email.clone())) as Arc<dyn Mailer>;
        Ok(Self {
            store: Store::new(Arc::new(backend)),
            config,
            mailer,
        })
    }

    /// In-memory wiring for tests: empty store, no-op mailer, fixed config.
    pub fn fake() -> Self {
        let config = Arc::new(AppConfig {
            data_path: std::env::temp_dir().join("staffdesk-test-users.json"),
            seed_path: None,
            upload_dir: std::env::temp_dir().join("staffdesk-test-uploads"),
            public_base_url: "http://localhost:8080".into(),
            from_email: "no-reply@staffdesk.local".into(),
            jwt: crate::config::JwtConfig {
                secret: "test".into(),
                issuer: "test-issuer".into(),
                audience: "test-aud".into(),
                ttl_minutes: 5,
                refresh_ttl_minutes: 60,
            },
        });
        Self {
            store: Store::new(Arc::new(MemoryBackend::default())),
            config,
            mailer: Arc::new(NullMailer),
        }
    }
}
