//! Policy Manager Service Layer
//!
//! The service holds the base AWS configuration and an STS client. Each run assumes the
//! management role in the target account and rewrites one resource policy. Adapters (the
//! CLI) construct it from a [`ManagerConfig`].

use crate::config::{ManagerConfig, LOCALSTACK_ENDPOINT, LOCALSTACK_REGION};
use crate::error::XaPolicyResult;
use aws_config::{BehaviorVersion, Region, SdkConfig};
use aws_credential_types::Credentials;
use aws_sdk_sts::Client as StsClient;
use log::debug;

pub struct PolicyManagerService {
    pub(crate) config: ManagerConfig,
    pub(crate) sdk_config: SdkConfig,
    pub(crate) sts_client: StsClient,
}

impl PolicyManagerService {
    /// Create a new service instance.
    ///
    /// The configuration is loaded using the default credential provider chain, or pointed
    /// at LocalStack when `config.local` is set.
    ///
    /// # Errors
    ///
    /// Returns an error if AWS SDK configuration fails to load.
    pub async fn new(config: ManagerConfig) -> XaPolicyResult<Self> {
        let sdk_config = load_sdk_config(config.local).await;

        Ok(Self {
            sts_client: StsClient::new(&sdk_config),
            sdk_config,
            config,
        })
    }

    pub fn config(&self) -> &ManagerConfig {
        &self.config
    }

    // sync() and the per-service entry points are in sync.rs
}

async fn load_sdk_config(local: bool) -> SdkConfig {
    let mut loader = aws_config::defaults(BehaviorVersion::latest());

    if local {
        debug!("using LocalStack endpoint {LOCALSTACK_ENDPOINT}");
        loader = loader
            .endpoint_url(LOCALSTACK_ENDPOINT)
            .region(Region::new(LOCALSTACK_REGION))
            .credentials_provider(Credentials::new("test", "test", None, None, "localstack"));
    }

    loader.load().await
}
