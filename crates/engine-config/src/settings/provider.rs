use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProviderKind {
    Aws,
    Local,
    Memory,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CloudProviderSettings {
    pub cloud_provider_type: ProviderKind,

    #[serde(default)]
    pub aws: Option<AwsSettings>,

    #[serde(default)]
    pub local: Option<LocalSettings>,

    /// Upper bound of a single persist call.
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl CloudProviderSettings {
    pub fn memory() -> Self {
        Self {
            cloud_provider_type: ProviderKind::Memory,
            aws: None,
            local: None,
            timeout_secs: default_timeout_secs(),
        }
    }
}

fn default_timeout_secs() -> u64 {
    60
}

/// S3 and S3-compatible stores. Credentials left unset are taken from the environment.
#[derive(Clone, Default, Serialize, Deserialize)]
pub struct AwsSettings {
    pub bucket: String,

    #[serde(default)]
    pub region: Option<String>,

    #[serde(default)]
    pub endpoint: Option<String>,

    #[serde(default, skip_serializing)]
    pub access_key_id: Option<String>,

    #[serde(default, skip_serializing)]
    pub secret_access_key: Option<String>,

    #[serde(default, skip_serializing)]
    pub session_token: Option<String>,

    /// Allow plain http endpoints (local S3 emulators).
    #[serde(default)]
    pub allow_http: bool,
}

impl std::fmt::Debug for AwsSettings {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AwsSettings")
            .field("bucket", &self.bucket)
            .field("region", &self.region)
            .field("endpoint", &self.endpoint)
            .field("access_key_id", &self.access_key_id.as_ref().map(|_| "***"))
            .field("secret_access_key", &self.secret_access_key.as_ref().map(|_| "***"))
            .field("session_token", &self.session_token.as_ref().map(|_| "***"))
            .field("allow_http", &self.allow_http)
            .finish()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LocalSettings {
    pub root: String,
}
