use anyhow::{bail, Context, Result};
use std::time::Duration;

pub const DEFAULT_SPREADSHEET: &str = "CarSearch";
pub const DEFAULT_RESULTS_WORKSHEET: &str = "results";
pub const DEFAULT_CRITERIA_WORKSHEET: &str = "Criteria";

const ENV_TYPE: &str = "GOOGLE_SHEETS_TYPE";
const ENV_PROJECT_ID: &str = "GOOGLE_SHEETS_PROJECT_ID";
const ENV_PRIVATE_KEY_ID: &str = "GOOGLE_SHEETS_PRIVATE_KEY_ID";
const ENV_PRIVATE_KEY: &str = "GOOGLE_SHEETS_PRIVATE_KEY";
const ENV_CLIENT_EMAIL: &str = "GOOGLE_SHEETS_CLIENT_EMAIL";
const ENV_CLIENT_ID: &str = "GOOGLE_SHEETS_CLIENT_ID";
const ENV_AUTH_URI: &str = "GOOGLE_SHEETS_AUTH_URI";
const ENV_TOKEN_URI: &str = "GOOGLE_SHEETS_TOKEN_URI";
const ENV_AUTH_PROVIDER_CERT_URL: &str = "GOOGLE_SHEETS_AUTH_PROVIDER_CERT_URL";
const ENV_CLIENT_CERT_URL: &str = "GOOGLE_SHEETS_CLIENT_CERT_URL";

const SERVICE_ACCOUNT_TYPE: &str = "service_account";

/// Service-account key assembled from the `GOOGLE_SHEETS_*` variables.
/// Field names match the JSON key file Google issues.
#[derive(Clone)]
pub struct ServiceAccountKey {
    pub key_type: String,
    pub project_id: Option<String>,
    pub private_key_id: Option<String>,
    pub private_key: String,
    pub client_email: String,
    pub client_id: Option<String>,
    pub auth_uri: Option<String>,
    pub token_uri: String,
    pub auth_provider_x509_cert_url: Option<String>,
    pub client_x509_cert_url: Option<String>,
}

// The private key never ends up in debug output.
impl std::fmt::Debug for ServiceAccountKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ServiceAccountKey")
            .field("key_type", &self.key_type)
            .field("project_id", &self.project_id)
            .field("private_key_id", &self.private_key_id)
            .field("client_email", &self.client_email)
            .field("token_uri", &self.token_uri)
            .finish_non_exhaustive()
    }
}

impl ServiceAccountKey {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Builds the key from any name -> value lookup. Blank values count as absent.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let optional = |name: &str| {
            lookup(name)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };
        let required = |name: &str| {
            optional(name).with_context(|| format!("Missing required environment variable {}", name))
        };

        let key_type = required(ENV_TYPE)?;
        if key_type != SERVICE_ACCOUNT_TYPE {
            bail!(
                "{} must be '{}', got '{}'",
                ENV_TYPE,
                SERVICE_ACCOUNT_TYPE,
                key_type
            );
        }

        let private_key = normalize_private_key(&required(ENV_PRIVATE_KEY)?);
        if !private_key.contains("-----BEGIN") {
            bail!("{} is not a PEM encoded key", ENV_PRIVATE_KEY);
        }

        let client_email = required(ENV_CLIENT_EMAIL)?;
        if !client_email.contains('@') {
            bail!("{} is not an email address: {}", ENV_CLIENT_EMAIL, client_email);
        }

        let token_uri = required(ENV_TOKEN_URI)?;
        reqwest::Url::parse(&token_uri)
            .with_context(|| format!("{} is not a valid URL: {}", ENV_TOKEN_URI, token_uri))?;

        Ok(ServiceAccountKey {
            key_type,
            project_id: optional(ENV_PROJECT_ID),
            private_key_id: optional(ENV_PRIVATE_KEY_ID),
            private_key,
            client_email,
            client_id: optional(ENV_CLIENT_ID),
            auth_uri: optional(ENV_AUTH_URI),
            token_uri,
            auth_provider_x509_cert_url: optional(ENV_AUTH_PROVIDER_CERT_URL),
            client_x509_cert_url: optional(ENV_CLIENT_CERT_URL),
        })
    }
}

/// Keys pasted into a single-line variable usually carry literal `\n`.
fn normalize_private_key(raw: &str) -> String {
    raw.replace("\\n", "\n")
}

#[derive(Debug, Clone)]
pub struct Settings {
    pub spreadsheet: String,
    pub results_worksheet: String,
    pub criteria_worksheet: String,
    pub page_delay: Duration,
    pub listing_delay: Duration,
    pub max_pages: Option<usize>,
    pub csv_mirror: Option<String>,
    pub plain: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            spreadsheet: DEFAULT_SPREADSHEET.to_string(),
            results_worksheet: DEFAULT_RESULTS_WORKSHEET.to_string(),
            criteria_worksheet: DEFAULT_CRITERIA_WORKSHEET.to_string(),
            page_delay: Duration::from_secs(5),
            listing_delay: Duration::from_secs(2),
            max_pages: None,
            csv_mirror: None,
            plain: false,
        }
    }
}
