//! GitHub App authentication
//!
//! Builds the app-scoped client from RSA key material and derives
//! installation-scoped clients from it.

use jsonwebtoken::EncodingKey;
use octocrab::Octocrab;
use octocrab::models::{AppId, InstallationId};

use crate::config::AppConfig;
use crate::error::{Error, Result};

/// Holds the app-scoped client and derives installation-scoped ones.
pub struct AuthProvider {
    app_client: Octocrab,
}

impl AuthProvider {
    /// Build the app-scoped client from credentials.
    ///
    /// Fails when the private key is not a valid RSA PEM.
    pub fn from_config(config: &AppConfig) -> Result<Self> {
        let key = EncodingKey::from_rsa_pem(config.private_key.as_bytes())
            .map_err(|e| Error::Auth(format!("invalid private key: {}", e)))?;

        let app_client = Octocrab::builder()
            .app(AppId(config.app_id), key)
            .build()
            .map_err(|e| Error::Auth(format!("failed to build app client: {}", e)))?;

        Ok(Self { app_client })
    }

    /// Wrap an already-authenticated client (custom base URLs, tests).
    pub fn from_client(client: Octocrab) -> Self {
        Self { app_client: client }
    }

    /// Eagerly authenticate: exchange credentials for an installation
    /// token when an installation id is given, otherwise hand out the
    /// app-scoped client.
    pub async fn authenticate(&self, installation_id: Option<u64>) -> Result<Octocrab> {
        match installation_id {
            Some(id) => {
                let (client, _token) = self
                    .app_client
                    .installation_and_token(InstallationId(id))
                    .await
                    .map_err(|e| {
                        Error::Auth(format!("token exchange for installation {} failed: {}", id, e))
                    })?;
                Ok(client)
            }
            None => Ok(self.app_client.clone()),
        }
    }

    /// Scope a client without exchanging a token up front; the client
    /// authenticates lazily on its first request. Dispatch uses this so
    /// handlers that never call the API never block on auth.
    pub fn client_for(&self, installation_id: Option<u64>) -> Result<Octocrab> {
        match installation_id {
            Some(id) => self.app_client.installation(InstallationId(id)).map_err(|e| {
                Error::Auth(format!("failed to scope client to installation {}: {}", id, e))
            }),
            None => Ok(self.app_client.clone()),
        }
    }
}
