//! Cloudinary implementation of [`AssetStore`].

use super::{AssetError, AssetResult, AssetStore, UploadedAsset};
use async_trait::async_trait;
use core_config::{
    ConfigError, FromEnv, env_first_of, env_or_default, env_parse_or, env_required,
};
use reqwest::Client;
use serde::Deserialize;
use sha1::Sha1;
use sha2::{Digest, Sha256};
use std::str::FromStr;
use tracing::{debug, info, instrument};

pub const DEFAULT_API_URL: &str = "https://api.cloudinary.com/v1_1";

/// Hash used for request signatures. Must match the account's setting;
/// Cloudinary accounts sign with SHA-1 unless switched to SHA-256.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SignatureAlgorithm {
    #[default]
    Sha1,
    Sha256,
}

impl SignatureAlgorithm {
    fn hex_digest(self, data: &[u8]) -> String {
        match self {
            SignatureAlgorithm::Sha1 => format!("{:x}", Sha1::digest(data)),
            SignatureAlgorithm::Sha256 => format!("{:x}", Sha256::digest(data)),
        }
    }
}

impl FromStr for SignatureAlgorithm {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "sha1" | "sha-1" => Ok(SignatureAlgorithm::Sha1),
            "sha256" | "sha-256" => Ok(SignatureAlgorithm::Sha256),
            other => Err(format!("unsupported signature algorithm '{}', expected sha1 or sha256", other)),
        }
    }
}

/// Cloudinary API credentials.
#[derive(Clone)]
pub struct CloudinaryConfig {
    pub cloud_name: String,
    pub api_key: String,
    pub api_secret: String,
    /// Defaults to [`DEFAULT_API_URL`]
    pub api_url: String,
    pub signature_algorithm: SignatureAlgorithm,
}

impl CloudinaryConfig {
    pub fn new(
        cloud_name: impl Into<String>,
        api_key: impl Into<String>,
        api_secret: impl Into<String>,
    ) -> Self {
        Self {
            cloud_name: cloud_name.into(),
            api_key: api_key.into(),
            api_secret: api_secret.into(),
            api_url: DEFAULT_API_URL.to_string(),
            signature_algorithm: SignatureAlgorithm::default(),
        }
    }

    pub fn with_signature_algorithm(mut self, algorithm: SignatureAlgorithm) -> Self {
        self.signature_algorithm = algorithm;
        self
    }

    pub fn with_api_url(mut self, api_url: impl Into<String>) -> Self {
        self.api_url = api_url.into().trim_end_matches('/').to_string();
        self
    }

    fn endpoint(&self, action: &str) -> String {
        format!("{}/{}/image/{}", self.api_url, self.cloud_name, action)
    }
}

impl std::fmt::Debug for CloudinaryConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CloudinaryConfig")
            .field("cloud_name", &self.cloud_name)
            .field("api_key", &self.api_key)
            .field("api_secret", &"***")
            .field("api_url", &self.api_url)
            .field("signature_algorithm", &self.signature_algorithm)
            .finish()
    }
}

impl FromEnv for CloudinaryConfig {
    fn from_env() -> Result<Self, ConfigError> {
        let cloud_name = env_required("CLOUDINARY_CLOUD_NAME")?;
        let api_key = env_required("CLOUDINARY_API_KEY")?;
        let api_secret = env_first_of(&["CLOUDINARY_API_SECRET", "CLOUDINARY_CLOUD_SECRET"])?;
        let api_url = env_or_default("CLOUDINARY_API_URL", DEFAULT_API_URL);
        let algorithm =
            env_parse_or("CLOUDINARY_SIGNATURE_ALGORITHM", SignatureAlgorithm::default())?;

        Ok(Self::new(cloud_name, api_key, api_secret)
            .with_api_url(api_url)
            .with_signature_algorithm(algorithm))
    }
}

/// Signs request parameters: hex digest of `k1=v1&k2=v2...` (keys sorted)
/// followed by the API secret.
fn sign(params: &[(&str, &str)], api_secret: &str, algorithm: SignatureAlgorithm) -> String {
    let mut sorted = params.to_vec();
    sorted.sort_by(|a, b| a.0.cmp(b.0));

    let to_sign = sorted
        .iter()
        .map(|(k, v)| format!("{}={}", k, v))
        .collect::<Vec<_>>()
        .join("&");

    algorithm.hex_digest(format!("{}{}", to_sign, api_secret).as_bytes())
}

#[derive(Debug, Deserialize)]
struct UploadResponse {
    public_id: String,
    secure_url: String,
}

#[derive(Debug, Deserialize)]
struct DestroyResponse {
    result: String,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    error: ErrorDetail,
}

#[derive(Debug, Deserialize)]
struct ErrorDetail {
    message: String,
}

/// Uploads and deletes images through Cloudinary's signed REST API.
pub struct CloudinaryAssetStore {
    config: CloudinaryConfig,
    client: Client,
}

impl CloudinaryAssetStore {
    pub fn new(config: CloudinaryConfig) -> Self {
        Self {
            config,
            client: Client::new(),
        }
    }

    /// POST a signed form. `signed` are the parameters covered by the signature;
    /// `file` is sent alongside unsigned.
    async fn post_signed<T: for<'de> Deserialize<'de>>(
        &self,
        action: &str,
        signed: &[(&str, &str)],
        file: Option<&str>,
    ) -> AssetResult<T> {
        let timestamp = chrono::Utc::now().timestamp().to_string();

        let mut params = signed.to_vec();
        params.push(("timestamp", timestamp.as_str()));
        let signature = sign(
            &params,
            &self.config.api_secret,
            self.config.signature_algorithm,
        );

        let mut form = params;
        form.push(("api_key", self.config.api_key.as_str()));
        form.push(("signature", signature.as_str()));
        if let Some(file) = file {
            form.push(("file", file));
        }

        let response = self
            .client
            .post(self.config.endpoint(action))
            .form(&form)
            .send()
            .await?;

        let status = response.status();
        if status.is_success() {
            return Ok(response.json::<T>().await?);
        }

        let message = match response.json::<ErrorBody>().await {
            Ok(body) => body.error.message,
            Err(_) => format!("HTTP {}", status),
        };
        Err(AssetError::Rejected(message))
    }
}

#[async_trait]
impl AssetStore for CloudinaryAssetStore {
    #[instrument(skip(self, payload), fields(payload_len = payload.len()))]
    async fn upload(&self, payload: &str, folder: &str) -> AssetResult<UploadedAsset> {
        let uploaded: UploadResponse = self
            .post_signed("upload", &[("folder", folder)], Some(payload))
            .await?;

        info!(public_id = %uploaded.public_id, "Image uploaded");
        Ok(UploadedAsset {
            public_id: uploaded.public_id,
            secure_url: uploaded.secure_url,
        })
    }

    #[instrument(skip(self))]
    async fn delete(&self, public_id: &str, folder: &str) -> AssetResult<()> {
        let full_id = format!("{}/{}", folder, public_id);
        let destroyed: DestroyResponse = self
            .post_signed("destroy", &[("public_id", full_id.as_str())], None)
            .await?;

        debug!(result = %destroyed.result, "Destroy response");
        match destroyed.result.as_str() {
            "ok" => Ok(()),
            other => Err(AssetError::Rejected(format!("{}: {}", full_id, other))),
        }
    }
}
