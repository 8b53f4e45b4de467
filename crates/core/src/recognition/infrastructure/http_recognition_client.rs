use std::time::Duration;

use reqwest::blocking::multipart::{Form, Part};
use reqwest::blocking::Client;
use serde::Deserialize;

use crate::imaging::domain::encoded_image::BinaryImage;
use crate::recognition::domain::identity::Identity;
use crate::recognition::domain::outcome::{EnrollmentOutcome, RecognitionOutcome};
use crate::recognition::domain::recognition_service::{RecognitionError, RecognitionService};
use crate::shared::constants::{
    DEFAULT_SERVER_URL, ENROLL_PATH, IDENTIFY_PATH, IDENTITY_FIELD, REQUEST_TIMEOUT_SECS,
    UPLOAD_FILE_FIELD, UPLOAD_FILE_NAME,
};

/// Where and how to reach the recognition backend.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    pub base_url: String,
    pub enroll_path: String,
    pub identify_path: String,
    pub timeout: Duration,
    /// Honour `HTTP_PROXY`/`HTTPS_PROXY` from the environment.
    pub use_system_proxy: bool,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_SERVER_URL.to_string(),
            enroll_path: ENROLL_PATH.to_string(),
            identify_path: IDENTIFY_PATH.to_string(),
            timeout: Duration::from_secs(REQUEST_TIMEOUT_SECS),
            use_system_proxy: true,
        }
    }
}

#[derive(Deserialize)]
struct IdentifyResponse {
    #[serde(rename = "reconocido", alias = "recognized")]
    recognized: bool,
    #[serde(rename = "id_empleado", alias = "identity", default)]
    identity: Option<WireIdentity>,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum WireIdentity {
    Number(u64),
    Text(String),
}

impl WireIdentity {
    fn into_identity(self) -> Option<Identity> {
        match self {
            WireIdentity::Number(n) => Some(Identity::from(n)),
            WireIdentity::Text(s) => Identity::parse(&s).ok(),
        }
    }
}

#[derive(Deserialize)]
struct EnrollResponse {
    #[serde(rename = "mensaje", alias = "message", default)]
    message: Option<String>,
}

/// Multipart/form-data client for the enroll and identify endpoints.
///
/// Every call is a single independent request; nothing is retried and no
/// session state is kept.
pub struct HttpRecognitionClient {
    http: Client,
    enroll_url: String,
    identify_url: String,
}

impl HttpRecognitionClient {
    pub fn new(config: &ClientConfig) -> Result<Self, reqwest::Error> {
        let mut builder = Client::builder()
            .timeout(config.timeout)
            .connect_timeout(config.timeout);
        if !config.use_system_proxy {
            builder = builder.no_proxy();
        }

        Ok(Self {
            http: builder.build()?,
            enroll_url: join_url(&config.base_url, &config.enroll_path),
            identify_url: join_url(&config.base_url, &config.identify_path),
        })
    }

    pub fn enroll_url(&self) -> &str {
        &self.enroll_url
    }

    pub fn identify_url(&self) -> &str {
        &self.identify_url
    }

    fn post(&self, url: &str, form: Form) -> Result<String, RecognitionError> {
        let response = self
            .http
            .post(url)
            .multipart(form)
            .send()
            .map_err(|e| transport(url, e))?;

        let status = response.status();
        let body = response.text().map_err(|e| transport(url, e))?;

        if !status.is_success() {
            return Err(RecognitionError::Service {
                code: status.as_u16(),
                detail: extract_detail(&body),
            });
        }
        Ok(body)
    }
}

impl RecognitionService for HttpRecognitionClient {
    fn identify(&self, image: &BinaryImage) -> Result<RecognitionOutcome, RecognitionError> {
        let url = &self.identify_url;
        let form = Form::new().part(UPLOAD_FILE_FIELD, image_part(url, image)?);
        let body = self.post(url, form)?;

        let parsed: IdentifyResponse =
            serde_json::from_str(&body).map_err(|e| transport(url, e))?;
        let identity = parsed.identity.and_then(WireIdentity::into_identity);
        match (parsed.recognized, identity) {
            (true, Some(identity)) => Ok(RecognitionOutcome::Recognized { identity }),
            (true, None) => Err(transport(url, "recognized response without an identity")),
            (false, _) => Ok(RecognitionOutcome::Unrecognized),
        }
    }

    fn enroll(
        &self,
        identity: &Identity,
        image: &BinaryImage,
    ) -> Result<EnrollmentOutcome, RecognitionError> {
        let url = &self.enroll_url;
        let form = Form::new()
            .text(IDENTITY_FIELD, identity.as_str().to_string())
            .part(UPLOAD_FILE_FIELD, image_part(url, image)?);
        let body = self.post(url, form)?;

        // A 2xx with an unexpected body still means the face was stored.
        let message = serde_json::from_str::<EnrollResponse>(&body)
            .ok()
            .and_then(|r| r.message)
            .filter(|m| !m.trim().is_empty())
            .unwrap_or_else(|| format!("Identity {identity} enrolled."));
        Ok(EnrollmentOutcome::Success { message })
    }
}

fn image_part(url: &str, image: &BinaryImage) -> Result<Part, RecognitionError> {
    Part::bytes(image.bytes().to_vec())
        .file_name(UPLOAD_FILE_NAME)
        .mime_str(image.mime())
        .map_err(|e| transport(url, e))
}

fn transport(
    url: &str,
    source: impl Into<Box<dyn std::error::Error + Send + Sync>>,
) -> RecognitionError {
    RecognitionError::Transport {
        endpoint: url.to_string(),
        source: source.into(),
    }
}

fn join_url(base: &str, path: &str) -> String {
    format!(
        "{}/{}",
        base.trim_end_matches('/'),
        path.trim_start_matches('/')
    )
}

/// Pulls the human-facing reason out of an error body.
///
/// Accepts `{"detail": "..."}` and the validation shape
/// `{"detail": [{"msg": "..."}, ...]}`.
fn extract_detail(body: &str) -> Option<String> {
    let value: serde_json::Value = serde_json::from_str(body).ok()?;
    let detail = match value.get("detail")? {
        serde_json::Value::String(s) => s.clone(),
        serde_json::Value::Array(items) => items
            .iter()
            .filter_map(|item| item.get("msg").and_then(|m| m.as_str()))
            .collect::<Vec<_>>()
            .join("; "),
        _ => return None,
    };
    let detail = detail.trim();
    (!detail.is_empty()).then(|| detail.to_string())
}
