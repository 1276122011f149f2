use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

use reqwest::Client;
use tokio::io::AsyncWriteExt;

use super::disposition;
use super::error::ApiError;
use super::types::{AckResponse, CheckResponse, SnapshotResult, SplitOptions, UploadResponse};

const API_URL: &str = "https://www.lalal.ai/api/";

/// The operations the rest of the crate needs from the splitting service.
///
/// [`ApiClient`] is the real implementation; tests substitute mocks via
/// `&impl SplitterApi`. Only `check_status` is safe to repeat arbitrarily.
#[allow(async_fn_in_trait)]
pub trait SplitterApi {
    /// Upload a local file, returning the source id the service issued.
    async fn upload(&self, path: &Path) -> Result<String, ApiError>;

    /// Submit one split request covering all the given source ids. Atomic:
    /// either the whole batch is accepted or none of it is.
    async fn submit(&self, source_ids: &[String], options: &SplitOptions) -> Result<(), ApiError>;

    /// Fetch the current status of every listed job in one call.
    async fn check_status(
        &self,
        job_ids: &[String],
    ) -> Result<HashMap<String, SnapshotResult>, ApiError>;

    /// Download one artifact into `dest_dir`, returning the written path. The
    /// filename comes from the response Content-Disposition header.
    async fn download(&self, url: &str, dest_dir: &Path) -> Result<PathBuf, ApiError>;

    /// Remove the source file and its result tracks from service storage.
    async fn delete(&self, source_id: &str) -> Result<(), ApiError>;
}

pub struct ApiClient {
    license: String,
    client: Client,
    base_url: String,
}

impl ApiClient {
    pub fn new(license: String) -> Self {
        Self::with_base_url(license, API_URL.to_string())
    }

    /// Create a client pointing at a custom base URL (useful for testing).
    pub fn with_base_url(license: String, base_url: String) -> Self {
        let client = Client::builder()
            .connect_timeout(Duration::from_secs(10))
            .timeout(Duration::from_secs(120))
            .build()
            .expect("failed to build HTTP client");
        Self {
            license,
            client,
            base_url,
        }
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}/{path}", self.base_url.trim_end_matches('/'))
    }

    fn auth_header(&self) -> String {
        format!("license {}", self.license)
    }
}

/// Turn a non-success HTTP response into [`ApiError::Service`].
async fn reject_http_error(response: reqwest::Response) -> Result<reqwest::Response, ApiError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let message = response
        .text()
        .await
        .unwrap_or_else(|_| "unknown error".to_string());
    Err(ApiError::Service {
        status: status.as_u16(),
        message,
    })
}

impl SplitterApi for ApiClient {
    async fn upload(&self, path: &Path) -> Result<String, ApiError> {
        let filename = path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .ok_or_else(|| {
                ApiError::Io(std::io::Error::new(
                    std::io::ErrorKind::InvalidInput,
                    format!("input path has no file name: {}", path.display()),
                ))
            })?;
        let body = tokio::fs::read(path).await?;

        let response = self
            .client
            .post(self.endpoint("upload/"))
            .header("Content-Disposition", disposition::attachment(&filename))
            .header("Authorization", self.auth_header())
            .body(body)
            .send()
            .await?;
        let http_status = response.status().as_u16();
        let response = reject_http_error(response).await?;

        let parsed = response.json::<UploadResponse>().await?;
        match parsed.status.as_str() {
            "success" => parsed
                .id
                .ok_or_else(|| ApiError::Protocol("upload response is missing the id".into())),
            "error" => Err(ApiError::Service {
                status: http_status,
                message: parsed
                    .error
                    .unwrap_or_else(|| "unspecified upload error".into()),
            }),
            other => Err(ApiError::Protocol(format!(
                "unknown upload status {other:?}"
            ))),
        }
    }

    async fn submit(&self, source_ids: &[String], options: &SplitOptions) -> Result<(), ApiError> {
        let entries: Vec<_> = source_ids.iter().map(|id| options.to_params(id)).collect();
        let params = serde_json::to_string(&entries)
            .map_err(|e| ApiError::Protocol(format!("failed to encode split params: {e}")))?;

        let response = self
            .client
            .post(self.endpoint("split/"))
            .header("Authorization", self.auth_header())
            .form(&[("params", params)])
            .send()
            .await?;
        let http_status = response.status().as_u16();
        let response = reject_http_error(response).await?;

        let parsed = response.json::<AckResponse>().await?;
        if parsed.status == "error" {
            return Err(ApiError::Service {
                status: http_status,
                message: parsed
                    .error
                    .unwrap_or_else(|| "split request rejected".into()),
            });
        }
        Ok(())
    }

    async fn check_status(
        &self,
        job_ids: &[String],
    ) -> Result<HashMap<String, SnapshotResult>, ApiError> {
        let response = self
            .client
            .post(self.endpoint("check/"))
            .header("Authorization", self.auth_header())
            .form(&[("id", job_ids.join(","))])
            .send()
            .await?;
        let http_status = response.status().as_u16();
        let response = reject_http_error(response).await?;

        let parsed = response.json::<CheckResponse>().await?;
        if parsed.status == "error" {
            return Err(ApiError::Service {
                status: http_status,
                message: parsed
                    .error
                    .unwrap_or_else(|| "status check rejected".into()),
            });
        }
        Ok(parsed
            .result
            .into_iter()
            .map(|(id, entry)| {
                let snapshot = entry.canonicalize();
                (id, snapshot)
            })
            .collect())
    }

    async fn download(&self, url: &str, dest_dir: &Path) -> Result<PathBuf, ApiError> {
        let response = self.client.get(url).send().await?;
        let mut response = reject_http_error(response).await?;

        let header = response
            .headers()
            .get(reqwest::header::CONTENT_DISPOSITION)
            .and_then(|value| value.to_str().ok())
            .ok_or_else(|| {
                ApiError::Protocol("download response is missing Content-Disposition".into())
            })?;
        let filename = disposition::parse_filename(header)?;
        // Drop any directory components a hostile header might smuggle in.
        let filename = Path::new(&filename)
            .file_name()
            .ok_or_else(|| ApiError::Protocol(format!("unusable filename: {filename:?}")))?;

        let dest = dest_dir.join(filename);
        let mut file = tokio::fs::File::create(&dest).await?;
        while let Some(chunk) = response.chunk().await? {
            file.write_all(&chunk).await?;
        }
        file.flush().await?;
        Ok(dest)
    }

    async fn delete(&self, source_id: &str) -> Result<(), ApiError> {
        let response = self
            .client
            .post(self.endpoint("delete/"))
            .header("Authorization", self.auth_header())
            .form(&[("id", source_id)])
            .send()
            .await?;
        let http_status = response.status().as_u16();
        let response = reject_http_error(response).await?;

        let parsed = response.json::<AckResponse>().await?;
        if parsed.status == "error" {
            return Err(ApiError::Service {
                status: http_status,
                message: parsed
                    .error
                    .unwrap_or_else(|| "delete request rejected".into()),
            });
        }
        Ok(())
    }
}
