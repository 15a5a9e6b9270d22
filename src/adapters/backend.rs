use crate::core::resolver::BaseUrlResolver;
use crate::domain::model::{
    ApiResponse, ExportFile, HealthInfo, ImportSummary, Paginated, Project, ProjectQuery,
    ProjectStats,
};
use crate::domain::ports::ProjectApi;
use crate::utils::error::{ConsoleError, Result};
use crate::utils::validation::validate_file_extensions;
use async_trait::async_trait;
use regex::Regex;
use reqwest::header::CONTENT_DISPOSITION;
use reqwest::multipart::{Form, Part};
use reqwest::{Client, Response};
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::path::Path;
use std::sync::Arc;
use url::Url;

pub const DEFAULT_EXPORT_FILENAME: &str = "projects.xlsx";
pub const IMPORT_EXTENSIONS: [&str; 2] = ["xlsx", "xls"];

/// Typed client for the project backend. The origin is resolved per call.
#[derive(Clone)]
pub struct BackendClient {
    client: Client,
    resolver: Arc<BaseUrlResolver>,
}

impl BackendClient {
    pub fn new(resolver: Arc<BaseUrlResolver>) -> Self {
        Self {
            client: Client::new(),
            resolver,
        }
    }

    fn endpoint(&self, segments: &[&str]) -> Result<Url> {
        let base = self.resolver.resolve();
        let invalid = |reason: String| ConsoleError::InvalidUrlError {
            field: "apiUrl".to_string(),
            value: base.clone(),
            reason,
        };

        let mut url = Url::parse(&base).map_err(|e| invalid(e.to_string()))?;
        url.path_segments_mut()
            .map_err(|_| invalid("URL cannot be a base".to_string()))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    async fn get_data<T: DeserializeOwned>(&self, segments: &[&str]) -> Result<T> {
        let url = self.endpoint(segments)?;
        tracing::debug!("GET {}", url);
        let response = self.client.get(url).send().await?;
        read_envelope(response).await
    }
}

async fn ensure_success(response: Response) -> Result<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let body = response.text().await.unwrap_or_default();
    let message = serde_json::from_str::<Value>(&body)
        .ok()
        .and_then(|v| v.get("message").and_then(Value::as_str).map(str::to_string))
        .filter(|m| !m.is_empty())
        .unwrap_or_else(|| {
            if body.trim().is_empty() {
                status.canonical_reason().unwrap_or("unknown error").to_string()
            } else {
                body
            }
        });

    tracing::warn!("Backend answered {}: {}", status, message);
    Err(ConsoleError::BackendError {
        status: status.as_u16(),
        message,
    })
}

async fn read_envelope<T: DeserializeOwned>(response: Response) -> Result<T> {
    let response = ensure_success(response).await?;
    let bytes = response.bytes().await?;
    let envelope: ApiResponse<T> = serde_json::from_slice(&bytes)?;
    Ok(envelope.data)
}

/// Extracts the file name from a `Content-Disposition` header value.
pub fn filename_from_disposition(disposition: &str) -> Option<String> {
    let re = Regex::new(r#"filename="?([^";]+)"?"#).ok()?;
    let name = re.captures(disposition)?.get(1)?.as_str().trim();
    // Only the final component; the name is used as a local path.
    let name = Path::new(name).file_name()?.to_str()?;
    if name.is_empty() {
        None
    } else {
        Some(name.to_string())
    }
}

fn spreadsheet_mime(path: &Path) -> &'static str {
    match path
        .extension()
        .and_then(|ext| ext.to_str())
        .map(str::to_ascii_lowercase)
        .as_deref()
    {
        Some("xls") => "application/vnd.ms-excel",
        _ => "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet",
    }
}

#[async_trait]
impl ProjectApi for BackendClient {
    async fn list_projects(&self, query: &ProjectQuery) -> Result<Paginated<Project>> {
        let url = self.endpoint(&["api", "projects"])?;
        tracing::debug!("GET {} {:?}", url, query);
        let response = self.client.get(url).query(query).send().await?;
        read_envelope(response).await
    }

    async fn get_project(&self, id: &str) -> Result<Project> {
        self.get_data(&["api", "projects", id]).await
    }

    async fn project_stats(&self) -> Result<ProjectStats> {
        self.get_data(&["api", "projects", "stats"]).await
    }

    async fn import_projects(&self, file: &Path) -> Result<ImportSummary> {
        validate_file_extensions("file", &[file.display().to_string()], &IMPORT_EXTENSIONS)?;

        let data = tokio::fs::read(file).await?;
        let file_name = file
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| DEFAULT_EXPORT_FILENAME.to_string());

        tracing::info!("Uploading {} ({} bytes)", file_name, data.len());
        let part = Part::bytes(data)
            .file_name(file_name)
            .mime_str(spreadsheet_mime(file))?;
        let form = Form::new().part("file", part);

        let url = self.endpoint(&["api", "projects", "import"])?;
        let response = self.client.post(url).multipart(form).send().await?;
        read_envelope(response).await
    }

    async fn export_projects(&self, query: Option<&str>) -> Result<ExportFile> {
        let url = self.endpoint(&["api", "projects", "export"])?;
        let mut request = self.client.get(url);
        if let Some(query) = query {
            request = request.query(&[("query", query)]);
        }

        let response = ensure_success(request.send().await?).await?;
        let filename = response
            .headers()
            .get(CONTENT_DISPOSITION)
            .and_then(|value| value.to_str().ok())
            .and_then(filename_from_disposition)
            .unwrap_or_else(|| DEFAULT_EXPORT_FILENAME.to_string());
        let content = response.bytes().await?.to_vec();

        tracing::debug!("Exported {} bytes as {}", content.len(), filename);
        Ok(ExportFile { filename, content })
    }

    async fn health(&self) -> Result<HealthInfo> {
        self.get_data(&["api", "health"]).await
    }
}
