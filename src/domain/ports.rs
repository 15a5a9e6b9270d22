use crate::domain::model::{
    ExportFile, HealthInfo, ImportSummary, Paginated, Project, ProjectQuery, ProjectStats,
};
use crate::utils::error::Result;
use async_trait::async_trait;
use std::path::Path;

/// Durable string key-value slot storage. Writes are last-writer-wins.
pub trait KeyValueStore: Send + Sync {
    fn get(&self, key: &str) -> Result<Option<String>>;
    fn set(&self, key: &str, value: &str) -> Result<()>;
}

/// One link in the base-URL resolution chain.
pub trait OriginProvider: Send + Sync {
    fn name(&self) -> &'static str;
    fn origin(&self) -> Option<String>;
}

#[async_trait]
pub trait ProjectApi: Send + Sync {
    async fn list_projects(&self, query: &ProjectQuery) -> Result<Paginated<Project>>;
    async fn get_project(&self, id: &str) -> Result<Project>;
    async fn project_stats(&self) -> Result<ProjectStats>;
    async fn import_projects(&self, file: &Path) -> Result<ImportSummary>;
    async fn export_projects(&self, query: Option<&str>) -> Result<ExportFile>;
    async fn health(&self) -> Result<HealthInfo>;
}
