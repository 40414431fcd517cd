//! Report source factory

use crate::adapters::database::traits::ReportSource;
use crate::adapters::postgresql::adapter::PostgreSQLAdapter;
use crate::adapters::postgresql::client::PostgreSQLClient;
use crate::config::schema::PostgreSQLConfig;
use crate::domain::Result;
use std::sync::Arc;

/// Create the report source described by the database configuration
///
/// # Errors
///
/// Returns an error if the connection pool cannot be created
pub async fn create_report_source(
    config: &PostgreSQLConfig,
) -> Result<Arc<dyn ReportSource + Send + Sync>> {
    tracing::info!("Creating PostgreSQL report source");
    let client = PostgreSQLClient::new(config.clone()).await?;
    let adapter = PostgreSQLAdapter::new(client);

    Ok(Arc::new(adapter) as Arc<dyn ReportSource + Send + Sync>)
}
