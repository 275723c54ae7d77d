use axum::extract::State;
use serde::Deserialize;

use crate::app::AppState;
use crate::extract::Query;
use crate::middleware::{ApiResponse, ApiResult};
use crate::services::QueryReport;

#[derive(Debug, Deserialize)]
pub struct ReportQuery {
    #[serde(default = "default_client_id")]
    pub client_id: i64,
}

fn default_client_id() -> i64 {
    1
}

/// GET /api/reports/complex-queries[?client_id=N] (ClientsViewSet read)
pub async fn complex_queries(
    State(state): State<AppState>,
    Query(query): Query<ReportQuery>,
) -> ApiResult<QueryReport> {
    let report = state.service.query_report(query.client_id).await?;
    Ok(ApiResponse::success(report))
}
