//! Tool availability route handler.

use axum::extract::State;
use axum::Json;
use serde::Serialize;

use crate::context::AppContext;

/// Availability of one external tool.
#[derive(Debug, Serialize, utoipa::ToSchema)]
pub struct ToolResponse {
    pub name: String,
    pub available: bool,
    pub version: Option<String>,
    pub path: Option<String>,
}

/// GET /api/tools
#[utoipa::path(
    get,
    path = "/api/tools",
    responses(
        (status = 200, description = "External tool availability", body = Vec<ToolResponse>)
    )
)]
pub async fn get_tools(State(ctx): State<AppContext>) -> Json<Vec<ToolResponse>> {
    let tools = ctx
        .tools
        .check_all()
        .into_iter()
        .map(|info| ToolResponse {
            name: info.name,
            available: info.available,
            version: info.version,
            path: info.path.map(|p| p.display().to_string()),
        })
        .collect();
    Json(tools)
}
