use axum::Json;

use versatile_domain::dashboard::Dashboard;

// ── GET /dashboards ──────────────────────────────────────────────────────────

pub async fn find_dashboards() -> Json<Dashboard> {
    Json(Dashboard {
        name: "Name".into(),
        ..Default::default()
    })
}
