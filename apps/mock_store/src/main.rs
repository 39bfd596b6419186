use std::{net::SocketAddr, sync::Arc};

use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::{get, put},
    Json, Router,
};
use client_core::{MemoryRecordStore, RecordStore};
use shared::{
    error::{ErrorCode, ErrorDetail},
    protocol::{ListResponse, UpdateResponse, UpdateSensorRecordInput},
};
use tower_http::limit::RequestBodyLimitLayer;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

mod config;

use config::{load_seed, load_settings};

const MAX_BODY_BYTES: usize = 64 * 1024;

struct AppState {
    model: String,
    store: MemoryRecordStore,
}

type ApiResult<T> = Result<Json<T>, (StatusCode, Json<ErrorDetail>)>;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let settings = load_settings();
    let rows = load_seed(settings.seed_path.as_deref()).map_err(|error| {
        error!(%error, "failed to load seed rows");
        error
    })?;
    info!(rows = rows.len(), model = %settings.model, "seeded in-memory table");

    let state = AppState {
        model: settings.model,
        store: MemoryRecordStore::new(rows),
    };
    let app = build_router(Arc::new(state));

    let addr: SocketAddr = settings.bind_addr.parse()?;
    info!(%addr, "mock store listening");
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;
    Ok(())
}

fn build_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/healthz", get(healthz))
        .route("/models/:model", get(list_records))
        .route("/models/:model/:id", put(update_record))
        .layer(RequestBodyLimitLayer::new(MAX_BODY_BYTES))
        .with_state(state)
}

async fn healthz() -> &'static str {
    "ok"
}

fn check_model(state: &AppState, model: &str) -> Result<(), (StatusCode, Json<ErrorDetail>)> {
    if model == state.model {
        return Ok(());
    }
    Err((
        StatusCode::NOT_FOUND,
        Json(ErrorDetail::new(
            ErrorCode::NotFound,
            format!("unknown model '{model}'"),
        )),
    ))
}

fn internal(err: anyhow::Error) -> (StatusCode, Json<ErrorDetail>) {
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(ErrorDetail::new(ErrorCode::Internal, format!("{err:#}"))),
    )
}

async fn list_records(
    State(state): State<Arc<AppState>>,
    Path(model): Path<String>,
) -> ApiResult<ListResponse> {
    check_model(&state, &model)?;
    let response = state.store.list().await.map_err(internal)?;
    info!(rows = response.data.len(), "list served");
    Ok(Json(response))
}

async fn update_record(
    State(state): State<Arc<AppState>>,
    Path((model, id)): Path<(String, String)>,
    Json(input): Json<UpdateSensorRecordInput>,
) -> ApiResult<UpdateResponse> {
    check_model(&state, &model)?;

    // Path segments carry no type; `12` addresses both `12` and `"12"`.
    if id != input.id.to_string() {
        warn!(path_id = %id, body_id = %input.id, "update rejected: id mismatch");
        return Ok(Json(UpdateResponse::failed(vec![ErrorDetail::new(
            ErrorCode::Validation,
            format!("id in path ({id}) does not match body ({})", input.id),
        )])));
    }

    let response = state.store.update(input).await.map_err(internal)?;
    if response.errors.is_empty() {
        info!(%id, "record updated");
    } else {
        warn!(%id, errors = response.errors.len(), "update reported errors");
    }
    Ok(Json(response))
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{body, body::Body, http::Request};
    use shared::domain::{RecordId, SensorRecord};
    use tower::ServiceExt;

    fn app_with(rows: Vec<SensorRecord>) -> Router {
        let state = AppState {
            model: "readings".into(),
            store: MemoryRecordStore::new(rows),
        };
        build_router(Arc::new(state))
    }

    fn test_app() -> Router {
        let mut first = SensorRecord::new(2);
        first.location = Some("Room 23".into());
        app_with(vec![first, SensorRecord::new(1)])
    }

    async fn read_json<T: serde::de::DeserializeOwned>(response: axum::response::Response) -> T {
        let bytes = body::to_bytes(response.into_body(), usize::MAX)
            .await
            .expect("body");
        serde_json::from_slice(&bytes).expect("json")
    }

    fn put_json(uri: &str, body: serde_json::Value) -> Request<Body> {
        Request::put(uri)
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .expect("request")
    }

    #[tokio::test]
    async fn healthz_reports_ok() {
        let request = Request::get("/healthz").body(Body::empty()).expect("request");
        let response = test_app().oneshot(request).await.expect("response");
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn list_returns_rows_in_storage_order() {
        let request = Request::get("/models/readings")
            .body(Body::empty())
            .expect("request");
        let response = test_app().oneshot(request).await.expect("response");
        assert_eq!(response.status(), StatusCode::OK);

        let list: ListResponse = read_json(response).await;
        assert!(list.errors.is_empty());
        let ids: Vec<RecordId> = list.data.iter().map(|row| row.id.clone()).collect();
        assert_eq!(ids, vec![RecordId::Number(2), RecordId::Number(1)]);
    }

    #[tokio::test]
    async fn unknown_model_is_not_found() {
        let request = Request::get("/models/other")
            .body(Body::empty())
            .expect("request");
        let response = test_app().oneshot(request).await.expect("response");
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn update_then_list_reflects_change() {
        let app = test_app();
        let body = serde_json::json!({
            "id": 2,
            "topicsensor": "room/23",
            "temperature": 0.0,
            "location": "Room 23",
            "system": null
        });
        let response = app
            .clone()
            .oneshot(put_json("/models/readings/2", body))
            .await
            .expect("response");
        assert_eq!(response.status(), StatusCode::OK);
        let update: UpdateResponse = read_json(response).await;
        assert!(update.errors.is_empty());
        assert_eq!(update.data.and_then(|row| row.temperature), Some(0.0));

        let request = Request::get("/models/readings")
            .body(Body::empty())
            .expect("request");
        let list: ListResponse = read_json(app.oneshot(request).await.expect("response")).await;
        assert_eq!(list.data[0].topicsensor.as_deref(), Some("room/23"));
    }

    #[tokio::test]
    async fn unknown_id_is_reported_in_errors() {
        let body = serde_json::json!({
            "id": 40,
            "topicsensor": null,
            "temperature": null,
            "location": null,
            "system": null
        });
        let response = test_app()
            .oneshot(put_json("/models/readings/40", body))
            .await
            .expect("response");
        assert_eq!(response.status(), StatusCode::OK);
        let update: UpdateResponse = read_json(response).await;
        assert!(update.data.is_none());
        assert_eq!(update.errors[0].error_type.as_deref(), Some("NotFound"));
    }

    #[tokio::test]
    async fn path_and_body_ids_must_agree() {
        let body = serde_json::json!({
            "id": 1,
            "topicsensor": null,
            "temperature": null,
            "location": null,
            "system": null
        });
        let response = test_app()
            .oneshot(put_json("/models/readings/2", body))
            .await
            .expect("response");
        let update: UpdateResponse = read_json(response).await;
        assert_eq!(update.errors[0].error_type.as_deref(), Some("Validation"));
    }

    #[tokio::test]
    async fn textual_id_that_looks_numeric_can_be_updated() {
        let app = app_with(vec![SensorRecord::new(RecordId::Text("12".into()))]);
        let body = serde_json::json!({
            "id": "12",
            "topicsensor": null,
            "temperature": 19.5,
            "location": "Annex",
            "system": null
        });
        let response = app
            .oneshot(put_json("/models/readings/12", body))
            .await
            .expect("response");
        let update: UpdateResponse = read_json(response).await;
        assert!(update.errors.is_empty(), "{:?}", update.errors);
        let row = update.data.expect("updated row");
        assert_eq!(row.id, RecordId::Text("12".into()));
        assert_eq!(row.location.as_deref(), Some("Annex"));
    }
}
