use crate::errors::AppError;
use crate::export::{render_report, sales_to_csv};
use crate::filter::SaleFilter;
use crate::live::LiveDashboard;
use crate::models::{BulkDeleteRequest, BulkDeleteResponse, DashboardResponse, Sale, SaleRow};
use crate::state::AppState;
use crate::stats::{build_dashboard, sale_rows};
use crate::store::Record;
use crate::ui::render_index;
use crate::validation::{self, Patch, Validate};
use axum::{
    extract::{Path, Query, State},
    http::{StatusCode, header},
    response::{
        Html, IntoResponse,
        sse::{Event, KeepAlive, Sse},
    },
    Json,
};
use chrono::Local;
use futures_util::Stream;
use serde::{Deserialize, Serialize, de::DeserializeOwned};
use std::collections::HashSet;
use std::convert::Infallible;
use tracing::info;

pub async fn index(State(state): State<AppState>) -> Html<String> {
    let data = state.store.snapshot().await;
    let dashboard = build_dashboard(&data, &SaleFilter::default());
    Html(render_index(&today_string(), &dashboard))
}

pub async fn health() -> &'static str {
    "ok"
}

pub async fn list_records<R>(State(state): State<AppState>) -> Json<Vec<R>>
where
    R: Record + Serialize,
{
    Json(state.store.list::<R>().await)
}

pub async fn create_record<P>(
    State(state): State<AppState>,
    Json(patch): Json<P>,
) -> Result<(StatusCode, Json<P::Target>), AppError>
where
    P: Patch + DeserializeOwned + Send,
    P::Target: Record + Serialize,
{
    let record = validation::build(patch)?;
    let created = state.store.insert(record).await?;
    Ok((StatusCode::CREATED, Json(created)))
}

pub async fn update_record<P>(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(patch): Json<P>,
) -> Result<Json<P::Target>, AppError>
where
    P: Patch + DeserializeOwned + Send,
    P::Target: Record + Serialize,
{
    let updated = state
        .store
        .update(&id, |record: &mut P::Target| {
            patch.merge_into(record)?;
            record.validate()
        })
        .await?;
    Ok(Json(updated))
}

pub async fn delete_record<R: Record>(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<StatusCode, AppError> {
    state.store.delete::<R>(&id).await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn list_sales(
    State(state): State<AppState>,
    Query(filter): Query<SaleFilter>,
) -> Json<Vec<SaleRow>> {
    Json(filtered_rows(&state, &filter).await)
}

pub async fn bulk_delete_sales(
    State(state): State<AppState>,
    Json(payload): Json<BulkDeleteRequest>,
) -> Result<Json<BulkDeleteResponse>, AppError> {
    let ids: HashSet<String> = payload
        .ids
        .into_iter()
        .map(|id| id.trim().to_string())
        .filter(|id| !id.is_empty())
        .collect();
    if ids.is_empty() {
        return Err(AppError::bad_request("ids must contain at least one sale id"));
    }

    let deleted = state.store.delete_many::<Sale>(&ids).await?;
    info!(requested = ids.len(), deleted, "bulk delete of sales");
    Ok(Json(BulkDeleteResponse { deleted }))
}

pub async fn get_dashboard(
    State(state): State<AppState>,
    Query(filter): Query<SaleFilter>,
) -> Json<DashboardResponse> {
    let data = state.store.snapshot().await;
    Json(build_dashboard(&data, &filter))
}

pub async fn dashboard_stream(
    State(state): State<AppState>,
    Query(filter): Query<SaleFilter>,
) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    let mut live = LiveDashboard::spawn(state.store.clone(), filter).await;

    let stream = async_stream::stream! {
        yield Ok(dashboard_event(&live.current()));
        while let Some(dashboard) = live.changed().await {
            yield Ok(dashboard_event(&dashboard));
        }
    };

    Sse::new(stream).keep_alive(KeepAlive::default())
}

fn dashboard_event(dashboard: &DashboardResponse) -> Event {
    match Event::default().event("dashboard").json_data(dashboard) {
        Ok(event) => event,
        Err(err) => Event::default().event("error").data(err.to_string()),
    }
}

#[derive(Debug, Deserialize)]
pub struct ReportPaging {
    pub page_size: Option<usize>,
}

pub async fn export_csv(
    State(state): State<AppState>,
    Query(filter): Query<SaleFilter>,
) -> Result<impl IntoResponse, AppError> {
    let rows = filtered_rows(&state, &filter).await;
    let body = sales_to_csv(&rows)?;
    info!(rows = rows.len(), "exported sales csv");

    Ok((
        [
            (header::CONTENT_TYPE, "text/csv; charset=utf-8"),
            (
                header::CONTENT_DISPOSITION,
                "attachment; filename=\"laporan_penjualan.csv\"",
            ),
        ],
        body,
    ))
}

pub async fn export_report(
    State(state): State<AppState>,
    Query(filter): Query<SaleFilter>,
    Query(paging): Query<ReportPaging>,
) -> impl IntoResponse {
    let rows = filtered_rows(&state, &filter).await;
    let page_size = paging.page_size.unwrap_or(state.report_page_size);
    let body = render_report(&rows, page_size);

    (
        [
            (header::CONTENT_TYPE, "text/plain; charset=utf-8"),
            (
                header::CONTENT_DISPOSITION,
                "attachment; filename=\"laporan_penjualan.txt\"",
            ),
        ],
        body,
    )
}

async fn filtered_rows(state: &AppState, filter: &SaleFilter) -> Vec<SaleRow> {
    let data = state.store.snapshot().await;
    let sales = filter.apply(&data.sales);
    sale_rows(&sales, &data.hosts, &data.accounts)
}

fn today_string() -> String {
    Local::now().date_naive().to_string()
}
