use crate::auth::require_token;
use crate::handlers;
use crate::models::{Account, Host, Sale, Target, WorkHourDeduction};
use crate::state::AppState;
use crate::validation::{AccountPatch, DeductionPatch, HostPatch, SalePatch, TargetPatch};
use axum::{
    middleware,
    routing::{get, patch, post},
    Router,
};

pub fn router(state: AppState) -> Router {
    let api = Router::new()
        .route(
            "/hosts",
            get(handlers::list_records::<Host>).post(handlers::create_record::<HostPatch>),
        )
        .route(
            "/hosts/:id",
            patch(handlers::update_record::<HostPatch>).delete(handlers::delete_record::<Host>),
        )
        .route(
            "/accounts",
            get(handlers::list_records::<Account>).post(handlers::create_record::<AccountPatch>),
        )
        .route(
            "/accounts/:id",
            patch(handlers::update_record::<AccountPatch>)
                .delete(handlers::delete_record::<Account>),
        )
        .route(
            "/targets",
            get(handlers::list_records::<Target>).post(handlers::create_record::<TargetPatch>),
        )
        .route(
            "/targets/:id",
            patch(handlers::update_record::<TargetPatch>).delete(handlers::delete_record::<Target>),
        )
        .route(
            "/deductions",
            get(handlers::list_records::<WorkHourDeduction>)
                .post(handlers::create_record::<DeductionPatch>),
        )
        .route(
            "/deductions/:id",
            patch(handlers::update_record::<DeductionPatch>)
                .delete(handlers::delete_record::<WorkHourDeduction>),
        )
        .route(
            "/sales",
            get(handlers::list_sales).post(handlers::create_record::<SalePatch>),
        )
        .route("/sales/bulk-delete", post(handlers::bulk_delete_sales))
        .route(
            "/sales/:id",
            patch(handlers::update_record::<SalePatch>).delete(handlers::delete_record::<Sale>),
        )
        .route("/dashboard", get(handlers::get_dashboard))
        .route("/dashboard/stream", get(handlers::dashboard_stream))
        .route("/export/sales.csv", get(handlers::export_csv))
        .route("/export/sales.txt", get(handlers::export_report))
        .route_layer(middleware::from_fn_with_state(state.clone(), require_token));

    Router::new()
        .route("/", get(handlers::index))
        .route("/health", get(handlers::health))
        .nest("/api", api)
        .with_state(state)
}
