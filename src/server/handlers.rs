use crate::collectors::CollectionSession;
use crate::run_guard::RunGuard;
use crate::server::types::*;
use crate::server::AppState;
use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use tracing::{error, info};

pub async fn health() -> impl IntoResponse {
    Json(MessageResponse {
        success: true,
        message: "ok".into(),
    })
}

/// Curated listings, optionally restricted to one country.
pub async fn listings(
    State(state): State<AppState>,
    Query(params): Query<ListingsQuery>,
) -> impl IntoResponse {
    let limit = params.limit.unwrap_or(100);
    let years = state.config.search.inclusion_years();
    let min_price = state.config.search.min_price;

    let result = match params.country.as_deref() {
        Some(country) => {
            state
                .store
                .query_country_top(country, limit, &years, min_price)
                .await
        }
        None => state.store.query_top(limit, &years, min_price).await,
    };

    match result {
        Ok(listings) => Json(ListingsResponse {
            success: true,
            count: listings.len(),
            listings,
        })
        .into_response(),
        Err(e) => {
            error!(error = %e, "Failed to query listings");
            internal_error()
        }
    }
}

/// Top listings overall, fixed limit.
pub async fn top_listings(State(state): State<AppState>) -> impl IntoResponse {
    let years = state.config.search.inclusion_years();
    let result = state
        .store
        .query_top(100, &years, state.config.search.min_price)
        .await;
    match result {
        Ok(listings) => Json(ListingsResponse {
            success: true,
            count: listings.len(),
            listings,
        })
        .into_response(),
        Err(e) => {
            error!(error = %e, "Failed to query top listings");
            internal_error()
        }
    }
}

pub async fn statistics(State(state): State<AppState>) -> impl IntoResponse {
    let years = state.config.search.inclusion_years();
    match state
        .store
        .statistics(&years, state.config.search.min_price)
        .await
    {
        Ok(statistics) => Json(StatisticsResponse {
            success: true,
            statistics,
        })
        .into_response(),
        Err(e) => {
            error!(error = %e, "Failed to compute statistics");
            internal_error()
        }
    }
}

pub async fn scheduler_status(State(state): State<AppState>) -> impl IntoResponse {
    Json(SchedulerResponse {
        success: true,
        scheduler: state.guard.status(),
    })
}

/// Manual collection trigger. The run itself happens in the background; a
/// trigger while another run holds the guard is an "already running" no-op.
pub async fn trigger_scrape(State(state): State<AppState>) -> impl IntoResponse {
    let Some(token) = RunGuard::try_start(&state.guard) else {
        return Json(MessageResponse {
            success: false,
            message: "Scrape is already running".into(),
        })
        .into_response();
    };

    info!("Manual scrape triggered via API");
    tokio::spawn(async move {
        let _token = token;
        match CollectionSession::new(&state.config, state.store.clone()) {
            Ok(session) => {
                let report = session.run(None).await;
                state
                    .guard
                    .record_result(&format!("success: {} saved", report.saved));
            }
            Err(e) => {
                error!(error = %e, "Failed to start collection session");
                state.guard.record_result(&format!("error: {e}"));
            }
        }
    });

    Json(MessageResponse {
        success: true,
        message: "Scrape started in background".into(),
    })
    .into_response()
}

fn internal_error() -> axum::response::Response {
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(MessageResponse {
            success: false,
            message: "database error".into(),
        }),
    )
        .into_response()
}
