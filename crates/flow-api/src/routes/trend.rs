//! 추세 분석 API 라우트.
//!
//! # 엔드포인트
//!
//! - `GET /api/analysis/trend` - 연속 순매수 / 신규 유입 종목 분석

use axum::{
    extract::{Query, State},
    routing::get,
    Json, Router,
};
use serde::Deserialize;
use std::sync::Arc;
use utoipa::{IntoParams, ToSchema};

use flow_analytics::DEFAULT_TREND_TOP_N;
use flow_core::TrendReport;

use crate::error::{bad_request, not_found, ApiResult};
use crate::routes::parse_investor;
use crate::state::AppState;

/// 추세 분석 쿼리.
#[derive(Debug, Deserialize, ToSchema, IntoParams)]
pub struct TrendQuery {
    /// 분석할 최근 거래일 수 (기본 5)
    #[serde(default)]
    pub days: Option<u32>,

    /// 투자자 구분 (생략 시 foreigner)
    #[serde(default)]
    pub investor: Option<String>,

    /// 각 목록의 크기 (기본 20)
    #[serde(default)]
    pub top_n: Option<usize>,
}

/// GET /api/analysis/trend - 연속 순매수 / 신규 유입 분석.
///
/// 최근 `days` 거래일 동안 매일 순매수한 종목(연속 순매수)과
/// 가장 최근 거래일에만 순매수로 나타난 종목(신규 유입)을 반환합니다.
#[utoipa::path(
    get,
    path = "/api/analysis/trend",
    tag = "analysis",
    params(TrendQuery),
    responses(
        (status = 200, description = "추세 분석 결과", body = TrendReport),
        (status = 400, description = "잘못된 파라미터"),
        (status = 404, description = "분석 가능한 거래일 없음")
    )
)]
pub async fn get_trend_analysis(
    State(state): State<Arc<AppState>>,
    Query(query): Query<TrendQuery>,
) -> ApiResult<Json<TrendReport>> {
    let days = query.days.unwrap_or(5);
    if days == 0 {
        return Err(bad_request("INVALID_DAYS", "days는 1 이상이어야 합니다"));
    }
    let investor = parse_investor(query.investor.as_deref())?;
    let top_n = query.top_n.unwrap_or(DEFAULT_TREND_TOP_N);

    state
        .trend
        .analyze(days, investor, top_n)
        .await
        .map(Json)
        .ok_or_else(|| {
            not_found(
                "NO_DATA",
                format!("최근 {}일 구간에 분석 가능한 거래일이 없습니다", days),
            )
        })
}

/// 추세 분석 라우터 생성.
pub fn trend_router() -> Router<Arc<AppState>> {
    Router::new().route("/trend", get(get_trend_analysis))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::create_test_state;
    use axum::{
        body::Body,
        http::{Request, StatusCode},
    };
    use tower::ServiceExt;

    fn test_app() -> Router {
        Router::new()
            .nest("/api/analysis", trend_router())
            .with_state(Arc::new(create_test_state()))
    }

    #[tokio::test]
    async fn test_trend_rejects_zero_days() {
        let response = test_app()
            .oneshot(
                Request::builder()
                    .uri("/api/analysis/trend?days=0")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_trend_rejects_unknown_investor() {
        let response = test_app()
            .oneshot(
                Request::builder()
                    .uri("/api/analysis/trend?days=3&investor=alien")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }
}
