//! 순매수 랭킹 API 라우트.
//!
//! # 엔드포인트
//!
//! - `GET /api/ranking/daily` - 일별 순매수/순매도 Top-N 조회
//! - `GET /api/ranking/aggregate` - 최근 N거래일 합산 Top-N 조회

use axum::{
    extract::{Query, State},
    routing::get,
    Json, Router,
};
use serde::Deserialize;
use std::sync::Arc;
use utoipa::{IntoParams, ToSchema};

use flow_analytics::DEFAULT_TOP_N;
use flow_core::{DailyRanking, RangeRanking, TradeDate};

use crate::error::{bad_request, not_found, ApiResult};
use crate::routes::{parse_date, parse_investor};
use crate::state::AppState;

/// 일별 랭킹 조회 쿼리.
#[derive(Debug, Deserialize, ToSchema, IntoParams)]
pub struct DailyRankingQuery {
    /// 조회 거래일 (YYYYMMDD, 생략 시 오늘)
    #[serde(default)]
    pub date: Option<String>,

    /// 투자자 구분 (foreigner | individual | institution, 생략 시 foreigner)
    #[serde(default)]
    pub investor: Option<String>,

    /// 목록 크기 (기본 100)
    #[serde(default)]
    pub top_n: Option<usize>,

    /// 요청일에 데이터가 없을 때 과거 거래일과 로컬 파일 허용 여부 (기본 true)
    #[serde(default)]
    pub allow_fallback: Option<bool>,
}

/// 기간 합산 랭킹 조회 쿼리.
#[derive(Debug, Deserialize, ToSchema, IntoParams)]
pub struct AggregateRankingQuery {
    /// 합산할 최근 거래일 수 (기본 5)
    #[serde(default)]
    pub days: Option<u32>,

    /// 투자자 구분 (생략 시 foreigner)
    #[serde(default)]
    pub investor: Option<String>,

    /// 목록 크기 (기본 100)
    #[serde(default)]
    pub top_n: Option<usize>,

    /// 등락률을 기간 전체 등락률로 다시 계산할지 여부 (기본 false)
    #[serde(default)]
    pub period_change: Option<bool>,
}

/// GET /api/ranking/daily - 일별 순매수/순매도 Top-N.
///
/// 요청일에 데이터가 없으면 (allow_fallback일 때) 최대 10일까지
/// 과거로 이동하며, 응답의 `date`가 실제 데이터 기준일입니다.
#[utoipa::path(
    get,
    path = "/api/ranking/daily",
    tag = "ranking",
    params(DailyRankingQuery),
    responses(
        (status = 200, description = "일별 랭킹", body = DailyRanking),
        (status = 400, description = "잘못된 파라미터"),
        (status = 404, description = "데이터 없음")
    )
)]
pub async fn get_daily_ranking(
    State(state): State<Arc<AppState>>,
    Query(query): Query<DailyRankingQuery>,
) -> ApiResult<Json<DailyRanking>> {
    let date = parse_date(query.date.as_deref())?;
    let investor = parse_investor(query.investor.as_deref())?;
    let top_n = query.top_n.unwrap_or(DEFAULT_TOP_N);
    let allow_fallback = query.allow_fallback.unwrap_or(true);

    state
        .ranking
        .top_for_day(date, investor, top_n, allow_fallback)
        .await
        .map(Json)
        .ok_or_else(|| {
            not_found(
                "NO_DATA",
                format!("{} 기준 {} 순매수 데이터가 없습니다", date, investor.label()),
            )
        })
}

/// GET /api/ranking/aggregate - 최근 N거래일 합산 Top-N.
///
/// 종료일은 오늘(서울 기준), 시작일은 N번째 최근 거래일입니다.
#[utoipa::path(
    get,
    path = "/api/ranking/aggregate",
    tag = "ranking",
    params(AggregateRankingQuery),
    responses(
        (status = 200, description = "기간 합산 랭킹", body = RangeRanking),
        (status = 400, description = "잘못된 파라미터"),
        (status = 404, description = "데이터 없음")
    )
)]
pub async fn get_aggregate_ranking(
    State(state): State<Arc<AppState>>,
    Query(query): Query<AggregateRankingQuery>,
) -> ApiResult<Json<RangeRanking>> {
    let days = query.days.unwrap_or(5);
    if days == 0 {
        return Err(bad_request("INVALID_DAYS", "days는 1 이상이어야 합니다"));
    }
    let investor = parse_investor(query.investor.as_deref())?;
    let top_n = query.top_n.unwrap_or(DEFAULT_TOP_N);
    let period_change = query.period_change.unwrap_or(false);

    let end = TradeDate::today_seoul();
    let start = state.calendar.nth_trading_day_back(days as usize).await;

    state
        .ranking
        .top_for_range(start, end, investor, top_n, period_change)
        .await
        .map(Json)
        .ok_or_else(|| {
            not_found(
                "NO_DATA",
                format!("{} ~ {} 기간의 순매수 데이터가 없습니다", start, end),
            )
        })
}

/// 랭킹 라우터 생성.
pub fn ranking_router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/daily", get(get_daily_ranking))
        .route("/aggregate", get(get_aggregate_ranking))
}
