//! CSV 내보내기 API 라우트.
//!
//! `GET /api/export` - 일별 순매수/순매도 목록을 CSV 파일로 다운로드.
//!
//! 배치 수집과 달리 온디맨드 다운로드는 요청일 데이터가 정확히 있어야
//! 의미가 있으므로 과거 거래일 폴백 없이(`allow_fallback=false`) 조회합니다.

use axum::{
    extract::{Query, State},
    http::header,
    response::IntoResponse,
    routing::get,
    Router,
};
use serde::Deserialize;
use std::sync::Arc;
use utoipa::{IntoParams, ToSchema};

use flow_analytics::DEFAULT_TOP_N;
use flow_core::RankedEntry;
use flow_data::{escape_csv, FallbackSide};

use crate::error::{bad_request, not_found, ApiResult};
use crate::routes::{parse_date, parse_investor};
use crate::state::AppState;

/// CSV 내보내기 쿼리.
#[derive(Debug, Deserialize, ToSchema, IntoParams)]
pub struct ExportQuery {
    /// 조회 거래일 (YYYYMMDD, 생략 시 오늘)
    #[serde(default)]
    pub date: Option<String>,

    /// 투자자 구분 (foreigner | individual | institution, 생략 시 foreigner)
    #[serde(default)]
    pub investor: Option<String>,

    /// 내보낼 목록 (buy | sell, 생략 시 buy)
    #[serde(default)]
    pub side: Option<String>,

    /// 목록 크기 (기본 100)
    #[serde(default)]
    pub top_n: Option<usize>,
}

/// 일별 랭킹 CSV 다운로드.
#[utoipa::path(
    get,
    path = "/api/export",
    tag = "export",
    params(ExportQuery),
    responses(
        (status = 200, description = "CSV 파일 (ticker,name,net_buy_amount)", content_type = "text/csv"),
        (status = 400, description = "잘못된 파라미터", body = crate::error::ApiErrorResponse),
        (status = 404, description = "해당 일자 데이터 없음", body = crate::error::ApiErrorResponse)
    )
)]
pub async fn export_daily_csv(
    State(state): State<Arc<AppState>>,
    Query(query): Query<ExportQuery>,
) -> ApiResult<impl IntoResponse> {
    let date = parse_date(query.date.as_deref())?;
    let investor = parse_investor(query.investor.as_deref())?;
    let side = match query.side.as_deref() {
        None | Some("buy") => FallbackSide::Buy,
        Some("sell") => FallbackSide::Sell,
        Some(other) => {
            return Err(bad_request(
                "INVALID_SIDE",
                format!("알 수 없는 목록 구분: {} (buy 또는 sell)", other),
            ))
        }
    };
    let top_n = query.top_n.unwrap_or(DEFAULT_TOP_N);

    let ranking = state
        .ranking
        .top_for_day(date, investor, top_n, false)
        .await
        .ok_or_else(|| {
            not_found(
                "NO_DATA",
                format!("{} 기준 {} 순매수 데이터가 없습니다", date, investor.label()),
            )
        })?;

    let entries = match side {
        FallbackSide::Buy => &ranking.buy,
        FallbackSide::Sell => &ranking.sell,
    };
    if entries.is_empty() {
        return Err(not_found(
            "NO_DATA",
            format!("{} 기준 {} 목록이 비어 있습니다", date, side.as_str()),
        ));
    }

    let filename = format!(
        "{}_net_{}_top{}_{}.csv",
        investor.code(),
        side.as_str(),
        top_n,
        ranking.date
    );

    Ok((
        [
            (header::CONTENT_TYPE, "text/csv; charset=utf-8".to_string()),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename=\"{}\"", filename),
            ),
        ],
        render_csv(entries),
    ))
}

/// CSV 형식 출력.
fn render_csv(entries: &[RankedEntry]) -> String {
    let mut output = String::new();

    // 헤더
    output.push_str("ticker,name,net_buy_amount\n");

    // 데이터
    for entry in entries {
        output.push_str(&format!(
            "{},{},{}\n",
            entry.ticker,
            escape_csv(&entry.name),
            entry.net_buy_amount
        ));
    }

    output
}

/// 내보내기 라우터 생성.
pub fn export_router() -> Router<Arc<AppState>> {
    Router::new().route("/", get(export_daily_csv))
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
            .nest("/api/export", export_router())
            .with_state(Arc::new(create_test_state()))
    }

    #[test]
    fn test_render_csv_escapes_names() {
        let entries = vec![
            RankedEntry {
                ticker: "005930".to_string(),
                name: "삼성전자".to_string(),
                net_buy_amount: 1_000,
                close_price: 71_500,
                percent_change: 1.2,
                rank: 1,
            },
            RankedEntry {
                ticker: "000660".to_string(),
                name: "SK,하이닉스".to_string(),
                net_buy_amount: -500,
                close_price: 180_000,
                percent_change: -0.4,
                rank: 2,
            },
        ];

        let csv = render_csv(&entries);
        let lines: Vec<&str> = csv.lines().collect();

        assert_eq!(lines[0], "ticker,name,net_buy_amount");
        assert_eq!(lines[1], "005930,삼성전자,1000");
        assert_eq!(lines[2], "000660,\"SK,하이닉스\",-500");
    }

    // Parameter validation happens before any remote call, so these tests
    // never touch the network.

    #[tokio::test]
    async fn test_export_rejects_unknown_side() {
        let response = test_app()
            .oneshot(
                Request::builder()
                    .uri("/api/export?side=hold")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_export_rejects_unknown_investor() {
        let response = test_app()
            .oneshot(
                Request::builder()
                    .uri("/api/export?investor=banker")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }
}
