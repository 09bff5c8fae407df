//! OpenAPI 문서화 설정.
//!
//! utoipa를 사용하여 REST API의 OpenAPI 3.0 스펙을 생성합니다.
//! Swagger UI는 `/swagger-ui` 경로에서 사용 가능합니다.
//!
//! # 자동 생성 구조
//!
//! 각 라우트 모듈은 자체 스키마를 정의하고, 중앙 `ApiDoc`에서 자동으로 집계합니다.
//! 새로운 엔드포인트를 추가할 때:
//!
//! 1. 응답/요청 타입에 `#[derive(ToSchema)]` 추가
//! 2. 핸들러에 `#[utoipa::path(...)]` 어노테이션 추가
//! 3. 이 파일의 `components(schemas(...))` 및 `paths(...)` 섹션에 추가
//!
//! # 외부 타입 처리
//!
//! flow-core의 도메인 타입은 `utoipa-support` 피처로 `ToSchema`를 구현하므로
//! 별도 DTO 없이 그대로 응답 스키마로 사용합니다.

use axum::Router;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

// ==================== 각 모듈에서 스키마 Import ====================

use crate::error::ApiErrorResponse;
use crate::routes::{ComponentHealth, ComponentStatus, HealthResponse};

use flow_core::{
    DailyRanking, DataTier, InvestorClass, RangeRanking, RankedEntry, TradeDate, TrendReport,
};

// ==================== OpenAPI 문서 정의 ====================

/// Investor Flow API 문서.
///
/// 모든 엔드포인트와 스키마를 포함하는 OpenAPI 3.0 스펙입니다.
#[derive(OpenApi)]
#[openapi(
    info(
        title = "Investor Flow API",
        version = "0.1.0",
        description = r#"
# 투자자별 순매수 분석 REST API

KRX 투자자별 거래실적을 수집하여 순매수/순매도 랭킹과 추세 분석을 제공합니다.

## 주요 기능

- **일별 랭킹**: 특정 거래일의 투자자별 순매수/순매도 Top-N
- **기간 합산**: 최근 N거래일 순매수 합산 랭킹
- **추세 분석**: 연속 순매수 종목과 신규 유입 종목 탐지
- **CSV 내보내기**: 일별 랭킹을 CSV 파일로 다운로드

## 데이터 조회 경로

일별 데이터는 캐시 → KRX 원격 → 로컬 CSV 순서로 조회하며,
응답의 `source` 필드가 실제 사용된 경로를 나타냅니다.
"#,
        license(name = "MIT", url = "https://opensource.org/licenses/MIT"),
        contact(
            name = "Investor Flow Team",
            url = "https://github.com/user/investor-flow"
        )
    ),
    servers(
        (url = "http://localhost:3000", description = "로컬 개발 서버"),
    ),
    tags(
        (name = "health", description = "헬스 체크 - 서버 상태 확인"),
        (name = "ranking", description = "랭킹 - 순매수/순매도 Top-N 조회"),
        (name = "analysis", description = "분석 - 연속 순매수 / 신규 유입 추세"),
        (name = "export", description = "내보내기 - 일별 랭킹 CSV 다운로드")
    ),
    // ==================== 스키마 등록 ====================
    components(
        schemas(
            // ===== Health =====
            HealthResponse,
            ComponentHealth,
            ComponentStatus,

            // ===== Common =====
            ApiErrorResponse,
            InvestorClass,
            TradeDate,
            DataTier,

            // ===== Ranking =====
            DailyRanking,
            RangeRanking,
            RankedEntry,

            // ===== Analysis =====
            TrendReport,
        )
    ),
    // ==================== 경로 등록 ====================
    paths(
        // ===== Health =====
        crate::routes::health::health_check,
        crate::routes::health::health_ready,

        // ===== Ranking =====
        crate::routes::ranking::get_daily_ranking,
        crate::routes::ranking::get_aggregate_ranking,

        // ===== Analysis =====
        crate::routes::trend::get_trend_analysis,

        // ===== Export =====
        crate::routes::export::export_daily_csv,
    )
)]
pub struct ApiDoc;

// ==================== Swagger UI 라우터 ====================

/// Swagger UI 라우터 생성.
///
/// 다음 경로에 문서 UI를 마운트합니다:
/// - `/swagger-ui` - Swagger UI 대화형 문서
/// - `/api-docs/openapi.json` - OpenAPI JSON 스펙
pub fn swagger_ui_router<S>() -> Router<S>
where
    S: Clone + Send + Sync + 'static,
{
    SwaggerUi::new("/swagger-ui")
        .url("/api-docs/openapi.json", ApiDoc::openapi())
        .into()
}

// ==================== 테스트 ====================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_openapi_spec_valid() {
        let spec = ApiDoc::openapi();
        let json = serde_json::to_string_pretty(&spec).unwrap();

        // 기본 정보 확인
        assert!(json.contains("Investor Flow API"));
        assert!(json.contains("0.1.0"));

        // 태그 확인
        assert!(json.contains("health"));
        assert!(json.contains("ranking"));
        assert!(json.contains("analysis"));
        assert!(json.contains("export"));

        // 경로 확인
        assert!(json.contains("/health"));
        assert!(json.contains("/health/ready"));
        assert!(json.contains("/api/ranking/daily"));
        assert!(json.contains("/api/ranking/aggregate"));
        assert!(json.contains("/api/analysis/trend"));
        assert!(json.contains("/api/export"));
    }

    #[test]
    fn test_swagger_ui_router_creates() {
        let _router: Router<()> = swagger_ui_router();
    }

    #[test]
    fn test_openapi_contains_schemas() {
        let spec = ApiDoc::openapi();
        let json = serde_json::to_string(&spec).unwrap();

        // 스키마 확인
        assert!(json.contains("HealthResponse"));
        assert!(json.contains("DailyRanking"));
        assert!(json.contains("TrendReport"));
        assert!(json.contains("ApiErrorResponse"));
    }
}
