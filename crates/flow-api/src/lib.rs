//! 순매수 랭킹 API 서버 라이브러리.
//!
//! 이 크레이트는 다음을 제공합니다:
//! - REST API 라우트 (랭킹, 추세 분석, CSV 내보내기, 헬스 체크)
//! - 통합 에러 응답 타입
//! - OpenAPI 문서 및 Swagger UI
//! - 애플리케이션 상태 컨테이너

pub mod error;
pub mod openapi;
pub mod routes;
pub mod state;
