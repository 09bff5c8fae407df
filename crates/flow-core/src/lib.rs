//! # Flow Core
//!
//! 투자자별 순매수 파이프라인의 핵심 도메인 모델 및 타입을 제공합니다.
//!
//! 이 크레이트는 시스템 전반에서 사용되는 기본 타입을 제공합니다:
//! - 투자자 구분 및 거래일 타입
//! - 순매수 레코드, 랭킹, 트렌드 결과 구조체
//! - 원격 데이터 소스 / 캐시 스토어 추상화
//! - 설정 관리
//! - 로깅 인프라

pub mod config;
pub mod domain;
pub mod logging;
pub mod types;

pub use config::*;
pub use domain::*;
pub use logging::*;
pub use types::*;
