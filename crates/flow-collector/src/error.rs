//! 에러 타입 정의.

use std::fmt;

/// Collector 에러 타입
#[derive(Debug)]
pub enum CollectorError {
    /// 데이터베이스 에러
    Database(sqlx::Error),
    /// 설정 에러
    Config(String),
    /// 데이터 소스 에러 (KRX 조회 등)
    DataSource(String),
    /// 캐시 스토어 에러
    Store(String),
    /// 파일 입출력 에러
    Io(std::io::Error),
}

impl fmt::Display for CollectorError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Database(e) => write!(f, "Database error: {}", e),
            Self::Config(msg) => write!(f, "Configuration error: {}", msg),
            Self::DataSource(msg) => write!(f, "Data source error: {}", msg),
            Self::Store(msg) => write!(f, "Store error: {}", msg),
            Self::Io(e) => write!(f, "I/O error: {}", e),
        }
    }
}

impl std::error::Error for CollectorError {}

impl From<sqlx::Error> for CollectorError {
    fn from(err: sqlx::Error) -> Self {
        Self::Database(err)
    }
}

impl From<std::io::Error> for CollectorError {
    fn from(err: std::io::Error) -> Self {
        Self::Io(err)
    }
}

impl From<flow_core::SourceError> for CollectorError {
    fn from(err: flow_core::SourceError) -> Self {
        Self::DataSource(err.to_string())
    }
}

impl From<flow_core::StoreError> for CollectorError {
    fn from(err: flow_core::StoreError) -> Self {
        Self::Store(err.to_string())
    }
}

impl From<flow_data::DataError> for CollectorError {
    fn from(err: flow_data::DataError) -> Self {
        Self::DataSource(err.to_string())
    }
}

/// Result 타입 별칭
pub type Result<T> = std::result::Result<T, CollectorError>;
