//! 순매수 데이터 영속 저장소.

pub mod fallback;
pub mod postgres;

pub use fallback::CsvFallback;
pub use postgres::PgNetPurchaseStore;
