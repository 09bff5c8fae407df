//! 데이터 수집 모듈.

pub mod cache_status;
pub mod csv_export;
pub mod net_purchase_collect;
pub mod price_sync;

pub use cache_status::show_cache_status;
pub use csv_export::export_fallback_csv;
pub use net_purchase_collect::collect_net_purchases;
pub use price_sync::sync_prices;
