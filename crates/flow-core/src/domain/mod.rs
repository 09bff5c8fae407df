//! 순매수 파이프라인의 도메인 모델과 경계 추상화.

mod record;
mod source;
mod store;

pub use record::*;
pub use source::*;
pub use store::*;
