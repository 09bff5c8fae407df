//! 파이프라인 전반에서 사용되는 공통 타입.

mod amount;
mod date;
mod investor;

pub use amount::*;
pub use date::*;
pub use investor::*;
