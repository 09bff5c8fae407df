//! 원격 데이터 제공자 구현.

pub mod krx;

pub use krx::KrxClient;
