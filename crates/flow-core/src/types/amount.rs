//! 금액/등락률 숫자 유틸리티.
//!
//! 순매수 거래대금은 원 단위 정수(i64)로, 등락률은 소수점 둘째 자리까지의
//! 백분율(f64)로 다룹니다.

/// 소수점 둘째 자리로 반올림합니다 (등락률 표기용).
pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// 기간 등락률 계산: `(end - start) / start * 100`, 둘째 자리 반올림.
///
/// 시작가가 0 이하면 계산할 수 없으므로 `None`을 반환합니다.
pub fn period_change_pct(start_price: i64, end_price: i64) -> Option<f64> {
    if start_price > 0 && end_price > 0 {
        Some(round2(
            (end_price - start_price) as f64 / start_price as f64 * 100.0,
        ))
    } else {
        None
    }
}
