//! 工具函数模块
//!
//! 提供毫秒时间戳与 `DateTime` 之间的转换等通用工具函数

use chrono::{DateTime, TimeZone, Utc};

/// 获取当前时间戳（毫秒）
pub fn current_millis() -> i64 {
    Utc::now().timestamp_millis()
}

/// 毫秒数转换为 DateTime，超出范围时返回 None
pub fn millis_to_datetime(ms: i64) -> Option<DateTime<Utc>> {
    Utc.timestamp_millis_opt(ms).single()
}

/// 当前时间（截断到毫秒精度）
///
/// 存储层以毫秒保存时间戳，写入前截断可以保证写入值与读回值一致。
pub fn now_millis_precision() -> DateTime<Utc> {
    millis_to_datetime(current_millis()).unwrap_or_else(Utc::now)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_millis_round_trip() {
        let now = now_millis_precision();
        let ms = now.timestamp_millis();
        assert_eq!(millis_to_datetime(ms), Some(now));
        assert_eq!(now.timestamp_subsec_nanos() % 1_000_000, 0);
    }

    #[test]
    fn test_millis_out_of_range() {
        assert_eq!(millis_to_datetime(i64::MAX), None);
    }
}
