//! 时间类型模块
//!
//! `Timestamp`: 可序列化的毫秒时间戳，用于通知等持久化数据。
//! 获取当前时间依赖宿主环境（浏览器为 `js_sys::Date::now`），由调用方提供。

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// 毫秒时间戳，用于序列化传输和存储
///
/// 内部存储为 `i64`，表示自 Unix 纪元以来的毫秒数
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize, Default)]
#[serde(transparent)]
pub struct Timestamp(i64);

impl Timestamp {
    /// 创建新的时间戳
    #[inline]
    pub const fn new(ms: i64) -> Self {
        Self(ms)
    }

    /// 转换为 UTC 时间，超出范围时返回 None
    pub fn to_datetime(&self) -> Option<DateTime<Utc>> {
        DateTime::from_timestamp_millis(self.0)
    }

    /// 格式化为 `HH:MM`（UTC），用于通知列表显示
    pub fn format_time(&self) -> String {
        self.to_datetime()
            .map(|dt| dt.format("%H:%M").to_string())
            .unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_time() {
        // 2021-01-01T12:34:00Z
        let ts = Timestamp::new(1_609_504_440_000);
        assert_eq!(ts.format_time(), "12:34");
    }

    #[test]
    fn test_serde_transparent() {
        let ts = Timestamp::new(42);
        assert_eq!(serde_json::to_string(&ts).unwrap(), "42");
        let back: Timestamp = serde_json::from_str("42").unwrap();
        assert_eq!(back, ts);
    }
}
