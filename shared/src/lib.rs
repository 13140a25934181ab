//! Tidepool 共享核心
//!
//! 纯领域逻辑，不依赖 DOM / web_sys，可在原生环境下测试：
//! - `route`: 路由表与解析（含旧路径重定向）
//! - `preferences`: 用户偏好模型与持久化
//! - `chain`: 网络 / 账户观察者
//! - `analytics`: 埋点事件分发
//! - `session`: 启动编排与会话状态机

pub mod analytics;
pub mod chain;
pub mod config;
pub mod date;
pub mod error;
pub mod preferences;
pub mod route;
pub mod session;

pub use analytics::{
    AnalyticsDispatcher, AnalyticsSink, ConversionEvent, EventCategory, WalletEvent,
    WalletIdentity,
};
pub use chain::{ChainId, EthNetwork, NetworkChange, NetworkObserver, NetworkState};
pub use config::{AppConfig, ConfigSource};
pub use date::Timestamp;
pub use error::{SessionError, SessionErrorKind, SessionResult};
pub use preferences::{
    KeyValueStore, MemoryStore, Notification, NotificationKind, PreferenceStore, UserPreferences,
};
pub use route::{Page, Resolution, Settled};
pub use session::{SessionBootstrap, SessionStatus, WalletConnector};

// =========================================================
// 常量定义 (Constants)
// =========================================================

/// 本地缓存中使用的键
pub mod keys {
    pub const DARK_MODE: &str = "darkMode";
    pub const SLIPPAGE_TOLERANCE: &str = "slippageTolerance";
    pub const USD_TOGGLE: &str = "usdToggle";
    pub const NOTIFICATIONS: &str = "notifications";
    pub const AUTO_LOGIN: &str = "autoLogin";
    pub const INSIGHTS_EXPANDED: &str = "insightsExpanded";
}
