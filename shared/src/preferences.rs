//! 用户偏好模块
//!
//! - `KeyValueStore`: 本地键值缓存抽象（浏览器中为 LocalStorage）
//! - `PreferenceStore`: 类型化的读写，值以 JSON 文本存储
//! - `UserPreferences`: 内存中的偏好模型

use crate::date::Timestamp;
use crate::error::{SessionError, SessionResult};
use crate::keys;
use serde::{Deserialize, Serialize, de::DeserializeOwned};
use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

pub const DEFAULT_SLIPPAGE_TOLERANCE: f64 = 0.005;

// =========================================================
// 抽象存储接口
// =========================================================

/// 同步键值缓存
///
/// 读取失败与键不存在不做区分，都返回 None。
pub trait KeyValueStore {
    fn get(&self, key: &str) -> Option<String>;
    /// 写入成功返回 true
    fn set(&self, key: &str, value: &str) -> bool;
}

/// 内存实现，克隆后共享同一份数据
#[derive(Clone, Default)]
pub struct MemoryStore {
    map: Rc<RefCell<HashMap<String, String>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_entry(self, key: &str, value: &str) -> Self {
        self.map.borrow_mut().insert(key.to_string(), value.to_string());
        self
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Option<String> {
        self.map.borrow().get(key).cloned()
    }

    fn set(&self, key: &str, value: &str) -> bool {
        self.map
            .borrow_mut()
            .insert(key.to_string(), value.to_string());
        true
    }
}

// =========================================================
// 领域模型 (Domain Models)
// =========================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum NotificationKind {
    #[default]
    Info,
    Success,
    Error,
    Pending,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Notification {
    pub id: String,
    #[serde(default)]
    pub kind: NotificationKind,
    #[serde(default)]
    pub title: String,
    pub message: String,
    pub timestamp: Timestamp,
    #[serde(default)]
    pub read: bool,
}

impl Notification {
    pub fn new(
        id: impl Into<String>,
        kind: NotificationKind,
        title: impl Into<String>,
        message: impl Into<String>,
        timestamp: Timestamp,
    ) -> Self {
        Self {
            id: id.into(),
            kind,
            title: title.into(),
            message: message.into(),
            timestamp,
            read: false,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct UserPreferences {
    pub dark_mode: bool,
    pub slippage_tolerance: f64,
    pub usd_toggle: bool,
    pub notifications: Vec<Notification>,
    pub auto_login: bool,
}

impl Default for UserPreferences {
    fn default() -> Self {
        Self {
            dark_mode: false,
            slippage_tolerance: DEFAULT_SLIPPAGE_TOLERANCE,
            usd_toggle: false,
            notifications: Vec::new(),
            auto_login: false,
        }
    }
}

impl UserPreferences {
    /// 新通知排在最前
    pub fn push_notification(&mut self, notification: Notification) {
        self.notifications.insert(0, notification);
    }

    /// 标记已读，返回是否找到该通知
    pub fn mark_read(&mut self, id: &str) -> bool {
        match self.notifications.iter_mut().find(|n| n.id == id) {
            Some(n) => {
                n.read = true;
                true
            }
            None => false,
        }
    }

    pub fn unread(&self) -> impl Iterator<Item = &Notification> {
        self.notifications.iter().filter(|n| !n.read)
    }

    pub fn clear_notifications(&mut self) {
        self.notifications.clear();
    }
}

// =========================================================
// 类型化读写
// =========================================================

/// 偏好存储
///
/// 读取时缺失或无法解析的值都视为不存在；写入为同步覆盖，最后一次写入生效。
#[derive(Clone)]
pub struct PreferenceStore<S> {
    store: S,
}

impl<S: KeyValueStore> PreferenceStore<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    pub fn get<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        let raw = self.store.get(key)?;
        match serde_json::from_str(&raw) {
            Ok(value) => Some(value),
            Err(e) => {
                log::warn!("ignoring unreadable preference '{}': {}", key, e);
                None
            }
        }
    }

    pub fn set<T: Serialize + ?Sized>(&self, key: &str, value: &T) -> SessionResult<()> {
        let raw = serde_json::to_string(value)
            .map_err(|e| SessionError::from(e).in_op_with("preferences.set", key))?;
        if self.store.set(key, &raw) {
            Ok(())
        } else {
            Err(SessionError::storage("write rejected").in_op_with("storage.set", key))
        }
    }

    pub fn auto_login(&self) -> bool {
        self.get::<bool>(keys::AUTO_LOGIN).unwrap_or(false)
    }

    pub fn insights_expanded(&self) -> bool {
        self.get::<bool>(keys::INSIGHTS_EXPANDED).unwrap_or(false)
    }

    pub fn set_insights_expanded(&self, open: bool) -> SessionResult<()> {
        self.set(keys::INSIGHTS_EXPANDED, &open)
    }

    /// 从缓存恢复偏好，每个键只有存在时才覆盖默认值
    pub fn hydrate(&self) -> UserPreferences {
        let mut prefs = UserPreferences::default();

        if let Some(usd) = self.get(keys::USD_TOGGLE) {
            prefs.usd_toggle = usd;
        }
        if let Some(list) = self.get(keys::NOTIFICATIONS) {
            prefs.notifications = list;
        }
        if let Some(slippage) = self.get(keys::SLIPPAGE_TOLERANCE) {
            prefs.slippage_tolerance = slippage;
        }
        if let Some(dark) = self.get(keys::DARK_MODE) {
            prefs.dark_mode = dark;
        }
        if let Some(auto_login) = self.get(keys::AUTO_LOGIN) {
            prefs.auto_login = auto_login;
        }

        prefs
    }

    /// 完整写入偏好，通知列表作为一个整体写入
    pub fn save(&self, prefs: &UserPreferences) -> SessionResult<()> {
        self.set(keys::DARK_MODE, &prefs.dark_mode)?;
        self.set(keys::SLIPPAGE_TOLERANCE, &prefs.slippage_tolerance)?;
        self.set(keys::USD_TOGGLE, &prefs.usd_toggle)?;
        self.save_notifications(&prefs.notifications)?;
        self.set(keys::AUTO_LOGIN, &prefs.auto_login)
    }

    pub fn save_notifications(&self, notifications: &[Notification]) -> SessionResult<()> {
        self.set(keys::NOTIFICATIONS, notifications)
    }
}
