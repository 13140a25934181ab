//! 埋点事件分发模块
//!
//! 单向事件出口：格式化结构化事件（页面浏览、钱包操作、转化漏斗）并推送到
//! 第三方 Tag Manager 的全局队列。不重试、不缓冲、不确认送达。
//! 队列不存在时事件被静默丢弃。

use crate::preferences::{KeyValueStore, PreferenceStore};
use serde_json::{Map, Value, json};
use std::sync::atomic::{AtomicBool, Ordering};

const PAGE_CLASS: &str = "App";
const CURRENCY_LABEL: &str = "USD";

// =========================================================
// 抽象事件出口
// =========================================================

/// 第三方 Tag Manager 的全局事件队列
///
/// 浏览器中对应 `window.dataLayer`；队列不存在是合法状态。
pub trait AnalyticsSink {
    /// 全局队列是否存在
    fn queue_exists(&self) -> bool;
    /// 以一条初始条目创建全局队列
    fn create_queue(&self, seed: Value);
    /// 追加一条事件，队列不存在时返回 false
    fn push(&self, payload: Value) -> bool;
    /// 注入第三方脚本
    fn inject_script(&self, container_id: &str);
    /// 宿主页面当前路径
    fn page_path(&self) -> String;
}

// =========================================================
// 事件定义
// =========================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventCategory {
    Conversion,
    Wallet,
}

impl EventCategory {
    pub fn label(&self) -> &'static str {
        match self {
            EventCategory::Conversion => "Conversion",
            EventCategory::Wallet => "Wallet",
        }
    }
}

/// 钱包连接漏斗
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WalletEvent {
    Popup,
    Click,
    Connect,
}

impl WalletEvent {
    pub fn label(&self) -> &'static str {
        match self {
            WalletEvent::Popup => "Wallet Connect Select Wallet Popup",
            WalletEvent::Click => "Wallet Connect Wallet Icon Click",
            WalletEvent::Connect => "Wallet Connect",
        }
    }
}

/// 兑换转化漏斗
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConversionEvent {
    Click,
    ApprovePopup,
    Approved,
    WalletRequest,
    WalletConfirm,
    Fail,
    Success,
}

impl ConversionEvent {
    pub fn label(&self) -> &'static str {
        match self {
            ConversionEvent::Click => "Conversion Swap Click",
            ConversionEvent::ApprovePopup => "Conversion Unlimited Popup",
            ConversionEvent::Approved => "Conversion Unlimited Popup Select",
            ConversionEvent::WalletRequest => "Conversion Wallet Confirmation Request",
            ConversionEvent::WalletConfirm => "Conversion Wallet Confirmed",
            ConversionEvent::Fail => "Conversion Failed",
            ConversionEvent::Success => "Conversion Success",
        }
    }
}

/// 已连接钱包的标识
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WalletIdentity {
    pub id: String,
    pub name: String,
}

impl WalletIdentity {
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
        }
    }

    fn to_value(&self) -> Value {
        json!({ "id": self.id, "name": self.name })
    }
}

/// 结构化事件，按次创建，不持久化
#[derive(Debug, Clone, PartialEq)]
pub struct AnalyticsEvent {
    pub category: EventCategory,
    pub name: String,
    pub properties: Option<Value>,
    pub user_properties: Option<Value>,
}

impl AnalyticsEvent {
    pub fn new(category: EventCategory, name: impl Into<String>) -> Self {
        Self {
            category,
            name: name.into(),
            properties: None,
            user_properties: None,
        }
    }

    pub fn with_properties(mut self, properties: Option<Value>) -> Self {
        self.properties = properties;
        self
    }

    pub fn with_user_properties(mut self, user_properties: Option<Value>) -> Self {
        self.user_properties = user_properties;
        self
    }

    pub fn to_payload(&self) -> Value {
        json!({
            "event": format!("CE {}", self.name),
            "event_properties": self.properties,
            "user_properties": self.user_properties,
            "ga_event": { "category": self.category.label() },
        })
    }
}

// =========================================================
// 分发器
// =========================================================

/// 埋点分发器
///
/// `initialized` 与全局队列是否存在共同保证第三方脚本只注入一次。
pub struct AnalyticsDispatcher<A, S> {
    sink: A,
    store: PreferenceStore<S>,
    container_id: String,
    initialized: AtomicBool,
}

impl<A, S> AnalyticsDispatcher<A, S>
where
    A: AnalyticsSink,
    S: KeyValueStore,
{
    pub fn new(sink: A, store: PreferenceStore<S>, container_id: impl Into<String>) -> Self {
        Self {
            sink,
            store,
            container_id: container_id.into(),
            initialized: AtomicBool::new(false),
        }
    }

    pub fn sink(&self) -> &A {
        &self.sink
    }

    pub fn is_initialized(&self) -> bool {
        self.initialized.load(Ordering::Acquire)
    }

    /// 初始化 Tag Manager，幂等
    ///
    /// 返回本次调用是否真正执行了注入。
    pub fn initialize(&self, wallet: Option<&WalletIdentity>) -> bool {
        if self.is_initialized() || self.sink.queue_exists() {
            return false;
        }
        if self
            .initialized
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            return false;
        }

        let wallet = wallet
            .map(WalletIdentity::to_value)
            .unwrap_or_else(|| json!({}));
        self.sink.create_queue(json!({
            "wallet": wallet,
            "page": { "class": PAGE_CLASS },
        }));
        self.sink.inject_script(&self.container_id);
        log::info!("tag manager initialized ({})", self.container_id);

        let path = self.sink.page_path();
        self.record_page_view(None, &path, false);
        true
    }

    fn send(&self, payload: Value) -> bool {
        let delivered = self.sink.push(payload);
        if !delivered {
            log::debug!("analytics queue unavailable, event dropped");
        }
        delivered
    }

    pub fn dispatch(&self, event: &AnalyticsEvent) -> bool {
        self.send(event.to_payload())
    }

    pub fn record_event(
        &self,
        category: EventCategory,
        name: &str,
        properties: Option<Value>,
        user_properties: Option<Value>,
    ) -> bool {
        let event = AnalyticsEvent::new(category, name)
            .with_properties(properties)
            .with_user_properties(user_properties);
        self.dispatch(&event)
    }

    /// 页面浏览事件
    ///
    /// 访问首页时附带持久化的洞察面板展开状态。
    pub fn record_page_view(&self, from: Option<&str>, to: &str, dark_mode: bool) -> bool {
        let mut page = Map::new();
        if let Some(from) = from {
            page.insert("from_path".to_string(), json!(from));
        }
        page.insert("to_path".to_string(), json!(to));
        page.insert(
            "theme".to_string(),
            json!(if dark_mode { "Dark" } else { "Light" }),
        );
        page.insert("currency".to_string(), json!(CURRENCY_LABEL));
        if to == "/" {
            page.insert(
                "swap_insights".to_string(),
                json!(open_label(self.store.insights_expanded())),
            );
        }

        self.send(json!({
            "event": format!("VP {}", to),
            "page": page,
            "user_properties": null,
            "ga_event": null,
        }))
    }

    pub fn record_wallet_event(
        &self,
        event: WalletEvent,
        properties: Option<Value>,
        wallet: Option<&WalletIdentity>,
    ) -> bool {
        match wallet {
            Some(wallet) => self.send(json!({
                "event": format!("CE {}", event.label()),
                "ga_event": { "category": EventCategory::Wallet.label() },
                "user_properties": {
                    "wallet_id": wallet.id,
                    "wallet_name": wallet.name,
                },
                "wallet": wallet.to_value(),
            })),
            None => self.record_event(EventCategory::Wallet, event.label(), properties, None),
        }
    }

    pub fn record_conversion_event(&self, event: ConversionEvent, properties: Option<Value>) -> bool {
        self.record_event(EventCategory::Conversion, event.label(), properties, None)
    }

    /// 兑换页洞察面板展开 / 收起
    pub fn record_insight(&self, open: bool) -> bool {
        let label = open_label(open);
        self.send(json!({
            "event": format!("CE Conversion Insights {}", label),
            "event_properties": null,
            "user_properties": null,
            "ga_event": { "category": EventCategory::Conversion.label() },
            "page": { "swap_insights": label },
        }))
    }
}

fn open_label(open: bool) -> &'static str {
    if open { "Open" } else { "Closed" }
}

// =========================================================
// 测试环境实现 (Mock)
// =========================================================
