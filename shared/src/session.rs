//! 会话启动编排
//!
//! 启动时依次：(a) 读取自动登录标记，必要时静默重连钱包；
//! (b) 从本地缓存恢复偏好；(c) 订阅网络 / 账户观察者。
//!
//! 状态机：`Loading -> Ready`、`Loading -> UnsupportedNetwork`、
//! `Ready <-> UnsupportedNetwork`。偏好恢复完成前始终停留在 `Loading`。

use crate::analytics::{AnalyticsDispatcher, AnalyticsSink};
use crate::chain::{ChainId, NetworkChange, NetworkObserver, NetworkState, SubscriptionId};
use crate::config::AppConfig;
use crate::error::SessionResult;
use crate::preferences::{KeyValueStore, Notification, PreferenceStore, UserPreferences};
use async_trait::async_trait;
use std::cell::{Cell, RefCell};
use std::rc::Rc;
use std::sync::Arc;

/// 会话展示状态
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SessionStatus {
    #[default]
    Loading,
    Ready,
    /// 当前网络不受支持，切换到受支持网络后自动恢复
    UnsupportedNetwork,
}

impl SessionStatus {
    /// 由启动进度与当前网络推导状态
    pub fn derive(settled: bool, chain_id: Option<ChainId>, supported: &[ChainId]) -> Self {
        if !settled {
            return SessionStatus::Loading;
        }
        match chain_id {
            Some(id) if !id.is_supported(supported) => SessionStatus::UnsupportedNetwork,
            _ => SessionStatus::Ready,
        }
    }
}

/// 钱包连接抽象
///
/// 限时等待由实现方负责。
#[async_trait(?Send)]
pub trait WalletConnector {
    /// 静默重连之前授权过的钱包
    ///
    /// - `Ok(Some(state))`: 重连成功，返回钱包上报的网络与账户
    /// - `Ok(None)`: 没有已授权的账户
    async fn auto_connect(&self) -> SessionResult<Option<NetworkState>>;
}

type StatusListener = Rc<dyn Fn(SessionStatus)>;

/// 启动进度与当前状态
struct StatusGate {
    supported: Vec<ChainId>,
    auto_login_requested: Cell<bool>,
    auto_connect_settled: Cell<bool>,
    hydrated: Cell<bool>,
    status: Cell<SessionStatus>,
    listeners: RefCell<Vec<StatusListener>>,
}

impl StatusGate {
    fn new(supported: Vec<ChainId>) -> Self {
        Self {
            supported,
            auto_login_requested: Cell::new(false),
            auto_connect_settled: Cell::new(false),
            hydrated: Cell::new(false),
            status: Cell::new(SessionStatus::Loading),
            listeners: RefCell::new(Vec::new()),
        }
    }

    fn settled(&self, chain_id: Option<ChainId>) -> bool {
        self.hydrated.get()
            && (chain_id.is_some()
                || self.auto_connect_settled.get()
                || !self.auto_login_requested.get())
    }

    fn refresh(&self, chain_id: Option<ChainId>) {
        let next = SessionStatus::derive(self.settled(chain_id), chain_id, &self.supported);
        let prev = self.status.replace(next);
        if prev == next {
            return;
        }

        log::info!("session status: {:?} -> {:?}", prev, next);
        let listeners: Vec<StatusListener> = self.listeners.borrow().clone();
        for listener in listeners {
            listener(next);
        }
    }
}

/// 会话启动编排器
///
/// S: KeyValueStore
/// W: WalletConnector
/// A: AnalyticsSink
pub struct SessionBootstrap<S, W, A> {
    store: PreferenceStore<S>,
    wallet: W,
    analytics: Arc<AnalyticsDispatcher<A, S>>,
    network: NetworkObserver,
    gate: Rc<StatusGate>,
    preferences: RefCell<UserPreferences>,
    started: Cell<bool>,
    subscription: Cell<Option<SubscriptionId>>,
}

impl<S, W, A> SessionBootstrap<S, W, A>
where
    S: KeyValueStore + Clone + 'static,
    W: WalletConnector,
    A: AnalyticsSink + 'static,
{
    pub fn new(
        config: &AppConfig,
        store: S,
        wallet: W,
        analytics: Arc<AnalyticsDispatcher<A, S>>,
    ) -> Self {
        Self {
            store: PreferenceStore::new(store),
            wallet,
            analytics,
            network: NetworkObserver::new(config.fallback_chain),
            gate: Rc::new(StatusGate::new(config.supported_chains.clone())),
            preferences: RefCell::new(UserPreferences::default()),
            started: Cell::new(false),
            subscription: Cell::new(None),
        }
    }

    /// 执行启动流程，只会执行一次
    pub async fn start(&self) -> SessionStatus {
        if self.started.replace(true) {
            return self.status();
        }

        // (a) 自动登录标记
        let auto_login = self.store.auto_login();
        self.gate.auto_login_requested.set(auto_login);
        if !auto_login {
            log::info!("auto-login not requested, skipping wallet reconnect");
        }

        // (b) 偏好恢复，调用方可能已提前完成
        self.hydrate();

        // (c) 订阅网络 / 账户变化
        self.subscribe();
        // 首次观察到的账户状态（未连接）也视为一次账户变化
        self.analytics.initialize(None);
        self.refresh();

        if auto_login {
            match self.wallet.auto_connect().await {
                Ok(Some(state)) => {
                    log::info!("wallet reconnected");
                    self.network.set_network(state.chain_id);
                    self.network.set_account(state.account);
                }
                Ok(None) => log::info!("no authorized wallet account"),
                Err(e) => log::warn!("auto-connect failed, continuing logged out: {}", e),
            }
            self.gate.auto_connect_settled.set(true);
            self.refresh();
        }

        self.status()
    }

    /// 从缓存恢复偏好，只会执行一次
    ///
    /// 同步完成，UI 可在启动前调用以拿到恢复后的偏好；之后的修改不会被再次恢复覆盖。
    pub fn hydrate(&self) -> UserPreferences {
        if !self.gate.hydrated.get() {
            *self.preferences.borrow_mut() = self.store.hydrate();
            self.gate.hydrated.set(true);
        }
        self.preferences()
    }

    fn subscribe(&self) {
        if self.subscription.get().is_some() {
            return;
        }

        let gate = self.gate.clone();
        let analytics = self.analytics.clone();
        let id = self.network.subscribe(move |change, state| match change {
            NetworkChange::Network => gate.refresh(state.chain_id),
            NetworkChange::Account => {
                analytics.initialize(None);
            }
        });
        self.subscription.set(Some(id));
    }

    fn refresh(&self) {
        self.gate.refresh(self.network.reported_chain());
    }

    pub fn status(&self) -> SessionStatus {
        self.gate.status.get()
    }

    /// 注册状态变化回调
    pub fn on_status_change(&self, listener: impl Fn(SessionStatus) + 'static) {
        self.gate.listeners.borrow_mut().push(Rc::new(listener));
    }

    /// 偏好是否已从缓存恢复
    pub fn is_hydrated(&self) -> bool {
        self.gate.hydrated.get()
    }

    pub fn wallet(&self) -> &W {
        &self.wallet
    }

    pub fn network(&self) -> &NetworkObserver {
        &self.network
    }

    pub fn analytics(&self) -> &Arc<AnalyticsDispatcher<A, S>> {
        &self.analytics
    }

    pub fn store(&self) -> &PreferenceStore<S> {
        &self.store
    }

    pub fn preferences(&self) -> UserPreferences {
        self.preferences.borrow().clone()
    }

    /// 修改偏好并立即持久化
    pub fn update_preferences(
        &self,
        f: impl FnOnce(&mut UserPreferences),
    ) -> SessionResult<UserPreferences> {
        let snapshot = {
            let mut prefs = self.preferences.borrow_mut();
            f(&mut prefs);
            prefs.clone()
        };
        self.store.save(&snapshot)?;
        Ok(snapshot)
    }

    /// 追加通知，只重写通知列表
    pub fn push_notification(&self, notification: Notification) -> SessionResult<()> {
        let list = {
            let mut prefs = self.preferences.borrow_mut();
            prefs.push_notification(notification);
            prefs.notifications.clone()
        };
        self.store.save_notifications(&list)
    }

    /// 交互式连接成功后调用：更新网络 / 账户并记住自动登录
    pub fn connected(&self, state: NetworkState) -> SessionResult<UserPreferences> {
        self.network.set_network(state.chain_id);
        self.network.set_account(state.account);
        self.update_preferences(|prefs| prefs.auto_login = true)
    }

    /// 断开：清除账户并取消自动登录
    pub fn disconnect(&self) -> SessionResult<UserPreferences> {
        self.network.set_account(None);
        self.update_preferences(|prefs| prefs.auto_login = false)
    }
}

#[cfg(test)]
mod tests;
