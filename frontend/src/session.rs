//! 会话上下文
//!
//! 把共享核心的 `SessionBootstrap` 接入 Leptos：
//! 核心状态通过订阅同步到信号，UI 通过信号读取、通过上下文方法修改。

use crate::analytics::{DataLayerSink, Dispatcher};
use crate::wallet::InjectedWallet;
use crate::web::BrowserStorage;
use futures::StreamExt;
use futures::channel::mpsc;
use leptos::prelude::*;
use leptos::task::spawn_local;
use std::rc::Rc;
use std::sync::Arc;
use tidepool_shared::config::{
    VAR_AUTO_CONNECT_TIMEOUT_MS, VAR_FALLBACK_CHAIN, VAR_SUPPORTED_CHAINS, VAR_TAG_MANAGER_ID,
};
use tidepool_shared::{
    AppConfig, ChainId, ConfigSource, EthNetwork, NetworkState, Notification, NotificationKind,
    SessionBootstrap, SessionStatus, Timestamp, UserPreferences, WalletEvent,
};

pub type AppSession = SessionBootstrap<BrowserStorage, InjectedWallet, DataLayerSink>;

// =========================================================
// 配置
// =========================================================

/// 编译期环境变量
pub struct BuildEnv;

impl ConfigSource for BuildEnv {
    fn var(&self, name: &str) -> Option<String> {
        let value = match name {
            VAR_TAG_MANAGER_ID => option_env!("TIDEPOOL_GTM_ID"),
            VAR_SUPPORTED_CHAINS => option_env!("TIDEPOOL_SUPPORTED_CHAINS"),
            VAR_FALLBACK_CHAIN => option_env!("TIDEPOOL_FALLBACK_CHAIN"),
            VAR_AUTO_CONNECT_TIMEOUT_MS => option_env!("TIDEPOOL_AUTO_CONNECT_TIMEOUT_MS"),
            _ => None,
        };
        value.map(str::to_string)
    }
}

// =========================================================
// 上下文
// =========================================================

enum SessionAction {
    Connect,
    Disconnect,
}

/// 会话上下文
///
/// 只包含信号与可跨线程的句柄，通过 Context 在组件间共享。
#[derive(Clone, Copy)]
pub struct SessionContext {
    pub status: RwSignal<SessionStatus>,
    pub network: RwSignal<NetworkState>,
    pub preferences: RwSignal<UserPreferences>,
    /// 交互式连接进行中
    pub connecting: RwSignal<bool>,
    config: StoredValue<AppConfig>,
    actions: StoredValue<mpsc::UnboundedSender<SessionAction>>,
}

impl SessionContext {
    fn send(&self, action: SessionAction) {
        self.actions.with_value(|tx| {
            if tx.unbounded_send(action).is_err() {
                log::warn!("session action loop is gone");
            }
        });
    }

    /// 打开钱包授权窗口
    pub fn connect(&self) {
        if !self.connecting.get_untracked() {
            self.send(SessionAction::Connect);
        }
    }

    pub fn disconnect(&self) {
        self.send(SessionAction::Disconnect);
    }

    /// 实际生效的网络
    pub fn active_chain(&self) -> ChainId {
        let fallback = self.config.with_value(|c| c.fallback_chain);
        self.network.with(|n| n.chain_id).unwrap_or(fallback)
    }

    pub fn is_supported(&self, chain_id: ChainId) -> bool {
        self.config.with_value(|c| c.is_supported(chain_id))
    }

    /// 支持的网络名称，未知网络以链 ID 表示
    pub fn supported_network_names(&self) -> Vec<String> {
        self.config.with_value(|c| {
            c.supported_chains
                .iter()
                .map(|id| match EthNetwork::from_chain_id(*id) {
                    Some(network) => network.name().to_string(),
                    None => format!("chain {}", id),
                })
                .collect()
        })
    }

    pub fn account(&self) -> Option<String> {
        self.network.with(|n| n.account.clone())
    }

    pub fn toggle_dark_mode(&self) {
        self.preferences.update(|p| p.dark_mode = !p.dark_mode);
    }

    pub fn toggle_usd(&self) {
        self.preferences.update(|p| p.usd_toggle = !p.usd_toggle);
    }

    pub fn set_slippage(&self, tolerance: f64) {
        self.preferences.update(|p| p.slippage_tolerance = tolerance);
    }

    pub fn notify(&self, kind: NotificationKind, title: &str, message: &str) {
        let notification = Notification::new(
            uuid::Uuid::new_v4().to_string(),
            kind,
            title,
            message,
            Timestamp::new(js_sys::Date::now() as i64),
        );
        self.preferences.update(|p| p.push_notification(notification));
    }

    pub fn mark_read(&self, id: &str) {
        self.preferences.update(|p| {
            p.mark_read(id);
        });
    }

    pub fn clear_notifications(&self) {
        self.preferences.update(UserPreferences::clear_notifications);
    }
}

/// 从 Context 获取会话上下文
pub fn use_session() -> SessionContext {
    use_context::<SessionContext>().expect("SessionContext should be provided")
}

// =========================================================
// 初始化
// =========================================================

/// 创建会话并启动
pub fn init_session(config: AppConfig, analytics: Arc<Dispatcher>) -> SessionContext {
    let wallet = InjectedWallet::new(config.auto_connect_timeout);
    let session = Rc::new(AppSession::new(&config, BrowserStorage, wallet, analytics));
    // 信号以恢复后的偏好为初值，等待钱包重连期间的修改不会以默认值为基础
    let preferences = session.hydrate();

    let (tx, rx) = mpsc::unbounded();
    let ctx = SessionContext {
        status: RwSignal::new(SessionStatus::Loading),
        network: RwSignal::new(NetworkState::default()),
        preferences: RwSignal::new(preferences),
        connecting: RwSignal::new(false),
        config: StoredValue::new(config),
        actions: StoredValue::new(tx),
    };
    provide_context(ctx);

    // 核心状态 -> 信号
    session.on_status_change(move |status| ctx.status.set(status));
    session
        .network()
        .subscribe(move |_, state| ctx.network.set(state.clone()));

    // 钱包事件 -> 观察者
    let on_chain = session.clone();
    let on_account = session.clone();
    InjectedWallet::listen(
        move |chain_id| {
            on_chain.network().set_network(chain_id);
        },
        move |account| {
            on_account.network().set_account(account);
        },
    );

    persist_preferences(session.clone(), ctx);
    apply_theme(ctx);

    let bootstrap = session.clone();
    spawn_local(async move {
        let status = bootstrap.start().await;
        ctx.network.set(bootstrap.network().snapshot());
        ctx.status.set(status);
    });

    spawn_local(run_actions(session, ctx, rx));

    ctx
}

/// 偏好变化即写入缓存；与核心一致时不写
fn persist_preferences(session: Rc<AppSession>, ctx: SessionContext) {
    Effect::new(move |_| {
        let prefs = ctx.preferences.get();
        if !session.is_hydrated() || session.preferences() == prefs {
            return;
        }
        if let Err(e) = session.update_preferences(|current| *current = prefs) {
            log::warn!("failed to persist preferences: {}", e);
        }
    });
}

/// 暗色模式切换文档主题
fn apply_theme(ctx: SessionContext) {
    Effect::new(move |_| {
        let dark = ctx.preferences.with(|p| p.dark_mode);
        let Some(root) = web_sys::window()
            .and_then(|w| w.document())
            .and_then(|d| d.document_element())
        else {
            return;
        };
        let _ = root.class_list().toggle_with_force("dark", dark);
    });
}

async fn run_actions(
    session: Rc<AppSession>,
    ctx: SessionContext,
    mut rx: mpsc::UnboundedReceiver<SessionAction>,
) {
    while let Some(action) = rx.next().await {
        match action {
            SessionAction::Connect => connect_wallet(&session, ctx).await,
            SessionAction::Disconnect => match session.disconnect() {
                Ok(prefs) => ctx.preferences.set(prefs),
                Err(e) => log::warn!("disconnect could not be persisted: {}", e),
            },
        }
    }
}

async fn connect_wallet(session: &AppSession, ctx: SessionContext) {
    let analytics = session.analytics().clone();
    analytics.record_wallet_event(WalletEvent::Click, None, None);

    if !InjectedWallet::is_available() {
        ctx.notify(
            NotificationKind::Error,
            "Wallet",
            "No browser wallet found. Install a wallet extension to continue.",
        );
        return;
    }

    ctx.connecting.set(true);
    analytics.record_wallet_event(WalletEvent::Popup, None, None);

    match session.wallet().request_connect().await {
        Ok(Some(state)) => {
            let identity = state.account.as_deref().and_then(InjectedWallet::identity);
            match session.connected(state) {
                Ok(prefs) => ctx.preferences.set(prefs),
                Err(e) => log::warn!("auto-login flag not persisted: {}", e),
            }
            analytics.record_wallet_event(WalletEvent::Connect, None, identity.as_ref());
            ctx.notify(NotificationKind::Success, "Wallet", "Wallet connected");
        }
        Ok(None) => log::info!("wallet returned no account"),
        Err(e) => {
            log::warn!("wallet connect failed: {}", e);
            ctx.notify(NotificationKind::Error, "Wallet", e.message());
        }
    }

    ctx.connecting.set(false);
}
