use super::*;
use crate::analytics::tests::RecordingSink;
use crate::error::SessionError;
use crate::keys;
use crate::preferences::{MemoryStore, NotificationKind};
use crate::date::Timestamp;
use std::pin::Pin;
use std::time::Duration;
use tokio::sync::oneshot;

// =========================================================
// Mock 钱包
// =========================================================

struct MockWallet {
    result: RefCell<Option<SessionResult<Option<NetworkState>>>>,
    calls: Cell<u32>,
}

impl MockWallet {
    fn returning(result: SessionResult<Option<NetworkState>>) -> Self {
        Self {
            result: RefCell::new(Some(result)),
            calls: Cell::new(0),
        }
    }

    fn connected(chain: u64, account: &str) -> Self {
        Self::returning(Ok(Some(NetworkState {
            chain_id: Some(ChainId(chain)),
            account: Some(account.to_string()),
        })))
    }

    fn unused() -> Self {
        Self::returning(Ok(None))
    }
}

#[async_trait(?Send)]
impl WalletConnector for MockWallet {
    async fn auto_connect(&self) -> SessionResult<Option<NetworkState>> {
        self.calls.set(self.calls.get() + 1);
        self.result.borrow_mut().take().unwrap_or(Ok(None))
    }
}

/// 在测试释放之前一直挂起的钱包
struct GatedWallet {
    gate: RefCell<Option<oneshot::Receiver<Option<NetworkState>>>>,
}

impl GatedWallet {
    fn new() -> (oneshot::Sender<Option<NetworkState>>, Self) {
        let (tx, rx) = oneshot::channel();
        (
            tx,
            Self {
                gate: RefCell::new(Some(rx)),
            },
        )
    }
}

#[async_trait(?Send)]
impl WalletConnector for GatedWallet {
    async fn auto_connect(&self) -> SessionResult<Option<NetworkState>> {
        let rx = self.gate.borrow_mut().take();
        match rx {
            Some(rx) => Ok(rx.await.unwrap_or(None)),
            None => Ok(None),
        }
    }
}


fn config() -> AppConfig {
    AppConfig {
        tag_manager_id: "GTM-TEST".to_string(),
        supported_chains: vec![ChainId(1), ChainId(3)],
        fallback_chain: ChainId(1),
        auto_connect_timeout: Duration::from_millis(100),
    }
}

fn session<W: WalletConnector>(
    store: MemoryStore,
    wallet: W,
) -> SessionBootstrap<MemoryStore, W, RecordingSink> {
    let analytics = Arc::new(AnalyticsDispatcher::new(
        RecordingSink::new(),
        PreferenceStore::new(store.clone()),
        "GTM-TEST",
    ));
    SessionBootstrap::new(&config(), store, wallet, analytics)
}

fn with_auto_login() -> MemoryStore {
    MemoryStore::new().with_entry(keys::AUTO_LOGIN, "true")
}

// =========================================================
// 状态推导
// =========================================================

#[test]
fn test_derive_status() {
    let supported = [ChainId(1), ChainId(3)];

    assert_eq!(
        SessionStatus::derive(false, Some(ChainId(1)), &supported),
        SessionStatus::Loading
    );
    assert_eq!(
        SessionStatus::derive(true, Some(ChainId(3)), &supported),
        SessionStatus::Ready
    );
    assert_eq!(
        SessionStatus::derive(true, Some(ChainId(9999)), &supported),
        SessionStatus::UnsupportedNetwork
    );
    // 没有网络上报不算不受支持
    assert_eq!(
        SessionStatus::derive(true, None, &supported),
        SessionStatus::Ready
    );
}

// =========================================================
// 启动流程
// =========================================================

#[test]
fn test_initial_status_is_loading() {
    let s = session(MemoryStore::new(), MockWallet::unused());
    assert_eq!(s.status(), SessionStatus::Loading);
}

#[tokio::test]
async fn test_without_auto_login_skips_wallet() {
    let s = session(MemoryStore::new(), MockWallet::unused());

    assert_eq!(s.start().await, SessionStatus::Ready);
    assert_eq!(s.wallet.calls.get(), 0);
}

#[tokio::test]
async fn test_auto_login_reconnects_on_supported_chain() {
    let s = session(with_auto_login(), MockWallet::connected(1, "0xabc"));

    assert_eq!(s.start().await, SessionStatus::Ready);
    assert_eq!(s.wallet.calls.get(), 1);
    assert_eq!(s.network().account().as_deref(), Some("0xabc"));
    assert_eq!(s.network().active_chain(), ChainId(1));
}

#[tokio::test]
async fn test_auto_login_on_unsupported_chain() {
    let s = session(with_auto_login(), MockWallet::connected(9999, "0xabc"));
    assert_eq!(s.start().await, SessionStatus::UnsupportedNetwork);
}

#[tokio::test]
async fn test_failed_auto_connect_still_ready() {
    let wallet = MockWallet::returning(Err(SessionError::timeout("wallet did not answer")));
    let s = session(with_auto_login(), wallet);

    assert_eq!(s.start().await, SessionStatus::Ready);
    assert_eq!(s.wallet.calls.get(), 1);
    assert_eq!(s.network().account(), None);
    assert_eq!(s.network().active_chain(), ChainId(1));
}

#[tokio::test]
async fn test_no_authorized_account_still_ready() {
    let s = session(with_auto_login(), MockWallet::returning(Ok(None)));
    assert_eq!(s.start().await, SessionStatus::Ready);
}

#[tokio::test]
async fn test_start_runs_once() {
    let s = session(with_auto_login(), MockWallet::connected(1, "0xabc"));
    s.start().await;
    s.start().await;
    assert_eq!(s.wallet.calls.get(), 1);
}

/// 推进启动流程直到挂起在钱包重连上
async fn poll_until_waiting(start: &mut Pin<&mut impl Future<Output = SessionStatus>>) {
    let pending = tokio::time::timeout(Duration::from_millis(20), start.as_mut()).await;
    assert!(pending.is_err(), "start should wait for the wallet");
}

#[tokio::test]
async fn test_reported_network_settles_while_reconnect_pending() {
    let (release, wallet) = GatedWallet::new();
    let s = session(with_auto_login(), wallet);

    let start = s.start();
    tokio::pin!(start);
    poll_until_waiting(&mut start).await;
    assert_eq!(s.status(), SessionStatus::Loading);

    s.network().set_network(Some(ChainId(1)));
    assert_eq!(s.status(), SessionStatus::Ready);

    release.send(None).unwrap();
    assert_eq!(start.await, SessionStatus::Ready);
}

#[tokio::test]
async fn test_unsupported_network_while_reconnect_pending() {
    let (release, wallet) = GatedWallet::new();
    let s = session(with_auto_login(), wallet);

    let start = s.start();
    tokio::pin!(start);
    poll_until_waiting(&mut start).await;

    s.network().set_network(Some(ChainId(9999)));
    assert_eq!(s.status(), SessionStatus::UnsupportedNetwork);

    release.send(None).unwrap();
    assert_eq!(start.await, SessionStatus::UnsupportedNetwork);
}

// =========================================================
// 网络切换
// =========================================================

#[tokio::test]
async fn test_network_switch_toggles_status() {
    let s = session(MemoryStore::new(), MockWallet::unused());
    s.start().await;

    let seen = Rc::new(RefCell::new(Vec::new()));
    let sink = seen.clone();
    s.on_status_change(move |status| sink.borrow_mut().push(status));

    s.network().set_network(Some(ChainId(9999)));
    assert_eq!(s.status(), SessionStatus::UnsupportedNetwork);

    s.network().set_network(Some(ChainId(1)));
    assert_eq!(s.status(), SessionStatus::Ready);

    // 相同的网络不会重复触发
    s.network().set_network(Some(ChainId(1)));

    assert_eq!(
        *seen.borrow(),
        vec![SessionStatus::UnsupportedNetwork, SessionStatus::Ready]
    );
}

// =========================================================
// 偏好恢复
// =========================================================

#[tokio::test]
async fn test_preferences_hydrated_on_start() {
    let store = MemoryStore::new()
        .with_entry(keys::SLIPPAGE_TOLERANCE, "0.01")
        .with_entry(keys::DARK_MODE, "true");
    let s = session(store, MockWallet::unused());

    assert_eq!(s.preferences().slippage_tolerance, DEFAULT_SLIPPAGE);
    assert!(!s.is_hydrated());
    s.start().await;
    assert!(s.is_hydrated());

    let prefs = s.preferences();
    assert_eq!(prefs.slippage_tolerance, 0.01);
    assert!(prefs.dark_mode);
    assert!(!prefs.usd_toggle);
}

#[tokio::test]
async fn test_changes_during_pending_reconnect_keep_saved_values() {
    let store = with_auto_login()
        .with_entry(keys::SLIPPAGE_TOLERANCE, "0.01")
        .with_entry(keys::DARK_MODE, "true");
    let (release, wallet) = GatedWallet::new();
    let s = session(store.clone(), wallet);

    // UI 在启动前拿到恢复后的偏好
    let seeded = s.hydrate();
    assert_eq!(seeded.slippage_tolerance, 0.01);
    assert!(seeded.dark_mode);

    let start = s.start();
    tokio::pin!(start);
    poll_until_waiting(&mut start).await;
    assert_eq!(s.status(), SessionStatus::Loading);

    let mut edited = seeded;
    edited.usd_toggle = true;
    s.update_preferences(|current| *current = edited).unwrap();

    assert_eq!(store.get(keys::SLIPPAGE_TOLERANCE).as_deref(), Some("0.01"));
    assert_eq!(store.get(keys::DARK_MODE).as_deref(), Some("true"));
    assert_eq!(store.get(keys::AUTO_LOGIN).as_deref(), Some("true"));
    assert_eq!(store.get(keys::USD_TOGGLE).as_deref(), Some("true"));

    release.send(None).unwrap();
    assert_eq!(start.await, SessionStatus::Ready);
    // 启动完成不会再次恢复覆盖内存中的修改
    assert!(s.preferences().usd_toggle);
    assert_eq!(s.preferences().slippage_tolerance, 0.01);
}

#[tokio::test]
async fn test_hydrate_runs_once() {
    let store = MemoryStore::new().with_entry(keys::DARK_MODE, "true");
    let s = session(store.clone(), MockWallet::unused());

    assert!(s.hydrate().dark_mode);
    store.set(keys::DARK_MODE, "false");
    assert!(s.hydrate().dark_mode);
    s.start().await;
    assert!(s.preferences().dark_mode);
}

const DEFAULT_SLIPPAGE: f64 = crate::preferences::DEFAULT_SLIPPAGE_TOLERANCE;

#[tokio::test]
async fn test_update_preferences_persists() {
    let store = MemoryStore::new();
    let s = session(store.clone(), MockWallet::unused());
    s.start().await;

    s.update_preferences(|p| p.usd_toggle = true).unwrap();

    assert_eq!(store.get(keys::USD_TOGGLE).as_deref(), Some("true"));
    assert!(s.preferences().usd_toggle);
}

#[tokio::test]
async fn test_push_notification_persists_list() {
    let store = MemoryStore::new();
    let s = session(store.clone(), MockWallet::unused());
    s.start().await;

    s.push_notification(Notification::new(
        "n-1",
        NotificationKind::Success,
        "Swap",
        "done",
        Timestamp::new(10),
    ))
    .unwrap();

    let restored: Vec<Notification> = s.store().get(keys::NOTIFICATIONS).unwrap();
    assert_eq!(restored.len(), 1);
    assert_eq!(restored[0].id, "n-1");
    // 只写入通知列表
    assert_eq!(store.get(keys::DARK_MODE), None);
}

// =========================================================
// 账户与埋点
// =========================================================

#[tokio::test]
async fn test_analytics_initialized_once_across_account_changes() {
    let s = session(with_auto_login(), MockWallet::connected(1, "0xabc"));
    s.start().await;

    s.network().set_account(Some("0xdef".to_string()));
    s.network().set_account(None);

    assert!(s.analytics().is_initialized());
    assert_eq!(s.analytics().sink().injected.borrow().len(), 1);
}

#[tokio::test]
async fn test_connect_and_disconnect_toggle_auto_login() {
    let store = MemoryStore::new();
    let s = session(store.clone(), MockWallet::unused());
    s.start().await;

    let prefs = s
        .connected(NetworkState {
            chain_id: Some(ChainId(3)),
            account: Some("0xabc".to_string()),
        })
        .unwrap();
    assert!(prefs.auto_login);
    assert!(s.store().auto_login());
    assert_eq!(s.status(), SessionStatus::Ready);

    let prefs = s.disconnect().unwrap();
    assert!(!prefs.auto_login);
    assert!(!s.store().auto_login());
    assert_eq!(s.network().account(), None);
}
