//! 网络 / 账户观察者
//!
//! 持有当前钱包上报的 `chain_id` 与 `account`，是 `NetworkState` 的唯一所有者。
//! 其他组件只能通过订阅读取变化。

use serde::{Deserialize, Serialize};
use std::cell::{Cell, RefCell};
use std::fmt;
use std::rc::Rc;

/// 区块链网络 ID
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ChainId(pub u64);

impl ChainId {
    /// 解析 EIP-1193 返回的十六进制字符串（如 `"0x1"`），也接受十进制
    pub fn parse(raw: &str) -> Option<Self> {
        let raw = raw.trim();
        let value = match raw.strip_prefix("0x").or_else(|| raw.strip_prefix("0X")) {
            Some(hex) => u64::from_str_radix(hex, 16).ok()?,
            None => raw.parse().ok()?,
        };
        Some(Self(value))
    }

    pub fn is_supported(&self, supported: &[ChainId]) -> bool {
        supported.contains(self)
    }
}

impl fmt::Display for ChainId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// 已知的以太坊网络
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EthNetwork {
    Mainnet,
    Ropsten,
}

impl EthNetwork {
    pub const fn chain_id(&self) -> ChainId {
        match self {
            EthNetwork::Mainnet => ChainId(1),
            EthNetwork::Ropsten => ChainId(3),
        }
    }

    pub fn from_chain_id(id: ChainId) -> Option<Self> {
        match id.0 {
            1 => Some(EthNetwork::Mainnet),
            3 => Some(EthNetwork::Ropsten),
            _ => None,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            EthNetwork::Mainnet => "Ethereum",
            EthNetwork::Ropsten => "Ropsten",
        }
    }
}

/// 当前网络状态
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NetworkState {
    /// 钱包上报的网络，未连接时为 None
    pub chain_id: Option<ChainId>,
    /// 当前账户地址
    pub account: Option<String>,
}

/// 触发通知的字段
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NetworkChange {
    Network,
    Account,
}

type Listener = Rc<dyn Fn(NetworkChange, &NetworkState)>;

/// 订阅句柄，用于取消订阅
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SubscriptionId(u64);

/// 网络 / 账户观察者
///
/// 单线程环境使用，内部以 `RefCell` 持有状态。
pub struct NetworkObserver {
    state: RefCell<NetworkState>,
    /// 无钱包上报网络时使用的回退网络
    fallback: ChainId,
    listeners: RefCell<Vec<(SubscriptionId, Listener)>>,
    next_id: Cell<u64>,
}

impl NetworkObserver {
    pub fn new(fallback: ChainId) -> Self {
        Self {
            state: RefCell::new(NetworkState::default()),
            fallback,
            listeners: RefCell::new(Vec::new()),
            next_id: Cell::new(0),
        }
    }

    /// 当前状态快照
    pub fn snapshot(&self) -> NetworkState {
        self.state.borrow().clone()
    }

    /// 钱包上报的网络（可能不存在）
    pub fn reported_chain(&self) -> Option<ChainId> {
        self.state.borrow().chain_id
    }

    /// 实际生效的网络：钱包上报的网络，否则回退网络
    pub fn active_chain(&self) -> ChainId {
        self.reported_chain().unwrap_or(self.fallback)
    }

    pub fn account(&self) -> Option<String> {
        self.state.borrow().account.clone()
    }

    /// 设置网络，值未变化时不通知
    pub fn set_network(&self, chain_id: Option<ChainId>) -> bool {
        {
            let mut state = self.state.borrow_mut();
            if state.chain_id == chain_id {
                return false;
            }
            state.chain_id = chain_id;
        }
        log::debug!("network changed: {:?}", chain_id);
        self.notify(NetworkChange::Network);
        true
    }

    /// 设置账户，值未变化时不通知。空字符串视为断开
    pub fn set_account(&self, account: Option<String>) -> bool {
        let account = account.filter(|a| !a.is_empty());
        {
            let mut state = self.state.borrow_mut();
            if state.account == account {
                return false;
            }
            state.account = account;
        }
        log::debug!("account changed");
        self.notify(NetworkChange::Account);
        true
    }

    pub fn subscribe(&self, listener: impl Fn(NetworkChange, &NetworkState) + 'static) -> SubscriptionId {
        let id = SubscriptionId(self.next_id.get());
        self.next_id.set(id.0 + 1);
        self.listeners.borrow_mut().push((id, Rc::new(listener)));
        id
    }

    pub fn unsubscribe(&self, id: SubscriptionId) -> bool {
        let mut listeners = self.listeners.borrow_mut();
        let before = listeners.len();
        listeners.retain(|(sid, _)| *sid != id);
        listeners.len() != before
    }

    fn notify(&self, change: NetworkChange) {
        // 先复制一份，允许回调中再订阅或修改状态
        let listeners: Vec<Listener> = self
            .listeners
            .borrow()
            .iter()
            .map(|(_, l)| l.clone())
            .collect();
        let snapshot = self.snapshot();
        for listener in listeners {
            listener(change, &snapshot);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_chain_id() {
        assert_eq!(ChainId::parse("0x1"), Some(ChainId(1)));
        assert_eq!(ChainId::parse("0x3"), Some(ChainId(3)));
        assert_eq!(ChainId::parse("0x270f"), Some(ChainId(9999)));
        assert_eq!(ChainId::parse("137"), Some(ChainId(137)));
        assert_eq!(ChainId::parse("0xzz"), None);
        assert_eq!(ChainId::parse(""), None);
    }

    #[test]
    fn test_active_chain_falls_back() {
        let observer = NetworkObserver::new(EthNetwork::Mainnet.chain_id());
        assert_eq!(observer.reported_chain(), None);
        assert_eq!(observer.active_chain(), ChainId(1));

        observer.set_network(Some(ChainId(3)));
        assert_eq!(observer.active_chain(), ChainId(3));

        observer.set_network(None);
        assert_eq!(observer.active_chain(), ChainId(1));
    }

    #[test]
    fn test_notifies_only_on_change() {
        let observer = NetworkObserver::new(ChainId(1));
        let seen = Rc::new(RefCell::new(Vec::new()));
        let sink = seen.clone();
        observer.subscribe(move |change, state| {
            sink.borrow_mut().push((change, state.clone()));
        });

        assert!(observer.set_network(Some(ChainId(1))));
        assert!(!observer.set_network(Some(ChainId(1))));
        assert!(observer.set_account(Some("0xabc".to_string())));
        assert!(!observer.set_account(Some("0xabc".to_string())));
        assert!(observer.set_account(Some(String::new())));

        let seen = seen.borrow();
        assert_eq!(seen.len(), 3);
        assert_eq!(seen[0].0, NetworkChange::Network);
        assert_eq!(seen[1].1.account.as_deref(), Some("0xabc"));
        assert_eq!(seen[2].1.account, None);
    }

    #[test]
    fn test_unsubscribe() {
        let observer = NetworkObserver::new(ChainId(1));
        let count = Rc::new(Cell::new(0));
        let c = count.clone();
        let id = observer.subscribe(move |_, _| c.set(c.get() + 1));

        observer.set_network(Some(ChainId(3)));
        assert!(observer.unsubscribe(id));
        assert!(!observer.unsubscribe(id));
        observer.set_network(Some(ChainId(1)));

        assert_eq!(count.get(), 1);
    }

    #[test]
    fn test_supported_set() {
        let supported = [EthNetwork::Mainnet.chain_id(), EthNetwork::Ropsten.chain_id()];
        assert!(ChainId(1).is_supported(&supported));
        assert!(!ChainId(9999).is_supported(&supported));
        assert_eq!(EthNetwork::from_chain_id(ChainId(3)), Some(EthNetwork::Ropsten));
        assert_eq!(EthNetwork::from_chain_id(ChainId(56)), None);
    }
}
