//! 注入式钱包（EIP-1193 `window.ethereum`）
//!
//! - 静默重连：`eth_accounts`，不会弹出授权窗口
//! - 交互连接：`eth_requestAccounts`
//! - 事件：`chainChanged` / `accountsChanged`

use crate::serde_helper::{from_value, js_error};
use crate::web::timer::with_timeout;
use async_trait::async_trait;
use std::time::Duration;
use tidepool_shared::{
    ChainId, NetworkState, SessionError, SessionErrorKind, SessionResult, WalletConnector,
    WalletIdentity,
};
use wasm_bindgen::prelude::*;

#[wasm_bindgen(inline_js = "
export function hasProvider() {
    return typeof window.ethereum !== 'undefined' && window.ethereum !== null;
}

export function providerName() {
    const p = window.ethereum;
    if (!p) return null;
    if (p.isMetaMask) return 'MetaMask';
    if (p.isCoinbaseWallet) return 'Coinbase Wallet';
    if (p.isBraveWallet) return 'Brave Wallet';
    return 'Injected';
}

export async function providerRequest(method) {
    if (!window.ethereum) {
        throw new Error('no injected provider');
    }
    return await window.ethereum.request({ method: method });
}

export function onProviderEvent(event, callback) {
    if (window.ethereum && typeof window.ethereum.on === 'function') {
        window.ethereum.on(event, callback);
    }
}
")]
extern "C" {
    #[wasm_bindgen(js_name = hasProvider)]
    fn has_provider() -> bool;

    #[wasm_bindgen(js_name = providerName)]
    fn provider_name() -> Option<String>;

    #[wasm_bindgen(js_name = providerRequest, catch)]
    async fn provider_request(method: &str) -> Result<JsValue, JsValue>;

    #[wasm_bindgen(js_name = onProviderEvent)]
    fn on_provider_event(event: &str, callback: &Closure<dyn Fn(JsValue)>);
}

async fn request(method: &str) -> SessionResult<JsValue> {
    provider_request(method)
        .await
        .map_err(|e| js_error(SessionErrorKind::Wallet, &e).in_op(method.to_string()))
}

fn parse_chain(value: &JsValue) -> Option<ChainId> {
    value
        .as_string()
        .and_then(|raw| ChainId::parse(&raw))
        .or_else(|| value.as_f64().map(|n| ChainId(n as u64)))
}

fn parse_accounts(value: JsValue) -> SessionResult<Option<String>> {
    let accounts: Vec<String> = from_value(value).map_err(|e| {
        SessionError::serialization(e.to_string()).in_op("wallet.parse_accounts")
    })?;
    Ok(accounts.into_iter().find(|a| !a.is_empty()))
}

/// 注入式钱包连接器
#[derive(Clone, Copy)]
pub struct InjectedWallet {
    timeout: Duration,
}

impl InjectedWallet {
    pub fn new(timeout: Duration) -> Self {
        Self { timeout }
    }

    pub fn is_available() -> bool {
        has_provider()
    }

    /// 当前钱包标识，未检测到钱包时为 None
    pub fn identity(account: &str) -> Option<WalletIdentity> {
        provider_name().map(|name| WalletIdentity::new(account, name))
    }

    async fn read_state(&self, accounts_method: &str) -> SessionResult<Option<NetworkState>> {
        let account = parse_accounts(request(accounts_method).await?)?;
        let Some(account) = account else {
            return Ok(None);
        };
        let chain_id = parse_chain(&request("eth_chainId").await?);

        Ok(Some(NetworkState {
            chain_id,
            account: Some(account),
        }))
    }

    /// 交互式连接，会弹出钱包授权窗口
    pub async fn request_connect(&self) -> SessionResult<Option<NetworkState>> {
        if !has_provider() {
            return Err(SessionError::wallet("no injected wallet found").in_op("wallet.connect"));
        }
        self.read_state("eth_requestAccounts").await
    }

    /// 订阅钱包的网络 / 账户变化
    ///
    /// 闭包被泄漏以保持监听器存活，应只调用一次。
    pub fn listen(
        on_chain: impl Fn(Option<ChainId>) + 'static,
        on_account: impl Fn(Option<String>) + 'static,
    ) {
        if !has_provider() {
            return;
        }

        let chain_closure = Closure::<dyn Fn(JsValue)>::new(move |value: JsValue| {
            on_chain(parse_chain(&value));
        });
        on_provider_event("chainChanged", &chain_closure);
        chain_closure.forget();

        let account_closure = Closure::<dyn Fn(JsValue)>::new(move |value: JsValue| {
            match parse_accounts(value) {
                Ok(account) => on_account(account),
                Err(e) => log::warn!("ignoring malformed accountsChanged payload: {}", e),
            }
        });
        on_provider_event("accountsChanged", &account_closure);
        account_closure.forget();
    }
}

#[async_trait(?Send)]
impl WalletConnector for InjectedWallet {
    async fn auto_connect(&self) -> SessionResult<Option<NetworkState>> {
        if !has_provider() {
            log::info!("no injected wallet, skipping auto-connect");
            return Ok(None);
        }

        match with_timeout(self.timeout, self.read_state("eth_accounts")).await {
            Some(result) => result,
            None => Err(SessionError::timeout(format!(
                "wallet did not answer within {}ms",
                self.timeout.as_millis()
            ))
            .in_op("wallet.auto_connect")),
        }
    }
}
