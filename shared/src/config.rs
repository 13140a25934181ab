//! 运行时配置
//!
//! 通过 `ConfigSource` 读取变量，读不到时使用默认值，实现配置与宿主环境解耦。

use crate::chain::{ChainId, EthNetwork};
use std::time::Duration;

/// 这些是默认值，配置源中没有定义时使用
const DEFAULT_TAG_MANAGER_ID: &str = "GTM-TIDEPOOL";
const DEFAULT_AUTO_CONNECT_TIMEOUT_MS: u64 = 3_000;

pub const VAR_TAG_MANAGER_ID: &str = "TIDEPOOL_GTM_ID";
pub const VAR_SUPPORTED_CHAINS: &str = "TIDEPOOL_SUPPORTED_CHAINS";
pub const VAR_FALLBACK_CHAIN: &str = "TIDEPOOL_FALLBACK_CHAIN";
pub const VAR_AUTO_CONNECT_TIMEOUT_MS: &str = "TIDEPOOL_AUTO_CONNECT_TIMEOUT_MS";

/// 抽象配置源接口
pub trait ConfigSource {
    fn var(&self, name: &str) -> Option<String>;
}

#[derive(Debug, Clone, PartialEq)]
pub struct AppConfig {
    /// 第三方 Tag Manager 容器 ID
    pub tag_manager_id: String,
    /// 支持的网络集合
    pub supported_chains: Vec<ChainId>,
    /// 钱包未上报网络时的回退网络
    pub fallback_chain: ChainId,
    /// 静默重连钱包的最长等待时间
    pub auto_connect_timeout: Duration,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            tag_manager_id: DEFAULT_TAG_MANAGER_ID.to_string(),
            supported_chains: vec![
                EthNetwork::Mainnet.chain_id(),
                EthNetwork::Ropsten.chain_id(),
            ],
            fallback_chain: EthNetwork::Mainnet.chain_id(),
            auto_connect_timeout: Duration::from_millis(DEFAULT_AUTO_CONNECT_TIMEOUT_MS),
        }
    }
}

impl AppConfig {
    pub fn from_source(source: &impl ConfigSource) -> Self {
        let defaults = Self::default();

        let tag_manager_id = source
            .var(VAR_TAG_MANAGER_ID)
            .filter(|v| !v.trim().is_empty())
            .unwrap_or(defaults.tag_manager_id);

        // 列表中无法解析的项被忽略；整体为空则回到默认集合
        let supported_chains = source
            .var(VAR_SUPPORTED_CHAINS)
            .map(|raw| {
                raw.split(',')
                    .filter_map(ChainId::parse)
                    .collect::<Vec<_>>()
            })
            .filter(|list| !list.is_empty())
            .unwrap_or(defaults.supported_chains);

        let fallback_chain = source
            .var(VAR_FALLBACK_CHAIN)
            .and_then(|raw| ChainId::parse(&raw))
            .unwrap_or(defaults.fallback_chain);

        let auto_connect_timeout = source
            .var(VAR_AUTO_CONNECT_TIMEOUT_MS)
            .and_then(|raw| raw.trim().parse::<u64>().ok())
            .map(Duration::from_millis)
            .unwrap_or(defaults.auto_connect_timeout);

        Self {
            tag_manager_id,
            supported_chains,
            fallback_chain,
            auto_connect_timeout,
        }
    }

    pub fn is_supported(&self, chain_id: ChainId) -> bool {
        chain_id.is_supported(&self.supported_chains)
    }
}
