//! 页面组件
//!
//! 业务数据（报价、池子、持仓）不在本层范围内，页面只承载导航与会话相关的交互。

use crate::analytics::use_analytics;
use crate::session::use_session;
use crate::web::BrowserStorage;
use crate::web::router::{Link, use_router};
use leptos::prelude::*;
use serde_json::json;
use tidepool_shared::{ConversionEvent, NotificationKind, PreferenceStore};

/// 滑点预设
const SLIPPAGE_PRESETS: &[f64] = &[0.001, 0.005, 0.01];

fn format_percent(value: f64) -> String {
    let percent = value * 100.0;
    if (percent - percent.round()).abs() < f64::EPSILON {
        format!("{:.0}%", percent)
    } else {
        format!("{}%", (percent * 100.0).round() / 100.0)
    }
}

/// 读取查询串中的参数，值按 URL 编码解码，无法解码时原样返回
fn query_param(url: &str, name: &str) -> Option<String> {
    let (_, search) = tidepool_shared::route::split_url(url);
    search
        .trim_start_matches('?')
        .split('&')
        .filter_map(|pair| pair.split_once('='))
        .find(|(key, _)| *key == name)
        .map(|(_, value)| {
            urlencoding::decode(value)
                .map(|decoded| decoded.into_owned())
                .unwrap_or_else(|_| value.to_string())
        })
}

#[component]
fn PageCard(#[prop(into)] title: String, children: Children) -> impl IntoView {
    view! {
        <div class="card bg-base-100 shadow-xl">
            <div class="card-body">
                <h2 class="card-title">{title}</h2>
                {children()}
            </div>
        </div>
    }
}

// =========================================================
// 兑换
// =========================================================

#[component]
fn SlippageSelector() -> impl IntoView {
    let session = use_session();
    let current = move || session.preferences.with(|p| p.slippage_tolerance);

    let buttons = SLIPPAGE_PRESETS
        .iter()
        .map(|&preset| {
            view! {
                <button
                    class=move || {
                        if (current() - preset).abs() < f64::EPSILON {
                            "btn btn-sm btn-primary"
                        } else {
                            "btn btn-sm btn-outline"
                        }
                    }
                    on:click=move |_| session.set_slippage(preset)
                >
                    {format_percent(preset)}
                </button>
            }
        })
        .collect_view();

    view! {
        <div class="flex items-center gap-2">
            <span class="text-sm opacity-70">"Slippage tolerance"</span>
            {buttons}
        </div>
    }
}

#[component]
fn SwapInsights() -> impl IntoView {
    let analytics = use_analytics();
    let store = PreferenceStore::new(BrowserStorage);
    let open = RwSignal::new(store.insights_expanded());

    let toggle = move |_| {
        let next = !open.get_untracked();
        open.set(next);
        if let Err(e) = store.set_insights_expanded(next) {
            log::warn!("insights state not persisted: {}", e);
        }
        analytics.record_insight(next);
    };

    view! {
        <div class="collapse collapse-arrow bg-base-200">
            <input type="checkbox" prop:checked=move || open.get() on:change=toggle />
            <div class="collapse-title font-medium">"Insights"</div>
            <div class="collapse-content text-sm opacity-70">
                "Price history and pool depth for the selected pair."
            </div>
        </div>
    }
}

#[component]
pub fn SwapPage() -> impl IntoView {
    let session = use_session();
    let analytics = use_analytics();
    let current = use_router().current();

    let from = move || current.with(|s| query_param(&s.url, "from")).unwrap_or_else(|| "ETH".into());
    let to = move || current.with(|s| query_param(&s.url, "to")).unwrap_or_else(|| "BNT".into());

    let on_swap = move |_| {
        analytics.record_conversion_event(
            ConversionEvent::Click,
            Some(json!({ "from": from(), "to": to() })),
        );
        if session.account().is_none() {
            session.connect();
        } else {
            session.notify(
                NotificationKind::Pending,
                "Swap",
                &format!("Swapping {} for {}", from(), to()),
            );
        }
    };

    view! {
        <div class="max-w-md mx-auto space-y-4">
            <PageCard title="Swap">
                <div class="flex justify-between">
                    <span class="badge badge-lg">{from}</span>
                    <span>"->"</span>
                    <span class="badge badge-lg">{to}</span>
                </div>
                <SlippageSelector />
                <button class="btn btn-primary w-full" on:click=on_swap>
                    {move || if session.account().is_some() { "Swap" } else { "Connect Wallet" }}
                </button>
            </PageCard>
            <SwapInsights />
        </div>
    }
}

// =========================================================
// 其余页面
// =========================================================

#[component]
pub fn TokensPage() -> impl IntoView {
    let session = use_session();
    let currency = move || {
        if session.preferences.with(|p| p.usd_toggle) {
            "USD"
        } else {
            "ETH"
        }
    };

    view! {
        <PageCard title="Tokens">
            <p class="opacity-70">"Prices shown in " {currency}</p>
        </PageCard>
    }
}

#[component]
pub fn PoolsPage() -> impl IntoView {
    view! {
        <PageCard title="Pools">
            <p class="opacity-70">"Provide liquidity to earn fees and rewards."</p>
            <div class="card-actions">
                <Link to="/pools/add-liquidity/eth-bnt" class=Signal::derive(|| "btn btn-primary".to_string())>
                    "Add Liquidity"
                </Link>
            </div>
        </PageCard>
    }
}

#[component]
pub fn AddLiquidityPage(#[prop(into)] pool_id: String) -> impl IntoView {
    view! {
        <PageCard title="Add Liquidity">
            <p>"Pool " <code>{pool_id}</code></p>
        </PageCard>
    }
}

#[component]
pub fn PortfolioPage() -> impl IntoView {
    let session = use_session();

    view! {
        <PageCard title="Portfolio">
            <Show
                when=move || session.account().is_some()
                fallback=move || view! {
                    <button class="btn btn-primary" on:click=move |_| session.connect()>
                        "Connect Wallet"
                    </button>
                }
            >
                <div class="card-actions">
                    <Link to="/portfolio/rewards/claim" class=Signal::derive(|| "btn btn-outline".to_string())>
                        "Claim Rewards"
                    </Link>
                </div>
            </Show>
        </PageCard>
    }
}

#[component]
pub fn RewardsClaimPage() -> impl IntoView {
    view! {
        <PageCard title="Claim Rewards">
            <p class="opacity-70">"Withdraw accumulated rewards to your wallet."</p>
        </PageCard>
    }
}

#[component]
pub fn RewardsStakePage(#[prop(into)] pool_id: String) -> impl IntoView {
    view! {
        <PageCard title="Stake Rewards">
            <p>"Restake rewards into pool " <code>{pool_id}</code></p>
        </PageCard>
    }
}

#[component]
pub fn VotePage() -> impl IntoView {
    view! {
        <PageCard title="Vote">
            <p class="opacity-70">"Governance proposals."</p>
        </PageCard>
    }
}

#[component]
pub fn FiatPage() -> impl IntoView {
    view! {
        <PageCard title="Buy Crypto">
            <p class="opacity-70">"Buy crypto with a card or bank transfer."</p>
        </PageCard>
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_percent() {
        assert_eq!(format_percent(0.001), "0.1%");
        assert_eq!(format_percent(0.005), "0.5%");
        assert_eq!(format_percent(0.01), "1%");
    }

    #[test]
    fn test_query_param() {
        let url = "/?from=0xeth&to=0xbnt";
        assert_eq!(query_param(url, "from").as_deref(), Some("0xeth"));
        assert_eq!(query_param(url, "to").as_deref(), Some("0xbnt"));
        assert_eq!(query_param(url, "amount"), None);
        assert_eq!(query_param("/", "from"), None);
    }

    #[test]
    fn test_query_param_decodes_value() {
        let url = "/?from=Wrapped%20ETH&to=%E6%B5%8B%E8%AF%95";
        assert_eq!(query_param(url, "from").as_deref(), Some("Wrapped ETH"));
        assert_eq!(query_param(url, "to").as_deref(), Some("测试"));
        // 非法的 UTF-8 序列原样保留
        assert_eq!(query_param("/?from=%FF", "from").as_deref(), Some("%FF"));
    }
}
