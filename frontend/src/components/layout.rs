//! 布局外壳：侧边栏、移动端滑出菜单、顶部栏

use crate::components::notifications::NotificationMenu;
use crate::session::use_session;
use crate::web::router::{Link, use_router};
use leptos::prelude::*;
use tidepool_shared::EthNetwork;

const NAV_ITEMS: &[(&str, &str)] = &[
    ("/", "Swap"),
    ("/tokens", "Tokens"),
    ("/pools", "Pools"),
    ("/portfolio", "Portfolio"),
    ("/vote", "Vote"),
    ("/fiat", "Fiat"),
];

/// 当前路径是否属于某个导航项
fn is_active(current: &str, item: &str) -> bool {
    if item == "/" {
        current == "/"
    } else {
        current == item || current.starts_with(&format!("{}/", item))
    }
}

/// 按字符截取首尾，不在多字节字符中间切分
fn short_address(address: &str) -> String {
    let chars: Vec<char> = address.chars().collect();
    if chars.len() <= 10 {
        return address.to_string();
    }
    let head: String = chars[..6].iter().collect();
    let tail: String = chars[chars.len() - 4..].iter().collect();
    format!("{}...{}", head, tail)
}

/// 侧边栏
#[component]
pub fn Sidebar(
    minimized: RwSignal<bool>,
    /// 移动端滑出菜单的开关，点击导航后关闭
    #[prop(optional)]
    slideover_open: Option<RwSignal<bool>>,
) -> impl IntoView {
    let path = use_router().path();

    let items = NAV_ITEMS
        .iter()
        .map(|(to, label)| {
            let to = *to;
            let label = *label;
            let class = Signal::derive(move || {
                if is_active(&path.get(), to) {
                    "flex items-center gap-3 px-4 py-2 rounded-lg bg-primary text-primary-content"
                        .to_string()
                } else {
                    "flex items-center gap-3 px-4 py-2 rounded-lg hover:bg-base-300".to_string()
                }
            });
            view! {
                <li on:click=move |_| {
                    if let Some(open) = slideover_open {
                        open.set(false);
                    }
                }>
                    <Link to=to class=class>
                        <span class="font-semibold">{&label[..1]}</span>
                        <Show when=move || !minimized.get()>
                            <span>{label}</span>
                        </Show>
                    </Link>
                </li>
            }
        })
        .collect_view();

    view! {
        <aside class=move || {
            if minimized.get() {
                "fixed top-0 left-0 h-screen w-[66px] bg-base-100 shadow-xl transition-all duration-500"
            } else {
                "fixed top-0 left-0 h-screen w-[200px] bg-base-100 shadow-xl transition-all duration-500"
            }
        }>
            <div class="flex items-center justify-between p-4">
                <Show when=move || !minimized.get()>
                    <span class="text-xl font-bold">"Tidepool"</span>
                </Show>
                <button
                    class="btn btn-ghost btn-sm btn-square"
                    on:click=move |_| minimized.update(|m| *m = !*m)
                >
                    {move || if minimized.get() { ">" } else { "<" }}
                </button>
            </div>
            <ul class="menu gap-1 px-2">{items}</ul>
        </aside>
    }
}

/// 移动端滑出菜单
#[component]
pub fn Slideover(open: RwSignal<bool>, children: Children) -> impl IntoView {
    view! {
        <div class=move || {
            if open.get() { "fixed inset-0 z-40" } else { "hidden" }
        }>
            <div class="absolute inset-0 bg-black/40" on:click=move |_| open.set(false)></div>
            <div class="relative h-full">{children()}</div>
        </div>
    }
}

/// 网络徽标
#[component]
fn NetworkBadge() -> impl IntoView {
    let session = use_session();

    let label = move || {
        let chain = session.active_chain();
        match EthNetwork::from_chain_id(chain) {
            Some(network) => network.name().to_string(),
            None => format!("Chain {}", chain),
        }
    };
    let class = move || {
        if session.is_supported(session.active_chain()) {
            "badge badge-outline gap-2"
        } else {
            "badge badge-error gap-2"
        }
    };

    view! { <span class=class>{label}</span> }
}

/// 钱包按钮：未连接时发起连接，已连接时显示地址并可断开
#[component]
fn WalletButton() -> impl IntoView {
    let session = use_session();

    view! {
        {move || match session.account() {
            Some(account) => view! {
                <div class="dropdown dropdown-end">
                    <button class="btn btn-outline btn-sm">{short_address(&account)}</button>
                    <ul class="dropdown-content menu bg-base-100 rounded-box shadow w-40 mt-2">
                        <li>
                            <a on:click=move |_| session.disconnect()>"Disconnect"</a>
                        </li>
                    </ul>
                </div>
            }
            .into_any(),
            None => view! {
                <button
                    class="btn btn-primary btn-sm"
                    disabled=move || session.connecting.get()
                    on:click=move |_| session.connect()
                >
                    {move || if session.connecting.get() { "Connecting..." } else { "Connect Wallet" }}
                </button>
            }
            .into_any(),
        }}
    }
}

/// 顶部栏
#[component]
pub fn LayoutHeader(minimized: RwSignal<bool>, slideover_open: RwSignal<bool>) -> impl IntoView {
    let session = use_session();
    let dark = move || session.preferences.with(|p| p.dark_mode);
    let usd = move || session.preferences.with(|p| p.usd_toggle);

    view! {
        <header class=move || {
            if minimized.get() {
                "fixed top-0 right-0 left-0 md:left-[96px] z-30 transition-all duration-500"
            } else {
                "fixed top-0 right-0 left-0 md:left-[230px] z-30 transition-all duration-500"
            }
        }>
            <div class="navbar bg-base-100 rounded-box shadow-xl m-4">
                <div class="flex-1 gap-2">
                    <button
                        class="btn btn-ghost btn-square md:hidden"
                        on:click=move |_| slideover_open.set(true)
                    >
                        "="
                    </button>
                    <NetworkBadge />
                </div>
                <div class="flex-none gap-2">
                    <label class="label cursor-pointer gap-2">
                        <span class="label-text">"USD"</span>
                        <input
                            type="checkbox"
                            class="toggle toggle-sm"
                            prop:checked=usd
                            on:change=move |_| session.toggle_usd()
                        />
                    </label>
                    <button class="btn btn-ghost btn-sm" on:click=move |_| session.toggle_dark_mode()>
                        {move || if dark() { "Light" } else { "Dark" }}
                    </button>
                    <NotificationMenu />
                    <WalletButton />
                </div>
            </div>
        </header>
    }
}

/// 完整布局：导航 + 顶部栏 + 主内容
#[component]
pub fn Layout(children: Children) -> impl IntoView {
    let minimized = RwSignal::new(false);
    let slideover_open = RwSignal::new(false);

    view! {
        <nav class="hidden md:block">
            <Sidebar minimized=minimized />
        </nav>
        <nav class="md:hidden">
            <Slideover open=slideover_open>
                <Sidebar minimized=minimized slideover_open=slideover_open />
            </Slideover>
        </nav>
        <LayoutHeader minimized=minimized slideover_open=slideover_open />
        <div class=move || {
            if minimized.get() {
                "md:mr-[30px] pt-[110px] transition-all duration-500 md:ml-[96px]"
            } else {
                "md:mr-[30px] pt-[110px] transition-all duration-500 md:ml-[230px]"
            }
        }>
            <main class="max-w-[1400px] mx-auto mb-30 px-4">{children()}</main>
        </div>
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_nav_active_matching() {
        assert!(is_active("/", "/"));
        assert!(!is_active("/pools", "/"));
        assert!(is_active("/pools/add-liquidity/1", "/pools"));
        assert!(!is_active("/poolsx", "/pools"));
        assert!(is_active("/portfolio/rewards/claim", "/portfolio"));
    }

    #[test]
    fn test_short_address() {
        assert_eq!(
            short_address("0x1F573D6Fb3F13d689FF844B4cE37794d79a7FF1C"),
            "0x1F57...FF1C"
        );
        assert_eq!(short_address("0xabc"), "0xabc");
    }

    #[test]
    fn test_short_address_multibyte() {
        assert_eq!(short_address("0x账户地址甲乙丙丁戊己庚"), "0x账户地址...丁戊己庚");
        assert_eq!(short_address("钱包地址"), "钱包地址");
    }
}
