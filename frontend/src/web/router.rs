//! 路由服务模块 - 核心引擎
//!
//! 封装了 web_sys 的 History API，实现高内聚：
//! 所有对 window.history 的操作都集中在此模块。
//! 实现了"监听 -> 解析 -> 重定向 -> 加载"的导航流程，
//! 路由表与解析规则来自 `tidepool_shared::route`。

use leptos::prelude::*;
use tidepool_shared::Page;
use tidepool_shared::route::{Settled, settle};
use wasm_bindgen::prelude::*;

/// 获取当前浏览器 URL（path + search）
fn current_url() -> String {
    let Some(location) = web_sys::window().map(|w| w.location()) else {
        return "/".to_string();
    };
    let path = location.pathname().unwrap_or_else(|_| "/".to_string());
    let search = location.search().unwrap_or_default();
    format!("{}{}", path, search)
}

/// 推送 History 状态
fn push_history_state(url: &str) {
    if let Some(window) = web_sys::window() {
        if let Ok(history) = window.history() {
            let _ = history.push_state_with_url(&JsValue::NULL, "", Some(url));
        }
    }
}

/// 替换 History 状态（用于重定向）
fn replace_history_state(url: &str) {
    if let Some(window) = web_sys::window() {
        if let Ok(history) = window.history() {
            let _ = history.replace_state_with_url(&JsValue::NULL, "", Some(url));
        }
    }
}

/// 解析 URL，命中旧路径时用目标 URL 替换当前 History 记录
fn settle_and_replace(url: &str) -> Settled {
    let settled = settle(url);
    if settled.redirected {
        log::info!("[Router] Redirect {} -> {}", url, settled.url);
        replace_history_state(&settled.url);
    }
    settled
}

/// 路由器服务
///
/// 封装所有路由操作，通过 Signal 驱动界面更新。
#[derive(Clone, Copy)]
pub struct RouterService {
    /// 当前解析结果（只读信号）
    current: ReadSignal<Settled>,
    set_current: WriteSignal<Settled>,
}

impl RouterService {
    fn new() -> Self {
        // 首次加载同样经过解析，旧路径直接替换为规范路径
        let initial = settle_and_replace(&current_url());
        let (current, set_current) = signal(initial);
        Self {
            current,
            set_current,
        }
    }

    /// 当前解析结果信号
    pub fn current(&self) -> ReadSignal<Settled> {
        self.current
    }

    /// 当前页面，None 表示 404
    pub fn page(&self) -> Signal<Option<Page>> {
        let current = self.current;
        Signal::derive(move || current.with(|s| s.page.clone()))
    }

    /// 当前规范路径
    pub fn path(&self) -> Signal<String> {
        let current = self.current;
        Signal::derive(move || current.with(|s| s.path().to_string()))
    }

    /// **核心方法：导航**
    ///
    /// 旧路径不会进入 History，直接推入重定向后的 URL。
    pub fn navigate(&self, url: &str) {
        let settled = settle(url);
        if settled.url == self.current.with_untracked(|s| s.url.clone()) {
            return;
        }

        if settled.redirected {
            log::info!("[Router] Redirect {} -> {}", url, settled.url);
        }
        push_history_state(&settled.url);
        self.set_current.set(settled);
    }

    /// 初始化浏览器后退/前进按钮监听
    fn init_popstate_listener(&self) {
        let set_current = self.set_current;

        let closure = Closure::<dyn Fn()>::new(move || {
            let settled = settle_and_replace(&current_url());
            log::debug!("[Router] popstate -> {}", settled.url);
            set_current.set(settled);
        });

        if let Some(window) = web_sys::window() {
            let _ = window
                .add_event_listener_with_callback("popstate", closure.as_ref().unchecked_ref());
        }

        // 泄漏闭包以保持监听器存活
        closure.forget();
    }
}

/// 提供路由服务到 Context 并初始化
fn provide_router() -> RouterService {
    let router = RouterService::new();
    router.init_popstate_listener();
    provide_context(router);
    router
}

/// 从 Context 获取路由服务
pub fn use_router() -> RouterService {
    use_context::<RouterService>()
        .expect("RouterService not found in context. Ensure Router is provided.")
}

// ============================================================================
// UI 组件
// ============================================================================

/// 路由器根组件
///
/// 提供路由上下文，应在 App 根部使用。
#[component]
pub fn Router(children: Children) -> impl IntoView {
    provide_router();
    children()
}

/// 路由出口组件
///
/// 根据当前页面渲染对应的组件。
#[component]
pub fn RouterOutlet(
    /// 路由匹配函数：接收当前页面（None 为 404），返回对应视图
    matcher: fn(Option<Page>) -> AnyView,
) -> impl IntoView {
    let page = use_router().page();
    move || matcher(page.get())
}

/// 应用内链接，点击时不刷新页面
///
/// 带修饰键的点击交给浏览器处理（新标签页等）。
#[component]
pub fn Link(
    #[prop(into)] to: String,
    #[prop(optional)] class: Option<Signal<String>>,
    children: Children,
) -> impl IntoView {
    let router = use_router();

    let target = to.clone();
    let on_click = move |ev: web_sys::MouseEvent| {
        if ev.ctrl_key() || ev.meta_key() || ev.shift_key() || ev.button() != 0 {
            return;
        }
        ev.prevent_default();
        router.navigate(&target);
    };

    view! {
        <a href=to class=move || class.map(|c| c.get()).unwrap_or_default() on:click=on_click>
            {children()}
        </a>
    }
}
