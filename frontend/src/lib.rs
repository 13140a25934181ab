//! Tidepool 前端应用
//!
//! 采用 Context-Driven 的高内聚低耦合架构：
//! - `web::router`: 路由服务（History 引擎），路由表来自共享核心
//! - `session`: 会话上下文与启动编排
//! - `wallet`: 注入式钱包
//! - `analytics`: Tag Manager 事件出口
//! - `components`: UI 组件层

mod analytics;
mod components {
    pub mod layout;
    pub mod notifications;
    pub mod pages;
    pub mod status;
}
mod serde_helper;
mod session;
mod wallet;

use crate::analytics::{DataLayerSink, Dispatcher, provide_analytics, use_analytics};
use crate::components::layout::Layout;
use crate::components::notifications::NotificationAlerts;
use crate::components::pages::*;
use crate::components::status::{LoadingPage, NotFoundPage, UnsupportedNetworkPage};
use crate::session::{BuildEnv, init_session, use_session};

use leptos::prelude::*;
use std::sync::Arc;
use tidepool_shared::{AppConfig, Page, PreferenceStore, SessionStatus};

// 原生 Web API 封装模块
// 此模块提供对浏览器原生 API 的轻量级封装，替代 gloo-* 系列 crate，
// 以减小 WASM 二进制体积。
pub(crate) mod web {
    pub mod router;
    mod storage;
    pub mod timer;

    pub use storage::BrowserStorage;
}

use web::router::{Router, RouterOutlet, use_router};

/// 路由匹配函数
///
/// 根据解析出的页面返回对应的视图组件，None 为 404。
fn route_matcher(page: Option<Page>) -> AnyView {
    let Some(page) = page else {
        return view! { <NotFoundPage /> }.into_any();
    };

    match page {
        Page::Swap => view! { <SwapPage /> }.into_any(),
        Page::Tokens => view! { <TokensPage /> }.into_any(),
        Page::Pools => view! { <PoolsPage /> }.into_any(),
        Page::AddLiquidity { pool_id } => view! { <AddLiquidityPage pool_id=pool_id /> }.into_any(),
        Page::Portfolio => view! { <PortfolioPage /> }.into_any(),
        Page::RewardsClaim => view! { <RewardsClaimPage /> }.into_any(),
        Page::RewardsStake { pool_id } => view! { <RewardsStakePage pool_id=pool_id /> }.into_any(),
        Page::Vote => view! { <VotePage /> }.into_any(),
        Page::Fiat => view! { <FiatPage /> }.into_any(),
    }
}

/// 每次导航记录一次页面浏览
///
/// 首次进入的页面浏览由 Tag Manager 初始化时记录。
#[component]
fn PageViewTracker() -> impl IntoView {
    let path = use_router().path();
    let session = use_session();
    let analytics = use_analytics();

    Effect::new(move |prev: Option<String>| {
        let to = path.get();
        if let Some(from) = prev.filter(|from| *from != to) {
            let dark = session.preferences.with_untracked(|p| p.dark_mode);
            analytics.record_page_view(Some(&from), &to, dark);
        }
        to
    });
}

#[component]
pub fn App() -> impl IntoView {
    // 1. 读取配置
    let config = AppConfig::from_source(&BuildEnv);

    // 2. 埋点分发器，会话与页面共用同一实例
    let analytics = Arc::new(Dispatcher::new(
        DataLayerSink,
        PreferenceStore::new(web::BrowserStorage),
        config.tag_manager_id.clone(),
    ));
    provide_analytics(analytics.clone());

    // 3. 启动会话（自动登录、偏好恢复、网络订阅）
    let session = init_session(config, analytics);

    view! {
        <Router>
            <PageViewTracker />
            <Layout>
                {move || match session.status.get() {
                    SessionStatus::Loading => view! { <LoadingPage /> }.into_any(),
                    SessionStatus::UnsupportedNetwork => view! { <UnsupportedNetworkPage /> }.into_any(),
                    SessionStatus::Ready => view! { <RouterOutlet matcher=route_matcher /> }.into_any(),
                }}
            </Layout>
            <NotificationAlerts />
        </Router>
    }
}
