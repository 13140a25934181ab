//! 状态页面：加载中、不支持的网络、404

use crate::session::use_session;
use crate::web::router::Link;
use leptos::prelude::*;

#[component]
pub fn LoadingPage() -> impl IntoView {
    view! {
        <div class="flex items-center justify-center min-h-[60vh]">
            <span class="loading loading-spinner loading-lg"></span>
        </div>
    }
}

#[component]
pub fn UnsupportedNetworkPage() -> impl IntoView {
    let session = use_session();
    let chain = move || session.active_chain().to_string();
    let supported = session.supported_network_names().join(" or ");

    view! {
        <div class="flex items-center justify-center min-h-[60vh]">
            <div class="text-center space-y-4">
                <h1 class="text-3xl font-bold text-error">"Unsupported network"</h1>
                <p>"Your wallet is connected to chain " {chain} "."</p>
                <p class="opacity-70">
                    "Switch to " {supported} " in your wallet to continue."
                </p>
            </div>
        </div>
    }
}

#[component]
pub fn NotFoundPage() -> impl IntoView {
    view! {
        <div class="flex items-center justify-center min-h-[60vh]">
            <div class="text-center">
                <h1 class="text-6xl font-bold text-error">"404"</h1>
                <p class="text-xl mt-4">"Page not found"</p>
                <Link to="/" class=Signal::derive(|| "btn btn-primary mt-6".to_string())>
                    "Back to Swap"
                </Link>
            </div>
        </div>
    }
}
