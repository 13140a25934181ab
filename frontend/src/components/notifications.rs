//! 通知：顶部栏下拉列表与右上角未读提示

use crate::session::{SessionContext, use_session};
use leptos::prelude::*;
use std::time::Duration;
use tidepool_shared::{Notification, NotificationKind};

/// 未读提示自动收起的时间
const ALERT_TIMEOUT: Duration = Duration::from_secs(8);

fn alert_class(kind: NotificationKind) -> &'static str {
    match kind {
        NotificationKind::Info => "alert alert-info shadow-lg",
        NotificationKind::Success => "alert alert-success shadow-lg",
        NotificationKind::Error => "alert alert-error shadow-lg",
        NotificationKind::Pending => "alert alert-warning shadow-lg",
    }
}

fn notification_row(session: SessionContext, n: Notification) -> impl IntoView {
    let id = n.id.clone();
    let time = n.timestamp.format_time();
    let class = if n.read { "opacity-60" } else { "" };
    view! {
        <li class=class>
            <a on:click=move |_| session.mark_read(&id)>
                <div class="flex flex-col">
                    <span class="font-semibold">{n.title}</span>
                    <span class="text-sm">{n.message}</span>
                    <span class="text-xs opacity-60">{time}</span>
                </div>
            </a>
        </li>
    }
}

/// 顶部栏的通知下拉
#[component]
pub fn NotificationMenu() -> impl IntoView {
    let session = use_session();
    let unread = move || session.preferences.with(|p| p.unread().count());

    view! {
        <div class="dropdown dropdown-end">
            <button class="btn btn-ghost btn-sm gap-1">
                "Notifications"
                <Show when=move || { unread() > 0 }>
                    <span class="badge badge-primary badge-sm">{unread}</span>
                </Show>
            </button>
            <ul class="dropdown-content menu bg-base-100 rounded-box shadow w-80 mt-2 max-h-96 overflow-y-auto">
                <Show
                    when=move || session.preferences.with(|p| !p.notifications.is_empty())
                    fallback=|| view! { <li class="p-4 text-sm opacity-60">"No notifications"</li> }
                >
                    {move || {
                        session
                            .preferences
                            .get()
                            .notifications
                            .into_iter()
                            .map(|n| notification_row(session, n))
                            .collect_view()
                    }}
                    <li>
                        <a class="text-error" on:click=move |_| session.clear_notifications()>
                            "Clear all"
                        </a>
                    </li>
                </Show>
            </ul>
        </div>
    }
}

/// 未读通知提示，点击关闭即标记已读
#[component]
pub fn NotificationAlerts() -> impl IntoView {
    let session = use_session();

    let alerts = move || {
        session
            .preferences
            .with(|p| p.unread().cloned().collect::<Vec<_>>())
    };

    // 新通知在一段时间后自动标记已读
    Effect::new(move |seen: Option<usize>| {
        let count = session.preferences.with(|p| p.notifications.len());
        if seen.is_some_and(|seen| count > seen) {
            let latest = session
                .preferences
                .with_untracked(|p| p.notifications.first().map(|n| n.id.clone()));
            if let Some(latest) = latest {
                set_timeout(move || session.mark_read(&latest), ALERT_TIMEOUT);
            }
        }
        count
    });

    view! {
        <div class="toast toast-top toast-end z-50 mt-20">
            <For
                each=alerts
                key=|n: &Notification| n.id.clone()
                children=move |n: Notification| {
                    let id = n.id.clone();
                    view! {
                        <div class={alert_class(n.kind)}>
                            <div class="flex flex-col">
                                <span class="font-semibold">{n.title}</span>
                                <span>{n.message}</span>
                            </div>
                            <button
                                class="btn btn-ghost btn-xs"
                                on:click=move |_| session.mark_read(&id)
                            >
                                "x"
                            </button>
                        </div>
                    }
                }
            />
        </div>
    }
}
