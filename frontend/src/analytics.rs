//! Tag Manager 事件出口
//!
//! `DataLayerSink` 把共享核心格式化好的事件写入 `window.dataLayer`。

use crate::serde_helper::to_value;
use crate::web::BrowserStorage;
use leptos::prelude::*;
use serde_json::{Value, json};
use std::sync::Arc;
use tidepool_shared::{AnalyticsDispatcher, AnalyticsSink};
use wasm_bindgen::{JsCast, JsValue};

const QUEUE_NAME: &str = "dataLayer";
const SCRIPT_BASE_URL: &str = "https://www.googletagmanager.com/gtm.js?id=";

pub type Dispatcher = AnalyticsDispatcher<DataLayerSink, BrowserStorage>;

fn queue() -> Option<js_sys::Array> {
    let window = web_sys::window()?;
    js_sys::Reflect::get(&window, &JsValue::from_str(QUEUE_NAME))
        .ok()?
        .dyn_into::<js_sys::Array>()
        .ok()
}

/// `window.dataLayer` 出口
#[derive(Clone, Copy, Default)]
pub struct DataLayerSink;

impl DataLayerSink {
    fn push_value(queue: &js_sys::Array, payload: &Value) -> bool {
        match to_value(payload) {
            Ok(value) => {
                queue.push(&value);
                true
            }
            Err(e) => {
                log::warn!("analytics payload not convertible: {}", e);
                false
            }
        }
    }
}

impl AnalyticsSink for DataLayerSink {
    fn queue_exists(&self) -> bool {
        queue().is_some()
    }

    fn create_queue(&self, seed: Value) {
        let Some(window) = web_sys::window() else {
            return;
        };
        let queue = js_sys::Array::new();
        Self::push_value(&queue, &seed);
        if js_sys::Reflect::set(&window, &JsValue::from_str(QUEUE_NAME), &queue).is_err() {
            log::warn!("could not create {}", QUEUE_NAME);
        }
    }

    fn push(&self, payload: Value) -> bool {
        match queue() {
            Some(queue) => Self::push_value(&queue, &payload),
            None => false,
        }
    }

    fn inject_script(&self, container_id: &str) {
        if let Some(queue) = queue() {
            Self::push_value(
                &queue,
                &json!({ "gtm.start": js_sys::Date::now(), "event": "gtm.js" }),
            );
        }

        let Some(document) = web_sys::window().and_then(|w| w.document()) else {
            return;
        };
        let script = match document
            .create_element("script")
            .map(|el| el.dyn_into::<web_sys::HtmlScriptElement>())
        {
            Ok(Ok(script)) => script,
            _ => {
                log::warn!("could not create tag manager script element");
                return;
            }
        };
        script.set_async(true);
        script.set_src(&format!("{}{}", SCRIPT_BASE_URL, container_id));

        if let Some(head) = document.head() {
            if head.append_child(&script).is_err() {
                log::warn!("could not inject tag manager script");
            }
        }
    }

    fn page_path(&self) -> String {
        web_sys::window()
            .and_then(|w| w.location().pathname().ok())
            .unwrap_or_else(|| "/".to_string())
    }
}

/// 埋点上下文
#[derive(Clone)]
pub struct AnalyticsContext(pub Arc<Dispatcher>);

pub fn provide_analytics(dispatcher: Arc<Dispatcher>) {
    provide_context(AnalyticsContext(dispatcher));
}

/// 从 Context 获取埋点分发器
pub fn use_analytics() -> Arc<Dispatcher> {
    use_context::<AnalyticsContext>()
        .expect("AnalyticsContext should be provided")
        .0
}
