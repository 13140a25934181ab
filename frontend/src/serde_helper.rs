//! serde 与 JsValue 之间的转换
//!
//! 对象以普通 JS 对象（而非 `Map`）输出，第三方脚本读取 `dataLayer` 时依赖这一点。

use serde::{Serialize, de::DeserializeOwned};
use tidepool_shared::{SessionError, SessionErrorKind};
use wasm_bindgen::JsValue;

/// Error type for serialization/deserialization operations
#[derive(Debug)]
pub enum Error {
    SerdeWasmBindgen(serde_wasm_bindgen::Error),
}

impl std::fmt::Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Error::SerdeWasmBindgen(e) => write!(f, "Serde WASM Bindgen Error: {}", e),
        }
    }
}

impl std::error::Error for Error {}

impl From<serde_wasm_bindgen::Error> for Error {
    fn from(e: serde_wasm_bindgen::Error) -> Self {
        Error::SerdeWasmBindgen(e)
    }
}

/// Serialize a Rust data structure into a JsValue
pub fn to_value<T: Serialize + ?Sized>(value: &T) -> Result<JsValue, Error> {
    // 大整数按 JS number 输出，避免 BigInt 无法被 JSON.stringify 处理
    let serializer = serde_wasm_bindgen::Serializer::new()
        .serialize_maps_as_objects(true)
        .serialize_large_number_types_as_bigints(false);
    value.serialize(&serializer).map_err(Error::from)
}

/// Deserialize a JsValue into a Rust data structure
pub fn from_value<T: DeserializeOwned>(value: JsValue) -> Result<T, Error> {
    serde_wasm_bindgen::from_value(value).map_err(Error::from)
}

/// 将 JS 抛出的值转换为 `SessionError`
///
/// 钱包拒绝等错误通常是带 `message` 字段的对象。
pub fn js_error(kind: SessionErrorKind, value: &JsValue) -> SessionError {
    let message = js_sys::Reflect::get(value, &JsValue::from_str("message"))
        .ok()
        .and_then(|m| m.as_string())
        .or_else(|| value.as_string())
        .unwrap_or_else(|| format!("{:?}", value));
    SessionError::new(kind, message)
}
