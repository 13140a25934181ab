use std::fmt;

// =========================================================
// 错误状态枚举
// =========================================================

/// 错误类别
///
/// 会话层的错误几乎都会被就地吸收（回退到默认值或未登录状态），
/// 类别主要用于日志中区分来源。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionErrorKind {
    /// 本地缓存读写失败
    Storage,
    /// 缓存值或埋点负载无法序列化 / 反序列化
    Serialization,
    /// 钱包 Provider 拒绝或执行失败
    Wallet,
    /// 钱包 Provider 未在限定时间内响应
    Timeout,
}

impl SessionErrorKind {
    /// 获取机器可读的错误代码
    pub fn error_code(&self) -> &'static str {
        match self {
            SessionErrorKind::Storage => "STORAGE_ERROR",
            SessionErrorKind::Serialization => "SERIALIZATION_ERROR",
            SessionErrorKind::Wallet => "WALLET_ERROR",
            SessionErrorKind::Timeout => "WALLET_TIMEOUT",
        }
    }
}

// =========================================================
// 错误上下文追踪
// =========================================================

/// 结构化的错误追踪片段
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ErrorSpan {
    /// 操作名称，如 "storage.set", "wallet.auto_connect"
    pub operation: String,
    /// 额外的细节信息，如缓存键
    pub detail: Option<String>,
}

impl ErrorSpan {
    pub fn new(operation: impl Into<String>) -> Self {
        Self {
            operation: operation.into(),
            detail: None,
        }
    }

    pub fn with_detail(operation: impl Into<String>, detail: impl Into<String>) -> Self {
        Self {
            operation: operation.into(),
            detail: Some(detail.into()),
        }
    }
}

// =========================================================
// 核心错误类型
// =========================================================

#[derive(Debug)]
pub struct SessionError {
    pub kind: SessionErrorKind,
    pub message: String,
    source: Option<Box<dyn std::error::Error + Send + Sync>>,
    spans: Vec<ErrorSpan>,
}

impl SessionError {
    pub fn new(kind: SessionErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            source: None,
            spans: Vec::new(),
        }
    }

    // --- Convenience constructors ---

    pub fn storage(message: impl Into<String>) -> Self {
        Self::new(SessionErrorKind::Storage, message)
    }

    pub fn serialization(message: impl Into<String>) -> Self {
        Self::new(SessionErrorKind::Serialization, message)
    }

    pub fn wallet(message: impl Into<String>) -> Self {
        Self::new(SessionErrorKind::Wallet, message)
    }

    pub fn timeout(message: impl Into<String>) -> Self {
        Self::new(SessionErrorKind::Timeout, message)
    }

    // --- Context builders ---

    /// 添加操作追踪（无额外细节）
    pub fn in_op(mut self, operation: impl Into<String>) -> Self {
        self.spans.push(ErrorSpan::new(operation));
        self
    }

    /// 添加操作追踪（带额外细节）
    pub fn in_op_with(mut self, operation: impl Into<String>, detail: impl Into<String>) -> Self {
        self.spans.push(ErrorSpan::with_detail(operation, detail));
        self
    }

    /// 设置原始错误源
    pub fn with_source<E: std::error::Error + Send + Sync + 'static>(mut self, source: E) -> Self {
        self.source = Some(Box::new(source));
        self
    }

    // --- Accessors ---

    pub fn error_code(&self) -> &'static str {
        self.kind.error_code()
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn spans(&self) -> &[ErrorSpan] {
        &self.spans
    }
}

// =========================================================
// Display & Error trait 实现
// =========================================================

impl fmt::Display for SessionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}", self.error_code(), self.message)?;

        if !self.spans.is_empty() {
            write!(f, " | trace: ")?;
            for (i, span) in self.spans.iter().enumerate() {
                if i > 0 {
                    write!(f, " -> ")?;
                }
                write!(f, "{}", span.operation)?;
                if let Some(detail) = &span.detail {
                    write!(f, "({})", detail)?;
                }
            }
        }
        Ok(())
    }
}

impl std::error::Error for SessionError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        self.source
            .as_ref()
            .map(|e| e.as_ref() as &(dyn std::error::Error + 'static))
    }
}

pub type SessionResult<T> = std::result::Result<T, SessionError>;

// =========================================================
// 类型转换实现
// =========================================================

impl From<serde_json::Error> for SessionError {
    fn from(e: serde_json::Error) -> Self {
        SessionError::serialization(e.to_string()).with_source(e)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_with_spans() {
        let err = SessionError::storage("quota exceeded")
            .in_op_with("storage.set", "notifications")
            .in_op("preferences.save");

        assert_eq!(
            err.to_string(),
            "[STORAGE_ERROR] quota exceeded | trace: storage.set(notifications) -> preferences.save"
        );
        assert_eq!(err.spans().len(), 2);
    }

    #[test]
    fn test_from_serde_keeps_source() {
        let parse_err = serde_json::from_str::<bool>("not-json").unwrap_err();
        let err = SessionError::from(parse_err);

        assert_eq!(err.kind, SessionErrorKind::Serialization);
        assert!(std::error::Error::source(&err).is_some());
    }
}
