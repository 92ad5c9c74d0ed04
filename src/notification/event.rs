//! 捕获的通知事件

use serde::{Deserialize, Serialize};

/// 一次 notification-posted 事件携带的字段
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CapturedNotification {
    /// 来源包名
    pub package: String,
    /// 标题
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    /// 正文
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    /// 展开后的长正文
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub big_text: Option<String>,
}

impl CapturedNotification {
    pub fn new(package: impl Into<String>) -> Self {
        Self {
            package: package.into(),
            title: None,
            text: None,
            big_text: None,
        }
    }

    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    pub fn with_text(mut self, text: impl Into<String>) -> Self {
        self.text = Some(text.into());
        self
    }

    pub fn with_big_text(mut self, big_text: impl Into<String>) -> Self {
        self.big_text = Some(big_text.into());
        self
    }

    /// 正文：优先 text，缺失时才用 big_text
    pub fn body(&self) -> Option<&str> {
        self.text.as_deref().or(self.big_text.as_deref())
    }

    /// 标题和正文都为空白时没有转发价值
    pub fn is_blank(&self) -> bool {
        is_blank(self.title.as_deref()) && is_blank(self.body())
    }
}

/// None 或只含空白
pub fn is_blank(value: Option<&str>) -> bool {
    value.map_or(true, |v| v.trim().is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_body_prefers_text() {
        let n = CapturedNotification::new("com.example.chat")
            .with_text("short")
            .with_big_text("long version");
        assert_eq!(n.body(), Some("short"));
    }

    #[test]
    fn test_body_falls_back_to_big_text_only_when_missing() {
        let n = CapturedNotification::new("com.example.chat").with_big_text("long version");
        assert_eq!(n.body(), Some("long version"));

        // text 存在但为空白时不回退
        let n = CapturedNotification::new("com.example.chat")
            .with_text("")
            .with_big_text("long version");
        assert_eq!(n.body(), Some(""));
    }

    #[test]
    fn test_is_blank() {
        assert!(CapturedNotification::new("p").is_blank());
        assert!(CapturedNotification::new("p").with_title("  ").with_text("\n").is_blank());
        assert!(!CapturedNotification::new("p").with_title("Hi").is_blank());
        assert!(!CapturedNotification::new("p").with_text("there").is_blank());
    }

    #[test]
    fn test_deserialize_optional_fields() {
        let n: CapturedNotification =
            serde_json::from_str(r#"{"package": "com.example.chat", "title": "Hi"}"#).unwrap();
        assert_eq!(n.package, "com.example.chat");
        assert_eq!(n.title.as_deref(), Some("Hi"));
        assert!(n.text.is_none());
        assert!(n.big_text.is_none());
    }
}
