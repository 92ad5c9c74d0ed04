//! Payload 构建模块 - 把捕获的通知转换为转发用的 JSON
//!
//! Payload 格式：
//! ```json
//! {
//!   "guid": "<转发 GUID>",
//!   "title": "<应用名> - <原标题>",
//!   "description": "<正文>",
//!   "icon": "<来源包名>",
//!   "isAlert": false
//! }
//! ```

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;

use super::event::{is_blank, CapturedNotification};

/// 转发到服务器的 payload
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OutboundPayload {
    pub guid: String,
    pub title: String,
    pub description: String,
    /// 来源包名（不是真正的图标）
    pub icon: String,
    pub is_alert: bool,
}

/// 已安装应用的名称查询
pub trait AppRegistry: Send + Sync {
    /// 查不到时返回 None
    fn application_label(&self, package: &str) -> Option<String>;
}

/// 包名 -> 应用名 的静态映射
///
/// 文件位置：`~/.config/notification-relay/apps.json`，内容为
/// `{"org.telegram.messenger": "Telegram"}` 形式的对象。
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AppLabels {
    labels: HashMap<String, String>,
}

impl AppLabels {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, package: impl Into<String>, label: impl Into<String>) {
        self.labels.insert(package.into(), label.into());
    }

    pub fn with_label(mut self, package: impl Into<String>, label: impl Into<String>) -> Self {
        self.insert(package, label);
        self
    }

    pub fn len(&self) -> usize {
        self.labels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }

    /// 从 JSON 文件加载，文件不存在时返回空映射
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read {}", path.display()))?;
        serde_json::from_str(&content)
            .with_context(|| format!("Invalid app labels {}", path.display()))
    }
}

impl AppRegistry for AppLabels {
    fn application_label(&self, package: &str) -> Option<String> {
        self.labels
            .get(package)
            .filter(|label| !label.trim().is_empty())
            .cloned()
    }
}

/// 查不到应用名时的兜底：取包名最后一段并首字母大写
///
/// `com.example.myapp` -> `Myapp`
pub fn fallback_display_name(package: &str) -> String {
    let last = package.rsplit('.').next().unwrap_or(package);
    let mut chars = last.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

/// 带应用名的标题，原标题为空白时只用应用名
pub fn format_title(app_name: &str, title: Option<&str>) -> String {
    if is_blank(title) {
        app_name.to_string()
    } else {
        format!("{} - {}", app_name, title.unwrap_or_default())
    }
}

/// Payload 构建器
pub struct PayloadBuilder<'a> {
    registry: &'a dyn AppRegistry,
}

impl<'a> PayloadBuilder<'a> {
    pub fn new(registry: &'a dyn AppRegistry) -> Self {
        Self { registry }
    }

    /// 解析应用显示名，永不失败
    pub fn display_name(&self, package: &str) -> String {
        self.registry
            .application_label(package)
            .unwrap_or_else(|| fallback_display_name(package))
    }

    /// 构建 payload，标题和正文都为空白时返回 None
    pub fn build(
        &self,
        guid: &str,
        notification: &CapturedNotification,
    ) -> Option<OutboundPayload> {
        if notification.is_blank() {
            return None;
        }

        let app_name = self.display_name(&notification.package);
        Some(build_payload(
            guid,
            &notification.package,
            notification.title.as_deref(),
            notification.body(),
            &app_name,
        ))
    }
}

/// 纯函数版本：由字段直接生成 payload
pub fn build_payload(
    guid: &str,
    package: &str,
    title: Option<&str>,
    body: Option<&str>,
    app_name: &str,
) -> OutboundPayload {
    OutboundPayload {
        guid: guid.to_string(),
        title: format_title(app_name, title),
        description: body.unwrap_or_default().to_string(),
        icon: package.to_string(),
        is_alert: false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_title_with_app_name() {
        let payload = build_payload("g", "com.example.chat", Some("Hi"), Some("there"), "Chat");
        assert_eq!(payload.title, "Chat - Hi");
        assert_eq!(payload.description, "there");
        assert_eq!(payload.icon, "com.example.chat");
        assert!(!payload.is_alert);
    }

    #[test]
    fn test_blank_title_has_no_separator() {
        let payload = build_payload("g", "com.example.chat", Some(""), Some("there"), "Chat");
        assert_eq!(payload.title, "Chat");

        let payload = build_payload("g", "com.example.chat", None, Some("there"), "Chat");
        assert_eq!(payload.title, "Chat");
    }

    #[test]
    fn test_missing_body_is_empty_description() {
        let payload = build_payload("g", "com.example.chat", Some("Hi"), None, "Chat");
        assert_eq!(payload.description, "");
    }

    #[test]
    fn test_wire_format() {
        let payload = build_payload(
            "guid-1",
            "com.example.chat",
            Some("Hi"),
            Some("there"),
            "Chat",
        );
        let json = serde_json::to_value(&payload).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "guid": "guid-1",
                "title": "Chat - Hi",
                "description": "there",
                "icon": "com.example.chat",
                "isAlert": false
            })
        );
    }

    #[test]
    fn test_fallback_display_name() {
        assert_eq!(fallback_display_name("com.example.myapp"), "Myapp");
        assert_eq!(fallback_display_name("whatsapp"), "Whatsapp");
        assert_eq!(fallback_display_name("com.example."), "");
        assert_eq!(fallback_display_name(""), "");
        assert_eq!(fallback_display_name("org.app.émail"), "Émail");
    }

    #[test]
    fn test_builder_uses_registry_then_fallback() {
        let labels = AppLabels::new().with_label("org.telegram.messenger", "Telegram");
        let builder = PayloadBuilder::new(&labels);

        assert_eq!(builder.display_name("org.telegram.messenger"), "Telegram");
        assert_eq!(builder.display_name("com.example.myapp"), "Myapp");
    }

    #[test]
    fn test_builder_skips_blank_notification() {
        let labels = AppLabels::new();
        let builder = PayloadBuilder::new(&labels);

        let blank = CapturedNotification::new("com.example.chat").with_title(" ");
        assert!(builder.build("g", &blank).is_none());

        let n = CapturedNotification::new("com.example.chat").with_big_text("expanded");
        let payload = builder.build("g", &n).unwrap();
        assert_eq!(payload.title, "Chat");
        assert_eq!(payload.description, "expanded");
    }

    #[test]
    fn test_app_labels_load() {
        let temp = tempfile::tempdir().unwrap();
        let missing = AppLabels::load(&temp.path().join("apps.json")).unwrap();
        assert!(missing.is_empty());

        let path = temp.path().join("apps.json");
        std::fs::write(&path, r#"{"com.whatsapp": "WhatsApp"}"#).unwrap();
        let labels = AppLabels::load(&path).unwrap();
        assert_eq!(labels.application_label("com.whatsapp").as_deref(), Some("WhatsApp"));
    }
}
