//! 捕获管线 - 对每个 posted 事件做过滤并分发
//!
//! 按顺序短路：
//! 1. 来源是自己 -> 丢弃（防止循环）
//! 2. 开启忽略系统通知且来源是系统包 -> 丢弃并记日志
//! 3. 标题和正文都为空白 -> 静默丢弃
//! 4. 未配置 URL/GUID -> 记日志并丢弃
//! 5. 构建 payload，交给投递渠道后立即返回

use std::sync::Arc;
use tracing::{debug, info, warn};

use super::channel::{DeliveryChannel, DeliveryRequest};
use super::classifier::SystemPackageRules;
use super::event::CapturedNotification;
use super::payload::{AppRegistry, PayloadBuilder};
use crate::log_sink::LogSink;
use crate::service::status::StatusIndicator;
use crate::settings::SettingsSource;

/// 本程序自己的包名
pub const RELAY_PACKAGE: &str = "org.opennotification.pushserver";

/// 单个事件的处理结果
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CaptureOutcome {
    /// 自己发出的通知
    SelfNotification,
    /// 被系统通知过滤
    IgnoredSystem,
    /// 标题和正文都为空
    Empty,
    /// URL 或 GUID 未配置
    NotConfigured,
    /// 已交给投递渠道
    Dispatched { title: String },
}

/// 捕获管线
pub struct CapturePipeline {
    own_package: String,
    rules: SystemPackageRules,
    settings: Arc<dyn SettingsSource>,
    registry: Arc<dyn AppRegistry>,
    channel: Arc<dyn DeliveryChannel>,
    status: Arc<dyn StatusIndicator>,
    log: Arc<LogSink>,
}

impl CapturePipeline {
    pub fn new(
        settings: Arc<dyn SettingsSource>,
        registry: Arc<dyn AppRegistry>,
        channel: Arc<dyn DeliveryChannel>,
        status: Arc<dyn StatusIndicator>,
        log: Arc<LogSink>,
    ) -> Self {
        Self {
            own_package: RELAY_PACKAGE.to_string(),
            rules: SystemPackageRules::default(),
            settings,
            registry,
            channel,
            status,
            log,
        }
    }

    /// 设置自己的包名
    pub fn with_own_package(mut self, package: impl Into<String>) -> Self {
        self.own_package = package.into();
        self
    }

    /// 替换系统包规则
    pub fn with_rules(mut self, rules: SystemPackageRules) -> Self {
        self.rules = rules;
        self
    }

    pub fn own_package(&self) -> &str {
        &self.own_package
    }

    /// 处理一个 posted 事件，不等待投递结果
    pub fn on_notification_posted(&self, notification: &CapturedNotification) -> CaptureOutcome {
        let package = notification.package.as_str();

        if package == self.own_package {
            return CaptureOutcome::SelfNotification;
        }

        // 设置只在这里读一次，之后的步骤都用这份快照
        // 每个事件同步读一次设置文件，保存后下一个事件即生效
        let settings = match self.settings.load() {
            Ok(settings) => settings,
            Err(e) => {
                warn!(error = %e, "Failed to load settings");
                self.log.add(format!("Error: Failed to load settings: {}", e));
                return CaptureOutcome::NotConfigured;
            }
        };

        if settings.ignore_system && self.rules.is_system(package) {
            debug!(package = %package, "Ignoring system notification");
            self.log.add(format!("Ignored system notification from {}", package));
            return CaptureOutcome::IgnoredSystem;
        }

        if notification.is_blank() {
            return CaptureOutcome::Empty;
        }

        if !settings.is_deliverable() {
            warn!(package = %package, "Server URL or GUID not configured");
            self.log.add("Error: Server URL or GUID not configured");
            return CaptureOutcome::NotConfigured;
        }

        let builder = PayloadBuilder::new(self.registry.as_ref());
        let Some(payload) = builder.build(&settings.guid, notification) else {
            return CaptureOutcome::Empty;
        };

        self.log.add(format!(
            "New notification from {}: {}",
            package,
            notification.title.as_deref().unwrap_or_default()
        ));
        self.status.update(&format!("Last: {}", package));

        let title = payload.title.clone();
        info!(
            package = %package,
            channel = self.channel.name(),
            "Forwarding notification"
        );
        self.channel
            .dispatch(DeliveryRequest::new(settings.server_url.trim(), payload));

        CaptureOutcome::Dispatched { title }
    }
}
