//! 开机/更新后自动启动
//!
//! 只有通知读取权限仍然授予时才启动服务，否则记一条日志后放弃。

use std::str::FromStr;
use std::sync::Arc;
use tracing::{debug, info};

use crate::log_sink::LogSink;

/// 已授权的通知监听组件列表
///
/// 格式为冒号分隔的 `package/class` 组件名，例如
/// `org.opennotification.pushserver/.NotificationListenerService:com.other/.Listener`
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EnabledListeners {
    components: Vec<(String, String)>,
}

impl EnabledListeners {
    pub fn parse(flat: &str) -> Self {
        let components = flat
            .split(':')
            .filter_map(unflatten_component)
            .collect();
        Self { components }
    }

    /// 读取 `ENABLED_NOTIFICATION_LISTENERS` 环境变量，未设置时为空
    pub fn from_env() -> Self {
        std::env::var("ENABLED_NOTIFICATION_LISTENERS")
            .map(|flat| Self::parse(&flat))
            .unwrap_or_default()
    }

    /// 指定包是否拥有监听权限
    pub fn is_granted(&self, package: &str) -> bool {
        self.components.iter().any(|(pkg, _)| pkg == package)
    }

    pub fn len(&self) -> usize {
        self.components.len()
    }

    pub fn is_empty(&self) -> bool {
        self.components.is_empty()
    }
}

/// `package/class` -> (package, class)，`.Class` 形式展开为完整类名
fn unflatten_component(name: &str) -> Option<(String, String)> {
    let (package, class) = name.trim().split_once('/')?;
    if package.is_empty() || class.is_empty() {
        return None;
    }
    let class = if class.starts_with('.') {
        format!("{}{}", package, class)
    } else {
        class.to_string()
    };
    Some((package.to_string(), class))
}

/// 触发自动启动的原因
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BootReason {
    BootCompleted,
    MyPackageReplaced,
    PackageReplaced,
    Other(String),
}

impl BootReason {
    pub fn triggers_start(&self) -> bool {
        !matches!(self, BootReason::Other(_))
    }
}

impl FromStr for BootReason {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let reason = match s.trim().to_lowercase().replace('_', "-").as_str() {
            "boot-completed" | "boot" | "android.intent.action.boot-completed" => {
                BootReason::BootCompleted
            }
            "my-package-replaced" | "android.intent.action.my-package-replaced" => {
                BootReason::MyPackageReplaced
            }
            "package-replaced" | "android.intent.action.package-replaced" => {
                BootReason::PackageReplaced
            }
            _ => BootReason::Other(s.to_string()),
        };
        Ok(reason)
    }
}

/// 自动启动决策
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BootDecision {
    /// 启动服务
    Start,
    /// 没有权限，跳过
    AccessDenied,
    /// 与启动无关的触发
    Ignored,
}

/// 开机/更新触发器
pub struct BootReceiver {
    own_package: String,
    log: Arc<LogSink>,
}

impl BootReceiver {
    pub fn new(own_package: impl Into<String>, log: Arc<LogSink>) -> Self {
        Self {
            own_package: own_package.into(),
            log,
        }
    }

    pub fn on_receive(&self, reason: &BootReason, listeners: &EnabledListeners) -> BootDecision {
        debug!(reason = ?reason, "Boot receiver triggered");

        if !reason.triggers_start() {
            return BootDecision::Ignored;
        }

        if listeners.is_granted(&self.own_package) {
            info!("Starting notification service after boot/update");
            self.log.add("Service auto-started after boot");
            BootDecision::Start
        } else {
            self.log
                .add("Cannot start service - notification access not enabled");
            BootDecision::AccessDenied
        }
    }
}
