//! 运行状态展示
//!
//! - `StatusIndicator`：常驻状态提示（前台通知的文字）
//! - `StatusLine`：设置界面顶部的一行状态

use std::fmt;
use std::sync::Mutex;
use tracing::debug;

use crate::settings::Settings;

/// 服务启动时的状态文字
pub const STATUS_FORWARDING: &str = "Forwarding notifications to server";
/// 收到 restart 信号后的状态文字
pub const STATUS_RESTARTED: &str = "Restarted - Forwarding notifications";

/// 常驻状态提示
pub trait StatusIndicator: Send + Sync {
    fn update(&self, text: &str);
}

/// 保存最近一次状态文字的提示器
#[derive(Debug)]
pub struct ForegroundStatus {
    text: Mutex<String>,
}

impl ForegroundStatus {
    pub fn new() -> Self {
        Self {
            text: Mutex::new(STATUS_FORWARDING.to_string()),
        }
    }

    pub fn current(&self) -> String {
        self.text.lock().unwrap_or_else(|e| e.into_inner()).clone()
    }
}

impl Default for ForegroundStatus {
    fn default() -> Self {
        Self::new()
    }
}

impl StatusIndicator for ForegroundStatus {
    fn update(&self, text: &str) {
        debug!(status = %text, "Status indicator updated");
        *self.text.lock().unwrap_or_else(|e| e.into_inner()) = text.to_string();
    }
}

/// 设置界面的状态行
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusLine {
    /// 没有通知读取权限
    NotEnabled,
    /// 未设置 GUID
    NotConfigured,
    Ready,
}

impl StatusLine {
    /// 先检查权限，再检查 GUID
    pub fn evaluate(listener_granted: bool, settings: &Settings) -> Self {
        if !listener_granted {
            StatusLine::NotEnabled
        } else if !settings.has_guid() {
            StatusLine::NotConfigured
        } else {
            StatusLine::Ready
        }
    }
}

impl fmt::Display for StatusLine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            StatusLine::NotEnabled => "Status: Notification access not enabled",
            StatusLine::NotConfigured => "Status: Settings not configured",
            StatusLine::Ready => "Status: Ready to forward notifications",
        };
        f.write_str(text)
    }
}
