//! 投递渠道 trait 定义

use super::payload::OutboundPayload;

/// 一次投递请求
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeliveryRequest {
    /// 服务器基础 URL（不含 `/notification`）
    pub base_url: String,
    pub payload: OutboundPayload,
}

impl DeliveryRequest {
    pub fn new(base_url: impl Into<String>, payload: OutboundPayload) -> Self {
        Self {
            base_url: base_url.into(),
            payload,
        }
    }

    /// 实际请求地址 `<base_url>/notification`
    pub fn endpoint(&self) -> String {
        format!("{}/notification", self.base_url)
    }
}

/// 投递结果（都是终态，不重试）
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeliveryOutcome {
    /// 2xx
    Sent,
    /// 非 2xx 响应
    Rejected { status: u16, reason: String },
    /// 连接/超时/DNS 等传输错误
    Failed(String),
    /// 构造请求时出错
    Exception(String),
}

impl DeliveryOutcome {
    /// 写入状态日志的文本
    pub fn log_message(&self, formatted_title: &str) -> String {
        match self {
            DeliveryOutcome::Sent => format!("✓ Sent: {}", formatted_title),
            DeliveryOutcome::Rejected { status, reason } if reason.is_empty() => {
                format!("API error {}", status)
            }
            DeliveryOutcome::Rejected { status, reason } => {
                format!("API error {}: {}", status, reason)
            }
            DeliveryOutcome::Failed(error) => format!("Failed to send notification: {}", error),
            DeliveryOutcome::Exception(error) => {
                format!("Exception sending notification: {}", error)
            }
        }
    }
}

/// 投递渠道
pub trait DeliveryChannel: Send + Sync {
    /// 渠道名称（用于日志）
    fn name(&self) -> &str;

    /// 异步投递（spawn 后立即返回，结果只写日志）
    fn dispatch(&self, request: DeliveryRequest);
}
