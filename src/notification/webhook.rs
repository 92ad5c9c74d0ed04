//! HTTP 投递客户端
//!
//! `POST <server_url>/notification`，body 为 JSON payload。
//! 不重试、不排队，失败只写状态日志。

use anyhow::{anyhow, Context, Result};
use reqwest::{Client, Url};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::runtime::Handle;
use tokio::sync::Notify;
use tracing::{debug, error, info, warn};

use super::channel::{DeliveryChannel, DeliveryOutcome, DeliveryRequest};
use crate::log_sink::LogSink;

/// 超时配置（固定值，不开放给用户）
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DeliveryTimeouts {
    pub connect: Duration,
    pub write: Duration,
    pub read: Duration,
}

impl Default for DeliveryTimeouts {
    fn default() -> Self {
        Self {
            connect: Duration::from_secs(10),
            write: Duration::from_secs(10),
            read: Duration::from_secs(30),
        }
    }
}

impl DeliveryTimeouts {
    /// reqwest 只有连接超时和整体超时，写 + 读 合并为整体期限
    pub fn request_deadline(&self) -> Duration {
        self.write + self.read
    }
}

/// 进行中的投递计数
#[derive(Debug, Default)]
struct InFlight {
    count: AtomicUsize,
    idle: Notify,
}

impl InFlight {
    fn enter(self: &Arc<Self>) -> InFlightGuard {
        self.count.fetch_add(1, Ordering::SeqCst);
        InFlightGuard(self.clone())
    }
}

struct InFlightGuard(Arc<InFlight>);

impl Drop for InFlightGuard {
    fn drop(&mut self) {
        if self.0.count.fetch_sub(1, Ordering::SeqCst) == 1 {
            self.0.idle.notify_waiters();
        }
    }
}

/// HTTP 投递渠道
#[derive(Clone)]
pub struct HttpDelivery {
    client: Client,
    log: Arc<LogSink>,
    runtime: Handle,
    in_flight: Arc<InFlight>,
}

impl HttpDelivery {
    /// 创建客户端，必须在 tokio runtime 内调用
    pub fn new(log: Arc<LogSink>) -> Result<Self> {
        Self::with_timeouts(log, DeliveryTimeouts::default())
    }

    pub fn with_timeouts(log: Arc<LogSink>, timeouts: DeliveryTimeouts) -> Result<Self> {
        let runtime = Handle::try_current().context("HttpDelivery requires a tokio runtime")?;

        let client = Client::builder()
            .connect_timeout(timeouts.connect)
            .timeout(timeouts.request_deadline())
            .build()
            .map_err(|e| anyhow!("Failed to create HTTP client: {}", e))?;

        Ok(Self {
            client,
            log,
            runtime,
            in_flight: Arc::new(InFlight::default()),
        })
    }

    /// 发送并等待结果（不写状态日志）
    pub async fn deliver(&self, request: &DeliveryRequest) -> DeliveryOutcome {
        let url = match Url::parse(&request.endpoint()) {
            Ok(url) => url,
            Err(e) => {
                return DeliveryOutcome::Exception(format!(
                    "invalid URL {}: {}",
                    request.endpoint(),
                    e
                ))
            }
        };

        let body = match serde_json::to_vec(&request.payload) {
            Ok(body) => body,
            Err(e) => return DeliveryOutcome::Exception(e.to_string()),
        };

        let response = self
            .client
            .post(url)
            .header("Content-Type", "application/json")
            .body(body)
            .send()
            .await;

        match response {
            Ok(response) => {
                let status = response.status();
                if status.is_success() {
                    DeliveryOutcome::Sent
                } else {
                    // reqwest 不暴露服务器发送的原因短语，只能用标准短语
                    DeliveryOutcome::Rejected {
                        status: status.as_u16(),
                        reason: status.canonical_reason().unwrap_or_default().to_string(),
                    }
                }
            }
            Err(e) => DeliveryOutcome::Failed(e.to_string()),
        }
    }

    /// 发送、等待结果并写状态日志
    pub async fn deliver_and_log(&self, request: &DeliveryRequest) -> DeliveryOutcome {
        let outcome = self.deliver(request).await;
        record_outcome(&self.log, request, &outcome);
        outcome
    }

    /// 当前未完成的投递数
    pub fn in_flight(&self) -> usize {
        self.in_flight.count.load(Ordering::SeqCst)
    }

    /// 等待进行中的投递完成，超时则放弃等待并返回剩余数量
    pub async fn drain(&self, timeout: Duration) -> usize {
        let wait = async {
            loop {
                let idle = self.in_flight.idle.notified();
                if self.in_flight() == 0 {
                    return;
                }
                idle.await;
            }
        };

        if tokio::time::timeout(timeout, wait).await.is_err() {
            warn!(pending = self.in_flight(), "Abandoning in-flight deliveries");
        }
        self.in_flight()
    }
}

fn record_outcome(log: &LogSink, request: &DeliveryRequest, outcome: &DeliveryOutcome) {
    let title = &request.payload.title;
    match outcome {
        DeliveryOutcome::Sent => {
            debug!(package = %request.payload.icon, "Notification delivered");
        }
        DeliveryOutcome::Rejected { status, .. } => {
            warn!(
                package = %request.payload.icon,
                status = *status,
                "Server rejected notification"
            );
        }
        DeliveryOutcome::Failed(e) | DeliveryOutcome::Exception(e) => {
            error!(package = %request.payload.icon, error = %e, "API call failed");
        }
    }
    log.add(outcome.log_message(title));
}

impl DeliveryChannel for HttpDelivery {
    fn name(&self) -> &str {
        "http"
    }

    fn dispatch(&self, request: DeliveryRequest) {
        let delivery = self.clone();
        let guard = self.in_flight.enter();

        info!(endpoint = %request.endpoint(), "Dispatching notification");
        // 不保留 JoinHandle，进程退出时未完成的投递直接丢弃
        self.runtime.spawn(async move {
            let _guard = guard;
            delivery.deliver_and_log(&request).await;
        });
    }
}
