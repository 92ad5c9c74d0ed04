//! 通知监听服务 - 生命周期和事件循环
//!
//! 事件来源是宿主桥接程序写出的 JSONL，每行一个事件：
//! ```text
//! {"type":"posted","package":"com.example.chat","title":"Hi","text":"there"}
//! {"type":"restart"}
//! {"type":"status"}
//! ```
//! 流打开视为监听已连接，流结束视为监听断开并停止服务。

use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt};
use tracing::{debug, info, warn};

use super::status::{StatusIndicator, StatusLine, STATUS_FORWARDING, STATUS_RESTARTED};
use crate::log_sink::LogSink;
use crate::notification::event::CapturedNotification;
use crate::notification::pipeline::{CaptureOutcome, CapturePipeline};
use crate::settings::{Settings, SettingsSource};

/// 宿主发来的事件
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ServiceEvent {
    /// 新通知
    Posted(CapturedNotification),
    /// 设置保存后重新声明运行状态
    Restart,
    Connected,
    Disconnected,
    /// 输出状态行和日志
    Status,
}

/// 事件循环统计
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunSummary {
    /// 读到的事件数（含无法解析的行）
    pub events: usize,
    /// 已交给投递渠道的通知数
    pub dispatched: usize,
    /// 无法解析的行数
    pub malformed: usize,
}

/// 单个事件的处理结果
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EventReply {
    /// 通知经过捕获管道
    Captured(CaptureOutcome),
    /// 需要写回宿主的文本
    Report(String),
    Handled,
}

/// 通知监听服务
pub struct RelayService {
    pipeline: CapturePipeline,
    settings: Arc<dyn SettingsSource>,
    status: Arc<dyn StatusIndicator>,
    log: Arc<LogSink>,
    listener_granted: bool,
}

impl RelayService {
    pub fn new(
        pipeline: CapturePipeline,
        settings: Arc<dyn SettingsSource>,
        status: Arc<dyn StatusIndicator>,
        log: Arc<LogSink>,
    ) -> Self {
        Self {
            pipeline,
            settings,
            status,
            log,
            listener_granted: true,
        }
    }

    /// 设置监听权限状态（只影响状态行）
    pub fn with_listener_granted(mut self, granted: bool) -> Self {
        self.listener_granted = granted;
        self
    }

    pub fn log(&self) -> &Arc<LogSink> {
        &self.log
    }

    pub fn start(&self) {
        self.status.update(STATUS_FORWARDING);
        self.log.add("Service started as foreground service");
        debug!("Relay service created");
    }

    pub fn stop(&self) {
        self.log.add("Service stopped");
        debug!("Relay service destroyed");
    }

    pub fn on_listener_connected(&self) {
        self.log.add("Notification listener connected");
    }

    pub fn on_listener_disconnected(&self) {
        self.log.add("Notification listener disconnected");
    }

    /// restart 信号：只刷新状态，不影响进行中的投递
    pub fn restart(&self) {
        self.log.add("Service restarted with new settings");
        self.status.update(STATUS_RESTARTED);
    }

    pub fn on_notification_posted(&self, notification: &CapturedNotification) -> CaptureOutcome {
        self.pipeline.on_notification_posted(notification)
    }

    /// 当前状态行
    pub fn status_line(&self) -> StatusLine {
        let settings = self.settings.load().unwrap_or_else(|e| {
            warn!(error = %e, "Failed to load settings for status line");
            Settings::default()
        });
        StatusLine::evaluate(self.listener_granted, &settings)
    }

    /// 状态行 + 日志内容
    pub fn status_report(&self) -> String {
        let content = self.log.content();
        if content.is_empty() {
            self.status_line().to_string()
        } else {
            format!("{}\n{}", self.status_line(), content)
        }
    }

    /// 处理单个事件
    pub fn handle(&self, event: ServiceEvent) -> EventReply {
        match event {
            ServiceEvent::Posted(notification) => {
                EventReply::Captured(self.on_notification_posted(&notification))
            }
            ServiceEvent::Restart => {
                self.restart();
                EventReply::Handled
            }
            ServiceEvent::Connected => {
                self.on_listener_connected();
                EventReply::Handled
            }
            ServiceEvent::Disconnected => {
                self.on_listener_disconnected();
                EventReply::Handled
            }
            ServiceEvent::Status => EventReply::Report(self.status_report()),
        }
    }

    /// 从 JSONL 流读取事件直到结束
    ///
    /// 只有读写本身的 I/O 错误会结束循环；
    /// 无法解码或解析的行计入 `malformed` 后跳过。
    pub async fn run<R, W>(&self, mut reader: R, mut out: W) -> Result<RunSummary>
    where
        R: AsyncBufRead + Unpin,
        W: AsyncWrite + Unpin,
    {
        let mut summary = RunSummary::default();
        let mut buf = Vec::new();

        self.start();
        self.on_listener_connected();

        loop {
            buf.clear();
            if reader.read_until(b'\n', &mut buf).await? == 0 {
                break;
            }

            let line = match std::str::from_utf8(&buf) {
                Ok(line) => line.trim(),
                Err(e) => {
                    summary.events += 1;
                    summary.malformed += 1;
                    warn!(error = %e, "Skipping event line that is not valid UTF-8");
                    continue;
                }
            };
            if line.is_empty() {
                continue;
            }
            summary.events += 1;

            let event: ServiceEvent = match serde_json::from_str(line) {
                Ok(event) => event,
                Err(e) => {
                    // 单行格式错误不影响后续事件
                    warn!(error = %e, "Skipping malformed event");
                    summary.malformed += 1;
                    continue;
                }
            };

            match self.handle(event) {
                EventReply::Captured(CaptureOutcome::Dispatched { .. }) => summary.dispatched += 1,
                EventReply::Report(text) => {
                    out.write_all(text.as_bytes()).await?;
                    out.write_all(b"\n").await?;
                    out.flush().await?;
                }
                EventReply::Captured(_) | EventReply::Handled => {}
            }
        }

        self.on_listener_disconnected();
        self.stop();
        info!(
            events = summary.events,
            dispatched = summary.dispatched,
            malformed = summary.malformed,
            "Event stream ended"
        );

        Ok(summary)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::notification::channel::{DeliveryChannel, DeliveryRequest};
    use crate::notification::payload::AppLabels;
    use crate::service::status::ForegroundStatus;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[derive(Default)]
    struct CountingChannel {
        count: AtomicUsize,
    }

    impl DeliveryChannel for CountingChannel {
        fn name(&self) -> &str {
            "counting"
        }

        fn dispatch(&self, _request: DeliveryRequest) {
            self.count.fetch_add(1, Ordering::SeqCst);
        }
    }

    fn create_service(
        settings: Settings,
    ) -> (RelayService, Arc<CountingChannel>, Arc<ForegroundStatus>) {
        let settings: Arc<dyn SettingsSource> = Arc::new(settings);
        let channel = Arc::new(CountingChannel::default());
        let status = Arc::new(ForegroundStatus::new());
        let log = Arc::new(LogSink::new());

        let pipeline = CapturePipeline::new(
            settings.clone(),
            Arc::new(AppLabels::new()),
            channel.clone(),
            status.clone(),
            log.clone(),
        );
        let service = RelayService::new(pipeline, settings, status.clone(), log);
        (service, channel, status)
    }

    fn configured() -> Settings {
        Settings {
            server_url: "http://relay.test".to_string(),
            guid: "guid-1".to_string(),
            ignore_system: true,
        }
    }

    #[test]
    fn test_event_wire_format() {
        let event: ServiceEvent = serde_json::from_str(
            r#"{"type":"posted","package":"com.example.chat","title":"Hi","text":"there"}"#,
        )
        .unwrap();
        assert_eq!(
            event,
            ServiceEvent::Posted(
                CapturedNotification::new("com.example.chat")
                    .with_title("Hi")
                    .with_text("there")
            )
        );

        let event: ServiceEvent = serde_json::from_str(r#"{"type":"restart"}"#).unwrap();
        assert_eq!(event, ServiceEvent::Restart);
    }

    #[test]
    fn test_restart_updates_status() {
        let (service, _channel, status) = create_service(configured());
        service.restart();

        assert_eq!(status.current(), STATUS_RESTARTED);
        assert!(service.log().entries()[0].ends_with("Service restarted with new settings"));
    }

    #[test]
    fn test_status_report() {
        let (service, _channel, _status) = create_service(Settings::default());
        assert_eq!(service.status_report(), "Status: Settings not configured");

        let service = service.with_listener_granted(false);
        service.stop();
        let report = service.status_report();
        let lines: Vec<&str> = report.lines().collect();
        assert_eq!(lines[0], "Status: Notification access not enabled");
        assert!(lines[1].ends_with("Service stopped"));
    }

    #[tokio::test]
    async fn test_run_event_stream() {
        let (service, channel, status) = create_service(configured());
        let input = concat!(
            "{\"type\":\"posted\",\"package\":\"com.example.chat\",\"title\":\"Hi\"}\n",
            "\n",
            "not json\n",
            "{\"type\":\"posted\",\"package\":\"com.android.systemui\",\"title\":\"x\"}\n",
            "{\"type\":\"status\"}\n",
        );
        let mut out = Vec::new();

        let summary = service.run(input.as_bytes(), &mut out).await.unwrap();

        assert_eq!(
            summary,
            RunSummary {
                events: 4,
                dispatched: 1,
                malformed: 1,
            }
        );
        assert_eq!(channel.count.load(Ordering::SeqCst), 1);
        assert_eq!(status.current(), "Last: com.example.chat");

        let printed = String::from_utf8(out).unwrap();
        assert!(printed.starts_with("Status: Ready to forward notifications\n"));
        assert!(printed.contains("Ignored system notification from com.android.systemui"));

        let entries = service.log().entries();
        assert!(entries[0].ends_with("Service started as foreground service"));
        assert!(entries[1].ends_with("Notification listener connected"));
        assert!(entries[entries.len() - 2].ends_with("Notification listener disconnected"));
        assert!(entries[entries.len() - 1].ends_with("Service stopped"));
    }

    #[test]
    fn test_handle_routes_posted_through_pipeline() {
        let (service, channel, _status) = create_service(configured());

        let reply = service.handle(ServiceEvent::Posted(
            CapturedNotification::new("com.example.chat").with_title("Hi"),
        ));
        assert_eq!(
            reply,
            EventReply::Captured(CaptureOutcome::Dispatched {
                title: "Chat - Hi".to_string()
            })
        );
        assert_eq!(channel.count.load(Ordering::SeqCst), 1);

        assert_eq!(service.handle(ServiceEvent::Restart), EventReply::Handled);
        match service.handle(ServiceEvent::Status) {
            EventReply::Report(text) => assert!(text.starts_with("Status: Ready")),
            other => panic!("unexpected reply: {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_run_skips_invalid_utf8_line() {
        let (service, channel, _status) = create_service(configured());
        let mut input = Vec::new();
        input.extend_from_slice(br#"{"type":"posted","package":"com.a.one","title":"one"}"#);
        input.push(b'\n');
        // "café" 以 Latin-1 编码，不是合法 UTF-8
        input.extend_from_slice(br#"{"type":"posted","package":"com.a.bad","title":"caf"#);
        input.extend_from_slice(b"\xe9\"}\n");
        input.extend_from_slice(br#"{"type":"posted","package":"com.a.two","title":"two"}"#);
        input.push(b'\n');
        let mut out = Vec::new();

        let summary = service.run(&input[..], &mut out).await.unwrap();

        assert_eq!(
            summary,
            RunSummary {
                events: 3,
                dispatched: 2,
                malformed: 1,
            }
        );
        assert_eq!(channel.count.load(Ordering::SeqCst), 2);

        let entries = service.log().entries();
        assert!(entries
            .iter()
            .any(|e| e.ends_with("New notification from com.a.one: one")));
        assert!(entries
            .iter()
            .any(|e| e.ends_with("New notification from com.a.two: two")));
        assert!(entries[entries.len() - 2].ends_with("Notification listener disconnected"));
        assert!(entries[entries.len() - 1].ends_with("Service stopped"));
    }
}
