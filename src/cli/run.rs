// src/cli/run.rs
//! Run / Boot / Send 命令 - 启动转发服务
//!
//! 事件流默认来自 stdin，也可以用 `--events` 指定文件或 FIFO。

use anyhow::{Context, Result};
use clap::Args;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tokio::io::{AsyncBufRead, BufReader};
use tracing::info;

use crate::log_sink::LogSink;
use crate::notification::{
    AppLabels, CaptureOutcome, CapturePipeline, CapturedNotification, HttpDelivery,
    SystemPackageRules, RELAY_PACKAGE,
};
use crate::service::{
    BootDecision, BootReason, BootReceiver, EnabledListeners, ForegroundStatus, RelayService,
};
use crate::settings::{config_dir, SettingsSource, SettingsStore};

/// 服务公共参数
#[derive(Args, Debug, Clone)]
pub struct RelayOptions {
    /// 事件流文件/FIFO（默认 stdin）
    #[arg(long)]
    pub events: Option<PathBuf>,

    /// 额外的系统包规则文件（JSON）
    #[arg(long)]
    pub rules: Option<PathBuf>,

    /// 应用名映射文件（默认 ~/.config/notification-relay/apps.json）
    #[arg(long)]
    pub apps: Option<PathBuf>,

    /// 已授权的监听组件列表（默认读取 ENABLED_NOTIFICATION_LISTENERS）
    #[arg(long)]
    pub enabled_listeners: Option<String>,

    /// 事件流结束后等待未完成投递的秒数
    #[arg(long, default_value = "5")]
    pub drain_secs: u64,
}

impl RelayOptions {
    pub fn listeners(&self) -> EnabledListeners {
        self.enabled_listeners
            .as_deref()
            .map(EnabledListeners::parse)
            .unwrap_or_else(EnabledListeners::from_env)
    }

    fn rules(&self) -> Result<SystemPackageRules> {
        match &self.rules {
            Some(path) => SystemPackageRules::load_with_defaults(path),
            None => Ok(SystemPackageRules::default()),
        }
    }

    fn apps(&self) -> Result<AppLabels> {
        let path = self
            .apps
            .clone()
            .unwrap_or_else(|| config_dir().join("apps.json"));
        AppLabels::load(&path)
    }
}

/// Run 命令参数
#[derive(Args)]
pub struct RunArgs {
    #[command(flatten)]
    pub options: RelayOptions,
}

/// Boot 命令参数
#[derive(Args)]
pub struct BootArgs {
    /// 触发原因: boot-completed, my-package-replaced, package-replaced
    #[arg(long, default_value = "boot-completed")]
    pub reason: String,

    #[command(flatten)]
    pub options: RelayOptions,
}

/// Send 命令参数
#[derive(Args)]
pub struct SendArgs {
    /// 来源包名
    #[arg(long, short)]
    pub package: String,

    /// 标题
    #[arg(long, short)]
    pub title: Option<String>,

    /// 正文
    #[arg(long)]
    pub text: Option<String>,

    #[command(flatten)]
    pub options: RelayOptions,
}

/// 组装好的服务
struct Relay {
    service: RelayService,
    delivery: HttpDelivery,
}

fn build_relay(options: &RelayOptions, log: Arc<LogSink>) -> Result<Relay> {
    let settings: Arc<dyn SettingsSource> = Arc::new(SettingsStore::new());
    let status = Arc::new(ForegroundStatus::new());
    let delivery = HttpDelivery::new(log.clone())?;

    let pipeline = CapturePipeline::new(
        settings.clone(),
        Arc::new(options.apps()?),
        Arc::new(delivery.clone()),
        status.clone(),
        log.clone(),
    )
    .with_rules(options.rules()?);

    let granted = options.listeners().is_granted(pipeline.own_package());
    let service = RelayService::new(pipeline, settings, status, log).with_listener_granted(granted);

    Ok(Relay { service, delivery })
}

async fn open_events(path: Option<&PathBuf>) -> Result<Box<dyn AsyncBufRead + Unpin + Send>> {
    match path {
        Some(path) => {
            let file = tokio::fs::File::open(path)
                .await
                .with_context(|| format!("Failed to open event stream {}", path.display()))?;
            Ok(Box::new(BufReader::new(file)))
        }
        None => Ok(Box::new(BufReader::new(tokio::io::stdin()))),
    }
}

async fn run_relay(relay: Relay, options: &RelayOptions) -> Result<()> {
    let events = open_events(options.events.as_ref()).await?;
    let summary = relay.service.run(events, tokio::io::stdout()).await?;

    let pending = relay
        .delivery
        .drain(Duration::from_secs(options.drain_secs))
        .await;
    info!(
        dispatched = summary.dispatched,
        abandoned = pending,
        "Relay finished"
    );
    Ok(())
}

/// 处理 run 命令
pub async fn handle_run(args: RunArgs) -> Result<()> {
    let log = Arc::new(LogSink::new());
    let relay = build_relay(&args.options, log)?;
    run_relay(relay, &args.options).await
}

/// 处理 boot 命令
pub async fn handle_boot(args: BootArgs) -> Result<()> {
    let log = Arc::new(LogSink::new());
    let reason: BootReason = args
        .reason
        .parse()
        .unwrap_or_else(|_| BootReason::Other(args.reason.clone()));

    let receiver = BootReceiver::new(RELAY_PACKAGE, log.clone());
    match receiver.on_receive(&reason, &args.options.listeners()) {
        BootDecision::Start => {
            let relay = build_relay(&args.options, log)?;
            run_relay(relay, &args.options).await
        }
        BootDecision::AccessDenied => {
            println!("{}", log.content());
            Ok(())
        }
        BootDecision::Ignored => {
            info!(reason = %args.reason, "Boot trigger ignored");
            Ok(())
        }
    }
}

/// 处理 send 命令：一个事件走完整管线，并等待投递结果
pub async fn handle_send(args: SendArgs) -> Result<()> {
    let log = Arc::new(LogSink::new());
    let relay = build_relay(&args.options, log.clone())?;

    let notification = CapturedNotification {
        package: args.package,
        title: args.title,
        text: args.text,
        big_text: None,
    };

    let outcome = relay.service.on_notification_posted(&notification);
    if let CaptureOutcome::Dispatched { .. } = outcome {
        relay
            .delivery
            .drain(Duration::from_secs(args.options.drain_secs.max(1)))
            .await;
    }

    println!("{:?}", outcome);
    let content = log.content();
    if !content.is_empty() {
        println!("{}", content);
    }
    Ok(())
}
