//! Notification Relay CLI
//!
//! 把设备通知转发到 OpenNotification 兼容的 HTTP 服务器

use anyhow::Result;
use clap::{Parser, Subcommand};
use notification_relay::cli::{
    BootArgs, ConfigCommand, RunArgs, SendArgs, ServiceCommand, SetupArgs, StatusArgs,
};
use tracing_subscriber::{fmt, EnvFilter};

#[derive(Parser)]
#[command(name = "nrelay")]
#[command(about = "Notification Relay - 把设备通知转发到 HTTP 服务器")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// 从事件流读取通知并转发
    Run(RunArgs),
    /// 开机/更新后启动（检查监听权限）
    Boot(BootArgs),
    /// 转发单条通知并等待结果
    Send(SendArgs),
    /// 显示状态行
    Status(StatusArgs),
    /// 查看或修改设置
    Config {
        #[command(subcommand)]
        command: ConfigCommand,
    },
    /// 交互式编辑设置
    Setup(SetupArgs),
    /// 管理登录自动启动（macOS launchd）
    Service {
        #[command(subcommand)]
        command: ServiceCommand,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    // 通过 RUST_LOG 环境变量控制日志级别，默认为 info
    // 例如: RUST_LOG=debug nrelay run
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("notification_relay=info,nrelay=info,relay_log=info"));

    fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(filter)
        .with_target(false)
        .with_thread_ids(false)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Run(args) => notification_relay::cli::handle_run(args).await?,
        Commands::Boot(args) => notification_relay::cli::handle_boot(args).await?,
        Commands::Send(args) => notification_relay::cli::handle_send(args).await?,
        Commands::Status(args) => notification_relay::cli::handle_status(args)?,
        Commands::Config { command } => notification_relay::cli::handle_config(command)?,
        Commands::Setup(args) => notification_relay::cli::handle_setup(args)?,
        Commands::Service { command } => notification_relay::cli::handle_service(command)?,
    }

    Ok(())
}
