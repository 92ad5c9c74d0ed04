// src/cli/autostart.rs
//! Service 命令 - 管理登录自动启动

use anyhow::Result;
use clap::Subcommand;
use std::path::PathBuf;

use crate::service::{AutostartOptions, LaunchdService};
use crate::settings::config_dir;

/// Service 子命令
#[derive(Subcommand)]
pub enum ServiceCommand {
    /// 安装 launchd agent
    Install {
        /// 事件流 FIFO（默认 ~/.config/notification-relay/events.fifo）
        #[arg(long)]
        events: Option<PathBuf>,
        /// 写入 agent 环境的监听组件列表
        #[arg(long)]
        enabled_listeners: Option<String>,
    },
    /// 卸载 launchd agent
    Uninstall,
    /// 查看 agent 状态
    Status,
}

/// 处理 service 命令
pub fn handle_service(command: ServiceCommand) -> Result<()> {
    let service = LaunchdService::new()?;

    match command {
        ServiceCommand::Install {
            events,
            enabled_listeners,
        } => {
            let options = AutostartOptions {
                events: events.unwrap_or_else(|| config_dir().join("events.fifo")),
                enabled_listeners,
            };
            service.install(&options)?;
            println!("✓ Installed {}", service.plist_path().display());
        }
        ServiceCommand::Uninstall => {
            service.uninstall()?;
            println!("✓ Uninstalled");
        }
        ServiceCommand::Status => {
            let status = service.status()?;
            let (stdout_log, stderr_log) = service.log_paths();
            println!("Installed: {}", status.installed);
            println!("Running:   {}", status.running);
            if let Some(pid) = status.pid {
                println!("PID:       {}", pid);
            }
            println!("Logs:      {}", stdout_log.display());
            println!("           {}", stderr_log.display());
        }
    }

    Ok(())
}
