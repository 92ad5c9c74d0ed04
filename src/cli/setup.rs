// src/cli/setup.rs
//! Setup 命令 - 交互式编辑转发设置

use anyhow::{Context, Result};
use clap::Args;
use dialoguer::{Confirm, Input};

use crate::settings::{Settings, SettingsSource, SettingsStore};

/// Setup 命令参数
#[derive(Args)]
pub struct SetupArgs {
    /// 直接指定服务器 URL，跳过提示
    #[arg(long)]
    pub server_url: Option<String>,

    /// 直接指定 GUID，跳过提示
    #[arg(long)]
    pub guid: Option<String>,

    /// 直接指定是否忽略系统通知，跳过提示
    #[arg(long)]
    pub ignore_system: Option<bool>,
}

/// 处理 setup 命令
pub fn handle_setup(args: SetupArgs) -> Result<()> {
    let store = SettingsStore::new();
    let current = store.load().unwrap_or_default();

    println!("Notification Relay - 设置\n");
    println!("Settings file: {}\n", store.path().display());

    let server_url = match args.server_url {
        Some(url) => url,
        None => Input::new()
            .with_prompt("Server URL")
            .default(current.server_url.clone())
            .interact_text()
            .context("读取 server URL 失败")?,
    };

    let guid = match args.guid {
        Some(guid) => guid,
        None => Input::new()
            .with_prompt("GUID")
            .default(current.guid.clone())
            .allow_empty(true)
            .interact_text()
            .context("读取 GUID 失败")?,
    };

    let ignore_system = match args.ignore_system {
        Some(value) => value,
        None => Confirm::new()
            .with_prompt("Ignore system notifications?")
            .default(current.ignore_system)
            .interact()
            .context("读取 ignore_system 失败")?,
    };

    let settings = Settings {
        server_url,
        guid,
        ignore_system,
    }
    .validated()?;

    store.save(&settings)?;
    println!("✓ Settings saved");
    println!("  正在运行的 relay 可发送 {{\"type\":\"restart\"}} 事件刷新状态");

    Ok(())
}
