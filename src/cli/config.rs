// src/cli/config.rs
//! Config / Status 命令 - 查看和修改转发设置

use anyhow::Result;
use clap::{Args, Subcommand};

use super::output::format_output;
use crate::notification::RELAY_PACKAGE;
use crate::service::{EnabledListeners, StatusLine};
use crate::settings::{SettingKey, SettingsSource, SettingsStore};

/// Config 子命令
#[derive(Subcommand)]
pub enum ConfigCommand {
    /// 显示当前设置
    Show {
        /// 输出 JSON 格式
        #[arg(long)]
        json: bool,
    },
    /// 修改单个设置项: server_url, guid, ignore_system
    Set {
        key: String,
        value: String,
    },
}

/// Status 命令参数
#[derive(Args)]
pub struct StatusArgs {
    /// 已授权的监听组件列表（默认读取 ENABLED_NOTIFICATION_LISTENERS）
    #[arg(long)]
    pub enabled_listeners: Option<String>,
}

/// 处理 config 命令
pub fn handle_config(command: ConfigCommand) -> Result<()> {
    let store = SettingsStore::new();

    match command {
        ConfigCommand::Show { json } => {
            let settings = store.load()?;
            if json {
                println!("{}", format_output(&settings, true));
            } else {
                println!("Settings file: {}", store.path().display());
                println!("server_url    = {}", settings.server_url);
                println!("guid          = {}", settings.guid);
                println!("ignore_system = {}", settings.ignore_system);
            }
        }
        ConfigCommand::Set { key, value } => {
            let key: SettingKey = key.parse()?;
            store.update(key, &value)?;
            println!("✓ {} updated", key.as_str());
        }
    }

    Ok(())
}

/// 处理 status 命令
pub fn handle_status(args: StatusArgs) -> Result<()> {
    let listeners = args
        .enabled_listeners
        .as_deref()
        .map(EnabledListeners::parse)
        .unwrap_or_else(EnabledListeners::from_env);

    let settings = SettingsStore::new().load()?;
    let line = StatusLine::evaluate(listeners.is_granted(RELAY_PACKAGE), &settings);
    println!("{}", line);
    Ok(())
}
