//! 转发设置 - 本地 JSON 文件读写
//!
//! 存储位置：`~/.config/notification-relay/settings.json`
//!
//! ```json
//! {
//!   "server_url": "https://api.opennotification.org",
//!   "guid": "",
//!   "ignore_system": true
//! }
//! ```
//!
//! 每个通知事件都会重新读取设置，不做缓存。

use anyhow::{anyhow, Context, Result};
use serde::{Deserialize, Serialize};
use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::str::FromStr;

/// 默认服务器地址
pub const DEFAULT_SERVER_URL: &str = "https://api.opennotification.org";

/// 转发设置
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// 服务器基础 URL
    pub server_url: String,
    /// 转发 GUID（为空时不转发）
    pub guid: String,
    /// 是否忽略系统通知
    pub ignore_system: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            server_url: DEFAULT_SERVER_URL.to_string(),
            guid: String::new(),
            ignore_system: true,
        }
    }
}

impl Settings {
    /// URL 和 GUID 都非空时才能投递
    pub fn is_deliverable(&self) -> bool {
        !self.server_url.trim().is_empty() && !self.guid.trim().is_empty()
    }

    /// 是否已设置 GUID（状态栏使用）
    pub fn has_guid(&self) -> bool {
        !self.guid.is_empty()
    }

    /// 保存前校验：去掉首尾空白，URL 和 GUID 不能为空
    pub fn validated(self) -> Result<Self> {
        let server_url = self.server_url.trim().to_string();
        let guid = self.guid.trim().to_string();

        if server_url.is_empty() {
            return Err(anyhow!("Server URL cannot be empty"));
        }
        if guid.is_empty() {
            return Err(anyhow!("GUID cannot be empty"));
        }

        Ok(Self {
            server_url,
            guid,
            ignore_system: self.ignore_system,
        })
    }

    /// 修改单个字段
    pub fn set(&mut self, key: SettingKey, value: &str) -> Result<()> {
        match key {
            SettingKey::ServerUrl => self.server_url = value.trim().to_string(),
            SettingKey::Guid => self.guid = value.trim().to_string(),
            SettingKey::IgnoreSystem => {
                self.ignore_system = parse_bool(value).ok_or_else(|| {
                    anyhow!("ignore_system 需要布尔值，实际为: {}", value)
                })?;
            }
        }
        Ok(())
    }
}

fn parse_bool(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "true" | "yes" | "on" | "1" => Some(true),
        "false" | "no" | "off" | "0" => Some(false),
        _ => None,
    }
}

/// 设置项名称
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SettingKey {
    ServerUrl,
    Guid,
    IgnoreSystem,
}

impl SettingKey {
    pub fn as_str(&self) -> &'static str {
        match self {
            SettingKey::ServerUrl => "server_url",
            SettingKey::Guid => "guid",
            SettingKey::IgnoreSystem => "ignore_system",
        }
    }
}

impl FromStr for SettingKey {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().replace('-', "_").as_str() {
            "server_url" | "url" => Ok(SettingKey::ServerUrl),
            "guid" => Ok(SettingKey::Guid),
            "ignore_system" => Ok(SettingKey::IgnoreSystem),
            _ => Err(anyhow!(
                "未知的设置项: {}，可选: server_url, guid, ignore_system",
                s
            )),
        }
    }
}

/// 设置来源（每次使用时读取）
pub trait SettingsSource: Send + Sync {
    fn load(&self) -> Result<Settings>;
}

/// 固定设置，直接作为来源使用
impl SettingsSource for Settings {
    fn load(&self) -> Result<Settings> {
        Ok(self.clone())
    }
}

/// 配置目录 `~/.config/notification-relay`
pub fn config_dir() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".config")
        .join("notification-relay")
}

/// 基于文件的设置存储
#[derive(Debug, Clone)]
pub struct SettingsStore {
    path: PathBuf,
}

impl SettingsStore {
    /// 使用默认路径
    pub fn new() -> Self {
        Self {
            path: config_dir().join("settings.json"),
        }
    }

    /// 使用指定路径（测试用）
    pub fn with_path(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// 保存设置（带文件锁）
    pub fn save(&self, settings: &Settings) -> Result<()> {
        use fs2::FileExt;

        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create {}", parent.display()))?;
        }

        let content = serde_json::to_string_pretty(settings)?;
        let mut file = OpenOptions::new()
            .create(true)
            .write(true)
            .truncate(false)
            .open(&self.path)
            .with_context(|| format!("Failed to open {}", self.path.display()))?;

        file.lock_exclusive()?;
        // 加锁后再截断，避免其它进程读到半截内容
        file.set_len(0)?;
        file.write_all(content.as_bytes())?;
        file.write_all(b"\n")?;
        file.unlock()?;

        Ok(())
    }

    /// 修改单个字段并保存
    pub fn update(&self, key: SettingKey, value: &str) -> Result<Settings> {
        let mut settings = self.load()?;
        settings.set(key, value)?;
        self.save(&settings)?;
        Ok(settings)
    }
}

impl SettingsSource for SettingsStore {
    /// 文件不存在时返回默认值
    fn load(&self) -> Result<Settings> {
        if !self.path.exists() {
            return Ok(Settings::default());
        }

        let content = fs::read_to_string(&self.path)
            .with_context(|| format!("Failed to read {}", self.path.display()))?;
        if content.trim().is_empty() {
            return Ok(Settings::default());
        }

        let settings = serde_json::from_str(&content)
            .with_context(|| format!("Invalid settings file {}", self.path.display()))?;
        Ok(settings)
    }
}

impl Default for SettingsStore {
    fn default() -> Self {
        Self::new()
    }
}
