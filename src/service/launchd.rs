//! launchd 自动启动（macOS）
//!
//! 登录时以 `nrelay boot --reason boot-completed` 启动转发服务，
//! 作用相当于移动端的开机广播接收器。

use anyhow::{Context, Result};
use std::path::{Path, PathBuf};
use std::process::Command;

use crate::settings::config_dir;

/// Service status information
#[derive(Debug, Clone)]
pub struct ServiceStatus {
    pub installed: bool,
    pub running: bool,
    pub pid: Option<u32>,
}

/// 自动启动参数
#[derive(Debug, Clone)]
pub struct AutostartOptions {
    /// 事件流路径（宿主桥接写入的 FIFO/文件）
    pub events: PathBuf,
    /// 已授权的监听组件列表，写入 `ENABLED_NOTIFICATION_LISTENERS`
    pub enabled_listeners: Option<String>,
}

/// launchd agent 管理
pub struct LaunchdService {
    plist_path: PathBuf,
    log_dir: PathBuf,
    binary: Option<PathBuf>,
}

impl LaunchdService {
    const SERVICE_LABEL: &'static str = "org.opennotification.relay";
    const PLIST_NAME: &'static str = "org.opennotification.relay.plist";

    pub fn new() -> Result<Self> {
        let home = dirs::home_dir().context("Failed to get home directory")?;
        let plist_path = home.join("Library/LaunchAgents").join(Self::PLIST_NAME);

        Ok(Self {
            plist_path,
            log_dir: config_dir().join("logs"),
            binary: None,
        })
    }

    /// 指定路径（测试用）
    pub fn with_paths(plist_path: PathBuf, log_dir: PathBuf, binary: PathBuf) -> Self {
        Self {
            plist_path,
            log_dir,
            binary: Some(binary),
        }
    }

    pub fn plist_path(&self) -> &Path {
        &self.plist_path
    }

    fn binary_path(&self) -> Result<PathBuf> {
        match &self.binary {
            Some(path) => Ok(path.clone()),
            None => std::env::current_exe().context("Failed to get current executable path"),
        }
    }

    /// Generate plist content for launchd
    pub fn generate_plist(&self, options: &AutostartOptions) -> Result<String> {
        let binary = self.binary_path()?;
        let (stdout_log, stderr_log) = self.log_paths();

        let env = options
            .enabled_listeners
            .as_deref()
            .map(|flat| {
                format!(
                    "    <key>EnvironmentVariables</key>\n    <dict>\n        <key>ENABLED_NOTIFICATION_LISTENERS</key>\n        <string>{}</string>\n    </dict>\n",
                    xml_escape(flat)
                )
            })
            .unwrap_or_default();

        Ok(format!(
            r#"<?xml version="1.0" encoding="UTF-8"?>
<!DOCTYPE plist PUBLIC "-//Apple//DTD PLIST 1.0//EN" "http://www.apple.com/DTDs/PropertyList-1.0.dtd">
<plist version="1.0">
<dict>
    <key>Label</key>
    <string>{label}</string>
    <key>ProgramArguments</key>
    <array>
        <string>{binary}</string>
        <string>boot</string>
        <string>--reason</string>
        <string>boot-completed</string>
        <string>--events</string>
        <string>{events}</string>
    </array>
    <key>RunAtLoad</key>
    <true/>
    <key>StandardOutPath</key>
    <string>{stdout}</string>
    <key>StandardErrorPath</key>
    <string>{stderr}</string>
{env}</dict>
</plist>
"#,
            label = Self::SERVICE_LABEL,
            binary = xml_escape(&binary.display().to_string()),
            events = xml_escape(&options.events.display().to_string()),
            stdout = xml_escape(&stdout_log.display().to_string()),
            stderr = xml_escape(&stderr_log.display().to_string()),
            env = env,
        ))
    }

    /// 写入 plist 并加载
    pub fn install(&self, options: &AutostartOptions) -> Result<()> {
        std::fs::create_dir_all(&self.log_dir).context("Failed to create log directory")?;

        if let Some(parent) = self.plist_path.parent() {
            std::fs::create_dir_all(parent).context("Failed to create LaunchAgents directory")?;
        }

        let plist_content = self.generate_plist(options)?;
        std::fs::write(&self.plist_path, &plist_content).context("Failed to write plist file")?;

        // 加载失败时删除 plist
        if let Err(e) = self.load() {
            let _ = std::fs::remove_file(&self.plist_path);
            return Err(e);
        }

        Ok(())
    }

    pub fn uninstall(&self) -> Result<()> {
        let _ = self.unload();

        if self.plist_path.exists() {
            std::fs::remove_file(&self.plist_path).context("Failed to remove plist file")?;
        }

        Ok(())
    }

    fn load(&self) -> Result<()> {
        let status = Command::new("launchctl")
            .args(["load", "-w"])
            .arg(&self.plist_path)
            .status()
            .context("Failed to execute launchctl load")?;

        if !status.success() {
            anyhow::bail!("launchctl load failed with status: {}", status);
        }

        Ok(())
    }

    fn unload(&self) -> Result<()> {
        let status = Command::new("launchctl")
            .args(["unload"])
            .arg(&self.plist_path)
            .status()
            .context("Failed to execute launchctl unload")?;

        if !status.success() {
            anyhow::bail!("launchctl unload failed with status: {}", status);
        }

        Ok(())
    }

    pub fn status(&self) -> Result<ServiceStatus> {
        if !self.plist_path.exists() {
            return Ok(ServiceStatus {
                installed: false,
                running: false,
                pid: None,
            });
        }

        let output = Command::new("launchctl")
            .args(["list", Self::SERVICE_LABEL])
            .output()
            .context("Failed to execute launchctl list")?;

        if !output.status.success() {
            return Ok(ServiceStatus {
                installed: true,
                running: false,
                pid: None,
            });
        }

        let pid = parse_launchctl_pid(&String::from_utf8_lossy(&output.stdout));
        Ok(ServiceStatus {
            installed: true,
            running: pid.is_some(),
            pid,
        })
    }

    pub fn log_paths(&self) -> (PathBuf, PathBuf) {
        (
            self.log_dir.join("relay.stdout.log"),
            self.log_dir.join("relay.stderr.log"),
        )
    }
}

/// `"PID" = 12345;`
fn parse_launchctl_pid(stdout: &str) -> Option<u32> {
    stdout
        .lines()
        .find(|line| line.contains("\"PID\""))
        .and_then(|line| {
            line.split('=')
                .nth(1)
                .map(|s| s.trim().trim_end_matches(';').trim())
                .and_then(|s| s.parse::<u32>().ok())
        })
        .filter(|&pid| pid > 0)
}

fn xml_escape(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}
