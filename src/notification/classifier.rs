//! 系统通知分类 - 判断来源包名是否属于系统/厂商噪音
//!
//! 规则是声明式的三组列表：
//! - 精确匹配的包名
//! - 包名前缀
//! - 包名子串
//!
//! 任一规则命中即视为系统通知。子串规则（`system`、`settings`）会误伤
//! 包名里带这些词的第三方应用，这是有意保留的宽松过滤。

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::path::Path;
use std::sync::OnceLock;

/// 内置的系统/厂商包名
pub const SYSTEM_PACKAGES: &[&str] = &[
    // Android 系统
    "android",
    "com.android.systemui",
    "com.android.settings",
    "com.android.providers.settings",
    "com.android.phone",
    "com.android.dialer",
    "com.android.contacts",
    "com.android.calculator2",
    "com.android.calendar",
    "com.android.deskclock",
    "com.android.packageinstaller",
    "com.android.permissioncontroller",
    "com.android.cellbroadcastreceiver",
    "com.android.emergency",
    // Google Play 服务和商店
    "com.google.android.gms",
    "com.google.android.gsf",
    "com.android.vending",
    "com.google.android.packageinstaller",
    "com.google.android.permissioncontroller",
    // Samsung
    "com.samsung.android.dialer",
    "com.samsung.android.contacts",
    "com.samsung.android.app.settings",
    "com.sec.android.app.launcher",
    "com.samsung.android.messaging",
    // 其它厂商
    "com.miui.securitycenter",
    "com.huawei.systemmanager",
    "com.oneplus.security",
    "com.coloros.safecenter",
    "com.bbk.theme",
    // 安全和设备管理
    "com.android.keychain",
    "com.android.certinstaller",
    "com.android.managedprovisioning",
];

/// 内置前缀规则
pub const SYSTEM_PREFIXES: &[&str] = &["com.android.", "com.google.android.", "android."];

/// 内置子串规则
pub const SYSTEM_SUBSTRINGS: &[&str] = &["system", "settings"];

/// 系统包名规则
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SystemPackageRules {
    /// 精确匹配
    pub exact: BTreeSet<String>,
    /// 前缀匹配
    pub prefixes: Vec<String>,
    /// 子串匹配
    pub substrings: Vec<String>,
}

impl Default for SystemPackageRules {
    fn default() -> Self {
        Self {
            exact: SYSTEM_PACKAGES.iter().map(|s| s.to_string()).collect(),
            prefixes: SYSTEM_PREFIXES.iter().map(|s| s.to_string()).collect(),
            substrings: SYSTEM_SUBSTRINGS.iter().map(|s| s.to_string()).collect(),
        }
    }
}

impl SystemPackageRules {
    /// 不含任何规则
    pub fn empty() -> Self {
        Self {
            exact: BTreeSet::new(),
            prefixes: Vec::new(),
            substrings: Vec::new(),
        }
    }

    /// 是否为系统/厂商通知
    pub fn is_system(&self, package: &str) -> bool {
        self.exact.contains(package)
            || self.prefixes.iter().any(|p| package.starts_with(p.as_str()))
            || self.substrings.iter().any(|s| package.contains(s.as_str()))
    }

    /// 合并另一组规则（只增不减）
    pub fn extend(&mut self, other: SystemPackageRules) {
        self.exact.extend(other.exact);
        for prefix in other.prefixes {
            if !self.prefixes.contains(&prefix) {
                self.prefixes.push(prefix);
            }
        }
        for substring in other.substrings {
            if !self.substrings.contains(&substring) {
                self.substrings.push(substring);
            }
        }
    }

    /// 从 JSON 文件读取额外规则，并合并到内置规则上
    pub fn load_with_defaults(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read rules file {}", path.display()))?;
        let extra: SystemPackageRules = serde_json::from_str(&content)
            .with_context(|| format!("Invalid rules file {}", path.display()))?;

        let mut rules = Self::default();
        rules.extend(extra);
        Ok(rules)
    }
}

/// 使用内置规则判断
pub fn is_system_package(package: &str) -> bool {
    static DEFAULT_RULES: OnceLock<SystemPackageRules> = OnceLock::new();
    DEFAULT_RULES
        .get_or_init(SystemPackageRules::default)
        .is_system(package)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_every_listed_package_is_system() {
        for package in SYSTEM_PACKAGES {
            assert!(is_system_package(package), "{} should be system", package);
        }
    }

    #[test]
    fn test_third_party_package_is_not_system() {
        assert!(!is_system_package("com.example.chat"));
        assert!(!is_system_package("org.telegram.messenger"));
        assert!(!is_system_package("com.whatsapp"));
    }

    #[test]
    fn test_prefix_rules() {
        assert!(is_system_package("com.android.anything"));
        assert!(is_system_package("com.google.android.youtube"));
        assert!(is_system_package("android.process.media"));
        // "android" 只是精确匹配，不是前缀
        assert!(!is_system_package("androidx.demo"));
    }

    #[test]
    fn test_substring_rules_are_broad() {
        // 带 settings/system 的第三方包也会被过滤
        assert!(is_system_package("com.example.settingsapp"));
        assert!(is_system_package("io.acme.filesystemtools"));
    }

    #[test]
    fn test_matching_is_case_sensitive() {
        assert!(!is_system_package("com.example.Settings"));
    }

    #[test]
    fn test_empty_rules_match_nothing() {
        let rules = SystemPackageRules::empty();
        assert!(!rules.is_system("com.android.systemui"));
    }

    #[test]
    fn test_extend_rules() {
        let mut rules = SystemPackageRules::default();
        let before = rules.prefixes.len();
        rules.extend(SystemPackageRules {
            exact: ["com.vendor.launcher".to_string()].into_iter().collect(),
            prefixes: vec!["com.android.".to_string(), "com.xiaomi.".to_string()],
            substrings: vec![],
        });

        assert_eq!(rules.prefixes.len(), before + 1);
        assert!(rules.is_system("com.vendor.launcher"));
        assert!(rules.is_system("com.xiaomi.market"));
        assert!(rules.is_system("com.android.systemui"));
    }

    #[test]
    fn test_load_with_defaults() {
        let temp = tempfile::tempdir().unwrap();
        let path = temp.path().join("rules.json");
        std::fs::write(&path, r#"{"exact": ["com.oem.updater"]}"#).unwrap();

        let rules = SystemPackageRules::load_with_defaults(&path).unwrap();
        assert!(rules.is_system("com.oem.updater"));
        assert!(rules.is_system("android"));
        assert!(!rules.is_system("com.example.chat"));
    }
}
