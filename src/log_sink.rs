//! 状态日志 - 有界 FIFO 缓冲区
//!
//! 所有组件把面向用户的状态文本写到这里，状态界面轮询 `content()` 显示。
//! 条目格式：`[HH:MM:SS] <message>`，最多保留 100 条，超出后丢弃最旧的条目。

use chrono::Local;
use std::collections::VecDeque;
use std::sync::{Mutex, MutexGuard};
use tracing::info;

/// 默认保留条数
pub const MAX_LOG_ENTRIES: usize = 100;

/// 有界状态日志（线程安全，可在多个 dispatch 任务之间共享）
#[derive(Debug)]
pub struct LogSink {
    entries: Mutex<VecDeque<String>>,
    capacity: usize,
}

impl LogSink {
    /// 创建默认容量的日志
    pub fn new() -> Self {
        Self::with_capacity(MAX_LOG_ENTRIES)
    }

    /// 创建指定容量的日志
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            entries: Mutex::new(VecDeque::with_capacity(capacity)),
            capacity,
        }
    }

    /// 追加一条日志，同时写入 tracing
    pub fn add(&self, message: impl AsRef<str>) {
        let message = message.as_ref();
        info!(target: "relay_log", "{}", message);

        let entry = format!("[{}] {}", Local::now().format("%H:%M:%S"), message);
        let mut entries = self.lock();
        entries.push_back(entry);
        while entries.len() > self.capacity {
            entries.pop_front();
        }
    }

    /// 按写入顺序返回所有条目
    pub fn entries(&self) -> Vec<String> {
        self.lock().iter().cloned().collect()
    }

    /// 所有条目以换行拼接（用于状态显示）
    pub fn content(&self) -> String {
        self.entries().join("\n")
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    pub fn clear(&self) {
        self.lock().clear();
    }

    // 单条日志损坏不影响其它条目，锁中毒时继续使用内部数据
    fn lock(&self) -> MutexGuard<'_, VecDeque<String>> {
        self.entries.lock().unwrap_or_else(|e| e.into_inner())
    }
}

impl Default for LogSink {
    fn default() -> Self {
        Self::new()
    }
}
