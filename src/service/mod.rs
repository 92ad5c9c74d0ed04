//! 转发服务 - 生命周期、开机启动、状态展示

pub mod boot;
pub mod launchd;
pub mod listener;
pub mod status;

pub use boot::{BootDecision, BootReason, BootReceiver, EnabledListeners};
pub use launchd::{AutostartOptions, LaunchdService, ServiceStatus};
pub use listener::{EventReply, RelayService, RunSummary, ServiceEvent};
pub use status::{ForegroundStatus, StatusIndicator, StatusLine};
