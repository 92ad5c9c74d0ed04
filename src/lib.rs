//! Notification Relay - 把设备通知转发到 HTTP 服务器

pub mod cli;
pub mod log_sink;
pub mod notification;
pub mod service;
pub mod settings;

pub use log_sink::LogSink;
pub use notification::{
    is_system_package, CaptureOutcome, CapturePipeline, CapturedNotification, DeliveryChannel,
    DeliveryOutcome, DeliveryRequest, HttpDelivery, OutboundPayload, SystemPackageRules,
};
pub use service::{
    BootDecision, BootReason, BootReceiver, EnabledListeners, EventReply, RelayService,
    ServiceEvent, StatusLine,
};
pub use settings::{SettingKey, Settings, SettingsSource, SettingsStore, DEFAULT_SERVER_URL};
