//! 通知转发管线
//!
//! posted 事件 -> `CapturePipeline`（过滤）-> `PayloadBuilder` -> `DeliveryChannel` -> 远端服务器
//!
//! # 使用示例
//! ```ignore
//! use notification_relay::notification::{
//!     AppLabels, CapturePipeline, CapturedNotification, HttpDelivery,
//! };
//!
//! let delivery = Arc::new(HttpDelivery::new(log.clone())?);
//! let registry = Arc::new(AppLabels::new());
//! let pipeline = CapturePipeline::new(settings, registry, delivery, status, log);
//! let notification = CapturedNotification::new("com.example.chat").with_title("Hi");
//! pipeline.on_notification_posted(&notification);
//! ```

pub mod channel;
pub mod classifier;
pub mod event;
pub mod payload;
pub mod pipeline;
pub mod webhook;

pub use channel::{DeliveryChannel, DeliveryOutcome, DeliveryRequest};
pub use classifier::{is_system_package, SystemPackageRules};
pub use event::CapturedNotification;
pub use payload::{fallback_display_name, AppLabels, AppRegistry, OutboundPayload, PayloadBuilder};
pub use pipeline::{CaptureOutcome, CapturePipeline, RELAY_PACKAGE};
pub use webhook::{DeliveryTimeouts, HttpDelivery};
