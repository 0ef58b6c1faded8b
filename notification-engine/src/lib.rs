//! Push-notification delivery engine for the Campus backend.
//!
//! Feature code (post creation, notes upload, announcements) hands the
//! engine a notification category and a payload; the engine resolves the
//! audience from per-user preference flags, validates and chunks the device
//! tokens, fans the batch out over the configured FCM transport, and purges
//! tokens the provider reports as permanently dead. Delivery is best-effort
//! relative to the feature operation that triggered it: every failure comes
//! back inside a [`models::DispatchReport`], never as an error in the
//! caller's control flow.

pub mod config;
pub mod error;
pub mod metrics;
pub mod models;
pub mod services;
pub mod stores;
pub mod telemetry;

pub use campus_fcm_shared::{FcmEndpoints, FcmError, ServiceAccountKey, Transport};
pub use config::{DispatchConfig, EngineConfig, FcmConfig};
pub use error::{EngineError, StoreError};
pub use models::{
    ChunkOutcome, DeviceOwner, DispatchReport, NotificationCategory, NotificationPreference,
    PushMessage, TopicReport,
};
pub use services::{BatchDispatcher, PushEngine, RecipientResolver};
pub use stores::{PgPreferenceStore, PgUserStore, PreferenceStore, UserStore};
