// Signal Registry (desk core)
// Loads the trading day's signals, tracks their lifecycle and answers
// availability queries for the client

pub mod config;
pub mod error;
pub mod feed;
pub mod registry;
pub mod summary;
pub mod template;
pub mod update;

pub use config::{create_config_template, load_config, save_config, RegistryConfig};
pub use error::{RegistryError, RegistryResult};
pub use feed::{DemoFeed, FeedEvent, SignalFeed, StaticFeed, TemplateFeed};
pub use registry::SignalRegistry;
pub use summary::SessionSummary;
pub use template::{parse_template, TemplateLine};
pub use update::{ResultUpdate, SignalUpdate};
