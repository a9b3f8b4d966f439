//! Settled-barrier fan-out: run one task per selected model concurrently,
//! wait for every one of them to either finish or be cancelled at a shared
//! deadline, and never short-circuit on the first error.
//!
//! ```
//! use ensemble_fanout::{fan_out, CurrentRuntime, FanoutConfig};
//! use std::time::Duration;
//!
//! # #[tokio::main]
//! # async fn main() {
//! let config = FanoutConfig::builder().name("demo-round").build();
//! let executor = CurrentRuntime::new();
//! let tasks: Vec<(String, _)> = vec![
//!     ("fast-model".to_string(), Box::pin(async { Ok::<_, &str>(1) })
//!         as std::pin::Pin<Box<dyn std::future::Future<Output = Result<i32, &str>> + Send>>),
//!     ("flaky-model".to_string(), Box::pin(async { Err::<i32, _>("timeout") })),
//! ];
//! let results = fan_out(&config, tasks, Duration::from_secs(2), &executor).await;
//! assert_eq!(results.len(), 2);
//! assert!(results.iter().any(|r| r.is_completed()));
//! # }
//! ```

mod barrier;
mod config;
mod events;
mod executor;

pub use barrier::{fan_out, FanoutOutcome};
pub use config::{FanoutConfig, FanoutConfigBuilder};
pub use events::FanoutEvent;
pub use executor::{CurrentRuntime, Executor};
