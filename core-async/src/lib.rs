//! Runtime abstraction layer for the fiscal dashboard core.
//!
//! Every `core-*` crate depends on this crate instead of reaching for tokio
//! directly. It re-exports the handful of runtime primitives the core needs
//! (task spawning, timers, channels, cancellation) and adds [`TimerSlot`],
//! the single owned "pending timer" used for debounce and settle delays.
//!
//! # Modules
//!
//! - `task`: Task spawning and join handles
//! - `time`: Sleep, timeout, durations and instants
//! - `sync`: Async locks, channels and `CancellationToken`
//! - `timer`: Replaceable, explicitly-cleared delayed tasks
//!
//! # Examples
//!
//! ```rust
//! use core_async::time::{sleep, Duration};
//!
//! # async fn example() {
//! let handle = core_async::spawn(async {
//!     sleep(Duration::from_millis(10)).await;
//!     42
//! });
//! assert_eq!(handle.await.unwrap(), 42);
//! # }
//! ```

pub mod runtime;
pub mod sync;
pub mod task;
pub mod time;
pub mod timer;

// `select!` is re-exported so downstream crates can race a request against its
// cancellation token without a direct tokio dependency.
pub use tokio::select;

pub use task::spawn;
pub use time::{sleep, Duration, Instant};
pub use timer::TimerSlot;
