//! Synchronization primitives.
//!
//! Async-aware locks and channels from tokio plus tokio-util's
//! [`CancellationToken`], which every cancelable fetch in the core carries.
//!
//! # Examples
//!
//! ```rust
//! use core_async::sync::{CancellationToken, Mutex};
//!
//! # async fn example() {
//! let token = CancellationToken::new();
//! let child = token.clone();
//! token.cancel();
//! assert!(child.is_cancelled());
//!
//! let mutex = Mutex::new(1);
//! *mutex.lock().await += 1;
//! # }
//! ```

pub use tokio::sync::{
    broadcast, mpsc, oneshot, watch, Mutex, MutexGuard, Notify, OwnedMutexGuard, RwLock,
    RwLockReadGuard, RwLockWriteGuard, Semaphore,
};
pub use tokio_util::sync::CancellationToken;
