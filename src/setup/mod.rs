//! 播放子系统的一次性初始化
//!
//! `SetupGuard` 保证子系统只被初始化一次：并发调用方共享同一次进行中的尝试，
//! `reset` 之后可以重新初始化。

mod guard;
mod options;
mod state;

pub use guard::SetupGuard;
pub use options::{
    AndroidOptions, AppKilledBehavior, Capability, IosCategory, IosOptions, NotificationStyle,
    SetupOptions, SetupOverrides,
};
pub use state::SetupState;
