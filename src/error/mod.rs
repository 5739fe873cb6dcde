//! 统一错误处理模块
//!
//! 各层使用结构化错误类型；初始化守卫对外只暴露 bool，错误在边界处记录日志。

mod app;
mod setup;
mod subsystem;

pub use app::{AppError, SettingsError};
pub use setup::SetupError;
pub use subsystem::{SubsystemError, is_already_initialized};
