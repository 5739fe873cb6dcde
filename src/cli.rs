use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

use crate::setup::{Capability, NotificationStyle, SetupOverrides};

#[derive(Debug, Parser)]
#[command(
    name = "player-bootstrap",
    version,
    about = "播放子系统初始化守卫（Rust + rodio）"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Command>,

    /// 覆盖数据目录（默认走系统 data_local_dir）
    #[arg(long, env = "PLAYER_DATA_DIR")]
    pub data_dir: Option<PathBuf>,

    /// 覆盖日志目录（默认 `{data_dir}/logs`）
    #[arg(long, env = "PLAYER_LOG_DIR")]
    pub log_dir: Option<PathBuf>,

    /// 覆盖日志过滤（等价于设置 RUST_LOG）
    #[arg(long, env = "RUST_LOG")]
    pub log_filter: Option<String>,

    /// 不打开音频设备（也可设置 PLAYER_NO_AUDIO=1）
    #[arg(long)]
    pub no_audio: bool,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// 并发调用 ensure_setup 并打印每个调用方的结果（默认）
    Setup {
        /// 并发调用方数量
        #[arg(long, default_value_t = 1)]
        callers: usize,

        #[command(flatten)]
        overrides: OverrideArgs,
    },

    /// setup -> reset -> setup，验证重置后可以重新初始化
    Cycle {
        #[command(flatten)]
        overrides: OverrideArgs,
    },

    /// 初始化后播放本地文件，直到播完或 Ctrl-C
    Play {
        path: PathBuf,

        #[command(flatten)]
        overrides: OverrideArgs,
    },

    /// 打印合并后的初始化参数（JSON）
    Options {
        #[command(flatten)]
        overrides: OverrideArgs,

        /// 把这些覆盖项写入设置文件，作为以后的默认值
        #[arg(long)]
        save: bool,
    },
}

/// 命令行上的初始化参数覆盖项
#[derive(Debug, Clone, Default, Args)]
pub struct OverrideArgs {
    #[arg(long)]
    pub min_buffer_ms: Option<u64>,

    #[arg(long)]
    pub max_buffer_ms: Option<u64>,

    /// 起播阈值
    #[arg(long)]
    pub playback_buffer_ms: Option<u64>,

    #[arg(long)]
    pub wait_for_buffer: Option<bool>,

    /// 媒体控制能力，可重复（如 `--capability play --capability seek-to`）
    #[arg(long = "capability", value_name = "NAME")]
    pub capabilities: Vec<Capability>,

    /// 通知栏强调色（`#RRGGBB`）
    #[arg(long)]
    pub accent_color: Option<String>,
}

impl OverrideArgs {
    pub fn into_overrides(self) -> SetupOverrides {
        let OverrideArgs {
            min_buffer_ms,
            max_buffer_ms,
            playback_buffer_ms,
            wait_for_buffer,
            capabilities,
            accent_color,
        } = self;

        SetupOverrides {
            min_buffer_ms,
            max_buffer_ms,
            playback_buffer_ms,
            wait_for_buffer,
            capabilities: (!capabilities.is_empty()).then_some(capabilities),
            notification: accent_color.map(|c| NotificationStyle {
                accent_color: Some(c),
                icon: None,
            }),
            ..SetupOverrides::default()
        }
    }
}
