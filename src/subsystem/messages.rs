use std::path::PathBuf;
use tokio::sync::oneshot;

use super::PlaybackState;
use crate::error::SubsystemError;
use crate::setup::SetupOptions;

pub(super) type Reply<T> = oneshot::Sender<Result<T, SubsystemError>>;

/// 发往音频线程的命令；每条命令都带一个 oneshot 回执
#[derive(Debug)]
pub(super) enum EngineCommand {
    State {
        reply: Reply<PlaybackState>,
    },
    Setup {
        options: SetupOptions,
        reply: Reply<()>,
    },
    UpdateOptions {
        options: SetupOptions,
        reply: Reply<()>,
    },
    Reset {
        reply: Reply<()>,
    },
    /// 解码本地文件并追加到当前 Sink
    PlayFile {
        path: PathBuf,
        reply: Reply<Option<u64>>,
    },
}
