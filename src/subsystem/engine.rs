use rodio::{Decoder, OutputStream, OutputStreamBuilder, Sink, Source};
use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};
use tokio::sync::{mpsc, oneshot};

use super::messages::{EngineCommand, Reply};
use super::{PlaybackState, PlaybackSubsystem};
use crate::error::SubsystemError;
use crate::setup::SetupOptions;

/// 已打开的音频输出；只存在于音频线程上
struct ActiveOutput {
    #[allow(dead_code)]
    stream: OutputStream,
    sink: Sink,
    options: SetupOptions,
}

struct AudioEngine {
    rx_cmd: mpsc::Receiver<EngineCommand>,
    output: Option<ActiveOutput>,
}

impl AudioEngine {
    fn new(rx_cmd: mpsc::Receiver<EngineCommand>) -> Self {
        Self {
            rx_cmd,
            output: None,
        }
    }

    async fn run(mut self) {
        while let Some(cmd) = self.rx_cmd.recv().await {
            self.handle_command(cmd);
        }
        self.close();
        tracing::info!("AudioEngine 已退出");
    }

    fn handle_command(&mut self, cmd: EngineCommand) {
        match cmd {
            EngineCommand::State { reply } => {
                let _ = reply.send(self.state());
            }
            EngineCommand::Setup { options, reply } => {
                let _ = reply.send(self.setup(options));
            }
            EngineCommand::UpdateOptions { options, reply } => {
                let _ = reply.send(self.update_options(options));
            }
            EngineCommand::Reset { reply } => {
                self.close();
                let _ = reply.send(Ok(()));
            }
            EngineCommand::PlayFile { path, reply } => {
                let res = self.play_file(&path);
                if let Err(e) = &res {
                    tracing::warn!(path = %path.display(), err = %e, "播放失败");
                }
                let _ = reply.send(res);
            }
        }
    }

    fn state(&self) -> Result<PlaybackState, SubsystemError> {
        let out = self.output.as_ref().ok_or(SubsystemError::NotInitialized)?;
        if out.sink.empty() {
            Ok(PlaybackState::Ready)
        } else {
            Ok(PlaybackState::Playing)
        }
    }

    fn setup(&mut self, options: SetupOptions) -> Result<(), SubsystemError> {
        if self.output.is_some() {
            return Err(SubsystemError::AlreadyInitialized);
        }

        let stream = OutputStreamBuilder::open_default_stream().map_err(|e| {
            tracing::error!(err = %e, "初始化音频输出失败");
            SubsystemError::OutputStream(e.to_string())
        })?;
        let sink = Sink::connect_new(stream.mixer());

        tracing::info!(
            min_buffer_ms = options.min_buffer_ms,
            max_buffer_ms = options.max_buffer_ms,
            playback_buffer_ms = options.playback_buffer_ms,
            wait_for_buffer = options.wait_for_buffer,
            "音频输出已打开"
        );
        self.output = Some(ActiveOutput {
            stream,
            sink,
            options,
        });
        Ok(())
    }

    fn update_options(&mut self, options: SetupOptions) -> Result<(), SubsystemError> {
        let out = self.output.as_mut().ok_or(SubsystemError::NotInitialized)?;
        tracing::debug!(
            capabilities = options.capabilities.len(),
            compact_capabilities = options.compact_capabilities.len(),
            accent_color = options.notification.accent_color.as_deref().unwrap_or("-"),
            "更新播放器参数"
        );
        out.options = options;
        Ok(())
    }

    fn play_file(&mut self, path: &Path) -> Result<Option<u64>, SubsystemError> {
        let out = self.output.as_ref().ok_or(SubsystemError::NotInitialized)?;

        let file = File::open(path).map_err(|source| SubsystemError::OpenFile {
            path: path.to_path_buf(),
            source,
        })?;
        let decoder =
            Decoder::new(BufReader::new(file)).map_err(|e| SubsystemError::Decode {
                path: path.to_path_buf(),
                source: Box::new(e),
            })?;
        let duration_ms = decoder.total_duration().map(|d| d.as_millis() as u64);

        out.sink.append(decoder);
        out.sink.play();
        tracing::info!(
            path = %path.display(),
            duration_ms,
            wait_for_buffer = out.options.wait_for_buffer,
            "开始播放"
        );
        Ok(duration_ms)
    }

    fn close(&mut self) {
        if let Some(out) = self.output.take() {
            out.sink.stop();
            tracing::debug!("音频输出已关闭");
        }
    }
}

fn spawn_engine_thread(rx_cmd: mpsc::Receiver<EngineCommand>) {
    std::thread::spawn(move || {
        let rt = match tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
        {
            Ok(rt) => rt,
            Err(e) => {
                // rx_cmd 随线程退出被丢弃，调用方会收到 Disconnected
                tracing::error!(err = %e, "创建音频线程 runtime 失败");
                return;
            }
        };
        tracing::info!("AudioEngine 已启动");
        rt.block_on(AudioEngine::new(rx_cmd).run());
    });
}

/// rodio 播放子系统的句柄
///
/// `OutputStream` 必须留在打开它的线程上，所以真正的状态在独立音频线程里，
/// 句柄只负责发命令、等回执。克隆句柄共享同一个音频线程。
#[derive(Debug, Clone)]
pub struct RodioSubsystem {
    tx_cmd: mpsc::Sender<EngineCommand>,
}

impl RodioSubsystem {
    pub fn spawn() -> Self {
        let (tx_cmd, rx_cmd) = mpsc::channel::<EngineCommand>(32);
        spawn_engine_thread(rx_cmd);
        Self { tx_cmd }
    }

    pub async fn play_file(&self, path: &Path) -> Result<Option<u64>, SubsystemError> {
        let path = PathBuf::from(path);
        self.request(move |reply| EngineCommand::PlayFile { path, reply })
            .await
    }

    async fn request<T>(
        &self,
        build: impl FnOnce(Reply<T>) -> EngineCommand,
    ) -> Result<T, SubsystemError> {
        let (reply, rx) = oneshot::channel();
        self.tx_cmd
            .send(build(reply))
            .await
            .map_err(|_| SubsystemError::Disconnected)?;
        rx.await.map_err(|_| SubsystemError::Disconnected)?
    }
}

impl PlaybackSubsystem for RodioSubsystem {
    async fn state(&self) -> Result<PlaybackState, SubsystemError> {
        self.request(|reply| EngineCommand::State { reply }).await
    }

    async fn setup_player(&self, options: &SetupOptions) -> Result<(), SubsystemError> {
        let options = options.clone();
        self.request(move |reply| EngineCommand::Setup { options, reply })
            .await
    }

    async fn update_options(&self, options: &SetupOptions) -> Result<(), SubsystemError> {
        let options = options.clone();
        self.request(move |reply| EngineCommand::UpdateOptions { options, reply })
            .await
    }

    async fn reset(&self) -> Result<(), SubsystemError> {
        self.request(|reply| EngineCommand::Reset { reply }).await
    }
}
