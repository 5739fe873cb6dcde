use clap::Parser;
use player_bootstrap::cli::{Cli, Command, OverrideArgs};
use player_bootstrap::commands::{concurrent_setup, play_until_idle, setup_reset_cycle};
use player_bootstrap::error::AppError;
use player_bootstrap::logging;
use player_bootstrap::settings::{self, AppSettings};
use player_bootstrap::setup::SetupGuard;
use player_bootstrap::subsystem::AudioBackend;
use std::env;
use std::sync::Arc;
use std::time::Duration;

#[tokio::main]
async fn main() -> Result<(), AppError> {
    let cli = Cli::parse();

    let data_dir = cli.data_dir.clone().unwrap_or_else(settings::default_data_dir);

    let no_audio_env = env::var("PLAYER_NO_AUDIO")
        .ok()
        .map(|v| matches!(v.as_str(), "1" | "true" | "yes" | "on"))
        .unwrap_or(false);
    let backend = if cli.no_audio || no_audio_env {
        AudioBackend::Null
    } else {
        AudioBackend::Real
    };

    let _log_guard = logging::init(
        &data_dir,
        logging::LogConfig {
            dir: cli.log_dir.clone(),
            filter: cli.log_filter.clone(),
        },
    );
    tracing::info!(data_dir = %data_dir.display(), ?backend, "player-bootstrap 启动");

    let app_settings = settings::load_settings(&data_dir).unwrap_or_else(|e| {
        tracing::warn!(err = %e, "读取设置失败，使用默认值");
        AppSettings::default()
    });
    let command = cli.command.unwrap_or(Command::Setup {
        callers: 1,
        overrides: OverrideArgs::default(),
    });

    // options 子命令不需要打开音频设备
    if let Command::Options { overrides, save } = command {
        let overrides = overrides.into_overrides();
        let effective = app_settings.setup_defaults().merged(overrides.clone());
        println!("{}", serde_json::to_string_pretty(&effective)?);
        if save {
            let updated = AppSettings {
                setup: app_settings.setup.clone().layered(overrides),
            };
            updated.validate()?;
            settings::save_settings(&data_dir, &updated)?;
            println!(
                "已保存到 {}",
                settings::settings_path(&data_dir).display()
            );
        }
        return Ok(());
    }

    let guard =
        SetupGuard::with_defaults(Arc::new(backend.spawn()), app_settings.setup_defaults());

    match command {
        Command::Setup { callers, overrides } => {
            tracing::info!(callers, "启动模式: Setup");
            let report = concurrent_setup(&guard, callers, overrides.into_overrides()).await;
            for (i, ok) in report.results.iter().enumerate() {
                println!("caller #{i}: {}", if *ok { "ok" } else { "failed" });
            }
            println!("state: {}", report.state);
            if report.results.iter().all(|ok| *ok) {
                Ok(())
            } else {
                Err(AppError::Other("音频子系统初始化失败，详见日志".to_owned()))
            }
        }
        Command::Cycle { overrides } => {
            tracing::info!("启动模式: Cycle");
            let report = setup_reset_cycle(&guard, overrides.into_overrides()).await;
            println!("setup: {}", report.first);
            println!("reset: {} (state: {})", report.reset, report.state_after_reset);
            println!("setup: {} (state: {})", report.second, report.state);
            Ok(())
        }
        Command::Play { path, overrides } => {
            tracing::info!(path = %path.display(), "启动模式: Play");
            let stop = async {
                let _ = tokio::signal::ctrl_c().await;
            };
            let report = play_until_idle(
                &guard,
                &path,
                overrides.into_overrides(),
                Duration::from_millis(500),
                stop,
            )
            .await?;
            match report.duration_ms {
                Some(ms) => println!("时长: {}s", ms / 1000),
                None => println!("时长: 未知"),
            }
            if report.interrupted {
                println!("已中断");
            }
            Ok(())
        }
        Command::Options { .. } => Ok(()),
    }
}
