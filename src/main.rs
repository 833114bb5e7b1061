use anyhow::Result;
use easy_apply_submit::orchestrator::until_cancelled;
use easy_apply_submit::utils::logging::init_logging;
use easy_apply_submit::{App, Config};
use tokio_util::sync::CancellationToken;
use tracing::{error, warn};

#[tokio::main]
async fn main() -> Result<()> {
    // 加载配置
    let config = Config::from_env();

    // 初始化日志（guard 需要持有到退出）
    let (log_file, _guard) = match init_logging(&config.log_dir, config.verbose_logging) {
        Ok((path, guard)) => (Some(path), Some(guard)),
        Err(e) => {
            eprintln!("日志文件初始化失败，仅输出到终端: {:#}", e);
            (None, None)
        }
    };

    // 第一次 Ctrl-C 发出取消信号，由编排层在安全点退出；第二次直接结束进程
    let cancel = CancellationToken::new();
    let signal_token = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_err() {
            return;
        }
        warn!("⛔ 收到中断信号，正在停止...（再按一次 Ctrl-C 立即退出）");
        signal_token.cancel();
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("⛔ 再次收到中断信号，立即退出");
            std::process::exit(130);
        }
    });

    // 初始化应用（选择配置、启动浏览器期间也响应中断）
    let Some(initialized) = until_cancelled(&cancel, App::initialize(config, log_file)).await else {
        warn!("⛔ 启动阶段被中断，退出");
        return Ok(());
    };
    let mut app = initialized.map_err(|e| {
        error!("❌ 启动失败: {}", e);
        e
    })?;
    app.run(&cancel).await;
    app.shutdown().await;

    Ok(())
}
