use anyhow::Result;

use handshake_auto_apply::orchestrator::App;
use handshake_auto_apply::utils::logging;
use handshake_auto_apply::Config;

#[tokio::main]
async fn main() -> Result<()> {
    // 加载配置
    let config = Config::from_env();

    // 初始化日志
    logging::init(config.verbose_logging);

    // 初始化并运行应用；致命错误也要报出历史库位置，
    // 让已有进度在下次运行时可以恢复
    let store_hint = config.store_file.clone();
    let result = run(config).await;
    if let Err(e) = &result {
        eprintln!("致命错误: {:#}", e);
        eprintln!("历史库位置: {}", store_hint);
        std::process::exit(1);
    }

    Ok(())
}

async fn run(config: Config) -> Result<()> {
    let mut app = App::initialize(config).await?;
    app.run().await
}
