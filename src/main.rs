use anyhow::Result;
use clap::{Parser, Subcommand};
use qubes_decor::config::Config;
use qubes_decor::events::{HookContext, HookRegistry, LifecycleEvent, LogWindowEvents};
use qubes_decor::services::{
    create_inventory_client, extract_identity, format_task_title, CacheSettings,
    ForceRefreshOnStartup, PropertyCache, QueryServer, Resolver,
};
use std::sync::Arc;
use tokio::io::BufReader;
use tokio::signal;
use tracing::{error, info, warn};

#[derive(Parser, Debug)]
#[command(name = "qubes-decor")]
#[command(about = "Цвет рамок и подписи окон по метке VM в Qubes OS")]
struct Args {
    /// Путь к файлу конфигурации
    #[arg(short, long, default_value = "qubes-decor.toml")]
    config: String,

    /// Режим сухого запуска (инвентарь VM эмулируется, qvm-ls не вызывается)
    #[arg(long)]
    dry_run: bool,

    /// Уровень логирования (по умолчанию - из конфигурации)
    #[arg(long)]
    log_level: Option<String>,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Напечатать цвет рамки для класса окна
    Border {
        #[arg(long)]
        class: String,
        #[arg(long)]
        focused: bool,
    },
    /// Напечатать подпись окна для списка задач
    Title {
        #[arg(long)]
        class: String,
        #[arg(long)]
        title: String,
    },
    /// Обслуживать JSON-запросы на stdin (режим по умолчанию)
    Serve,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    // Загрузка конфигурации
    let config = Config::load(&args.config)?;

    // Инициализация системы логирования
    let level = args.log_level.as_deref().unwrap_or(&config.logging.level);
    init_tracing(level)?;

    info!("Запуск qubes-decor v{}", env!("CARGO_PKG_VERSION"));
    if args.dry_run {
        warn!("Режим сухого запуска - qvm-ls не вызывается");
    }

    match args.command.unwrap_or(Command::Serve) {
        Command::Title { class, title } => {
            println!("{}", format_task_title(extract_identity(&class), &title));
            Ok(())
        }
        Command::Border { class, focused } => {
            let client = create_inventory_client(&config.inventory, args.dry_run);
            let cache = Arc::new(
                PropertyCache::connect(client, CacheSettings::from(&config.inventory)).await,
            );
            let resolver = Resolver::new(cache, &config.border)?;
            println!("{}", resolver.resolve_border(extract_identity(&class), focused).await);
            Ok(())
        }
        Command::Serve => serve(&config, args.dry_run).await,
    }
}

async fn serve(config: &Config, dry_run: bool) -> Result<()> {
    let client = create_inventory_client(&config.inventory, dry_run);
    let cache = Arc::new(PropertyCache::new(client, CacheSettings::from(&config.inventory)));

    // Неверная карта цветов - фатальная ошибка до начала работы
    let resolver = Arc::new(Resolver::new(Arc::clone(&cache), &config.border)?);

    let mut hooks = HookRegistry::new();
    hooks.subscribe(
        LifecycleEvent::StartupOnce,
        Arc::new(ForceRefreshOnStartup::new(Arc::clone(&cache))),
    );
    hooks.subscribe(LifecycleEvent::ClientManaged, Arc::new(LogWindowEvents));
    hooks.subscribe(LifecycleEvent::FocusChanged, Arc::new(LogWindowEvents));
    let hooks = Arc::new(hooks);

    hooks.fire(&HookContext::lifecycle(LifecycleEvent::StartupOnce)).await;
    hooks.fire(&HookContext::lifecycle(LifecycleEvent::Startup)).await;
    info!("Кэш VM инициализирован: записей {}", cache.len());

    // qvm-ls вызывается в фоне, запросы отрисовки его не ждут
    let refresher = cache.spawn_refresher();

    let server = QueryServer::new(resolver, Arc::clone(&hooks));
    let stdin = BufReader::new(tokio::io::stdin());
    let stdout = tokio::io::stdout();

    tokio::select! {
        result = server.run(stdin, stdout) => {
            if let Err(e) = result {
                error!("Ошибка обслуживания запросов: {}", e);
            }
        }
        result = signal::ctrl_c() => {
            match result {
                Ok(()) => info!("Получен сигнал завершения (Ctrl+C)"),
                Err(err) => error!("Ошибка при ожидании сигнала завершения: {}", err),
            }
        }
    }

    refresher.abort();
    info!("qubes-decor завершил работу");
    Ok(())
}

fn init_tracing(level: &str) -> Result<()> {
    use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(level))?;

    // stdout занят протоколом
    tracing_subscriber::registry()
        .with(filter)
        .with(
            tracing_subscriber::fmt::layer()
                .compact()
                .with_writer(std::io::stderr),
        )
        .init();

    Ok(())
}
