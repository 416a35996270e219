// ABOUTME: Entry point for the headless carto binary
// ABOUTME: Sets up logging, starts a runtime, loads one project and waits for indexing

use std::panic;
use std::process::ExitCode;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use cartograph::cli::{self, Args};
use cartograph::{
    AppConfig, Collaborators, LoadOutcome, MemoryStorageCache, ProjectLoadWatcher, Runtime,
};
use cartograph_core::Message;
use cartograph_logging::{
    LoggingConfig, LoggingGuard, LoggingReloadHandle, error, info, init_logging_with_reload,
    instrument, level_for_verbosity,
};

fn setup_logging(verbosity: u8) -> Result<(LoggingReloadHandle, LoggingGuard)> {
    let config = LoggingConfig::from_env()
        .context("Failed to create logging config from environment")?
        .with_verbosity(verbosity);

    let logging =
        init_logging_with_reload(config).context("Failed to initialize cartograph logging")?;

    info!("Cartograph logging system initialized");
    Ok(logging)
}

#[instrument]
fn install_panic_handler() {
    panic::set_hook(Box::new(|info| {
        let payload = info.payload();
        let location = info
            .location()
            .map(|loc| format!("{}:{}:{}", loc.file(), loc.line(), loc.column()));

        let panic_message = if let Some(s) = payload.downcast_ref::<&str>() {
            s.to_string()
        } else if let Some(s) = payload.downcast_ref::<String>() {
            s.clone()
        } else {
            "Box<dyn Any>".to_string()
        };

        // Task panics are caught by the scheduler; this only records them
        error!(
            panic_message = %panic_message,
            location = ?location,
            thread = ?std::thread::current().name(),
            "Panic occurred"
        );

        if let Ok(backtrace) = std::env::var("RUST_BACKTRACE")
            && (backtrace == "1" || backtrace == "full")
        {
            let bt = std::backtrace::Backtrace::capture();
            error!(backtrace = %format!("{bt:?}"), "Panic backtrace");
        }
    }));
}

fn load_config(args: &Args) -> Result<AppConfig> {
    let mut config = match &args.config {
        Some(path) => AppConfig::load(path)?,
        None => AppConfig::default(),
    };
    args.apply_to(&mut config);
    Ok(config)
}

fn main() -> Result<ExitCode> {
    let args = cli::parse_args();

    // Logging starts before the config file is read so its problems get logged
    let (reload, _logging) = setup_logging(args.verbose)?;
    install_panic_handler();

    let config = load_config(&args)?;
    if config.verbosity != args.verbose {
        reload
            .update_log_level(level_for_verbosity(config.verbosity))
            .context("Failed to apply configured verbosity")?;
    }

    info!(
        version = env!("CARGO_PKG_VERSION"),
        project = %args.project.display(),
        "Starting carto"
    );

    let project_path = std::path::absolute(&args.project)
        .with_context(|| format!("Invalid project path {}", args.project.display()))?;

    let storage = Arc::new(MemoryStorageCache::new());
    let collaborators = Collaborators::headless().with_storage(storage.clone());
    let mut runtime = Runtime::start(&config, collaborators).context("Failed to start runtime")?;

    let watcher = ProjectLoadWatcher::subscribe(runtime.bus());
    runtime.dispatch(Message::load_project(project_path.clone(), args.force));
    let outcome = watcher.wait(Duration::from_secs(args.timeout));
    drop(watcher);

    let state = runtime.with_application(|app| app.state());
    runtime.shutdown();

    match outcome {
        LoadOutcome::Finished => {
            println!(
                "{}: {} files indexed ({} bytes), state {}",
                project_path.display(),
                storage.paths().len(),
                storage.total_size(),
                state
            );
            Ok(ExitCode::SUCCESS)
        }
        LoadOutcome::Failed(reason) => {
            eprintln!("{reason}");
            Ok(ExitCode::FAILURE)
        }
        LoadOutcome::TimedOut => {
            eprintln!(
                "Timed out after {}s waiting for {} to be indexed",
                args.timeout,
                project_path.display()
            );
            Ok(ExitCode::FAILURE)
        }
    }
}
