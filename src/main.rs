use eyre::{Result, WrapErr};
use spider_panel::cli::Cli;
use spider_panel::pretty::{self, ConsoleSurface};
use spider_panel::{HttpSpiderFactory, ScanController, SiteRegistry, TuiApp, TuiSurface};
use tokio::runtime::Handle;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = spider_panel::cli::parse();

    // Initialize logging first
    if let Err(e) = spider_panel::init_logging(cli.verbose) {
        eprintln!("Warning: Failed to initialize logging: {}", e);
    }

    log::info!("================================================================================");
    log::info!("🕷️  NEW SPIDER PANEL SESSION STARTING");
    log::info!("================================================================================");

    let registry = SiteRegistry::from_inputs(&cli.sites)?;
    let factory = HttpSpiderFactory::new(cli.spider_params())?;

    if cli.no_tui {
        run_headless(&cli, registry, factory).await
    } else {
        run_tui(&cli, registry, factory)
    }
}

async fn run_headless(cli: &Cli, registry: SiteRegistry, factory: HttpSpiderFactory) -> Result<()> {
    let surface = ConsoleSurface::stdout().with_progress(cli.verbose);
    let mut panel = ScanController::new(registry, Box::new(factory), surface, Handle::current());

    let handle = panel.start_selected()
        .wrap_err("Failed to start crawl")?
        .ok_or_else(|| eyre::eyre!("A crawl is already running"))?;

    println!("🕷️  Crawling: {}", handle.site);
    println!("────────────────────────────────────────────────────────────────────────────────");

    let interrupted = tokio::select! {
        _ = panel.run_until_idle() => false,
        _ = tokio::signal::ctrl_c() => true,
    };
    if interrupted {
        println!("Stopping...");
        panel.request_stop();
        panel.run_until_idle().await;
    }

    pretty::print_summary(&handle.site, panel.log());

    if let Some(path) = &cli.output {
        pretty::write_json(path, panel.log().records())?;
        println!("Results written to {}", path.display());
    }

    Ok(())
}

fn run_tui(cli: &Cli, registry: SiteRegistry, factory: HttpSpiderFactory) -> Result<()> {
    let mut panel = ScanController::new(registry, Box::new(factory), TuiSurface::new(), Handle::current());

    let mut terminal = spider_panel::init_terminal()?;
    let app = TuiApp::new(cli.refresh_rate());

    // Run the TUI application
    let result = app.run(&mut terminal, &mut panel);

    // Restore terminal
    spider_panel::restore_terminal(&mut terminal)?;

    // Handle any TUI errors
    result?;

    if let Some(path) = &cli.output {
        pretty::write_json(path, panel.log().records())?;
        println!("Results written to {}", path.display());
    }

    Ok(())
}
