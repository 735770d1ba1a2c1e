pub mod cli;
pub mod config;
pub mod controller;
pub mod logging;
pub mod pretty;
pub mod result_log;
pub mod site;
pub mod spider;
pub mod tui;
pub mod types;
pub mod worker;

// Re-export key types and functions at the crate root
pub use config::SpiderParams;
pub use controller::{RenderingSurface, ScanController, StartError};
pub use result_log::{ResultLog, TableView};
pub use site::{Site, SiteRegistry};
pub use spider::{HttpSpider, HttpSpiderFactory};
pub use types::{ResultRecord, ScanProgress, ScanStatus, SessionHandle, WorkerEvent};
pub use worker::{spawn_worker, CrawlWorker, CrawlWorkerFactory, WorkerReporter};
pub use tui::{TuiApp, TuiSurface, init_terminal, restore_terminal};
pub use logging::{init_logging, get_log_file_path};
