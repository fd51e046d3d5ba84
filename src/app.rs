use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};

use crate::catalog;
use crate::config;
use crate::data::{self, CatalogService};
use crate::export;
use crate::storage;
use crate::ui;
use crate::watchlist::Watchlist;

pub fn run() -> Result<()> {
    let cfg = config::load(config::LoadOptions::default()).context("load config")?;
    let config_path = config::default_path();
    let display_path = friendly_path(config_path.as_ref());

    let store = storage::Store::open(storage::Options {
        path: cfg.storage.path.clone(),
    })
    .context("open storage")?;
    let watchlist = Watchlist::load(store);

    let _theme = &cfg.ui.theme;
    let status: String;

    let user_agent = if !cfg.api.user_agent.trim().is_empty() {
        cfg.api.user_agent.clone()
    } else {
        format!("reelix/{}", crate::VERSION)
    };

    let mut catalog_service: Option<Arc<dyn CatalogService>> = None;
    match catalog::Client::new(catalog::ClientConfig {
        base_url: Some(cfg.api.base_url.clone()),
        user_agent,
        timeout: Some(cfg.api.timeout),
        http_client: None,
    }) {
        Ok(client) => {
            let client = Arc::new(client);
            catalog_service = Some(Arc::new(data::HttpCatalogService::new(client)));
            status = "Press j/k to browse, / to search, w for your watchlist, q to quit."
                .to_string();
        }
        Err(err) => {
            status = format!("Failed to initialize catalog client: {err}");
        }
    }

    let options = ui::Options {
        status_message: status,
        catalog: catalog_service,
        watchlist,
        items_per_page: cfg.ui.items_per_page,
        config_path: display_path,
    };

    let mut model = ui::Model::new(options);
    model.run()?;

    Ok(())
}

// Headless export paths for the CLI flags; they reuse the same config and
// storage pipeline as the TUI.
pub fn export_csv(path: Option<PathBuf>) -> Result<PathBuf> {
    let watchlist = open_watchlist()?;
    let path = path.unwrap_or_else(|| PathBuf::from("watchlist.csv"));
    export::write_csv(&path, &watchlist.export_rows())?;
    Ok(path)
}

pub fn export_report(path: Option<PathBuf>) -> Result<PathBuf> {
    let watchlist = open_watchlist()?;
    let path = path.unwrap_or_else(|| PathBuf::from("watchlist-report.html"));
    export::write_html_report(&path, &watchlist.export_rows(), &watchlist.stats())?;
    Ok(path)
}

fn open_watchlist() -> Result<Watchlist> {
    let cfg = config::load(config::LoadOptions::default()).context("load config")?;
    let store = storage::Store::open(storage::Options {
        path: cfg.storage.path,
    })
    .context("open storage")?;
    Ok(Watchlist::load(store))
}

fn friendly_path(path: Option<&std::path::PathBuf>) -> String {
    if let Some(path) = path {
        if let Some(home) = dirs::home_dir() {
            if let Ok(stripped) = path.strip_prefix(&home) {
                let mut display = String::from("~");
                if !stripped.as_os_str().is_empty() {
                    display.push_str(&format!("/{}", stripped.display()));
                }
                return display;
            }
        }
        path.display().to_string()
    } else {
        "~/.config/reelix/config.yaml".to_string()
    }
}
