use std::sync::Arc;

use anyhow::{Context, Result};
use serde_json::json;
use tokio::io::{AsyncBufReadExt, BufReader};

use siemdash::client::api::{HttpSiemApi, SiemApi};
use siemdash::client::DataClient;
use siemdash::command::{self, Command};
use siemdash::logging::{log, obj, v_str, Domain, Level};
use siemdash::render::TerminalTarget;
use siemdash::view::ViewId;
use siemdash::{Config, Console, CoordError};

#[tokio::main]
async fn main() -> Result<()> {
    let cfg = Config::from_env();
    let client = DataClient::from_config(&cfg).context("invalid configuration")?;
    log(
        Level::Info,
        Domain::System,
        "startup",
        obj(&[
            ("api_base", v_str(client.base())),
            ("start_view", v_str(&cfg.start_view)),
            ("dashboard_refresh_secs", json!(cfg.dashboard_refresh_secs)),
            ("alerts_refresh_secs", json!(cfg.alerts_refresh_secs)),
            ("logs_refresh_secs", json!(cfg.logs_refresh_secs)),
        ]),
    );

    let api: Arc<dyn SiemApi> = Arc::new(HttpSiemApi::new(client));
    let console = Console::new(&cfg, api, |_| Box::new(TerminalTarget::new()));

    match console.status().await {
        Ok(status) => println!(
            "backend: {} (database connected: {})",
            status.status, status.database_connected
        ),
        Err(e) => {
            log(Level::Warn, Domain::System, "status_probe_failed", obj(&[("msg", v_str(&e.to_string()))]));
            println!("backend unreachable: {}", e.display_message());
        }
    }

    if let Err(e) = console.activate(&cfg.start_view) {
        log(
            Level::Warn,
            Domain::Nav,
            "start_view_rejected",
            obj(&[("view_id", v_str(&cfg.start_view)), ("msg", v_str(&e.to_string()))]),
        );
        console.activate(ViewId::DASHBOARD).context("activating dashboard")?;
    }
    println!("{}", command::help());

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await? {
        let cmd = match command::parse(&line) {
            Ok(Some(cmd)) => cmd,
            Ok(None) => continue,
            Err(e) => {
                println!("{}", e.display_message());
                continue;
            }
        };
        match run(&console, cmd).await {
            Ok(true) => break,
            Ok(false) => {}
            Err(e) => println!("error: {}", e.display_message()),
        }
    }

    log(Level::Info, Domain::System, "shutdown", obj(&[]));
    Ok(())
}

/// Executes one command. Returns `true` when the console should exit.
async fn run(console: &Console, cmd: Command) -> Result<bool, CoordError> {
    match cmd {
        Command::View(id) => {
            console.activate(&id)?;
        }
        Command::Refresh => {
            console.refresh()?;
        }
        Command::Filter(filter) => {
            println!("{}", console.set_log_filter(filter)?.message);
        }
        Command::Ingest(raw) => {
            println!("{}", console.ingest_log(&raw).await?.message);
        }
        Command::Status { alert_id, status } => {
            println!("{}", console.update_alert_status(&alert_id, &status).await?.message);
        }
        Command::Report(request) => {
            println!("{}", console.request_report(request)?.message);
        }
        Command::Help => println!("{}", command::help()),
        Command::Quit => return Ok(true),
    }
    Ok(false)
}
