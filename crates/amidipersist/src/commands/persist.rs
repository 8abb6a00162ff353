//! Default mode: load the rules, connect, then keep them connected.

use tokio::sync::broadcast::error::RecvError;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use amidipersist_config::load_rules;
use amidipersist_core::Controller;

use crate::config::RunConfig;
use crate::error::CliError;
use crate::output;

pub async fn handle(cfg: &RunConfig, once: bool) -> Result<(), CliError> {
    let parsed = load_rules(&cfg.connections_file)?;
    output::print_loaded(parsed.rules.len());
    if parsed.rules.is_empty() {
        return Err(CliError::NoRules {
            path: cfg.connections_file.clone(),
        });
    }

    let graph = amidipersist_seq::open_graph(&cfg.client_name)?;
    let mut controller = Controller::new(graph, parsed.rules, cfg.controller.clone());

    if once {
        let report = controller.run_once();
        output::print_report(&report);
        return Ok(());
    }

    let events = amidipersist_seq::watch_topology(&cfg.client_name)?;
    let cancel = CancellationToken::new();

    let ctrl_c = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            debug!("interrupt received, shutting down");
            ctrl_c.cancel();
        }
    });

    let mut reports = controller.subscribe_reports();
    let printer = tokio::spawn(async move {
        loop {
            match reports.recv().await {
                Ok(report) => output::print_report(&report),
                Err(RecvError::Lagged(n)) => warn!(skipped = n, "report printer lagged"),
                Err(RecvError::Closed) => break,
            }
        }
    });

    let result = controller.run(events, cancel).await;

    // Closing the report channel lets the printer drain and stop.
    drop(controller);
    let _ = printer.await;
    result.map_err(CliError::from)
}
