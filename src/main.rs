use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use renderwatch::automation::{OsascriptQuery, UiQuery};
use renderwatch::config::{Config, Settings};
use renderwatch::demo::{scenario, ScenarioClock, ScriptedLiveness, ScriptedQuery};
use renderwatch::monitor::{ProgressSampler, Scheduler};
use renderwatch::notify::{LogNotifier, Notifier, OsascriptNotifier};
use renderwatch::probes::ProbeChain;
use renderwatch::process::{LivenessCheck, ProcessMatcher, SysinfoLiveness};
use renderwatch::ui::StatusPrinter;

/// Demo frames change every two seconds; poll faster so none are missed
const DEMO_POLL_INTERVAL: Duration = Duration::from_millis(500);

#[tokio::main]
async fn main() -> Result<()> {
    // Parse CLI arguments
    let cli = Config::parse_args();

    // Setup logging
    setup_logging(cli.debug);

    // Load settings
    let mut settings = Settings::load(cli.config.as_ref())?;
    settings.merge_cli(&cli);
    settings.validate();

    let chain = ProbeChain::from_settings(&settings.probes);

    if cli.is_demo_mode() {
        let clock = ScenarioClock::start(scenario::default_scenario());
        let sampler = ProgressSampler::new(
            chain,
            Arc::new(ScriptedQuery::new(clock.clone())),
            Arc::new(ScriptedLiveness::new(clock.clone())),
        );
        let scheduler = Scheduler::new(
            sampler,
            Arc::new(LogNotifier),
            settings.notifications.clone(),
            DEMO_POLL_INTERVAL,
        );
        return run(scheduler, cli.json, Some(clock)).await;
    }

    let query: Arc<dyn UiQuery> = Arc::new(OsascriptQuery::new(
        settings.target.process_name.clone(),
        Duration::from_millis(settings.query_timeout_ms),
    ));
    let liveness: Arc<dyn LivenessCheck> = Arc::new(SysinfoLiveness::new(
        ProcessMatcher::from_settings(&settings.target),
    ));
    let notifier: Arc<dyn Notifier> = Arc::new(OsascriptNotifier);

    let scheduler = Scheduler::new(
        ProgressSampler::new(chain, query, liveness),
        notifier,
        settings.notifications.clone(),
        Duration::from_millis(settings.poll_interval_ms),
    );
    run(scheduler, cli.json, None).await
}

/// Start monitoring and print status changes until ctrl-c (or the demo ends)
async fn run(scheduler: Scheduler, json: bool, demo: Option<Arc<ScenarioClock>>) -> Result<()> {
    let mut state_rx = scheduler.subscribe();
    let mut printer = StatusPrinter::new(json);
    let mut demo_check = tokio::time::interval(Duration::from_millis(250));

    if let Some(line) = printer.render(&state_rx.borrow_and_update())? {
        println!("{}", line);
    }
    scheduler.start();

    loop {
        tokio::select! {
            changed = state_rx.changed() => {
                if changed.is_err() {
                    break;
                }
                let state = state_rx.borrow_and_update().clone();
                if let Some(line) = printer.render(&state)? {
                    println!("{}", line);
                }
            }
            _ = demo_check.tick(), if demo.is_some() => {
                if demo.as_ref().is_some_and(|clock| clock.finished()) {
                    info!("demo finished");
                    break;
                }
            }
            _ = tokio::signal::ctrl_c() => {
                info!("interrupted");
                break;
            }
        }
    }

    scheduler.stop();
    Ok(())
}

/// Logs go to stderr; stdout carries the status lines
fn setup_logging(debug: bool) {
    let filter = if debug {
        EnvFilter::new("renderwatch=debug,renderwatch_core=debug")
    } else {
        EnvFilter::new("renderwatch=info,renderwatch_core=info")
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(false)
                .with_writer(std::io::stderr),
        )
        .init();
}
