mod cli;

use access_guard::{AuthorizationGuard, Callbacks};
use anyhow::{Context, Result};
use clap::Parser;
use cli::{Cli, Command, GuardArgs, ReactArgs};
use prometheus::Registry;
use reaction_ledger::{MemoryStore, ReactionBinding, ReactionLedger};
use serde_json::json;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use storefront_core::{ReactionSubject, Role, StorefrontConfig};
use storefront_metrics::{toggle_outcome, StorefrontMetrics};
use tracing::info;
use tracing_subscriber::{fmt, EnvFilter};

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.json_logs);

    let config = match &cli.config {
        Some(path) => StorefrontConfig::from_path(path)
            .with_context(|| format!("loading config from {}", path.display()))?,
        None => StorefrontConfig::from_env().context("loading config from environment")?,
    };

    let registry = Registry::new();
    let metrics = StorefrontMetrics::new(&registry).context("registering metrics")?;

    match &cli.command {
        Command::Guard(args) => run_guard(&config, &metrics, args)?,
        Command::React(args) => run_react(&config, &metrics, args).await?,
    }

    if cli.metrics {
        print!("{}", metrics.render().context("rendering metrics")?);
    }
    Ok(())
}

fn init_tracing(json_logs: bool) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let builder = fmt().with_env_filter(filter).with_writer(std::io::stderr);
    if json_logs {
        builder.json().init();
    } else {
        builder.init();
    }
}

fn run_guard(config: &StorefrontConfig, metrics: &StorefrontMetrics, args: &GuardArgs) -> Result<()> {
    let required = args
        .required
        .as_deref()
        .map(Role::from)
        .unwrap_or_else(|| config.admin_role());
    let session = args.session();
    let mut guard = AuthorizationGuard::new(required);
    let fired = Arc::new(AtomicUsize::new(0));

    info!(required = %guard.required_role(), ?session, times = args.times, "evaluating guard");
    for evaluation in 1..=args.times {
        let counter = Arc::clone(&fired);
        let mut callbacks = Callbacks::single(move || {
            counter.fetch_add(1, Ordering::SeqCst);
            info!("post-admission prefetch dispatched");
            Ok(())
        });
        let decision = guard.evaluate(&session, &mut callbacks)?;
        metrics.observe_admission(&decision);

        let line = json!({
            "evaluation": evaluation,
            "decision": decision,
            "redirect": decision.redirect(config),
            "notice": decision.notice(config),
            "callbacks_fired": fired.load(Ordering::SeqCst),
        });
        println!("{line}");
    }
    Ok(())
}

async fn run_react(
    config: &StorefrontConfig,
    metrics: &StorefrontMetrics,
    args: &ReactArgs,
) -> Result<()> {
    let store = Arc::new(MemoryStore::new());
    store.fail_writes(args.fail_writes);
    let ledger = ReactionLedger::new(Arc::clone(&store));
    let subject = ReactionSubject::new(args.kind, args.id.clone());
    let session = args.session();

    let binding = ReactionBinding::mount(ledger, subject.clone(), args.count);
    binding.refresh(&session).await;
    println!("{}", json!({ "step": 0, "state": binding.snapshot() }));

    for step in 1..=args.times {
        let result = binding.toggle(&session).await;
        metrics.observe_toggle(subject.kind, &result);

        let notice = result.as_ref().err().and_then(|rejection| rejection.notice(config));
        let line = json!({
            "step": step,
            "outcome": toggle_outcome(&result),
            "notice": notice,
            "state": binding.snapshot(),
            "stored": store.count_for(&subject),
        });
        println!("{line}");
    }
    Ok(())
}
