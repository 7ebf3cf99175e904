//! Faultline command line
//!
//! `faultline serve` runs the webhook receiver and OAuth endpoints;
//! `faultline report` files a single fault through the reporting engine.

use anyhow::{anyhow, Context};
use clap::{value_parser, Arg, ArgAction, ArgMatches, Command};
use faultline_core::FaultReporter;
use faultline_report::{FaultReport, Severity};
use faultline_server::{oauth_flow, routes, webhook_state, AppConfig};
use std::net::SocketAddr;
use std::path::PathBuf;
use tracing::info;
use tracing_subscriber::EnvFilter;

const DEFAULT_FILTER: &str = "faultline=info";

fn cli() -> Command {
    Command::new("faultline")
        .version(faultline_core::VERSION)
        .about("Turns application faults into deduplicated tracker issues")
        .subcommand_required(true)
        .arg_required_else_help(true)
        .arg(
            Arg::new("config")
                .long("config")
                .short('c')
                .global(true)
                .value_parser(value_parser!(PathBuf))
                .help("Configuration file (default: faultline.toml)"),
        )
        .arg(
            Arg::new("log-json")
                .long("log-json")
                .global(true)
                .action(ArgAction::SetTrue)
                .help("Emit logs as JSON lines"),
        )
        .subcommand(
            Command::new("serve")
                .about("Run the webhook receiver and OAuth endpoints")
                .arg(
                    Arg::new("listen")
                        .long("listen")
                        .value_parser(value_parser!(SocketAddr))
                        .help("Bind address, overrides server.listen_addr"),
                ),
        )
        .subcommand(
            Command::new("report")
                .about("Report a single fault and print the result")
                .arg(
                    Arg::new("message")
                        .required(true)
                        .help("Fault message"),
                )
                .arg(
                    Arg::new("severity")
                        .long("severity")
                        .short('s')
                        .default_value("error")
                        .value_parser(value_parser!(Severity))
                        .help("critical, error or warning"),
                )
                .arg(Arg::new("stack").long("stack").help("Stack trace text"))
                .arg(Arg::new("user-id").long("user-id").help("Affected user"))
                .arg(Arg::new("url").long("url").help("URL where the fault happened"))
                .arg(
                    Arg::new("context")
                        .long("context")
                        .action(ArgAction::Append)
                        .help("Context entry as key=value, repeatable"),
                ),
        )
}

fn init_tracing(json: bool) -> anyhow::Result<()> {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(DEFAULT_FILTER))?;
    let builder = tracing_subscriber::fmt().with_env_filter(filter);
    if json {
        builder.json().try_init()
    } else {
        builder.try_init()
    }
    .map_err(|e| anyhow!(e))
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let matches = cli().get_matches();
    init_tracing(matches.get_flag("log-json"))?;

    let config = match matches.get_one::<PathBuf>("config") {
        Some(path) => AppConfig::from_file(path),
        None => AppConfig::load(),
    }
    .context("invalid configuration")?;

    match matches.subcommand() {
        Some(("serve", args)) => serve(config, args).await,
        Some(("report", args)) => report(config, args).await,
        Some((other, _)) => Err(anyhow!("unknown command `{other}`")),
        None => Err(anyhow!("no command given")),
    }
}

async fn serve(config: AppConfig, args: &ArgMatches) -> anyhow::Result<()> {
    let service = config.service;
    let addr = args
        .get_one::<SocketAddr>("listen")
        .copied()
        .unwrap_or(service.server.listen_addr);

    let routes = routes(webhook_state(&service), oauth_flow(&service)?);
    let (bound, server) = warp::serve(routes)
        .try_bind_with_graceful_shutdown(addr, async {
            // Only a failure to install the handler lands here; shut down either way
            let _ = tokio::signal::ctrl_c().await;
            info!("shutdown signal received");
        })
        .with_context(|| format!("cannot bind {addr}"))?;

    info!(
        addr = %bound,
        webhooks_signed = service.webhooks.has_secret(),
        oauth_configured = service.oauth.is_configured(),
        "faultline listening"
    );
    server.await;
    info!("faultline stopped");
    Ok(())
}

async fn report(config: AppConfig, args: &ArgMatches) -> anyhow::Result<()> {
    let message = args
        .get_one::<String>("message")
        .ok_or_else(|| anyhow!("message is required"))?;
    let severity = args
        .get_one::<Severity>("severity")
        .copied()
        .unwrap_or_default();

    let mut fault = FaultReport::new(message.as_str())?.with_severity(severity);
    if let Some(stack) = args.get_one::<String>("stack") {
        fault = fault.with_stack(stack.as_str());
    }
    if let Some(user_id) = args.get_one::<String>("user-id") {
        fault = fault.with_user_id(user_id.as_str());
    }
    if let Some(url) = args.get_one::<String>("url") {
        fault = fault.with_url(url.as_str());
    }
    for entry in args.get_many::<String>("context").into_iter().flatten() {
        let (key, value) = entry
            .split_once('=')
            .ok_or_else(|| anyhow!("context entry `{entry}` is not key=value"))?;
        fault = fault.with_context(key, value);
    }

    let reporter = FaultReporter::from_config(&config.engine)?;
    if !reporter.is_configured() {
        anyhow::bail!("tracker not configured: set LINEAR_API_KEY and LINEAR_DEFAULT_TEAM_ID");
    }

    let result = reporter
        .report(fault)
        .await
        .ok_or_else(|| anyhow!("fault was not reported, see logs"))?;
    println!("{}", serde_json::to_string_pretty(&result)?);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cli_is_well_formed() {
        cli().debug_assert();
    }

    #[test]
    fn parses_report_arguments() {
        let matches = cli()
            .try_get_matches_from([
                "faultline",
                "report",
                "Database connection timeout",
                "--severity",
                "critical",
                "--context",
                "route=/checkout",
                "--context",
                "region=eu",
            ])
            .unwrap();
        let (name, args) = matches.subcommand().unwrap();
        assert_eq!(name, "report");
        assert_eq!(args.get_one::<Severity>("severity"), Some(&Severity::Critical));
        assert_eq!(args.get_many::<String>("context").unwrap().count(), 2);
    }

    #[test]
    fn rejects_unknown_severity() {
        let result = cli().try_get_matches_from(["faultline", "report", "boom", "--severity", "fatal"]);
        assert!(result.is_err());
    }

    #[test]
    fn serve_accepts_listen_override() {
        let matches = cli()
            .try_get_matches_from(["faultline", "serve", "--listen", "127.0.0.1:9999", "--log-json"])
            .unwrap();
        assert!(matches.get_flag("log-json"));
        let (_, args) = matches.subcommand().unwrap();
        assert_eq!(args.get_one::<SocketAddr>("listen").unwrap().port(), 9999);
    }
}
