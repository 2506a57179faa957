//! pingcache-check — validate a pingcache configuration file.
//!
//! Parses both cache policies the way a running server would and prints the
//! policy that would actually take effect. Exits non-zero when the file
//! can't be loaded or a policy would fall back to its default.

use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use tracing::{debug, error};
use tracing_subscriber::EnvFilter;

use pingcache::cache::{DEFAULT_FAVICON_SPEC, DEFAULT_REQUEST_SPEC};
use pingcache::{CacheSpec, Config};

/// Check a pingcache configuration file.
#[derive(Parser)]
#[command(name = "pingcache-check")]
#[command(version = pingcache::PKG_VERSION)]
#[command(about = "Validate pingcache cache policies")]
struct Args {
    /// Path to configuration file.
    #[arg(short, long, env = "PINGCACHE_CONFIG", default_value = "pingcache.toml")]
    config: PathBuf,

    /// Increase log verbosity.
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

fn main() -> ExitCode {
    let args = Args::parse();

    let filter = match args.verbose {
        0 => EnvFilter::new("pingcache=warn"),
        1 => EnvFilter::new("pingcache=info"),
        _ => EnvFilter::new("pingcache=debug"),
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();

    let build = pingcache::build_info();
    debug!(
        version = %build,
        built_at = build.built_at.unwrap_or("unknown"),
        "pingcache-check starting"
    );

    let config = match Config::load(&args.config) {
        Ok(config) => config,
        Err(e) => {
            error!(error = %e, "unable to load configuration");
            return ExitCode::FAILURE;
        }
    };

    let mut ok = check("request", &config.caches.request, DEFAULT_REQUEST_SPEC);
    match config.favicon_spec() {
        Some(spec) => ok &= check("favicon", spec, DEFAULT_FAVICON_SPEC),
        None => println!("favicon: disabled"),
    }
    println!(
        "player tracking: {}, statistics: {}",
        on_off(config.plugin.player_tracking),
        on_off(config.plugin.stats)
    );

    if ok {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    }
}

/// Print the effective policy for one cache. Returns `false` on fallback.
fn check(cache: &str, spec: &str, default: &str) -> bool {
    match CacheSpec::parse(spec) {
        Ok(parsed) => {
            println!("{cache}: {}", describe(&parsed));
            true
        }
        Err(e) => {
            println!("{cache}: invalid spec {spec:?}: {e}");
            println!("{cache}: would fall back to {default:?}");
            false
        }
    }
}

fn describe(spec: &CacheSpec) -> String {
    if !spec.is_bounded() {
        return "unbounded".to_string();
    }
    spec.to_string()
}

fn on_off(value: bool) -> &'static str {
    if value { "on" } else { "off" }
}
