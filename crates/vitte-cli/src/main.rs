//! vitte-cli/src/main.rs
//!
//! Point d'entrée du binaire `vitte`. On prépare l'environnement (logs,
//! rapports d'erreurs) puis on délègue toute la logique à `vitte_cli::run()`.
//!
//! Avantages :
//! - `lib.rs` peut être testé en unité (cargo test -p vitte-cli)
//! - main.rs reste minimal, juste pour le setup global

fn main() {
    if let Err(e) = color_eyre::install() {
        eprintln!("warning: color-eyre init failed: {e}");
    }

    #[cfg(feature = "tracing")]
    init_tracing();
    #[cfg(not(feature = "tracing"))]
    env_logger::init();

    let code = match vitte_cli::run(std::env::args()) {
        Ok(code) => code,
        Err(err) => {
            eprintln!("{err:#}");
            -1
        }
    };

    std::process::exit(code);
}

/// Install a `tracing-subscriber` fmt layer (`RUST_LOG`-filtered, same
/// env var `env_logger` would have read) so the spans `vitte-core`,
/// `vitte-compiler` and `vitte-vm` emit under this feature render with
/// their fields instead of going nowhere.
#[cfg(feature = "tracing")]
fn init_tracing() {
    use tracing_subscriber::EnvFilter;
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    if let Err(e) = tracing_subscriber::fmt().with_env_filter(filter).try_init() {
        eprintln!("warning: tracing-subscriber init failed: {e}");
    }
}
