use anyhow::Context as _;

/// chromiumoxide reports every unrecognised CDP event as an error, which buries
/// the download log. Silenced unless `RUST_LOG` asks for it.
const DEFAULT_DIRECTIVES: &str = "info,chromiumoxide=off";

pub fn init() -> anyhow::Result<()> {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .or_else(|_| tracing_subscriber::EnvFilter::try_new(DEFAULT_DIRECTIVES))
        .context("build log filter")?;

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .try_init()
        .map_err(|err| anyhow::anyhow!("initialize tracing subscriber: {err}"))?;

    Ok(())
}
