// SPDX-License-Identifier: GPL-3.0-only
//! Diagnostic dump tool.
//!
//! Enumerates every display, prints the field-stable dump block per
//! display, then one summary line each. Takes no arguments; retry and
//! timeout policy belong to the caller.

fn setup_logs() {
    use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

    let fmt_layer = fmt::layer().with_target(false);
    let filter_layer =
        EnvFilter::try_from_default_env().unwrap_or(EnvFilter::new("info,brightlink=debug"));

    tracing_subscriber::registry()
        .with(filter_layer)
        .with(fmt_layer)
        .init();
}

#[cfg(windows)]
fn main() -> anyhow::Result<()> {
    use std::io::Write;

    setup_logs();

    let mut registry = brightlink::platform::native_registry();
    registry.enumerate()?;

    let stdout = std::io::stdout();
    let mut out = stdout.lock();
    registry.dump(&mut out)?;
    for summary in registry.summary() {
        writeln!(
            out,
            "{}: {} hasBrightness={} percent={}",
            summary.index, summary.description, summary.has_brightness, summary.percent
        )?;
    }
    Ok(())
}

#[cfg(not(windows))]
fn main() {
    setup_logs();
    tracing::error!("no native display backends on this platform");
    std::process::exit(1);
}
