//! This module provides observability hooks for the table engine.
//!
//! Every public operation reports what it did (rows touched, bytes produced or
//! consumed) as one structured key/value line. The `log_metric!` macro is the
//! primary tool. Lines go through the `log` facade at debug level under the
//! `pbtable::metrics` target, so they cost nothing unless a logger is installed
//! and that target is enabled, and the macro body is compiled out of release
//! builds entirely.

use std::fs::OpenOptions;
use std::sync::Once;

use log::LevelFilter;

use crate::error::PbTableError;

/// Logs a structured key-value metric line, only in debug builds.
///
/// Usage: `log_metric!("event" = "encode", "rows" = &rows, "bytes" = &out.len());`
macro_rules! log_metric {
    ($($key:literal = $value:expr),+ $(,)?) => {
        #[cfg(debug_assertions)]
        {
            // Collect each pair as a JSON string fragment
            let mut parts = Vec::new();
            $(
                parts.push(format!("\"{}\": \"{}\"", $key, $value));
            )+

            log::debug!(target: "pbtable::metrics", "PBTABLE_METRIC: {{ {} }}", parts.join(", "));
        }
    };
}

static INIT_LOGGER: Once = Once::new();

/// Installs an `env_logger` backend at debug level, writing to `log_file` in
/// append mode if given and to stderr otherwise.
///
/// Only the first call installs a logger; later calls are no-ops. If another
/// logger is already installed, it is left in place.
pub fn enable_verbose_logging(log_file: Option<&str>) -> Result<(), PbTableError> {
    let file = log_file
        .map(|path| OpenOptions::new().append(true).create(true).open(path))
        .transpose()?;

    INIT_LOGGER.call_once(|| {
        let mut builder = env_logger::Builder::new();

        builder.is_test(false);
        builder.filter_level(LevelFilter::Debug);

        // Custom formatter: just print the level and message
        builder.format(|buf, record| {
            use std::io::Write;
            writeln!(buf, "[{}] {}", record.level(), record.args())
        });

        if let Some(file) = file {
            builder.target(env_logger::Target::Pipe(Box::new(file)));
        }

        let _ = builder.try_init();
    });
    Ok(())
}
