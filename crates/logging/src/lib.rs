use time::macros::format_description;
use tracing_subscriber::fmt;
use tracing_subscriber::prelude::*;
use tracing_subscriber::EnvFilter;

#[doc(hidden)]
pub use tracing;

/// Level used when `RUST_LOG` is unset or unparsable.
pub const DEFAULT_LEVEL: &str = "info";

/// Install the process-wide subscriber. `RUST_LOG` overrides the level.
///
/// Safe to call more than once; only the first call installs anything.
pub fn init_logger() {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_LEVEL));
    let time_format =
        format_description!("[year]-[month]-[day] [hour]:[minute]:[second].[subsecond digits:2]");

    let _ = tracing_subscriber::registry()
        .with(
            fmt::layer()
                .with_timer(fmt::time::LocalTime::new(time_format))
                .with_target(false)
                .with_level(true)
                .with_thread_names(false)
                .with_line_number(false)
                .with_file(false)
                .with_writer(std::io::stderr)
                .compact(),
        )
        .with(filter)
        .try_init();
}

/// Run a block and log how long it took at `info`.
///
/// The block is expanded in place, so `?` and early returns inside it behave
/// as they would without the macro. Nothing is logged when the block exits
/// early.
#[macro_export]
macro_rules! timeit {
    ($label:expr, $body:block) => {{
        let __timeit_start = ::std::time::Instant::now();
        let __timeit_value = $body;
        $crate::tracing::info!(
            "{} in {:.2?}",
            $label,
            __timeit_start.elapsed()
        );
        __timeit_value
    }};
}
