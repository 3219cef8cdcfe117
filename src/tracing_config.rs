//! Tracing configuration.
//!
//! The subscriber is only initialised when `SEMA_LOG` (or `RUST_LOG`) is
//! set, so there is zero overhead in normal builds.
//!
//! ```bash
//! SEMA_LOG=debug cargo test
//! SEMA_LOG="sema::bind=trace,sema::resolve=debug" cargo test
//! ```

use tracing_subscriber::EnvFilter;

/// Build an `EnvFilter` from `SEMA_LOG`, falling back to `RUST_LOG`.
///
/// `SEMA_LOG` takes precedence when both are set. Values use the same
/// syntax as `RUST_LOG` (e.g. `debug`, `sema::bind=trace`).
fn build_filter() -> EnvFilter {
    if let Ok(val) = std::env::var("SEMA_LOG") {
        EnvFilter::builder().parse_lossy(val)
    } else {
        EnvFilter::from_default_env()
    }
}

/// Initialise the global tracing subscriber.
///
/// Does nothing when neither `SEMA_LOG` nor `RUST_LOG` is set. All output
/// goes to stderr so it never interferes with stdout. Safe to call more
/// than once; later calls are ignored.
pub fn init_tracing() {
    let has_sema_log = std::env::var("SEMA_LOG").is_ok();
    let has_rust_log = std::env::var("RUST_LOG").is_ok();
    if !has_sema_log && !has_rust_log {
        return;
    }

    let _ = tracing_subscriber::fmt()
        .with_env_filter(build_filter())
        .with_writer(std::io::stderr)
        .try_init();
}
