//! LeverLab Runner — sweep orchestration, summary statistics, config, export.
//!
//! This crate builds on `leverlab-core` to provide:
//! - The sweep driver over (symbol, indicator-setting, order-setting) combinations,
//!   sequential or rayon-parallel with identical output
//! - The per-combination bar loop and its summary statistics
//! - Injected log sinks (no-op, console, timestamped file)
//! - TOML sweep configuration with grid expansion
//! - CSV/JSON export and BLAKE3 output fingerprints
//! - CSV input loading and seeded synthetic inputs

pub mod combination;
pub mod config;
pub mod data_loader;
pub mod export;
pub mod fingerprint;
pub mod logging;
pub mod metrics;
pub mod sweep;
pub mod synthetic;

pub use combination::{order_record_capacity, run_combination, CombinationOutcome};
pub use config::{OrderSettingsGrid, SettingsError, SweepConfig};
pub use data_loader::{load_entries, load_prices, LoadError};
pub use export::{save_artifacts, ArtifactOptions, SweepSummary, SCHEMA_VERSION};
pub use fingerprint::{dataset_fingerprint, output_fingerprint, Fingerprint};
pub use logging::{LogLevel, LogSink, Logger, LoggingConfig};
pub use metrics::TradeStats;
pub use sweep::{SweepDriver, SweepError, SweepInputs, SweepOutput};
pub use synthetic::SyntheticConfig;

#[cfg(test)]
mod send_sync_checks {
    use super::*;

    fn assert_send<T: Send>() {}
    fn assert_sync<T: Sync>() {}

    #[test]
    fn shared_sweep_types_are_send_sync() {
        assert_send::<SweepDriver>();
        assert_sync::<SweepDriver>();
        assert_send::<SweepInputs>();
        assert_sync::<SweepInputs>();
        assert_send::<Logger>();
        assert_sync::<Logger>();
        assert_send::<CombinationOutcome>();
    }
}
