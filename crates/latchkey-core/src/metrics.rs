// Lock metrics
// Counters published through the `metrics` facade; the embedding application installs the exporter

use metrics::describe_counter;

/// Completed `acquire` calls, labelled by `outcome`
pub const ACQUIRE_TOTAL: &str = "latchkey_acquire_total";

/// Conditional-set attempts issued while acquiring
pub const ACQUIRE_ATTEMPTS_TOTAL: &str = "latchkey_acquire_attempts_total";

/// `release` calls on a held lock, labelled by whether the store was contacted
pub const RELEASE_TOTAL: &str = "latchkey_release_total";

/// Register metric descriptions.
/// Should be called once at application startup, after the recorder is installed
pub fn describe_metrics() {
    describe_counter!(
        ACQUIRE_TOTAL,
        "Total number of lock acquisitions by outcome (acquired, timeout)"
    );
    describe_counter!(
        ACQUIRE_ATTEMPTS_TOTAL,
        "Total number of conditional-set attempts made while acquiring locks"
    );
    describe_counter!(
        RELEASE_TOTAL,
        "Total number of lock releases, by whether a remote delete was issued"
    );
}
