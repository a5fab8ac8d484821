//! Prometheus metrics for search and sync

use lazy_static::lazy_static;
use prometheus::{
    register_counter_vec, register_histogram_vec, register_int_gauge, CounterVec, HistogramVec,
    IntGauge,
};

/// Search and sync metrics
pub struct SearchMetrics {
    /// Fan-out searches by outcome (ok, error, timeout, invalid)
    pub searches: CounterVec,

    /// Fan-out search latency
    pub search_latency: HistogramVec,

    /// Hits returned per kind
    pub hits_returned: CounterVec,

    /// Stored hits skipped because they do not decode into their kind
    pub hits_skipped: CounterVec,

    /// Upserts by index and outcome (applied, stale, error)
    pub upserts: CounterVec,

    /// Sync messages by outcome (applied, dropped, invalid_index, retried, dead_lettered)
    pub sync_messages: CounterVec,

    /// Current consumer state as its ordinal
    pub consumer_state: IntGauge,
}

lazy_static! {
    pub static ref SEARCH_METRICS: SearchMetrics = SearchMetrics {
        searches: register_counter_vec!(
            "search_requests_total",
            "Total number of fan-out searches",
            &["outcome"]
        )
        .unwrap(),

        search_latency: register_histogram_vec!(
            "search_latency_seconds",
            "Fan-out search latency in seconds",
            &["outcome"]
        )
        .unwrap(),

        hits_returned: register_counter_vec!(
            "search_hits_returned_total",
            "Total number of hits returned",
            &["kind"]
        )
        .unwrap(),

        hits_skipped: register_counter_vec!(
            "search_hits_skipped_total",
            "Total number of undecodable hits left out of results",
            &["kind"]
        )
        .unwrap(),

        upserts: register_counter_vec!(
            "search_index_upserts_total",
            "Total number of document upserts",
            &["index", "outcome"]
        )
        .unwrap(),

        sync_messages: register_counter_vec!(
            "search_sync_messages_total",
            "Total number of sync events handled",
            &["outcome"]
        )
        .unwrap(),

        consumer_state: register_int_gauge!(
            "search_sync_consumer_state",
            "Sync consumer state (0 stopped, 1 subscribing, 2 running, 3 failed)"
        )
        .unwrap(),
    };
}

/// Initialize search metrics
pub fn init_search_metrics() {
    lazy_static::initialize(&SEARCH_METRICS);
}
