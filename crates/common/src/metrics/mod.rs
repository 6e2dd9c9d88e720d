//! Metrics and observability utilities
//!
//! Prometheus metrics for the submission workflow with
//! standardized naming conventions.

use metrics::{counter, describe_counter, describe_histogram, histogram, Unit};

/// Metrics prefix for all service metrics  
pub const METRICS_PREFIX: &str = "apit";

/// Buckets for document conversion latency (in seconds)
pub const CONVERSION_BUCKETS: &[f64] = &[
    0.100,  // 100ms
    0.250,  // 250ms
    0.500,  // 500ms
    1.000,  // 1s
    2.500,  // 2.5s
    5.000,  // 5s
    10.00,  // 10s
    30.00,  // 30s
    60.00,  // 60s
];

/// Register all metric descriptions
pub fn register_metrics() {
    describe_counter!(
        format!("{}_articles_submitted_total", METRICS_PREFIX),
        Unit::Count,
        "Articles accepted and persisted"
    );
    
    describe_counter!(
        format!("{}_submission_rejections_total", METRICS_PREFIX),
        Unit::Count,
        "Rejected submissions, labelled by offending form field"
    );
    
    describe_counter!(
        format!("{}_document_conversions_total", METRICS_PREFIX),
        Unit::Count,
        "Document conversions attempted, labelled by outcome"
    );
    
    describe_histogram!(
        format!("{}_document_conversion_duration_seconds", METRICS_PREFIX),
        Unit::Seconds,
        "External document converter latency in seconds"
    );
    
    describe_counter!(
        format!("{}_articles_deleted_total", METRICS_PREFIX),
        Unit::Count,
        "Articles deleted by their authors"
    );
    
    tracing::info!("Metrics registered");
}

/// Record an accepted submission
pub fn record_submission(source: &str) {
    counter!(
        format!("{}_articles_submitted_total", METRICS_PREFIX),
        "source" => source.to_string()
    )
    .increment(1);
}

/// Record a rejected submission, once per offending field
pub fn record_rejection<'a>(fields: impl IntoIterator<Item = &'a str>) {
    for field in fields {
        counter!(
            format!("{}_submission_rejections_total", METRICS_PREFIX),
            "field" => field.to_string()
        )
        .increment(1);
    }
}

/// Record a converter run
pub fn record_conversion(duration_secs: f64, success: bool) {
    let status = if success { "success" } else { "error" };
    
    counter!(
        format!("{}_document_conversions_total", METRICS_PREFIX),
        "status" => status
    )
    .increment(1);
    
    histogram!(format!("{}_document_conversion_duration_seconds", METRICS_PREFIX))
        .record(duration_secs);
}

/// Record an article deletion
pub fn record_deletion() {
    counter!(format!("{}_articles_deleted_total", METRICS_PREFIX)).increment(1);
}

#[cfg(test)]
mod tests {
    use super::*;
    
    #[test]
    fn test_conversion_buckets_sorted() {
        let mut prev = 0.0;
        for &bucket in CONVERSION_BUCKETS {
            assert!(bucket > prev);
            prev = bucket;
        }
    }
    
    #[test]
    fn test_recording_without_recorder() {
        // No recorder installed: the facade must accept calls silently
        register_metrics();
        record_submission("upload");
        record_rejection(["key_words", "doc_file"]);
        record_conversion(0.5, false);
        record_deletion();
    }
}
