use super::models::{ExecutionResult, ExecutionSummary};

/// Derives the aggregate view of a finished run. Average latency rounds to
/// the nearest millisecond and an empty run averages 0 rather than
/// dividing by zero.
pub fn summarize(results: &[ExecutionResult]) -> ExecutionSummary {
    let successful_requests = results.iter().filter(|r| r.success).count();
    let average_response_time_ms = if results.is_empty() {
        0
    } else {
        let total: u64 = results.iter().map(|r| r.response_time_ms).sum();
        (total as f64 / results.len() as f64).round() as u64
    };

    ExecutionSummary {
        total_requests: results.len(),
        successful_requests,
        failed_requests: results.len() - successful_requests,
        average_response_time_ms,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::runner::models::OriginalRequest;

    fn result(success: bool, response_time_ms: u64) -> ExecutionResult {
        ExecutionResult {
            name: "r".to_string(),
            method: "GET".to_string(),
            url: String::new(),
            status: if success { 200 } else { 0 },
            status_text: String::new(),
            response_time_ms,
            success,
            error: None,
            response_size: 0,
            response_data: String::new(),
            response_headers: Vec::new(),
            original_request: OriginalRequest::default(),
        }
    }

    #[test]
    fn empty_run_averages_zero() {
        let summary = summarize(&[]);
        assert_eq!(summary.total_requests, 0);
        assert_eq!(summary.average_response_time_ms, 0);
    }

    #[test]
    fn averages_round_to_nearest_millisecond() {
        let summary = summarize(&[result(true, 100), result(false, 300)]);
        assert_eq!(summary.total_requests, 2);
        assert_eq!(summary.successful_requests, 1);
        assert_eq!(summary.failed_requests, 1);
        assert_eq!(summary.average_response_time_ms, 200);

        let summary = summarize(&[result(true, 100), result(true, 101), result(true, 101)]);
        assert_eq!(summary.average_response_time_ms, 101);
    }
}
