use colored::{Color, Colorize};

use super::models::{ExecutionResult, RunReport};

pub fn print_run_report(title: &str, report: &RunReport) {
    println!("{} {}", "Collection:".bold(), title.cyan());
    println!();

    for result in &report.results {
        print_result(result);
    }

    let summary = &report.summary;
    println!();
    println!(
        "{} {} requests, {} succeeded, {} failed, {} avg",
        "Summary:".bold(),
        summary.total_requests,
        format!("{}", summary.successful_requests).green(),
        colorize_failures(summary.failed_requests),
        format!("{} ms", summary.average_response_time_ms).dimmed()
    );
}

fn print_result(result: &ExecutionResult) {
    println!(
        "{} {} {}",
        result.method.bold(),
        result.name,
        result.url.cyan()
    );

    if result.status == 0 {
        println!(
            "  {} {}",
            result.status_text.red(),
            result.error.as_deref().unwrap_or("").dimmed()
        );
        return;
    }

    let status_color = if result.status >= 400 {
        Color::Red
    } else if result.status >= 300 {
        Color::Yellow
    } else {
        Color::Green
    };
    println!(
        "  {} {} {}",
        format!("{}", result.status).color(status_color),
        result.status_text.color(status_color),
        format!("({} ms, {} bytes)", result.response_time_ms, result.response_size).dimmed()
    );
}

fn colorize_failures(failed: usize) -> String {
    if failed > 0 {
        format!("{failed}").red().to_string()
    } else {
        format!("{failed}")
    }
}
