//! Plain-text rendering of dashboard output.

use workshop_pulse_core::analytics::MetricTrend;
use workshop_pulse_core::{DashboardStats, WorkshopRecord};

/// Format a trend for display (e.g., "+23%" or "-15%").
fn format_trend(trend: &MetricTrend) -> String {
    if trend.trend >= 0 {
        format!("+{}%", trend.trend)
    } else {
        format!("{}%", trend.trend)
    }
}

pub fn print_dashboard(stats: &DashboardStats) {
    let w = &stats.workshops;
    println!(
        "Workshops: {} total ({} completed, {} in progress, {} scheduled)",
        w.total, w.completed, w.in_progress, w.scheduled
    );
    println!("Students: {}", w.total_students);
    println!("Average rating: {:.1}", w.avg_rating);
    println!(
        "Sources: {} manual, {} calendar",
        stats.manual_count, stats.external_count
    );

    let t = &stats.trends;
    println!();
    println!("Last 30 days vs previous 30:");
    println!(
        "  Workshops      {:>6} ({})",
        t.workshops.current,
        format_trend(&t.workshops)
    );
    println!(
        "  Avg duration   {:>5}h ({})",
        t.avg_duration.current,
        format_trend(&t.avg_duration)
    );
    println!(
        "  Completed      {:>6} ({})",
        t.decks_created.current,
        format_trend(&t.decks_created)
    );

    println!();
    println!("Hours by day ({}):", stats.range);
    if stats.chart.is_empty() {
        println!("  no workshops in range");
    }
    for point in &stats.chart {
        println!("  {:<7} {}h", point.label, point.value);
    }

    let ai = &stats.ai_usage;
    println!();
    println!(
        "AI usage: {} requests, {} tokens, ${:.4}, {:.1}% success, {}ms avg",
        ai.total_requests, ai.total_tokens, ai.total_cost, ai.success_rate, ai.avg_response_time
    );
    println!(
        "  Today {} / week {} / month {} requests",
        ai.today.requests, ai.week.requests, ai.month.requests
    );
    for point in &stats.ai_weekly {
        println!("  {:<7} {}%", point.label, point.value);
    }

    if let Some(warning) = &stats.warning {
        println!();
        println!("Warning: {}", warning);
    }
}

pub fn print_workshops(workshops: &[WorkshopRecord]) {
    if workshops.is_empty() {
        println!("No workshop-like events.");
        return;
    }
    for w in workshops {
        println!(
            "{}  {}  {:<12} {:>6}  {} students  {}",
            w.date,
            w.id,
            w.status.as_str(),
            w.duration,
            w.students,
            w.title
        );
    }
}
