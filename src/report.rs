use std::fmt::Write;

use crate::models::{Assignment, ViewKind, Window};
use crate::workload::Workload;

const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

pub fn format_points(points: f64) -> String {
    if points.fract() == 0.0 {
        format!("{:.0}", points)
    } else {
        format!("{}", points)
    }
}

/// Fixed-width listing of assignments: due date, course, title, points.
pub fn render_table(assignments: &[&Assignment], window: &Window) -> String {
    let mut output = String::new();

    let _ = writeln!(
        output,
        "{:<19} | {:<23} | {:<28} | {:^6}",
        "Due Date", "Course Name", "Title", "Points"
    );
    let _ = writeln!(
        output,
        "{}-+-{}-+-{}-+-{}",
        "-".repeat(19),
        "-".repeat(23),
        "-".repeat(28),
        "-".repeat(6)
    );

    for assignment in assignments {
        let due = assignment
            .due_at
            .map(|due| {
                due.with_timezone(&window.offset)
                    .format(TIMESTAMP_FORMAT)
                    .to_string()
            })
            .unwrap_or_else(|| "N/A".to_string());
        let points = assignment
            .points
            .map(format_points)
            .unwrap_or_else(|| "0".to_string());

        let _ = writeln!(
            output,
            "{:<19} | {:<23} | {:<28} | {:^6}",
            due,
            assignment.course_name.as_deref().unwrap_or("N/A"),
            assignment.title.as_deref().unwrap_or("N/A"),
            points
        );
    }

    output
}

pub fn build_prompt(view: ViewKind, window: &Window, workload: &Workload<'_>) -> String {
    let summary = &workload.summary;
    let mut output = String::new();

    let overlapping = if summary.overlapping_days.is_empty() {
        "None".to_string()
    } else {
        summary
            .overlapping_days
            .iter()
            .map(|day| day.format("%A, %Y-%m-%d").to_string())
            .collect::<Vec<_>>()
            .join(", ")
    };
    let format_due = |due: Option<chrono::DateTime<chrono::FixedOffset>>| {
        due.map(|ts| ts.with_timezone(&window.offset).format(TIMESTAMP_FORMAT).to_string())
            .unwrap_or_else(|| "N/A".to_string())
    };

    let _ = writeln!(
        output,
        "You are an academic wellness assistant. Estimate the burnout risk of a student \
         from the workload below."
    );
    let _ = writeln!(output);
    let _ = writeln!(output, "View: {}", view.label());
    let _ = writeln!(
        output,
        "Window: {} to {} (UTC{})",
        window.start_at().format(TIMESTAMP_FORMAT),
        window.end_at().format(TIMESTAMP_FORMAT),
        window.offset
    );
    let _ = writeln!(output);
    let _ = writeln!(output, "Workload statistics:");
    let _ = writeln!(output, "- Total assignments: {}", summary.count);
    let _ = writeln!(output, "- Quizzes/exams: {}", summary.quiz_count);
    let _ = writeln!(output, "- Total points: {}", format_points(summary.total_points));
    let _ = writeln!(
        output,
        "- Days with overlapping deadlines: {}",
        summary.overlapping_days.len()
    );
    let _ = writeln!(output, "- Overlapping dates: {}", overlapping);
    let _ = writeln!(output, "- Earliest due: {}", format_due(summary.earliest_due));
    let _ = writeln!(output, "- Latest due: {}", format_due(summary.latest_due));
    let _ = writeln!(output);
    let _ = writeln!(output, "Assignments in this window:");
    let _ = write!(output, "{}", render_table(&workload.assignments, window));
    let _ = writeln!(output);
    let _ = writeln!(output, "Reply in plain text using exactly this format:");
    let _ = writeln!(output, "Burnout Risk: <number>%");
    let _ = writeln!(output, "Top 3 Reasons:");
    for n in 1..=3 {
        let _ = writeln!(output, "{n}. <reason>");
    }
    let _ = writeln!(output, "Top 3 Strategies:");
    for n in 1..=3 {
        let _ = writeln!(output, "{n}. <strategy>");
    }
    let _ = writeln!(output, "Top 3 Healthy Habits:");
    for n in 1..=3 {
        let _ = writeln!(output, "{n}. <habit>");
    }
    let _ = writeln!(output, "Most Stressful Day: <weekday and date>");
    let _ = writeln!(output, "Assignments:");
    let _ = writeln!(output, "<reprint the assignment table above unchanged>");

    output
}
