use std::collections::{BTreeMap, BTreeSet};

use crate::error::AppError;
use crate::models::{Assignment, Window, WorkloadSummary};

const ASSESSMENT_KEYWORDS: [&str; 2] = ["quiz", "exam"];

/// Assignments that fell inside a window, in store order, plus their statistics.
#[derive(Debug, Clone)]
pub struct Workload<'a> {
    pub assignments: Vec<&'a Assignment>,
    pub summary: WorkloadSummary,
}

/// Filters `assignments` into `window` and aggregates them.
///
/// Errors only when the user has no assignments at all; a user whose assignments
/// all fall outside the window gets an empty summary.
pub fn summarize_workload<'a>(
    assignments: &'a [Assignment],
    window: &Window,
) -> Result<Workload<'a>, AppError> {
    if assignments.is_empty() {
        return Err(AppError::NotFound("No assignments found".to_string()));
    }

    let in_window: Vec<&Assignment> = assignments
        .iter()
        .filter(|a| a.due_at.map_or(false, |due| window.contains(&due)))
        .collect();

    let summary = summarize(&in_window, window);
    Ok(Workload {
        assignments: in_window,
        summary,
    })
}

pub fn summarize(assignments: &[&Assignment], window: &Window) -> WorkloadSummary {
    let mut per_day: BTreeMap<chrono::NaiveDate, usize> = BTreeMap::new();
    let mut summary = WorkloadSummary {
        count: assignments.len(),
        ..WorkloadSummary::default()
    };

    for assignment in assignments {
        summary.total_points += assignment.points.unwrap_or(0.0);

        if assignment.title.as_deref().map_or(false, is_assessment) {
            summary.quiz_count += 1;
        }

        let Some(due) = assignment.due_at else {
            continue;
        };
        *per_day.entry(window.local_date(&due)).or_insert(0) += 1;

        if summary.earliest_due.map_or(true, |current| due < current) {
            summary.earliest_due = Some(due);
        }
        if summary.latest_due.map_or(true, |current| due > current) {
            summary.latest_due = Some(due);
        }
    }

    summary.overlapping_days = per_day
        .into_iter()
        .filter(|(_, count)| *count >= 2)
        .map(|(day, _)| day)
        .collect::<BTreeSet<_>>();

    summary
}

pub fn is_assessment(title: &str) -> bool {
    let lowered = title.to_lowercase();
    ASSESSMENT_KEYWORDS.iter().any(|keyword| lowered.contains(keyword))
}
