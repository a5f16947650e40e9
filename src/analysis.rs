use chrono::{DateTime, FixedOffset, Utc};
use serde::Deserialize;
use tracing::{debug, info};

use crate::db::DocumentStore;
use crate::error::AppError;
use crate::llm::LanguageModel;
use crate::models::{parse_timestamp, Assignment, BurnoutResult, ViewKind, Window, WorkloadSummary};
use crate::report::build_prompt;
use crate::risk::interpret_reply;
use crate::window::resolve_window;
use crate::workload::summarize_workload;

#[derive(Debug, Clone, Deserialize)]
pub struct AnalysisRequest {
    pub email: String,
    #[serde(default)]
    pub view: Option<String>,
    #[serde(default)]
    pub date: Option<String>,
}

/// Everything needed to ask the model, with in-window assignments in store order.
#[derive(Debug, Clone)]
pub struct PromptPlan {
    pub view: ViewKind,
    pub window: Window,
    pub assignments: Vec<Assignment>,
    pub summary: WorkloadSummary,
    pub prompt: String,
}

fn parse_anchor(raw: Option<&str>) -> Result<DateTime<FixedOffset>, AppError> {
    match raw {
        Some(raw) => parse_timestamp(raw)
            .ok_or_else(|| AppError::Validation(format!("Invalid date: {}", raw))),
        None => Ok(Utc::now().fixed_offset()),
    }
}

pub async fn prepare_prompt(
    store: &dyn DocumentStore,
    request: &AnalysisRequest,
) -> Result<PromptPlan, AppError> {
    let email = request.email.trim();
    if email.is_empty() {
        return Err(AppError::Validation("email is required".to_string()));
    }

    let view = match request.view.as_deref() {
        Some(raw) => raw.parse::<ViewKind>()?,
        None => ViewKind::default(),
    };
    let anchor = parse_anchor(request.date.as_deref())?;

    let documents = store.find_assignments(email).await?;
    let assignments: Vec<Assignment> = documents.iter().map(Assignment::from_document).collect();
    for undated in assignments.iter().filter(|a| a.due_at.is_none()) {
        debug!(assignment_id = %undated.id, "assignment has no usable due date");
    }

    let window = resolve_window(view, anchor);
    let workload = summarize_workload(&assignments, &window)?;
    let prompt = build_prompt(view, &window, &workload);

    info!(
        email,
        view = view.label(),
        start = %window.start,
        end = %window.end,
        total = assignments.len(),
        in_window = workload.summary.count,
        quizzes = workload.summary.quiz_count,
        "workload summarized"
    );

    Ok(PromptPlan {
        view,
        window,
        assignments: workload.assignments.iter().map(|a| (*a).clone()).collect(),
        summary: workload.summary,
        prompt,
    })
}

/// Full pipeline: store read, windowing, prompt, model call, reply interpretation.
pub async fn run_analysis(
    store: &dyn DocumentStore,
    llm: &dyn LanguageModel,
    request: &AnalysisRequest,
) -> Result<BurnoutResult, AppError> {
    let plan = prepare_prompt(store, request).await?;
    let reply = llm.generate(&plan.prompt).await?;

    let in_window: Vec<&Assignment> = plan.assignments.iter().collect();
    let result = interpret_reply(&reply, &in_window, &plan.window);

    info!(
        view = plan.view.label(),
        overlapping_days = plan.summary.overlapping_days.len(),
        burnout = result.burnout,
        stress_level = ?result.stress_level,
        "burnout analysis complete"
    );
    Ok(result)
}


#[cfg(test)]
mod tests {
    use super::stub::StubModel;
    use super::*;
    use crate::db::memory::MemoryStore;
    use crate::models::{AssignmentDocument, StressLevel};

    const EMAIL: &str = "sam@example.edu";

    fn doc(id: &str, title: &str, due_at: &str, points: Option<f64>) -> AssignmentDocument {
        AssignmentDocument {
            id: id.to_string(),
            user_email: EMAIL.to_string(),
            course_name: Some("Statistics".to_string()),
            title: Some(title.to_string()),
            due_at: Some(due_at.to_string()),
            points,
        }
    }

    fn store() -> MemoryStore {
        MemoryStore {
            assignments: vec![
                doc("1", "Quiz 3", "2024-03-12T09:00:00Z", Some(10.0)),
                doc("2", "Homework 5", "2024-03-12T23:59:00Z", Some(20.0)),
                doc("3", "Final Exam", "2024-03-28T09:00:00Z", Some(200.0)),
                doc("4", "Survey", "whenever", None),
            ],
            ..MemoryStore::default()
        }
    }

    fn request(view: Option<&str>, date: Option<&str>) -> AnalysisRequest {
        AnalysisRequest {
            email: EMAIL.to_string(),
            view: view.map(str::to_string),
            date: date.map(str::to_string),
        }
    }

    #[tokio::test]
    async fn week_analysis_end_to_end() {
        let store = store();
        let model = StubModel::replying("Burnout Risk: 82%\n1. Two deadlines on Tuesday");

        let result = run_analysis(&store, &model, &request(None, Some("2024-03-14")))
            .await
            .unwrap();

        assert_eq!(result.burnout, 82);
        assert_eq!(result.stress_level, StressLevel::High);
        assert!(result.summary.starts_with("Burnout Risk: 82%"));
        assert_eq!(result.weekly_stress_map.len(), 1);
        assert_eq!(result.weekly_stress_map.get("T").map(String::as_str), Some("red"));

        let prompts = model.prompts.lock().unwrap();
        assert!(prompts[0].contains("- Total assignments: 2"));
        assert!(prompts[0].contains("- Total points: 30"));
        assert!(prompts[0].contains("- Quizzes/exams: 1"));
    }

    #[tokio::test]
    async fn month_view_includes_later_exam() {
        let plan = prepare_prompt(&store(), &request(Some("Month"), Some("2024-03-14")))
            .await
            .unwrap();
        assert_eq!(plan.view, ViewKind::Month);
        assert_eq!(plan.summary.count, 3);
        assert_eq!(plan.summary.quiz_count, 2);
        assert_eq!(plan.summary.total_points, 230.0);
    }

    #[tokio::test]
    async fn user_without_assignments_is_not_found() {
        let model = StubModel::replying("50%");
        let mut req = request(None, Some("2024-03-14"));
        req.email = "nobody@example.edu".to_string();

        let err = run_analysis(&store(), &model, &req).await.unwrap_err();
        assert!(matches!(err, AppError::NotFound(ref msg) if msg == "No assignments found"));
        assert_eq!(model.calls(), 0);
    }

    #[tokio::test]
    async fn empty_window_still_calls_model() {
        let model = StubModel::replying("nothing to see");
        let result = run_analysis(&store(), &model, &request(Some("Day"), Some("2024-01-01")))
            .await
            .unwrap();

        assert_eq!(model.calls(), 1);
        assert_eq!(result.burnout, 64);
        assert_eq!(result.stress_level, StressLevel::Moderate);
        assert!(result.weekly_stress_map.is_empty());
    }

    #[tokio::test]
    async fn rejects_bad_view_and_date() {
        let model = StubModel::replying("10%");
        let bad_view = run_analysis(&store(), &model, &request(Some("Year"), None)).await;
        assert!(matches!(bad_view, Err(AppError::InvalidViewKind(_))));

        let bad_date = run_analysis(&store(), &model, &request(None, Some("soon"))).await;
        assert!(matches!(bad_date, Err(AppError::Validation(_))));
        assert_eq!(model.calls(), 0);
    }

    #[tokio::test]
    async fn model_failure_is_propagated() {
        let model = StubModel::failing("connection refused");
        let err = run_analysis(&store(), &model, &request(None, Some("2024-03-14")))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Llm(_)));
    }

    #[tokio::test]
    async fn identical_inputs_give_identical_output() {
        let store = store();
        let model = StubModel::replying("Burnout Risk: 55%");
        let req = request(Some("Week"), Some("2024-03-14T10:00:00Z"));

        let first = run_analysis(&store, &model, &req).await.unwrap();
        let second = run_analysis(&store, &model, &req).await.unwrap();
        assert_eq!(first, second);

        let prompts = model.prompts.lock().unwrap();
        assert_eq!(prompts[0], prompts[1]);
    }
}
