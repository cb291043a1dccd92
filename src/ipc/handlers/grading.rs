use crate::calc;
use crate::ipc::error::{calc_err, err, ok};
use crate::ipc::handlers::history;
use crate::ipc::types::{AppState, Request};
use serde_json::json;

fn num_param(req: &Request, key: &str) -> Option<f64> {
    req.params.get(key).and_then(|v| v.as_f64())
}

fn handle_grades_table(req: &Request) -> serde_json::Value {
    ok(&req.id, json!({ "grades": calc::GRADE_BANDS }))
}

fn handle_sgpa(state: &mut AppState, req: &Request) -> serde_json::Value {
    let subjects = match calc::parse_subjects(req.params.get("subjects")) {
        Ok(v) => v,
        Err(e) => return calc_err(&req.id, e),
    };

    let sgpa = calc::compute_sgpa(&subjects);
    let total_credits: f64 = subjects.iter().map(|s| s.credits).sum();
    let rows: Vec<serde_json::Value> = subjects
        .iter()
        .map(|s| {
            let band = calc::grade_for_marks(s.marks);
            json!({
                "name": s.name,
                "credits": s.credits,
                "marks": s.marks,
                "grade": band.symbol,
                "gradePoint": band.grade_point,
            })
        })
        .collect();

    let details = format!("{} subjects, {} credits", subjects.len(), total_credits);
    let mut result = json!({
        "sgpa": sgpa,
        "totalCredits": total_credits,
        "subjects": rows,
    });
    if let Some(entry) = history::record(state, "SGPA", sgpa, &details) {
        result["historyEntry"] = entry;
    }
    ok(&req.id, result)
}

fn handle_cgpa(state: &mut AppState, req: &Request) -> serde_json::Value {
    let semesters = match calc::parse_semesters(req.params.get("semesters")) {
        Ok(v) => v,
        Err(e) => return calc_err(&req.id, e),
    };

    let cgpa = calc::compute_cgpa(&semesters);
    let total_credits: f64 = semesters.iter().map(|s| s.credits).sum();

    let details = format!(
        "{} semesters, {} total credits",
        semesters.len(),
        total_credits
    );
    let mut result = json!({
        "cgpa": cgpa,
        "totalCredits": total_credits,
    });
    if let Some(entry) = history::record(state, "CGPA", cgpa, &details) {
        result["historyEntry"] = entry;
    }
    ok(&req.id, result)
}

fn handle_percentage(state: &mut AppState, req: &Request) -> serde_json::Value {
    let Some(cgpa) = num_param(req, "cgpa") else {
        return err(&req.id, "bad_params", "params.cgpa must be a number", None);
    };
    // Out-of-range input is rejected up front rather than fed through the
    // formula to produce a misleading value.
    if !(0.0..=10.0).contains(&cgpa) {
        return err(&req.id, "bad_params", "cgpa must be between 0 and 10", None);
    }

    let percentage = calc::cgpa_to_percentage(cgpa);
    let details = format!("CGPA: {}", cgpa);
    let mut result = json!({ "percentage": percentage });
    if let Some(entry) = history::record(state, "Percentage", percentage, &details) {
        result["historyEntry"] = entry;
    }
    ok(&req.id, result)
}

fn handle_required_sgpa(req: &Request) -> serde_json::Value {
    let parsed = (
        num_param(req, "currentCgpa"),
        num_param(req, "completedCredits"),
        num_param(req, "targetCgpa"),
        num_param(req, "upcomingCredits"),
    );
    let (Some(current), Some(completed), Some(target), Some(upcoming)) = parsed else {
        return err(
            &req.id,
            "bad_params",
            "currentCgpa, completedCredits, targetCgpa and upcomingCredits must all be numbers",
            None,
        );
    };

    let outcome = calc::required_sgpa(current, completed, target, upcoming);
    ok(
        &req.id,
        serde_json::to_value(&outcome).unwrap_or_else(|_| json!({})),
    )
}

fn handle_project(req: &Request) -> serde_json::Value {
    let future = match calc::parse_future_semesters(req.params.get("futureSemesters")) {
        Ok(v) => v,
        Err(e) => return calc_err(&req.id, e),
    };
    // Missing standing means projecting from scratch.
    let current = num_param(req, "currentCgpa").unwrap_or(0.0);
    let completed = num_param(req, "completedCredits").unwrap_or(0.0);
    if !(0.0..=10.0).contains(&current) {
        return err(
            &req.id,
            "bad_params",
            "currentCgpa must be between 0 and 10",
            None,
        );
    }
    if completed < 0.0 {
        return err(
            &req.id,
            "bad_params",
            "completedCredits cannot be negative",
            None,
        );
    }

    let projection = calc::project_cgpa(current, completed, &future);
    ok(
        &req.id,
        serde_json::to_value(&projection).unwrap_or_else(|_| json!({})),
    )
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    match req.method.as_str() {
        "grades.table" => Some(handle_grades_table(req)),
        "calc.sgpa" => Some(handle_sgpa(state, req)),
        "calc.cgpa" => Some(handle_cgpa(state, req)),
        "calc.percentage" => Some(handle_percentage(state, req)),
        "calc.requiredSgpa" => Some(handle_required_sgpa(req)),
        "calc.project" => Some(handle_project(req)),
        _ => None,
    }
}
