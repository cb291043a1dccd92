use serde::{Deserialize, Serialize};

/// One row of the university grading scale. The table is data, not logic:
/// grading-scale changes land here, never in branching code.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GradeBand {
    pub symbol: &'static str,
    pub min_marks: f64,
    pub max_marks: f64,
    pub grade_point: f64,
}

/// Ordered by descending grade point. The eight marks bands partition
/// [0, 100] contiguously; `AB` (absent) and `DB` (debarred) are zero-width
/// administrative symbols and are never derived from a marks value.
pub static GRADE_BANDS: [GradeBand; 10] = [
    GradeBand { symbol: "O", min_marks: 90.0, max_marks: 100.0, grade_point: 10.0 },
    GradeBand { symbol: "A+", min_marks: 80.0, max_marks: 89.0, grade_point: 9.0 },
    GradeBand { symbol: "A", min_marks: 70.0, max_marks: 79.0, grade_point: 8.0 },
    GradeBand { symbol: "B+", min_marks: 60.0, max_marks: 69.0, grade_point: 7.0 },
    GradeBand { symbol: "B", min_marks: 50.0, max_marks: 59.0, grade_point: 6.0 },
    GradeBand { symbol: "C", min_marks: 40.0, max_marks: 49.0, grade_point: 5.0 },
    GradeBand { symbol: "P", min_marks: 35.0, max_marks: 39.0, grade_point: 4.0 },
    GradeBand { symbol: "F", min_marks: 0.0, max_marks: 34.0, grade_point: 0.0 },
    GradeBand { symbol: "AB", min_marks: 0.0, max_marks: 0.0, grade_point: 0.0 },
    GradeBand { symbol: "DB", min_marks: 0.0, max_marks: 0.0, grade_point: 0.0 },
];

/// 2-decimal rounding used everywhere a result is reported:
/// `round(100*x) / 100`
pub fn round2(x: f64) -> f64 {
    (100.0 * x).round() / 100.0
}

/// Highest band whose lower bound is at or below `marks`. Total over the
/// reals: anything below 35 (including negative input) lands on `F`.
pub fn grade_for_marks(marks: f64) -> &'static GradeBand {
    let mut floor = &GRADE_BANDS[0];
    for band in GRADE_BANDS.iter().filter(|b| b.max_marks > b.min_marks) {
        if marks >= band.min_marks {
            return band;
        }
        floor = band;
    }
    floor
}

/// The "just enough" grade: the band with the smallest positive grade point
/// still at or above `required`. Relies on the table being ordered by
/// descending grade point.
pub fn min_grade_for(required: f64) -> Option<&'static GradeBand> {
    GRADE_BANDS
        .iter()
        .filter(|b| b.grade_point > 0.0 && b.grade_point >= required)
        .last()
}

#[derive(Debug, Clone, Serialize)]
pub struct CalcError {
    pub code: String,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
}

impl CalcError {
    pub fn new(code: &str, message: impl Into<String>) -> Self {
        Self {
            code: code.to_string(),
            message: message.into(),
            details: None,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Subject {
    #[serde(default)]
    pub name: String,
    pub credits: f64,
    pub marks: f64,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Semester {
    pub sgpa: f64,
    pub credits: f64,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FutureSemester {
    #[serde(default)]
    pub name: String,
    pub expected_sgpa: f64,
    pub credits: f64,
}

pub fn parse_subjects(raw: Option<&serde_json::Value>) -> Result<Vec<Subject>, CalcError> {
    let Some(raw) = raw else {
        return Err(CalcError::new("bad_params", "missing params.subjects"));
    };
    let mut subjects: Vec<Subject> = serde_json::from_value(raw.clone())
        .map_err(|e| CalcError::new("bad_params", format!("subjects: {}", e)))?;
    for (i, s) in subjects.iter_mut().enumerate() {
        if !s.credits.is_finite() || s.credits <= 0.0 {
            return Err(CalcError::new(
                "bad_params",
                format!("subjects[{}].credits must be a positive number", i),
            ));
        }
        if !s.marks.is_finite() {
            return Err(CalcError::new(
                "bad_params",
                format!("subjects[{}].marks must be a number", i),
            ));
        }
        // The lookup is defined for any real marks value, but entry is
        // clamped to the 0-100 scale here at the boundary.
        s.marks = s.marks.clamp(0.0, 100.0);
    }
    Ok(subjects)
}

pub fn parse_semesters(raw: Option<&serde_json::Value>) -> Result<Vec<Semester>, CalcError> {
    let Some(raw) = raw else {
        return Err(CalcError::new("bad_params", "missing params.semesters"));
    };
    let semesters: Vec<Semester> = serde_json::from_value(raw.clone())
        .map_err(|e| CalcError::new("bad_params", format!("semesters: {}", e)))?;
    for (i, s) in semesters.iter().enumerate() {
        if !s.credits.is_finite() || s.credits <= 0.0 {
            return Err(CalcError::new(
                "bad_params",
                format!("semesters[{}].credits must be a positive number", i),
            ));
        }
        if !s.sgpa.is_finite() || !(0.0..=10.0).contains(&s.sgpa) {
            return Err(CalcError::new(
                "bad_params",
                format!("semesters[{}].sgpa must be between 0 and 10", i),
            ));
        }
    }
    Ok(semesters)
}

pub fn parse_future_semesters(
    raw: Option<&serde_json::Value>,
) -> Result<Vec<FutureSemester>, CalcError> {
    let Some(raw) = raw else {
        return Err(CalcError::new(
            "bad_params",
            "missing params.futureSemesters",
        ));
    };
    let semesters: Vec<FutureSemester> = serde_json::from_value(raw.clone())
        .map_err(|e| CalcError::new("bad_params", format!("futureSemesters: {}", e)))?;
    for (i, s) in semesters.iter().enumerate() {
        if !s.credits.is_finite() || s.credits <= 0.0 {
            return Err(CalcError::new(
                "bad_params",
                format!("futureSemesters[{}].credits must be a positive number", i),
            ));
        }
        if !s.expected_sgpa.is_finite() || !(0.0..=10.0).contains(&s.expected_sgpa) {
            return Err(CalcError::new(
                "bad_params",
                format!(
                    "futureSemesters[{}].expectedSgpa must be between 0 and 10",
                    i
                ),
            ));
        }
    }
    Ok(semesters)
}

/// Credit-weighted average of grade points derived from marks. Empty or
/// zero-credit input yields 0.0 by policy, never NaN.
pub fn compute_sgpa(subjects: &[Subject]) -> f64 {
    let mut total_credits = 0.0_f64;
    let mut total_points = 0.0_f64;
    for s in subjects {
        let band = grade_for_marks(s.marks);
        total_credits += s.credits;
        total_points += s.credits * band.grade_point;
    }
    if total_credits > 0.0 {
        round2(total_points / total_credits)
    } else {
        0.0
    }
}

/// Credit-weighted average of semester SGPAs. Same zero-credit policy as
/// [`compute_sgpa`].
pub fn compute_cgpa(semesters: &[Semester]) -> f64 {
    let mut total_credits = 0.0_f64;
    let mut total_points = 0.0_f64;
    for s in semesters {
        total_credits += s.credits;
        total_points += s.credits * s.sgpa;
    }
    if total_credits > 0.0 {
        round2(total_points / total_credits)
    } else {
        0.0
    }
}

/// University equivalence formula: `(CGPA - 0.5) * 10`. Range checking is
/// the caller's responsibility.
pub fn cgpa_to_percentage(cgpa: f64) -> f64 {
    round2((cgpa - 0.5) * 10.0)
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TargetOutcome {
    pub required_sgpa: f64,
    pub achievable: bool,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub min_grade: Option<&'static str>,
}

impl TargetOutcome {
    fn rejected(message: impl Into<String>) -> Self {
        Self {
            required_sgpa: 0.0,
            achievable: false,
            message: message.into(),
            min_grade: None,
        }
    }
}

/// Inverts the CGPA weighted average: the SGPA needed over
/// `upcoming_credits` to move from `current_cgpa` to `target_cgpa`.
///
/// Out-of-range input and a zero upcoming-credit load come back as
/// non-achievable outcomes carrying the violated constraint; no arithmetic
/// is done for them. A required SGPA above 10 is a valid computed outcome
/// flagged unachievable, not an error.
pub fn required_sgpa(
    current_cgpa: f64,
    completed_credits: f64,
    target_cgpa: f64,
    upcoming_credits: f64,
) -> TargetOutcome {
    if !(0.0..=10.0).contains(&current_cgpa) || !(0.0..=10.0).contains(&target_cgpa) {
        return TargetOutcome::rejected("CGPA must be between 0 and 10");
    }
    if !completed_credits.is_finite() || completed_credits < 0.0 {
        return TargetOutcome::rejected("Completed credits cannot be negative");
    }
    if !upcoming_credits.is_finite() || upcoming_credits <= 0.0 {
        return TargetOutcome::rejected("Upcoming credits must be greater than zero");
    }

    let total_credits = completed_credits + upcoming_credits;
    let required =
        (target_cgpa * total_credits - current_cgpa * completed_credits) / upcoming_credits;

    if required > 10.0 {
        return TargetOutcome {
            required_sgpa: round2(required),
            achievable: false,
            message: format!(
                "You need an SGPA of {:.2}, which is above the maximum (10). Try a lower target CGPA.",
                required
            ),
            min_grade: None,
        };
    }
    if required < 0.0 {
        return TargetOutcome {
            required_sgpa: 0.0,
            achievable: true,
            message: format!(
                "You've already exceeded your target! Even with minimum grades, you'll surpass {:.2} CGPA.",
                target_cgpa
            ),
            min_grade: None,
        };
    }

    let min_grade = min_grade_for(required);
    let mut message = format!(
        "You need an SGPA of {:.2} in your upcoming semester.",
        required
    );
    if let Some(band) = min_grade {
        message.push_str(&format!(
            " Aim for an average grade of at least \"{}\" ({} points) across all subjects.",
            band.symbol, band.grade_point
        ));
    }
    TargetOutcome {
        required_sgpa: round2(required),
        achievable: true,
        message,
        min_grade: min_grade.map(|b| b.symbol),
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TrajectoryPoint {
    pub label: String,
    pub cgpa: f64,
    pub cumulative_credits: f64,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Projection {
    pub final_cgpa: f64,
    pub trajectory: Vec<TrajectoryPoint>,
}

/// Left fold of expected semesters onto the current standing, in input
/// order. The first trajectory point is always the starting state, so an
/// empty future list projects the current CGPA unchanged.
pub fn project_cgpa(
    current_cgpa: f64,
    completed_credits: f64,
    future: &[FutureSemester],
) -> Projection {
    let mut running_credits = completed_credits;
    let mut running_points = current_cgpa * completed_credits;

    let mut trajectory = vec![TrajectoryPoint {
        label: "Current".to_string(),
        cgpa: round2(current_cgpa),
        cumulative_credits: completed_credits,
    }];

    for sem in future {
        running_credits += sem.credits;
        running_points += sem.expected_sgpa * sem.credits;
        let cgpa = if running_credits > 0.0 {
            round2(running_points / running_credits)
        } else {
            0.0
        };
        trajectory.push(TrajectoryPoint {
            label: sem.name.clone(),
            cgpa,
            cumulative_credits: running_credits,
        });
    }

    let final_cgpa = trajectory.last().map(|p| p.cgpa).unwrap_or(0.0);
    Projection {
        final_cgpa,
        trajectory,
    }
}
