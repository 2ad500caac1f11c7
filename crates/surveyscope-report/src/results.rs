use std::collections::BTreeMap;

use serde::Serialize;
use surveyscope_core::{RangeScope, ScoreRange, compute_scores, pick_range};
use surveyscope_storage::{Submission, SurveyRecord, SurveyStore};

use crate::error::ReportError;

pub const NO_DESCRIPTION: &str = "No description available";

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CategoryResult {
    pub category_id: String,
    pub title: String,
    pub percent: f64,
    pub band: Option<ScoreRange>,
}

impl CategoryResult {
    pub fn description(&self) -> &str {
        band_description(self.band.as_ref())
    }
}

/// Everything a results page or report needs for one submission.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SurveyResults {
    pub survey_id: String,
    pub survey_title: String,
    pub submission_id: String,
    pub categories: Vec<CategoryResult>,
    pub category_percents: BTreeMap<String, f64>,
    pub total_percent: f64,
    pub total_band: Option<ScoreRange>,
}

impl SurveyResults {
    pub fn total_description(&self) -> &str {
        band_description(self.total_band.as_ref())
    }
}

pub fn band_description(band: Option<&ScoreRange>) -> &str {
    match band {
        Some(range) if !range.description.trim().is_empty() => &range.description,
        _ => NO_DESCRIPTION,
    }
}

/// Scores the submission with the survey's own options and classifies each
/// category (and the total) against the ranges of its scope.
pub fn build_results(survey: &SurveyRecord, submission: &Submission) -> SurveyResults {
    let scores = compute_scores(&survey.categories, &submission.answers, &survey.options);

    let categories = scores
        .categories
        .iter()
        .map(|score| {
            let scope = RangeScope::category(score.category_id.clone());
            CategoryResult {
                category_id: score.category_id.clone(),
                title: score.title.clone(),
                percent: score.percent,
                band: pick_range(score.percent, survey.ranges_for(&scope)).cloned(),
            }
        })
        .collect();
    let total_band =
        pick_range(scores.total_percent, survey.ranges_for(&RangeScope::Overall)).cloned();

    SurveyResults {
        survey_id: survey.id.clone(),
        survey_title: survey.title.clone(),
        submission_id: submission.id.clone(),
        categories,
        category_percents: scores.category_percents,
        total_percent: scores.total_percent,
        total_band,
    }
}

pub fn load_results(
    store: &dyn SurveyStore,
    submission_id: &str,
) -> Result<(SurveyResults, Submission), ReportError> {
    let submission = store
        .submission(submission_id)
        .ok_or_else(|| ReportError::NotFound(format!("submission {submission_id}")))?;
    let survey = store
        .survey(&submission.survey_id)
        .ok_or_else(|| ReportError::NotFound(format!("survey {}", submission.survey_id)))?;
    Ok((build_results(&survey, &submission), submission))
}
