use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};

use serde::{Deserialize, Serialize};
use surveyscope_core::{
    Answer, Category, RangeIssue, RangeScope, ScoreRange, ScoringOptions, audit_ranges,
    ranges_for_scope,
};
use thiserror::Error;

pub const DEFAULT_DB_PATH: &str = "./data/surveys.json";

/// A survey as authored: its scored structure, the descriptive ranges for
/// each scope, and the scoring switches the survey is evaluated with.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SurveyRecord {
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub categories: Vec<Category>,
    #[serde(default)]
    pub ranges: Vec<ScoreRange>,
    #[serde(default)]
    pub options: ScoringOptions,
    #[serde(default)]
    pub updated_ms: u64,
}

impl SurveyRecord {
    pub fn new(id: impl Into<String>, title: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            description: String::new(),
            categories: Vec::new(),
            ranges: Vec::new(),
            options: ScoringOptions::default(),
            updated_ms: 0,
        }
    }

    pub fn with_category(mut self, category: Category) -> Self {
        self.categories.push(category);
        self
    }

    pub fn with_range(mut self, range: ScoreRange) -> Self {
        self.ranges.push(range);
        self
    }

    pub const fn with_options(mut self, options: ScoringOptions) -> Self {
        self.options = options;
        self
    }

    pub fn ranges_for(&self, scope: &RangeScope) -> Vec<&ScoreRange> {
        ranges_for_scope(&self.ranges, scope)
    }

    pub fn has_question(&self, question_id: &str) -> bool {
        self.categories
            .iter()
            .flat_map(|c| c.questions.iter())
            .any(|q| q.id == question_id)
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct Respondent {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Submission {
    pub id: String,
    pub survey_id: String,
    #[serde(default)]
    pub respondent: Respondent,
    pub answers: Vec<Answer>,
    pub submitted_ms: u64,
}

#[derive(Debug, Clone)]
pub struct NewSubmission {
    pub survey_id: String,
    pub respondent: Respondent,
    pub answers: Vec<Answer>,
}

pub trait SurveyStore: Send {
    fn upsert_survey(&mut self, survey: SurveyRecord) -> Result<SurveyRecord, StorageError>;
    fn survey(&self, id: &str) -> Option<SurveyRecord>;
    fn list_surveys(&self) -> Vec<SurveyRecord>;
    fn delete_survey(&mut self, id: &str) -> Result<bool, StorageError>;
    fn record_submission(&mut self, new_submission: NewSubmission)
    -> Result<Submission, StorageError>;
    fn submission(&self, id: &str) -> Option<Submission>;
    fn list_submissions(&self, survey_id: &str, limit: usize) -> Vec<Submission>;
    /// Ranges of one survey's scope, sorted for first-match classification.
    /// Empty when the survey does not exist.
    fn ranges_for(&self, survey_id: &str, scope: &RangeScope) -> Vec<ScoreRange>;
    fn stats(&self) -> serde_json::Value;
}

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("serde error: {0}")]
    Serde(#[from] serde_json::Error),
    #[error("invalid input: {0}")]
    InvalidInput(String),
    #[error("not found: {0}")]
    NotFound(String),
}

#[derive(Debug, Default, Serialize, Deserialize)]
struct Persisted {
    #[serde(default)]
    surveys: Vec<SurveyRecord>,
    #[serde(default)]
    submissions: Vec<Submission>,
}

#[derive(Serialize)]
struct Snapshot<'a> {
    surveys: &'a [SurveyRecord],
    submissions: &'a [Submission],
}

/// Survey and submission snapshot kept in a single JSON file, rewritten on
/// every change.
pub struct JsonSurveyStore {
    path: PathBuf,
    surveys: Vec<SurveyRecord>,
    submissions: Vec<Submission>,
    next_id: u64,
}

impl JsonSurveyStore {
    /// Opens the store at `SURVEYSCOPE_DB`, or [`DEFAULT_DB_PATH`].
    pub fn open_from_env() -> Result<Self, StorageError> {
        let path = std::env::var("SURVEYSCOPE_DB")
            .ok()
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
            .unwrap_or_else(|| DEFAULT_DB_PATH.to_string());
        Self::open(path)
    }

    pub fn open(path: impl AsRef<Path>) -> Result<Self, StorageError> {
        let path = path.as_ref().to_path_buf();
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }

        if !path.exists() {
            let persisted = Persisted::default();
            let bytes = serde_json::to_vec_pretty(&persisted)?;
            fs::write(&path, bytes)?;
        }

        let bytes = fs::read(&path)?;
        let persisted: Persisted = serde_json::from_slice(&bytes)?;
        let next_id = persisted
            .submissions
            .iter()
            .filter_map(|s| s.id.strip_prefix("sub-")?.parse::<u64>().ok())
            .max()
            .unwrap_or(0)
            + 1;

        tracing::debug!(
            path = %path.display(),
            surveys = persisted.surveys.len(),
            submissions = persisted.submissions.len(),
            "opened survey store"
        );

        Ok(Self {
            path,
            surveys: persisted.surveys,
            submissions: persisted.submissions,
            next_id,
        })
    }

    pub fn upsert_survey(&mut self, mut survey: SurveyRecord) -> Result<SurveyRecord, StorageError> {
        validate_survey(&survey)?;
        survey.updated_ms = now_ms();

        let mut surveys = self.surveys.clone();
        match surveys.iter_mut().find(|s| s.id == survey.id) {
            Some(existing) => *existing = survey.clone(),
            None => surveys.push(survey.clone()),
        }
        self.write_snapshot(&surveys, &self.submissions)?;
        self.surveys = surveys;
        Ok(survey)
    }

    pub fn survey(&self, id: &str) -> Option<SurveyRecord> {
        self.surveys.iter().find(|s| s.id == id).cloned()
    }

    pub fn list_surveys(&self) -> Vec<SurveyRecord> {
        self.surveys.clone()
    }

    /// Removes the survey together with its submissions.
    pub fn delete_survey(&mut self, id: &str) -> Result<bool, StorageError> {
        if !self.surveys.iter().any(|s| s.id == id) {
            return Ok(false);
        }
        let surveys = self
            .surveys
            .iter()
            .filter(|s| s.id != id)
            .cloned()
            .collect::<Vec<_>>();
        let submissions = self
            .submissions
            .iter()
            .filter(|s| s.survey_id != id)
            .cloned()
            .collect::<Vec<_>>();
        self.write_snapshot(&surveys, &submissions)?;
        self.surveys = surveys;
        self.submissions = submissions;
        Ok(true)
    }

    pub fn record_submission(
        &mut self,
        new_submission: NewSubmission,
    ) -> Result<Submission, StorageError> {
        let survey = self
            .surveys
            .iter()
            .find(|s| s.id == new_submission.survey_id)
            .ok_or_else(|| {
                StorageError::NotFound(format!("survey {}", new_submission.survey_id))
            })?;

        let mut seen = HashSet::new();
        for answer in &new_submission.answers {
            if !survey.has_question(&answer.question_id) {
                return Err(StorageError::InvalidInput(format!(
                    "answer references unknown question {}",
                    answer.question_id
                )));
            }
            if !seen.insert(answer.question_id.as_str()) {
                return Err(StorageError::InvalidInput(format!(
                    "question {} answered more than once",
                    answer.question_id
                )));
            }
        }

        let respondent = Respondent {
            name: non_blank(new_submission.respondent.name),
            email: non_blank(new_submission.respondent.email),
        };
        let submission = Submission {
            id: format!("sub-{}", self.next_id),
            survey_id: new_submission.survey_id,
            respondent,
            answers: new_submission.answers,
            submitted_ms: now_ms(),
        };

        let mut submissions = self.submissions.clone();
        submissions.push(submission.clone());
        self.write_snapshot(&self.surveys, &submissions)?;
        self.submissions = submissions;
        self.next_id += 1;

        Ok(submission)
    }

    pub fn submission(&self, id: &str) -> Option<Submission> {
        self.submissions.iter().find(|s| s.id == id).cloned()
    }

    /// Most recent first.
    pub fn list_submissions(&self, survey_id: &str, limit: usize) -> Vec<Submission> {
        let n = limit.max(1);
        self.submissions
            .iter()
            .rev()
            .filter(|s| s.survey_id == survey_id)
            .take(n)
            .cloned()
            .collect()
    }

    pub fn ranges_for(&self, survey_id: &str, scope: &RangeScope) -> Vec<ScoreRange> {
        self.surveys
            .iter()
            .find(|s| s.id == survey_id)
            .map(|survey| survey.ranges_for(scope).into_iter().cloned().collect())
            .unwrap_or_default()
    }

    pub fn stats(&self) -> serde_json::Value {
        serde_json::json!({
            "surveys": self.surveys.len(),
            "submissions": self.submissions.len(),
            "path": self.path,
        })
    }

    /// Writes the given state to disk. Callers swap it into memory only
    /// after this succeeds, so a failed write leaves the store unchanged.
    fn write_snapshot(
        &self,
        surveys: &[SurveyRecord],
        submissions: &[Submission],
    ) -> Result<(), StorageError> {
        let bytes = serde_json::to_vec_pretty(&Snapshot {
            surveys,
            submissions,
        })?;
        fs::write(&self.path, bytes)?;
        Ok(())
    }
}

impl SurveyStore for JsonSurveyStore {
    fn upsert_survey(&mut self, survey: SurveyRecord) -> Result<SurveyRecord, StorageError> {
        Self::upsert_survey(self, survey)
    }

    fn survey(&self, id: &str) -> Option<SurveyRecord> {
        Self::survey(self, id)
    }

    fn list_surveys(&self) -> Vec<SurveyRecord> {
        Self::list_surveys(self)
    }

    fn delete_survey(&mut self, id: &str) -> Result<bool, StorageError> {
        Self::delete_survey(self, id)
    }

    fn record_submission(
        &mut self,
        new_submission: NewSubmission,
    ) -> Result<Submission, StorageError> {
        Self::record_submission(self, new_submission)
    }

    fn submission(&self, id: &str) -> Option<Submission> {
        Self::submission(self, id)
    }

    fn list_submissions(&self, survey_id: &str, limit: usize) -> Vec<Submission> {
        Self::list_submissions(self, survey_id, limit)
    }

    fn ranges_for(&self, survey_id: &str, scope: &RangeScope) -> Vec<ScoreRange> {
        Self::ranges_for(self, survey_id, scope)
    }

    fn stats(&self) -> serde_json::Value {
        Self::stats(self)
    }
}

/// Authoring checks applied before a survey is stored. Range gaps are
/// accepted with a warning; scoring falls back to "no description" there.
pub fn validate_survey(survey: &SurveyRecord) -> Result<(), StorageError> {
    if survey.id.trim().is_empty() {
        return Err(StorageError::InvalidInput(
            "survey id cannot be empty".to_string(),
        ));
    }
    if survey.title.trim().is_empty() {
        return Err(StorageError::InvalidInput(
            "survey title cannot be empty".to_string(),
        ));
    }

    let mut category_ids = HashSet::new();
    let mut question_ids = HashSet::new();
    for category in &survey.categories {
        if !category_ids.insert(category.id.as_str()) {
            return Err(StorageError::InvalidInput(format!(
                "duplicate category id {}",
                category.id
            )));
        }
        for question in &category.questions {
            if !question_ids.insert(question.id.as_str()) {
                return Err(StorageError::InvalidInput(format!(
                    "duplicate question id {}",
                    question.id
                )));
            }
        }
    }

    let mut scopes: Vec<&RangeScope> = Vec::new();
    for range in &survey.ranges {
        if let RangeScope::Category(id) = &range.scope {
            if !category_ids.contains(id.as_str()) {
                return Err(StorageError::InvalidInput(format!(
                    "range references unknown category {id}"
                )));
            }
        }
        if !scopes.contains(&&range.scope) {
            scopes.push(&range.scope);
        }
    }

    for scope in scopes {
        let issues = audit_ranges(survey.ranges.iter().filter(|r| &r.scope == scope));
        if let Some(blocking) = issues.iter().find(|issue| issue.is_blocking()) {
            return Err(StorageError::InvalidInput(format!(
                "{} ranges: {blocking}",
                scope_label(scope)
            )));
        }
        for gap in issues.iter().filter(|issue| matches!(issue, RangeIssue::Gap { .. })) {
            tracing::warn!(survey = %survey.id, scope = %scope_label(scope), %gap, "score range gap");
        }
    }
    Ok(())
}

fn scope_label(scope: &RangeScope) -> String {
    match scope {
        RangeScope::Overall => "overall".to_string(),
        RangeScope::Category(id) => format!("category {id}"),
    }
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn now_ms() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| u64::try_from(d.as_millis()).unwrap_or(u64::MAX))
        .unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use surveyscope_core::Question;

    fn sample_survey() -> SurveyRecord {
        SurveyRecord::new("pulse", "Team pulse")
            .with_category(
                Category::new("c1", "Satisfaction")
                    .with_question(Question::single_choice("q1", &[("No", 0.0), ("Yes", 1.0)])),
            )
            .with_range(ScoreRange::new(RangeScope::Overall, 0, 49))
            .with_range(ScoreRange::new(RangeScope::Overall, 50, 100))
    }

    #[test]
    fn rejects_overlapping_ranges() {
        let survey = sample_survey().with_range(ScoreRange::new(RangeScope::Overall, 40, 60));
        let err = validate_survey(&survey).expect_err("overlap rejected");
        assert!(err.to_string().contains("overall ranges"));
    }

    #[test]
    fn accepts_range_gaps() {
        let survey = SurveyRecord::new("s", "S")
            .with_range(ScoreRange::new(RangeScope::Overall, 0, 30))
            .with_range(ScoreRange::new(RangeScope::Overall, 70, 100));
        assert!(validate_survey(&survey).is_ok());
    }

    #[test]
    fn rejects_ranges_for_unknown_categories() {
        let survey = sample_survey().with_range(ScoreRange::new(RangeScope::category("zz"), 0, 100));
        assert!(matches!(
            validate_survey(&survey),
            Err(StorageError::InvalidInput(_))
        ));
    }

    #[test]
    fn rejects_duplicate_question_ids() {
        let survey = sample_survey().with_category(
            Category::new("c2", "Other")
                .with_question(Question::single_choice("q1", &[("No", 0.0), ("Yes", 1.0)])),
        );
        assert!(validate_survey(&survey).is_err());
    }

    #[test]
    fn ranges_for_scope_are_sorted() {
        let survey = SurveyRecord::new("s", "S")
            .with_range(ScoreRange::new(RangeScope::Overall, 50, 100))
            .with_range(ScoreRange::new(RangeScope::Overall, 0, 49));
        let mins = survey
            .ranges_for(&RangeScope::Overall)
            .iter()
            .map(|r| r.min_score)
            .collect::<Vec<_>>();
        assert_eq!(mins, vec![0, 50]);
    }
}
