use std::collections::{BTreeMap, HashMap};

use serde::{Deserialize, Serialize};

use crate::choice::{parse_choice_labels, parse_choice_scores};
use crate::model::{Answer, AnswerValue, Category, Question, QuestionType};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScoringOptions {
    pub treat_missing_as_zero: bool,
    pub use_question_weights: bool,
    pub use_category_weights: bool,
}

impl Default for ScoringOptions {
    fn default() -> Self {
        Self {
            treat_missing_as_zero: true,
            use_question_weights: false,
            use_category_weights: false,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScoreBounds {
    pub min: f64,
    pub max: f64,
}

impl ScoreBounds {
    /// Bounds come from the choice scores when there are any; otherwise from
    /// the legacy rating cap, never below 1.
    pub fn from_scores(scores: &[f64], max_score_fallback: Option<f64>) -> Self {
        if scores.is_empty() {
            let cap = max_score_fallback
                .filter(|v| v.is_finite())
                .unwrap_or(1.0)
                .max(1.0);
            return Self { min: 0.0, max: cap };
        }
        let min = scores.iter().copied().fold(f64::INFINITY, f64::min);
        let max = scores.iter().copied().fold(f64::NEG_INFINITY, f64::max);
        Self { min, max }
    }

    pub fn normalize(self, raw: f64) -> f64 {
        let raw = if raw.is_finite() { raw } else { 0.0 };
        if self.max == self.min {
            return if raw > self.min { 1.0 } else { 0.0 };
        }
        ((raw - self.min) / (self.max - self.min)).clamp(0.0, 1.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct QuestionScore {
    pub raw: f64,
    pub normalized: f64,
    pub weight: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CategoryScore {
    pub category_id: String,
    pub title: String,
    pub percent: f64,
    pub scored_questions: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoreResult {
    /// One entry per input category, in input order, keyed by id.
    pub categories: Vec<CategoryScore>,
    /// Title-keyed view; categories sharing a title collapse to the last one.
    pub category_percents: BTreeMap<String, f64>,
    pub total_percent: f64,
}

impl ScoreResult {
    pub fn category(&self, category_id: &str) -> Option<&CategoryScore> {
        self.categories
            .iter()
            .find(|c| c.category_id == category_id)
    }
}

/// Index of `value` among `labels`: exact match first, then a
/// whitespace-trimmed comparison. Duplicate labels resolve to the first index.
pub fn find_choice_index(labels: &[String], value: &str) -> Option<usize> {
    labels.iter().position(|label| label == value).or_else(|| {
        let wanted = value.trim();
        labels.iter().position(|label| label.trim() == wanted)
    })
}

fn score_at(scores: &[f64], labels: &[String], value: &str) -> f64 {
    find_choice_index(labels, value)
        .and_then(|index| scores.get(index).copied())
        .unwrap_or(0.0)
}

pub fn raw_score(
    question_type: QuestionType,
    labels: &[String],
    scores: &[f64],
    answer: Option<&AnswerValue>,
) -> f64 {
    let Some(answer) = answer else {
        return 0.0;
    };
    match question_type {
        QuestionType::SingleChoice => score_at(scores, labels, &answer.as_text()),
        QuestionType::MultiChoice => answer
            .selections()
            .iter()
            .map(|selection| score_at(scores, labels, selection))
            .sum(),
        QuestionType::Rating => answer.as_number().unwrap_or(0.0),
        QuestionType::Text | QuestionType::Other => 0.0,
    }
}

fn effective_weight(weight: Option<f64>, enabled: bool) -> f64 {
    if !enabled {
        return 1.0;
    }
    weight.filter(|w| w.is_finite() && *w > 0.0).unwrap_or(1.0)
}

/// Scores one question, or `None` when it is excluded from aggregation
/// (non-scorable, unscored type, or unanswered with missing answers skipped).
/// A `null` or unreadable stored value counts as unanswered.
pub fn score_question(
    question: &Question,
    answer: Option<&AnswerValue>,
    options: &ScoringOptions,
) -> Option<QuestionScore> {
    if !question.is_scorable() || !question.question_type.is_scored() {
        return None;
    }
    let answer = answer.filter(|value| !value.is_missing());
    if answer.is_none() && !options.treat_missing_as_zero {
        return None;
    }

    let labels = parse_choice_labels(&question.choice_labels);
    let scores = parse_choice_scores(&question.choice_scores);
    let raw = raw_score(question.question_type, &labels, &scores, answer);
    let bounds = ScoreBounds::from_scores(&scores, question.max_score_fallback);

    Some(QuestionScore {
        raw,
        normalized: bounds.normalize(raw),
        weight: effective_weight(question.weight, options.use_question_weights),
    })
}

fn category_percent(
    category: &Category,
    answers: &HashMap<&str, &AnswerValue>,
    options: &ScoringOptions,
) -> (f64, usize) {
    let mut weighted = 0.0;
    let mut total_weight = 0.0;
    let mut scored = 0;
    for question in &category.questions {
        let answer = answers.get(question.id.as_str()).copied();
        if let Some(score) = score_question(question, answer, options) {
            weighted += score.normalized * score.weight;
            total_weight += score.weight;
            scored += 1;
        }
    }
    if total_weight > 0.0 {
        (weighted / total_weight * 100.0, scored)
    } else {
        (0.0, scored)
    }
}

/// Computes per-category and overall percentages for one respondent.
///
/// Pure and infallible: malformed choice data, unknown labels and
/// non-numeric ratings all degrade to a raw score of 0 for that question.
/// Every category takes part in the total, including one with no eligible
/// questions (which scores 0). Outputs are rounded to two decimals.
pub fn compute_scores(
    categories: &[Category],
    answers: &[Answer],
    options: &ScoringOptions,
) -> ScoreResult {
    let mut by_question: HashMap<&str, &AnswerValue> = HashMap::new();
    for answer in answers {
        by_question
            .entry(answer.question_id.as_str())
            .or_insert(&answer.value);
    }

    let mut out = Vec::with_capacity(categories.len());
    let mut weighted_total = 0.0;
    let mut weight_sum = 0.0;
    for category in categories {
        let (percent, scored_questions) = category_percent(category, &by_question, options);
        let weight = effective_weight(category.weight, options.use_category_weights);
        weighted_total += percent * weight;
        weight_sum += weight;
        out.push(CategoryScore {
            category_id: category.id.clone(),
            title: category.title.clone(),
            percent: round2(percent),
            scored_questions,
        });
    }

    let total_percent = if weight_sum > 0.0 {
        round2(weighted_total / weight_sum)
    } else {
        0.0
    };
    let category_percents = out
        .iter()
        .map(|c| (c.title.clone(), c.percent))
        .collect::<BTreeMap<_, _>>();

    tracing::debug!(
        categories = out.len(),
        answers = answers.len(),
        total_percent,
        "computed survey scores"
    );

    ScoreResult {
        categories: out,
        category_percents,
        total_percent,
    }
}

pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}
