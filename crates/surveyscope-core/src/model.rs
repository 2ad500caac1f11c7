use serde::{Deserialize, Serialize};
use serde_json::Value;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum QuestionType {
    SingleChoice,
    MultiChoice,
    Rating,
    Text,
    Other,
}

impl QuestionType {
    pub fn parse(raw: &str) -> Self {
        match raw.trim().to_ascii_lowercase().as_str() {
            "single-choice" | "single_choice" | "single" | "radio" | "select" => {
                Self::SingleChoice
            }
            "multi-choice" | "multi_choice" | "multiple" | "checkbox" | "checkboxes" => {
                Self::MultiChoice
            }
            "rating" | "scale" | "likert" => Self::Rating,
            "text" | "textarea" | "open" => Self::Text,
            _ => Self::Other,
        }
    }

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::SingleChoice => "single-choice",
            Self::MultiChoice => "multi-choice",
            Self::Rating => "rating",
            Self::Text => "text",
            Self::Other => "other",
        }
    }

    /// Only these three kinds ever contribute to a score, whatever the
    /// question's `scorable` flag says.
    pub const fn is_scored(self) -> bool {
        matches!(self, Self::SingleChoice | Self::MultiChoice | Self::Rating)
    }
}

impl From<String> for QuestionType {
    fn from(value: String) -> Self {
        Self::parse(&value)
    }
}

impl From<QuestionType> for String {
    fn from(value: QuestionType) -> Self {
        value.as_str().to_string()
    }
}

/// A survey question as consumed by scoring.
///
/// `choice_labels` and `choice_scores` keep whatever shape the authoring side
/// stored (native array, JSON text, or brace-delimited text); they are only
/// ever read through [`crate::choice`]. Position is the sole binding between a
/// label and its score, and duplicate labels resolve to the first index.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Question {
    pub id: String,
    #[serde(default)]
    pub text: String,
    #[serde(rename = "type", alias = "question_type")]
    pub question_type: QuestionType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scorable: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub weight: Option<f64>,
    #[serde(default, alias = "choiceLabels", alias = "choices")]
    pub choice_labels: Value,
    #[serde(default, alias = "choiceScores")]
    pub choice_scores: Value,
    #[serde(
        default,
        alias = "maxScoreFallback",
        alias = "max_score",
        skip_serializing_if = "Option::is_none"
    )]
    pub max_score_fallback: Option<f64>,
}

impl Question {
    pub fn new(id: impl Into<String>, question_type: QuestionType) -> Self {
        Self {
            id: id.into(),
            text: String::new(),
            question_type,
            scorable: None,
            weight: None,
            choice_labels: Value::Null,
            choice_scores: Value::Null,
            max_score_fallback: None,
        }
    }

    pub fn single_choice(id: impl Into<String>, choices: &[(&str, f64)]) -> Self {
        Self::new(id, QuestionType::SingleChoice).with_choices(choices)
    }

    pub fn multi_choice(id: impl Into<String>, choices: &[(&str, f64)]) -> Self {
        Self::new(id, QuestionType::MultiChoice).with_choices(choices)
    }

    pub fn rating(id: impl Into<String>, max_score: f64) -> Self {
        let mut question = Self::new(id, QuestionType::Rating);
        question.max_score_fallback = Some(max_score);
        question
    }

    pub fn with_choices(mut self, choices: &[(&str, f64)]) -> Self {
        let labels = choices
            .iter()
            .map(|(label, _)| (*label).to_string())
            .collect::<Vec<_>>();
        let scores = choices.iter().map(|(_, score)| *score).collect::<Vec<_>>();
        self.choice_labels = Value::from(labels);
        self.choice_scores = Value::from(scores);
        self
    }

    pub fn with_choice_fields(mut self, labels: Value, scores: Value) -> Self {
        self.choice_labels = labels;
        self.choice_scores = scores;
        self
    }

    pub fn with_text(mut self, text: impl Into<String>) -> Self {
        self.text = text.into();
        self
    }

    pub const fn with_weight(mut self, weight: f64) -> Self {
        self.weight = Some(weight);
        self
    }

    pub const fn not_scorable(mut self) -> Self {
        self.scorable = Some(false);
        self
    }

    /// Absent means scorable; only an explicit `false` opts out.
    pub fn is_scorable(&self) -> bool {
        self.scorable != Some(false)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Category {
    pub id: String,
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub weight: Option<f64>,
    #[serde(default)]
    pub questions: Vec<Question>,
}

impl Category {
    pub fn new(id: impl Into<String>, title: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            weight: None,
            questions: Vec::new(),
        }
    }

    pub const fn with_weight(mut self, weight: f64) -> Self {
        self.weight = Some(weight);
        self
    }

    pub fn with_question(mut self, question: Question) -> Self {
        self.questions.push(question);
        self
    }
}

/// A stored answer value. `null` (a skipped question) decodes to `Missing`;
/// any other shape that is not text, a list of text, or a number is kept
/// as `Other` and scored as if unanswered.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum AnswerValue {
    Text(String),
    List(Vec<String>),
    Number(f64),
    #[default]
    Missing,
    Other(Value),
}

impl AnswerValue {
    /// True for values that count as no answer at all.
    pub const fn is_missing(&self) -> bool {
        matches!(self, Self::Missing | Self::Other(_))
    }

    /// The value as one string; lists use the `", "` join form.
    pub fn as_text(&self) -> String {
        match self {
            Self::Text(text) => text.clone(),
            Self::List(items) => items.join(", "),
            Self::Number(n) => n.to_string(),
            Self::Missing | Self::Other(_) => String::new(),
        }
    }

    /// Selected labels of a multi-choice answer. Blank entries are dropped.
    pub fn selections(&self) -> Vec<String> {
        let raw = match self {
            Self::Text(text) => text.split(", ").map(str::to_string).collect(),
            Self::List(items) => items.clone(),
            Self::Number(n) => vec![n.to_string()],
            Self::Missing | Self::Other(_) => Vec::new(),
        };
        raw.into_iter()
            .filter(|item| !item.trim().is_empty())
            .collect()
    }

    pub fn as_number(&self) -> Option<f64> {
        let parsed = match self {
            Self::Number(n) => Some(*n),
            Self::Text(text) => text.trim().parse::<f64>().ok(),
            Self::List(items) => match items.as_slice() {
                [single] => single.trim().parse::<f64>().ok(),
                _ => None,
            },
            Self::Missing | Self::Other(_) => None,
        };
        parsed.filter(|n| n.is_finite())
    }
}

impl From<&str> for AnswerValue {
    fn from(value: &str) -> Self {
        Self::Text(value.to_string())
    }
}

impl From<String> for AnswerValue {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}

impl From<Vec<String>> for AnswerValue {
    fn from(value: Vec<String>) -> Self {
        Self::List(value)
    }
}

impl From<f64> for AnswerValue {
    fn from(value: f64) -> Self {
        Self::Number(value)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Answer {
    #[serde(alias = "questionId")]
    pub question_id: String,
    #[serde(default)]
    pub value: AnswerValue,
}

impl Answer {
    pub fn new(question_id: impl Into<String>, value: impl Into<AnswerValue>) -> Self {
        Self {
            question_id: question_id.into(),
            value: value.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RangeScope {
    Overall,
    Category(String),
}

impl RangeScope {
    pub fn category(id: impl Into<String>) -> Self {
        Self::Category(id.into())
    }
}

/// An admin-defined percentage band, inclusive on both ends.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScoreRange {
    pub scope: RangeScope,
    #[serde(alias = "minScore")]
    pub min_score: i32,
    #[serde(alias = "maxScore")]
    pub max_score: i32,
    #[serde(default)]
    pub color: String,
    #[serde(default)]
    pub description: String,
}

impl ScoreRange {
    pub fn new(scope: RangeScope, min_score: i32, max_score: i32) -> Self {
        Self {
            scope,
            min_score,
            max_score,
            color: String::new(),
            description: String::new(),
        }
    }

    pub fn with_color(mut self, color: impl Into<String>) -> Self {
        self.color = color.into();
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn contains(&self, rounded: f64) -> bool {
        f64::from(self.min_score) <= rounded && rounded <= f64::from(self.max_score)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn question_type_accepts_authoring_spellings() {
        assert_eq!(QuestionType::parse("checkbox"), QuestionType::MultiChoice);
        assert_eq!(QuestionType::parse(" Select "), QuestionType::SingleChoice);
        assert_eq!(QuestionType::parse("scale"), QuestionType::Rating);
        assert_eq!(QuestionType::parse("matrix"), QuestionType::Other);
        assert!(!QuestionType::Text.is_scored());
    }

    #[test]
    fn question_deserializes_from_stored_row() {
        let raw = r#"{
            "id": "q1",
            "type": "radio",
            "scorable": null,
            "choiceLabels": "{\"Low\",\"High\"}",
            "choiceScores": [0, 2]
        }"#;
        let q: Question = serde_json::from_str(raw).expect("parse question");
        assert_eq!(q.question_type, QuestionType::SingleChoice);
        assert!(q.is_scorable());
        assert!(q.choice_labels.is_string());
        assert_eq!(q.weight, None);
    }

    #[test]
    fn answer_value_shapes() {
        let list: AnswerValue = serde_json::from_str(r#"["A","C"]"#).expect("list");
        assert_eq!(list.selections(), vec!["A".to_string(), "C".to_string()]);
        assert_eq!(list.as_text(), "A, C");

        let text = AnswerValue::from("A, , C");
        assert_eq!(text.selections(), vec!["A".to_string(), "C".to_string()]);

        let rating: AnswerValue = serde_json::from_str("4").expect("number");
        assert_eq!(rating.as_number(), Some(4.0));
        assert_eq!(AnswerValue::from(" 3.5 ").as_number(), Some(3.5));
        assert_eq!(AnswerValue::from("lots").as_number(), None);
    }

    #[test]
    fn unusual_answer_values_still_decode() {
        let skipped: Answer =
            serde_json::from_str(r#"{"questionId":"q2","value":null}"#).expect("null value");
        assert_eq!(skipped.value, AnswerValue::Missing);
        assert!(skipped.value.is_missing());

        let absent: Answer = serde_json::from_str(r#"{"question_id":"q3"}"#).expect("no value");
        assert_eq!(absent.value, AnswerValue::Missing);

        for raw in [r#"["A", 2]"#, "true", r#"{"x":1}"#] {
            let value: AnswerValue = serde_json::from_str(raw).expect("catch-all");
            assert!(matches!(value, AnswerValue::Other(_)), "{raw}");
            assert!(value.is_missing());
            assert!(value.as_text().is_empty());
            assert!(value.selections().is_empty());
            assert_eq!(value.as_number(), None);
        }

        let text: AnswerValue = serde_json::from_str(r#""Yes""#).expect("text");
        assert!(!text.is_missing());
    }

    #[test]
    fn range_scope_serializes_compactly() {
        let overall = serde_json::to_value(RangeScope::Overall).expect("overall");
        assert_eq!(overall, serde_json::json!("overall"));
        let category = serde_json::to_value(RangeScope::category("c1")).expect("category");
        assert_eq!(category, serde_json::json!({"category": "c1"}));
    }
}
