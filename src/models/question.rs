// src/models/question.rs

use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::error::QuizError;

/// One of the four answer slots of a question.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum OptionLabel {
    A,
    B,
    C,
    D,
}

impl OptionLabel {
    pub const ALL: [OptionLabel; 4] = [OptionLabel::A, OptionLabel::B, OptionLabel::C, OptionLabel::D];

    pub fn as_str(self) -> &'static str {
        match self {
            OptionLabel::A => "A",
            OptionLabel::B => "B",
            OptionLabel::C => "C",
            OptionLabel::D => "D",
        }
    }

    fn index(self) -> usize {
        self as usize
    }
}

impl fmt::Display for OptionLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Accepts `A`-`D` in either case, ignoring surrounding whitespace.
impl FromStr for OptionLabel {
    type Err = QuizError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "A" | "a" => Ok(OptionLabel::A),
            "B" | "b" => Ok(OptionLabel::B),
            "C" | "c" => Ok(OptionLabel::C),
            "D" | "d" => Ok(OptionLabel::D),
            _ => Err(QuizError::InvalidOption(s.to_string())),
        }
    }
}

/// A multiple-choice question as loaded from the 'questions' table.
///
/// Immutable once handed to an attempt.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuestionSpec {
    pub id: i64,
    pub quiz_id: i64,
    pub text: String,
    /// Option texts in label order A, B, C, D.
    pub options: [String; 4],
    pub correct_option: OptionLabel,
    /// Points awarded for a correct answer, always positive.
    pub points: i32,
}

impl QuestionSpec {
    pub fn option_text(&self, label: OptionLabel) -> &str {
        &self.options[label.index()]
    }

    pub fn is_correct(&self, chosen: OptionLabel) -> bool {
        self.correct_option == chosen
    }
}

/// Insert payload for a question, already validated and sanitized.
#[derive(Debug, Clone)]
pub struct NewQuestion {
    pub quiz_id: i64,
    pub text: String,
    pub options: [String; 4],
    pub correct_option: OptionLabel,
    pub points: i32,
}

#[derive(Debug, Serialize)]
pub struct LabeledOption {
    pub label: OptionLabel,
    pub text: String,
}

/// DTO for sending question to client (excludes the correct option).
#[derive(Debug, Serialize)]
pub struct PublicQuestion {
    pub id: i64,
    pub text: String,
    pub options: Vec<LabeledOption>,
    pub points: i32,
}

impl From<&QuestionSpec> for PublicQuestion {
    fn from(q: &QuestionSpec) -> Self {
        PublicQuestion {
            id: q.id,
            text: q.text.clone(),
            options: OptionLabel::ALL
                .iter()
                .map(|&label| LabeledOption {
                    label,
                    text: q.option_text(label).to_string(),
                })
                .collect(),
            points: q.points,
        }
    }
}

/// DTO for creating a new question.
#[derive(Debug, Deserialize, Validate)]
pub struct CreateQuestionRequest {
    #[validate(length(min = 1, max = 1000))]
    pub text: String,
    #[validate(custom(function = validate_options))]
    pub options: Vec<String>,
    #[validate(length(min = 1, max = 1))]
    pub correct_option: String,
    #[validate(range(min = 1, max = 100))]
    pub points: Option<i32>,
}

fn validate_options(options: &[String]) -> Result<(), validator::ValidationError> {
    if options.len() != 4 {
        return Err(validator::ValidationError::new("exactly_four_options_required"));
    }
    for opt in options {
        if opt.trim().is_empty() {
            return Err(validator::ValidationError::new("option_cannot_be_empty"));
        }
        if opt.len() > 255 {
            return Err(validator::ValidationError::new("option_too_long"));
        }
    }
    Ok(())
}
