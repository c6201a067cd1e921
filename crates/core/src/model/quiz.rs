use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::ValidationError;
use crate::model::ids::{QuestionId, QuizId, SectionId};

//
// ─── OPTION KEY ────────────────────────────────────────────────────────────────
//

/// One of the four fixed answer slots of a multiple-choice question.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum OptionKey {
    #[serde(rename = "opt1")]
    Opt1,
    #[serde(rename = "opt2")]
    Opt2,
    #[serde(rename = "opt3")]
    Opt3,
    #[serde(rename = "opt4")]
    Opt4,
}

impl OptionKey {
    pub const ALL: [OptionKey; 4] = [Self::Opt1, Self::Opt2, Self::Opt3, Self::Opt4];

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Opt1 => "opt1",
            Self::Opt2 => "opt2",
            Self::Opt3 => "opt3",
            Self::Opt4 => "opt4",
        }
    }

    /// Zero-based slot index.
    #[must_use]
    pub fn index(self) -> usize {
        match self {
            Self::Opt1 => 0,
            Self::Opt2 => 1,
            Self::Opt3 => 2,
            Self::Opt4 => 3,
        }
    }
}

impl fmt::Display for OptionKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for OptionKey {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "opt1" => Ok(Self::Opt1),
            "opt2" => Ok(Self::Opt2),
            "opt3" => Ok(Self::Opt3),
            "opt4" => Ok(Self::Opt4),
            other => Err(ValidationError::UnknownOption(other.to_string())),
        }
    }
}

//
// ─── ANSWER KEY ────────────────────────────────────────────────────────────────
//

/// Composite key addressing one question: `section_question`, both positional.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(into = "String", try_from = "String")]
pub struct AnswerKey {
    pub section: SectionId,
    pub question: QuestionId,
}

impl AnswerKey {
    #[must_use]
    pub fn new(section: SectionId, question: QuestionId) -> Self {
        Self { section, question }
    }

    #[must_use]
    pub fn at(section: usize, question: usize) -> Self {
        Self::new(SectionId::new(section), QuestionId::new(question))
    }
}

impl fmt::Display for AnswerKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}_{}", self.section, self.question)
    }
}

impl FromStr for AnswerKey {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (section, question) = s
            .split_once('_')
            .ok_or_else(|| format!("answer key `{s}` has no separator"))?;
        let section = section
            .parse::<usize>()
            .map_err(|_| format!("answer key `{s}` has a bad section"))?;
        let question = question
            .parse::<usize>()
            .map_err(|_| format!("answer key `{s}` has a bad question"))?;
        Ok(Self::at(section, question))
    }
}

impl From<AnswerKey> for String {
    fn from(key: AnswerKey) -> Self {
        key.to_string()
    }
}

impl TryFrom<String> for AnswerKey {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

//
// ─── QUESTIONS ─────────────────────────────────────────────────────────────────
//

/// Unpositioned question content as produced by the backend.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuestionDraft {
    pub prompt: String,
    pub options: [String; 4],
    pub correct: OptionKey,
    pub explanation: String,
}

/// A multiple-choice question pinned to its position in a quiz. Immutable once loaded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuizQuestion {
    key: AnswerKey,
    prompt: String,
    options: [String; 4],
    correct: OptionKey,
    explanation: String,
}

impl QuizQuestion {
    fn from_draft(key: AnswerKey, draft: QuestionDraft) -> Result<Self, ValidationError> {
        let prompt = draft.prompt.trim();
        if prompt.is_empty() {
            return Err(ValidationError::EmptyPrompt(key));
        }
        Ok(Self {
            key,
            prompt: prompt.to_string(),
            options: draft.options,
            correct: draft.correct,
            explanation: draft.explanation,
        })
    }

    #[must_use]
    pub fn key(&self) -> AnswerKey {
        self.key
    }

    #[must_use]
    pub fn section_id(&self) -> SectionId {
        self.key.section
    }

    #[must_use]
    pub fn question_id(&self) -> QuestionId {
        self.key.question
    }

    #[must_use]
    pub fn prompt(&self) -> &str {
        &self.prompt
    }

    #[must_use]
    pub fn option(&self, key: OptionKey) -> &str {
        &self.options[key.index()]
    }

    /// Options in slot order, paired with their key.
    pub fn options(&self) -> impl Iterator<Item = (OptionKey, &str)> {
        OptionKey::ALL
            .into_iter()
            .map(|key| (key, self.options[key.index()].as_str()))
    }

    #[must_use]
    pub fn correct_option(&self) -> OptionKey {
        self.correct
    }

    #[must_use]
    pub fn explanation(&self) -> &str {
        &self.explanation
    }

    #[must_use]
    pub fn is_correct(&self, option: OptionKey) -> bool {
        self.correct == option
    }
}

/// An ordered group of questions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuizSection {
    id: SectionId,
    questions: Vec<QuizQuestion>,
}

impl QuizSection {
    #[must_use]
    pub fn id(&self) -> SectionId {
        self.id
    }

    #[must_use]
    pub fn questions(&self) -> &[QuizQuestion] {
        &self.questions
    }
}

//
// ─── QUIZ ──────────────────────────────────────────────────────────────────────
//

/// A loaded quiz: an ordered list of sections, each an ordered list of questions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Quiz {
    id: Option<QuizId>,
    title: Option<String>,
    sections: Vec<QuizSection>,
}

impl Quiz {
    /// Build a quiz, assigning each question its positional key.
    ///
    /// # Errors
    ///
    /// Returns `ValidationError::EmptyPrompt` if any question has a blank prompt.
    pub fn from_drafts(
        id: Option<QuizId>,
        title: Option<String>,
        sections: Vec<Vec<QuestionDraft>>,
    ) -> Result<Self, ValidationError> {
        let sections = sections
            .into_iter()
            .enumerate()
            .map(|(s, drafts)| {
                let questions = drafts
                    .into_iter()
                    .enumerate()
                    .map(|(q, draft)| QuizQuestion::from_draft(AnswerKey::at(s, q), draft))
                    .collect::<Result<Vec<_>, _>>()?;
                Ok(QuizSection {
                    id: SectionId::new(s),
                    questions,
                })
            })
            .collect::<Result<Vec<_>, ValidationError>>()?;

        Ok(Self {
            id,
            title,
            sections,
        })
    }

    #[must_use]
    pub fn id(&self) -> Option<QuizId> {
        self.id
    }

    #[must_use]
    pub fn title(&self) -> Option<&str> {
        self.title.as_deref()
    }

    #[must_use]
    pub fn sections(&self) -> &[QuizSection] {
        &self.sections
    }

    /// Sum of questions across all sections.
    #[must_use]
    pub fn total_questions(&self) -> usize {
        self.sections.iter().map(|s| s.questions.len()).sum()
    }

    #[must_use]
    pub fn question(&self, key: AnswerKey) -> Option<&QuizQuestion> {
        self.sections
            .get(key.section.index())?
            .questions
            .get(key.question.index())
    }

    /// All questions in section order.
    pub fn questions(&self) -> impl Iterator<Item = &QuizQuestion> {
        self.sections.iter().flat_map(|s| s.questions.iter())
    }
}

//
// ─── ANSWER RECORD ─────────────────────────────────────────────────────────────
//

/// Selected option per question. Write-once per key.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AnswerRecord(BTreeMap<AnswerKey, OptionKey>);

impl AnswerRecord {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Records `option` for `key` unless an answer already exists.
    ///
    /// Returns `true` if the answer was recorded.
    pub fn record(&mut self, key: AnswerKey, option: OptionKey) -> bool {
        if self.0.contains_key(&key) {
            return false;
        }
        self.0.insert(key, option);
        true
    }

    #[must_use]
    pub fn get(&self, key: AnswerKey) -> Option<OptionKey> {
        self.0.get(&key).copied()
    }

    #[must_use]
    pub fn contains(&self, key: AnswerKey) -> bool {
        self.0.contains_key(&key)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (AnswerKey, OptionKey)> + '_ {
        self.0.iter().map(|(k, v)| (*k, *v))
    }
}
