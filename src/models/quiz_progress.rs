// src/models/quiz_progress.rs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use crate::{
    error::AppError,
    models::{
        question::{PublicQuestion, Question},
        quiz_session::QuizSummary,
    },
};

/// Which quiz flow a run belongs to. A user holds at most one run per mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum QuizMode {
    Static,
    Adaptive,
}

impl QuizMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            QuizMode::Static => "static",
            QuizMode::Adaptive => "adaptive",
        }
    }
}

/// One answered question within a run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnswerEntry {
    pub question_id: String,
    pub topic: String,
    pub selected_option: u8,
    pub correct_answer: u8,
    pub is_correct: bool,
    pub time_taken: u32,
}

/// In-progress state of one quiz run, persisted as JSON in 'quiz_progress'.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QuizProgress {
    pub run_id: Uuid,
    pub mode: QuizMode,

    /// Question order for this run (shuffled for static runs).
    pub questions: Vec<Question>,

    /// Zero-based index of the next question to answer.
    pub current_index: usize,

    pub correct_count: u32,
    pub answers: Vec<AnswerEntry>,
    pub started_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum ProgressError {
    StaleRun,
    Completed,
    QuestionMismatch { expected: String },
    OptionOutOfRange(u8),
}

impl From<ProgressError> for AppError {
    fn from(err: ProgressError) -> Self {
        match err {
            ProgressError::StaleRun => {
                AppError::Conflict("Quiz run is no longer active".to_string())
            }
            ProgressError::Completed => {
                AppError::Conflict("Quiz is already complete".to_string())
            }
            ProgressError::QuestionMismatch { expected } => AppError::Conflict(format!(
                "Answer does not match the current question '{}'",
                expected
            )),
            ProgressError::OptionOutOfRange(option) => {
                AppError::BadRequest(format!("Option {} is out of range", option))
            }
        }
    }
}

impl QuizProgress {
    pub fn new(mode: QuizMode, questions: Vec<Question>) -> Self {
        Self {
            run_id: Uuid::new_v4(),
            mode,
            questions,
            current_index: 0,
            correct_count: 0,
            answers: Vec::new(),
            started_at: Utc::now(),
        }
    }

    pub fn current_question(&self) -> Option<&Question> {
        self.questions.get(self.current_index)
    }

    pub fn is_complete(&self) -> bool {
        self.current_index >= self.questions.len()
    }

    /// Grades the current question and advances the run.
    pub fn record_answer(
        &mut self,
        run_id: Uuid,
        question_id: &str,
        selected_option: u8,
        time_taken: u32,
    ) -> Result<AnswerEntry, ProgressError> {
        if run_id != self.run_id {
            return Err(ProgressError::StaleRun);
        }
        let question = self.current_question().ok_or(ProgressError::Completed)?;
        if question.id != question_id {
            return Err(ProgressError::QuestionMismatch {
                expected: question.id.clone(),
            });
        }
        if usize::from(selected_option) >= question.options.len() {
            return Err(ProgressError::OptionOutOfRange(selected_option));
        }

        let entry = AnswerEntry {
            question_id: question.id.clone(),
            topic: question.topic.clone(),
            selected_option,
            correct_answer: question.correct_answer,
            is_correct: selected_option == question.correct_answer,
            time_taken,
        };

        if entry.is_correct {
            self.correct_count += 1;
        }
        self.answers.push(entry.clone());
        self.current_index += 1;

        Ok(entry)
    }

    /// Accuracy and average time are taken over all questions in the run,
    /// answered or not.
    pub fn summary(&self) -> QuizSummary {
        let total_questions = self.questions.len();
        let total_time: u64 = self.answers.iter().map(|a| u64::from(a.time_taken)).sum();
        let (accuracy, avg_time) = if total_questions > 0 {
            (
                f64::from(self.correct_count) / total_questions as f64 * 100.0,
                total_time as f64 / total_questions as f64,
            )
        } else {
            (0.0, 0.0)
        };

        QuizSummary {
            correct_answers: self.correct_count,
            total_questions,
            answered: self.answers.len(),
            accuracy,
            total_time,
            avg_time,
        }
    }

    pub fn view(&self) -> QuizStateResponse {
        QuizStateResponse {
            run_id: self.run_id,
            mode: self.mode,
            completed: self.is_complete(),
            current_question_num: (self.current_index + 1).min(self.questions.len()),
            total_questions: self.questions.len(),
            correct_count: self.correct_count,
            question: self.current_question().map(PublicQuestion::from),
        }
    }
}

/// DTO describing where a run stands.
#[derive(Debug, Serialize)]
pub struct QuizStateResponse {
    pub run_id: Uuid,
    pub mode: QuizMode,
    pub completed: bool,

    /// One-based position of `question`.
    pub current_question_num: usize,

    pub total_questions: usize,
    pub correct_count: u32,
    pub question: Option<PublicQuestion>,
}

/// DTO for submitting one answer.
#[derive(Debug, Deserialize, Validate)]
pub struct SubmitAnswerRequest {
    pub run_id: Uuid,

    #[validate(length(min = 1, max = 200))]
    pub question_id: String,

    #[validate(range(max = 3))]
    pub selected_option: u8,

    /// Seconds spent on the question.
    #[validate(range(max = 86400))]
    #[serde(default)]
    pub time_taken: u32,
}

/// DTO returned after grading an answer.
#[derive(Debug, Serialize)]
pub struct AnswerResponse {
    pub is_correct: bool,
    pub correct_answer: u8,
    pub explanation: String,
    pub completed: bool,
    pub next: QuizStateResponse,
}
