// src/bank.rs

//! Built-in question bank used by the static quiz and as the AI fallback.

use std::sync::LazyLock;

use crate::models::question::{Difficulty, Question, QuestionSource};

static QUESTIONS: LazyLock<Vec<Question>> = LazyLock::new(|| {
    vec![
        entry(
            1,
            "Logical Reasoning",
            "If all roses are flowers and some flowers fade quickly, which statement is definitely true?",
            ["All roses fade quickly", "Some roses are flowers", "All flowers are roses", "No roses fade quickly"],
            1,
            "Since all roses are flowers, it's definitely true that some roses are flowers. Nothing can be concluded about fading.",
        ),
        entry(
            2,
            "Quantitative Aptitude",
            "A number is increased by 20% and then decreased by 20%. What is the net change?",
            ["No change (0%)", "4% decrease", "4% increase", "2% decrease"],
            1,
            "Take 100. After a 20% increase: 120. After a 20% decrease: 96. Net change is a 4% decrease.",
        ),
        entry(
            3,
            "Data Interpretation",
            "In a class of 50 students, 30 like Math and 25 like Science. If 10 students like both subjects, how many students like neither?",
            ["5 students", "10 students", "15 students", "20 students"],
            0,
            "At least one subject: 30 + 25 - 10 = 45. Neither: 50 - 45 = 5.",
        ),
        entry(
            4,
            "Logical Reasoning",
            "If in a certain code, COMPUTER is written as DPNQVUFS, how is SCIENCE written?",
            ["TDJFODF", "SCJDMBD", "TDJFMDF", "RBHFMBD"],
            0,
            "Each letter is shifted by +1 in the alphabet, so SCIENCE becomes TDJFODF.",
        ),
        entry(
            5,
            "Quantitative Aptitude",
            "What is the average of first 10 natural numbers?",
            ["5", "5.5", "6", "10"],
            1,
            "Sum of the first 10 natural numbers is 55. Average = 55 / 10 = 5.5.",
        ),
        entry(
            6,
            "Pattern Recognition",
            "Find the next number in the series: 2, 6, 12, 20, 30, ?",
            ["40", "42", "44", "38"],
            1,
            "Each term is n × (n + 1): 1×2, 2×3, 3×4, 4×5, 5×6, so the next is 6×7 = 42.",
        ),
        entry(
            7,
            "Data Interpretation",
            "If 60% of a number is 120, what is 25% of that number?",
            ["30", "40", "50", "60"],
            2,
            "The number is 120 / 0.6 = 200, and 25% of 200 is 50.",
        ),
        entry(
            8,
            "Logical Reasoning",
            "A is taller than B. C is shorter than B. Who is the shortest?",
            ["A", "B", "C", "Cannot be determined"],
            2,
            "A > B > C, so C is the shortest.",
        ),
        entry(
            9,
            "Quantitative Aptitude",
            "If the ratio of boys to girls in a class is 3:2 and there are 15 boys, how many girls are there?",
            ["8", "10", "12", "15"],
            1,
            "3 parts = 15 boys, so 1 part = 5 and 2 parts = 10 girls.",
        ),
        entry(
            10,
            "Pattern Recognition",
            "Complete the series: A, C, F, J, O, ?",
            ["T", "U", "S", "V"],
            1,
            "The gaps grow by one: +2, +3, +4, +5, +6, so O + 6 = U.",
        ),
    ]
});

fn entry(
    id: u32,
    topic: &str,
    question: &str,
    options: [&str; 4],
    correct_answer: u8,
    explanation: &str,
) -> Question {
    Question {
        id: id.to_string(),
        topic: topic.to_string(),
        difficulty: Difficulty::Easy,
        question: question.to_string(),
        options: options.iter().map(|o| o.to_string()).collect(),
        correct_answer,
        explanation: explanation.to_string(),
        source: QuestionSource::StaticBank,
    }
}

pub fn all_questions() -> &'static [Question] {
    &QUESTIONS
}

pub fn question_by_id(id: &str) -> Option<&'static Question> {
    QUESTIONS.iter().find(|q| q.id == id)
}

/// Questions whose topic matches case-insensitively.
pub fn questions_for_topic(topic: &str) -> Vec<&'static Question> {
    QUESTIONS
        .iter()
        .filter(|q| q.topic.eq_ignore_ascii_case(topic))
        .collect()
}
