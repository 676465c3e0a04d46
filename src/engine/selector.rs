// src/engine/selector.rs

use rand::{Rng, SeedableRng, rngs::StdRng, seq::SliceRandom};

use crate::{error::QuizError, models::question::QuestionSpec};

/// Draws `count` distinct questions from `questions` in random order.
///
/// The result is a random permutation of a random subset; the input order has no
/// influence on the output order.
pub fn select<R: Rng + ?Sized>(
    questions: &[QuestionSpec],
    count: usize,
    rng: &mut R,
) -> Result<Vec<QuestionSpec>, QuizError> {
    if questions.len() < count {
        return Err(QuizError::InsufficientQuestions {
            required: count,
            available: questions.len(),
        });
    }

    let mut picked: Vec<QuestionSpec> = questions.choose_multiple(rng, count).cloned().collect();
    picked.shuffle(rng);
    Ok(picked)
}

/// Like [`select`], with a generator seeded from OS entropy for this call only.
pub fn select_fresh(questions: &[QuestionSpec], count: usize) -> Result<Vec<QuestionSpec>, QuizError> {
    let mut rng = StdRng::from_entropy();
    select(questions, count, &mut rng)
}
