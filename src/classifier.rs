//! Risk Profile Classifier
//!
//! Classifies the three quiz answers into a risk profile:
//! - Aggressive: at least two aggressive answers
//! - Conservative: at least two conservative answers
//! - Moderate: everything else (ties, mixed answers)

use crate::models::{QuizAnswers, RiskAnswer, RiskProfile};

/// Answers needed in one direction before it wins
const MAJORITY: usize = 2;

/// Risk profile classifier
pub struct RiskProfileClassifier;

impl RiskProfileClassifier {
    /// Classify a complete set of answers. Aggressive is checked first.
    pub fn classify(answers: &[RiskAnswer; 3]) -> RiskProfile {
        let aggressive = count(answers, RiskAnswer::Aggressive);
        let conservative = count(answers, RiskAnswer::Conservative);

        if aggressive >= MAJORITY {
            RiskProfile::Aggressive
        } else if conservative >= MAJORITY {
            RiskProfile::Conservative
        } else {
            RiskProfile::Moderate
        }
    }

    /// Classify a possibly incomplete quiz; `None` until all three are answered.
    pub fn classify_quiz(quiz: &QuizAnswers) -> Option<RiskProfile> {
        quiz.complete().map(|answers| Self::classify(&answers))
    }
}

fn count(answers: &[RiskAnswer], wanted: RiskAnswer) -> usize {
    answers.iter().filter(|a| **a == wanted).count()
}

#[cfg(test)]
mod tests {
    use super::*;
    use RiskAnswer::*;

    /// Reference rule written independently of the classifier.
    fn expected(answers: [RiskAnswer; 3]) -> RiskProfile {
        let agg = answers.iter().filter(|a| matches!(a, Aggressive)).count();
        let con = answers.iter().filter(|a| matches!(a, Conservative)).count();
        match (agg, con) {
            (2..=3, _) => RiskProfile::Aggressive,
            (_, 2..=3) => RiskProfile::Conservative,
            _ => RiskProfile::Moderate,
        }
    }

    #[test]
    fn test_all_27_combinations() {
        let mut seen = 0;
        for a in RiskAnswer::ALL {
            for b in RiskAnswer::ALL {
                for c in RiskAnswer::ALL {
                    let answers = [a, b, c];
                    assert_eq!(
                        RiskProfileClassifier::classify(&answers),
                        expected(answers),
                        "answers {:?}",
                        answers
                    );
                    seen += 1;
                }
            }
        }
        assert_eq!(seen, 27);
    }

    #[test]
    fn test_documented_cases() {
        assert_eq!(
            RiskProfileClassifier::classify(&[Aggressive, Aggressive, Moderate]),
            RiskProfile::Aggressive
        );
        assert_eq!(
            RiskProfileClassifier::classify(&[Conservative, Moderate, Aggressive]),
            RiskProfile::Moderate
        );
        assert_eq!(
            RiskProfileClassifier::classify(&[Conservative, Conservative, Aggressive]),
            RiskProfile::Conservative
        );
        assert_eq!(
            RiskProfileClassifier::classify(&[Moderate, Moderate, Moderate]),
            RiskProfile::Moderate
        );
    }

    #[test]
    fn test_incomplete_quiz() {
        let quiz = QuizAnswers {
            q1: Some(Aggressive),
            q2: Some(Aggressive),
            q3: None,
        };
        assert_eq!(RiskProfileClassifier::classify_quiz(&quiz), None);
    }
}
