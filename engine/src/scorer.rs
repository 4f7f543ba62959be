use lexiloot_types::{LetterMark, LetterScore};

/// Scores an uppercased guess against an uppercased target, one mark per
/// position: `Correct` on a positional match, else `Present` if the target
/// contains the letter anywhere, else `Absent`.
///
/// Deliberately simplified containment semantics: there is no per-letter
/// budget, so a target letter can satisfy any number of `Present` marks in
/// the same guess. Callers must not "fix" this to budgeted scoring; the
/// tests below pin the behavior.
pub fn score_guess(guess: &str, target: &str) -> Vec<LetterScore> {
    let target_letters: Vec<char> = target.chars().collect();
    guess
        .chars()
        .enumerate()
        .map(|(position, letter)| {
            let mark = if target_letters.get(position) == Some(&letter) {
                LetterMark::Correct
            } else if target_letters.contains(&letter) {
                LetterMark::Present
            } else {
                LetterMark::Absent
            };
            LetterScore { letter, mark }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn marks(guess: &str, target: &str) -> Vec<LetterMark> {
        score_guess(guess, target)
            .into_iter()
            .map(|score| score.mark)
            .collect()
    }

    #[test]
    fn exact_match_is_all_correct() {
        assert_eq!(marks("SHARP", "SHARP"), vec![LetterMark::Correct; 5]);
    }

    #[test]
    fn no_shared_letters_is_all_absent() {
        assert_eq!(marks("MINTY", "BLOCK"), vec![LetterMark::Absent; 5]);
    }

    #[test]
    fn harsh_against_sharp_is_all_present() {
        // No position matches, every letter of HARSH occurs in SHARP, and
        // the duplicate H costs nothing without per-letter budgeting.
        assert_eq!(marks("HARSH", "SHARP"), vec![LetterMark::Present; 5]);
    }

    #[test]
    fn round_against_proud_mixes_marks() {
        assert_eq!(
            marks("ROUND", "PROUD"),
            vec![
                LetterMark::Present, // R occurs in PROUD
                LetterMark::Present, // O occurs in PROUD
                LetterMark::Present, // U occurs in PROUD
                LetterMark::Absent,  // N does not
                LetterMark::Correct, // D matches position 4
            ]
        );
    }

    #[test]
    fn repeated_guess_letters_all_score_present() {
        // Three Es in the guess against two in the target: every one still
        // scores, since containment has no budget.
        assert_eq!(
            marks("ELLEE", "LEVEL"),
            vec![
                LetterMark::Present,
                LetterMark::Present,
                LetterMark::Present,
                LetterMark::Correct,
                LetterMark::Present,
            ]
        );
    }

    #[test]
    fn scores_carry_the_guess_letters() {
        let scored = score_guess("TRUST", "VALUE");
        let letters: String = scored.iter().map(|score| score.letter).collect();
        assert_eq!(letters, "TRUST");
    }
}
