//! Confidence-vector ranking utilities.
//!
//! Both helpers scan a confidence vector that is index-aligned with a
//! class list (the output of [`Ensemble::classify`]).
//!
//! [`top_n_labels`] deliberately reproduces a bespoke insertion-based
//! partial selection, including its tie asymmetry: a candidate only
//! displaces a held entry with a *strictly* lower score, so on equal
//! scores the earlier-placed entry wins. Downstream consumers depend on
//! this exact ordering; do not replace it with a stable full sort.
//!
//! [`Ensemble::classify`]: crate::ensemble::Ensemble::classify

use thiserror::Error;

/// Errors raised while ranking a confidence vector.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum RankError {
    /// More ranked labels were requested than the class list holds.
    #[error("requested top {requested} labels but the class list has {available}")]
    TooManyRequested { requested: usize, available: usize },
    /// The confidence vector is not index-aligned with the class list.
    #[error("confidence vector has {confidences} entries but the class list has {classes}")]
    LengthMismatch { classes: usize, confidences: usize },
}

fn check_alignment(class_list: &[String], confidences: &[f64]) -> Result<(), RankError> {
    if class_list.len() != confidences.len() {
        return Err(RankError::LengthMismatch {
            classes: class_list.len(),
            confidences: confidences.len(),
        });
    }
    Ok(())
}

/// The single best label and its confidence.
///
/// Linear scan with strict `>` comparison: on ties, the first position in
/// class-list order wins. `Ok(None)` only for an empty vector.
pub fn most_probable_label<'a>(
    class_list: &'a [String],
    confidences: &[f64],
) -> Result<Option<(&'a str, f64)>, RankError> {
    check_alignment(class_list, confidences)?;

    let mut best = 0;
    for i in 1..confidences.len() {
        if confidences[i] > confidences[best] {
            best = i;
        }
    }
    Ok(confidences
        .get(best)
        .map(|&score| (class_list[best].as_str(), score)))
}

/// The top `n` labels by descending confidence.
///
/// Maintains `n` slots and inserts each candidate at the first slot that
/// is empty or holds a strictly lower score, shifting the tail and
/// dropping the last entry. O(n·N), not a full sort; equal-score
/// candidates never displace an earlier placement.
pub fn top_n_labels<'a>(
    class_list: &'a [String],
    confidences: &[f64],
    n: usize,
) -> Result<Vec<(&'a str, f64)>, RankError> {
    check_alignment(class_list, confidences)?;
    if n > class_list.len() {
        return Err(RankError::TooManyRequested {
            requested: n,
            available: class_list.len(),
        });
    }

    let mut slots: Vec<Option<(usize, f64)>> = vec![None; n];

    for (candidate, &score) in confidences.iter().enumerate() {
        for k in 0..n {
            let takes_slot = match slots[k] {
                None => true,
                Some((_, held)) => held < score,
            };
            if takes_slot {
                slots.insert(k, Some((candidate, score)));
                slots.truncate(n);
                break;
            }
        }
    }

    // n <= len(confidences), so every slot is filled after the scan.
    debug_assert!(slots.iter().all(Option::is_some));
    Ok(slots
        .into_iter()
        .flatten()
        .map(|(i, score)| (class_list[i].as_str(), score))
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn labels(names: &[&str]) -> Vec<String> {
        names.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn most_probable_picks_maximum() {
        let class_list = labels(&["a", "b", "c"]);
        let result = most_probable_label(&class_list, &[0.1, 0.7, 0.2]).unwrap();
        assert_eq!(result, Some(("b", 0.7)));
    }

    #[test]
    fn most_probable_first_position_wins_ties() {
        let class_list = labels(&["a", "b", "c"]);
        let result = most_probable_label(&class_list, &[0.4, 0.4, 0.2]).unwrap();
        assert_eq!(result, Some(("a", 0.4)));
    }

    #[test]
    fn most_probable_empty_is_none() {
        let class_list: Vec<String> = Vec::new();
        assert_eq!(most_probable_label(&class_list, &[]).unwrap(), None);
    }

    #[test]
    fn most_probable_misaligned_vector_is_an_error() {
        let class_list = labels(&["a", "b"]);
        let err = most_probable_label(&class_list, &[0.5]).unwrap_err();
        assert_eq!(
            err,
            RankError::LengthMismatch {
                classes: 2,
                confidences: 1
            }
        );
    }

    #[test]
    fn top_n_descending_order() {
        let class_list = labels(&["a", "b", "c", "d"]);
        let result = top_n_labels(&class_list, &[0.1, 0.5, 0.3, 0.1], 3).unwrap();
        assert_eq!(result, vec![("b", 0.5), ("c", 0.3), ("a", 0.1)]);
    }

    #[test]
    fn top_n_equal_scores_keep_scan_order() {
        // "a" is placed first; the later equal score must not displace it.
        let class_list = labels(&["a", "b", "c"]);
        let result = top_n_labels(&class_list, &[0.4, 0.4, 0.2], 2).unwrap();
        assert_eq!(result, vec![("a", 0.4), ("b", 0.4)]);
    }

    #[test]
    fn top_n_returns_exactly_n() {
        let class_list = labels(&["a", "b", "c", "d", "e"]);
        let confidences = [0.2, 0.1, 0.3, 0.25, 0.15];
        for n in 0..=5 {
            let result = top_n_labels(&class_list, &confidences, n).unwrap();
            assert_eq!(result.len(), n);
        }
    }

    #[test]
    fn top_n_full_length_is_a_descending_permutation() {
        let class_list = labels(&["a", "b", "c", "d"]);
        let result = top_n_labels(&class_list, &[0.1, 0.4, 0.2, 0.3], 4).unwrap();
        assert_eq!(
            result,
            vec![("b", 0.4), ("d", 0.3), ("c", 0.2), ("a", 0.1)]
        );
    }

    #[test]
    fn top_n_beyond_class_list_is_an_error() {
        let class_list = labels(&["a", "b"]);
        let err = top_n_labels(&class_list, &[0.5, 0.5], 3).unwrap_err();
        assert_eq!(
            err,
            RankError::TooManyRequested {
                requested: 3,
                available: 2
            }
        );
    }

    #[test]
    fn top_n_misaligned_vector_is_an_error() {
        let class_list = labels(&["a", "b", "c"]);
        let err = top_n_labels(&class_list, &[0.5, 0.5], 2).unwrap_err();
        assert_eq!(
            err,
            RankError::LengthMismatch {
                classes: 3,
                confidences: 2
            }
        );
    }
}
