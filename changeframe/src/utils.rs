use crate::{Bell, InvalidRowError, Stage};

/// Given some [`Bell`]s and a [`Stage`], simultaneously check for duplicate [`Bell`]s and any
/// [`Bell`]s which are too big for the given [`Stage`].
pub(crate) fn check_duplicate_or_out_of_stage(
    bells: impl IntoIterator<Item = Bell>,
    stage: Stage,
) -> Result<(), InvalidRowError> {
    // We check validity by keeping a checklist of which `Bell`s we've seen, and checking off
    // each bell as we go.  By the Pigeon Hole Principle, fitting `n` bells into `n` slots with
    // some gaps requires either an out-of-range bell or two bells sharing a slot, so we don't
    // need a final pass to look for missing bells.
    let mut checklist = vec![false; stage.num_bells()];
    for b in bells {
        match checklist.get_mut(b.index()) {
            None => return Err(InvalidRowError::BellOutOfStage(b, stage)),
            Some(&mut true) => return Err(InvalidRowError::DuplicateBell(b)),
            Some(x) => *x = true,
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use crate::{Bell, InvalidRowError, Stage};

    use super::check_duplicate_or_out_of_stage;

    #[test]
    fn duplicate_or_out_of_stage() {
        let bells = |idxs: &[u8]| idxs.iter().map(|&i| Bell::from_index(i)).collect::<Vec<_>>();

        assert_eq!(
            check_duplicate_or_out_of_stage(bells(&[2, 0, 1]), Stage::SINGLES),
            Ok(())
        );
        assert_eq!(
            check_duplicate_or_out_of_stage(bells(&[2, 0, 2]), Stage::SINGLES),
            Err(InvalidRowError::DuplicateBell(Bell::from_index(2)))
        );
        assert_eq!(
            check_duplicate_or_out_of_stage(bells(&[3, 0, 1]), Stage::SINGLES),
            Err(InvalidRowError::BellOutOfStage(
                Bell::from_index(3),
                Stage::SINGLES
            ))
        );
    }
}
