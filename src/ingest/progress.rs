//! Upload percentage arithmetic.

/// Whole percent of `total` covered by `sent`, rounded to nearest.
/// An empty transfer counts as complete.
pub fn percent_of(sent: u64, total: u64) -> u8 {
    if total == 0 {
        return 100;
    }
    let sent = sent.min(total) as u128;
    let total = total as u128;
    ((sent * 100 + total / 2) / total) as u8
}

/// Move `current` up to `next`. Never lowers it; returns whether it moved.
pub fn raise(current: &mut Option<u8>, next: u8) -> bool {
    let next = next.min(100);
    match current {
        Some(value) if *value >= next => false,
        _ => {
            *current = Some(next);
            true
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn percent_rounds_and_clamps() {
        assert_eq!(percent_of(0, 1000), 0);
        assert_eq!(percent_of(5, 1000), 1);
        assert_eq!(percent_of(999, 1000), 100);
        assert_eq!(percent_of(500, 1000), 50);
        assert_eq!(percent_of(2000, 1000), 100);
        assert_eq!(percent_of(0, 0), 100);
    }

    #[test]
    fn percent_handles_large_totals() {
        assert_eq!(percent_of(u64::MAX / 2, u64::MAX), 50);
    }

    #[test]
    fn raise_is_monotonic() {
        let mut current = None;
        assert!(raise(&mut current, 0));
        assert!(raise(&mut current, 40));
        assert!(!raise(&mut current, 30));
        assert!(!raise(&mut current, 40));
        assert_eq!(current, Some(40));
        assert!(raise(&mut current, 250));
        assert_eq!(current, Some(100));
    }
}
