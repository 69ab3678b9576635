/// Row-selection masks: one flag per table row, true when the row is kept.
pub type Mask = Vec<bool>;

/// Element-wise conjunction of `other` into `acc`.
pub fn and_assign(acc: &mut [bool], other: &[bool]) {
    debug_assert_eq!(acc.len(), other.len(), "mask lengths differ");
    for (flag, keep) in acc.iter_mut().zip(other) {
        *flag = *flag && *keep;
    }
}

pub fn count(mask: &[bool]) -> usize {
    mask.iter().filter(|flag| **flag).count()
}

/// Indices of the rows a mask keeps, in ascending order.
pub fn selected_rows(mask: &[bool]) -> Vec<usize> {
    mask.iter()
        .enumerate()
        .filter_map(|(idx, flag)| flag.then_some(idx))
        .collect()
}
