use ordered_float::OrderedFloat;

/// Returns the index whose key is closest to `target` in a sequence ordered by
/// `key`, ascending or descending.
///
/// Runs a shrinking-window binary search: exact matches at the window bounds
/// or midpoint return immediately, and once two candidates remain the nearer
/// one wins (ties resolve to the left bound). The ordering direction is read
/// from the first and last keys.
///
/// Returns `None` for an empty sequence and `Some(0)` for a single element.
#[must_use]
pub fn nearest_index_by<T, F>(items: &[T], key: F, target: f64) -> Option<usize>
where
    F: Fn(&T) -> f64,
{
    let last = items.len().checked_sub(1)?;
    let mut left = 0;
    let mut right = last;
    let ascending = key(&items[left]) <= key(&items[right]);

    while right - left > 1 {
        if target == key(&items[left]) {
            return Some(left);
        }
        if target == key(&items[right]) {
            return Some(right);
        }
        let mid = left + (right - left) / 2;
        let mid_key = key(&items[mid]);
        if target == mid_key {
            return Some(mid);
        }
        if (target > mid_key) == ascending {
            left = mid;
        } else {
            right = mid;
        }
    }

    let left_distance = OrderedFloat((key(&items[left]) - target).abs());
    let right_distance = OrderedFloat((key(&items[right]) - target).abs());
    Some(if right_distance < left_distance {
        right
    } else {
        left
    })
}

/// [`nearest_index_by`] over a plain slice of keys.
#[must_use]
pub fn nearest_index(values: &[f64], target: f64) -> Option<usize> {
    nearest_index_by(values, |value| *value, target)
}
