//! In-place top-k selection over an index array

/// Partially reorder `idx` so that the `k` entries with the smallest scores
/// occupy `idx[..k]`, in no particular order.
///
/// Dual-pointer quickselect with the midpoint score as pivot, iterating into
/// whichever side still contains position `k`. Expected O(len), no
/// allocation. `scores` is indexed by the values held in `idx`.
pub fn partition_topk(idx: &mut [i32], scores: &[f32], k: usize) {
    if idx.len() < 2 || k == 0 || k >= idx.len() {
        return;
    }
    let k = k as isize;
    let mut lo: isize = 0;
    let mut hi: isize = idx.len() as isize - 1;

    while lo < hi {
        let pivot = scores[idx[((lo + hi) / 2) as usize] as usize];
        let mut i = lo;
        let mut j = hi;
        while i <= j {
            while scores[idx[i as usize] as usize] < pivot {
                i += 1;
            }
            while scores[idx[j as usize] as usize] > pivot {
                j -= 1;
            }
            if i <= j {
                idx.swap(i as usize, j as usize);
                i += 1;
                j -= 1;
            }
        }
        // [lo..=j] <= pivot <= [i..=hi]; anything strictly between is settled
        if k <= j {
            hi = j;
        } else if k >= i {
            lo = i;
        } else {
            break;
        }
    }
}
