//! Bag mappings encoded as base-`n` integers.
//!
//! A mapping of a `k`-vertex bag into an `n`-vertex target is a number in
//! `[0, n^k)`. Digit `i` (least significant first) is the image of the bag's
//! `i`-th vertex. All operations here are O(1) and allocation-free; callers
//! guarantee that `index` stays below the bag width and that `n > 0`.

/// Image of bag position `index` under `mapping`.
#[inline]
pub fn extract_digit(mapping: usize, index: usize, n: usize) -> usize {
    debug_assert!(n > 0, "digit access on an empty target");
    (mapping / n.pow(index as u32)) % n
}

/// Insert `value` as digit `index`, shifting digits at `index` and above up
/// one place.
#[inline]
pub fn insert_digit(value: usize, mapping: usize, index: usize, n: usize) -> usize {
    debug_assert!(value < n, "digit {value} out of range for base {n}");
    let low = n.pow(index as u32);
    let right = mapping % low;
    let left = mapping - right;
    n * left + low * value + right
}

/// Delete digit `index`, shifting higher digits down one place.
#[inline]
pub fn remove_digit(mapping: usize, index: usize, n: usize) -> usize {
    debug_assert!(n > 0, "digit access on an empty target");
    let low = n.pow(index as u32);
    let right = mapping % low;
    let left = mapping - mapping % (low * n);
    left / n + right
}

/// Number of mappings of a `width`-vertex bag into `n` vertices, if it fits.
pub fn row_len(n: usize, width: usize) -> Option<usize> {
    let width = u32::try_from(width).ok()?;
    n.checked_pow(width)
}

/// Encode explicit images (position 0 first) as a mapping.
pub fn encode_mapping(images: &[usize], n: usize) -> usize {
    images
        .iter()
        .rev()
        .fold(0, |mapping, &image| mapping * n + image)
}

/// Decode a mapping of a `width`-vertex bag back into its images.
pub fn decode_mapping(mapping: usize, width: usize, n: usize) -> Vec<usize> {
    (0..width).map(|i| extract_digit(mapping, i, n)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extract_digit() {
        // 2*25 + 4*5 + 3 in base 5
        let mapping = 73;
        assert_eq!(extract_digit(mapping, 0, 5), 3);
        assert_eq!(extract_digit(mapping, 1, 5), 4);
        assert_eq!(extract_digit(mapping, 2, 5), 2);
    }

    #[test]
    fn test_insert_digit_shifts_higher_digits() {
        // [3, 2] -> insert 4 at position 1 -> [3, 4, 2]
        let mapping = encode_mapping(&[3, 2], 5);
        let extended = insert_digit(4, mapping, 1, 5);
        assert_eq!(decode_mapping(extended, 3, 5), vec![3, 4, 2]);

        // Insert at the top and at the bottom.
        assert_eq!(decode_mapping(insert_digit(1, mapping, 2, 5), 3, 5), vec![3, 2, 1]);
        assert_eq!(decode_mapping(insert_digit(1, mapping, 0, 5), 3, 5), vec![1, 3, 2]);
    }

    #[test]
    fn test_remove_digit() {
        let mapping = encode_mapping(&[1, 2, 3, 4], 6);
        assert_eq!(decode_mapping(remove_digit(mapping, 0, 6), 3, 6), vec![2, 3, 4]);
        assert_eq!(decode_mapping(remove_digit(mapping, 2, 6), 3, 6), vec![1, 2, 4]);
        assert_eq!(decode_mapping(remove_digit(mapping, 3, 6), 3, 6), vec![1, 2, 3]);
    }

    #[test]
    fn test_empty_bag_mapping() {
        assert_eq!(encode_mapping(&[], 4), 0);
        assert_eq!(insert_digit(3, 0, 0, 4), 3);
        assert_eq!(remove_digit(3, 0, 4), 0);
    }

    #[test]
    fn test_row_len() {
        assert_eq!(row_len(5, 0), Some(1));
        assert_eq!(row_len(0, 0), Some(1));
        assert_eq!(row_len(0, 3), Some(0));
        assert_eq!(row_len(5, 4), Some(625));
        assert_eq!(row_len(1000, 100), None);
    }
}
