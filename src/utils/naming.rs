//! Naming helpers for generated artifacts.

const ALPHABET: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZ";

/// Convert a zero-based index into a spreadsheet-style column name
/// (`0 -> A`, `25 -> Z`, `26 -> AA`).
pub fn idx_to_alphabetical(idx: usize) -> String {
    let n = ALPHABET.len();
    let mut name = Vec::new();
    let mut current = idx + 1;
    while current > 0 {
        let rem = (current - 1) % n;
        name.push(ALPHABET[rem]);
        current = (current - 1) / n;
    }
    name.reverse();
    String::from_utf8(name).unwrap_or_default()
}

/// Number of decimal digits needed to print `value` without losing precision,
/// at least one.
pub fn decimal_digits(value: f64) -> usize {
    let repr = format!("{}", value);
    repr.split_once('.')
        .map(|(_, decimals)| decimals.len())
        .unwrap_or(0)
        .max(1)
}

/// Directory name for a capacity fraction, padded to `digits` decimals
/// (`capacity-0.50` for 0.5 with two digits).
pub fn capacity_dir_name(fraction: f64, digits: usize) -> String {
    format!("capacity-{:.*}", digits, fraction)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_idx_to_alphabetical() {
        assert_eq!(idx_to_alphabetical(0), "A");
        assert_eq!(idx_to_alphabetical(25), "Z");
        assert_eq!(idx_to_alphabetical(26), "AA");
        assert_eq!(idx_to_alphabetical(27), "AB");
        assert_eq!(idx_to_alphabetical(701), "ZZ");
        assert_eq!(idx_to_alphabetical(702), "AAA");
    }

    #[test]
    fn test_capacity_dir_names_share_width() {
        let fractions = [0.0, 0.25, 1.0];
        let digits = fractions.iter().map(|f| decimal_digits(*f)).max().unwrap();
        assert_eq!(digits, 2);
        assert_eq!(capacity_dir_name(0.0, digits), "capacity-0.00");
        assert_eq!(capacity_dir_name(0.25, digits), "capacity-0.25");
        assert_eq!(capacity_dir_name(1.0, digits), "capacity-1.00");
    }
}
