//! Small UI helpers.

use crate::scale::scale;

/// Throughput label in the tier of `reference_max`, e.g. `1.5 kB/s`.
pub fn per_second(v: f64, reference_max: f64) -> String {
    format!("{}/s", scale(v, reference_max))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rate_labels() {
        assert_eq!(per_second(1536.0, 2048.0), "1.5 kB/s");
        assert_eq!(per_second(0.0, 0.0), "0 B/s");
    }
}
