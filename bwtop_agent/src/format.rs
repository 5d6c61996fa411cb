//! Human-readable sizes and durations for the status fragment.

use std::time::Duration;

const UNITS: [&str; 5] = ["B", "kB", "MB", "GB", "TB"];

/// `0` for zero, otherwise the value in powers of 1024 with at most one
/// decimal and grouped thousands, e.g. `1.5 kB`, `1,023 B`.
pub fn byte_size_string(size: u64) -> String {
    if size == 0 {
        return "0".into();
    }
    let mut v = size as f64;
    let mut idx = 0;
    while v >= 1024.0 && idx < UNITS.len() - 1 {
        v /= 1024.0;
        idx += 1;
    }
    let tenths = (v * 10.0).round() as u64;
    let (int, frac) = (tenths / 10, tenths % 10);
    let mut s = group_thousands(int);
    if frac > 0 {
        s.push('.');
        s.push_str(&frac.to_string());
    }
    format!("{s} {}", UNITS[idx])
}

fn group_thousands(n: u64) -> String {
    let digits = n.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(ch);
    }
    out
}

pub fn uptime_string(d: Duration) -> String {
    let secs = d.as_secs();
    let (h, m, s) = (secs / 3600, (secs % 3600) / 60, secs % 60);
    if h > 0 {
        format!("{h}h {m}m {s}s")
    } else if m > 0 {
        format!("{m}m {s}s")
    } else {
        format!("{s}s")
    }
}
