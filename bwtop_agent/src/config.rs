//! Runtime settings read once from the environment.

use once_cell::sync::OnceCell;
use std::time::Duration;

pub const DEFAULT_PORT: u16 = 3000;
pub const DEFAULT_SAMPLE_MS: u64 = 5000;
pub const DEFAULT_HISTORY: usize = 4096;

fn env_u64(key: &str) -> Option<u64> {
    std::env::var(key)
        .ok()
        .and_then(|v| v.trim().parse::<u64>().ok())
        .filter(|&v| v > 0)
}

/// BWTOP_AGENT_SAMPLE_MS: how often interface counters are sampled.
pub fn sample_period() -> Duration {
    static V: OnceCell<Duration> = OnceCell::new();
    *V.get_or_init(|| {
        Duration::from_millis(env_u64("BWTOP_AGENT_SAMPLE_MS").unwrap_or(DEFAULT_SAMPLE_MS))
    })
}

/// BWTOP_AGENT_HISTORY: samples retained for getTrafficData.
pub fn history_capacity() -> usize {
    static V: OnceCell<usize> = OnceCell::new();
    *V.get_or_init(|| {
        env_u64("BWTOP_AGENT_HISTORY")
            .map(|v| v as usize)
            .unwrap_or(DEFAULT_HISTORY)
    })
}

/// `--port N`, `-p N` or `--port=N`; long form wins, garbage falls back to `default_port`.
pub fn parse_port<I: IntoIterator<Item = String>>(args: I, default_port: u16) -> u16 {
    let mut it = args.into_iter();
    let _ = it.next(); // program name
    let mut long: Option<String> = None;
    let mut short: Option<String> = None;
    while let Some(a) = it.next() {
        match a.as_str() {
            "--port" => long = it.next(),
            "-p" => short = it.next(),
            _ if a.starts_with("--port=") => {
                if let Some((_, v)) = a.split_once('=') {
                    long = Some(v.to_string());
                }
            }
            _ => {}
        }
    }
    long.or(short)
        .and_then(|s| s.parse::<u16>().ok())
        .unwrap_or(default_port)
}
