/// Unit prefixes for hashrate, each a further factor of 1000.
const HASHRATE_UNITS: &[&str] = &["", "K", "M", "G", "T", "P"];

/// Format a hashrate with two decimals and the largest prefix (K, M, G, T, P) that
/// keeps the scaled value at or above 1. Values below 1000 carry no prefix.
pub fn format_hashrate(hashrate: f64) -> String {
    if !hashrate.is_finite() || hashrate <= 0.0 {
        return "0.00".to_string();
    }

    let mut unit = 0;
    let mut scaled = hashrate;
    while unit + 1 < HASHRATE_UNITS.len() && scaled >= 1000.0 {
        scaled /= 1000.0;
        unit += 1;
    }

    // 999.995 would print as 1000.00; move it to the next prefix instead
    if unit + 1 < HASHRATE_UNITS.len() && (scaled * 100.0).round() >= 100_000.0 {
        scaled /= 1000.0;
        unit += 1;
    }

    format!("{:.2}{}", scaled, HASHRATE_UNITS[unit])
}

/// Format the time since a worker went offline as `{h}h{m}m{s}s ago`.
pub fn format_offline_since(elapsed_secs: u64) -> String {
    let hours = elapsed_secs / 3600;
    let minutes = (elapsed_secs % 3600) / 60;
    let seconds = elapsed_secs % 60;
    format!("{}h{}m{}s ago", hours, minutes, seconds)
}
