/// Parses decimal text, treating anything unparseable as 0.0.
pub fn parse_or_zero(text: &str) -> f64 {
    text.parse().unwrap_or(0.0)
}

/// Renders a number with six fractional digits, e.g. `120.000000`.
pub fn format_fixed(value: f64) -> String {
    format!("{value:.6}")
}

/// Seconds to cover `distance_km` at `speed_kmh`, or `"0"` when the speed is zero.
pub fn eta_seconds(distance_km: f64, speed_kmh: f64) -> String {
    if speed_kmh == 0.0 {
        "0".to_string()
    } else {
        format_fixed(distance_km * 3600.0 / speed_kmh)
    }
}
