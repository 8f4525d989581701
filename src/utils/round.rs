/// Rounds half away from zero to a fixed number of decimals.
pub fn round_to(value: f64, decimals: u32) -> f64 {
    let factor = 10f64.powi(decimals as i32);
    (value * factor).round() / factor
}

/// Kilometres expressed as whole hundredths. Summing these keeps totals independent of the
/// order activities were added in.
pub fn to_centi_km(distance_km: f64) -> i64 {
    (distance_km * 100.).round() as i64
}

pub fn from_centi_km(centi: i64) -> f64 {
    centi as f64 / 100.
}
