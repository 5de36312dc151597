pub mod session;
pub mod track;
pub mod wave;

pub use session::{NewSession, Session};
pub use track::{decode_track, encode_track, GeoPoint};
pub use wave::{NewWave, Wave};

use crate::errors::{DuskerError, Result};

/// `InvalidInput` naming the first metric that is NaN or infinite
pub(crate) fn ensure_finite(metrics: &[(&str, f64)]) -> Result<()> {
    match metrics.iter().find(|(_, value)| !value.is_finite()) {
        Some((field, value)) => Err(DuskerError::InvalidInput {
            reason: format!("{} must be a finite number, got {}", field, value),
        }),
        None => Ok(()),
    }
}

/// Render a span of seconds the way the watch/phone screens show it:
/// abbreviated units, zero units dropped (`"1h 5s"`, `"42m"`, `"0s"`).
pub(crate) fn format_abbreviated(total_secs: i64, with_hours: bool) -> String {
    let sign = if total_secs < 0 { "-" } else { "" };
    let secs = total_secs.unsigned_abs();

    let (hours, rest) = if with_hours {
        (secs / 3600, secs % 3600)
    } else {
        (0, secs)
    };
    let minutes = rest / 60;
    let seconds = rest % 60;

    let parts: Vec<String> = [(hours, "h"), (minutes, "m"), (seconds, "s")]
        .iter()
        .filter(|(value, _)| *value > 0)
        .map(|(value, unit)| format!("{}{}", value, unit))
        .collect();

    if parts.is_empty() {
        "0s".to_string()
    } else {
        format!("{}{}", sign, parts.join(" "))
    }
}
