/// "12.3s", or "1:05.0" once past a minute
pub fn format_secs(secs: f64) -> String {
    let secs = secs.max(0.0);
    if secs < 60.0 {
        format!("{secs:.1}s")
    } else {
        let minutes = (secs / 60.0).floor();
        format!("{}:{:04.1}", minutes as u64, secs - minutes * 60.0)
    }
}

pub fn format_best_time(best: Option<f64>) -> String {
    best.map_or_else(|| "--".to_string(), format_secs)
}

/// Score delta with an explicit sign
pub fn format_delta(delta: i64) -> String {
    if delta >= 0 {
        format!("+{delta}")
    } else {
        delta.to_string()
    }
}
