//! Spoken confirmation phrases

use crate::calculator::ResultSummary;

pub const LISTENING_ON: &str = "语音控制已开启";
pub const LISTENING_OFF: &str = "语音控制已关闭";
pub const NO_RESULTS: &str = "计算完成，但未找到有效结果，请检查参数";

pub fn distance_set(meters: f64) -> String {
    format!("设置距离{meters}米")
}

pub fn angle_set(degrees: f64) -> String {
    if degrees < 0.0 {
        format!("设置瞄准角度负{}度", degrees.abs())
    } else {
        format!("设置瞄准角度{degrees}度")
    }
}

pub fn calculation_finished(summary: &ResultSummary) -> String {
    let parts: Vec<String> = [("低射角度", summary.low_angle), ("高射角度", summary.high_angle)]
        .into_iter()
        .filter_map(|(label, angle)| angle.map(|a| format!("{label}{}度", round2(a))))
        .collect();

    if parts.is_empty() {
        NO_RESULTS.to_string()
    } else {
        format!("计算完成，{}", parts.join("，"))
    }
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}
