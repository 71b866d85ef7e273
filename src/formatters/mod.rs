// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Metric formatting for activity summaries.
//!
//! Every function here is total: input is loosely-typed JSON (a field may be
//! missing, a number, or a numeric string), coercion failures and domain
//! violations yield a fixed placeholder string, and nothing panics. The
//! per-sport summaries are a closed dispatch over Run/Ride/Swim plus a
//! generic fallback.

pub mod tools;

use serde_json::Value;

pub use tools::{formatter_tools, parse_activity_payload, FormatterTool};

/// Coerce a JSON value to f64: numbers pass through, numeric strings parse.
fn coerce_f64(value: Option<&Value>) -> Option<f64> {
    match value? {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    }
}

fn field<'a>(activity: &'a Value, key: &str) -> Option<&'a Value> {
    activity.get(key)
}

fn num(activity: &Value, key: &str) -> Option<f64> {
    coerce_f64(field(activity, key))
}

/// Distance in meters rendered as kilometers.
pub fn format_distance(value: Option<&Value>) -> String {
    match coerce_f64(value) {
        Some(meters) => format!("{:.2} 公里", meters / 1000.0),
        None => "未知距离".to_string(),
    }
}

/// Duration in seconds rendered as `H 小时 M 分 S 秒` (hours omitted under one hour).
pub fn format_duration(value: Option<&Value>) -> String {
    let total_seconds = match coerce_f64(value) {
        Some(secs) if secs >= 0.0 => secs as i64,
        _ => return "未知用时".to_string(),
    };
    let (minutes, sec) = (total_seconds / 60, total_seconds % 60);
    let (hours, minutes) = (minutes / 60, minutes % 60);
    if hours > 0 {
        format!("{} 小时 {} 分 {} 秒", hours, minutes, sec)
    } else {
        format!("{} 分 {} 秒", minutes, sec)
    }
}

/// Pace in seconds per kilometer rendered as `M:SS/公里`.
///
/// Zero or negative distance is a domain violation and yields the placeholder.
pub fn format_pace(distance: Option<&Value>, moving_time: Option<&Value>) -> String {
    let (Some(distance_m), Some(moving_time_s)) = (coerce_f64(distance), coerce_f64(moving_time))
    else {
        return "配速未知".to_string();
    };
    let distance_km = distance_m / 1000.0;
    if distance_km <= 0.0 || moving_time_s < 0.0 {
        return "配速未知".to_string();
    }
    let pace = (moving_time_s / distance_km) as i64;
    format!("{}:{:02}/公里", pace / 60, pace % 60)
}

/// Swim pace in seconds per 100 m rendered as `M:SS/100米`.
pub fn format_swim_pace(distance: Option<&Value>, moving_time: Option<&Value>) -> String {
    let (Some(distance_m), Some(moving_time_s)) = (coerce_f64(distance), coerce_f64(moving_time))
    else {
        return "配速未知".to_string();
    };
    if distance_m <= 0.0 || moving_time_s < 0.0 {
        return "配速未知".to_string();
    }
    let pace = ((moving_time_s / distance_m) * 100.0) as i64;
    format!("{}:{:02}/100米", pace / 60, pace % 60)
}

/// Speed in m/s rendered as km/h with one decimal.
pub fn format_speed(value: Option<&Value>) -> String {
    match coerce_f64(value) {
        Some(speed_ms) => format!("{:.1} 公里/小时", speed_ms * 3.6),
        None => "速度未知".to_string(),
    }
}

/// Speed in m/s rendered as km/h with two decimals (swim precision).
pub fn format_speed_precise(value: Option<&Value>) -> String {
    match coerce_f64(value) {
        Some(speed_ms) => format!("{:.2} 公里/小时", speed_ms * 3.6),
        None => "速度未知".to_string(),
    }
}

/// Elevation gain in meters.
pub fn format_elevation(value: Option<&Value>) -> String {
    match coerce_f64(value) {
        Some(gain) => format!("爬升 {:.0} 米", gain),
        None => "海拔增益未知".to_string(),
    }
}

/// Average/max heart rate, degrading to whichever side is present.
///
/// A zero reading counts as absent, matching how devices report "no strap".
pub fn format_heartrate(avg: Option<&Value>, max: Option<&Value>) -> String {
    let avg_hr = coerce_f64(avg).map(|v| v as i64).filter(|v| *v != 0);
    let max_hr = coerce_f64(max).map(|v| v as i64).filter(|v| *v != 0);
    match (avg_hr, max_hr) {
        (Some(avg), Some(max)) => format!("平均心率 {}，最高 {} bpm", avg, max),
        (Some(avg), None) => format!("平均心率 {} bpm", avg),
        (None, Some(max)) => format!("最高心率 {} bpm", max),
        (None, None) => "心率未知".to_string(),
    }
}

/// Power line for rides: average watts with meter/estimate source, weighted
/// average appended when present.
pub fn format_power(activity: &Value) -> String {
    let Some(avg_power) = num(activity, "average_watts").filter(|w| *w > 0.0) else {
        return "功率未知".to_string();
    };
    let device_watts = field(activity, "device_watts")
        .and_then(Value::as_bool)
        .unwrap_or(false);
    let source = if device_watts { "功率计" } else { "估算" };
    let mut note = format!("平均功率 {:.0} W ({})", avg_power, source);
    if let Some(weighted) = num(activity, "weighted_average_watts") {
        note.push_str(&format!("，加权 {:.0} W", weighted));
    }
    note
}

/// `name｜sport_type` header line.
fn header(activity: &Value) -> String {
    let name = field(activity, "name")
        .and_then(Value::as_str)
        .filter(|s| !s.is_empty())
        .unwrap_or("未命名训练");
    let sport = sport_tag(activity).unwrap_or("未知");
    format!("{}｜{}", name, sport)
}

fn sport_tag(activity: &Value) -> Option<&str> {
    field(activity, "sport_type")
        .and_then(Value::as_str)
        .or_else(|| field(activity, "type").and_then(Value::as_str))
        .filter(|s| !s.is_empty())
}

fn is_trainer(activity: &Value) -> bool {
    field(activity, "trainer")
        .and_then(Value::as_bool)
        .unwrap_or(false)
}

/// Closed set of sports with dedicated metric summaries.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SportKind {
    Run,
    Ride,
    Swim,
    Generic,
}

impl SportKind {
    /// Map a Strava sport-type tag onto a formatter set.
    pub fn from_tag(tag: Option<&str>) -> Self {
        match tag {
            Some("Run" | "TrailRun" | "VirtualRun") => Self::Run,
            Some("Ride" | "MountainBikeRide" | "GravelRide" | "VirtualRide") => Self::Ride,
            Some("Swim") => Self::Swim,
            _ => Self::Generic,
        }
    }

    /// Build the metrics block for this sport.
    pub fn summary(self, activity: &Value) -> String {
        match self {
            Self::Run => run_summary(activity),
            Self::Ride => ride_summary(activity),
            Self::Swim => swim_summary(activity),
            Self::Generic => general_summary(activity),
        }
    }
}

/// Running metrics: pace, heart rate, climb, cadence.
pub fn run_summary(activity: &Value) -> String {
    let mut segments = vec![
        header(activity),
        format!("距离：{}", format_distance(field(activity, "distance"))),
        format!(
            "移动时间：{}",
            format_duration(field(activity, "moving_time"))
        ),
        format!(
            "平均配速：{}",
            format_pace(field(activity, "distance"), field(activity, "moving_time"))
        ),
        format_heartrate(
            field(activity, "average_heartrate"),
            field(activity, "max_heartrate"),
        ),
        format_elevation(field(activity, "total_elevation_gain")),
    ];
    match num(activity, "average_cadence") {
        Some(cadence) => segments.push(format!("步频 {:.0}", cadence)),
        None => segments.push("步频未知".to_string()),
    }
    if let Some(score) = num(activity, "suffer_score") {
        segments.push(format!("受虐指数 {:.0}", score));
    }
    segments.join("\n")
}

/// Cycling metrics: speed, power, cadence, climb, environment.
pub fn ride_summary(activity: &Value) -> String {
    let mut speed = format!("平均 {}", format_speed(field(activity, "average_speed")));
    if num(activity, "max_speed").is_some() {
        speed.push_str(&format!(
            "，最高 {}",
            format_speed(field(activity, "max_speed"))
        ));
    }

    let mut segments = vec![
        header(activity),
        format!("距离：{}", format_distance(field(activity, "distance"))),
        format!(
            "移动时间：{}",
            format_duration(field(activity, "moving_time"))
        ),
        format!(
            "总用时：{}",
            format_duration(field(activity, "elapsed_time"))
        ),
        format!("速度：{}", speed),
        format_power(activity),
        format_heartrate(
            field(activity, "average_heartrate"),
            field(activity, "max_heartrate"),
        ),
        format_elevation(field(activity, "total_elevation_gain")),
    ];
    if let Some(cadence) = num(activity, "average_cadence") {
        segments.push(format!("踏频 {:.0} rpm", cadence));
    }
    if let Some(temp) = num(activity, "average_temp") {
        segments.push(format!("温度 {:.0}°C", temp));
    }
    if let Some(calories) = num(activity, "calories") {
        segments.push(format!("卡路里 {:.0}", calories));
    }
    if is_trainer(activity) {
        segments.push("环境：训练台".to_string());
    } else {
        segments.push("环境：户外骑行".to_string());
    }
    segments.join("\n")
}

/// Swimming metrics: per-100m pace, speed, stroke rate.
pub fn swim_summary(activity: &Value) -> String {
    let mut speed = format!(
        "平均 {}",
        format_speed_precise(field(activity, "average_speed"))
    );
    if num(activity, "max_speed").is_some() {
        speed.push_str(&format!(
            "，最高 {}",
            format_speed_precise(field(activity, "max_speed"))
        ));
    }

    let mut segments = vec![
        header(activity),
        format!("距离：{}", format_distance(field(activity, "distance"))),
        format!(
            "移动时间：{}",
            format_duration(field(activity, "moving_time"))
        ),
        format!(
            "总用时：{}",
            format_duration(field(activity, "elapsed_time"))
        ),
        format!(
            "平均配速：{}",
            format_swim_pace(field(activity, "distance"), field(activity, "moving_time"))
        ),
        format!("速度：{}", speed),
        format_heartrate(
            field(activity, "average_heartrate"),
            field(activity, "max_heartrate"),
        ),
    ];
    if let Some(cadence) = num(activity, "average_cadence") {
        segments.push(format!("划水频率 {:.0} spm", cadence));
    }
    if let Some(calories) = num(activity, "calories") {
        segments.push(format!("卡路里 {:.0}", calories));
    }
    if is_trainer(activity) {
        segments.push("环境：泳池训练".to_string());
    }
    segments.join("\n")
}

/// Catch-all summary for unknown or gym-style activities.
pub fn general_summary(activity: &Value) -> String {
    let distance_note = if field(activity, "distance").is_some() {
        format!("距离：{}", format_distance(field(activity, "distance")))
    } else {
        "距离：无距离记录".to_string()
    };

    let mut notes = vec![
        header(activity),
        distance_note,
        format!(
            "移动时间：{}",
            format_duration(field(activity, "moving_time"))
        ),
        format!(
            "总用时：{}",
            format_duration(field(activity, "elapsed_time"))
        ),
    ];

    if num(activity, "average_speed").is_some_and(|v| v > 0.0) {
        let mut line = format!(
            "平均速度：{}",
            format_speed(field(activity, "average_speed"))
        );
        if num(activity, "max_speed").is_some() {
            line.push_str(&format!(
                "，最高 {}",
                format_speed(field(activity, "max_speed"))
            ));
        }
        notes.push(line);
    }

    if field(activity, "average_heartrate").is_some() || field(activity, "max_heartrate").is_some()
    {
        notes.push(format_heartrate(
            field(activity, "average_heartrate"),
            field(activity, "max_heartrate"),
        ));
    }
    if num(activity, "total_elevation_gain").is_some() {
        notes.push(format_elevation(field(activity, "total_elevation_gain")));
    }
    if let Some(cadence) = num(activity, "average_cadence") {
        notes.push(format!("步频/踏频 {:.0}", cadence));
    }
    if let Some(temp) = num(activity, "average_temp") {
        notes.push(format!("温度 {:.0}°C", temp));
    }
    if let Some(calories) = num(activity, "calories") {
        notes.push(format!("卡路里 {:.0}", calories));
    }

    if is_trainer(activity) {
        notes.push("环境：室内训练".to_string());
    } else if field(activity, "start_latlng")
        .and_then(Value::as_array)
        .is_some_and(|coords| !coords.is_empty())
    {
        notes.push("环境：户外活动".to_string());
    }
    notes.join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_format_distance() {
        assert_eq!(format_distance(Some(&json!(5000.0))), "5.00 公里");
        assert_eq!(format_distance(Some(&json!("5000"))), "5.00 公里");
        assert_eq!(format_distance(Some(&json!("oops"))), "未知距离");
        assert_eq!(format_distance(Some(&json!(null))), "未知距离");
        assert_eq!(format_distance(None), "未知距离");
    }

    #[test]
    fn test_format_duration() {
        assert_eq!(format_duration(Some(&json!(3725))), "1 小时 2 分 5 秒");
        assert_eq!(format_duration(Some(&json!(125))), "2 分 5 秒");
        assert_eq!(format_duration(Some(&json!(0))), "0 分 0 秒");
        assert_eq!(format_duration(Some(&json!("125.9"))), "2 分 5 秒");
        assert_eq!(format_duration(Some(&json!(-5))), "未知用时");
        assert_eq!(format_duration(None), "未知用时");
    }

    #[test]
    fn test_format_pace() {
        assert_eq!(
            format_pace(Some(&json!(5000.0)), Some(&json!(1500.0))),
            "5:00/公里"
        );
        assert_eq!(
            format_pace(Some(&json!(10000)), Some(&json!(3599))),
            "5:59/公里"
        );
        // Zero distance is a domain violation, not a division attempt.
        assert_eq!(format_pace(Some(&json!(0)), Some(&json!(1500))), "配速未知");
        assert_eq!(format_pace(None, Some(&json!(1500))), "配速未知");
        assert_eq!(format_pace(Some(&json!("x")), Some(&json!(1500))), "配速未知");
    }

    #[test]
    fn test_format_swim_pace() {
        // 1500 m in 1500 s = 100 s per 100 m
        assert_eq!(
            format_swim_pace(Some(&json!(1500)), Some(&json!(1500))),
            "1:40/100米"
        );
        assert_eq!(format_swim_pace(Some(&json!(0)), Some(&json!(60))), "配速未知");
    }

    #[test]
    fn test_format_speed() {
        assert_eq!(format_speed(Some(&json!(2.5))), "9.0 公里/小时");
        assert_eq!(format_speed(Some(&json!("2.5"))), "9.0 公里/小时");
        assert_eq!(format_speed(None), "速度未知");
        assert_eq!(format_speed_precise(Some(&json!(1.0))), "3.60 公里/小时");
    }

    #[test]
    fn test_format_elevation() {
        assert_eq!(format_elevation(Some(&json!(123.4))), "爬升 123 米");
        assert_eq!(format_elevation(Some(&json!([1, 2]))), "海拔增益未知");
    }

    #[test]
    fn test_format_heartrate() {
        assert_eq!(
            format_heartrate(Some(&json!(150.6)), Some(&json!(182))),
            "平均心率 150，最高 182 bpm"
        );
        assert_eq!(
            format_heartrate(Some(&json!(150)), None),
            "平均心率 150 bpm"
        );
        assert_eq!(format_heartrate(None, Some(&json!(182))), "最高心率 182 bpm");
        assert_eq!(format_heartrate(None, None), "心率未知");
        // Zero readings mean "no strap", not a resting rate of zero.
        assert_eq!(format_heartrate(Some(&json!(0)), Some(&json!(0))), "心率未知");
    }

    #[test]
    fn test_format_power() {
        let with_meter = json!({"average_watts": 210.4, "device_watts": true, "weighted_average_watts": 225});
        assert_eq!(format_power(&with_meter), "平均功率 210 W (功率计)，加权 225 W");

        let estimated = json!({"average_watts": 180});
        assert_eq!(format_power(&estimated), "平均功率 180 W (估算)");

        assert_eq!(format_power(&json!({})), "功率未知");
        assert_eq!(format_power(&json!({"average_watts": 0})), "功率未知");
    }

    #[test]
    fn test_sport_kind_dispatch() {
        assert_eq!(SportKind::from_tag(Some("Run")), SportKind::Run);
        assert_eq!(SportKind::from_tag(Some("TrailRun")), SportKind::Run);
        assert_eq!(SportKind::from_tag(Some("Ride")), SportKind::Ride);
        assert_eq!(SportKind::from_tag(Some("Swim")), SportKind::Swim);
        assert_eq!(SportKind::from_tag(Some("Yoga")), SportKind::Generic);
        assert_eq!(SportKind::from_tag(None), SportKind::Generic);
    }

    #[test]
    fn test_run_summary_composition() {
        let activity = json!({
            "name": "晨跑",
            "sport_type": "Run",
            "distance": 5000.0,
            "moving_time": 1500,
            "average_heartrate": 155,
            "max_heartrate": 176,
            "total_elevation_gain": 42.0,
            "average_cadence": 86.4,
        });
        let summary = run_summary(&activity);
        assert!(summary.starts_with("晨跑｜Run"));
        assert!(summary.contains("距离：5.00 公里"));
        assert!(summary.contains("平均配速：5:00/公里"));
        assert!(summary.contains("平均心率 155，最高 176 bpm"));
        assert!(summary.contains("步频 86"));
    }

    #[test]
    fn test_summaries_tolerate_empty_payload() {
        let empty = json!({});
        for kind in [
            SportKind::Run,
            SportKind::Ride,
            SportKind::Swim,
            SportKind::Generic,
        ] {
            let summary = kind.summary(&empty);
            assert!(summary.starts_with("未命名训练｜未知"));
        }
        assert!(run_summary(&empty).contains("配速未知"));
        assert!(ride_summary(&empty).contains("功率未知"));
    }

    #[test]
    fn test_ride_summary_environment() {
        let indoor = json!({"sport_type": "Ride", "trainer": true});
        assert!(ride_summary(&indoor).contains("环境：训练台"));

        let outdoor = json!({"sport_type": "Ride"});
        assert!(ride_summary(&outdoor).contains("环境：户外骑行"));
    }

    #[test]
    fn test_general_summary_environment() {
        let outdoor = json!({"start_latlng": [37.4, -122.1]});
        assert!(general_summary(&outdoor).contains("环境：户外活动"));

        let indoor = json!({"trainer": true});
        assert!(general_summary(&indoor).contains("环境：室内训练"));

        let unknown = json!({"start_latlng": []});
        assert!(!general_summary(&unknown).contains("环境"));
    }
}
