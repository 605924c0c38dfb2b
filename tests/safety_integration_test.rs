use aircast_forecast::aqi::AqiLevel;
use aircast_forecast::forecast::{NoJitter, Propagator};
use aircast_forecast::safety::{
    classify, classify_group, find_best_worst, HourlySafety, PopulationGroup, SafetyTier,
    SummaryAqi,
};
use aircast_forecast::service::SafetyReport;
use aircast_forecast::weather::WeatherSample;
use proptest::prelude::*;

/// Test the three-hour timeline where children are only safe in the first hour
#[test]
fn test_best_worst_three_hour_timeline() {
    let timeline = vec![
        HourlySafety::new(1, 40),
        HourlySafety::new(2, 90),
        HourlySafety::new(3, 150),
    ];

    let result = find_best_worst(&timeline, 65.0);

    let children = &result[&PopulationGroup::Children];
    assert_eq!(children.best.hour, 1);
    assert_eq!(children.best.aqi, SummaryAqi::Forecast(40));
    assert_eq!(children.best.status, SafetyTier::Safe);

    for group in PopulationGroup::ALL {
        let entry = &result[&group];
        assert_eq!(entry.worst.hour, 3, "worst hour for {}", group);
        assert_eq!(entry.worst.aqi, SummaryAqi::Forecast(150));
    }
}

/// Test that the shared worst hour keeps each group's own status
#[test]
fn test_worst_hour_status_is_group_specific() {
    let timeline = vec![HourlySafety::new(1, 30), HourlySafety::new(2, 80)];

    let result = find_best_worst(&timeline, 65.0);

    // AQI 80 is safe for adults but only caution for facilities
    assert_eq!(result[&PopulationGroup::Adults].worst.hour, 2);
    assert_eq!(result[&PopulationGroup::Adults].worst.status, SafetyTier::Safe);
    assert_eq!(result[&PopulationGroup::Facilities].worst.hour, 2);
    assert_eq!(result[&PopulationGroup::Facilities].worst.status, SafetyTier::Caution);
}

/// Test that best hour prefers the lowest safe hour per group
#[test]
fn test_best_hour_per_group() {
    let timeline = vec![
        HourlySafety::new(1, 95),
        HourlySafety::new(2, 70),
        HourlySafety::new(3, 60),
    ];

    let result = find_best_worst(&timeline, 100.0);

    // Adults are safe everywhere, lowest is hour 3
    assert_eq!(result[&PopulationGroup::Adults].best.hour, 3);
    // Children are never safe, fall back to overall lowest
    assert_eq!(result[&PopulationGroup::Children].best.hour, 3);
    assert_eq!(result[&PopulationGroup::Children].best.status, SafetyTier::Caution);
    assert_eq!(result[&PopulationGroup::Adults].worst.hour, 1);
}

/// Test the report built from an empty forecast
#[test]
fn test_report_without_forecast() {
    let report = SafetyReport::build(72.0, &[]);

    assert!(report.forecast_safety.is_empty());
    assert_eq!(report.current_safety.len(), 5);
    for entry in report.best_worst_times.values() {
        assert_eq!(entry.best.hour, 0);
        assert_eq!(entry.best.aqi, SummaryAqi::Current(72.0));
        assert_eq!(entry.best.status, SafetyTier::Caution);
        assert_eq!(entry.worst.status, SafetyTier::Caution);
    }
}

/// Test the full flow from propagated forecast to safety timeline
#[test]
fn test_report_from_propagated_forecast() {
    let weather: Vec<WeatherSample> = (0..6)
        .map(|i| WeatherSample::new(format!("t{}", i), 60.0, 20.0, 0.0, 50.0))
        .collect();
    let forecast = Propagator::new(NoJitter).propagate(100.0, &weather, 6, 12);

    let report = SafetyReport::build(100.0, &forecast.predictions);

    assert_eq!(report.forecast_safety.len(), 6);
    assert_eq!(report.current_safety[&PopulationGroup::Children].status, SafetyTier::Unsafe);
    for (hourly, prediction) in report.forecast_safety.iter().zip(&forecast.predictions) {
        assert_eq!(hourly.hour, prediction.hour_offset);
        assert_eq!(hourly.aqi, prediction.aqi);
        assert_eq!(hourly.groups, classify(f64::from(prediction.aqi)));
    }

    // Steady strong wind keeps improving, so the first hour is the worst
    let children = &report.best_worst_times[&PopulationGroup::Children];
    assert_eq!(children.worst.hour, 1);
    assert_eq!(children.best.status, SafetyTier::Safe);
}

/// Test recommendations are stable per group and tier
#[test]
fn test_recommendations_stable() {
    let a = classify_group(PopulationGroup::Athletes, 80.0);
    let b = classify_group(PopulationGroup::Athletes, 124.0);
    assert_eq!(a.status, SafetyTier::Caution);
    assert_eq!(a.recommendation, b.recommendation);
    assert_eq!(
        a.recommendation,
        "Reduce intensity, increase breaks, watch athletes closely"
    );
}

proptest! {
    #[test]
    fn prop_negative_aqi_is_safe_for_everyone(aqi in -1.0e6f64..0.0) {
        for verdict in classify(aqi).values() {
            prop_assert_eq!(verdict.status, SafetyTier::Safe);
        }
    }

    #[test]
    fn prop_classify_is_total(aqi in proptest::num::f64::ANY) {
        let verdicts = classify(aqi);
        prop_assert_eq!(verdicts.len(), 5);
    }

    #[test]
    fn prop_level_matches_breakpoints(aqi in -100i32..1000) {
        let level = AqiLevel::from_aqi(f64::from(aqi));
        let expected = match aqi {
            i32::MIN..=50 => AqiLevel::Good,
            51..=100 => AqiLevel::Moderate,
            101..=150 => AqiLevel::UnhealthyForSensitiveGroups,
            151..=200 => AqiLevel::Unhealthy,
            201..=300 => AqiLevel::VeryUnhealthy,
            _ => AqiLevel::Hazardous,
        };
        prop_assert_eq!(level, expected);
    }

    #[test]
    fn prop_tiers_monotonic(low in 0.0f64..500.0, delta in 0.0f64..500.0) {
        for group in PopulationGroup::ALL {
            let a = classify_group(group, low).status;
            let b = classify_group(group, low + delta).status;
            prop_assert!(a <= b);
        }
    }
}
