//! Tests for matcher module

use probematch::ruler::Ruler;
use probematch::{
    GpsPoint, IndexGranularity, MatchResult, MatcherConfig, Probe, ProbeMatchError, ProbeMatcher,
    Road,
};

fn dc_road() -> Road {
    Road::new(
        "dc",
        vec![GpsPoint::new(38.909, -77.03), GpsPoint::new(38.910, -77.029)],
    )
}

fn dc_probe() -> GpsPoint {
    GpsPoint::new(38.9095, -77.0295)
}

fn dc_road_bearing() -> f64 {
    let road = dc_road();
    Ruler::from_point(&road.coords[0]).bearing(&road.coords[0], &road.coords[1])
}

fn no_bearing() -> MatcherConfig {
    MatcherConfig {
        compare_bearing: false,
        ..MatcherConfig::default()
    }
}

/// Two parallel west-east roads ~5.5 m apart, listed far-first.
fn parallel_roads() -> Vec<Road> {
    vec![
        Road::new(
            "south",
            vec![GpsPoint::new(38.90000, -77.0010), GpsPoint::new(38.90000, -76.9990)],
        ),
        Road::new(
            "north",
            vec![GpsPoint::new(38.90005, -77.0010), GpsPoint::new(38.90005, -76.9990)],
        ),
    ]
}

fn assert_sorted(matches: &[MatchResult]) {
    for pair in matches.windows(2) {
        assert!(pair[0].distance <= pair[1].distance);
    }
}

// ========================================================================
// End-to-end scenario
// ========================================================================

#[test]
fn test_single_road_without_bearing() {
    let matcher = ProbeMatcher::new(vec![dc_road()], no_bearing()).unwrap();
    let matches = matcher.match_probe(&dc_probe(), None);

    assert_eq!(matches.len(), 1);
    assert_eq!(matches[0].road_id, "dc");
    assert_eq!(matches[0].road_index, 0);
    assert_eq!(matches[0].segment_index, 0);
    assert!(matches[0].distance >= 0.0);
    assert!(matches[0].distance < 0.01);
    assert!((matches[0].bearing - dc_road_bearing()).abs() < 1e-9);
}

#[test]
fn test_single_road_with_close_bearing() {
    let matcher = ProbeMatcher::new(vec![dc_road()], MatcherConfig::default()).unwrap();
    let bearing = dc_road_bearing();

    assert_eq!(matcher.match_probe(&dc_probe(), Some(bearing + 1.0)).len(), 1);
    assert_eq!(matcher.match_probe(&dc_probe(), Some(bearing - 1.0)).len(), 1);
    // Out-of-range inputs are normalized first
    assert_eq!(matcher.match_probe(&dc_probe(), Some(bearing - 360.0)).len(), 1);
    assert_eq!(matcher.match_probe(&dc_probe(), Some(bearing + 720.0)).len(), 1);
}

#[test]
fn test_single_road_with_perpendicular_bearing() {
    let bearing = dc_road_bearing() + 90.0;

    let matcher = ProbeMatcher::new(vec![dc_road()], MatcherConfig::default()).unwrap();
    assert!(matcher.match_probe(&dc_probe(), Some(bearing)).is_empty());

    let bidirectional = ProbeMatcher::new(
        vec![dc_road()],
        MatcherConfig {
            bidirectional_bearing: true,
            ..MatcherConfig::default()
        },
    )
    .unwrap();
    assert!(bidirectional.match_probe(&dc_probe(), Some(bearing)).is_empty());
}

#[test]
fn test_bidirectional_accepts_opposite_bearing() {
    let reverse = dc_road_bearing() + 180.0;

    let matcher = ProbeMatcher::new(vec![dc_road()], MatcherConfig::default()).unwrap();
    assert!(matcher.match_probe(&dc_probe(), Some(reverse)).is_empty());

    let bidirectional = ProbeMatcher::new(
        vec![dc_road()],
        MatcherConfig {
            bidirectional_bearing: true,
            ..MatcherConfig::default()
        },
    )
    .unwrap();
    assert_eq!(bidirectional.match_probe(&dc_probe(), Some(reverse)).len(), 1);
    assert_eq!(
        bidirectional.match_probe(&dc_probe(), Some(dc_road_bearing())).len(),
        1
    );
}

#[test]
fn test_bearing_range_is_configurable() {
    let bearing = dc_road_bearing() + 15.0;

    let narrow = ProbeMatcher::new(vec![dc_road()], MatcherConfig::default()).unwrap();
    assert!(narrow.match_probe(&dc_probe(), Some(bearing)).is_empty());

    let wide = ProbeMatcher::new(
        vec![dc_road()],
        MatcherConfig {
            max_bearing_range: 20.0,
            ..MatcherConfig::default()
        },
    )
    .unwrap();
    assert_eq!(wide.match_probe(&dc_probe(), Some(bearing)).len(), 1);
}

#[test]
fn test_probe_distance_is_configurable() {
    // ~110 m north of the road's start
    let far_probe = GpsPoint::new(38.910, -77.0305);

    let near = ProbeMatcher::new(vec![dc_road()], no_bearing()).unwrap();
    assert!(near.match_probe(&far_probe, None).is_empty());

    let far = ProbeMatcher::new(
        vec![dc_road()],
        MatcherConfig {
            max_probe_distance: 0.13,
            ..no_bearing()
        },
    )
    .unwrap();
    let matches = far.match_probe(&far_probe, None);
    assert_eq!(matches.len(), 1);
    assert!(matches[0].distance > 0.01 && matches[0].distance <= 0.13);
}

// ========================================================================
// Properties
// ========================================================================

#[test]
fn test_missing_bearing_yields_no_matches() {
    let matcher = ProbeMatcher::new(vec![dc_road()], MatcherConfig::default()).unwrap();
    assert!(matcher.match_probe(&dc_probe(), None).is_empty());
    assert!(matcher.match_probe(&dc_probe(), Some(f64::NAN)).is_empty());
}

#[test]
fn test_bearing_ignored_when_comparison_disabled() {
    let matcher = ProbeMatcher::new(parallel_roads(), no_bearing()).unwrap();
    let probe = GpsPoint::new(38.90004, -77.0000);

    let baseline = matcher.match_probe(&probe, None);
    assert_eq!(baseline.len(), 2);
    for bearing in [0.0, 90.0, 123.4, -900.0, 3600.5] {
        assert_eq!(matcher.match_probe(&probe, Some(bearing)), baseline);
    }
}

#[test]
fn test_results_sorted_by_distance() {
    let matcher = ProbeMatcher::new(parallel_roads(), no_bearing()).unwrap();

    let matches = matcher.match_probe(&GpsPoint::new(38.90004, -77.0000), None);
    assert_eq!(matches.len(), 2);
    assert_eq!(matches[0].road_id, "north");
    assert_eq!(matches[1].road_id, "south");
    assert_sorted(&matches);

    let matches = matcher.match_probe(&GpsPoint::new(38.90001, -77.0000), None);
    assert_eq!(matches[0].road_id, "south");
    assert_sorted(&matches);
}

#[test]
fn test_empty_network() {
    let matcher = ProbeMatcher::new(Vec::new(), MatcherConfig::default()).unwrap();
    assert!(matcher.index().is_empty());
    assert!(matcher.match_probe(&dc_probe(), Some(45.0)).is_empty());

    let matcher = ProbeMatcher::new(Vec::new(), no_bearing()).unwrap();
    assert!(matcher.match_probe(&dc_probe(), None).is_empty());
    assert!(matcher.match_trace(&[dc_probe(), dc_probe()]).iter().all(Vec::is_empty));
}

#[test]
fn test_invalid_probe_yields_no_matches() {
    let matcher = ProbeMatcher::new(vec![dc_road()], no_bearing()).unwrap();
    assert!(matcher.match_probe(&GpsPoint::new(f64::NAN, -77.0295), None).is_empty());
    assert!(matcher.match_probe(&GpsPoint::new(38.9095, 200.0), None).is_empty());
}

#[test]
fn test_distance_threshold_epsilon() {
    let road = Road::new(
        "equator",
        vec![GpsPoint::new(0.0, 0.0), GpsPoint::new(0.0, 0.01)],
    );
    let max = 0.01;
    let eps = 1e-6;
    let ky = Ruler::new(0.0).ky();

    for granularity in [IndexGranularity::Segment, IndexGranularity::Road] {
        let matcher = ProbeMatcher::new(
            vec![road.clone()],
            MatcherConfig {
                max_probe_distance: max,
                granularity,
                ..no_bearing()
            },
        )
        .unwrap();

        let inside = GpsPoint::new((max - eps) / ky, 0.005);
        let matches = matcher.match_probe(&inside, None);
        assert_eq!(matches.len(), 1, "{:?}", granularity);
        assert!(matches[0].distance <= max);

        let outside = GpsPoint::new((max + eps) / ky, 0.005);
        assert!(matcher.match_probe(&outside, None).is_empty(), "{:?}", granularity);
    }
}

#[test]
fn test_distance_threshold_is_inclusive() {
    // The bend keeps the probe well inside the road's box
    let road = Road::new(
        "bend",
        vec![
            GpsPoint::new(0.0, 0.0),
            GpsPoint::new(0.0, 0.005),
            GpsPoint::new(0.001, 0.005),
        ],
    );
    let probe = GpsPoint::new(0.00005, 0.0025);
    let ruler = Ruler::new(0.0);

    let loose = ProbeMatcher::new(
        vec![road.clone()],
        MatcherConfig {
            max_probe_distance: 1.0,
            granularity: IndexGranularity::Road,
            ..no_bearing()
        },
    )
    .unwrap();
    let exact = loose.match_probe_with_ruler(&probe, None, &ruler)[0].distance;

    let tight = ProbeMatcher::new(
        vec![road],
        MatcherConfig {
            max_probe_distance: exact,
            granularity: IndexGranularity::Road,
            ..no_bearing()
        },
    )
    .unwrap();
    let matches = tight.match_probe_with_ruler(&probe, None, &ruler);
    assert_eq!(matches.len(), 1);
    assert_eq!(matches[0].distance, exact);
}

#[test]
fn test_one_result_per_road() {
    // East then north; the probe sits near the corner, closer to the second leg
    let road = Road::new(
        "corner",
        vec![
            GpsPoint::new(0.0, 0.0),
            GpsPoint::new(0.0, 0.001),
            GpsPoint::new(0.001, 0.001),
        ],
    );
    let probe = GpsPoint::new(0.00002, 0.00099);

    for granularity in [IndexGranularity::Segment, IndexGranularity::Road] {
        let matcher = ProbeMatcher::new(
            vec![road.clone()],
            MatcherConfig {
                granularity,
                ..no_bearing()
            },
        )
        .unwrap();

        let matches = matcher.match_probe(&probe, None);
        assert_eq!(matches.len(), 1, "{:?}", granularity);
        assert_eq!(matches[0].segment_index, 1, "{:?}", granularity);
        assert!((matches[0].point.longitude - 0.001).abs() < 1e-12);
    }
}

#[test]
fn test_segment_bearing_selects_leg() {
    let road = Road::new(
        "corner",
        vec![
            GpsPoint::new(0.0, 0.0),
            GpsPoint::new(0.0, 0.001),
            GpsPoint::new(0.001, 0.001),
        ],
    );
    // Equidistant-ish from both legs; heading decides
    let probe = GpsPoint::new(0.00002, 0.00098);
    let matcher = ProbeMatcher::new(vec![road], MatcherConfig::default()).unwrap();

    let east = matcher.match_probe(&probe, Some(90.0));
    assert_eq!(east.len(), 1);
    assert_eq!(east[0].segment_index, 0);

    let north = matcher.match_probe(&probe, Some(0.0));
    assert_eq!(north.len(), 1);
    assert_eq!(north[0].segment_index, 1);

    assert!(matcher.match_probe(&probe, Some(225.0)).is_empty());
}

#[test]
fn test_match_probes_preserves_order() {
    let matcher = ProbeMatcher::new(vec![dc_road()], no_bearing()).unwrap();
    let probes = vec![
        Probe::new(dc_probe()),
        Probe::new(GpsPoint::new(40.0, -70.0)),
        Probe::with_bearing(dc_probe(), 12.0),
    ];

    let results = matcher.match_probes(&probes);
    assert_eq!(results.len(), 3);
    assert_eq!(results[0].len(), 1);
    assert!(results[1].is_empty());
    assert_eq!(results[2], results[0]);
}

#[test]
fn test_matcher_is_shareable_across_threads() {
    fn assert_send_sync<T: Send + Sync>() {}
    assert_send_sync::<ProbeMatcher>();

    let matcher = ProbeMatcher::new(vec![dc_road()], no_bearing()).unwrap();
    std::thread::scope(|s| {
        for _ in 0..4 {
            s.spawn(|| assert_eq!(matcher.match_probe(&dc_probe(), None).len(), 1));
        }
    });
}

// ========================================================================
// Construction & configuration
// ========================================================================

#[test]
fn test_default_config() {
    let config = MatcherConfig::default();
    assert_eq!(config.max_probe_distance, 0.01);
    assert!(config.compare_bearing);
    assert_eq!(config.max_bearing_range, 5.0);
    assert!(!config.bidirectional_bearing);
    assert_eq!(config.granularity, IndexGranularity::Segment);
}

#[test]
fn test_config_from_options_record() {
    let config: MatcherConfig =
        serde_json::from_str(r#"{"maxProbeDistance": 0.13, "compareBearing": false, "colour": "red"}"#)
            .unwrap();
    assert_eq!(config.max_probe_distance, 0.13);
    assert!(!config.compare_bearing);
    assert_eq!(config.max_bearing_range, 5.0);
    assert!(!config.bidirectional_bearing);

    let config: MatcherConfig = serde_json::from_str(r#"{"granularity": "road"}"#).unwrap();
    assert_eq!(config.granularity, IndexGranularity::Road);

    let config: MatcherConfig = serde_json::from_str("{}").unwrap();
    assert_eq!(config, MatcherConfig::default());
}

#[test]
fn test_invalid_config_rejected() {
    let negative = MatcherConfig {
        max_probe_distance: -1.0,
        ..MatcherConfig::default()
    };
    assert!(matches!(
        ProbeMatcher::new(vec![dc_road()], negative),
        Err(ProbeMatchError::InvalidConfig { field: "max_probe_distance", .. })
    ));

    let nan_range = MatcherConfig {
        max_bearing_range: f64::NAN,
        ..MatcherConfig::default()
    };
    assert!(matches!(
        ProbeMatcher::new(vec![dc_road()], nan_range),
        Err(ProbeMatchError::InvalidConfig { field: "max_bearing_range", .. })
    ));
}

#[test]
fn test_invalid_roads_rejected_at_build() {
    let short = Road::new("short", vec![GpsPoint::new(38.9, -77.0)]);
    assert!(matches!(
        ProbeMatcher::with_defaults(vec![dc_road(), short]),
        Err(ProbeMatchError::InsufficientPoints { point_count: 1, .. })
    ));

    let nan = Road::new(
        "nan",
        vec![GpsPoint::new(38.9, -77.0), GpsPoint::new(f64::NAN, -77.0)],
    );
    assert!(matches!(
        ProbeMatcher::with_defaults(vec![nan]),
        Err(ProbeMatchError::InvalidCoordinate { index: 1, .. })
    ));

    let repeated = Road::new(
        "repeated",
        vec![
            GpsPoint::new(38.9, -77.0),
            GpsPoint::new(38.9, -77.0),
            GpsPoint::new(38.91, -77.0),
        ],
    );
    assert!(matches!(
        ProbeMatcher::with_defaults(vec![repeated]),
        Err(ProbeMatchError::DegenerateSegment { segment_index: 0, .. })
    ));
}

#[test]
fn test_accessors() {
    let matcher = ProbeMatcher::new(vec![dc_road(), parallel_roads()[0].clone()], no_bearing()).unwrap();
    assert_eq!(matcher.roads().len(), 2);
    assert_eq!(matcher.road(1).map(|r| r.id.as_str()), Some("south"));
    assert!(matcher.road(2).is_none());
    assert_eq!(matcher.segments().len(), 2);
    assert_eq!(matcher.index().len(), 2);
    assert!(!matcher.config().compare_bearing);
}

/// A long road heading north, where degrees of longitude shrink along its length.
fn poleward_road() -> Road {
    Road::new(
        "poleward",
        vec![GpsPoint::new(50.0, 10.0), GpsPoint::new(60.0, 10.0)],
    )
}

#[test]
fn test_poleward_road_matched_near_far_end() {
    let latitude = 59.9;
    let offset_km = 0.008;
    let point = GpsPoint::new(latitude, 10.0 + offset_km / Ruler::new(latitude).kx());

    for granularity in [IndexGranularity::Road, IndexGranularity::Segment] {
        let config = MatcherConfig {
            granularity,
            ..no_bearing()
        };
        let matcher = ProbeMatcher::new(vec![poleward_road()], config).unwrap();
        let matches = matcher.match_probe(&point, None);

        assert_eq!(matches.len(), 1, "{:?}", granularity);
        assert!((matches[0].distance - offset_km).abs() < 1e-9, "{:?}", granularity);
    }
}

#[test]
fn test_granularities_report_same_segment_bearing() {
    // Second segment starts well north of the road's first coordinate
    let road = Road::new(
        "zigzag",
        vec![
            GpsPoint::new(50.0, 10.0),
            GpsPoint::new(55.0, 15.0),
            GpsPoint::new(60.0, 10.0),
        ],
    );
    let start = road.coords[1];
    let expected = Ruler::from_point(&start).bearing(&start, &road.coords[2]);
    let point = road.coords[2];

    let bearings: Vec<f64> = [IndexGranularity::Road, IndexGranularity::Segment]
        .into_iter()
        .map(|granularity| {
            let config = MatcherConfig {
                granularity,
                ..no_bearing()
            };
            let matcher = ProbeMatcher::new(vec![road.clone()], config).unwrap();
            let matches = matcher.match_probe(&point, None);
            assert_eq!(matches.len(), 1);
            assert_eq!(matches[0].segment_index, 1);
            matches[0].bearing
        })
        .collect();

    assert_eq!(bearings[0], bearings[1]);
    assert!((bearings[0] - expected).abs() < 1e-12);

    let matcher = ProbeMatcher::with_defaults(vec![road]).unwrap();
    assert_eq!(matcher.segments().get(1).unwrap().bearing, expected);
}
