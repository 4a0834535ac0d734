use async_trait::async_trait;
use chrono::{DateTime, TimeZone, Utc};
use flood_assessment::{
    AssessmentConfig, AssessmentError, AssessmentRequest, FixedRandom, FloodRiskService,
    SeededRandom, SourceKind,
};
use geo_index::{Coordinate, GeoIndex};
use risk_scoring::{Language, RiskLevel, LIVE_CONFIDENCE_PCT};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use weather_api::{
    CurrentWeather, ForecastSlot, GeocodeProvider, Place, UpstreamError, WeatherProvider,
};

const SIRAJGANJ: (f64, f64) = (24.4539, 89.7083);

#[derive(Default)]
struct Calls {
    current: AtomicUsize,
    forecast: AtomicUsize,
    reverse: AtomicUsize,
}

impl Calls {
    fn total(&self) -> usize {
        self.current.load(Ordering::SeqCst)
            + self.forecast.load(Ordering::SeqCst)
            + self.reverse.load(Ordering::SeqCst)
    }
}

struct StubWeather {
    current: Result<CurrentWeather, UpstreamError>,
    forecast: Result<Vec<ForecastSlot>, UpstreamError>,
    delay: Duration,
    calls: Arc<Calls>,
}

impl StubWeather {
    fn live(precipitation_mm: f64, humidity_pct: f64, calls: Arc<Calls>) -> Self {
        Self {
            current: Ok(CurrentWeather {
                precipitation_mm,
                humidity_pct,
                temperature_c: 31.0,
                wind_speed_kmh: 12.0,
                description: "heavy rain".to_string(),
            }),
            forecast: Ok(slots(5)),
            delay: Duration::ZERO,
            calls,
        }
    }

    fn failing(err: UpstreamError, calls: Arc<Calls>) -> Self {
        Self {
            current: Err(err.clone()),
            forecast: Err(err),
            delay: Duration::ZERO,
            calls,
        }
    }
}

#[async_trait]
impl WeatherProvider for StubWeather {
    async fn current(&self, _coordinate: &Coordinate) -> weather_api::Result<CurrentWeather> {
        self.calls.current.fetch_add(1, Ordering::SeqCst);
        tokio::time::sleep(self.delay).await;
        self.current.clone()
    }

    async fn forecast(
        &self,
        _coordinate: &Coordinate,
        _slots: usize,
    ) -> weather_api::Result<Vec<ForecastSlot>> {
        self.calls.forecast.fetch_add(1, Ordering::SeqCst);
        self.forecast.clone()
    }
}

struct StubGeocode {
    place: Result<Place, UpstreamError>,
    calls: Arc<Calls>,
}

impl StubGeocode {
    fn live(calls: Arc<Calls>) -> Self {
        Self {
            place: Ok(Place {
                location_name: "Kazipur Upazila".to_string(),
                country: "BD".to_string(),
                region: "Rajshahi Division".to_string(),
            }),
            calls,
        }
    }

    fn failing(calls: Arc<Calls>) -> Self {
        Self {
            place: Err(UpstreamError::Unavailable("status 503".to_string())),
            calls,
        }
    }
}

#[async_trait]
impl GeocodeProvider for StubGeocode {
    async fn reverse(&self, _coordinate: &Coordinate) -> weather_api::Result<Place> {
        self.calls.reverse.fetch_add(1, Ordering::SeqCst);
        self.place.clone()
    }
}

fn slots(n: usize) -> Vec<ForecastSlot> {
    (0..n)
        .map(|i| ForecastSlot {
            time: july() + chrono::Duration::hours(3 * i as i64),
            precipitation_mm: 4.0,
            temperature_c: 30.0,
            description: "moderate rain".to_string(),
        })
        .collect()
}

fn july() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 7, 15, 6, 0, 0).unwrap()
}

fn january() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 1, 15, 6, 0, 0).unwrap()
}

fn service(
    weather: StubWeather,
    geocode: StubGeocode,
    config: AssessmentConfig,
) -> FloodRiskService {
    FloodRiskService::new(
        Arc::new(GeoIndex::bangladesh().unwrap()),
        Arc::new(weather),
        Arc::new(geocode),
        config,
    )
}

fn sirajganj() -> AssessmentRequest {
    AssessmentRequest::new(SIRAJGANJ.0, SIRAJGANJ.1)
}

#[tokio::test]
async fn live_path_reports_fixed_confidence() {
    let calls = Arc::new(Calls::default());
    let svc = service(
        StubWeather::live(45.0, 85.0, calls.clone()),
        StubGeocode::live(calls.clone()),
        AssessmentConfig::default(),
    );

    let record = svc.assess(&sirajganj(), july(), &mut FixedRandom::low()).await.unwrap();

    // 40 + 20 + 10 (elevation 15 m) + 20 + 15 = 105, clamped
    assert_eq!(record.risk_score, 100);
    assert_eq!(record.risk_level, RiskLevel::Severe);
    assert_eq!(record.confidence_pct, LIVE_CONFIDENCE_PCT);
    assert_eq!(record.elevation_m, 15.0);
    assert_eq!(record.factors.river_level_m, 6.5);
    assert_eq!(record.factors.upstream_flow, 325.0);
    assert_eq!(record.location_name, "Kazipur Upazila");
    assert_eq!(record.nearest_river, "Jamuna River");
    assert_eq!(record.nearest_district, "Sirajganj");
    assert_eq!(record.recommendations.len(), 6);
    assert_eq!(record.recommendations[0], "Harvest mature crops immediately");
    assert_eq!(record.recommendations[4], "Check field drainage channels");
    assert_eq!(record.warnings.len(), 3);
    assert_eq!(record.outlook.len(), 3);
    assert!(record.data_source.is_live());
    assert!(record.breakdown.is_some());
    assert_eq!(record.next_update_at - record.generated_at, chrono::Duration::hours(1));
    assert_eq!(calls.total(), 3);
}

#[tokio::test]
async fn weather_failure_substitutes_synthetic_factors() {
    let calls = Arc::new(Calls::default());
    let svc = service(
        StubWeather::failing(UpstreamError::Unavailable("status 502".to_string()), calls.clone()),
        StubGeocode::live(calls.clone()),
        AssessmentConfig::default(),
    );

    let record = svc.assess(&sirajganj(), july(), &mut FixedRandom::mid()).await.unwrap();

    assert_eq!(record.data_source.weather, SourceKind::Synthetic);
    assert_eq!(record.data_source.location, SourceKind::Live);
    assert!(!record.data_source.last_resort);
    assert!(record.confidence_pct < LIVE_CONFIDENCE_PCT);
    assert_eq!(record.factors.environment.precipitation_mm, 25.0);
    assert_eq!(record.factors.environment.forecast_text, "Moderate rain");
    // 40 + 10 + 10 + 20 + 15
    assert_eq!(record.risk_score, 95);
    assert!(record.outlook.is_empty());
}

#[tokio::test]
async fn malformed_live_reading_is_treated_as_failure() {
    let calls = Arc::new(Calls::default());
    let svc = service(
        StubWeather::live(10.0, 140.0, calls.clone()),
        StubGeocode::live(calls.clone()),
        AssessmentConfig::default(),
    );

    let record = svc.assess(&sirajganj(), july(), &mut FixedRandom::mid()).await.unwrap();
    assert_eq!(record.data_source.weather, SourceKind::Synthetic);
    assert!(record.factors.environment.humidity_pct <= 90.0);
}

#[tokio::test]
async fn slow_weather_times_out_into_fallback() {
    let calls = Arc::new(Calls::default());
    let mut weather = StubWeather::live(1.0, 50.0, calls.clone());
    weather.delay = Duration::from_millis(500);
    let config = AssessmentConfig {
        weather_timeout_ms: 20,
        ..AssessmentConfig::default()
    };
    let svc = service(weather, StubGeocode::live(calls.clone()), config);

    let record = svc.assess(&sirajganj(), january(), &mut FixedRandom::mid()).await.unwrap();
    assert_eq!(record.data_source.weather, SourceKind::Synthetic);
    assert!(record.confidence_pct < LIVE_CONFIDENCE_PCT);
    // Forecast answered independently of the slow primary call
    assert_eq!(record.outlook.len(), 3);
}

#[tokio::test]
async fn missing_latitude_rejected_before_provider_calls() {
    let calls = Arc::new(Calls::default());
    let svc = service(
        StubWeather::live(1.0, 50.0, calls.clone()),
        StubGeocode::live(calls.clone()),
        AssessmentConfig::default(),
    );
    let request = AssessmentRequest {
        lat: None,
        lon: Some(90.0),
        ..Default::default()
    };

    let err = svc.assess(&request, july(), &mut FixedRandom::mid()).await.unwrap_err();
    assert_eq!(err, AssessmentError::InvalidInput("latitude is required".to_string()));

    let err = svc
        .assess_within_budget(&AssessmentRequest::new(120.0, 90.0), july(), &mut FixedRandom::mid())
        .await;
    assert!(err.is_err());
    assert_eq!(calls.total(), 0);
}

#[tokio::test]
async fn geocode_failure_keeps_live_weather() {
    let calls = Arc::new(Calls::default());
    let svc = service(
        StubWeather::live(5.0, 50.0, calls.clone()),
        StubGeocode::failing(calls.clone()),
        AssessmentConfig::default(),
    );

    let record = svc.assess(&sirajganj(), january(), &mut FixedRandom::mid()).await.unwrap();
    assert_eq!(record.data_source.weather, SourceKind::Live);
    assert_eq!(record.data_source.location, SourceKind::Synthetic);
    assert_eq!(record.location_name, "Sirajganj, Bangladesh");
    assert_eq!(record.confidence_pct, LIVE_CONFIDENCE_PCT);
    assert!(!record.data_source.is_live());
    assert_eq!(record.factors.environment.precipitation_mm, 5.0);

    let hinted = AssessmentRequest {
        district: Some("Kazipur".to_string()),
        lang: Some(Language::Bn),
        ..sirajganj()
    };
    let record = svc.assess(&hinted, january(), &mut FixedRandom::mid()).await.unwrap();
    assert_eq!(record.location_name, "Kazipur");
    assert_eq!(record.nearest_district, "সিরাজগঞ্জ");
}

#[tokio::test]
async fn forecast_failure_leaves_outlook_empty() {
    let calls = Arc::new(Calls::default());
    let mut weather = StubWeather::live(5.0, 50.0, calls.clone());
    weather.forecast = Err(UpstreamError::Timeout(2000));
    let svc = service(weather, StubGeocode::live(calls.clone()), AssessmentConfig::default());

    let record = svc.assess(&sirajganj(), january(), &mut FixedRandom::low()).await.unwrap();
    assert!(record.outlook.is_empty());
    assert!(record.data_source.is_live());
    assert_eq!(record.confidence_pct, LIVE_CONFIDENCE_PCT);
    // 40 + 0 + 10 (elevation 15 m) + 10 (soil 75) + 0
    assert_eq!(record.risk_score, 60);
    assert_eq!(record.risk_level, RiskLevel::High);
}

#[tokio::test]
async fn exhausted_budget_returns_last_resort_record() {
    let calls = Arc::new(Calls::default());
    let mut weather = StubWeather::live(5.0, 50.0, calls.clone());
    weather.delay = Duration::from_millis(500);
    let config = AssessmentConfig {
        request_budget_ms: 20,
        ..AssessmentConfig::default()
    };
    let svc = service(weather, StubGeocode::live(calls.clone()), config);

    let record = svc
        .assess_within_budget(&sirajganj(), july(), &mut SeededRandom::from_seed_u64(9))
        .await
        .unwrap();
    assert!(record.data_source.last_resort);
    assert!((45..=85).contains(&record.risk_score));
    assert!(record.confidence_pct < LIVE_CONFIDENCE_PCT);
    assert!(!record.recommendations.is_empty());
}

#[tokio::test]
async fn bangla_request_localizes_output() {
    let calls = Arc::new(Calls::default());
    let svc = service(
        StubWeather::live(45.0, 85.0, calls.clone()),
        StubGeocode::live(calls.clone()),
        AssessmentConfig::default(),
    );
    let request = AssessmentRequest {
        lang: Some(Language::Bn),
        ..sirajganj()
    };

    let record = svc.assess(&request, july(), &mut FixedRandom::low()).await.unwrap();
    assert_eq!(record.language, Language::Bn);
    assert_eq!(record.risk_label, "অতি উচ্চ");
    assert_eq!(record.nearest_river, "যমুনা নদী");
    assert!(record.recommendations.iter().all(|r| !r.is_ascii()));
}

#[tokio::test]
async fn repeated_live_assessments_agree() {
    let calls = Arc::new(Calls::default());
    let svc = service(
        StubWeather::live(12.0, 70.0, calls.clone()),
        StubGeocode::live(calls.clone()),
        AssessmentConfig::default(),
    );

    let a = svc.assess(&sirajganj(), july(), &mut SeededRandom::from_seed_u64(3)).await.unwrap();
    let b = svc.assess(&sirajganj(), july(), &mut SeededRandom::from_seed_u64(3)).await.unwrap();
    assert_eq!(a, b);
}
