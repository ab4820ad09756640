//! In-memory sources for feed tests

#![allow(dead_code)]

use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use nitrosense_connectors::{
    ConnectorError, GeolocationError, Geolocator, Observation, SoilNode, SoilSource,
    WeatherProvider,
};
use nitrosense_core::{Coordinate, ReceiptClock};
use nitrosense_feeds::TokioTime;

/// Start of virtual time in every test
pub const EPOCH_MS: u64 = 1_700_000_000_000;

/// Receipt clock driven by the paused tokio clock
pub fn clock() -> Arc<ReceiptClock> {
    Arc::new(ReceiptClock::new(Box::new(TokioTime::starting_at(EPOCH_MS))))
}

/// Let spawned acquisitions run without moving time much
pub async fn settle() {
    tokio::time::sleep(Duration::from_millis(1)).await;
}

/// One scripted response, optionally delayed
pub struct Step<T> {
    pub delay: Duration,
    pub result: T,
}

impl<T> Step<T> {
    pub fn now(result: T) -> Self {
        Self {
            delay: Duration::ZERO,
            result,
        }
    }

    pub fn after(millis: u64, result: T) -> Self {
        Self {
            delay: Duration::from_millis(millis),
            result,
        }
    }
}

/// Replays a script; the final step repeats forever
struct Script<T: Clone> {
    steps: Mutex<VecDeque<(Duration, T)>>,
    calls: AtomicUsize,
}

impl<T: Clone> Script<T> {
    fn new(steps: Vec<Step<T>>) -> Self {
        assert!(!steps.is_empty(), "script needs at least one step");
        Self {
            steps: Mutex::new(steps.into_iter().map(|s| (s.delay, s.result)).collect()),
            calls: AtomicUsize::new(0),
        }
    }

    async fn next(&self) -> T {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let (delay, result) = {
            let mut steps = self.steps.lock().unwrap();
            if steps.len() > 1 {
                steps.pop_front().unwrap()
            } else {
                steps.front().cloned().unwrap()
            }
        };
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }
        result
    }

    fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

/// Soil store double
pub struct MockSoil {
    script: Script<Result<Option<SoilNode>, String>>,
    paths: Mutex<Vec<String>>,
}

impl MockSoil {
    pub fn scripted(steps: Vec<Step<Result<Option<SoilNode>, String>>>) -> Arc<Self> {
        Arc::new(Self {
            script: Script::new(steps),
            paths: Mutex::new(Vec::new()),
        })
    }

    /// Always returns a full node
    pub fn npk(nitrogen: f64, phosphorus: f64, potassium: f64) -> Arc<Self> {
        Self::scripted(vec![Step::now(Ok(Some(node(nitrogen, phosphorus, potassium))))])
    }

    pub fn calls(&self) -> usize {
        self.script.calls()
    }

    pub fn paths(&self) -> Vec<String> {
        self.paths.lock().unwrap().clone()
    }
}

pub fn node(nitrogen: f64, phosphorus: f64, potassium: f64) -> SoilNode {
    SoilNode {
        nitrogen: Some(nitrogen),
        phosphorus: Some(phosphorus),
        potassium: Some(potassium),
    }
}

#[async_trait]
impl SoilSource for MockSoil {
    async fn read_node(&self, path: &str) -> Result<Option<SoilNode>, ConnectorError> {
        self.paths.lock().unwrap().push(path.to_string());
        self.script.next().await.map_err(ConnectorError::Transport)
    }
}

/// Weather provider double; failures are non-success statuses
pub struct MockWeather {
    script: Script<Result<Observation, u16>>,
    positions: Mutex<Vec<Coordinate>>,
}

impl MockWeather {
    pub fn scripted(steps: Vec<Step<Result<Observation, u16>>>) -> Arc<Self> {
        Arc::new(Self {
            script: Script::new(steps),
            positions: Mutex::new(Vec::new()),
        })
    }

    /// Always returns the same conditions
    pub fn steady(temperature: f64, precipitation: f64) -> Arc<Self> {
        Self::scripted(vec![Step::now(Ok(observation(temperature, precipitation)))])
    }

    pub fn calls(&self) -> usize {
        self.script.calls()
    }

    pub fn positions(&self) -> Vec<Coordinate> {
        self.positions.lock().unwrap().clone()
    }
}

pub fn observation(temperature: f64, precipitation: f64) -> Observation {
    Observation {
        temperature,
        precipitation,
    }
}

#[async_trait]
impl WeatherProvider for MockWeather {
    async fn current(&self, at: Coordinate) -> Result<Observation, ConnectorError> {
        self.positions.lock().unwrap().push(at);
        self.script.next().await.map_err(|status| ConnectorError::Unsuccessful {
            status,
            message: nitrosense_core::errors::WEATHER_FETCH_FAILED,
        })
    }
}

/// Geolocation double
pub struct MockGeolocator {
    script: Script<Result<Coordinate, GeolocationError>>,
}

impl MockGeolocator {
    pub fn scripted(steps: Vec<Step<Result<Coordinate, GeolocationError>>>) -> Arc<Self> {
        Arc::new(Self {
            script: Script::new(steps),
        })
    }

    pub fn at(position: Coordinate) -> Arc<Self> {
        Self::scripted(vec![Step::now(Ok(position))])
    }

    pub fn denied() -> Arc<Self> {
        Self::scripted(vec![Step::now(Err(GeolocationError::PermissionDenied))])
    }

    pub fn calls(&self) -> usize {
        self.script.calls()
    }
}

#[async_trait]
impl Geolocator for MockGeolocator {
    async fn locate(&self) -> Result<Coordinate, GeolocationError> {
        self.script.next().await
    }
}
