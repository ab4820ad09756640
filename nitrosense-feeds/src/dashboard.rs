//! Dashboard consumer
//!
//! Runs both feeds, reads their snapshots and turns the latest pair of
//! readings into a fertilizer recommendation. Rendering is left to the
//! caller; [`Panel`] carries everything a renderer needs.

use std::sync::Arc;

use nitrosense_connectors::{
    ConnectionStats, FixedGeolocator, Geolocator, HttpClient, IpGeolocator, OpenWeatherProvider,
    RealtimeDbSource, SoilSource, WeatherProvider,
};
use nitrosense_core::{
    FeedSnapshot, FeedView, NitrogenOptimizer, OptimizerError, ReceiptClock, Recommendation,
    SoilReading, WeatherReading,
};
use tokio::sync::watch;

use crate::config::{DashboardConfig, GeolocationMode};
use crate::feed::FeedSubscription;
use crate::scheduler::Scheduler;
use crate::sensor::SensorFeed;
use crate::weather::WeatherFeed;
use crate::FeedsError;

/// Remote collaborators of the two feeds
#[derive(Clone)]
pub struct DashboardSources {
    /// Soil key-value store
    pub soil: Arc<dyn SoilSource>,
    /// Weather provider
    pub weather: Arc<dyn WeatherProvider>,
    /// Host geolocation, `None` when the host has none
    pub geolocator: Option<Arc<dyn Geolocator>>,
}

/// What to show right now
#[derive(Debug, Clone, PartialEq)]
pub struct Panel {
    /// Soil feed state
    pub soil: FeedView<SoilReading>,
    /// Weather feed state
    pub weather: FeedView<WeatherReading>,
    /// Present once both feeds have a reading
    pub recommendation: Option<Recommendation>,
}

/// Both feeds plus the optimizer
pub struct Dashboard {
    sensor: FeedSubscription<SoilReading>,
    weather: FeedSubscription<WeatherReading>,
    optimizer: NitrogenOptimizer,
    soil_updates: watch::Receiver<FeedSnapshot<SoilReading>>,
    weather_updates: watch::Receiver<FeedSnapshot<WeatherReading>>,
    soil_open: bool,
    weather_open: bool,
    clients: Vec<(&'static str, HttpClient)>,
}

impl Dashboard {
    /// Start both feeds against the given sources
    pub fn start(
        sources: DashboardSources,
        clock: Arc<ReceiptClock>,
        scheduler: &dyn Scheduler,
        config: &DashboardConfig,
    ) -> Result<Self, FeedsError> {
        config.validate()?;
        let optimizer = NitrogenOptimizer::new(config.optimizer)?;

        let sensor = SensorFeed::start(sources.soil, clock.clone(), scheduler, config.sensor_interval)?;
        let weather = WeatherFeed::start(
            sources.weather,
            sources.geolocator,
            clock,
            scheduler,
            config.weather_interval,
            config.fallback,
        )?;

        Ok(Self {
            soil_updates: sensor.subscribe(),
            weather_updates: weather.subscribe(),
            soil_open: true,
            weather_open: true,
            sensor,
            weather,
            optimizer,
            clients: Vec::new(),
        })
    }

    /// Build the HTTP connectors from `config` and start
    pub fn connect(config: &DashboardConfig, scheduler: &dyn Scheduler) -> Result<Self, FeedsError> {
        config.validate()?;

        let soil = Arc::new(RealtimeDbSource::new(
            &config.database_url,
            config.database_auth.as_deref(),
        )?);
        let weather = Arc::new(OpenWeatherProvider::with_base_url(
            &config.weather_base_url,
            &config.weather_api_key,
        )?);

        let mut clients = vec![
            ("soil", soil.client().clone()),
            ("weather", weather.client().clone()),
        ];

        let geolocator: Option<Arc<dyn Geolocator>> = match config.geolocation {
            GeolocationMode::Off => None,
            GeolocationMode::Fixed(position) => Some(Arc::new(FixedGeolocator::new(position))),
            GeolocationMode::Ip => {
                let ip = IpGeolocator::new()?;
                clients.push(("geolocation", ip.client().clone()));
                Some(Arc::new(ip))
            }
        };

        log::info!("connecting dashboard: {:?}", config);

        let sources = DashboardSources {
            soil,
            weather,
            geolocator,
        };
        let mut dashboard = Self::start(sources, Arc::new(ReceiptClock::system()), scheduler, config)?;
        dashboard.clients = clients;
        Ok(dashboard)
    }

    /// Soil feed handle
    pub fn sensor(&self) -> &FeedSubscription<SoilReading> {
        &self.sensor
    }

    /// Weather feed handle
    pub fn weather(&self) -> &FeedSubscription<WeatherReading> {
        &self.weather
    }

    /// Recommendation for the latest readings, once both feeds have one
    ///
    /// Stale readings still count. An invalid weather value is returned as
    /// an error rather than hidden.
    pub fn recommendation(&self) -> Result<Option<Recommendation>, OptimizerError> {
        let soil = self.sensor.snapshot().latest;
        let weather = self.weather.snapshot().latest;

        match (soil, weather) {
            (Some(soil), Some(weather)) => self.optimizer.recommend(&soil, &weather).map(Some),
            _ => Ok(None),
        }
    }

    /// Both feed views and the recommendation
    pub fn panel(&self) -> Result<Panel, OptimizerError> {
        let soil = self.sensor.view();
        let weather = self.weather.view();

        let recommendation = match (soil.reading(), weather.reading()) {
            (Some(s), Some(w)) => Some(self.optimizer.recommend(s, w)?),
            _ => None,
        };

        Ok(Panel {
            soil,
            weather,
            recommendation,
        })
    }

    /// Wait until either feed publishes; `false` once neither can any more
    pub async fn changed(&mut self) -> bool {
        loop {
            tokio::select! {
                soil = self.soil_updates.changed(), if self.soil_open => match soil {
                    Ok(()) => return true,
                    Err(_) => self.soil_open = false,
                },
                weather = self.weather_updates.changed(), if self.weather_open => match weather {
                    Ok(()) => return true,
                    Err(_) => self.weather_open = false,
                },
                else => return false,
            }
        }
    }

    /// Request statistics of the HTTP connectors, when built by [`connect`](Self::connect)
    pub fn connection_stats(&self) -> Vec<(&'static str, ConnectionStats)> {
        self.clients
            .iter()
            .map(|(name, client)| (*name, client.stats()))
            .collect()
    }

    /// Stop both feeds
    pub fn stop(&self) {
        self.sensor.stop();
        self.weather.stop();
    }
}
