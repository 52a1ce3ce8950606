//! OpenWeatherMap client: one `fetch` is one network round trip from the
//! scheduler's point of view (geocode + forecast, with the geocode result
//! memoized after the first success).

use std::future::Future;
use std::time::Duration;

use parking_lot::Mutex;
use reqwest::{Client, StatusCode};
use url::Url;

use pixelwx_core::{FetchError, Location, ReqwestErrorExt, UnitsSystem};

use crate::api::{GeocodeEntry, OneCallResponse};
use crate::types::WeatherSnapshot;

const GEO_BASE_URL: &str = "https://api.openweathermap.org/geo/1.0/direct";
const DATA_BASE_URL: &str = "https://api.openweathermap.org/data/3.0/onecall";

/// Bounds a hung call so it cannot stall the scheduler indefinitely.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// Seam between the scheduler and the network.
///
/// The real implementation is [`OpenWeatherClient`]; tests script failures
/// and canned snapshots through this.
pub trait WeatherFetch: Send + Sync + 'static {
    fn fetch(
        &self,
        location: &Location,
        units: UnitsSystem,
    ) -> impl Future<Output = Result<WeatherSnapshot, FetchError>> + Send;
}

#[derive(Debug)]
pub struct OpenWeatherClient {
    client: Client,
    api_key: String,
    geo_base: String,
    data_base: String,
    /// Resolved once; the configured location never changes.
    coordinates: Mutex<Option<(f64, f64)>>,
}

impl OpenWeatherClient {
    pub fn new(api_key: impl Into<String>) -> Result<Self, FetchError> {
        Self::with_base_urls(api_key, GEO_BASE_URL, DATA_BASE_URL)
    }

    /// Client against alternate endpoints (mock servers in tests).
    pub fn with_base_urls(
        api_key: impl Into<String>,
        geo_base: impl Into<String>,
        data_base: impl Into<String>,
    ) -> Result<Self, FetchError> {
        let client = Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(ReqwestErrorExt::into_fetch_error)?;

        Ok(Self {
            client,
            api_key: api_key.into(),
            geo_base: geo_base.into(),
            data_base: data_base.into(),
            coordinates: Mutex::new(None),
        })
    }

    fn request_url(&self, base: &str, params: &[(&str, String)]) -> Result<Url, FetchError> {
        Url::parse_with_params(base, params)
            .map_err(|e| FetchError::Network(format!("invalid request url: {}", e)))
    }

    async fn geocode(&self, location: &Location) -> Result<(f64, f64), FetchError> {
        let url = self.request_url(
            &self.geo_base,
            &[
                ("q", location.query()),
                ("limit", "1".to_string()),
                ("appid", self.api_key.clone()),
            ],
        )?;

        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(ReqwestErrorExt::into_fetch_error)?;
        let response = check_status(response)?;

        let entries: Vec<GeocodeEntry> = response
            .json()
            .await
            .map_err(ReqwestErrorExt::into_fetch_error)?;
        let entry = entries.first().ok_or_else(|| {
            FetchError::MalformedResponse(format!("no geocoding result for {}", location))
        })?;

        tracing::debug!(
            lat = entry.lat,
            lon = entry.lon,
            name = entry.name.as_deref().unwrap_or(&location.city),
            "resolved location"
        );
        Ok((entry.lat, entry.lon))
    }

    async fn resolve_coordinates(&self, location: &Location) -> Result<(f64, f64), FetchError> {
        if let Some(coords) = *self.coordinates.lock() {
            return Ok(coords);
        }
        let coords = self.geocode(location).await?;
        *self.coordinates.lock() = Some(coords);
        Ok(coords)
    }
}

impl WeatherFetch for OpenWeatherClient {
    async fn fetch(
        &self,
        location: &Location,
        units: UnitsSystem,
    ) -> Result<WeatherSnapshot, FetchError> {
        let (lat, lon) = self.resolve_coordinates(location).await?;

        let url = self.request_url(
            &self.data_base,
            &[
                ("lat", lat.to_string()),
                ("lon", lon.to_string()),
                ("exclude", "minutely,alerts".to_string()),
                ("appid", self.api_key.clone()),
                ("units", units.api_value().to_string()),
            ],
        )?;

        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(ReqwestErrorExt::into_fetch_error)?;
        let response = check_status(response)?;

        let body: OneCallResponse = response
            .json()
            .await
            .map_err(ReqwestErrorExt::into_fetch_error)?;
        body.into_snapshot(units, chrono::Local::now())
    }
}

fn check_status(response: reqwest::Response) -> Result<reqwest::Response, FetchError> {
    let status = response.status();
    match status {
        _ if status.is_success() => Ok(response),
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => {
            Err(FetchError::Auth(format!("provider returned {}", status)))
        }
        _ => Err(FetchError::Network(format!("provider returned {}", status))),
    }
}
