//! Client library for the National Weather Service forecast API (api.weather.gov).
//!
//! This crate defines:
//! - The closed set of response formats and their content types
//! - An async client for the point, gridpoint and alert endpoints
//! - Validated request inputs and the decoded/raw response type
//! - On-disk configuration used by `nws-cli`
//!
//! ```no_run
//! # async fn run() -> nws_core::NwsResult<()> {
//! use nws_core::{Format, NwsClient, Point};
//!
//! let client = NwsClient::new("me@example.com")?;
//! let point = Point::new(39.0693, -94.6716)?;
//! let forecast = client.point_forecast(point, Some(Format::JsonLd)).await?;
//! println!("{:?}", forecast.as_json().and_then(|f| f.get("periods")));
//! # Ok(())
//! # }
//! ```

pub mod client;
pub mod config;
pub mod error;
pub mod format;
pub mod model;

pub use client::{NwsClient, NwsClientBuilder};
pub use config::Config;
pub use error::{NwsError, NwsResult};
pub use format::Format;
pub use model::{AlertQuery, Point, WeatherResponse};
