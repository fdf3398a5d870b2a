use anyhow::{Context, Result, anyhow};
use clap::{Args, Parser, Subcommand};
use inquire::{Text, validator::ValueRequiredValidator};
use nws_core::{AlertQuery, Config, Format, NwsClient, Point, WeatherResponse};

/// Top-level CLI struct.
#[derive(Debug, Parser)]
#[command(name = "nws", version, about = "Query the National Weather Service API (api.weather.gov)")]
pub struct Cli {
    /// Contact identifier (email) to send instead of the configured one.
    #[arg(long, global = true)]
    pub contact: Option<String>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Store the contact identifier and client settings.
    Configure {
        /// Contact email; prompted for when omitted.
        email: Option<String>,

        /// API host to use instead of api.weather.gov.
        #[arg(long)]
        host: Option<String>,

        /// Request timeout in seconds.
        #[arg(long)]
        timeout: Option<u64>,

        /// Default response format.
        #[arg(long, value_parser = parse_format)]
        format: Option<Format>,
    },

    /// Forecast for a latitude/longitude.
    Forecast {
        #[command(flatten)]
        at: Coordinates,

        /// Hourly instead of twelve-hour periods.
        #[arg(long)]
        hourly: bool,

        #[command(flatten)]
        output: Output,
    },

    /// Metadata for a latitude/longitude.
    Point {
        #[command(flatten)]
        at: Coordinates,

        #[command(flatten)]
        output: Output,
    },

    /// Observation stations near a latitude/longitude.
    Stations {
        #[command(flatten)]
        at: Coordinates,

        #[command(flatten)]
        output: Output,
    },

    /// Gridded data for a forecast office grid cell.
    Gridpoint {
        /// Forecast office id, e.g. TOP.
        office: String,
        x: u32,
        y: u32,

        /// Text forecast instead of raw grid data.
        #[arg(long)]
        forecast: bool,

        #[command(flatten)]
        output: Output,
    },

    /// Weather alerts, optionally filtered.
    Alerts {
        /// Only currently active alerts.
        #[arg(long)]
        active: bool,

        /// Filter as key=value, e.g. --param area=KS. Repeatable.
        #[arg(long = "param", value_parser = parse_param)]
        params: Vec<(String, String)>,

        #[command(flatten)]
        output: Output,
    },

    /// A single alert by id.
    Alert {
        id: String,

        #[command(flatten)]
        output: Output,
    },

    /// List supported formats and their content types.
    Formats,
}

#[derive(Debug, Args)]
pub struct Coordinates {
    /// Latitude, e.g. 39.0693
    #[arg(allow_negative_numbers = true)]
    latitude: f64,

    /// Longitude, e.g. -94.6716
    #[arg(allow_negative_numbers = true)]
    longitude: f64,
}

#[derive(Debug, Args)]
pub struct Output {
    /// Response format: geojson, json-ld, dwml, oxml, cap or atom.
    #[arg(long, short, value_parser = parse_format)]
    format: Option<Format>,
}

fn parse_format(s: &str) -> Result<Format, String> {
    s.parse::<Format>().map_err(|e| e.to_string())
}

fn parse_param(s: &str) -> Result<(String, String), String> {
    let (key, value) =
        s.split_once('=').ok_or_else(|| format!("expected key=value, got '{s}'"))?;
    Ok((key.trim().to_string(), value.trim().to_string()))
}

impl Coordinates {
    fn point(&self) -> Result<Point> {
        Ok(Point::new(self.latitude, self.longitude)?)
    }
}

impl Cli {
    pub async fn run(self) -> anyhow::Result<()> {
        let config = Config::load()?;
        let contact = self.contact.as_deref();

        match self.command {
            Command::Configure { email, host, timeout, format } => {
                configure(config, email, host, timeout, format)
            }
            Command::Formats => {
                for format in Format::all() {
                    println!("{:<8} {}", format.as_str(), format.content_type());
                }
                Ok(())
            }
            Command::Forecast { at, hourly, output } => {
                let (client, format) = session(&config, contact, &output)?;
                let response = if hourly {
                    client.point_hourly_forecast(at.point()?, format).await?
                } else {
                    client.point_forecast(at.point()?, format).await?
                };
                print_response(&response)
            }
            Command::Point { at, output } => {
                let (client, format) = session(&config, contact, &output)?;
                print_response(&client.point(at.point()?, format).await?)
            }
            Command::Stations { at, output } => {
                let (client, format) = session(&config, contact, &output)?;
                print_response(&client.point_stations(at.point()?, format).await?)
            }
            Command::Gridpoint { office, x, y, forecast, output } => {
                let (client, format) = session(&config, contact, &output)?;
                let response = if forecast {
                    client.gridpoint_forecast(&office, x, y, format).await?
                } else {
                    client.gridpoint(&office, x, y, format).await?
                };
                print_response(&response)
            }
            Command::Alerts { active, params, output } => {
                let (client, format) = session(&config, contact, &output)?;
                let query: AlertQuery = params.into_iter().collect();
                let response = if active {
                    client.active_alerts(&query, format).await?
                } else {
                    client.alerts(&query, format).await?
                };
                print_response(&response)
            }
            Command::Alert { id, output } => {
                let (client, format) = session(&config, contact, &output)?;
                print_response(&client.alert(&id, format).await?)
            }
        }
    }
}

/// Client plus effective format: `--format` beats the configured default.
fn session(
    config: &Config,
    contact: Option<&str>,
    output: &Output,
) -> Result<(NwsClient, Option<Format>)> {
    let client = config.client(contact)?;
    let format = match output.format {
        Some(format) => Some(format),
        None => config.default_format()?,
    };
    tracing::debug!(base_url = client.base_url(), ?format, "client ready");
    Ok((client, format))
}

fn configure(
    mut config: Config,
    email: Option<String>,
    host: Option<String>,
    timeout: Option<u64>,
    format: Option<Format>,
) -> Result<()> {
    let email = match email {
        Some(email) => email,
        None => Text::new("Contact email sent to api.weather.gov:")
            .with_validator(ValueRequiredValidator::default())
            .with_default(config.user_agent_id.as_deref().unwrap_or_default())
            .prompt()
            .context("Failed to read contact email")?,
    };

    // Fail now rather than on the first request.
    NwsClient::new(email.as_str()).map_err(|e| anyhow!("Invalid contact: {e}"))?;

    config.user_agent_id = Some(email.trim().to_string());
    if host.is_some() {
        config.api_host = host;
    }
    if timeout.is_some() {
        config.timeout_secs = timeout;
    }
    if let Some(format) = format {
        config.default_format = Some(format.as_str().to_string());
    }

    config.save()?;
    println!("Saved configuration to {}", Config::config_file_path()?.display());
    Ok(())
}

fn print_response(response: &WeatherResponse) -> Result<()> {
    match response {
        WeatherResponse::Json(map) => {
            let pretty = serde_json::to_string_pretty(map).context("Failed to format JSON")?;
            println!("{pretty}");
        }
        WeatherResponse::Raw(text) => print!("{text}"),
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn forecast_accepts_negative_longitude_and_format() {
        let cli = Cli::try_parse_from([
            "nws", "forecast", "39.0693", "-94.6716", "--hourly", "--format", "JSON-LD",
        ])
        .unwrap();

        match cli.command {
            Command::Forecast { at, hourly, output } => {
                assert_eq!(at.point().unwrap().to_string(), "39.0693,-94.6716");
                assert!(hourly);
                assert_eq!(output.format, Some(Format::JsonLd));
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn unknown_format_is_rejected_by_parser() {
        let err = Cli::try_parse_from(["nws", "alert", "abc", "--format", "yaml"]).unwrap_err();
        assert!(err.to_string().contains("Unsupported format 'yaml'"));
    }

    #[test]
    fn alert_params_are_split_on_equals() {
        let cli = Cli::try_parse_from([
            "nws", "--contact", "me@example.com", "alerts", "--active", "--param", "area=KS",
            "--param", "severity=severe",
        ])
        .unwrap();

        assert_eq!(cli.contact.as_deref(), Some("me@example.com"));
        match cli.command {
            Command::Alerts { active, params, .. } => {
                assert!(active);
                let query: AlertQuery = params.into_iter().collect();
                assert_eq!(query.get("area"), Some("KS"));
                assert_eq!(query.get("severity"), Some("severe"));
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn param_without_equals_is_rejected() {
        assert!(parse_param("area").is_err());
        assert_eq!(parse_param(" zone = KSZ104 ").unwrap(), ("zone".into(), "KSZ104".into()));
    }

    #[test]
    fn cli_format_beats_config_default() {
        let config = Config {
            user_agent_id: Some("me@example.com".into()),
            default_format: Some("atom".into()),
            ..Config::default()
        };

        let (_, format) = session(&config, None, &Output { format: None }).unwrap();
        assert_eq!(format, Some(Format::Atom));

        let (_, format) = session(&config, None, &Output { format: Some(Format::Cap) }).unwrap();
        assert_eq!(format, Some(Format::Cap));
    }
}
