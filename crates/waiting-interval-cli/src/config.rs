use clap::Parser;
use std::time::Duration;

pub const DEFAULT_DELAYS_MS: [u64; 4] = [16, 8, 4, 2];
pub const DEFAULT_FIRINGS: usize = 8;

#[derive(Debug, Clone, Parser)]
#[command(name = "waiting-interval", version, about)]
struct Args {
    /// Delays in milliseconds, comma separated. Consumed from the end; the first one repeats once
    /// the rest are used up (`16,8,4,2` fires after 2, 4, 8, 16, 16, ...).
    ///
    /// Environment variable: `WAITING_INTERVAL_DELAYS_MS`.
    #[arg(long, env = "WAITING_INTERVAL_DELAYS_MS", value_delimiter = ',')]
    delays_ms: Option<Vec<u64>>,

    /// Number of firings to wait for before cancelling the interval.
    ///
    /// Environment variable: `WAITING_INTERVAL_FIRINGS`.
    #[arg(long, env = "WAITING_INTERVAL_FIRINGS")]
    firings: Option<usize>,

    /// Make the handler fail on this firing (1-based), which halts the interval.
    ///
    /// Environment variable: `WAITING_INTERVAL_FAIL_ON`.
    #[arg(long, env = "WAITING_INTERVAL_FAIL_ON")]
    fail_on: Option<usize>,

    /// Log filter (tracing-subscriber EnvFilter syntax).
    ///
    /// Environment variable: `WAITING_INTERVAL_LOG_LEVEL`.
    #[arg(long, env = "WAITING_INTERVAL_LOG_LEVEL")]
    log_level: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub delays: Vec<Duration>,
    pub firings: usize,
    pub fail_on: Option<usize>,
    pub log_level: String,
}

impl Config {
    pub fn load() -> Self {
        Self::from_args(Args::parse())
    }

    fn from_args(args: Args) -> Self {
        let delays = args
            .delays_ms
            .unwrap_or_else(|| DEFAULT_DELAYS_MS.to_vec())
            .into_iter()
            .map(Duration::from_millis)
            .collect();

        let log_level = args
            .log_level
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
            .unwrap_or_else(|| "info".to_string());

        Self {
            delays,
            firings: args.firings.unwrap_or(DEFAULT_FIRINGS),
            fail_on: args.fail_on.filter(|&n| n > 0),
            log_level,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(argv: &[&str]) -> Config {
        let argv = std::iter::once("waiting-interval").chain(argv.iter().copied());
        Config::from_args(Args::try_parse_from(argv).expect("valid args"))
    }

    #[test]
    fn defaults_match_the_documented_backoff() {
        let config = parse(&[]);
        assert_eq!(
            config.delays,
            DEFAULT_DELAYS_MS.map(Duration::from_millis).to_vec()
        );
        assert_eq!(config.firings, DEFAULT_FIRINGS);
        assert_eq!(config.fail_on, None);
        assert_eq!(config.log_level, "info");
    }

    #[test]
    fn delays_are_comma_separated_milliseconds() {
        let config = parse(&["--delays-ms", "1000,250,50", "--firings", "3"]);
        assert_eq!(
            config.delays,
            vec![
                Duration::from_millis(1000),
                Duration::from_millis(250),
                Duration::from_millis(50)
            ]
        );
        assert_eq!(config.firings, 3);
    }

    #[test]
    fn fail_on_zero_is_ignored() {
        assert_eq!(parse(&["--fail-on", "0"]).fail_on, None);
        assert_eq!(parse(&["--fail-on", "2"]).fail_on, Some(2));
    }

    #[test]
    fn blank_log_level_falls_back_to_info() {
        assert_eq!(parse(&["--log-level", "  "]).log_level, "info");
        assert_eq!(parse(&["--log-level", "debug"]).log_level, "debug");
    }
}
