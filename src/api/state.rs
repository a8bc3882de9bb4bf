use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};

use super::AnyError;
use crate::config::Config;
use crate::scheduler::Scheduler;
use crate::weburg::{Client as WeburgClient, MovieService};

const PROBE_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub scheduler: Arc<Scheduler>,
    pub movies: Arc<MovieService>,
    pub probe: reqwest::Client,
    pub started_at: DateTime<Utc>,
}

impl AppState {
    pub fn new(config: Config, scheduler: Arc<Scheduler>) -> Result<Self, AnyError> {
        let movies = MovieService::new(WeburgClient::new()?);
        let probe = reqwest::Client::builder().timeout(PROBE_TIMEOUT).build()?;
        Ok(Self {
            config: Arc::new(config),
            scheduler,
            movies: Arc::new(movies),
            probe,
            started_at: Utc::now(),
        })
    }
}
