//! Source adapter contracts and the structured failure type they share.
//!
//! Each trait covers exactly one signal kind. Adapters translate their
//! upstream's native payload into a snapshot type and their upstream's
//! misbehavior into a [`SourceFailure`] with a stable reason code; raw
//! transport errors never cross this boundary.

use std::fmt::{Display, Formatter};
use std::future::Future;
use std::pin::Pin;

use time::Date;

use crate::domain::{MarketRow, SoilSnapshot, StateName, WeatherSnapshot};
use crate::http_client::{HttpError, HttpErrorKind};

/// Failure classification for one external fetch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FailureKind {
    Timeout,
    Connection,
    Http(u16),
    Parse,
    NotConfigured,
}

/// Structured source failure with a stable reason code.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceFailure {
    kind: FailureKind,
    message: String,
    retryable: bool,
}

impl SourceFailure {
    pub fn timeout(message: impl Into<String>) -> Self {
        Self {
            kind: FailureKind::Timeout,
            message: message.into(),
            retryable: true,
        }
    }

    pub fn connection(message: impl Into<String>) -> Self {
        Self {
            kind: FailureKind::Connection,
            message: message.into(),
            retryable: true,
        }
    }

    pub fn http(status: u16, message: impl Into<String>) -> Self {
        Self {
            kind: FailureKind::Http(status),
            message: message.into(),
            retryable: status >= 500 || status == 429,
        }
    }

    pub fn parse(message: impl Into<String>) -> Self {
        Self {
            kind: FailureKind::Parse,
            message: message.into(),
            retryable: false,
        }
    }

    /// A credential missing at construction time; the adapter stays in this
    /// state for the process lifetime and callers fall through to their
    /// fallback or omission path.
    pub fn not_configured(message: impl Into<String>) -> Self {
        Self {
            kind: FailureKind::NotConfigured,
            message: message.into(),
            retryable: false,
        }
    }

    pub fn from_http_error(error: &HttpError) -> Self {
        match error.kind() {
            HttpErrorKind::Timeout => Self::timeout(error.message()),
            HttpErrorKind::Connect => Self::connection(error.message()),
            HttpErrorKind::Other => Self::connection(error.message()),
        }
    }

    pub fn kind(&self) -> &FailureKind {
        &self.kind
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub const fn retryable(&self) -> bool {
        self.retryable
    }

    /// Stable reason code carried into logs and provenance records.
    pub fn code(&self) -> String {
        match &self.kind {
            FailureKind::Timeout => String::from("timeout"),
            FailureKind::Connection => String::from("connection-error"),
            FailureKind::Http(status) => format!("http-error:{status}"),
            FailureKind::Parse => String::from("parse-error"),
            FailureKind::NotConfigured => String::from("not-configured"),
        }
    }
}

impl Display for SourceFailure {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} ({})", self.message, self.code())
    }
}

impl std::error::Error for SourceFailure {}

/// Weather query target, resolved from the requested state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CityQuery {
    pub city: String,
    pub country: String,
}

impl CityQuery {
    pub fn india(city: impl Into<String>) -> Self {
        Self {
            city: city.into(),
            country: String::from("IN"),
        }
    }
}

/// Soil query target: a state plus an optional district refinement.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegionQuery {
    pub state: StateName,
    pub district: Option<String>,
}

pub type SourceFuture<'a, T> =
    Pin<Box<dyn Future<Output = Result<T, SourceFailure>> + Send + 'a>>;

/// Live weather origin. There is no secondary fallback for weather; a
/// failure means the signal is simply omitted.
pub trait WeatherSource: Send + Sync {
    fn name(&self) -> &'static str;

    fn fetch<'a>(&'a self, query: &'a CityQuery) -> SourceFuture<'a, WeatherSnapshot>;
}

/// Soil data origin: either the live government API or the bundled dataset
/// standing in for it. Both produce the same snapshot shape; only the
/// provenance tag differs.
pub trait SoilSource: Send + Sync {
    fn name(&self) -> &'static str;

    fn fetch<'a>(&'a self, query: &'a RegionQuery) -> SourceFuture<'a, SoilSnapshot>;
}

/// Market price origin for one calendar day.
///
/// A successful call that yields zero rows is a real upstream condition
/// (`Ok(vec![])`, the publisher has not posted yet) and is distinct from a
/// transport failure; the window resolver's walk-back depends on that
/// distinction.
pub trait MarketDaySource: Send + Sync {
    fn name(&self) -> &'static str;

    fn fetch_day<'a>(&'a self, day: Date) -> SourceFuture<'a, Vec<MarketRow>>;
}
