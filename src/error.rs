use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("dashboard name must not be empty")]
    EmptyDashboardName,
    #[error("dashboard '{0}' is configured more than once")]
    DuplicateDashboard(String),
    #[error("dashboard '{0}' defines no statistics")]
    NoStats(String),
    #[error("statistic '{stat}' of dashboard '{dashboard}' needs a column")]
    MissingStatColumn { dashboard: String, stat: String },
    #[error("share statistic '{stat}' of dashboard '{dashboard}' needs an `equals` value")]
    MissingShareValue { dashboard: String, stat: String },
    #[error("statistic '{stat}' is defined twice in dashboard '{dashboard}'")]
    DuplicateStat { dashboard: String, stat: String },
    #[error("statistic '{stat}' of dashboard '{dashboard}' would overwrite the boundary key")]
    StatShadowsKey { dashboard: String, stat: String },
    #[error("statistic name '{stat}' of dashboard '{dashboard}' uses the reserved `fill_` prefix")]
    ReservedStatName { dashboard: String, stat: String },
    #[error("dashboard '{dashboard}' asks for {bins} bins, palettes have at most 9")]
    TooManyBins { dashboard: String, bins: usize },
    #[error("dashboard '{0}' asks for zero bins")]
    ZeroBins(String),
    #[error("unknown palette '{0}'")]
    UnknownPalette(String),
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum AggregateError {
    #[error("column '{column}' not found in records")]
    MissingColumn { column: String },
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum JoinError {
    #[error("boundary feature '{name}' has no matching aggregate")]
    UnmatchedFeature { name: String },
}
