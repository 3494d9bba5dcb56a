//! Application-level errors

use thiserror::Error;

use crate::data::ApiError;
use crate::store::StoreError;

/// Errors surfaced by `App` commands
#[derive(Debug, Error)]
pub enum AppError {
    #[error(transparent)]
    Api(#[from] ApiError),

    #[error(transparent)]
    Store(#[from] StoreError),

    /// No data directory was configured and none could be determined
    #[error("Could not determine a data directory; pass --data-dir")]
    NoDataDir,

    #[error("No region selected; run `infobus select-region <ID>` or pass --region")]
    NoRegionSelected,

    #[error("No city selected; run `infobus select-city <ID>` first")]
    NoCitySelected,

    #[error("Route {0} is not in the route list of the selected city")]
    UnknownRoute(i64),

    #[error("Failed to write output: {0}")]
    Output(#[from] std::io::Error),
}

pub type AppResult<T> = Result<T, AppError>;
