pub mod detail;
pub mod download;
pub mod error;
pub mod harvester;
pub mod index;
pub mod literal;
pub mod model;
pub mod script;
pub mod throttle;

pub use download::{DownloadCallback, DownloadEvent};
pub use error::{HarvestError, Result};
pub use harvester::{Harvester, ProgressCallback};
pub use model::{Catalogue, DownloadedFile, Listing};
pub use throttle::Throttle;
