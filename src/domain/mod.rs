//! Domain types shared across collectors, resolver and reporters

mod dependency;
mod ecosystem;
mod record;
mod status;
mod summary;

pub use dependency::{Dependency, DependencyKey, SourceKind};
pub use ecosystem::Ecosystem;
pub use record::{Eol, ProductAvailability, VersionRecord};
pub use status::{CheckResult, Status};
pub use summary::{CheckReport, StatusCounts};
