//! Distributions resolved on disk, pairing a location with its parsed metadata.

pub use discovery::{find_distribution, find_distributions};
pub use distribution::{Distribution, DistributionType};
pub use exclude::ExcludeConfiguration;

mod discovery;
mod distribution;
mod exclude;
