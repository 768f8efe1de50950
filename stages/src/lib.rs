pub mod jpost;
pub mod manhole_card;
pub mod prefectures;

use stagehand_core::DomainRunners;
use stagehand_lib::{Error, Result};

/// Build the `DomainRunners` for a named domain.
pub fn domain_runners_for(domain: &str) -> Result<DomainRunners> {
    match domain {
        "jpost" => Ok(jpost::domain_runners()),
        "manhole_card" => Ok(manhole_card::domain_runners()),
        other => Err(Error::UnknownDomain(other.to_string())),
    }
}

pub const KNOWN_DOMAINS: [&str; 2] = ["jpost", "manhole_card"];
