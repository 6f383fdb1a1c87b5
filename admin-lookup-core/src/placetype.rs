//! Administrative placetypes understood by the resolver.
//!
//! The enum offers compile-time safety for hierarchy slots. Variants are
//! declared coarse to fine so the derived ordering follows the hierarchy.
//!
//! # Examples
//! ```
//! use admin_lookup_core::Placetype;
//!
//! assert_eq!(Placetype::Locality.as_str(), "locality");
//! assert_eq!("region".parse::<Placetype>(), Ok(Placetype::Region));
//! assert!(Placetype::Country < Placetype::Region);
//! ```

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// A category in the administrative hierarchy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Placetype {
    /// Continents.
    Continent,
    /// Empires spanning several countries.
    Empire,
    /// Sovereign countries.
    Country,
    /// Dependent territories.
    Dependency,
    /// Groupings of regions.
    Macroregion,
    /// States, provinces and similar.
    Region,
    /// Groupings of counties.
    Macrocounty,
    /// Counties.
    County,
    /// Local administrative areas.
    Localadmin,
    /// Cities, towns and villages.
    Locality,
    /// Boroughs within a locality.
    Borough,
    /// Groupings of neighbourhoods.
    Macrohood,
    /// Neighbourhoods.
    Neighbourhood,
    /// Postal code areas.
    Postalcode,
    /// Oceans.
    Ocean,
    /// Seas, bays and other marine areas.
    Marinearea,
}

/// Returned when a string does not name a known placetype.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown placetype '{0}'")]
pub struct UnknownPlacetype(pub String);

impl Placetype {
    /// Every placetype, coarse to fine.
    pub const ALL: [Self; 16] = [
        Self::Continent,
        Self::Empire,
        Self::Country,
        Self::Dependency,
        Self::Macroregion,
        Self::Region,
        Self::Macrocounty,
        Self::County,
        Self::Localadmin,
        Self::Locality,
        Self::Borough,
        Self::Macrohood,
        Self::Neighbourhood,
        Self::Postalcode,
        Self::Ocean,
        Self::Marinearea,
    ];

    /// Return the wire name of the placetype.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Continent => "continent",
            Self::Empire => "empire",
            Self::Country => "country",
            Self::Dependency => "dependency",
            Self::Macroregion => "macroregion",
            Self::Region => "region",
            Self::Macrocounty => "macrocounty",
            Self::County => "county",
            Self::Localadmin => "localadmin",
            Self::Locality => "locality",
            Self::Borough => "borough",
            Self::Macrohood => "macrohood",
            Self::Neighbourhood => "neighbourhood",
            Self::Postalcode => "postalcode",
            Self::Ocean => "ocean",
            Self::Marinearea => "marinearea",
        }
    }
}

impl std::fmt::Display for Placetype {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Placetype {
    type Err = UnknownPlacetype;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_ascii_lowercase();
        Self::ALL
            .into_iter()
            .find(|placetype| placetype.as_str() == wanted)
            .ok_or_else(|| UnknownPlacetype(s.to_owned()))
    }
}
