//! Prefer the locality named by the postal service over the geometric one.
//!
//! Mail addressed to a postal code is usually delivered under a single city
//! name, even when the point sits in a neighbouring municipality. When
//! enabled, a [`PostalCityPolicy`] may swap the resolved locality for that
//! postal city.

use std::collections::HashMap;

use log::info;

use crate::{Place, Placetype, ResolutionResult, SUSPECT_LOG_TARGET};

/// Strategy overriding the locality parent after the hierarchy merge.
pub trait PostalCityPolicy: Send + Sync {
    /// Adjust `place` using the postal data in `result`.
    ///
    /// Implementations must leave the place untouched when the data they
    /// need is absent.
    fn apply(&self, result: &ResolutionResult, place: &mut Place);
}

/// A locality associated with a postal code.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PostalCity {
    /// Locality identifier.
    pub id: String,
    /// Locality name.
    pub name: String,
    /// Optional abbreviation.
    pub abbr: Option<String>,
}

/// Postal cities keyed by postal code id, most authoritative first.
///
/// # Examples
/// ```
/// use geo::Coord;
/// use admin_lookup_core::{
///     Candidate, Place, Placetype, PostalCity, PostalCityPolicy, PostalCityTable,
///     ResolutionResult,
/// };
///
/// let mut table = PostalCityTable::new();
/// table.insert("554784671", PostalCity {
///     id: "85922583".into(),
///     name: "San Francisco".into(),
///     abbr: Some("SF".into()),
/// });
///
/// let mut place = Place::new("g1", "address")
///     .with_centroid(Coord { x: -122.4, y: 37.7 })
///     .with_parent_fields([Placetype::Locality, Placetype::Postalcode]);
/// let result = ResolutionResult::new()
///     .with(Placetype::Postalcode, vec![Candidate::new("94103", "554784671")])
///     .with(Placetype::Locality, vec![Candidate::new("Daly City", "85921881")]);
///
/// table.apply(&result, &mut place);
/// assert_eq!(place.parents(Placetype::Locality)[0].name, "San Francisco");
/// ```
#[derive(Debug, Clone, Default)]
pub struct PostalCityTable {
    cities: HashMap<String, Vec<PostalCity>>,
}

impl PostalCityTable {
    /// Create an empty table.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append `city` to the list for `postalcode_id`.
    pub fn insert(&mut self, postalcode_id: impl Into<String>, city: PostalCity) {
        self.cities.entry(postalcode_id.into()).or_default().push(city);
    }

    /// Postal cities for `postalcode_id`, most authoritative first.
    pub fn get(&self, postalcode_id: &str) -> &[PostalCity] {
        self.cities.get(postalcode_id).map_or(&[], Vec::as_slice)
    }

    /// Number of postal codes with at least one city.
    pub fn len(&self) -> usize {
        self.cities.len()
    }

    /// Whether the table holds no postal codes.
    pub fn is_empty(&self) -> bool {
        self.cities.is_empty()
    }
}

impl FromIterator<(String, PostalCity)> for PostalCityTable {
    fn from_iter<T: IntoIterator<Item = (String, PostalCity)>>(iter: T) -> Self {
        let mut table = Self::new();
        for (postalcode_id, city) in iter {
            table.insert(postalcode_id, city);
        }
        table
    }
}

impl PostalCityPolicy for PostalCityTable {
    fn apply(&self, result: &ResolutionResult, place: &mut Place) {
        if !place.supports(Placetype::Locality) {
            return;
        }
        let Some(postalcode) = result.first(Placetype::Postalcode) else {
            return;
        };
        if postalcode.id.is_empty() {
            return;
        }
        let Some(city) = self.get(&postalcode.id).first() else {
            return;
        };

        let previous = place.parents(Placetype::Locality).to_vec();
        place.clear_parent(Placetype::Locality);
        if let Err(err) =
            place.add_parent(Placetype::Locality, &city.name, &city.id, city.abbr.as_deref())
        {
            info!(
                target: SUSPECT_LOG_TARGET,
                "invalid postal city for {}: {err} (id={})",
                postalcode.id,
                place.gid()
            );
            for parent in previous {
                // Restores values that were already accepted once.
                let _restored =
                    place.add_parent(Placetype::Locality, &parent.name, &parent.id, parent.abbr.as_deref());
            }
        }
    }
}
