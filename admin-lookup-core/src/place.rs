//! Place records carried through the lookup pipeline.

use std::collections::BTreeMap;

use geo::Coord;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::Placetype;

/// One administrative parent attached to a place.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Parent {
    /// Display name of the parent.
    pub name: String,
    /// Resolver identifier. Empty for synthesised parents.
    pub id: String,
    /// Optional abbreviation, e.g. `"US"`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub abbr: Option<String>,
}

/// Errors returned by [`Place::add_parent`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParentError {
    /// The parent name was empty or only whitespace.
    #[error("{placetype} parent name must not be empty")]
    EmptyName {
        /// Slot the parent was destined for.
        placetype: Placetype,
    },
    /// The place does not carry a slot for this placetype.
    #[error("place does not support {placetype} parents")]
    UnsupportedPlacetype {
        /// Slot the parent was destined for.
        placetype: Placetype,
    },
}

/// A geographic record awaiting (or carrying) its admin hierarchy.
///
/// Coordinates are WGS84 with `x = longitude` and `y = latitude`; on the wire
/// the centroid is written as `{"lat": .., "lon": ..}`. Fields this crate does
/// not interpret are kept in [`Place::properties`] so records survive the
/// pipeline unchanged.
///
/// # Examples
/// ```
/// use geo::Coord;
/// use admin_lookup_core::{Place, Placetype};
///
/// let mut place = Place::new("wof:venue:1", "venue")
///     .with_centroid(Coord { x: -122.4, y: 37.7 })
///     .with_parent_fields([Placetype::Country, Placetype::Locality]);
///
/// place.add_parent(Placetype::Country, "USA", "85633793", Some("US"))?;
/// assert_eq!(place.parents(Placetype::Country)[0].name, "USA");
/// # Ok::<(), admin_lookup_core::ParentError>(())
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Place {
    gid: String,
    layer: String,
    #[serde(
        default,
        with = "centroid_serde",
        skip_serializing_if = "Option::is_none"
    )]
    centroid: Option<Coord<f64>>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    parent_fields: Vec<Placetype>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    parents: BTreeMap<Placetype, Vec<Parent>>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    address: BTreeMap<String, String>,
    /// Attributes passed through untouched.
    #[serde(flatten)]
    pub properties: BTreeMap<String, serde_json::Value>,
}

impl Place {
    /// Construct a place without a centroid or parent slots.
    pub fn new(gid: impl Into<String>, layer: impl Into<String>) -> Self {
        Self {
            gid: gid.into(),
            layer: layer.into(),
            centroid: None,
            parent_fields: Vec::new(),
            parents: BTreeMap::new(),
            address: BTreeMap::new(),
            properties: BTreeMap::new(),
        }
    }

    /// Attach a centroid.
    #[must_use]
    pub fn with_centroid(mut self, centroid: Coord<f64>) -> Self {
        self.centroid = Some(centroid);
        self
    }

    /// Declare the placetypes this place may carry parents for.
    #[must_use]
    pub fn with_parent_fields(mut self, fields: impl IntoIterator<Item = Placetype>) -> Self {
        self.parent_fields = fields.into_iter().collect();
        self
    }

    /// Global identifier.
    pub fn gid(&self) -> &str {
        &self.gid
    }

    /// Layer tag, e.g. `"venue"` or `"locality"`.
    pub fn layer(&self) -> &str {
        &self.layer
    }

    /// Centroid, if one was supplied.
    pub fn centroid(&self) -> Option<Coord<f64>> {
        self.centroid
    }

    /// Whether the centroid is present and both coordinates are finite.
    pub fn has_centroid(&self) -> bool {
        self.centroid
            .is_some_and(|coord| coord.x.is_finite() && coord.y.is_finite())
    }

    /// Placetypes this place supports, in declaration order.
    pub fn parent_fields(&self) -> &[Placetype] {
        &self.parent_fields
    }

    /// Whether `placetype` is one of [`Place::parent_fields`].
    pub fn supports(&self, placetype: Placetype) -> bool {
        self.parent_fields.contains(&placetype)
    }

    /// Add a parent to the `placetype` slot.
    ///
    /// Repeated calls with the same name and id are ignored, so a slot never
    /// holds duplicates.
    ///
    /// # Errors
    ///
    /// Returns [`ParentError::EmptyName`] for blank names and
    /// [`ParentError::UnsupportedPlacetype`] when the place has no such slot.
    pub fn add_parent(
        &mut self,
        placetype: Placetype,
        name: &str,
        id: &str,
        abbr: Option<&str>,
    ) -> Result<(), ParentError> {
        if !self.supports(placetype) {
            return Err(ParentError::UnsupportedPlacetype { placetype });
        }
        let name = name.trim();
        if name.is_empty() {
            return Err(ParentError::EmptyName { placetype });
        }

        let slot = self.parents.entry(placetype).or_default();
        if slot.iter().any(|parent| parent.name == name && parent.id == id) {
            return Ok(());
        }
        slot.push(Parent {
            name: name.to_owned(),
            id: id.to_owned(),
            abbr: abbr.filter(|value| !value.is_empty()).map(str::to_owned),
        });
        Ok(())
    }

    /// Remove every parent in the `placetype` slot.
    pub fn clear_parent(&mut self, placetype: Placetype) {
        self.parents.remove(&placetype);
    }

    /// Parents currently held in the `placetype` slot.
    pub fn parents(&self, placetype: Placetype) -> &[Parent] {
        self.parents.get(&placetype).map_or(&[], Vec::as_slice)
    }

    /// Placetypes that currently hold at least one parent.
    pub fn assigned_placetypes(&self) -> impl Iterator<Item = Placetype> + '_ {
        self.parents
            .iter()
            .filter(|(_, parents)| !parents.is_empty())
            .map(|(placetype, _)| *placetype)
    }

    /// Set an address component such as `"zip"`.
    pub fn set_address(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.address.insert(key.into(), value.into());
    }

    /// Read an address component.
    pub fn address(&self, key: &str) -> Option<&str> {
        self.address.get(key).map(String::as_str)
    }
}

/// `{lat, lon}` representation of the centroid. A missing or partial object
/// counts as no centroid at all.
mod centroid_serde {
    use geo::Coord;
    use serde::{Deserialize, Deserializer, Serialize, Serializer};

    #[derive(Serialize, Deserialize)]
    struct LatLon {
        #[serde(default)]
        lat: Option<f64>,
        #[serde(default)]
        lon: Option<f64>,
    }

    pub(super) fn serialize<S>(value: &Option<Coord<f64>>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        value
            .map(|coord| LatLon {
                lat: Some(coord.y),
                lon: Some(coord.x),
            })
            .serialize(serializer)
    }

    pub(super) fn deserialize<'de, D>(deserializer: D) -> Result<Option<Coord<f64>>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = Option::<LatLon>::deserialize(deserializer)?;
        Ok(raw.and_then(|LatLon { lat, lon }| Some(Coord { x: lon?, y: lat? })))
    }
}
