//! Map a place's layer onto the placetypes the resolver should consider.
//!
//! Admin layers query their own placetype plus everything coarser on the
//! same chain. Any other layer (`venue`, `address`, `street`, or a tag this
//! crate has never heard of) yields an empty filter, which resolvers treat as
//! "consider every placetype".

use crate::Placetype;

/// Admin chain from continent down to neighbourhood.
const ADMIN_CHAIN: [Placetype; 13] = [
    Placetype::Continent,
    Placetype::Empire,
    Placetype::Country,
    Placetype::Dependency,
    Placetype::Macroregion,
    Placetype::Region,
    Placetype::Macrocounty,
    Placetype::County,
    Placetype::Localadmin,
    Placetype::Locality,
    Placetype::Borough,
    Placetype::Macrohood,
    Placetype::Neighbourhood,
];

/// Select the placetypes a lookup should be restricted to.
///
/// Implementations must be pure and total: every layer string maps to a
/// (possibly empty) ordered set.
pub trait LayerMapper: Send + Sync {
    /// Return the placetype filter for `layer`, coarse to fine.
    fn layers_for(&self, layer: &str) -> Vec<Placetype>;
}

/// Default [`LayerMapper`] following the admin hierarchy.
///
/// # Examples
/// ```
/// use admin_lookup_core::{AdminLayerMapper, LayerMapper, Placetype};
///
/// let mapper = AdminLayerMapper;
/// assert_eq!(
///     mapper.layers_for("country"),
///     vec![Placetype::Continent, Placetype::Empire, Placetype::Country],
/// );
/// assert!(mapper.layers_for("venue").is_empty());
/// ```
#[derive(Debug, Default, Clone, Copy)]
pub struct AdminLayerMapper;

impl LayerMapper for AdminLayerMapper {
    fn layers_for(&self, layer: &str) -> Vec<Placetype> {
        let Ok(placetype) = layer.parse::<Placetype>() else {
            return Vec::new();
        };
        match placetype {
            Placetype::Postalcode => ADMIN_CHAIN
                .iter()
                .copied()
                .take_while(|candidate| *candidate <= Placetype::Locality)
                .chain(std::iter::once(Placetype::Postalcode))
                .collect(),
            Placetype::Ocean => vec![Placetype::Ocean],
            Placetype::Marinearea => vec![Placetype::Ocean, Placetype::Marinearea],
            admin => ADMIN_CHAIN
                .iter()
                .copied()
                .take_while(|candidate| *candidate <= admin)
                .collect(),
        }
    }
}
