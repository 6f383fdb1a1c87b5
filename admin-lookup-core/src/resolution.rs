//! Resolver answers: candidate parents grouped by placetype.
//!
//! Resolvers speak a loose JSON dialect. A candidate's `name` may be a
//! single string or a list of localised names, and `id` may be a number or a
//! string. Both are normalised here so the merge logic only ever sees
//! `Vec<String>` names and string ids. Keys that do not name a known
//! [`Placetype`] are ignored.

use std::collections::BTreeMap;

use log::debug;
use serde::{Deserialize, Serialize, Serializer};

use crate::Placetype;

/// One candidate parent returned for a placetype.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "WireCandidate")]
pub struct Candidate {
    /// Names contributed by the candidate, in resolver order.
    #[serde(rename = "name")]
    pub names: Vec<String>,
    /// Resolver identifier; empty when the resolver omitted it.
    pub id: String,
    /// Optional abbreviation.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub abbr: Option<String>,
}

impl Candidate {
    /// Build a candidate with a single name.
    pub fn new(name: impl Into<String>, id: impl Into<String>) -> Self {
        Self {
            names: vec![name.into()],
            id: id.into(),
            abbr: None,
        }
    }

    /// Build a candidate contributing several names.
    pub fn with_names<I, S>(names: I, id: impl Into<String>) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            names: names.into_iter().map(Into::into).collect(),
            id: id.into(),
            abbr: None,
        }
    }

    /// Attach an abbreviation.
    #[must_use]
    pub fn abbr(mut self, abbr: impl Into<String>) -> Self {
        self.abbr = Some(abbr.into());
        self
    }

    /// First name, if any.
    pub fn primary_name(&self) -> Option<&str> {
        self.names.first().map(String::as_str)
    }
}

/// Candidate parents keyed by placetype.
///
/// Index 0 of every list is authoritative; further entries only signal an
/// ambiguous lookup. Keys that name no known placetype are dropped on
/// decode but still counted, so a response carrying only such keys is not
/// [`ResolutionResult::is_empty`].
///
/// # Examples
/// ```
/// use admin_lookup_core::{Placetype, ResolutionResult};
///
/// let result: ResolutionResult = serde_json::from_str(
///     r#"{"country": [{"name": "USA", "id": 1, "abbr": "US"}], "galaxy": []}"#,
/// )?;
/// let country = result.first(Placetype::Country).expect("country");
/// assert_eq!(country.id, "1");
/// assert_eq!(result.len(), 1);
/// assert_eq!(result.ignored_keys(), 1);
/// # Ok::<(), serde_json::Error>(())
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(from = "BTreeMap<String, Vec<Candidate>>")]
pub struct ResolutionResult {
    entries: BTreeMap<Placetype, Vec<Candidate>>,
    ignored_keys: usize,
}

impl ResolutionResult {
    /// Create an empty result.
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the candidates for `placetype`.
    pub fn insert(&mut self, placetype: Placetype, candidates: Vec<Candidate>) {
        self.entries.insert(placetype, candidates);
    }

    /// Builder-style [`ResolutionResult::insert`].
    #[must_use]
    pub fn with(mut self, placetype: Placetype, candidates: Vec<Candidate>) -> Self {
        self.insert(placetype, candidates);
        self
    }

    /// Candidates for `placetype`, empty when absent.
    pub fn candidates(&self, placetype: Placetype) -> &[Candidate] {
        self.entries.get(&placetype).map_or(&[], Vec::as_slice)
    }

    /// The authoritative candidate for `placetype`.
    pub fn first(&self, placetype: Placetype) -> Option<&Candidate> {
        self.candidates(placetype).first()
    }

    /// Whether `placetype` has at least one candidate.
    pub fn has_candidates(&self, placetype: Placetype) -> bool {
        !self.candidates(placetype).is_empty()
    }

    /// Whether the resolver returned no keys at all, known or not.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty() && self.ignored_keys == 0
    }

    /// Number of response keys that named no known placetype.
    pub fn ignored_keys(&self) -> usize {
        self.ignored_keys
    }

    /// Number of placetype keys present.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Placetypes holding more than one candidate.
    pub fn ambiguous_placetypes(&self) -> impl Iterator<Item = Placetype> + '_ {
        self.entries
            .iter()
            .filter(|(_, candidates)| candidates.len() > 1)
            .map(|(placetype, _)| *placetype)
    }

    /// Iterate over every placetype and its candidates.
    pub fn iter(&self) -> impl Iterator<Item = (Placetype, &[Candidate])> {
        self.entries
            .iter()
            .map(|(placetype, candidates)| (*placetype, candidates.as_slice()))
    }
}

impl FromIterator<(Placetype, Vec<Candidate>)> for ResolutionResult {
    fn from_iter<T: IntoIterator<Item = (Placetype, Vec<Candidate>)>>(iter: T) -> Self {
        Self {
            entries: iter.into_iter().collect(),
            ignored_keys: 0,
        }
    }
}

impl Serialize for ResolutionResult {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.entries.serialize(serializer)
    }
}

impl From<BTreeMap<String, Vec<Candidate>>> for ResolutionResult {
    fn from(raw: BTreeMap<String, Vec<Candidate>>) -> Self {
        let mut result = Self::new();
        for (key, candidates) in raw {
            match key.parse::<Placetype>() {
                Ok(placetype) => result.insert(placetype, candidates),
                Err(err) => {
                    debug!("ignoring resolver key: {err}");
                    result.ignored_keys += 1;
                }
            }
        }
        result
    }
}

#[derive(Deserialize)]
struct WireCandidate {
    #[serde(default)]
    name: Option<WireName>,
    #[serde(default)]
    id: Option<WireId>,
    #[serde(default)]
    abbr: Option<String>,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum WireName {
    Single(String),
    Many(Vec<String>),
}

#[derive(Deserialize)]
#[serde(untagged)]
enum WireId {
    Integer(i64),
    Float(f64),
    Text(String),
}

impl From<WireCandidate> for Candidate {
    fn from(wire: WireCandidate) -> Self {
        let names = match wire.name {
            Some(WireName::Single(name)) => vec![name],
            Some(WireName::Many(names)) => names,
            None => Vec::new(),
        };
        let id = match wire.id {
            Some(WireId::Integer(value)) => value.to_string(),
            Some(WireId::Float(value)) => value.to_string(),
            Some(WireId::Text(value)) => value,
            None => String::new(),
        };
        Self {
            names,
            id,
            abbr: wire.abbr,
        }
    }
}
