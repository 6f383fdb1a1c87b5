//! Decide what happens to a place once its lookup has settled.
//!
//! The policy drops or passes places without a usable hierarchy, fills in
//! a configured default country, reports suspect results, and merges the
//! authoritative candidates into the place. None of its decisions fail: bad
//! values are logged under [`SUSPECT_LOG_TARGET`] and skipped.

use log::{error, info};

use crate::{Candidate, ParentError, Place, Placetype, ResolutionResult};

/// Log target for suspect-record diagnostics.
///
/// Route this target to its own sink to collect places whose hierarchy
/// looks incomplete or ambiguous.
pub const SUSPECT_LOG_TARGET: &str = "admin_lookup::suspect";

/// Address key receiving the resolved postal code.
pub const ZIP_ADDRESS_KEY: &str = "zip";

/// Whether a place continues downstream.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Disposition {
    /// Hand the place to the next stage.
    Emit,
    /// Discard the place.
    Drop,
}

/// Country used when the resolver finds none.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DefaultCountry {
    /// Country name, e.g. `"United States"`.
    pub name: String,
    /// Optional abbreviation, e.g. `"USA"`.
    pub abbr: Option<String>,
}

/// Behaviour when a result carries no country.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum MissingCountry {
    /// Only log the condition.
    #[default]
    LogOnly,
    /// Log, then synthesise a country parent with an empty id.
    Substitute(DefaultCountry),
}

/// Merge rules applied to every place.
///
/// # Examples
/// ```
/// use geo::Coord;
/// use admin_lookup_core::{
///     Candidate, Disposition, EnrichmentPolicy, Place, Placetype, ResolutionResult,
/// };
///
/// let policy = EnrichmentPolicy::default();
/// let mut place = Place::new("g1", "venue")
///     .with_centroid(Coord { x: -122.4, y: 37.7 })
///     .with_parent_fields([Placetype::Country]);
/// let mut result = ResolutionResult::new()
///     .with(Placetype::Country, vec![Candidate::new("USA", "1").abbr("US")]);
///
/// assert_eq!(policy.apply(&mut place, &mut result), Disposition::Emit);
/// assert_eq!(place.parents(Placetype::Country)[0].name, "USA");
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EnrichmentPolicy {
    /// Drop places lacking a centroid or any resolved hierarchy.
    pub drop_unmapped: bool,
    /// Missing-country behaviour.
    pub missing_country: MissingCountry,
}

impl EnrichmentPolicy {
    /// True iff the place has no usable centroid.
    pub fn should_bypass_lookup(&self, place: &Place) -> bool {
        !place.has_centroid()
    }

    /// Fate of a place that skipped the lookup.
    pub const fn on_bypass(&self) -> Disposition {
        if self.drop_unmapped {
            Disposition::Drop
        } else {
            Disposition::Emit
        }
    }

    /// Log a failed lookup. The place is always dropped.
    pub fn on_lookup_error(&self, place: &Place, err: &dyn std::error::Error) -> Disposition {
        let (lat, lon) = lat_lon(place);
        error!("PIP server failed: {err} (id={}, lat={lat}, lon={lon})", place.gid());
        Disposition::Drop
    }

    /// Drop places whose response carried no keys at all when configured to.
    pub fn on_empty_result(&self, place: &Place, result: &ResolutionResult) -> Disposition {
        if self.drop_unmapped && result.is_empty() {
            let (lat, lon) = lat_lon(place);
            info!(
                target: SUSPECT_LOG_TARGET,
                "zero admins (id={}, lat={lat}, lon={lon})",
                place.gid()
            );
            return Disposition::Drop;
        }
        Disposition::Emit
    }

    /// Report a missing country and substitute the default if configured.
    ///
    /// Returns `true` when a synthetic country was inserted.
    pub fn default_country_fallback(&self, result: &mut ResolutionResult, place: &Place) -> bool {
        if result.has_candidates(Placetype::Country) {
            return false;
        }
        let (lat, lon) = lat_lon(place);
        info!(
            target: SUSPECT_LOG_TARGET,
            "no country (id={}, lat={lat}, lon={lon})",
            place.gid()
        );
        let MissingCountry::Substitute(country) = &self.missing_country else {
            return false;
        };
        let mut candidate = Candidate::new(country.name.clone(), String::new());
        candidate.abbr.clone_from(&country.abbr);
        result.insert(Placetype::Country, vec![candidate]);
        true
    }

    /// Log results where any placetype has several candidates.
    pub fn diagnose_multiple_values(&self, result: &ResolutionResult, place: &Place) -> bool {
        let ambiguous: Vec<&str> = result
            .ambiguous_placetypes()
            .map(Placetype::as_str)
            .collect();
        if ambiguous.is_empty() {
            return false;
        }
        let (lat, lon) = lat_lon(place);
        info!(
            target: SUSPECT_LOG_TARGET,
            "multiple values for {} (id={}, lat={lat}, lon={lon})",
            ambiguous.join(","),
            place.gid()
        );
        true
    }

    /// Attach the first candidate of every supported placetype.
    ///
    /// A candidate contributing several names adds one parent per name. A
    /// rejected value clears that placetype's slot and merging moves on to
    /// the next placetype. The rejections are returned for accounting.
    pub fn merge_hierarchy(&self, place: &mut Place, result: &ResolutionResult) -> Vec<ParentError> {
        let fields = place.parent_fields().to_vec();
        let mut rejected = Vec::new();
        for placetype in fields {
            let Some(candidate) = result.first(placetype) else {
                continue;
            };
            if let Err(err) = add_candidate(place, placetype, candidate) {
                let (lat, lon) = lat_lon(place);
                info!(
                    target: SUSPECT_LOG_TARGET,
                    "invalid value for {placetype}: {err} (id={}, lat={lat}, lon={lon}, candidate={candidate:?})",
                    place.gid()
                );
                place.clear_parent(placetype);
                rejected.push(err);
            }
        }
        rejected
    }

    /// Copy the postal code into the `zip` address field.
    ///
    /// Returns `true` when the field was set.
    pub fn merge_postal_code(&self, place: &mut Place, result: &ResolutionResult) -> bool {
        let Some(postalcode) = result
            .first(Placetype::Postalcode)
            .and_then(Candidate::primary_name)
            .filter(|name| !name.is_empty())
        else {
            return false;
        };
        place.set_address(ZIP_ADDRESS_KEY, postalcode);
        true
    }

    /// Run every post-lookup rule in order.
    ///
    /// `result` may gain a synthetic country, so later policies see the
    /// same hierarchy the place received.
    pub fn apply(&self, place: &mut Place, result: &mut ResolutionResult) -> Disposition {
        if self.on_empty_result(place, result) == Disposition::Drop {
            return Disposition::Drop;
        }
        self.default_country_fallback(result, place);
        self.diagnose_multiple_values(result, place);
        self.merge_hierarchy(place, result);
        self.merge_postal_code(place, result);
        Disposition::Emit
    }
}

fn add_candidate(
    place: &mut Place,
    placetype: Placetype,
    candidate: &Candidate,
) -> Result<(), ParentError> {
    if candidate.names.is_empty() {
        return Err(ParentError::EmptyName { placetype });
    }
    for name in &candidate.names {
        place.add_parent(placetype, name, &candidate.id, candidate.abbr.as_deref())?;
    }
    Ok(())
}

fn lat_lon(place: &Place) -> (f64, f64) {
    place
        .centroid()
        .map_or((f64::NAN, f64::NAN), |coord| (coord.y, coord.x))
}

#[cfg(test)]
mod tests {
    use super::*;
    use geo::Coord;
    use rstest::{fixture, rstest};

    #[fixture]
    fn place() -> Place {
        Place::new("osm:venue:1", "venue")
            .with_centroid(Coord { x: -122.4, y: 37.7 })
            .with_parent_fields([
                Placetype::Country,
                Placetype::Region,
                Placetype::Locality,
                Placetype::Postalcode,
            ])
    }

    #[fixture]
    fn substituting() -> EnrichmentPolicy {
        EnrichmentPolicy {
            drop_unmapped: false,
            missing_country: MissingCountry::Substitute(DefaultCountry {
                name: "United States".into(),
                abbr: Some("USA".into()),
            }),
        }
    }

    #[rstest]
    #[case(true, Disposition::Drop)]
    #[case(false, Disposition::Emit)]
    fn bypass_follows_drop_unmapped(#[case] drop_unmapped: bool, #[case] expected: Disposition) {
        let policy = EnrichmentPolicy {
            drop_unmapped,
            ..EnrichmentPolicy::default()
        };
        assert_eq!(policy.on_bypass(), expected);
    }

    #[rstest]
    fn bypasses_places_without_centroid() {
        let policy = EnrichmentPolicy::default();
        assert!(policy.should_bypass_lookup(&Place::new("g", "venue")));
    }

    #[rstest]
    #[case(true, Disposition::Drop)]
    #[case(false, Disposition::Emit)]
    fn empty_result_is_policy_gated(
        place: Place,
        #[case] drop_unmapped: bool,
        #[case] expected: Disposition,
    ) {
        let policy = EnrichmentPolicy {
            drop_unmapped,
            ..EnrichmentPolicy::default()
        };
        assert_eq!(policy.on_empty_result(&place, &ResolutionResult::new()), expected);
    }

    #[rstest]
    fn unknown_keys_alone_do_not_count_as_unmapped(place: Place) {
        let policy = EnrichmentPolicy {
            drop_unmapped: true,
            ..EnrichmentPolicy::default()
        };
        let result: ResolutionResult =
            serde_json::from_str(r#"{"timezone": []}"#).expect("should parse");
        assert_eq!(policy.on_empty_result(&place, &result), Disposition::Emit);
    }

    #[rstest]
    fn lookup_errors_always_drop(place: Place) {
        let err = crate::ResolverError::Closed;
        assert_eq!(
            EnrichmentPolicy::default().on_lookup_error(&place, &err),
            Disposition::Drop
        );
    }

    #[rstest]
    fn log_only_leaves_country_missing(mut place: Place) {
        let policy = EnrichmentPolicy::default();
        let mut result = ResolutionResult::new()
            .with(Placetype::Locality, vec![Candidate::new("SF", "2")]);

        assert_eq!(policy.apply(&mut place, &mut result), Disposition::Emit);
        assert!(place.parents(Placetype::Country).is_empty());
        assert_eq!(place.parents(Placetype::Locality)[0].name, "SF");
    }

    #[rstest]
    fn substitutes_default_country_with_sentinel_id(
        substituting: EnrichmentPolicy,
        mut place: Place,
    ) {
        let mut result = ResolutionResult::new()
            .with(Placetype::Locality, vec![Candidate::new("SF", "2")]);

        assert_eq!(substituting.apply(&mut place, &mut result), Disposition::Emit);
        let country = &place.parents(Placetype::Country)[0];
        assert_eq!(country.name, "United States");
        assert_eq!(country.id, "");
        assert_eq!(country.abbr.as_deref(), Some("USA"));
    }

    #[rstest]
    fn resolved_country_is_not_replaced(substituting: EnrichmentPolicy, mut place: Place) {
        let mut result = ResolutionResult::new().with(
            Placetype::Country,
            vec![Candidate::new("Canada", "85633041").abbr("CAN")],
        );
        assert!(!substituting.default_country_fallback(&mut result, &place));
        substituting.merge_hierarchy(&mut place, &result);
        assert_eq!(place.parents(Placetype::Country)[0].name, "Canada");
    }

    #[rstest]
    fn multiple_names_add_one_parent_each(mut place: Place) {
        let result = ResolutionResult::new().with(
            Placetype::Region,
            vec![Candidate::with_names(["Québec", "Quebec", "Kebek"], "136251273").abbr("QC")],
        );
        let rejected = EnrichmentPolicy::default().merge_hierarchy(&mut place, &result);

        assert!(rejected.is_empty());
        let regions = place.parents(Placetype::Region);
        assert_eq!(regions.len(), 3);
        assert!(regions
            .iter()
            .all(|parent| parent.id == "136251273" && parent.abbr.as_deref() == Some("QC")));
    }

    #[rstest]
    fn only_first_candidate_is_merged(mut place: Place) {
        let result = ResolutionResult::new().with(
            Placetype::Locality,
            vec![Candidate::new("SF", "2"), Candidate::new("Daly City", "3")],
        );
        let policy = EnrichmentPolicy::default();
        assert!(policy.diagnose_multiple_values(&result, &place));
        policy.merge_hierarchy(&mut place, &result);
        assert_eq!(place.parents(Placetype::Locality).len(), 1);
        assert_eq!(place.parents(Placetype::Locality)[0].name, "SF");
    }

    #[rstest]
    fn invalid_value_skips_only_that_placetype(mut place: Place) {
        let result = ResolutionResult::new()
            .with(Placetype::Country, vec![Candidate::new("USA", "1")])
            .with(Placetype::Region, vec![Candidate::new("", "4")])
            .with(Placetype::Locality, vec![Candidate::new("SF", "2")]);

        let rejected = EnrichmentPolicy::default().merge_hierarchy(&mut place, &result);

        assert_eq!(
            rejected,
            vec![ParentError::EmptyName {
                placetype: Placetype::Region
            }]
        );
        assert!(place.parents(Placetype::Region).is_empty());
        assert_eq!(place.parents(Placetype::Country).len(), 1);
        assert_eq!(place.parents(Placetype::Locality).len(), 1);
    }

    #[rstest]
    fn partially_invalid_names_leave_slot_unset(mut place: Place) {
        let result = ResolutionResult::new().with(
            Placetype::Region,
            vec![Candidate::with_names(["California", ""], "85688637")],
        );
        let rejected = EnrichmentPolicy::default().merge_hierarchy(&mut place, &result);
        assert_eq!(rejected.len(), 1);
        assert!(place.parents(Placetype::Region).is_empty());
    }

    #[rstest]
    fn unsupported_placetypes_are_ignored(mut place: Place) {
        let result = ResolutionResult::new()
            .with(Placetype::Neighbourhood, vec![Candidate::new("Mission", "5")]);
        let rejected = EnrichmentPolicy::default().merge_hierarchy(&mut place, &result);
        assert!(rejected.is_empty());
        assert_eq!(place.assigned_placetypes().count(), 0);
    }

    #[rstest]
    #[case("94103", Some("94103"))]
    #[case("", None)]
    fn postal_code_sets_zip(mut place: Place, #[case] name: &str, #[case] zip: Option<&str>) {
        let result = ResolutionResult::new()
            .with(Placetype::Postalcode, vec![Candidate::new(name, "")]);
        EnrichmentPolicy::default().merge_postal_code(&mut place, &result);
        assert_eq!(place.address(ZIP_ADDRESS_KEY), zip);
    }

    mod diagnostics {
        use super::*;
        use log::{Level, LevelFilter, Log, Metadata, Record};
        use std::sync::{Mutex, Once, PoisonError};

        #[derive(Debug, Clone)]
        struct Captured {
            target: String,
            level: Level,
            message: String,
        }

        struct CaptureLogger {
            records: Mutex<Vec<Captured>>,
        }

        impl Log for CaptureLogger {
            fn enabled(&self, _metadata: &Metadata<'_>) -> bool {
                true
            }

            fn log(&self, record: &Record<'_>) {
                self.records
                    .lock()
                    .unwrap_or_else(PoisonError::into_inner)
                    .push(Captured {
                        target: record.target().to_owned(),
                        level: record.level(),
                        message: record.args().to_string(),
                    });
            }

            fn flush(&self) {}
        }

        static LOGGER: CaptureLogger = CaptureLogger {
            records: Mutex::new(Vec::new()),
        };
        static INSTALL: Once = Once::new();

        /// The logger is process-wide, so each test uses its own gid and
        /// reads back only the records naming it.
        fn install_logger() {
            INSTALL.call_once(|| {
                log::set_logger(&LOGGER).expect("logger installs once");
                log::set_max_level(LevelFilter::Trace);
            });
        }

        fn logged_for(gid: &str) -> Vec<Captured> {
            install_logger();
            let needle = format!("id={gid},");
            LOGGER
                .records
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .iter()
                .filter(|record| record.message.contains(&needle))
                .cloned()
                .collect()
        }

        fn venue(gid: &str) -> Place {
            install_logger();
            Place::new(gid, "venue")
                .with_centroid(Coord {
                    x: -122.4194,
                    y: 37.7749,
                })
                .with_parent_fields([Placetype::Country, Placetype::Region, Placetype::Locality])
        }

        fn single_record(gid: &str) -> Captured {
            let records = logged_for(gid);
            assert_eq!(records.len(), 1, "expected one record for {gid}: {records:?}");
            records.into_iter().next().expect("one record")
        }

        fn assert_locates_place(record: &Captured, gid: &str) {
            assert!(record.message.contains(&format!("id={gid}")), "{record:?}");
            assert!(record.message.contains("lat=37.7749"), "{record:?}");
            assert!(record.message.contains("lon=-122.4194"), "{record:?}");
        }

        #[rstest]
        fn lookup_failure_is_an_error_naming_place_and_centroid() {
            let gid = "diag:venue:lookup-failure";
            let err = crate::ResolverError::Http {
                url: "http://localhost:3102/-122.4194/37.7749".into(),
                status: 500,
                message: "internal server error".into(),
            };

            EnrichmentPolicy::default().on_lookup_error(&venue(gid), &err);

            let record = single_record(gid);
            assert_eq!(record.level, Level::Error);
            assert_ne!(record.target, SUSPECT_LOG_TARGET);
            assert!(record.message.starts_with("PIP server failed"), "{record:?}");
            assert!(record.message.contains("status 500"), "{record:?}");
            assert_locates_place(&record, gid);
        }

        #[rstest]
        fn zero_admins_is_a_suspect_record() {
            let gid = "diag:venue:zero-admins";
            let policy = EnrichmentPolicy {
                drop_unmapped: true,
                ..EnrichmentPolicy::default()
            };

            policy.on_empty_result(&venue(gid), &ResolutionResult::new());

            let record = single_record(gid);
            assert_eq!(record.target, SUSPECT_LOG_TARGET);
            assert_eq!(record.level, Level::Info);
            assert!(record.message.starts_with("zero admins"), "{record:?}");
            assert_locates_place(&record, gid);
        }

        #[rstest]
        fn missing_country_is_a_suspect_record() {
            let gid = "diag:venue:no-country";
            let mut place = venue(gid);
            let mut result = ResolutionResult::new()
                .with(Placetype::Locality, vec![Candidate::new("SF", "2")]);

            EnrichmentPolicy::default().apply(&mut place, &mut result);

            let record = single_record(gid);
            assert_eq!(record.target, SUSPECT_LOG_TARGET);
            assert!(record.message.starts_with("no country"), "{record:?}");
            assert_locates_place(&record, gid);
        }

        #[rstest]
        fn multiple_values_is_a_suspect_record() {
            let gid = "diag:venue:multiple-values";
            let result = ResolutionResult::new()
                .with(Placetype::Country, vec![Candidate::new("USA", "1")])
                .with(
                    Placetype::Locality,
                    vec![Candidate::new("SF", "2"), Candidate::new("Daly City", "3")],
                );

            EnrichmentPolicy::default().diagnose_multiple_values(&result, &venue(gid));

            let record = single_record(gid);
            assert_eq!(record.target, SUSPECT_LOG_TARGET);
            assert!(record.message.starts_with("multiple values for locality"), "{record:?}");
            assert_locates_place(&record, gid);
        }

        #[rstest]
        fn invalid_value_is_a_suspect_record() {
            let gid = "diag:venue:invalid-value";
            let mut place = venue(gid);
            let result = ResolutionResult::new()
                .with(Placetype::Country, vec![Candidate::new("USA", "1")])
                .with(Placetype::Region, vec![Candidate::new("", "4")]);

            EnrichmentPolicy::default().merge_hierarchy(&mut place, &result);

            let record = single_record(gid);
            assert_eq!(record.target, SUSPECT_LOG_TARGET);
            assert!(record.message.starts_with("invalid value for region"), "{record:?}");
            assert_locates_place(&record, gid);
        }
    }
}
