//! Predicates selecting records of an index and the decoded fields of downloaded files.

use std::str::FromStr;

use log::debug;
use serde::{Deserialize, Serialize};

use crate::{errors::GfsFetchErr, extract::Field, index::Record, models::LevelType};

/// Short names a filter accepts.
///
/// A single string accepts every record whose lower-cased name is a substring of it, a list
/// accepts records whose lower-cased name equals one of its entries.
#[derive(Clone, Debug, PartialEq, Deserialize, Serialize)]
#[serde(untagged)]
pub enum ShortNames {
    /// Substring match.
    One(String),
    /// Membership match.
    Many(Vec<String>),
}

impl ShortNames {
    fn is_empty(&self) -> bool {
        match self {
            ShortNames::One(name) => name.is_empty(),
            ShortNames::Many(names) => names.iter().all(String::is_empty),
        }
    }

    /// True when the record name, lower cased, is in this set.
    pub fn contains(&self, record_name: &str) -> bool {
        let record_name = record_name.to_lowercase();

        match self {
            ShortNames::One(name) => name.to_lowercase().contains(&record_name),
            ShortNames::Many(names) => names.iter().any(|nm| nm.to_lowercase() == record_name),
        }
    }
}

impl From<&str> for ShortNames {
    fn from(name: &str) -> Self {
        ShortNames::One(name.to_owned())
    }
}

impl From<Vec<&str>> for ShortNames {
    fn from(names: Vec<&str>) -> Self {
        ShortNames::Many(names.into_iter().map(ToOwned::to_owned).collect())
    }
}

/// A wanted field, as given in the `parameter` list of the configuration.
#[derive(Clone, Debug, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Filter {
    /// Required.
    pub short_name: ShortNames,
    /// Level type, either a GRIB key such as `heightAboveGround` or text of the index.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub type_of_level: Option<String>,
    /// Level value, only allowed together with `type_of_level`. Numbers are taken as text.
    #[serde(
        default,
        deserialize_with = "crate::config::text_or_number",
        skip_serializing_if = "Option::is_none"
    )]
    pub level: Option<String>,
    /// Accepted validity substrings, e.g. `anl` or `fcst`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub validity: Option<Vec<String>>,
    /// Statistical processing of a decoded field, `instant`, `avg`, `accum`. Index records carry
    /// none, so only extraction looks at it.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub step_type: Option<String>,
}

impl Filter {
    /// Filter on short name only.
    pub fn new<T: Into<ShortNames>>(short_name: T) -> Self {
        Filter {
            short_name: short_name.into(),
            type_of_level: None,
            level: None,
            validity: None,
            step_type: None,
        }
    }

    /// Restrict to a level type.
    pub fn with_type_of_level<T: Into<String>>(self, type_of_level: T) -> Self {
        Filter {
            type_of_level: Some(type_of_level.into()),
            ..self
        }
    }

    /// Restrict to a level, requires a level type too.
    pub fn with_level<T: Into<String>>(self, level: T) -> Self {
        Filter {
            level: Some(level.into()),
            ..self
        }
    }

    /// Restrict to validity substrings.
    pub fn with_validity(self, validity: &[&str]) -> Self {
        Filter {
            validity: Some(validity.iter().map(|&v| v.to_owned()).collect()),
            ..self
        }
    }

    /// Check the required fields are present.
    pub fn validate(&self) -> Result<(), GfsFetchErr> {
        if self.short_name.is_empty() {
            return Err(GfsFetchErr::MalformedFilter("shortName must not be empty"));
        }

        if self.level.is_some() && self.type_of_level.is_none() {
            return Err(GfsFetchErr::MalformedFilter(
                "typeOfLevel must not be empty when level is given",
            ));
        }

        Ok(())
    }

    /// Test a record. `default_validity` applies when the filter carries no validity of its own.
    pub fn matches(&self, record: &Record, default_validity: &[String]) -> bool {
        if !self.short_name.contains(record.short_name()) {
            return false;
        }

        if let Some(ref type_of_level) = self.type_of_level {
            let phrase = LevelType::from_str(type_of_level)
                .map(LevelType::idx_phrase)
                .unwrap_or(type_of_level.as_str());

            if !record.level().contains(phrase) {
                return false;
            }

            if let Some(ref level) = self.level {
                if !record.level().contains(level.as_str()) {
                    return false;
                }
            }
        }

        let validity: &[String] = self.validity.as_deref().unwrap_or(default_validity);
        validity.is_empty() || validity.iter().any(|v| record.validity().contains(v.as_str()))
    }

    /// Test a decoded field. Level type and level are compared as GRIB keys, validity is a
    /// property of index records and not looked at.
    pub fn selects(&self, field: &Field) -> bool {
        if !self.short_name.contains(&field.short_name) {
            return false;
        }

        let same = |wanted: &Option<String>, actual: &str| {
            wanted.as_deref().map(|w| w == actual).unwrap_or(true)
        };

        same(&self.type_of_level, &field.type_of_level)
            && same(&self.level, &field.level)
            && same(&self.step_type, &field.step_type)
    }
}

/// Validate every filter, before anything goes out on the network.
pub fn validate_all(filters: &[Filter]) -> Result<(), GfsFetchErr> {
    filters.iter().try_for_each(Filter::validate)
}

/// All records of `records` matched by any filter, in record order.
pub(crate) fn matching<'a>(
    records: &'a [Record],
    filters: &'a [Filter],
    default_validity: &'a [String],
) -> impl Iterator<Item = &'a Record> + 'a {
    records
        .iter()
        .flat_map(move |rec| {
            filters
                .iter()
                .filter(move |flt| flt.matches(rec, default_validity))
                .map(move |_| rec)
        })
        .inspect(|rec| {
            debug!(
                "{}:{}:{}:{}",
                rec.issued().format("%Y%m%d%H"),
                rec.short_name(),
                rec.level(),
                rec.validity()
            )
        })
}

#[cfg(test)]
mod unit {
    use super::*;
    use crate::index::FileIndex;

    fn record(short_name: &str, level: &str, validity: &str) -> Record {
        let text = format!("1:0:d=2025012306:{}:{}:{}:\n", short_name, level, validity);
        FileIndex::parse("u", &text, 10).unwrap().records()[0].clone()
    }

    #[test]
    fn test_height_above_ground() {
        let flt = Filter::new(vec!["2t"])
            .with_type_of_level("heightAboveGround")
            .with_level("2");

        assert!(flt.matches(&record("2t", "2 m above ground", "anl"), &[]));
        assert!(!flt.matches(&record("2t", "10 m above ground", "anl"), &[]));
        assert!(!flt.matches(&record("2t", "surface", "anl"), &[]));
    }

    #[test]
    fn test_record_in_filter_polarity() {
        // Record name has to be inside the filter's name, not the other way around.
        let flt = Filter::new("tmp,ugrd");
        assert!(flt.matches(&record("TMP", "surface", "anl"), &[]));
        assert!(flt.matches(&record("UGRD", "surface", "anl"), &[]));
        assert!(!flt.matches(&record("TMPX", "surface", "anl"), &[]));

        let flt = Filter::new(vec!["tmp", "ugrd"]);
        assert!(flt.matches(&record("Tmp", "surface", "anl"), &[]));
        assert!(!flt.matches(&record("TM", "surface", "anl"), &[]));
    }

    #[test]
    fn test_raw_type_of_level() {
        let flt = Filter::new("prmsl").with_type_of_level("mean sea");
        assert!(flt.matches(&record("PRMSL", "mean sea level", "anl"), &[]));
    }

    #[test]
    fn test_validity() {
        let fcst = record("TMP", "surface", "3 hour fcst");
        let anl = record("TMP", "surface", "anl");

        let flt = Filter::new("tmp");
        let default = vec!["fcst".to_owned()];
        assert!(flt.matches(&fcst, &default));
        assert!(!flt.matches(&anl, &default));

        let flt = flt.with_validity(&["anl", "xyz"]);
        assert!(flt.matches(&anl, &default));
        assert!(!flt.matches(&fcst, &default));
    }

    #[test]
    fn test_validate() {
        assert!(Filter::new("tmp").validate().is_ok());
        assert!(Filter::new("tmp").with_type_of_level("surface").validate().is_ok());

        match Filter::new("").validate() {
            Err(GfsFetchErr::MalformedFilter(_)) => {}
            res => panic!("unexpected {:?}", res),
        }
        match Filter::new(Vec::<&str>::new()).validate() {
            Err(GfsFetchErr::MalformedFilter(_)) => {}
            res => panic!("unexpected {:?}", res),
        }
        match Filter::new("tmp").with_level("2").validate() {
            Err(GfsFetchErr::MalformedFilter(_)) => {}
            res => panic!("unexpected {:?}", res),
        }
    }

    #[test]
    fn test_deserialize() {
        let flt: Filter = serde_json::from_str(
            r#"{"shortName": ["2t", "tmp"], "typeOfLevel": "heightAboveGround", "level": 2}"#,
        )
        .unwrap();
        assert_eq!(flt.level.as_deref(), Some("2"));
        assert_eq!(flt.short_name, ShortNames::from(vec!["2t", "tmp"]));

        let flt: Filter = serde_json::from_str(r#"{"shortName": "tmp"}"#).unwrap();
        assert_eq!(flt.short_name, ShortNames::One("tmp".to_owned()));
        assert!(flt.level.is_none());
    }

    #[test]
    fn test_selects_field() {
        use chrono::NaiveDate;

        let issued = NaiveDate::from_ymd_opt(2025, 1, 23)
            .unwrap()
            .and_hms_opt(6, 0, 0)
            .unwrap();
        let precip = Field {
            name: "Total Precipitation".to_owned(),
            short_name: "tp".to_owned(),
            units: "kg m**-2".to_owned(),
            step_type: "accum".to_owned(),
            type_of_level: "surface".to_owned(),
            level: "0".to_owned(),
            issued,
            valid: issued,
            lats: vec![],
            lons: vec![],
            values: vec![],
        };

        assert!(Filter::new("tp").selects(&precip));
        assert!(!Filter::new("2t").selects(&precip));

        let accum = Filter {
            step_type: Some("accum".to_owned()),
            ..Filter::new("tp")
        };
        assert!(accum.selects(&precip));

        let avg = Filter {
            step_type: Some("avg".to_owned()),
            ..Filter::new("tp")
        };
        assert!(!avg.selects(&precip));

        assert!(Filter::new("tp").with_type_of_level("surface").with_level("0").selects(&precip));
        assert!(!Filter::new("tp").with_type_of_level("meanSea").selects(&precip));

        // Validity only applies to index records.
        assert!(Filter::new("tp").with_validity(&["anl"]).selects(&precip));
    }
}
