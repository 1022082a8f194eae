//! Recognition parameters: a fixed key schema with defaults and ranges.
//!
//! [`Params`] is an immutable value. Changes produce a new value through
//! [`Params::with`] or [`Params::with_overrides`], so a board's live
//! parameters never alias a caller's scratch map.
//!
//! On disk the parameters are a flat JSON object keyed by the upper snake
//! case names (`"CANNY_MINVAL": 50`), written in sorted key order.
//! `BOARD_SIZE` may be `null`, meaning the board size is auto-detected.

use crate::io::{self, PersistError};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use std::fmt;
use std::path::Path;
use std::str::FromStr;

/// Errors raised when setting a parameter in code.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum ParamError {
    #[error("unknown parameter `{0}`")]
    UnknownKey(String),
    #[error("parameter {0} does not accept an automatic value")]
    AutoNotAllowed(ParamKey),
}

/// Known recognition parameters.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum ParamKey {
    CannyMinval,
    CannyMaxval,
    CannyAperture,
    HoughThreshold,
    HoughMinLinelen,
    HoughMaxLinegap,
    BoardSize,
    BlurMaskB,
    DilateB,
    ErodeB,
    ThresholdB,
    WatershedB,
    BlurMaskW,
    DilateW,
    ErodeW,
    ThresholdW,
    WatershedW,
}

/// Static description of one parameter.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ParamSpec {
    pub default: ParamValue,
    /// Inclusive valid range.
    pub min: i32,
    pub max: i32,
    /// Grouping tag for front ends; `None` keeps the key out of tuning dialogs.
    pub group: Option<&'static str>,
    pub caption: &'static str,
}

const fn spec(
    default: i32,
    min: i32,
    max: i32,
    group: &'static str,
    caption: &'static str,
) -> ParamSpec {
    ParamSpec {
        default: ParamValue::Value(default),
        min,
        max,
        group: Some(group),
        caption,
    }
}

impl ParamKey {
    pub const ALL: [ParamKey; 17] = [
        ParamKey::CannyMinval,
        ParamKey::CannyMaxval,
        ParamKey::CannyAperture,
        ParamKey::HoughThreshold,
        ParamKey::HoughMinLinelen,
        ParamKey::HoughMaxLinegap,
        ParamKey::BoardSize,
        ParamKey::BlurMaskB,
        ParamKey::DilateB,
        ParamKey::ErodeB,
        ParamKey::ThresholdB,
        ParamKey::WatershedB,
        ParamKey::BlurMaskW,
        ParamKey::DilateW,
        ParamKey::ErodeW,
        ParamKey::ThresholdW,
        ParamKey::WatershedW,
    ];

    /// On-disk name.
    pub fn name(self) -> &'static str {
        match self {
            ParamKey::CannyMinval => "CANNY_MINVAL",
            ParamKey::CannyMaxval => "CANNY_MAXVAL",
            ParamKey::CannyAperture => "CANNY_APERTURE",
            ParamKey::HoughThreshold => "HOUGH_THRESHOLD",
            ParamKey::HoughMinLinelen => "HOUGH_MIN_LINELEN",
            ParamKey::HoughMaxLinegap => "HOUGH_MAX_LINEGAP",
            ParamKey::BoardSize => "BOARD_SIZE",
            ParamKey::BlurMaskB => "BLUR_MASK_B",
            ParamKey::DilateB => "DILATE_B",
            ParamKey::ErodeB => "ERODE_B",
            ParamKey::ThresholdB => "THRESHOLD_B",
            ParamKey::WatershedB => "WATERSHED_B",
            ParamKey::BlurMaskW => "BLUR_MASK_W",
            ParamKey::DilateW => "DILATE_W",
            ParamKey::ErodeW => "ERODE_W",
            ParamKey::ThresholdW => "THRESHOLD_W",
            ParamKey::WatershedW => "WATERSHED_W",
        }
    }

    pub fn spec(self) -> ParamSpec {
        match self {
            ParamKey::CannyMinval => spec(50, 1, 255, "Edges", "Canny min"),
            ParamKey::CannyMaxval => spec(100, 1, 255, "Edges", "Canny max"),
            ParamKey::CannyAperture => spec(3, 3, 7, "Edges", "Canny aperture"),
            ParamKey::HoughThreshold => spec(90, 1, 255, "Grid", "Hough threshold"),
            ParamKey::HoughMinLinelen => spec(50, 1, 500, "Grid", "Min line length"),
            ParamKey::HoughMaxLinegap => spec(5, 1, 100, "Grid", "Max line gap"),
            ParamKey::BoardSize => ParamSpec {
                default: ParamValue::Auto,
                min: 9,
                max: 21,
                group: Some("Grid"),
                caption: "Board size",
            },
            ParamKey::BlurMaskB => spec(0, 0, 10, "Black", "Blur mask"),
            ParamKey::DilateB => spec(1, 0, 10, "Black", "Dilation"),
            ParamKey::ErodeB => spec(0, 0, 10, "Black", "Erosion"),
            ParamKey::ThresholdB => spec(0, 0, 255, "Black", "Threshold"),
            ParamKey::WatershedB => spec(14, 0, 100, "Black", "Watershed"),
            ParamKey::BlurMaskW => spec(0, 0, 10, "White", "Blur mask"),
            ParamKey::DilateW => spec(1, 0, 10, "White", "Dilation"),
            ParamKey::ErodeW => spec(0, 0, 10, "White", "Erosion"),
            ParamKey::ThresholdW => spec(0, 0, 255, "White", "Threshold"),
            ParamKey::WatershedW => spec(14, 0, 100, "White", "Watershed"),
        }
    }

    /// Only the board size may be left to auto-detection.
    #[inline]
    pub fn allows_auto(self) -> bool {
        self == ParamKey::BoardSize
    }

    fn check(self, value: ParamValue) -> Result<ParamValue, ParamError> {
        match value {
            ParamValue::Auto if !self.allows_auto() => Err(ParamError::AutoNotAllowed(self)),
            ParamValue::Auto => Ok(ParamValue::Auto),
            ParamValue::Value(v) => {
                let spec = self.spec();
                let clamped = v.clamp(spec.min, spec.max);
                if clamped != v {
                    log::warn!(
                        "{} = {} is outside [{}, {}], using {}",
                        self,
                        v,
                        spec.min,
                        spec.max,
                        clamped
                    );
                }
                Ok(ParamValue::Value(clamped))
            }
        }
    }
}

impl fmt::Display for ParamKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for ParamKey {
    type Err = ParamError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ParamKey::ALL
            .into_iter()
            .find(|k| k.name() == s)
            .ok_or_else(|| ParamError::UnknownKey(s.to_string()))
    }
}

/// A parameter value; `Auto` is stored as JSON `null`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "Option<i32>", into = "Option<i32>")]
pub enum ParamValue {
    Auto,
    Value(i32),
}

impl ParamValue {
    pub fn as_option(self) -> Option<i32> {
        match self {
            ParamValue::Auto => None,
            ParamValue::Value(v) => Some(v),
        }
    }
}

impl From<Option<i32>> for ParamValue {
    fn from(v: Option<i32>) -> Self {
        v.map_or(ParamValue::Auto, ParamValue::Value)
    }
}

impl From<ParamValue> for Option<i32> {
    fn from(v: ParamValue) -> Self {
        v.as_option()
    }
}

impl From<i32> for ParamValue {
    fn from(v: i32) -> Self {
        ParamValue::Value(v)
    }
}

/// Typed view of the `BOARD_SIZE` parameter.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BoardSizeParam {
    Auto,
    Fixed(u32),
}

/// A partial set of parameter values, keyed by known keys only.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ParamOverrides(BTreeMap<ParamKey, ParamValue>);

impl ParamOverrides {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an override. `Auto` is rejected for keys that do not accept it.
    pub fn insert(
        &mut self,
        key: ParamKey,
        value: impl Into<ParamValue>,
    ) -> Result<(), ParamError> {
        let value = value.into();
        if value == ParamValue::Auto && !key.allows_auto() {
            return Err(ParamError::AutoNotAllowed(key));
        }
        self.0.insert(key, value);
        Ok(())
    }

    pub fn get(&self, key: ParamKey) -> Option<ParamValue> {
        self.0.get(&key).copied()
    }

    pub fn contains(&self, key: ParamKey) -> bool {
        self.0.contains_key(&key)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (ParamKey, ParamValue)> + '_ {
        self.0.iter().map(|(k, v)| (*k, *v))
    }

    pub fn keys(&self) -> impl Iterator<Item = ParamKey> + '_ {
        self.0.keys().copied()
    }

    /// Build overrides from a decoded JSON object.
    ///
    /// Unknown keys are dropped. A non-integer value, or `null` on a key other
    /// than `BOARD_SIZE`, is a schema error.
    pub fn from_json(value: &Value) -> Result<Self, PersistError> {
        let Value::Object(map) = value else {
            return Err(PersistError::Schema(
                "parameters must be a JSON object".to_string(),
            ));
        };

        let mut out = Self::new();
        for (name, raw) in map {
            let Ok(key) = name.parse::<ParamKey>() else {
                log::debug!("ignoring unknown parameter {name}");
                continue;
            };
            let value = match raw {
                Value::Null => ParamValue::Auto,
                Value::Number(n) => n
                    .as_i64()
                    .and_then(|v| i32::try_from(v).ok())
                    .map(ParamValue::Value)
                    .ok_or_else(|| {
                        PersistError::Schema(format!("{key}: {n} is not a 32-bit integer"))
                    })?,
                other => {
                    return Err(PersistError::Schema(format!(
                        "{key}: expected an integer or null, got {other}"
                    )))
                }
            };
            out.insert(key, value)
                .map_err(|e| PersistError::Schema(e.to_string()))?;
        }
        Ok(out)
    }

    /// Read overrides from a parameters file.
    pub fn load_json(path: impl AsRef<Path>) -> Result<Self, PersistError> {
        let value: Value = io::load_json(path)?;
        Self::from_json(&value)
    }
}

impl FromIterator<(ParamKey, i32)> for ParamOverrides {
    fn from_iter<I: IntoIterator<Item = (ParamKey, i32)>>(iter: I) -> Self {
        Self(
            iter.into_iter()
                .map(|(k, v)| (k, ParamValue::Value(v)))
                .collect(),
        )
    }
}

/// Complete parameter set: every known key holds a value.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Params {
    values: BTreeMap<ParamKey, ParamValue>,
}

impl Default for Params {
    fn default() -> Self {
        Self {
            values: ParamKey::ALL
                .into_iter()
                .map(|k| (k, k.spec().default))
                .collect(),
        }
    }
}

impl Params {
    pub fn get(&self, key: ParamKey) -> ParamValue {
        self.values
            .get(&key)
            .copied()
            .unwrap_or_else(|| key.spec().default)
    }

    /// Integer value of `key`, or `None` when it is automatic.
    pub fn value(&self, key: ParamKey) -> Option<i32> {
        self.get(key).as_option()
    }

    pub fn board_size(&self) -> BoardSizeParam {
        match self.get(ParamKey::BoardSize) {
            ParamValue::Value(n) if n > 0 => BoardSizeParam::Fixed(n as u32),
            _ => BoardSizeParam::Auto,
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = (ParamKey, ParamValue)> + '_ {
        self.values.iter().map(|(k, v)| (*k, *v))
    }

    /// Return a copy with one key replaced. Out-of-range values are clamped.
    pub fn with(
        &self,
        key: ParamKey,
        value: impl Into<ParamValue>,
    ) -> Result<Params, ParamError> {
        let value = key.check(value.into())?;
        let mut next = self.clone();
        next.values.insert(key, value);
        Ok(next)
    }

    /// Return a copy with `overrides` applied, plus the values actually stored.
    ///
    /// Keys not present in `overrides` keep their current value.
    pub fn with_overrides(&self, overrides: &ParamOverrides) -> (Params, ParamOverrides) {
        let mut next = self.clone();
        let mut applied = ParamOverrides::new();
        for (key, value) in overrides.iter() {
            match key.check(value) {
                Ok(v) => {
                    next.values.insert(key, v);
                    applied.0.insert(key, v);
                }
                Err(e) => log::warn!("skipping parameter: {e}"),
            }
        }
        (next, applied)
    }

    /// Flat name -> value map in sorted key order.
    pub fn to_json_map(&self) -> BTreeMap<&'static str, Option<i32>> {
        self.values
            .iter()
            .map(|(k, v)| (k.name(), v.as_option()))
            .collect()
    }

    /// Write all parameters as a flat, key-sorted JSON object.
    pub fn write_json(&self, path: impl AsRef<Path>) -> Result<(), PersistError> {
        io::write_json(&self.to_json_map(), path)
    }

    /// Defaults with the contents of a parameters file applied.
    pub fn load_json(path: impl AsRef<Path>) -> Result<Params, PersistError> {
        let overrides = ParamOverrides::load_json(path)?;
        Ok(Params::default().with_overrides(&overrides).0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn names_round_trip_through_from_str() {
        for key in ParamKey::ALL {
            assert_eq!(key.name().parse::<ParamKey>(), Ok(key));
        }
        assert!("NOT_A_KEY".parse::<ParamKey>().is_err());
    }

    #[test]
    fn defaults_are_inside_their_ranges() {
        for key in ParamKey::ALL {
            let spec = key.spec();
            match spec.default {
                ParamValue::Value(v) => assert!(v >= spec.min && v <= spec.max, "{key}"),
                ParamValue::Auto => assert!(key.allows_auto()),
            }
        }
        assert_eq!(Params::default().board_size(), BoardSizeParam::Auto);
    }

    #[test]
    fn overrides_drop_unknown_and_keep_missing() {
        let base = Params::default();
        let raw = json!({ "CANNY_MINVAL": 60, "BOARD_SIZE": 13, "NOT_A_KEY": 1 });
        let overrides = ParamOverrides::from_json(&raw).expect("valid overrides");
        assert_eq!(overrides.len(), 2);

        let (next, applied) = base.with_overrides(&overrides);
        assert_eq!(next.value(ParamKey::CannyMinval), Some(60));
        assert_eq!(next.board_size(), BoardSizeParam::Fixed(13));
        assert_eq!(
            next.value(ParamKey::HoughThreshold),
            base.value(ParamKey::HoughThreshold)
        );
        assert_eq!(
            applied.keys().collect::<Vec<_>>(),
            vec![ParamKey::CannyMinval, ParamKey::BoardSize]
        );
        // the original value is untouched
        assert_eq!(base.value(ParamKey::CannyMinval), Some(50));
    }

    #[test]
    fn null_board_size_means_auto() {
        let fixed = Params::default().with(ParamKey::BoardSize, 19).expect("set");
        let overrides = ParamOverrides::from_json(&json!({ "BOARD_SIZE": null })).expect("valid");
        let (next, _) = fixed.with_overrides(&overrides);
        assert_eq!(next.board_size(), BoardSizeParam::Auto);
    }

    #[test]
    fn null_on_regular_key_is_a_schema_error() {
        let err = ParamOverrides::from_json(&json!({ "CANNY_MINVAL": null })).unwrap_err();
        assert!(err.is_malformed());
        let err = ParamOverrides::from_json(&json!({ "CANNY_MINVAL": "high" })).unwrap_err();
        assert!(err.is_malformed());
        assert!(ParamOverrides::from_json(&json!([1, 2])).is_err());
    }

    #[test]
    fn out_of_range_values_are_clamped() {
        let p = Params::default()
            .with(ParamKey::CannyMaxval, 1000)
            .expect("clamped");
        assert_eq!(p.value(ParamKey::CannyMaxval), Some(255));
        assert_eq!(
            Params::default().with(ParamKey::DilateB, ParamValue::Auto),
            Err(ParamError::AutoNotAllowed(ParamKey::DilateB))
        );
    }

    #[test]
    fn json_file_round_trip_restores_values() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("board.json");

        let saved = Params::default()
            .with(ParamKey::WatershedW, 20)
            .and_then(|p| p.with(ParamKey::BoardSize, 9))
            .expect("set");
        saved.write_json(&path).expect("write");

        let raw = std::fs::read_to_string(&path).expect("read back");
        let blur = raw.find("\"BLUR_MASK_B\"").expect("key present");
        let watershed = raw.find("\"WATERSHED_W\"").expect("key present");
        assert!(blur < watershed, "keys must be sorted");

        let mutated = saved.with(ParamKey::WatershedW, 3).expect("set");
        let overrides = ParamOverrides::load_json(&path).expect("load");
        let (restored, applied) = mutated.with_overrides(&overrides);
        assert_eq!(restored, saved);
        assert_eq!(applied.len(), ParamKey::ALL.len());
    }
}
