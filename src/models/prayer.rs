use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PrayerName {
    Imsak,
    Subuh,
    Terbit,
    Dzuhur,
    Ashar,
    Maghrib,
    Isya,
}

impl PrayerName {
    /// Canonical order used for every current/next computation.
    pub const CANONICAL: [PrayerName; 7] = [
        PrayerName::Imsak,
        PrayerName::Subuh,
        PrayerName::Terbit,
        PrayerName::Dzuhur,
        PrayerName::Ashar,
        PrayerName::Maghrib,
        PrayerName::Isya,
    ];

    pub fn all() -> Vec<PrayerName> {
        Self::CANONICAL.to_vec()
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            PrayerName::Imsak => "imsak",
            PrayerName::Subuh => "subuh",
            PrayerName::Terbit => "terbit",
            PrayerName::Dzuhur => "dzuhur",
            PrayerName::Ashar => "ashar",
            PrayerName::Maghrib => "maghrib",
            PrayerName::Isya => "isya",
        }
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            PrayerName::Imsak => "Imsak",
            PrayerName::Subuh => "Subuh",
            PrayerName::Terbit => "Terbit",
            PrayerName::Dzuhur => "Dzuhur",
            PrayerName::Ashar => "Ashar",
            PrayerName::Maghrib => "Maghrib",
            PrayerName::Isya => "Isya",
        }
    }
}

impl std::fmt::Display for PrayerName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.display_name())
    }
}

impl FromStr for PrayerName {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "imsak" => Ok(PrayerName::Imsak),
            "subuh" | "fajr" => Ok(PrayerName::Subuh),
            "terbit" | "sunrise" => Ok(PrayerName::Terbit),
            "dzuhur" | "dhuhr" | "zuhr" => Ok(PrayerName::Dzuhur),
            "ashar" | "asr" => Ok(PrayerName::Ashar),
            "maghrib" => Ok(PrayerName::Maghrib),
            "isya" | "isha" => Ok(PrayerName::Isya),
            _ => Err(anyhow::anyhow!("Unknown prayer name: {}", s)),
        }
    }
}

/// User-controlled alarm switches. A prayer with no entry has its alarm off.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AlarmSet {
    enabled: BTreeMap<PrayerName, bool>,
}

impl AlarmSet {
    pub fn is_enabled(&self, prayer: PrayerName) -> bool {
        self.enabled.get(&prayer).copied().unwrap_or(false)
    }

    pub fn set(&mut self, prayer: PrayerName, on: bool) {
        self.enabled.insert(prayer, on);
    }

    pub fn enabled(&self) -> impl Iterator<Item = PrayerName> + '_ {
        PrayerName::CANONICAL
            .into_iter()
            .filter(|p| self.is_enabled(*p))
    }
}

impl FromIterator<(PrayerName, bool)> for AlarmSet {
    fn from_iter<I: IntoIterator<Item = (PrayerName, bool)>>(iter: I) -> Self {
        Self {
            enabled: iter.into_iter().collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_keys_and_aliases() {
        assert_eq!("Dzuhur".parse::<PrayerName>().unwrap(), PrayerName::Dzuhur);
        assert_eq!("fajr".parse::<PrayerName>().unwrap(), PrayerName::Subuh);
        assert_eq!("ISHA".parse::<PrayerName>().unwrap(), PrayerName::Isya);
        assert!("dhuha".parse::<PrayerName>().is_err());
    }

    #[test]
    fn canonical_order_matches_ord() {
        let mut sorted = PrayerName::all();
        sorted.sort();
        assert_eq!(sorted, PrayerName::CANONICAL.to_vec());
    }

    #[test]
    fn alarms_default_off() {
        let mut alarms = AlarmSet::default();
        assert!(PrayerName::CANONICAL.iter().all(|p| !alarms.is_enabled(*p)));

        alarms.set(PrayerName::Maghrib, true);
        alarms.set(PrayerName::Subuh, true);
        alarms.set(PrayerName::Isya, false);
        assert_eq!(
            alarms.enabled().collect::<Vec<_>>(),
            vec![PrayerName::Subuh, PrayerName::Maghrib]
        );
    }
}
