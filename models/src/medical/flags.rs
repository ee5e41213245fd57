// models/src/medical/flags.rs
use serde::{Deserialize, Serialize};

/// Deterministic safety flags derived from vitals only, never from the classifier.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CriticalFlags {
    #[serde(rename = "spO2_crit")]
    pub spo2_crit: bool,
    pub sbp_low_crit: bool,
    pub sbp_high_crit: bool,
    pub hr_low_crit: bool,
    pub hr_high_crit: bool,
    pub rr_crit: bool,
    pub temp_crit: bool,
}

impl CriticalFlags {
    pub const NAMES: [&'static str; 7] = [
        "spO2_crit",
        "sbp_low_crit",
        "sbp_high_crit",
        "hr_low_crit",
        "hr_high_crit",
        "rr_crit",
        "temp_crit",
    ];

    pub fn any(&self) -> bool {
        self.entries().iter().any(|(_, raised)| *raised)
    }

    /// Names of the raised flags, in declaration order.
    pub fn raised(&self) -> Vec<&'static str> {
        self.entries()
            .iter()
            .filter(|(_, raised)| *raised)
            .map(|(name, _)| *name)
            .collect()
    }

    pub fn entries(&self) -> [(&'static str, bool); 7] {
        [
            (Self::NAMES[0], self.spo2_crit),
            (Self::NAMES[1], self.sbp_low_crit),
            (Self::NAMES[2], self.sbp_high_crit),
            (Self::NAMES[3], self.hr_low_crit),
            (Self::NAMES[4], self.hr_high_crit),
            (Self::NAMES[5], self.rr_crit),
            (Self::NAMES[6], self.temp_crit),
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn should_serialize_with_wire_names() {
        let flags = CriticalFlags { spo2_crit: true, ..Default::default() };
        let json = serde_json::to_value(flags).unwrap();
        assert_eq!(json["spO2_crit"], true);
        assert_eq!(json.as_object().unwrap().len(), 7);
        for name in CriticalFlags::NAMES {
            assert!(json.get(name).is_some(), "missing {}", name);
        }
    }

    #[test]
    fn should_report_raised_flags() {
        let flags = CriticalFlags { hr_high_crit: true, temp_crit: true, ..Default::default() };
        assert!(flags.any());
        assert_eq!(flags.raised(), vec!["hr_high_crit", "temp_crit"]);
        assert!(!CriticalFlags::default().any());
    }
}
