// lib/src/flags.rs
//
// Critical-flag evaluation. Thresholds are strict: a value sitting exactly on
// a boundary does not raise the flag. A missing vital never raises a flag.

use models::{CriticalFlags, NormalizedVitals, Vital};

pub const SPO2_LOW: f64 = 90.0;
pub const SBP_LOW: f64 = 90.0;
pub const SBP_HIGH: f64 = 180.0;
pub const HR_LOW: f64 = 40.0;
pub const HR_HIGH: f64 = 130.0;
pub const RR_LOW: f64 = 8.0;
pub const RR_HIGH: f64 = 30.0;
pub const TEMP_LOW: f64 = 35.0;
pub const TEMP_HIGH: f64 = 40.0;

fn below(value: Option<f64>, limit: f64) -> bool {
    matches!(value, Some(v) if v < limit)
}

fn above(value: Option<f64>, limit: f64) -> bool {
    matches!(value, Some(v) if v > limit)
}

pub fn evaluate_flags(vitals: &NormalizedVitals) -> CriticalFlags {
    let spo2 = vitals.get(Vital::O2Saturation);
    let sbp = vitals.get(Vital::BloodPressureSystolic);
    let hr = vitals.get(Vital::PulseRate);
    let rr = vitals.get(Vital::RespiratoryRate);
    let temp = vitals.get(Vital::Temperature);

    CriticalFlags {
        spo2_crit: below(spo2, SPO2_LOW),
        sbp_low_crit: below(sbp, SBP_LOW),
        sbp_high_crit: above(sbp, SBP_HIGH),
        hr_low_crit: below(hr, HR_LOW),
        hr_high_crit: above(hr, HR_HIGH),
        rr_crit: below(rr, RR_LOW) || above(rr, RR_HIGH),
        temp_crit: below(temp, TEMP_LOW) || above(temp, TEMP_HIGH),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn flags_for(vital: Vital, value: f64) -> CriticalFlags {
        evaluate_flags(&NormalizedVitals::all_missing().with(vital, value))
    }

    #[test]
    fn should_raise_nothing_for_missing_vitals() {
        assert_eq!(evaluate_flags(&NormalizedVitals::all_missing()), CriticalFlags::default());
    }

    #[test]
    fn should_respect_spo2_boundary() {
        assert!(flags_for(Vital::O2Saturation, 89.9).spo2_crit);
        assert!(!flags_for(Vital::O2Saturation, 90.0).spo2_crit);
        assert!(!flags_for(Vital::O2Saturation, 90.1).spo2_crit);
    }

    #[test]
    fn should_respect_systolic_boundaries() {
        assert!(flags_for(Vital::BloodPressureSystolic, 89.9).sbp_low_crit);
        assert!(!flags_for(Vital::BloodPressureSystolic, 90.0).sbp_low_crit);
        assert!(!flags_for(Vital::BloodPressureSystolic, 90.1).sbp_low_crit);

        assert!(!flags_for(Vital::BloodPressureSystolic, 179.9).sbp_high_crit);
        assert!(!flags_for(Vital::BloodPressureSystolic, 180.0).sbp_high_crit);
        assert!(flags_for(Vital::BloodPressureSystolic, 180.1).sbp_high_crit);
    }

    #[test]
    fn should_respect_pulse_boundaries() {
        assert!(flags_for(Vital::PulseRate, 39.9).hr_low_crit);
        assert!(!flags_for(Vital::PulseRate, 40.0).hr_low_crit);
        assert!(!flags_for(Vital::PulseRate, 40.1).hr_low_crit);

        assert!(!flags_for(Vital::PulseRate, 129.9).hr_high_crit);
        assert!(!flags_for(Vital::PulseRate, 130.0).hr_high_crit);
        assert!(flags_for(Vital::PulseRate, 130.1).hr_high_crit);
    }

    #[test]
    fn should_respect_respiratory_boundaries() {
        assert!(flags_for(Vital::RespiratoryRate, 7.9).rr_crit);
        assert!(!flags_for(Vital::RespiratoryRate, 8.0).rr_crit);
        assert!(!flags_for(Vital::RespiratoryRate, 8.1).rr_crit);

        assert!(!flags_for(Vital::RespiratoryRate, 29.9).rr_crit);
        assert!(!flags_for(Vital::RespiratoryRate, 30.0).rr_crit);
        assert!(flags_for(Vital::RespiratoryRate, 30.1).rr_crit);
    }

    #[test]
    fn should_respect_temperature_boundaries() {
        assert!(flags_for(Vital::Temperature, 34.9).temp_crit);
        assert!(!flags_for(Vital::Temperature, 35.0).temp_crit);
        assert!(!flags_for(Vital::Temperature, 35.1).temp_crit);

        assert!(!flags_for(Vital::Temperature, 39.9).temp_crit);
        assert!(!flags_for(Vital::Temperature, 40.0).temp_crit);
        assert!(flags_for(Vital::Temperature, 40.1).temp_crit);
    }

    #[test]
    fn should_ignore_vitals_without_rules() {
        let vitals = NormalizedVitals::all_missing()
            .with(Vital::BloodPressureDiastolic, 10.0)
            .with(Vital::Avpu, 0.0);
        assert!(!evaluate_flags(&vitals).any());
    }

    proptest! {
        #[test]
        fn spo2_flag_matches_strict_comparison(v in 0.0f64..120.0) {
            prop_assert_eq!(flags_for(Vital::O2Saturation, v).spo2_crit, v < 90.0);
        }

        #[test]
        fn temperature_flag_matches_strict_comparison(v in 25.0f64..45.0) {
            prop_assert_eq!(flags_for(Vital::Temperature, v).temp_crit, v < 35.0 || v > 40.0);
        }
    }
}
