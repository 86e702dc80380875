//! Known payment service providers

/// A payment service provider and its baseline failure rate.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PspProfile {
    pub name: &'static str,
    pub base_fail: f64,
}

pub const PSP_PROFILES: [PspProfile; 3] = [
    PspProfile {
        name: "Axis_PSP",
        base_fail: 0.045,
    },
    PspProfile {
        name: "HDFC_PSP",
        base_fail: 0.02,
    },
    PspProfile {
        name: "SBI_PSP",
        base_fail: 0.03,
    },
];

/// Profile for `name`, if it is a known PSP.
pub fn psp_profile(name: &str) -> Option<PspProfile> {
    PSP_PROFILES.iter().copied().find(|profile| profile.name == name)
}
