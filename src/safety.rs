use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PopulationGroup {
    /// Under 12 years
    Children,
    /// Healthy adults 18-64
    Adults,
    /// 65 and over
    Seniors,
    /// Schools and sports teams practicing outdoors
    Athletes,
    /// Elderly care and childcare facilities
    Facilities,
}

impl PopulationGroup {
    pub const ALL: [PopulationGroup; 5] = [
        PopulationGroup::Children,
        PopulationGroup::Adults,
        PopulationGroup::Seniors,
        PopulationGroup::Athletes,
        PopulationGroup::Facilities,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            PopulationGroup::Children => "children",
            PopulationGroup::Adults => "adults",
            PopulationGroup::Seniors => "seniors",
            PopulationGroup::Athletes => "athletes",
            PopulationGroup::Facilities => "facilities",
        }
    }

    fn profile(&self) -> &'static GroupProfile {
        &GROUP_PROFILES[*self as usize]
    }
}

impl fmt::Display for PopulationGroup {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SafetyTier {
    Safe,
    Caution,
    Unsafe,
}

impl SafetyTier {
    pub fn color(&self) -> &'static str {
        match self {
            SafetyTier::Safe => "#00E400",
            SafetyTier::Caution => "#FFFF00",
            SafetyTier::Unsafe => "#FF0000",
        }
    }

    fn index(&self) -> usize {
        match self {
            SafetyTier::Safe => 0,
            SafetyTier::Caution => 1,
            SafetyTier::Unsafe => 2,
        }
    }
}

/// Thresholds and copy for one population group.
///
/// `safe_below` and `caution_below` are exclusive upper bounds; anything at
/// or above `caution_below` is unsafe.
struct GroupProfile {
    group: PopulationGroup,
    safe_below: f64,
    caution_below: f64,
    icon: &'static str,
    /// Indexed by tier: safe, caution, unsafe
    recommendations: [&'static str; 3],
}

// Indexed by `PopulationGroup as usize`
static GROUP_PROFILES: [GroupProfile; 5] = [
    GroupProfile {
        group: PopulationGroup::Children,
        safe_below: 50.0,
        caution_below: 100.0,
        icon: "👶",
        recommendations: [
            "Safe for all outdoor activities",
            "Limit outdoor play to 30-45 minutes, watch for symptoms",
            "Keep children indoors, close windows",
        ],
    },
    GroupProfile {
        group: PopulationGroup::Adults,
        safe_below: 100.0,
        caution_below: 150.0,
        icon: "💪",
        recommendations: [
            "Safe for all outdoor activities",
            "Reduce prolonged or heavy outdoor exertion",
            "Avoid outdoor activities",
        ],
    },
    GroupProfile {
        group: PopulationGroup::Seniors,
        safe_below: 50.0,
        caution_below: 100.0,
        icon: "👴",
        recommendations: [
            "Safe for outdoor activities",
            "Limit outdoor time, take frequent breaks",
            "Stay indoors, keep windows closed",
        ],
    },
    GroupProfile {
        group: PopulationGroup::Athletes,
        safe_below: 75.0,
        caution_below: 125.0,
        icon: "⚽",
        recommendations: [
            "Normal practice and training intensity",
            "Reduce intensity, increase breaks, watch athletes closely",
            "Cancel outdoor practice, move indoors or reschedule",
        ],
    },
    GroupProfile {
        group: PopulationGroup::Facilities,
        safe_below: 45.0,
        caution_below: 90.0,
        icon: "🏥",
        recommendations: [
            "Normal outdoor activities permitted",
            "Limit outdoor time for residents, monitor vulnerable individuals",
            "Keep all residents indoors, seal windows, run air filtration",
        ],
    },
];

impl GroupProfile {
    fn tier(&self, aqi: f64) -> SafetyTier {
        if aqi < self.safe_below {
            SafetyTier::Safe
        } else if aqi < self.caution_below {
            SafetyTier::Caution
        } else {
            SafetyTier::Unsafe
        }
    }

    fn verdict(&self, aqi: f64) -> SafetyVerdict {
        let status = self.tier(aqi);
        SafetyVerdict {
            group: self.group,
            status,
            recommendation: self.recommendations[status.index()].to_string(),
            icon: self.icon.to_string(),
            color: status.color().to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SafetyVerdict {
    pub group: PopulationGroup,
    pub status: SafetyTier,
    pub recommendation: String,
    pub icon: String,
    pub color: String,
}

pub type GroupVerdicts = BTreeMap<PopulationGroup, SafetyVerdict>;

/// Verdict for a single group
pub fn classify_group(group: PopulationGroup, aqi: f64) -> SafetyVerdict {
    group.profile().verdict(aqi)
}

/// Verdicts for every population group at the given AQI.
///
/// Total over all inputs, including negative or extreme values.
pub fn classify(aqi: f64) -> GroupVerdicts {
    GROUP_PROFILES
        .iter()
        .map(|profile| (profile.group, profile.verdict(aqi)))
        .collect()
}

/// One forecast hour with its per-group verdicts
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HourlySafety {
    pub hour: u32,
    pub aqi: u32,
    pub groups: GroupVerdicts,
}

impl HourlySafety {
    pub fn new(hour: u32, aqi: u32) -> Self {
        Self {
            hour,
            aqi,
            groups: classify(f64::from(aqi)),
        }
    }

    fn status_for(&self, group: PopulationGroup) -> SafetyTier {
        self.groups
            .get(&group)
            .map(|v| v.status)
            .unwrap_or_else(|| classify_group(group, f64::from(self.aqi)).status)
    }
}

/// AQI reported in a best/worst summary. Forecast hours are whole numbers;
/// the empty-timeline fallback echoes the current reading as given.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum SummaryAqi {
    Forecast(u32),
    Current(f64),
}

impl SummaryAqi {
    pub fn value(&self) -> f64 {
        match *self {
            SummaryAqi::Forecast(aqi) => f64::from(aqi),
            SummaryAqi::Current(aqi) => aqi,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HourSummary {
    pub hour: u32,
    pub aqi: SummaryAqi,
    pub status: SafetyTier,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BestWorst {
    pub best: HourSummary,
    pub worst: HourSummary,
}

/// Finds each group's best and worst forecast hour.
///
/// Best is the lowest-AQI hour among those safe for the group, or the lowest
/// overall when none is safe. Worst is the highest-AQI hour regardless of
/// group, so it is the same hour for every group. Ties resolve to the
/// earliest hour. An empty timeline reports `current_aqi` at hour 0 with
/// caution status for both.
pub fn find_best_worst(
    timeline: &[HourlySafety],
    current_aqi: f64,
) -> BTreeMap<PopulationGroup, BestWorst> {
    // min_by_key keeps the first minimum; reversing makes max_by_key do the same
    let lowest = timeline.iter().min_by_key(|h| h.aqi);
    let highest = timeline.iter().rev().max_by_key(|h| h.aqi);

    PopulationGroup::ALL
        .iter()
        .map(|&group| {
            let entry = match (lowest, highest) {
                (Some(lowest), Some(highest)) => {
                    let best = timeline
                        .iter()
                        .filter(|h| h.status_for(group) == SafetyTier::Safe)
                        .min_by_key(|h| h.aqi)
                        .unwrap_or(lowest);
                    BestWorst {
                        best: summarize(best, group),
                        worst: summarize(highest, group),
                    }
                }
                _ => {
                    let fallback = HourSummary {
                        hour: 0,
                        aqi: SummaryAqi::Current(current_aqi),
                        status: SafetyTier::Caution,
                    };
                    BestWorst {
                        best: fallback.clone(),
                        worst: fallback,
                    }
                }
            };
            (group, entry)
        })
        .collect()
}

fn summarize(hour: &HourlySafety, group: PopulationGroup) -> HourSummary {
    HourSummary {
        hour: hour.hour,
        aqi: SummaryAqi::Forecast(hour.aqi),
        status: hour.status_for(group),
    }
}
