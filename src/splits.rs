//! Milestone definitions and per-run split bookkeeping
//!
//! The milestone set, the community route templates, and the declarative
//! rule table that maps signal edges (plus world-cell gating) to milestones.
//! `SplitStateRegistry` guarantees each milestone fires at most once per run.

use serde::{Deserialize, Serialize};

/// A named, one-shot-per-run gameplay milestone
///
/// "No milestone this tick" is expressed as an empty detection list, never
/// as an enum member.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "kebab-case")]
pub enum SplitArea {
    Helgen,
    Whiterun,
    ThalmorEmbassy,
    Esbern,
    Riverwood,
    TheWall,
    Septimus,
    MzarkTower,
    ClearSky,
    HorseClimb,
    CutsceneStart,
    CutsceneEnd,
    Alduin1,
    HighHrothgar,
    Solitude,
    Windhelm,
    Council,
    Odahviing,
    EnterSovngarde,
    CollegeOfWinterhold,
    Companions,
    DarkBrotherhood,
    ThievesGuild,
    AlduinDefeated,
}

impl SplitArea {
    /// Number of milestones (registry size)
    pub const COUNT: usize = 24;

    /// Every milestone, in registry order
    pub const ALL: [SplitArea; Self::COUNT] = [
        SplitArea::Helgen,
        SplitArea::Whiterun,
        SplitArea::ThalmorEmbassy,
        SplitArea::Esbern,
        SplitArea::Riverwood,
        SplitArea::TheWall,
        SplitArea::Septimus,
        SplitArea::MzarkTower,
        SplitArea::ClearSky,
        SplitArea::HorseClimb,
        SplitArea::CutsceneStart,
        SplitArea::CutsceneEnd,
        SplitArea::Alduin1,
        SplitArea::HighHrothgar,
        SplitArea::Solitude,
        SplitArea::Windhelm,
        SplitArea::Council,
        SplitArea::Odahviing,
        SplitArea::EnterSovngarde,
        SplitArea::CollegeOfWinterhold,
        SplitArea::Companions,
        SplitArea::DarkBrotherhood,
        SplitArea::ThievesGuild,
        SplitArea::AlduinDefeated,
    ];

    /// Well-known index into the split-state registry
    pub fn index(self) -> usize {
        self as usize
    }

    /// Human-readable name for host display
    pub fn display_name(self) -> &'static str {
        match self {
            SplitArea::Helgen => "Helgen",
            SplitArea::Whiterun => "Whiterun",
            SplitArea::ThalmorEmbassy => "Thalmor Embassy",
            SplitArea::Esbern => "Esbern",
            SplitArea::Riverwood => "Riverwood",
            SplitArea::TheWall => "Alduin's Wall",
            SplitArea::Septimus => "Septimus",
            SplitArea::MzarkTower => "Tower of Mzark",
            SplitArea::ClearSky => "Clear Sky",
            SplitArea::HorseClimb => "Horse Climb",
            SplitArea::CutsceneStart => "Cutscene Start",
            SplitArea::CutsceneEnd => "Cutscene End",
            SplitArea::Alduin1 => "Alduin 1",
            SplitArea::HighHrothgar => "High Hrothgar",
            SplitArea::Solitude => "Solitude",
            SplitArea::Windhelm => "Windhelm",
            SplitArea::Council => "Council",
            SplitArea::Odahviing => "Odahviing",
            SplitArea::EnterSovngarde => "Enter Sovngarde",
            SplitArea::CollegeOfWinterhold => "College of Winterhold",
            SplitArea::Companions => "Companions",
            SplitArea::DarkBrotherhood => "Dark Brotherhood",
            SplitArea::ThievesGuild => "Thieves' Guild",
            SplitArea::AlduinDefeated => "Alduin Defeated",
        }
    }
}

/// Community-defined any% route templates
///
/// Serialized names match the historical settings values so existing host
/// configurations keep working.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum Template {
    #[default]
    #[serde(rename = "MrWalrus")]
    MrWalrus,
    #[serde(rename = "DrTChops")]
    DrTChops,
    #[serde(rename = "gr3yscale")]
    Gr3yscale,
    #[serde(rename = "Dalleth")]
    Dalleth,
}

impl Template {
    /// Parse a template tag, falling back to the default on unknown input
    pub fn parse_or_default(name: &str) -> Self {
        match name {
            "MrWalrus" => Template::MrWalrus,
            "DrTChops" => Template::DrTChops,
            "gr3yscale" => Template::Gr3yscale,
            "Dalleth" => Template::Dalleth,
            _ => Template::default(),
        }
    }
}

/// The signal edge a rule fires on
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TriggerEdge {
    /// Loading-screen flag rising edge
    LoadScreenStart,
    /// Loading-screen flag falling edge (paired-edge guarded)
    LoadScreenEnd,
    /// Fade-out flag falling edge
    FadeOutEnd,
    /// Alduin-defeated flag rising edge
    DefeatFlagSet,
}

/// World-space requirement at the moment of the edge
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WorldGate {
    /// Player must be in the Tamriel world space
    InTamriel,
    /// Player must be in an interior or another world space
    OutsideTamriel,
    /// No world-space requirement
    Any,
}

impl WorldGate {
    pub fn matches(self, in_tamriel: bool) -> bool {
        match self {
            WorldGate::InTamriel => in_tamriel,
            WorldGate::OutsideTamriel => !in_tamriel,
            WorldGate::Any => true,
        }
    }
}

/// One entry of the fixed milestone detection table
#[derive(Debug, Clone, Copy)]
pub struct SplitRule {
    pub area: SplitArea,
    pub edge: TriggerEdge,
    pub world: WorldGate,
    /// Exact world cells the edge must be observed at; empty = any cell
    pub cells: &'static [(i32, i32)],
    /// Templates this rule belongs to; empty = all templates
    pub templates: &'static [Template],
}

impl SplitRule {
    /// Whether this rule is part of the given route template
    pub fn applies_to(&self, template: Template) -> bool {
        self.templates.is_empty() || self.templates.contains(&template)
    }

    /// Exact-integer cell gate; no tolerance
    pub fn cell_matches(&self, x: i32, y: i32) -> bool {
        self.cells.is_empty() || self.cells.contains(&(x, y))
    }
}

/// The world cell the player stands in when control is first gained
pub const FIRST_AREA_CELL: (i32, i32) = (3, -20);

/// The fixed milestone table, one rule per `SplitArea`
///
/// Cell literals follow the published route templates. World-space gating
/// distinguishes Tamriel overworld triggers from interior/Sovngarde ones.
pub const SPLIT_RULES: &[SplitRule] = &[
    SplitRule {
        area: SplitArea::Helgen,
        edge: TriggerEdge::LoadScreenStart,
        world: WorldGate::InTamriel,
        cells: &[(2, -21), (3, -21)],
        templates: &[],
    },
    SplitRule {
        area: SplitArea::Whiterun,
        edge: TriggerEdge::LoadScreenStart,
        world: WorldGate::InTamriel,
        cells: &[(4, -3)],
        templates: &[],
    },
    SplitRule {
        area: SplitArea::ThalmorEmbassy,
        edge: TriggerEdge::LoadScreenStart,
        world: WorldGate::InTamriel,
        cells: &[(-20, 27)],
        templates: &[],
    },
    SplitRule {
        area: SplitArea::Esbern,
        edge: TriggerEdge::LoadScreenEnd,
        world: WorldGate::OutsideTamriel,
        cells: &[(42, -24)],
        templates: &[],
    },
    SplitRule {
        area: SplitArea::Riverwood,
        edge: TriggerEdge::LoadScreenEnd,
        world: WorldGate::InTamriel,
        cells: &[(5, -11), (5, -12)],
        templates: &[],
    },
    SplitRule {
        area: SplitArea::TheWall,
        edge: TriggerEdge::LoadScreenStart,
        world: WorldGate::InTamriel,
        cells: &[(-14, 1)],
        templates: &[],
    },
    SplitRule {
        area: SplitArea::Septimus,
        edge: TriggerEdge::LoadScreenStart,
        world: WorldGate::InTamriel,
        cells: &[(28, 34)],
        templates: &[],
    },
    SplitRule {
        area: SplitArea::MzarkTower,
        edge: TriggerEdge::LoadScreenEnd,
        world: WorldGate::InTamriel,
        cells: &[(26, 31)],
        templates: &[],
    },
    SplitRule {
        area: SplitArea::ClearSky,
        edge: TriggerEdge::FadeOutEnd,
        world: WorldGate::InTamriel,
        cells: &[(17, -10)],
        templates: &[],
    },
    SplitRule {
        area: SplitArea::HorseClimb,
        edge: TriggerEdge::LoadScreenEnd,
        world: WorldGate::InTamriel,
        cells: &[(13, -9)],
        templates: &[Template::Gr3yscale],
    },
    SplitRule {
        area: SplitArea::CutsceneStart,
        edge: TriggerEdge::LoadScreenStart,
        world: WorldGate::OutsideTamriel,
        cells: &[(15, 19)],
        templates: &[Template::DrTChops, Template::Dalleth],
    },
    SplitRule {
        area: SplitArea::CutsceneEnd,
        edge: TriggerEdge::LoadScreenEnd,
        world: WorldGate::OutsideTamriel,
        cells: &[(15, 19)],
        templates: &[Template::Gr3yscale, Template::Dalleth],
    },
    SplitRule {
        area: SplitArea::Alduin1,
        edge: TriggerEdge::FadeOutEnd,
        world: WorldGate::InTamriel,
        cells: &[(17, -9)],
        templates: &[],
    },
    SplitRule {
        area: SplitArea::HighHrothgar,
        edge: TriggerEdge::LoadScreenStart,
        world: WorldGate::InTamriel,
        cells: &[(13, -10)],
        templates: &[],
    },
    SplitRule {
        area: SplitArea::Solitude,
        edge: TriggerEdge::LoadScreenStart,
        world: WorldGate::InTamriel,
        cells: &[(-16, 26)],
        templates: &[],
    },
    SplitRule {
        area: SplitArea::Windhelm,
        edge: TriggerEdge::LoadScreenStart,
        world: WorldGate::InTamriel,
        cells: &[(32, 9)],
        templates: &[],
    },
    SplitRule {
        area: SplitArea::Council,
        edge: TriggerEdge::LoadScreenEnd,
        world: WorldGate::OutsideTamriel,
        cells: &[(13, -10)],
        templates: &[],
    },
    SplitRule {
        area: SplitArea::Odahviing,
        edge: TriggerEdge::LoadScreenEnd,
        world: WorldGate::OutsideTamriel,
        cells: &[(5, -2)],
        templates: &[],
    },
    SplitRule {
        area: SplitArea::EnterSovngarde,
        edge: TriggerEdge::LoadScreenEnd,
        world: WorldGate::OutsideTamriel,
        cells: &[(15, 20)],
        templates: &[],
    },
    SplitRule {
        area: SplitArea::CollegeOfWinterhold,
        edge: TriggerEdge::LoadScreenStart,
        world: WorldGate::InTamriel,
        cells: &[(27, 24)],
        templates: &[],
    },
    SplitRule {
        area: SplitArea::Companions,
        edge: TriggerEdge::LoadScreenStart,
        world: WorldGate::InTamriel,
        cells: &[(4, -4)],
        templates: &[],
    },
    SplitRule {
        area: SplitArea::DarkBrotherhood,
        edge: TriggerEdge::LoadScreenStart,
        world: WorldGate::InTamriel,
        cells: &[(-8, -18)],
        templates: &[],
    },
    SplitRule {
        area: SplitArea::ThievesGuild,
        edge: TriggerEdge::LoadScreenStart,
        world: WorldGate::InTamriel,
        cells: &[(42, -24)],
        templates: &[],
    },
    SplitRule {
        area: SplitArea::AlduinDefeated,
        edge: TriggerEdge::DefeatFlagSet,
        world: WorldGate::OutsideTamriel,
        cells: &[(15, 19), (15, 20)],
        templates: &[],
    },
];

/// Per-run record of which milestones have already fired
///
/// Only the polling thread mutates this; host reset requests are funneled
/// through the poller and applied before the next tick's detection.
#[derive(Debug, Clone)]
pub struct SplitStateRegistry {
    fired: [bool; SplitArea::COUNT],
}

impl SplitStateRegistry {
    /// All entries start unfired
    pub fn new() -> Self {
        Self {
            fired: [false; SplitArea::COUNT],
        }
    }

    /// Clear every entry; called on run start/reset
    pub fn reset(&mut self) {
        self.fired = [false; SplitArea::COUNT];
    }

    /// Check-and-set: returns whether this call made the false->true
    /// transition. A second call for the same area is a no-op.
    pub fn try_fire(&mut self, area: SplitArea) -> bool {
        let slot = &mut self.fired[area.index()];
        if *slot {
            false
        } else {
            *slot = true;
            true
        }
    }

    /// Whether the milestone already fired this run
    pub fn has_fired(&self, area: SplitArea) -> bool {
        self.fired[area.index()]
    }

    /// Milestones fired so far, in registry order
    pub fn fired_areas(&self) -> Vec<SplitArea> {
        SplitArea::ALL
            .iter()
            .copied()
            .filter(|a| self.has_fired(*a))
            .collect()
    }
}

impl Default for SplitStateRegistry {
    fn default() -> Self {
        Self::new()
    }
}
