//! Per-tick detection state machine
//!
//! Pure edge/gating logic over consecutive samples; no process I/O. The
//! runner feeds it one `SampleSet` per tick and forwards whatever events it
//! derives.

use super::events::GameEvent;
use super::session::RunPhase;
use crate::config::SplitterConfig;
use crate::signals::SampleSet;
use crate::splits::{SplitStateRegistry, TriggerEdge, FIRST_AREA_CELL, SPLIT_RULES};

/// Tracks previous-tick state and derives semantic transitions
pub struct StateTracker {
    prev: SampleSet,
    load_started: bool,
    load_screen_started: bool,
    frame: u64,
}

impl StateTracker {
    /// Fresh tracker; the first tick compares against an all-low sample,
    /// so a load already in progress at attach time registers as a start.
    pub fn new() -> Self {
        Self {
            prev: SampleSet::default(),
            load_started: false,
            load_screen_started: false,
            frame: 0,
        }
    }

    /// Tick counter (number of samples consumed)
    pub fn frame(&self) -> u64 {
        self.frame
    }

    /// Consume one tick's sample and return the transitions it produced
    ///
    /// Milestones consult the registry so each fires at most once per run;
    /// a milestone whose gate is satisfied while the run phase is not
    /// `Running` does not consume its one-shot.
    pub fn advance(
        &mut self,
        raw: &SampleSet,
        phase: RunPhase,
        config: &SplitterConfig,
        registry: &mut SplitStateRegistry,
    ) -> Vec<GameEvent> {
        let frame = self.frame;
        let mut cur = *raw;

        // A loading screen always counts as loading
        if cur.is_loading_screen {
            cur.is_loading = true;
        }

        let load_rise = cur.is_loading && !self.prev.is_loading;
        let load_fall = !cur.is_loading && self.prev.is_loading;
        let screen_rise = cur.is_loading_screen && !self.prev.is_loading_screen;
        let screen_fall = !cur.is_loading_screen && self.prev.is_loading_screen;
        // A finish only counts if its start was observed (attach-time guard)
        let screen_end = screen_fall && self.load_screen_started;
        let fade_out_end = !cur.is_in_fade_out && self.prev.is_in_fade_out;
        let defeat_set = cur.alduin_defeated && !self.prev.alduin_defeated;

        let mut events = Vec::new();

        if load_rise {
            self.load_started = true;
            log::info!("load start - {}", frame);
            events.push(GameEvent::LoadStarted { frame });
        } else if load_fall && self.load_started {
            self.load_started = false;
            log::info!("load end - {}", frame);
            events.push(GameEvent::LoadFinished { frame });
        }

        if screen_rise {
            self.load_screen_started = true;
            log::info!("load screen start - {}", frame);
            events.push(GameEvent::LoadScreenStarted { frame });
        } else if screen_end {
            self.load_screen_started = false;
            log::info!("load screen end - {}", frame);
            events.push(GameEvent::LoadScreenFinished { frame });
        }

        // Opening sequence: the post-load fade-out ends in Tamriel at the
        // starting cell. Reset is emitted before start; hosts depend on
        // that order to begin a fresh attempt in one tick.
        if config.auto_start
            && fade_out_end
            && cur.is_in_tamriel
            && (cur.world_x, cur.world_y) == FIRST_AREA_CELL
        {
            log::info!("player gained control - {}", frame);
            events.push(GameEvent::FirstLevelLoading { frame });
            events.push(GameEvent::PlayerGainedControl { frame });
        }

        if phase == RunPhase::Running {
            for rule in SPLIT_RULES {
                let edge = match rule.edge {
                    TriggerEdge::LoadScreenStart => screen_rise,
                    TriggerEdge::LoadScreenEnd => screen_end,
                    TriggerEdge::FadeOutEnd => fade_out_end,
                    TriggerEdge::DefeatFlagSet => defeat_set,
                };

                if edge
                    && rule.applies_to(config.template)
                    && config.is_armed(rule.area)
                    && rule.world.matches(cur.is_in_tamriel)
                    && rule.cell_matches(cur.world_x, cur.world_y)
                    && registry.try_fire(rule.area)
                {
                    log::info!("split: {} - {}", rule.area.display_name(), frame);
                    events.push(GameEvent::Split {
                        area: rule.area,
                        frame,
                    });
                }
            }
        }

        self.prev = cur;
        self.frame += 1;
        events
    }
}

impl Default for StateTracker {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::splits::{SplitArea, Template};

    fn all_armed() -> SplitterConfig {
        let mut config = SplitterConfig::default();
        config.arm_all();
        config
    }

    fn loading(on: bool) -> SampleSet {
        SampleSet {
            is_loading: on,
            ..SampleSet::default()
        }
    }

    #[test]
    fn load_level_sequence_yields_one_start_and_one_finish() {
        let mut tracker = StateTracker::new();
        let mut registry = SplitStateRegistry::new();
        let config = all_armed();

        let mut all = Vec::new();
        for &level in &[0, 0, 1, 1, 1, 0, 0] {
            all.extend(tracker.advance(
                &loading(level != 0),
                RunPhase::Running,
                &config,
                &mut registry,
            ));
        }

        assert_eq!(
            all,
            vec![
                GameEvent::LoadStarted { frame: 2 },
                GameEvent::LoadFinished { frame: 5 },
            ]
        );
    }

    #[test]
    fn loading_screen_forces_loading_state() {
        let mut tracker = StateTracker::new();
        let mut registry = SplitStateRegistry::new();
        let config = all_armed();

        let screen_on = SampleSet {
            is_loading_screen: true,
            ..SampleSet::default()
        };
        let events = tracker.advance(&screen_on, RunPhase::Running, &config, &mut registry);
        assert_eq!(
            events,
            vec![
                GameEvent::LoadStarted { frame: 0 },
                GameEvent::LoadScreenStarted { frame: 0 },
            ]
        );

        let events = tracker.advance(
            &SampleSet::default(),
            RunPhase::Running,
            &config,
            &mut registry,
        );
        assert_eq!(
            events,
            vec![
                GameEvent::LoadFinished { frame: 1 },
                GameEvent::LoadScreenFinished { frame: 1 },
            ]
        );
    }

    #[test]
    fn finishes_never_outnumber_starts() {
        let mut tracker = StateTracker::new();
        let mut registry = SplitStateRegistry::new();
        let config = all_armed();

        let mut starts = 0usize;
        let mut finishes = 0usize;
        for &level in &[1, 0, 1, 1, 0, 0, 1, 0, 1] {
            for event in tracker.advance(
                &loading(level != 0),
                RunPhase::Running,
                &config,
                &mut registry,
            ) {
                match event {
                    GameEvent::LoadStarted { .. } => starts += 1,
                    GameEvent::LoadFinished { .. } => {
                        finishes += 1;
                        // paired-edge invariant
                        assert!(finishes <= starts);
                    }
                    _ => {}
                }
            }
        }
        assert_eq!(starts, 4);
        assert_eq!(finishes, 4);
    }

    fn fade_out(on: bool, x: i32, y: i32) -> SampleSet {
        SampleSet {
            is_in_fade_out: on,
            is_in_tamriel: true,
            world_x: x,
            world_y: y,
            ..SampleSet::default()
        }
    }

    #[test]
    fn fade_out_end_at_start_cell_emits_reset_then_start() {
        let mut tracker = StateTracker::new();
        let mut registry = SplitStateRegistry::new();
        let config = SplitterConfig::default();

        tracker.advance(
            &fade_out(true, 3, -20),
            RunPhase::NotRunning,
            &config,
            &mut registry,
        );
        let events = tracker.advance(
            &fade_out(false, 3, -20),
            RunPhase::NotRunning,
            &config,
            &mut registry,
        );

        assert_eq!(
            events,
            vec![
                GameEvent::FirstLevelLoading { frame: 1 },
                GameEvent::PlayerGainedControl { frame: 1 },
            ]
        );
    }

    #[test]
    fn fade_out_end_cell_gate_is_exact() {
        let mut tracker = StateTracker::new();
        let mut registry = SplitStateRegistry::new();
        let config = SplitterConfig::default();

        tracker.advance(
            &fade_out(true, 3, -19),
            RunPhase::NotRunning,
            &config,
            &mut registry,
        );
        let events = tracker.advance(
            &fade_out(false, 3, -19),
            RunPhase::NotRunning,
            &config,
            &mut registry,
        );

        assert!(events.is_empty());
    }

    #[test]
    fn auto_start_disabled_suppresses_opening_events() {
        let mut tracker = StateTracker::new();
        let mut registry = SplitStateRegistry::new();
        let mut config = SplitterConfig::default();
        config.auto_start = false;

        tracker.advance(
            &fade_out(true, 3, -20),
            RunPhase::NotRunning,
            &config,
            &mut registry,
        );
        let events = tracker.advance(
            &fade_out(false, 3, -20),
            RunPhase::NotRunning,
            &config,
            &mut registry,
        );

        assert!(events.is_empty());
    }

    fn alduin_tick(defeated: bool) -> SampleSet {
        SampleSet {
            alduin_defeated: defeated,
            is_in_tamriel: false,
            world_x: 15,
            world_y: 19,
            ..SampleSet::default()
        }
    }

    #[test]
    fn milestone_fires_once_even_across_repeated_edges() {
        let mut tracker = StateTracker::new();
        let mut registry = SplitStateRegistry::new();
        let config = all_armed();

        let events = tracker.advance(&alduin_tick(true), RunPhase::Running, &config, &mut registry);
        assert_eq!(
            events,
            vec![GameEvent::Split {
                area: SplitArea::AlduinDefeated,
                frame: 0,
            }]
        );

        // flag stays set: no edge, no event
        let events = tracker.advance(&alduin_tick(true), RunPhase::Running, &config, &mut registry);
        assert!(events.is_empty());

        // flag cycles: second rising edge is suppressed by the registry
        tracker.advance(&alduin_tick(false), RunPhase::Running, &config, &mut registry);
        let events = tracker.advance(&alduin_tick(true), RunPhase::Running, &config, &mut registry);
        assert!(events.is_empty());
    }

    #[test]
    fn milestone_outside_running_phase_keeps_its_one_shot() {
        let mut tracker = StateTracker::new();
        let mut registry = SplitStateRegistry::new();
        let config = all_armed();

        // edge while not running: nothing fires, registry untouched
        let events = tracker.advance(
            &alduin_tick(true),
            RunPhase::NotRunning,
            &config,
            &mut registry,
        );
        assert!(events.is_empty());
        assert!(!registry.has_fired(SplitArea::AlduinDefeated));

        // same edge later, while running: fires
        tracker.advance(&alduin_tick(false), RunPhase::Running, &config, &mut registry);
        let events = tracker.advance(&alduin_tick(true), RunPhase::Running, &config, &mut registry);
        assert_eq!(events.len(), 1);
    }

    #[test]
    fn disarmed_milestone_never_fires() {
        let mut tracker = StateTracker::new();
        let mut registry = SplitStateRegistry::new();
        let mut config = all_armed();
        config.disarm(SplitArea::AlduinDefeated);

        let events = tracker.advance(&alduin_tick(true), RunPhase::Running, &config, &mut registry);
        assert!(events.is_empty());
        assert!(!registry.has_fired(SplitArea::AlduinDefeated));
    }

    #[test]
    fn template_filter_selects_milestone_variants() {
        // HorseClimb belongs to the gr3yscale route only
        let horse_climb_end = [
            SampleSet {
                is_loading_screen: true,
                is_in_tamriel: true,
                world_x: 13,
                world_y: -9,
                ..SampleSet::default()
            },
            SampleSet {
                is_in_tamriel: true,
                world_x: 13,
                world_y: -9,
                ..SampleSet::default()
            },
        ];

        let mut config = all_armed();
        config.template = Template::MrWalrus;
        let mut tracker = StateTracker::new();
        let mut registry = SplitStateRegistry::new();
        let mut fired = Vec::new();
        for sample in &horse_climb_end {
            fired.extend(tracker.advance(sample, RunPhase::Running, &config, &mut registry));
        }
        assert!(!fired
            .iter()
            .any(|e| matches!(e, GameEvent::Split { area: SplitArea::HorseClimb, .. })));

        config.template = Template::Gr3yscale;
        let mut tracker = StateTracker::new();
        let mut registry = SplitStateRegistry::new();
        let mut fired = Vec::new();
        for sample in &horse_climb_end {
            fired.extend(tracker.advance(sample, RunPhase::Running, &config, &mut registry));
        }
        assert!(fired
            .iter()
            .any(|e| matches!(e, GameEvent::Split { area: SplitArea::HorseClimb, .. })));
    }

    #[test]
    fn reset_and_replay_reproduces_the_same_emissions() {
        let sequence = [
            alduin_tick(false),
            alduin_tick(true),
            alduin_tick(true),
            alduin_tick(false),
            alduin_tick(true),
        ];
        let config = all_armed();

        let run = |registry: &mut SplitStateRegistry| -> Vec<GameEvent> {
            let mut tracker = StateTracker::new();
            let mut all = Vec::new();
            for sample in &sequence {
                all.extend(tracker.advance(sample, RunPhase::Running, &config, registry));
            }
            all
        };

        let mut registry = SplitStateRegistry::new();
        let first = run(&mut registry);

        registry.reset();
        let second = run(&mut registry);

        assert_eq!(first, second);
        assert_eq!(first.len(), 1);
    }
}
