//! Skill-scaled AI opponent.
//!
//! `AiPlayer` never touches `GameState` directly: it reads the state,
//! picks a `PlayerAction` and hands it to `BattleEngine::apply`.
//!
//! ## Turn Pipeline
//!
//! 1. Draw
//! 2. Play creatures
//! 3. Adjust creature modes
//! 4. Set spells face-down
//! 5. Activate supports and creature effects
//! 6. Attack
//! 7. End turn
//!
//! Each step runs with probability `AiConfig::participation`. Within a
//! step a candidate is picked at random with probability
//! `AiConfig::randomness`, otherwise from the best-scored few.

use super::config::AiConfig;
use super::pacing::{AiStep, TurnPacer};
use super::scoring;
use crate::cards::{Card, CardId, CardType};
use crate::core::{GameRng, PlayerId, LANE_COUNT, SUPPORT_SLOT_COUNT};
use crate::effects::EventData;
use crate::rules::{Activation, BattleEngine, PlayerAction};

/// Caps each pipeline step so a rejected action can never loop forever.
const MAX_STEP_ACTIONS: usize = LANE_COUNT + SUPPORT_SLOT_COUNT;

pub struct AiPlayer {
    config: AiConfig,
    rng: GameRng,
}

impl AiPlayer {
    #[must_use]
    pub fn new(config: AiConfig) -> Self {
        let rng = GameRng::new(config.seed).for_context(&format!("ai-{}", config.player));
        Self { config, rng }
    }

    #[must_use]
    pub fn config(&self) -> &AiConfig {
        &self.config
    }

    #[must_use]
    pub fn player(&self) -> PlayerId {
        self.config.player
    }

    /// Play a full turn. Does nothing if it is not our turn or the game is
    /// over. Returns the number of actions applied.
    pub fn take_turn(&mut self, engine: &mut BattleEngine, pacer: &mut impl TurnPacer) -> usize {
        if !self.our_turn(engine) {
            return 0;
        }
        pacer.pause(&AiStep::TurnStart);

        let mut taken = 0;
        if engine.legal_actions(self.player()).contains(&PlayerAction::Draw) {
            taken += usize::from(self.act(engine, pacer, PlayerAction::Draw));
        }

        taken += self.play_creatures(engine, pacer);
        taken += self.adjust_modes(engine, pacer);
        taken += self.play_spells(engine, pacer);
        taken += self.activate_effects(engine, pacer);
        taken += self.attack(engine, pacer);

        if self.config.end_turn && self.our_turn(engine) {
            pacer.pause(&AiStep::TurnEnd);
            taken += usize::from(self.act(engine, pacer, PlayerAction::EndTurn));
        }
        tracing::debug!("AI {} finished its turn after {} actions", self.player(), taken);
        taken
    }

    /// Decide whether to spring a trap while `attacker_lane` of the
    /// opponent attacks us.
    ///
    /// Traps that can only hit attack-mode enemies are held when there are
    /// none, and traps the oracle would reject are never tried.
    pub fn respond_to_attack(&mut self, engine: &mut BattleEngine, attacker_lane: usize) -> Option<Activation> {
        let player = self.player();
        if engine.state().is_over() {
            return None;
        }

        let threats = scoring::threat_count(engine.state(), player);
        let own_board_empty = !engine.state().player(player).has_creatures();
        let attacker = engine
            .state()
            .player(player.opponent())
            .creature(attacker_lane)
            .map(|c| c.instance);

        for action in engine.legal_actions(player) {
            let PlayerAction::ActivateTrap { slot, .. } = action else {
                continue;
            };
            let Some(effect_id) = engine
                .state()
                .player(player)
                .support(slot)
                .and_then(|c| c.effect_id.clone())
            else {
                continue;
            };

            let pointless = engine
                .effects()
                .get(&effect_id)
                .is_some_and(|def| def.requires_attack_mode_targets())
                && threats == 0;
            if pointless || !engine.check_activation(&effect_id, player).is_allowed() {
                tracing::debug!("AI {} holds trap in slot {}", player, slot);
                continue;
            }

            let p = scoring::trap_probability(self.config.skill(), threats, own_board_empty);
            if self.rng.chance(p) {
                let event = EventData {
                    target_player: Some(player.opponent()),
                    target_lane: Some(attacker_lane),
                    target_instance: attacker,
                };
                tracing::debug!("AI {} springs trap in slot {} (p={:.2})", player, slot, p);
                return engine.activate_trap(player, slot, event).ok();
            }
        }
        None
    }

    // === Pipeline Steps ===

    fn play_creatures(&mut self, engine: &mut BattleEngine, pacer: &mut impl TurnPacer) -> usize {
        self.run_step(engine, pacer, |engine, player, action| match action {
            PlayerAction::PlayCreature { lane, card, .. } => {
                let card = hand_card(engine, player, *card)?;
                let value = scoring::creature_value(card) / 100.0;
                Some(value + scoring::lane_score(engine.state(), player, card, *lane))
            }
            _ => None,
        })
    }

    fn adjust_modes(&mut self, engine: &mut BattleEngine, pacer: &mut impl TurnPacer) -> usize {
        let player = self.player();
        let mut taken = 0;
        for lane in 0..LANE_COUNT {
            if !self.our_turn(engine) || !self.rng.chance(self.config.participation()) {
                continue;
            }
            let toggle = PlayerAction::ToggleMode { lane };
            if !engine.legal_actions(player).contains(&toggle) {
                continue;
            }
            let wanted = if self.rng.chance(self.config.randomness()) {
                self.rng.chance(0.25)
            } else {
                scoring::preferred_mode(engine.state(), player, lane).is_some()
            };
            if wanted {
                taken += usize::from(self.act(engine, pacer, toggle));
            }
        }
        taken
    }

    fn play_spells(&mut self, engine: &mut BattleEngine, pacer: &mut impl TurnPacer) -> usize {
        self.run_step(engine, pacer, |engine, player, action| match action {
            PlayerAction::PlaySupport { card, .. } => {
                let card = hand_card(engine, player, *card)?;
                Some(match card.card_type() {
                    CardType::Trap => 2.0,
                    CardType::Support => 1.5,
                    CardType::Action | CardType::Creature => 1.0,
                })
            }
            _ => None,
        })
    }

    fn activate_effects(&mut self, engine: &mut BattleEngine, pacer: &mut impl TurnPacer) -> usize {
        self.run_step(engine, pacer, |engine, player, action| {
            let card = match action {
                PlayerAction::ActivateSupport { slot, .. } => engine.state().player(player).support(*slot)?,
                PlayerAction::ActivateCreatureEffect { lane, .. } | PlayerAction::FlipFaceUp { lane } => {
                    engine.state().player(player).creature(*lane)?
                }
                _ => return None,
            };
            if let Some(effect) = &card.effect_id {
                if !engine.check_activation(effect, player).is_allowed() {
                    return None;
                }
            }
            let target_value = match action {
                PlayerAction::ActivateSupport { event, .. } | PlayerAction::ActivateCreatureEffect { event, .. } => {
                    target_value(engine, player, event)
                }
                _ => 0.0,
            };
            Some(1.0 + target_value)
        })
    }

    fn attack(&mut self, engine: &mut BattleEngine, pacer: &mut impl TurnPacer) -> usize {
        let careful = self.config.randomness() < 0.5;
        self.run_step(engine, pacer, move |engine, player, action| match action {
            PlayerAction::Attack { attacker, target } => {
                let score = scoring::attack_score(engine.state(), player, *attacker, *target)?;
                (!careful || score >= 0.0).then_some(score)
            }
            _ => None,
        })
    }

    // === Helpers ===

    fn our_turn(&self, engine: &BattleEngine) -> bool {
        !engine.state().is_over() && engine.state().active_player == self.player()
    }

    /// Repeatedly score the legal actions, pick one and apply it, until the
    /// participation roll fails or nothing scores.
    fn run_step<F>(&mut self, engine: &mut BattleEngine, pacer: &mut impl TurnPacer, score: F) -> usize
    where
        F: Fn(&BattleEngine, PlayerId, &PlayerAction) -> Option<f64>,
    {
        let player = self.player();
        let mut taken = 0;
        for _ in 0..MAX_STEP_ACTIONS {
            if !self.our_turn(engine) || !self.rng.chance(self.config.participation()) {
                break;
            }
            let view: &BattleEngine = engine;
            let scored: Vec<(PlayerAction, f64)> = view
                .legal_actions(player)
                .into_iter()
                .filter_map(|action| score(view, player, &action).map(|s| (action, s)))
                .collect();
            let Some(action) = self.pick(scored) else {
                break;
            };
            if self.act(engine, pacer, action) {
                taken += 1;
            } else {
                break;
            }
        }
        taken
    }

    fn pick(&mut self, mut scored: Vec<(PlayerAction, f64)>) -> Option<PlayerAction> {
        if scored.is_empty() {
            return None;
        }
        if !self.rng.chance(self.config.randomness()) {
            scored.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(std::cmp::Ordering::Equal));
            scored.truncate(self.config.top_candidates());
        }
        let index = self.rng.gen_range_usize(0..scored.len());
        Some(scored.swap_remove(index).0)
    }

    fn act(&mut self, engine: &mut BattleEngine, pacer: &mut impl TurnPacer, action: PlayerAction) -> bool {
        match engine.apply(self.player(), &action) {
            Ok(outcome) => {
                tracing::debug!("AI {} applied {:?}: {:?}", self.player(), action, outcome);
                pacer.pause(&AiStep::Acted(action));
                true
            }
            Err(err) => {
                tracing::debug!("AI {} action {:?} rejected: {}", self.player(), action, err);
                false
            }
        }
    }
}

impl std::fmt::Debug for AiPlayer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AiPlayer").field("config", &self.config).finish_non_exhaustive()
    }
}

fn hand_card(engine: &BattleEngine, player: PlayerId, card: CardId) -> Option<&Card> {
    engine.state().player(player).hand.iter().find(|c| c.id == card)
}

/// Enemy targets are worth their attack; friendly ones a flat bonus.
fn target_value(engine: &BattleEngine, player: PlayerId, event: &EventData) -> f64 {
    let Some(instance) = event.target_instance else {
        return 0.0;
    };
    match engine.state().locate_creature(instance) {
        Some((owner, lane)) if owner != player => engine
            .state()
            .player(owner)
            .creature(lane)
            .and_then(Card::creature)
            .map(|c| f64::from(c.attack) / 100.0)
            .unwrap_or(0.0),
        Some(_) => 0.5,
        None => 0.0,
    }
}
