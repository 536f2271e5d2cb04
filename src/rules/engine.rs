//! The battle engine: every player-facing action.
//!
//! `BattleEngine` owns the `GameState` for a match and is the only way
//! humans and AI change it. Each action:
//!
//! 1. Validates completely (an `Err` means nothing changed)
//! 2. Moves cards with zone transfers and updates flags
//! 3. Logs a structured event
//! 4. Runs the resolver for any triggered effect
//!
//! Once a winner is recorded every action returns `ActionError::GameOver`.

use std::sync::Arc;

use smallvec::{smallvec, SmallVec};

use super::action::{PlayOptions, PlayerAction};
use super::combat::{self, Exchange};
use super::error::ActionError;
use crate::cards::{Card, CardId, CardType, EffectType, Mode, SupportTarget};
use crate::core::{
    EntityRef, EventKind, GameState, InstanceId, Phase, PlayerId, LANE_COUNT, SUPPORT_SLOT_COUNT,
};
use crate::effects::{
    active, ActivationCheck, ActivationOracle, BoardTargetProvider, EffectHandler, EffectId,
    EffectNotice, EffectRegistry, EffectResolver, EventData, RequirementOracle, Resolution,
    ResolveRequest, SourceRef, TargetOption, TargetProvider, Trigger,
};
use crate::zones::{self, transfer, CardRef, Zone};

/// Final result of a match.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct GameResult {
    pub winner: PlayerId,
    /// Turn on which the game ended.
    pub turn: u32,
}

impl GameResult {
    #[must_use]
    pub fn is_winner(&self, player: PlayerId) -> bool {
        self.winner == player
    }
}

/// Result of a manual support or trap activation.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Activation {
    /// The effect ran (or was skipped by the resolver).
    Resolved(Resolution),
    /// The activation check failed. The card was revealed and discarded.
    Fizzled { reason: String },
}

/// What an attack did.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum AttackOutcome {
    /// Empty lane, empty board: damage straight to life points.
    Direct { damage: i64 },
    /// Empty lane but the defender has creatures elsewhere. Nothing happens.
    Blocked,
    /// Creature against creature.
    Clash {
        exchange: Exchange,
        revealed: bool,
        destroyed: SmallVec<[InstanceId; 2]>,
    },
    /// The attacker's own `ON_ATTACK` effect removed it or ended the game.
    Interrupted,
}

/// Result of [`BattleEngine::apply`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Outcome {
    Drew(Option<InstanceId>),
    Played(InstanceId),
    Activated(Activation),
    Resolved(Resolution),
    ModeChanged(Mode),
    Attacked(AttackOutcome),
    TurnEnded,
}

/// The rules engine for one match.
///
/// ```
/// use std::sync::Arc;
/// use lane_duel::cards::{CardDefinition, CardId, CardRegistry};
/// use lane_duel::core::{MatchBuilder, MatchConfig, Phase, PlayerId};
/// use lane_duel::effects::EffectRegistry;
/// use lane_duel::rules::{BattleEngine, PlayOptions};
///
/// let mut cards = CardRegistry::new();
/// cards
///     .register(CardDefinition::creature(CardId::new(1), "Wolf", 60, 20, 40))
///     .unwrap();
/// let state = MatchBuilder::new(&cards, MatchConfig::default())
///     .with_deck(PlayerId(0), vec![CardId::new(1); 8])
///     .with_deck(PlayerId(1), vec![CardId::new(1); 8])
///     .build()
///     .unwrap();
///
/// let mut engine = BattleEngine::new(state, Arc::new(EffectRegistry::new()));
/// engine.draw(PlayerId(0)).unwrap();
/// assert_eq!(engine.state().phase, Phase::Main);
///
/// engine
///     .play_creature(PlayerId(0), 1, CardId::new(1), PlayOptions::default())
///     .unwrap();
/// assert!(engine.state().player(PlayerId(0)).creature(1).is_some());
/// ```
pub struct BattleEngine {
    state: GameState,
    resolver: EffectResolver,
    oracle: Box<dyn ActivationOracle + Send + Sync>,
    targets: Box<dyn TargetProvider + Send + Sync>,
}

impl BattleEngine {
    /// Engine with the default collaborators: interpreter handlers for
    /// every registered effect, `RequirementOracle`, `BoardTargetProvider`.
    #[must_use]
    pub fn new(state: GameState, effects: Arc<EffectRegistry>) -> Self {
        Self {
            state,
            oracle: Box::new(RequirementOracle::new(Arc::clone(&effects))),
            resolver: EffectResolver::new(effects),
            targets: Box::new(BoardTargetProvider),
        }
    }

    /// Called whenever an effect visibly resolves.
    #[must_use]
    pub fn with_observer(mut self, observer: impl Fn(&EffectNotice) + Send + Sync + 'static) -> Self {
        self.resolver = self.resolver.with_observer(observer);
        self
    }

    #[must_use]
    pub fn with_oracle(mut self, oracle: impl ActivationOracle + Send + Sync + 'static) -> Self {
        self.oracle = Box::new(oracle);
        self
    }

    #[must_use]
    pub fn with_target_provider(mut self, targets: impl TargetProvider + Send + Sync + 'static) -> Self {
        self.targets = Box::new(targets);
        self
    }

    /// Replace the handler for one effect id.
    #[must_use]
    pub fn with_handler(
        mut self,
        id: impl Into<EffectId>,
        handler: impl EffectHandler + Send + Sync + 'static,
    ) -> Self {
        self.resolver.handlers_mut().register(id, handler);
        self
    }

    #[must_use]
    pub fn state(&self) -> &GameState {
        &self.state
    }

    /// Direct state access for setup and tests. Skips all validation.
    pub fn state_mut(&mut self) -> &mut GameState {
        &mut self.state
    }

    #[must_use]
    pub fn into_state(self) -> GameState {
        self.state
    }

    #[must_use]
    pub fn effects(&self) -> &EffectRegistry {
        self.resolver.registry()
    }

    #[must_use]
    pub fn result(&self) -> Option<GameResult> {
        self.state.winner.map(|winner| GameResult {
            winner,
            turn: self.state.turn,
        })
    }

    /// Ask the activation oracle about an effect.
    #[must_use]
    pub fn check_activation(&self, effect: &EffectId, player: PlayerId) -> ActivationCheck {
        self.oracle.check(effect, &self.state, player)
    }

    /// Legal targets for a targeted effect. Empty for untargeted effects.
    #[must_use]
    pub fn target_options(&self, effect: &EffectId, player: PlayerId) -> Vec<TargetOption> {
        self.effects()
            .get(effect)
            .and_then(|def| def.target.as_ref())
            .map(|target| self.targets.options(target, &self.state, player))
            .unwrap_or_default()
    }

    // === Validation ===

    fn ensure_live(&self) -> Result<(), ActionError> {
        if self.state.is_over() {
            return Err(ActionError::GameOver);
        }
        Ok(())
    }

    fn ensure_turn(&self, player: PlayerId) -> Result<(), ActionError> {
        self.ensure_live()?;
        if self.state.active_player != player {
            return Err(ActionError::NotYourTurn(player));
        }
        Ok(())
    }

    fn ensure_main(&self, player: PlayerId) -> Result<(), ActionError> {
        self.ensure_turn(player)?;
        if self.state.phase != Phase::Main {
            return Err(ActionError::WrongPhase {
                expected: Phase::Main,
                actual: self.state.phase,
            });
        }
        Ok(())
    }

    fn lane_card(&self, player: PlayerId, lane: usize) -> Result<&Card, ActionError> {
        if lane >= LANE_COUNT {
            return Err(ActionError::InvalidLane(lane));
        }
        self.state
            .player(player)
            .creature(lane)
            .ok_or(ActionError::EmptyLane(lane))
    }

    fn slot_card(&self, player: PlayerId, slot: usize) -> Result<&Card, ActionError> {
        if slot >= SUPPORT_SLOT_COUNT {
            return Err(ActionError::InvalidSlot(slot));
        }
        self.state
            .player(player)
            .support(slot)
            .ok_or(ActionError::EmptySlot(slot))
    }

    fn hand_card(&self, player: PlayerId, card: CardId) -> Result<&Card, ActionError> {
        self.state
            .player(player)
            .hand
            .iter()
            .find(|c| c.id == card)
            .ok_or(ActionError::CardNotInHand(card))
    }

    fn validate_draw(&self, player: PlayerId) -> Result<(), ActionError> {
        self.ensure_turn(player)?;
        if self.state.phase != Phase::Draw || self.state.has_drawn {
            return Err(ActionError::WrongPhase {
                expected: Phase::Draw,
                actual: self.state.phase,
            });
        }
        Ok(())
    }

    fn validate_play_creature(&self, player: PlayerId, lane: usize, card: CardId) -> Result<(), ActionError> {
        self.ensure_main(player)?;
        if lane >= LANE_COUNT {
            return Err(ActionError::InvalidLane(lane));
        }
        if self.state.player(player).creature(lane).is_some() {
            return Err(ActionError::LaneOccupied(lane));
        }
        let found = self.hand_card(player, card)?.card_type();
        if found != CardType::Creature {
            return Err(ActionError::WrongCardType { found });
        }
        Ok(())
    }

    fn validate_play_support(&self, player: PlayerId, slot: usize, card: CardId) -> Result<(), ActionError> {
        self.ensure_main(player)?;
        if slot >= SUPPORT_SLOT_COUNT {
            return Err(ActionError::InvalidSlot(slot));
        }
        if self.state.player(player).support(slot).is_some() {
            return Err(ActionError::SlotOccupied(slot));
        }
        let found = self.hand_card(player, card)?.card_type();
        if !found.uses_support_slot() {
            return Err(ActionError::WrongCardType { found });
        }
        Ok(())
    }

    fn ensure_face_down_inactive(card: &Card) -> Result<(), ActionError> {
        if !card.is_face_down() {
            return Err(ActionError::NotFaceDown);
        }
        if card.spell().is_some_and(|s| s.is_active) {
            return Err(ActionError::AlreadyActive);
        }
        Ok(())
    }

    fn validate_activate_support(&self, player: PlayerId, slot: usize) -> Result<&Card, ActionError> {
        self.ensure_main(player)?;
        let card = self.slot_card(player, slot)?;
        let found = card.card_type();
        if !matches!(found, CardType::Support | CardType::Action) {
            return Err(ActionError::WrongCardType { found });
        }
        Self::ensure_face_down_inactive(card)?;
        Ok(card)
    }

    fn validate_creature_effect(&self, player: PlayerId, lane: usize) -> Result<EffectId, ActionError> {
        self.ensure_main(player)?;
        let card = self.lane_card(player, lane)?;
        let creature = card.creature().ok_or(ActionError::WrongCardType {
            found: card.card_type(),
        })?;
        if creature.face_down {
            return Err(ActionError::FaceDown);
        }
        let effect = card.effect_id.clone().ok_or(ActionError::NoEffect)?;
        let spent = match card.effect_type {
            Some(EffectType::Continuous) => creature.has_activated_effect,
            Some(EffectType::OneTime) | None => creature.effect_consumed,
        };
        if spent {
            return Err(ActionError::EffectSpent);
        }
        if let ActivationCheck::Denied { reason } = self.check_activation(&effect, player) {
            return Err(ActionError::ActivationDenied { reason });
        }
        Ok(effect)
    }

    fn validate_trap(&self, player: PlayerId, slot: usize) -> Result<EffectId, ActionError> {
        self.ensure_live()?;
        let card = self.slot_card(player, slot)?;
        if card.card_type() != CardType::Trap {
            return Err(ActionError::NotATrap);
        }
        Self::ensure_face_down_inactive(card)?;
        let effect = card.effect_id.clone().ok_or(ActionError::NotATrap)?;
        let defends = self
            .effects()
            .get(&effect)
            .is_some_and(|def| def.trigger == Trigger::OnDefend);
        if !defends {
            return Err(ActionError::NotATrap);
        }
        Ok(effect)
    }

    fn validate_toggle(&self, player: PlayerId, lane: usize) -> Result<(), ActionError> {
        self.ensure_main(player)?;
        let creature = self.lane_card(player, lane)?.creature().ok_or(ActionError::EmptyLane(lane))?;
        if creature.has_changed_mode {
            return Err(ActionError::AlreadyChangedMode);
        }
        Ok(())
    }

    /// Revealing needs only a live game and a face-down creature, on either turn.
    fn validate_flip(&self, player: PlayerId, lane: usize) -> Result<(), ActionError> {
        self.ensure_live()?;
        if !self.lane_card(player, lane)?.is_face_down() {
            return Err(ActionError::NotFaceDown);
        }
        Ok(())
    }

    fn validate_attack(&self, player: PlayerId, attacker: usize, target: usize) -> Result<(), ActionError> {
        self.ensure_main(player)?;
        if self.state.turn == 1 && player == self.state.first_player {
            return Err(ActionError::FirstTurnAttack);
        }
        if target >= LANE_COUNT {
            return Err(ActionError::InvalidLane(target));
        }
        let creature = self
            .lane_card(player, attacker)?
            .creature()
            .ok_or(ActionError::EmptyLane(attacker))?;
        if creature.face_down {
            return Err(ActionError::FaceDown);
        }
        if creature.mode != Mode::Attack {
            return Err(ActionError::NotAttackMode);
        }
        if creature.has_attacked {
            return Err(ActionError::AlreadyAttacked);
        }
        Ok(())
    }

    // === Helpers ===

    fn resolve(
        &mut self,
        effect_id: Option<EffectId>,
        trigger: Trigger,
        owner: PlayerId,
        source: &Card,
        event: EventData,
    ) -> Resolution {
        let request = ResolveRequest {
            effect_id,
            trigger,
            owner,
            source: SourceRef {
                card: source.id,
                instance: source.instance,
            },
            event,
        };
        self.resolver.resolve(&mut self.state, &request)
    }

    fn card_refs(card: &Card) -> EntityRef {
        EntityRef::Card {
            card: card.id,
            instance: card.instance,
        }
    }

    /// Where a targeted support card points, from the activation's event data.
    fn support_target(&self, player: PlayerId, event: &EventData) -> Option<SupportTarget> {
        if event.is_empty() {
            return None;
        }
        let located = event.target_instance.and_then(|i| self.state.locate_creature(i));
        let target_player = event
            .target_player
            .or(located.map(|(p, _)| p))
            .unwrap_or_else(|| player.opponent());
        let lane = event.target_lane.or(located.map(|(_, l)| l));
        let instance = event.target_instance.or_else(|| {
            lane.and_then(|l| self.state.player(target_player).creature(l))
                .map(|c| c.instance)
        });
        Some(SupportTarget {
            player: target_player,
            lane,
            instance,
        })
    }

    /// Reveal a support-zone card, log the failed check and discard it.
    fn fizzle(&mut self, player: PlayerId, slot: usize, reason: String) -> Activation {
        let mut refs: SmallVec<[EntityRef; 3]> = smallvec![EntityRef::Slot { player, slot }];
        let mut name = String::new();
        if let Some(card) = self.state.player_mut(player).support_mut(slot) {
            card.set_face_down(false);
            name = card.name.clone();
            refs.push(Self::card_refs(card));
        }
        self.state.record(
            EventKind::Activate,
            Some(player),
            format!("{name} fizzles: {reason}"),
            refs,
        );
        zones::discard_support(&mut self.state, player, slot);
        Activation::Fizzled { reason }
    }

    /// Flip a support-zone card face-up and mark it active.
    fn reveal_support(&mut self, player: PlayerId, slot: usize, target: Option<SupportTarget>) -> Option<Card> {
        let card = self.state.player_mut(player).support_mut(slot)?;
        card.set_face_down(false);
        if let Some(spell) = card.spell_mut() {
            spell.is_active = true;
            if target.is_some() {
                spell.target = target;
            }
        }
        let card = card.clone();
        self.state.record(
            EventKind::Activate,
            Some(player),
            format!("{player} activates {}", card.name),
            smallvec![Self::card_refs(&card), EntityRef::Slot { player, slot }],
        );
        Some(card)
    }

    // === Actions ===

    /// Draw the top card and move to the main phase.
    ///
    /// With an empty deck the phase still advances and `None` is returned.
    pub fn draw(&mut self, player: PlayerId) -> Result<Option<InstanceId>, ActionError> {
        self.validate_draw(player)?;

        let top = self.state.player(player).deck.front().map(|c| c.instance);
        self.state.has_drawn = true;
        let Some(top) = top else {
            self.state.phase = Phase::Main;
            self.state.record(
                EventKind::Draw,
                Some(player),
                format!("{player} has no cards left to draw"),
                smallvec![EntityRef::Player { player }],
            );
            return Ok(None);
        };

        transfer(&mut self.state, player, top, Zone::Deck, Zone::Hand);
        let drawn = self
            .state
            .player(player)
            .hand
            .last()
            .filter(|c| c.instance == top)
            .cloned();
        if let Some(card) = &drawn {
            self.state.record(
                EventKind::Draw,
                Some(player),
                format!("{player} draws {}", card.name),
                smallvec![Self::card_refs(card)],
            );
        }
        self.state.phase = Phase::Main;
        if let Some(card) = drawn {
            self.resolve(card.effect_id.clone(), Trigger::OnDraw, player, &card, EventData::default());
        }
        Ok(Some(top))
    }

    /// Put a creature from hand into an empty lane.
    ///
    /// Already-active effects that cover it apply at once. The creature's
    /// own effect does not fire; it must be activated.
    pub fn play_creature(
        &mut self,
        player: PlayerId,
        lane: usize,
        card: CardId,
        options: PlayOptions,
    ) -> Result<InstanceId, ActionError> {
        self.validate_play_creature(player, lane, card)?;

        let instance = transfer(&mut self.state, player, CardRef::Definition(card), Zone::Hand, Zone::Lane(lane))
            .ok_or(ActionError::CardNotInHand(card))?;
        let placed = self.state.player_mut(player).creature_mut(lane).map(|c| {
            if let Some(creature) = c.creature_mut() {
                creature.face_down = options.face_down;
                creature.mode = options.mode;
            }
            c.clone()
        });

        if let Some(placed) = placed {
            let message = if options.face_down {
                format!("{player} sets a creature face-down in lane {}", lane + 1)
            } else {
                format!("{player} plays {} in lane {}", placed.name, lane + 1)
            };
            self.state.record(
                EventKind::Play,
                Some(player),
                message,
                smallvec![Self::card_refs(&placed), EntityRef::Lane { player, lane }],
            );
        }
        active::apply_matching(&mut self.state, player, lane);
        Ok(instance)
    }

    /// Set an action, support or trap card face-down in an empty slot.
    pub fn play_support(&mut self, player: PlayerId, slot: usize, card: CardId) -> Result<InstanceId, ActionError> {
        self.validate_play_support(player, slot, card)?;

        let instance = transfer(&mut self.state, player, CardRef::Definition(card), Zone::Hand, Zone::Support(slot))
            .ok_or(ActionError::CardNotInHand(card))?;
        let mut refs: SmallVec<[EntityRef; 3]> = smallvec![EntityRef::Slot { player, slot }];
        if let Some(placed) = self.state.player_mut(player).support_mut(slot) {
            if let Some(spell) = placed.spell_mut() {
                spell.face_down = true;
                spell.is_active = false;
                spell.target = None;
            }
            refs.push(Self::card_refs(placed));
        }
        self.state.record(
            EventKind::Play,
            Some(player),
            format!("{player} sets a card face-down in support slot {}", slot + 1),
            refs,
        );
        Ok(instance)
    }

    /// Flip and resolve a face-down action or support card.
    ///
    /// A failed activation check still reveals and discards the card.
    /// Afterwards action cards and one-time supports go to the discard;
    /// continuous supports stay while their target (if any) is on the field.
    pub fn activate_support(
        &mut self,
        player: PlayerId,
        slot: usize,
        event: EventData,
    ) -> Result<Activation, ActionError> {
        let card = self.validate_activate_support(player, slot)?;
        let effect_id = card.effect_id.clone();
        let is_action = card.card_type() == CardType::Action;
        let continuous = card.effect_type == Some(EffectType::Continuous);

        if let Some(effect) = &effect_id {
            if let ActivationCheck::Denied { reason } = self.check_activation(effect, player) {
                return Ok(self.fizzle(player, slot, reason));
            }
        }

        let targeted = !is_action
            && effect_id
                .as_ref()
                .and_then(|id| self.effects().get(id))
                .is_some_and(|def| def.target.is_some());
        let target = targeted.then(|| self.support_target(player, &event)).flatten();

        let Some(card) = self.reveal_support(player, slot, target) else {
            return Err(ActionError::EmptySlot(slot));
        };
        let resolution = self.resolve(effect_id, Trigger::OnPlay, player, &card, event);

        if let Some(slot) = self.state.player(player).find_support_slot(card.instance) {
            let target_gone = self
                .state
                .player(player)
                .support(slot)
                .and_then(|c| c.spell())
                .and_then(|s| s.target.as_ref())
                .and_then(|t| t.instance)
                .is_some_and(|i| self.state.locate_creature(i).is_none());
            if is_action || !continuous || target_gone {
                zones::discard_support(&mut self.state, player, slot);
            }
        }
        Ok(Activation::Resolved(resolution))
    }

    /// Activate the effect of a face-up creature.
    ///
    /// One-time effects are spent for good; continuous ones once per turn.
    /// Resolves as `ON_PLAY`. With no event data the creature is its own
    /// target.
    pub fn activate_creature_effect(
        &mut self,
        player: PlayerId,
        lane: usize,
        event: EventData,
    ) -> Result<Resolution, ActionError> {
        let effect_id = self.validate_creature_effect(player, lane)?;

        let Some(card) = self.state.player_mut(player).creature_mut(lane) else {
            return Err(ActionError::EmptyLane(lane));
        };
        let continuous = card.effect_type == Some(EffectType::Continuous);
        if let Some(creature) = card.creature_mut() {
            if continuous {
                creature.has_activated_effect = true;
            } else {
                creature.effect_consumed = true;
            }
        }
        let card = card.clone();

        self.state.record(
            EventKind::Activate,
            Some(player),
            format!("{player} activates the effect of {}", card.name),
            smallvec![Self::card_refs(&card), EntityRef::Lane { player, lane }],
        );
        let event = if event.is_empty() {
            EventData {
                target_player: Some(player),
                target_lane: Some(lane),
                target_instance: Some(card.instance),
            }
        } else {
            event
        };
        Ok(self.resolve(Some(effect_id), Trigger::OnPlay, player, &card, event))
    }

    /// Spring a face-down trap. Allowed at any time, including the
    /// opponent's turn. The trap is always discarded afterwards.
    pub fn activate_trap(
        &mut self,
        player: PlayerId,
        slot: usize,
        event: EventData,
    ) -> Result<Activation, ActionError> {
        let effect_id = self.validate_trap(player, slot)?;

        if let ActivationCheck::Denied { reason } = self.check_activation(&effect_id, player) {
            return Ok(self.fizzle(player, slot, reason));
        }

        let Some(card) = self.reveal_support(player, slot, None) else {
            return Err(ActionError::EmptySlot(slot));
        };
        let resolution = self.resolve(Some(effect_id), Trigger::OnDefend, player, &card, event);
        if let Some(slot) = self.state.player(player).find_support_slot(card.instance) {
            zones::discard_support(&mut self.state, player, slot);
        }
        Ok(Activation::Resolved(resolution))
    }

    /// Switch a creature between attack and defense mode, once per turn.
    pub fn toggle_mode(&mut self, player: PlayerId, lane: usize) -> Result<Mode, ActionError> {
        self.validate_toggle(player, lane)?;

        let Some(card) = self.state.player_mut(player).creature_mut(lane) else {
            return Err(ActionError::EmptyLane(lane));
        };
        let mut mode = Mode::Attack;
        if let Some(creature) = card.creature_mut() {
            creature.mode = creature.mode.toggled();
            creature.has_changed_mode = true;
            mode = creature.mode;
        }
        let (name, refs) = (card.name.clone(), Self::card_refs(card));
        let label = match mode {
            Mode::Attack => "attack",
            Mode::Defense => "defense",
        };
        self.state.record(
            EventKind::ModeChange,
            Some(player),
            format!("{name} switches to {label} mode"),
            smallvec![refs, EntityRef::Lane { player, lane }],
        );
        Ok(mode)
    }

    /// Reveal a face-down creature and fire its `ON_PLAY` effect.
    ///
    /// The reveal does not spend the creature's manual activation.
    pub fn flip_face_up(&mut self, player: PlayerId, lane: usize) -> Result<Resolution, ActionError> {
        self.validate_flip(player, lane)?;

        let Some(card) = self.state.player_mut(player).creature_mut(lane) else {
            return Err(ActionError::EmptyLane(lane));
        };
        card.set_face_down(false);
        let card = card.clone();
        active::apply_matching(&mut self.state, player, lane);

        self.state.record(
            EventKind::Flip,
            Some(player),
            format!("{player} flips {} face-up", card.name),
            smallvec![Self::card_refs(&card), EntityRef::Lane { player, lane }],
        );
        let event = EventData {
            target_player: Some(player),
            target_lane: Some(lane),
            target_instance: Some(card.instance),
        };
        Ok(self.resolve(card.effect_id.clone(), Trigger::OnPlay, player, &card, event))
    }

    /// Attack the opposing lane `target` with the creature in `attacker`.
    pub fn attack(&mut self, player: PlayerId, attacker: usize, target: usize) -> Result<AttackOutcome, ActionError> {
        self.validate_attack(player, attacker, target)?;
        let opponent = player.opponent();

        let Some(card) = self.state.player_mut(player).creature_mut(attacker) else {
            return Err(ActionError::EmptyLane(attacker));
        };
        if let Some(creature) = card.creature_mut() {
            creature.has_attacked = true;
        }
        let attacking = card.clone();
        let defender_instance = self.state.player(opponent).creature(target).map(|c| c.instance);

        self.state.record(
            EventKind::Attack,
            Some(player),
            format!("{} attacks lane {} of {opponent}", attacking.name, target + 1),
            smallvec![
                Self::card_refs(&attacking),
                EntityRef::Lane {
                    player: opponent,
                    lane: target
                },
            ],
        );
        let event = EventData {
            target_player: Some(opponent),
            target_lane: Some(target),
            target_instance: defender_instance,
        };
        self.resolve(attacking.effect_id.clone(), Trigger::OnAttack, player, &attacking, event);

        if self.state.is_over() {
            return Ok(AttackOutcome::Interrupted);
        }
        let attack_value = match self
            .state
            .player(player)
            .creature(attacker)
            .filter(|c| c.instance == attacking.instance)
            .and_then(Card::creature)
        {
            Some(creature) if creature.mode == Mode::Attack => creature.attack,
            _ => return Ok(AttackOutcome::Interrupted),
        };

        if self.state.player(opponent).creature(target).is_none() {
            if self.state.player(opponent).has_creatures() {
                return Ok(AttackOutcome::Blocked);
            }
            let damage = i64::from(attack_value.max(0));
            self.state.record(
                EventKind::Damage,
                Some(player),
                format!("{} deals {damage} damage to {opponent}", attacking.name),
                smallvec![
                    Self::card_refs(&attacking),
                    EntityRef::Player { player: opponent }
                ],
            );
            self.state.change_life(opponent, -damage);
            return Ok(AttackOutcome::Direct { damage });
        }

        Ok(self.clash(player, attacker, target, &attacking))
    }

    fn clash(&mut self, player: PlayerId, attacker: usize, target: usize, attacking: &Card) -> AttackOutcome {
        let opponent = player.opponent();

        let mut revealed = false;
        if let Some(defender) = self.state.player_mut(opponent).creature_mut(target) {
            if defender.is_face_down() {
                defender.set_face_down(false);
                revealed = true;
            }
        }
        let (Some(attacker_card), Some(defender_card)) = (
            self.state.player(player).creature(attacker).cloned(),
            self.state.player(opponent).creature(target).cloned(),
        ) else {
            return AttackOutcome::Interrupted;
        };
        if revealed {
            self.state.record(
                EventKind::Flip,
                Some(opponent),
                format!("{} is revealed", defender_card.name),
                smallvec![Self::card_refs(&defender_card)],
            );
        }
        let (Some(att), Some(def)) = (attacker_card.creature(), defender_card.creature()) else {
            return AttackOutcome::Interrupted;
        };

        let exchange = combat::exchange(att, def);
        if let Some(c) = self
            .state
            .player_mut(opponent)
            .creature_mut(target)
            .and_then(Card::creature_mut)
        {
            c.take_damage(exchange.to_defender);
        }
        if let Some(c) = self
            .state
            .player_mut(player)
            .creature_mut(attacker)
            .and_then(Card::creature_mut)
        {
            c.take_damage(exchange.to_attacker);
        }
        self.state.record(
            EventKind::Damage,
            Some(player),
            format!(
                "{} deals {} to {}, takes {}",
                attacking.name, exchange.to_defender, defender_card.name, exchange.to_attacker
            ),
            smallvec![Self::card_refs(&attacker_card), Self::card_refs(&defender_card)],
        );

        let dead = |state: &GameState, side: PlayerId, lane: usize| {
            state
                .player(side)
                .creature(lane)
                .and_then(Card::creature)
                .is_some_and(|c| c.is_destroyed())
        };
        let mut destroyed_cards = Vec::new();
        if dead(&self.state, opponent, target) {
            destroyed_cards.extend(zones::destroy_creature(&mut self.state, opponent, target));
        }
        if dead(&self.state, player, attacker) {
            destroyed_cards.extend(zones::destroy_creature(&mut self.state, player, attacker));
        }
        let destroyed = destroyed_cards.iter().map(|d| d.instance).collect();
        self.resolver.resolve_destroyed(&mut self.state, destroyed_cards);

        AttackOutcome::Clash {
            exchange,
            revealed,
            destroyed,
        }
    }

    /// End the active player's turn.
    ///
    /// Clears their creatures' per-turn flags, counts down their timed
    /// effects, and hands the turn over in the `DRAW` phase.
    pub fn end_turn(&mut self) -> Result<(), ActionError> {
        self.ensure_live()?;
        let ending = self.state.active_player;

        for card in self.state.player_mut(ending).lanes.iter_mut().flatten() {
            if let Some(creature) = card.creature_mut() {
                creature.reset_turn_flags();
            }
        }
        for expired in active::tick(&mut self.state, ending) {
            self.state.record(
                EventKind::Effect,
                Some(ending),
                format!("{} wears off", expired.name),
                smallvec![EntityRef::Effect {
                    effect: expired.effect_id
                }],
            );
        }

        let next = ending.opponent();
        self.state.active_player = next;
        self.state.turn += 1;
        self.state.phase = Phase::Draw;
        self.state.has_drawn = false;
        self.state.record(
            EventKind::TurnBoundary,
            Some(next),
            format!("Turn {} begins, {next} to act", self.state.turn),
            smallvec![EntityRef::Player { player: next }],
        );
        Ok(())
    }

    // === Action Enumeration ===

    /// Event data choices for activating `effect`: one per legal target,
    /// or a single empty one for untargeted effects.
    fn event_choices(&self, effect: Option<&EffectId>, player: PlayerId) -> Vec<EventData> {
        let options = effect.map(|id| self.target_options(id, player)).unwrap_or_default();
        if options.is_empty() {
            return vec![EventData::default()];
        }
        options
            .into_iter()
            .map(|o| EventData {
                target_player: Some(o.player),
                target_lane: Some(o.lane),
                target_instance: Some(o.instance),
            })
            .collect()
    }

    /// Every action that would currently pass validation for `player`.
    #[must_use]
    pub fn legal_actions(&self, player: PlayerId) -> Vec<PlayerAction> {
        let mut actions = Vec::new();
        if self.state.is_over() {
            return actions;
        }

        for slot in 0..SUPPORT_SLOT_COUNT {
            if self.validate_trap(player, slot).is_ok() {
                actions.push(PlayerAction::ActivateTrap {
                    slot,
                    event: EventData::default(),
                });
            }
        }
        for lane in 0..LANE_COUNT {
            if self.validate_flip(player, lane).is_ok() {
                actions.push(PlayerAction::FlipFaceUp { lane });
            }
        }
        if self.state.active_player != player {
            return actions;
        }

        if self.validate_draw(player).is_ok() {
            actions.push(PlayerAction::Draw);
        }

        if self.state.phase == Phase::Main {
            let side = self.state.player(player);
            let mut hand_ids: Vec<CardId> = Vec::new();
            for card in &side.hand {
                if !hand_ids.contains(&card.id) {
                    hand_ids.push(card.id);
                }
            }

            for &card in &hand_ids {
                for lane in 0..LANE_COUNT {
                    if self.validate_play_creature(player, lane, card).is_ok() {
                        actions.push(PlayerAction::PlayCreature {
                            lane,
                            card,
                            options: PlayOptions::default(),
                        });
                    }
                }
                for slot in 0..SUPPORT_SLOT_COUNT {
                    if self.validate_play_support(player, slot, card).is_ok() {
                        actions.push(PlayerAction::PlaySupport { slot, card });
                    }
                }
            }

            for slot in 0..SUPPORT_SLOT_COUNT {
                if let Ok(card) = self.validate_activate_support(player, slot) {
                    for event in self.event_choices(card.effect_id.as_ref(), player) {
                        actions.push(PlayerAction::ActivateSupport { slot, event });
                    }
                }
            }

            for lane in 0..LANE_COUNT {
                if let Ok(effect) = self.validate_creature_effect(player, lane) {
                    for event in self.event_choices(Some(&effect), player) {
                        actions.push(PlayerAction::ActivateCreatureEffect { lane, event });
                    }
                }
                if self.validate_toggle(player, lane).is_ok() {
                    actions.push(PlayerAction::ToggleMode { lane });
                }
                for target in 0..LANE_COUNT {
                    if self.validate_attack(player, lane, target).is_ok() {
                        actions.push(PlayerAction::Attack {
                            attacker: lane,
                            target,
                        });
                    }
                }
            }
        }

        actions.push(PlayerAction::EndTurn);
        actions
    }

    /// Run a `PlayerAction` for `player`.
    pub fn apply(&mut self, player: PlayerId, action: &PlayerAction) -> Result<Outcome, ActionError> {
        match action {
            PlayerAction::Draw => self.draw(player).map(Outcome::Drew),
            PlayerAction::PlayCreature { lane, card, options } => {
                self.play_creature(player, *lane, *card, *options).map(Outcome::Played)
            }
            PlayerAction::PlaySupport { slot, card } => self.play_support(player, *slot, *card).map(Outcome::Played),
            PlayerAction::ActivateSupport { slot, event } => {
                self.activate_support(player, *slot, *event).map(Outcome::Activated)
            }
            PlayerAction::ActivateCreatureEffect { lane, event } => {
                self.activate_creature_effect(player, *lane, *event).map(Outcome::Resolved)
            }
            PlayerAction::ActivateTrap { slot, event } => {
                self.activate_trap(player, *slot, *event).map(Outcome::Activated)
            }
            PlayerAction::ToggleMode { lane } => self.toggle_mode(player, *lane).map(Outcome::ModeChanged),
            PlayerAction::FlipFaceUp { lane } => self.flip_face_up(player, *lane).map(Outcome::Resolved),
            PlayerAction::Attack { attacker, target } => {
                self.attack(player, *attacker, *target).map(Outcome::Attacked)
            }
            PlayerAction::EndTurn => {
                self.ensure_turn(player)?;
                self.end_turn().map(|()| Outcome::TurnEnded)
            }
        }
    }
}

impl std::fmt::Debug for BattleEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BattleEngine")
            .field("turn", &self.state.turn)
            .field("active_player", &self.state.active_player)
            .field("phase", &self.state.phase)
            .field("winner", &self.state.winner)
            .field("resolver", &self.resolver)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cards::{CardDefinition, CardRegistry};
    use crate::core::{MatchBuilder, MatchConfig};

    const P0: PlayerId = PlayerId(0);
    const P1: PlayerId = PlayerId(1);
    const WOLF: CardId = CardId::new(1);
    const OGRE: CardId = CardId::new(2);
    const BANNER: CardId = CardId::new(3);

    fn cards() -> CardRegistry {
        let mut cards = CardRegistry::new();
        cards.register(CardDefinition::creature(WOLF, "Wolf", 60, 20, 40)).unwrap();
        cards.register(CardDefinition::creature(OGRE, "Ogre", 100, 50, 80)).unwrap();
        cards.register(CardDefinition::support(BANNER, "Banner")).unwrap();
        cards
    }

    fn engine() -> BattleEngine {
        let cards = cards();
        let mut state = MatchBuilder::new(&cards, MatchConfig::default().with_starting_hand_size(0))
            .with_deck(P0, vec![WOLF; 10])
            .with_deck(P1, vec![WOLF; 10])
            .build()
            .unwrap();
        for player in PlayerId::both() {
            for id in [OGRE, WOLF, BANNER] {
                let instance = state.alloc_instance();
                let card = cards.instantiate(id, instance).unwrap();
                state.player_mut(player).hand.push_back(card);
            }
        }
        BattleEngine::new(state, Arc::new(EffectRegistry::new()))
    }

    /// Draw (if needed) and end the turn.
    fn pass(engine: &mut BattleEngine) {
        let active = engine.state().active_player;
        if engine.state().phase == Phase::Draw {
            engine.draw(active).unwrap();
        }
        engine.end_turn().unwrap();
    }

    #[test]
    fn test_draw_advances_phase() {
        let mut engine = engine();
        let drawn = engine.draw(P0).unwrap();
        assert!(drawn.is_some());
        assert_eq!(engine.state().phase, Phase::Main);
        assert_eq!(engine.state().player(P0).hand.len(), 4);
        assert_eq!(
            engine.draw(P0),
            Err(ActionError::WrongPhase {
                expected: Phase::Draw,
                actual: Phase::Main
            })
        );
    }

    #[test]
    fn test_empty_deck_still_reaches_main() {
        let mut engine = engine();
        engine.state_mut().player_mut(P0).deck.clear();
        assert_eq!(engine.draw(P0), Ok(None));
        assert_eq!(engine.state().phase, Phase::Main);
    }

    #[test]
    fn test_rejects_out_of_turn() {
        let mut engine = engine();
        assert_eq!(engine.draw(P1), Err(ActionError::NotYourTurn(P1)));
        assert_eq!(
            engine.play_creature(P0, 0, OGRE, PlayOptions::default()),
            Err(ActionError::WrongPhase {
                expected: Phase::Main,
                actual: Phase::Draw
            })
        );
    }

    #[test]
    fn test_play_validation_leaves_state_untouched() {
        let mut engine = engine();
        engine.draw(P0).unwrap();
        engine.play_creature(P0, 0, OGRE, PlayOptions::default()).unwrap();
        let events = engine.state().log.len();
        let hand = engine.state().player(P0).hand.len();

        assert_eq!(
            engine.play_creature(P0, 0, WOLF, PlayOptions::default()),
            Err(ActionError::LaneOccupied(0))
        );
        assert_eq!(
            engine.play_creature(P0, 3, WOLF, PlayOptions::default()),
            Err(ActionError::InvalidLane(3))
        );
        assert_eq!(
            engine.play_creature(P0, 1, BANNER, PlayOptions::default()),
            Err(ActionError::WrongCardType {
                found: CardType::Support
            })
        );
        assert_eq!(
            engine.play_support(P0, 0, WOLF),
            Err(ActionError::WrongCardType {
                found: CardType::Creature
            })
        );
        assert_eq!(engine.state().log.len(), events);
        assert_eq!(engine.state().player(P0).hand.len(), hand);
    }

    #[test]
    fn test_first_player_cannot_attack_turn_one() {
        let mut engine = engine();
        engine.draw(P0).unwrap();
        engine.play_creature(P0, 0, OGRE, PlayOptions::default()).unwrap();
        assert_eq!(engine.attack(P0, 0, 0), Err(ActionError::FirstTurnAttack));
    }

    #[test]
    fn test_direct_and_blocked_attacks() {
        let mut engine = engine();
        engine.draw(P0).unwrap();
        engine.play_creature(P0, 0, OGRE, PlayOptions::default()).unwrap();
        engine.play_creature(P0, 1, WOLF, PlayOptions::default()).unwrap();
        pass(&mut engine);
        pass(&mut engine);

        engine.draw(P0).unwrap();
        assert_eq!(engine.attack(P0, 0, 2), Ok(AttackOutcome::Direct { damage: 100 }));
        assert_eq!(engine.state().player(P1).life, 7900);
        assert_eq!(engine.attack(P0, 0, 2), Err(ActionError::AlreadyAttacked));

        let instance = engine.state_mut().alloc_instance();
        let blocker = cards().instantiate(WOLF, instance).unwrap();
        engine.state_mut().player_mut(P1).lanes[0] = Some(blocker);
        assert_eq!(engine.attack(P0, 1, 2), Ok(AttackOutcome::Blocked));
        assert_eq!(engine.state().player(P1).life, 7900);
    }

    #[test]
    fn test_toggle_once_per_turn() {
        let mut engine = engine();
        engine.draw(P0).unwrap();
        engine.play_creature(P0, 0, WOLF, PlayOptions::default()).unwrap();
        assert_eq!(engine.toggle_mode(P0, 0), Ok(Mode::Defense));
        assert_eq!(engine.toggle_mode(P0, 0), Err(ActionError::AlreadyChangedMode));

        pass(&mut engine);
        pass(&mut engine);
        engine.draw(P0).unwrap();
        assert_eq!(engine.toggle_mode(P0, 0), Ok(Mode::Attack));
    }

    #[test]
    fn test_end_turn_hands_over() {
        let mut engine = engine();
        engine.draw(P0).unwrap();
        engine.end_turn().unwrap();

        let state = engine.state();
        assert_eq!(state.active_player, P1);
        assert_eq!(state.turn, 2);
        assert_eq!(state.phase, Phase::Draw);
        assert!(!state.has_drawn);
        assert_eq!(state.log.last().unwrap().kind, EventKind::TurnBoundary);
    }

    #[test]
    fn test_game_over_blocks_actions() {
        let mut engine = engine();
        engine.state_mut().change_life(P1, -9000);
        assert_eq!(engine.result(), Some(GameResult { winner: P0, turn: 1 }));
        assert_eq!(engine.draw(P0), Err(ActionError::GameOver));
        assert_eq!(engine.end_turn(), Err(ActionError::GameOver));
        assert!(engine.legal_actions(P0).is_empty());
    }

    #[test]
    fn test_legal_actions_match_phase() {
        let mut engine = engine();
        assert_eq!(engine.legal_actions(P0), vec![PlayerAction::Draw, PlayerAction::EndTurn]);
        assert!(engine.legal_actions(P1).is_empty());

        engine.draw(P0).unwrap();
        let actions = engine.legal_actions(P0);
        assert!(actions.contains(&PlayerAction::PlayCreature {
            lane: 2,
            card: OGRE,
            options: PlayOptions::default()
        }));
        assert!(actions.contains(&PlayerAction::PlaySupport { slot: 0, card: BANNER }));
        assert!(!actions.iter().any(|a| matches!(a, PlayerAction::Attack { .. })));
        assert_eq!(actions.last(), Some(&PlayerAction::EndTurn));
    }

    #[test]
    fn test_apply_dispatches() {
        let mut engine = engine();
        assert!(matches!(engine.apply(P0, &PlayerAction::Draw), Ok(Outcome::Drew(Some(_)))));
        assert_eq!(
            engine.apply(P1, &PlayerAction::EndTurn),
            Err(ActionError::NotYourTurn(P1))
        );
        assert_eq!(engine.apply(P0, &PlayerAction::EndTurn), Ok(Outcome::TurnEnded));
    }
}
