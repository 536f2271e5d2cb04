//! Property tests for board and combat invariants.
//!
//! - Every card instance sits in exactly one zone, whatever actions run
//! - A creature never deals damage twice in one turn
//! - Attacking a defense-mode creature never damages the attacker
//! - Freshly set support-zone cards are face-down and inactive

use std::collections::HashSet;
use std::sync::Arc;

use proptest::prelude::*;

use lane_duel::cards::{CardDefinition, CardId, CardRegistry, EffectType, Mode};
use lane_duel::core::{GameState, InstanceId, MatchBuilder, MatchConfig, PlayerId};
use lane_duel::effects::{
    Duration, EffectAction, EffectDefinition, EffectRegistry, PlayerSelector, Scope, Selector, Trigger,
};
use lane_duel::rules::{ActionError, BattleEngine};

const P0: PlayerId = PlayerId(0);
const P1: PlayerId = PlayerId(1);

const WOLF: CardId = CardId::new(1);
const OGRE: CardId = CardId::new(2);
const BANNER: CardId = CardId::new(3);
const BOLT: CardId = CardId::new(4);
const SNARE: CardId = CardId::new(5);

fn cards() -> CardRegistry {
    let mut cards = CardRegistry::new();
    for card in [
        CardDefinition::creature(WOLF, "Wolf", 60, 20, 40),
        CardDefinition::creature(OGRE, "Ogre", 100, 50, 80).with_effect("stomp", EffectType::OneTime),
        CardDefinition::support(BANNER, "Banner").with_effect("rally", EffectType::Continuous),
        CardDefinition::action(BOLT, "Bolt").with_effect("bolt", EffectType::OneTime),
        CardDefinition::trap(SNARE, "Snare").with_effect("snare", EffectType::OneTime),
    ] {
        cards.register(card).unwrap();
    }
    cards
}

fn effects() -> EffectRegistry {
    let mut effects = EffectRegistry::new();
    for effect in [
        EffectDefinition::new("stomp", "Stomp", Trigger::OnPlay).with_action(EffectAction::Damage {
            selector: Selector::new(Scope::Enemies),
            amount: 30,
        }),
        EffectDefinition::new("rally", "Rally", Trigger::OnPlay).with_action(EffectAction::ModifyStats {
            selector: Selector::new(Scope::Allies),
            atk: 10,
            def: 10,
            duration: Duration::Permanent,
        }),
        EffectDefinition::new("bolt", "Bolt", Trigger::OnPlay).with_action(EffectAction::Discard {
            player: PlayerSelector::Opponent,
            count: 1,
        }),
        EffectDefinition::new("snare", "Snare", Trigger::OnDefend).with_action(EffectAction::ReturnToHand {
            selector: Selector::new(Scope::Target),
        }),
    ] {
        effects.register(effect).unwrap();
    }
    effects
}

fn mixed_engine(seed: u64) -> BattleEngine {
    let deck = vec![WOLF, OGRE, BANNER, BOLT, SNARE, WOLF, OGRE, WOLF, BANNER, SNARE, WOLF, BOLT];
    let state = MatchBuilder::new(&cards(), MatchConfig::default().with_seed(seed).with_starting_life(1500))
        .with_deck(P0, deck.clone())
        .with_deck(P1, deck)
        .build()
        .unwrap();
    BattleEngine::new(state, Arc::new(effects()))
}

fn all_instances(state: &GameState) -> Vec<InstanceId> {
    let mut ids: Vec<InstanceId> = state.stack.iter().map(|c| c.instance).collect();
    for player in PlayerId::both() {
        let side = state.player(player);
        ids.extend(side.deck.iter().map(|c| c.instance));
        ids.extend(side.hand.iter().map(|c| c.instance));
        ids.extend(side.discard.iter().map(|c| c.instance));
        ids.extend(side.removed.iter().map(|c| c.instance));
        ids.extend(side.lanes.iter().flatten().map(|c| c.instance));
        ids.extend(side.supports.iter().flatten().map(|c| c.instance));
    }
    ids
}

/// One creature each, the attacker's on player 1 ready to swing on turn 2.
fn duel(attacker: (i32, i32, i32), defender: (i32, i32, i32), defender_mode: Mode) -> BattleEngine {
    let mut registry = CardRegistry::new();
    registry
        .register(CardDefinition::creature(CardId::new(1), "A", attacker.0, attacker.1, attacker.2))
        .unwrap();
    registry
        .register(CardDefinition::creature(CardId::new(2), "D", defender.0, defender.1, defender.2))
        .unwrap();
    let mut state = MatchBuilder::new(&registry, MatchConfig::default().with_starting_hand_size(0))
        .with_deck(P0, vec![CardId::new(2); 3])
        .with_deck(P1, vec![CardId::new(1); 3])
        .build()
        .unwrap();

    let a = state.alloc_instance();
    state.player_mut(P1).lanes[0] = registry.instantiate(CardId::new(1), a);
    let d = state.alloc_instance();
    let mut def_card = registry.instantiate(CardId::new(2), d).unwrap();
    def_card.creature_mut().unwrap().mode = defender_mode;
    state.player_mut(P0).lanes[0] = Some(def_card);

    let mut engine = BattleEngine::new(state, Arc::new(EffectRegistry::new()));
    engine.end_turn().unwrap();
    engine.draw(P1).unwrap();
    engine
}

fn stats() -> impl Strategy<Value = (i32, i32, i32)> {
    (0i32..400, 0i32..400, 1i32..400)
}

proptest! {
    /// Invariant: random legal play never duplicates or loses a card.
    #[test]
    fn cards_stay_in_exactly_one_zone(seed in 0u64..1000, picks in prop::collection::vec(0usize..64, 1..120)) {
        let mut engine = mixed_engine(seed);
        let expected = all_instances(engine.state()).len();

        for pick in picks {
            if engine.state().is_over() {
                break;
            }
            let player = engine.state().active_player;
            // Traps are the only actions open to the waiting player.
            let actor = if pick % 7 == 0 { player.opponent() } else { player };
            let actions = engine.legal_actions(actor);
            if actions.is_empty() {
                continue;
            }
            let action = &actions[pick % actions.len()];
            prop_assert!(engine.apply(actor, action).is_ok(), "legal action {:?} was rejected", action);

            let ids = all_instances(engine.state());
            prop_assert_eq!(ids.len(), expected);
            let unique: HashSet<_> = ids.iter().collect();
            prop_assert_eq!(unique.len(), expected);
        }
    }

    /// Invariant: a second attack in the same turn changes nothing.
    #[test]
    fn attack_is_once_per_turn(att in stats(), def in stats(), defend in any::<bool>()) {
        let mode = if defend { Mode::Defense } else { Mode::Attack };
        let mut engine = duel(att, def, mode);

        let _ = engine.attack(P1, 0, 0).unwrap();
        let snapshot = format!("{:?}", (engine.state().players.clone(), engine.state().winner));

        // A slain attacker leaves an empty lane behind instead.
        for target in 0..3 {
            let again = engine.attack(P1, 0, target);
            prop_assert!(
                matches!(again, Err(ActionError::AlreadyAttacked | ActionError::EmptyLane(0))),
                "second attack returned {:?}",
                again
            );
        }
        prop_assert_eq!(format!("{:?}", (engine.state().players.clone(), engine.state().winner)), snapshot);
    }

    /// Invariant: defense-mode defenders never damage the attacker.
    #[test]
    fn defense_never_retaliates(att in stats(), def in stats()) {
        let mut engine = duel(att, def, Mode::Defense);
        engine.attack(P1, 0, 0).unwrap();

        let attacker = engine.state().player(P1).creature(0).unwrap().creature().unwrap();
        prop_assert_eq!(attacker.hp, att.2);

        let expected = (att.0 - def.1).max(0);
        let defender_hp = engine
            .state()
            .player(P0)
            .creature(0)
            .and_then(|c| c.creature())
            .map_or(0, |c| c.hp);
        prop_assert_eq!(defender_hp, (def.2 - expected).max(0));
    }

    /// Invariant: setting a card always leaves it face-down and inactive.
    #[test]
    fn set_cards_start_face_down(slot in 0usize..3, which in 0usize..3) {
        let card = [BANNER, BOLT, SNARE][which];
        let mut engine = mixed_engine(1);
        let instance = engine.state_mut().alloc_instance();
        let copy = cards().instantiate(card, instance).unwrap();
        engine.state_mut().player_mut(P0).hand.push_back(copy);
        engine.draw(P0).unwrap();

        engine.play_support(P0, slot, card).unwrap();
        let placed = engine.state().player(P0).support(slot).unwrap();
        prop_assert!(placed.is_face_down());
        prop_assert!(!placed.spell().unwrap().is_active);
        prop_assert!(placed.spell().unwrap().target.is_none());
    }
}
