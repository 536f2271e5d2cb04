//! Effect system integration tests.
//!
//! These tests resolve declarative effects through real engine actions:
//! creature activations, traps, triggers fired by combat, lingering
//! modifiers and the failure paths that must never break an action.

use std::sync::{Arc, Mutex};

use lane_duel::cards::{CardDefinition, CardId, CardRegistry, EffectType, Mode};
use lane_duel::core::{EventKind, InstanceId, MatchBuilder, MatchConfig, PlayerId};
use lane_duel::effects::{
    ActivationCheck, Comparison, Condition, CreatureFilter, Duration, EffectAction, EffectDefinition, EffectError,
    EffectId, EffectRegistry, EffectUtils, EventData, PlayerSelector, Quantity, Resolution, Scope, Selector,
    TargetSide, Trigger,
};
use lane_duel::rules::{ActionError, Activation, AttackOutcome, BattleEngine, PlayerAction};
use lane_duel::zones;

const P0: PlayerId = PlayerId(0);
const P1: PlayerId = PlayerId(1);
const FILLER: CardId = CardId::new(99);

struct Table {
    cards: CardRegistry,
    engine: BattleEngine,
}

impl Table {
    fn new(cards: Vec<CardDefinition>, effects: Vec<EffectDefinition>) -> Self {
        let mut registry = CardRegistry::new();
        registry
            .register(CardDefinition::creature(FILLER, "Filler", 10, 10, 10))
            .unwrap();
        for card in cards {
            registry.register(card).unwrap();
        }
        let mut effect_registry = EffectRegistry::new();
        for effect in effects {
            effect_registry.register(effect).unwrap();
        }
        let state = MatchBuilder::new(&registry, MatchConfig::default().with_starting_hand_size(0))
            .with_deck(P0, vec![FILLER; 10])
            .with_deck(P1, vec![FILLER; 10])
            .build()
            .unwrap();
        Self {
            cards: registry,
            engine: BattleEngine::new(state, Arc::new(effect_registry)),
        }
    }

    fn give(&mut self, player: PlayerId, card: CardId) -> InstanceId {
        let instance = self.engine.state_mut().alloc_instance();
        let copy = self.cards.instantiate(card, instance).unwrap();
        self.engine.state_mut().player_mut(player).hand.push_back(copy);
        instance
    }

    fn place(&mut self, player: PlayerId, lane: usize, card: CardId, mode: Mode) -> InstanceId {
        let instance = self.engine.state_mut().alloc_instance();
        let mut copy = self.cards.instantiate(card, instance).unwrap();
        copy.creature_mut().unwrap().mode = mode;
        self.engine.state_mut().player_mut(player).lanes[lane] = Some(copy);
        instance
    }

    /// Hand a support-zone card to `player` and set it in `slot`.
    fn set(&mut self, player: PlayerId, slot: usize, card: CardId) -> InstanceId {
        self.give(player, card);
        self.engine.play_support(player, slot, card).unwrap()
    }

    fn attack_of(&self, player: PlayerId, lane: usize) -> i32 {
        self.engine.state().player(player).creature(lane).unwrap().creature().unwrap().attack
    }
}

fn gain_life(id: &str, trigger: Trigger, amount: i64) -> EffectDefinition {
    EffectDefinition::new(id, id, trigger).with_action(EffectAction::ChangeLife {
        player: PlayerSelector::Owner,
        amount,
    })
}

// =============================================================================
// Creature Effects
// =============================================================================

#[test]
fn test_one_time_creature_effect_is_spent() {
    let sniper = CardId::new(1);
    let snipe = EffectDefinition::new("snipe", "Snipe", Trigger::OnPlay)
        .with_target(TargetSide::Enemy, CreatureFilter::default())
        .with_action(EffectAction::Damage {
            selector: Selector::new(Scope::Target),
            amount: 30,
        });
    let mut table = Table::new(
        vec![CardDefinition::creature(sniper, "Sniper", 40, 40, 40).with_effect("snipe", EffectType::OneTime)],
        vec![snipe],
    );
    table.place(P0, 0, sniper, Mode::Attack);
    let victim = table.place(P1, 1, FILLER, Mode::Attack);
    table.engine.draw(P0).unwrap();

    let options = table.engine.target_options(&EffectId::from("snipe"), P0);
    assert_eq!(options.len(), 1);
    assert_eq!(options[0].instance, victim);

    let event = EventData::lane(P1, 1);
    assert_eq!(
        table.engine.activate_creature_effect(P0, 0, event),
        Ok(Resolution::Resolved)
    );
    // 10 HP filler is gone.
    assert!(table.engine.state().player(P1).creature(1).is_none());
    assert_eq!(
        table.engine.activate_creature_effect(P0, 0, event),
        Err(ActionError::EffectSpent)
    );

    table.engine.end_turn().unwrap();
    table.engine.draw(P1).unwrap();
    table.engine.end_turn().unwrap();
    table.engine.draw(P0).unwrap();
    assert_eq!(
        table.engine.activate_creature_effect(P0, 0, event),
        Err(ActionError::EffectSpent)
    );
}

#[test]
fn test_continuous_creature_effect_once_per_turn() {
    let medic = CardId::new(1);
    let mut table = Table::new(
        vec![CardDefinition::creature(medic, "Medic", 10, 10, 10).with_effect("mend", EffectType::Continuous)],
        vec![gain_life("mend", Trigger::OnPlay, 100)],
    );
    table.place(P0, 0, medic, Mode::Defense);
    table.engine.draw(P0).unwrap();

    table.engine.activate_creature_effect(P0, 0, EventData::default()).unwrap();
    assert_eq!(
        table.engine.activate_creature_effect(P0, 0, EventData::default()),
        Err(ActionError::EffectSpent)
    );

    table.engine.end_turn().unwrap();
    table.engine.draw(P1).unwrap();
    table.engine.end_turn().unwrap();
    table.engine.draw(P0).unwrap();
    table.engine.activate_creature_effect(P0, 0, EventData::default()).unwrap();
    assert_eq!(table.engine.state().player(P0).life, 8200);
}

#[test]
fn test_timed_buff_expires_exactly() {
    let knight = CardId::new(1);
    let charge = EffectDefinition::new("charge", "Charge", Trigger::OnPlay).with_action(EffectAction::ModifyStats {
        selector: Selector::new(Scope::Source),
        atk: 30,
        def: -50,
        duration: Duration::Turns(1),
    });
    let mut table = Table::new(
        vec![CardDefinition::creature(knight, "Knight", 70, 20, 60).with_effect("charge", EffectType::OneTime)],
        vec![charge],
    );
    table.place(P0, 0, knight, Mode::Attack);
    table.engine.draw(P0).unwrap();

    table.engine.activate_creature_effect(P0, 0, EventData::default()).unwrap();
    let creature = table.engine.state().player(P0).creature(0).unwrap().creature().unwrap().clone();
    assert_eq!(creature.attack, 100);
    // Defense clamps at 0; the revert restores only what was taken.
    assert_eq!(creature.defense, 0);
    assert_eq!(table.engine.state().active_effects.len(), 1);

    table.engine.end_turn().unwrap();
    let creature = table.engine.state().player(P0).creature(0).unwrap().creature().unwrap().clone();
    assert_eq!(creature.attack, 70);
    assert_eq!(creature.defense, 20);
    assert!(table.engine.state().active_effects.is_empty());
}

#[test]
fn test_on_attack_boost_applies_before_damage() {
    let raider = CardId::new(1);
    let fury = EffectDefinition::new("fury", "Fury", Trigger::OnAttack).with_action(EffectAction::ModifyStats {
        selector: Selector::new(Scope::Source),
        atk: 50,
        def: 0,
        duration: Duration::Instant,
    });
    let mut table = Table::new(
        vec![CardDefinition::creature(raider, "Raider", 100, 0, 50).with_effect("fury", EffectType::Continuous)],
        vec![fury],
    );
    table.place(P1, 0, raider, Mode::Attack);
    table.engine.end_turn().unwrap();
    table.engine.draw(P1).unwrap();

    assert_eq!(table.engine.attack(P1, 0, 0), Ok(AttackOutcome::Direct { damage: 150 }));
    assert_eq!(table.engine.state().player(P0).life, 7850);
}

#[test]
fn test_on_destroy_fires_after_combat() {
    let (martyr, striker) = (CardId::new(1), CardId::new(2));
    let mut table = Table::new(
        vec![
            CardDefinition::creature(martyr, "Martyr", 0, 0, 10).with_effect("last-gift", EffectType::OneTime),
            CardDefinition::creature(striker, "Striker", 100, 0, 80),
        ],
        vec![gain_life("last-gift", Trigger::OnDestroy, 300)],
    );
    table.place(P0, 0, martyr, Mode::Attack);
    table.place(P1, 0, striker, Mode::Attack);
    table.engine.end_turn().unwrap();
    table.engine.draw(P1).unwrap();

    table.engine.attack(P1, 0, 0).unwrap();
    assert_eq!(table.engine.state().player(P0).life, 8300);
}

#[test]
fn test_conditional_branch() {
    let scroll = CardId::new(1);
    let study = EffectDefinition::new("study", "Study", Trigger::OnPlay).with_action(EffectAction::If {
        condition: Condition::compare(Quantity::OwnLife, Comparison::Lt, 5000),
        then: vec![EffectAction::ChangeLife {
            player: PlayerSelector::Owner,
            amount: 1000,
        }],
        otherwise: vec![EffectAction::Draw {
            player: PlayerSelector::Owner,
            count: 2,
        }],
    });
    let mut table = Table::new(
        vec![CardDefinition::action(scroll, "Scroll").with_effect("study", EffectType::OneTime)],
        vec![study],
    );
    table.engine.draw(P0).unwrap();
    table.set(P0, 0, scroll);
    let hand = table.engine.state().player(P0).hand.len();

    table.engine.activate_support(P0, 0, EventData::default()).unwrap();
    let side = table.engine.state().player(P0);
    assert_eq!(side.life, 8000);
    assert_eq!(side.hand.len(), hand + 2);
    assert_eq!(side.discard.len(), 1);
}

// =============================================================================
// Targeted Supports
// =============================================================================

#[test]
fn test_targeted_support_follows_its_target() {
    let chains = CardId::new(1);
    let bind = EffectDefinition::new("bind", "Bind", Trigger::OnPlay)
        .with_target(TargetSide::Enemy, CreatureFilter::default())
        .with_action(EffectAction::ModifyStats {
            selector: Selector::new(Scope::Target),
            atk: -5,
            def: 0,
            duration: Duration::Permanent,
        });
    let mut table = Table::new(
        vec![CardDefinition::support(chains, "Chains").with_effect("bind", EffectType::Continuous)],
        vec![bind],
    );
    let victim = table.place(P1, 2, FILLER, Mode::Attack);
    table.engine.draw(P0).unwrap();
    let chains_instance = table.set(P0, 0, chains);

    table.engine.activate_support(P0, 0, EventData::instance(victim)).unwrap();
    assert_eq!(table.attack_of(P1, 2), 5);
    let target = table.engine.state().player(P0).support(0).unwrap().spell().unwrap().target.clone().unwrap();
    assert_eq!(target.player, P1);
    assert_eq!(target.lane, Some(2));
    assert_eq!(target.instance, Some(victim));

    zones::destroy_creature(table.engine.state_mut(), P1, 2);
    let side = table.engine.state().player(P0);
    assert!(side.support(0).is_none());
    assert!(side.discard.iter().any(|c| c.instance == chains_instance));
    assert!(table.engine.state().active_effects.is_empty());
}

#[test]
fn test_no_target_denies_activation() {
    let bolt = CardId::new(1);
    let zap = EffectDefinition::new("zap", "Zap", Trigger::OnPlay)
        .with_target(
            TargetSide::Enemy,
            CreatureFilter {
                mode: Some(Mode::Attack),
                ..CreatureFilter::default()
            },
        )
        .with_action(EffectAction::Destroy {
            selector: Selector::new(Scope::Target),
        });
    let mut table = Table::new(
        vec![CardDefinition::action(bolt, "Bolt").with_effect("zap", EffectType::OneTime)],
        vec![zap],
    );
    table.place(P1, 0, FILLER, Mode::Defense);
    table.engine.draw(P0).unwrap();
    table.set(P0, 0, bolt);

    assert!(matches!(
        table.engine.check_activation(&EffectId::from("zap"), P0),
        ActivationCheck::Denied { .. }
    ));
    let result = table.engine.activate_support(P0, 0, EventData::default()).unwrap();
    assert!(matches!(result, Activation::Fizzled { .. }));
    assert!(table.engine.state().player(P1).creature(0).is_some());
}

// =============================================================================
// Traps
// =============================================================================

#[test]
fn test_trap_springs_on_opponents_turn() {
    let (pit, striker) = (CardId::new(1), CardId::new(2));
    let collapse = EffectDefinition::new("collapse", "Collapse", Trigger::OnDefend).with_action(EffectAction::Destroy {
        selector: Selector::new(Scope::Target),
    });
    let mut table = Table::new(
        vec![
            CardDefinition::trap(pit, "Pit").with_effect("collapse", EffectType::OneTime),
            CardDefinition::creature(striker, "Striker", 100, 0, 80),
        ],
        vec![collapse],
    );
    table.engine.draw(P0).unwrap();
    let pit_instance = table.set(P0, 2, pit);
    let attacker = table.place(P1, 0, striker, Mode::Attack);
    table.engine.end_turn().unwrap();
    table.engine.draw(P1).unwrap();

    assert!(table.engine.legal_actions(P0).contains(&PlayerAction::ActivateTrap {
        slot: 2,
        event: EventData::default()
    }));
    let result = table.engine.activate_trap(P0, 2, EventData::instance(attacker)).unwrap();
    assert_eq!(result, Activation::Resolved(Resolution::Resolved));

    let state = table.engine.state();
    assert!(state.player(P1).creature(0).is_none());
    assert!(state.player(P0).support(2).is_none());
    assert!(state.player(P0).discard.iter().any(|c| c.instance == pit_instance));
    assert_eq!(table.engine.attack(P1, 0, 0), Err(ActionError::EmptyLane(0)));
}

#[test]
fn test_trap_needs_defend_trigger() {
    let dud = CardId::new(1);
    let mut table = Table::new(
        vec![CardDefinition::trap(dud, "Dud").with_effect("boon", EffectType::OneTime)],
        vec![gain_life("boon", Trigger::OnPlay, 100)],
    );
    table.engine.draw(P0).unwrap();
    table.set(P0, 0, dud);
    assert_eq!(
        table.engine.activate_trap(P0, 0, EventData::default()),
        Err(ActionError::NotATrap)
    );
}

// =============================================================================
// Failure Containment
// =============================================================================

#[test]
fn test_missing_effect_still_completes_action() {
    let relic = CardId::new(1);
    let mut table = Table::new(
        vec![CardDefinition::support(relic, "Relic").with_effect("ghost", EffectType::OneTime)],
        vec![],
    );
    table.engine.draw(P0).unwrap();
    table.set(P0, 0, relic);

    let result = table.engine.activate_support(P0, 0, EventData::default()).unwrap();
    assert_eq!(result, Activation::Resolved(Resolution::Missing));
    assert!(table.engine.state().player(P0).support(0).is_none());
    assert_eq!(table.engine.state().log.of_kind(EventKind::Warning).count(), 1);
}

#[test]
fn test_handler_fault_is_contained() {
    let gadget = CardId::new(1);
    let mut table = Table::new(
        vec![CardDefinition::support(gadget, "Gadget").with_effect("gadget", EffectType::OneTime)],
        vec![gain_life("gadget", Trigger::OnPlay, 100)],
    );
    table.engine = table.engine.with_handler(
        "gadget",
        |_: &EffectDefinition, utils: &mut EffectUtils<'_>| -> Result<(), EffectError> {
            utils.change_life(utils.owner(), 50);
            Err(EffectError::Failed("gadget jammed".into()))
        },
    );
    table.engine.draw(P0).unwrap();
    table.set(P0, 0, gadget);

    let result = table.engine.activate_support(P0, 0, EventData::default()).unwrap();
    assert_eq!(
        result,
        Activation::Resolved(Resolution::Failed(EffectError::Failed("gadget jammed".into())))
    );
    // Partial changes made before the fault stay.
    assert_eq!(table.engine.state().player(P0).life, 8050);
    assert!(table.engine.state().player(P0).support(0).is_none());
    assert_eq!(table.engine.state().log.of_kind(EventKind::Warning).count(), 1);
}

#[test]
fn test_observer_sees_resolved_effects() {
    let gift = CardId::new(1);
    let seen = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&seen);

    let mut table = Table::new(
        vec![CardDefinition::support(gift, "Gift").with_effect("boon", EffectType::OneTime)],
        vec![gain_life("boon", Trigger::OnPlay, 100)],
    );
    table.engine = table
        .engine
        .with_observer(move |notice| sink.lock().unwrap().push(notice.effect_id.clone()));
    table.engine.draw(P0).unwrap();
    table.set(P0, 0, gift);
    table.engine.activate_support(P0, 0, EventData::default()).unwrap();

    assert_eq!(*seen.lock().unwrap(), vec![EffectId::from("boon")]);
}

#[test]
fn test_effects_load_from_json() {
    let json = r#"[
        {
            "id": "surge",
            "name": "Surge",
            "trigger": "ON_PLAY",
            "actions": [
                {
                    "type": "IF",
                    "condition": {"type": "COMPARE", "quantity": "ENEMY_CREATURES", "op": "GE", "value": 2},
                    "then": [{"type": "DAMAGE", "selector": {"scope": "ENEMIES"}, "amount": 20}],
                    "else": [{"type": "CHANGE_LIFE", "player": "OPPONENT", "amount": -200}]
                }
            ]
        }
    ]"#;
    let registry = EffectRegistry::from_json(json).unwrap();
    let surge = registry.get(&EffectId::from("surge")).unwrap();
    assert_eq!(surge.trigger, Trigger::OnPlay);
    assert_eq!(surge.all_actions().len(), 3);
    assert!(EffectRegistry::from_json("[{\"id\": 1}]").is_err());
}
