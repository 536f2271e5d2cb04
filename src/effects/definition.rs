//! Effect definitions - declarative effect data.
//!
//! An `EffectDefinition` names its trigger and lists `EffectAction`s. The
//! action list is a small recursive tree (`If` nests further lists) that
//! the interpreter in [`handlers`](super::handlers) walks. Definitions are
//! plain data loaded from JSON; nothing in them is executable.

use serde::{Deserialize, Serialize};

use crate::cards::{CreatureState, EffectType, Keyword, Mode};

/// Identifier of an effect definition.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EffectId(pub String);

impl EffectId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for EffectId {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

impl From<String> for EffectId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl std::fmt::Display for EffectId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// The game event that makes an effect eligible to resolve.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Trigger {
    OnPlay,
    OnAttack,
    OnDefend,
    OnDestroy,
    OnDraw,
    Continuous,
}

impl Trigger {
    /// Does a definition with this trigger resolve for `requested`?
    ///
    /// `Continuous` definitions match every request.
    #[must_use]
    pub fn matches(self, requested: Trigger) -> bool {
        self == requested || self == Trigger::Continuous
    }
}

/// Whose creatures a selector looks at, relative to the effect's owner.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Scope {
    /// The card the effect came from.
    Source,
    /// The event-scoped or chosen target.
    Target,
    Allies,
    Enemies,
    All,
}

impl Scope {
    /// Group scopes cover a whole board rather than one creature.
    #[must_use]
    pub const fn is_group(self) -> bool {
        matches!(self, Scope::Allies | Scope::Enemies | Scope::All)
    }
}

/// Extra conditions a creature must meet to be selected.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreatureFilter {
    #[serde(default)]
    pub affinity: Option<String>,
    #[serde(default)]
    pub mode: Option<Mode>,
    #[serde(default)]
    pub keyword: Option<Keyword>,
}

impl CreatureFilter {
    #[must_use]
    pub fn matches(&self, creature: &CreatureState) -> bool {
        self.affinity
            .as_ref()
            .map_or(true, |a| creature.affinity.as_ref() == Some(a))
            && self.mode.map_or(true, |m| creature.mode == m)
            && self.keyword.as_ref().map_or(true, |k| creature.has_keyword(k))
    }
}

/// Which creatures an action applies to.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Selector {
    pub scope: Scope,
    #[serde(default)]
    pub filter: CreatureFilter,
}

impl Selector {
    #[must_use]
    pub fn new(scope: Scope) -> Self {
        Self {
            scope,
            filter: CreatureFilter::default(),
        }
    }

    #[must_use]
    pub fn with_affinity(mut self, affinity: impl Into<String>) -> Self {
        self.filter.affinity = Some(affinity.into());
        self
    }

    #[must_use]
    pub fn with_mode(mut self, mode: Mode) -> Self {
        self.filter.mode = Some(mode);
        self
    }

    #[must_use]
    pub fn with_keyword(mut self, keyword: impl Into<Keyword>) -> Self {
        self.filter.keyword = Some(keyword.into());
        self
    }
}

/// Which player an action applies to, relative to the effect's owner.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PlayerSelector {
    Owner,
    Opponent,
    Both,
}

/// How long a stat or keyword change lasts.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Duration {
    /// Applied once, never reverted.
    #[default]
    Instant,
    /// Reverted after the owner ends this many turns.
    Turns(u32),
    /// Stays until its source leaves the field.
    Permanent,
}

impl Duration {
    /// Remaining-turn counter for an active effect, `None` for permanent.
    #[must_use]
    pub const fn remaining_turns(self) -> Option<u32> {
        match self {
            Duration::Turns(n) => Some(n),
            Duration::Instant | Duration::Permanent => None,
        }
    }

    #[must_use]
    pub const fn is_lingering(self) -> bool {
        !matches!(self, Duration::Instant)
    }
}

/// A single declarative step of an effect.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EffectAction {
    // === Creature Stats ===

    /// Shift attack/defense. Lingering durations register an active effect.
    ModifyStats {
        selector: Selector,
        #[serde(default)]
        atk: i32,
        #[serde(default)]
        def: i32,
        #[serde(default)]
        duration: Duration,
    },

    /// Lower HP. Creatures reaching 0 are destroyed.
    Damage { selector: Selector, amount: i32 },

    /// Raise HP up to max.
    Heal { selector: Selector, amount: i32 },

    // === Players ===

    /// Add to (or with a negative amount, subtract from) life points.
    ChangeLife { player: PlayerSelector, amount: i64 },

    Draw { player: PlayerSelector, count: usize },

    /// Discard random cards from hand.
    Discard { player: PlayerSelector, count: usize },

    // === Card Movement ===

    Destroy { selector: Selector },

    ReturnToHand { selector: Selector },

    // === Keywords and Mode ===

    AddKeyword {
        selector: Selector,
        keyword: Keyword,
        #[serde(default)]
        duration: Duration,
    },

    RemoveKeyword { selector: Selector, keyword: Keyword },

    SetMode { selector: Selector, mode: Mode },

    // === Control Flow ===

    If {
        condition: Condition,
        #[serde(default)]
        then: Vec<EffectAction>,
        #[serde(default, rename = "else")]
        otherwise: Vec<EffectAction>,
    },
}

impl EffectAction {
    /// The selector this action targets, if it targets creatures.
    #[must_use]
    pub fn selector(&self) -> Option<&Selector> {
        match self {
            EffectAction::ModifyStats { selector, .. }
            | EffectAction::Damage { selector, .. }
            | EffectAction::Heal { selector, .. }
            | EffectAction::Destroy { selector }
            | EffectAction::ReturnToHand { selector }
            | EffectAction::AddKeyword { selector, .. }
            | EffectAction::RemoveKeyword { selector, .. }
            | EffectAction::SetMode { selector, .. } => Some(selector),
            EffectAction::ChangeLife { .. }
            | EffectAction::Draw { .. }
            | EffectAction::Discard { .. }
            | EffectAction::If { .. } => None,
        }
    }

    /// Visit this action and every nested one.
    pub fn walk<'a>(&'a self, visit: &mut impl FnMut(&'a EffectAction)) {
        visit(self);
        if let EffectAction::If { then, otherwise, .. } = self {
            for action in then.iter().chain(otherwise) {
                action.walk(visit);
            }
        }
    }
}

/// A number read off the board, relative to the effect's owner.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Quantity {
    OwnLife,
    OpponentLife,
    OwnCreatures,
    EnemyCreatures,
    EnemyAttackModeCreatures,
    OwnHandSize,
    OpponentHandSize,
    OwnDeckSize,
    /// Current attack of the source creature, 0 if it is not on the field.
    SourceAttack,
    /// Current HP of the target creature, 0 if there is none.
    TargetHp,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Comparison {
    Lt,
    Le,
    Eq,
    Ne,
    Ge,
    Gt,
}

impl Comparison {
    #[must_use]
    pub fn apply(self, left: i64, right: i64) -> bool {
        match self {
            Comparison::Lt => left < right,
            Comparison::Le => left <= right,
            Comparison::Eq => left == right,
            Comparison::Ne => left != right,
            Comparison::Ge => left >= right,
            Comparison::Gt => left > right,
        }
    }
}

/// A board-state predicate.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Condition {
    Compare {
        quantity: Quantity,
        op: Comparison,
        value: i64,
    },
    All { conditions: Vec<Condition> },
    Any { conditions: Vec<Condition> },
    Not { condition: Box<Condition> },
}

impl Condition {
    #[must_use]
    pub fn compare(quantity: Quantity, op: Comparison, value: i64) -> Self {
        Condition::Compare { quantity, op, value }
    }
}

/// A precondition for manual activation.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Requirement {
    pub condition: Condition,
    /// Shown when the condition fails.
    #[serde(default)]
    pub reason: Option<String>,
}

/// Which side a chosen target comes from.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TargetSide {
    Own,
    Enemy,
    Any,
}

/// What a manually activated effect must be pointed at.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TargetRequirement {
    pub side: TargetSide,
    #[serde(default)]
    pub filter: CreatureFilter,
}

/// A complete effect definition.
///
/// ```
/// use lane_duel::effects::{EffectAction, EffectDefinition, Duration, Scope, Selector, Trigger};
///
/// let rally = EffectDefinition::new("rally", "Rally", Trigger::OnPlay).with_action(
///     EffectAction::ModifyStats {
///         selector: Selector::new(Scope::Allies).with_affinity("FIRE"),
///         atk: 20,
///         def: 0,
///         duration: Duration::Turns(2),
///     },
/// );
/// assert_eq!(rally.actions.len(), 1);
/// ```
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct EffectDefinition {
    pub id: EffectId,
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default = "default_timing")]
    pub timing: EffectType,
    pub trigger: Trigger,
    #[serde(default)]
    pub requirements: Vec<Requirement>,
    #[serde(default)]
    pub target: Option<TargetRequirement>,
    #[serde(default)]
    pub actions: Vec<EffectAction>,
}

fn default_timing() -> EffectType {
    EffectType::OneTime
}

impl EffectDefinition {
    pub fn new(id: impl Into<EffectId>, name: impl Into<String>, trigger: Trigger) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            description: String::new(),
            timing: EffectType::OneTime,
            trigger,
            requirements: Vec::new(),
            target: None,
            actions: Vec::new(),
        }
    }

    #[must_use]
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    #[must_use]
    pub fn with_timing(mut self, timing: EffectType) -> Self {
        self.timing = timing;
        self
    }

    #[must_use]
    pub fn with_requirement(mut self, condition: Condition, reason: impl Into<String>) -> Self {
        self.requirements.push(Requirement {
            condition,
            reason: Some(reason.into()),
        });
        self
    }

    #[must_use]
    pub fn with_target(mut self, side: TargetSide, filter: CreatureFilter) -> Self {
        self.target = Some(TargetRequirement { side, filter });
        self
    }

    #[must_use]
    pub fn with_action(mut self, action: EffectAction) -> Self {
        self.actions.push(action);
        self
    }

    /// Every action, nested ones included.
    #[must_use]
    pub fn all_actions(&self) -> Vec<&EffectAction> {
        let mut out = Vec::new();
        for action in &self.actions {
            action.walk(&mut |a| out.push(a));
        }
        out
    }

    /// True if this effect can only ever hit enemy creatures in attack mode.
    ///
    /// Such an effect has nothing to do against a board of defenders.
    #[must_use]
    pub fn requires_attack_mode_targets(&self) -> bool {
        let attack_only = |side_is_enemy: bool, filter: &CreatureFilter| {
            side_is_enemy && filter.mode == Some(Mode::Attack)
        };

        if let Some(target) = &self.target {
            if attack_only(target.side == TargetSide::Enemy, &target.filter) {
                return true;
            }
        }

        let selectors: Vec<&Selector> = self
            .all_actions()
            .into_iter()
            .filter_map(EffectAction::selector)
            .filter(|s| s.scope != Scope::Source && s.scope != Scope::Target)
            .collect();
        !selectors.is_empty()
            && selectors
                .iter()
                .all(|s| attack_only(s.scope == Scope::Enemies, &s.filter))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_trigger_matching() {
        assert!(Trigger::OnPlay.matches(Trigger::OnPlay));
        assert!(!Trigger::OnPlay.matches(Trigger::OnAttack));
        assert!(Trigger::Continuous.matches(Trigger::OnDraw));
        assert!(Trigger::Continuous.matches(Trigger::OnDefend));
    }

    #[test]
    fn test_comparison() {
        assert!(Comparison::Lt.apply(1, 2));
        assert!(Comparison::Ge.apply(2, 2));
        assert!(!Comparison::Ne.apply(3, 3));
    }

    #[test]
    fn test_json_with_nested_if() {
        let json = r#"{
            "id": "last_stand",
            "name": "Last Stand",
            "trigger": "ON_PLAY",
            "actions": [
                {"type": "IF",
                 "condition": {"type": "COMPARE", "quantity": "OWN_LIFE", "op": "LE", "value": 1000},
                 "then": [{"type": "MODIFY_STATS", "selector": {"scope": "ALLIES"}, "atk": 50,
                           "duration": {"TURNS": 1}}],
                 "else": [{"type": "DRAW", "player": "OWNER", "count": 1}]}
            ]
        }"#;
        let def: EffectDefinition = serde_json::from_str(json).unwrap();

        assert_eq!(def.timing, EffectType::OneTime);
        match &def.actions[0] {
            EffectAction::If { then, otherwise, .. } => {
                assert!(matches!(
                    then[0],
                    EffectAction::ModifyStats { atk: 50, duration: Duration::Turns(1), .. }
                ));
                assert!(matches!(otherwise[0], EffectAction::Draw { count: 1, .. }));
            }
            other => panic!("expected IF, got {other:?}"),
        }
        assert_eq!(def.all_actions().len(), 3);
    }

    #[test]
    fn test_requires_attack_mode_targets() {
        let sweep = EffectDefinition::new("sweep", "Sweep", Trigger::OnDefend).with_action(
            EffectAction::Damage {
                selector: Selector::new(Scope::Enemies).with_mode(Mode::Attack),
                amount: 50,
            },
        );
        assert!(sweep.requires_attack_mode_targets());

        let heal = sweep.clone().with_action(EffectAction::Heal {
            selector: Selector::new(Scope::Allies),
            amount: 10,
        });
        assert!(!heal.requires_attack_mode_targets());

        let life = EffectDefinition::new("gain", "Gain", Trigger::OnDefend).with_action(
            EffectAction::ChangeLife {
                player: PlayerSelector::Owner,
                amount: 500,
            },
        );
        assert!(!life.requires_attack_mode_targets());
    }

    #[test]
    fn test_filter() {
        let profile = crate::cards::CreatureProfile {
            attack: 10,
            defense: 10,
            hp: 10,
            affinity: Some("FIRE".into()),
            ..Default::default()
        };
        let creature = CreatureState::from_profile(&profile);

        let fire = CreatureFilter {
            affinity: Some("FIRE".into()),
            ..Default::default()
        };
        let defenders = CreatureFilter {
            mode: Some(Mode::Defense),
            ..Default::default()
        };
        assert!(fire.matches(&creature));
        assert!(!defenders.matches(&creature));
        assert!(CreatureFilter::default().matches(&creature));
    }
}
