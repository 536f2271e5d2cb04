//! Combat math.
//!
//! - `ATTACK` vs `ATTACK`: the defender takes the attacker's full attack;
//!   the attacker takes `max(0, defender attack - attacker attack)`.
//! - `ATTACK` vs `DEFENSE`: the defender takes
//!   `max(0, attacker attack - defender defense)`; the attacker takes nothing.

use crate::cards::{CreatureState, Mode};

/// Damage each side takes in one exchange.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Exchange {
    pub to_defender: i32,
    pub to_attacker: i32,
}

/// Damage for `attacker` hitting `defender`.
#[must_use]
pub fn exchange(attacker: &CreatureState, defender: &CreatureState) -> Exchange {
    let attack = attacker.attack.max(0);
    match defender.mode {
        Mode::Attack => Exchange {
            to_defender: attack,
            to_attacker: (defender.attack - attack).max(0),
        },
        Mode::Defense => Exchange {
            to_defender: (attack - defender.defense).max(0),
            to_attacker: 0,
        },
    }
}

/// Would this exchange destroy each side? `(defender dies, attacker dies)`.
#[must_use]
pub fn is_lethal(attacker: &CreatureState, defender: &CreatureState) -> (bool, bool) {
    let hit = exchange(attacker, defender);
    (
        hit.to_defender >= defender.hp && hit.to_defender > 0,
        hit.to_attacker >= attacker.hp && hit.to_attacker > 0,
    )
}
