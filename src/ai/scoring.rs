//! Board evaluation for AI decisions.
//!
//! All functions here are pure reads of `GameState`. Higher scores are
//! better for the player asking; `None` means "do not consider".
//!
//! ## Attack Scoring
//!
//! - Guaranteed kill: +5
//! - Suicidal trade (attacker dies, defender survives): -4, or -100 when
//!   it is the AI's last creature
//! - Low remaining HP on the defender is preferred
//! - Hits that deal no damage: -1
//! - Face-down defenders are unknown and score 0
//! - Direct attacks score high, lethal ones higher still

use crate::cards::{Card, CreatureState, Mode};
use crate::core::{GameState, PlayerId};
use crate::rules::combat;

pub const KILL_BONUS: f64 = 5.0;
pub const SUICIDE_PENALTY: f64 = -4.0;
pub const LAST_CREATURE_PENALTY: f64 = -100.0;
pub const POINTLESS_HIT_PENALTY: f64 = -1.0;
pub const DIRECT_ATTACK_SCORE: f64 = 10.0;
pub const LETHAL_BONUS: f64 = 50.0;

fn face_up(card: &Card) -> Option<&CreatureState> {
    card.creature().filter(|c| !c.face_down)
}

/// Score attacking the opponent's lane `target` with our creature in `attacker`.
#[must_use]
pub fn attack_score(state: &GameState, player: PlayerId, attacker: usize, target: usize) -> Option<f64> {
    let att = state.player(player).creature(attacker).and_then(face_up)?;
    let opponent = state.player(player.opponent());

    let Some(defender) = opponent.creature(target) else {
        if opponent.has_creatures() {
            return None;
        }
        let damage = i64::from(att.attack.max(0));
        let mut score = DIRECT_ATTACK_SCORE + damage as f64 / 100.0;
        if damage >= opponent.life {
            score += LETHAL_BONUS;
        }
        return Some(score);
    };
    let Some(def) = face_up(defender) else {
        return Some(0.0);
    };

    let hit = combat::exchange(att, def);
    let (kills, dies) = combat::is_lethal(att, def);

    let mut score = 0.0;
    if kills {
        score += KILL_BONUS;
    }
    if dies && !kills {
        score += if state.player(player).creature_count() == 1 {
            LAST_CREATURE_PENALTY
        } else {
            SUICIDE_PENALTY
        };
    }
    if hit.to_defender == 0 {
        score += POINTLESS_HIT_PENALTY;
    }
    if def.max_hp > 0 {
        score += 1.0 - f64::from(def.hp) / f64::from(def.max_hp);
    }
    score += f64::from(hit.to_defender) / 100.0;
    Some(score)
}

/// Raw strength of a creature card in hand.
#[must_use]
pub fn creature_value(card: &Card) -> f64 {
    card.creature()
        .map(|c| f64::from(c.attack) + f64::from(c.defense) + f64::from(c.max_hp) / 2.0)
        .unwrap_or(0.0)
}

/// How good a lane is for a new creature, judged by what it will face.
#[must_use]
pub fn lane_score(state: &GameState, player: PlayerId, card: &Card, lane: usize) -> f64 {
    let Some(ours) = card.creature() else {
        return 0.0;
    };
    match state
        .player(player.opponent())
        .creature(lane)
        .and_then(face_up)
    {
        None => 1.0,
        Some(theirs) => {
            let (kills, dies) = combat::is_lethal(ours, theirs);
            match (kills, dies) {
                (true, false) => 2.0,
                (_, true) => -1.0,
                _ => 0.0,
            }
        }
    }
}

/// Mode a face-up creature should be in, if different from its current one.
///
/// A creature that cannot beat any enemy attacker and defends better than
/// it attacks goes to defense. A defender that could kill something goes
/// back to attack.
#[must_use]
pub fn preferred_mode(state: &GameState, player: PlayerId, lane: usize) -> Option<Mode> {
    let ours = state.player(player).creature(lane).and_then(face_up)?;
    let enemies: Vec<&CreatureState> = state
        .player(player.opponent())
        .creatures()
        .filter_map(|(_, c)| face_up(c))
        .collect();

    let mut as_attacker = ours.clone();
    as_attacker.mode = Mode::Attack;
    let can_kill = enemies.iter().any(|e| combat::is_lethal(&as_attacker, e).0);
    let threatened = enemies
        .iter()
        .any(|e| e.mode == Mode::Attack && combat::is_lethal(e, &as_attacker).0);

    let wanted = if ours.mode == Mode::Defense && (can_kill || enemies.is_empty()) {
        Mode::Attack
    } else if ours.mode == Mode::Attack && threatened && !can_kill && ours.defense > ours.attack {
        Mode::Defense
    } else {
        ours.mode
    };
    (wanted != ours.mode).then_some(wanted)
}

/// Enemy creatures that can attack next turn.
#[must_use]
pub fn threat_count(state: &GameState, player: PlayerId) -> usize {
    state
        .player(player.opponent())
        .creatures()
        .filter_map(|(_, c)| face_up(c))
        .filter(|c| c.mode == Mode::Attack)
        .count()
}

/// Probability of springing a trap when attacked.
#[must_use]
pub fn trap_probability(skill: u8, threats: usize, own_board_empty: bool) -> f64 {
    let mut p = 0.2 + 0.05 * f64::from(skill) + 0.15 * threats as f64;
    if own_board_empty {
        p += 0.3;
    }
    p.clamp(0.0, 1.0)
}
