//! Economic rules: immutable constants plus pure reward lookups.
//!
//! Every lookup is total. Unknown weapons fall back to the rifle reward and
//! unknown win types fall back to the elimination reward.

use serde::{Deserialize, Serialize};
use std::borrow::Cow;

/// Currency units (whole dollars).
pub type Money = i64;

/// Version of the standard ruleset.
pub const STANDARD_RULES_VERSION: &str = "2025_09";

const STANDARD_LOSS_BONUS_LADDER: &[Money] = &[1400, 1900, 2400, 2900, 3400];

/// The standard competitive ruleset.
pub const STANDARD_RULES: Rules = Rules {
    money_cap: 16000,
    start_money: 800,
    knife_reward: 1500,
    smg_reward: 600,
    p90_reward: 300,
    shotgun_reward: 900,
    xm1014_reward: 600,
    rifle_reward: 300,
    pistol_reward: 300,
    grenade_reward: 300,
    awp_reward: 100,
    zeus_reward: 100,
    elimination_reward: 3250,
    bomb_explosion_reward: 3500,
    defuse_reward: 3500,
    time_expired_reward: 3250,
    loss_bonus_ladder: Cow::Borrowed(STANDARD_LOSS_BONUS_LADDER),
    plant_team_bonus_on_loss: 800,
    objective_bonus: 300,
    version: Cow::Borrowed(STANDARD_RULES_VERSION),
};

/// Versioned economy constants.
///
/// A `Rules` value is never mutated after construction. Changing any constant
/// must come with a new `version`, since the version is part of every
/// snapshot checksum.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Rules {
    pub money_cap: Money,
    pub start_money: Money,

    pub knife_reward: Money,
    pub smg_reward: Money,
    pub p90_reward: Money,
    pub shotgun_reward: Money,
    pub xm1014_reward: Money,
    pub rifle_reward: Money,
    pub pistol_reward: Money,
    pub grenade_reward: Money,
    pub awp_reward: Money,
    pub zeus_reward: Money,

    pub elimination_reward: Money,
    pub bomb_explosion_reward: Money,
    pub defuse_reward: Money,
    pub time_expired_reward: Money,

    /// Loss bonus indexed by `loss_streak - 1`, plateauing at the last entry.
    pub loss_bonus_ladder: Cow<'static, [Money]>,

    /// Paid to every T player when T planted but lost the round.
    pub plant_team_bonus_on_loss: Money,
    /// Paid to the planter and to the defuser.
    pub objective_bonus: Money,

    pub version: Cow<'static, str>,
}

impl Rules {
    pub fn standard() -> Self {
        STANDARD_RULES
    }

    pub fn version(&self) -> &str {
        &self.version
    }

    /// Kill reward for the weapon used.
    pub fn kill_reward_for(&self, weapon: &str) -> Money {
        match WeaponCategory::classify(weapon) {
            WeaponCategory::Knife => self.knife_reward,
            WeaponCategory::P90 => self.p90_reward,
            WeaponCategory::Xm1014 => self.xm1014_reward,
            WeaponCategory::Awp => self.awp_reward,
            WeaponCategory::Zeus => self.zeus_reward,
            WeaponCategory::Smg => self.smg_reward,
            WeaponCategory::Shotgun => self.shotgun_reward,
            WeaponCategory::Rifle => self.rifle_reward,
            WeaponCategory::Pistol => self.pistol_reward,
            WeaponCategory::Grenade => self.grenade_reward,
        }
    }

    /// Loss bonus for a team currently on `loss_streak` consecutive losses.
    pub fn loss_bonus(&self, loss_streak: u32) -> Money {
        if loss_streak == 0 || self.loss_bonus_ladder.is_empty() {
            return 0;
        }
        let last = self.loss_bonus_ladder.len() - 1;
        let index = (loss_streak as usize - 1).min(last);
        self.loss_bonus_ladder[index]
    }

    /// Round win reward for the given win type string.
    pub fn win_reward(&self, win_type: &str) -> Money {
        match WinType::parse(win_type) {
            WinType::Elimination => self.elimination_reward,
            WinType::BombExplosion => self.bomb_explosion_reward,
            WinType::Defuse => self.defuse_reward,
            WinType::TimeExpired => self.time_expired_reward,
        }
    }

    /// Clip an amount to `[0, money_cap]`.
    pub fn clamp_money(&self, amount: Money) -> Money {
        amount.min(self.money_cap).max(0)
    }
}

impl Default for Rules {
    fn default() -> Self {
        Self::standard()
    }
}

/// Kill reward buckets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum WeaponCategory {
    Knife,
    P90,
    Xm1014,
    Awp,
    Zeus,
    Smg,
    Shotgun,
    Rifle,
    Pistol,
    Grenade,
}

const KNIVES: &[&str] = &[
    "knife",
    "knife_t",
    "knife_ct",
    "bayonet",
    "knife_karambit",
    "knife_m9_bayonet",
    "knife_flip",
    "knife_gut",
    "knife_falchion",
    "knife_bowie",
    "knife_butterfly",
    "knife_push",
    "knife_cord",
    "knife_canis",
    "knife_ursus",
    "knife_gypsy_jackknife",
    "knife_outdoor",
    "knife_stiletto",
    "knife_widowmaker",
    "knife_css",
    "knife_skeleton",
];

const SMGS: &[&str] = &["mac10", "mp7", "mp5sd", "mp9", "bizon", "ump45"];

const SHOTGUNS: &[&str] = &["nova", "mag7", "sawedoff"];

const RIFLES: &[&str] = &[
    "ak47",
    "m4a1",
    "m4a1_silencer",
    "famas",
    "galil",
    "aug",
    "sg556",
    "scar20",
    "g3sg1",
];

const PISTOLS: &[&str] = &[
    "glock",
    "usp_silencer",
    "p2000",
    "p250",
    "fiveseven",
    "tec9",
    "cz75a",
    "deagle",
    "revolver",
    "elite",
    "hkp2000",
];

const GRENADES: &[&str] = &[
    "hegrenade",
    "flashbang",
    "smokegrenade",
    "incgrenade",
    "molotov",
    "decoy",
];

impl WeaponCategory {
    /// Case-insensitive classification. Anything unmatched is a rifle.
    pub fn classify(weapon: &str) -> Self {
        let name = weapon.to_ascii_lowercase();
        let name = name.as_str();

        if KNIVES.contains(&name) {
            return WeaponCategory::Knife;
        }
        match name {
            "p90" => return WeaponCategory::P90,
            "xm1014" => return WeaponCategory::Xm1014,
            "awp" => return WeaponCategory::Awp,
            "zeus" | "taser" => return WeaponCategory::Zeus,
            _ => {}
        }

        if SMGS.contains(&name) {
            WeaponCategory::Smg
        } else if SHOTGUNS.contains(&name) {
            WeaponCategory::Shotgun
        } else if RIFLES.contains(&name) {
            WeaponCategory::Rifle
        } else if PISTOLS.contains(&name) {
            WeaponCategory::Pistol
        } else if GRENADES.contains(&name) {
            WeaponCategory::Grenade
        } else {
            WeaponCategory::Rifle
        }
    }
}

/// How a round was won.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum WinType {
    Elimination,
    BombExplosion,
    Defuse,
    TimeExpired,
}

impl WinType {
    /// Case-insensitive parse; unrecognized values count as elimination.
    pub fn parse(win_type: &str) -> Self {
        match win_type.to_ascii_lowercase().as_str() {
            "bomb_explosion" | "t_bomb_explosion" => WinType::BombExplosion,
            "defuse" | "ct_defuse" => WinType::Defuse,
            "time_expired" | "ct_time_expired_no_plant" => WinType::TimeExpired,
            _ => WinType::Elimination,
        }
    }
}

/// Free-function form of [`Rules::clamp_money`].
pub fn clamp_money(amount: Money, rules: &Rules) -> Money {
    rules.clamp_money(amount)
}
