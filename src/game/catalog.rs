//! Static card table. Every rule that cares about cost or category asks here.

use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::moves::GainDestination;

/// Every card the engine knows. Declaration order is catalog order, which is
/// also the canonical sort order for multiset moves.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Card {
    Copper,
    Silver,
    Gold,
    Estate,
    Duchy,
    Province,
    Curse,
    Cellar,
    Chapel,
    Moat,
    Chancellor,
    Village,
    Woodcutter,
    Workshop,
    Feast,
    Gardens,
    Militia,
    Moneylender,
    Remodel,
    Smithy,
    #[serde(rename = "Throne Room")]
    ThroneRoom,
    #[serde(rename = "Council Room")]
    CouncilRoom,
    Festival,
    Laboratory,
    Library,
    Market,
    Mine,
    Witch,
    Adventurer,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum CardType {
    Action,
    Treasure,
    Victory,
    Curse,
}

impl fmt::Display for CardType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            CardType::Action => "action",
            CardType::Treasure => "treasure",
            CardType::Victory => "victory",
            CardType::Curse => "curse",
        };
        f.write_str(label)
    }
}

/// Which cards an effect may pick from.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum CardFilter {
    Any,
    Treasure,
    Action,
}

impl CardFilter {
    pub fn matches(&self, card: Card) -> bool {
        match self {
            CardFilter::Any => true,
            CardFilter::Treasure => card.is_treasure(),
            CardFilter::Action => card.is_action(),
        }
    }
}

/// Flat "+N" bonuses applied the moment an action resolves.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct Bonus {
    pub cards: u8,
    pub actions: u8,
    pub buys: u8,
    pub coins: u8,
}

impl Bonus {
    const fn new(cards: u8, actions: u8, buys: u8, coins: u8) -> Self {
        Self {
            cards,
            actions,
            buys,
            coins,
        }
    }
}

/// The part of an action that is more than a flat bonus.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum EffectKind {
    None,
    /// Trash a matching card from hand, then gain one costing up to its cost plus `bonus_cost`.
    TrashForGain {
        filter: CardFilter,
        bonus_cost: u8,
        destination: GainDestination,
    },
    TrashUpTo {
        max: u8,
    },
    DiscardAndDraw,
    Gain {
        max_cost: u8,
    },
    TrashSelfAndGain {
        max_cost: u8,
    },
    PlayTwice,
    DrawToHandSize {
        size: u8,
    },
    RevealForTreasures {
        count: u8,
    },
    MayDiscardDrawPile,
    TrashCopperForCoins {
        coins: u8,
    },
    OthersDiscardDownTo {
        size: u8,
    },
    OthersGainCurse,
    OthersDraw {
        count: u8,
    },
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct CardDef {
    pub card: Card,
    pub name: &'static str,
    pub cost: u8,
    pub category: CardType,
    /// Coins produced when played as a treasure.
    pub coins: u8,
    pub victory: i8,
    pub bonus: Bonus,
    pub effect: EffectKind,
    pub attack: bool,
    pub reaction: bool,
}

fn define(card: Card) -> CardDef {
    use Card::*;

    let (name, cost, category) = match card {
        Copper => ("Copper", 0, CardType::Treasure),
        Silver => ("Silver", 3, CardType::Treasure),
        Gold => ("Gold", 6, CardType::Treasure),
        Estate => ("Estate", 2, CardType::Victory),
        Duchy => ("Duchy", 5, CardType::Victory),
        Province => ("Province", 8, CardType::Victory),
        Curse => ("Curse", 0, CardType::Curse),
        Cellar => ("Cellar", 2, CardType::Action),
        Chapel => ("Chapel", 2, CardType::Action),
        Moat => ("Moat", 2, CardType::Action),
        Chancellor => ("Chancellor", 3, CardType::Action),
        Village => ("Village", 3, CardType::Action),
        Woodcutter => ("Woodcutter", 3, CardType::Action),
        Workshop => ("Workshop", 3, CardType::Action),
        Feast => ("Feast", 4, CardType::Action),
        Gardens => ("Gardens", 4, CardType::Victory),
        Militia => ("Militia", 4, CardType::Action),
        Moneylender => ("Moneylender", 4, CardType::Action),
        Remodel => ("Remodel", 4, CardType::Action),
        Smithy => ("Smithy", 4, CardType::Action),
        ThroneRoom => ("Throne Room", 4, CardType::Action),
        CouncilRoom => ("Council Room", 5, CardType::Action),
        Festival => ("Festival", 5, CardType::Action),
        Laboratory => ("Laboratory", 5, CardType::Action),
        Library => ("Library", 5, CardType::Action),
        Market => ("Market", 5, CardType::Action),
        Mine => ("Mine", 5, CardType::Action),
        Witch => ("Witch", 5, CardType::Action),
        Adventurer => ("Adventurer", 6, CardType::Action),
    };

    let coins = match card {
        Copper => 1,
        Silver => 2,
        Gold => 3,
        _ => 0,
    };

    let victory = match card {
        Estate => 1,
        Duchy => 3,
        Province => 6,
        Curse => -1,
        _ => 0,
    };

    let bonus = match card {
        Cellar => Bonus::new(0, 1, 0, 0),
        Moat => Bonus::new(2, 0, 0, 0),
        Chancellor => Bonus::new(0, 0, 0, 2),
        Village => Bonus::new(1, 2, 0, 0),
        Woodcutter => Bonus::new(0, 0, 1, 2),
        Militia => Bonus::new(0, 0, 0, 2),
        Smithy => Bonus::new(3, 0, 0, 0),
        CouncilRoom => Bonus::new(4, 0, 1, 0),
        Festival => Bonus::new(0, 2, 1, 2),
        Laboratory => Bonus::new(2, 1, 0, 0),
        Market => Bonus::new(1, 1, 1, 1),
        Witch => Bonus::new(2, 0, 0, 0),
        _ => Bonus::default(),
    };

    let effect = match card {
        Cellar => EffectKind::DiscardAndDraw,
        Chapel => EffectKind::TrashUpTo { max: 4 },
        Chancellor => EffectKind::MayDiscardDrawPile,
        Workshop => EffectKind::Gain { max_cost: 4 },
        Feast => EffectKind::TrashSelfAndGain { max_cost: 5 },
        Militia => EffectKind::OthersDiscardDownTo { size: 3 },
        Moneylender => EffectKind::TrashCopperForCoins { coins: 3 },
        Remodel => EffectKind::TrashForGain {
            filter: CardFilter::Any,
            bonus_cost: 2,
            destination: GainDestination::Discard,
        },
        ThroneRoom => EffectKind::PlayTwice,
        CouncilRoom => EffectKind::OthersDraw { count: 1 },
        Library => EffectKind::DrawToHandSize { size: 7 },
        Mine => EffectKind::TrashForGain {
            filter: CardFilter::Treasure,
            bonus_cost: 3,
            destination: GainDestination::Hand,
        },
        Witch => EffectKind::OthersGainCurse,
        Adventurer => EffectKind::RevealForTreasures { count: 2 },
        _ => EffectKind::None,
    };

    CardDef {
        card,
        name,
        cost,
        category,
        coins,
        victory,
        bonus,
        effect,
        attack: matches!(card, Militia | Witch),
        reaction: matches!(card, Moat),
    }
}

static CATALOG: Lazy<Vec<CardDef>> = Lazy::new(|| Card::ALL.iter().copied().map(define).collect());

static NAME_INDEX: Lazy<HashMap<String, Card>> = Lazy::new(|| {
    Card::ALL
        .iter()
        .map(|card| (normalize(card.name()), *card))
        .collect()
});

fn normalize(name: &str) -> String {
    name.chars()
        .filter(|c| !matches!(c, ' ' | '_' | '-'))
        .flat_map(char::to_lowercase)
        .collect()
}

impl Card {
    pub const ALL: [Card; 29] = [
        Card::Copper,
        Card::Silver,
        Card::Gold,
        Card::Estate,
        Card::Duchy,
        Card::Province,
        Card::Curse,
        Card::Cellar,
        Card::Chapel,
        Card::Moat,
        Card::Chancellor,
        Card::Village,
        Card::Woodcutter,
        Card::Workshop,
        Card::Feast,
        Card::Gardens,
        Card::Militia,
        Card::Moneylender,
        Card::Remodel,
        Card::Smithy,
        Card::ThroneRoom,
        Card::CouncilRoom,
        Card::Festival,
        Card::Laboratory,
        Card::Library,
        Card::Market,
        Card::Mine,
        Card::Witch,
        Card::Adventurer,
    ];

    pub const BASIC: [Card; 7] = [
        Card::Copper,
        Card::Silver,
        Card::Gold,
        Card::Estate,
        Card::Duchy,
        Card::Province,
        Card::Curse,
    ];

    /// The recommended kingdom for a first game.
    pub const FIRST_GAME: [Card; 10] = [
        Card::Cellar,
        Card::Market,
        Card::Militia,
        Card::Mine,
        Card::Moat,
        Card::Remodel,
        Card::Smithy,
        Card::Village,
        Card::Woodcutter,
        Card::Workshop,
    ];

    pub fn def(self) -> &'static CardDef {
        // CATALOG is built from ALL in declaration order.
        &CATALOG[self as usize]
    }

    pub fn name(self) -> &'static str {
        self.def().name
    }

    pub fn cost(self) -> u8 {
        self.def().cost
    }

    pub fn category(self) -> CardType {
        self.def().category
    }

    pub fn is_action(self) -> bool {
        self.category() == CardType::Action
    }

    pub fn is_treasure(self) -> bool {
        self.category() == CardType::Treasure
    }

    pub fn is_victory(self) -> bool {
        self.category() == CardType::Victory
    }

    pub fn is_kingdom(self) -> bool {
        !Card::BASIC.contains(&self)
    }

    pub fn lookup(name: &str) -> Option<Card> {
        NAME_INDEX.get(&normalize(name.trim())).copied()
    }
}

impl fmt::Display for Card {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown card `{0}`")]
pub struct UnknownCard(pub String);

impl FromStr for Card {
    type Err = UnknownCard;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Card::lookup(s).ok_or_else(|| UnknownCard(s.trim().to_string()))
    }
}

/// Every card in the full catalog, for listing to adapters.
pub fn catalog() -> &'static [CardDef] {
    &CATALOG
}
