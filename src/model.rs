use chrono::{DateTime, Utc};

#[derive(Clone, Debug)]
pub(crate) enum Scene {
    Main,
    Help,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum Category {
    Snacks,
    Drinks,
    Premium,
    Digital,
}

impl Category {
    pub(crate) fn label(self) -> &'static str {
        match self {
            Category::Snacks => "snacks",
            Category::Drinks => "drinks",
            Category::Premium => "premium",
            Category::Digital => "digital",
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum Rarity {
    Common,
    Rare,
    Legendary,
}

#[derive(Clone, Copy, Debug)]
pub(crate) struct Item {
    pub(crate) id: &'static str,
    pub(crate) name: &'static str,
    pub(crate) icon: char,
    pub(crate) description: &'static str,
    pub(crate) time_cost_secs: u64,
    pub(crate) category: Category,
    pub(crate) stock: u32,
    pub(crate) rarity: Rarity,
}

pub(crate) fn starting_catalog() -> Vec<Item> {
    vec![
        Item {
            id: "chocolate-bar",
            name: "Chocolate Bar",
            icon: '🍫',
            description: "Sweet milk chocolate",
            time_cost_secs: 60,
            category: Category::Snacks,
            stock: 8,
            rarity: Rarity::Common,
        },
        Item {
            id: "potato-chips",
            name: "Potato Chips",
            icon: '🍟',
            description: "Crispy golden chips",
            time_cost_secs: 45,
            category: Category::Snacks,
            stock: 12,
            rarity: Rarity::Common,
        },
        Item {
            id: "energy-drink",
            name: "Energy Drink",
            icon: '⚡',
            description: "Boost your energy",
            time_cost_secs: 90,
            category: Category::Drinks,
            stock: 6,
            rarity: Rarity::Common,
        },
        Item {
            id: "coffee",
            name: "Coffee",
            icon: '☕',
            description: "Fresh hot coffee",
            time_cost_secs: 120,
            category: Category::Drinks,
            stock: 10,
            rarity: Rarity::Common,
        },
        Item {
            id: "premium-cookie",
            name: "Premium Cookie",
            icon: '🍪',
            description: "Artisan baked cookie",
            time_cost_secs: 180,
            category: Category::Premium,
            stock: 4,
            rarity: Rarity::Rare,
        },
        Item {
            id: "smoothie",
            name: "Smoothie",
            icon: '🥤',
            description: "Healthy fruit smoothie",
            time_cost_secs: 150,
            category: Category::Drinks,
            stock: 5,
            rarity: Rarity::Rare,
        },
        Item {
            id: "wallpaper",
            name: "Digital Wallpaper",
            icon: '🖼',
            description: "HD desktop wallpaper",
            time_cost_secs: 30,
            category: Category::Digital,
            stock: 99,
            rarity: Rarity::Common,
        },
        Item {
            id: "meditation-track",
            name: "Meditation Track",
            icon: '🧘',
            description: "10-min guided meditation",
            time_cost_secs: 300,
            category: Category::Digital,
            stock: 15,
            rarity: Rarity::Rare,
        },
        Item {
            id: "golden-ticket",
            name: "Golden Ticket",
            icon: '🎫',
            description: "Mystery premium reward",
            time_cost_secs: 600,
            category: Category::Premium,
            stock: 1,
            rarity: Rarity::Legendary,
        },
        Item {
            id: "time-crystal",
            name: "Time Crystal",
            icon: '💎',
            description: "Rare temporal artifact",
            time_cost_secs: 900,
            category: Category::Premium,
            stock: 1,
            rarity: Rarity::Legendary,
        },
    ]
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum MethodKind {
    Wait,
    Focus,
    Click,
    Breathe,
}

#[derive(Clone, Copy, Debug)]
pub(crate) struct PaymentMethod {
    pub(crate) kind: MethodKind,
    pub(crate) name: &'static str,
    pub(crate) description: &'static str,
    // Percent of the item's time cost; integer so the ceiling stays exact.
    pub(crate) multiplier_pct: u64,
}

pub(crate) const PAYMENT_METHODS: [PaymentMethod; 4] = [
    PaymentMethod {
        kind: MethodKind::Wait,
        name: "Patient Wait",
        description: "Simply wait and contemplate",
        multiplier_pct: 100,
    },
    PaymentMethod {
        kind: MethodKind::Focus,
        name: "Mindful Focus",
        description: "Stay focused on the screen",
        multiplier_pct: 100,
    },
    PaymentMethod {
        kind: MethodKind::Click,
        name: "Click Challenge",
        description: "Prove your dedication",
        multiplier_pct: 80,
    },
    PaymentMethod {
        kind: MethodKind::Breathe,
        name: "Breathing Exercise",
        description: "Guided breathing session",
        multiplier_pct: 90,
    },
];

impl PaymentMethod {
    pub(crate) fn of(kind: MethodKind) -> Self {
        let i = match kind {
            MethodKind::Wait => 0,
            MethodKind::Focus => 1,
            MethodKind::Click => 2,
            MethodKind::Breathe => 3,
        };
        PAYMENT_METHODS[i]
    }

    /// Effective duration: item cost scaled by the multiplier, rounded up
    /// to the next whole second.
    pub(crate) fn effective_cost(&self, item: &Item) -> u64 {
        (item.time_cost_secs * self.multiplier_pct + 99) / 100
    }

    pub(crate) fn discount_pct(&self) -> u64 {
        100 - self.multiplier_pct
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum BreathPhase {
    Inhale,
    Hold,
    Exhale,
}

impl BreathPhase {
    pub(crate) fn next(self) -> Self {
        match self {
            BreathPhase::Inhale => BreathPhase::Hold,
            BreathPhase::Hold => BreathPhase::Exhale,
            BreathPhase::Exhale => BreathPhase::Inhale,
        }
    }

    pub(crate) fn label(self) -> &'static str {
        match self {
            BreathPhase::Inhale => "Breathe In",
            BreathPhase::Hold => "Hold",
            BreathPhase::Exhale => "Breathe Out",
        }
    }
}

/// Per-method sub-state, carried only while a payment is running.
#[derive(Clone, Copy, Debug)]
pub(crate) enum MethodState {
    Wait,
    Focus,
    Click { count: u32, target: u32 },
    Breathe { phase: BreathPhase, phase_ticks: u8 },
}

#[derive(Clone, Copy, Debug)]
pub(crate) struct Payment {
    pub(crate) item_id: &'static str,
    pub(crate) method: MethodKind,
    pub(crate) effective_secs: u64,
    pub(crate) remaining_secs: u64,
    pub(crate) progress: f32,
    pub(crate) state: MethodState,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord)]
pub(crate) enum Patience {
    Novice,
    Apprentice,
    TimeWarrior,
    PatientSage,
    ZenMaster,
}

impl Patience {
    pub(crate) fn for_total(total_secs: u64) -> Self {
        if total_secs >= 3600 {
            Patience::ZenMaster
        } else if total_secs >= 1800 {
            Patience::PatientSage
        } else if total_secs >= 900 {
            Patience::TimeWarrior
        } else if total_secs >= 300 {
            Patience::Apprentice
        } else {
            Patience::Novice
        }
    }

    pub(crate) fn label(self) -> &'static str {
        match self {
            Patience::Novice => "Novice",
            Patience::Apprentice => "Apprentice",
            Patience::TimeWarrior => "Time Warrior",
            Patience::PatientSage => "Patient Sage",
            Patience::ZenMaster => "Zen Master",
        }
    }
}

#[derive(Clone, Copy, Debug)]
pub(crate) struct Ledger {
    pub(crate) total_time_secs: u64,
    pub(crate) items_purchased: u32,
    pub(crate) current_streak: u32,
    pub(crate) patience: Patience,
}

impl Default for Ledger {
    fn default() -> Self {
        Self {
            total_time_secs: 0,
            items_purchased: 0,
            current_streak: 0,
            patience: Patience::Novice,
        }
    }
}

/// An inventory entry: snapshot of the item at purchase time.
#[derive(Clone, Debug)]
pub(crate) struct Acquired {
    pub(crate) item: Item,
    pub(crate) at: DateTime<Utc>,
}
