use crate::model::{
    starting_catalog, Acquired, BreathPhase, Item, Ledger, MethodKind, MethodState, Patience,
    Payment, PaymentMethod,
};

/// Ticks each breathing phase is held before advancing.
pub(crate) const BREATH_PHASE_TICKS: u8 = 4;

/// Logic ticks the success acknowledgment stays up.
pub(crate) const SUCCESS_TICKS: u8 = 3;

/// Clicks required to clear a click challenge of the given duration.
pub(crate) fn click_target(effective_secs: u64) -> u32 {
    (effective_secs / 3).max(10) as u32
}

/// Remaining/progress derived from wall-clock elapsed time, so delayed
/// ticks cannot drift the countdown.
pub(crate) fn countdown(effective_secs: u64, elapsed_secs: u64) -> (u64, f32) {
    let remaining = effective_secs.saturating_sub(elapsed_secs);
    let progress =
        ((effective_secs - remaining) as f32 / effective_secs.max(1) as f32) * 100.0;
    (remaining, progress)
}

#[derive(Clone, Debug)]
pub(crate) struct Celebration {
    pub(crate) item: Item,
    pub(crate) ticks_left: u8,
}

/// The vending machine controller. Owns the catalog, the session, the
/// ledger and the inventory; the render layer only reads snapshots.
#[derive(Clone, Debug)]
pub(crate) struct Machine {
    items: Vec<Item>,
    selected_item: Option<&'static str>,
    selected_method: Option<MethodKind>,
    payment: Option<Payment>,
    ledger: Ledger,
    inventory: Vec<Acquired>,
    celebration: Option<Celebration>,
}

impl Machine {
    pub(crate) fn new() -> Self {
        Self {
            items: starting_catalog(),
            selected_item: None,
            selected_method: None,
            payment: None,
            ledger: Ledger::default(),
            inventory: Vec::new(),
            celebration: None,
        }
    }

    /* -----------------------------
       Read-only snapshots
    ------------------------------ */

    pub(crate) fn items(&self) -> &[Item] {
        &self.items
    }

    pub(crate) fn item(&self, id: &str) -> Option<&Item> {
        self.items.iter().find(|i| i.id == id)
    }

    pub(crate) fn selected_item(&self) -> Option<&Item> {
        self.selected_item.and_then(|id| self.item(id))
    }

    pub(crate) fn selected_method(&self) -> Option<MethodKind> {
        self.selected_method
    }

    pub(crate) fn payment(&self) -> Option<&Payment> {
        self.payment.as_ref()
    }

    pub(crate) fn is_processing(&self) -> bool {
        self.payment.is_some()
    }

    pub(crate) fn ledger(&self) -> &Ledger {
        &self.ledger
    }

    pub(crate) fn inventory(&self) -> &[Acquired] {
        &self.inventory
    }

    pub(crate) fn celebration(&self) -> Option<&Celebration> {
        self.celebration.as_ref()
    }

    /* -----------------------------
       Mutating entry points
       Invalid actions are no-ops, not errors.
    ------------------------------ */

    pub(crate) fn select_item(&mut self, id: &str) {
        if self.payment.is_some() {
            return;
        }
        let Some(item) = self.items.iter().find(|i| i.id == id) else {
            return;
        };
        if item.stock == 0 {
            return;
        }
        self.selected_item = Some(item.id);
        // A fresh selection dismisses any lingering success banner,
        // but keeps the previously chosen payment method.
        self.celebration = None;
    }

    pub(crate) fn select_payment_method(&mut self, kind: MethodKind) {
        if self.payment.is_some() || self.selected_item.is_none() {
            return;
        }
        self.selected_method = Some(kind);
    }

    pub(crate) fn start_payment(&mut self) {
        if self.payment.is_some() {
            return;
        }
        let (Some(item_id), Some(kind)) = (self.selected_item, self.selected_method) else {
            return;
        };
        let Some(item) = self.item(item_id) else {
            return;
        };

        let effective = PaymentMethod::of(kind).effective_cost(item);
        let state = match kind {
            MethodKind::Wait => MethodState::Wait,
            MethodKind::Focus => MethodState::Focus,
            MethodKind::Click => MethodState::Click {
                count: 0,
                target: click_target(effective),
            },
            MethodKind::Breathe => MethodState::Breathe {
                phase: BreathPhase::Inhale,
                phase_ticks: 0,
            },
        };

        self.payment = Some(Payment {
            item_id,
            method: kind,
            effective_secs: effective,
            remaining_secs: effective,
            progress: 0.0,
            state,
        });
        self.celebration = None;
    }

    pub(crate) fn record_click(&mut self) {
        if let Some(p) = self.payment.as_mut() {
            if let MethodState::Click { count, .. } = &mut p.state {
                *count += 1;
            }
        }
    }

    pub(crate) fn cancel_payment(&mut self) {
        self.payment = None;
        self.selected_item = None;
        self.selected_method = None;
    }

    /// One scheduler tick, nominally 1 Hz. `elapsed_secs` is whole seconds
    /// since payment start per the host monotonic clock; it is ignored when
    /// no payment is running. Countdown and breathing phase advance from the
    /// same tick, so stopping the session is a single state clear.
    pub(crate) fn tick_second(&mut self, elapsed_secs: u64) {
        if let Some(c) = self.celebration.as_mut() {
            c.ticks_left = c.ticks_left.saturating_sub(1);
        }
        if matches!(self.celebration, Some(Celebration { ticks_left: 0, .. })) {
            self.celebration = None;
        }

        let Some(p) = self.payment.as_mut() else {
            return;
        };

        let (remaining, progress) = countdown(p.effective_secs, elapsed_secs);
        p.remaining_secs = remaining;
        p.progress = progress;

        if let MethodState::Breathe { phase, phase_ticks } = &mut p.state {
            *phase_ticks += 1;
            if *phase_ticks >= BREATH_PHASE_TICKS {
                *phase = phase.next();
                *phase_ticks = 0;
            }
        }

        if remaining == 0 {
            self.finish_payment();
        }
    }

    /// Runs exactly once per countdown: the payment is consumed here, so a
    /// stray tick afterwards finds nothing to do.
    fn finish_payment(&mut self) {
        let Some(p) = self.payment.take() else {
            return;
        };

        // A missed click challenge is a cancellation, not a purchase.
        if let MethodState::Click { count, target } = p.state {
            if count < target {
                self.cancel_payment();
                return;
            }
        }

        let Some(item) = self.items.iter_mut().find(|i| i.id == p.item_id) else {
            return;
        };
        item.stock = item.stock.saturating_sub(1);
        let snapshot = *item;

        self.inventory.push(Acquired {
            item: snapshot,
            at: chrono::Utc::now(),
        });

        self.ledger.total_time_secs += p.effective_secs;
        self.ledger.items_purchased += 1;
        self.ledger.current_streak += 1;
        self.ledger.patience = Patience::for_total(self.ledger.total_time_secs);

        self.celebration = Some(Celebration {
            item: snapshot,
            ticks_left: SUCCESS_TICKS,
        });
        self.selected_item = None;
        self.selected_method = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{BreathPhase, MethodKind, MethodState, Patience};

    fn start(m: &mut Machine, id: &str, kind: MethodKind) {
        m.select_item(id);
        m.select_payment_method(kind);
        m.start_payment();
        assert!(m.is_processing(), "payment should be running");
    }

    /// Drives the countdown to expiry, one second per tick.
    fn run_out(m: &mut Machine) {
        let effective = m.payment().unwrap().effective_secs;
        for elapsed in 1..=effective {
            m.tick_second(elapsed);
        }
        assert!(!m.is_processing());
    }

    #[test]
    fn purchase_decrements_stock_and_updates_ledger() {
        let mut m = Machine::new();
        let before = m.item("chocolate-bar").unwrap().stock;

        start(&mut m, "chocolate-bar", MethodKind::Wait);
        assert_eq!(m.payment().unwrap().effective_secs, 60);
        run_out(&mut m);

        assert_eq!(m.item("chocolate-bar").unwrap().stock, before - 1);
        assert_eq!(m.ledger().total_time_secs, 60);
        assert_eq!(m.ledger().items_purchased, 1);
        assert_eq!(m.ledger().current_streak, 1);
        assert_eq!(m.inventory().len(), 1);
        assert_eq!(m.inventory()[0].item.id, "chocolate-bar");
        assert!(m.celebration().is_some());
        assert!(m.selected_item().is_none());
        assert_eq!(m.selected_method(), None);
    }

    #[test]
    fn zero_stock_item_cannot_be_selected() {
        let mut m = Machine::new();

        // golden-ticket starts with a single unit
        start(&mut m, "golden-ticket", MethodKind::Wait);
        run_out(&mut m);
        assert_eq!(m.item("golden-ticket").unwrap().stock, 0);

        m.select_item("golden-ticket");
        assert!(m.selected_item().is_none());

        // stock stays at zero no matter what
        m.select_payment_method(MethodKind::Wait);
        m.start_payment();
        assert!(!m.is_processing());
        assert_eq!(m.item("golden-ticket").unwrap().stock, 0);
    }

    #[test]
    fn effective_duration_is_scaled_and_ceiled() {
        let mut m = Machine::new();
        // coffee 120s at 80% -> 96s
        start(&mut m, "coffee", MethodKind::Click);
        assert_eq!(m.payment().unwrap().effective_secs, 96);
        m.cancel_payment();

        // potato-chips 45s at 90% -> 40.5 -> 41s
        start(&mut m, "potato-chips", MethodKind::Breathe);
        assert_eq!(m.payment().unwrap().effective_secs, 41);
    }

    #[test]
    fn countdown_is_wall_clock_anchored() {
        // Exact endpoints regardless of tick cadence.
        assert_eq!(countdown(48, 0), (48, 0.0));
        assert_eq!(countdown(48, 48), (0, 100.0));
        assert_eq!(countdown(48, 1000), (0, 100.0));

        let mut last = -1.0f32;
        for elapsed in [0u64, 1, 2, 7, 8, 30, 47, 48] {
            let (_, p) = countdown(48, elapsed);
            assert!(p >= last, "progress regressed at {elapsed}");
            assert!((0.0..=100.0).contains(&p));
            last = p;
        }
    }

    #[test]
    fn remaining_never_increases_under_delayed_ticks() {
        let mut m = Machine::new();
        start(&mut m, "meditation-track", MethodKind::Wait);

        let mut last_remaining = m.payment().unwrap().remaining_secs;
        // Host stalls: ticks arrive at uneven wall-clock offsets.
        for elapsed in [1u64, 2, 10, 11, 60, 200] {
            m.tick_second(elapsed);
            let r = m.payment().unwrap().remaining_secs;
            assert!(r <= last_remaining);
            last_remaining = r;
        }
    }

    #[test]
    fn click_target_floor_and_minimum() {
        assert_eq!(click_target(90), 30);
        assert_eq!(click_target(20), 10);
        assert_eq!(click_target(29), 10);
        assert_eq!(click_target(31), 10);
        assert_eq!(click_target(96), 32);
    }

    #[test]
    fn click_challenge_miss_is_a_cancellation() {
        let mut m = Machine::new();
        let before = m.item("coffee").unwrap().stock;

        start(&mut m, "coffee", MethodKind::Click);
        // a few clicks, but nowhere near the target of 32
        for _ in 0..5 {
            m.record_click();
        }
        run_out(&mut m);

        assert_eq!(m.item("coffee").unwrap().stock, before);
        assert_eq!(m.ledger().items_purchased, 0);
        assert_eq!(m.ledger().total_time_secs, 0);
        assert!(m.inventory().is_empty());
        assert!(m.celebration().is_none());
        assert!(m.selected_item().is_none());
    }

    #[test]
    fn click_challenge_met_completes_the_purchase() {
        let mut m = Machine::new();
        start(&mut m, "coffee", MethodKind::Click);

        let MethodState::Click { target, .. } = m.payment().unwrap().state else {
            panic!("expected click state");
        };
        assert_eq!(target, 32);
        for _ in 0..target {
            m.record_click();
        }
        run_out(&mut m);

        assert_eq!(m.ledger().items_purchased, 1);
        assert_eq!(m.ledger().total_time_secs, 96);
    }

    #[test]
    fn clicks_outside_a_click_challenge_are_ignored() {
        let mut m = Machine::new();
        m.record_click(); // idle

        start(&mut m, "chocolate-bar", MethodKind::Wait);
        m.record_click(); // wrong method
        assert!(matches!(m.payment().unwrap().state, MethodState::Wait));
    }

    #[test]
    fn cancel_mid_countdown_leaves_everything_untouched() {
        let mut m = Machine::new();
        let before = m.item("smoothie").unwrap().stock;

        start(&mut m, "smoothie", MethodKind::Wait);
        m.tick_second(1);
        m.tick_second(2);
        m.cancel_payment();

        assert!(!m.is_processing());
        assert!(m.selected_item().is_none());
        assert_eq!(m.selected_method(), None);
        assert_eq!(m.item("smoothie").unwrap().stock, before);
        assert_eq!(m.ledger().items_purchased, 0);
        assert!(m.inventory().is_empty());
    }

    #[test]
    fn breathing_cycles_four_ticks_per_phase() {
        let mut m = Machine::new();
        start(&mut m, "meditation-track", MethodKind::Breathe);

        let phase = |m: &Machine| -> BreathPhase {
            match m.payment().unwrap().state {
                MethodState::Breathe { phase, .. } => phase,
                _ => panic!("expected breathe state"),
            }
        };

        assert_eq!(phase(&m), BreathPhase::Inhale);
        for tick in 1u64..=12 {
            m.tick_second(tick);
            let expect = match tick {
                1..=3 => BreathPhase::Inhale,
                4..=7 => BreathPhase::Hold,
                8..=11 => BreathPhase::Exhale,
                _ => BreathPhase::Inhale, // wrapped
            };
            assert_eq!(phase(&m), expect, "tick {tick}");
        }

        // the cycle dies with the session
        m.cancel_payment();
        m.tick_second(13);
        assert!(m.payment().is_none());
    }

    #[test]
    fn stray_tick_after_completion_is_a_no_op() {
        let mut m = Machine::new();
        start(&mut m, "chocolate-bar", MethodKind::Wait);
        run_out(&mut m);

        let ledger = *m.ledger();
        let stock = m.item("chocolate-bar").unwrap().stock;
        m.tick_second(9999);
        m.tick_second(10_000);

        assert_eq!(m.ledger().items_purchased, ledger.items_purchased);
        assert_eq!(m.ledger().total_time_secs, ledger.total_time_secs);
        assert_eq!(m.item("chocolate-bar").unwrap().stock, stock);
        assert_eq!(m.inventory().len(), 1);
    }

    #[test]
    fn selection_preconditions() {
        let mut m = Machine::new();

        // method before item: rejected
        m.select_payment_method(MethodKind::Wait);
        assert_eq!(m.selected_method(), None);

        // start without a method: rejected
        m.select_item("coffee");
        m.start_payment();
        assert!(!m.is_processing());

        // switching items keeps the chosen method
        m.select_payment_method(MethodKind::Breathe);
        m.select_item("smoothie");
        assert_eq!(m.selected_method(), Some(MethodKind::Breathe));

        // selections are frozen while processing
        m.start_payment();
        m.select_item("coffee");
        m.select_payment_method(MethodKind::Wait);
        assert_eq!(m.selected_item().unwrap().id, "smoothie");
        assert_eq!(m.selected_method(), Some(MethodKind::Breathe));
    }

    #[test]
    fn success_banner_dismisses_after_three_ticks() {
        let mut m = Machine::new();
        start(&mut m, "chocolate-bar", MethodKind::Wait);
        run_out(&mut m);

        assert!(m.celebration().is_some());
        m.tick_second(0);
        m.tick_second(0);
        assert!(m.celebration().is_some());
        m.tick_second(0);
        assert!(m.celebration().is_none());
    }

    #[test]
    fn streak_only_grows_and_patience_follows_total_time() {
        let mut m = Machine::new();

        start(&mut m, "meditation-track", MethodKind::Wait); // 300s
        run_out(&mut m);
        assert_eq!(m.ledger().patience, Patience::Apprentice);
        assert_eq!(m.ledger().current_streak, 1);

        // a cancelled attempt does not touch the streak
        start(&mut m, "coffee", MethodKind::Wait);
        m.tick_second(1);
        m.cancel_payment();
        assert_eq!(m.ledger().current_streak, 1);

        start(&mut m, "time-crystal", MethodKind::Wait); // 900s
        run_out(&mut m);
        assert_eq!(m.ledger().total_time_secs, 1200);
        assert_eq!(m.ledger().patience, Patience::TimeWarrior);
        assert_eq!(m.ledger().current_streak, 2);
    }

    #[test]
    fn repeated_purchases_drain_stock_exactly() {
        let mut m = Machine::new();
        let initial = m.item("premium-cookie").unwrap().stock; // 4

        for n in 1..=initial {
            start(&mut m, "premium-cookie", MethodKind::Wait);
            run_out(&mut m);
            assert_eq!(m.item("premium-cookie").unwrap().stock, initial - n);
        }
        assert_eq!(m.inventory().len(), initial as usize);

        m.select_item("premium-cookie");
        assert!(m.selected_item().is_none());
    }
}
