use std::sync::atomic::{AtomicU64, Ordering};

#[derive(Debug, Default)]
pub struct Metrics {
    refreshes: AtomicU64,
    refresh_errors: AtomicU64,
    rate_limit_hits: AtomicU64,
    cooldowns: AtomicU64,
    store_write_errors: AtomicU64,
    waitlist_appends: AtomicU64,
    promotions: AtomicU64,
    promotion_rollbacks: AtomicU64,
}

impl Metrics {
    pub fn record_refresh(&self) {
        self.refreshes.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_refresh_error(&self) {
        self.refresh_errors.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_rate_limit(&self, cooldown: bool) {
        self.rate_limit_hits.fetch_add(1, Ordering::Relaxed);
        if cooldown {
            self.cooldowns.fetch_add(1, Ordering::Relaxed);
        }
    }

    pub fn record_store_write_error(&self) {
        self.store_write_errors.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_waitlist_append(&self) {
        self.waitlist_appends.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_promotions(&self, count: usize) {
        self.promotions.fetch_add(count as u64, Ordering::Relaxed);
    }

    pub fn record_promotion_rollback(&self) {
        self.promotion_rollbacks.fetch_add(1, Ordering::Relaxed);
    }

    pub fn rate_limit_hits(&self) -> u64 {
        self.rate_limit_hits.load(Ordering::Relaxed)
    }

    pub fn promotions(&self) -> u64 {
        self.promotions.load(Ordering::Relaxed)
    }

    pub fn render_prometheus(&self) -> String {
        let refreshes = self.refreshes.load(Ordering::Relaxed);
        let refresh_errors = self.refresh_errors.load(Ordering::Relaxed);
        let rate_limits = self.rate_limit_hits.load(Ordering::Relaxed);
        let cooldowns = self.cooldowns.load(Ordering::Relaxed);
        let write_errors = self.store_write_errors.load(Ordering::Relaxed);
        let appends = self.waitlist_appends.load(Ordering::Relaxed);
        let promotions = self.promotions.load(Ordering::Relaxed);
        let rollbacks = self.promotion_rollbacks.load(Ordering::Relaxed);

        format!(
            "# TYPE roster_refreshes_total counter\n\
roster_refreshes_total {}\n\
# TYPE roster_refresh_errors_total counter\n\
roster_refresh_errors_total {}\n\
# TYPE roster_rate_limit_hits_total counter\n\
roster_rate_limit_hits_total {}\n\
# TYPE roster_rate_limit_cooldowns_total counter\n\
roster_rate_limit_cooldowns_total {}\n\
# TYPE roster_store_write_errors_total counter\n\
roster_store_write_errors_total {}\n\
# TYPE roster_waitlist_appends_total counter\n\
roster_waitlist_appends_total {}\n\
# TYPE roster_promotions_total counter\n\
roster_promotions_total {}\n\
# TYPE roster_promotion_rollbacks_total counter\n\
roster_promotion_rollbacks_total {}\n",
            refreshes,
            refresh_errors,
            rate_limits,
            cooldowns,
            write_errors,
            appends,
            promotions,
            rollbacks
        )
    }
}
