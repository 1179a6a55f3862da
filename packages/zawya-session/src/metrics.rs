//! Prometheus metrics (lock-free atomics, zero allocation on hot path).

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Instant;

pub static METRICS: Metrics = Metrics::new();

pub struct Metrics {
    // --- Scans ---
    pub scan_total: AtomicU64,
    pub scan_allowed: AtomicU64,
    pub scan_no_location: AtomicU64,
    pub scan_too_far: AtomicU64,
    pub scan_invalid_payload: AtomicU64,

    // --- Album ---
    pub collect_success: AtomicU64,
    pub collect_already_owned: AtomicU64,
    pub collect_zone_exhausted: AtomicU64,
    pub collect_rejected_other: AtomicU64,

    // --- Mint ---
    pub mint_success: AtomicU64,
    pub mint_failed: AtomicU64,
    pub mint_duration_us_sum: AtomicU64,
    pub mint_duration_us_max: AtomicU64,

    // --- Location ---
    pub location_updates: AtomicU64,
    pub location_stale: AtomicU64,
    pub location_fallbacks: AtomicU64,
}

impl Metrics {
    const fn new() -> Self {
        Self {
            scan_total: AtomicU64::new(0),
            scan_allowed: AtomicU64::new(0),
            scan_no_location: AtomicU64::new(0),
            scan_too_far: AtomicU64::new(0),
            scan_invalid_payload: AtomicU64::new(0),
            collect_success: AtomicU64::new(0),
            collect_already_owned: AtomicU64::new(0),
            collect_zone_exhausted: AtomicU64::new(0),
            collect_rejected_other: AtomicU64::new(0),
            mint_success: AtomicU64::new(0),
            mint_failed: AtomicU64::new(0),
            mint_duration_us_sum: AtomicU64::new(0),
            mint_duration_us_max: AtomicU64::new(0),
            location_updates: AtomicU64::new(0),
            location_stale: AtomicU64::new(0),
            location_fallbacks: AtomicU64::new(0),
        }
    }

    pub fn record_mint_duration(&self, start: Instant) {
        let us = start.elapsed().as_micros() as u64;
        self.mint_duration_us_sum.fetch_add(us, Ordering::Relaxed);
        // CAS loop for max tracking
        let mut cur = self.mint_duration_us_max.load(Ordering::Relaxed);
        while us > cur {
            match self.mint_duration_us_max.compare_exchange_weak(
                cur,
                us,
                Ordering::Relaxed,
                Ordering::Relaxed,
            ) {
                Ok(_) => break,
                Err(actual) => cur = actual,
            }
        }
    }

    /// Render in Prometheus text exposition format.
    pub fn render(&self, album_size: usize, pending_mints: usize) -> String {
        let load = |c: &AtomicU64| c.load(Ordering::Relaxed);
        let mint_dur_sum_s = load(&self.mint_duration_us_sum) as f64 / 1_000_000.0;
        let mint_dur_max_s =
            self.mint_duration_us_max.swap(0, Ordering::Relaxed) as f64 / 1_000_000.0;

        let counters: [(&str, &str, u64); 14] = [
            ("zawya_scan_total", "Scan attempts received.", load(&self.scan_total)),
            ("zawya_scan_allowed_total", "Scans inside the scan radius.", load(&self.scan_allowed)),
            (
                "zawya_scan_no_location_total",
                "Scans denied for lack of a trusted location.",
                load(&self.scan_no_location),
            ),
            (
                "zawya_scan_too_far_total",
                "Scans denied as too far from the zone.",
                load(&self.scan_too_far),
            ),
            (
                "zawya_scan_invalid_payload_total",
                "Scans with an unreadable sticker payload.",
                load(&self.scan_invalid_payload),
            ),
            (
                "zawya_collect_success_total",
                "Stickers added to the album.",
                load(&self.collect_success),
            ),
            (
                "zawya_collect_already_owned_total",
                "Collections rejected as already owned.",
                load(&self.collect_already_owned),
            ),
            (
                "zawya_collect_zone_exhausted_total",
                "Collections rejected as zone exhausted.",
                load(&self.collect_zone_exhausted),
            ),
            (
                "zawya_collect_rejected_other_total",
                "Collections rejected for other reasons.",
                load(&self.collect_rejected_other),
            ),
            ("zawya_mint_success_total", "External mints confirmed.", load(&self.mint_success)),
            (
                "zawya_mint_failed_total",
                "External mints failed (album entry kept).",
                load(&self.mint_failed),
            ),
            (
                "zawya_location_updates_total",
                "Location fixes applied.",
                load(&self.location_updates),
            ),
            (
                "zawya_location_stale_total",
                "Location resolutions that fell back to a stale fix.",
                load(&self.location_stale),
            ),
            (
                "zawya_location_fallbacks_total",
                "Location resolutions that fell back to the default coordinate.",
                load(&self.location_fallbacks),
            ),
        ];

        let mut out = String::with_capacity(2048);
        for (name, help, value) in counters {
            out.push_str(&format!(
                "# HELP {name} {help}\n# TYPE {name} counter\n{name} {value}\n"
            ));
        }
        out.push_str(&format!(
            "\
# HELP zawya_mint_duration_seconds_sum Total external mint time (seconds).\n\
# TYPE zawya_mint_duration_seconds_sum counter\n\
zawya_mint_duration_seconds_sum {mint_dur_sum_s:.6}\n\
# HELP zawya_mint_duration_seconds_max Max external mint time since last scrape (seconds).\n\
# TYPE zawya_mint_duration_seconds_max gauge\n\
zawya_mint_duration_seconds_max {mint_dur_max_s:.6}\n\
# HELP zawya_album_size Stickers in the album.\n\
# TYPE zawya_album_size gauge\n\
zawya_album_size {album_size}\n\
# HELP zawya_mint_pending Album entries awaiting mint confirmation.\n\
# TYPE zawya_mint_pending gauge\n\
zawya_mint_pending {pending_mints}\n"
        ));
        out
    }
}
