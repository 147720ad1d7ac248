//! Dial Toy headless entry point
//!
//! Drives a scripted session (drag, fling, a run of taps up to a milestone)
//! against a logging feedback sink. Pass a JSON path to persist counters
//! between runs, and optionally an effect mode name.
//!
//! ```text
//! dial-toy [store.json] [fireworks|glass|coins]
//! ```

#[cfg(not(target_arch = "wasm32"))]
fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    log::info!("Dial Toy (headless) starting...");

    let mut args = std::env::args().skip(1);
    let store_path = args.next();
    let mode = args.next();

    if let Err(e) = headless::run(store_path.as_deref(), mode.as_deref()) {
        log::error!("Session failed: {}", e);
        std::process::exit(1);
    }
}

#[cfg(target_arch = "wasm32")]
fn main() {
    // The host embeds the library directly on wasm
}

#[cfg(not(target_arch = "wasm32"))]
mod headless {
    use dial_toy::consts::PHYSICS_DT;
    use dial_toy::feedback::LogSink;
    use dial_toy::persistence::{JsonFileStore, KeyValueStore, MemoryStore, PersistenceError};
    use dial_toy::{DialToy, EffectMode, Viewport};

    /// Frame period of the simulated display
    const FRAME: f64 = PHYSICS_DT as f64;

    pub fn run(store_path: Option<&str>, mode: Option<&str>) -> Result<(), PersistenceError> {
        let store: Box<dyn KeyValueStore> = match store_path {
            Some(path) => Box::new(JsonFileStore::open(path)?),
            None => Box::new(MemoryStore::new()),
        };

        let seed = std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .map(|d| d.as_secs())
            .unwrap_or(0);
        let mut toy = DialToy::new(store, Viewport::default(), seed);
        let mut sink = LogSink;

        if let Some(name) = mode {
            match EffectMode::from_str(name) {
                Some(mode) => toy.set_effect_mode(mode),
                None => log::warn!("Unknown effect mode `{}`, keeping {}", name, toy.settings().effect_mode.as_str()),
            }
        }

        let mut now = 0.0;
        toy.frame(now, &mut sink);

        // Slow drag through a quarter turn
        toy.touch_began(0.0, now);
        for step in 1..=30 {
            now += FRAME;
            toy.touch_moved(step as f32 * 3.0, now);
            toy.frame(now, &mut sink);
        }

        // Flick and let it coast
        now += FRAME;
        toy.touch_moved(110.0, now);
        toy.touch_ended(now);
        while toy.dial().velocity() != 0.0 {
            now += FRAME;
            toy.frame(now, &mut sink);
        }
        log::info!(
            "Dial at rest: {:.1}° after {:.0}° of travel",
            toy.dial().angle(),
            toy.dial().total_travel()
        );

        // Tap up to the next milestone
        let taps = toy.stats().tap_count;
        let remaining = 100 - taps % 100;
        for _ in 0..remaining {
            now += 0.12;
            toy.tap(now);
            toy.frame(now, &mut sink);
        }
        if let Some(celebration) = toy.last_celebration() {
            log::info!("Celebration: {:?}", celebration);
        }

        // Let the effect play out
        let mut peak_sprites = 0;
        let mut peak_lines = 0;
        let until = now + 40.0;
        while toy.effects_active() && now < until {
            now += FRAME;
            toy.frame(now, &mut sink);
            peak_sprites = peak_sprites.max(toy.sprites().len());
            peak_lines = peak_lines.max(toy.crack_lines().len());
        }
        log::info!(
            "Effects settled at t={:.1}s (peak {} sprites, {} crack lines)",
            now,
            peak_sprites,
            peak_lines
        );

        let stats = toy.stats();
        log::info!(
            "Totals: {} taps, {} rotations, {} spins, milestones {:?}",
            stats.tap_count,
            stats.rotation_count,
            stats.spin_count,
            stats.milestones
        );

        toy.enter_background();
        Ok(())
    }
}
