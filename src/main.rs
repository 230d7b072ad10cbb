use clap::{Parser, Subcommand};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use std::time::Instant;
use tickbook::book::lob::OrderBook;
use tickbook::config;
use tickbook::order::{Order, Side};
use tracing::info;

#[derive(Parser)]
#[command(name = "tickbook", about = "In-memory limit order book core")]
struct Cli {
    #[arg(short, long, default_value = "config.toml")]
    config_path: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Replay a seeded synthetic order flow against one book and report
    /// throughput plus the resulting top of book.
    Feed {
        #[arg(long, default_value_t = 1_000_000)]
        ops: usize,
        #[arg(long, default_value_t = 42)]
        seed: u64,
    },
}

fn init_logging(cfg: &config::AppConfig) {
    match cfg.logger.format {
        config::LogFormat::JSON => {
            tracing_subscriber::fmt()
                .json()
                .with_max_level(cfg.logger.level)
                .with_current_span(true)
                .init();
        }
        config::LogFormat::COMPACT => {
            tracing_subscriber::fmt()
                .compact()
                .with_max_level(cfg.logger.level)
                .init();
        }
    }
}

fn main() {
    let cli = Cli::parse();
    let config = config::AppConfig::load(cli.config_path.as_ref()).expect("could not load config");

    init_logging(&config);

    match cli.command {
        Commands::Feed { ops, seed } => feed(&config, ops, seed),
    }
}

/// Drive the book with a random-walk flow of adds, cancels, modifies, and
/// executions. The feed only exercises the book's public surface; it does
/// not match orders.
fn feed(config: &config::AppConfig, ops: usize, seed: u64) {
    let mut book = OrderBook::with_config(&config.book);
    let mut rng = ChaCha8Rng::seed_from_u64(seed);

    let mut next_id: u64 = 1;
    let mut mid: u64 = 10_000;
    let mut live_bids: Vec<u64> = Vec::new();
    let mut live_asks: Vec<u64> = Vec::new();

    let started = Instant::now();
    for _ in 0..ops {
        // Let the mid price wander one tick at a time.
        if rng.gen_bool(0.05) {
            if rng.gen_bool(0.5) {
                mid += 1;
            } else {
                mid = mid.saturating_sub(1).max(100);
            }
        }

        match rng.gen_range(0..100u8) {
            0..=54 => {
                let side = if rng.gen_bool(0.5) { Side::Bid } else { Side::Ask };
                let offset = rng.gen_range(1..=50);
                let price = match side {
                    Side::Bid => mid - offset,
                    Side::Ask => mid + offset,
                };
                let volume = rng.gen_range(1..=100);
                let id = next_id;
                next_id += 1;
                book.add(price, Order::new(id, side, volume))
                    .expect("feed ids are unique");
                match side {
                    Side::Bid => live_bids.push(id),
                    Side::Ask => live_asks.push(id),
                }
            }
            55..=79 => {
                let pool = if rng.gen_bool(0.5) { &mut live_bids } else { &mut live_asks };
                if !pool.is_empty() {
                    let pick = rng.gen_range(0..pool.len());
                    let id = pool.swap_remove(pick);
                    book.cancel(id);
                }
            }
            80..=89 => {
                let (pool, side) = if rng.gen_bool(0.5) {
                    (&live_bids, Side::Bid)
                } else {
                    (&live_asks, Side::Ask)
                };
                if !pool.is_empty() {
                    let id = pool[rng.gen_range(0..pool.len())];
                    let offset = rng.gen_range(1..=50);
                    let price = match side {
                        Side::Bid => mid - offset,
                        Side::Ask => mid + offset,
                    };
                    let volume = rng.gen_range(1..=100);
                    book.modify(price, Order::new(id, side, volume));
                }
            }
            _ => {
                if !live_bids.is_empty() && !live_asks.is_empty() {
                    let b = live_bids.swap_remove(rng.gen_range(0..live_bids.len()));
                    let a = live_asks.swap_remove(rng.gen_range(0..live_asks.len()));
                    let quantity = rng.gen_range(1..=20);
                    book.execute(mid, b, a, quantity);
                }
            }
        }
    }
    let elapsed = started.elapsed();

    info!(
        ops,
        elapsed_ms = elapsed.as_millis() as u64,
        ops_per_sec = (ops as f64 / elapsed.as_secs_f64()) as u64,
        total_buy_volume = book.total_buy_volume(),
        total_sell_volume = book.total_sell_volume(),
        bid_levels = book.bid_levels_count(),
        ask_levels = book.ask_levels_count(),
        recycled_levels = book.recycled_levels(),
        "feed complete"
    );

    for entry in book.n_best(Side::Bid, 5) {
        info!(
            price = entry.price,
            volume = entry.volume,
            orders = entry.order_count,
            "bid level"
        );
    }
    for entry in book.n_best(Side::Ask, 5) {
        info!(
            price = entry.price,
            volume = entry.volume,
            orders = entry.order_count,
            "ask level"
        );
    }
}
