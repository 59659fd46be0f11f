//! Dishly CLI - order food from the terminal.
//!
//! # Usage
//!
//! ```bash
//! # Browse
//! dishly restaurants
//! dishly menu 3
//!
//! # Build a cart
//! dishly cart add 3 17 --quantity 2
//! dishly cart show
//!
//! # Order
//! dishly login -e user@example.com -p 'hunter2!'
//! dishly checkout
//! dishly orders
//! ```
//!
//! # Commands
//!
//! - `register` / `login` / `logout` / `whoami` - session management
//! - `restaurants` / `categories` / `menu` - catalog browsing
//! - `cart` - cart manipulation (`show`, `add`, `update`, `remove`, `clear`)
//! - `checkout` - submit the cart as an order
//! - `orders` - order history

#![cfg_attr(not(test), forbid(unsafe_code))]
// This is a terminal front end; stdout/stderr are the user interface.
#![allow(clippy::print_stdout)]
#![allow(clippy::print_stderr)]

use clap::{Parser, Subcommand};

use dishly_client::{AppError, AppState, ClientConfig};

mod commands;

#[derive(Parser)]
#[command(name = "dishly")]
#[command(author, version, about = "Dishly food-ordering CLI")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create a new account
    Register {
        /// Account email address
        #[arg(short, long)]
        email: String,

        /// Account password
        #[arg(short, long)]
        password: String,
    },
    /// Log in and store the session
    Login {
        /// Account email address
        #[arg(short, long)]
        email: String,

        /// Account password
        #[arg(short, long)]
        password: String,
    },
    /// Log out and clear the stored session
    Logout,
    /// Show the logged-in user
    Whoami,
    /// List restaurants
    Restaurants,
    /// List dish categories
    Categories,
    /// Show a restaurant's menu
    Menu {
        /// Restaurant ID
        restaurant_id: i64,
    },
    /// Manage the shopping cart
    Cart {
        #[command(subcommand)]
        action: CartAction,
    },
    /// Submit the cart as an order
    Checkout,
    /// Show order history
    Orders,
}

#[derive(Subcommand)]
enum CartAction {
    /// Show the cart contents and total
    Show,
    /// Add a dish from a restaurant's menu
    Add {
        /// Restaurant ID
        restaurant_id: i64,

        /// Dish ID
        dish_id: i64,

        /// Quantity to add
        #[arg(short, long, default_value_t = 1)]
        quantity: u32,
    },
    /// Set a cart line to an exact quantity (0 removes it)
    Update {
        /// Dish ID
        dish_id: i64,

        /// New quantity
        #[arg(short, long)]
        quantity: u32,
    },
    /// Remove a dish from the cart
    Remove {
        /// Dish ID
        dish_id: i64,
    },
    /// Empty the cart
    Clear,
}

/// Initialize Sentry error tracking and return guard that must be kept alive.
fn init_sentry(config: &ClientConfig) -> Option<sentry::ClientInitGuard> {
    let dsn = config.sentry_dsn.as_ref()?;

    let guard = sentry::init((
        dsn.as_str(),
        sentry::ClientOptions {
            release: sentry::release_name!(),
            attach_stacktrace: true,
            ..Default::default()
        },
    ));

    tracing::debug!("Sentry initialized");
    Some(guard)
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let config = match ClientConfig::from_env() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Configuration error: {e}");
            std::process::exit(2);
        }
    };

    let _sentry_guard = init_sentry(&config);

    // Defaults to warn so command output stays readable; RUST_LOG overrides
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "dishly_client=warn".into());
    tracing_subscriber::fmt().with_env_filter(env_filter).init();

    let state = match AppState::new(config) {
        Ok(state) => state,
        Err(e) => {
            eprintln!("Startup error: {e}");
            std::process::exit(2);
        }
    };

    if let Err(e) = run(&state, cli).await {
        e.report();
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}

async fn run(state: &AppState, cli: Cli) -> Result<(), AppError> {
    match cli.command {
        Commands::Register { email, password } => {
            commands::auth::register(state, &email, &password).await
        }
        Commands::Login { email, password } => {
            commands::auth::login(state, &email, &password).await
        }
        Commands::Logout => commands::auth::logout(state),
        Commands::Whoami => commands::auth::whoami(state),
        Commands::Restaurants => commands::catalog::restaurants(state).await,
        Commands::Categories => commands::catalog::categories(state).await,
        Commands::Menu { restaurant_id } => commands::catalog::menu(state, restaurant_id).await,
        Commands::Cart { action } => match action {
            CartAction::Show => commands::cart::show(state),
            CartAction::Add {
                restaurant_id,
                dish_id,
                quantity,
            } => commands::cart::add(state, restaurant_id, dish_id, quantity).await,
            CartAction::Update { dish_id, quantity } => {
                commands::cart::update(state, dish_id, quantity)
            }
            CartAction::Remove { dish_id } => commands::cart::remove(state, dish_id),
            CartAction::Clear => commands::cart::clear(state),
        },
        Commands::Checkout => commands::order::checkout(state).await,
        Commands::Orders => commands::order::history(state).await,
    }
}
