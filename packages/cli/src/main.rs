//! Command-line client for the laptop storefront API.
//!
//! The session is kept in a JSON file between invocations, so `login` once and
//! the following commands run as that user until the token expires.

use anyhow::{anyhow, Context};
use clap::{Parser, Subcommand};
use colored::*;
use serde_json::Value;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

use storefront::models::auth::requests::RegisterRequest;
use storefront::models::order::{CartLine, Checkout, StatusUpdateStyle};
use storefront::services::review_eligibility::Eligibility;
use storefront::{ClientConfig, StorefrontClient};

const DEFAULT_SESSION_FILE: &str = ".storefront-session.json";

#[derive(Parser)]
#[command(name = "storefront")]
#[command(about = "Browse laptops, place orders and manage reviews", long_about = None)]
struct Cli {
    /// Base URL of the storefront API (overrides STOREFRONT_API_URL)
    #[arg(long, global = true)]
    api_url: Option<String>,

    /// Session file (overrides STOREFRONT_SESSION_FILE)
    #[arg(long, global = true)]
    session_file: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Log in and store the session
    Login {
        #[arg(long)]
        email: String,
        #[arg(long)]
        password: String,
    },

    /// Create an account (does not log in)
    Register {
        #[arg(long)]
        first_name: String,
        #[arg(long)]
        last_name: String,
        #[arg(long)]
        email: String,
        #[arg(long)]
        password: String,
        #[arg(long)]
        phone: Option<String>,
    },

    /// Clear the stored session
    Logout,

    /// Show the stored session
    Whoami,

    /// List laptops, or show one
    Laptops {
        #[arg(long)]
        id: Option<i64>,
    },

    /// List your orders, or show one in detail
    Orders {
        #[arg(long)]
        id: Option<i64>,
    },

    /// Place an order; items are LAPTOP_ID or LAPTOP_ID:QUANTITY
    Checkout {
        #[arg(required = true)]
        items: Vec<String>,

        #[arg(long)]
        payment_method: Option<String>,
    },

    /// Reviews of a laptop, or your own reviews
    Reviews {
        #[arg(long)]
        laptop: Option<i64>,
    },

    /// Review a laptop from a delivered order
    Review {
        #[arg(long)]
        order: i64,
        #[arg(long)]
        laptop: i64,
        #[arg(long)]
        rating: i64,
        #[arg(long)]
        comment: String,
    },

    /// Ask whether a laptop from an order can still be reviewed
    CanReview {
        #[arg(long)]
        order: i64,
        #[arg(long)]
        laptop: i64,
    },

    /// Set an order's status (admin)
    OrderStatus {
        #[arg(long)]
        id: i64,
        #[arg(long)]
        status: String,
    },

    /// Check whether the order endpoint accepts this session
    Probe,
}

#[tokio::main]
async fn main() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .without_time()
        .init();

    let cli = Cli::parse();
    if let Err(e) = run(cli).await {
        eprintln!("{} {}", "✗".red(), e);
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    let mut config = ClientConfig::from_env();
    if let Some(url) = cli.api_url {
        config = config.with_base_url(url);
    }
    config = match cli.session_file.or(config.session_file.take()) {
        Some(path) => config.with_session_file(path),
        None => config.with_session_file(DEFAULT_SESSION_FILE),
    };

    let client = StorefrontClient::connect(&config)
        .await
        .context("Could not build the HTTP client")?;

    match cli.command {
        Commands::Login { email, password } => {
            let profile = client.auth.login(&email, &password).await?;
            println!(
                "{} Logged in as {} ({})",
                "✓".green(),
                profile.full_name().bold(),
                profile.role
            );
        }
        Commands::Register {
            first_name,
            last_name,
            email,
            password,
            phone,
        } => {
            let request = RegisterRequest {
                first_name,
                last_name,
                email,
                password,
                phone_number: phone,
            };
            client.auth.register(&request).await?;
            println!("{} Account created, you can now log in", "✓".green());
        }
        Commands::Logout => {
            client.auth.logout().await?;
            println!("{} Logged out", "✓".green());
        }
        Commands::Whoami => {
            let authenticated = client.session.is_authenticated().await;
            match client.session.user_profile().await {
                Some(profile) if authenticated => {
                    println!("{} <{}> {}", profile.full_name().bold(), profile.email, profile.role);
                }
                _ => println!("{}", "Not logged in".yellow()),
            }
        }
        Commands::Laptops { id } => {
            let laptops = match id {
                Some(id) => client.laptops.laptop(id).await?,
                None => client.laptops.laptops().await?,
            };
            print_json(&laptops)?;
        }
        Commands::Orders { id } => {
            let orders = match id {
                Some(id) => client.orders.order_details(id).await?,
                None => client.orders.my_orders().await?,
            };
            print_json(&orders)?;
        }
        Commands::Checkout {
            items,
            payment_method,
        } => {
            let laptops = items
                .iter()
                .map(|item| parse_cart_line(item))
                .collect::<anyhow::Result<Vec<_>>>()?;
            let order = client
                .orders
                .create_order_with_payment(&Checkout {
                    laptops,
                    payment_method,
                })
                .await?;
            println!("{} Order placed", "✓".green());
            print_json(&order)?;
        }
        Commands::Reviews { laptop } => {
            let reviews = match laptop {
                Some(id) => client.reviews.laptop_reviews(id).await?,
                None => client.reviews.my_reviews(None).await,
            };
            print_json(&reviews)?;
        }
        Commands::Review {
            order,
            laptop,
            rating,
            comment,
        } => {
            let review = client
                .eligibility
                .submit(order, laptop, rating, &comment)
                .await?;
            println!("{} Review posted", "✓".green());
            print_json(&review)?;
        }
        Commands::CanReview { order, laptop } => {
            match client.eligibility.confirm(order, laptop).await {
                Eligibility::Eligible => println!("{} You can review this laptop", "✓".green()),
                Eligibility::AlreadyReviewed => {
                    println!("{}", "You've already reviewed this laptop for this order.".yellow())
                }
                Eligibility::Unknown => {
                    println!("{}", "Unable to check review eligibility for this order".yellow())
                }
            }
        }
        Commands::OrderStatus { id, status } => {
            let order = client
                .admin
                .update_order_status(id, &status, StatusUpdateStyle::Body)
                .await?;
            print_json(&order)?;
        }
        Commands::Probe => {
            let probe = client.orders.check_order_endpoint().await;
            if probe.accessible {
                println!("{} /orders/my is reachable", "✓".green());
            } else {
                println!(
                    "{} /orders/my failed ({})",
                    "✗".red(),
                    probe.error.unwrap_or_default()
                );
            }
        }
    }
    Ok(())
}

fn parse_cart_line(item: &str) -> anyhow::Result<CartLine> {
    let (id, quantity) = match item.split_once(':') {
        Some((id, quantity)) => (id, quantity),
        None => (item, "1"),
    };
    Ok(CartLine {
        laptop_id: id
            .parse()
            .map_err(|_| anyhow!("'{}' is not a laptop id", id))?,
        quantity: quantity
            .parse()
            .map_err(|_| anyhow!("'{}' is not a quantity", quantity))?,
    })
}

fn print_json(value: &Value) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
