use std::{sync::Arc, time::Duration};

use anyhow::{anyhow, Context, Result};
use chrono::{NaiveDate, Utc};
use clap::{ArgAction, Args, Parser, Subcommand};
use rust_decimal::Decimal;
use serde::Serialize;
use storefront_api::{
    auth::{AuthConfig, AuthService},
    config::{self, AppConfig},
    db::{self, DbPool},
    events::{Event, EventSender},
    services::{
        catalog::NewProduct, promos::NewPromo, AccountService, CatalogService, PromoService,
    },
};
use tokio::sync::mpsc;
use tracing::debug;
use uuid::Uuid;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let context = CliContext::initialize().await?;

    match cli.command {
        Commands::Migrate => {
            db::run_migrations(&context.db)
                .await
                .context("failed to run migrations")?;
            println!("Migrations applied");
        }
        Commands::ExpirePromos(args) => handle_expire_promos(&context, args, cli.json).await?,
        Commands::IssueToken(args) => handle_issue_token(&context, args, cli.json).await?,
        Commands::CreateUser(args) => handle_create_user(&context, args, cli.json).await?,
        Commands::CreateProduct(args) => handle_create_product(&context, args, cli.json).await?,
        Commands::CreatePromo(args) => handle_create_promo(&context, args, cli.json).await?,
    }

    Ok(())
}

#[derive(Parser)]
#[command(name = "storefront", about = "Storefront administration CLI", version)]
struct Cli {
    #[arg(
        long,
        global = true,
        action = ArgAction::SetTrue,
        help = "Render command output as pretty JSON"
    )]
    json: bool,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Apply pending schema migrations
    Migrate,
    /// Mark every promo past its expiry date as expired
    ExpirePromos(ExpirePromosArgs),
    /// Mint a bearer token for an existing user
    IssueToken(IssueTokenArgs),
    CreateUser(CreateUserArgs),
    CreateProduct(CreateProductArgs),
    CreatePromo(CreatePromoArgs),
}

#[derive(Args)]
struct ExpirePromosArgs {
    #[arg(long, help = "Reference date (YYYY-MM-DD); defaults to today")]
    date: Option<NaiveDate>,
}

#[derive(Args)]
struct IssueTokenArgs {
    #[arg(long)]
    user_id: Uuid,
}

#[derive(Args)]
struct CreateUserArgs {
    #[arg(long)]
    name: String,
    #[arg(long, help = "Phone number, optional leading + and 7 to 11 digits")]
    phone: String,
    #[arg(long, action = ArgAction::SetTrue)]
    superuser: bool,
}

#[derive(Args)]
struct CreateProductArgs {
    #[arg(long)]
    name: String,
    #[arg(long)]
    unit_price: Decimal,
    #[arg(long, default_value_t = 0)]
    discount_percent: i32,
    #[arg(long, default_value_t = 0)]
    quantity: i32,
}

#[derive(Args)]
struct CreatePromoArgs {
    #[arg(long, help = "Id of the administrator creating the promo")]
    owner_id: Uuid,
    #[arg(long)]
    code: String,
    #[arg(long)]
    discount_percent: i32,
    #[arg(long)]
    min_amount: Decimal,
    #[arg(long, help = "Last valid day (YYYY-MM-DD); omit for no expiry")]
    expires: Option<NaiveDate>,
    #[arg(long)]
    description: Option<String>,
}

struct CliContext {
    config: AppConfig,
    db: Arc<DbPool>,
    event_sender: Arc<EventSender>,
}

impl CliContext {
    async fn initialize() -> Result<Self> {
        let config = config::load_config().context("failed to load application config")?;
        config::init_tracing(config.log_level(), config.log_json);

        let db_pool = db::establish_connection_from_app_config(&config)
            .await
            .context("failed to connect to database")?;

        let (event_tx, mut event_rx) = mpsc::channel::<Event>(32);
        tokio::spawn(async move {
            while let Some(event) = event_rx.recv().await {
                debug!(target: "storefront_cli", event = event.name(), "received event");
            }
        });

        Ok(Self {
            config,
            db: Arc::new(db_pool),
            event_sender: Arc::new(EventSender::new(event_tx)),
        })
    }

    fn accounts(&self) -> AccountService {
        AccountService::new(self.db.clone())
    }

    fn promos(&self) -> PromoService {
        PromoService::new(
            self.db.clone(),
            self.event_sender.clone(),
            self.config.promo_min_amount_floor,
        )
    }

    fn auth(&self) -> AuthService {
        AuthService::new(AuthConfig::new(
            self.config.jwt_secret.clone(),
            Duration::from_secs(self.config.jwt_expiration as u64),
        ))
    }
}

async fn handle_expire_promos(context: &CliContext, args: ExpirePromosArgs, json: bool) -> Result<()> {
    let today = args.date.unwrap_or_else(|| Utc::now().date_naive());
    let expired = context
        .promos()
        .expire_overdue(today)
        .await
        .context("failed to expire promos")?;

    if json {
        print_json(&serde_json::json!({ "expired": expired, "as_of": today }))?;
    } else {
        println!("Expired {} promo code(s) as of {}", expired, today);
    }
    Ok(())
}

async fn handle_issue_token(context: &CliContext, args: IssueTokenArgs, json: bool) -> Result<()> {
    let user = context
        .accounts()
        .get_user(args.user_id)
        .await
        .context("failed to load user")?;
    let token = context
        .auth()
        .issue_token(user.id, &user.phone, user.is_superuser)
        .map_err(|e| anyhow!("failed to issue token: {}", e))?;

    if json {
        print_json(&serde_json::json!({ "user_id": user.id, "token": token }))?;
    } else {
        println!("{}", token);
    }
    Ok(())
}

async fn handle_create_user(context: &CliContext, args: CreateUserArgs, json: bool) -> Result<()> {
    let user = context
        .accounts()
        .create_user(&args.name, &args.phone, args.superuser)
        .await
        .context("failed to create user")?;

    if json {
        print_json(&user)?;
    } else {
        println!("Created user {} ({})", user.id, user.name);
    }
    Ok(())
}

async fn handle_create_product(
    context: &CliContext,
    args: CreateProductArgs,
    json: bool,
) -> Result<()> {
    let product = CatalogService::new(context.db.clone())
        .create_product(NewProduct {
            name: args.name,
            unit_price: args.unit_price,
            discount_percent: args.discount_percent,
            quantity_on_hand: args.quantity,
        })
        .await
        .context("failed to create product")?;

    if json {
        print_json(&product)?;
    } else {
        println!(
            "Created product {} • {} @ {} • {} in stock",
            product.id, product.name, product.unit_price, product.quantity_on_hand
        );
    }
    Ok(())
}

async fn handle_create_promo(context: &CliContext, args: CreatePromoArgs, json: bool) -> Result<()> {
    let promo = context
        .promos()
        .create_promo(
            args.owner_id,
            NewPromo {
                code: args.code,
                description: args.description,
                discount_percent: args.discount_percent,
                min_qualifying_amount: args.min_amount,
                expiry_date: args.expires,
            },
        )
        .await
        .context("failed to create promo")?;

    if json {
        print_json(&promo)?;
    } else {
        let expires = promo
            .expiry_date
            .map(|d| d.to_string())
            .unwrap_or_else(|| "never".to_string());
        println!(
            "Created promo {} • {}% off orders from {} • expires {}",
            promo.code, promo.discount_percent, promo.min_qualifying_amount, expires
        );
    }
    Ok(())
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
