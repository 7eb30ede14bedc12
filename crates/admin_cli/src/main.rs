use std::error::Error;

use clap::{Args, Parser, Subcommand};
use engine::{Engine, EngineError, NewProduct};
use migration::MigratorTrait;
use sea_orm::{Database, DatabaseConnection};

#[derive(Parser, Debug)]
#[command(name = "commerce_admin")]
#[command(about = "Admin utilities for the commerce ledger (seed users/wallets/products)")]
struct Cli {
    /// Database connection string (also read from `DATABASE_URL`).
    #[arg(
        long,
        env = "DATABASE_URL",
        default_value = "sqlite:./commerce.db?mode=rwc"
    )]
    database_url: String,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    User(User),
    Wallet(Wallet),
    Product(Product),
}

#[derive(Args, Debug)]
struct User {
    #[command(subcommand)]
    command: UserCommand,
}

#[derive(Subcommand, Debug)]
enum UserCommand {
    /// Mirror an identity-provider user locally.
    Create(UserCreateArgs),
}

#[derive(Args, Debug)]
struct UserCreateArgs {
    #[arg(long)]
    username: String,
}

#[derive(Args, Debug)]
struct Wallet {
    #[command(subcommand)]
    command: WalletCommand,
}

#[derive(Subcommand, Debug)]
enum WalletCommand {
    Create(WalletCreateArgs),
}

#[derive(Args, Debug)]
struct WalletCreateArgs {
    #[arg(long)]
    username: String,
    /// Opening balance in minor units.
    #[arg(long, default_value_t = 0)]
    balance: i64,
}

#[derive(Args, Debug)]
struct Product {
    #[command(subcommand)]
    command: ProductCommand,
}

#[derive(Subcommand, Debug)]
enum ProductCommand {
    Create(ProductCreateArgs),
    List(ProductListArgs),
}

#[derive(Args, Debug)]
struct ProductCreateArgs {
    #[arg(long)]
    name: String,
    #[arg(long)]
    description: Option<String>,
    /// Unit price in minor units.
    #[arg(long)]
    price: i64,
    #[arg(long, default_value_t = 0)]
    availability: i32,
}

#[derive(Args, Debug)]
struct ProductListArgs {
    #[arg(long, default_value_t = 50)]
    limit: u64,
    #[arg(long, default_value_t = 0)]
    offset: u64,
}

async fn connect_db(
    database_url: &str,
) -> Result<DatabaseConnection, Box<dyn Error + Send + Sync>> {
    let db = Database::connect(database_url).await?;
    migration::Migrator::up(&db, None).await?;
    Ok(db)
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error + Send + Sync>> {
    let cli = Cli::parse();

    let db = connect_db(&cli.database_url).await?;
    let engine = Engine::builder().database(db).build().await?;

    match cli.command {
        Command::User(User {
            command: UserCommand::Create(args),
        }) => match engine.provision_user(&args.username).await {
            Ok(user_id) => println!("created user: {} ({user_id})", args.username),
            Err(EngineError::ExistingKey(_)) => {
                eprintln!("user already exists: {}", args.username);
                std::process::exit(1);
            }
            Err(err) => return Err(err.into()),
        },
        Command::Wallet(Wallet {
            command: WalletCommand::Create(args),
        }) => {
            let user_id = match engine.user_id(&args.username).await {
                Ok(user_id) => user_id,
                Err(EngineError::KeyNotFound(_)) => {
                    eprintln!("user not found: {}", args.username);
                    std::process::exit(1);
                }
                Err(err) => return Err(err.into()),
            };

            match engine.wallets().create(user_id, args.balance).await {
                Ok(wallet) => println!(
                    "created wallet {} for {} (balance {})",
                    wallet.id, args.username, wallet.balance
                ),
                Err(EngineError::ExistingKey(_)) => {
                    eprintln!("wallet already exists for: {}", args.username);
                    std::process::exit(1);
                }
                Err(err) => return Err(err.into()),
            }
        }
        Command::Product(Product {
            command: ProductCommand::Create(args),
        }) => {
            let mut product = NewProduct::new(args.name, args.price, args.availability);
            if let Some(description) = args.description {
                product = product.description(description);
            }
            let product = engine.products().create(&product).await?;
            println!("created product: {} ({})", product.name, product.id);
        }
        Command::Product(Product {
            command: ProductCommand::List(args),
        }) => {
            for product in engine.products().list(args.limit, args.offset).await? {
                println!(
                    "{:>6}  {:<32} price {:>10}  stock {:>6}",
                    product.id, product.name, product.price, product.availability
                );
            }
        }
    }

    Ok(())
}
