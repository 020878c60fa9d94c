use clap::{Parser, Subcommand};
use miette::{IntoDiagnostic, Result};
use pi_a2u::application::coordinator::PaymentCoordinator;
use pi_a2u::config::{DEFAULT_BASE_URL, MAINNET_HOST, NetworkConfig, SubmissionConfig, TESTNET_HOST};
use pi_a2u::domain::payment::PaymentData;
use pi_a2u::domain::wallet::Wallet;
use pi_a2u::infrastructure::horizon::HorizonClient;
use pi_a2u::infrastructure::in_memory::InMemoryPaymentStore;
use pi_a2u::infrastructure::platform::HttpPlatformApi;
use rust_decimal::Decimal;
use serde::Serialize;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Platform API key
    #[arg(long, env = "PI_API_KEY", hide_env_values = true)]
    api_key: String,

    /// Private seed of the app wallet (starts with "S")
    #[arg(long, env = "PI_WALLET_SEED", hide_env_values = true)]
    wallet_seed: String,

    /// Platform API base URL
    #[arg(long, env = "PI_BASE_URL", default_value = DEFAULT_BASE_URL)]
    base_url: String,

    /// Horizon host for "Pi Network" payments
    #[arg(long, env = "PI_MAINNET_HOST", default_value = MAINNET_HOST)]
    mainnet_host: String,

    /// Horizon host for every other network
    #[arg(long, env = "PI_TESTNET_HOST", default_value = TESTNET_HOST)]
    testnet_host: String,

    /// Width of the transaction validity window, in seconds
    #[arg(long, default_value_t = 180)]
    submission_timeout_secs: u64,

    /// Pause between resubmissions, in milliseconds
    #[arg(long, default_value_t = 5_000)]
    retry_delay_millis: u64,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Create an app-to-user payment and print its identifier
    Create(CreateArgs),
    /// Submit the ledger transaction for a payment and print the txid
    Submit { payment_id: String },
    /// Mark a payment complete with its txid
    Complete { payment_id: String, txid: String },
    /// Cancel a payment
    Cancel { payment_id: String },
    /// Create, submit and complete a payment in one go
    Pay(CreateArgs),
    /// List incomplete server payments
    Incomplete,
}

#[derive(clap::Args)]
struct CreateArgs {
    #[arg(long)]
    amount: Decimal,
    #[arg(long)]
    memo: String,
    /// Pioneer uid of the recipient
    #[arg(long)]
    uid: String,
    /// Arbitrary JSON metadata
    #[arg(long, default_value = r#"{"source":"pi-a2u"}"#)]
    metadata: String,
}

impl CreateArgs {
    fn into_payment_data(self) -> Result<PaymentData> {
        let metadata = serde_json::from_str(&self.metadata).into_diagnostic()?;
        Ok(PaymentData::new(self.amount, self.memo, self.uid).with_metadata(metadata))
    }
}

fn init_tracing() {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(true)
                .with_writer(std::io::stderr),
        )
        .init();
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value).into_diagnostic()?);
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    init_tracing();
    let cli = Cli::parse();

    let wallet = Wallet::from_seed(&cli.wallet_seed).into_diagnostic()?;
    let network = NetworkConfig {
        base_url: cli.base_url,
        mainnet_host: cli.mainnet_host,
        testnet_host: cli.testnet_host,
    };
    let config = SubmissionConfig {
        submission_timeout_secs: cli.submission_timeout_secs,
        retry_delay_millis: cli.retry_delay_millis,
        ..Default::default()
    };

    let coordinator = PaymentCoordinator::new(
        Box::new(HttpPlatformApi::new(network.base_url.clone(), cli.api_key)),
        HorizonClient::factory(network),
        Box::new(InMemoryPaymentStore::new()),
        wallet,
        config,
    );

    match cli.command {
        Command::Create(args) => {
            let payment_id = coordinator
                .create_payment(&args.into_payment_data()?)
                .await
                .into_diagnostic()?;
            println!("{payment_id}");
        }
        Command::Submit { payment_id } => {
            let txid = coordinator.submit_payment(&payment_id).await.into_diagnostic()?;
            println!("{txid}");
        }
        Command::Complete { payment_id, txid } => {
            let payment = coordinator
                .complete_payment(&payment_id, &txid)
                .await
                .into_diagnostic()?;
            print_json(&payment)?;
        }
        Command::Cancel { payment_id } => {
            let payment = coordinator.cancel_payment(&payment_id).await.into_diagnostic()?;
            print_json(&payment)?;
        }
        Command::Pay(args) => {
            let payment_id = coordinator
                .create_payment(&args.into_payment_data()?)
                .await
                .into_diagnostic()?;
            let txid = coordinator.submit_payment(&payment_id).await.into_diagnostic()?;
            let payment = coordinator
                .complete_payment(&payment_id, &txid)
                .await
                .into_diagnostic()?;
            print_json(&payment)?;
        }
        Command::Incomplete => {
            let payments = coordinator
                .get_incomplete_server_payments()
                .await
                .into_diagnostic()?;
            print_json(&payments)?;
        }
    }

    Ok(())
}
