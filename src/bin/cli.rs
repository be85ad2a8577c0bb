use anyhow::Result;
use clap::Parser;
use clap::Subcommand;

use crate::store::DocumentStore;

#[allow(dead_code)]
#[path = "../store/mod.rs"]
mod store;

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Connection string of the document store
    #[arg(short, long, env, default_value = "sqlite://agile_assist.db")]
    pub database_url: String,

    #[command(subcommand)]
    cmd: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print the newest records of a collection as JSON lines
    List {
        /// Collection to read, e.g. feedback or waitlist
        #[clap(short, long, default_value = store::FEEDBACK_COLLECTION)]
        collection: String,

        /// Maximum number of records printed
        #[clap(short, long, default_value_t = 20)]
        limit: i64,
    },
    /// Print how many records a collection holds
    Count {
        /// Collection to count, e.g. feedback or waitlist
        #[clap(short, long, default_value = store::FEEDBACK_COLLECTION)]
        collection: String,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    let store = DocumentStore::connect(&args.database_url).await?;

    match args.cmd {
        Commands::List { collection, limit } => {
            for record in store.list(&collection, limit).await? {
                println!("{}", serde_json::to_string(&record)?);
            }
        }
        Commands::Count { collection } => {
            println!("{}", store.count(&collection).await?);
        }
    }
    Ok(())
}
