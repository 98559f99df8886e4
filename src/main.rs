use clap::Parser;
use tektor::cli::{self, Args};

#[tokio::main]
async fn main() {
    let args = Args::parse();
    match cli::run(args).await {
        Ok(code) => std::process::exit(code),
        Err(err) => {
            eprintln!("Error: {:#}", err);
            std::process::exit(1);
        }
    }
}
