#[tokio::main]
async fn main() {
    std::process::exit(curator_cli::run().await);
}
