#[tokio::main]
async fn main() {
    let code = partichan::app::startup::startup().await;
    std::process::exit(code);
}
