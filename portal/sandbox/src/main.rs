#[tokio::main]
async fn main() -> anyhow::Result<()> {
    sandbox::start_server().await
}
