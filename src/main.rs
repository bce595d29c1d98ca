#[tokio::main]
async fn main() -> miette::Result<()> {
    release_trigger::run().await
}
