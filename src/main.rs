#[tokio::main]
async fn main() {
    meallens_backend::run().await;
}
